//! Rendering for the `gradebook` binary
//!
//! Text goes to stdout as aligned columns; JSON is one pretty-printed
//! document per command so it can be piped into `jq`.

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use libgradebook::relations::GradeRow;
use libgradebook::{Module, ModuleDetail, MutationOutcome, RosterEntry, Student, StudentDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One page of a filtered list
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
    pub pages: usize,
    /// Items matching the filters, across all pages
    pub total: usize,
}

impl<T> Page<T> {
    fn footer(&self) -> String {
        if self.total == 0 {
            return "No matching records.".to_string();
        }
        format!(
            "Page {} of {} ({} matching, {} per page)",
            self.page,
            self.pages.max(1),
            self.total,
            self.page_size
        )
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn students(page: &Page<Student>, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(page);
    }

    println!("{:<8} {:<16} {:<28} {:<24}", "ID", "USERNAME", "EMAIL", "NAME");
    for s in &page.items {
        println!(
            "{:<8} {:<16} {:<28} {:<24}",
            s.id,
            s.username,
            s.email,
            s.full_name()
        );
    }
    println!("{}", page.footer());
    Ok(())
}

pub fn modules(page: &Page<Module>, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(page);
    }

    println!("{:<10} {:<32} {:<4}", "CODE", "NAME", "MNC");
    for m in &page.items {
        println!(
            "{:<10} {:<32} {:<4}",
            m.code,
            m.name,
            if m.mnc { "yes" } else { "no" }
        );
    }
    println!("{}", page.footer());
    Ok(())
}

pub fn grades(page: &Page<GradeRow>, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(page);
    }

    println!("{:<8} {:<32} {:<32} {:>5}", "ID", "STUDENT", "MODULE", "SCORE");
    for row in &page.items {
        let id = row.grade_id.map(|id| id.to_string()).unwrap_or_default();
        println!(
            "{:<8} {:<32} {:<32} {:>5}",
            id, row.student_label, row.module_label, row.score
        );
    }
    println!("{}", page.footer());
    Ok(())
}

#[derive(Serialize)]
struct StudentReport<'a> {
    #[serde(flatten)]
    detail: &'a StudentDetail,
    average: Option<f64>,
}

pub fn student_detail(
    detail: &StudentDetail,
    average: Option<f64>,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&StudentReport { detail, average });
    }

    let s = &detail.student;
    println!("{}", s.label());
    println!("  Username: {}", s.username);
    println!("  Email:    {}", s.email);
    println!("  Average:  {}", format_average(average));

    println!();
    println!("Registered modules:");
    if detail.registered_modules.is_empty() {
        println!("  (none)");
    }
    for m in &detail.registered_modules {
        println!("  {}", m.label());
    }

    println!();
    println!("Grades:");
    if detail.grades.is_empty() {
        println!("  (none)");
    }
    for g in &detail.grades {
        let module = g
            .module
            .as_ref()
            .map(|r| r.module().map(Module::label).unwrap_or_else(|| r.code().to_string()))
            .unwrap_or_else(|| "Unknown module".to_string());
        let id = g.id.map(|id| format!("#{} ", id)).unwrap_or_default();
        println!("  {}{:<32} {:>5}", id, module, g.score);
    }
    Ok(())
}

#[derive(Serialize)]
struct ModuleReport<'a> {
    module: &'a Module,
    total_grades: usize,
    average: Option<f64>,
    distribution: Vec<Bucket>,
    roster: &'a Page<RosterEntry>,
}

#[derive(Serialize)]
struct Bucket {
    range: &'static str,
    count: u32,
}

pub fn module_detail(
    detail: &ModuleDetail,
    roster: &Page<RosterEntry>,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Json {
        let distribution = detail
            .distribution
            .buckets()
            .map(|(range, count)| Bucket { range, count })
            .collect();
        return print_json(&ModuleReport {
            module: &detail.module,
            total_grades: detail.total_grades,
            average: detail.average,
            distribution,
            roster,
        });
    }

    println!("{}", detail.module.label());
    println!("  MNC:          {}", if detail.module.mnc { "yes" } else { "no" });
    println!("  Total grades: {}", detail.total_grades);
    println!("  Average:      {}", format_average(detail.average));
    println!();
    println!("Distribution:");
    for (range, count) in detail.distribution.buckets() {
        println!("  {:<8} {}", range, count);
    }

    println!();
    println!("{:<8} {:<16} {:<28} {:<24} {:>5}", "ID", "USERNAME", "EMAIL", "NAME", "SCORE");
    for entry in &roster.items {
        let s = &entry.student;
        let score = entry.score.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<16} {:<28} {:<24} {:>5}",
            s.id,
            s.username,
            s.email,
            s.full_name(),
            score
        );
    }
    println!("{}", roster.footer());
    Ok(())
}

#[derive(Serialize)]
struct OutcomeReport<'a> {
    workflow: &'a str,
    success: bool,
    message: Option<&'a str>,
    refresh_error: Option<String>,
}

/// Print a successful outcome; failures are reported by the caller
pub fn outcome(outcome: &MutationOutcome, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(&OutcomeReport {
            workflow: outcome.workflow,
            success: outcome.is_success(),
            message: outcome.message(),
            refresh_error: outcome.refresh_error.as_ref().map(ToString::to_string),
        });
    }

    println!("{}", outcome.message().unwrap_or("Saved."));
    Ok(())
}

fn format_average(average: Option<f64>) -> String {
    average
        .map(|a| format!("{:.2}", a))
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footer_for_empty_page() {
        let page: Page<Student> = Page {
            items: vec![],
            page: 1,
            page_size: 5,
            pages: 0,
            total: 0,
        };
        assert_eq!(page.footer(), "No matching records.");
    }

    #[test]
    fn test_footer_counts() {
        let page: Page<Student> = Page {
            items: vec![],
            page: 2,
            page_size: 5,
            pages: 3,
            total: 12,
        };
        assert_eq!(page.footer(), "Page 2 of 3 (12 matching, 5 per page)");
    }

    #[test]
    fn test_format_average() {
        assert_eq!(format_average(Some(64.456)), "64.46");
        assert_eq!(format_average(None), "n/a");
    }
}
