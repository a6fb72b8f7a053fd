//! gradebook - manage students, modules and grades from the command line

mod output;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};

use libgradebook::filter::{
    apply_filters, page_count, Filterable, GradeField, Matcher, ModuleField, RosterField,
    StudentField, TriState,
};
use libgradebook::forms::{GradeForm, ModuleForm, RegistrationForm, StudentForm, StudentGradeForm};
use libgradebook::service::messages::{describe_query, Query};
use libgradebook::service::NoRefresh;
use libgradebook::view::{
    reduce, ListAction, ListState, ModuleDetailView, NavigationContext, StudentDetailView,
};
use libgradebook::{Config, GradebookError, GradebookService, MutationOutcome};

use output::{OutputFormat, Page};

#[derive(Parser, Debug)]
#[command(name = "gradebook")]
#[command(version, about = "Manage students, modules and grades")]
#[command(long_about = r#"Manage students, modules and grades through the gradebook API.

EXAMPLES:
    # List students whose name contains "an"
    gradebook students list --name an

    # Second page of ten
    gradebook students list --page 2 --page-size 10

    # Add a student and register them to a module
    gradebook students add --id 42 --username jdoe --email jdoe@example.edu \
        --first-name Jane --last-name Doe
    gradebook students register 42 cs101

    # Grade a registered student
    gradebook grades add 42 CS101 68

    # Modules that are mandatory non-core
    gradebook modules list --mnc yes

    # Module roster of students without a grade yet, as JSON
    gradebook --format json modules show CS101 --graded no

CONFIGURATION:
    ~/.config/gradebook/config.toml, or the file named by GRADEBOOK_CONFIG.
    GRADEBOOK_API_URL or --api-url override the API endpoint.

EXIT CODES:
    0 - Success
    1 - Request failed or the server rejected the change
    2 - Configuration error
    3 - Invalid input
"#)]
struct Cli {
    /// Base URL of the gradebook API
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Students, their registrations and grades
    #[command(subcommand)]
    Students(StudentCommand),

    /// Modules and module rosters
    #[command(subcommand)]
    Modules(ModuleCommand),

    /// Grades across all students
    #[command(subcommand)]
    Grades(GradeCommand),
}

#[derive(Args, Debug)]
struct Paging {
    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1, value_name = "N")]
    page: usize,

    /// Rows per page (defaults to the configured page size)
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum StudentCommand {
    /// List students
    List {
        /// Id contains
        #[arg(long)]
        id: Option<String>,
        /// "First Last" contains
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },

    /// Add a student, or overwrite the one with the same id
    Add {
        #[arg(long, default_value = "")]
        id: String,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },

    /// Delete a student
    Delete { id: i64 },

    /// Show a student with registrations, grades and average
    Show { id: i64 },

    /// Register a student to a module
    Register { id: i64, code: String },

    /// Remove a registration and its grade
    Unregister { id: i64, code: String },

    /// Grade a student on a registered module
    Grade { id: i64, code: String, score: String },
}

#[derive(Subcommand, Debug)]
enum ModuleCommand {
    /// List modules
    List {
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// yes, no or any
        #[arg(long, value_name = "FILTER")]
        mnc: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },

    /// Add a module, or update the one with the same code
    Add {
        code: String,
        name: String,
        /// Mark as mandatory non-core
        #[arg(long)]
        mnc: bool,
    },

    /// Delete a module
    Delete { code: String },

    /// Remove a student from the module's roster
    Unregister { code: String, student_id: i64 },

    /// Show a module with its statistics and roster
    Show {
        code: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// yes, no or any
        #[arg(long, value_name = "FILTER")]
        graded: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },
}

#[derive(Subcommand, Debug)]
enum GradeCommand {
    /// List grades with student and module names
    List {
        /// Student id or name contains
        #[arg(long)]
        student: Option<String>,
        /// Module code or name contains
        #[arg(long)]
        module: Option<String>,
        #[command(flatten)]
        paging: Paging,
    },

    /// Add a grade
    Add {
        student_id: i64,
        code: String,
        score: String,
    },

    /// Delete a grade
    Delete { id: i64 },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libgradebook::logging::from_env(cli.verbose).init();
    tracing::debug!("gradebook started with args: {:?}", cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

/// Library errors carry their own exit code; anything else is a failure
fn exit_code(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<GradebookError>())
        .map(GradebookError::exit_code)
        .unwrap_or(1)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.api_url.as_deref())?;
    let service = GradebookService::from_config(config)?;
    let format = cli.format;

    match cli.command {
        Command::Students(command) => students(&service, command, format).await,
        Command::Modules(command) => modules(&service, command, format).await,
        Command::Grades(command) => grades(&service, command, format).await,
    }
}

fn load_config(api_url: Option<&str>) -> Result<Config> {
    let mut config = Config::load_or_default().context("Failed to load configuration")?;
    if let Some(url) = api_url {
        config.api.base_url = url.to_string();
        config.validate().context("Invalid --api-url")?;
    }
    Ok(config)
}

async fn students(
    service: &GradebookService,
    command: StudentCommand,
    format: OutputFormat,
) -> Result<()> {
    let students = service.students();

    match command {
        StudentCommand::List {
            id,
            name,
            username,
            email,
            paging,
        } => {
            let state = list_state(
                service.config(),
                &paging,
                [
                    (StudentField::Id, id),
                    (StudentField::Name, name),
                    (StudentField::Username, username),
                    (StudentField::Email, email),
                ],
            )?;
            let all = students.reload().await?;
            output::students(&page(&state, &all), format)
        }

        StudentCommand::Add {
            id,
            username,
            email,
            first_name,
            last_name,
        } => {
            let mut form = StudentForm::new();
            form.set_id(&id)?;
            form.set_username(&username);
            form.set_email(&email);
            form.set_first_name(&first_name);
            form.set_last_name(&last_name);
            report(students.add(&mut form).await, format)
        }

        StudentCommand::Delete { id } => report(students.delete(id).await, format),

        StudentCommand::Show { id } => {
            let view = StudentDetailView::new(students.clone(), id, NavigationContext::root());
            let detail = view
                .load()
                .await
                .map_err(|e| anyhow!(describe_query(Query::StudentDetail, &e)))?;
            let average = view.average().await?;
            output::student_detail(&detail, average, format)
        }

        StudentCommand::Register { id, code } => {
            let mut form = RegistrationForm::new(id);
            form.set_module(&code);
            report(students.register(&mut form, &NoRefresh).await, format)
        }

        StudentCommand::Unregister { id, code } => {
            report(students.unregister(id, &code, &NoRefresh).await, format)
        }

        StudentCommand::Grade { id, code, score } => {
            let mut form = StudentGradeForm::new(id);
            form.set_module(&code);
            form.set_score(&score)?;
            report(students.add_grade(&mut form, &NoRefresh).await, format)
        }
    }
}

async fn modules(
    service: &GradebookService,
    command: ModuleCommand,
    format: OutputFormat,
) -> Result<()> {
    let modules = service.modules();

    match command {
        ModuleCommand::List {
            code,
            name,
            mnc,
            paging,
        } => {
            let state = list_state(
                service.config(),
                &paging,
                [(ModuleField::Code, code), (ModuleField::Name, name)],
            )?;
            let state = flag_filter(state, ModuleField::Mnc, mnc.as_deref())?;
            let all = modules.reload().await?;
            output::modules(&page(&state, &all), format)
        }

        ModuleCommand::Add { code, name, mnc } => {
            let mut form = ModuleForm::new();
            form.set_code(&code);
            form.set_name(&name);
            form.set_mnc(mnc);
            report(modules.add(&mut form).await, format)
        }

        ModuleCommand::Delete { code } => report(modules.delete(&code).await, format),

        ModuleCommand::Unregister { code, student_id } => {
            let view = ModuleDetailView::new(modules.clone(), &code, NavigationContext::from_modules());
            report(view.unregister(student_id).await, format)
        }

        ModuleCommand::Show {
            code,
            id,
            name,
            username,
            email,
            graded,
            paging,
        } => {
            let state = list_state(
                service.config(),
                &paging,
                [
                    (RosterField::Id, id),
                    (RosterField::Name, name),
                    (RosterField::Username, username),
                    (RosterField::Email, email),
                ],
            )?;
            let state = flag_filter(state, RosterField::Graded, graded.as_deref())?;

            let view =
                ModuleDetailView::new(modules.clone(), &code, NavigationContext::from_modules());
            let detail = view
                .load()
                .await
                .map_err(|e| anyhow!(describe_query(Query::ModuleDetail, &e)))?;
            output::module_detail(&detail, &page(&state, &detail.roster()), format)
        }
    }
}

async fn grades(
    service: &GradebookService,
    command: GradeCommand,
    format: OutputFormat,
) -> Result<()> {
    let grades = service.grades();

    match command {
        GradeCommand::List {
            student,
            module,
            paging,
        } => {
            let state = list_state(
                service.config(),
                &paging,
                [(GradeField::Student, student), (GradeField::Module, module)],
            )?;
            let rows = grades.rows().await?;
            output::grades(&page(&state, &rows), format)
        }

        GradeCommand::Add {
            student_id,
            code,
            score,
        } => {
            let mut form = GradeForm::new();
            form.set_student(Some(student_id));
            form.set_module(&code);
            form.set_score(&score)?;
            report(grades.add(&mut form).await, format)
        }

        GradeCommand::Delete { id } => report(grades.delete(id).await, format),
    }
}

/// Build list state from text filters and paging flags
fn list_state<F, const N: usize>(
    config: &Config,
    paging: &Paging,
    text_filters: [(F, Option<String>); N],
) -> Result<ListState<F>>
where
    F: Copy + Eq,
{
    let page_size = paging.page_size.unwrap_or(config.defaults.page_size);
    let options = &config.defaults.page_size_options;
    if page_size == 0 || (!options.is_empty() && !options.contains(&page_size)) {
        return Err(GradebookError::InvalidInput(format!(
            "page size must be one of {:?}",
            options
        ))
        .into());
    }
    if paging.page == 0 {
        return Err(GradebookError::InvalidInput("pages start at 1".to_string()).into());
    }

    let mut state = ListState::new(page_size);
    for (field, needle) in text_filters {
        if let Some(needle) = needle {
            state = reduce(state, ListAction::SetFilter(field, Matcher::contains(needle)));
        }
    }
    Ok(reduce(state, ListAction::SetPage(paging.page - 1)))
}

/// Add a yes/no/any filter without losing the requested page
fn flag_filter<F: Copy + Eq>(
    state: ListState<F>,
    field: F,
    value: Option<&str>,
) -> Result<ListState<F>> {
    let Some(value) = value else {
        return Ok(state);
    };
    let page = state.page;
    let state = reduce(state, ListAction::SetFilter(field, Matcher::Flag(tri_state(value)?)));
    Ok(reduce(state, ListAction::SetPage(page)))
}

fn tri_state(value: &str) -> Result<TriState> {
    value
        .parse::<TriState>()
        .map_err(|e| GradebookError::InvalidInput(e).into())
}

/// Cut the requested page; a page past the end shows the last one
fn page<T>(state: &ListState<T::Field>, items: &[T]) -> Page<T>
where
    T: Filterable + Clone,
{
    let total = apply_filters(items, &state.filters).len();
    let state = reduce(state.clone(), ListAction::CollectionChanged(total));
    Page {
        items: state.visible(items),
        page: state.page + 1,
        page_size: state.page_size,
        pages: page_count(total, state.page_size),
        total,
    }
}

/// Print a successful outcome or turn a failed one into an error
fn report(outcome: MutationOutcome, format: OutputFormat) -> Result<()> {
    if let Some(e) = &outcome.refresh_error {
        eprintln!("Warning: saved, but reloading failed: {}", e);
    }
    if outcome.is_success() {
        return output::outcome(&outcome, format);
    }
    if format == OutputFormat::Json {
        output::outcome(&outcome, format)?;
    }
    Err(anyhow!(outcome
        .message()
        .unwrap_or("Request failed")
        .to_string()))
}
