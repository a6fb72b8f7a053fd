//! HttpResourceClient against a throwaway local server
//!
//! Each test binds a listener on an ephemeral port and answers every
//! connection with one canned HTTP response.

use libgradebook::client::{fetch_collection, HttpResourceClient, ResourceClient};
use libgradebook::{ApiError, ErrorKind, Student};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Serve `status` and `body` to every connection; forward each raw request
async fn serve(status: &'static str, body: String) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let request = read_request(&mut socket).await;
            let _ = tx.send(request);

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (base_url, rx)
}

/// Read headers plus a content-length body
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buffer.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[tokio::test]
async fn test_get_decodes_hal_collection() {
    let body = json!({
        "_embedded": {"students": [{
            "id": 1, "username": "ann01", "email": "ann@example.edu",
            "firstName": "Ann", "lastName": "Lee"
        }]},
        "_links": {"self": {"href": "http://localhost/students"}}
    })
    .to_string();
    let (base_url, mut requests) = serve("200 OK", body).await;
    let client = HttpResourceClient::new(&format!("{}/", base_url)).unwrap();

    let students: Vec<Student> = fetch_collection(&client, "/students", "students")
        .await
        .unwrap();

    assert_eq!(students.len(), 1);
    assert_eq!(students[0].label(), "Ann Lee (1)");
    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("GET /students HTTP/1.1"));
}

#[tokio::test]
async fn test_status_error_carries_code_and_body() {
    let (base_url, _requests) = serve("406 Not Acceptable", "{\"error\":\"nope\"}".to_string()).await;
    let client = HttpResourceClient::new(&base_url).unwrap();

    let err = client
        .create("/grades/addGrade", &json!({"student_id": 1}))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(406));
    assert_eq!(err.body(), Some("{\"error\":\"nope\"}"));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Request failed with status code 406");
}

#[tokio::test]
async fn test_post_sends_json_payload() {
    let (base_url, mut requests) = serve("201 Created", String::new()).await;
    let client = HttpResourceClient::new(&base_url).unwrap();

    client
        .create("/modules", &json!({"code": "CS101", "name": "Programming", "mnc": false}))
        .await
        .unwrap();

    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("POST /modules HTTP/1.1"));
    assert!(request.to_lowercase().contains("content-type: application/json"));
    let (_, body) = request.split_once("\r\n\r\n").unwrap();
    let payload: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(payload, json!({"code": "CS101", "name": "Programming", "mnc": false}));
}

#[tokio::test]
async fn test_delete_not_found() {
    let (base_url, mut requests) = serve("404 Not Found", String::new()).await;
    let client = HttpResourceClient::new(&base_url).unwrap();

    let err = client.remove("/students/3").await.unwrap_err();

    assert_eq!(err, ApiError::status(404, ""));
    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("DELETE /students/3 HTTP/1.1"));
}

#[tokio::test]
async fn test_non_json_success_body_is_parse_error() {
    let (base_url, _requests) = serve("200 OK", "<html>hello</html>".to_string()).await;
    let client = HttpResourceClient::new(&base_url).unwrap();

    let err = client.get("/students").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn test_closed_port_is_network_error() {
    // Bind then drop to find a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpResourceClient::new(&format!("http://{}", addr)).unwrap();
    let err = client.get("/students").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().starts_with("Network error:"));
}
