use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use gtasks_sync::auth::{refresh_access_token_at, Credentials};
use gtasks_sync::backend::google::GoogleTasksBackend;
use gtasks_sync::backend::{BackendError, RemoteTask, TaskBackend, TaskStatus};
use gtasks_sync::SyncError;

/// Read one request, body included, so the socket closes cleanly.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        request.extend_from_slice(&buf[..n]);
        if n == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&request).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&request).to_string()
}

/// Serve canned HTTP responses, one per connection, and hand back the raw requests seen.
async fn serve(responses: Vec<(u16, &'static str)>) -> (String, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let text = read_request(&mut socket).await;
            seen.push(text);

            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
        seen
    });

    (base, handle)
}

#[tokio::test]
async fn test_task_lists_follow_page_tokens() {
    let (base, server) = serve(vec![
        (200, r#"{"items":[{"id":"l1","title":"Groceries"}],"nextPageToken":"p2"}"#),
        (200, r#"{"items":[{"id":"l2","title":"Work"}]}"#),
    ])
    .await;

    let backend = GoogleTasksBackend::with_api_base("token".to_string(), base);
    let lists = backend.fetch_task_lists().await.unwrap();

    assert_eq!(lists.len(), 2);
    assert_eq!(lists[1].title, "Work");
    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /users/@me/lists?"));
    assert!(requests[1].contains("pageToken=p2"));
}

#[tokio::test]
async fn test_tasks_are_requested_with_hidden_deleted_and_completed() {
    let (base, server) = serve(vec![(
        200,
        r#"{"items":[{"id":"t1","title":"Buy milk","status":"completed","updated":"2024-01-05T10:00:00.000Z","completed":"2024-01-05T09:00:00.000Z","hidden":true}]}"#,
    )])
    .await;

    let backend = GoogleTasksBackend::with_api_base("token".to_string(), base);
    let tasks = backend.fetch_tasks("l1").await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Completed);
    assert!(tasks[0].hidden);

    let requests = server.await.unwrap();
    let request = &requests[0];
    assert!(request.starts_with("GET /lists/l1/tasks?"));
    assert!(request.contains("showCompleted=true"));
    assert!(request.contains("showDeleted=true"));
    assert!(request.contains("showHidden=true"));
    assert!(request.contains("updatedMin=1970-01-01T00"));
}

#[tokio::test]
async fn test_unauthorized_response() {
    let (base, _server) = serve(vec![(401, r#"{"error":{"code":401,"message":"Invalid Credentials"}}"#)]).await;

    let backend = GoogleTasksBackend::with_api_base("expired".to_string(), base);
    let err = backend.fetch_task_lists().await.unwrap_err();

    assert!(matches!(err, BackendError::Unauthorized(_)));
    assert_eq!(err.status_code(), Some(401));
    assert!(SyncError::from(err).is_authorization_expired());
}

#[tokio::test]
async fn test_server_error_response() {
    let (base, _server) = serve(vec![(500, "backend unavailable")]).await;

    let backend = GoogleTasksBackend::with_api_base("token".to_string(), base);
    let err = backend.fetch_tasks("l1").await.unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert!(matches!(SyncError::from(err), SyncError::Transport(_)));
}

#[tokio::test]
async fn test_task_without_status_is_invalid_data() {
    let (base, _server) = serve(vec![(200, r#"{"items":[{"id":"t1","title":"Buy milk"}]}"#)]).await;

    let backend = GoogleTasksBackend::with_api_base("token".to_string(), base);
    let err = backend.fetch_tasks("l1").await.unwrap_err();

    assert!(matches!(err, BackendError::InvalidData(_)));
}

fn request_body(request: &str) -> serde_json::Value {
    let (_, body) = request.split_once("\r\n\r\n").expect("request has a body");
    serde_json::from_str(body).unwrap()
}

fn reopened_task() -> RemoteTask {
    RemoteTask {
        id: "t1".to_string(),
        title: "Buy milk".to_string(),
        status: TaskStatus::NeedsAction,
        updated: Some("2024-01-05T10:00:00.000Z".to_string()),
        due: None,
        completed: None,
        notes: Some("2% if they have it".to_string()),
        links: Vec::new(),
        deleted: false,
        hidden: false,
        web_view_link: None,
    }
}

#[tokio::test]
async fn test_update_task_puts_the_full_record() {
    let (base, server) = serve(vec![(
        200,
        r#"{"id":"t1","title":"Buy milk","status":"needsAction","updated":"2024-06-01T00:00:00.000Z","notes":"2% if they have it"}"#,
    )])
    .await;

    let backend = GoogleTasksBackend::with_api_base("token".to_string(), base);
    let updated = backend.update_task("l1", &reopened_task()).await.unwrap();
    assert_eq!(updated.updated.as_deref(), Some("2024-06-01T00:00:00.000Z"));

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("PUT /lists/l1/tasks/t1 "));
    let body = request_body(&requests[0]);
    assert_eq!(body["id"], "t1");
    assert_eq!(body["title"], "Buy milk");
    assert_eq!(body["status"], "needsAction");
    // Cleared fields are sent as null so the server clears them too
    assert!(body["completed"].is_null());
    assert!(body.as_object().unwrap().contains_key("completed"));
    assert!(body.as_object().unwrap().contains_key("due"));
    assert_eq!(body["notes"], "2% if they have it");
}

#[tokio::test]
async fn test_update_task_sends_completion_and_due() {
    let (base, server) = serve(vec![(
        200,
        r#"{"id":"t1","title":"Buy milk","status":"completed","updated":"2024-06-01T00:00:00.000Z"}"#,
    )])
    .await;

    let mut task = reopened_task();
    task.status = TaskStatus::Completed;
    task.completed = Some("2024-03-01T00:00:00.000Z".to_string());
    task.due = Some("2024-03-02T00:00:00.000Z".to_string());

    let backend = GoogleTasksBackend::with_api_base("token".to_string(), base);
    backend.update_task("l1", &task).await.unwrap();

    let body = request_body(&server.await.unwrap()[0]);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["completed"], "2024-03-01T00:00:00.000Z");
    assert_eq!(body["due"], "2024-03-02T00:00:00.000Z");
}

#[tokio::test]
async fn test_write_path_unauthorized_responses() {
    let (base, _server) = serve(vec![
        (401, r#"{"error":{"code":401,"message":"Invalid Credentials"}}"#),
        (401, r#"{"error":{"code":401,"message":"Invalid Credentials"}}"#),
    ])
    .await;

    let backend = GoogleTasksBackend::with_api_base("expired".to_string(), base);
    let update = backend.update_task("l1", &reopened_task()).await.unwrap_err();
    assert!(matches!(update, BackendError::Unauthorized(_)));

    let fetch = backend.get_task("l1", "t1").await.unwrap_err();
    assert!(matches!(fetch, BackendError::Unauthorized(_)));
}

#[tokio::test]
async fn test_revoked_refresh_token_is_unauthorized() {
    let (base, _server) = serve(vec![(
        400,
        r#"{"error":"invalid_grant","error_description":"Token has been expired or revoked."}"#,
    )])
    .await;

    let credentials = Credentials {
        access_token: "old".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        refresh_token: Some("revoked".to_string()),
    };
    let err = refresh_access_token_at(&format!("{base}/token"), &credentials)
        .await
        .unwrap_err();

    match err {
        BackendError::Unauthorized(message) => assert!(message.contains("invalid_grant")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_refresh_returns_new_access_token() {
    let (base, server) = serve(vec![(200, r#"{"access_token":"fresh","expires_in":3599}"#)]).await;

    let credentials = Credentials {
        access_token: "old".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        refresh_token: Some("refresh".to_string()),
    };
    let payload = refresh_access_token_at(&format!("{base}/token"), &credentials)
        .await
        .unwrap();

    assert_eq!(payload.access_token, "fresh");
    assert!(payload.refresh_token.is_none());
    assert!(server.await.unwrap()[0].starts_with("POST /token"));
}
