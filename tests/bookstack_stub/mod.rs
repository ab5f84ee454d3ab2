use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::{json, Value};

pub const TOKEN: &str = "tok";
pub const SECRET: &str = "sec";

/// Rows per list page. Small so the client has to paginate.
const LIST_PAGE: usize = 2;

/// In-process BookStack API serving a fixed library:
///
/// - shelf `engineering` (7): Robots (1), Gears (2)
/// - shelf `empty` (8): no books
/// - shelf `archive` (9): Gears (2)
/// - book `robots` (1), updated 2024-01-10: chapter Motors (20) with two pages, page Safety (21)
/// - book `gears` (2), updated 2023-01-01 with one stale page
/// - book `manuals` (3), updated 2023-01-01
pub struct BookStackStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl BookStackStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start bookstack stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                if let Ok(mut log) = seen.lock() {
                    log.push(url.clone());
                }

                let expected_auth = format!("Token {TOKEN}:{SECRET}");
                let authorized = request.headers().iter().any(|h| {
                    h.field.equiv("Authorization") && h.value.as_str() == expected_auth
                });
                if !authorized {
                    let _ = request.respond(json_response(
                        401,
                        json!({"error": {"message": "The owner of the used API token does not have permission to make API calls", "code": 403}}),
                    ));
                    continue;
                }

                let (path, query) = match url.split_once('?') {
                    Some((p, q)) => (p.to_string(), q.to_string()),
                    None => (url.clone(), String::new()),
                };
                let offset = query_param(&query, "offset").unwrap_or(0);

                let response = match path.as_str() {
                    "/api/system" => json_response(
                        200,
                        json!({"app_name": "BookStack", "version": "v24.05.1", "base_url": "http://stub"}),
                    ),
                    "/api/shelves" => json_response(200, list_page(shelf_rows(), offset)),
                    "/api/books" => json_response(200, list_page(book_rows(), offset)),
                    "/api/shelves/7" => json_response(
                        200,
                        json!({"id": 7, "slug": "engineering", "name": "Engineering", "books": [
                            {"id": 1, "slug": "robots", "name": "Robots"},
                            {"id": 2, "slug": "gears", "name": "Gears"}
                        ]}),
                    ),
                    "/api/shelves/8" => json_response(
                        200,
                        json!({"id": 8, "slug": "empty", "name": "Empty", "books": []}),
                    ),
                    "/api/shelves/9" => json_response(
                        200,
                        json!({"id": 9, "slug": "archive", "name": "Archive", "books": [
                            {"id": 2, "slug": "gears", "name": "Gears"}
                        ]}),
                    ),
                    "/api/books/1" => json_response(200, robots()),
                    "/api/books/2" => json_response(200, gears()),
                    "/api/books/3" => json_response(
                        200,
                        json!({"id": 3, "slug": "manuals", "name": "Manuals",
                            "updated_at": "2023-01-01T00:00:00.000000Z", "contents": []}),
                    ),
                    p if p.ends_with("/export/pdf") => pdf_response(p),
                    _ => json_response(
                        404,
                        json!({"error": {"message": "Not found", "code": 404}}),
                    ),
                };
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Request paths (with query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }
}

impl Drop for BookStackStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn query_param(query: &str, key: &str) -> Option<usize> {
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key {
            v.parse().ok()
        } else {
            None
        }
    })
}

fn list_page(rows: Vec<Value>, offset: usize) -> Value {
    let total = rows.len();
    let data: Vec<Value> = rows.into_iter().skip(offset).take(LIST_PAGE).collect();
    json!({"data": data, "total": total})
}

fn shelf_rows() -> Vec<Value> {
    vec![
        json!({"id": 7, "slug": "engineering", "name": "Engineering"}),
        json!({"id": 8, "slug": "empty", "name": "Empty"}),
        json!({"id": 9, "slug": "archive", "name": "Archive"}),
    ]
}

fn book_rows() -> Vec<Value> {
    vec![
        json!({"id": 1, "slug": "robots", "name": "Robots"}),
        json!({"id": 2, "slug": "gears", "name": "Gears"}),
        json!({"id": 3, "slug": "manuals", "name": "Manuals"}),
    ]
}

fn robots() -> Value {
    json!({
        "id": 1,
        "slug": "robots",
        "name": "Robots",
        "updated_at": "2024-01-10T00:00:00.000000Z",
        "contents": [
            {
                "id": 20,
                "name": "Motors",
                "slug": "motors",
                "type": "chapter",
                "updated_at": "2023-05-01T00:00:00.000000Z",
                "pages": [
                    {"id": 200, "name": "Stepper", "slug": "stepper", "updated_at": "2023-05-01T00:00:00.000000Z"},
                    {"id": 201, "name": "Servo", "slug": "servo", "updated_at": "2023-05-02T00:00:00.000000Z"}
                ]
            },
            {
                "id": 21,
                "name": "Safety",
                "slug": "safety",
                "type": "page",
                "updated_at": "2024-01-10T00:00:00.000000Z"
            }
        ]
    })
}

fn gears() -> Value {
    json!({
        "id": 2,
        "slug": "gears",
        "name": "Gears",
        "updated_at": "2023-01-01T00:00:00.000000Z",
        "contents": [
            {"id": 22, "name": "Spur", "slug": "spur", "type": "page", "updated_at": "2023-01-01T00:00:00.000000Z"}
        ]
    })
}

fn json_response(status: u16, body: Value) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("build header");
    tiny_http::Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(header)
}

/// Body is `%PDF-stub <path>` so tests can tell which endpoint produced a file.
fn pdf_response(path: &str) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/pdf"[..])
        .expect("build header");
    tiny_http::Response::from_data(format!("%PDF-stub {path}").into_bytes())
        .with_status_code(200)
        .with_header(header)
}
