use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode, header, redirect};
use serde::Deserialize;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

const OPERATOR_EMAIL: &str = "staff@example.com";
const OPERATOR_PASSWORD: &str = "correct horse";

#[derive(Debug, Deserialize)]
struct Person {
    id: String,
    nombre: String,
    ooad: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttendanceRecord {
    id: i64,
    persona_id: String,
    dia: u8,
    entrada: Option<String>,
    salida: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RosterPerson {
    id: String,
    name: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct RosterStats {
    total: usize,
    attended: usize,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static TABLES_SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));
static ROSTER_SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Mutex;
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PIDS: Mutex<Vec<i32>> = Mutex::new(Vec::new());

    pub fn register(pid: u32) {
        if let Ok(mut pids) = PIDS.lock() {
            pids.push(pid as i32);
        }
        REGISTER.call_once(|| unsafe {
            libc::atexit(on_exit);
        });
    }

    extern "C" fn on_exit() {
        if let Ok(pids) = PIDS.lock() {
            for pid in pids.iter().copied().filter(|pid| *pid > 0) {
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path(label: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "attendance_http_{label}_{}_{}.json",
        std::process::id(),
        nanos
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = no_redirect_client();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if client.get(format!("{base_url}/")).send().await.is_ok() {
            return;
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(mode: &str) -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path(mode);
    let child = Command::new(env!("CARGO_BIN_EXE_attendance_tracker"))
        .env("PORT", port.to_string())
        .env("APP_MODE", mode)
        .env("APP_DATA_PATH", data_path)
        .env("APP_OPERATOR_EMAIL", OPERATOR_EMAIL)
        .env("APP_OPERATOR_PASSWORD", OPERATOR_PASSWORD)
        .env("APP_UTC_OFFSET_MINUTES", "0")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server(
    slot: &Mutex<Option<Arc<TestServer>>>,
    mode: &str,
) -> Arc<TestServer> {
    let mut guard = slot.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server(mode).await);
    *guard = Some(Arc::clone(&server));
    server
}

fn no_redirect_client() -> Client {
    Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}

async fn sign_in(client: &Client, base_url: &str) -> String {
    let response = client
        .post(format!("{base_url}/login"))
        .form(&[("email", OPERATOR_EMAIL), ("password", OPERATOR_PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn http_pages_require_a_session() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server(&TABLES_SERVER, "tables").await;
    let client = no_redirect_client();

    let page = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(page.headers()[header::LOCATION], "/login");

    let api = client
        .get(format!("{}/api/people", server.base_url))
        .header(header::COOKIE, "attendance_session=forged")
        .send()
        .await
        .unwrap();
    assert_eq!(api.status(), StatusCode::UNAUTHORIZED);

    let wrong = client
        .post(format!("{}/login", server.base_url))
        .form(&[("email", OPERATOR_EMAIL), ("password", "nope")])
        .send()
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong.text().await.unwrap().contains("Incorrect email or password"));
}

#[tokio::test]
async fn http_check_in_then_check_out_updates_one_record() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server(&TABLES_SERVER, "tables").await;
    let client = no_redirect_client();
    let cookie = sign_in(&client, &server.base_url).await;

    let person: Person = client
        .post(format!("{}/api/people", server.base_url))
        .header(header::COOKIE, &cookie)
        .json(&serde_json::json!({ "name": "  Ana López ", "category": "Norte" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(person.nombre, "Ana López");
    assert_eq!(person.ooad.as_deref(), Some("Norte"));

    let response = client
        .post(format!("{}/attendance", server.base_url))
        .header(header::COOKIE, &cookie)
        .form(&[
            ("person_id", person.id.as_str()),
            ("day", "2"),
            ("slot", "entrada"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/?day=2");

    let checked_out: AttendanceRecord = client
        .post(format!("{}/api/attendance", server.base_url))
        .header(header::COOKIE, &cookie)
        .json(&serde_json::json!({ "person_id": person.id, "day": 2, "slot": "salida" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let records: Vec<AttendanceRecord> = client
        .get(format!("{}/api/attendance", server.base_url))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mine: Vec<_> = records
        .iter()
        .filter(|record| record.persona_id == person.id)
        .collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, checked_out.id);
    assert_eq!(mine[0].dia, 2);
    assert!(mine[0].entrada.is_some());
    assert!(mine[0].salida.is_some());

    let page = client
        .get(format!("{}/?day=2", server.base_url))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Ana López"));
}

#[tokio::test]
async fn http_blank_name_is_reported_inline() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server(&TABLES_SERVER, "tables").await;
    let client = no_redirect_client();
    let cookie = sign_in(&client, &server.base_url).await;

    let response = client
        .post(format!("{}/people", server.base_url))
        .header(header::COOKIE, &cookie)
        .form(&[("name", "   "), ("category", ""), ("day", "1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("Name is required."));
}

#[tokio::test]
async fn http_unreadable_form_is_shown_as_an_alert() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server(&TABLES_SERVER, "tables").await;
    let client = no_redirect_client();
    let cookie = sign_in(&client, &server.base_url).await;

    let response = client
        .post(format!("{}/attendance", server.base_url))
        .header(header::COOKIE, &cookie)
        .form(&[
            ("person_id", "not-a-uuid"),
            ("day", "3"),
            ("slot", "entrada"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"role="alert""#));
    assert!(html.contains("That request could not be read."));
}

#[tokio::test]
async fn http_spreadsheet_export_is_a_dated_download() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server(&TABLES_SERVER, "tables").await;
    let client = no_redirect_client();
    let cookie = sign_in(&client, &server.base_url).await;

    client
        .post(format!("{}/api/people", server.base_url))
        .header(header::COOKIE, &cookie)
        .json(&serde_json::json!({ "name": "Bruno" }))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("{}/export", server.base_url))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("Asistencias_"));
    assert!(disposition.ends_with(".xlsx\""));
    let bytes = response.bytes().await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn http_roster_flow() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server(&ROSTER_SERVER, "roster").await;
    let client = no_redirect_client();

    let empty_export = client
        .get(format!("{}/export", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(empty_export.status(), StatusCode::BAD_REQUEST);
    assert!(empty_export.headers().get(header::CONTENT_DISPOSITION).is_none());

    for name in ["Ana", "Bruno"] {
        let response = client
            .post(format!("{}/people", server.base_url))
            .form(&[("name", name), ("filter", "all")])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let people: Vec<RosterPerson> = client
        .get(format!("{}/api/people", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(people[0].name, "Bruno");
    assert!(people.iter().all(|p| p.status == "pending"));

    let ana = people.iter().find(|p| p.name == "Ana").unwrap();
    let response = client
        .post(format!("{}/people/{}/status", server.base_url, ana.id))
        .form(&[("status", "attended"), ("filter", "attended")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[header::LOCATION], "/?filter=attended");

    let stats: RosterStats = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!((stats.total, stats.attended), (2, 1));

    let export = client
        .get(format!("{}/export", server.base_url))
        .send()
        .await
        .unwrap();
    assert!(export.status().is_success());
    let exported: Vec<serde_json::Value> = export.json().await.unwrap();
    assert_eq!(exported.len(), 2);

    let bad_status = client
        .post(format!("{}/people/{}/status", server.base_url, ana.id))
        .form(&[("status", "maybe")])
        .send()
        .await
        .unwrap();
    assert_eq!(bad_status.status(), StatusCode::BAD_REQUEST);
    assert!(bad_status.text().await.unwrap().contains(r#"role="alert""#));

    let skipped_first = client
        .get(format!("{}/clear?step=2", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(!skipped_first.contains(r#"action="/clear""#));

    let second_step = client
        .get(format!("{}/clear?step=2&first=yes", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(second_step.contains(r#"action="/clear""#));

    // one "yes" is a cancel
    let cancelled = client
        .post(format!("{}/clear", server.base_url))
        .form(&[("first", "yes")])
        .send()
        .await
        .unwrap();
    assert_eq!(cancelled.status(), StatusCode::SEE_OTHER);
    let still_there: Vec<RosterPerson> = client
        .get(format!("{}/api/people", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(still_there.len(), 2);

    client
        .post(format!("{}/clear", server.base_url))
        .form(&[("first", "yes"), ("second", "yes")])
        .send()
        .await
        .unwrap();
    let cleared: Vec<RosterPerson> = client
        .get(format!("{}/api/people", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cleared.is_empty());
}
