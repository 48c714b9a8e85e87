use crate::app::App;
use crate::auth::sessions::create_session;
use crate::auth::Role;
use crate::content::Catalog;
use crate::db::{init_db, Database};
use crate::effects::{EffectDelays, FixedServices};
use astra::{Body, Request, Response};
use http::Method;
use std::io::Read;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// A portal on a throwaway database. Keep it alive for the whole test so
/// the directory outlives any effect threads.
pub struct TestPortal {
    _dir: TempDir,
    pub app: App,
}

pub fn test_portal() -> TestPortal {
    test_portal_with(FixedServices::succeeding())
}

pub fn test_portal_with(services: FixedServices) -> TestPortal {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
    let db = Database::new(dir.path().join("portal.sqlite3"));
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    let catalog = Catalog::from_json(include_str!("../../content/epics.json")).unwrap();
    let app = App::new(db, catalog, Arc::new(services), EffectDelays::immediate()).unwrap();

    TestPortal { _dir: dir, app }
}

/// Start a session directly and return the `Cookie` header value.
pub fn sign_in(app: &App, email: &str, role: Role) -> String {
    let now = chrono::Utc::now().timestamp();
    let (token, _) = app
        .db
        .with_conn(|conn| create_session(conn, email, "", role, now))
        .expect("Failed to create session");
    format!("session={token}")
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request {
    let mut builder = http::Request::builder().method(Method::GET).uri(uri);
    if let Some(c) = cookie {
        builder = builder.header("Cookie", c);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, cookie: Option<&str>, form: &str) -> Request {
    let mut builder = http::Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded");
    if let Some(c) = cookie {
        builder = builder.header("Cookie", c);
    }
    builder.body(Body::from(form.as_bytes().to_vec())).unwrap()
}

pub fn body_string(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

pub fn location(resp: &Response) -> &str {
    resp.headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Poll until `done` holds; effects run on their own threads.
pub fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out waiting for effect");
        std::thread::sleep(Duration::from_millis(10));
    }
}
