//! End-to-end flows through the web interface.

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use std::sync::Arc;

use plotgate::{
  Config,
  server::{AppState, router},
  session::SessionStore,
};
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
  app:      Router,
  sessions: Arc<SessionStore>,
  dir:      TempDir,
  cookie:   Option<String>,
}

struct Reply {
  status:   StatusCode,
  location: Option<String>,
  body:     String,
}

impl Harness {
  fn new() -> Self {
    let dir = tempfile::tempdir().unwrap();
    let config = Config { data_dir: dir.path().join("data"), ..Config::default() };
    let state = AppState::new(&config).unwrap();
    let sessions = state.sessions.clone();
    Harness { app: router(state), sessions, dir, cookie: None }
  }

  fn data_dir(&self) -> std::path::PathBuf { self.dir.path().join("data") }

  async fn send(&mut self, request: Request<Body>) -> Reply {
    let response = self.app.clone().oneshot(request).await.unwrap();

    if let Some(set) = response.headers().get(header::SET_COOKIE) {
      let value = set.to_str().unwrap();
      self.cookie = Some(value.split(';').next().unwrap().to_string());
    }
    let status = response.status();
    let location =
      response.headers().get(header::LOCATION).map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

    Reply { status, location, body: String::from_utf8(bytes.to_vec()).unwrap() }
  }

  fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match &self.cookie {
      Some(cookie) => builder.header(header::COOKIE, cookie),
      None => builder,
    }
  }

  async fn get(&mut self, uri: &str) -> Reply {
    let request = self.request("GET", uri).body(Body::empty()).unwrap();
    self.send(request).await
  }

  async fn post_form(&mut self, uri: &str, form: &str) -> Reply {
    let request = self
      .request("POST", uri)
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
      .body(Body::from(form.to_string()))
      .unwrap();
    self.send(request).await
  }

  async fn upload(&mut self, file_name: &str, contents: &str) -> Reply {
    let boundary = "plotgate-test-boundary";
    let body = format!(
      "--{boundary}\r\n\
       Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
       Content-Type: text/csv\r\n\r\n\
       {contents}\r\n\
       --{boundary}--\r\n"
    );
    let request = self
      .request("POST", "/upload")
      .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
      .body(Body::from(body))
      .unwrap();
    self.send(request).await
  }

  async fn login(&mut self) {
    let reply = self.post_form("/login", "username=admin&password=password123").await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
  }
}

#[tokio::test]
async fn first_visit_shows_login_without_a_session() {
  let mut h = Harness::new();
  let reply = h.get("/").await;

  assert_eq!(reply.status, StatusCode::OK);
  assert!(reply.body.contains("action=\"/login\""));
  assert!(h.cookie.is_none());
  assert_eq!(h.sessions.len(), 0);
}

#[tokio::test]
async fn anonymous_traffic_stores_nothing() {
  let mut h = Harness::new();
  for _ in 0..20 {
    h.get("/").await;
    h.post_form("/logout", "").await;
    h.post_form("/login", "username=admin&password=nope").await;
  }
  assert_eq!(h.sessions.len(), 0);

  h.login().await;
  assert_eq!(h.sessions.len(), 1);
  h.post_form("/logout", "").await;
  assert_eq!(h.sessions.len(), 0);
}

#[tokio::test]
async fn logging_in_again_replaces_the_session() {
  let mut h = Harness::new();
  h.login().await;
  let first = h.cookie.clone();
  h.login().await;

  assert_ne!(h.cookie, first);
  assert_eq!(h.sessions.len(), 1);
}

#[tokio::test]
async fn login_success_is_shown_once() {
  let mut h = Harness::new();
  h.login().await;

  let reply = h.get("/").await;
  assert!(reply.body.contains("Login successful!"));
  let reply = h.get("/").await;
  assert!(!reply.body.contains("Login successful!"));
}

#[tokio::test]
async fn wrong_password_keeps_the_gate_closed() {
  let mut h = Harness::new();
  h.get("/").await;

  let reply = h.post_form("/login", "username=admin&password=PASSWORD123").await;
  assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
  assert!(reply.body.contains("Invalid username or password."));

  let reply = h.get("/").await;
  assert!(reply.body.contains("action=\"/login\""));
  assert!(!reply.body.contains("Welcome"));
}

#[tokio::test]
async fn login_refreshes_into_the_workspace() {
  let mut h = Harness::new();
  let reply = h.post_form("/login", "username=user&password=pass456").await;
  assert_eq!(reply.status, StatusCode::SEE_OTHER);
  assert_eq!(reply.location.as_deref(), Some("/"));
  assert!(h.cookie.as_deref().unwrap().starts_with("plotgate_session="));

  let reply = h.get("/").await;
  assert!(reply.body.contains("Welcome, user!"));
  assert!(reply.body.contains("No CSV files found in the data folder. Please upload a file."));
  assert!(!reply.body.contains("Generate Plot"));
}

#[tokio::test]
async fn plot_route_is_gated() {
  let mut h = Harness::new();
  let reply = h.post_form("/plot", "x=a&y=b&kind=Line+Plot").await;
  assert_eq!(reply.status, StatusCode::OK);
  assert!(reply.body.contains("action=\"/login\""));
  assert!(!reply.body.contains("<svg"));
}

#[tokio::test]
async fn uploaded_csv_renders_a_scatter_plot() {
  let mut h = Harness::new();
  h.login().await;

  let reply = h.upload("points.csv", "x,y\n1,2\n3,4\n").await;
  assert_eq!(reply.status, StatusCode::SEE_OTHER);

  let reply = h.get("/").await;
  assert!(reply.body.contains("File uploaded successfully!"));
  assert!(reply.body.contains("<th>x</th><th>y</th>"));
  assert!(reply.body.contains("<td>3</td><td>4</td>"));

  let reply = h.post_form("/plot", "x=x&y=y&kind=Scatter+Plot").await;
  assert_eq!(reply.status, StatusCode::OK);
  assert!(reply.body.contains("<svg"));
  assert!(reply.body.contains("Scatter Plot of y vs x"));
}

#[tokio::test]
async fn missing_axes_are_reported_without_a_chart() {
  let mut h = Harness::new();
  h.login().await;
  h.upload("ab.csv", "a,b\n1,2\n").await;

  let reply = h.post_form("/plot", "x=None&y=b&kind=Bar+Chart").await;
  assert!(reply.body.contains("Please select a valid X-axis variable."));
  assert!(!reply.body.contains("<svg"));

  let reply = h.post_form("/plot", "x=a&y=None&kind=Line+Plot").await;
  assert!(reply.body.contains("Please select a valid Y-axis variable for this plot."));
  assert!(!reply.body.contains("<svg"));

  let reply = h.post_form("/plot", "x=a&y=None&kind=Count+Plot").await;
  assert!(reply.body.contains("<svg"));
  assert!(reply.body.contains(">Count</text>"));
}

#[tokio::test]
async fn stored_files_need_a_selection() {
  let mut h = Harness::new();
  std::fs::write(h.data_dir().join("people.csv"), "age,height\n30,170\n40,180\n").unwrap();
  h.login().await;
  h.get("/").await;

  let reply = h.get("/").await;
  assert!(reply.body.contains("<option value=\"people.csv\">people.csv</option>"));
  assert!(!reply.body.contains("Preview of Data"));
  assert!(!reply.body.contains("class=\"notice"));

  let reply = h.post_form("/select", "file=people.csv").await;
  assert_eq!(reply.status, StatusCode::SEE_OTHER);

  let reply = h.get("/").await;
  assert!(reply.body.contains("Preview of Data"));
  assert!(reply.body.contains("<option value=\"age\">age</option>"));

  let reply = h.post_form("/plot", "x=age&y=height&kind=Line+Plot").await;
  assert!(reply.body.contains("Line Plot of height vs age"));
}

#[tokio::test]
async fn upload_overrides_selection_until_removed() {
  let mut h = Harness::new();
  std::fs::write(h.data_dir().join("stored.csv"), "stored_col\n1\n").unwrap();
  h.login().await;
  h.post_form("/select", "file=stored.csv").await;
  h.upload("mine.csv", "uploaded_col\n1\n").await;

  let reply = h.get("/").await;
  assert!(reply.body.contains("<th>uploaded_col</th>"));
  assert!(!reply.body.contains("<th>stored_col</th>"));

  h.post_form("/upload/clear", "").await;
  let reply = h.get("/").await;
  assert!(reply.body.contains("<th>stored_col</th>"));
}

#[tokio::test]
async fn non_csv_uploads_are_rejected() {
  let mut h = Harness::new();
  h.login().await;

  let reply = h.upload("report.txt", "hello").await;
  assert_eq!(reply.status, StatusCode::BAD_REQUEST);
  assert!(reply.body.contains("Only .csv files can be uploaded."));
}

#[tokio::test]
async fn logout_closes_the_gate() {
  let mut h = Harness::new();
  h.login().await;

  let reply = h.post_form("/logout", "").await;
  assert_eq!(reply.status, StatusCode::SEE_OTHER);
  assert_eq!(h.cookie.as_deref(), Some("plotgate_session="));

  let reply = h.get("/").await;
  assert!(reply.body.contains("action=\"/login\""));
}

#[tokio::test]
async fn old_cookie_is_dead_after_logout() {
  let mut h = Harness::new();
  h.login().await;
  let stale = h.cookie.clone();
  h.post_form("/logout", "").await;

  h.cookie = stale;
  let reply = h.get("/").await;
  assert!(reply.body.contains("action=\"/login\""));
}

#[tokio::test]
async fn sessions_do_not_share_login() {
  let mut a = Harness::new();
  a.login().await;

  let mut b = Harness {
    app:      a.app.clone(),
    sessions: a.sessions.clone(),
    dir:      tempfile::tempdir().unwrap(),
    cookie:   None,
  };
  let reply = b.get("/").await;
  assert!(reply.body.contains("action=\"/login\""));

  let reply = a.get("/").await;
  assert!(reply.body.contains("Welcome, admin!"));
}
