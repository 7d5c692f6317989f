//! The web interface.
//!
//! A successful login sets the `plotgate_session` cookie. Requests without a
//! cookie that names a live session only ever see the login prompt.

mod handlers;
mod view;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
  config::Config,
  dataset::Storage,
  session::{CredentialVerifier, SessionId, SessionStore, StaticCredentials},
};

pub const SESSION_COOKIE: &str = "plotgate_session";

/// Largest accepted upload body.
const UPLOAD_LIMIT: usize = 200 * 1024 * 1024;

/// Shared state for handlers
#[derive(Clone)]
pub struct AppState {
  pub credentials:  Arc<dyn CredentialVerifier>,
  pub storage:      Arc<Storage>,
  pub sessions:     Arc<SessionStore>,
  pub preview_rows: usize,
}

impl AppState {
  pub fn new(config: &Config) -> crate::Result<Self> {
    Ok(AppState {
      credentials:  Arc::new(StaticCredentials::new(config.credentials.clone())),
      storage:      Arc::new(Storage::open(&config.data_dir)?),
      sessions:     Arc::new(SessionStore::new()),
      preview_rows: config.preview_rows,
    })
  }
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(handlers::index))
    .route("/login", post(handlers::login))
    .route("/logout", post(handlers::logout))
    .route("/upload", post(handlers::upload))
    .route("/upload/clear", post(handlers::clear_upload))
    .route("/select", post(handlers::select))
    .route("/plot", post(handlers::plot))
    .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
    .with_state(state)
}

pub struct Server {
  bind:  SocketAddr,
  state: AppState,
}

impl Server {
  pub fn new(config: &Config) -> anyhow::Result<Self> {
    let state = AppState::new(config)
      .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;
    Ok(Server { bind: config.bind, state })
  }

  pub async fn serve(self) -> anyhow::Result<()> {
    let listener = TcpListener::bind(self.bind)
      .await
      .with_context(|| format!("failed to bind {}", self.bind))?;

    info!(
      addr = %self.bind,
      data_dir = %self.state.storage.root().display(),
      "listening"
    );

    if let Err(e) = axum::serve(listener, router(self.state)).await {
      error!("server error: {e}");
      return Err(e.into());
    }
    Ok(())
  }
}

/// The session id carried by the request, if any.
fn session_id(jar: &CookieJar) -> Option<SessionId> {
  jar.get(SESSION_COOKIE).and_then(|cookie| SessionId::parse(cookie.value_trimmed()))
}

fn session_cookie(id: SessionId) -> Cookie<'static> {
  Cookie::build((SESSION_COOKIE, id.to_string()))
    .path("/")
    .http_only(true)
    .same_site(SameSite::Lax)
    .build()
}

/// Matches the path of [`session_cookie`] so the browser drops it.
fn expired_session_cookie() -> Cookie<'static> { Cookie::build(SESSION_COOKIE).path("/").build() }
