//! Per-session login state.
//!
//! A [`Session`] starts logged out and only changes through
//! [`Session::attempt_login`] and [`Session::logout`]. Each change queues a
//! [`SessionEvent::StateChanged`] which the web layer answers with a full view
//! refresh.

use std::{
  collections::{BTreeMap, HashMap},
  sync::{Mutex, MutexGuard},
};

use tracing::{info, warn};
use uuid::Uuid;

use crate::{dataset::Upload, error::Notice};

/// Checks a username/password pair.
pub trait CredentialVerifier: Send + Sync {
  fn verify(&self, username: &str, password: &str) -> bool;
}

/// A fixed username to password registry, compared verbatim.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
  users: BTreeMap<String, String>,
}

impl StaticCredentials {
  pub fn new(users: BTreeMap<String, String>) -> Self { StaticCredentials { users } }
}

impl CredentialVerifier for StaticCredentials {
  fn verify(&self, username: &str, password: &str) -> bool {
    self.users.get(username).is_some_and(|stored| stored == password)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
  StateChanged,
}

#[derive(Debug, Default)]
pub struct Session {
  authenticated: bool,
  user:          Option<String>,
  events:        Vec<SessionEvent>,
}

impl Session {
  pub fn new() -> Self { Session::default() }

  /// Logs in when `verifier` accepts the pair. A rejected attempt leaves the
  /// session exactly as it was.
  pub fn attempt_login(
    &mut self,
    verifier: &dyn CredentialVerifier,
    username: &str,
    password: &str,
  ) -> bool {
    if !verifier.verify(username, password) {
      warn!(username, "rejected login");
      return false;
    }

    info!(username, "logged in");
    self.authenticated = true;
    self.user = Some(username.to_string());
    self.events.push(SessionEvent::StateChanged);
    true
  }

  pub fn logout(&mut self) {
    if let Some(user) = &self.user {
      info!(username = user.as_str(), "logged out");
    }
    self.authenticated = false;
    self.user = None;
    self.events.push(SessionEvent::StateChanged);
  }

  pub fn is_authenticated(&self) -> bool { self.authenticated }

  pub fn current_user(&self) -> Option<&str> {
    if self.authenticated { self.user.as_deref() } else { None }
  }

  /// Drains the events queued since the last call.
  pub fn take_events(&mut self) -> Vec<SessionEvent> { std::mem::take(&mut self.events) }
}

/// Everything one logged-in browser session owns.
#[derive(Debug, Default)]
pub struct SessionContext {
  pub session:  Session,
  /// A pending upload; it wins over `selected` while present.
  pub upload:   Option<Upload>,
  pub selected: Option<String>,
  /// Shown once on the next page, then dropped.
  pub flash:    Vec<Notice>,
}

impl From<Session> for SessionContext {
  fn from(session: Session) -> Self { SessionContext { session, ..Default::default() } }
}

impl SessionContext {
  /// Drops the workspace along with the login.
  pub fn logout(&mut self) {
    self.session.logout();
    self.upload = None;
    self.selected = None;
    self.flash.clear();
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
  pub fn new() -> Self { SessionId(Uuid::new_v4()) }

  pub fn parse(s: &str) -> Option<Self> { Uuid::parse_str(s).ok().map(SessionId) }
}

impl Default for SessionId {
  fn default() -> Self { SessionId::new() }
}

impl std::fmt::Display for SessionId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.0.fmt(f) }
}

/// Contexts of logged-in sessions, keyed by the id in the session cookie.
///
/// Anonymous visitors have no entry. A context is created by a successful
/// login and removed again on logout.
#[derive(Debug, Default)]
pub struct SessionStore {
  sessions: Mutex<HashMap<SessionId, SessionContext>>,
}

impl SessionStore {
  pub fn new() -> Self { SessionStore::default() }

  /// Stores `ctx` under a new id.
  pub fn start(&self, ctx: SessionContext) -> SessionId {
    let id = SessionId::new();
    self.lock().insert(id, ctx);
    id
  }

  /// Runs `f` against the context of `id`. Unknown ids yield `None`.
  pub fn with<T>(&self, id: SessionId, f: impl FnOnce(&mut SessionContext) -> T) -> Option<T> {
    self.lock().get_mut(&id).map(f)
  }

  /// Removes the context of `id`, handing it back if there was one.
  pub fn end(&self, id: SessionId) -> Option<SessionContext> { self.lock().remove(&id) }

  pub fn len(&self) -> usize { self.lock().len() }

  fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionContext>> {
    // Contexts hold plain data, so a panic elsewhere cannot leave one half-updated.
    self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}
