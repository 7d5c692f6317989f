use axum::{
  Form,
  extract::{Multipart, State},
  http::StatusCode,
  response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{AppState, expired_session_cookie, session_cookie, session_id, view};
use crate::{
  dataset::{self, Loaded, Upload},
  error::{Error, Notice},
  pipeline::{self, NONE, PlotKind, PlotRequest},
  session::{Session, SessionContext, SessionEvent, SessionId},
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectForm {
  #[serde(default)]
  pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlotForm {
  #[serde(default)]
  pub x:    String,
  #[serde(default)]
  pub y:    String,
  #[serde(default)]
  pub kind: String,
}

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
  match logged_in(&state, &jar) {
    Some((id, user)) => Html(workspace(&state, id, user, None, vec![])).into_response(),
    None => Html(view::login(None)).into_response(),
  }
}

pub async fn login(
  State(state): State<AppState>,
  jar: CookieJar,
  Form(form): Form<LoginForm>,
) -> Response {
  let mut session = Session::new();
  session.attempt_login(state.credentials.as_ref(), &form.username, &form.password);
  if !refresh(&session.take_events()) {
    let page = view::login(Some(&Error::Auth.to_string()));
    return (StatusCode::UNAUTHORIZED, Html(page)).into_response();
  }

  // Logging in again replaces whatever session the browser held before.
  if let Some(previous) = session_id(&jar) {
    state.sessions.end(previous);
  }
  let mut ctx = SessionContext::from(session);
  ctx.flash.push(Notice::success("Login successful!"));
  let id = state.sessions.start(ctx);

  (jar.add(session_cookie(id)), Redirect::to("/")).into_response()
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
  let mut ctx = session_id(&jar).and_then(|id| state.sessions.end(id)).unwrap_or_default();
  ctx.logout();
  (jar.remove(expired_session_cookie()), Redirect::to("/")).into_response()
}

pub async fn upload(
  State(state): State<AppState>,
  jar: CookieJar,
  mut multipart: Multipart,
) -> Response {
  let Some((id, user)) = logged_in(&state, &jar) else {
    return Html(view::login(None)).into_response();
  };

  let upload = match read_upload(&mut multipart).await {
    Ok(upload) => upload,
    Err(e) => {
      warn!("upload rejected: {e}");
      let notices = e.notice().into_iter().collect();
      let page = workspace(&state, id, user, None, notices);
      return (StatusCode::BAD_REQUEST, Html(page)).into_response();
    }
  };

  debug!(file = %upload.name, bytes = upload.bytes.len(), "received upload");
  state.sessions.with(id, |ctx| ctx.upload = Some(upload));
  Redirect::to("/").into_response()
}

pub async fn clear_upload(State(state): State<AppState>, jar: CookieJar) -> Response {
  let Some((id, _)) = logged_in(&state, &jar) else {
    return Html(view::login(None)).into_response();
  };

  state.sessions.with(id, |ctx| ctx.upload = None);
  Redirect::to("/").into_response()
}

pub async fn select(
  State(state): State<AppState>,
  jar: CookieJar,
  Form(form): Form<SelectForm>,
) -> Response {
  let Some((id, _)) = logged_in(&state, &jar) else {
    return Html(view::login(None)).into_response();
  };

  let selected = (form.file != NONE && !form.file.is_empty()).then_some(form.file);
  state.sessions.with(id, |ctx| ctx.selected = selected);
  Redirect::to("/").into_response()
}

pub async fn plot(
  State(state): State<AppState>,
  jar: CookieJar,
  Form(form): Form<PlotForm>,
) -> Response {
  let Some((id, user)) = logged_in(&state, &jar) else {
    return Html(view::login(None)).into_response();
  };

  Html(workspace(&state, id, user, Some(form), vec![])).into_response()
}

/// The session and user behind the request's cookie, if it is logged in.
fn logged_in(state: &AppState, jar: &CookieJar) -> Option<(SessionId, String)> {
  let id = session_id(jar)?;
  let user = state
    .sessions
    .with(id, |ctx| ctx.session.current_user().map(str::to_string))
    .flatten()?;
  Some((id, user))
}

fn refresh(events: &[SessionEvent]) -> bool { events.contains(&SessionEvent::StateChanged) }

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, Error> {
  while let Some(field) =
    multipart.next_field().await.map_err(|e| Error::Upload(format!("Upload failed: {e}")))?
  {
    if field.name() != Some("file") {
      continue;
    }
    let name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(|e| Error::Upload(format!("Upload failed: {e}")))?;
    return Upload::new(name, bytes.to_vec());
  }
  Err(Error::Upload("No file was attached.".to_string()))
}

/// Builds the page for one interaction: load the dataset, then draw the
/// requested chart if there is one.
fn workspace(
  state: &AppState,
  id: SessionId,
  user: String,
  plot: Option<PlotForm>,
  notices: Vec<Notice>,
) -> String {
  // Work on a snapshot so parsing and drawing happen outside the session lock.
  let (upload, selected, mut flash) = state
    .sessions
    .with(id, |ctx| (ctx.upload.clone(), ctx.selected.clone(), std::mem::take(&mut ctx.flash)))
    .unwrap_or_default();
  flash.extend(notices);
  let mut notices = flash;

  let files = state.storage.list().unwrap_or_else(|e| {
    notices.extend(e.notice());
    vec![]
  });

  let mut page = view::Workspace {
    user,
    files,
    selected: selected.clone(),
    upload: upload.as_ref().map(|u| u.name.clone()),
    notices,
    columns: vec![],
    preview: vec![],
    form: plot.clone().unwrap_or_else(|| PlotForm {
      x:    NONE.to_string(),
      y:    NONE.to_string(),
      kind: PlotKind::Line.label().to_string(),
    }),
    chart: None,
  };

  let loaded = match dataset::load(&state.storage, upload.as_ref(), selected.as_deref()) {
    Ok(loaded) => loaded,
    Err(e) => {
      page.notices.extend(e.notice());
      return view::workspace(&page);
    }
  };

  if matches!(loaded, Loaded::Uploaded(_)) {
    page.notices.push(Notice::success("File uploaded successfully!"));
  }

  let dataset = loaded.dataset();
  page.columns = dataset.columns();
  match dataset.preview(state.preview_rows) {
    Ok(rows) => page.preview = rows,
    Err(e) => page.notices.extend(e.notice()),
  }

  if let Some(form) = plot {
    let result = form
      .kind
      .parse::<PlotKind>()
      .map_err(Notice::error)
      .and_then(|kind| {
        let request = PlotRequest::from_selection(&form.x, &form.y, kind);
        pipeline::generate(dataset, &request).map_err(|e| {
          warn!("plot failed: {e}");
          e.notice().unwrap_or_else(|| Notice::error(e.to_string()))
        })
      });

    match result {
      Ok(chart) => page.chart = Some(chart),
      Err(notice) => page.notices.push(notice),
    }
  }

  view::workspace(&page)
}
