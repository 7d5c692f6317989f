use std::fmt::Write;

use super::handlers::PlotForm;
use crate::{
  error::{Level, Notice},
  pipeline::{Chart, NONE, PlotKind},
  render::escape,
};

const TITLE: &str = "Data Visualizer";

const STYLE: &str = "\
body{font-family:sans-serif;max-width:760px;margin:2em auto;color:#202020}\
aside{display:flex;justify-content:space-between;align-items:center;border-bottom:1px solid #ddd;padding-bottom:.5em}\
form{margin:1em 0}label{display:block;margin:.4em 0}\
.notice{padding:.6em 1em;border-radius:4px;margin:.5em 0}\
.success{background:#e6f4ea}.warning{background:#fff4d6}.error{background:#fde7e9}\
table{border-collapse:collapse;font-size:.9em}td,th{border:1px solid #ddd;padding:.2em .6em}";

/// What the workspace page shows for one interaction.
pub struct Workspace {
  pub user:     String,
  pub files:    Vec<String>,
  pub selected: Option<String>,
  /// Name of the pending upload, if any.
  pub upload:   Option<String>,
  pub notices:  Vec<Notice>,
  pub columns:  Vec<String>,
  pub preview:  Vec<Vec<String>>,
  pub form:     PlotForm,
  pub chart:    Option<Chart>,
}

fn document(body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{TITLE}</title>\
     <style>{STYLE}</style></head><body>\n{body}</body></html>\n"
  )
}

pub fn login(error: Option<&str>) -> String {
  let mut body = String::from("<h1>Login</h1>\n");
  if let Some(error) = error {
    notice(&mut body, &Notice::error(error));
  }
  body.push_str(
    "<form method=\"post\" action=\"/login\">\
     <label>Username <input name=\"username\" autocomplete=\"username\"></label>\
     <label>Password <input name=\"password\" type=\"password\" autocomplete=\"current-password\"></label>\
     <button type=\"submit\">Login</button></form>\n",
  );
  document(&body)
}

pub fn workspace(page: &Workspace) -> String {
  let mut body = String::new();

  let _ = write!(
    body,
    "<aside><strong>Welcome, {}!</strong>\
     <form method=\"post\" action=\"/logout\"><button type=\"submit\">Logout</button></form></aside>\n",
    escape(&page.user)
  );
  body.push_str("<h1>Demographic Statistics Visualizer</h1>\n");

  body.push_str(
    "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\
     <label>Upload a CSV file <input type=\"file\" name=\"file\" accept=\".csv\"></label>\
     <button type=\"submit\">Upload</button></form>\n",
  );

  if let Some(name) = &page.upload {
    let _ = write!(
      body,
      "<form method=\"post\" action=\"/upload/clear\">Using <code>{}</code> \
       <button type=\"submit\">Remove upload</button></form>\n",
      escape(name)
    );
  } else if !page.files.is_empty() {
    let _ = write!(
      body,
      "<form method=\"post\" action=\"/select\"><label>Select a file {}</label>\
       <button type=\"submit\">Open</button></form>\n",
      select("file", &page.files, page.selected.as_deref().unwrap_or(NONE))
    );
  }

  for n in &page.notices {
    notice(&mut body, n);
  }

  if page.columns.is_empty() {
    return document(&body);
  }

  body.push_str("<h3>Preview of Data</h3>\n<table><tr>");
  for column in &page.columns {
    let _ = write!(body, "<th>{}</th>", escape(column));
  }
  body.push_str("</tr>\n");
  for row in &page.preview {
    body.push_str("<tr>");
    for cell in row {
      let _ = write!(body, "<td>{}</td>", escape(cell));
    }
    body.push_str("</tr>\n");
  }
  body.push_str("</table>\n");

  let kinds: Vec<String> = PlotKind::ALL.iter().map(|k| k.label().to_string()).collect();
  let _ = write!(
    body,
    "<form method=\"post\" action=\"/plot\">\
     <label>Select the X-axis {}</label>\
     <label>Select the Y-axis {}</label>\
     <label>Select the type of plot {}</label>\
     <button type=\"submit\">Generate Plot</button></form>\n",
    select("x", &page.columns, &page.form.x),
    select("y", &page.columns, &page.form.y),
    options("kind", &kinds, &page.form.kind),
  );

  if let Some(chart) = &page.chart {
    let _ = writeln!(body, "<figure>{}</figure>", chart.svg);
  }

  document(&body)
}

fn notice(body: &mut String, notice: &Notice) {
  let class = match notice.level {
    Level::Success => "success",
    Level::Warning => "warning",
    Level::Error => "error",
  };
  let _ = writeln!(body, "<div class=\"notice {class}\">{}</div>", escape(&notice.text));
}

/// A dropdown with the `None` placeholder in front of `items`.
fn select(name: &str, items: &[String], current: &str) -> String {
  let mut all = Vec::with_capacity(items.len() + 1);
  all.push(NONE.to_string());
  all.extend(items.iter().cloned());
  options(name, &all, current)
}

fn options(name: &str, items: &[String], current: &str) -> String {
  let mut out = format!("<select name=\"{name}\">");
  for item in items {
    let selected = if item == current { " selected" } else { "" };
    let item = escape(item);
    let _ = write!(out, "<option value=\"{item}\"{selected}>{item}</option>");
  }
  out.push_str("</select>");
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  fn page() -> Workspace {
    Workspace {
      user:     "admin".to_string(),
      files:    vec!["a.csv".to_string()],
      selected: None,
      upload:   None,
      notices:  vec![],
      columns:  vec![],
      preview:  vec![],
      form:     PlotForm { x: NONE.to_string(), y: NONE.to_string(), kind: "Line Plot".to_string() },
      chart:    None,
    }
  }

  #[test]
  fn login_page_shows_error() {
    let html = login(Some("Invalid username or password."));
    assert!(html.contains("Invalid username or password."));
    assert!(html.contains("action=\"/login\""));
  }

  #[test]
  fn dropdowns_lead_with_none() {
    let html = select("x", &["a".to_string(), "b".to_string()], "b");
    assert!(html.starts_with("<select name=\"x\"><option value=\"None\">None</option>"));
    assert!(html.contains("<option value=\"b\" selected>b</option>"));
  }

  #[test]
  fn no_dataset_means_no_plot_form() {
    let html = workspace(&page());
    assert!(html.contains("Welcome, admin!"));
    assert!(html.contains("action=\"/select\""));
    assert!(!html.contains("Generate Plot"));
  }

  #[test]
  fn upload_hides_the_file_dropdown() {
    let mut p = page();
    p.upload = Some("mine.csv".to_string());
    let html = workspace(&p);
    assert!(html.contains("mine.csv"));
    assert!(!html.contains("action=\"/select\""));
  }

  #[test]
  fn cells_are_escaped() {
    let mut p = page();
    p.columns = vec!["<b>".to_string()];
    p.preview = vec![vec!["x&y".to_string()]];
    let html = workspace(&p);
    assert!(html.contains("<th>&lt;b&gt;</th>"));
    assert!(html.contains("<td>x&amp;y</td>"));
    assert!(html.contains("Generate Plot"));
  }
}
