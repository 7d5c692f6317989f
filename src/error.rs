//! Error types surfaced to the user.
//!
//! Every failure in an interaction ends up as an [`Error`]. None of them end
//! the process; the web layer turns them into a [`Notice`] on the page.

use polars::error::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  #[error("Invalid username or password.")]
  Auth,

  #[error(transparent)]
  NoData(#[from] NoDataError),

  #[error(transparent)]
  Selection(#[from] SelectionError),

  #[error("{0}")]
  Upload(String),

  #[error("Could not read the CSV file: {0}")]
  Parse(#[source] PolarsError),

  #[error(transparent)]
  Render(#[from] RenderError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoDataError {
  #[error("No CSV files found in the data folder. Please upload a file.")]
  NoFiles,

  #[error("No file selected.")]
  NoneSelected,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
  #[error("Please select a valid X-axis variable.")]
  MissingX,

  #[error("Please select a valid Y-axis variable for this plot.")]
  MissingY,

  #[error("Column '{0}' does not exist in this dataset.")]
  UnknownColumn(String),
}

#[derive(Error, Debug)]
pub enum RenderError {
  #[error("Column '{column}' is not numeric, which a {kind} requires.")]
  NotNumeric { column: String, kind: &'static str },

  #[error("There are no rows to plot once missing values are dropped.")]
  Empty,

  #[error("Failed to draw the chart: {0}")]
  Polars(#[from] PolarsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Success,
  Warning,
  Error,
}

/// A message shown inline on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level: Level,
  pub text:  String,
}

impl Notice {
  pub fn success(text: impl Into<String>) -> Self { Notice { level: Level::Success, text: text.into() } }
  pub fn warning(text: impl Into<String>) -> Self { Notice { level: Level::Warning, text: text.into() } }
  pub fn error(text: impl Into<String>) -> Self { Notice { level: Level::Error, text: text.into() } }
}

impl Error {
  /// How the error is shown, or `None` when the interaction just stops.
  pub fn notice(&self) -> Option<Notice> {
    match self {
      Error::NoData(NoDataError::NoneSelected) => None,
      Error::NoData(e) => Some(Notice::warning(e.to_string())),
      e => Some(Notice::error(e.to_string())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_files_is_a_warning() {
    let notice = Error::from(NoDataError::NoFiles).notice().unwrap();
    assert_eq!(notice.level, Level::Warning);
    assert!(notice.text.starts_with("No CSV files found"));
  }

  #[test]
  fn nothing_selected_is_silent() {
    assert_eq!(Error::from(NoDataError::NoneSelected).notice(), None);
  }

  #[test]
  fn selection_errors_keep_their_message() {
    let notice = Error::from(SelectionError::MissingX).notice().unwrap();
    assert_eq!(notice, Notice::error("Please select a valid X-axis variable."));
  }
}
