//! From a column selection to a rendered chart.

use std::{collections::HashMap, fmt, str::FromStr};

use polars::prelude::*;
use tracing::info;

use crate::{
  Plot,
  axes::HistogramAxes,
  dataset::Dataset,
  error::{RenderError, Result, SelectionError},
  text_values,
};

/// The placeholder the axis dropdowns show when nothing is chosen.
pub const NONE: &str = "None";

const X: &str = "x";
const Y: &str = "y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
  Line,
  Bar,
  Scatter,
  Distribution,
  Count,
}

impl PlotKind {
  pub const ALL: [PlotKind; 5] =
    [PlotKind::Line, PlotKind::Bar, PlotKind::Scatter, PlotKind::Distribution, PlotKind::Count];

  pub fn label(&self) -> &'static str {
    match self {
      PlotKind::Line => "Line Plot",
      PlotKind::Bar => "Bar Chart",
      PlotKind::Scatter => "Scatter Plot",
      PlotKind::Distribution => "Distribution Plot",
      PlotKind::Count => "Count Plot",
    }
  }

  pub fn requires_y(&self) -> bool {
    matches!(self, PlotKind::Line | PlotKind::Bar | PlotKind::Scatter)
  }
}

impl fmt::Display for PlotKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

impl FromStr for PlotKind {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    PlotKind::ALL
      .into_iter()
      .find(|kind| kind.label() == s)
      .ok_or_else(|| format!("unknown plot kind '{s}'"))
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRequest {
  pub x_column: Option<String>,
  pub y_column: Option<String>,
  pub kind:     PlotKind,
}

impl PlotRequest {
  /// Builds a request from dropdown values, where [`NONE`] means unset.
  pub fn from_selection(x: &str, y: &str, kind: PlotKind) -> Self {
    let pick = |v: &str| (v != NONE && !v.is_empty()).then(|| v.to_string());
    PlotRequest { x_column: pick(x), y_column: pick(y), kind }
  }

  /// Checks the selection against the plot kind and the dataset's columns.
  fn validate<'a>(&'a self, dataset: &Dataset) -> Result<Columns<'a>> {
    let x = self.x_column.as_deref().ok_or(SelectionError::MissingX)?;
    let y = || self.y_column.as_deref().ok_or(SelectionError::MissingY);

    let columns = match self.kind {
      PlotKind::Line => Columns::Line { x, y: y()? },
      PlotKind::Bar => Columns::Bar { x, y: y()? },
      PlotKind::Scatter => Columns::Scatter { x, y: y()? },
      PlotKind::Distribution => Columns::Distribution { x },
      PlotKind::Count => Columns::Count { x },
    };

    for column in std::iter::once(x).chain(columns.y()) {
      if !dataset.has_column(column) {
        return Err(SelectionError::UnknownColumn(column.to_string()).into());
      }
    }
    Ok(columns)
  }

  pub fn title(&self) -> String {
    let x = self.x_column.as_deref().unwrap_or(NONE);
    match self.y_column.as_deref() {
      Some(y) if self.kind.requires_y() => format!("{} of {y} vs {x}", self.kind),
      _ => format!("{} of {x}", self.kind),
    }
  }
}

/// The columns a validated request draws. Only the two-column kinds carry `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Columns<'a> {
  Line { x: &'a str, y: &'a str },
  Bar { x: &'a str, y: &'a str },
  Scatter { x: &'a str, y: &'a str },
  Distribution { x: &'a str },
  Count { x: &'a str },
}

impl<'a> Columns<'a> {
  fn kind(&self) -> PlotKind {
    match self {
      Columns::Line { .. } => PlotKind::Line,
      Columns::Bar { .. } => PlotKind::Bar,
      Columns::Scatter { .. } => PlotKind::Scatter,
      Columns::Distribution { .. } => PlotKind::Distribution,
      Columns::Count { .. } => PlotKind::Count,
    }
  }

  fn x(&self) -> &'a str {
    match *self {
      Columns::Line { x, .. }
      | Columns::Bar { x, .. }
      | Columns::Scatter { x, .. }
      | Columns::Distribution { x }
      | Columns::Count { x } => x,
    }
  }

  fn y(&self) -> Option<&'a str> {
    match *self {
      Columns::Line { y, .. } | Columns::Bar { y, .. } | Columns::Scatter { y, .. } => Some(y),
      Columns::Distribution { .. } | Columns::Count { .. } => None,
    }
  }

  fn y_label(&self) -> &'a str {
    match *self {
      Columns::Line { y, .. } | Columns::Bar { y, .. } | Columns::Scatter { y, .. } => y,
      Columns::Distribution { .. } => "Density",
      Columns::Count { .. } => "Count",
    }
  }
}

/// A rendered chart and the text it was labelled with.
#[derive(Debug, Clone)]
pub struct Chart {
  pub title:   String,
  pub x_label: String,
  pub y_label: String,
  pub width:   f64,
  pub height:  f64,
  pub svg:     String,
}

/// Validates `request` and draws it. Nothing is drawn when validation fails.
pub fn generate(dataset: &Dataset, request: &PlotRequest) -> Result<Chart> {
  let columns = request.validate(dataset)?;
  let prepared = prepare(dataset.frame(), columns)?;
  let chart = render(request.title(), columns, &prepared)?;
  info!(kind = %request.kind, x = columns.x(), y = columns.y(), "rendered chart");
  Ok(chart)
}

/// The rows a chart draws, in a frame with an `x` column and, for every kind
/// but a numeric distribution, a `y` column.
///
/// Line and Bar average `y` per distinct `x`; Count and a text distribution
/// count rows per `x`. Rows missing a used value are dropped first.
fn prepare(frame: &DataFrame, columns: Columns) -> std::result::Result<DataFrame, RenderError> {
  let kind = columns.kind();
  let x = columns.x();
  if let Some(y) = columns.y() {
    require_numeric(frame, y, kind)?;
  }

  let prepared = match columns {
    Columns::Line { y, .. } | Columns::Bar { y, .. } => {
      categories(pairs(frame, x, y).group_by_stable([col(X)]).agg([col(Y).mean()]), frame, x)?
    }
    Columns::Scatter { y, .. } => pairs(frame, x, y).collect()?,
    Columns::Distribution { .. } if is_numeric(frame, x)? => single(frame, x).collect()?,
    Columns::Distribution { .. } | Columns::Count { .. } => {
      categories(single(frame, x).group_by_stable([col(X)]).agg([len().alias(Y)]), frame, x)?
    }
  };

  if prepared.height() == 0 {
    return Err(RenderError::Empty);
  }
  Ok(prepared)
}

fn render(
  title: String,
  columns: Columns,
  prepared: &DataFrame,
) -> std::result::Result<Chart, RenderError> {
  let x = columns.x();
  let y_label = columns.y_label();

  // Text x values on Line and Scatter are placed at their category's position.
  let x_values = prepared.column(X)?;
  let (positions, labels) = if x_values.dtype().is_primitive_numeric() {
    (x_values.clone(), None)
  } else {
    let (positions, labels) = encode(x_values)?;
    (positions, Some(labels))
  };

  let mut plot = Plot::new();
  plot.title(&title);
  plot.x.title(x);
  plot.y.title(y_label);

  match columns {
    Columns::Line { .. } => {
      plot.line(&positions, prepared.column(Y)?);
    }
    Columns::Scatter { .. } => {
      plot.scatter(&positions, prepared.column(Y)?);
    }
    Columns::Distribution { .. } if labels.is_none() => {
      let bins = HistogramAxes::auto_bins(prepared.height());
      plot.histogram(x_values, bins)?.kde();
    }
    Columns::Bar { .. } | Columns::Distribution { .. } | Columns::Count { .. } => {
      plot.bar_chart(x_values, prepared.column(Y)?);
    }
  }
  if let (Columns::Line { .. } | Columns::Scatter { .. }, Some(labels)) = (columns, &labels) {
    plot.x_categories(labels);
  }

  let svg = plot.render_svg()?;
  Ok(Chart {
    title,
    x_label: x.to_string(),
    y_label: y_label.to_string(),
    width: plot.style.width(),
    height: plot.style.height(),
    svg,
  })
}

fn is_numeric(frame: &DataFrame, column: &str) -> PolarsResult<bool> {
  Ok(frame.column(column)?.dtype().is_primitive_numeric())
}

fn require_numeric(frame: &DataFrame, column: &str, kind: PlotKind) -> std::result::Result<(), RenderError> {
  if is_numeric(frame, column)? {
    Ok(())
  } else {
    Err(RenderError::NotNumeric { column: column.to_string(), kind: kind.label() })
  }
}

/// The two chosen columns renamed to `x`/`y`, without rows missing either.
fn pairs(frame: &DataFrame, x: &str, y: &str) -> LazyFrame {
  frame
    .clone()
    .lazy()
    .select([col(x).alias(X), col(y).alias(Y)])
    .filter(col(X).is_not_null().and(col(Y).is_not_null()))
}

fn single(frame: &DataFrame, x: &str) -> LazyFrame {
  frame.clone().lazy().select([col(x).alias(X)]).filter(col(X).is_not_null())
}

/// Numeric categories are ordered by value, everything else by first appearance.
fn categories(grouped: LazyFrame, frame: &DataFrame, x: &str) -> PolarsResult<DataFrame> {
  if is_numeric(frame, x)? {
    grouped.sort_by_exprs([col(X)], SortMultipleOptions::default()).collect()
  } else {
    grouped.collect()
  }
}

/// Numbers each value of `column` by the first appearance of its text, and
/// returns those positions with the distinct labels in the same order.
fn encode(column: &Column) -> PolarsResult<(Column, Column)> {
  let mut labels: Vec<String> = vec![];
  let mut seen: HashMap<String, f64> = HashMap::new();
  let mut positions = Vec::with_capacity(column.len());

  for value in text_values(column)? {
    let position = match seen.get(&value) {
      Some(&position) => position,
      None => {
        let position = labels.len() as f64;
        seen.insert(value.clone(), position);
        labels.push(value);
        position
      }
    };
    positions.push(position);
  }

  Ok((Column::new(X.into(), positions), Column::new("labels".into(), labels)))
}
