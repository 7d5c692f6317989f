use kurbo::{Affine, Cap, Line, Point, Stroke};
use polars::prelude::*;

use crate::{
  axes::Axes,
  bounds::{Bounds, DataBounds, DataRange, Range},
  render::{Align, DrawText, FontWeight, Render},
};

mod axes;
mod bounds;
mod render;
mod theme;

pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod session;

pub use config::Config;
pub use dataset::{Dataset, Storage, Upload};
pub use error::{Error, NoDataError, RenderError, Result, SelectionError};
pub use pipeline::{Chart, PlotKind, PlotRequest};
pub use session::{CredentialVerifier, Session, SessionEvent, StaticCredentials};

#[derive(Default)]
pub struct Plot<'a> {
  title:     Option<String>,
  pub x:     Axis,
  pub y:     Axis,
  pub style: ChartStyle,

  /// Labels for an x axis whose data are category positions `0..n`.
  x_categories: Option<&'a Column>,
  axes:         Vec<Axes<'a>>,
}

#[derive(Default)]
pub struct Axis {
  title: Option<String>,
}

/// Output geometry. Font sizes are in points, converted with `dpi`.
#[derive(Clone, Copy, Debug)]
pub struct ChartStyle {
  pub width_in:        f64,
  pub height_in:       f64,
  pub dpi:             f64,
  pub title_size:      f64,
  pub label_size:      f64,
  pub tick_label_size: f64,
}

impl Default for ChartStyle {
  fn default() -> Self {
    ChartStyle {
      width_in:        6.0,
      height_in:       4.0,
      dpi:             100.0,
      title_size:      12.0,
      label_size:      10.0,
      tick_label_size: 10.0,
    }
  }
}

impl ChartStyle {
  pub fn width(&self) -> f64 { self.width_in * self.dpi }
  pub fn height(&self) -> f64 { self.height_in * self.dpi }

  fn px(&self, points: f64) -> f64 { points * self.dpi / 72.0 }
}

/// Non-null values of a numeric column as `f64`, in row order.
pub(crate) fn numeric_values(column: &Column) -> PolarsResult<Vec<f64>> {
  let cast = column.cast(&DataType::Float64)?;
  Ok(cast.as_materialized_series().f64()?.into_iter().flatten().collect())
}

/// Every value of a column rendered as text; missing values become empty strings.
pub(crate) fn text_values(column: &Column) -> PolarsResult<Vec<String>> {
  let cast = column.cast(&DataType::String)?;
  Ok(cast.as_materialized_series().str()?.into_iter().map(|v| v.unwrap_or("").to_string()).collect())
}

impl<'a> Plot<'a> {
  pub fn new() -> Plot<'a> { Plot::default() }

  pub fn title(&mut self, title: &str) -> &mut Self {
    self.title = Some(title.to_string());
    self
  }

  /// Shows `labels` along the x axis, one per integer position.
  pub fn x_categories(&mut self, labels: &'a Column) -> &mut Self {
    self.x_categories = Some(labels);
    self
  }
}

impl Axis {
  pub fn title(&mut self, title: &str) -> &mut Self {
    self.title = Some(title.to_string());
    self
  }
}

/// Room left around the data area for labels, in pixels.
struct Margins {
  left:   f64,
  right:  f64,
  top:    f64,
  bottom: f64,
}

const MARGINS: Margins = Margins { left: 70.0, right: 20.0, top: 40.0, bottom: 60.0 };
const TICKS: u32 = 8;
/// Categorical labels are slanted once there are more than this many.
const UPRIGHT_LABELS: usize = 8;

impl Plot<'_> {
  /// Draws the plot into an SVG document sized by `style`.
  pub fn render_svg(&self) -> PolarsResult<String> {
    let mut render = Render::new(self.style.width(), self.style.height(), theme::BACKGROUND);
    self.draw(&mut render)?;
    Ok(render.finish())
  }

  fn data_bounds(&self) -> PolarsResult<Option<DataBounds<'_>>> {
    let mut bounds: Option<DataBounds> = None;
    for ax in &self.axes {
      let b = ax.data_bounds()?;
      bounds = Some(match bounds {
        None => b,
        Some(prev) => DataBounds { x: prev.x.union(b.x), y: prev.y.union(b.y) },
      });
    }
    Ok(bounds)
  }

  fn draw(&self, render: &mut Render) -> PolarsResult<()> {
    let style = &self.style;
    let viewport = Bounds::new(
      Range::new(MARGINS.left, style.width() - MARGINS.right),
      Range::new(style.height() - MARGINS.bottom, MARGINS.top),
    );

    if let Some(title) = &self.title {
      render.draw_text(DrawText {
        text: title,
        size: style.px(style.title_size),
        weight: FontWeight::Bold,
        brush: theme::TEXT,
        position: Point { x: viewport.x.min + viewport.width() / 2.0, y: MARGINS.top - 12.0 },
        horizontal_align: Align::Center,
        vertical_align: Align::End,
        ..Default::default()
      });
    }

    if let Some(x_label) = &self.x.title {
      render.draw_text(DrawText {
        text: x_label,
        size: style.px(style.label_size),
        position: Point { x: viewport.x.min + viewport.width() / 2.0, y: style.height() - 8.0 },
        brush: theme::TEXT,
        horizontal_align: Align::Center,
        vertical_align: Align::End,
        ..Default::default()
      });
    }

    if let Some(y_label) = &self.y.title {
      render.draw_text(DrawText {
        text: y_label,
        size: style.px(style.label_size),
        position: Point { x: 16.0, y: viewport.y.max - viewport.height() / 2.0 },
        brush: theme::TEXT,
        rotate: -90.0,
        horizontal_align: Align::Center,
        vertical_align: Align::Center,
        ..Default::default()
      });
    }

    let border_stroke = Stroke::new(1.5);
    render.stroke(
      &Line::new(
        Point::new(viewport.x.min, viewport.y.min),
        Point::new(viewport.x.max, viewport.y.min),
      ),
      Affine::IDENTITY,
      theme::AXIS,
      &border_stroke,
    );
    render.stroke(
      &Line::new(
        Point::new(viewport.x.min, viewport.y.min),
        Point::new(viewport.x.min, viewport.y.max),
      ),
      Affine::IDENTITY,
      theme::AXIS,
      &border_stroke,
    );

    let Some(mut data_bounds) = self.data_bounds()? else { return Ok(()) };
    if let Some(labels) = self.x_categories {
      data_bounds.x = DataRange::Categorical(labels);
    }

    let x_range = data_bounds.x.resolve();
    let y_range = data_bounds.y.resolve();
    let transform = Bounds::new(x_range.non_degenerate(), y_range.non_degenerate()).transform_to(viewport);

    let tick_stroke = border_stroke.clone().with_caps(Cap::Butt);
    let tick_size = style.px(style.tick_label_size);

    match data_bounds.y {
      DataRange::Categorical(labels) => {
        for (i, label) in text_values(labels)?.iter().enumerate() {
          let vy = (transform * Point::new(0.0, i as f64)).y;
          self.draw_y_tick(render, viewport, vy, label, tick_size, &tick_stroke);
        }
      }
      DataRange::Continuous { .. } => {
        let iter = y_range.nice_ticks(TICKS);
        let decimals = iter.decimals();
        for (y, vy) in iter
          .map(|v| (v, (transform * Point::new(0.0, v)).y))
          .filter(|(_, vy)| viewport.y.contains(vy))
        {
          self.draw_y_tick(render, viewport, vy, &format!("{y:.decimals$}"), tick_size, &tick_stroke);
        }
      }
    }

    match data_bounds.x {
      DataRange::Categorical(labels) => {
        let labels = text_values(labels)?;
        let slanted = labels.len() > UPRIGHT_LABELS;
        for (i, label) in labels.iter().enumerate() {
          let vx = (transform * Point::new(i as f64, 0.0)).x;
          self.draw_x_tick(render, viewport, vx, label, tick_size, slanted, &tick_stroke);
        }
      }
      DataRange::Continuous { .. } => {
        let iter = x_range.nice_ticks(TICKS);
        let decimals = iter.decimals();
        for (x, vx) in iter
          .map(|v| (v, (transform * Point::new(v, 0.0)).x))
          .filter(|(_, vx)| viewport.x.contains(vx))
        {
          self.draw_x_tick(
            render,
            viewport,
            vx,
            &format!("{x:.decimals$}"),
            tick_size,
            false,
            &tick_stroke,
          );
        }
      }
    }

    for ax in &self.axes {
      ax.draw(render, transform)?;
    }

    Ok(())
  }

  fn draw_y_tick(
    &self,
    render: &mut Render,
    viewport: Bounds,
    vy: f64,
    label: &str,
    size: f64,
    stroke: &Stroke,
  ) {
    render.stroke(
      &Line::new(Point::new(viewport.x.min, vy), Point::new(viewport.x.min - 6.0, vy)),
      Affine::IDENTITY,
      theme::AXIS,
      stroke,
    );
    render.draw_text(DrawText {
      text: label,
      size,
      position: Point { x: viewport.x.min - 9.0, y: vy },
      brush: theme::TEXT,
      horizontal_align: Align::End,
      vertical_align: Align::Center,
      ..Default::default()
    });
  }

  #[allow(clippy::too_many_arguments)]
  fn draw_x_tick(
    &self,
    render: &mut Render,
    viewport: Bounds,
    vx: f64,
    label: &str,
    size: f64,
    slanted: bool,
    stroke: &Stroke,
  ) {
    render.stroke(
      &Line::new(Point::new(vx, viewport.y.min), Point::new(vx, viewport.y.min + 6.0)),
      Affine::IDENTITY,
      theme::AXIS,
      stroke,
    );
    render.draw_text(DrawText {
      text: label,
      size,
      position: Point { x: vx, y: viewport.y.min + 9.0 },
      brush: theme::TEXT,
      rotate: if slanted { -45.0 } else { 0.0 },
      horizontal_align: if slanted { Align::End } else { Align::Center },
      vertical_align: Align::Start,
      ..Default::default()
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_style_is_six_by_four_inches() {
    let style = ChartStyle::default();
    assert_eq!((style.width(), style.height()), (600.0, 400.0));
  }

  #[test]
  fn empty_plot_still_renders_labels() {
    let mut plot = Plot::new();
    plot.title("Nothing here");
    plot.x.title("x");
    plot.y.title("y");

    let svg = plot.render_svg().unwrap();
    assert!(svg.contains("Nothing here"));
    assert!(svg.contains(r#"transform="rotate(-90"#));
  }

  #[test]
  fn scatter_plot_draws_ticks_and_points() {
    let df = df! {
      "a" => &[1.0, 2.0, 3.0],
      "b" => &[10.0, 20.0, 30.0],
    }
    .unwrap();

    let mut plot = Plot::new();
    plot.scatter(df.column("a").unwrap(), df.column("b").unwrap());
    let svg = plot.render_svg().unwrap();

    assert!(svg.contains(">20</text>"));
    assert!(svg.contains(">2.0</text>") || svg.contains(">2</text>"));
  }

  #[test]
  fn category_labels_replace_numeric_x_ticks() {
    let df = df! {
      "pos" => &[0.0, 1.0, 0.0],
      "v" => &[3.0, 4.0, 5.0],
    }
    .unwrap();
    let labels = Column::new("labels".into(), ["north", "south"]);

    let mut plot = Plot::new();
    plot.scatter(df.column("pos").unwrap(), df.column("v").unwrap());
    plot.x_categories(&labels);
    let svg = plot.render_svg().unwrap();

    assert!(svg.contains(">north</text>"));
    assert!(svg.contains(">south</text>"));
    assert!(!svg.contains(">0.5</text>"));
  }

  #[test]
  fn text_values_blank_out_nulls() {
    let column = Column::new("c".into(), [Some(1i64), None, Some(3)]);
    assert_eq!(text_values(&column).unwrap(), vec!["1", "", "3"]);
  }

  #[test]
  fn numeric_values_skip_nulls() {
    let column = Column::new("c".into(), [Some(1i64), None, Some(3)]);
    assert_eq!(numeric_values(&column).unwrap(), vec![1.0, 3.0]);
  }
}
