use std::f64::consts::PI;

use kurbo::{Affine, BezPath, Point, Stroke};
use peniko::Color;
use polars::prelude::*;

use crate::{
  bounds::{DataBounds, DataRange, Range},
  numeric_values,
  render::Render,
  theme,
};

pub struct HistogramAxes {
  range:  Range,
  counts: Vec<u64>,
  kde:    Option<Vec<Point>>,
  values: Vec<f64>,
}

/// Points sampled along the density curve.
const KDE_SAMPLES: usize = 200;

impl HistogramAxes {
  pub(crate) fn new(values: &Column, bins: usize) -> PolarsResult<Self> {
    let values = numeric_values(values)?;
    let bins = bins.max(1);

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if values.is_empty() { Range::empty() } else { Range::new(min, max).non_degenerate() };

    let mut counts = vec![0; bins];
    for v in &values {
      let mut index = ((v - range.min) / range.size() * bins as f64) as usize;
      if index >= bins {
        index = bins - 1;
      }
      counts[index] += 1;
    }

    Ok(HistogramAxes { range, counts, kde: None, values })
  }

  /// Sturges' rule: `ceil(log2(n)) + 1` bins.
  pub fn auto_bins(n: usize) -> usize {
    if n <= 1 { 1 } else { (n as f64).log2().ceil() as usize + 1 }
  }

  pub fn counts(&self) -> &[u64] { &self.counts }

  /// Overlays a Gaussian kernel density estimate scaled to the bar heights.
  ///
  /// The bandwidth follows Scott's rule. Samples without spread have no
  /// meaningful density, so the curve is skipped for them.
  pub fn kde(&mut self) -> &mut Self {
    let n = self.values.len();
    if n < 2 {
      return self;
    }

    let mean = self.values.iter().sum::<f64>() / n as f64;
    let variance =
      self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 || !std_dev.is_finite() {
      return self;
    }

    let bandwidth = std_dev * (n as f64).powf(-0.2);
    let bin_width = self.range.size() / self.counts.len() as f64;
    let scale = n as f64 * bin_width;
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * PI).sqrt());

    let curve = (0..KDE_SAMPLES)
      .map(|i| {
        let x = self.range.min + self.range.size() * i as f64 / (KDE_SAMPLES - 1) as f64;
        let density = self
          .values
          .iter()
          .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
          .sum::<f64>()
          * norm;
        Point::new(x, density * scale)
      })
      .collect();

    self.kde = Some(curve);
    self
  }

  pub(crate) fn data_bounds(&self) -> DataBounds<'_> {
    let highest_bar = self.counts.iter().copied().max().unwrap_or(0) as f64;
    let highest_curve = self.kde.iter().flatten().map(|p| p.y).fold(0.0, f64::max);

    DataBounds {
      x: DataRange::Continuous { range: self.range, margin_min: true, margin_max: true },
      y: DataRange::Continuous {
        range:      Range::new(0.0, highest_bar.max(highest_curve)),
        margin_min: false,
        margin_max: true,
      },
    }
  }

  pub(crate) fn draw(&self, render: &mut Render, transform: Affine) {
    let bins = self.counts.len();
    let width = self.range.size() / bins as f64;

    let mut fill = BezPath::new();
    let mut outline = BezPath::new();
    fill.move_to(Point::new(self.range.min, 0.0));
    for (i, &count) in self.counts.iter().enumerate() {
      let x0 = self.range.min + i as f64 * width;
      let x1 = x0 + width;
      let h = count as f64;

      fill.line_to(Point::new(x0, h));
      fill.line_to(Point::new(x1, h));

      if count != 0 {
        outline.move_to(Point::new(x0, 0.0));
        outline.line_to(Point::new(x0, h));
        outline.line_to(Point::new(x1, h));
        outline.line_to(Point::new(x1, 0.0));
      }
    }
    fill.line_to(Point::new(self.range.max, 0.0));
    fill.close_path();

    let base = theme::ROCKET.sample(0.0);
    render.fill(&fill, transform, base.with_alpha(0.6));
    render.stroke(&(transform * outline), Affine::IDENTITY, Color::WHITE, &Stroke::new(1.0));

    if let Some(curve) = &self.kde {
      let mut path = BezPath::new();
      for (i, &p) in curve.iter().enumerate() {
        if i == 0 {
          path.move_to(p);
        } else {
          path.line_to(p);
        }
      }
      render.stroke(&(transform * path), Affine::IDENTITY, theme::DENSITY, &Stroke::new(2.0));
    }
  }
}
