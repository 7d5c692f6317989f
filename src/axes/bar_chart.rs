use kurbo::{Affine, Rect};
use polars::prelude::*;

use crate::{
  bounds::{DataBounds, DataRange, Range},
  numeric_values,
  render::Render,
  theme,
};

pub struct BarChartAxes<'a> {
  labels: &'a Column,
  values: &'a Column,
}

/// Half the width of a bar, in category slots.
const HALF_WIDTH: f64 = 0.4;

impl<'a> BarChartAxes<'a> {
  pub(crate) fn new(labels: &'a Column, values: &'a Column) -> Self {
    BarChartAxes { labels, values }
  }

  pub(crate) fn data_bounds(&self) -> PolarsResult<DataBounds<'_>> {
    let values = numeric_values(self.values)?;
    let min = values.iter().copied().fold(0.0_f64, f64::min);
    let max = values.iter().copied().fold(0.0_f64, f64::max);

    Ok(DataBounds {
      x: DataRange::Categorical(self.labels),
      y: DataRange::Continuous {
        range:      Range::new(min, max),
        margin_min: min < 0.0,
        margin_max: max > 0.0,
      },
    })
  }

  pub(crate) fn draw(&self, render: &mut Render, transform: Affine) -> PolarsResult<()> {
    let values = numeric_values(self.values)?;
    let colors = theme::ROCKET.categories(values.len());

    for ((x, value), color) in values.into_iter().enumerate().zip(colors) {
      let bar = Rect::new(x as f64 - HALF_WIDTH, 0.0, x as f64 + HALF_WIDTH, value);
      render.fill(&bar, transform, color);
    }
    Ok(())
  }
}
