use kurbo::{Affine, Circle, Point};
use polars::prelude::*;

use crate::{
  bounds::{DataBounds, DataRange},
  numeric_values,
  render::Render,
  theme,
};

pub struct ScatterAxes<'a> {
  x: &'a Column,
  y: &'a Column,
}

/// Marker radius in pixels.
const RADIUS: f64 = 4.0;

impl<'a> ScatterAxes<'a> {
  pub(crate) fn new(x: &'a Column, y: &'a Column) -> Self { ScatterAxes { x, y } }

  pub(crate) fn data_bounds(&self) -> PolarsResult<DataBounds<'_>> {
    Ok(DataBounds { x: DataRange::from_column(self.x)?, y: DataRange::from_column(self.y)? })
  }

  pub(crate) fn draw(&self, render: &mut Render, transform: Affine) -> PolarsResult<()> {
    let xs = numeric_values(self.x)?;
    let ys = numeric_values(self.y)?;

    // Points are placed in view space so their radius is not scaled with the data.
    for point in xs.into_iter().zip(ys).map(|(x, y)| transform * Point::new(x, y)) {
      render.fill(&Circle::new(point, RADIUS), Affine::IDENTITY, theme::SERIES);
    }
    Ok(())
  }
}
