use kurbo::{Affine, BezPath, Point, Stroke};
use polars::prelude::*;

use crate::{
  bounds::{DataBounds, DataRange},
  numeric_values,
  render::Render,
  theme,
};

pub struct LineAxes<'a> {
  x: &'a Column,
  y: &'a Column,
}

const WIDTH: f64 = 2.0;

impl<'a> LineAxes<'a> {
  pub(crate) fn new(x: &'a Column, y: &'a Column) -> Self { LineAxes { x, y } }

  pub(crate) fn data_bounds(&self) -> PolarsResult<DataBounds<'_>> {
    Ok(DataBounds { x: DataRange::from_column(self.x)?, y: DataRange::from_column(self.y)? })
  }

  pub(crate) fn draw(&self, render: &mut Render, transform: Affine) -> PolarsResult<()> {
    let xs = numeric_values(self.x)?;
    let ys = numeric_values(self.y)?;

    let mut shape = BezPath::new();
    for (i, point) in xs.into_iter().zip(ys).map(|(x, y)| Point::new(x, y)).enumerate() {
      if i == 0 {
        shape.move_to(point);
      } else {
        shape.line_to(point);
      }
    }

    render.stroke(&(transform * shape), Affine::IDENTITY, theme::SERIES, &Stroke::new(WIDTH));
    Ok(())
  }
}
