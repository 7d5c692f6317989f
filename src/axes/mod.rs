mod bar_chart;
mod histogram;
mod line;
mod scatter;

pub use bar_chart::BarChartAxes;
pub use histogram::HistogramAxes;
pub use line::LineAxes;
pub use scatter::ScatterAxes;

use kurbo::Affine;
use polars::prelude::*;

use crate::{Plot, bounds::DataBounds, render::Render};

pub enum Axes<'a> {
  Scatter(ScatterAxes<'a>),
  Line(LineAxes<'a>),
  BarChart(BarChartAxes<'a>),
  Histogram(HistogramAxes),
}

impl<'a> Plot<'a> {
  pub fn scatter(&mut self, x: &'a Column, y: &'a Column) -> &mut ScatterAxes<'a> {
    self.axes.push(Axes::Scatter(ScatterAxes::new(x, y)));
    match self.axes.last_mut() {
      Some(Axes::Scatter(sa)) => sa,
      _ => unreachable!(),
    }
  }

  pub fn line(&mut self, x: &'a Column, y: &'a Column) -> &mut LineAxes<'a> {
    self.axes.push(Axes::Line(LineAxes::new(x, y)));
    match self.axes.last_mut() {
      Some(Axes::Line(la)) => la,
      _ => unreachable!(),
    }
  }

  pub fn bar_chart(&mut self, labels: &'a Column, values: &'a Column) -> &mut BarChartAxes<'a> {
    self.axes.push(Axes::BarChart(BarChartAxes::new(labels, values)));
    match self.axes.last_mut() {
      Some(Axes::BarChart(ba)) => ba,
      _ => unreachable!(),
    }
  }

  /// Bins `values` into `bins` equal-width buckets.
  pub fn histogram(&mut self, values: &Column, bins: usize) -> PolarsResult<&mut HistogramAxes> {
    self.axes.push(Axes::Histogram(HistogramAxes::new(values, bins)?));
    match self.axes.last_mut() {
      Some(Axes::Histogram(ha)) => Ok(ha),
      _ => unreachable!(),
    }
  }
}

impl Axes<'_> {
  pub(crate) fn data_bounds(&self) -> PolarsResult<DataBounds<'_>> {
    match self {
      Axes::Scatter(sa) => sa.data_bounds(),
      Axes::Line(la) => la.data_bounds(),
      Axes::BarChart(ba) => ba.data_bounds(),
      Axes::Histogram(ha) => Ok(ha.data_bounds()),
    }
  }

  pub(crate) fn draw(&self, render: &mut Render, transform: Affine) -> PolarsResult<()> {
    match self {
      Axes::Scatter(sa) => sa.draw(render, transform),
      Axes::Line(la) => la.draw(render, transform),
      Axes::BarChart(ba) => ba.draw(render, transform),
      Axes::Histogram(ha) => {
        ha.draw(render, transform);
        Ok(())
      }
    }
  }
}
