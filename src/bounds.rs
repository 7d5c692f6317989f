use kurbo::Affine;
use polars::{error::PolarsResult, prelude::Column};

use crate::numeric_values;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
  pub x: Range,
  pub y: Range,
}

#[derive(Clone, Copy)]
pub struct DataBounds<'a> {
  pub x: DataRange<'a>,
  pub y: DataRange<'a>,
}

/// The extent of one axis in data space.
#[derive(Clone, Copy)]
pub enum DataRange<'a> {
  Continuous { range: Range, margin_min: bool, margin_max: bool },
  /// One slot per label, centered on the label's index.
  Categorical(&'a Column),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
  pub min: f64,
  pub max: f64,
}

/// Fraction of the data extent added on a side that has a margin.
const MARGIN: f64 = 0.05;

impl From<Range> for DataRange<'_> {
  fn from(range: Range) -> Self { DataRange::Continuous { range, margin_min: true, margin_max: true } }
}

impl Bounds {
  pub const fn new(x: Range, y: Range) -> Self { Bounds { x, y } }

  pub fn width(&self) -> f64 { self.x.size() }
  pub fn height(&self) -> f64 { self.y.size() }

  pub(crate) fn transform_to(&self, viewport: Bounds) -> Affine {
    let scale_x = viewport.x.size() / self.x.size();
    let scale_y = viewport.y.size() / self.y.size();
    let translate_x = viewport.x.min - self.x.min * scale_x;
    let translate_y = viewport.y.min - self.y.min * scale_y;

    Affine::new([scale_x, 0.0, 0.0, scale_y, translate_x, translate_y])
  }
}

impl Default for Range {
  fn default() -> Self { Range::empty() }
}

impl Range {
  pub const fn empty() -> Self { Range { min: 0.0, max: 0.0 } }
  pub const fn new(min: f64, max: f64) -> Self { Range { min, max } }
  pub const fn size(&self) -> f64 { self.max - self.min }

  /// Works for reversed ranges too, as viewport y ranges are.
  pub fn contains(&self, value: &f64) -> bool {
    (*value >= self.min && *value <= self.max) || (*value <= self.min && *value >= self.max)
  }

  pub fn union(&self, other: Range) -> Range {
    if self.size() == 0.0 {
      other
    } else if other.size() == 0.0 {
      *self
    } else {
      Range { min: self.min.min(other.min), max: self.max.max(other.max) }
    }
  }

  /// Widens a degenerate range so it can be mapped onto a viewport.
  pub fn non_degenerate(self) -> Range {
    if self.size() == 0.0 { Range::new(self.min - 0.5, self.max + 0.5) } else { self }
  }

  pub fn nice_ticks(&self, count: u32) -> NiceTicksIter {
    let step = (self.max - self.min) / f64::from(count);
    if !step.is_finite() || step <= 0.0 {
      return NiceTicksIter::new(0.0, -1.0, 1.0, 0);
    }

    let k = step.log10().floor();
    let base = step / 10f64.powf(k);

    let nice_base = match base {
      b if b < 1.0 => 1.0,
      b if b < 2.0 => 2.0,
      b if b < 2.5 => 2.5,
      b if b < 5.0 => 5.0,
      _ => 10.0,
    };

    let step = nice_base * 10f64.powf(k);
    let lo = (self.min / step).floor() * step;
    let hi = (self.max / step).ceil() * step;

    // 2.5 needs one more digit than its exponent suggests.
    let extra = if nice_base == 2.5 { 1 } else { 0 };
    let decimals = (-k as i32 + extra).max(0) as usize;
    NiceTicksIter::new(lo, hi, step, decimals)
  }
}

impl DataRange<'_> {
  pub(crate) fn from_column<'b>(column: &Column) -> PolarsResult<DataRange<'b>> {
    let values = numeric_values(column)?;
    let range = values
      .iter()
      .fold(None, |acc: Option<Range>, &v| match acc {
        None => Some(Range::new(v, v)),
        Some(r) => Some(Range::new(r.min.min(v), r.max.max(v))),
      })
      .unwrap_or_default();

    Ok(DataRange::Continuous { range, margin_min: true, margin_max: true })
  }

  /// The range in data space this axis covers once margins are applied.
  pub(crate) fn resolve(&self) -> Range {
    match *self {
      DataRange::Continuous { range, margin_min, margin_max } => {
        let range = range.non_degenerate();
        let pad = range.size() * MARGIN;
        Range::new(
          if margin_min { range.min - pad } else { range.min },
          if margin_max { range.max + pad } else { range.max },
        )
      }
      DataRange::Categorical(labels) => Range::new(-0.5, labels.len().max(1) as f64 - 0.5),
    }
  }

  pub(crate) fn union(self, other: Self) -> Self {
    match (self, other) {
      (
        DataRange::Continuous { range: a, margin_min: a_min, margin_max: a_max },
        DataRange::Continuous { range: b, margin_min: b_min, margin_max: b_max },
      ) => DataRange::Continuous {
        range:      a.union(b),
        margin_min: a_min && b_min,
        margin_max: a_max && b_max,
      },
      // Categorical layers own their axis; the first one wins.
      (c @ DataRange::Categorical(_), _) => c,
      (_, c @ DataRange::Categorical(_)) => c,
    }
  }
}

pub struct NiceTicksIter {
  current:  f64,
  step:     f64,
  hi:       f64,
  decimals: usize,
}

impl NiceTicksIter {
  fn new(lo: f64, hi: f64, step: f64, decimals: usize) -> Self {
    NiceTicksIter { current: lo, step, hi, decimals }
  }

  /// Number of fractional digits needed to print every tick exactly.
  pub fn decimals(&self) -> usize { self.decimals }
}

impl Iterator for NiceTicksIter {
  type Item = f64;
  fn next(&mut self) -> Option<Self::Item> {
    if self.current < self.hi + self.step * 0.5 {
      let p = 10f64.powi(self.decimals as i32 + 1);
      let result = (self.current * p).round() / p;
      self.current += self.step;
      Some(result)
    } else {
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn nice_ticks_cover_the_range() {
    let ticks: Vec<f64> = Range::new(0.0, 10.0).nice_ticks(10).collect();
    assert_eq!(ticks.first(), Some(&0.0));
    assert_eq!(ticks.last(), Some(&10.0));
    assert_eq!(ticks, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
  }

  #[test]
  fn nice_ticks_pick_round_steps() {
    let iter = Range::new(0.0, 0.37).nice_ticks(10);
    assert_eq!(iter.decimals(), 2);
    let ticks: Vec<f64> = iter.collect();
    assert_eq!(ticks[1], 0.05);
  }

  #[test]
  fn degenerate_range_has_no_ticks() {
    assert_eq!(Range::new(3.0, 3.0).nice_ticks(10).count(), 0);
  }

  #[test]
  fn degenerate_range_is_widened() {
    assert_eq!(Range::new(3.0, 3.0).non_degenerate(), Range::new(2.5, 3.5));
  }

  #[test]
  fn union_ignores_empty_ranges() {
    let a = Range::new(1.0, 4.0);
    assert_eq!(Range::empty().union(a), a);
    assert_eq!(a.union(Range::new(-2.0, 2.0)), Range::new(-2.0, 4.0));
  }

  #[test]
  fn transform_maps_corners() {
    let data = Bounds::new(Range::new(0.0, 10.0), Range::new(0.0, 5.0));
    let view = Bounds::new(Range::new(100.0, 200.0), Range::new(300.0, 50.0));
    let t = data.transform_to(view);

    let origin = t * kurbo::Point::new(0.0, 0.0);
    let corner = t * kurbo::Point::new(10.0, 5.0);
    assert_eq!((origin.x, origin.y), (100.0, 300.0));
    assert_eq!((corner.x, corner.y), (200.0, 50.0));
  }

  #[test]
  fn continuous_range_gets_margins() {
    let range: DataRange = Range::new(0.0, 10.0).into();
    assert_eq!(range.resolve(), Range::new(-0.5, 10.5));

    let floor = DataRange::Continuous {
      range:      Range::new(0.0, 10.0),
      margin_min: false,
      margin_max: true,
    };
    assert_eq!(floor.resolve(), Range::new(0.0, 10.5));
  }
}
