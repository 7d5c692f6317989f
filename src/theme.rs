use color::{HueDirection, Oklch, OpaqueColor, Srgb};
use peniko::Color;

pub struct LinearPalette {
  start: OpaqueColor<Oklch>,
  end:   OpaqueColor<Oklch>,
}

pub const ROCKET: LinearPalette =
  LinearPalette::new(OpaqueColor::new([0.7, 0.13, 50.0]), OpaqueColor::new([0.7, 0.13, 290.0]));

pub const TEXT: Color = Color::from_rgb8(32, 32, 32);
pub const AXIS: Color = Color::from_rgb8(128, 128, 128);
pub const SERIES: Color = Color::from_rgb8(117, 158, 208);
pub const DENSITY: Color = Color::from_rgb8(40, 70, 120);
pub const BACKGROUND: Color = Color::WHITE;

impl LinearPalette {
  pub const fn new(start: OpaqueColor<Oklch>, end: OpaqueColor<Oklch>) -> Self {
    Self { start, end }
  }

  pub fn sample(&self, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    self.start.lerp(self.end, t, HueDirection::Shorter).convert::<Srgb>().with_alpha(1.0)
  }

  /// Evenly spaced colors for `n` categories.
  pub fn categories(&self, n: usize) -> impl Iterator<Item = Color> + '_ {
    (0..n).map(move |i| if n <= 1 { self.sample(0.0) } else { self.sample(i as f32 / (n - 1) as f32) })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn palette_endpoints_differ() {
    let start = ROCKET.sample(0.0).to_rgba8();
    let end = ROCKET.sample(1.0).to_rgba8();
    assert_ne!((start.r, start.g, start.b), (end.r, end.g, end.b));
    assert_eq!(start.a, 255);
  }

  #[test]
  fn one_color_per_category() {
    assert_eq!(ROCKET.categories(4).count(), 4);
    assert_eq!(ROCKET.categories(0).count(), 0);
  }
}
