use std::fmt::Write;

use kurbo::{Affine, Point, Shape, Stroke};
use peniko::Color;

mod svg;

pub(crate) use svg::escape;

/// Shapes are flattened with this accuracy, in output pixels.
const TOLERANCE: f64 = 0.1;

/// Collects drawing commands into an SVG document.
pub(crate) struct Render {
  width:      f64,
  height:     f64,
  background: Color,
  body:       String,
}

#[derive(Clone, Copy, Default, PartialEq)]
pub(crate) enum Align {
  #[default]
  Start,
  Center,
  End,
}

#[derive(Clone, Copy, Default, PartialEq)]
pub(crate) enum FontWeight {
  #[default]
  Normal,
  Bold,
}

pub(crate) struct DrawText<'a> {
  pub text:             &'a str,
  pub size:             f64,
  pub weight:           FontWeight,
  pub brush:            Color,
  pub position:         Point,
  /// Clockwise rotation in degrees around `position`.
  pub rotate:           f64,
  pub horizontal_align: Align,
  pub vertical_align:   Align,
}

impl Default for DrawText<'_> {
  fn default() -> Self {
    DrawText {
      text:             "",
      size:             12.0,
      weight:           FontWeight::Normal,
      brush:            Color::BLACK,
      position:         Point::ZERO,
      rotate:           0.0,
      horizontal_align: Align::Start,
      vertical_align:   Align::Start,
    }
  }
}

impl Render {
  pub fn new(width: f64, height: f64, background: Color) -> Self {
    Render { width, height, background, body: String::new() }
  }

  pub fn fill(&mut self, shape: &impl Shape, transform: Affine, color: Color) {
    let path = transform * shape.to_path(TOLERANCE);
    if path.elements().is_empty() {
      return;
    }

    let _ = writeln!(self.body, r#"<path d="{}" {} stroke="none"/>"#, svg::path_data(&path), svg::fill(color));
  }

  pub fn stroke(&mut self, shape: &impl Shape, transform: Affine, color: Color, stroke: &Stroke) {
    let path = transform * shape.to_path(TOLERANCE);
    if path.elements().is_empty() {
      return;
    }

    let _ = writeln!(
      self.body,
      r#"<path d="{}" fill="none" {} stroke-width="{}" stroke-linejoin="round"/>"#,
      svg::path_data(&path),
      svg::stroke(color),
      svg::num(stroke.width)
    );
  }

  pub fn draw_text(&mut self, text: DrawText) {
    let anchor = match text.horizontal_align {
      Align::Start => "start",
      Align::Center => "middle",
      Align::End => "end",
    };
    let baseline = match text.vertical_align {
      Align::Start => "hanging",
      Align::Center => "central",
      Align::End => "alphabetic",
    };
    let weight = match text.weight {
      FontWeight::Normal => "normal",
      FontWeight::Bold => "bold",
    };

    let x = svg::num(text.position.x);
    let y = svg::num(text.position.y);
    let transform = if text.rotate != 0.0 {
      format!(r#" transform="rotate({} {x} {y})""#, svg::num(text.rotate))
    } else {
      String::new()
    };

    let _ = writeln!(
      self.body,
      r#"<text x="{x}" y="{y}" font-size="{}" font-weight="{weight}" text-anchor="{anchor}" dominant-baseline="{baseline}" {}{transform}>{}</text>"#,
      svg::num(text.size),
      svg::fill(text.brush),
      escape(text.text),
    );
  }

  pub fn finish(self) -> String {
    let width = svg::num(self.width);
    let height = svg::num(self.height);
    format!(
      concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
        "\n",
        r#"<rect width="{w}" height="{h}" {bg}/>"#,
        "\n{body}</svg>\n"
      ),
      w = width,
      h = height,
      bg = svg::fill(self.background),
      body = self.body,
    )
  }
}
