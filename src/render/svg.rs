use std::fmt::Write;

use kurbo::{BezPath, PathEl, Point};
use peniko::Color;

pub(crate) fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

pub(super) fn fill(color: Color) -> String { paint("fill", color) }
pub(super) fn stroke(color: Color) -> String { paint("stroke", color) }

fn paint(attr: &str, color: Color) -> String {
  let c = color.to_rgba8();
  if c.a == 255 {
    format!(r##"{attr}="#{:02x}{:02x}{:02x}""##, c.r, c.g, c.b)
  } else {
    format!(
      r##"{attr}="#{:02x}{:02x}{:02x}" {attr}-opacity="{}""##,
      c.r,
      c.g,
      c.b,
      num(f64::from(c.a) / 255.0)
    )
  }
}

pub(super) fn path_data(path: &BezPath) -> String {
  let mut out = String::new();
  let pt = |p: Point| format!("{} {}", num(p.x), num(p.y));
  for el in path.elements() {
    let _ = match *el {
      PathEl::MoveTo(p) => write!(out, "M{}", pt(p)),
      PathEl::LineTo(p) => write!(out, "L{}", pt(p)),
      PathEl::QuadTo(a, p) => write!(out, "Q{} {}", pt(a), pt(p)),
      PathEl::CurveTo(a, b, p) => write!(out, "C{} {} {}", pt(a), pt(b), pt(p)),
      PathEl::ClosePath => write!(out, "Z"),
    };
  }
  out
}

/// Formats a coordinate with at most two decimals and no trailing zeros.
pub(super) fn num(v: f64) -> String {
  let s = format!("{v:.2}");
  let s = s.trim_end_matches('0').trim_end_matches('.');
  if s == "-0" { "0".to_string() } else { s.to_string() }
}
