use raylib::prelude::Color;
use serde::Deserialize;

use crate::error::PovError;

/// Straight (non-premultiplied) color with a fractional alpha, as written in
/// catalog files: `rgba(255, 210, 120, 0.85)`, `rgb(...)` or `#rrggbb[aa]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0.0 };

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `hsla(h, s%, l%, a)` with saturation and lightness given in [0, 1].
    pub fn from_hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = lightness - chroma / 2.0;
        let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::new(channel(r), channel(g), channel(b), alpha)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Composites this color over an opaque base.
    pub fn over(self, base: Rgba) -> Self {
        let mix = |top: u8, bottom: u8| (top as f32 * self.a + bottom as f32 * (1.0 - self.a)).round() as u8;
        Self::new(mix(self.r, base.r), mix(self.g, base.g), mix(self.b, base.b), 1.0)
    }

    fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            return match hex.len() {
                6 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, 1.0)),
                8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)? as f32 / 255.0)),
                _ => None,
            };
        }

        let (body, with_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return None;
        };
        let parts: Vec<&str> = body.strip_suffix(')')?.split(',').map(str::trim).collect();
        let channel = |p: &str| p.parse::<u8>().ok();
        match (parts.as_slice(), with_alpha) {
            ([r, g, b, a], true) => {
                let a = a.parse::<f32>().ok().filter(|a| (0.0..=1.0).contains(a))?;
                Some(Self::new(channel(*r)?, channel(*g)?, channel(*b)?, a))
            }
            ([r, g, b], false) => Some(Self::new(channel(*r)?, channel(*g)?, channel(*b)?, 1.0)),
            _ => None,
        }
    }
}

impl TryFrom<String> for Rgba {
    type Error = PovError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgba::parse(&value).ok_or(PovError::InvalidColor(value))
    }
}

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        Color::new(c.r, c.g, c.b, (c.a.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ColorStop {
    pub color: Rgba,
    /// Position along the gradient, in percent.
    pub at: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Gradient {
    /// CSS angle convention: 0° points up, 90° points right.
    Linear { angle: f32, stops: Vec<ColorStop> },
    /// Circle centred at (`x`%, `y`%), reaching the farthest corner.
    Radial { x: f32, y: f32, stops: Vec<ColorStop> },
}

impl Gradient {
    pub fn stops(&self) -> &[ColorStop] {
        match self {
            Gradient::Linear { stops, .. } | Gradient::Radial { stops, .. } => stops,
        }
    }

    /// Color at `t` in [0, 1] along the gradient line.
    pub fn sample(&self, t: f32) -> Rgba {
        let stops = self.stops();
        let pos = t.clamp(0.0, 1.0) * 100.0;
        let Some(first) = stops.first() else {
            return Rgba::TRANSPARENT;
        };
        if pos <= first.at {
            return first.color;
        }
        for pair in stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if pos <= b.at {
                let span = (b.at - a.at).max(f32::EPSILON);
                return a.color.lerp(b.color, (pos - a.at) / span);
            }
        }
        stops[stops.len() - 1].color
    }
}

/// Darkening ring: transparent inside `clear`% of the radius, fading to
/// `edge` at the farthest corner.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Vignette {
    pub x: f32,
    pub y: f32,
    pub clear: f32,
    pub edge: Rgba,
}

impl Vignette {
    pub fn alpha_at(&self, t: f32) -> f32 {
        let clear = self.clear / 100.0;
        if t <= clear {
            return 0.0;
        }
        self.edge.a * ((t - clear) / (1.0 - clear).max(f32::EPSILON)).min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Background {
    pub gradient: Gradient,
    pub highlight: Rgba,
    pub vignette: Vignette,
}

/// Rotating flare drawn behind the glass panel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Overlay {
    pub size: f32,
    pub blur: f32,
    pub opacity: f32,
    pub x: f32,
    pub y: f32,
    pub hue: f32,
    pub delay: f32,
    pub duration: f32,
}

impl Overlay {
    pub fn tint(&self) -> Rgba {
        Rgba::from_hsla(self.hue, 0.9, 0.7, 0.55)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scene {
    pub id: String,
    pub clock: String,
    pub location: String,
    pub headline: String,
    pub narrative: String,
    #[serde(default)]
    pub details: Vec<String>,
    pub background: Background,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_css_colors() {
        assert_eq!(Rgba::try_from("rgba(255, 210, 120, 0.85)".to_string()).unwrap(), Rgba::new(255, 210, 120, 0.85));
        assert_eq!(Rgba::try_from("rgb(1,2,3)".to_string()).unwrap(), Rgba::new(1, 2, 3, 1.0));
        assert_eq!(Rgba::try_from("#ff8000".to_string()).unwrap(), Rgba::new(255, 128, 0, 1.0));
        assert!(Rgba::try_from("rgba(300, 0, 0, 1)".to_string()).is_err());
        assert!(Rgba::try_from("rgba(0, 0, 0, 1.5)".to_string()).is_err());
        assert!(Rgba::try_from("hsl(10, 10%, 10%)".to_string()).is_err());
    }

    #[test]
    fn hsla_primaries() {
        assert_eq!(Rgba::from_hsla(0.0, 1.0, 0.5, 1.0), Rgba::new(255, 0, 0, 1.0));
        assert_eq!(Rgba::from_hsla(120.0, 1.0, 0.5, 1.0), Rgba::new(0, 255, 0, 1.0));
        assert_eq!(Rgba::from_hsla(240.0, 1.0, 0.5, 0.3), Rgba::new(0, 0, 255, 0.3));
        assert_eq!(Rgba::from_hsla(360.0, 0.0, 1.0, 1.0), Rgba::new(255, 255, 255, 1.0));
    }

    #[test]
    fn gradient_sampling_interpolates_between_stops() {
        let g = Gradient::Linear {
            angle: 90.0,
            stops: vec![
                ColorStop { color: Rgba::new(0, 0, 0, 1.0), at: 0.0 },
                ColorStop { color: Rgba::new(200, 100, 0, 0.0), at: 50.0 },
            ],
        };
        assert_eq!(g.sample(0.0), Rgba::new(0, 0, 0, 1.0));
        assert_eq!(g.sample(0.25), Rgba::new(100, 50, 0, 0.5));
        assert_eq!(g.sample(0.9), Rgba::new(200, 100, 0, 0.0));
    }

    #[test]
    fn compositing_over_base_is_opaque() {
        let c = Rgba::new(255, 255, 255, 0.5).over(Rgba::new(0, 0, 0, 1.0));
        assert_eq!(c, Rgba::new(128, 128, 128, 1.0));
    }

    #[test]
    fn vignette_is_clear_in_the_middle() {
        let v = Vignette { x: 50.0, y: 50.0, clear: 50.0, edge: Rgba::new(0, 0, 0, 0.8) };
        assert_eq!(v.alpha_at(0.3), 0.0);
        assert!((v.alpha_at(0.75) - 0.4).abs() < 1e-6);
        assert!((v.alpha_at(1.0) - 0.8).abs() < 1e-6);
    }
}
