use std::path::Path;

use rand::Rng;
use raylib::prelude::*;
use tracing::warn;

use crate::catalog::Catalog;
use crate::constants::*;
use crate::scene::{Gradient, Overlay, Rgba, Scene, Vignette};
use crate::state::Playback;
use crate::timeline::{self, Pose, Role, Visible};

const BASE: Rgba = Rgba::new(5, 7, 15, 1.0); // Page background behind every scene
const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);
const BANDS: usize = 96;
const FLARE_SECTORS: usize = 48;
const FONT_ATLAS_SIZE: i32 = 96;
const GLYPHS: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~·’°•";
const SPACING: f32 = 1.0;

const MARGIN: f32 = 96.0;
const PANEL_WIDTH: f32 = 880.0;
const PANEL_PADDING: f32 = 48.0;
const PANEL_BOTTOM: f32 = RENDER_HEIGHT as f32 - 230.0;
const TIMELINE_Y: f32 = RENDER_HEIGHT as f32 - 150.0;
const DOT_WIDTH: f32 = 120.0;
const DOT_HEIGHT: f32 = 44.0;
const DOT_GAP: f32 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Display,
    Sans,
}

/// Optional typefaces. Missing ones fall back to raylib's built-in font,
/// which only covers printable ASCII.
pub struct Typography {
    display: Option<Font>,
    sans: Option<Font>,
    fallback: WeakFont,
}

impl Typography {
    pub fn load(rl: &mut RaylibHandle, thread: &RaylibThread, display: Option<&Path>, sans: Option<&Path>) -> Self {
        let mut load = |path: Option<&Path>| {
            let path = path?;
            match rl.load_font_ex(thread, &path.to_string_lossy(), FONT_ATLAS_SIZE, Some(GLYPHS)) {
                Ok(font) => Some(font),
                Err(e) => {
                    warn!(?path, "failed to load font, using the default one: {e}");
                    None
                }
            }
        };
        let display = load(display);
        let sans = load(sans);
        Self { display, sans, fallback: rl.get_font_default() }
    }

    fn font(&self, face: Face) -> Option<&Font> {
        match face {
            Face::Display => self.display.as_ref().or(self.sans.as_ref()),
            Face::Sans => self.sans.as_ref(),
        }
    }

    fn measure(&self, face: Face, text: &str, size: f32) -> f32 {
        match self.font(face) {
            Some(font) => measure_text_ex(font, text, size, SPACING).x,
            None => measure_text_ex(&self.fallback, &ascii_fallback(text), size, SPACING).x,
        }
    }

    fn draw(&self, d: &mut impl RaylibDraw, face: Face, text: &str, pos: Vector2, size: f32, color: Color) {
        match self.font(face) {
            Some(font) => d.draw_text_ex(font, text, pos, size, SPACING, color),
            None => d.draw_text_ex(&self.fallback, &ascii_fallback(text), pos, size, SPACING, color),
        }
    }
}

/// Replaces the typographic characters of the scene copy with ASCII lookalikes.
pub fn ascii_fallback(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '·' | '•' => out.push('-'),
            '’' | '‘' => out.push('\''),
            '“' | '”' => out.push('"'),
            '°' => out.push_str(" deg"),
            '—' | '–' => out.push('-'),
            c if c.is_ascii() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap. A word wider than `max_width` gets a line of its own.
pub fn wrap(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure(&candidate) <= max_width {
            line = candidate;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Hit areas of the timeline buttons, evenly spread under the progress bar.
/// Buttons narrow once the catalog is too long for full-width ones, keeping
/// a gap between neighbours so no point hits two buttons.
pub fn timeline_dots(count: usize) -> Vec<Rectangle> {
    let track = RENDER_WIDTH as f32 - 2.0 * MARGIN;
    let step = track / count.max(1) as f32;
    let width = DOT_WIDTH.min(step - DOT_GAP).max(1.0);
    (0..count)
        .map(|i| {
            let cx = MARGIN + step * (i as f32 + 0.5);
            Rectangle::new(cx - width / 2.0, TIMELINE_Y + 30.0, width, DOT_HEIGHT)
        })
        .collect()
}

fn hit(dots: &[Rectangle], point: Vector2) -> Option<usize> {
    dots.iter().position(|dot| dot.check_collision_point_rec(point))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speck {
    pub x: f32,
    pub y: f32,
    pub light: bool,
    pub alpha: f32,
}

/// Film grain for one frame.
pub fn grain(rng: &mut impl Rng, count: usize) -> Vec<Speck> {
    (0..count)
        .map(|_| Speck {
            x: rng.random_range(0.0..RENDER_WIDTH as f32),
            y: rng.random_range(0.0..RENDER_HEIGHT as f32),
            light: rng.random_bool(0.5),
            alpha: rng.random_range(0.02..0.08),
        })
        .collect()
}

fn color(c: Rgba, opacity: f32) -> Color {
    c.with_alpha(c.a * opacity).into()
}

fn screen_center() -> Vector2 {
    Vector2::new(RENDER_WIDTH as f32 * 0.5, RENDER_HEIGHT as f32 * 0.5)
}

fn farthest_corner(center: Vector2) -> f32 {
    let (w, h) = (RENDER_WIDTH as f32, RENDER_HEIGHT as f32);
    [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
        .iter()
        .map(|&(x, y)| ((x - center.x).powi(2) + (y - center.y).powi(2)).sqrt())
        .fold(0.0, f32::max)
}

/// Draws a scene and the playback chrome into the 1920x1080 framebuffer.
pub struct Renderer {
    typography: Typography,
    dots: Vec<Rectangle>,
}

impl Renderer {
    pub fn new(typography: Typography, scene_count: usize) -> Self {
        Self { typography, dots: timeline_dots(scene_count) }
    }

    /// Index of the timeline button under `point`, in framebuffer coordinates.
    pub fn dot_at(&self, point: Vector2) -> Option<usize> {
        hit(&self.dots, point)
    }

    pub fn draw(&self, d: &mut impl RaylibDraw, catalog: &Catalog, visible: Visible, playback: Playback) {
        d.clear_background(Color::from(BASE));

        if let Some(scene) = catalog.get(visible.index) {
            let stage = timeline::pose(Role::Scene, visible.phase, visible.t);

            draw_gradient(d, &scene.background.gradient);
            for overlay in &scene.overlays {
                draw_flare(d, overlay, timeline::flare_pose(overlay, visible.age), stage.scale);
            }
            draw_vignette(d, &scene.background.vignette);
            draw_grain(d, &grain(&mut rand::rng(), GRAIN_SPECKS));
            self.draw_panel(d, scene, visible, stage.scale);

            // Scene opacity: veil the layers with the page background.
            if stage.opacity < 1.0 {
                d.draw_rectangle(0, 0, RENDER_WIDTH, RENDER_HEIGHT, color(BASE, 1.0 - stage.opacity));
            }
        }

        if let Some(current) = catalog.get(playback.index) {
            self.draw_hud(d, current);
            self.draw_timeline(d, catalog, playback, current.background.highlight);
        }
    }

    fn draw_hud(&self, d: &mut impl RaylibDraw, scene: &Scene) {
        let groups = [
            ("TIME", scene.clock.as_str()),
            ("LOCATION", scene.location.as_str()),
            ("NET WORTH PULSE", "+$1.8M pre-market"),
        ];
        let mut x = MARGIN;
        for (label, value) in groups {
            self.typography.draw(d, Face::Sans, label, Vector2::new(x, 48.0), 18.0, color(WHITE, 0.55));
            self.typography.draw(d, Face::Sans, value, Vector2::new(x, 74.0), 26.0, color(WHITE, 0.92));
            let width = self
                .typography
                .measure(Face::Sans, label, 18.0)
                .max(self.typography.measure(Face::Sans, value, 26.0));
            x += width + 64.0;
        }
    }

    fn draw_panel(&self, d: &mut impl RaylibDraw, scene: &Scene, visible: Visible, scale: f32) {
        let highlight = scene.background.highlight;
        let inner = PANEL_WIDTH - 2.0 * PANEL_PADDING;

        let headline = wrap(&scene.headline, inner, |s| self.typography.measure(Face::Display, s, 60.0));
        let narrative = wrap(&scene.narrative, inner, |s| self.typography.measure(Face::Sans, s, 26.0));

        let height = 2.0 * PANEL_PADDING
            + 44.0 + 28.0
            + headline.len() as f32 * 68.0 + 20.0
            + narrative.len() as f32 * 38.0 + 28.0
            + scene.details.len() as f32 * 40.0;

        let center = screen_center();
        let origin = Vector2::new(MARGIN + 24.0, PANEL_BOTTOM - height);
        let scaled = |p: Vector2| center + (p - center) * scale;

        let panel = timeline::pose(Role::Panel, visible.phase, visible.t);
        let top_left = scaled(Vector2::new(origin.x + panel.dx, origin.y + panel.dy));
        d.draw_rectangle_rounded(
            Rectangle::new(top_left.x, top_left.y, PANEL_WIDTH * scale, height * scale),
            0.08,
            12,
            color(WHITE, 0.08 * panel.opacity),
        );
        d.draw_line_ex(
            top_left + Vector2::new(24.0, 0.0),
            top_left + Vector2::new(PANEL_WIDTH * scale - 24.0, 0.0),
            1.5,
            color(WHITE, 0.22 * panel.opacity),
        );

        let mut y = origin.y + panel.dy + PANEL_PADDING;
        let x = origin.x + panel.dx + PANEL_PADDING;
        let text_at = |pose: Pose, y: f32| scaled(Vector2::new(x + pose.dx, y + pose.dy));

        let tag = timeline::pose(Role::Tag, visible.phase, visible.t);
        let tag_alpha = panel.opacity * tag.opacity;
        let tag_text = "POV · Morning Sequence";
        let tag_width = self.typography.measure(Face::Sans, tag_text, 20.0) + 32.0;
        let at = text_at(tag, y);
        d.draw_rectangle_lines_ex(Rectangle::new(at.x, at.y, tag_width * scale, 44.0 * scale), 2.0, color(highlight, tag_alpha));
        self.typography.draw(d, Face::Sans, tag_text, at + Vector2::new(16.0, 12.0) * scale, 20.0 * scale, color(highlight, tag_alpha));
        y += 44.0 + 28.0;

        let pose = timeline::pose(Role::Headline, visible.phase, visible.t);
        for line in &headline {
            self.typography.draw(d, Face::Display, line, text_at(pose, y), 60.0 * scale, color(WHITE, panel.opacity * pose.opacity));
            y += 68.0;
        }
        y += 20.0;

        let pose = timeline::pose(Role::Narrative, visible.phase, visible.t);
        for line in &narrative {
            self.typography.draw(d, Face::Sans, line, text_at(pose, y), 26.0 * scale, color(WHITE, 0.8 * panel.opacity * pose.opacity));
            y += 38.0;
        }
        y += 28.0;

        for (i, detail) in scene.details.iter().enumerate() {
            let pose = timeline::pose(Role::Detail(i), visible.phase, visible.t);
            let alpha = panel.opacity * pose.opacity;
            let at = text_at(pose, y);
            d.draw_circle_v(at + Vector2::new(6.0, 13.0) * scale, 5.0 * scale, color(highlight, alpha));
            self.typography.draw(d, Face::Sans, detail, at + Vector2::new(24.0, 0.0) * scale, 24.0 * scale, color(WHITE, alpha));
            y += 40.0;
        }
    }

    fn draw_timeline(&self, d: &mut impl RaylibDraw, catalog: &Catalog, playback: Playback, highlight: Rgba) {
        let track = Rectangle::new(MARGIN, TIMELINE_Y, RENDER_WIDTH as f32 - 2.0 * MARGIN, 4.0);
        d.draw_rectangle_rec(track, color(WHITE, 0.15));
        d.draw_rectangle_rec(
            Rectangle::new(track.x, track.y, track.width * playback.progress.clamp(0.0, 1.0), track.height),
            color(highlight, 1.0),
        );

        for (i, (dot, scene)) in self.dots.iter().zip(catalog.scenes()).enumerate() {
            let active = i == playback.index;
            let (fill, text) = if active {
                (color(highlight, 0.3), color(highlight, 1.0))
            } else {
                (color(WHITE, 0.06), color(WHITE, 0.6))
            };
            d.draw_rectangle_rounded(*dot, 1.0, 12, fill);
            let width = self.typography.measure(Face::Sans, &scene.clock, 22.0);
            let at = Vector2::new(dot.x + (dot.width - width) / 2.0, dot.y + 11.0);
            self.typography.draw(d, Face::Sans, &scene.clock, at, 22.0, text);
        }
    }
}

fn draw_gradient(d: &mut impl RaylibDraw, gradient: &Gradient) {
    let (w, h) = (RENDER_WIDTH as f32, RENDER_HEIGHT as f32);
    match gradient {
        Gradient::Linear { angle, .. } => {
            let rad = angle.to_radians();
            let dir = Vector2::new(rad.sin(), -rad.cos());
            let length = (w * rad.sin()).abs() + (h * rad.cos()).abs();
            let span = (w * w + h * h).sqrt() * 1.2;
            let band = length / BANDS as f32 + 1.0;
            for i in 0..BANDS {
                let t = (i as f32 + 0.5) / BANDS as f32;
                let at = screen_center() + dir * ((t - 0.5) * length);
                d.draw_rectangle_pro(
                    Rectangle::new(at.x, at.y, band, span),
                    Vector2::new(band / 2.0, span / 2.0),
                    angle - 90.0,
                    Color::from(gradient.sample(t).over(BASE)),
                );
            }
        }
        Gradient::Radial { x, y, .. } => {
            let center = Vector2::new(w * x / 100.0, h * y / 100.0);
            let radius = farthest_corner(center);
            for i in (0..BANDS).rev() {
                let t = (i as f32 + 1.0) / BANDS as f32;
                d.draw_circle_v(center, radius * t, Color::from(gradient.sample(t).over(BASE)));
            }
        }
    }
}

fn draw_vignette(d: &mut impl RaylibDraw, vignette: &Vignette) {
    let center = Vector2::new(
        RENDER_WIDTH as f32 * vignette.x / 100.0,
        RENDER_HEIGHT as f32 * vignette.y / 100.0,
    );
    let radius = farthest_corner(center);
    for i in 0..BANDS {
        let alpha = vignette.alpha_at((i as f32 + 0.5) / BANDS as f32);
        if alpha <= 0.0 {
            continue;
        }
        let inner = radius * i as f32 / BANDS as f32;
        let outer = radius * (i as f32 + 1.0) / BANDS as f32;
        d.draw_ring(center, inner, outer, 0.0, 360.0, 72, color(vignette.edge.with_alpha(1.0), alpha));
    }
}

fn draw_flare(d: &mut impl RaylibDraw, overlay: &Overlay, pose: Pose, scale: f32) {
    if pose.opacity <= 0.0 {
        return;
    }
    let center = screen_center();
    let radius = overlay.size / 2.0;
    let origin = Vector2::new(
        RENDER_WIDTH as f32 * overlay.x / 100.0 + radius,
        RENDER_HEIGHT as f32 * overlay.y / 100.0 + radius,
    );
    let at = center + (origin - center) * scale;
    let radius = radius * scale;
    let tint = overlay.tint();

    // Soft halo standing in for the CSS blur.
    d.draw_circle_gradient(
        at.x as i32,
        at.y as i32,
        radius + overlay.blur,
        color(tint, 0.35 * pose.opacity),
        color(tint, 0.0),
    );

    // Conic sweep from 45°, fading out at 65% of the turn.
    let step = 360.0 / FLARE_SECTORS as f32;
    for j in 0..FLARE_SECTORS {
        let t = j as f32 / FLARE_SECTORS as f32;
        if t >= 0.65 {
            break;
        }
        let start = -90.0 + 45.0 + pose.rotation + j as f32 * step;
        let alpha = (1.0 - t / 0.65) * pose.opacity;
        d.draw_circle_sector(at, radius, start, start + step, 4, color(tint, alpha));
    }
}

fn draw_grain(d: &mut impl RaylibDraw, specks: &[Speck]) {
    for speck in specks {
        let tone = if speck.light { WHITE } else { Rgba::new(0, 0, 0, 1.0) };
        d.draw_rectangle(speck.x as i32, speck.y as i32, 2, 2, color(tone, speck.alpha));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ten_per_char(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap("Sky is the next boardroom.", 110.0, ten_per_char);
        assert_eq!(lines, ["Sky is the", "next", "boardroom."]);
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let lines = wrap("a supercalifragilistic b", 50.0, ten_per_char);
        assert_eq!(lines, ["a", "supercalifragilistic", "b"]);
        assert!(wrap("   ", 50.0, ten_per_char).is_empty());
    }

    #[test]
    fn ascii_fallback_replaces_typography() {
        assert_eq!(ascii_fallback("it’s 2° · go"), "it's 2 deg - go");
        assert_eq!(ascii_fallback("plain"), "plain");
    }

    #[test]
    fn timeline_dots_are_ordered_and_clickable() {
        let dots = timeline_dots(5);
        assert_eq!(dots.len(), 5);
        assert!(dots.windows(2).all(|w| w[0].x + w[0].width < w[1].x));
        assert!(dots.iter().all(|r| r.x >= MARGIN && r.x + r.width <= RENDER_WIDTH as f32 - MARGIN));

        let third = dots[2];
        let inside = Vector2::new(third.x + third.width / 2.0, third.y + third.height / 2.0);
        assert_eq!(hit(&dots, inside), Some(2));
        assert_eq!(hit(&dots, Vector2::new(5.0, 5.0)), None);
    }

    #[test]
    fn long_catalogs_get_disjoint_buttons() {
        for count in [15, 16, 40] {
            let dots = timeline_dots(count);
            assert!(dots.windows(2).all(|w| w[0].x + w[0].width < w[1].x), "{count} scenes overlap");
            for (i, dot) in dots.iter().enumerate() {
                let left_edge = Vector2::new(dot.x + 0.5, dot.y + dot.height / 2.0);
                assert_eq!(hit(&dots, left_edge), Some(i), "left edge of button {i} of {count}");
                let right_edge = Vector2::new(dot.x + dot.width - 0.5, dot.y + dot.height / 2.0);
                assert_eq!(hit(&dots, right_edge), Some(i), "right edge of button {i} of {count}");
            }
        }
    }

    #[test]
    fn grain_is_reproducible_and_in_bounds() {
        let a = grain(&mut StdRng::seed_from_u64(7), 200);
        let b = grain(&mut StdRng::seed_from_u64(7), 200);
        assert_eq!(a, b);
        assert!(a.iter().all(|s| s.x >= 0.0 && s.x < RENDER_WIDTH as f32 && s.y >= 0.0 && s.y < RENDER_HEIGHT as f32));
        assert!(a.iter().all(|s| (0.02..0.08).contains(&s.alpha)));
    }
}
