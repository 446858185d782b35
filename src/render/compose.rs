use super::layout::LayoutConstants;
use super::palette::{color_for, MetricKind};
use super::raster::{fill_rounded_rect, Rect};
use super::text::Typeface;
use image::{Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor(pub f32, pub f32);

impl Anchor {
    pub const TOP_LEFT: Self = Self(0.0, 0.0);
    pub const CENTER: Self = Self(0.5, 0.5);
}

pub struct Composer<'a> {
    surface: &'a mut RgbaImage,
    face: &'a dyn Typeface,
    k: &'a LayoutConstants,
}

impl<'a> Composer<'a> {
    pub fn new(surface: &'a mut RgbaImage, face: &'a dyn Typeface, k: &'a LayoutConstants) -> Self {
        Self { surface, face, k }
    }

    pub fn draw_panel(&mut self, rect: Rect, radius: f32, fill: Rgba<u8>) {
        let (dx, dy) = self.k.shadow_offset;
        fill_rounded_rect(self.surface, rect.translate(dx, dy), radius, self.k.palette.shadow);
        fill_rounded_rect(self.surface, rect, radius, fill);
    }

    pub fn draw_badge(&mut self, text: &str, rect: Rect, px: f32, fill: Rgba<u8>, ink: Rgba<u8>) {
        self.draw_panel(rect, self.k.badge_radius, fill);
        self.draw_text(
            text,
            rect.x + rect.w / 2.0,
            rect.y + rect.h / 2.0,
            px,
            ink,
            Anchor::CENTER,
        );
    }

    pub fn draw_progress_bar(&mut self, rect: Rect, percent: f64, kind: MetricKind) {
        let radius = self.k.bar_radius;
        self.draw_panel(rect, radius, self.k.palette.track);

        let ratio = (percent / 100.0).clamp(0.0, 1.0) as f32;
        let fill = Rect::new(rect.x, rect.y, rect.w * ratio, rect.h);
        if fill.w > 0.0 {
            let color = color_for(kind, percent, &self.k.palette);
            fill_rounded_rect(self.surface, fill, radius, color);
        }
    }

    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, px: f32, ink: Rgba<u8>, anchor: Anchor) {
        if text.is_empty() {
            return;
        }
        let size = self.face.measure(text, px);
        let left = (x - anchor.0 * size.width).round();
        let top = (y - anchor.1 * size.height).round();
        self.face.draw(self.surface, text, px, left, top, ink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::BlockFace;

    const BASE: Rgba<u8> = Rgba([50, 50, 50, 255]);

    fn constants() -> LayoutConstants {
        LayoutConstants::default()
    }

    #[test]
    fn panel_casts_shadow_at_offset() {
        let k = constants();
        let mut surface = RgbaImage::from_pixel(200, 200, BASE);
        let fill = Rgba([255, 0, 0, 255]);
        Composer::new(&mut surface, &BlockFace, &k).draw_panel(
            Rect::new(20.0, 20.0, 100.0, 100.0),
            0.0,
            fill,
        );

        assert_eq!(*surface.get_pixel(60, 60), fill);
        // Only the shadow reaches past the panel's right and bottom edges.
        let shadowed = *surface.get_pixel(125, 125);
        assert!(shadowed.0[0] < BASE.0[0]);
        assert_eq!(*surface.get_pixel(10, 10), BASE);
    }

    #[test]
    fn badge_fills_the_given_rect_and_centers_text() {
        let k = constants();
        let ink = Rgba([0, 0, 255, 255]);
        let fill = Rgba([255, 0, 0, 255]);
        let mut surface = RgbaImage::from_pixel(300, 120, BASE);
        let rect = Rect::new(10.0, 10.0, 200.0, 80.0);
        Composer::new(&mut surface, &BlockFace, &k).draw_badge("ab", rect, 20.0, fill, ink);

        assert_eq!(*surface.get_pixel(60, 50), fill);
        assert_eq!(*surface.get_pixel(105, 50), ink);
        assert_eq!(*surface.get_pixel(250, 50), BASE);
    }

    #[test]
    fn progress_fill_is_clamped_to_track() {
        let k = constants();
        let track = Rect::new(10.0, 10.0, 200.0, 40.0);

        let mut full = RgbaImage::from_pixel(300, 80, BASE);
        Composer::new(&mut full, &BlockFace, &k).draw_progress_bar(track, 100.0, MetricKind::Disk);
        let mut over = RgbaImage::from_pixel(300, 80, BASE);
        Composer::new(&mut over, &BlockFace, &k).draw_progress_bar(track, 250.0, MetricKind::Disk);

        assert_eq!(full, over);
    }

    #[test]
    fn progress_fill_uses_band_color() {
        let k = constants();
        let track = Rect::new(0.0, 0.0, 200.0, 40.0);
        let mut surface = RgbaImage::from_pixel(220, 60, Rgba([255, 255, 255, 255]));
        Composer::new(&mut surface, &BlockFace, &k).draw_progress_bar(track, 20.0, MetricKind::Cpu);

        let filled = surface.get_pixel(25, 20);
        assert!(filled.0[1] > filled.0[0], "success fill should lean green: {filled:?}");
        let empty = surface.get_pixel(150, 20);
        assert_eq!(empty.0[0], empty.0[1]);
    }

    #[test]
    fn zero_percent_draws_track_only() {
        let k = constants();
        let track = Rect::new(0.0, 0.0, 200.0, 40.0);
        let mut zero = RgbaImage::from_pixel(220, 60, BASE);
        Composer::new(&mut zero, &BlockFace, &k).draw_progress_bar(track, 0.0, MetricKind::Memory);
        let mut track_only = RgbaImage::from_pixel(220, 60, BASE);
        Composer::new(&mut track_only, &BlockFace, &k).draw_panel(track, k.bar_radius, k.palette.track);

        assert_eq!(zero, track_only);
    }

    #[test]
    fn anchored_text_is_centered() {
        let k = constants();
        let ink = Rgba([0, 0, 255, 255]);
        let mut surface = RgbaImage::from_pixel(100, 100, BASE);
        // Two block glyphs of 20px span 20px horizontally around the anchor.
        Composer::new(&mut surface, &BlockFace, &k).draw_text("ab", 50.0, 50.0, 20.0, ink, Anchor::CENTER);

        assert_eq!(*surface.get_pixel(45, 50), ink);
        assert_eq!(*surface.get_pixel(55, 50), ink);
        assert_eq!(*surface.get_pixel(35, 50), BASE);
        assert_eq!(*surface.get_pixel(65, 50), BASE);
    }
}
