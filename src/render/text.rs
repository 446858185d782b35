use super::raster::blend_at;
use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};

/// Glyph used to obtain the shared line height of a font size.
pub const REFERENCE_GLYPH: &str = "●";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// Measures and rasterizes single-line text. Must be deterministic for a
/// given string and pixel size.
pub trait Typeface: Send + Sync {
    fn measure(&self, text: &str, px: f32) -> TextSize;

    fn draw(&self, surface: &mut RgbaImage, text: &str, px: f32, x: f32, y: f32, ink: Rgba<u8>);

    fn line_height(&self, px: f32) -> f32 {
        self.measure(REFERENCE_GLYPH, px).height
    }
}

pub struct FontFace {
    font: Font<'static>,
}

impl FontFace {
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(bytes).map(|font| Self { font })
    }
}

impl Typeface for FontFace {
    fn measure(&self, text: &str, px: f32) -> TextSize {
        let scale = Scale::uniform(px);
        let v_metrics = self.font.v_metrics(scale);
        let width = self
            .font
            .layout(text, scale, point(0.0, v_metrics.ascent))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);
        TextSize {
            width,
            height: v_metrics.ascent - v_metrics.descent,
        }
    }

    fn draw(&self, surface: &mut RgbaImage, text: &str, px: f32, x: f32, y: f32, ink: Rgba<u8>) {
        let scale = Scale::uniform(px);
        let v_metrics = self.font.v_metrics(scale);
        for glyph in self.font.layout(text, scale, point(x, y + v_metrics.ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = i64::from(bb.min.x) + i64::from(gx);
                let py = i64::from(bb.min.y) + i64::from(gy);
                blend_at(surface, px, py, ink, coverage);
            });
        }
    }
}

pub fn ellipsize(face: &dyn Typeface, text: &str, px: f32, max_width: f32) -> String {
    if face.measure(text, px).width <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}…", chars.iter().collect::<String>().trim_end());
        if face.measure(&candidate, px).width <= max_width {
            return candidate;
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing::BlockFace;

    #[test]
    fn ellipsize_keeps_fitting_text() {
        let face = BlockFace;
        assert_eq!(ellipsize(&face, "short", 10.0, 100.0), "short");
    }

    #[test]
    fn ellipsize_trims_to_width() {
        let face = BlockFace;
        // Block glyphs advance half the pixel size: 10 chars fit in 50px at 10px.
        let fitted = ellipsize(&face, "Intel(R) Core(TM) i7-8700K CPU", 10.0, 50.0);
        assert!(face.measure(&fitted, 10.0).width <= 50.0);
        assert_eq!(fitted, "Intel(R)…");
    }

    #[test]
    fn ellipsize_gives_up_on_tiny_width() {
        let face = BlockFace;
        assert_eq!(ellipsize(&face, "abc", 10.0, 1.0), "");
    }

    const SYSTEM_FONTS: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    fn system_font() -> Option<FontFace> {
        SYSTEM_FONTS
            .iter()
            .filter_map(|path| std::fs::read(path).ok())
            .find_map(FontFace::from_bytes)
    }

    #[test]
    fn font_face_rejects_garbage() {
        assert!(FontFace::from_bytes(b"not a font".to_vec()).is_none());
        assert!(FontFace::from_bytes(Vec::new()).is_none());
    }

    #[test]
    fn font_face_measures_deterministically() {
        let Some(face) = system_font() else {
            eprintln!("no system TrueType font found, skipping");
            return;
        };
        let first = face.measure("● Recv: 1024", 36.0);
        let second = face.measure("● Recv: 1024", 36.0);
        assert_eq!(first, second);
        assert!(first.width > 0.0);
        assert!(face.measure("● Recv: 102400", 36.0).width > first.width);
        assert!(face.measure("● Recv: 1024", 48.0).width > first.width);
    }

    #[test]
    fn font_face_line_height_ignores_text() {
        let Some(face) = system_font() else {
            eprintln!("no system TrueType font found, skipping");
            return;
        };
        let line = face.line_height(36.0);
        assert!(line > 0.0);
        assert_eq!(face.measure("x", 36.0).height, line);
        assert_eq!(face.measure("Memory 20% gjpqy", 36.0).height, line);
        assert_eq!(face.line_height(36.0), line);
    }

    #[test]
    fn font_face_draws_inside_measured_box() {
        let Some(face) = system_font() else {
            eprintln!("no system TrueType font found, skipping");
            return;
        };
        let ink = Rgba([0, 0, 0, 255]);
        let size = face.measure("CPU 55%", 36.0);
        let mut surface = RgbaImage::from_pixel(400, 100, Rgba([255, 255, 255, 255]));
        face.draw(&mut surface, "CPU 55%", 36.0, 10.0, 10.0, ink);

        let inked: Vec<(u32, u32)> = surface
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 255)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!inked.is_empty());
        for (x, y) in inked {
            assert!(x as f32 >= 9.0 && x as f32 <= 10.0 + size.width + 1.0, "x {x}");
            assert!(y as f32 >= 9.0 && y as f32 <= 10.0 + size.height + 1.0, "y {y}");
        }
    }

    #[test]
    fn line_height_uses_reference_glyph() {
        let face = BlockFace;
        assert_eq!(face.line_height(36.0), 36.0);
    }
}
