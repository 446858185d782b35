use image::{Rgba, RgbaImage};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

#[cfg(test)]
impl Rect {
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

pub fn blend_pixel(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let sa = f32::from(color.0[3]) / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for i in 0..3 {
        let c = (f32::from(color.0[i]) * sa + f32::from(dst.0[i]) * da * (1.0 - sa)) / out_a;
        dst.0[i] = c.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

pub fn blend_at(surface: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= i64::from(surface.width()) || y >= i64::from(surface.height()) {
        return;
    }
    blend_pixel(surface.get_pixel_mut(x as u32, y as u32), color, coverage);
}

/// Anti-aliased rounded rectangle. The radius is clamped to half the shorter side.
pub fn fill_rounded_rect(surface: &mut RgbaImage, rect: Rect, radius: f32, color: Rgba<u8>) {
    if rect.w <= 0.0 || rect.h <= 0.0 {
        return;
    }
    let r = radius.clamp(0.0, rect.w.min(rect.h) / 2.0);
    let cx = rect.x + rect.w / 2.0;
    let cy = rect.y + rect.h / 2.0;
    let hx = rect.w / 2.0 - r;
    let hy = rect.h / 2.0 - r;

    let (x0, x1) = span(rect.x, rect.right(), surface.width());
    let (y0, y1) = span(rect.y, rect.bottom(), surface.height());
    for py in y0..y1 {
        for px in x0..x1 {
            let qx = (px as f32 + 0.5 - cx).abs() - hx;
            let qy = (py as f32 + 0.5 - cy).abs() - hy;
            let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
            let inside = qx.max(qy).min(0.0);
            let distance = outside + inside - r;
            let coverage = (0.5 - distance).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend_pixel(surface.get_pixel_mut(px, py), color, coverage);
            }
        }
    }
}

#[cfg(test)]
pub fn fill_rect(surface: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    fill_rounded_rect(surface, rect, 0.0, color);
}

fn span(start: f32, end: f32, limit: u32) -> (u32, u32) {
    let lo = start.floor().max(0.0) as u32;
    let hi = end.ceil().max(0.0) as u32;
    (lo.min(limit), hi.min(limit))
}
