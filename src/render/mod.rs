pub mod compose;
pub mod labels;
pub mod layout;
pub mod palette;
pub mod raster;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use compose::{Anchor, Composer};
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use labels::DashboardLabels;
use layout::{compute_geometry, CanvasGeometry, LayoutConstants, MeterPanel};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use text::{FontFace, Typeface};
use thiserror::Error;
use tracing::{debug, info};

use crate::snapshot::SystemSnapshot;

pub const IMAGE_SCHEME: &str = "base64://";

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("{path} is not a usable TrueType/OpenType font")]
    Font { path: String },
    #[error("failed to decode background image {path}: {source}")]
    Background {
        path: String,
        source: image::ImageError,
    },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode dashboard as PNG: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum ImageRefError {
    #[error("image reference does not start with base64://")]
    MissingScheme,
    #[error("image reference payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Clone)]
pub struct RenderResources {
    typeface: Arc<dyn Typeface>,
    background: Arc<RgbaImage>,
}

fn read_resource(path: &Path) -> Result<Vec<u8>, ResourceError> {
    fs::read(path).map_err(|source| ResourceError::Read {
        path: path.display().to_string(),
        source,
    })
}

impl RenderResources {
    pub fn new(typeface: Arc<dyn Typeface>, background: RgbaImage) -> Self {
        Self {
            typeface,
            background: Arc::new(background),
        }
    }

    pub fn load(font_path: &Path, background_path: &Path) -> Result<Self, ResourceError> {
        let font_bytes = read_resource(font_path)?;
        let background_bytes = read_resource(background_path)?;

        let background = image::load_from_memory(&background_bytes)
            .map_err(|source| ResourceError::Background {
                path: background_path.display().to_string(),
                source,
            })?
            .into_rgba8();
        let face = FontFace::from_bytes(font_bytes).ok_or_else(|| ResourceError::Font {
            path: font_path.display().to_string(),
        })?;

        info!(
            font = %font_path.display(),
            background = %background_path.display(),
            width = background.width(),
            height = background.height(),
            "render resources loaded"
        );
        Ok(Self::new(Arc::new(face), background))
    }

    pub fn typeface(&self) -> &dyn Typeface {
        self.typeface.as_ref()
    }
}

/// `base64://`-prefixed PNG, ready to hand to a messaging backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn from_png(png: &[u8]) -> Self {
        Self(format!("{IMAGE_SCHEME}{}", STANDARD.encode(png)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn png_bytes(&self) -> Result<Vec<u8>, ImageRefError> {
        let payload = self
            .0
            .strip_prefix(IMAGE_SCHEME)
            .ok_or(ImageRefError::MissingScheme)?;
        Ok(STANDARD.decode(payload)?)
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub struct Renderer {
    resources: RenderResources,
    constants: LayoutConstants,
    bot_name: String,
}

impl Renderer {
    pub fn new(resources: RenderResources, constants: LayoutConstants, bot_name: impl Into<String>) -> Self {
        Self {
            resources,
            constants,
            bot_name: bot_name.into(),
        }
    }

    pub fn geometry(&self, snapshot: &SystemSnapshot) -> CanvasGeometry {
        let labels = DashboardLabels::from_snapshot(snapshot, &self.bot_name);
        compute_geometry(&labels, self.resources.typeface(), &self.constants)
    }

    pub fn render(&self, snapshot: &SystemSnapshot) -> Result<ImageRef, RenderError> {
        let rendered = self.render_png(snapshot)?;
        Ok(ImageRef::from_png(&rendered.png))
    }

    pub fn render_png(&self, snapshot: &SystemSnapshot) -> Result<RenderedImage, RenderError> {
        let geometry = self.geometry(snapshot);
        let surface = self.paint(&geometry);

        let mut png = Vec::new();
        PngEncoder::new(&mut png).write_image(
            surface.as_raw(),
            surface.width(),
            surface.height(),
            ExtendedColorType::Rgba8,
        )?;
        debug!(
            width = geometry.width,
            height = geometry.height,
            disks = geometry.disks.len(),
            bytes = png.len(),
            "dashboard rendered"
        );

        Ok(RenderedImage {
            png,
            width: geometry.width,
            height: geometry.height,
        })
    }

    fn paint(&self, geometry: &CanvasGeometry) -> RgbaImage {
        let k = &self.constants;
        let palette = &k.palette;
        let mut surface = background_layer(&self.resources.background, geometry.width, geometry.height);
        let mut composer = Composer::new(&mut surface, self.resources.typeface(), k);

        composer.draw_panel(geometry.badges_panel, k.panel_radius, palette.panel);
        let title = &geometry.title_badge;
        composer.draw_badge(
            &title.text,
            title.rect,
            title.px,
            palette.accent,
            palette.ink_light,
        );
        for badge in &geometry.traffic_badges {
            composer.draw_badge(
                &badge.text,
                badge.rect,
                badge.px,
                palette.accent,
                palette.ink_light,
            );
        }
        for badge in &geometry.uptime_badges {
            composer.draw_badge(
                &badge.text,
                badge.rect,
                badge.px,
                palette.success,
                palette.ink_dark,
            );
        }

        draw_meter(&mut composer, &geometry.cpu, k);
        draw_meter(&mut composer, &geometry.memory, k);
        for disk in &geometry.disks {
            draw_meter(&mut composer, disk, k);
        }

        surface
    }
}

fn draw_meter(composer: &mut Composer<'_>, meter: &MeterPanel, k: &LayoutConstants) {
    let palette = &k.palette;
    composer.draw_panel(meter.panel, k.panel_radius, palette.panel);
    composer.draw_badge(
        &meter.title.text,
        meter.title.rect,
        meter.title.px,
        palette.accent,
        palette.ink_light,
    );
    if let Some(detail) = &meter.detail {
        composer.draw_badge(
            &detail.text,
            detail.rect,
            detail.px,
            palette.panel,
            palette.ink_dark,
        );
    }
    composer.draw_progress_bar(meter.bar, meter.percent, meter.kind);
    composer.draw_text(
        &meter.caption.text,
        meter.caption.x,
        meter.caption.y,
        meter.caption.px,
        palette.ink_dark,
        Anchor::TOP_LEFT,
    );
}

/// Background covering the canvas, centered. A canvas that fits inside the
/// background crops it unscaled; a larger one scales up only the region it shows.
fn background_layer(background: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (bw, bh) = background.dimensions();
    if bw == 0 || bh == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }

    let (x, y, cw, ch) = cover_region(bw, bh, width, height);
    let region = imageops::crop_imm(background, x, y, cw, ch).to_image();
    if (cw, ch) == (width, height) {
        region
    } else {
        imageops::resize(&region, width, height, FilterType::Triangle)
    }
}

// Never larger than the background itself.
fn cover_region(bw: u32, bh: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
    let scale = (width as f32 / bw as f32).max(height as f32 / bh as f32);
    let (cw, ch) = if scale > 1.0 {
        (
            ((width as f32 / scale).round() as u32).clamp(1, bw),
            ((height as f32 / scale).round() as u32).clamp(1, bh),
        )
    } else {
        (width, height)
    };
    ((bw - cw) / 2, (bh - ch) / 2, cw, ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::testing;

    fn renderer() -> Renderer {
        Renderer::new(testing::resources(), LayoutConstants::default(), "statuscard")
    }

    fn decode(image_ref: &ImageRef) -> RgbaImage {
        let png = image_ref.png_bytes().expect("base64 payload");
        image::load_from_memory(&png).expect("png payload").to_rgba8()
    }

    fn bar_sample(image: &RgbaImage, meter: &MeterPanel) -> image::Rgba<u8> {
        let x = (meter.bar.x + meter.bar.h) as u32;
        let y = (meter.bar.y + meter.bar.h / 2.0) as u32;
        *image.get_pixel(x, y)
    }

    #[test]
    fn scenario_colors_bars_by_band_and_round_trips() {
        let renderer = renderer();
        let snapshot = testing::snapshot();
        let geometry = renderer.geometry(&snapshot);
        let image_ref = renderer.render(&snapshot).expect("render");

        assert!(image_ref.as_str().starts_with(IMAGE_SCHEME));
        let image = decode(&image_ref);
        assert_eq!(image.dimensions(), (1280, geometry.height));
        assert_eq!(geometry.disks.len(), 1);

        // Warning fills lean red, success fills lean green.
        let cpu = bar_sample(&image, &geometry.cpu);
        assert!(cpu.0[0] > cpu.0[1], "cpu bar {cpu:?}");
        let memory = bar_sample(&image, &geometry.memory);
        assert!(memory.0[1] > memory.0[0], "memory bar {memory:?}");
        // 50% sits in the disk warning band.
        let disk = bar_sample(&image, &geometry.disks[0]);
        assert!(disk.0[0] > disk.0[1], "disk bar {disk:?}");
    }

    #[test]
    fn low_disk_usage_is_drawn_in_success_color() {
        let renderer = renderer();
        let mut snapshot = testing::snapshot();
        snapshot.disks = vec![testing::disk("/", 102_400, 20_480)];
        let geometry = renderer.geometry(&snapshot);
        let image = decode(&renderer.render(&snapshot).expect("render"));

        let disk = bar_sample(&image, &geometry.disks[0]);
        assert!(disk.0[1] > disk.0[0], "disk bar {disk:?}");
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = renderer();
        let snapshot = testing::snapshot();
        let first = renderer.render(&snapshot).expect("first render");
        let second = renderer.render(&snapshot).expect("second render");
        assert_eq!(first, second);
    }

    #[test]
    fn tall_canvas_is_fully_covered_by_background() {
        let renderer = renderer();
        let mut snapshot = testing::snapshot();
        snapshot.disks = (0..6)
            .map(|i| testing::disk(&format!("/mnt/disk{i}"), 512_000, 1_000 * i))
            .collect();
        let rendered = renderer.render_png(&snapshot).expect("render");
        assert!(rendered.height > rendered.width);

        let image = image::load_from_memory(&rendered.png).expect("png").to_rgba8();
        assert_eq!(image.dimensions(), (rendered.width, rendered.height));
        assert_eq!(*image.get_pixel(0, 0), testing::BACKGROUND_COLOR);
        assert_eq!(*image.get_pixel(0, rendered.height - 1), testing::BACKGROUND_COLOR);
        assert_eq!(*image.get_pixel(rendered.width - 1, rendered.height - 1), testing::BACKGROUND_COLOR);
    }

    #[test]
    fn background_not_scaled_when_canvas_fits() {
        let background = RgbaImage::from_fn(100, 100, |x, _| image::Rgba([x as u8, 0, 0, 255]));
        let layer = background_layer(&background, 60, 40);
        assert_eq!(layer.dimensions(), (60, 40));
        // Centered crop: canvas column 0 shows background column 20.
        assert_eq!(layer.get_pixel(0, 0).0[0], 20);
        assert_eq!(layer.get_pixel(59, 39).0[0], 79);
    }

    #[test]
    fn background_scaled_to_taller_canvas() {
        let background = RgbaImage::from_pixel(100, 100, image::Rgba([9, 9, 9, 255]));
        let layer = background_layer(&background, 100, 250);
        assert_eq!(layer.dimensions(), (100, 250));
        assert!(layer.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn many_disks_never_scale_background_past_canvas() {
        let renderer = renderer();
        let mut snapshot = testing::snapshot();
        snapshot.disks = (0..60)
            .map(|i| testing::disk(&format!("/snap/core/{i}"), 64, 64))
            .collect();
        let geometry = renderer.geometry(&snapshot);
        assert!(geometry.height > 20_000);

        let (x, y, cw, ch) = cover_region(1280, 1280, geometry.width, geometry.height);
        assert!(cw < 100);
        assert_eq!(ch, 1280);
        assert_eq!((x, y), ((1280 - cw) / 2, 0));

        let background = RgbaImage::from_pixel(1280, 1280, testing::BACKGROUND_COLOR);
        let layer = background_layer(&background, geometry.width, geometry.height);
        assert_eq!(layer.dimensions(), (geometry.width, geometry.height));
        assert_eq!(*layer.get_pixel(geometry.width - 1, geometry.height - 1), testing::BACKGROUND_COLOR);
    }

    #[test]
    fn cover_region_is_identity_for_nominal_canvas() {
        assert_eq!(cover_region(1280, 1280, 1280, 1280), (0, 0, 1280, 1280));
        assert_eq!(cover_region(1280, 1280, 1280, 900), (0, 190, 1280, 900));
        assert_eq!(cover_region(100, 100, 100, 250), (30, 0, 40, 100));
    }

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("statuscard-{}-{name}", std::process::id()))
    }

    #[test]
    fn load_reports_missing_file() {
        let missing = scratch_path("missing.ttf");
        let err = RenderResources::load(&missing, &missing).err().expect("missing font");
        assert!(matches!(err, ResourceError::Read { .. }), "{err}");
    }

    #[test]
    fn load_rejects_non_font_bytes() {
        let font = scratch_path("not-a-font.ttf");
        let background = scratch_path("valid-background.png");
        fs::write(&font, b"definitely not a font").expect("write font");
        RgbaImage::from_pixel(4, 4, testing::BACKGROUND_COLOR)
            .save(&background)
            .expect("write background");

        let err = RenderResources::load(&font, &background).err().expect("bad font");
        assert!(matches!(err, ResourceError::Font { .. }), "{err}");
        let _ = fs::remove_file(font);
        let _ = fs::remove_file(background);
    }

    #[test]
    fn load_rejects_non_image_background() {
        let font = scratch_path("any-font.ttf");
        let background = scratch_path("not-an-image.png");
        fs::write(&font, b"unused").expect("write font");
        fs::write(&background, b"plain text, no pixels").expect("write background");

        let err = RenderResources::load(&font, &background).err().expect("bad background");
        assert!(matches!(err, ResourceError::Background { .. }), "{err}");
        let _ = fs::remove_file(font);
        let _ = fs::remove_file(background);
    }

    #[test]
    fn image_ref_requires_scheme() {
        let bogus = ImageRef("data:image/png;base64,AAAA".to_string());
        assert!(matches!(bogus.png_bytes(), Err(ImageRefError::MissingScheme)));

        let image_ref = ImageRef::from_png(&[1, 2, 3]);
        assert_eq!(image_ref.as_str(), "base64://AQID");
        assert_eq!(image_ref.png_bytes().expect("decode"), vec![1, 2, 3]);
    }
}
