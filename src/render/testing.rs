//! Fixture resources so rendering can be exercised without font or image files.

use super::raster::{fill_rect, Rect};
use super::text::{TextSize, Typeface};
use super::RenderResources;
use crate::snapshot::{DiskEntry, LoadAverage, SystemSnapshot, UptimeParts};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

pub struct BlockFace;

impl BlockFace {
    fn advance(px: f32) -> f32 {
        px * 0.5
    }
}

impl Typeface for BlockFace {
    fn measure(&self, text: &str, px: f32) -> TextSize {
        TextSize {
            width: text.chars().count() as f32 * Self::advance(px),
            height: px,
        }
    }

    fn draw(&self, surface: &mut RgbaImage, text: &str, px: f32, x: f32, y: f32, ink: Rgba<u8>) {
        let advance = Self::advance(px);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let glyph = Rect::new(
                x + i as f32 * advance + advance * 0.1,
                y + px * 0.15,
                advance * 0.8,
                px * 0.7,
            );
            fill_rect(surface, glyph, ink);
        }
    }
}

pub const BACKGROUND_COLOR: Rgba<u8> = Rgba([40, 44, 52, 255]);

pub fn resources() -> RenderResources {
    RenderResources::new(
        Arc::new(BlockFace),
        RgbaImage::from_pixel(64, 64, BACKGROUND_COLOR),
    )
}

pub fn disk(name: &str, total_mb: u64, used_mb: u64) -> DiskEntry {
    DiskEntry {
        name: name.to_string(),
        total_mb,
        used_mb,
        used_percent: crate::snapshot::percent(used_mb as f64, total_mb as f64),
    }
}

pub fn snapshot() -> SystemSnapshot {
    SystemSnapshot {
        cpu_used_percent: 55.0,
        cpu_cores: 8,
        cpu_info: "Intel(R) Core(TM) i7-8700K CPU".to_string(),
        cpu_load: Some(LoadAverage {
            one: 0.52,
            five: 0.48,
            fifteen: 0.40,
        }),
        mem_all_mb: 16_384,
        mem_used_mb: 3_277,
        mem_used_percent: 20.0,
        disks: vec![disk("/", 102_400, 51_200)],
        uptime: UptimeParts::from_secs(3 * 86_400 + 5 * 3600 + 7 * 60 + 9),
        bot_uptime: UptimeParts::from_secs(2 * 3600 + 30),
        os: "linux".to_string(),
        arch: "x86_64".to_string(),
        backend: "online".to_string(),
        sent_total: 42,
        received_total: 184_467_440_737_095,
    }
}
