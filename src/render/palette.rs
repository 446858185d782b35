use image::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Rgba<u8>,
    pub success: Rgba<u8>,
    pub warning: Rgba<u8>,
    pub danger: Rgba<u8>,
    pub shadow: Rgba<u8>,
    pub panel: Rgba<u8>,
    pub track: Rgba<u8>,
    pub ink_light: Rgba<u8>,
    pub ink_dark: Rgba<u8>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: Rgba([0, 125, 156, 192]),
            success: Rgba([103, 194, 58, 192]),
            warning: Rgba([230, 162, 60, 192]),
            danger: Rgba([245, 108, 108, 192]),
            shadow: Rgba([0, 0, 0, 112]),
            panel: Rgba([255, 255, 255, 156]),
            track: Rgba([0, 0, 0, 77]),
            ink_light: Rgba([255, 255, 255, 255]),
            ink_dark: Rgba([0, 0, 0, 255]),
        }
    }
}

impl Palette {
    pub fn band_color(&self, band: Band) -> Rgba<u8> {
        match band {
            Band::Success => self.success,
            Band::Warning => self.warning,
            Band::Danger => self.danger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Cpu,
    Memory,
    Disk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Success,
    Warning,
    Danger,
}

/// Upper bounds (exclusive) of the success and warning bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandTable {
    pub success_below: f64,
    pub warning_below: f64,
}

pub const CPU_BANDS: BandTable = BandTable {
    success_below: 40.0,
    warning_below: 80.0,
};

pub const DISK_BANDS: BandTable = CPU_BANDS;

pub const MEMORY_BANDS: BandTable = BandTable {
    success_below: 30.0,
    warning_below: 80.0,
};

impl MetricKind {
    pub fn bands(self) -> BandTable {
        match self {
            Self::Cpu => CPU_BANDS,
            Self::Memory => MEMORY_BANDS,
            Self::Disk => DISK_BANDS,
        }
    }
}

pub fn band_for(kind: MetricKind, percent: f64) -> Band {
    let table = kind.bands();
    if percent < table.success_below {
        Band::Success
    } else if percent < table.warning_below {
        Band::Warning
    } else {
        Band::Danger
    }
}

pub fn color_for(kind: MetricKind, percent: f64, palette: &Palette) -> Rgba<u8> {
    palette.band_color(band_for(kind, percent))
}
