use super::labels::{DashboardLabels, MeterLabels};
use super::palette::{MetricKind, Palette};
use super::raster::Rect;
use super::text::{ellipsize, Typeface};

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConstants {
    pub canvas_width: u32,
    pub title_px: f32,
    pub content_px: f32,
    pub outer_margin: f32,
    pub panel_gap: f32,
    pub panel_padding: f32,
    pub panel_radius: f32,
    pub badge_padding_x: f32,
    pub badge_padding_y: f32,
    pub badge_radius: f32,
    pub badge_gap: f32,
    pub row_gap: f32,
    pub bar_height: f32,
    pub bar_radius: f32,
    pub shadow_offset: (f32, f32),
    pub palette: Palette,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            canvas_width: 1280,
            title_px: 48.0,
            content_px: 36.0,
            outer_margin: 48.0,
            panel_gap: 48.0,
            panel_padding: 52.0,
            panel_radius: 64.0,
            badge_padding_x: 36.0,
            badge_padding_y: 20.0,
            badge_radius: 50.0,
            badge_gap: 24.0,
            row_gap: 28.0,
            bar_height: 44.0,
            bar_radius: 22.0,
            shadow_offset: (10.0, 10.0),
            palette: Palette::default(),
        }
    }
}

impl LayoutConstants {
    pub fn panel_x(&self) -> f32 {
        self.outer_margin
    }

    pub fn panel_width(&self) -> f32 {
        self.canvas_width as f32 - 2.0 * self.outer_margin
    }

    pub fn inner_x(&self) -> f32 {
        self.panel_x() + self.panel_padding
    }

    pub fn inner_width(&self) -> f32 {
        self.panel_width() - 2.0 * self.panel_padding
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadgeSlot {
    pub text: String,
    pub px: f32,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSlot {
    pub text: String,
    pub px: f32,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeterPanel {
    pub kind: MetricKind,
    pub percent: f64,
    pub panel: Rect,
    pub title: BadgeSlot,
    pub detail: Option<BadgeSlot>,
    pub bar: Rect,
    pub caption: TextSlot,
}

/// Positions of everything drawn in one render call.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasGeometry {
    pub width: u32,
    pub height: u32,
    pub title_line_height: f32,
    pub content_line_height: f32,
    pub badges_panel: Rect,
    pub title_badge: BadgeSlot,
    pub traffic_badges: [BadgeSlot; 3],
    pub uptime_badges: [BadgeSlot; 2],
    pub cpu: MeterPanel,
    pub memory: MeterPanel,
    pub disks: Vec<MeterPanel>,
    /// Height added to the canvas by each disk panel, leading gap included.
    pub disk_stride: f32,
}

#[derive(Debug, Clone, Copy)]
struct Column {
    y: f32,
}

impl Column {
    fn new(top: f32) -> Self {
        Self { y: top }
    }

    fn place(&mut self, height: f32) -> f32 {
        let top = self.y;
        self.y += height;
        top
    }

    fn skip(&mut self, gap: f32) {
        self.y += gap;
    }
}

#[derive(Debug, Clone, Copy)]
struct Row {
    x: f32,
    gap: f32,
}

impl Row {
    fn new(left: f32, gap: f32) -> Self {
        Self { x: left, gap }
    }

    fn place(&mut self, width: f32) -> f32 {
        let left = self.x;
        self.x += width + self.gap;
        left
    }
}

struct Measure<'a> {
    face: &'a dyn Typeface,
    k: &'a LayoutConstants,
    title_h: f32,
    content_h: f32,
}

impl Measure<'_> {
    fn badge_height(&self, line_h: f32) -> f32 {
        line_h + 2.0 * self.k.badge_padding_y
    }

    fn inner_right(&self) -> f32 {
        self.k.inner_x() + self.k.inner_width()
    }

    fn badge(&self, row: &mut Row, y: f32, text: &str, px: f32, line_h: f32) -> BadgeSlot {
        let available = self.inner_right() - row.x - 2.0 * self.k.badge_padding_x;
        let text = ellipsize(self.face, text, px, available);
        let width = self.face.measure(&text, px).width + 2.0 * self.k.badge_padding_x;
        let x = row.place(width);
        BadgeSlot {
            text,
            px,
            rect: Rect::new(x, y, width, self.badge_height(line_h)),
        }
    }

    fn flow<const N: usize>(
        &self,
        column: &mut Column,
        texts: [&str; N],
        px: f32,
        line_h: f32,
    ) -> [BadgeSlot; N] {
        let k = self.k;
        let h = self.badge_height(line_h);
        let mut y = column.place(h);
        let mut row = Row::new(k.inner_x(), k.badge_gap);
        texts.map(|text| {
            let width = self.face.measure(text, px).width + 2.0 * k.badge_padding_x;
            if row.x > k.inner_x() && row.x + width > self.inner_right() {
                column.skip(k.badge_gap);
                y = column.place(h);
                row = Row::new(k.inner_x(), k.badge_gap);
            }
            self.badge(&mut row, y, text, px, line_h)
        })
    }

    fn meter_height(&self) -> f32 {
        2.0 * self.k.panel_padding
            + self.badge_height(self.title_h)
            + self.k.row_gap
            + self.k.bar_height
            + self.k.row_gap
            + self.content_h
    }

    fn meter(&self, labels: &MeterLabels, top: f32) -> MeterPanel {
        let k = self.k;
        let panel = Rect::new(k.panel_x(), top, k.panel_width(), self.meter_height());
        let mut column = Column::new(top + k.panel_padding);

        let title_row_h = self.badge_height(self.title_h);
        let title_y = column.place(title_row_h);
        let mut row = Row::new(k.inner_x(), k.badge_gap);
        let title = self.badge(&mut row, title_y, &labels.title, k.title_px, self.title_h);
        let detail = labels.detail.as_deref().and_then(|text| {
            let available = self.inner_right() - row.x - 2.0 * k.badge_padding_x;
            if ellipsize(self.face, text, k.content_px, available).is_empty() {
                return None;
            }
            let y = title_y + (title_row_h - self.badge_height(self.content_h)) / 2.0;
            Some(self.badge(&mut row, y, text, k.content_px, self.content_h))
        });

        column.skip(k.row_gap);
        let bar = Rect::new(
            k.inner_x(),
            column.place(k.bar_height),
            k.inner_width(),
            k.bar_height,
        );
        column.skip(k.row_gap);
        let caption = TextSlot {
            text: ellipsize(self.face, &labels.caption, k.content_px, k.inner_width()),
            px: k.content_px,
            x: k.inner_x(),
            y: column.place(self.content_h),
        };

        MeterPanel {
            kind: labels.kind,
            percent: labels.percent,
            panel,
            title,
            detail,
            bar,
            caption,
        }
    }
}

/// Lays out the whole dashboard. Line heights are measured once per font size
/// and rounded up so that every offset is a whole pixel.
pub fn compute_geometry(
    labels: &DashboardLabels,
    face: &dyn Typeface,
    k: &LayoutConstants,
) -> CanvasGeometry {
    let m = Measure {
        face,
        k,
        title_h: face.line_height(k.title_px).ceil(),
        content_h: face.line_height(k.content_px).ceil(),
    };
    let meter_h = m.meter_height();

    let top = k.outer_margin;
    let mut rows = Column::new(top + k.panel_padding);
    let [title_badge] = m.flow(&mut rows, [labels.title.as_str()], k.title_px, m.title_h);
    rows.skip(k.badge_gap);
    let traffic_badges = m.flow(
        &mut rows,
        [
            labels.backend.as_str(),
            labels.received.as_str(),
            labels.sent.as_str(),
        ],
        k.content_px,
        m.content_h,
    );
    rows.skip(k.badge_gap);
    let uptime_badges = m.flow(
        &mut rows,
        [labels.system_uptime.as_str(), labels.bot_uptime.as_str()],
        k.content_px,
        m.content_h,
    );
    let badges_h = rows.y + k.panel_padding - top;

    let mut column = Column::new(top);
    let badges_panel = Rect::new(k.panel_x(), column.place(badges_h), k.panel_width(), badges_h);

    column.skip(k.panel_gap);
    let cpu = m.meter(&labels.cpu, column.place(meter_h));
    column.skip(k.panel_gap);
    let memory = m.meter(&labels.memory, column.place(meter_h));

    let mut disks = Vec::with_capacity(labels.disks.len());
    for disk in &labels.disks {
        column.skip(k.panel_gap);
        disks.push(m.meter(disk, column.place(meter_h)));
    }
    column.skip(k.outer_margin);

    CanvasGeometry {
        width: k.canvas_width,
        height: column.y.ceil() as u32,
        title_line_height: m.title_h,
        content_line_height: m.content_h,
        badges_panel,
        title_badge,
        traffic_badges,
        uptime_badges,
        cpu,
        memory,
        disks,
        disk_stride: k.panel_gap + meter_h,
    }
}
