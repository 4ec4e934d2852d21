//! Rasterization of the rendered tree into an RGB bitmap.
//!
//! The canvas is A4 at 96 dpi (794 px wide) times the requested scale. Text is
//! shaped and painted with cosmic-text using the system font for the template's
//! typography (sans / serif / monospace). Layout runs twice per export: once at
//! 1× to measure, once at the chosen scale to paint.

use std::sync::Mutex;

use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};
use image::{Rgb, RgbImage};

use crate::export::ExportError;
use crate::render::{Block, FieldItem, Heading, HeadingLevel, RenderedEntry, RenderedTree};
use crate::templates::{Density, SectionTitleStyle, SkillBadgeStyle, TemplateRules, Typography};

/// Canvas width at 1×, in CSS pixels.
pub const BASE_WIDTH_PX: u32 = 794;
const PADDING: f32 = 48.0;

const INK: [u8; 3] = [17, 24, 39];
const MUTED: [u8; 3] = [75, 85, 99];
const RULE: [u8; 3] = [209, 213, 219];
const PAPER: [u8; 3] = [255, 255, 255];

/// Turns a rendered tree into pixels.
pub trait Rasterizer: Send + Sync + 'static {
    /// Size of the rasterized tree at 1×, `(width, height)` in pixels.
    fn measure(&self, tree: &RenderedTree) -> Result<(u32, u32), ExportError>;

    fn rasterize(&self, tree: &RenderedTree, scale: f32) -> Result<RgbImage, ExportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Canvas rasterizer
// ────────────────────────────────────────────────────────────────────────────

struct FontContext {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

/// Default rasterizer backed by cosmic-text and the system font database.
pub struct CanvasRasterizer {
    fonts: Mutex<FontContext>,
}

impl CanvasRasterizer {
    pub fn new() -> Self {
        Self {
            fonts: Mutex::new(FontContext {
                font_system: FontSystem::new(),
                swash_cache: SwashCache::new(),
            }),
        }
    }

    fn with_fonts<T>(&self, f: impl FnOnce(&mut FontContext) -> T) -> Result<T, ExportError> {
        let mut guard = self
            .fonts
            .lock()
            .map_err(|_| ExportError::Raster("font context lock poisoned".to_string()))?;
        Ok(f(&mut *guard))
    }
}

impl Default for CanvasRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer for CanvasRasterizer {
    fn measure(&self, tree: &RenderedTree) -> Result<(u32, u32), ExportError> {
        self.with_fonts(|ctx| {
            let layout = layout_tree(ctx, tree, 1.0);
            (BASE_WIDTH_PX, layout.height.ceil() as u32)
        })
    }

    fn rasterize(&self, tree: &RenderedTree, scale: f32) -> Result<RgbImage, ExportError> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ExportError::Raster(format!("invalid scale {scale}")));
        }
        self.with_fonts(|ctx| {
            let layout = layout_tree(ctx, tree, scale);
            let width = (BASE_WIDTH_PX as f32 * scale).round() as u32;
            let height = (layout.height.ceil() as u32).max(1);
            let mut canvas = RgbImage::from_pixel(width, height, Rgb(PAPER));
            paint(ctx, &layout, &mut canvas);
            canvas
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

enum DrawOp {
    Text {
        buffer: Buffer,
        x: f32,
        y: f32,
        color: [u8; 3],
    },
    Fill {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: [u8; 3],
    },
}

struct Layout {
    ops: Vec<DrawOp>,
    height: f32,
}

/// Font sizes and spacing for one density, in pixels at 1×.
struct Scale {
    title: (f32, f32),
    section: (f32, f32),
    body: (f32, f32),
    small: (f32, f32),
    section_gap: f32,
    entry_gap: f32,
    line_gap: f32,
}

impl Scale {
    fn for_density(density: Density, s: f32) -> Self {
        let base = match density {
            Density::Normal => Scale {
                title: (28.0, 34.0),
                section: (17.0, 24.0),
                body: (13.0, 19.0),
                small: (11.0, 16.0),
                section_gap: 18.0,
                entry_gap: 10.0,
                line_gap: 4.0,
            },
            Density::Compact => Scale {
                title: (24.0, 30.0),
                section: (15.0, 20.0),
                body: (12.0, 16.0),
                small: (10.0, 14.0),
                section_gap: 12.0,
                entry_gap: 6.0,
                line_gap: 2.0,
            },
        };
        let m = |(a, b): (f32, f32)| (a * s, b * s);
        Scale {
            title: m(base.title),
            section: m(base.section),
            body: m(base.body),
            small: m(base.small),
            section_gap: base.section_gap * s,
            entry_gap: base.entry_gap * s,
            line_gap: base.line_gap * s,
        }
    }
}

struct TextRun<'a> {
    text: &'a str,
    size: (f32, f32),
    bold: bool,
    max_width: Option<f32>,
}

struct Cursor<'c> {
    ctx: &'c mut FontContext,
    rules: &'c TemplateRules,
    scale: Scale,
    s: f32,
    left: f32,
    width: f32,
    y: f32,
    ops: Vec<DrawOp>,
}

fn layout_tree(ctx: &mut FontContext, tree: &RenderedTree, s: f32) -> Layout {
    let rules = &tree.rules;
    let mut cursor = Cursor {
        ctx,
        rules,
        scale: Scale::for_density(rules.density, s),
        s,
        left: PADDING * s,
        width: (BASE_WIDTH_PX as f32 - 2.0 * PADDING) * s,
        y: PADDING * s,
        ops: Vec::new(),
    };

    for (i, section) in tree.sections.iter().enumerate() {
        if i > 0 {
            cursor.y += cursor.scale.section_gap;
        }
        for block in &section.blocks {
            cursor.block(block);
        }
    }

    let height = cursor.y + PADDING * s;
    Layout {
        ops: cursor.ops,
        height,
    }
}

impl Cursor<'_> {
    fn family(&self) -> Family<'static> {
        match self.rules.typography {
            Typography::Sans => Family::SansSerif,
            Typography::Serif => Family::Serif,
            Typography::Mono => Family::Monospace,
        }
    }

    fn accent(&self) -> [u8; 3] {
        self.rules.accent
    }

    /// Shapes text and returns the buffer with its measured `(width, height)`.
    fn shape(&mut self, run: TextRun<'_>) -> (Buffer, f32, f32) {
        let family = self.family();
        let font_system = &mut self.ctx.font_system;
        let (size, line_height) = run.size;
        let mut buffer = Buffer::new(font_system, Metrics::new(size, line_height));
        buffer.set_size(font_system, run.max_width, None);
        let mut attrs = Attrs::new().family(family);
        if run.bold {
            attrs = attrs.weight(Weight::BOLD);
        }
        buffer.set_text(font_system, run.text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(font_system, false);

        let mut width = 0.0_f32;
        let mut lines = 0usize;
        for line in buffer.layout_runs() {
            width = width.max(line.line_w);
            lines += 1;
        }
        let height = lines.max(1) as f32 * line_height;
        (buffer, width, height)
    }

    fn text_at(&mut self, run: TextRun<'_>, x: f32, color: [u8; 3]) -> f32 {
        let (buffer, _, height) = self.shape(run);
        self.ops.push(DrawOp::Text {
            buffer,
            x,
            y: self.y,
            color,
        });
        height
    }

    fn rule(&mut self, color: [u8; 3]) {
        let thickness = self.s.max(1.0);
        self.ops.push(DrawOp::Fill {
            x: self.left,
            y: self.y,
            w: self.width,
            h: thickness,
            color,
        });
        self.y += thickness;
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Heading(heading) => self.heading(heading),
            Block::FieldList { fields } => self.contact_line(fields),
            Block::Paragraph { text } => {
                let run = TextRun {
                    text,
                    size: self.scale.body,
                    bold: false,
                    max_width: Some(self.width),
                };
                let h = self.text_at(run, self.left, INK);
                self.y += h + self.scale.line_gap;
            }
            Block::BadgeList { items, style } => self.badges(items, *style),
            Block::EntryList { entries } => {
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        self.y += self.scale.entry_gap;
                    }
                    self.entry(entry);
                }
            }
        }
    }

    fn heading(&mut self, heading: &Heading) {
        match heading.level {
            HeadingLevel::Title => {
                let run = TextRun {
                    text: &heading.text,
                    size: self.scale.title,
                    bold: true,
                    max_width: None,
                };
                let (buffer, w, h) = self.shape(run);
                let x = self.left + ((self.width - w) / 2.0).max(0.0);
                self.ops.push(DrawOp::Text {
                    buffer,
                    x,
                    y: self.y,
                    color: INK,
                });
                self.y += h + self.scale.line_gap;
            }
            HeadingLevel::Section => {
                let (color, rule) = match heading.style {
                    SectionTitleStyle::AccentColored => (self.accent(), self.accent()),
                    SectionTitleStyle::UppercaseTracked => (INK, INK),
                    SectionTitleStyle::Plain => (INK, RULE),
                };
                let run = TextRun {
                    text: &heading.text,
                    size: self.scale.section,
                    bold: true,
                    max_width: Some(self.width),
                };
                let h = self.text_at(run, self.left, color);
                self.y += h + self.scale.line_gap;
                self.rule(rule);
                self.y += self.scale.line_gap * 2.0;
            }
        }
    }

    fn contact_line(&mut self, fields: &[FieldItem]) {
        let line = fields
            .iter()
            .map(|f| f.value.as_str())
            .collect::<Vec<_>>()
            .join("  •  ");
        let run = TextRun {
            text: &line,
            size: self.scale.small,
            bold: false,
            max_width: Some(self.width),
        };
        let (buffer, w, h) = self.shape(run);
        let x = self.left + ((self.width - w) / 2.0).max(0.0);
        self.ops.push(DrawOp::Text {
            buffer,
            x,
            y: self.y,
            color: MUTED,
        });
        self.y += h + self.scale.line_gap * 2.0;
        self.rule(RULE);
    }

    fn badges(&mut self, items: &[String], style: SkillBadgeStyle) {
        let pad_x = 8.0 * self.s;
        let pad_y = 3.0 * self.s;
        let gap = 6.0 * self.s;
        let border = self.s.max(1.0);
        let accent = self.accent();
        let tint = tint(accent, 0.85);

        let mut x = self.left;
        let mut row_height = 0.0_f32;
        for item in items {
            let run = TextRun {
                text: item,
                size: self.scale.small,
                bold: false,
                max_width: None,
            };
            let (buffer, w, h) = self.shape(run);
            let badge_w = w + 2.0 * pad_x;
            let badge_h = h + 2.0 * pad_y;
            if x > self.left && x + badge_w > self.left + self.width {
                x = self.left;
                self.y += row_height + gap;
                row_height = 0.0;
            }

            match style {
                SkillBadgeStyle::Filled => self.ops.push(DrawOp::Fill {
                    x,
                    y: self.y,
                    w: badge_w,
                    h: badge_h,
                    color: tint,
                }),
                SkillBadgeStyle::Outline => {
                    for (bx, by, bw, bh) in [
                        (x, self.y, badge_w, border),
                        (x, self.y + badge_h - border, badge_w, border),
                        (x, self.y, border, badge_h),
                        (x + badge_w - border, self.y, border, badge_h),
                    ] {
                        self.ops.push(DrawOp::Fill {
                            x: bx,
                            y: by,
                            w: bw,
                            h: bh,
                            color: RULE,
                        });
                    }
                }
            }
            let text_color = match style {
                SkillBadgeStyle::Filled => accent,
                SkillBadgeStyle::Outline => INK,
            };
            self.ops.push(DrawOp::Text {
                buffer,
                x: x + pad_x,
                y: self.y + pad_y,
                color: text_color,
            });

            x += badge_w + gap;
            row_height = row_height.max(badge_h);
        }
        self.y += row_height + self.scale.line_gap;
    }

    fn entry(&mut self, entry: &RenderedEntry) {
        let row_top = self.y;

        // Dates sit right-aligned on the title row.
        let mut dates_width = 0.0_f32;
        let mut dates_height = 0.0_f32;
        if let Some(dates) = &entry.dates {
            let run = TextRun {
                text: dates,
                size: self.scale.small,
                bold: false,
                max_width: None,
            };
            let (buffer, w, h) = self.shape(run);
            dates_width = w;
            dates_height = h;
            self.ops.push(DrawOp::Text {
                buffer,
                x: self.left + self.width - w,
                y: row_top,
                color: MUTED,
            });
        }

        let title_width = (self.width - dates_width - 12.0 * self.s).max(self.width * 0.5);
        let run = TextRun {
            text: &entry.title,
            size: self.scale.body,
            bold: true,
            max_width: Some(title_width),
        };
        let h = self.text_at(run, self.left, INK);
        self.y += h;

        if let Some(subtitle) = &entry.subtitle {
            let run = TextRun {
                text: subtitle,
                size: self.scale.body,
                bold: false,
                max_width: Some(title_width),
            };
            let h = self.text_at(run, self.left, MUTED);
            self.y += h;
        }
        self.y = self.y.max(row_top + dates_height);

        for line in &entry.body {
            self.y += self.scale.line_gap;
            let run = TextRun {
                text: line,
                size: self.scale.small,
                bold: false,
                max_width: Some(self.width),
            };
            let h = self.text_at(run, self.left, INK);
            self.y += h;
        }

        if !entry.links.is_empty() {
            let line = entry
                .links
                .iter()
                .map(|l| format!("{}: {}", l.label, l.value))
                .collect::<Vec<_>>()
                .join("    ");
            self.y += self.scale.line_gap;
            let run = TextRun {
                text: &line,
                size: self.scale.small,
                bold: false,
                max_width: Some(self.width),
            };
            let accent = self.accent();
            let h = self.text_at(run, self.left, accent);
            self.y += h;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Painting
// ────────────────────────────────────────────────────────────────────────────

fn paint(ctx: &mut FontContext, layout: &Layout, canvas: &mut RgbImage) {
    for op in &layout.ops {
        match op {
            DrawOp::Fill { x, y, w, h, color } => {
                fill_rect(canvas, *x, *y, *w, *h, *color, 255);
            }
            DrawOp::Text {
                buffer,
                x,
                y,
                color,
            } => {
                let base = Color::rgb(color[0], color[1], color[2]);
                let (ox, oy) = (x.round() as i32, y.round() as i32);
                buffer.draw(
                    &mut ctx.font_system,
                    &mut ctx.swash_cache,
                    base,
                    |gx, gy, gw, gh, c| {
                        fill_rect(
                            canvas,
                            (ox + gx) as f32,
                            (oy + gy) as f32,
                            gw as f32,
                            gh as f32,
                            [c.r(), c.g(), c.b()],
                            c.a(),
                        );
                    },
                );
            }
        }
    }
}

/// Alpha-blends a rectangle onto the canvas, clipped to its bounds.
fn fill_rect(canvas: &mut RgbImage, x: f32, y: f32, w: f32, h: f32, color: [u8; 3], alpha: u8) {
    if alpha == 0 || w <= 0.0 || h <= 0.0 {
        return;
    }
    let x0 = x.round().max(0.0) as u32;
    let y0 = y.round().max(0.0) as u32;
    let x1 = ((x + w).round().max(0.0) as u32).min(canvas.width());
    let y1 = ((y + h).round().max(0.0) as u32).min(canvas.height());
    let a = alpha as f32 / 255.0;

    for py in y0..y1 {
        for px in x0..x1 {
            let pixel = canvas.get_pixel_mut(px, py);
            for (channel, value) in pixel.0.iter_mut().zip(color) {
                *channel = (*channel as f32 * (1.0 - a) + value as f32 * a).round() as u8;
            }
        }
    }
}

/// Mixes `color` towards white by `amount` (0.0 = unchanged, 1.0 = white).
fn tint(color: [u8; 3], amount: f32) -> [u8; 3] {
    color.map(|c| (c as f32 + (255.0 - c as f32) * amount).round() as u8)
}
