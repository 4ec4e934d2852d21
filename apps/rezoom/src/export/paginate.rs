//! Page planning: maps a rasterized bitmap onto physical pages.
//!
//! The bitmap is scaled so its width matches the page width. In multi-page mode it
//! is then cut into page-height bands, one band per page. Single-page mode keeps
//! the legacy behaviour: one page holding the whole bitmap, overflowing the bottom
//! edge when the content is taller than a page.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// Physical page size in PDF points (1/72 in).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageGeometry {
    /// ISO A4 portrait, 210 × 297 mm.
    pub const fn a4() -> Self {
        PageGeometry {
            width_pt: 595.28,
            height_pt: 841.89,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Slice the bitmap into page-height bands.
    #[default]
    MultiPage,
    /// One page, whole bitmap scaled to page width; may overflow the page height.
    SinglePage,
}

impl FromStr for PaginationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multi" | "multi-page" | "multi_page" => Ok(PaginationMode::MultiPage),
            "single" | "single-page" | "single_page" => Ok(PaginationMode::SinglePage),
            other => Err(format!("unknown pagination mode '{other}' (expected multi|single)")),
        }
    }
}

/// A horizontal slice of the bitmap, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub top: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePlan {
    pub mode: PaginationMode,
    /// Points per bitmap pixel; the bitmap width maps exactly onto the page width.
    pub points_per_pixel: f32,
    /// One band per output page, top to bottom.
    pub bands: Vec<Band>,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.bands.len()
    }

    /// Height of a band once placed on the page, in points.
    pub fn band_height_pt(&self, band: &Band) -> f32 {
        band.height as f32 * self.points_per_pixel
    }
}

/// Overall fill verdict for a planned export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PageFillVerdict {
    /// Content fits on one page.
    SinglePage,
    /// Content spans several pages, each cut at a page boundary.
    MultiPage,
    /// Single-page mode with content taller than the page; the bottom is cut off.
    Overflow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFillAnalysis {
    pub page_count: usize,
    /// Fraction of the last page covered by content (0.0 – 1.0).
    pub last_page_fill: f32,
    /// Content height beyond the page, as a fraction of the page height. 0.0 unless overflowing.
    pub overflow_fraction: f32,
    pub verdict: PageFillVerdict,
}

// ────────────────────────────────────────────────────────────────────────────
// Core functions
// ────────────────────────────────────────────────────────────────────────────

/// Plans the pages for a `width × height` bitmap.
pub fn plan_pages(
    bitmap_width: u32,
    bitmap_height: u32,
    geometry: &PageGeometry,
    mode: PaginationMode,
) -> PagePlan {
    let points_per_pixel = geometry.width_pt / bitmap_width.max(1) as f32;
    let total = bitmap_height.max(1);

    let bands = match mode {
        PaginationMode::SinglePage => vec![Band {
            top: 0,
            height: total,
        }],
        PaginationMode::MultiPage => {
            let page_px = ((geometry.height_pt / points_per_pixel).floor() as u32).max(1);
            let mut bands = Vec::with_capacity((total / page_px + 1) as usize);
            let mut top = 0u32;
            while top < total {
                let height = page_px.min(total - top);
                bands.push(Band { top, height });
                top += height;
            }
            bands
        }
    };

    PagePlan {
        mode,
        points_per_pixel,
        bands,
    }
}

/// Analyzes how the planned content sits on its pages.
pub fn analyze_page_fill(plan: &PagePlan, geometry: &PageGeometry) -> PageFillAnalysis {
    let page_count = plan.page_count();
    let last_height_pt = plan
        .bands
        .last()
        .map(|b| plan.band_height_pt(b))
        .unwrap_or(0.0);
    let ratio = last_height_pt / geometry.height_pt;

    let overflow_fraction = (ratio - 1.0).max(0.0);
    let last_page_fill = ratio.clamp(0.0, 1.0);

    let verdict = if overflow_fraction > 1e-4 {
        PageFillVerdict::Overflow
    } else if page_count > 1 {
        PageFillVerdict::MultiPage
    } else {
        PageFillVerdict::SinglePage
    };

    PageFillAnalysis {
        page_count,
        last_page_fill,
        overflow_fraction,
        verdict,
    }
}

/// Picks the raster scale for content that is `base_height` pixels tall at 1×.
///
/// Returns `requested` when the result fits within `max_dim`; otherwise the largest
/// scale that fits, as long as it stays at or above 1×. `None` means the content
/// cannot be rasterized within the limit at all.
pub fn choose_scale(base_width: u32, base_height: u32, requested: f32, max_dim: u32) -> Option<f32> {
    let longest = base_width.max(base_height).max(1) as f32;
    if longest * requested <= max_dim as f32 {
        return Some(requested);
    }
    let fitted = max_dim as f32 / longest;
    (fitted >= 1.0).then_some(fitted)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
