//! Export pipeline: rendered tree → bitmap → paginated PDF → download.
//!
//! # Rules
//! - Export works on a snapshot of the mounted tree taken at invocation time.
//! - An unmounted surface is a no-op (`ExportOutcome::NotMounted`), never an error.
//! - At most one export is in flight per pipeline.
//! - Rasterization runs off the async executor and is bounded by a timeout.

use std::time::Duration;

use thiserror::Error;

use crate::model::{placeholder_report, PlaceholderReport, ResumeDocument};
use crate::render::{render_tree, RenderedTree};
use crate::templates::TemplateRegistry;

pub mod paginate;
pub mod pdf;
pub mod pipeline;
pub mod raster;
pub mod sink;

pub use paginate::{
    analyze_page_fill, choose_scale, plan_pages, PageFillAnalysis, PageFillVerdict, PageGeometry,
    PagePlan, PaginationMode,
};
pub use pdf::assemble_pdf;
pub use pipeline::{ExportOutcome, ExportPipeline, ExportReport, ExportSettings};
pub use raster::{CanvasRasterizer, Rasterizer, BASE_WIDTH_PX};
pub use sink::{export_file_name, DirectorySink, DownloadSink};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Rasterization failed: {0}")]
    Raster(String),

    #[error("Content too large to rasterize ({width}x{height} px exceeds {limit} px)")]
    ContentTooLarge { width: u32, height: u32, limit: u32 },

    #[error("Export timed out after {0:?}")]
    Timeout(Duration),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export task failed: {0}")]
    Task(String),

    #[error("Invalid export settings: {0}")]
    Settings(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Preview surface
// ────────────────────────────────────────────────────────────────────────────

/// Holds the live rendered tree, the root container export rasterizes.
///
/// A fresh surface is unmounted until the first `mount`.
#[derive(Debug, Clone, Default)]
pub struct PreviewSurface {
    tree: Option<RenderedTree>,
    first_name: String,
    title: String,
    placeholders: PlaceholderReport,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `doc` and mounts the result.
    pub fn mount(&mut self, doc: &ResumeDocument, registry: &TemplateRegistry) {
        self.tree = Some(render_tree(doc, registry));
        self.first_name = doc.personal_info().first_name.trim().to_string();
        self.title = crate::sync::record_title(doc.personal_info());
        self.placeholders = placeholder_report(doc);
    }

    pub fn unmount(&mut self) {
        self.tree = None;
        self.first_name.clear();
        self.title.clear();
        self.placeholders = PlaceholderReport::default();
    }

    pub fn is_mounted(&self) -> bool {
        self.tree.is_some()
    }

    pub fn root(&self) -> Option<&RenderedTree> {
        self.tree.as_ref()
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Display title of the mounted document, used as the PDF title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Fields of the mounted document that currently render as placeholders.
    pub fn placeholders(&self) -> &PlaceholderReport {
        &self.placeholders
    }
}
