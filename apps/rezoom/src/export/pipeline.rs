use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::RgbImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::export::paginate::{
    analyze_page_fill, choose_scale, plan_pages, PageFillAnalysis, PageFillVerdict, PageGeometry,
    PaginationMode,
};
use crate::export::pdf::assemble_pdf;
use crate::export::raster::Rasterizer;
use crate::export::sink::{export_file_name, DownloadSink};
use crate::export::{ExportError, PreviewSurface};
use crate::render::RenderedTree;

/// Minimum upscaling factor for print-quality output.
pub const MIN_SCALE: f32 = 2.0;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Requested raster scale; must be at least `MIN_SCALE`.
    pub scale: f32,
    /// Upper bound for rasterize + assemble.
    pub timeout: Duration,
    pub pagination: PaginationMode,
    pub geometry: PageGeometry,
    /// Longest bitmap edge, in pixels, the rasterizer may produce.
    pub max_raster_dim: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            timeout: Duration::from_secs(60),
            pagination: PaginationMode::MultiPage,
            geometry: PageGeometry::a4(),
            max_raster_dim: 16_384,
        }
    }
}

impl ExportSettings {
    pub fn validate(&self) -> Result<(), ExportError> {
        if !self.scale.is_finite() || self.scale < MIN_SCALE {
            return Err(ExportError::Settings(format!(
                "scale must be at least {MIN_SCALE}, got {}",
                self.scale
            )));
        }
        if self.timeout.is_zero() {
            return Err(ExportError::Settings("timeout must be non-zero".to_string()));
        }
        if self.max_raster_dim == 0 {
            return Err(ExportError::Settings(
                "max raster dimension must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub file_name: String,
    pub pages: usize,
    /// Scale actually used; lower than requested when content was too tall.
    pub scale: f32,
    pub bytes: usize,
    pub fill: PageFillAnalysis,
}

#[derive(Debug)]
pub enum ExportOutcome {
    Saved(ExportReport),
    /// Nothing is mounted on the preview surface; nothing was exported.
    NotMounted,
    /// Another export from this pipeline is still running.
    AlreadyInProgress,
}

/// Result of the blocking stage, before delivery.
struct Produced {
    bytes: Vec<u8>,
    scale: f32,
    fill: PageFillAnalysis,
}

/// Clears the in-flight flag when dropped, whatever way the export ends.
///
/// Shared with the blocking raster task, so the flag stays set until that task
/// has finished too.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ExportPipeline {
    rasterizer: Arc<dyn Rasterizer>,
    sink: Arc<dyn DownloadSink>,
    settings: ExportSettings,
    in_flight: Arc<AtomicBool>,
}

impl ExportPipeline {
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        sink: Arc<dyn DownloadSink>,
        settings: ExportSettings,
    ) -> Result<Self, ExportError> {
        settings.validate()?;
        Ok(Self {
            rasterizer,
            sink,
            settings,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// True while an export is running; drives the in-progress indicator.
    pub fn is_exporting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Exports whatever the surface has mounted right now.
    ///
    /// Later changes to the surface do not affect an export already started.
    /// On timeout the blocking raster task is left to finish on its own and its
    /// result is discarded; until it does, new exports report `AlreadyInProgress`.
    pub async fn export(&self, surface: &PreviewSurface) -> Result<ExportOutcome, ExportError> {
        let Some(tree) = surface.root() else {
            debug!("Export requested with nothing mounted");
            return Ok(ExportOutcome::NotMounted);
        };

        let Some(guard) = InFlightGuard::acquire(&self.in_flight) else {
            warn!("Export already in progress; ignoring duplicate request");
            return Ok(ExportOutcome::AlreadyInProgress);
        };
        let guard = Arc::new(guard);
        let task_guard = Arc::clone(&guard);

        if !surface.placeholders().is_complete() {
            warn!(
                missing = %surface.placeholders().describe(),
                "Exporting a document with placeholder fields"
            );
        }

        let snapshot = tree.clone();
        let title = surface.title().to_string();
        let file_name = export_file_name(surface.first_name());
        let rasterizer = Arc::clone(&self.rasterizer);
        let settings = self.settings.clone();

        info!(
            template = %snapshot.rules.id,
            file_name = %file_name,
            scale = settings.scale,
            pagination = ?settings.pagination,
            "Export started"
        );

        let task = tokio::task::spawn_blocking(move || {
            let _held = task_guard;
            produce_pdf(rasterizer.as_ref(), &snapshot, &settings, &title)
        });

        let produced = match tokio::time::timeout(self.settings.timeout, task).await {
            Err(_) => {
                warn!(timeout = ?self.settings.timeout, "Export timed out");
                return Err(ExportError::Timeout(self.settings.timeout));
            }
            Ok(Err(e)) => return Err(ExportError::Task(e.to_string())),
            Ok(Ok(result)) => result?,
        };

        let Produced { bytes, scale, fill } = produced;
        let size = bytes.len();
        let path = self.sink.deliver(&file_name, bytes).await?;

        info!(
            path = %path.display(),
            pages = fill.page_count,
            bytes = size,
            "Export finished"
        );

        Ok(ExportOutcome::Saved(ExportReport {
            path,
            file_name,
            pages: fill.page_count,
            scale,
            bytes: size,
            fill,
        }))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Blocking stage
// ────────────────────────────────────────────────────────────────────────────

fn produce_pdf(
    rasterizer: &dyn Rasterizer,
    tree: &RenderedTree,
    settings: &ExportSettings,
    title: &str,
) -> Result<Produced, ExportError> {
    let (base_w, base_h) = rasterizer.measure(tree)?;
    let limit = settings.max_raster_dim;
    let scale = choose_scale(base_w, base_h, settings.scale, limit).ok_or(
        ExportError::ContentTooLarge {
            width: base_w,
            height: base_h,
            limit,
        },
    )?;
    if scale < settings.scale {
        warn!(
            requested = settings.scale,
            used = scale,
            height = base_h,
            "Content too tall for requested scale; rasterizing at reduced scale"
        );
    }

    let bitmap: RgbImage = rasterizer.rasterize(tree, scale)?;
    if bitmap.width() > limit || bitmap.height() > limit {
        return Err(ExportError::ContentTooLarge {
            width: bitmap.width(),
            height: bitmap.height(),
            limit,
        });
    }

    let plan = plan_pages(
        bitmap.width(),
        bitmap.height(),
        &settings.geometry,
        settings.pagination,
    );
    let fill = analyze_page_fill(&plan, &settings.geometry);
    if fill.verdict == PageFillVerdict::Overflow {
        warn!(
            overflow = fill.overflow_fraction,
            "Content is taller than one page; single-page export cuts off the bottom"
        );
    }
    debug!(
        pages = fill.page_count,
        last_page_fill = fill.last_page_fill,
        "Pages planned"
    );

    let bytes = assemble_pdf(&bitmap, &plan, &settings.geometry, title)?;
    Ok(Produced { bytes, scale, fill })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use image::Rgb;

    use crate::model::{PersonalField, ResumeDocument};
    use crate::templates::TemplateRegistry;

    /// Fake rasterizer: fixed 1× size, optional delay, blank bitmap.
    struct FakeRasterizer {
        height: u32,
        delay: Duration,
    }

    impl FakeRasterizer {
        fn new(height: u32) -> Self {
            Self {
                height,
                delay: Duration::ZERO,
            }
        }
    }

    impl Rasterizer for FakeRasterizer {
        fn measure(&self, _tree: &RenderedTree) -> Result<(u32, u32), ExportError> {
            Ok((794, self.height))
        }

        fn rasterize(&self, _tree: &RenderedTree, scale: f32) -> Result<RgbImage, ExportError> {
            std::thread::sleep(self.delay);
            let w = (794.0 * scale).round() as u32;
            let h = (self.height as f32 * scale).round() as u32;
            Ok(RgbImage::from_pixel(w, h, Rgb([255, 255, 255])))
        }
    }

    #[derive(Default)]
    struct MemorySink {
        files: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl DownloadSink for MemorySink {
        async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf, ExportError> {
            self.files
                .lock()
                .unwrap()
                .push((file_name.to_string(), bytes));
            Ok(PathBuf::from(file_name))
        }
    }

    fn mounted(first_name: &str) -> PreviewSurface {
        let mut doc = ResumeDocument::new();
        doc.set_personal_info(PersonalField::FirstName, first_name);
        doc.set_personal_info(PersonalField::LastName, "Hopper");
        let mut surface = PreviewSurface::new();
        surface.mount(&doc, &TemplateRegistry::new());
        surface
    }

    fn pipeline(
        rasterizer: FakeRasterizer,
        settings: ExportSettings,
    ) -> (ExportPipeline, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let pipeline = ExportPipeline::new(Arc::new(rasterizer), sink.clone(), settings).unwrap();
        (pipeline, sink)
    }

    #[test]
    fn test_settings_reject_low_scale() {
        let settings = ExportSettings {
            scale: 1.5,
            ..ExportSettings::default()
        };
        assert!(matches!(settings.validate(), Err(ExportError::Settings(_))));
        assert!(ExportSettings::default().validate().is_ok());
    }

    #[tokio::test]
    async fn test_unmounted_surface_is_a_noop() {
        let (pipeline, sink) = pipeline(FakeRasterizer::new(1000), ExportSettings::default());
        let outcome = pipeline.export(&PreviewSurface::new()).await.unwrap();
        assert!(matches!(outcome, ExportOutcome::NotMounted));
        assert!(sink.files.lock().unwrap().is_empty());
        assert!(!pipeline.is_exporting());
    }

    #[tokio::test]
    async fn test_export_saves_named_pdf() {
        let (pipeline, sink) = pipeline(FakeRasterizer::new(1000), ExportSettings::default());
        let outcome = pipeline.export(&mounted("Grace")).await.unwrap();

        let ExportOutcome::Saved(report) = outcome else {
            panic!("expected a saved export");
        };
        assert_eq!(report.file_name, "Grace.pdf");
        assert_eq!(report.pages, 1);
        assert_eq!(report.scale, 2.0);

        let files = sink.files.lock().unwrap();
        assert_eq!(files.len(), 1);
        let parsed = lopdf::Document::load_mem(&files[0].1).unwrap();
        assert_eq!(parsed.get_pages().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_first_name_falls_back_to_resume() {
        let (pipeline, _sink) = pipeline(FakeRasterizer::new(500), ExportSettings::default());
        let ExportOutcome::Saved(report) = pipeline.export(&mounted("")).await.unwrap() else {
            panic!("expected a saved export");
        };
        assert_eq!(report.file_name, "resume.pdf");
    }

    #[tokio::test]
    async fn test_tall_content_is_paginated() {
        // 2500 px at 1× is 5000 px at 2×; an A4 page holds ~2245 px at that width.
        let (pipeline, sink) = pipeline(FakeRasterizer::new(2500), ExportSettings::default());
        let ExportOutcome::Saved(report) = pipeline.export(&mounted("Grace")).await.unwrap() else {
            panic!("expected a saved export");
        };
        assert_eq!(report.pages, 3);
        assert_eq!(report.fill.verdict, PageFillVerdict::MultiPage);

        let files = sink.files.lock().unwrap();
        let parsed = lopdf::Document::load_mem(&files[0].1).unwrap();
        assert_eq!(parsed.get_pages().len(), 3);
    }

    #[tokio::test]
    async fn test_single_page_mode_keeps_one_page() {
        let settings = ExportSettings {
            pagination: PaginationMode::SinglePage,
            ..ExportSettings::default()
        };
        let (pipeline, _sink) = pipeline(FakeRasterizer::new(2500), settings);
        let ExportOutcome::Saved(report) = pipeline.export(&mounted("Grace")).await.unwrap() else {
            panic!("expected a saved export");
        };
        assert_eq!(report.pages, 1);
        assert_eq!(report.fill.verdict, PageFillVerdict::Overflow);
    }

    #[tokio::test]
    async fn test_oversized_content_degrades_scale() {
        let settings = ExportSettings {
            max_raster_dim: 4000,
            ..ExportSettings::default()
        };
        let (pipeline, _sink) = pipeline(FakeRasterizer::new(2500), settings);
        let ExportOutcome::Saved(report) = pipeline.export(&mounted("Grace")).await.unwrap() else {
            panic!("expected a saved export");
        };
        assert!(report.scale < 2.0 && report.scale >= 1.0);
    }

    #[tokio::test]
    async fn test_content_too_large_fails_and_releases_flag() {
        let settings = ExportSettings {
            max_raster_dim: 4000,
            ..ExportSettings::default()
        };
        let (pipeline, sink) = pipeline(FakeRasterizer::new(5000), settings);
        let err = pipeline.export(&mounted("Grace")).await.unwrap_err();
        assert!(matches!(err, ExportError::ContentTooLarge { .. }));
        assert!(!pipeline.is_exporting());
        assert!(sink.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_export_is_rejected() {
        let rasterizer = FakeRasterizer {
            height: 500,
            delay: Duration::from_millis(200),
        };
        let (pipeline, sink) = pipeline(rasterizer, ExportSettings::default());
        let surface = mounted("Grace");

        let (first, second) = tokio::join!(pipeline.export(&surface), pipeline.export(&surface));
        assert!(matches!(first.unwrap(), ExportOutcome::Saved(_)));
        assert!(matches!(second.unwrap(), ExportOutcome::AlreadyInProgress));
        assert_eq!(sink.files.lock().unwrap().len(), 1);
        assert!(!pipeline.is_exporting());
    }

    #[tokio::test]
    async fn test_timeout_holds_flag_until_task_ends() {
        let rasterizer = FakeRasterizer {
            height: 500,
            delay: Duration::from_millis(500),
        };
        let settings = ExportSettings {
            timeout: Duration::from_millis(50),
            ..ExportSettings::default()
        };
        let (pipeline, sink) = pipeline(rasterizer, settings);

        let surface = mounted("Grace");
        let err = pipeline.export(&surface).await.unwrap_err();
        assert!(matches!(err, ExportError::Timeout(_)));

        // The abandoned raster task still holds the flag until it finishes.
        assert!(pipeline.is_exporting());
        assert!(matches!(
            pipeline.export(&surface).await.unwrap(),
            ExportOutcome::AlreadyInProgress
        ));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while pipeline.is_exporting() && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!pipeline.is_exporting());
        assert!(sink.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_progress_state_is_visible_during_export() {
        let rasterizer = FakeRasterizer {
            height: 500,
            delay: Duration::from_millis(300),
        };
        let (pipeline, _sink) = pipeline(rasterizer, ExportSettings::default());
        assert!(!pipeline.is_exporting());

        let observe = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            pipeline.is_exporting()
        };
        let doc = mounted("Grace");
        let (outcome, during) = tokio::join!(pipeline.export(&doc), observe);
        assert!(matches!(outcome.unwrap(), ExportOutcome::Saved(_)));
        assert!(during);
        assert!(!pipeline.is_exporting());
    }
}
