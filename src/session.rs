use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;

use crate::controller::{PreviewController, Processor, Waker};
use crate::processing::{orientation, pipeline, temperature};
use crate::state::{Adjustment, AdjustmentParameters, PreviewImage, SourceImage};

/// Downscale sources to this longest-edge size for live previews.
pub const PREVIEW_MAX: u32 = 1920;

/// One photo being edited: the upright source, the slider values and the
/// most recent temperature preview.
pub struct EditSession {
    source: Option<SourceImage>,
    /// Downscaled copy of `source` that preview jobs read.
    working: Option<Arc<DynamicImage>>,
    params: AdjustmentParameters,
    preview: Option<PreviewImage>,
    controller: PreviewController,
}

impl EditSession {
    pub fn new(debounce: Duration) -> Self {
        let processor: Processor = Arc::new(|img: &DynamicImage, params: &AdjustmentParameters| {
            temperature::apply_temperature(img, params.temperature)
        });
        Self::with_processor(debounce, processor)
    }

    pub fn with_processor(debounce: Duration, processor: Processor) -> Self {
        Self {
            source: None,
            working: None,
            params: AdjustmentParameters::default(),
            preview: None,
            controller: PreviewController::new(debounce, processor),
        }
    }

    pub fn set_waker(&mut self, waker: Waker) {
        self.controller.set_waker(waker);
    }

    /// Replaces the source with its normalized form and starts over.
    pub fn set_source(&mut self, image: SourceImage) {
        let source = orientation::normalize(image);
        debug_assert!(orientation::is_normalized(&source));
        let working = pipeline::fit_within(&source.pixels, PREVIEW_MAX, PREVIEW_MAX);
        tracing::info!(
            width = source.width(),
            height = source.height(),
            "edit session source replaced"
        );

        self.controller.reset();
        self.source = Some(source);
        self.working = Some(Arc::new(working));
        self.params = AdjustmentParameters::default();
        self.preview = None;
    }

    /// Stores a clamped parameter value; temperature changes schedule a preview job.
    pub fn set_parameter(&mut self, adjustment: Adjustment, value: f32, now: Instant) -> f32 {
        let previous = self.params.get(adjustment);
        let stored = self.params.set(adjustment, value);
        if adjustment.needs_recompute() && stored != previous {
            if let Some(working) = &self.working {
                self.controller.request(Arc::clone(working), self.params, now);
            }
        }
        stored
    }

    pub fn reset_parameters(&mut self, now: Instant) {
        for adjustment in Adjustment::ALL {
            self.set_parameter(adjustment, adjustment.default_value(), now);
        }
    }

    /// Advances the preview controller. Returns true when a new preview landed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.controller.poll(now) {
            Some(preview) => {
                self.preview = Some(preview);
                true
            }
            None => false,
        }
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn params(&self) -> &AdjustmentParameters {
        &self.params
    }

    pub fn preview(&self) -> Option<&PreviewImage> {
        self.preview.as_ref()
    }

    /// The image the display chain should draw: the latest preview, else the
    /// working copy of the source.
    pub fn display_base(&self) -> Option<&DynamicImage> {
        self.preview
            .as_ref()
            .map(|p| &p.image)
            .or(self.working.as_deref())
    }

    pub fn is_processing(&self) -> bool {
        self.controller.is_busy()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.controller.next_deadline()
    }

    pub fn controller(&self) -> &PreviewController {
        &self.controller
    }

    /// Snapshot of the full-resolution source and current parameters that can
    /// be rendered off the UI thread.
    pub fn render_job(&self) -> Option<RenderJob> {
        self.source.as_ref().map(|source| RenderJob {
            pixels: source.pixels.clone(),
            params: self.params,
        })
    }
}

pub struct RenderJob {
    pixels: DynamicImage,
    params: AdjustmentParameters,
}

impl RenderJob {
    pub fn run(self) -> DynamicImage {
        pipeline::render(&self.pixels, &self.params)
    }
}
