use image::DynamicImage;

use crate::state::AdjustmentParameters;

use super::{color, exposure, filters, temperature};

/// Display-time chain: brightness → contrast → saturation → blur.
///
/// Temperature is not part of this chain; it is baked into the base image by
/// the preview job.
pub fn compose(img: &DynamicImage, params: &AdjustmentParameters) -> DynamicImage {
    if params.is_display_identity() {
        return img.clone();
    }
    let mut out = img.clone();
    out = exposure::apply(out, params);
    out = color::apply(out, params);
    out = filters::apply(out, params);
    out
}

/// Downscales `img` to fit within `max_width` x `max_height`, keeping its
/// aspect ratio. Images that already fit are returned as-is.
pub fn fit_within(img: &DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    if img.width() > max_width || img.height() > max_height {
        img.thumbnail(max_width.max(1), max_height.max(1))
    } else {
        img.clone()
    }
}

/// Full render of every parameter, used for export.
pub fn render(img: &DynamicImage, params: &AdjustmentParameters) -> DynamicImage {
    let warmed = temperature::apply_temperature(img, params.temperature);
    compose(&warmed, params)
}
