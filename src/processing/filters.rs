use image::DynamicImage;
use imageproc::filter::gaussian_blur_f32;

use crate::state::AdjustmentParameters;

/// Longest edge, in pixels, at which the blur parameter equals the kernel sigma.
pub const BLUR_REFERENCE_EDGE: f32 = 1920.0;

/// Kernel sigma in pixels for `blur` on an image whose longest edge is `longest_edge`.
///
/// The sigma scales with the image so a preview, the on-screen texture and a
/// full-resolution export all look equally soft.
pub fn blur_sigma(blur: f32, longest_edge: u32) -> f32 {
    blur.clamp(0.0, 10.0) * longest_edge as f32 / BLUR_REFERENCE_EDGE
}

/// Gaussian blur, resolution independent (see [`blur_sigma`]).
pub fn apply(img: DynamicImage, params: &AdjustmentParameters) -> DynamicImage {
    let sigma = blur_sigma(params.blur, img.width().max(img.height()));
    if sigma < 0.001 {
        return img;
    }

    let rgba = img.to_rgba8();
    DynamicImage::ImageRgba8(gaussian_blur_f32(&rgba, sigma))
}
