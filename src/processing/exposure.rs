use image::DynamicImage;

use crate::state::AdjustmentParameters;

/// Applies brightness (additive offset) then contrast (gain around mid-gray).
pub fn apply(img: DynamicImage, params: &AdjustmentParameters) -> DynamicImage {
    let brightness = params.brightness.clamp(-0.5, 0.5);
    let contrast = params.contrast.clamp(0.5, 1.5);
    if brightness.abs() < 0.001 && (contrast - 1.0).abs() < 0.001 {
        return img;
    }

    let mut rgba = img.to_rgba8();
    for px in rgba.pixels_mut() {
        for c in 0..3 {
            let v = px[c] as f32 / 255.0 + brightness;
            let v = ((v - 0.5) * contrast + 0.5).clamp(0.0, 1.0);
            px[c] = (v * 255.0).round() as u8;
        }
    }

    DynamicImage::ImageRgba8(rgba)
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageBuffer, Rgba};

    use crate::state::AdjustmentParameters;

    use super::apply;

    fn one_pixel(v: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(1, 1, Rgba([v, v, v, 255])))
    }

    fn red(img: &DynamicImage) -> u8 {
        img.to_rgba8().get_pixel(0, 0)[0]
    }

    #[test]
    fn positive_brightness_lifts_pixels() {
        let params = AdjustmentParameters {
            brightness: 0.2,
            ..Default::default()
        };
        assert!(red(&apply(one_pixel(64), &params)) > 64);
    }

    #[test]
    fn contrast_spreads_values_away_from_mid_gray() {
        let params = AdjustmentParameters {
            contrast: 1.5,
            ..Default::default()
        };
        assert!(red(&apply(one_pixel(200), &params)) > 200);
        assert!(red(&apply(one_pixel(50), &params)) < 50);
    }

    #[test]
    fn low_contrast_pulls_toward_mid_gray() {
        let params = AdjustmentParameters {
            contrast: 0.5,
            ..Default::default()
        };
        let out = red(&apply(one_pixel(250), &params));
        assert!(out < 250 && out > 128);
    }
}
