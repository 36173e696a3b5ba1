use image::DynamicImage;

use crate::state::AdjustmentParameters;

/// Scales chroma around Rec. 709 luma; 0 is grayscale, 1 is unchanged.
pub fn apply(img: DynamicImage, params: &AdjustmentParameters) -> DynamicImage {
    let saturation = params.saturation.clamp(0.0, 2.0);
    if (saturation - 1.0).abs() < 0.001 {
        return img;
    }

    let mut rgba = img.to_rgba8();
    for px in rgba.pixels_mut() {
        let r = px[0] as f32 / 255.0;
        let g = px[1] as f32 / 255.0;
        let b = px[2] as f32 / 255.0;
        let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;

        px[0] = mix(luma, r, saturation);
        px[1] = mix(luma, g, saturation);
        px[2] = mix(luma, b, saturation);
    }

    DynamicImage::ImageRgba8(rgba)
}

fn mix(luma: f32, channel: f32, amount: f32) -> u8 {
    let v = (luma + (channel - luma) * amount).clamp(0.0, 1.0);
    (v * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageBuffer, Rgba};

    use crate::state::AdjustmentParameters;

    use super::apply;

    fn one_pixel(rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
            1,
            1,
            Rgba([rgb[0], rgb[1], rgb[2], 255]),
        ))
    }

    fn pixel_rgb(img: &DynamicImage) -> [u8; 3] {
        let p = img.to_rgba8().get_pixel(0, 0).0;
        [p[0], p[1], p[2]]
    }

    #[test]
    fn zero_saturation_is_grayscale() {
        let params = AdjustmentParameters {
            saturation: 0.0,
            ..Default::default()
        };
        let rgb = pixel_rgb(&apply(one_pixel([200, 40, 90]), &params));
        assert_eq!(rgb[0], rgb[1]);
        assert_eq!(rgb[1], rgb[2]);
    }

    #[test]
    fn double_saturation_widens_channel_spread() {
        let params = AdjustmentParameters {
            saturation: 2.0,
            ..Default::default()
        };
        let rgb = pixel_rgb(&apply(one_pixel([160, 100, 100]), &params));
        assert!(rgb[0] as i32 - rgb[1] as i32 > 60);
    }
}
