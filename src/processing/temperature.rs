use image::DynamicImage;
use rayon::prelude::*;

/// White point that maps to a zero intensity.
pub const NEUTRAL_KELVIN: f32 = 6500.0;
/// Kelvin shift at full intensity. Warm moves the light source down, cool moves it up.
pub const KELVIN_SPAN: f32 = 5000.0;
/// Fraction of the physical black-body ratio applied to the pixels.
const STRENGTH: f32 = 0.5;

/// Converts a normalized intensity in [-1, 1] into the target white point.
pub fn intensity_to_kelvin(intensity: f32) -> f32 {
    NEUTRAL_KELVIN - intensity.clamp(-1.0, 1.0) * KELVIN_SPAN
}

/// Converts whole slider units in [-100, 100] into a normalized intensity.
pub fn slider_to_intensity(slider: f32) -> f32 {
    (slider / 100.0).clamp(-1.0, 1.0)
}

/// Per-channel gains that shift an image's colour temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureFilter {
    gains: [f32; 3],
}

impl TemperatureFilter {
    /// Builds the filter for `intensity`, or `None` when no usable gains exist.
    pub fn new(intensity: f32) -> Option<Self> {
        if !intensity.is_finite() {
            return None;
        }
        let target = kelvin_to_rgb(intensity_to_kelvin(intensity));
        let neutral = kelvin_to_rgb(NEUTRAL_KELVIN);

        let mut gains = [1.0; 3];
        for c in 0..3 {
            if neutral[c] <= f32::EPSILON {
                return None;
            }
            let ratio = target[c] / neutral[c];
            gains[c] = 1.0 + (ratio - 1.0) * STRENGTH;
            if !gains[c].is_finite() || gains[c] < 0.0 {
                return None;
            }
        }
        Some(Self { gains })
    }

    pub fn gains(&self) -> [f32; 3] {
        self.gains
    }

    /// Renders the filtered image, or `None` if there is nothing to render.
    pub fn render(&self, img: &DynamicImage) -> Option<DynamicImage> {
        if img.width() == 0 || img.height() == 0 {
            return None;
        }
        let gains = self.gains;
        let mut rgba = img.to_rgba8();
        rgba.par_chunks_mut(4).for_each(|px| {
            for c in 0..3 {
                let v = px[c] as f32 * gains[c];
                px[c] = v.round().clamp(0.0, 255.0) as u8;
            }
        });
        Some(DynamicImage::ImageRgba8(rgba))
    }
}

/// Shifts the colour temperature of `img` by a normalized `intensity`.
///
/// Positive values warm the image, negative values cool it. If the filter
/// cannot be built or yields no output the input is returned unchanged.
pub fn apply_temperature(img: &DynamicImage, intensity: f32) -> DynamicImage {
    match TemperatureFilter::new(intensity).and_then(|f| f.render(img)) {
        Some(out) => out,
        None => {
            tracing::debug!(intensity, "temperature filter unavailable, passing image through");
            img.clone()
        }
    }
}

/// Approximate sRGB colour of a black-body radiator, channels in [0, 1].
fn kelvin_to_rgb(kelvin: f32) -> [f32; 3] {
    let t = kelvin.clamp(1000.0, 40000.0) / 100.0;

    let r = if t <= 66.0 {
        255.0
    } else {
        329.698_73 * (t - 60.0).powf(-0.133_204_76)
    };
    let g = if t <= 66.0 {
        99.470_8 * t.ln() - 161.119_57
    } else {
        288.122_17 * (t - 60.0).powf(-0.075_514_85)
    };
    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.517_73 * (t - 10.0).ln() - 305.044_8
    };

    [
        r.clamp(0.0, 255.0) / 255.0,
        g.clamp(0.0, 255.0) / 255.0,
        b.clamp(0.0, 255.0) / 255.0,
    ]
}
