use std::ops::RangeInclusive;

use image::DynamicImage;

use crate::metadata::Orientation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A single user-adjustable parameter of an edit session.
pub enum Adjustment {
    Brightness,
    Contrast,
    Saturation,
    Blur,
    Temperature,
}

impl Adjustment {
    pub const ALL: [Adjustment; 5] = [
        Adjustment::Brightness,
        Adjustment::Contrast,
        Adjustment::Saturation,
        Adjustment::Blur,
        Adjustment::Temperature,
    ];

    /// Valid range for the stored value.
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Adjustment::Brightness => -0.5..=0.5,
            Adjustment::Contrast => 0.5..=1.5,
            Adjustment::Saturation => 0.0..=2.0,
            Adjustment::Blur => 0.0..=10.0,
            Adjustment::Temperature => -1.0..=1.0,
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            Adjustment::Brightness => 0.0,
            Adjustment::Contrast => 1.0,
            Adjustment::Saturation => 1.0,
            Adjustment::Blur => 0.0,
            Adjustment::Temperature => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Adjustment::Brightness => "Brightness",
            Adjustment::Contrast => "Contrast",
            Adjustment::Saturation => "Saturation",
            Adjustment::Blur => "Blur",
            Adjustment::Temperature => "Temperature",
        }
    }

    /// Clamps `value` into this parameter's range. NaN maps to the default.
    pub fn clamp(self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default_value();
        }
        let range = self.range();
        value.clamp(*range.start(), *range.end())
    }

    /// Whether changing this parameter needs a per-pixel recompute rather than
    /// a display-time transform.
    pub fn needs_recompute(self) -> bool {
        matches!(self, Adjustment::Temperature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Current slider values for one edit session.
pub struct AdjustmentParameters {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub blur: f32,
    /// Normalized intensity, -1.0 (coolest) to 1.0 (warmest).
    pub temperature: f32,
}

impl Default for AdjustmentParameters {
    fn default() -> Self {
        Self {
            brightness: Adjustment::Brightness.default_value(),
            contrast: Adjustment::Contrast.default_value(),
            saturation: Adjustment::Saturation.default_value(),
            blur: Adjustment::Blur.default_value(),
            temperature: Adjustment::Temperature.default_value(),
        }
    }
}

impl AdjustmentParameters {
    pub fn get(&self, adjustment: Adjustment) -> f32 {
        match adjustment {
            Adjustment::Brightness => self.brightness,
            Adjustment::Contrast => self.contrast,
            Adjustment::Saturation => self.saturation,
            Adjustment::Blur => self.blur,
            Adjustment::Temperature => self.temperature,
        }
    }

    /// Stores `value` clamped to the parameter's range and returns what was stored.
    pub fn set(&mut self, adjustment: Adjustment, value: f32) -> f32 {
        let value = adjustment.clamp(value);
        let slot = match adjustment {
            Adjustment::Brightness => &mut self.brightness,
            Adjustment::Contrast => &mut self.contrast,
            Adjustment::Saturation => &mut self.saturation,
            Adjustment::Blur => &mut self.blur,
            Adjustment::Temperature => &mut self.temperature,
        };
        *slot = value;
        value
    }

    /// True when no display-time transform would change the image.
    pub fn is_display_identity(&self) -> bool {
        [
            Adjustment::Brightness,
            Adjustment::Contrast,
            Adjustment::Saturation,
            Adjustment::Blur,
        ]
        .iter()
        .all(|&a| (self.get(a) - a.default_value()).abs() < 0.001)
    }

    /// The subset of parameters that feed the display chain, for cache keys.
    pub fn display_key(&self) -> [f32; 4] {
        [self.brightness, self.contrast, self.saturation, self.blur]
    }
}

#[derive(Debug, Clone)]
/// A decoded photo together with the orientation recorded by the camera.
pub struct SourceImage {
    pub pixels: DynamicImage,
    pub orientation: Orientation,
}

impl SourceImage {
    pub fn new(pixels: DynamicImage, orientation: Orientation) -> Self {
        Self {
            pixels,
            orientation,
        }
    }

    /// An image whose pixels are already stored upright.
    pub fn upright(pixels: DynamicImage) -> Self {
        Self::new(pixels, Orientation::Normal)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

#[derive(Debug, Clone)]
/// A rendered preview and the parameter snapshot it was computed from.
pub struct PreviewImage {
    pub image: DynamicImage,
    pub params: AdjustmentParameters,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clamps_to_parameter_range() {
        let mut params = AdjustmentParameters::default();
        assert_eq!(params.set(Adjustment::Brightness, 3.0), 0.5);
        assert_eq!(params.set(Adjustment::Contrast, 0.0), 0.5);
        assert_eq!(params.set(Adjustment::Saturation, -1.0), 0.0);
        assert_eq!(params.set(Adjustment::Blur, 42.0), 10.0);
        assert_eq!(params.set(Adjustment::Temperature, -7.0), -1.0);
        assert_eq!(params.brightness, 0.5);
        assert_eq!(params.blur, 10.0);
    }

    #[test]
    fn nan_falls_back_to_default() {
        let mut params = AdjustmentParameters::default();
        params.set(Adjustment::Contrast, 1.4);
        assert_eq!(params.set(Adjustment::Contrast, f32::NAN), 1.0);
    }

    #[test]
    fn defaults_are_display_identity() {
        let mut params = AdjustmentParameters::default();
        assert!(params.is_display_identity());
        params.set(Adjustment::Temperature, 1.0);
        assert!(params.is_display_identity());
        params.set(Adjustment::Blur, 2.0);
        assert!(!params.is_display_identity());
    }

    #[test]
    fn only_temperature_needs_recompute() {
        let recompute: Vec<_> = Adjustment::ALL
            .into_iter()
            .filter(|a| a.needs_recompute())
            .collect();
        assert_eq!(recompute, vec![Adjustment::Temperature]);
    }
}
