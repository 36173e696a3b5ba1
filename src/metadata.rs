use image::DynamicImage;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// EXIF orientation (tag 0x0112). Describes how stored pixels must be
/// transformed to display upright.
pub enum Orientation {
    #[default]
    Normal,
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    /// Transpose: mirror across the top-left to bottom-right diagonal.
    Transpose,
    Rotate90,
    /// Transverse: mirror across the top-right to bottom-left diagonal.
    Transverse,
    Rotate270,
}

impl Orientation {
    pub fn from_exif(value: u32) -> Option<Self> {
        Some(match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270,
            _ => return None,
        })
    }

    pub fn is_identity(self) -> bool {
        self == Orientation::Normal
    }

    /// Applies the orientation transform, producing upright pixels.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => img,
            Orientation::FlipHorizontal => img.fliph(),
            Orientation::Rotate180 => img.rotate180(),
            Orientation::FlipVertical => img.flipv(),
            Orientation::Transpose => img.rotate90().fliph(),
            Orientation::Rotate90 => img.rotate90(),
            Orientation::Transverse => img.rotate270().fliph(),
            Orientation::Rotate270 => img.rotate270(),
        }
    }
}

/// Reads the primary-image orientation from an encoded file's EXIF block.
pub fn read_orientation(bytes: &[u8]) -> anyhow::Result<Orientation> {
    let mut cursor = std::io::Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor)?;

    let orientation = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .and_then(Orientation::from_exif)
        .unwrap_or_default();
    Ok(orientation)
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageBuffer, Rgba};

    use super::Orientation;

    // 2x1: red on the left, blue on the right.
    fn red_blue() -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        }))
    }

    #[test]
    fn unknown_exif_values_are_rejected() {
        assert_eq!(Orientation::from_exif(0), None);
        assert_eq!(Orientation::from_exif(9), None);
        assert_eq!(Orientation::from_exif(6), Some(Orientation::Rotate90));
    }

    #[test]
    fn rotate90_turns_row_into_column() {
        let out = Orientation::Rotate90.apply(red_blue()).to_rgba8();
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(out.get_pixel(0, 0)[0], 255);
        assert_eq!(out.get_pixel(0, 1)[2], 255);
    }

    #[test]
    fn transpose_keeps_first_pixel_in_place() {
        let out = Orientation::Transpose.apply(red_blue()).to_rgba8();
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(out.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn garbage_bytes_have_no_exif() {
        assert!(super::read_orientation(b"not an image").is_err());
    }
}
