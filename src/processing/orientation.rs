use crate::metadata::Orientation;
use crate::state::SourceImage;

/// Returns an equivalent image that is stored upright and in portrait aspect.
///
/// The EXIF orientation is baked into the pixels first; a landscape result is
/// then turned 90° clockwise so that `height >= width`. Square and portrait
/// images with identity orientation come back untouched, which makes the
/// function idempotent.
pub fn normalize(image: SourceImage) -> SourceImage {
    let SourceImage {
        mut pixels,
        orientation,
    } = image;

    if !orientation.is_identity() {
        pixels = orientation.apply(pixels);
    }
    if pixels.width() > pixels.height() {
        pixels = pixels.rotate90();
    }

    SourceImage::new(pixels, Orientation::Normal)
}

pub fn is_normalized(image: &SourceImage) -> bool {
    image.orientation.is_identity() && image.height() >= image.width()
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, ImageBuffer, Rgba};

    use crate::metadata::Orientation;
    use crate::state::SourceImage;

    use super::{is_normalized, normalize};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x * 40) as u8, (y * 40) as u8, 7, 255])
        }))
    }

    #[test]
    fn upright_portrait_is_returned_unchanged() {
        let pixels = gradient(3, 5);
        let out = normalize(SourceImage::upright(pixels.clone()));
        assert_eq!(out.pixels.to_rgba8(), pixels.to_rgba8());
        assert_eq!(out.orientation, Orientation::Normal);
    }

    #[test]
    fn square_is_never_rotated() {
        let pixels = gradient(4, 4);
        let out = normalize(SourceImage::upright(pixels.clone()));
        assert_eq!(out.pixels.to_rgba8(), pixels.to_rgba8());
    }

    #[test]
    fn landscape_becomes_portrait() {
        let out = normalize(SourceImage::upright(gradient(6, 4)));
        assert_eq!((out.width(), out.height()), (4, 6));
        assert!(is_normalized(&out));
    }

    #[test]
    fn exif_rotation_is_baked_in_once() {
        // Stored landscape, tagged "rotate 90": upright it is already portrait.
        let stored = gradient(6, 4);
        let out = normalize(SourceImage::new(stored.clone(), Orientation::Rotate90));
        assert_eq!((out.width(), out.height()), (4, 6));
        assert_eq!(out.pixels.to_rgba8(), stored.rotate90().to_rgba8());
        assert_eq!(out.orientation, Orientation::Normal);
    }

    #[test]
    fn normalize_is_idempotent_for_every_orientation() {
        for tag in 1..=8 {
            let orientation = Orientation::from_exif(tag).unwrap();
            for (w, h) in [(5, 3), (3, 5), (4, 4)] {
                let once = normalize(SourceImage::new(gradient(w, h), orientation));
                let twice = normalize(once.clone());
                assert_eq!(once.pixels.to_rgba8(), twice.pixels.to_rgba8());
                assert_eq!(once.orientation, twice.orientation);
            }
        }
    }

    #[test]
    fn non_square_output_is_never_wider_than_tall() {
        for tag in 1..=8 {
            let orientation = Orientation::from_exif(tag).unwrap();
            for (w, h) in [(7, 2), (2, 7), (9, 8)] {
                let out = normalize(SourceImage::new(gradient(w, h), orientation));
                assert!(out.height() >= out.width(), "tag {tag} {w}x{h}");
            }
        }
    }
}
