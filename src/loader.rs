use std::path::Path;

use anyhow::Context;
use image::DynamicImage;

use crate::metadata::{self, Orientation};
use crate::state::SourceImage;

static RAW_EXTS: &[&str] = &["raf", "dng", "nef", "cr2", "arw"];
pub static SUPPORTED_IMAGE_EXTS: &[&str] = &[
    "jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "raf", "dng", "nef", "cr2", "arw",
];

fn has_extension(path: &Path, exts: &[&str]) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy()) else {
        return false;
    };
    exts.iter().any(|known| ext.eq_ignore_ascii_case(known))
}

pub fn is_raw_image(path: &Path) -> bool {
    has_extension(path, RAW_EXTS)
}

/// Decodes an encoded photo, keeping its EXIF orientation.
pub fn decode(bytes: &[u8]) -> anyhow::Result<SourceImage> {
    let pixels = image::load_from_memory(bytes)?;
    let orientation = match metadata::read_orientation(bytes) {
        Ok(orientation) => orientation,
        Err(err) => {
            tracing::debug!(%err, "no usable EXIF orientation");
            Orientation::Normal
        }
    };
    Ok(SourceImage::new(pixels, orientation))
}

/// Opens a photo from disk, developing RAW files with `rawler`.
pub fn open(path: &Path) -> anyhow::Result<SourceImage> {
    open_with_hooks(path, |p: &Path| Ok(std::fs::read(p)?), develop_raw)
}

fn open_with_hooks<FRead, FRaw>(
    path: &Path,
    read_bytes: FRead,
    develop: FRaw,
) -> anyhow::Result<SourceImage>
where
    FRead: Fn(&Path) -> anyhow::Result<Vec<u8>>,
    FRaw: Fn(&Path) -> anyhow::Result<DynamicImage>,
{
    let bytes = read_bytes(path).with_context(|| format!("reading {}", path.display()))?;
    match decode(&bytes) {
        Ok(source) => Ok(source),
        Err(err) if !is_raw_image(path) => Err(err),
        Err(_) => {
            let pixels = develop(path).with_context(|| format!("developing {}", path.display()))?;
            // The RAW developer already emits upright pixels.
            Ok(SourceImage::upright(pixels))
        }
    }
}

fn develop_raw(path: &Path) -> anyhow::Result<DynamicImage> {
    let raw = rawler::decode_file(path)?;
    let develop = rawler::imgop::develop::RawDevelop::default();
    let intermediate = develop.develop_intermediate(&raw)?;
    intermediate
        .to_dynamic_image()
        .ok_or_else(|| anyhow::anyhow!("raw develop produced invalid image"))
}
