use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;

use crate::strings;

#[derive(Debug, Error)]
pub enum SaveError {
    /// No source image has been selected yet.
    #[error("no image to save")]
    NothingToSave,
    /// The library directory cannot be created or written to.
    #[error("photo library at {0} is not writable")]
    Unauthorized(PathBuf),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Encode(#[from] image::ImageError),
}

impl SaveError {
    fn from_io(err: std::io::Error, root: &Path) -> Self {
        if err.kind() == ErrorKind::PermissionDenied {
            SaveError::Unauthorized(root.to_path_buf())
        } else {
            SaveError::Io(err)
        }
    }
}

/// Text shown to the user once a save attempt has finished.
pub fn save_message(result: &Result<PathBuf, SaveError>) -> String {
    match result {
        Ok(_) => strings::IMAGE_SAVED.to_string(),
        Err(SaveError::NothingToSave) => strings::NO_IMAGE_TO_SAVE.to_string(),
        Err(SaveError::Unauthorized(_)) => strings::NO_LIBRARY_ACCESS.to_string(),
        Err(err) => format!("{} {}", strings::ERROR_SAVING_IMAGE, err),
    }
}

/// Add-only photo library backed by a directory.
#[derive(Debug, Clone)]
pub struct PhotoLibrary {
    root: PathBuf,
    jpeg_quality: u8,
}

impl PhotoLibrary {
    pub fn new(root: PathBuf, jpeg_quality: u8) -> Self {
        Self {
            root,
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensures the library directory exists and accepts new files.
    pub fn authorize(&self) -> Result<(), SaveError> {
        std::fs::create_dir_all(&self.root).map_err(|e| SaveError::from_io(e, &self.root))?;
        let meta = std::fs::metadata(&self.root).map_err(|e| SaveError::from_io(e, &self.root))?;
        if !meta.is_dir() || meta.permissions().readonly() {
            return Err(SaveError::Unauthorized(self.root.clone()));
        }
        Ok(())
    }

    /// Writes `img` as a new JPEG in the library and returns its path.
    pub fn add(&self, img: &DynamicImage) -> Result<PathBuf, SaveError> {
        self.authorize()?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let (path, file) = create_unique(&self.root, &format!("YOI_{}", stamp), "jpg")
            .map_err(|e| SaveError::from_io(e, &self.root))?;
        let writer = BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(writer, self.jpeg_quality);
        // JPEG has no alpha channel.
        DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;

        tracing::info!(path = %path.display(), "image saved to library");
        Ok(path)
    }
}

/// Creates a new file named `stem.extension`, or `stem-N.extension` when that
/// name is taken. Never opens an existing file.
fn create_unique(dir: &Path, stem: &str, extension: &str) -> std::io::Result<(PathBuf, File)> {
    for n in 1..10000 {
        let path = if n == 1 {
            dir.join(format!("{}.{}", stem, extension))
        } else {
            dir.join(format!("{}-{}.{}", stem, n, extension))
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free file name for {} in {}", stem, dir.display()),
    ))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{DynamicImage, ImageBuffer, Rgba};

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "yoi-library-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn photo() -> DynamicImage {
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(4, 6, Rgba([200, 100, 50, 128])))
    }

    #[test]
    fn add_creates_library_and_writes_decodable_jpeg() {
        let dir = scratch_dir("add");
        let library = PhotoLibrary::new(dir.join("nested"), 90);
        let path = library.add(&photo()).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        let back = image::open(&path).unwrap();
        assert_eq!((back.width(), back.height()), (4, 6));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn repeated_saves_get_distinct_names() {
        let dir = scratch_dir("repeat");
        let library = PhotoLibrary::new(dir.clone(), 90);
        let first = library.add(&photo()).unwrap();
        let second = library.add(&photo()).unwrap();
        assert_ne!(first, second);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn taken_names_are_skipped_without_touching_existing_files() {
        let dir = scratch_dir("taken");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("shot.jpg"), b"keep").unwrap();

        let (second, _) = create_unique(&dir, "shot", "jpg").unwrap();
        let (third, _) = create_unique(&dir, "shot", "jpg").unwrap();
        assert_eq!(second, dir.join("shot-2.jpg"));
        assert_eq!(third, dir.join("shot-3.jpg"));
        assert_eq!(std::fs::read(dir.join("shot.jpg")).unwrap(), b"keep");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_only_library_is_unauthorized() {
        let dir = scratch_dir("readonly");
        std::fs::create_dir_all(&dir).unwrap();
        let mut perms = std::fs::metadata(&dir).unwrap().permissions();
        perms.set_readonly(true);
        std::fs::set_permissions(&dir, perms.clone()).unwrap();

        let result = PhotoLibrary::new(dir.clone(), 90).add(&photo());
        assert!(matches!(result, Err(SaveError::Unauthorized(_))));
        assert_eq!(save_message(&result), strings::NO_LIBRARY_ACCESS);

        perms.set_readonly(false);
        std::fs::set_permissions(&dir, perms).unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn library_path_that_is_a_file_is_unauthorized() {
        let dir = scratch_dir("file");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let result = PhotoLibrary::new(file, 90).authorize();
        assert!(result.is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn messages_match_each_outcome() {
        assert_eq!(save_message(&Ok(PathBuf::from("a.jpg"))), "Image saved successfully");
        assert_eq!(
            save_message(&Err(SaveError::NothingToSave)),
            "No processed image to save"
        );
        let io = std::io::Error::new(ErrorKind::Other, "disk full");
        assert_eq!(
            save_message(&Err(SaveError::Io(io))),
            "Error saving image: disk full"
        );
    }
}
