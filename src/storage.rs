//! Local storage for generated images
//!
//! Images are saved to the user's Pictures folder, or a custom location if
//! configured in preferences.

use crate::preferences;
use crate::response::GeneratedImage;
use base64::Engine;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory generated images are saved to
///
/// Returns the custom location from preferences if set,
/// otherwise the default location.
pub(crate) fn images_dir() -> Option<PathBuf> {
    preferences::get_image_location().or_else(preferences::default_image_location)
}

/// Ensure a directory exists
fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| StorageError::CreateDirectory {
            path: dir.to_path_buf(),
            source: e,
        })?;
        info!("Created images directory: {:?}", dir);
    }
    Ok(())
}

/// File extension for an image media type
fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Split a `data:{mime};base64,{payload}` URI
fn parse_data_uri(url: &str) -> Result<(&str, Vec<u8>), StorageError> {
    let rest = url.strip_prefix("data:").ok_or(StorageError::NotInline)?;
    let (meta, payload) = rest.split_once(',').ok_or(StorageError::MalformedDataUri)?;
    let mime_type = meta
        .strip_suffix(";base64")
        .ok_or(StorageError::MalformedDataUri)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| StorageError::MalformedDataUri)?;
    Ok((mime_type, bytes))
}

/// Save a generated image into `dir`
///
/// Returns the path to the saved file. Only inline (`data:`) images can be
/// saved; external URLs are rejected.
pub(crate) fn save_image(image: &GeneratedImage, dir: &Path) -> Result<PathBuf, StorageError> {
    let (mime_type, bytes) = parse_data_uri(&image.url)?;
    ensure_dir(dir)?;

    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let extension = extension_for(mime_type);
    let filepath = (1..)
        .map(|n| dir.join(format!("generated-{}-{}.{}", timestamp, n, extension)))
        .find(|path| !path.exists())
        .ok_or(StorageError::NoFreeName)?;

    fs::write(&filepath, &bytes).map_err(|e| StorageError::WriteFile {
        path: filepath.clone(),
        source: e,
    })?;

    info!("Saved image to: {:?}", filepath);
    Ok(filepath)
}

/// Storage errors with contextual information
#[derive(Debug, thiserror::Error)]
pub(crate) enum StorageError {
    #[error("Could not find a Pictures or home directory")]
    NoImagesDir,

    #[error("Only inline images can be saved")]
    NotInline,

    #[error("Malformed data URI")]
    MalformedDataUri,

    #[error("No free file name available")]
    NoFreeName,

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn image(url: &str) -> GeneratedImage {
        GeneratedImage {
            url: url.to_string(),
            prompt: "fox".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_save_png_and_jpeg() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("images");

        let png = save_image(&image("data:image/png;base64,QUJD"), &target).expect("png");
        assert_eq!(png.extension().and_then(|e| e.to_str()), Some("png"));
        assert_eq!(fs::read(&png).unwrap(), b"ABC");
        let name = png.file_name().and_then(|n| n.to_str()).unwrap();
        assert!(name.starts_with("generated-"));

        let jpg = save_image(&image("data:image/jpeg;base64,QUJD"), &target).expect("jpg");
        assert_eq!(jpg.extension().and_then(|e| e.to_str()), Some("jpg"));
    }

    #[test]
    fn test_same_second_saves_do_not_collide() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = save_image(&image("data:image/png;base64,QUJD"), dir.path()).unwrap();
        let second = save_image(&image("data:image/png;base64,REVG"), dir.path()).unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read(&first).unwrap(), b"ABC");
        assert_eq!(fs::read(&second).unwrap(), b"DEF");
    }

    #[test]
    fn test_rejects_external_and_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            save_image(&image("https://example.com/a.png"), dir.path()),
            Err(StorageError::NotInline)
        ));
        assert!(matches!(
            save_image(&image("data:image/png,QUJD"), dir.path()),
            Err(StorageError::MalformedDataUri)
        ));
        assert!(matches!(
            save_image(&image("data:image/png;base64,!!!"), dir.path()),
            Err(StorageError::MalformedDataUri)
        ));
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("image/gif"), "bin");
    }
}
