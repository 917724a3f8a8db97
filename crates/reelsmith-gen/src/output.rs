//! Output path resolution and extension normalization

use crate::config::ProjectPaths;
use crate::provider::MediaKind;
use reelsmith_core::Result;
use std::path::{Path, PathBuf};

/// Resolve where a generated file goes and create its directory.
///
/// Audio and video get `.mp3`/`.mp4` appended when missing. Image extensions
/// are settled later from the response MIME type.
pub fn prepare_output(paths: &ProjectPaths, kind: MediaKind, requested: &str) -> Result<PathBuf> {
    let resolved = paths.resolve_output(kind, requested);
    let resolved = match kind.fixed_extension() {
        Some(ext) => ensure_extension(&resolved, ext),
        None => resolved,
    };
    if let Some(parent) = resolved.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(resolved)
}

/// Append `.ext` unless the path already ends with it
pub fn ensure_extension(path: &Path, ext: &str) -> PathBuf {
    let has_ext = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false);
    if has_ext {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }
}

/// Replace whatever extension the path has with `ext`
pub fn replace_extension(path: &Path, ext: &str) -> PathBuf {
    let has_ext = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false);
    if has_ext {
        path.to_path_buf()
    } else {
        path.with_extension(ext)
    }
}

/// File extension for an image MIME type (`image/png` -> `png`)
pub fn mime_extension(mime: &str) -> &str {
    mime.split(';')
        .next()
        .and_then(|m| m.split('/').nth(1))
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("png")
}

/// Sibling placeholder path used when video generation is deferred
pub fn pending_path(path: &Path) -> PathBuf {
    path.with_extension("pending.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_extension() {
        assert_eq!(
            ensure_extension(Path::new("audio/intro"), "mp3"),
            PathBuf::from("audio/intro.mp3")
        );
        assert_eq!(
            ensure_extension(Path::new("audio/intro.mp3"), "mp3"),
            PathBuf::from("audio/intro.mp3")
        );
        assert_eq!(
            ensure_extension(Path::new("audio/intro.wav"), "mp3"),
            PathBuf::from("audio/intro.wav.mp3")
        );
    }

    #[test]
    fn test_image_extension_from_mime() {
        assert_eq!(mime_extension("image/png"), "png");
        assert_eq!(mime_extension("image/jpeg"), "jpeg");
        assert_eq!(mime_extension("image/webp; charset=binary"), "webp");
        assert_eq!(mime_extension("garbage"), "png");
        assert_eq!(
            replace_extension(Path::new("ch1/station.png"), "jpeg"),
            PathBuf::from("ch1/station.jpeg")
        );
        assert_eq!(
            replace_extension(Path::new("ch1/station"), "png"),
            PathBuf::from("ch1/station.png")
        );
    }

    #[test]
    fn test_pending_path() {
        assert_eq!(
            pending_path(Path::new("/p/public/video/ch1/bridge.mp4")),
            PathBuf::from("/p/public/video/ch1/bridge.pending.json")
        );
    }

    #[test]
    fn test_prepare_output_creates_dirs() {
        let root = std::env::temp_dir().join(format!("reelsmith_output_test_{}", uuid::Uuid::new_v4()));
        let paths = ProjectPaths::new(&root);

        let path = prepare_output(&paths, MediaKind::SoundEffect, "ch2/whistle").unwrap();
        assert_eq!(path, root.join("public/audio/sfx/ch2/whistle.mp3"));
        assert!(path.parent().unwrap().is_dir());

        let path = prepare_output(&paths, MediaKind::Image, "public/images/map.png").unwrap();
        assert_eq!(path, root.join("public/images/map.png"));

        std::fs::remove_dir_all(&root).ok();
    }
}
