use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail, ensure};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Extension filter, the native stand-in for the original `image/*` check.
pub fn is_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(|s| s.to_ascii_lowercase()),
        Some(ref e) if ["jpg", "jpeg", "png", "gif", "webp"].contains(&e.as_str())
    )
}

/// Resolve the user's sources into the slideshow's image set.
///
/// Plain files must pass the extension filter; directories are walked
/// recursively, following symlinks. The result is sorted and deduplicated so
/// discovery is deterministic before the one-time shuffle. The set is fixed
/// for the lifetime of the show; nothing watches for later changes.
pub fn discover_images(sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for source in sources {
        if source.is_dir() {
            for entry in WalkDir::new(source)
                .follow_links(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
            {
                let path = entry.path().to_path_buf();
                if is_image(&path) {
                    debug!(path = %path.display(), "discovered image");
                    found.push(path);
                }
            }
        } else if source.is_file() {
            if is_image(source) {
                found.push(source.clone());
            } else {
                debug!(path = %source.display(), "skipping non-image file");
            }
        } else {
            bail!("no such file or directory: {}", source.display());
        }
    }

    found.sort();
    found.dedup();
    ensure!(
        !found.is_empty(),
        "no image files found in the given sources"
    );
    info!(count = found.len(), "image discovery complete");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(is_image(Path::new("a.jpg")));
        assert!(is_image(Path::new("b.JPEG")));
        assert!(is_image(Path::new("c.Png")));
        assert!(is_image(Path::new("d.webp")));
        assert!(!is_image(Path::new("e.txt")));
        assert!(!is_image(Path::new("noext")));
    }

    #[test]
    fn walks_directories_recursively_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        fs::write(nested.join("a.png"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let images = discover_images(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(images.len(), 2);
        assert!(images[0].ends_with("b.jpg") || images[0].ends_with("nested/a.png"));
        assert!(images.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn accepts_explicit_files_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let photo = dir.path().join("one.jpeg");
        fs::write(&photo, b"x").unwrap();

        let images = discover_images(&[photo.clone(), photo.clone()]).unwrap();
        assert_eq!(images, vec![photo]);
    }

    #[test]
    fn errors_when_nothing_matches() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), b"x").unwrap();
        assert!(discover_images(&[dir.path().to_path_buf()]).is_err());
    }

    #[test]
    fn errors_on_missing_source() {
        assert!(discover_images(&[PathBuf::from("/definitely/not/here")]).is_err());
    }
}
