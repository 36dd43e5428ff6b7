use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use image::RgbaImage;
use tracing::debug;

use crate::events::PreparedImageCpu;
use crate::tasks::scheduler::ImageDecoder;

/// Production decoder: sniffs the format, decodes to RGBA8 and applies the
/// EXIF orientation, all on a blocking worker so the runtime stays free.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoDecoder;

impl PhotoDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for PhotoDecoder {
    fn decode(&self, path: PathBuf) -> BoxFuture<'static, Result<PreparedImageCpu>> {
        async move {
            let worker_path = path.clone();
            let rgba = tokio::task::spawn_blocking(move || decode_oriented(&worker_path))
                .await
                .context("decode worker panicked")??;
            let (width, height) = rgba.dimensions();
            Ok(PreparedImageCpu {
                path,
                width,
                height,
                pixels: rgba.into_raw(),
            })
        }
        .boxed()
    }
}

fn decode_oriented(path: &Path) -> Result<RgbaImage> {
    let decoded = image::ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("sniffing format of {}", path.display()))?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?;

    let rgba = decoded.to_rgba8();
    let orientation = read_orientation(path).unwrap_or(1);
    Ok(apply_orientation(rgba, orientation))
}

/// Map the eight EXIF orientation values onto flips and rotations.
/// Unknown values leave the image untouched.
fn apply_orientation(img: RgbaImage, orientation: u16) -> RgbaImage {
    use image::imageops;
    match orientation {
        2 => imageops::flip_horizontal(&img),
        3 => imageops::rotate180(&img),
        4 => imageops::flip_vertical(&img),
        5 => imageops::flip_horizontal(&imageops::rotate90(&img)),
        6 => imageops::rotate90(&img),
        7 => imageops::flip_horizontal(&imageops::rotate270(&img)),
        8 => imageops::rotate270(&img),
        _ => img,
    }
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let value = field.value.get_uint(0)? as u16;
    debug!(orientation = value, path = %path.display(), "exif orientation");
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    // JPEG 2x1 with EXIF orientation 6 (rotate 90 CW), base64 encoded.
    const ORIENT6_JPEG: &str = concat!(
        "/9j/4AAQSkZJRgABAQAAAQABAAD/4QAiRXhpZgAATU0AKgAAAAgAAQESAAMAAAABAAYAAAAAAAD/2wBDAAgGBgcGBQgHBwcJCQgKDBQNDAsLDBkSEw8UHRofHh0aHBwgJC4nICIsIxwcKDcpLDAxNDQ0Hyc5PTgyPC4zNDL/",
        "2wBDAQkJCQwLDBgNDRgyIRwhMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjIyMjL/wAARCAABAAIDASIAAhEBAxEB/8QAHwAAAQUBAQEBAQEAAAAAAAAAAAECAwQFBgcICQoL/8QAtRAAAgEDAwIEAwUFBAQAAAF9AQIDAAQRBRIhMUEGE1FhByJxFDKBkaEII0KxwRVS0fAkM2JyggkKFhcYGRolJicoKSo0NTY3ODk6Q0RFRkdISUpTVFVWV1hZWmNkZWZnaGlqc3R1dnd4eXqDhIWGh4iJipKTlJWWl5iZmqKjpKWmp6ipqrKztLW2t7i5usLDxMXGx8jJytLT1NXW19jZ2uHi4+Tl5ufo6erx8vP09fb3+Pn6/8QAHwEAAwEBAQEBAQEBAQAAAAAAAAECAwQFBgcICQoL/8QAtREAAgECBAQDBAcFBAQAAQJ3AAECAxEEBSExBhJBUQdhcRMiMoEIFEKRobHBCSMzUvAVYnLRChYkNOEl8RcYGRomJygpKjU2Nzg5OkNERUZHSElKU1RVVldYWVpjZGVmZ2hpanN0dXZ3eHl6goOEhYaHiImKkpOUlZaXmJmaoqOkpaanqKmqsrO0tba3uLm6wsPExcbHyMnK0tPU1dbX2Nna4uPk5ebn6Onq8vP09fb3+Pn6/9oADAMBAAIRAxEAPwDi6KKK+ZP3E//Z"
    );

    #[test]
    fn applies_orientation_six() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(ORIENT6_JPEG)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orient6.jpg");
        std::fs::write(&path, &bytes).unwrap();

        let img = decode_oriented(&path).unwrap();
        assert_eq!(img.dimensions(), (1, 2));
    }

    #[test]
    fn rejects_non_image_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(decode_oriented(&path).is_err());
    }

    #[tokio::test]
    async fn decoder_reports_dimensions_and_path() {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(ORIENT6_JPEG)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orient6.jpg");
        std::fs::write(&path, &bytes).unwrap();

        let prepared = PhotoDecoder::new().decode(path.clone()).await.unwrap();
        assert_eq!(prepared.path, path);
        assert_eq!((prepared.width, prepared.height), (1, 2));
        assert_eq!(prepared.pixels.len(), 8);
    }

    #[tokio::test]
    async fn decoder_surfaces_missing_file_errors() {
        let err = PhotoDecoder::new()
            .decode(PathBuf::from("/no/such/picture.png"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("picture.png"));
    }
}
