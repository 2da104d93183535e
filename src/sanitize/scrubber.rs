//! Metadata scrubbing by re-encode.
//!
//! Images are decoded and written back out from raw pixels, so metadata
//! blocks present in the input (EXIF, XMP, ICC, embedded thumbnails) simply
//! never reach the output; the re-encode path does not copy them forward.
//! Non-image attachments carry no embedded capture metadata in this design
//! and pass through bit-identical.
//!
//! A decode or re-encode failure falls back to transmitting the original
//! bytes rather than blocking the submission. That availability trade-off
//! is deliberate; the warning in the outcome lets a stricter caller reject
//! instead.

use std::io::Cursor;

use chrono::Utc;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageOutputFormat};
use tracing::{debug, warn};

use crate::config::ScrubLimits;
use crate::hash_utils::sha256_hex;

use super::{CandidateFile, SanitizedFile};

/// JPEG quality ladder tried until the output fits the size bound.
const JPEG_QUALITIES: [u8; 5] = [85, 75, 60, 45, 30];

/// Downscale attempts for lossless formats before giving up.
const MAX_DOWNSCALE_PASSES: u32 = 4;

/// Non-fatal scrub problems. The submission proceeds; the caller decides
/// whether to warn the user or reject the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrubWarning {
    /// The image could not be re-encoded and the original, unscrubbed bytes
    /// were kept.
    ReencodeFailed { name: String, reason: String },
}

/// Result of scrubbing one file.
#[derive(Debug, Clone)]
pub struct ScrubOutcome {
    pub file: SanitizedFile,
    pub warning: Option<ScrubWarning>,
}

impl ScrubOutcome {
    pub fn is_clean(&self) -> bool {
        self.warning.is_none()
    }
}

/// Scrubs one admitted file. Images are re-encoded on a blocking worker so
/// the calling flow stays responsive; the input is never mutated.
pub async fn scrub_file(limits: &ScrubLimits, file: CandidateFile) -> ScrubOutcome {
    if !file.is_image() {
        return ScrubOutcome {
            file: SanitizedFile {
                name: file.name,
                media_type: file.media_type,
                bytes: file.bytes,
                modified: Utc::now(),
            },
            warning: None,
        };
    }

    let worker_limits = limits.clone();
    let worker_file = file.clone();
    let reencoded =
        tokio::task::spawn_blocking(move || reencode_image(&worker_limits, &worker_file)).await;

    match reencoded {
        Ok(Ok(bytes)) => {
            debug!(
                name = %file.name,
                before = %sha256_hex(&file.bytes),
                after = %sha256_hex(&bytes),
                "image re-encoded, embedded metadata dropped"
            );
            ScrubOutcome {
                file: SanitizedFile {
                    name: file.name,
                    media_type: file.media_type,
                    bytes,
                    modified: Utc::now(),
                },
                warning: None,
            }
        }
        Ok(Err(reason)) => fallback(file, reason),
        Err(join_err) => fallback(file, format!("re-encode worker failed: {join_err}")),
    }
}

/// Scrubs a whole submission's files, joining every outcome before
/// returning. The assembler never sees partial completion.
pub async fn scrub_all(limits: &ScrubLimits, files: Vec<CandidateFile>) -> Vec<ScrubOutcome> {
    futures::future::join_all(files.into_iter().map(|file| scrub_file(limits, file))).await
}

fn fallback(file: CandidateFile, reason: String) -> ScrubOutcome {
    warn!(
        name = %file.name,
        %reason,
        "re-encode failed, keeping original file unscrubbed"
    );
    ScrubOutcome {
        warning: Some(ScrubWarning::ReencodeFailed {
            name: file.name.clone(),
            reason,
        }),
        file: SanitizedFile {
            name: file.name,
            media_type: file.media_type,
            bytes: file.bytes,
            modified: Utc::now(),
        },
    }
}

fn format_for(media_type: &str) -> Option<ImageFormat> {
    match media_type {
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

fn encode(img: &DynamicImage, format: ImageOutputFormat) -> Result<Vec<u8>, String> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)
        .map_err(|err| err.to_string())?;
    Ok(buffer.into_inner())
}

/// Decode, bound the long edge, re-encode to the declared format, and keep
/// the result under the output size bound.
fn reencode_image(limits: &ScrubLimits, file: &CandidateFile) -> Result<Vec<u8>, String> {
    let format = format_for(&file.media_type)
        .ok_or_else(|| format!("unsupported image type '{}'", file.media_type))?;
    let decoded = image::load_from_memory_with_format(&file.bytes, format)
        .map_err(|err| err.to_string())?;

    let mut img = if decoded.width().max(decoded.height()) > limits.max_edge {
        decoded.resize(limits.max_edge, limits.max_edge, FilterType::Lanczos3)
    } else {
        decoded
    };

    match format {
        ImageFormat::Jpeg => {
            // Lossy output: walk the quality ladder down until it fits.
            for quality in JPEG_QUALITIES {
                let bytes = encode(&img, ImageOutputFormat::Jpeg(quality))?;
                if bytes.len() as u64 <= limits.max_output_bytes {
                    return Ok(bytes);
                }
            }
            Err("re-encoded JPEG does not fit under the size bound".into())
        }
        _ => {
            // Lossless output: shave dimensions until it fits.
            for _ in 0..MAX_DOWNSCALE_PASSES {
                let output = match format {
                    ImageFormat::Png => ImageOutputFormat::Png,
                    _ => ImageOutputFormat::WebP,
                };
                let bytes = encode(&img, output)?;
                if bytes.len() as u64 <= limits.max_output_bytes {
                    return Ok(bytes);
                }
                let width = (img.width() * 3 / 4).max(1);
                let height = (img.height() * 3 / 4).max(1);
                img = img.resize(width, height, FilterType::Lanczos3);
            }
            Err("re-encoded image does not fit under the size bound".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ScrubLimits {
        ScrubLimits::default()
    }

    /// Tiny valid JPEG with a forged EXIF APP1 segment spliced in after SOI.
    fn jpeg_with_exif() -> Vec<u8> {
        let img = DynamicImage::new_rgb8(64, 48);
        let mut bytes = encode(&img, ImageOutputFormat::Jpeg(90)).unwrap();

        let payload: &[u8] = b"Exif\0\0II*\0CANON EOS GPS 48.8566N 2.3522E";
        let length = (payload.len() + 2) as u16;
        let mut segment = vec![0xFF, 0xE1];
        segment.extend_from_slice(&length.to_be_bytes());
        segment.extend_from_slice(payload);

        // SOI marker is the first two bytes; APP1 goes right behind it.
        bytes.splice(2..2, segment);
        bytes
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[tokio::test]
    async fn non_image_passes_through_bit_identical() {
        let file = CandidateFile::new("notes.pdf", "application/pdf", b"%PDF-1.4 data".to_vec());
        let outcome = scrub_file(&limits(), file.clone()).await;
        assert!(outcome.is_clean());
        assert_eq!(outcome.file.bytes, file.bytes);
        assert_eq!(outcome.file.media_type, "application/pdf");
    }

    #[tokio::test]
    async fn exif_segment_does_not_survive_the_reencode() {
        let original = jpeg_with_exif();
        assert!(contains(&original, b"Exif"));
        assert!(contains(&original, b"CANON"));

        let file = CandidateFile::new("photo.jpg", "image/jpeg", original);
        let outcome = scrub_file(&limits(), file).await;

        assert!(outcome.is_clean());
        assert!(!contains(&outcome.file.bytes, b"Exif"));
        assert!(!contains(&outcome.file.bytes, b"CANON"));
        assert_eq!(outcome.file.media_type, "image/jpeg");
        assert_eq!(outcome.file.name, "photo.jpg");
    }

    #[tokio::test]
    async fn oversized_dimensions_are_bounded() {
        let img = DynamicImage::new_rgb8(600, 20);
        let bytes = encode(&img, ImageOutputFormat::Png).unwrap();
        let file = CandidateFile::new("wide.png", "image/png", bytes);

        let tight = ScrubLimits {
            max_edge: 256,
            ..ScrubLimits::default()
        };
        let outcome = scrub_file(&tight, file).await;
        assert!(outcome.is_clean());

        let scrubbed = image::load_from_memory(&outcome.file.bytes).unwrap();
        assert!(scrubbed.width().max(scrubbed.height()) <= 256);
    }

    #[tokio::test]
    async fn undecodable_image_falls_back_with_a_warning() {
        let file = CandidateFile::new("broken.jpg", "image/jpeg", b"not an image".to_vec());
        let outcome = scrub_file(&limits(), file.clone()).await;

        assert_eq!(outcome.file.bytes, file.bytes);
        match outcome.warning {
            Some(ScrubWarning::ReencodeFailed { ref name, .. }) => assert_eq!(name, "broken.jpg"),
            None => panic!("expected a fallback warning"),
        }
    }

    #[tokio::test]
    async fn scrub_all_returns_one_outcome_per_file_in_order() {
        let files = vec![
            CandidateFile::new("a.pdf", "application/pdf", b"doc".to_vec()),
            CandidateFile::new("b.jpg", "image/jpeg", b"junk".to_vec()),
        ];
        let outcomes = scrub_all(&limits(), files).await;
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].file.name, "a.pdf");
        assert!(outcomes[0].is_clean());
        assert_eq!(outcomes[1].file.name, "b.jpg");
        assert!(!outcomes[1].is_clean());
    }
}
