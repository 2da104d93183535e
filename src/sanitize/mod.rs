//! Attachment sanitization: admission filtering and metadata scrubbing.
//!
//! Nothing leaves the device before passing through here. The admission
//! filter bounds count and size; the scrubber re-encodes images so that no
//! embedded capture metadata (EXIF, XMP, ICC, thumbnails, timestamps)
//! survives into the transmitted bytes.

pub mod admission;
pub mod scrubber;

pub use admission::{admit_files, Admission, RejectedFile};
pub use scrubber::{scrub_all, scrub_file, ScrubOutcome, ScrubWarning};

use chrono::{DateTime, Utc};

/// A file as selected by the submitter, before any processing. Transient:
/// either rejected or promoted to a [`SanitizedFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// A file cleared for transmission. For images the bytes are a fresh
/// re-encode carrying no embedded metadata; the modification timestamp is
/// newly minted because the original one is part of what must not survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub modified: DateTime<Utc>,
}

impl SanitizedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
