//! Limits and configuration for the reporting core.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum number of attachments per report.
pub const MAX_ATTACHMENTS: usize = 3;

/// Maximum size of a single attachment, before and after scrubbing.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Longest edge an image may keep after re-encoding.
pub const MAX_IMAGE_EDGE: u32 = 4096;

/// Triage list page size.
pub const PAGE_SIZE: usize = 10;

/// Interval between triage polls.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A report counts as newly created for this long after submission.
pub const RECENT_WINDOW_SECS: i64 = 60;

/// Default backend base URL, overridable per client.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Bounds enforced by the admission filter before any processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionLimits {
    pub max_files: usize,
    pub max_file_bytes: u64,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self {
            max_files: MAX_ATTACHMENTS,
            max_file_bytes: MAX_ATTACHMENT_BYTES,
        }
    }
}

/// Bounds the scrubber holds re-encoded images to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrubLimits {
    pub max_edge: u32,
    pub max_output_bytes: u64,
}

impl Default for ScrubLimits {
    fn default() -> Self {
        Self {
            max_edge: MAX_IMAGE_EDGE,
            max_output_bytes: MAX_ATTACHMENT_BYTES,
        }
    }
}

/// Triage view parameters.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub poll_interval: Duration,
    pub page_size: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            page_size: PAGE_SIZE,
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
