//! Candidate file admission: count and size bounds, applied before any
//! other processing and before any network traffic.

use tracing::warn;

use crate::config::AdmissionLimits;
use crate::error::AdmissionError;

use super::CandidateFile;

/// Outcome of filtering one candidate list. Rejections are reported, never
/// silently dropped.
#[derive(Debug, Default)]
pub struct Admission {
    pub accepted: Vec<CandidateFile>,
    pub rejected: Vec<RejectedFile>,
}

impl Admission {
    pub fn all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// A candidate that did not make it, with the reason it was turned away.
#[derive(Debug)]
pub struct RejectedFile {
    pub file: CandidateFile,
    pub reason: AdmissionError,
}

/// Filters candidates against the limits. Input order is preserved in
/// `accepted`; an oversize file is rejected without consuming one of the
/// count slots. Pure: no side effects beyond the returned report.
pub fn admit_files(limits: &AdmissionLimits, candidates: Vec<CandidateFile>) -> Admission {
    let mut admission = Admission::default();
    for file in candidates {
        if file.size() > limits.max_file_bytes {
            warn!(name = %file.name, size = file.size(), "attachment rejected: oversize");
            admission.rejected.push(RejectedFile {
                reason: AdmissionError::Oversize {
                    name: file.name.clone(),
                    size: file.size(),
                    limit: limits.max_file_bytes,
                },
                file,
            });
            continue;
        }
        if admission.accepted.len() >= limits.max_files {
            warn!(name = %file.name, "attachment rejected: limit reached");
            admission.rejected.push(RejectedFile {
                reason: AdmissionError::LimitExceeded {
                    name: file.name.clone(),
                    limit: limits.max_files,
                },
                file,
            });
            continue;
        }
        admission.accepted.push(file);
    }
    admission
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, size: usize) -> CandidateFile {
        CandidateFile::new(name, "image/jpeg", vec![0u8; size])
    }

    fn limits() -> AdmissionLimits {
        AdmissionLimits {
            max_files: 3,
            max_file_bytes: 1024,
        }
    }

    #[test]
    fn accepts_at_most_the_file_limit_in_order() {
        let candidates = (0..5).map(|i| candidate(&format!("f{i}"), 10)).collect();
        let admission = admit_files(&limits(), candidates);
        let names: Vec<_> = admission.accepted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["f0", "f1", "f2"]);
        assert_eq!(admission.rejected.len(), 2);
        assert!(admission
            .rejected
            .iter()
            .all(|r| matches!(r.reason, AdmissionError::LimitExceeded { .. })));
    }

    #[test]
    fn oversize_files_are_rejected_with_a_reason() {
        let admission = admit_files(&limits(), vec![candidate("big", 2048)]);
        assert!(admission.accepted.is_empty());
        assert!(matches!(
            admission.rejected[0].reason,
            AdmissionError::Oversize { size: 2048, .. }
        ));
    }

    #[test]
    fn oversize_files_do_not_consume_a_slot() {
        let candidates = vec![
            candidate("big", 2048),
            candidate("a", 10),
            candidate("b", 10),
            candidate("c", 10),
        ];
        let admission = admit_files(&limits(), candidates);
        let names: Vec<_> = admission.accepted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn exact_limit_size_is_admitted() {
        let admission = admit_files(&limits(), vec![candidate("edge", 1024)]);
        assert_eq!(admission.accepted.len(), 1);
        assert!(admission.all_accepted());
    }
}
