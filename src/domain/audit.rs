//! Admin-attributed notes appended to a reservation's payment trail.
//!
//! The trail is a single newline-joined text field. Every append is a new
//! audit event; identical notes are never merged.

use super::reservation::Checkpoint;
use std::fmt;

/// Actor/action marker written at the start of every note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTag {
    RejectDp,
    RejectPelunasan,
    RejectFull,
    Validated(Checkpoint),
}

impl AuditTag {
    pub fn label(&self) -> &'static str {
        match self {
            AuditTag::RejectDp => "[Admin Reject DP]",
            AuditTag::RejectPelunasan => "[Admin Reject Pelunasan]",
            AuditTag::RejectFull => "[Admin Reject Payment]",
            AuditTag::Validated(Checkpoint::DownPayment) => "[Admin Validate DP]",
            AuditTag::Validated(Checkpoint::Pelunasan) => "[Admin Validate Pelunasan]",
            AuditTag::Validated(Checkpoint::Full) => "[Admin Validate Full payment]",
        }
    }

    /// Message used when the admin did not write one.
    pub fn default_message(&self) -> &'static str {
        match self {
            AuditTag::RejectDp => "DP proof rejected. Please upload it again.",
            AuditTag::RejectPelunasan => "Pelunasan proof rejected. Please upload it again.",
            AuditTag::RejectFull => {
                "Payment proof rejected. Booking cancelled, please make a new reservation."
            }
            AuditTag::Validated(Checkpoint::DownPayment) => "DP payment validated.",
            AuditTag::Validated(Checkpoint::Pelunasan) => "Pelunasan validated.",
            AuditTag::Validated(Checkpoint::Full) => "Full payment validated.",
        }
    }
}

/// A single entry of the trail before it is rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditNote {
    pub tag: AuditTag,
    pub message: Option<String>,
}

impl AuditNote {
    /// Blank or whitespace-only free text counts as no message.
    pub fn new(tag: AuditTag, free_text: Option<&str>) -> Self {
        let message = free_text
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        Self { tag, message }
    }

    /// Returns the trail with this note appended.
    pub fn append_to(&self, existing: &str) -> String {
        let existing = existing.trim();
        let line = self.to_string();
        if existing.is_empty() {
            line
        } else {
            format!("{existing}\n{line}")
        }
    }
}

impl fmt::Display for AuditNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.tag.label(), message),
            None => write!(f, "{} {}", self.tag.label(), self.tag.default_message()),
        }
    }
}

pub fn append(existing: &str, tag: AuditTag, free_text: Option<&str>) -> String {
    AuditNote::new(tag, free_text).append_to(existing)
}
