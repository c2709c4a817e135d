//! User-facing notices.
//!
//! Every orchestrator action ends in a [`Notice`]. Conflicts are a result,
//! not a failure: a move or publish that reports conflicts yields a
//! `Warning`, while a failed request yields an `Error`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Structured payload attached to some notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NoticeDetail {
    AutoAssign(AutoAssignSummary),
    Conflicts { count: usize },
}

/// A transient, dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub detail: Option<NoticeDetail>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            detail: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn with_detail(mut self, detail: NoticeDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }

    /// Conflict count carried by the notice, if any.
    pub fn conflict_count(&self) -> Option<usize> {
        match &self.detail {
            Some(NoticeDetail::Conflicts { count }) => Some(*count),
            Some(NoticeDetail::AutoAssign(s)) => Some(s.conflict_count),
            None => None,
        }
    }
}

/// Why a division was left out of a whole-event auto-assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    NoResourceGroups,
    NoEncounters,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoResourceGroups => "no resource groups",
            Self::NoEncounters => "no encounters",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionRef {
    pub division_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDivision {
    pub division: DivisionRef,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDivision {
    pub division: DivisionRef,
    pub message: String,
}

/// Aggregated result of an auto-assign run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoAssignSummary {
    pub assigned_count: usize,
    pub conflict_count: usize,
    pub scheduled: Vec<DivisionRef>,
    pub skipped: Vec<SkippedDivision>,
    pub failed: Vec<FailedDivision>,
}

impl AutoAssignSummary {
    pub fn message(&self) -> String {
        let mut parts = vec![format!(
            "Assigned {} encounters across {} division(s)",
            self.assigned_count,
            self.scheduled.len()
        )];
        if !self.skipped.is_empty() {
            let names: Vec<String> = self
                .skipped
                .iter()
                .map(|s| format!("{} ({})", s.division.name, s.reason.as_str()))
                .collect();
            parts.push(format!("{} skipped: {}", self.skipped.len(), names.join(", ")));
        }
        if !self.failed.is_empty() {
            let names: Vec<&str> = self.failed.iter().map(|f| f.division.name.as_str()).collect();
            parts.push(format!("{} failed: {}", self.failed.len(), names.join(", ")));
        }
        if self.conflict_count > 0 {
            parts.push(format!("{} conflict(s) reported", self.conflict_count));
        }
        parts.join("; ")
    }

    pub fn into_notice(self) -> Notice {
        let level = if !self.failed.is_empty() || self.conflict_count > 0 {
            NoticeLevel::Warning
        } else if self.scheduled.is_empty() {
            NoticeLevel::Info
        } else {
            NoticeLevel::Success
        };
        Notice::new(level, self.message()).with_detail(NoticeDetail::AutoAssign(self))
    }
}
