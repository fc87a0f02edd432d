use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationStatus, ApprovalActionView, UserRef};

/// Verbs recorded on the approval history. One entry is written per
/// successful workflow operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    Create,
    Update,
    Submit,
    Approve,
    Return,
    Forward,
    Assign,
    Verify,
    Recommend,
    Decide,
    Gazette,
    Appeal,
    AppealDecide,
}

impl WorkflowAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Submit => "Submit",
            Self::Approve => "Approve",
            Self::Return => "Return",
            Self::Forward => "Forward",
            Self::Assign => "Assign",
            Self::Verify => "Verify",
            Self::Recommend => "Recommend",
            Self::Decide => "Decide",
            Self::Gazette => "Gazette",
            Self::Appeal => "Appeal",
            Self::AppealDecide => "Appeal Decide",
        }
    }
}

/// One immutable row of the approval history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalAction {
    pub action: WorkflowAction,
    pub from_status: Option<ApplicationStatus>,
    pub to_status: ApplicationStatus,
    pub actor: UserRef,
    pub comments: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ApprovalAction {
    pub fn view(&self) -> ApprovalActionView {
        ApprovalActionView {
            action: self.action.label(),
            from_status: self.from_status,
            to_status: self.to_status,
            actor_name: self.actor.name.clone(),
            actor_role: self.actor.role,
            comments: self.comments.clone(),
            recorded_at: self.recorded_at,
        }
    }
}

/// Append-only approval history carried on the aggregate. Entries are never
/// edited or removed once recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    entries: Vec<ApprovalAction>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        action: WorkflowAction,
        from_status: Option<ApplicationStatus>,
        to_status: ApplicationStatus,
        actor: UserRef,
        comments: Option<String>,
    ) {
        self.entries.push(ApprovalAction {
            action,
            from_status,
            to_status,
            actor,
            comments,
            recorded_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[ApprovalAction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
