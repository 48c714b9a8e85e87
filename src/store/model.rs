// src/store/model.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::ServerError;

/// Review pipeline position. Older snapshots used title-cased names,
/// which are still accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    #[serde(alias = "Submitted")]
    Submitted,
    #[serde(alias = "Under Review", alias = "under_review")]
    UnderReview,
    #[serde(alias = "Pending Document Review")]
    PendingDocumentReview,
    #[serde(alias = "Credit Check Complete")]
    CreditCheckComplete,
    #[serde(alias = "Compliance Review")]
    ComplianceReview,
    #[serde(alias = "Approved")]
    Approved,
    #[serde(alias = "Rejected")]
    Rejected,
    #[serde(alias = "Funded")]
    Funded,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::PendingDocumentReview,
        ApplicationStatus::CreditCheckComplete,
        ApplicationStatus::ComplianceReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::Funded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under-review",
            ApplicationStatus::PendingDocumentReview => "pending-document-review",
            ApplicationStatus::CreditCheckComplete => "credit-check-complete",
            ApplicationStatus::ComplianceReview => "compliance-review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Funded => "funded",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::PendingDocumentReview => "Pending Document Review",
            ApplicationStatus::CreditCheckComplete => "Credit Check Complete",
            ApplicationStatus::ComplianceReview => "Compliance Review",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Funded => "Funded",
        }
    }

    /// Position in the review pipeline. `Rejected` shares the decision stage
    /// with `Approved`.
    pub fn stage(self) -> u8 {
        match self {
            ApplicationStatus::Submitted => 0,
            ApplicationStatus::UnderReview => 1,
            ApplicationStatus::PendingDocumentReview => 2,
            ApplicationStatus::CreditCheckComplete => 3,
            ApplicationStatus::ComplianceReview => 4,
            ApplicationStatus::Approved | ApplicationStatus::Rejected => 5,
            ApplicationStatus::Funded => 6,
        }
    }

    /// Advisory only: the store accepts any status. Views use this to
    /// decide which moves to offer.
    pub fn is_forward_move(self, to: ApplicationStatus) -> bool {
        match self {
            ApplicationStatus::Rejected | ApplicationStatus::Funded => false,
            ApplicationStatus::Approved => to == ApplicationStatus::Funded,
            _ => to.stage() > self.stage(),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Funded)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ApplicationStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s || st.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ServerError::BadRequest(format!("unknown status '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub name: String,
    pub status: DocumentStatus,
    #[serde(default)]
    pub reason: Option<String>,
    /// Fields pulled out by OCR, once it has run.
    #[serde(default)]
    pub extracted_fields: Option<BTreeMap<String, String>>,
    #[serde(default = "Utc::now")]
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditReport {
    pub bureau: String,
    pub score: u16,
    pub open_accounts: u32,
    pub delinquencies: u32,
    /// Percent.
    pub debt_to_income: u8,
    pub pulled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub passed: bool,
    pub flags: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub action: String,
}

/// Records written by the older client store carry `loanAmount`, no
/// `customerId` and no timestamps; those gaps are filled on hydration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub id: String,
    /// Empty only in legacy records, until `backfill_legacy` runs.
    #[serde(default)]
    pub customer_id: String,
    pub applicant_name: String,
    pub email: String,
    pub loan_type: String,
    #[serde(alias = "loanAmount")]
    pub amount: u64,
    #[serde(default)]
    pub term_months: Option<u32>,
    #[serde(default)]
    pub purpose: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub credit_score: Option<u16>,
    #[serde(default)]
    pub credit_report: Option<CreditReport>,
    #[serde(default)]
    pub compliance: Option<ComplianceResult>,
    #[serde(default)]
    pub core_reference: Option<String>,
    #[serde(default)]
    pub audit_trail: Vec<AuditEntry>,
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl LoanApplication {
    /// Legacy records are owned by the address they were filed under.
    /// Returns whether anything changed.
    pub fn backfill_legacy(&mut self) -> bool {
        if !self.customer_id.is_empty() {
            return false;
        }
        self.customer_id = self.email.trim().to_lowercase();
        true
    }

    pub fn document(&self, doc_id: &str) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.id == doc_id)
    }

    pub fn documents_verified(&self) -> bool {
        !self.documents.is_empty()
            && self
                .documents
                .iter()
                .all(|d| d.status == DocumentStatus::Verified)
    }
}

/// Caller-supplied fields for a new application.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub customer_id: String,
    pub applicant_name: String,
    pub email: String,
    pub loan_type: String,
    pub amount: u64,
    pub term_months: Option<u32>,
    pub purpose: Option<String>,
}

/// Shallow merge: every `Some` field replaces the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationPatch {
    pub status: Option<ApplicationStatus>,
    pub credit_score: Option<u16>,
    pub credit_report: Option<CreditReport>,
    pub compliance: Option<ComplianceResult>,
    pub core_reference: Option<String>,
}

impl ApplicationPatch {
    pub fn status(status: ApplicationStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn apply_to(self, app: &mut LoanApplication) {
        if let Some(status) = self.status {
            app.status = status;
        }
        if let Some(score) = self.credit_score {
            app.credit_score = Some(score);
        }
        if let Some(report) = self.credit_report {
            app.credit_report = Some(report);
        }
        if let Some(compliance) = self.compliance {
            app.compliance = Some(compliance);
        }
        if let Some(reference) = self.core_reference {
            app.core_reference = Some(reference);
        }
    }

    /// Audit text for this patch.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(status) = self.status {
            parts.push(format!("Status changed to {status}"));
        }
        if let Some(score) = self.credit_score {
            parts.push(format!("Credit score set to {score}"));
        }
        if self.credit_report.is_some() {
            parts.push("Credit report attached".to_string());
        }
        if let Some(c) = &self.compliance {
            parts.push(if c.passed {
                "Compliance passed".to_string()
            } else {
                "Compliance flagged".to_string()
            });
        }
        if let Some(r) = &self.core_reference {
            parts.push(format!("Core reference {r}"));
        }
        if parts.is_empty() {
            "Application Updated".to_string()
        } else {
            parts.join("; ")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    StatusUpdate,
    Reminder,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::StatusUpdate => "status_update",
            NotificationKind::Reminder => "reminder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}
