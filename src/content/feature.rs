// src/content/feature.rs
use crate::auth::{Action, View};
use crate::content::Task;

/// Portal feature a task renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    ApplicationForm,
    DocumentUpload,
    CreditCheck,
    OcrProcessing,
    ComplianceCheck,
    CoreSubmission,
    Notifications,
    OfficerQueue,
    Reports,
    Generic,
}

// Checked in order; the first keyword hit wins.
const KEYWORDS: &[(&str, Feature)] = &[
    ("credit", Feature::CreditCheck),
    ("ocr", Feature::OcrProcessing),
    ("optical", Feature::OcrProcessing),
    ("compliance", Feature::ComplianceCheck),
    ("kyc", Feature::ComplianceCheck),
    ("aml", Feature::ComplianceCheck),
    ("core bank", Feature::CoreSubmission),
    ("core_bank", Feature::CoreSubmission),
    ("disburse", Feature::CoreSubmission),
    ("document", Feature::DocumentUpload),
    ("upload", Feature::DocumentUpload),
    ("notification", Feature::Notifications),
    ("reminder", Feature::Notifications),
    ("alert", Feature::Notifications),
    ("queue", Feature::OfficerQueue),
    ("review", Feature::OfficerQueue),
    ("dashboard", Feature::OfficerQueue),
    ("report", Feature::Reports),
    ("export", Feature::Reports),
    ("application", Feature::ApplicationForm),
    ("form", Feature::ApplicationForm),
];

impl Feature {
    /// Explicit `type` first, then keywords in the title, then the description.
    pub fn for_task(task: &Task) -> Feature {
        let candidates = [
            task.kind.as_deref().unwrap_or(""),
            task.title.as_str(),
            task.description.as_str(),
        ];
        candidates
            .iter()
            .map(|text| text.to_lowercase())
            .find_map(|text| {
                KEYWORDS
                    .iter()
                    .find(|(kw, _)| text.contains(kw))
                    .map(|(_, f)| *f)
            })
            .unwrap_or(Feature::Generic)
    }

    pub fn label(self) -> &'static str {
        match self {
            Feature::ApplicationForm => "Loan application form",
            Feature::DocumentUpload => "Document upload",
            Feature::CreditCheck => "Credit check",
            Feature::OcrProcessing => "OCR processing",
            Feature::ComplianceCheck => "Compliance check",
            Feature::CoreSubmission => "Core banking submission",
            Feature::Notifications => "Notifications",
            Feature::OfficerQueue => "Officer review queue",
            Feature::Reports => "Reports",
            Feature::Generic => "Task details",
        }
    }

    /// Gate for the live panel shown with this task.
    pub fn gate(self) -> (View, Action) {
        match self {
            Feature::ApplicationForm => (View::ApplicationForm, Action::View),
            Feature::DocumentUpload => (View::ApplicationDetail, Action::UploadDocument),
            Feature::CreditCheck => (View::ApplicationDetail, Action::RunCreditCheck),
            Feature::OcrProcessing => (View::ApplicationDetail, Action::RunOcr),
            Feature::ComplianceCheck => (View::ApplicationDetail, Action::RunCompliance),
            Feature::CoreSubmission => (View::ApplicationDetail, Action::SubmitToCore),
            Feature::Notifications => (View::Notifications, Action::View),
            Feature::OfficerQueue => (View::OfficerQueue, Action::View),
            Feature::Reports => (View::Reports, Action::Export),
            Feature::Generic => (View::TaskBoard, Action::View),
        }
    }

    /// Where the feature lives in the portal.
    pub fn href(self) -> Option<&'static str> {
        match self {
            Feature::ApplicationForm => Some("/applications/new"),
            Feature::DocumentUpload => Some("/dashboard"),
            Feature::CreditCheck
            | Feature::OcrProcessing
            | Feature::ComplianceCheck
            | Feature::CoreSubmission
            | Feature::OfficerQueue => Some("/queue"),
            Feature::Notifications => Some("/notifications"),
            Feature::Reports => Some("/reports/applications.xlsx"),
            Feature::Generic => None,
        }
    }
}
