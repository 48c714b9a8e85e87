use crate::store::{ApplicationStatus, DocumentStatus};
use maud::{html, Markup};

pub fn status_badge(status: ApplicationStatus) -> Markup {
    html! {
        span class=(format!("status status-{}", status.as_str())) { (status.label()) }
    }
}

pub fn document_badge(status: DocumentStatus) -> Markup {
    let (class, label) = match status {
        DocumentStatus::Pending => ("status", "Verifying…"),
        DocumentStatus::Verified => ("status doc-verified", "Verified"),
        DocumentStatus::Rejected => ("status doc-rejected", "Rejected"),
    };
    html! {
        span class=(class) { (label) }
    }
}
