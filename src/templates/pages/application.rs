use crate::auth::policy::{permits, Action, View};
use crate::auth::Session;
use crate::forms::ApplicationForm;
use crate::store::{ApplicationStatus, DocumentStatus, LoanApplication};
use crate::templates::components::{application_form, document_badge, status_badge};
use crate::templates::desktop_layout;
use crate::templates::layouts::desktop::Nav;
use maud::{html, Markup};

pub fn application_form_page(nav: &Nav, values: &ApplicationForm, errors: &[String]) -> Markup {
    desktop_layout(
        "Apply",
        nav,
        html! {
            main class="container narrow" {
                h1 { "Loan application" }
                (application_form(values, errors))
            }
        },
    )
}

pub fn application_detail_page(nav: &Nav, session: &Session, app: &LoanApplication) -> Markup {
    let role = session.role;
    let can = |action| permits(role, View::ApplicationDetail, action);

    desktop_layout(
        &app.id,
        nav,
        html! {
            main class="container" {
                h1 { "Application " (app.id) }
                p {
                    (app.applicant_name) " · " (app.email) " · " (app.loan_type) " · $" (app.amount)
                    @if let Some(term) = app.term_months { " over " (term) " months" }
                }
                @if let Some(purpose) = &app.purpose {
                    p { em { (purpose) } }
                }

                (status_panel(app))

                @if can(Action::UploadDocument) && !app.status.is_terminal() {
                    section class="card" {
                        h3 { "Upload a document" }
                        form method="post" action=(format!("/applications/{}/documents", app.id)) {
                            input type="text" name="file_name" placeholder="payslip-march.pdf" required;
                            " "
                            button type="submit" { "Upload" }
                        }
                    }
                }

                @if role.is_staff() {
                    section class="card" {
                        h3 { "Officer actions" }
                        @if can(Action::RunCreditCheck) {
                            (action_button(&app.id, "credit-check", "Run credit check"))
                        }
                        @if can(Action::RunOcr) && !app.documents.is_empty() {
                            form method="post" action=(format!("/applications/{}/ocr", app.id)) class="inline" {
                                select name="doc_id" {
                                    @for doc in &app.documents {
                                        option value=(doc.id) { (doc.id) " · " (doc.name) }
                                    }
                                }
                                " "
                                button type="submit" { "Run OCR" }
                            }
                        }
                        @if can(Action::RunCompliance) {
                            (action_button(&app.id, "compliance", "Run compliance check"))
                        }
                        @if can(Action::SubmitToCore) && app.core_reference.is_none() {
                            (action_button(&app.id, "submit-core", "Submit to core banking"))
                        }
                        @if can(Action::SendReminder) {
                            (action_button(&app.id, "remind", "Send document reminder"))
                        }
                        @if can(Action::UpdateStatus) {
                            (status_form(app))
                        }
                    }
                }
            }
        },
    )
}

fn action_button(app_id: &str, path: &str, label: &str) -> Markup {
    html! {
        form method="post" action=(format!("/applications/{app_id}/{path}")) class="inline" {
            button type="submit" { (label) }
        }
        " "
    }
}

fn status_form(app: &LoanApplication) -> Markup {
    // Only forward moves are offered; the store itself accepts any status.
    let options: Vec<ApplicationStatus> = ApplicationStatus::ALL
        .into_iter()
        .filter(|s| app.status.is_forward_move(*s))
        .collect();

    html! {
        @if !options.is_empty() {
            form method="post" action=(format!("/applications/{}/status", app.id)) {
                label for="status" { "Move to " }
                select id="status" name="status" {
                    @for s in &options {
                        option value=(s.as_str()) { (s.label()) }
                    }
                }
                " "
                button type="submit" { "Update status" }
            }
        }
    }
}

/// Live part of the detail page; polled until the application settles.
pub fn status_panel(app: &LoanApplication) -> Markup {
    let settling = !app.status.is_terminal()
        || app
            .documents
            .iter()
            .any(|d| d.status == DocumentStatus::Pending);

    html! {
        div id="status-panel"
            hx-get=[settling.then(|| format!("/applications/{}/status", app.id))]
            hx-trigger=[settling.then_some("every 2s")]
            hx-swap=[settling.then_some("outerHTML")]
        {
            section class="card" {
                h3 { "Status" }
                p { (status_badge(app.status)) " · updated " (app.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()) }
                @match (&app.credit_score, &app.credit_report) {
                    (Some(score), Some(report)) => p {
                        "Credit score " strong { (score) } " from " (report.bureau)
                        " · " (report.open_accounts) " open accounts, "
                        (report.delinquencies) " delinquencies, DTI " (report.debt_to_income) "%"
                    },
                    (Some(score), None) => p { "Credit score " strong { (score) } },
                    _ => p { "Credit check not yet completed." },
                }
                @if let Some(c) = &app.compliance {
                    p {
                        @if c.passed { "Compliance passed" } @else { "Compliance flags: " (c.flags.join(", ")) }
                    }
                }
                @if let Some(reference) = &app.core_reference {
                    p { "Core banking reference " code { (reference) } }
                }
            }

            section class="card" {
                h3 { "Documents" }
                @if app.documents.is_empty() {
                    p { "No documents uploaded." }
                } @else {
                    @if app.documents_verified() {
                        p { (document_badge(DocumentStatus::Verified)) " All documents verified" }
                    }
                    table {
                        thead { tr { th { "ID" } th { "Name" } th { "Status" } th { "Notes" } } }
                        tbody {
                            @for doc in &app.documents {
                                tr {
                                    td { (doc.id) }
                                    td { (doc.name) }
                                    td { (document_badge(doc.status)) }
                                    td {
                                        @if let Some(reason) = &doc.reason { (reason) }
                                        @if let Some(fields) = &doc.extracted_fields {
                                            @for (k, v) in fields {
                                                span { (k) "=" (v) " " }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            section class="card" {
                h3 { "Audit trail" }
                table {
                    thead { tr { th { "When" } th { "Who" } th { "Action" } } }
                    tbody {
                        @for entry in &app.audit_trail {
                            tr {
                                td { (entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()) }
                                td { (entry.user) }
                                td { (entry.action) }
                            }
                        }
                    }
                }
            }
        }
    }
}
