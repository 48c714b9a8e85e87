use crate::auth::policy::{permits, Action, View};
use crate::auth::Session;
use crate::store::{ApplicationStatus, LoanApplication};
use crate::templates::components::status_badge;
use crate::templates::layouts::desktop::Nav;
use crate::templates::{card, desktop_layout};
use maud::{html, Markup};

pub struct DashboardVm<'a> {
    pub nav: &'a Nav,
    pub session: &'a Session,
    /// Own applications for customers, every application for staff.
    pub applications: Vec<LoanApplication>,
}

pub fn dashboard_page(vm: &DashboardVm<'_>) -> Markup {
    let role = vm.session.role;

    desktop_layout(
        "Dashboard",
        vm.nav,
        html! {
            main class="container" {
                h1 { "Dashboard" }
                p { "Signed in as " strong { (vm.session.display_name) } " · " (role.label()) }

                @if role.is_staff() {
                    (card("Pipeline", pipeline_summary(&vm.applications)))
                }

                section class="card" {
                    h3 {
                        @if role.is_staff() { "Recent applications" } @else { "Your applications" }
                    }
                    @if vm.applications.is_empty() {
                        p { "No applications yet." }
                    } @else {
                        (applications_table(&vm.applications))
                    }
                    @if permits(role, View::ApplicationForm, Action::View) {
                        p { a href="/applications/new" { "Start a new application" } }
                    }
                }
            }
        },
    )
}

fn pipeline_summary(apps: &[LoanApplication]) -> Markup {
    html! {
        table {
            tbody {
                @for status in ApplicationStatus::ALL {
                    tr {
                        td { (status_badge(status)) }
                        td { (apps.iter().filter(|a| a.status == status).count()) }
                    }
                }
            }
        }
    }
}

pub fn applications_table(apps: &[LoanApplication]) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { "ID" }
                    th { "Applicant" }
                    th { "Type" }
                    th { "Amount" }
                    th { "Status" }
                    th { "Submitted" }
                }
            }
            tbody {
                // Newest first.
                @for app in apps.iter().rev() {
                    tr {
                        td { a href=(format!("/applications/{}", app.id)) { (app.id) } }
                        td { (app.applicant_name) }
                        td { (app.loan_type) }
                        td { "$" (app.amount) }
                        td { (status_badge(app.status)) }
                        td { (app.submitted_at.format("%Y-%m-%d %H:%M").to_string()) }
                    }
                }
            }
        }
    }
}
