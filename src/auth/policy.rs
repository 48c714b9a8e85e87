// src/auth/policy.rs
//! Declarative access table: (view, action) -> roles allowed.
use crate::auth::roles::Role;
use crate::auth::sessions::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    ApplicationForm,
    ApplicationDetail,
    OfficerQueue,
    Notifications,
    Reports,
    TaskBoard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Submit,
    UploadDocument,
    RunCreditCheck,
    RunOcr,
    RunCompliance,
    SubmitToCore,
    UpdateStatus,
    SendReminder,
    Export,
}

use Role::*;

const EVERYONE: &[Role] = &Role::ALL;
const STAFF: &[Role] = &[LoanOfficer, Underwriter, ComplianceOfficer, Manager, Admin];

pub const POLICY: &[(View, Action, &[Role])] = &[
    (View::Dashboard, Action::View, EVERYONE),
    (View::ApplicationForm, Action::View, &[Customer, LoanOfficer]),
    (View::ApplicationForm, Action::Submit, &[Customer, LoanOfficer]),
    (View::ApplicationDetail, Action::View, EVERYONE),
    (View::ApplicationDetail, Action::UploadDocument, &[Customer, LoanOfficer]),
    (View::ApplicationDetail, Action::RunCreditCheck, &[LoanOfficer, Underwriter, Manager]),
    (View::ApplicationDetail, Action::RunOcr, &[LoanOfficer, Underwriter]),
    (View::ApplicationDetail, Action::RunCompliance, &[ComplianceOfficer, Manager]),
    (View::ApplicationDetail, Action::SubmitToCore, &[Manager, Admin]),
    (View::ApplicationDetail, Action::UpdateStatus, &[LoanOfficer, Underwriter, Manager]),
    (View::ApplicationDetail, Action::SendReminder, &[LoanOfficer, Manager]),
    (View::OfficerQueue, Action::View, STAFF),
    (View::Notifications, Action::View, EVERYONE),
    (View::Reports, Action::Export, &[Manager, Admin]),
    (View::TaskBoard, Action::View, EVERYONE),
];

/// Roles allowed for a (view, action); empty when the pair is not listed.
pub fn allowed_roles(view: View, action: Action) -> &'static [Role] {
    POLICY
        .iter()
        .find(|(v, a, _)| *v == view && *a == action)
        .map(|(_, _, roles)| *roles)
        .unwrap_or(&[])
}

pub fn permits(role: Role, view: View, action: Action) -> bool {
    allowed_roles(view, action).contains(&role)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<'a> {
    Granted(&'a Session),
    Unauthenticated,
    Forbidden(Role),
}

/// The one gate every page and form handler goes through.
pub fn authorize(session: Option<&Session>, view: View, action: Action) -> Access<'_> {
    match session {
        None => Access::Unauthenticated,
        Some(s) if permits(s.role, view, action) => Access::Granted(s),
        Some(s) => Access::Forbidden(s.role),
    }
}
