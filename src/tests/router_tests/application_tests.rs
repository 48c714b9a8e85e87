use crate::auth::Role;
use crate::effects::{FixedServices, ServiceFailure};
use crate::router::handle;
use crate::store::{ApplicationStatus, DocumentStatus, NotificationKind, SUBMITTED_ACTION};
use crate::tests::utils::{
    body_string, get, location, post_form, sign_in, test_portal, test_portal_with, wait_until,
    TestPortal,
};

const JANE_FORM: &str =
    "applicant_name=Jane&email=jane%40x.com&loan_type=Personal+Loan&amount=5000";

fn jane_submits(portal: &TestPortal) -> (String, String) {
    let cookie = sign_in(&portal.app, "jane@x.com", Role::Customer);
    let resp = handle(post_form("/applications", Some(&cookie), JANE_FORM), &portal.app).unwrap();
    assert_eq!(resp.status(), 303);
    let id = location(&resp)
        .strip_prefix("/applications/")
        .expect("redirect to the new application")
        .to_string();
    (cookie, id)
}

#[test]
fn jane_submission_creates_a_submitted_record() {
    let portal = test_portal();
    let (cookie, id) = jane_submits(&portal);

    let app = portal.app.store.get_application_by_id(&id).unwrap();
    assert_eq!(app.applicant_name, "Jane");
    assert_eq!(app.email, "jane@x.com");
    assert_eq!(app.amount, 5000);
    assert_eq!(app.loan_type, "Personal Loan");
    assert_eq!(app.status, ApplicationStatus::Submitted);
    assert_eq!(app.audit_trail.len(), 1);
    assert_eq!(app.audit_trail[0].action, SUBMITTED_ACTION);

    let page = handle(get(&format!("/applications/{id}"), Some(&cookie)), &portal.app).unwrap();
    assert_eq!(page.status(), 200);
    let body = body_string(page);
    assert!(body.contains("Application Submitted"));
    assert!(body.contains("Upload a document"));
    // Customers get no officer controls.
    assert!(!body.contains("Officer actions"));
}

#[test]
fn invalid_form_rerenders_with_messages_and_creates_nothing() {
    let portal = test_portal();
    let cookie = sign_in(&portal.app, "jane@x.com", Role::Customer);

    let resp = handle(
        post_form(
            "/applications",
            Some(&cookie),
            "applicant_name=&email=jane%40x.com&loan_type=Spaceship&amount=-3",
        ),
        &portal.app,
    )
    .unwrap();

    assert_eq!(resp.status(), 400);
    let body = body_string(resp);
    assert!(body.contains("Applicant name is required"));
    assert!(body.contains("Choose a loan type"));
    assert!(body.contains("Amount must be a positive whole number"));
    assert!(portal.app.store.applications().is_empty());
}

#[test]
fn underwriter_cannot_submit_applications() {
    let portal = test_portal();
    let cookie = sign_in(&portal.app, "uma@bank.com", Role::Underwriter);

    let resp = handle(post_form("/applications", Some(&cookie), JANE_FORM), &portal.app).unwrap();
    assert_eq!(resp.status(), 403);
    assert!(portal.app.store.applications().is_empty());
}

#[test]
fn status_fragment_is_served_without_layout() {
    let portal = test_portal();
    let (cookie, id) = jane_submits(&portal);

    let resp = handle(get(&format!("/applications/{id}/status"), Some(&cookie)), &portal.app)
        .unwrap();
    let body = body_string(resp);
    assert!(body.contains(r#"id="status-panel""#));
    assert!(!body.contains("<html"));
}

#[test]
fn officer_status_change_notifies_the_customer() {
    let portal = test_portal();
    let (jane, id) = jane_submits(&portal);
    let officer = sign_in(&portal.app, "uma@bank.com", Role::Underwriter);

    let resp = handle(
        post_form(
            &format!("/applications/{id}/status"),
            Some(&officer),
            "status=approved",
        ),
        &portal.app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);

    let app = portal.app.store.get_application_by_id(&id).unwrap();
    assert_eq!(app.status, ApplicationStatus::Approved);
    assert_eq!(app.audit_trail.last().unwrap().action, "Status changed to Approved");

    let notes = portal
        .app
        .store
        .notifications_of_type("jane@x.com", NotificationKind::StatusUpdate);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].message.contains("Approved"));

    let page = body_string(handle(get("/notifications", Some(&jane)), &portal.app).unwrap());
    assert!(page.contains("Mark as read"));

    let read = handle(
        post_form(&format!("/notifications/{}/read", notes[0].id), Some(&jane), ""),
        &portal.app,
    )
    .unwrap();
    assert_eq!(read.status(), 303);
    assert_eq!(portal.app.store.unread_count("jane@x.com"), 0);
}

#[test]
fn customers_cannot_change_status() {
    let portal = test_portal();
    let (jane, id) = jane_submits(&portal);

    let resp = handle(
        post_form(&format!("/applications/{id}/status"), Some(&jane), "status=funded"),
        &portal.app,
    )
    .unwrap();
    assert_eq!(resp.status(), 403);
    assert_eq!(
        portal.app.store.get_application_by_id(&id).unwrap().status,
        ApplicationStatus::Submitted
    );
}

#[test]
fn unknown_status_is_a_bad_request() {
    let portal = test_portal();
    let (_, id) = jane_submits(&portal);
    let officer = sign_in(&portal.app, "lee@bank.com", Role::LoanOfficer);

    let resp = handle(
        post_form(&format!("/applications/{id}/status"), Some(&officer), "status=teleported"),
        &portal.app,
    );
    assert!(matches!(resp, Err(crate::errors::ServerError::BadRequest(_))));
}

#[test]
fn corrupted_upload_ends_rejected_with_reason() {
    let portal = test_portal();
    let (jane, id) = jane_submits(&portal);

    let resp = handle(
        post_form(
            &format!("/applications/{id}/documents"),
            Some(&jane),
            "file_name=bank_statement_corrupted.pdf",
        ),
        &portal.app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);

    let store = &portal.app.store;
    wait_until(|| {
        store.get_application_by_id(&id).unwrap().documents[0].status != DocumentStatus::Pending
    });

    let doc = store.get_application_by_id(&id).unwrap().documents[0].clone();
    assert_eq!(doc.status, DocumentStatus::Rejected);
    assert!(doc.reason.is_some());
}

#[test]
fn credit_check_populates_score_and_advances_status() {
    let portal = test_portal();
    let (_, id) = jane_submits(&portal);
    let officer = sign_in(&portal.app, "lee@bank.com", Role::LoanOfficer);

    let resp = handle(
        post_form(&format!("/applications/{id}/credit-check"), Some(&officer), ""),
        &portal.app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);

    let store = &portal.app.store;
    wait_until(|| store.get_application_by_id(&id).unwrap().credit_score.is_some());

    let app = store.get_application_by_id(&id).unwrap();
    assert_eq!(app.credit_score, Some(720));
    assert_eq!(app.status, ApplicationStatus::CreditCheckComplete);
}

#[test]
fn failed_credit_check_only_leaves_an_audit_entry() {
    let portal = test_portal_with(FixedServices::failing(ServiceFailure::Unavailable));
    let (_, id) = jane_submits(&portal);
    let officer = sign_in(&portal.app, "lee@bank.com", Role::LoanOfficer);

    handle(
        post_form(&format!("/applications/{id}/credit-check"), Some(&officer), ""),
        &portal.app,
    )
    .unwrap();

    let store = &portal.app.store;
    wait_until(|| {
        store
            .get_application_by_id(&id)
            .unwrap()
            .audit_trail
            .iter()
            .any(|e| e.action.starts_with("Credit Check Failed"))
    });

    let app = store.get_application_by_id(&id).unwrap();
    assert_eq!(app.credit_score, None);
    assert_eq!(app.status, ApplicationStatus::Submitted);
}

#[test]
fn compliance_officer_cannot_run_credit_checks() {
    let portal = test_portal();
    let (_, id) = jane_submits(&portal);
    let compliance = sign_in(&portal.app, "cora@bank.com", Role::ComplianceOfficer);

    let resp = handle(
        post_form(&format!("/applications/{id}/credit-check"), Some(&compliance), ""),
        &portal.app,
    )
    .unwrap();
    assert_eq!(resp.status(), 403);
    assert_eq!(portal.app.store.get_application_by_id(&id).unwrap().audit_trail.len(), 1);
}

#[test]
fn reminder_reaches_the_customer() {
    let portal = test_portal();
    let (_, id) = jane_submits(&portal);
    let manager = sign_in(&portal.app, "max@bank.com", Role::Manager);

    let resp = handle(
        post_form(&format!("/applications/{id}/remind"), Some(&manager), ""),
        &portal.app,
    )
    .unwrap();
    assert_eq!(resp.status(), 303);

    let reminders = portal
        .app
        .store
        .notifications_of_type("jane@x.com", NotificationKind::Reminder);
    assert_eq!(reminders.len(), 1);
    assert!(reminders[0].message.contains(&id));
}

#[test]
fn core_submission_funds_the_loan() {
    let portal = test_portal();
    let (_, id) = jane_submits(&portal);
    let admin = sign_in(&portal.app, "ada@bank.com", Role::Admin);

    handle(
        post_form(&format!("/applications/{id}/submit-core"), Some(&admin), ""),
        &portal.app,
    )
    .unwrap();

    let store = &portal.app.store;
    wait_until(|| store.get_application_by_id(&id).unwrap().core_reference.is_some());

    let app = store.get_application_by_id(&id).unwrap();
    assert_eq!(app.status, ApplicationStatus::Funded);
    assert_eq!(app.core_reference.as_deref(), Some("CBS-00000001"));
}
