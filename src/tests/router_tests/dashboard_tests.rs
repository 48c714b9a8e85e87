use crate::auth::Role;
use crate::router::handle;
use crate::store::NewApplication;
use crate::tests::utils::{body_string, get, sign_in, test_portal};

fn submit_for(portal: &crate::tests::utils::TestPortal, customer: &str, name: &str) -> String {
    portal
        .app
        .store
        .add_application(
            NewApplication {
                customer_id: customer.into(),
                applicant_name: name.into(),
                email: customer.into(),
                loan_type: "Auto Loan".into(),
                amount: 12_000,
                term_months: None,
                purpose: None,
            },
            customer,
        )
        .unwrap()
}

#[test]
fn unauthenticated_dashboard_shows_sign_in_card() {
    let portal = test_portal();

    let resp = handle(get("/dashboard", None), &portal.app).unwrap();
    assert_eq!(resp.status(), 401);
    let body = body_string(resp);
    assert!(body.contains("Sign in required"));
    assert!(!body.contains("Your applications"));
}

#[test]
fn customers_only_see_their_own_applications() {
    let portal = test_portal();
    let jane_app = submit_for(&portal, "jane@x.com", "Jane");
    let sam_app = submit_for(&portal, "sam@x.com", "Sam");
    let cookie = sign_in(&portal.app, "jane@x.com", Role::Customer);

    let body = body_string(handle(get("/dashboard", Some(&cookie)), &portal.app).unwrap());
    assert!(body.contains(&jane_app));
    assert!(!body.contains(&sam_app));

    let other = handle(get(&format!("/applications/{sam_app}"), Some(&cookie)), &portal.app);
    assert!(matches!(other, Err(crate::errors::ServerError::NotFound)));
}

#[test]
fn staff_dashboard_lists_every_application() {
    let portal = test_portal();
    let jane_app = submit_for(&portal, "jane@x.com", "Jane");
    let sam_app = submit_for(&portal, "sam@x.com", "Sam");
    let cookie = sign_in(&portal.app, "lee@bank.com", Role::LoanOfficer);

    let body = body_string(handle(get("/dashboard", Some(&cookie)), &portal.app).unwrap());
    assert!(body.contains("Pipeline"));
    assert!(body.contains(&jane_app));
    assert!(body.contains(&sam_app));
}

#[test]
fn queue_is_staff_only() {
    let portal = test_portal();
    submit_for(&portal, "jane@x.com", "Jane");

    let customer = sign_in(&portal.app, "jane@x.com", Role::Customer);
    let resp = handle(get("/queue", Some(&customer)), &portal.app).unwrap();
    assert_eq!(resp.status(), 403);
    assert!(body_string(resp).contains("Access denied"));

    for role in [
        Role::LoanOfficer,
        Role::Underwriter,
        Role::ComplianceOfficer,
        Role::Manager,
        Role::Admin,
    ] {
        let cookie = sign_in(&portal.app, "staff@bank.com", role);
        let resp = handle(get("/queue", Some(&cookie)), &portal.app).unwrap();
        assert_eq!(resp.status(), 200, "{role:?} should see the queue");
        assert!(body_string(resp).contains("Awaiting action (1)"));
    }
}

#[test]
fn unknown_route_is_not_found() {
    let portal = test_portal();
    let resp = handle(get("/nope", None), &portal.app);
    assert!(matches!(resp, Err(crate::errors::ServerError::NotFound)));
}
