use crate::auth::Role;
use crate::router::handle;
use crate::tests::utils::{body_string, get, sign_in, test_portal};

#[test]
fn home_lists_epics_without_signing_in() {
    let portal = test_portal();

    let resp = handle(get("/", None), &portal.app).unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_string(resp);
    for epic in &portal.app.catalog.epics {
        assert!(body.contains(&format!("/epics/{}", epic.id)));
    }
}

#[test]
fn epic_page_links_its_tasks() {
    let portal = test_portal();

    let body = body_string(handle(get("/epics/EP-01", None), &portal.app).unwrap());
    assert!(body.contains("/tasks/T-1011"));
    assert!(body.contains("Loan application form"));
}

#[test]
fn unknown_epic_and_task_are_not_found() {
    let portal = test_portal();
    assert!(handle(get("/epics/EP-99", None), &portal.app).is_err());
    assert!(handle(get("/tasks/T-0000", None), &portal.app).is_err());
}

#[test]
fn form_task_renders_the_live_form_for_customers() {
    let portal = test_portal();
    let cookie = sign_in(&portal.app, "jane@x.com", Role::Customer);

    let body = body_string(handle(get("/tasks/T-1011", Some(&cookie)), &portal.app).unwrap());
    assert!(body.contains(r#"action="/applications""#));
    assert!(body.contains("jane@x.com"));
}

#[test]
fn gated_task_panel_shows_denial_instead_of_feature() {
    let portal = test_portal();

    // Task pages stay readable; only the feature panel is gated.
    let anonymous = handle(get("/tasks/T-1011", None), &portal.app).unwrap();
    assert_eq!(anonymous.status(), 200);
    let body = body_string(anonymous);
    assert!(body.contains("Sign in required"));
    assert!(!body.contains(r#"action="/applications""#));

    let cookie = sign_in(&portal.app, "jane@x.com", Role::Customer);
    let body = body_string(handle(get("/tasks/T-3013", Some(&cookie)), &portal.app).unwrap());
    assert!(body.contains("Access denied"));
}
