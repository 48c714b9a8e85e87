use crate::auth::Role;
use crate::router::handle;
use crate::tests::utils::{body_string, get, location, post_form, sign_in, test_portal};

#[test]
fn login_page_loads_successfully() {
    let portal = test_portal();

    let resp = handle(get("/login", None), &portal.app).expect("Failed to handle request");
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("Sign in"));
    assert!(body.contains("Compliance Officer"));
}

#[test]
fn login_sets_session_cookie_and_redirects_to_dashboard() {
    let portal = test_portal();

    let resp = handle(
        post_form(
            "/login",
            None,
            "display_name=Jane&email=Jane%40X.com&role=customer",
        ),
        &portal.app,
    )
    .unwrap();

    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/dashboard");
    let cookie = resp
        .headers()
        .get("Set-Cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("session="));

    let dashboard = handle(get("/dashboard", Some(&cookie)), &portal.app).unwrap();
    assert_eq!(dashboard.status(), 200);
    let body = body_string(dashboard);
    assert!(body.contains("Jane"));
    assert!(body.contains("Your applications"));
}

#[test]
fn login_with_bad_email_rerenders_form() {
    let portal = test_portal();

    let resp = handle(
        post_form("/login", None, "email=not-an-email&role=customer"),
        &portal.app,
    )
    .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(body_string(resp).contains("valid email"));
}

#[test]
fn login_with_unknown_role_is_rejected() {
    let portal = test_portal();

    let resp = handle(
        post_form("/login", None, "email=a%40b.com&role=superuser"),
        &portal.app,
    )
    .unwrap();
    assert_eq!(resp.status(), 400);
}

#[test]
fn logout_revokes_the_session() {
    let portal = test_portal();
    let cookie = sign_in(&portal.app, "jane@x.com", Role::Customer);

    let resp = handle(post_form("/logout", Some(&cookie), ""), &portal.app).unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/");

    let after = handle(get("/dashboard", Some(&cookie)), &portal.app).unwrap();
    assert_eq!(after.status(), 401);
}

#[test]
fn theme_toggle_persists_per_user() {
    let portal = test_portal();
    let cookie = sign_in(&portal.app, "jane@x.com", Role::Customer);

    let before = body_string(handle(get("/dashboard", Some(&cookie)), &portal.app).unwrap());
    assert!(before.contains(r#"data-theme="light""#));

    let resp = handle(post_form("/settings/theme", Some(&cookie), ""), &portal.app).unwrap();
    assert_eq!(resp.status(), 303);

    let after = body_string(handle(get("/dashboard", Some(&cookie)), &portal.app).unwrap());
    assert!(after.contains(r#"data-theme="dark""#));

    let other = sign_in(&portal.app, "sam@x.com", Role::Customer);
    let theirs = body_string(handle(get("/dashboard", Some(&other)), &portal.app).unwrap());
    assert!(theirs.contains(r#"data-theme="light""#));
}
