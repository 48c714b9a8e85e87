use crate::auth::Role;
use crate::responses::xlsx::XLSX_CONTENT_TYPE;
use crate::router::handle;
use crate::tests::utils::{get, sign_in, test_portal};

#[test]
fn managers_and_admins_can_export() {
    let portal = test_portal();

    for role in [Role::Manager, Role::Admin] {
        let cookie = sign_in(&portal.app, "boss@bank.com", role);
        let resp = handle(get("/reports/applications.xlsx", Some(&cookie)), &portal.app).unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap().to_str().unwrap(),
            XLSX_CONTENT_TYPE
        );
        assert!(resp
            .headers()
            .get("Content-Disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("applications.xlsx"));
    }
}

#[test]
fn everyone_else_is_denied_the_export() {
    let portal = test_portal();

    let resp = handle(get("/reports/applications.xlsx", None), &portal.app).unwrap();
    assert_eq!(resp.status(), 401);

    for role in [
        Role::Customer,
        Role::LoanOfficer,
        Role::Underwriter,
        Role::ComplianceOfficer,
    ] {
        let cookie = sign_in(&portal.app, "someone@x.com", role);
        let resp = handle(get("/reports/applications.xlsx", Some(&cookie)), &portal.app).unwrap();
        assert_eq!(resp.status(), 403, "{role:?} must not export");
    }
}
