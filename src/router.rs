// src/router.rs
use std::collections::HashMap;
use std::io::Read;

use astra::{Body, Request};
use chrono::Utc;
use http::HeaderMap;
use maud::{html, Markup};

use crate::app::App;
use crate::auth::sessions::{create_session, load_session, revoke_session};
use crate::auth::{authorize, Access, Action, Role, Session, View};
use crate::content::Feature;
use crate::errors::ServerError;
use crate::forms::{parse_form, ApplicationForm};
use crate::prefs::{load_theme, save_theme};
use crate::responses::{
    html_response, html_response_with_status, redirect, redirect_with_cookie, xlsx_response,
    ResultResp, SESSION_COOKIE,
};
use crate::spreadsheets::build_applications_workbook;
use crate::store::{ApplicationPatch, ApplicationStatus, LoanApplication, NotificationKind};
use crate::templates::components::{application_form, denial_card};
use crate::templates::pages::{
    application_detail_page, application_form_page, dashboard_page, denied_page, epic_page,
    home_page, login_page, notifications_page, queue_page, status_panel, task_page, DashboardVm,
};
use crate::templates::{card, Nav};

/// Per-request state resolved before routing.
struct Ctx<'a> {
    app: &'a App,
    token: Option<String>,
    session: Option<Session>,
    nav: Nav,
    headers: HeaderMap,
}

impl Ctx<'_> {
    fn authorize(&self, view: View, action: Action) -> Access<'_> {
        authorize(self.session.as_ref(), view, action)
    }

    fn deny(&self, access: &Access<'_>) -> ResultResp {
        let status = match access {
            Access::Unauthenticated => 401,
            _ => 403,
        };
        html_response_with_status(status, denied_page(&self.nav, access))
    }
}

/// Gate a handler body on `(view, action)`; denials short-circuit with a
/// rendered denial page.
macro_rules! require {
    ($ctx:expr, $view:expr, $action:expr) => {
        match $ctx.authorize($view, $action) {
            Access::Granted(session) => session,
            denied => return $ctx.deny(&denied),
        }
    };
}

pub fn handle(req: Request, app: &App) -> ResultResp {
    let (parts, body) = req.into_parts();
    let method = parts.method.as_str();
    let path = parts.uri.path().to_string();

    let token = session_token(&parts.headers);
    let session = match &token {
        Some(t) => app.db.with_conn(|conn| load_session(conn, t, now_unix()))?,
        None => None,
    };
    let nav = build_nav(app, session.as_ref())?;

    tracing::debug!(
        method,
        path = %path,
        user = session.as_ref().map(|s| s.user_id.as_str()).unwrap_or("-"),
        "request"
    );

    let ctx = Ctx {
        app,
        token,
        session,
        nav,
        headers: parts.headers,
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method, segments.as_slice()) {
        ("GET", []) => html_response(home_page(&ctx.nav, &app.catalog)),

        ("GET", ["login"]) => html_response(login_page(&ctx.nav, None)),
        ("POST", ["login"]) => login(&ctx, read_form(body)?),
        ("POST", ["logout"]) => logout(&ctx),

        ("GET", ["dashboard"]) => dashboard(&ctx),

        ("GET", ["applications", "new"]) => new_application(&ctx),
        ("POST", ["applications"]) => submit_application(&ctx, read_form(body)?),
        ("GET", ["applications", id]) => application_detail(&ctx, id),
        ("GET", ["applications", id, "status"]) => application_status(&ctx, id),
        ("POST", ["applications", id, "status"]) => update_status(&ctx, id, read_form(body)?),
        ("POST", ["applications", id, "documents"]) => {
            upload_document(&ctx, id, read_form(body)?)
        }
        ("POST", ["applications", id, "credit-check"]) => credit_check(&ctx, id),
        ("POST", ["applications", id, "ocr"]) => ocr(&ctx, id, read_form(body)?),
        ("POST", ["applications", id, "compliance"]) => compliance(&ctx, id),
        ("POST", ["applications", id, "submit-core"]) => submit_core(&ctx, id),
        ("POST", ["applications", id, "remind"]) => send_reminder(&ctx, id),

        ("GET", ["queue"]) => queue(&ctx),

        ("GET", ["notifications"]) => notifications(&ctx),
        ("POST", ["notifications", id, "read"]) => mark_read(&ctx, id),

        ("GET", ["reports", "applications.xlsx"]) => export_applications(&ctx),

        ("GET", ["epics", id]) => {
            let epic = app.catalog.epic(id).ok_or(ServerError::NotFound)?;
            html_response(epic_page(&ctx.nav, epic))
        }
        ("GET", ["tasks", id]) => task(&ctx, id),

        ("POST", ["settings", "theme"]) => toggle_theme(&ctx),

        _ => Err(ServerError::NotFound),
    }
}

// Sessions

fn login(ctx: &Ctx<'_>, form: HashMap<String, String>) -> ResultResp {
    let field = |k: &str| form.get(k).map(String::as_str).unwrap_or("");

    let role: Role = match field("role").parse() {
        Ok(role) => role,
        Err(_) => {
            return html_response_with_status(
                400,
                login_page(&ctx.nav, Some("Choose a role to continue.")),
            )
        }
    };

    let created = ctx.app.db.with_conn(|conn| {
        create_session(conn, field("email"), field("display_name"), role, now_unix())
    });

    match created {
        Ok((token, session)) => {
            tracing::info!(user = %session.user_id, role = role.as_str(), "signed in");
            redirect_with_cookie("/dashboard", Some(&token))
        }
        Err(ServerError::BadRequest(_)) => html_response_with_status(
            400,
            login_page(&ctx.nav, Some("Enter a valid email address.")),
        ),
        Err(e) => Err(e),
    }
}

fn logout(ctx: &Ctx<'_>) -> ResultResp {
    if let Some(token) = &ctx.token {
        ctx.app
            .db
            .with_conn(|conn| revoke_session(conn, token, now_unix()))?;
    }
    redirect_with_cookie("/", None)
}

fn toggle_theme(ctx: &Ctx<'_>) -> ResultResp {
    let session = require!(ctx, View::Dashboard, Action::View);
    let theme = ctx.nav.theme.toggled();
    save_theme(&ctx.app.db, &session.user_id, theme, now_unix())?;
    redirect(&back_to(&ctx.headers, "/dashboard"))
}

// Pages

fn dashboard(ctx: &Ctx<'_>) -> ResultResp {
    let session = require!(ctx, View::Dashboard, Action::View);
    let applications = visible_applications(ctx.app, session);
    html_response(dashboard_page(&DashboardVm {
        nav: &ctx.nav,
        session,
        applications,
    }))
}

fn new_application(ctx: &Ctx<'_>) -> ResultResp {
    let session = require!(ctx, View::ApplicationForm, Action::View);
    html_response(application_form_page(&ctx.nav, &prefilled_form(session), &[]))
}

fn submit_application(ctx: &Ctx<'_>, form: HashMap<String, String>) -> ResultResp {
    let session = require!(ctx, View::ApplicationForm, Action::Submit);
    let values = ApplicationForm::from_fields(&form);

    match values.validate(&session.user_id) {
        Ok(new_app) => {
            let id = ctx.app.store.add_application(new_app, &session.display_name)?;
            redirect(&format!("/applications/{id}"))
        }
        Err(errors) => {
            tracing::debug!(errors = errors.len(), "application form rejected");
            html_response_with_status(400, application_form_page(&ctx.nav, &values, &errors))
        }
    }
}

fn application_detail(ctx: &Ctx<'_>, id: &str) -> ResultResp {
    let session = require!(ctx, View::ApplicationDetail, Action::View);
    let app = visible_application(ctx.app, session, id)?;
    html_response(application_detail_page(&ctx.nav, session, &app))
}

/// Polled fragment; no layout.
fn application_status(ctx: &Ctx<'_>, id: &str) -> ResultResp {
    let session = require!(ctx, View::ApplicationDetail, Action::View);
    let app = visible_application(ctx.app, session, id)?;
    html_response(status_panel(&app))
}

fn queue(ctx: &Ctx<'_>) -> ResultResp {
    require!(ctx, View::OfficerQueue, Action::View);
    let (settled, awaiting): (Vec<LoanApplication>, Vec<LoanApplication>) = ctx
        .app
        .store
        .applications()
        .into_iter()
        .partition(|a| a.status.is_terminal());
    html_response(queue_page(&ctx.nav, &awaiting, &settled))
}

fn notifications(ctx: &Ctx<'_>) -> ResultResp {
    let session = require!(ctx, View::Notifications, Action::View);
    let list = ctx.app.store.notifications_for(&session.user_id);
    html_response(notifications_page(&ctx.nav, &list))
}

fn mark_read(ctx: &Ctx<'_>, id: &str) -> ResultResp {
    let session = require!(ctx, View::Notifications, Action::View);
    ctx.app.store.mark_notification_read(id, &session.user_id)?;
    redirect("/notifications")
}

fn export_applications(ctx: &Ctx<'_>) -> ResultResp {
    let session = require!(ctx, View::Reports, Action::Export);
    let apps = ctx.app.store.applications();
    let buffer = build_applications_workbook(&apps)?;
    tracing::info!(user = %session.user_id, rows = apps.len(), "applications exported");
    xlsx_response(buffer, "applications.xlsx")
}

fn task(ctx: &Ctx<'_>, id: &str) -> ResultResp {
    let found = ctx.app.catalog.task(id).ok_or(ServerError::NotFound)?;
    let feature = Feature::for_task(found.task);
    let (view, action) = feature.gate();

    let panel = match ctx.authorize(view, action) {
        Access::Granted(session) => feature_panel(feature, session),
        denied => denial_card(&denied),
    };
    html_response(task_page(&ctx.nav, found, feature, panel))
}

fn feature_panel(feature: Feature, session: &Session) -> Markup {
    match feature {
        Feature::ApplicationForm => application_form(&prefilled_form(session), &[]),
        _ => card(
            feature.label(),
            html! {
                @match feature.href() {
                    Some(href) => p { a href=(href) { "Open " (feature.label().to_lowercase()) } },
                    None => p { "This task has no interactive view." },
                }
            },
        ),
    }
}

// Application actions

fn update_status(ctx: &Ctx<'_>, id: &str, form: HashMap<String, String>) -> ResultResp {
    let session = require!(ctx, View::ApplicationDetail, Action::UpdateStatus);
    let status: ApplicationStatus = form
        .get("status")
        .ok_or_else(|| ServerError::BadRequest("status is required".into()))?
        .parse()?;

    let app = ctx.app.store.update_application(
        id,
        ApplicationPatch::status(status),
        &session.display_name,
    )?;
    ctx.app.store.add_notification(
        &app.customer_id,
        NotificationKind::StatusUpdate,
        format!("Application {id} is now {}.", status.label()),
    )?;
    redirect(&format!("/applications/{id}"))
}

fn upload_document(ctx: &Ctx<'_>, id: &str, form: HashMap<String, String>) -> ResultResp {
    let session = require!(ctx, View::ApplicationDetail, Action::UploadDocument);
    visible_application(ctx.app, session, id)?;
    let file_name = form.get("file_name").map(String::as_str).unwrap_or("");

    let (doc, handle) = ctx
        .app
        .effects
        .add_document(id, file_name, &session.display_name)?;
    tracing::info!(application = id, document = %doc.id, "document queued for verification");
    handle.detach();
    redirect(&format!("/applications/{id}"))
}

fn credit_check(ctx: &Ctx<'_>, id: &str) -> ResultResp {
    let session = require!(ctx, View::ApplicationDetail, Action::RunCreditCheck);
    ctx.app
        .effects
        .simulate_credit_check(id, &session.display_name)?
        .detach();
    redirect(&format!("/applications/{id}"))
}

fn ocr(ctx: &Ctx<'_>, id: &str, form: HashMap<String, String>) -> ResultResp {
    let session = require!(ctx, View::ApplicationDetail, Action::RunOcr);
    let doc_id = form
        .get("doc_id")
        .ok_or_else(|| ServerError::BadRequest("doc_id is required".into()))?;
    ctx.app
        .effects
        .simulate_ocr_processing(id, doc_id, &session.display_name)?
        .detach();
    redirect(&format!("/applications/{id}"))
}

fn compliance(ctx: &Ctx<'_>, id: &str) -> ResultResp {
    let session = require!(ctx, View::ApplicationDetail, Action::RunCompliance);
    ctx.app
        .effects
        .run_compliance_check(id, &session.display_name)?
        .detach();
    redirect(&format!("/applications/{id}"))
}

fn submit_core(ctx: &Ctx<'_>, id: &str) -> ResultResp {
    let session = require!(ctx, View::ApplicationDetail, Action::SubmitToCore);
    ctx.app
        .effects
        .submit_to_core_system(id, &session.display_name)?
        .detach();
    redirect(&format!("/applications/{id}"))
}

fn send_reminder(ctx: &Ctx<'_>, id: &str) -> ResultResp {
    let session = require!(ctx, View::ApplicationDetail, Action::SendReminder);
    let app = ctx
        .app
        .store
        .get_application_by_id(id)
        .ok_or(ServerError::NotFound)?;
    ctx.app.store.add_notification(
        &app.customer_id,
        NotificationKind::Reminder,
        format!("Please upload the outstanding documents for application {id}."),
    )?;
    ctx.app
        .store
        .record_audit(id, &session.display_name, "Document Reminder Sent")?;
    redirect(&format!("/applications/{id}"))
}

// Helpers

fn visible_applications(app: &App, session: &Session) -> Vec<LoanApplication> {
    if session.role.is_staff() {
        app.store.applications()
    } else {
        app.store.customer_applications(&session.user_id)
    }
}

/// Customers only ever see their own applications; anything else is a 404.
fn visible_application(
    app: &App,
    session: &Session,
    id: &str,
) -> Result<LoanApplication, ServerError> {
    let found = app
        .store
        .get_application_by_id(id)
        .ok_or(ServerError::NotFound)?;
    if !session.role.is_staff() && found.customer_id != session.user_id {
        return Err(ServerError::NotFound);
    }
    Ok(found)
}

fn prefilled_form(session: &Session) -> ApplicationForm {
    ApplicationForm {
        applicant_name: session.display_name.clone(),
        email: session.user_id.clone(),
        ..ApplicationForm::default()
    }
}

fn build_nav(app: &App, session: Option<&Session>) -> Result<Nav, ServerError> {
    let Some(session) = session else {
        return Ok(Nav::default());
    };
    Ok(Nav {
        unread: app.store.unread_count(&session.user_id),
        theme: load_theme(&app.db, &session.user_id)?,
        session: Some(session.clone()),
    })
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Same-site path from the Referer, or `fallback`.
fn back_to(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(http::header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|r| url::Url::parse(r).ok())
        .map(|u| u.path().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

fn read_form(mut body: Body) -> Result<HashMap<String, String>, ServerError> {
    let mut raw = String::new();
    body.reader()
        .read_to_string(&mut raw)
        .map_err(|e| ServerError::BadRequest(format!("unreadable request body: {e}")))?;
    Ok(parse_form(&raw))
}

fn now_unix() -> i64 {
    Utc::now().timestamp()
}
