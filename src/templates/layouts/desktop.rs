use crate::auth::policy::{permits, Action, View};
use crate::auth::Session;
use crate::prefs::Theme;
use maud::{html, Markup, PreEscaped, DOCTYPE};

/// Header state shared by every full page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub session: Option<Session>,
    pub unread: usize,
    pub theme: Theme,
}

impl Nav {
    fn can(&self, view: View, action: Action) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| permits(s.role, view, action))
    }
}

pub fn desktop_layout(title: &str, nav: &Nav, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html data-theme=(nav.theme.as_str()) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " · Swan Loans" }
                script src="https://unpkg.com/htmx.org@1.9.12" defer {}
                style { (PreEscaped(BASE_CSS)) }
            }
            body {
                header class="topbar" {
                    a href="/" class="brand" { "FinTrust / Swan" }
                    nav {
                        ul {
                            li { a href="/" { "Home" } }
                            @if nav.session.is_some() {
                                li { a href="/dashboard" { "Dashboard" } }
                            }
                            @if nav.can(View::ApplicationForm, Action::View) {
                                li { a href="/applications/new" { "Apply" } }
                            }
                            @if nav.can(View::OfficerQueue, Action::View) {
                                li { a href="/queue" { "Review queue" } }
                            }
                            @if nav.can(View::Reports, Action::Export) {
                                li { a href="/reports/applications.xlsx" { "Export" } }
                            }
                            @if nav.session.is_some() {
                                li {
                                    a href="/notifications" {
                                        "Notifications"
                                        @if nav.unread > 0 {
                                            " " span class="badge" { (nav.unread) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    @match &nav.session {
                        Some(s) => div class="who" {
                            span { (s.display_name) " (" (s.role.label()) ")" }
                            form method="post" action="/settings/theme" class="inline" {
                                button type="submit" class="link" { "Theme: " (nav.theme.as_str()) }
                            }
                            form method="post" action="/logout" class="inline" {
                                button type="submit" class="link" { "Sign out" }
                            }
                        },
                        None => a href="/login" { "Sign in" },
                    }
                }
                (content)
            }
        }
    }
}

const BASE_CSS: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; background: #f9fafb; }
html[data-theme="dark"] body { color: #e5e7eb; background: #111827; }
.topbar { display: flex; gap: 1.5rem; align-items: center; justify-content: space-between; padding: .75rem 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,.15); }
.topbar ul { display: flex; gap: 1rem; list-style: none; margin: 0; padding: 0; }
.brand { font-weight: 700; color: #524ed2; text-decoration: none; }
.container { max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
.card { border: 1px solid #e5e7eb; border-radius: 8px; padding: 1rem 1.25rem; margin-bottom: 1.5rem; }
.badge { background: #dc2626; color: white; border-radius: 999px; padding: 0 .45rem; font-size: .8em; }
.status { padding: 2px 8px; border-radius: 999px; font-size: .85em; background: #e5e7eb; }
.status-approved, .status-funded, .doc-verified { background: #d1fae5; color: #065f46; }
.status-rejected, .doc-rejected { background: #fee2e2; color: #991b1b; }
.errors { color: #b91c1c; }
.denied { border-color: #fca5a5; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: 6px 8px; border-bottom: 1px solid #e5e7eb; text-align: left; }
form.inline { display: inline; }
button.link { background: none; border: none; color: inherit; cursor: pointer; text-decoration: underline; }
"#;
