use crate::auth::Access;
use maud::{html, Markup};

/// Rendered in place of a view the visitor may not see.
pub fn denial_card(access: &Access<'_>) -> Markup {
    html! {
        section class="card denied" {
            @match access {
                Access::Unauthenticated => {
                    h3 { "Sign in required" }
                    p { "You need to sign in to view this page." }
                    a href="/login" { "Sign in" }
                }
                Access::Forbidden(role) => {
                    h3 { "Access denied" }
                    p { "Your role (" (role.label()) ") does not have access to this page." }
                    a href="/dashboard" { "Back to dashboard" }
                }
                Access::Granted(_) => {}
            }
        }
    }
}
