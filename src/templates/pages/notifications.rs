use crate::store::Notification;
use crate::templates::desktop_layout;
use crate::templates::layouts::desktop::Nav;
use maud::{html, Markup};

pub fn notifications_page(nav: &Nav, notifications: &[Notification]) -> Markup {
    desktop_layout(
        "Notifications",
        nav,
        html! {
            main class="container" {
                h1 { "Notifications" }
                @if notifications.is_empty() {
                    p { "You have no notifications." }
                }
                @for n in notifications.iter().rev() {
                    section class="card" {
                        p {
                            span class="status" { (n.kind.as_str()) }
                            " " (n.timestamp.format("%Y-%m-%d %H:%M").to_string())
                        }
                        p {
                            @if n.read { (n.message) } @else { strong { (n.message) } }
                        }
                        @if !n.read {
                            form method="post" action=(format!("/notifications/{}/read", n.id)) class="inline" {
                                button type="submit" class="link" { "Mark as read" }
                            }
                        }
                    }
                }
            }
        },
    )
}
