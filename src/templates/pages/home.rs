use crate::content::Catalog;
use crate::templates::desktop_layout;
use crate::templates::layouts::desktop::Nav;
use maud::{html, Markup};

pub fn home_page(nav: &Nav, catalog: &Catalog) -> Markup {
    desktop_layout(
        "Home",
        nav,
        html! {
            main class="container" {
                h1 { "Swan Loan Portal" }
                p { "Apply for a loan, upload documents and follow every step of the review." }

                @if nav.session.is_none() {
                    p { a href="/login" { "Sign in to get started" } }
                }

                h2 { "Roadmap" }
                @if catalog.epics.is_empty() {
                    p { "No content has been published yet." }
                }
                @for epic in &catalog.epics {
                    section class="card" {
                        h3 { a href=(format!("/epics/{}", epic.id)) { (epic.title) } }
                        p { (epic.description) }
                        p { (epic.user_stories.len()) " user stories" }
                    }
                }
            }
        },
    )
}
