use crate::store::LoanApplication;
use crate::templates::desktop_layout;
use crate::templates::layouts::desktop::Nav;
use crate::templates::pages::dashboard::applications_table;
use maud::{html, Markup};

pub fn queue_page(nav: &Nav, awaiting: &[LoanApplication], settled: &[LoanApplication]) -> Markup {
    desktop_layout(
        "Review queue",
        nav,
        html! {
            main class="container" {
                h1 { "Review queue" }

                section class="card" {
                    h3 { "Awaiting action (" (awaiting.len()) ")" }
                    @if awaiting.is_empty() {
                        p { "Nothing waiting." }
                    } @else {
                        (applications_table(awaiting))
                    }
                }

                section class="card" {
                    h3 { "Settled (" (settled.len()) ")" }
                    @if settled.is_empty() {
                        p { "No decided applications yet." }
                    } @else {
                        (applications_table(settled))
                    }
                }
            }
        },
    )
}
