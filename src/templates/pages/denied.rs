use crate::auth::Access;
use crate::templates::components::denial_card;
use crate::templates::layouts::desktop::Nav;
use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn denied_page(nav: &Nav, access: &Access<'_>) -> Markup {
    desktop_layout(
        "Access denied",
        nav,
        html! {
            main class="container" {
                (denial_card(access))
            }
        },
    )
}
