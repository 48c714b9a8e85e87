use crate::auth::Role;
use crate::templates::desktop_layout;
use crate::templates::layouts::desktop::Nav;
use maud::{html, Markup};

pub fn login_page(nav: &Nav, error: Option<&str>) -> Markup {
    desktop_layout(
        "Sign in",
        nav,
        html! {
            main class="container narrow" {
                h1 { "Sign in" }
                p class="lead" {
                    "Demo portal: pick a role to explore. No password is needed."
                }

                @if let Some(e) = error {
                    p class="errors" { (e) }
                }

                form method="post" action="/login" class="card" {
                    p {
                        label for="display_name" { "Name" } br;
                        input type="text" id="display_name" name="display_name" autocomplete="name";
                    }
                    p {
                        label for="email" { "Email" } br;
                        input type="email" id="email" name="email" placeholder="you@domain.com" autocomplete="email" required;
                    }
                    p {
                        label for="role" { "Role" } br;
                        select id="role" name="role" {
                            @for role in Role::ALL {
                                option value=(role.as_str()) { (role.label()) }
                            }
                        }
                    }
                    button type="submit" class="primary" { "Sign in" }
                }
            }
        },
    )
}
