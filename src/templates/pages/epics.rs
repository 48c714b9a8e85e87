use crate::content::{Epic, Feature, TaskRef};
use crate::templates::desktop_layout;
use crate::templates::layouts::desktop::Nav;
use maud::{html, Markup};

pub fn epic_page(nav: &Nav, epic: &Epic) -> Markup {
    desktop_layout(
        &epic.title,
        nav,
        html! {
            main class="container" {
                p { a href="/" { "← Roadmap" } }
                h1 { (epic.title) }
                p { (epic.description) }

                @for story in &epic.user_stories {
                    section class="card" {
                        h3 { (story.title) }
                        p { (story.description) }
                        @if !story.acceptance_criteria.is_empty() {
                            h4 { "Acceptance criteria" }
                            ul {
                                @for c in &story.acceptance_criteria { li { (c) } }
                            }
                        }
                        @if !story.tasks.is_empty() {
                            h4 { "Tasks" }
                            ul {
                                @for task in &story.tasks {
                                    li {
                                        a href=(format!("/tasks/{}", task.id)) { (task.title) }
                                        " · " (Feature::for_task(task).label())
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

/// `panel` is the live feature view, or a denial card when gated.
pub fn task_page(nav: &Nav, found: TaskRef<'_>, feature: Feature, panel: Markup) -> Markup {
    let task = found.task;
    desktop_layout(
        &task.title,
        nav,
        html! {
            main class="container" {
                p {
                    a href=(format!("/epics/{}", found.epic.id)) { "← " (found.epic.title) }
                    " / " (found.story.title)
                }
                h1 { (task.title) }
                @if !task.description.is_empty() {
                    p { (task.description) }
                }
                @if !task.acceptance_criteria.is_empty() {
                    ul {
                        @for c in &task.acceptance_criteria { li { (c) } }
                    }
                }

                h2 { (feature.label()) }
                (panel)
            }
        },
    )
}
