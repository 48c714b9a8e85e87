pub mod application;
pub mod dashboard;
pub mod denied;
pub mod epics;
pub mod home;
pub mod login;
pub mod notifications;
pub mod queue;

pub use application::{application_detail_page, application_form_page, status_panel};
pub use dashboard::{dashboard_page, DashboardVm};
pub use denied::denied_page;
pub use epics::{epic_page, task_page};
pub use home::home_page;
pub use login::login_page;
pub use notifications::notifications_page;
pub use queue::queue_page;
