pub mod application_form;
pub mod card;
pub mod denial;
pub mod error;
pub mod status;

pub use application_form::application_form;
pub use card::card;
pub use denial::denial_card;
pub use error::html_error_response;
pub use status::{document_badge, status_badge};
