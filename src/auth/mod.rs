pub mod policy;
pub mod roles;
pub mod sessions;
pub mod token;

pub use policy::{authorize, Access, Action, View};
pub use roles::Role;
pub use sessions::Session;
