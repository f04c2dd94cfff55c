mod category;
mod resource;
mod user;

pub use category::{ResourceCategory, UnknownCategory};
pub use resource::{Resource, ResourceDraft, ResourceFilter};
pub(crate) use resource::matches_search;
pub use user::{Role, Session, User};
