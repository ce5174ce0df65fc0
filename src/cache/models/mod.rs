// On-device data models
pub mod session;
pub mod user;

pub use session::CachedSession;
pub use user::CachedUser;
