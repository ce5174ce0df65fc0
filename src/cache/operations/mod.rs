// On-device store operations

pub mod calendar;
pub mod kv;
pub mod session;
pub mod settings;

pub use calendar::CalendarOperations;
pub use kv::KeyValueOperations;
pub use session::SessionCacheOperations;
pub use settings::SettingsOperations;
