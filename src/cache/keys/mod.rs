// Key-value and settings keys of the on-device store
// Session fields (`kv` table)
pub const SESSION_KEY: &str = "session";
pub const USER_INFO_KEY: &str = "userInfo";
pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const BIOMETRIC_ENABLED_KEY: &str = "biometricEnabled";

// Schedule bookkeeping (`settings` table)
pub const LAST_SYNC_KEY: &str = "lastSync";
pub const TODAY_KEY: &str = "today";

/// Every key cleared on sign-out
pub const SESSION_KEYS: [&str; 3] = [SESSION_KEY, USER_INFO_KEY, AUTH_TOKEN_KEY];
