use super::user::CachedUser;

/// Session fields as persisted on the device
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedSession {
    pub auth_token: Option<String>,
    pub signed_in: bool,
    pub user: Option<CachedUser>,
}
