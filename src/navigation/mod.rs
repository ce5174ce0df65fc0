// Routes, session gating and notification deep links

use serde_json::Value;

use crate::cache::CachedSession;
use crate::scan::{ConfirmRoute, Confirmation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    Emarger,
    Camera,
    Confirm(ConfirmRoute),
    Valider(Confirmation),
    Profile,
    QrCode,
    ListEmarger,
    Notifications,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Home => "/",
            Route::Emarger => "/emarger",
            Route::Camera => "/emarger/camera",
            Route::Confirm(_) => "/emarger/confirm-presence",
            Route::Valider(_) => "/emarger/valider",
            Route::Profile => "/profile",
            Route::QrCode => "/qrcode",
            Route::ListEmarger => "/list-emarger",
            Route::Notifications => "/notifications",
        }
    }

    /// Routes reachable from a plain path. Confirm and Valider need parameters.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        Some(match trimmed {
            "" | "/index" => Route::Home,
            "/login" => Route::Login,
            "/emarger" => Route::Emarger,
            "/emarger/camera" => Route::Camera,
            "/profile" => Route::Profile,
            "/qrcode" => Route::QrCode,
            "/list-emarger" => Route::ListEmarger,
            "/notifications" => Route::Notifications,
            _ => return None,
        })
    }

    pub fn is_teacher_only(&self) -> bool {
        matches!(self, Route::QrCode | Route::ListEmarger)
    }
}

/// Where a navigation request actually lands for this session.
pub fn resolve(requested: Route, session: &CachedSession) -> Route {
    let signed_in = session.signed_in && session.auth_token.is_some();
    if !signed_in {
        return Route::Login;
    }
    let is_teacher = session.user.as_ref().is_some_and(|u| u.is_teacher());
    match requested {
        Route::Login => Route::Home,
        route if route.is_teacher_only() && !is_teacher => Route::Home,
        route => route,
    }
}

/// Route named by a notification payload's `url` field, if any.
pub fn from_notification(data: &Value) -> Option<Route> {
    let url = data.get("url")?.as_str()?;
    if url.is_empty() {
        return None;
    }
    let route = Route::from_path(url);
    if route.is_none() {
        tracing::debug!("notification points to unknown route {}", url);
    }
    route
}

/// Stack of visited routes, every push going through the session guard.
#[derive(Debug)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Navigator {
    pub fn new(session: &CachedSession) -> Self {
        Self {
            stack: vec![resolve(Route::Home, session)],
        }
    }

    pub fn current(&self) -> &Route {
        // the stack is never empty
        &self.stack[self.stack.len() - 1]
    }

    pub fn push(&mut self, route: Route, session: &CachedSession) -> &Route {
        let resolved = resolve(route, session);
        tracing::debug!("navigate to {}", resolved.path());
        self.stack.push(resolved);
        self.current()
    }

    /// Swaps the current route, as the scan flow does between its screens.
    pub fn replace(&mut self, route: Route, session: &CachedSession) -> &Route {
        let resolved = resolve(route, session);
        if let Some(top) = self.stack.last_mut() {
            *top = resolved;
        }
        self.current()
    }

    pub fn back(&mut self) -> &Route {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
        self.current()
    }
}
