use axum::http::{header, HeaderMap};
use uuid::Uuid;

/// Reads the session id from the `Cookie` headers. A missing cookie or a
/// value that is not a UUID yields `None`.
pub fn session_id(headers: &HeaderMap, cookie_name: &str) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(cookie_name: &str, id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", cookie_name, id)
}

/// Tells the browser to drop the session cookie.
pub fn expired_cookie(cookie_name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", cookie_name)
}
