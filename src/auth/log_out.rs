//! Log-out route handler that invalidates the session cookie.

use axum::Json;
use axum_extra::extract::PrivateCookieJar;
use serde_json::{Value, json};

use crate::auth::invalidate_auth_cookie;

/// Invalidate the session cookie.
///
/// Succeeds whether or not the client had a session.
pub async fn post_log_out(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<Value>) {
    let jar = invalidate_auth_cookie(jar);

    (jar, Json(json!({ "message": "Logged out successfully" })))
}
