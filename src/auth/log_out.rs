//! Log-out handler that invalidates the auth cookie.

use axum::{Json, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;

use super::invalidate_auth_cookie;

/// Invalidate the auth cookie.
///
/// Logging out without a session is not an error, the cookie is cleared either way.
pub async fn post_log_out(jar: PrivateCookieJar) -> impl IntoResponse {
    let jar = invalidate_auth_cookie(jar);

    (jar, Json(json!({ "message": "logged out" })))
}
