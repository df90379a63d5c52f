//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    AppState, Error, attach_internal_error_details,
    auth::{auth_guard, post_log_in, post_log_out, register_user},
    category::get_categories,
    dashboard::get_dashboard_stats,
    endpoints,
    profile::{complete_onboarding_endpoint, get_profile, update_profile_endpoint},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transactions_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// Routes other than registration, log-in, log-out and the category catalog
/// require a session and respond with 401 without one.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::CATEGORIES, get(get_categories));

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint)
                .post(create_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(endpoints::DASHBOARD_STATS, get(get_dashboard_stats))
        .route(
            endpoints::PROFILE,
            get(get_profile).put(update_profile_endpoint),
        )
        .route(endpoints::ONBOARDING, post(complete_onboarding_endpoint))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let router = protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state.clone());

    if state.dev_mode {
        router.layer(middleware::map_response(attach_internal_error_details))
    } else {
        router
    }
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, "I'm a teapot").into_response()
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
