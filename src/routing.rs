//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    account::get_account_details_endpoint,
    advisor::chat_endpoint,
    auth::{auth_guard, post_log_in, post_log_out, register_user},
    endpoints,
    expense::{add_expense_endpoint, get_expenses_endpoint, get_insights_endpoint},
    index_page::get_index_page,
    not_found::get_404_not_found,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::CHAT, post(chat_endpoint));

    let protected_routes = Router::new()
        .route(endpoints::ADD_EXPENSE, post(add_expense_endpoint))
        .route(endpoints::GET_EXPENSES, get(get_expenses_endpoint))
        .route(
            endpoints::GET_USER_DETAILS,
            get(get_account_details_endpoint),
        )
        .route(endpoints::GET_INSIGHTS, get(get_insights_endpoint))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}
