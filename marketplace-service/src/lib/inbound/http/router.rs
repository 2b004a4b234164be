use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::featured::featured_suppliers;
use super::handlers::forgot_password::forgot_password;
use super::handlers::get_user::get_user;
use super::handlers::health::health;
use super::handlers::list_users::list_users;
use super::handlers::login::login;
use super::handlers::me::me;
use super::handlers::register::register;
use super::handlers::reset_password::reset_password;
use super::handlers::update_profile::update_profile;
use super::handlers::update_status::update_status;
use super::handlers::update_subscription::update_subscription;
use super::middleware::authenticate;
use super::middleware::require_role;
use crate::identity::models::Role;
use crate::identity::ports::AccountPort;
use crate::identity::ports::AuthenticationPort;
use crate::identity::ports::PasswordResetPort;

#[derive(Clone)]
pub struct AppState {
    pub authentication: Arc<dyn AuthenticationPort>,
    pub password_reset: Arc<dyn PasswordResetPort>,
    pub accounts: Arc<dyn AccountPort>,
    /// Token validation for the authorization middleware
    pub authenticator: Arc<Authenticator>,
}

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/users/featured", get(featured_suppliers));

    let authenticated_routes = Router::new()
        .route("/auth/me", get(me))
        .route("/users/:user_id", get(get_user).put(update_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    // route_layer wraps outward: authenticate runs before require_role
    let admin_routes = Router::new()
        .route("/users", get(list_users))
        .route("/users/:user_id/status", put(update_status))
        .route("/users/:user_id/subscription", put(update_subscription))
        .route_layer(middleware::from_fn_with_state(Role::Admin, require_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
