pub mod admin;
pub mod auth;
pub mod health;
pub mod history;
pub mod payments;
pub mod rewrite;
pub mod usage;

use axum::Extension;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::JwtSecret;
use crate::state::AppState;
use plagifree_core::traits::*;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(allowed))
}

pub fn build_router<A, H, P>(state: AppState<A, H, P>) -> axum::Router
where
    A: AccountStore + Clone,
    H: HistoryStore + Clone,
    P: PaymentStore + Clone,
{
    let jwt_secret = JwtSecret(state.config.jwt.secret.clone());
    let cors = cors_layer(&state.config.cors_origins);

    axum::Router::new()
        .route("/api", get(health::root))
        .route("/api/", get(health::root))
        .route("/api/health", get(health::health_check))
        // Accounts
        .route("/api/auth/register", post(auth::register::<A, H, P>))
        .route("/api/auth/login", post(auth::login::<A, H, P>))
        .route("/api/auth/me", get(auth::me::<A, H, P>))
        .route("/api/auth/verify-email", post(auth::verify_email::<A, H, P>))
        .route(
            "/api/auth/resend-verification",
            post(auth::resend_verification::<A, H, P>),
        )
        // Rewriting and entitlement
        .route("/api/rewrite", post(rewrite::submit_rewrite::<A, H, P>))
        .route("/api/usage", get(usage::get_usage::<A, H, P>))
        // History
        .route("/api/history", get(history::list_history::<A, H, P>))
        .route("/api/history/{id}", get(history::get_history_item::<A, H, P>))
        .route(
            "/api/history/{id}/export",
            get(history::export_history_item::<A, H, P>),
        )
        // Payments
        .route("/api/payments/packages", get(payments::list_packages::<A, H, P>))
        .route("/api/payments/checkout", post(payments::checkout::<A, H, P>))
        .route(
            "/api/payments/status/{session_id}",
            get(payments::payment_status::<A, H, P>),
        )
        .route("/api/payments/webhook", post(payments::webhook::<A, H, P>))
        // Owner configuration
        .route(
            "/api/admin/payout",
            get(admin::get_owner_payout::<A, H, P>).put(admin::configure_owner_payout::<A, H, P>),
        )
        .layer(Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Request body size limit: 1 MiB.
        .layer(tower_http::limit::RequestBodyLimitLayer::new(1024 * 1024))
        .with_state(state)
}
