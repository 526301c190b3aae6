use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod analytics;
pub mod assets;
pub mod auth;
pub mod candidates;
pub mod documents;
pub mod health;
pub mod notifications;
pub mod offers;
pub mod orientations;
pub mod provisioning;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let candidates_routes = Router::new()
        .route(
            "/",
            get(candidates::list_candidates).post(candidates::create_candidate),
        )
        .route("/me", get(candidates::current_candidate))
        .route("/:id", get(candidates::get_candidate))
        .route("/:id/offer", post(offers::send_offer))
        .route("/:id/offer/accept", post(offers::accept_offer))
        .route("/:id/offer/reject", post(offers::reject_offer))
        .route("/:id/offer/download", get(offers::download_offer))
        .route("/:id/provision", post(provisioning::provision_candidate))
        .route(
            "/:id/documents",
            get(documents::list_candidate_documents).post(documents::upload_document),
        )
        .route("/:id/assets", get(assets::list_candidate_assets))
        .route(
            "/:id/orientations",
            get(orientations::list_candidate_orientations),
        );

    let documents_routes = Router::new()
        .route("/", get(documents::list_all_documents))
        .route("/:id", delete(documents::delete_document))
        .route("/:id/verify", post(documents::verify_document))
        .route("/:id/reject", post(documents::reject_document))
        .route("/:id/download", get(documents::download_document));

    let assets_routes = Router::new()
        .route("/", get(assets::list_assets).post(assets::create_asset))
        .route("/:id/allocate", post(assets::allocate_asset))
        .route("/:id/unallocate", post(assets::unallocate_asset));

    let orientations_routes = Router::new().route(
        "/",
        get(orientations::list_orientations).post(orientations::create_orientation),
    );

    let notifications_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/:id/read", post(notifications::mark_notification_read));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/candidates", candidates_routes)
        .nest("/api/documents", documents_routes)
        .nest("/api/assets", assets_routes)
        .nest("/api/orientations", orientations_routes)
        .nest("/api/notifications", notifications_routes)
        .route("/api/analytics", get(analytics::analytics))
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 64))
}
