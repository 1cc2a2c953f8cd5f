use crate::handlers::{
    advances::{
        allocation_preview, apply_advance, create_advance_payment, delete_advance_payment,
        get_advance_payments,
    },
    caretakers::{create_caretaker, delete_caretaker, get_caretaker, get_caretakers, update_caretaker},
    flats::{
        assign_renter, create_flat, delete_flat, get_flat, get_flats, update_flat, vacate_flat,
    },
    health::health_check,
    houses::{create_house, delete_house, get_house, get_houses, update_house},
    payments::{cancel_rent_payment, get_rent_payments, record_payment},
    renters::{create_renter, delete_renter, get_renter, get_renters, update_renter},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Houses
        .route("/api/v1/houses", post(create_house).get(get_houses))
        .route(
            "/api/v1/houses/:house_id",
            get(get_house).put(update_house).delete(delete_house),
        )
        // Caretakers
        .route("/api/v1/caretakers", post(create_caretaker).get(get_caretakers))
        .route(
            "/api/v1/caretakers/:caretaker_id",
            get(get_caretaker).put(update_caretaker).delete(delete_caretaker),
        )
        // Renters
        .route("/api/v1/renters", post(create_renter).get(get_renters))
        .route(
            "/api/v1/renters/:renter_id",
            get(get_renter).put(update_renter).delete(delete_renter),
        )
        // Flats and occupancy
        .route("/api/v1/flats", post(create_flat).get(get_flats))
        .route(
            "/api/v1/flats/:flat_id",
            get(get_flat).put(update_flat).delete(delete_flat),
        )
        .route(
            "/api/v1/flats/:flat_id/renter",
            post(assign_renter).delete(vacate_flat),
        )
        // Rent ledger
        .route(
            "/api/v1/flats/:flat_id/payments",
            get(get_rent_payments).post(record_payment),
        )
        .route(
            "/api/v1/flats/:flat_id/payments/:rent_payment_id/cancel",
            post(cancel_rent_payment),
        )
        // Advance ledger
        .route(
            "/api/v1/flats/:flat_id/advance-payments",
            get(get_advance_payments).post(create_advance_payment),
        )
        .route(
            "/api/v1/flats/:flat_id/advance-payments/:advance_payment_id",
            delete(delete_advance_payment),
        )
        .route("/api/v1/flats/:flat_id/apply-advance", post(apply_advance))
        .route(
            "/api/v1/flats/:flat_id/allocation-preview",
            post(allocation_preview),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
