//! HTTP route handlers. All JSON in and out.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (verifies DB)
//!
//! # Orders
//! POST /orders                         - Create an order
//! GET  /orders/{user_id}               - Orders for a patient, addresses attached
//! POST /orders/shipping-address        - Create a shipping address
//!
//! # Offerings
//! GET  /offerings                      - Catalog, normalized field names
//! POST /offerings/store-card           - Store a payment card
//! POST /offerings/subscribe            - Charge + invoice a subscription
//! POST /offerings/payment-cards        - List stored cards
//! POST /offerings/package-selections   - List package selections
//!
//! # Clients
//! POST /clients/create                 - Create remote client + local mirror
//! GET  /clients/user-groups            - Patient groupings
//!
//! # Forms
//! POST /forms/answer/upload            - Submit intake answers
//!
//! # Users
//! POST /users/create-entry             - Record a patient metric entry
//! GET  /users/check-eligibility/{id}   - Age + BMI gating
//! POST /users/update/{id}              - Update local row, push remote
//!
//! # Flows
//! POST /flow/complete-questionnaire    - Onboard + submit intake in one call
//! ```
//!
//! Each handler extracts typed parameters (unknown body fields are
//! rejected), invokes exactly one orchestration operation and serializes
//! the result; [`crate::error::AppError`] turns failures into statuses.

pub mod clients;
pub mod flow;
pub mod forms;
pub mod offerings;
pub mod orders;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/{user_id}", get(orders::list_by_patient))
        .route("/shipping-address", post(orders::create_address))
}

/// Create the offerings routes router.
pub fn offering_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(offerings::list))
        .route("/store-card", post(offerings::store_card))
        .route("/subscribe", post(offerings::subscribe))
        .route("/payment-cards", post(offerings::payment_cards))
        .route("/package-selections", post(offerings::package_selections))
}

/// Create the client routes router.
pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(clients::create))
        .route("/user-groups", get(clients::user_groups))
}

/// Create the forms routes router.
pub fn form_routes() -> Router<AppState> {
    Router::new().route("/answer/upload", post(forms::upload_answers))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/create-entry", post(users::create_entry))
        .route("/check-eligibility/{id}", get(users::check_eligibility))
        .route("/update/{id}", post(users::update))
}

/// Create the flow routes router.
pub fn flow_routes() -> Router<AppState> {
    Router::new().route("/complete-questionnaire", post(flow::complete_questionnaire))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", order_routes())
        .nest("/offerings", offering_routes())
        .nest("/clients", client_routes())
        .nest("/forms", form_routes())
        .nest("/users", user_routes())
        .nest("/flow", flow_routes())
}
