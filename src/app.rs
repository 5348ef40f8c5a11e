// src/app.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    let intake_routes = Router::new()
        .route("/service-requests"
               ,post(handlers::work_orders::create_service_request)
               .get(handlers::work_orders::list_service_requests)
        )
        .route("/technicians"
               ,post(handlers::work_orders::create_technician)
               .get(handlers::work_orders::list_technicians)
        );

    let work_order_routes = Router::new()
        .route("/"
               ,post(handlers::work_orders::create_work_order)
               .get(handlers::work_orders::list_work_orders)
        )
        .route("/{id}", get(handlers::work_orders::get_work_order))
        .route("/{id}/schedule", put(handlers::work_orders::schedule_work_order))
        .route("/{id}/cancel", post(handlers::work_orders::cancel_work_order))
        .route("/{id}/signatures", get(handlers::work_orders::list_signatures))
        .route("/{id}/signatures/{role}", put(handlers::work_orders::save_signature))
        // Checklist
        .route("/{id}/checklist", get(handlers::checklist::list_results))
        .route("/{id}/checklist/draft"
               ,get(handlers::checklist::load_draft)
               .post(handlers::checklist::save_draft)
        )
        .route("/{id}/checklist/submit", post(handlers::checklist::submit_checklist))
        // Relatório
        .route("/{id}/report", get(handlers::reports::download_report));

    let validation_routes = Router::new()
        .route("/", get(handlers::validations::list_validations))
        .route("/{id}", get(handlers::validations::get_validation))
        .route("/{id}/reviewer", put(handlers::validations::assign_reviewer))
        .route("/{id}/approve", post(handlers::validations::approve_validation))
        .route("/{id}/reject", post(handlers::validations::reject_validation));

    // Tudo abaixo exige o bearer do provedor de identidade
    let protected = Router::new()
        .merge(intake_routes)
        .route("/checklist/catalog", get(handlers::checklist::get_catalog))
        .nest("/work-orders", work_order_routes)
        .nest("/validations", validation_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(handlers::health::health))
        .nest("/api", protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
