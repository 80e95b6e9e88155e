// src/routes.rs

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn router(app_state: AppState) -> Router {
    // Públicas (logout e /me exigem o token no próprio handler)
    let auth_routes = Router::new()
        .route("/signup", post(handlers::auth::signup))
        .route("/signin", post(handlers::auth::signin))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me));

    // Tudo abaixo de /{tenant_id} passa pelo TenantScope de cada handler
    let instance_routes = Router::new()
        .route(
            "/",
            post(handlers::tenancy::create_instance).get(handlers::tenancy::list_instances),
        )
        .route("/{tenant_id}", get(handlers::tenancy::get_instance))
        .route(
            "/{tenant_id}/approval-policy",
            put(handlers::tenancy::update_approval_policy),
        )
        .route(
            "/{tenant_id}/users/{user_id}/active",
            put(handlers::tenancy::set_user_active),
        )
        // Cargos
        .route(
            "/{tenant_id}/roles",
            post(handlers::rbac::create_role).get(handlers::rbac::list_roles),
        )
        .route("/{tenant_id}/roles/{role_id}", get(handlers::rbac::get_role))
        .route(
            "/{tenant_id}/roles/{role_id}/approval",
            put(handlers::rbac::update_role_approval),
        )
        // Pessoas
        .route(
            "/{tenant_id}/people",
            post(handlers::people::create_person).get(handlers::people::list_people),
        )
        .route(
            "/{tenant_id}/people/{person_id}/role",
            put(handlers::people::assign_role),
        )
        // Ordens de serviço
        .route(
            "/{tenant_id}/work-orders",
            post(handlers::work_orders::create_work_order).get(handlers::work_orders::list_work_orders),
        )
        .route(
            "/{tenant_id}/work-orders/{work_order_id}",
            get(handlers::work_orders::get_work_order),
        )
        .route(
            "/{tenant_id}/work-orders/{work_order_id}/status",
            put(handlers::work_orders::update_status),
        )
        // Aprovação
        .route(
            "/{tenant_id}/work-orders/{work_order_id}/submit",
            post(handlers::work_orders::submit_work_order),
        )
        .route(
            "/{tenant_id}/work-orders/{work_order_id}/approvers",
            get(handlers::work_orders::list_approvers),
        )
        .route(
            "/{tenant_id}/work-orders/{work_order_id}/approve",
            post(handlers::work_orders::approve_work_order),
        )
        .route(
            "/{tenant_id}/work-orders/{work_order_id}/reject",
            post(handlers::work_orders::reject_work_order),
        );

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .nest("/auth", auth_routes)
        .nest("/instances", instance_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
