// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::signup,
        handlers::auth::signin,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::me,

        // --- Instances ---
        handlers::tenancy::create_instance,
        handlers::tenancy::list_instances,
        handlers::tenancy::get_instance,
        handlers::tenancy::update_approval_policy,
        handlers::tenancy::set_user_active,

        // --- Roles ---
        handlers::rbac::create_role,
        handlers::rbac::list_roles,
        handlers::rbac::get_role,
        handlers::rbac::update_role_approval,

        // --- People ---
        handlers::people::create_person,
        handlers::people::list_people,
        handlers::people::assign_role,

        // --- Work orders ---
        handlers::work_orders::create_work_order,
        handlers::work_orders::list_work_orders,
        handlers::work_orders::get_work_order,
        handlers::work_orders::update_status,

        // --- Approvals ---
        handlers::work_orders::submit_work_order,
        handlers::work_orders::list_approvers,
        handlers::work_orders::approve_work_order,
        handlers::work_orders::reject_work_order,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::TokenPayload,
            models::auth::SignupPayload,
            models::auth::SigninPayload,
            models::auth::RefreshPayload,
            models::auth::LogoutPayload,
            models::auth::SetUserActivePayload,
            models::auth::AuthResponse,
            models::auth::TokenPair,

            // --- Instances ---
            models::tenancy::ApprovalPolicy,
            models::tenancy::Instance,
            models::tenancy::CreateInstancePayload,
            models::tenancy::UpdateApprovalPolicyPayload,

            // --- Roles ---
            models::rbac::Permission,
            models::rbac::Role,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRoleApprovalPayload,

            // --- People ---
            models::people::Person,
            models::people::CreatePersonPayload,
            models::people::AssignRolePayload,

            // --- Work orders ---
            models::work_orders::WorkOrderStatus,
            models::work_orders::ApprovalStatus,
            models::work_orders::WorkOrder,
            models::work_orders::CreateWorkOrderPayload,
            models::work_orders::UpdateWorkOrderStatusPayload,
            models::work_orders::SubmitWorkOrderPayload,
            models::work_orders::ApproveWorkOrderPayload,
            models::work_orders::RejectWorkOrderPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Cadastro, login e tokens"),
        (name = "Instances", description = "Instâncias (tenants) e seus usuários"),
        (name = "Roles", description = "Cargos e cadeias de aprovação"),
        (name = "People", description = "Pessoas que executam o trabalho"),
        (name = "Work Orders", description = "Ordens de serviço"),
        (name = "Approvals", description = "Envio, aprovação e rejeição de trabalho")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_with_bearer_security() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/auth/signin"));
        assert!(doc
            .paths
            .paths
            .contains_key("/api/instances/{tenant_id}/work-orders/{work_order_id}/approve"));

        let schemes = doc.components.expect("components").security_schemes;
        assert!(schemes.contains_key("api_jwt"));
    }

    #[test]
    fn nested_routes_document_both_path_params() {
        let doc = ApiDoc::openapi();
        let item = &doc.paths.paths["/api/instances/{tenant_id}/work-orders/{work_order_id}/approve"];
        let params = item
            .post
            .as_ref()
            .and_then(|op| op.parameters.as_ref())
            .expect("parâmetros da rota");

        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"tenant_id"));
        assert!(names.contains(&"work_order_id"));
        assert!(!names.iter().any(|n| n.starts_with('_')));
    }
}
