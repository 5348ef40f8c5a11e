// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Intake ---
        handlers::work_orders::create_service_request,
        handlers::work_orders::list_service_requests,
        handlers::work_orders::create_technician,
        handlers::work_orders::list_technicians,

        // --- Work Orders ---
        handlers::work_orders::create_work_order,
        handlers::work_orders::list_work_orders,
        handlers::work_orders::get_work_order,
        handlers::work_orders::schedule_work_order,
        handlers::work_orders::cancel_work_order,
        handlers::work_orders::save_signature,
        handlers::work_orders::list_signatures,

        // --- Checklist ---
        handlers::checklist::get_catalog,
        handlers::checklist::list_results,
        handlers::checklist::load_draft,
        handlers::checklist::save_draft,
        handlers::checklist::submit_checklist,

        // --- Validations ---
        handlers::validations::list_validations,
        handlers::validations::get_validation,
        handlers::validations::assign_reviewer,
        handlers::validations::approve_validation,
        handlers::validations::reject_validation,

        // --- Reports ---
        handlers::reports::download_report,
    ),
    components(
        schemas(
            // --- Intake ---
            models::intake::ServiceRequestStatus,
            models::intake::ServiceRequest,
            models::intake::NewServiceRequest,
            models::intake::Technician,
            models::intake::NewTechnician,

            // --- Work Orders ---
            models::work_order::WorkOrderStatus,
            models::work_order::InspectionType,
            models::work_order::WorkOrder,
            models::work_order::NewWorkOrder,
            models::work_order::ScheduleWorkOrder,
            models::work_order::SaveOutcome,
            models::signature::SignatureRole,
            models::signature::Signature,
            models::signature::SignaturePayload,

            // --- Checklist ---
            services::catalog::CatalogItem,
            models::checklist::ItemResult,
            models::checklist::PhotoMetadata,
            models::checklist::PhotoAttachment,
            models::checklist::ChecklistItemResult,
            models::checklist::ChecklistEntry,
            models::checklist::ChecklistPayload,
            models::checklist::ChecklistDraft,

            // --- Validations ---
            models::validation::ValidationStatus,
            models::validation::Verdict,
            models::validation::ValidationRequest,
            models::validation::ReviewPayload,
            models::validation::AssignReviewerPayload,
        )
    ),
    tags(
        (name = "Health", description = "Disponibilidade do serviço"),
        (name = "Intake", description = "Pedidos de clientes e cadastro de técnicos"),
        (name = "Work Orders", description = "Ordens de serviço, agenda e assinaturas"),
        (name = "Checklist", description = "Preenchimento do checklist de inspeção"),
        (name = "Validations", description = "Revisão das inspeções concluídas"),
        (name = "Reports", description = "Relatório de inspeção em PDF")
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
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
