//! OpenAPI Specification for the Benchlog API
//!
//! Built with utoipa from the route annotations and the request/response
//! types. Served at `/openapi.json` and written out by the
//! `generate-openapi` binary.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{HealthResponse, HealthStatus};
use crate::types::*;

use crate::routes::{auth, catalog, health, records, search, uploads};

use benchlog_core::{
    EntityKind, Equipment, EquipmentDraft, ExperimentRecord, ExperimentRecordDraft,
    ExperimentTemplate, ExperimentTemplateDraft, Facility, FacilityDraft, LinkKind, Reagent,
    ReagentDraft, SearchResults, SearchScope, Sop, SopDraft,
};

/// OpenAPI document for the Benchlog API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Benchlog API",
        version = "0.1.0",
        description = "Lab inventory and experiment records: facilities, equipment, reagents, SOPs, templates and the records that link them",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local Development")
    ),
    tags(
        (name = "Records", description = "Experiment records and their equipment/reagent links"),
        (name = "Facilities", description = "Rooms and shared spaces"),
        (name = "Equipment", description = "Instruments and devices"),
        (name = "Reagents", description = "Reagent lots in stock"),
        (name = "SOPs", description = "Standard operating procedures"),
        (name = "Templates", description = "Experiment record templates"),
        (name = "Search", description = "Substring search across the inventory"),
        (name = "Uploads", description = "Files attached to entities"),
        (name = "Auth", description = "Registration and login"),
        (name = "Health", description = "Liveness and readiness")
    ),
    paths(
        // === Record Routes ===
        records::list_records,
        records::create_record,
        records::get_record,
        records::update_record,
        records::delete_record,
        records::get_equipment_ids,
        records::get_reagent_ids,
        records::set_equipment,
        records::set_reagents,

        // === Catalog Routes ===
        catalog::facilities::list_rows,
        catalog::facilities::create_row,
        catalog::facilities::get_row,
        catalog::facilities::put_row,
        catalog::facilities::patch_row,
        catalog::facilities::delete_row,
        catalog::equipment::list_rows,
        catalog::equipment::create_row,
        catalog::equipment::get_row,
        catalog::equipment::put_row,
        catalog::equipment::patch_row,
        catalog::equipment::delete_row,
        catalog::reagents::list_rows,
        catalog::reagents::create_row,
        catalog::reagents::get_row,
        catalog::reagents::put_row,
        catalog::reagents::patch_row,
        catalog::reagents::delete_row,
        catalog::sops::list_rows,
        catalog::sops::create_row,
        catalog::sops::get_row,
        catalog::sops::put_row,
        catalog::sops::patch_row,
        catalog::sops::delete_row,
        catalog::templates::list_rows,
        catalog::templates::create_row,
        catalog::templates::get_row,
        catalog::templates::put_row,
        catalog::templates::patch_row,
        catalog::templates::delete_row,

        // === Search, Uploads, Auth, Health ===
        search::search,
        uploads::upload_file,
        uploads::list_attachments,
        auth::register,
        auth::login,
        health::ping,
        health::readiness,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Entities ===
            Facility, FacilityDraft,
            Equipment, EquipmentDraft,
            Reagent, ReagentDraft,
            Sop, SopDraft,
            ExperimentTemplate, ExperimentTemplateDraft,
            ExperimentRecord, ExperimentRecordDraft,
            EntityKind, LinkKind,

            // === Request/Response Types ===
            OkResponse, LinkIdsResponse, SetLinksResponse,
            SearchScope, SearchResults,
            RegisterRequest, LoginRequest, TokenResponse,
            AttachmentResponse,
            HealthResponse, HealthStatus,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the JWT bearer scheme referenced by protected routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();
        assert_eq!(openapi.info.title, "Benchlog API");

        let tags = openapi
            .tags
            .as_ref()
            .ok_or_else(|| "OpenAPI tags missing".to_string())?;
        assert_eq!(tags.len(), 10);

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("ExperimentRecord"));
        Ok(())
    }

    #[test]
    fn test_openapi_lists_every_route_group() {
        let openapi = ApiDoc::openapi();
        for path in [
            "/records",
            "/records/{id}/set-equipment",
            "/facilities/{id}",
            "/equipment",
            "/reagents/{id}",
            "/sops",
            "/templates/{id}",
            "/search",
            "/uploads",
            "/uploads/{entity_type}/{entity_id}",
            "/auth/login",
            "/health/ready",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_openapi_json_serialization() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        serde_json::from_str::<serde_json::Value>(&json)
            .map_err(|e| format!("Generated JSON invalid: {}", e))?;
        assert!(json.contains("Benchlog API"));
        Ok(())
    }
}
