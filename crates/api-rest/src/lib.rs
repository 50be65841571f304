//! # API REST
//!
//! REST API implementation for mrisk.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::convert::{parse_admission_id, vitals_from_pb};
use api_shared::{pb, HealthService};
use mrisk_core::validation::{validate_condition_ids, validate_vitals};
use mrisk_core::{AdmissionPayload, AdmissionWorkflow, RiskError, VitalsPayload};

/// Application state shared across REST API handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: AdmissionWorkflow,
    pub health: HealthService,
}

type ApiError = (StatusCode, String);

/// Body of `PUT /admissions/:id/category`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DesignateCategoryBody {
    pub category_id: i64,
}

/// Body of `POST /admissions/:id/outcome`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordOutcomeBody {
    pub kind: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_categories,
        list_conditions,
        compute_risk,
        create_admission,
        get_admission,
        record_encounter,
        designate_category,
        record_outcome,
    ),
    components(schemas(
        pb::HealthRes,
        pb::Category,
        pb::ListCategoriesRes,
        pb::Condition,
        pb::ListConditionsRes,
        pb::Vitals,
        pb::ComputeRiskCategoryReq,
        pb::Contribution,
        pb::RiskAssessment,
        pb::CreateAdmissionReq,
        pb::Admission,
        pb::Encounter,
        pb::Outcome,
        DesignateCategoryBody,
        RecordOutcomeBody,
    ))
)]
pub struct ApiDoc;

/// Build the REST router, including Swagger UI at `/swagger-ui`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/categories", get(list_categories))
        .route("/conditions", get(list_conditions))
        .route("/risk/compute", post(compute_risk))
        .route("/admissions", post(create_admission))
        .route("/admissions/:id", get(get_admission))
        .route("/admissions/:id/encounters", post(record_encounter))
        .route("/admissions/:id/category", put(designate_category))
        .route("/admissions/:id/outcome", post(record_outcome))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_response(err: RiskError) -> ApiError {
    match err {
        RiskError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        RiskError::AdmissionNotFound(_) => {
            (StatusCode::NOT_FOUND, "Admission not found".to_string())
        }
        RiskError::AdmissionClosed(_) => (StatusCode::CONFLICT, "Admission is closed".to_string()),
        other => {
            tracing::error!("Risk service error: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error".to_string(),
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = pb::HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Also reports which reference data is loaded.
#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> Json<pb::HealthRes> {
    Json(state.health.check_health())
}

#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Risk categories in severity order", body = pb::ListCategoriesRes)
    )
)]
#[axum::debug_handler]
async fn list_categories(State(state): State<AppState>) -> Json<pb::ListCategoriesRes> {
    let categories = state
        .workflow
        .risk()
        .registry()
        .iter()
        .map(Into::into)
        .collect();
    Json(pb::ListCategoriesRes { categories })
}

#[utoipa::path(
    get,
    path = "/conditions",
    responses(
        (status = 200, description = "Pathological condition vocabulary", body = pb::ListConditionsRes)
    )
)]
#[axum::debug_handler]
async fn list_conditions(State(state): State<AppState>) -> Json<pb::ListConditionsRes> {
    let conditions = state
        .workflow
        .risk()
        .vocabulary()
        .iter()
        .map(Into::into)
        .collect();
    Json(pb::ListConditionsRes { conditions })
}

#[utoipa::path(
    post,
    path = "/risk/compute",
    request_body = pb::ComputeRiskCategoryReq,
    responses(
        (status = 200, description = "Computed risk category", body = pb::RiskAssessment),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Compute a risk category without recording anything
///
/// With no `current_category_id` the call is in first-admission mode and `condition_ids` are
/// weighed; otherwise they are ignored.
#[axum::debug_handler]
async fn compute_risk(
    State(state): State<AppState>,
    Json(req): Json<pb::ComputeRiskCategoryReq>,
) -> Result<Json<pb::RiskAssessment>, ApiError> {
    let vitals = vitals_from_pb(req.vitals);
    validate_vitals(&vitals).map_err(error_response)?;
    validate_condition_ids(&req.condition_ids).map_err(error_response)?;

    let assessment = state
        .workflow
        .risk()
        .assess(&vitals, &req.condition_ids, req.current_category_id)
        .map_err(error_response)?;
    Ok(Json((&assessment).into()))
}

#[utoipa::path(
    post,
    path = "/admissions",
    request_body = pb::CreateAdmissionReq,
    responses(
        (status = 201, description = "Admission created", body = pb::Admission),
        (status = 400, description = "Bad request"),
        (status = 500, description = "Internal server error")
    )
)]
/// Open an admission with its intake readings and pre-existing conditions
#[axum::debug_handler]
async fn create_admission(
    State(state): State<AppState>,
    Json(req): Json<pb::CreateAdmissionReq>,
) -> Result<(StatusCode, Json<pb::Admission>), ApiError> {
    let record = state
        .workflow
        .admit(AdmissionPayload::from(req))
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json((&record).into())))
}

#[utoipa::path(
    get,
    path = "/admissions/{id}",
    params(("id" = String, Path, description = "Admission UUID")),
    responses(
        (status = 200, description = "Admission with its encounters", body = pb::Admission),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Admission not found")
    )
)]
#[axum::debug_handler]
async fn get_admission(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<pb::Admission>, ApiError> {
    let id = parse_admission_id(&id).map_err(error_response)?;
    let record = state.workflow.admission(id).map_err(error_response)?;
    Ok(Json((&record).into()))
}

#[utoipa::path(
    post,
    path = "/admissions/{id}/encounters",
    params(("id" = String, Path, description = "Admission UUID")),
    request_body = pb::Vitals,
    responses(
        (status = 201, description = "Encounter recorded", body = pb::Encounter),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Admission not found"),
        (status = 409, description = "Admission is closed"),
        (status = 500, description = "Internal server error")
    )
)]
/// Record a follow-up encounter
///
/// The admission's stored category is the current category; the new category replaces it.
#[axum::debug_handler]
async fn record_encounter(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(vitals): Json<pb::Vitals>,
) -> Result<(StatusCode, Json<pb::Encounter>), ApiError> {
    let id = parse_admission_id(&id).map_err(error_response)?;
    let encounter = state
        .workflow
        .record_encounter(id, VitalsPayload::from(vitals))
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json((&encounter).into())))
}

#[utoipa::path(
    put,
    path = "/admissions/{id}/category",
    params(("id" = String, Path, description = "Admission UUID")),
    request_body = DesignateCategoryBody,
    responses(
        (status = 200, description = "Category designated", body = pb::Admission),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Admission not found"),
        (status = 409, description = "Admission is closed")
    )
)]
/// Designate a category explicitly, e.g. to open the abortion process
#[axum::debug_handler]
async fn designate_category(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(body): Json<DesignateCategoryBody>,
) -> Result<Json<pb::Admission>, ApiError> {
    let id = parse_admission_id(&id).map_err(error_response)?;
    let record = state
        .workflow
        .designate_category(id, body.category_id)
        .map_err(error_response)?;
    Ok(Json((&record).into()))
}

#[utoipa::path(
    post,
    path = "/admissions/{id}/outcome",
    params(("id" = String, Path, description = "Admission UUID")),
    request_body = RecordOutcomeBody,
    responses(
        (status = 200, description = "Admission closed", body = pb::Admission),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Admission not found"),
        (status = 409, description = "Admission is closed")
    )
)]
/// Record the outcome and close the admission
#[axum::debug_handler]
async fn record_outcome(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(body): Json<RecordOutcomeBody>,
) -> Result<Json<pb::Admission>, ApiError> {
    let id = parse_admission_id(&id).map_err(error_response)?;
    let record = state
        .workflow
        .record_outcome(id, &body.kind, body.notes.as_deref())
        .map_err(error_response)?;
    Ok(Json((&record).into()))
}
