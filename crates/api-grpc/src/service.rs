// Re-export the proto module from the shared `api-shared` crate so callers
// can reference `api_grpc::service::pb`.
pub use api_shared::pb;

use api_shared::convert::{parse_admission_id, vitals_from_pb};
use api_shared::pb::risk_server::Risk;
use api_shared::{ApiKey, HealthService};
use mrisk_core::{AdmissionPayload, AdmissionWorkflow, RiskError};
use tonic::service::Interceptor;
use tonic::{Request, Response, Status};

/// Checks the `x-api-key` header on every request.
#[derive(Clone, Debug)]
pub struct AuthInterceptor {
    key: Option<ApiKey>,
}

impl AuthInterceptor {
    pub fn new(key: Option<ApiKey>) -> Self {
        Self { key }
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, req: Request<()>) -> Result<Request<()>, Status> {
        let key = self
            .key
            .as_ref()
            .ok_or_else(|| Status::internal("API_KEY not set in environment"))?;
        let provided = req.metadata().get("x-api-key").and_then(|v| v.to_str().ok());
        key.validate(provided)?;
        Ok(req)
    }
}

/// Map a core error onto a gRPC status.
///
/// Registry and storage failures are logged and reported without detail.
pub fn status_from_error(err: RiskError) -> Status {
    match err {
        RiskError::InvalidInput(msg) => Status::invalid_argument(msg),
        RiskError::AdmissionNotFound(id) => {
            Status::not_found(format!("admission not found: {id}"))
        }
        RiskError::AdmissionClosed(id) => {
            Status::failed_precondition(format!("admission is closed: {id}"))
        }
        other => {
            tracing::error!("risk service error: {:?}", other);
            Status::internal("Internal error")
        }
    }
}

#[derive(Clone)]
pub struct MriskService {
    workflow: AdmissionWorkflow,
    health: HealthService,
}

impl MriskService {
    pub fn new(workflow: AdmissionWorkflow, health: HealthService) -> Self {
        Self { workflow, health }
    }
}

#[tonic::async_trait]
impl Risk for MriskService {
    async fn health(&self, _req: Request<()>) -> Result<Response<pb::HealthRes>, Status> {
        Ok(Response::new(self.health.check_health()))
    }

    async fn list_categories(
        &self,
        _req: Request<()>,
    ) -> Result<Response<pb::ListCategoriesRes>, Status> {
        let categories = self.workflow.risk().registry().iter().map(Into::into).collect();
        Ok(Response::new(pb::ListCategoriesRes { categories }))
    }

    async fn list_conditions(
        &self,
        _req: Request<()>,
    ) -> Result<Response<pb::ListConditionsRes>, Status> {
        let conditions = self.workflow.risk().vocabulary().iter().map(Into::into).collect();
        Ok(Response::new(pb::ListConditionsRes { conditions }))
    }

    async fn compute_risk_category(
        &self,
        req: Request<pb::ComputeRiskCategoryReq>,
    ) -> Result<Response<pb::RiskAssessment>, Status> {
        let req = req.into_inner();
        let vitals = vitals_from_pb(req.vitals);
        mrisk_core::validation::validate_vitals(&vitals).map_err(status_from_error)?;
        mrisk_core::validation::validate_condition_ids(&req.condition_ids)
            .map_err(status_from_error)?;

        let assessment = self
            .workflow
            .risk()
            .assess(&vitals, &req.condition_ids, req.current_category_id)
            .map_err(status_from_error)?;
        Ok(Response::new((&assessment).into()))
    }

    async fn create_admission(
        &self,
        req: Request<pb::CreateAdmissionReq>,
    ) -> Result<Response<pb::Admission>, Status> {
        let payload = AdmissionPayload::from(req.into_inner());
        let record = self.workflow.admit(payload).map_err(status_from_error)?;
        Ok(Response::new((&record).into()))
    }

    async fn get_admission(
        &self,
        req: Request<pb::GetAdmissionReq>,
    ) -> Result<Response<pb::Admission>, Status> {
        let id = parse_admission_id(&req.into_inner().admission_id).map_err(status_from_error)?;
        let record = self.workflow.admission(id).map_err(status_from_error)?;
        Ok(Response::new((&record).into()))
    }

    async fn record_encounter(
        &self,
        req: Request<pb::RecordEncounterReq>,
    ) -> Result<Response<pb::Encounter>, Status> {
        let req = req.into_inner();
        let id = parse_admission_id(&req.admission_id).map_err(status_from_error)?;
        let encounter = self
            .workflow
            .record_encounter(id, vitals_from_pb(req.vitals))
            .map_err(status_from_error)?;
        Ok(Response::new((&encounter).into()))
    }

    async fn designate_category(
        &self,
        req: Request<pb::DesignateCategoryReq>,
    ) -> Result<Response<pb::Admission>, Status> {
        let req = req.into_inner();
        let id = parse_admission_id(&req.admission_id).map_err(status_from_error)?;
        let record = self
            .workflow
            .designate_category(id, req.category_id)
            .map_err(status_from_error)?;
        Ok(Response::new((&record).into()))
    }

    async fn record_outcome(
        &self,
        req: Request<pb::RecordOutcomeReq>,
    ) -> Result<Response<pb::Admission>, Status> {
        let req = req.into_inner();
        let id = parse_admission_id(&req.admission_id).map_err(status_from_error)?;
        let record = self
            .workflow
            .record_outcome(id, &req.kind, req.notes.as_deref())
            .map_err(status_from_error)?;
        Ok(Response::new((&record).into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrisk_core::{CoreConfig, InMemoryEncounterStore, RiskService};
    use std::sync::Arc;

    fn service() -> MriskService {
        let cfg = CoreConfig::seeded().unwrap();
        let workflow = AdmissionWorkflow::new(
            RiskService::new(&cfg),
            Arc::new(InMemoryEncounterStore::new()),
        );
        MriskService::new(workflow, HealthService::new(cfg.shared_reference()))
    }

    #[test]
    fn test_interceptor_requires_key() {
        let mut interceptor =
            AuthInterceptor::new(ApiKey::from_env_value(Some("secret".into())));

        let err = interceptor.call(Request::new(())).unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);

        let mut req = Request::new(());
        req.metadata_mut()
            .insert("x-api-key", "secret".parse().unwrap());
        assert!(interceptor.call(req).is_ok());
    }

    #[test]
    fn test_interceptor_without_configured_key() {
        let mut interceptor = AuthInterceptor::new(None);
        let err = interceptor.call(Request::new(())).unwrap_err();
        assert_eq!(err.code(), tonic::Code::Internal);
    }

    #[test]
    fn test_status_mapping() {
        let id = parse_admission_id("00000000-0000-0000-0000-000000000001").unwrap();
        assert_eq!(
            status_from_error(RiskError::InvalidInput("x".into())).code(),
            tonic::Code::InvalidArgument
        );
        assert_eq!(
            status_from_error(RiskError::AdmissionNotFound(id)).code(),
            tonic::Code::NotFound
        );
        assert_eq!(
            status_from_error(RiskError::AdmissionClosed(id)).code(),
            tonic::Code::FailedPrecondition
        );
        assert_eq!(
            status_from_error(RiskError::StorePoisoned).code(),
            tonic::Code::Internal
        );
    }

    #[tokio::test]
    async fn test_compute_risk_category() {
        let svc = service();
        let res = svc
            .compute_risk_category(Request::new(pb::ComputeRiskCategoryReq {
                vitals: Some(pb::Vitals {
                    systolic_bp: Some(160),
                    diastolic_bp: Some(110),
                    ..Default::default()
                }),
                condition_ids: Vec::new(),
                current_category_id: None,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(res.category_key, "alto");
        assert!(!res.contributions.is_empty());
    }

    #[tokio::test]
    async fn test_compute_rejects_unknown_current_category() {
        let svc = service();
        let err = svc
            .compute_risk_category(Request::new(pb::ComputeRiskCategoryReq {
                current_category_id: Some(999),
                ..Default::default()
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Internal);
    }

    #[tokio::test]
    async fn test_admission_lifecycle() {
        let svc = service();
        let admission = svc
            .create_admission(Request::new(pb::CreateAdmissionReq {
                patient_reference: "p-1".into(),
                vitals: None,
                condition_ids: vec![2],
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(admission.encounters.len(), 1);

        let encounter = svc
            .record_encounter(Request::new(pb::RecordEncounterReq {
                admission_id: admission.id.clone(),
                vitals: Some(pb::Vitals {
                    fetal_heart_rate: Some(90),
                    ..Default::default()
                }),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(encounter.assessment.unwrap().category_key, "alto");

        let closed = svc
            .record_outcome(Request::new(pb::RecordOutcomeReq {
                admission_id: admission.id.clone(),
                kind: "parto".into(),
                notes: None,
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(closed.outcome.is_some());

        let err = svc
            .record_encounter(Request::new(pb::RecordEncounterReq {
                admission_id: admission.id,
                vitals: None,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::FailedPrecondition);
    }

    #[tokio::test]
    async fn test_get_admission_bad_id() {
        let svc = service();
        let err = svc
            .get_admission(Request::new(pb::GetAdmissionReq {
                admission_id: "nope".into(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);
    }
}
