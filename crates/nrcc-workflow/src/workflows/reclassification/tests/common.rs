use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::reclassification::domain::{
    ApplicantType, Application, ApplicationId, CriterionSelection, EligibilityCriterion,
    RoadClass, RoadFormData, UserId, UserRef, UserRole,
};
use crate::workflows::reclassification::engine::{
    ActionInput, CreateApplication, DecisionInput, RecommendationInput, ReclassificationEngine,
    VerificationReportInput, VerificationRequest, WorkflowConfig,
};
use crate::workflows::reclassification::repository::{
    ApplicationStore, Notifier, NotifyError, RolePermissionPolicy, StoreError, UserDirectory,
};
use crate::workflows::reclassification::domain::{DecisionType, DisapprovalType};

pub(super) use crate::workflows::reclassification::repository::InMemoryApplicationStore as MemoryStore;

pub(super) const APPLICANT: &str = "applicant-1";
pub(super) const BOARD_INITIATOR: &str = "board-1";
pub(super) const RAS: &str = "ras-1";
pub(super) const RC: &str = "rc-1";
pub(super) const MINISTER: &str = "minister-1";
pub(super) const CHAIR: &str = "chair-1";
pub(super) const MEMBER_ONE: &str = "member-1";
pub(super) const MEMBER_TWO: &str = "member-2";
pub(super) const MEMBER_THREE: &str = "member-3";
pub(super) const LAWYER: &str = "lawyer-1";

pub(super) fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

/// Accepts the initial insert but loses every optimistic-lock race on
/// write-back.
#[derive(Default)]
pub(super) struct ContendedStore {
    inner: MemoryStore,
}

impl ApplicationStore for ContendedStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        self.inner.insert(application)
    }

    fn update(&self, application: Application) -> Result<Application, StoreError> {
        Err(StoreError::VersionConflict(application.id))
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        self.inner.fetch(id)
    }

    fn count(&self) -> Result<u64, StoreError> {
        self.inner.count()
    }

    fn remove(&self, id: &ApplicationId) -> Result<(), StoreError> {
        self.inner.remove(id)
    }
}

pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn insert(&self, _application: Application) -> Result<Application, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _application: Application) -> Result<Application, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &ApplicationId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryDirectory {
    users: Arc<Mutex<Vec<UserRef>>>,
}

impl MemoryDirectory {
    pub(super) fn with_cast() -> Self {
        let directory = Self::default();
        let cast = [
            (APPLICANT, "Asha Mkude", UserRole::PublicApplicant),
            (BOARD_INITIATOR, "Board Initiator", UserRole::RegionalRoadsBoardInitiator),
            (RAS, "Regional Admin Secretary", UserRole::RegionalAdministrativeSecretary),
            (RC, "Regional Commissioner", UserRole::RegionalCommissioner),
            (MINISTER, "Minister of Works", UserRole::MinisterOfWorks),
            (CHAIR, "NRCC Chairperson", UserRole::NrccChairperson),
            (MEMBER_ONE, "Member One", UserRole::NrccMember),
            (MEMBER_TWO, "Member Two", UserRole::NrccMember),
            (MEMBER_THREE, "Member Three", UserRole::NrccMember),
            (LAWYER, "Ministry Lawyer", UserRole::MinistryLawyer),
        ];
        for (id, name, role) in cast {
            directory.add(id, name, role);
        }
        directory
    }

    pub(super) fn add(&self, id: &str, name: &str, role: UserRole) {
        self.users.lock().expect("directory mutex poisoned").push(UserRef {
            id: UserId(id.to_string()),
            name: name.to_string(),
            role,
        });
    }
}

impl UserDirectory for MemoryDirectory {
    fn find_by_id(&self, id: &UserId) -> Option<UserRef> {
        self.users
            .lock()
            .expect("directory mutex poisoned")
            .iter()
            .find(|user| user.id == *id)
            .cloned()
    }

    fn find_active_by_role(&self, role: UserRole) -> Option<UserRef> {
        self.users
            .lock()
            .expect("directory mutex poisoned")
            .iter()
            .find(|user| user.role == role)
            .cloned()
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    messages: Arc<Mutex<Vec<(UserId, String)>>>,
}

impl MemoryNotifier {
    pub(super) fn messages(&self) -> Vec<(UserId, String)> {
        self.messages.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, recipient: &UserId, message: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .expect("notifier mutex poisoned")
            .push((recipient.clone(), message.to_string()));
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _recipient: &UserId, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("smtp unreachable".to_string()))
    }
}

pub(super) type TestEngine = ReclassificationEngine<MemoryStore, MemoryDirectory, MemoryNotifier>;

pub(super) fn build_engine() -> (Arc<TestEngine>, Arc<MemoryStore>, Arc<MemoryNotifier>) {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(MemoryDirectory::with_cast());
    let notifier = Arc::new(MemoryNotifier::default());
    let engine = Arc::new(ReclassificationEngine::new(
        store.clone(),
        directory,
        notifier.clone(),
        Arc::new(RolePermissionPolicy),
        WorkflowConfig::default(),
    ));
    (engine, store, notifier)
}

pub(super) fn form_data() -> RoadFormData {
    RoadFormData {
        road_name: "Kibaha - Mlandizi".to_string(),
        road_length_km: 42.5,
        current_class: RoadClass::District,
        starting_point: "Kibaha township junction".to_string(),
        terminal_point: "Mlandizi weighbridge".to_string(),
        reclassification_reasons: "Connects two district headquarters".to_string(),
        surface_type_carriageway: Some("Gravel".to_string()),
        surface_type_shoulders: None,
        carriageway_width_m: Some(6.5),
        formation_width_m: None,
        road_reserve_width_m: Some(30.0),
        traffic_level: Some("Moderate".to_string()),
        traffic_composition: None,
        towns_villages_linked: Some("Kibaha, Mlandizi".to_string()),
        principal_nodes: None,
        bus_routes: Some("Two daily routes".to_string()),
        public_services: None,
        alternative_routes: None,
    }
}

pub(super) fn regional_criteria() -> Vec<CriterionSelection> {
    vec![CriterionSelection {
        criterion: EligibilityCriterion::R1,
        details: Some("Joins Kibaha and Mlandizi headquarters".to_string()),
        evidence_description: None,
    }]
}

pub(super) fn create_input(actor: &str, applicant_type: ApplicantType) -> CreateApplication {
    CreateApplication {
        actor: user(actor),
        applicant_type,
        proposed_class: RoadClass::Regional,
        form_data: form_data(),
        eligibility: regional_criteria(),
        remarks: None,
    }
}

pub(super) fn action(actor: &str) -> ActionInput {
    ActionInput {
        actor: user(actor),
        comments: None,
    }
}

pub(super) fn due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 30).expect("valid date")
}

pub(super) fn verification_request(member: &str) -> VerificationRequest {
    VerificationRequest {
        actor: user(CHAIR),
        member: user(member),
        due_date: due_date(),
        instructions: Some("Inspect the full alignment".to_string()),
    }
}

pub(super) fn report_input(member: &str, assignment: u64) -> VerificationReportInput {
    VerificationReportInput {
        actor: user(member),
        assignment_id: crate::workflows::reclassification::domain::AssignmentId(assignment),
        findings: "Alignment verified in good condition".to_string(),
        visit_date: NaiveDate::from_ymd_opt(2026, 9, 15).expect("valid date"),
    }
}

pub(super) fn approve_decision() -> DecisionInput {
    DecisionInput {
        actor: user(MINISTER),
        decision: DecisionType::Approve,
        disapproval_type: None,
        reason: "Meets the regional criteria".to_string(),
    }
}

pub(super) fn disapprove_decision(disapproval: DisapprovalType) -> DecisionInput {
    DecisionInput {
        actor: user(MINISTER),
        decision: DecisionType::Disapprove,
        disapproval_type: Some(disapproval),
        reason: "Insufficient network justification".to_string(),
    }
}

/// Drives a public-applicant submission to the committee chair.
pub(super) fn application_with_chair(engine: &TestEngine) -> Application {
    let created = engine
        .create(create_input(APPLICANT, ApplicantType::Individual))
        .expect("create succeeds");
    engine
        .submit(&created.id, action(APPLICANT))
        .expect("submit succeeds");
    engine
        .forward_to_chair(&created.id, action(MINISTER))
        .expect("forward succeeds")
}

/// Drives an application through verification and recommendation so the
/// minister can decide.
pub(super) fn application_awaiting_decision(engine: &TestEngine) -> Application {
    let application = application_with_chair(engine);
    engine
        .assign_verification(&application.id, verification_request(MEMBER_ONE))
        .expect("assignment succeeds");
    engine
        .submit_verification_report(&application.id, report_input(MEMBER_ONE, 1))
        .expect("report succeeds");
    engine
        .submit_recommendation(
            &application.id,
            RecommendationInput {
                actor: user(CHAIR),
                text: "Recommend approval".to_string(),
            },
        )
        .expect("recommendation succeeds")
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
