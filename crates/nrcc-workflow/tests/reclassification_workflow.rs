use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use nrcc_workflow::workflows::reclassification::{
    ActionInput, AppealDecisionInput, AppealInput, ApplicantType, ApplicationStatus,
    CreateApplication, CriterionSelection, DecisionInput, DecisionType, DisapprovalType,
    EligibilityCriterion, GazettementStatus, GazettementUpdate, InMemoryApplicationStore,
    Notifier, NotifyError, RecommendationInput, ReclassificationEngine, RoadClass, RoadFormData,
    RolePermissionPolicy, UserDirectory, UserId, UserRef, UserRole, VerificationReportInput,
    VerificationRequest, WorkflowConfig,
};

#[derive(Default, Clone)]
struct MemoryDirectory {
    users: Arc<Mutex<Vec<UserRef>>>,
}

impl MemoryDirectory {
    fn add(&self, id: &str, name: &str, role: UserRole) {
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
struct MemoryNotifier {
    messages: Arc<Mutex<Vec<(UserId, String)>>>,
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

fn build_engine() -> (
    ReclassificationEngine<InMemoryApplicationStore, MemoryDirectory, MemoryNotifier>,
    MemoryNotifier,
) {
    let directory = MemoryDirectory::default();
    directory.add("board-1", "Board Initiator", UserRole::RegionalRoadsBoardInitiator);
    directory.add("ras-1", "Regional Admin Secretary", UserRole::RegionalAdministrativeSecretary);
    directory.add("rc-1", "Regional Commissioner", UserRole::RegionalCommissioner);
    directory.add("minister-1", "Minister of Works", UserRole::MinisterOfWorks);
    directory.add("chair-1", "NRCC Chairperson", UserRole::NrccChairperson);
    directory.add("member-1", "Member One", UserRole::NrccMember);
    directory.add("member-2", "Member Two", UserRole::NrccMember);
    directory.add("lawyer-1", "Ministry Lawyer", UserRole::MinistryLawyer);

    let notifier = MemoryNotifier::default();
    let engine = ReclassificationEngine::new(
        Arc::new(InMemoryApplicationStore::default()),
        Arc::new(directory),
        Arc::new(notifier.clone()),
        Arc::new(RolePermissionPolicy),
        WorkflowConfig::default(),
    );
    (engine, notifier)
}

fn user(id: &str) -> UserId {
    UserId(id.to_string())
}

fn action(actor: &str) -> ActionInput {
    ActionInput {
        actor: user(actor),
        comments: None,
    }
}

fn board_application() -> CreateApplication {
    CreateApplication {
        actor: user("board-1"),
        applicant_type: ApplicantType::RegionalRoadsBoard,
        proposed_class: RoadClass::Trunk,
        form_data: RoadFormData {
            road_name: "Tanga - Pangani".to_string(),
            road_length_km: 128.0,
            current_class: RoadClass::Regional,
            starting_point: "Tanga regional office".to_string(),
            terminal_point: "Pangani ferry terminal".to_string(),
            reclassification_reasons: "Primary link between regional headquarters".to_string(),
            surface_type_carriageway: Some("Bituminous".to_string()),
            surface_type_shoulders: Some("Gravel".to_string()),
            carriageway_width_m: Some(7.0),
            formation_width_m: Some(9.0),
            road_reserve_width_m: Some(45.0),
            traffic_level: Some("Heavy".to_string()),
            traffic_composition: Some("Freight and bus traffic".to_string()),
            towns_villages_linked: Some("Tanga, Pangani".to_string()),
            principal_nodes: None,
            bus_routes: Some("Six daily routes".to_string()),
            public_services: Some("Two hospitals, port access".to_string()),
            alternative_routes: None,
        },
        eligibility: vec![CriterionSelection {
            criterion: EligibilityCriterion::T2,
            details: Some("Links Tanga and Pangani headquarters".to_string()),
            evidence_description: Some("Network map, annex A".to_string()),
        }],
        remarks: None,
    }
}

#[test]
fn board_application_travels_the_full_route_to_gazettement() {
    let (engine, _) = build_engine();

    let created = engine.create(board_application()).expect("create succeeds");
    assert_eq!(created.status, ApplicationStatus::Draft);

    let id = created.id.clone();
    engine.submit(&id, action("board-1")).expect("submit succeeds");
    engine.ras_approve(&id, action("ras-1")).expect("ras approval succeeds");
    engine.rc_approve(&id, action("rc-1")).expect("rc approval succeeds");
    engine
        .forward_to_chair(&id, action("minister-1"))
        .expect("forward succeeds");

    for member in ["member-1", "member-2"] {
        engine
            .assign_verification(
                &id,
                VerificationRequest {
                    actor: user("chair-1"),
                    member: user(member),
                    due_date: NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date"),
                    instructions: None,
                },
            )
            .expect("assignment succeeds");
    }

    let after_first = engine
        .submit_verification_report(
            &id,
            VerificationReportInput {
                actor: user("member-1"),
                assignment_id: nrcc_workflow::workflows::reclassification::AssignmentId(1),
                findings: "Pavement in fair condition".to_string(),
                visit_date: NaiveDate::from_ymd_opt(2026, 10, 2).expect("valid date"),
            },
        )
        .expect("first report succeeds");
    assert_eq!(after_first.status, ApplicationStatus::VerificationInProgress);

    let after_second = engine
        .submit_verification_report(
            &id,
            VerificationReportInput {
                actor: user("member-2"),
                assignment_id: nrcc_workflow::workflows::reclassification::AssignmentId(2),
                findings: "Traffic counts support the upgrade".to_string(),
                visit_date: NaiveDate::from_ymd_opt(2026, 10, 3).expect("valid date"),
            },
        )
        .expect("second report succeeds");
    assert_eq!(after_second.status, ApplicationStatus::NrccReviewMeeting);

    engine
        .submit_recommendation(
            &id,
            RecommendationInput {
                actor: user("chair-1"),
                text: "The committee recommends the upgrade".to_string(),
            },
        )
        .expect("recommendation succeeds");

    let decided = engine
        .record_minister_decision(
            &id,
            DecisionInput {
                actor: user("minister-1"),
                decision: DecisionType::Approve,
                disapproval_type: None,
                reason: "Meets the trunk criteria".to_string(),
            },
        )
        .expect("decision succeeds");
    assert_eq!(decided.status, ApplicationStatus::PendingGazettement);

    let gazetted = engine
        .update_gazettement(
            &id,
            GazettementUpdate {
                actor: user("lawyer-1"),
                gazette_number: "GN 512".to_string(),
                gazette_date: NaiveDate::from_ymd_opt(2026, 12, 4).expect("valid date"),
            },
        )
        .expect("gazettement succeeds");

    assert_eq!(gazetted.status, ApplicationStatus::Gazetted);
    assert!(gazetted.current_owner.is_none());
    assert_eq!(
        gazetted.gazettement.as_ref().map(|g| g.status),
        Some(GazettementStatus::Gazetted)
    );
    // create, submit, two approvals, forward, two assignments, two reports,
    // recommendation, decision, gazettement.
    assert_eq!(gazetted.audit.len(), 12);
}

#[test]
fn refused_application_closes_after_a_rejected_appeal() {
    let (engine, notifier) = build_engine();

    let created = engine.create(board_application()).expect("create succeeds");
    let id = created.id.clone();
    engine.submit(&id, action("board-1")).expect("submit succeeds");
    engine.ras_approve(&id, action("ras-1")).expect("ras approval succeeds");
    engine.rc_approve(&id, action("rc-1")).expect("rc approval succeeds");
    engine
        .forward_to_chair(&id, action("minister-1"))
        .expect("forward succeeds");
    engine
        .assign_verification(
            &id,
            VerificationRequest {
                actor: user("chair-1"),
                member: user("member-1"),
                due_date: NaiveDate::from_ymd_opt(2026, 10, 15).expect("valid date"),
                instructions: None,
            },
        )
        .expect("assignment succeeds");
    engine
        .submit_verification_report(
            &id,
            VerificationReportInput {
                actor: user("member-1"),
                assignment_id: nrcc_workflow::workflows::reclassification::AssignmentId(1),
                findings: "Traffic volumes below trunk thresholds".to_string(),
                visit_date: NaiveDate::from_ymd_opt(2026, 10, 2).expect("valid date"),
            },
        )
        .expect("report succeeds");
    engine
        .submit_recommendation(
            &id,
            RecommendationInput {
                actor: user("chair-1"),
                text: "The committee recommends refusal".to_string(),
            },
        )
        .expect("recommendation succeeds");

    let refused = engine
        .record_minister_decision(
            &id,
            DecisionInput {
                actor: user("minister-1"),
                decision: DecisionType::Disapprove,
                disapproval_type: Some(DisapprovalType::Refused),
                reason: "Traffic volumes do not justify the upgrade".to_string(),
            },
        )
        .expect("refusal succeeds");
    assert_eq!(refused.status, ApplicationStatus::DisapprovedRefused);
    assert!(refused.current_owner.is_none());

    engine
        .submit_appeal(
            &id,
            AppealInput {
                actor: user("board-1"),
                grounds: "Seasonal counts were excluded from the survey".to_string(),
            },
        )
        .expect("appeal succeeds");

    let closed = engine
        .decide_appeal(
            &id,
            AppealDecisionInput {
                actor: user("minister-1"),
                decision: DecisionType::Disapprove,
                reason: "The seasonal counts do not change the outcome".to_string(),
            },
        )
        .expect("appeal decision succeeds");

    assert_eq!(closed.status, ApplicationStatus::AppealRejected);
    assert!(closed.status.is_terminal());
    assert!(closed.open_appeal().is_none());
    let applicant_messages: Vec<_> = notifier
        .messages
        .lock()
        .expect("notifier mutex poisoned")
        .iter()
        .filter(|(recipient, _)| recipient.0 == "board-1")
        .map(|(_, message)| message.clone())
        .collect();
    assert!(applicant_messages.iter().any(|m| m.contains("rejected")));
}
