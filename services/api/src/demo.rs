use crate::infra::{
    seeded_directory, InMemoryApplicationStore, InMemoryUserDirectory, LoggingNotifier,
};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use nrcc_workflow::error::AppError;
use nrcc_workflow::workflows::reclassification::{
    ActionInput, AppealDecisionInput, AppealInput, ApplicantType, Application, ApplicationId,
    AssignmentId, CreateApplication, CriterionSelection, DecisionInput, DecisionType,
    DisapprovalType, EligibilityCriterion, GazettementUpdate, RecommendationInput,
    ReclassificationEngine, RoadClass, RoadFormData, RolePermissionPolicy, UserId,
    VerificationReportInput, VerificationRequest, WorkflowConfig,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Verification due date (YYYY-MM-DD). Defaults to today + 21 days.
    #[arg(long)]
    pub(crate) due_date: Option<NaiveDate>,
    /// Walk the refusal-and-appeal branch instead of the approval branch.
    #[arg(long)]
    pub(crate) refuse: bool,
}

type DemoEngine =
    ReclassificationEngine<InMemoryApplicationStore, InMemoryUserDirectory, LoggingNotifier>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let due_date = args
        .due_date
        .unwrap_or_else(|| Local::now().date_naive() + Duration::days(21));

    let engine = ReclassificationEngine::new(
        Arc::new(InMemoryApplicationStore::default()),
        Arc::new(seeded_directory()),
        Arc::new(LoggingNotifier),
        Arc::new(RolePermissionPolicy),
        WorkflowConfig::default(),
    );

    println!("Road reclassification workflow demo");
    println!("===================================");

    let created = engine.create(demo_application())?;
    print_step("Board initiator files the application", &created);

    let id = created.id.clone();
    let submitted = engine.submit(&id, action("board-1"))?;
    print_step("Application submitted into the board route", &submitted);

    let after_ras = engine.ras_approve(&id, action("ras-1"))?;
    print_step("Regional Administrative Secretary approves", &after_ras);

    let after_rc = engine.rc_approve(&id, action("rc-1"))?;
    print_step("Regional Commissioner approves", &after_rc);

    let forwarded = engine.forward_to_chair(&id, action("minister-1"))?;
    print_step("Minister forwards the file to the NRCC chair", &forwarded);

    for member in ["member-1", "member-2"] {
        let assigned = engine.assign_verification(
            &id,
            VerificationRequest {
                actor: UserId("chair-1".to_string()),
                member: UserId(member.to_string()),
                due_date,
                instructions: Some("Verify alignment, traffic, and structures".to_string()),
            },
        )?;
        print_step(&format!("Chair assigns field verification to {member}"), &assigned);
    }

    let visit_date = Local::now().date_naive();
    for (member, assignment_id, findings) in [
        ("member-1", 1, "Alignment confirmed against the network map"),
        ("member-2", 2, "Traffic counts support the proposed class"),
    ] {
        let after_report = engine.submit_verification_report(
            &id,
            VerificationReportInput {
                actor: UserId(member.to_string()),
                assignment_id: AssignmentId(assignment_id),
                findings: findings.to_string(),
                visit_date,
            },
        )?;
        print_step(&format!("{member} submits a verification report"), &after_report);
    }

    let recommended = engine.submit_recommendation(
        &id,
        RecommendationInput {
            actor: UserId("chair-1".to_string()),
            text: "The committee recommends the reclassification".to_string(),
        },
    )?;
    print_step("NRCC review meeting submits its recommendation", &recommended);

    if args.refuse {
        run_refusal_branch(&engine, &id)?;
    } else {
        run_approval_branch(&engine, &id)?;
    }

    Ok(())
}

fn run_approval_branch(engine: &DemoEngine, id: &ApplicationId) -> Result<(), AppError> {
    let decided = engine.record_minister_decision(
        id,
        DecisionInput {
            actor: UserId("minister-1".to_string()),
            decision: DecisionType::Approve,
            disapproval_type: None,
            reason: "Meets the trunk eligibility criteria".to_string(),
        },
    )?;
    print_step("Minister approves the application", &decided);

    let gazetted = engine.update_gazettement(
        id,
        GazettementUpdate {
            actor: UserId("lawyer-1".to_string()),
            gazette_number: "GN 512".to_string(),
            gazette_date: Local::now().date_naive(),
        },
    )?;
    print_step("Ministry lawyer records the gazettement", &gazetted);

    println!("\nFinal history:");
    print_history(&gazetted);
    Ok(())
}

fn run_refusal_branch(engine: &DemoEngine, id: &ApplicationId) -> Result<(), AppError> {
    let refused = engine.record_minister_decision(
        id,
        DecisionInput {
            actor: UserId("minister-1".to_string()),
            decision: DecisionType::Disapprove,
            disapproval_type: Some(DisapprovalType::Refused),
            reason: "Traffic volumes fall short of the trunk threshold".to_string(),
        },
    )?;
    print_step("Minister refuses the application", &refused);

    let appealed = engine.submit_appeal(
        id,
        AppealInput {
            actor: UserId("board-1".to_string()),
            grounds: "The survey excluded seasonal harvest traffic".to_string(),
        },
    )?;
    print_step("Board initiator lodges an appeal", &appealed);

    let closed = engine.decide_appeal(
        id,
        AppealDecisionInput {
            actor: UserId("minister-1".to_string()),
            decision: DecisionType::Disapprove,
            reason: "Seasonal counts do not change the outcome".to_string(),
        },
    )?;
    print_step("Minister rejects the appeal", &closed);

    println!("\nFinal history:");
    print_history(&closed);
    Ok(())
}

fn print_step(title: &str, application: &Application) {
    let owner = application
        .current_owner
        .as_ref()
        .map(|owner| format!("{} ({})", owner.name, owner.role.label()))
        .unwrap_or_else(|| "none".to_string());
    println!(
        "\n{title}\n  number: {}\n  status: {}\n  owner:  {owner}",
        application.id,
        application.status.label(),
    );
}

fn print_history(application: &Application) {
    for entry in application.audit.entries() {
        let from = entry
            .from_status
            .map(|status| status.label())
            .unwrap_or("-");
        println!(
            "  {:>13}  {} -> {}  by {}",
            entry.action.label(),
            from,
            entry.to_status.label(),
            entry.actor.name,
        );
    }
}

fn action(actor: &str) -> ActionInput {
    ActionInput {
        actor: UserId(actor.to_string()),
        comments: None,
    }
}

fn demo_application() -> CreateApplication {
    CreateApplication {
        actor: UserId("board-1".to_string()),
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
            principal_nodes: Some("Tanga port junction".to_string()),
            bus_routes: Some("Six daily routes".to_string()),
            public_services: Some("Two hospitals, port access".to_string()),
            alternative_routes: None,
        },
        eligibility: vec![CriterionSelection {
            criterion: EligibilityCriterion::T2,
            details: Some("Links Tanga and Pangani regional headquarters".to_string()),
            evidence_description: Some("Network map, annex A".to_string()),
        }],
        remarks: Some("Filed on behalf of the Pwani Regional Roads Board".to_string()),
    }
}
