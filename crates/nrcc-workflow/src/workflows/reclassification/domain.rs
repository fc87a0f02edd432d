use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::audit::{ApprovalAction, AuditTrail};

/// Identifier wrapper for applications; wraps the human-readable application
/// number (e.g. `NRCC/2026/0001`) assigned at creation and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for registered users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-aggregate sequence number identifying a verification assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub u64);

impl std::fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of a user as referenced by the workflow: identity plus the role
/// held at the time of the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
    pub role: UserRole,
}

/// Roles participating in the reclassification pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    PublicApplicant,
    MemberOfParliament,
    RegionalRoadsBoardInitiator,
    RegionalAdministrativeSecretary,
    RegionalCommissioner,
    MinisterOfWorks,
    NrccChairperson,
    NrccMember,
    NrccSecretariat,
    MinistryLawyer,
    SystemAdministrator,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PublicApplicant => "Public Applicant",
            Self::MemberOfParliament => "Member of Parliament",
            Self::RegionalRoadsBoardInitiator => "Regional Roads Board Initiator",
            Self::RegionalAdministrativeSecretary => "Regional Administrative Secretary",
            Self::RegionalCommissioner => "Regional Commissioner",
            Self::MinisterOfWorks => "Minister of Works",
            Self::NrccChairperson => "NRCC Chairperson",
            Self::NrccMember => "NRCC Member",
            Self::NrccSecretariat => "NRCC Secretariat",
            Self::MinistryLawyer => "Ministry Lawyer",
            Self::SystemAdministrator => "System Administrator",
        }
    }
}

/// Fine-grained permissions gating workflow triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ApplicationCreate,
    ApplicationRead,
    ApplicationUpdate,
    ApplicationDelete,
    ApplicationSubmit,
    ApplicationList,
    ApplicationApprove,
    ApplicationReturn,
    ApplicationAssignVerification,
    ApplicationVerify,
    ApplicationRecommend,
    ApplicationDecide,
    ApplicationGazette,
    ApplicationAppeal,
}

/// Categories of applicants; the category decides the review chain taken at
/// submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantType {
    Individual,
    Group,
    MemberOfParliament,
    RegionalRoadsBoard,
}

impl ApplicantType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Individual => "Individual",
            Self::Group => "Group",
            Self::MemberOfParliament => "Member of Parliament",
            Self::RegionalRoadsBoard => "Regional Roads Board",
        }
    }

    /// Regional Roads Board submissions route through RAS and RC before the
    /// Minister; every other category goes directly to the Minister.
    pub const fn follows_board_route(self) -> bool {
        matches!(self, Self::RegionalRoadsBoard)
    }
}

/// National road classification ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    Trunk,
    Regional,
    District,
    Feeder,
    Urban,
    Community,
}

impl RoadClass {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Trunk => "Trunk Road",
            Self::Regional => "Regional Road",
            Self::District => "District Road",
            Self::Feeder => "Feeder Road",
            Self::Urban => "Urban Road",
            Self::Community => "Community Road",
        }
    }
}

/// Lifecycle states of a reclassification application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    ReturnedForCorrection,
    UnderRasReview,
    UnderRcReview,
    UnderMinisterReview,
    WithNrccChair,
    VerificationInProgress,
    NrccReviewMeeting,
    RecommendationSubmitted,
    PendingGazettement,
    Gazetted,
    DisapprovedRefused,
    DisapprovedDesignated,
    AppealSubmitted,
    AppealRejected,
    AppealClosed,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::ReturnedForCorrection => "Returned for Correction",
            Self::UnderRasReview => "Under RAS Review",
            Self::UnderRcReview => "Under RC Review",
            Self::UnderMinisterReview => "Under Minister Review",
            Self::WithNrccChair => "With NRCC Chair",
            Self::VerificationInProgress => "Verification in Progress",
            Self::NrccReviewMeeting => "NRCC Review Meeting",
            Self::RecommendationSubmitted => "Recommendation Submitted",
            Self::PendingGazettement => "Pending Gazettement",
            Self::Gazetted => "Gazetted",
            Self::DisapprovedRefused => "Disapproved - Refused",
            Self::DisapprovedDesignated => "Disapproved - Designated",
            Self::AppealSubmitted => "Appeal Submitted",
            Self::AppealRejected => "Appeal Rejected",
            Self::AppealClosed => "Appeal Closed",
        }
    }

    /// Terminal states have no outgoing transitions and no current owner.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Gazetted | Self::DisapprovedDesignated | Self::AppealRejected | Self::AppealClosed
        )
    }

    pub const fn is_editable_by_applicant(self) -> bool {
        matches!(self, Self::Draft | Self::ReturnedForCorrection)
    }

    pub const fn can_be_appealed(self) -> bool {
        matches!(self, Self::DisapprovedRefused)
    }

    pub const fn is_under_review(self) -> bool {
        matches!(
            self,
            Self::UnderRasReview
                | Self::UnderRcReview
                | Self::UnderMinisterReview
                | Self::WithNrccChair
                | Self::VerificationInProgress
                | Self::NrccReviewMeeting
        )
    }
}

/// Minister decision outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Approve,
    Disapprove,
}

/// Disapproval sub-type: a refused application may be appealed, a designated
/// one is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisapprovalType {
    Refused,
    Designated,
}

/// Verification assignment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Assigned,
    InProgress,
    Completed,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazettementStatus {
    Pending,
    Gazetted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealStatus {
    Submitted,
    UnderReview,
    Closed,
}

/// Fixed catalog of eligibility criteria, partitioned by the proposed class
/// they support (R-codes for regional, T-codes for trunk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EligibilityCriterion {
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    T1,
    T2,
    T3,
    T4,
    T5,
}

impl EligibilityCriterion {
    pub const fn code(self) -> &'static str {
        match self {
            Self::R1 => "R1",
            Self::R2 => "R2",
            Self::R3 => "R3",
            Self::R4 => "R4",
            Self::R5 => "R5",
            Self::R6 => "R6",
            Self::R7 => "R7",
            Self::T1 => "T1",
            Self::T2 => "T2",
            Self::T3 => "T3",
            Self::T4 => "T4",
            Self::T5 => "T5",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::R1 => "Directly joining any two or more existing district headquarters",
            Self::R2 => {
                "Linking a new district headquarters with an existing regional or district \
                 headquarters following creation of a new district"
            }
            Self::R3 => {
                "Linking a new regional headquarters with a new or existing district headquarters \
                 following the creation of a new region"
            }
            Self::R4 => {
                "A secondary national road that connects a trunk road and a district or regional \
                 headquarters"
            }
            Self::R5 => {
                "A secondary national road that connects a regional headquarters and a district \
                 headquarters"
            }
            Self::R6 => "Not forming a loop road connecting two points on the same regional road",
            Self::R7 => {
                "Not running parallel to an existing regional road connecting the same regional \
                 headquarters and the same district headquarters"
            }
            Self::T1 => {
                "Linking a new regional headquarters with an existing or another new regional \
                 headquarters following creation of a new region"
            }
            Self::T2 => "A primary national road linking two or more regional headquarters",
            Self::T3 => {
                "An international route that links regional headquarters and another major city, \
                 town, or major port outside the United Republic"
            }
            Self::T4 => {
                "Not running parallel to an existing trunk road connecting the same cities, towns \
                 or major port"
            }
            Self::T5 => "Not forming a loop road connecting two points on the same trunk road",
        }
    }

    pub const fn is_regional(self) -> bool {
        matches!(
            self,
            Self::R1 | Self::R2 | Self::R3 | Self::R4 | Self::R5 | Self::R6 | Self::R7
        )
    }

    pub const fn is_trunk(self) -> bool {
        !self.is_regional()
    }
}

/// One eligibility criterion selected by the applicant, with supporting
/// details and evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionSelection {
    pub criterion: EligibilityCriterion,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub evidence_description: Option<String>,
}

/// Technical description of the road under reclassification. Created with the
/// application; immutable once the application leaves an editable status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadFormData {
    pub road_name: String,
    pub road_length_km: f64,
    pub current_class: RoadClass,
    pub starting_point: String,
    pub terminal_point: String,
    pub reclassification_reasons: String,
    #[serde(default)]
    pub surface_type_carriageway: Option<String>,
    #[serde(default)]
    pub surface_type_shoulders: Option<String>,
    #[serde(default)]
    pub carriageway_width_m: Option<f64>,
    #[serde(default)]
    pub formation_width_m: Option<f64>,
    #[serde(default)]
    pub road_reserve_width_m: Option<f64>,
    #[serde(default)]
    pub traffic_level: Option<String>,
    #[serde(default)]
    pub traffic_composition: Option<String>,
    #[serde(default)]
    pub towns_villages_linked: Option<String>,
    #[serde(default)]
    pub principal_nodes: Option<String>,
    #[serde(default)]
    pub bus_routes: Option<String>,
    #[serde(default)]
    pub public_services: Option<String>,
    #[serde(default)]
    pub alternative_routes: Option<String>,
}

/// Field-verification task delegated to an NRCC member. Owns at most one
/// report, created exactly once when the assignee completes the visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationAssignment {
    pub id: AssignmentId,
    pub member: UserRef,
    pub assigned_by: UserRef,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub visit_date: Option<NaiveDate>,
    pub status: VerificationStatus,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub report: Option<VerificationReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub findings: String,
    pub visit_date: NaiveDate,
    pub submitted_at: DateTime<Utc>,
}

/// Committee output consumed by the final ministerial decision.
/// Only set by the submit-recommendation transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub text: String,
    pub submitted_by: UserRef,
    pub submitted_at: DateTime<Utc>,
}

/// Final ministerial decision. Only set by the record-decision transition;
/// replaced if the application re-enters the committee flow after a granted
/// appeal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinisterDecision {
    pub decision: DecisionType,
    pub disapproval_type: Option<DisapprovalType>,
    pub reason: String,
    pub decided_by: UserRef,
    pub decided_at: DateTime<Utc>,
}

/// Gazettement record. Only created by an approving ministerial decision;
/// gazette number and date are filled in by the update-gazettement transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gazettement {
    pub status: GazettementStatus,
    #[serde(default)]
    pub gazette_number: Option<String>,
    #[serde(default)]
    pub gazette_date: Option<NaiveDate>,
    #[serde(default)]
    pub processed_by: Option<UserRef>,
}

/// Appeal against a refusing ministerial decision. At most one appeal may be
/// open at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appeal {
    pub grounds: String,
    pub status: AppealStatus,
    pub appellant: UserRef,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub decision_reason: Option<String>,
    #[serde(default)]
    pub decided_by: Option<UserRef>,
    #[serde(default)]
    pub decided_at: Option<DateTime<Utc>>,
}

impl Appeal {
    pub fn is_open(&self) -> bool {
        self.status != AppealStatus::Closed
    }
}

/// Aggregate root for one reclassification request and its full lifecycle
/// state. Child records are created lazily by specific transitions; the audit
/// trail is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub applicant_type: ApplicantType,
    pub applicant: UserRef,
    pub proposed_class: RoadClass,
    pub status: ApplicationStatus,
    pub current_owner: Option<UserRef>,
    #[serde(default)]
    pub submission_date: Option<NaiveDate>,
    #[serde(default)]
    pub decision_date: Option<NaiveDate>,
    #[serde(default)]
    pub remarks: Option<String>,
    pub form_data: RoadFormData,
    pub eligibility: Vec<CriterionSelection>,
    pub audit: AuditTrail,
    pub verification_assignments: Vec<VerificationAssignment>,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
    #[serde(default)]
    pub decision: Option<MinisterDecision>,
    #[serde(default)]
    pub gazettement: Option<Gazettement>,
    pub appeals: Vec<Appeal>,
    /// Optimistic-lock counter, bumped by the store on every committed save.
    pub version: u64,
}

impl Application {
    pub fn applicant_is(&self, user: &UserId) -> bool {
        self.applicant.id == *user
    }

    /// Workflow-advance actions require the caller to hold the role of the
    /// current owner, not to be the exact owning user.
    pub fn owned_by_role(&self, role: UserRole) -> bool {
        self.current_owner
            .as_ref()
            .map(|owner| owner.role == role)
            .unwrap_or(false)
    }

    pub fn next_assignment_id(&self) -> AssignmentId {
        AssignmentId(self.verification_assignments.len() as u64 + 1)
    }

    pub fn assignment_mut(&mut self, id: AssignmentId) -> Option<&mut VerificationAssignment> {
        self.verification_assignments
            .iter_mut()
            .find(|assignment| assignment.id == id)
    }

    pub fn all_verifications_complete(&self) -> bool {
        !self.verification_assignments.is_empty()
            && self
                .verification_assignments
                .iter()
                .all(|assignment| assignment.status == VerificationStatus::Completed)
    }

    pub fn open_appeal(&self) -> Option<&Appeal> {
        self.appeals.iter().find(|appeal| appeal.is_open())
    }

    pub fn latest_appeal_mut(&mut self) -> Option<&mut Appeal> {
        self.appeals.last_mut()
    }

    /// Sanitized projection for API responses.
    pub fn view(&self) -> ApplicationView {
        ApplicationView {
            application_number: self.id.0.clone(),
            applicant_type: self.applicant_type.label(),
            applicant_name: self.applicant.name.clone(),
            proposed_class: self.proposed_class.label(),
            status: self.status,
            status_label: self.status.label(),
            current_owner: self.current_owner.as_ref().map(|owner| OwnerView {
                name: owner.name.clone(),
                role: owner.role,
            }),
            submission_date: self.submission_date,
            decision_date: self.decision_date,
            remarks: self.remarks.clone(),
            eligibility: self
                .eligibility
                .iter()
                .map(|selection| selection.criterion.code())
                .collect(),
            verification_assignments: self
                .verification_assignments
                .iter()
                .map(|assignment| VerificationView {
                    id: assignment.id,
                    member_name: assignment.member.name.clone(),
                    due_date: assignment.due_date,
                    status: assignment.status,
                    report_submitted: assignment.report.is_some(),
                })
                .collect(),
            recommendation: self
                .recommendation
                .as_ref()
                .map(|recommendation| recommendation.text.clone()),
            decision: self.decision.as_ref().map(|decision| DecisionView {
                decision: decision.decision,
                disapproval_type: decision.disapproval_type,
                reason: decision.reason.clone(),
            }),
            gazettement: self.gazettement.as_ref().map(|gazettement| GazettementView {
                status: gazettement.status,
                gazette_number: gazettement.gazette_number.clone(),
                gazette_date: gazettement.gazette_date,
            }),
            appeals: self
                .appeals
                .iter()
                .map(|appeal| AppealView {
                    status: appeal.status,
                    grounds: appeal.grounds.clone(),
                    decision_reason: appeal.decision_reason.clone(),
                })
                .collect(),
            history: self.audit.entries().iter().map(ApprovalAction::view).collect(),
        }
    }
}

/// Projection of an application exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub application_number: String,
    pub applicant_type: &'static str,
    pub applicant_name: String,
    pub proposed_class: &'static str,
    pub status: ApplicationStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_owner: Option<OwnerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub eligibility: Vec<&'static str>,
    pub verification_assignments: Vec<VerificationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<DecisionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gazettement: Option<GazettementView>,
    pub appeals: Vec<AppealView>,
    pub history: Vec<ApprovalActionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerView {
    pub name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationView {
    pub id: AssignmentId,
    pub member_name: String,
    pub due_date: NaiveDate,
    pub status: VerificationStatus,
    pub report_submitted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionView {
    pub decision: DecisionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disapproval_type: Option<DisapprovalType>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GazettementView {
    pub status: GazettementStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gazette_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gazette_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppealView {
    pub status: AppealStatus,
    pub grounds: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_reason: Option<String>,
}

/// One row of the approval history as exposed over the API.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalActionView {
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<ApplicationStatus>,
    pub to_status: ApplicationStatus,
    pub actor_name: String,
    pub actor_role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
