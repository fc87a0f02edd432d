use metrics_exporter_prometheus::PrometheusHandle;
use nrcc_workflow::workflows::reclassification::{
    Notifier, NotifyError, UserDirectory, UserId, UserRef, UserRole,
};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

// The in-memory store ships with the workflow crate so its optimistic-lock
// semantics live in one place.
pub(crate) use nrcc_workflow::workflows::reclassification::InMemoryApplicationStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryUserDirectory {
    users: Arc<Mutex<Vec<UserRef>>>,
}

impl InMemoryUserDirectory {
    pub(crate) fn register(&self, id: &str, name: &str, role: UserRole) {
        let mut guard = self.users.lock().expect("directory mutex poisoned");
        guard.push(UserRef {
            id: UserId(id.to_string()),
            name: name.to_string(),
            role,
        });
    }
}

impl UserDirectory for InMemoryUserDirectory {
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

/// One seeded holder per routing role plus sample applicants, so the demo
/// and a freshly started service have a complete cast.
pub(crate) fn seeded_directory() -> InMemoryUserDirectory {
    let directory = InMemoryUserDirectory::default();
    let cast = [
        ("applicant-1", "Asha Mkude", UserRole::PublicApplicant),
        ("mp-1", "Hon. Juma Kassim", UserRole::MemberOfParliament),
        ("board-1", "Pwani Roads Board", UserRole::RegionalRoadsBoardInitiator),
        ("ras-1", "Neema Shirima", UserRole::RegionalAdministrativeSecretary),
        ("rc-1", "Daniel Lyimo", UserRole::RegionalCommissioner),
        ("minister-1", "Hon. Grace Mallya", UserRole::MinisterOfWorks),
        ("chair-1", "Eng. Baraka Nnko", UserRole::NrccChairperson),
        ("member-1", "Eng. Rehema Swai", UserRole::NrccMember),
        ("member-2", "Eng. Peter Msaki", UserRole::NrccMember),
        ("secretariat-1", "Fatma Hussein", UserRole::NrccSecretariat),
        ("lawyer-1", "Adv. Samwel Kileo", UserRole::MinistryLawyer),
    ];
    for (id, name, role) in cast {
        directory.register(id, name, role);
    }
    directory
}

/// Logs outbound notifications instead of delivering them. A real deployment
/// swaps in an email or SMS transport behind the same trait.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn notify(&self, recipient: &UserId, message: &str) -> Result<(), NotifyError> {
        info!(recipient = %recipient, message, "workflow notification");
        Ok(())
    }
}
