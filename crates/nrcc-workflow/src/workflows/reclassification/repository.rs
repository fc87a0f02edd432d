use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::domain::{Application, ApplicationId, Permission, UserId, UserRef, UserRole};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("application {0} already exists")]
    Conflict(ApplicationId),
    #[error("application {0} not found")]
    NotFound(ApplicationId),
    #[error("application {0} was modified concurrently")]
    VersionConflict(ApplicationId),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Persistence seam for the application aggregate.
///
/// `update` must check the caller's `version` against the stored one, reject
/// with `VersionConflict` on mismatch, and bump the version on success. The
/// whole aggregate is saved in one call so a transition commits atomically.
pub trait ApplicationStore: Send + Sync + 'static {
    fn insert(&self, application: Application) -> Result<Application, StoreError>;
    fn update(&self, application: Application) -> Result<Application, StoreError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;
    fn count(&self) -> Result<u64, StoreError>;
    fn remove(&self, id: &ApplicationId) -> Result<(), StoreError>;
}

/// In-memory `ApplicationStore` carrying the version-check contract. Backs
/// the service until a registry database is wired up, and keeps the
/// optimistic-lock semantics in one place for the test suites.
#[derive(Default, Clone)]
pub struct InMemoryApplicationStore {
    records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(StoreError::Conflict(application.id));
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, mut application: Application) -> Result<Application, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let existing = guard
            .get(&application.id)
            .ok_or_else(|| StoreError::NotFound(application.id.clone()))?;
        if existing.version != application.version {
            return Err(StoreError::VersionConflict(application.id));
        }
        application.version += 1;
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn count(&self) -> Result<u64, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.len() as u64)
    }

    fn remove(&self, id: &ApplicationId) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

/// Lookup of registered users by identity or role.
///
/// `find_active_by_role` returns the designated active holder of a role;
/// deployments are expected to keep exactly one active holder per routing
/// role.
pub trait UserDirectory: Send + Sync + 'static {
    fn find_by_id(&self, id: &UserId) -> Option<UserRef>;
    fn find_active_by_role(&self, role: UserRole) -> Option<UserRef>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),
}

/// Outbound notification seam. Failures are logged by the engine and never
/// abort a transition.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, recipient: &UserId, message: &str) -> Result<(), NotifyError>;
}

/// Decides whether a role holds a permission.
pub trait AccessPolicy: Send + Sync + 'static {
    fn allows(&self, role: UserRole, permission: Permission) -> bool;
}

/// Static role-to-permission table used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePermissionPolicy;

impl AccessPolicy for RolePermissionPolicy {
    fn allows(&self, role: UserRole, permission: Permission) -> bool {
        use Permission::*;
        use UserRole::*;

        let granted: &[Permission] = match role {
            PublicApplicant | MemberOfParliament | RegionalRoadsBoardInitiator => &[
                ApplicationCreate,
                ApplicationRead,
                ApplicationUpdate,
                ApplicationDelete,
                ApplicationSubmit,
                ApplicationAppeal,
            ],
            RegionalAdministrativeSecretary | RegionalCommissioner => {
                &[ApplicationRead, ApplicationList, ApplicationApprove, ApplicationReturn]
            }
            MinisterOfWorks => &[
                ApplicationRead,
                ApplicationList,
                ApplicationApprove,
                ApplicationReturn,
                ApplicationDecide,
            ],
            NrccChairperson => &[
                ApplicationRead,
                ApplicationList,
                ApplicationReturn,
                ApplicationAssignVerification,
                ApplicationRecommend,
            ],
            NrccMember => &[ApplicationRead, ApplicationList, ApplicationVerify],
            NrccSecretariat => &[ApplicationRead, ApplicationList, ApplicationRecommend],
            MinistryLawyer => &[ApplicationRead, ApplicationList, ApplicationGazette],
            SystemAdministrator => &[
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
            ],
        };
        granted.contains(&permission)
    }
}
