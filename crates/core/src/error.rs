use crate::types::DbId;

/// Domain error taxonomy for the check-in engine.
///
/// The HTTP layer maps each variant to a status code and a stable
/// machine-readable `code` string; see `frontdesk-api`'s `AppError`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Command not valid in the session's current state. Client bug or
    /// stale UI; surfaced verbatim so the device can re-sync.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Lost the selection confirm race. The losing side should refresh
    /// and follow the winning proposal.
    #[error("Selection already locked")]
    AlreadyLocked,

    /// The allocator found no eligible unit for the requested tier.
    /// Surfaced to trigger the waitlist fallback path.
    #[error("{0}")]
    NoAvailableResource(String),

    /// Lost a last-moment allocation race. Retryable after re-fetching
    /// availability.
    #[error("Assignment failed: {0}")]
    AssignmentFailed(String),

    /// Customer is ineligible to check in. Fatal for this lane session;
    /// requires the staff override path.
    #[error("Customer is banned: {0}")]
    Banned(String),

    /// Request arrived from an unknown or disabled device token.
    /// Rejected before any engine code runs.
    #[error("Device is disabled or unknown")]
    DeviceDisabled,

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
