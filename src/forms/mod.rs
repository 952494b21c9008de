//! Add-record forms: transient field state, a derived validity predicate
//! and a gated save that hands one [`crate::store::SaveBundle`] to the
//! store.

use crate::AppError;

mod household;
mod pet;
mod plant;
mod vehicle;

pub use household::HouseholdItemForm;
pub use pet::PetForm;
pub use plant::PlantForm;
pub use vehicle::VehicleForm;

/// Days before a warranty/insurance/registration deadline that the derived
/// reminder fires.
pub const EXPIRY_LEAD_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Succeeded,
}

/// Tri-state the screen binds to. `Saving` ends when the in-flight save
/// completes or is dropped; failures return to `Idle` with the store's
/// message attached.
#[derive(Debug, Clone, Default)]
pub struct SaveStatus {
    state: SaveState,
    error: Option<String>,
}

impl SaveStatus {
    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_saving(&self) -> bool {
        self.state == SaveState::Saving
    }

    /// Enters `Saving` and returns a guard that must be resolved with
    /// [`SaveGuard::succeed`] or [`SaveGuard::fail`]. Dropping the guard
    /// unresolved (the save future was cancelled) restores `Idle` so the
    /// form never stays wedged behind the in-flight gate.
    pub(crate) fn begin(&mut self) -> SaveGuard<'_> {
        self.state = SaveState::Saving;
        self.error = None;
        SaveGuard {
            status: self,
            finished: false,
        }
    }
}

pub(crate) struct SaveGuard<'a> {
    status: &'a mut SaveStatus,
    finished: bool,
}

impl SaveGuard<'_> {
    pub(crate) fn succeed(mut self) {
        self.status.state = SaveState::Succeeded;
        self.finished = true;
    }

    pub(crate) fn fail(mut self, error: AppError) {
        self.status.state = SaveState::Idle;
        self.status.error = Some(error.message().to_string());
        self.finished = true;
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.status.state = SaveState::Idle;
        }
    }
}

/// Empty text inputs persist as NULL, not as "".
pub(crate) fn blank_to_none(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Numeric text inputs fall back to a default instead of blocking the save.
pub(crate) fn parse_i64_or(s: &str, default: i64) -> i64 {
    s.trim().parse().unwrap_or(default)
}

pub(crate) fn parse_f64_or(s: &str, default: f64) -> f64 {
    s.trim().parse().unwrap_or(default)
}
