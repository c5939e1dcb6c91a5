//! Shared validation state consumed by a UI layer.
//!
//! # Design
//! [`Validator`] holds field errors plus the `processing`/`successful`
//! flags for one logical request scope (typically one form). It is shared
//! explicitly: [`SharedValidator`] is a cheap clone handle, and every
//! proxy that should feed the same form state receives a clone at
//! construction time. There is no process-wide singleton and no dual
//! write path — one authoritative object per scope.
//!
//! Per submission the state moves `idle → processing → {successful |
//! failed-with-errors | failed-without-errors}`; terminal states are only
//! reset by the next submission's flush. Concurrent submissions sharing a
//! handle interleave last-writer-wins; callers observing the flags must
//! serialize, or treat them as best-effort UI feedback.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Field name → ordered list of messages.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Validation state for one request scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validator {
    pub errors: ErrorMap,
    pub processing: bool,
    pub successful: bool,
}

impl Validator {
    /// Merge field errors in, overwriting per-field entries.
    pub fn fill(&mut self, errors: ErrorMap) {
        for (field, messages) in errors {
            self.errors.insert(field, messages);
        }
    }

    /// Clear all errors and reset both flags.
    pub fn flush(&mut self) {
        self.errors.clear();
        self.processing = false;
        self.successful = false;
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// First message recorded for a field.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.errors
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn any(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Cloneable handle to a [`Validator`] shared between proxies and a UI.
#[derive(Debug, Clone, Default)]
pub struct SharedValidator(Arc<Mutex<Validator>>);

impl SharedValidator {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means a panicking thread left ordinary flag
    // values behind; the state is still usable.
    fn lock(&self) -> MutexGuard<'_, Validator> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fill(&self, errors: ErrorMap) {
        self.lock().fill(errors);
    }

    pub fn flush(&self) {
        self.lock().flush();
    }

    pub fn processing(&self) -> bool {
        self.lock().processing
    }

    pub fn successful(&self) -> bool {
        self.lock().successful
    }

    pub fn has(&self, field: &str) -> bool {
        self.lock().has(field)
    }

    pub fn first(&self, field: &str) -> Option<String> {
        self.lock().first(field).map(str::to_string)
    }

    pub fn any(&self) -> bool {
        self.lock().any()
    }

    /// Owned copy of the current state, for assertions and rendering.
    pub fn snapshot(&self) -> Validator {
        self.lock().clone()
    }

    /// Submission start: drop stale errors, raise `processing`.
    pub(crate) fn begin_submission(&self) {
        let mut state = self.lock();
        state.flush();
        state.processing = true;
        state.successful = false;
    }

    /// Submission succeeded.
    pub(crate) fn end_success(&self) {
        let mut state = self.lock();
        state.processing = false;
        state.successful = true;
    }

    /// Submission failed. Field errors are merged only for validation
    /// failures; connectivity and other transport errors leave the map
    /// untouched.
    pub(crate) fn end_failure(&self, errors: Option<ErrorMap>) {
        let mut state = self.lock();
        state.processing = false;
        if let Some(errors) = errors {
            state.successful = false;
            state.fill(errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(field: &str, message: &str) -> ErrorMap {
        ErrorMap::from([(field.to_string(), vec![message.to_string()])])
    }

    #[test]
    fn fill_merges_and_overwrites_per_field() {
        let mut validator = Validator::default();
        validator.fill(one("name", "required"));
        validator.fill(one("email", "invalid"));
        assert!(validator.has("name"));
        assert!(validator.has("email"));

        validator.fill(one("name", "too short"));
        assert_eq!(validator.first("name"), Some("too short"));
        assert_eq!(validator.first("email"), Some("invalid"));
    }

    #[test]
    fn flush_clears_errors_and_flags() {
        let mut validator = Validator::default();
        validator.fill(one("name", "required"));
        validator.processing = true;
        validator.successful = true;
        validator.flush();
        assert!(!validator.any());
        assert!(!validator.processing);
        assert!(!validator.successful);
    }

    #[test]
    fn begin_submission_resets_then_raises_processing() {
        let shared = SharedValidator::new();
        shared.fill(one("name", "stale"));
        shared.begin_submission();
        assert!(shared.processing());
        assert!(!shared.successful());
        assert!(!shared.any());
    }

    #[test]
    fn end_success_flips_flags() {
        let shared = SharedValidator::new();
        shared.begin_submission();
        shared.end_success();
        assert!(!shared.processing());
        assert!(shared.successful());
    }

    #[test]
    fn end_failure_with_errors_fills_the_map() {
        let shared = SharedValidator::new();
        shared.begin_submission();
        shared.end_failure(Some(one("name", "required")));
        assert!(!shared.processing());
        assert!(!shared.successful());
        assert_eq!(shared.first("name"), Some("required".to_string()));
    }

    #[test]
    fn end_failure_without_errors_only_clears_processing() {
        let shared = SharedValidator::new();
        shared.begin_submission();
        shared.end_failure(None);
        assert!(!shared.processing());
        assert!(!shared.any());
    }

    #[test]
    fn clones_share_the_same_state() {
        let shared = SharedValidator::new();
        let other = shared.clone();
        shared.fill(one("name", "required"));
        assert!(other.has("name"));
    }
}
