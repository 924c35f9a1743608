/// Auth Manager - Field validation for submitted entities.
use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::GroupEntity;

/// Maximum length of a group name, matching the `groups.name` column.
pub const MAX_NAME_LENGTH: usize = 100;

/// Field name to error messages. Valid when no field has an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResults {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Errors recorded for `field`, in the order they were added.
    pub fn errors_for_field(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }
}

/// Checks a group before it is saved.
pub trait GroupValidation {
    fn validate(&self, group: &GroupEntity) -> ValidationResults;
}

/// Default group rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupRules;

impl GroupValidation for GroupRules {
    fn validate(&self, group: &GroupEntity) -> ValidationResults {
        let mut results = ValidationResults::new();
        let name = group.name.trim();

        if name.is_empty() {
            results.add_error("name", "Name is required");
            return results;
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            results.add_error("name", "Name must be 100 characters or fewer");
        }
        // Names are path segments in /groups/detail/{name}
        if name.chars().any(|c| c == '/' || c.is_control()) {
            results.add_error("name", "Name may not contain slashes or control characters");
        }

        results
    }
}
