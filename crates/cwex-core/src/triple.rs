//! Machine identity triples.
//!
//! A machine is identified by `(location, branch, machine_number)`. Each
//! field becomes one level of the machine's MQTT topic, so the separator
//! and the wildcard characters are rejected up front.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Characters that would break a topic level.
const RESERVED_CHARS: [char; 3] = ['/', '+', '#'];

/// The unique identity of a machine record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineTriple {
    pub location: String,
    pub branch: String,
    pub machine_number: String,
}

impl MachineTriple {
    /// Build a triple, validating every field.
    pub fn new(
        location: impl Into<String>,
        branch: impl Into<String>,
        machine_number: impl Into<String>,
    ) -> Result<Self> {
        let triple = Self {
            location: location.into(),
            branch: branch.into(),
            machine_number: machine_number.into(),
        };
        triple.validate()?;
        Ok(triple)
    }

    /// Check every field against the topic-level rules.
    pub fn validate(&self) -> Result<()> {
        validate_field("location", &self.location)?;
        validate_field("branch", &self.branch)?;
        validate_field("machineNumber", &self.machine_number)
    }

    /// Overlay the fields present in `patch` on top of this triple.
    pub fn merged(&self, patch: &TriplePatch) -> Self {
        Self {
            location: patch
                .location
                .clone()
                .unwrap_or_else(|| self.location.clone()),
            branch: patch.branch.clone().unwrap_or_else(|| self.branch.clone()),
            machine_number: patch
                .machine_number
                .clone()
                .unwrap_or_else(|| self.machine_number.clone()),
        }
    }
}

/// A partial update of a triple. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriplePatch {
    pub location: Option<String>,
    pub branch: Option<String>,
    pub machine_number: Option<String>,
}

impl TriplePatch {
    pub const fn is_empty(&self) -> bool {
        self.location.is_none() && self.branch.is_none() && self.machine_number.is_none()
    }
}

fn validate_field(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidField {
            field,
            reason: "must not be empty",
        });
    }
    if value.contains(RESERVED_CHARS) {
        return Err(Error::InvalidField {
            field,
            reason: "must not contain '/', '+' or '#'",
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn nyc() -> MachineTriple {
        MachineTriple::new("NYC", "5th", "12").unwrap()
    }

    #[test]
    fn rejects_empty_fields() {
        let err = MachineTriple::new("NYC", "  ", "12").unwrap_err();
        assert!(matches!(err, Error::InvalidField { field: "branch", .. }));
    }

    #[test]
    fn rejects_topic_reserved_chars() {
        for bad in ["a/b", "a+", "#"] {
            let err = MachineTriple::new(bad, "5th", "12").unwrap_err();
            assert!(matches!(err, Error::InvalidField { field: "location", .. }));
        }
        assert!(MachineTriple::new("NYC", "5th", "1/2").is_err());
    }

    #[test]
    fn merged_overwrites_only_present_fields() {
        let patch = TriplePatch {
            machine_number: Some("13".into()),
            ..TriplePatch::default()
        };
        let merged = nyc().merged(&patch);

        assert_eq!(merged.location, "NYC");
        assert_eq!(merged.branch, "5th");
        assert_eq!(merged.machine_number, "13");
    }

    #[test]
    fn empty_patch_merges_to_self() {
        let patch = TriplePatch::default();
        assert!(patch.is_empty());
        assert_eq!(nyc().merged(&patch), nyc());
    }

    #[test]
    fn serializes_with_camel_case_machine_number() {
        let json = serde_json::to_value(nyc()).unwrap();
        assert_eq!(json["machineNumber"], "12");
    }
}
