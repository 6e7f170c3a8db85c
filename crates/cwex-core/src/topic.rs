//! MQTT topic paths and command payloads.

use std::fmt;

use crate::triple::MachineTriple;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "@msg";

/// Final topic level machines subscribe to for work.
const TASK_LEVEL: &str = "task";

/// The task topic of one machine:
/// `<namespace>/<location>/<branch>/<machineNumber>/task`.
///
/// Always derived from the current record, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPath(String);

impl TopicPath {
    pub fn for_machine(namespace: &str, triple: &MachineTriple) -> Self {
        Self(format!(
            "{namespace}/{}/{}/{}/{TASK_LEVEL}",
            triple.location, triple.branch, triple.machine_number
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payload of the "blink" command: `on <amount>`.
pub fn blink_payload(amount: u32) -> String {
    format!("on {amount}")
}
