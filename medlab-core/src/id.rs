use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Prefix of every container identifier
pub const CONTAINER_TAG: &str = "CON";
/// Role tag inserted between a container ID and its pallet number
pub const PALLET_TAG: &str = "-PAL";
/// Role tag inserted between a pallet ID and its case index
pub const CASE_TAG: &str = "-CASE";
/// Role tag inserted between a case ID and its unit index
pub const UNIT_TAG: &str = "-UNIT";

// ContainerId identifies a container record and is also its ledger key.
// It is an opaque string on the wire; containers produced by the hierarchy
// generator look like `CON<k>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for ContainerId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContainerId {
    fn from(id: String) -> Self {
        ContainerId(id)
    }
}

impl From<&str> for ContainerId {
    fn from(id: &str) -> Self {
        ContainerId(id.to_string())
    }
}

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        ContainerId(id.into())
    }

    /// Container ID for the given container sequence number (`CON<seq>`)
    pub fn from_sequence(seq: u64) -> Self {
        ContainerId(format!("{}{}", CONTAINER_TAG, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Pallet ID derived from its container and the running global pallet number
pub fn pallet_id(container_id: &ContainerId, pallet_number: u64) -> String {
    format!("{}{}{}", container_id, PALLET_TAG, pallet_number)
}

/// Case ID derived from its pallet and a 1-based index within that pallet
pub fn case_id(pallet_id: &str, index: usize) -> String {
    format!("{}{}{}", pallet_id, CASE_TAG, index)
}

/// Unit ID derived from its case and a 1-based index within that case
pub fn unit_id(case_id: &str, index: usize) -> String {
    format!("{}{}{}", case_id, UNIT_TAG, index)
}
