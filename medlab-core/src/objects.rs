use crate::error::{LedgerError, StorageError};
use crate::id::ContainerId;
use serde::{Deserialize, Deserializer, Serialize};

/// Ledger key of the singleton ID counter
pub const UNIQUE_ID_COUNTER: &str = "UniqueIDCounter";

/// Ledger key of the singleton owner index
pub const CONTAINER_OWNER: &str = "ContainerOwner";

/// Transit status stamped on a container by a shipment
pub const STATUS_SHIPPED: &str = "shipped";

/// Number of pallets in a container, cases in a pallet and units in a case
pub const FAN_OUT: usize = 3;

// Lists written by older clients may be `null` rather than `[]`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Record that can be stored under a ledger key as JSON
pub trait LedgerRecord: Serialize + for<'de> Deserialize<'de> {
    /// Encode the record for the ledger store
    fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        serde_json::to_vec(self)
            .map_err(|e| LedgerError::Store(StorageError::Serialization(e.to_string())))
    }

    /// Decode a record read from the ledger store or received from a caller
    ///
    /// Only a JSON object is accepted. serde would otherwise fill a struct
    /// from an array by position.
    fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if !value.is_object() {
            return Err(LedgerError::Deserialization(format!(
                "expected a JSON object, found {}",
                json_kind(&value)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Singleton counter holding the highest container and pallet numbers handed out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueIdCounter {
    #[serde(rename = "ContainerMaxID", default)]
    pub container_max_id: u64,

    #[serde(rename = "PalletMaxID", default)]
    pub pallet_max_id: u64,
}

impl LedgerRecord for UniqueIdCounter {}

impl UniqueIdCounter {
    /// Counter after claiming one more container and its pallets
    pub fn advanced(self) -> Self {
        Self {
            container_max_id: self.container_max_id + 1,
            pallet_max_id: self.pallet_max_id + FAN_OUT as u64,
        }
    }

    /// Sequence number the next container will receive
    pub fn next_container_sequence(&self) -> u64 {
        self.container_max_id + 1
    }

    /// First pallet number the next container will receive
    pub fn next_pallet_base(&self) -> u64 {
        self.pallet_max_id + 1
    }
}

/// A shipping container with its packaging hierarchy and custody history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    pub container_id: ContainerId,

    /// Reserved for container nesting
    pub parent_container_id: String,

    /// Reserved for container nesting
    #[serde(rename = "child_container_id", deserialize_with = "null_as_default")]
    pub child_container_ids: Vec<String>,

    /// Party the container is ultimately addressed to
    #[serde(rename = "logistics_id")]
    pub recipient: String,

    pub elements: ContainerElements,

    pub provenance: ContainerProvenance,

    pub certified_by: String,

    pub address: String,

    /// Unit serial number
    pub usn: String,

    pub shipment_date: String,

    pub invoice_number: String,

    pub remarks: String,
}

impl LedgerRecord for Container {}

impl Container {
    /// Create an otherwise empty container around a packaging hierarchy
    pub fn with_elements(container_id: ContainerId, elements: ContainerElements) -> Self {
        Self {
            container_id,
            elements,
            ..Default::default()
        }
    }

    /// Iterate over every unit in the container, pallet by pallet
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.elements
            .pallets
            .iter()
            .flat_map(|pallet| pallet.cases.iter())
            .flat_map(|case| case.units.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerElements {
    #[serde(deserialize_with = "null_as_default")]
    pub pallets: Vec<Pallet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pallet {
    pub pallet_id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub cases: Vec<Case>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Case {
    pub case_id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub units: Vec<Unit>,
}

/// A single dosage unit. Everything but the ID is filled in later in the
/// unit's lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Unit {
    pub drug_id: String,
    pub drug_name: String,
    pub unit_id: String,
    pub expiry_date: String,
    pub health_status: String,
    pub batch_number: String,
    pub lot_number: String,
    pub sale_status: String,
    pub consumer_name: String,
}

impl Unit {
    pub fn new(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            ..Default::default()
        }
    }
}

/// Custody history of a container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerProvenance {
    #[serde(rename = "TransitStatus")]
    pub transit_status: String,

    #[serde(rename = "Sender")]
    pub sender: String,

    #[serde(rename = "Receiver")]
    pub receiver: String,

    /// Append-only log of custody transfers
    #[serde(rename = "Supplychain", deserialize_with = "null_as_default")]
    pub supplychain: Vec<ChainActivity>,
}

impl ContainerProvenance {
    /// Provenance whose only history is a single hand-over
    pub fn single_hop(activity: ChainActivity) -> Self {
        let mut provenance = Self::default();
        provenance.record(activity);
        provenance
    }

    /// Append a custody transfer and make it the current transit state
    pub fn record(&mut self, activity: ChainActivity) {
        self.transit_status = activity.status.clone();
        self.sender = activity.sender.clone();
        self.receiver = activity.receiver.clone();
        self.supplychain.push(activity);
    }
}

/// One hand-over in a container's supply chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainActivity {
    #[serde(rename = "Sender")]
    pub sender: String,

    #[serde(rename = "Receiver")]
    pub receiver: String,

    #[serde(rename = "Status")]
    pub status: String,
}

impl ChainActivity {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            status: status.into(),
        }
    }
}

/// Singleton index from holder to the containers attributed to them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOwners {
    #[serde(rename = "Owners", deserialize_with = "null_as_default")]
    pub owners: Vec<Owner>,
}

impl LedgerRecord for ContainerOwners {}

impl ContainerOwners {
    /// Find the entry for an owner
    pub fn find(&self, owner_id: &str) -> Option<&Owner> {
        self.owners.iter().find(|owner| owner.owner_id == owner_id)
    }

    /// Attribute a container to an owner.
    ///
    /// Returns `false` when the owner already held the container and nothing changed.
    pub fn attribute(&mut self, owner_id: &str, container_id: ContainerId) -> bool {
        match self.owners.iter_mut().find(|owner| owner.owner_id == owner_id) {
            Some(owner) => {
                if owner.container_list.contains(&container_id) {
                    return false;
                }
                owner.container_list.push(container_id);
                true
            }
            None => {
                self.owners.push(Owner {
                    owner_id: owner_id.to_string(),
                    container_list: vec![container_id],
                });
                true
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Owner {
    #[serde(rename = "OwnerId")]
    pub owner_id: String,

    /// Container IDs in the order they were attributed, without duplicates
    #[serde(rename = "ContainerList", deserialize_with = "null_as_default")]
    pub container_list: Vec<ContainerId>,
}

/// Full container records of one owner, in the owner's stored order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Shipment {
    #[serde(rename = "container_list", deserialize_with = "null_as_default")]
    pub containers: Vec<Container>,
}

impl LedgerRecord for Shipment {}
