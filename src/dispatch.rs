use medlab_core::error::{LedgerError, LedgerResult};
use medlab_core::id::ContainerId;
use std::fmt;

/// Entry point an operation is allowed to arrive through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// One-time ledger bootstrap
    Init,
    /// Operations that write the ledger
    Invoke,
    /// Read-only operations
    Query,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Init => f.write_str("init"),
            OperationKind::Invoke => f.write_str("invoke"),
            OperationKind::Query => f.write_str("query"),
        }
    }
}

/// Every operation the ledger answers, resolved from its wire name once at
/// the boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Init,
    ShipContainerUsingLogistics {
        sender_id: String,
        logistics_id: String,
        receiver_id: String,
        remarks: String,
        payload: String,
    },
    SetCurrentOwner {
        owner_id: String,
        container_id: ContainerId,
    },
    GetContainerDetails {
        container_id: ContainerId,
    },
    GetMaxIdValue,
    GetEmptyContainer,
    GetContainerDetailsForOwner {
        owner_id: String,
    },
}

/// Positional arguments with arity and emptiness checks
struct Args<'a, A> {
    operation: &'static str,
    args: &'a [A],
}

impl<'a, A: AsRef<str>> Args<'a, A> {
    fn new(operation: &'static str, args: &'a [A], expected: usize) -> LedgerResult<Self> {
        if args.len() != expected {
            return Err(LedgerError::InvalidArgument(format!(
                "{} expects {} argument(s), got {}",
                operation,
                expected,
                args.len()
            )));
        }
        Ok(Self { operation, args })
    }

    /// Argument that must not be empty
    fn required(&self, index: usize, name: &str) -> LedgerResult<String> {
        let value = self.optional(index);
        if value.is_empty() {
            return Err(LedgerError::InvalidArgument(format!(
                "{}: {} must not be empty",
                self.operation, name
            )));
        }
        Ok(value)
    }

    fn optional(&self, index: usize) -> String {
        self.args[index].as_ref().to_string()
    }
}

impl Operation {
    pub const INIT: &'static str = "init";
    pub const SHIP_CONTAINER_USING_LOGISTICS: &'static str = "ShipContainerUsingLogistics";
    pub const SET_CURRENT_OWNER: &'static str = "SetCurrentOwner";
    pub const GET_CONTAINER_DETAILS: &'static str = "GetContainerDetails";
    pub const GET_MAX_ID_VALUE: &'static str = "GetMaxIDValue";
    pub const GET_EMPTY_CONTAINER: &'static str = "GetEmptyContainer";
    pub const GET_CONTAINER_DETAILS_FOR_OWNER: &'static str = "getContainerDetailsforowner";

    /// Resolve an operation name and its positional arguments
    pub fn parse<A: AsRef<str>>(name: &str, args: &[A]) -> LedgerResult<Self> {
        let operation = match name {
            Self::INIT => {
                Args::new(Self::INIT, args, 0)?;
                Operation::Init
            }
            Self::SHIP_CONTAINER_USING_LOGISTICS => {
                let args = Args::new(Self::SHIP_CONTAINER_USING_LOGISTICS, args, 5)?;
                Operation::ShipContainerUsingLogistics {
                    sender_id: args.required(0, "senderID")?,
                    logistics_id: args.required(1, "logisticsID")?,
                    receiver_id: args.required(2, "receiverID")?,
                    remarks: args.optional(3),
                    payload: args.required(4, "elementsPayload")?,
                }
            }
            Self::SET_CURRENT_OWNER => {
                let args = Args::new(Self::SET_CURRENT_OWNER, args, 2)?;
                Operation::SetCurrentOwner {
                    owner_id: args.required(0, "ownerID")?,
                    container_id: args.required(1, "containerID")?.into(),
                }
            }
            Self::GET_CONTAINER_DETAILS => {
                // An empty ID is looked up and answered with NotFound
                let args = Args::new(Self::GET_CONTAINER_DETAILS, args, 1)?;
                Operation::GetContainerDetails {
                    container_id: args.optional(0).into(),
                }
            }
            Self::GET_MAX_ID_VALUE => {
                Args::new(Self::GET_MAX_ID_VALUE, args, 0)?;
                Operation::GetMaxIdValue
            }
            Self::GET_EMPTY_CONTAINER => {
                Args::new(Self::GET_EMPTY_CONTAINER, args, 0)?;
                Operation::GetEmptyContainer
            }
            Self::GET_CONTAINER_DETAILS_FOR_OWNER => {
                let args = Args::new(Self::GET_CONTAINER_DETAILS_FOR_OWNER, args, 1)?;
                Operation::GetContainerDetailsForOwner {
                    owner_id: args.required(0, "ownerID")?,
                }
            }
            unknown => return Err(LedgerError::UnknownOperation(unknown.to_string())),
        };
        Ok(operation)
    }

    /// Wire name of the operation
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Init => Self::INIT,
            Operation::ShipContainerUsingLogistics { .. } => Self::SHIP_CONTAINER_USING_LOGISTICS,
            Operation::SetCurrentOwner { .. } => Self::SET_CURRENT_OWNER,
            Operation::GetContainerDetails { .. } => Self::GET_CONTAINER_DETAILS,
            Operation::GetMaxIdValue => Self::GET_MAX_ID_VALUE,
            Operation::GetEmptyContainer => Self::GET_EMPTY_CONTAINER,
            Operation::GetContainerDetailsForOwner { .. } => Self::GET_CONTAINER_DETAILS_FOR_OWNER,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Init => OperationKind::Init,
            Operation::ShipContainerUsingLogistics { .. } | Operation::SetCurrentOwner { .. } => {
                OperationKind::Invoke
            }
            Operation::GetContainerDetails { .. }
            | Operation::GetMaxIdValue
            | Operation::GetEmptyContainer
            | Operation::GetContainerDetailsForOwner { .. } => OperationKind::Query,
        }
    }

    /// Whether the operation leaves the ledger untouched
    pub fn is_read_only(&self) -> bool {
        self.kind() == OperationKind::Query
    }
}
