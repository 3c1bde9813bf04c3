//! Reconciliation of pools and nodes on a Stingray / SteelApp traffic manager.
//!
//! Every operation is the same cycle: fetch the pool document, diff it against
//! the desired state, issue one PUT or DELETE if anything differs, and report
//! what changed. Planning ([`plan`]) is pure; [`Reconciler`] drives the cycle
//! through a pluggable [`Transport`].

pub mod change;
pub mod diff;
pub mod endpoint;
pub mod error;
pub mod model;
pub mod plan;
pub mod reconciler;
pub mod transport;

pub use change::{Action, ChangeRecord, FieldChange, ResourceId, ResourceKind};
pub use endpoint::{DEFAULT_API_VERSION, PoolEndpoint};
pub use error::{Attempt, ErrorCategory, ReconcileError, Result};
pub use model::{
    NodeAttributes, NodeEntry, NodeState, PoolProperties, PoolSnapshot, PropertiesError,
    PropertyGroup, UnknownNodeState,
};
pub use plan::{Method, Mutation, NodeMode, Plan, PoolOperation, PoolState};
pub use reconciler::{Outcome, Reconciler};
pub use transport::{HttpResponse, Transport, TransportError};
