//! Node graph: operators, connections and their evaluation.
//!
//! # Architecture
//!
//! ```text
//! NodeSystem ──► GraphTables (mutex) ──► Planner ──► EvalPlan ──► Evaluator ──► PixelBuffer
//!                 operators + connections            (snapshot)    per-pixel / per-image
//! ```
//!
//! - [`NodeSystem`] - mutation API, queries and the `process` entry point
//! - `Planner` - depth-first walk from Output into an [`EvalPlan`]
//! - [`Evaluator`] - runs a plan in either [`EvalMode`]
//! - [`BuiltinOperator`] / [`OperatorPlugin`] - operator implementations
//! - [`GraphDocument`] - persistence of operator parameters and connections

mod arena;
pub mod document;
pub mod error;
pub mod evaluator;
pub mod id;
pub mod kind;
pub mod operator;
pub mod operators;
pub mod plan;
mod planner;
pub mod slot;
pub mod snapshot;
pub mod system;
mod tables;

pub use document::{DocumentConnection, GraphDocument, DOCUMENT_VERSION};
pub use error::{GraphError, GraphResult};
pub use evaluator::{EvalMode, Evaluator};
pub use id::{ConnectionId, NodeId, MAX_TABLE_CAPACITY};
pub use kind::OperatorKind;
pub use operator::{AnyOperator, BuiltinOperator, Inputs, OperatorPlugin};
pub use plan::{EvalPlan, PlanStats};
pub use slot::SlotDescriptor;
pub use snapshot::{ConnectionSnapshot, NodeSnapshot, PassStats, SlotSnapshot, TopologySnapshot};
pub use system::NodeSystem;
pub use tables::Connection;
