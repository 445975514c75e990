//! Keybinding reconciliation against a remote database
//!
//! Rows built by `bindsync-keybinds` are matched against an index of the
//! remote table and turned into a plan of create, update, rebind and skip
//! operations, which the executor then applies one call at a time.
//!
//! ```text
//! raw records -> RowBuilder -> rows --+
//!                                     +-> compute_plan -> Executor -> RemoteStore
//! RemoteStore -> build_index -> index +
//! ```

pub mod backfill;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod index;
pub mod planner;
pub mod properties;
pub mod remote;
pub mod schema;

pub use backfill::{apply_backfill, plan_backfill, BackfillItem};
pub use context::SyncContext;
pub use engine::{BackfillSummary, RunSummary, SyncEngine};
pub use error::{RemoteError, Result, SyncError};
pub use executor::{ApplyReport, Executor, ItemOutcome, Outcome};
pub use index::{build_index, IdentityIndex, IdentityRecord, IndexOutcome};
pub use planner::{compute_plan, MatchedVia, Operation, PlanItem, PlanOptions, PlanStats};
pub use properties::PayloadBuilder;
pub use remote::{DatabaseSchema, ListResult, RemoteClient, RemotePage, RemoteStore, RemoteUser};
pub use schema::{check_schema, SchemaReport};
