//! Result collection and reporting
//!
//! The collector the engine reports to, traceback rendering, post-mortem
//! debugging, the restart ledger and stored run exports.

mod collector;
mod debug;
mod ledger;
mod storage;
pub mod traceback;

pub use collector::{Fault, ResultCollector, SkipEntry};
pub use debug::{post_mortem_factory, start_interactive_mode, Debugger, DebuggerFactory, PostMortem};
pub use ledger::{LedgerError, RestartLedger};
pub use storage::{export_run, ExportFormat, ResultsStorage, StoredFault, StoredRun};
