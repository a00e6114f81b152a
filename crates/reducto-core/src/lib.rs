pub mod error;
pub mod lock;
pub mod minimize;
pub mod minimize_ddmin;
pub mod oracle;
pub mod oracle_command;
pub mod partition;
pub mod process;
pub mod session;
pub mod source;
pub mod source_block;
pub mod types;

pub use error::ReduceError;
pub use lock::{LockPolicy, StagingLock};
pub use minimize::{Minimizer, Reduction};
pub use minimize_ddmin::{ddmin, DdMinimizer};
pub use oracle::Oracle;
pub use oracle_command::{CommandOracle, CommandOracleConfig, CommandSpec};
pub use partition::{complement, divide};
pub use process::{run_command, CommandLine, ExitKind, RunOutcome};
pub use session::{Session, SessionConfig, SessionReport, Status, WrittenFiles};
pub use source::SourceAccessor;
pub use source_block::{BlockSourceAccessor, Statement};
pub use types::{IndeterminateReason, MinimizeStats, OracleCounters, Outcome, Verdict};
