//! Plan execution for shelfsweep.
//!
//! The [`Executor`] applies a [`RunPlan`](shelfsweep_analyze::RunPlan):
//! in [`Mode::DryRun`] it only logs, in [`Mode::Execute`] it deletes the
//! planned files (permanently or to the trash) and then prunes emptied
//! directories bottom-up. Every action yields a [`DeleteOutcome`]; failures
//! never stop the rest of the plan.

mod executor;
mod outcome;

pub use executor::{DeleteMethod, Executor, Mode};
pub use outcome::{DeleteError, DeleteOutcome, DeleteStatus, EntryKind, RunSummary};
