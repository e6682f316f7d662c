//! Queue module: the persisted offline queue and its replay sweep.

mod persisted;
mod replay;

pub use persisted::PersistedQueue;
pub use replay::{HaltedAt, SweepReport, sweep};
