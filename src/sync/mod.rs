//! Feed synchronization: registration, entry reconciliation and the
//! periodic update pass.
//!
//! ```text
//! UpdateScheduler ──(per feed)──> FeedRegistrar ──> EntryReconciler ──> Store
//! ```

pub mod reconciler;
pub mod registrar;
pub mod scheduler;

pub use reconciler::{EntryReconciler, Reconciliation};
pub use registrar::FeedRegistrar;
pub use scheduler::{FailureHandler, PassOutcome, PassReport, UpdateScheduler};
