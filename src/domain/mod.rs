//! Domain models for confstrap
//!
//! Plans, receipts, resolver output and doctor findings. Constructors enforce
//! the invariants (relative paths, valid ids and hashes, derived counts) so
//! the pipeline never has to re-check them.

pub mod action;
pub mod diagnostic;
pub mod plan;
pub mod receipt;
pub mod resolved;

pub use action::{ActionKind, ActionReason, FileAction};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use plan::{ComponentPlan, InstallPlan};
pub use receipt::{RECEIPT_SCHEMA_VERSION, Receipt};
pub use resolved::ResolvedSpec;
