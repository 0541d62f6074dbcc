//! Record finders and writers built on the `Executor` primitives.

mod crud;
pub use crud::{FindAll, WriteOutcome};
