//! Pure calculation engine for household dividend, loan, and leverage
//! planning. No I/O, no shared state: every operation is a deterministic
//! function of one read-only snapshot.

pub mod amortize;
pub mod analytics;
pub mod error;
pub mod money;
pub mod projection;
pub mod snapshot;
pub mod stress;
pub mod tax;
pub mod types;

pub use error::PlannerError;
pub use types::*;

/// Standard result type for all planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
