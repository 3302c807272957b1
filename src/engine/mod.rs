//! Session engine: the betting state machine, its async driver, and the
//! reporting-only mode tracker.

pub mod driver;
pub mod modes;
pub mod session;

pub use driver::{Driver, DriverConfig, RetryPolicy};
pub use session::{Session, SessionConfig, TrialPlan};
