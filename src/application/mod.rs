// Application layer - use cases and orchestration.
// BillService is the single entry point for any client (CLI today);
// it enforces the invariants the calculation core relies on.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
