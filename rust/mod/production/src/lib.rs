//! Loom production tracking: beams, workers, machine assignments, taka
//! entries and the reports built from them.
//!
//! Everything goes through [`ProductionService`], which reads and writes
//! typed documents in a [`KVStore`](takabook_kv::KVStore). Callers hold a
//! [`Session`] for the selected factory and pass it to each operation.

pub mod label;
pub mod model;
pub mod service;
pub mod session;
mod store_impls;

pub use label::format_worker_label;
pub use service::ProductionService;
pub use session::Session;
