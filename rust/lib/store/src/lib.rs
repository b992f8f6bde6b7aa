//! Typed document collections over a [`KVStore`](takabook_kv::KVStore).
//!
//! A model implements [`Document`] to declare its collection name, its
//! tenant scope and its id. [`Collection`] provides get/list/find/insert/
//! save/delete; [`WriteBatch`] stages several writes and commits them in a
//! single store transaction.
//!
//! ```ignore
//! impl Document for Worker {
//!     const COLLECTION: &'static str = "workers";
//!     fn scope(&self) -> String { self.factory_id.clone() }
//!     fn key_value(&self) -> String { self.id.clone() }
//!     fn set_key(&mut self, id: String) { self.id = id; }
//! }
//! ```

pub mod batch;
pub mod collection;
mod timestamp;

pub use batch::WriteBatch;
pub use collection::{Collection, Document};
