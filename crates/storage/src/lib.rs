//! Record models and the persistent block store for quill.
//!
//! The store owns three collections (`blocks`, `transactions`, `events`) and
//! exposes them behind the [`BlockStore`] capability trait. The MongoDB
//! implementation backs every multi-record write with a session transaction,
//! so a block is either fully absent or fully written.

mod error;
pub use error::StorageError;

mod traits;
pub use traits::BlockStore;

mod models;
pub use models::{BlockBundle, BlockRecord, EventRecord, TransactionBundle, TransactionRecord};

mod mongo;
pub use mongo::MongoStore;
