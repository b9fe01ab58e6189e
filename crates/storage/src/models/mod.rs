//! Document models for the three store collections.

mod block;
pub use block::{BlockBundle, BlockRecord};

mod transaction;
pub use transaction::{TransactionBundle, TransactionRecord};

mod event;
pub use event::EventRecord;
