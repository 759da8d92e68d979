pub mod consumer;
pub mod error;
pub mod local;
pub mod parser;
pub mod postgres;

pub use consumer::{QueueConsumer, QueueHealth, QueueMessage, RunQueue};
pub use error::QueueError;
pub use local::LocalQueue;
pub use parser::{parse_batch, parse_message, RunRequest};
pub use postgres::PgQueue;
