//! Граница адаптера хранилища.
//!
//! - `storage`: трейт `Storage` (ключи, транзакции, публикация).
//! - `pubsub`: подписочная сторона адаптера и её получатель событий.
//! - `transaction`: очередь команд оптимистичной транзакции.
//! - `memory`: адаптер, целиком живущий в памяти процесса.

pub mod memory;
pub mod pubsub;
pub mod storage;
pub mod transaction;

pub use memory::*;
pub use pubsub::*;
pub use storage::*;
pub use transaction::*;
