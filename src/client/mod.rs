//! Клиенты фидов.
//!
//! - `publisher`: жизненный цикл фидов и публикация уведомлений.
//! - `subscriber`: подписки на каналы и разнос уведомлений по обработчикам.
//! - `clock`: монотонные score для индекса id.

pub mod clock;
pub mod publisher;
pub mod subscriber;

pub use clock::*;
pub use publisher::*;
pub use subscriber::*;
