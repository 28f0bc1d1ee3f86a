//! Подсистема Publish–Subscribe.
//!
//! - `broker`: внутрипроцессная доставка сообщений по каналам.
//! - `subscriber`: подписка брокера на канал.
//! - `message`: сырое сообщение и декодированное уведомление.
//! - `codec`: формат payload'а уведомлений.
//! - `channels`: имена каналов и ключей фидов.

pub mod broker;
pub mod channels;
pub mod codec;
pub mod message;
pub mod subscriber;

pub use broker::*;
pub use channels::*;
pub use codec::*;
pub use message::*;
pub use subscriber::*;
