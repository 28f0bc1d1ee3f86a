/// Publisher and subscriber clients.
pub mod client;
/// Client settings loading.
pub mod config;
/// Value types held by the in-memory adapter (sets, hashes, sorted sets).
pub mod database;
/// Store adapter seam: `Storage`, `PubSub`, transactions, `InMemoryStore`.
pub mod engine;
/// Feed engine: publish/retract protocol and typed feed events.
pub mod feed;
/// `tracing` subscriber setup.
pub mod logging;
/// Pub/Sub: broker, notification codec, channel naming.
pub mod pubsub;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Clients and handler registry types.
pub use client::{Handler, HandlerId, PublisherClient, SubscriberClient, SubscriptionState};
/// Configuration.
pub use config::{ClientConfig, Settings};
/// Store adapter traits and the in-memory implementation.
pub use engine::{InMemoryStore, MemoryPubSub, PubSub, PubSubListener, Storage, Transaction};
/// Feeds.
pub use feed::{Feed, FeedConfig, FeedEvent, MAX_LENGTH};
/// Logging setup.
pub use logging::{init_logging, LogFormat, LoggingConfig};
/// Notifications.
pub use pubsub::{Notification, SEPARATOR};
/// Error types shared with the `thoonk-error` crate.
pub use thoonk_error::{
    FeedError, StackError, StatusCode, StoreError, SubscribeError, ThoonkResult,
};
