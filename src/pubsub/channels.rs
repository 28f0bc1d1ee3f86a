//! Имена каналов и ключей хранилища.
//!
//! Схема ключей фида `<name>`:
//!
//! | назначение        | ключ                     |
//! |-------------------|--------------------------|
//! | индекс id         | `feed.ids:<name>`        |
//! | элементы          | `feed.items:<name>`      |
//! | счётчик публикаций| `feed.publishes:<name>`  |
//! | конфигурация      | `feed.config:<name>`     |
//!
//! Каналы фида: `feed.publish:<name>`, `feed.edit:<name>`,
//! `feed.retract:<name>`. Глобальное множество имён: `feeds`. Каналы
//! жизненного цикла: `newfeed` и `delfeed`.

/// Глобальное множество имён фидов.
pub const FEEDS_KEY: &str = "feeds";
/// Канал уведомлений о создании фида.
pub const NEW_FEED_CHANNEL: &str = "newfeed";
/// Канал уведомлений об удалении фида.
pub const DEL_FEED_CHANNEL: &str = "delfeed";

const IDS_PREFIX: &str = "feed.ids:";
const ITEMS_PREFIX: &str = "feed.items:";
const PUBLISHES_PREFIX: &str = "feed.publishes:";
const CONFIG_PREFIX: &str = "feed.config:";
const PUBLISH_PREFIX: &str = "feed.publish:";
const EDIT_PREFIX: &str = "feed.edit:";
const RETRACT_PREFIX: &str = "feed.retract:";

/// Преобразует логическое имя события в физический канал.
///
/// `create` и `delete` отображаются на каналы жизненного цикла, любое
/// другое имя (каналы фидов, пользовательские каналы) передаётся как есть.
pub fn channel_for_event(event: &str) -> &str {
    match event {
        "create" => NEW_FEED_CHANNEL,
        "delete" => DEL_FEED_CHANNEL,
        other => other,
    }
}

/// Вид канала фида.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedChannel {
    Publish,
    Edit,
    Retract,
}

/// Разбирает имя канала фида на вид и имя фида.
pub fn parse_feed_channel(channel: &str) -> Option<(FeedChannel, &str)> {
    [
        (PUBLISH_PREFIX, FeedChannel::Publish),
        (EDIT_PREFIX, FeedChannel::Edit),
        (RETRACT_PREFIX, FeedChannel::Retract),
    ]
    .into_iter()
    .find_map(|(prefix, kind)| channel.strip_prefix(prefix).map(|name| (kind, name)))
}

/// Имена ключей и каналов одного фида.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedKeys {
    pub ids: String,
    pub items: String,
    pub publishes: String,
    pub config: String,
    pub publish_channel: String,
    pub edit_channel: String,
    pub retract_channel: String,
}

impl FeedKeys {
    pub fn new(name: &str) -> Self {
        Self {
            ids: format!("{IDS_PREFIX}{name}"),
            items: format!("{ITEMS_PREFIX}{name}"),
            publishes: format!("{PUBLISHES_PREFIX}{name}"),
            config: format!("{CONFIG_PREFIX}{name}"),
            publish_channel: format!("{PUBLISH_PREFIX}{name}"),
            edit_channel: format!("{EDIT_PREFIX}{name}"),
            retract_channel: format!("{RETRACT_PREFIX}{name}"),
        }
    }
}

/// Ключ конфигурации фида без построения полного [`FeedKeys`].
pub fn config_key(name: &str) -> String {
    format!("{CONFIG_PREFIX}{name}")
}
