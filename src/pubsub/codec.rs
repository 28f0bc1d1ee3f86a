//! Формат payload'а уведомлений: поля, склеенные одним байтом-разделителем.

use bytes::{BufMut, Bytes, BytesMut};
use thoonk_error::{FeedError, ThoonkResult};

/// Зарезервированный байт-разделитель полей.
pub const SEPARATOR: u8 = 0x00;

/// Склеивает поля через [`SEPARATOR`].
///
/// Поле, содержащее разделитель, не может быть восстановлено на стороне
/// подписчика, поэтому такой вход отклоняется с `FeedError::InvalidField`.
pub fn encode_fields<S: AsRef<str>>(fields: &[S]) -> ThoonkResult<Bytes> {
    let capacity = fields.iter().map(|f| f.as_ref().len() + 1).sum();
    let mut buf = BytesMut::with_capacity(capacity);

    for (i, field) in fields.iter().enumerate() {
        let field = field.as_ref();
        ensure_field(field)?;
        if i > 0 {
            buf.put_u8(SEPARATOR);
        }
        buf.put_slice(field.as_bytes());
    }
    Ok(buf.freeze())
}

/// Разбивает payload на позиционные поля.
///
/// Возвращает `None`, если в payload нет разделителя (уведомление без
/// полей не может прийти от клиента) или он не является UTF-8.
pub fn decode_fields(payload: &[u8]) -> Option<Vec<String>> {
    if !payload.contains(&SEPARATOR) {
        return None;
    }
    payload
        .split(|b| *b == SEPARATOR)
        .map(|part| std::str::from_utf8(part).ok().map(str::to_string))
        .collect()
}

/// Проверяет, что значение можно передать полем уведомления.
pub fn ensure_field(field: &str) -> ThoonkResult<()> {
    if field.as_bytes().contains(&SEPARATOR) {
        return Err(FeedError::InvalidField {
            field: field.escape_default().to_string(),
        }
        .into());
    }
    Ok(())
}
