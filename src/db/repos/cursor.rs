//! Keyset cursors for paginating the audit ledger.
//!
//! The ledger's total order is `(created_at, id)`. A cursor encodes one
//! position in that order, so a query can be restarted exactly where it left
//! off even while new events are being appended — appends only ever add rows
//! after existing positions, so pages already read stay stable.
//!
//! Cursors encode timestamps at millisecond precision. Entities must
//! truncate their stored timestamps to match (see [`truncate_to_millis`]),
//! otherwise SQLite's TEXT comparison of RFC 3339 strings diverges from the
//! decoded cursor value.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("invalid cursor format")]
    InvalidFormat,
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid timestamp in cursor")]
    InvalidTimestamp,
    #[error("invalid UUID in cursor")]
    InvalidUuid,
}

/// A position in the `(created_at, id)` order of an append-only table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: Uuid) -> Self {
        Self { created_at, id }
    }

    /// Encode as URL-safe base64 of `{timestamp_millis}:{uuid}`.
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.created_at.timestamp_millis(), self.id);
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    pub fn decode(encoded: &str) -> Result<Self, CursorError> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded)?;
        let raw = String::from_utf8(bytes).map_err(|_| CursorError::InvalidFormat)?;

        // UUIDs use hyphens not colons, so ':' cleanly separates the parts.
        let (timestamp_str, uuid_str) = raw.split_once(':').ok_or(CursorError::InvalidFormat)?;

        let timestamp_millis: i64 = timestamp_str
            .parse()
            .map_err(|_| CursorError::InvalidTimestamp)?;
        let created_at = DateTime::from_timestamp_millis(timestamp_millis)
            .ok_or(CursorError::InvalidTimestamp)?;
        let id = Uuid::parse_str(uuid_str).map_err(|_| CursorError::InvalidUuid)?;

        Ok(Self { created_at, id })
    }
}

impl Serialize for Cursor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Cursor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Cursor::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Direction for cursor-based pagination over a descending-ordered sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
    /// Items after the cursor (older, in descending order).
    #[default]
    Forward,
    /// Items before the cursor (newer, in descending order).
    Backward,
}

/// Cursors for navigating paginated results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageCursors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Cursor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<Cursor>,
}

impl PageCursors {
    /// Build next/prev cursors from a page of items already in user-facing
    /// (descending) order.
    pub fn from_items<T, F>(
        items: &[T],
        has_more: bool,
        direction: CursorDirection,
        cursor: Option<&Cursor>,
        get_cursor: F,
    ) -> Self
    where
        F: Fn(&T) -> Cursor,
    {
        if items.is_empty() {
            return Self::default();
        }

        let first = get_cursor(&items[0]);
        let last = get_cursor(&items[items.len() - 1]);

        match direction {
            CursorDirection::Forward => Self {
                next: if has_more { Some(last) } else { None },
                prev: cursor.map(|_| first),
            },
            CursorDirection::Backward => Self {
                next: cursor.map(|_| first),
                prev: if has_more { Some(last) } else { None },
            },
        }
    }
}

/// Truncate a timestamp to millisecond precision so stored values compare
/// consistently with decoded cursors.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.duration_trunc(TimeDelta::milliseconds(1)).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_round_trips() {
        let cursor = Cursor::new(truncate_to_millis(Utc::now()), Uuid::new_v4());
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn cursor_rejects_garbage() {
        assert!(Cursor::decode("not-base64!!").is_err());
        let bogus = URL_SAFE_NO_PAD.encode(b"no-separator");
        assert!(Cursor::decode(&bogus).is_err());
    }

    #[test]
    fn truncation_drops_sub_millisecond_precision() {
        let ts = Utc::now();
        let truncated = truncate_to_millis(ts);
        assert_eq!(truncated.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(truncated.timestamp_millis(), ts.timestamp_millis());
    }

    #[test]
    fn empty_page_has_no_cursors() {
        let cursors = PageCursors::from_items(
            &[] as &[(DateTime<Utc>, Uuid)],
            false,
            CursorDirection::Forward,
            None,
            |(ts, id)| Cursor::new(*ts, *id),
        );
        assert!(cursors.next.is_none());
        assert!(cursors.prev.is_none());
    }
}
