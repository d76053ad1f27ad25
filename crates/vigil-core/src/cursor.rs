//! Opaque pagination cursor for list endpoints.
//!
//! Lists order by `(created_at DESC, id DESC)` — the id tie-break gives
//! a total order even when timestamps collide. The cursor is the
//! base64url(JSON) encoding of that composite key for the last row of
//! the previous page. Any decoding failure is an invalid-cursor client
//! error, never silently ignored.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VigilError, VigilResult};

/// Composite sort key of the last row on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    /// Encode to the opaque wire form.
    pub fn encode(&self) -> String {
        // Serializing a chrono/uuid pair cannot fail.
        let json = serde_json::to_vec(self).expect("cursor serialization");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode the opaque wire form; any malformation (bad base64, bad
    /// JSON, wrong fields) yields `PaginationCursorInvalid`.
    pub fn decode(raw: &str) -> VigilResult<Cursor> {
        let bytes = URL_SAFE_NO_PAD
            .decode(raw.as_bytes())
            .map_err(|_| VigilError::PaginationCursorInvalid)?;
        serde_json::from_slice(&bytes).map_err(|_| VigilError::PaginationCursorInvalid)
    }

    /// Whether a row with this key sorts strictly after `self` in
    /// `(created_at DESC, id DESC)` order, i.e. belongs on a later page.
    pub fn precedes(&self, created_at: DateTime<Utc>, id: Uuid) -> bool {
        created_at < self.created_at || (created_at == self.created_at && id < self.id)
    }
}

/// Page-size request, clamped to the configured maximum.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub limit: usize,
    pub cursor: Option<Cursor>,
}

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 100;

impl PageRequest {
    /// Build from raw client input. A zero/absent limit becomes the
    /// default; anything above the maximum is clamped down.
    pub fn from_raw(limit: Option<usize>, raw_cursor: Option<&str>) -> VigilResult<PageRequest> {
        let limit = match limit {
            None | Some(0) => DEFAULT_PAGE_LIMIT,
            Some(n) => n.min(MAX_PAGE_LIMIT),
        };
        let cursor = raw_cursor.map(Cursor::decode).transpose()?;
        Ok(PageRequest { limit, cursor })
    }
}

/// One page of results plus the bookmark for the next.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present only when the page came back full — a short page always
    /// signals the end, even if another row sits at the same boundary
    /// instant (acceptable: the tie-break key is strict).
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Assemble a page from rows already ordered and truncated to
    /// `limit`, given a key extractor for the last row.
    pub fn new(
        items: Vec<T>,
        limit: usize,
        key_of: impl Fn(&T) -> (DateTime<Utc>, Uuid),
    ) -> Page<T> {
        let next_cursor = if items.len() == limit {
            items.last().map(|last| {
                let (created_at, id) = key_of(last);
                Cursor { created_at, id }.encode()
            })
        } else {
            None
        };
        Page { items, next_cursor }
    }
}
