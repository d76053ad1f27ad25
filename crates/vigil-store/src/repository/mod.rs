//! In-memory repository implementations.

mod api_key;
mod audit;
mod auth;
mod incident;
mod tenant;
mod usage;

pub use api_key::MemApiKeyRepository;
pub use audit::MemAuditLogRepository;
pub use auth::MemAuthRepository;
pub use incident::MemIncidentRepository;
pub use tenant::MemTenantRepository;
pub use usage::MemUsageRepository;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use vigil_core::cursor::{Page, PageRequest};

/// Sort rows by `(created_at DESC, id DESC)`, apply the cursor, and cut
/// one page. Shared by every list implementation.
pub(crate) fn paginate<T: Clone>(
    rows: &[T],
    page: PageRequest,
    key_of: impl Fn(&T) -> (DateTime<Utc>, Uuid),
) -> Page<T> {
    let mut sorted: Vec<T> = rows.to_vec();
    sorted.sort_by(|a, b| key_of(b).cmp(&key_of(a)));

    let items: Vec<T> = sorted
        .into_iter()
        .filter(|row| match &page.cursor {
            Some(cursor) => {
                let (created_at, id) = key_of(row);
                cursor.precedes(created_at, id)
            }
            None => true,
        })
        .take(page.limit)
        .collect();

    Page::new(items, page.limit, key_of)
}
