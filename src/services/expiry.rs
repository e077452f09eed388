//! Read-time evaluation of the breaking-news slot.
//!
//! Expiry instants are stored in UTC. Editors enter them as wall-clock time
//! in the site zone; [`site_local_to_utc`] and [`utc_to_site_local`] are the
//! only places that cross between the two.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    db::{options, OptionStore, PostRepository},
    models::{
        breaking_news::{BreakingNewsRecord, RECORD_OPTION_KEY},
        post::Post,
    },
    services::metrics::EXPIRED_COUNTER,
};

/// Format of `<input type="datetime-local">` values.
pub const PICKER_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// The post currently holding the slot, with the record that put it there.
#[derive(Debug, Clone)]
pub struct ActivePost {
    pub record: BreakingNewsRecord,
    pub post: Post,
}

pub fn is_expired(record: &BreakingNewsRecord, now: DateTime<Utc>) -> bool {
    record.effective_expiry().is_some_and(|expiry| now > expiry)
}

/// Interpret a site-zone wall-clock time. A time repeated by a DST fold
/// resolves to its earlier instant; a time skipped by a DST gap is `None`.
pub fn site_local_to_utc(local: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn utc_to_site_local(instant: DateTime<Utc>, zone: Tz) -> String {
    instant.with_timezone(&zone).format(PICKER_FORMAT).to_string()
}

pub struct ExpiryService;

impl ExpiryService {
    /// Resolve the active breaking-news post, clearing the slot first if its
    /// expiry has passed. Returns `None` when nothing is active, the record
    /// lapsed, or the referenced post no longer exists.
    pub async fn get_active_post(
        store: &dyn OptionStore,
        posts: &dyn PostRepository,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<ActivePost>> {
        let (raw, record) = options::load_raw::<BreakingNewsRecord>(store, RECORD_OPTION_KEY).await?;

        let post_id = match record.post_id {
            Some(id) if record.is_active => id,
            _ => return Ok(None),
        };

        if is_expired(&record, now) {
            if Self::clear_lapsed(store, raw).await? {
                info!("Breaking news for post {} expired, slot cleared", post_id);
            }
            return Ok(None);
        }

        Ok(posts
            .get_post(post_id)
            .await?
            .map(|post| ActivePost { record, post }))
    }

    /// Clear the slot if its record has lapsed. Returns whether it did.
    pub async fn sweep(store: &dyn OptionStore, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let (raw, record) = options::load_raw::<BreakingNewsRecord>(store, RECORD_OPTION_KEY).await?;
        if record.post_id.is_none() || !is_expired(&record, now) {
            return Ok(false);
        }
        let cleared = Self::clear_lapsed(store, raw).await?;
        if cleared {
            info!("Expiry sweep cleared breaking news for post {:?}", record.post_id);
        }
        Ok(cleared)
    }

    /// Empty the slot only if it still holds `lapsed` exactly as it was read.
    /// A save that lands in between wins and is left alone.
    pub async fn clear_lapsed(store: &dyn OptionStore, lapsed: Option<Value>) -> anyhow::Result<bool> {
        let Some(lapsed) = lapsed else {
            return Ok(false);
        };
        let empty = serde_json::to_value(BreakingNewsRecord::default())?;
        let cleared = store.compare_and_set(RECORD_OPTION_KEY, &lapsed, empty).await?;
        if cleared {
            EXPIRED_COUNTER.inc();
        } else {
            debug!("Slot changed since it was read, expiry clear skipped");
        }
        Ok(cleared)
    }

    /// Reset the slot to the empty record.
    pub async fn clear(store: &dyn OptionStore) -> anyhow::Result<()> {
        options::save(store, RECORD_OPTION_KEY, &BreakingNewsRecord::default()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryOptionStore, MemoryPostRepository};
    use crate::models::post::{PostKind, PostStatus};
    use chrono::Duration;
    use uuid::Uuid;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn post(id: i64) -> Post {
        Post {
            id,
            title: format!("Post {id}"),
            slug: format!("post-{id}"),
            status: PostStatus::Publish,
            kind: PostKind::Post,
            author_id: Uuid::nil(),
        }
    }

    async fn seeded(record: BreakingNewsRecord) -> (MemoryOptionStore, MemoryPostRepository) {
        let store = MemoryOptionStore::new();
        options::save(&store, RECORD_OPTION_KEY, &record).await.unwrap();
        let posts = MemoryPostRepository::new();
        posts.insert(post(1));
        (store, posts)
    }

    fn expirable(expiry: DateTime<Utc>) -> BreakingNewsRecord {
        BreakingNewsRecord {
            post_id: Some(1),
            is_active: true,
            custom_title: String::new(),
            is_expirable: true,
            expiry: Some(expiry),
        }
    }

    #[tokio::test]
    async fn lapsed_record_is_cleared_and_stays_cleared() {
        let now = at("2024-06-01T12:00:00Z");
        let (store, posts) = seeded(expirable(now - Duration::minutes(1))).await;

        assert!(ExpiryService::get_active_post(&store, &posts, now).await.unwrap().is_none());
        let stored: BreakingNewsRecord = options::load(&store, RECORD_OPTION_KEY).await.unwrap();
        assert!(stored.is_empty());

        assert!(ExpiryService::get_active_post(&store, &posts, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expiry_instant_itself_is_not_yet_expired() {
        let now = at("2024-06-01T12:00:00Z");
        let (store, posts) = seeded(expirable(now)).await;

        let active = ExpiryService::get_active_post(&store, &posts, now).await.unwrap();
        assert_eq!(active.map(|a| a.post.id), Some(1));
    }

    #[tokio::test]
    async fn expiry_is_ignored_when_not_expirable() {
        let now = at("2024-06-01T12:00:00Z");
        let mut record = expirable(now - Duration::days(3));
        record.is_expirable = false;
        let (store, posts) = seeded(record.clone()).await;

        let active = ExpiryService::get_active_post(&store, &posts, now).await.unwrap();
        assert_eq!(active.map(|a| a.record), Some(record));
    }

    #[tokio::test]
    async fn inactive_record_yields_nothing_and_is_left_alone() {
        let now = at("2024-06-01T12:00:00Z");
        let mut record = expirable(now - Duration::days(1));
        record.is_active = false;
        let (store, posts) = seeded(record.clone()).await;

        assert!(ExpiryService::get_active_post(&store, &posts, now).await.unwrap().is_none());
        let stored: BreakingNewsRecord = options::load(&store, RECORD_OPTION_KEY).await.unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn deleted_post_yields_nothing() {
        let now = at("2024-06-01T12:00:00Z");
        let (store, posts) = seeded(expirable(now + Duration::days(1))).await;
        posts.remove(1);

        assert!(ExpiryService::get_active_post(&store, &posts, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweep_only_clears_lapsed_records() {
        let now = at("2024-06-01T12:00:00Z");
        let (store, _) = seeded(expirable(now + Duration::hours(1))).await;
        assert!(!ExpiryService::sweep(&store, now).await.unwrap());
        assert!(ExpiryService::sweep(&store, now + Duration::hours(2)).await.unwrap());
        assert!(!ExpiryService::sweep(&store, now + Duration::hours(2)).await.unwrap());
    }

    #[tokio::test]
    async fn clear_does_not_erase_a_save_made_after_the_expired_read() {
        let now = at("2024-06-01T12:00:00Z");
        let (store, _) = seeded(expirable(now - Duration::minutes(1))).await;
        let (stale, _) = options::load_raw::<BreakingNewsRecord>(&store, RECORD_OPTION_KEY).await.unwrap();

        let takeover = BreakingNewsRecord {
            post_id: Some(2),
            is_active: true,
            custom_title: "Newer".into(),
            ..Default::default()
        };
        options::save(&store, RECORD_OPTION_KEY, &takeover).await.unwrap();

        assert!(!ExpiryService::clear_lapsed(&store, stale).await.unwrap());
        let stored: BreakingNewsRecord = options::load(&store, RECORD_OPTION_KEY).await.unwrap();
        assert_eq!(stored, takeover);
    }

    #[test]
    fn site_zone_conversion_round_trips() {
        let zone: Tz = "America/New_York".parse().unwrap();
        let local = NaiveDateTime::parse_from_str("2024-06-01 08:00", "%Y-%m-%d %H:%M").unwrap();
        let instant = site_local_to_utc(local, zone).unwrap();
        assert_eq!(instant, at("2024-06-01T12:00:00Z"));
        assert_eq!(utc_to_site_local(instant, zone), "2024-06-01T08:00");
    }

    #[test]
    fn dst_gap_has_no_instant_and_fold_takes_the_earlier() {
        let zone: Tz = "America/New_York".parse().unwrap();
        let gap = NaiveDateTime::parse_from_str("2024-03-10 02:30", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(site_local_to_utc(gap, zone), None);

        let fold = NaiveDateTime::parse_from_str("2024-11-03 01:30", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(site_local_to_utc(fold, zone), Some(at("2024-11-03T05:30:00Z")));
    }
}
