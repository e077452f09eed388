//! Who gets the breaking-news slot when a post is saved.
//!
//! The slot holds one post. Saving the post that already holds it (or
//! the first post ever) always writes through; saving some other post only
//! takes the slot over when that post is explicitly marked active. Every
//! other save leaves the current holder untouched, without complaint.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    db::{options, OptionStore, PostRepository},
    models::{
        auth::AuthenticatedUser,
        breaking_news::{
            BreakingNewsRecord, MetaboxFields, MetaboxForm, MetaboxView, RECORD_OPTION_KEY,
        },
        post::PostKind,
    },
    services::{
        expiry::{site_local_to_utc, utc_to_site_local},
        metrics::SAVES_COUNTER,
        nonce::{NonceIssuer, METABOX_NONCE_ACTION},
        validation::{parse_datetime, sanitize_text_field, EXPIRY_FORMAT},
    },
};

/// Why a save was refused before the slot was even considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidNonce,
    PostNotFound,
    Forbidden,
    Autosave,
    Revision,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::InvalidNonce => "invalid_nonce",
            SkipReason::PostNotFound => "post_not_found",
            SkipReason::Forbidden => "forbidden",
            SkipReason::Autosave => "autosave",
            SkipReason::Revision => "revision",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The slot now holds this record.
    Committed(BreakingNewsRecord),
    /// Another post holds the slot and this save did not claim it.
    Discarded,
    Skipped(SkipReason),
}

impl SaveOutcome {
    fn label(&self) -> &'static str {
        match self {
            SaveOutcome::Committed(_) => "committed",
            SaveOutcome::Discarded => "discarded",
            SaveOutcome::Skipped(reason) => reason.as_str(),
        }
    }
}

fn is_checked(value: Option<&str>) -> bool {
    matches!(
        value.map(str::trim),
        Some("yes") | Some("on") | Some("true") | Some("1")
    )
}

/// Turn a raw submission into fully-populated fields. Missing checkboxes are
/// `false`; an expiry that fails validation, or names a wall-clock time the
/// site zone skips, is dropped.
pub fn normalize(form: &MetaboxForm, zone: Tz) -> MetaboxFields {
    let expiry = form
        .expiry
        .as_deref()
        .map(sanitize_text_field)
        .and_then(|raw| parse_datetime(&raw, EXPIRY_FORMAT))
        .and_then(|local| site_local_to_utc(local, zone));

    MetaboxFields {
        is_active: is_checked(form.is_active.as_deref()),
        custom_title: form
            .custom_title
            .as_deref()
            .map(sanitize_text_field)
            .unwrap_or_default(),
        is_expirable: is_checked(form.is_expirable.as_deref()),
        expiry,
    }
}

/// Whether saving `post_id` with `fields` may overwrite `current`.
pub fn is_save_allowed(post_id: i64, fields: &MetaboxFields, current: &BreakingNewsRecord) -> bool {
    match current.post_id {
        None => true,
        Some(holder) if holder == post_id => true,
        Some(_) => fields.is_active,
    }
}

pub struct ActivationService;

impl ActivationService {
    /// Handle a metabox submission for `post_id`.
    pub async fn save_metabox(
        store: &dyn OptionStore,
        posts: &dyn PostRepository,
        nonces: &NonceIssuer,
        zone: Tz,
        user: &AuthenticatedUser,
        post_id: i64,
        form: &MetaboxForm,
        now: DateTime<Utc>,
    ) -> anyhow::Result<SaveOutcome> {
        let outcome =
            Self::decide(store, posts, nonces, zone, user, post_id, form, now).await?;
        SAVES_COUNTER.with_label_values(&[outcome.label()]).inc();
        Ok(outcome)
    }

    async fn decide(
        store: &dyn OptionStore,
        posts: &dyn PostRepository,
        nonces: &NonceIssuer,
        zone: Tz,
        user: &AuthenticatedUser,
        post_id: i64,
        form: &MetaboxForm,
        now: DateTime<Utc>,
    ) -> anyhow::Result<SaveOutcome> {
        let nonce = form.nonce.as_deref().map(str::trim).unwrap_or_default();
        if !nonces.verify(nonce, METABOX_NONCE_ACTION, user.user_id, now) {
            return Ok(SaveOutcome::Skipped(SkipReason::InvalidNonce));
        }

        let post = match posts.get_post(post_id).await? {
            Some(post) => post,
            None => return Ok(SaveOutcome::Skipped(SkipReason::PostNotFound)),
        };
        if !user.role.can_edit_post(user.user_id, &post) {
            return Ok(SaveOutcome::Skipped(SkipReason::Forbidden));
        }
        match post.kind {
            PostKind::Autosave => return Ok(SaveOutcome::Skipped(SkipReason::Autosave)),
            PostKind::Revision => return Ok(SaveOutcome::Skipped(SkipReason::Revision)),
            PostKind::Post => {}
        }

        let fields = normalize(form, zone);
        let current: BreakingNewsRecord = options::load(store, RECORD_OPTION_KEY).await?;

        if !is_save_allowed(post_id, &fields, &current) {
            debug!(
                "Save of post {} discarded: slot held by post {:?}",
                post_id, current.post_id
            );
            return Ok(SaveOutcome::Discarded);
        }

        let record = BreakingNewsRecord::from_fields(post_id, fields);
        options::save(store, RECORD_OPTION_KEY, &record).await?;
        info!(
            "Breaking news slot written by post {} (active: {}, expiry: {:?})",
            post_id, record.is_active, record.effective_expiry()
        );
        Ok(SaveOutcome::Committed(record))
    }

    /// Metabox contents for `post_id`: the stored fields when this post
    /// holds the slot, defaults otherwise.
    pub async fn metabox_view(
        store: &dyn OptionStore,
        nonces: &NonceIssuer,
        zone: Tz,
        user: &AuthenticatedUser,
        post_id: i64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<MetaboxView> {
        let current: BreakingNewsRecord = options::load(store, RECORD_OPTION_KEY).await?;
        let record = if current.post_id == Some(post_id) {
            current
        } else {
            BreakingNewsRecord::default()
        };

        Ok(MetaboxView {
            post_id,
            is_active: record.is_active,
            custom_title: record.custom_title,
            is_expirable: record.is_expirable,
            expiry: record
                .expiry
                .map(|e| utc_to_site_local(e, zone))
                .unwrap_or_default(),
            min_date: utc_to_site_local(now, zone),
            nonce: nonces.create(METABOX_NONCE_ACTION, user.user_id, now),
        })
    }
}
