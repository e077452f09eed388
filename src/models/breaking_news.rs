use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Option key holding the single breaking-news slot.
pub const RECORD_OPTION_KEY: &str = "breaking_news_record";

/// Option key holding the site-wide display options.
pub const DISPLAY_OPTIONS_KEY: &str = "breaking_news_options";

/// The single breaking-news slot. An empty (default) record means no post
/// holds the slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakingNewsRecord {
    pub post_id: Option<i64>,
    pub is_active: bool,
    pub custom_title: String,
    pub is_expirable: bool,
    /// Only meaningful when both `is_active` and `is_expirable` are set.
    pub expiry: Option<DateTime<Utc>>,
}

impl BreakingNewsRecord {
    /// Build the record that replaces the slot when `post_id` commits.
    pub fn from_fields(post_id: i64, fields: MetaboxFields) -> Self {
        Self {
            post_id: Some(post_id),
            is_active: fields.is_active,
            custom_title: fields.custom_title,
            is_expirable: fields.is_expirable,
            expiry: fields.expiry,
        }
    }

    /// The expiry instant, if this record is subject to one.
    pub fn effective_expiry(&self) -> Option<DateTime<Utc>> {
        if self.is_active && self.is_expirable {
            self.expiry
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Raw metabox submission. Unchecked checkboxes are simply absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaboxForm {
    pub nonce: Option<String>,
    pub is_active: Option<String>,
    pub custom_title: Option<String>,
    pub is_expirable: Option<String>,
    /// `YYYY-MM-DDTHH:MM` in the site time zone.
    pub expiry: Option<String>,
}

/// Metabox submission after sanitization, with every field present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaboxFields {
    pub is_active: bool,
    pub custom_title: String,
    pub is_expirable: bool,
    pub expiry: Option<DateTime<Utc>>,
}

/// What the metabox shows for a given post.
#[derive(Debug, Clone, Serialize)]
pub struct MetaboxView {
    pub post_id: i64,
    pub is_active: bool,
    pub custom_title: String,
    pub is_expirable: bool,
    /// Stored expiry re-rendered in the site zone, or empty.
    pub expiry: String,
    /// Earliest selectable expiry (now, site zone).
    pub min_date: String,
    pub nonce: String,
}

/// Site-wide banner options. Colors are `#rrggbb` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Body for POST /admin/settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    pub title: Option<String>,
    pub background: Option<String>,
    pub color: Option<String>,
}

/// A validation message queued for display on the settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsError {
    pub setting: String,
    pub code: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl SettingsError {
    pub fn invalid_color(label: &str) -> Self {
        Self {
            setting: DISPLAY_OPTIONS_KEY.into(),
            code: format!("{label}error"),
            message: format!("Insert a valid color for {label}"),
            kind: "error".into(),
        }
    }
}

/// Where a banner is being shown; decides link target and inline style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderContext {
    Public,
    Admin,
}

impl RenderContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderContext::Public => "public",
            RenderContext::Admin => "admin",
        }
    }
}

/// Everything needed to draw the banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub post_id: i64,
    pub label: String,
    pub title: String,
    pub link: String,
    pub background: String,
    pub color: String,
    pub context: RenderContext,
}
