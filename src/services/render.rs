use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::{
    db::{OptionStore, PostRepository},
    models::breaking_news::{Banner, DisplayOptions, RenderContext},
    services::{
        display_options::DisplayOptionsService,
        expiry::{ActivePost, ExpiryService},
        metrics::RENDERS_COUNTER,
    },
};

pub const DEFAULT_BACKGROUND: &str = "#1e73be";
pub const DEFAULT_COLOR: &str = "#ffffff";

/// Banner for an active post, or `None` when the post is not published.
pub fn build_banner(
    active: &ActivePost,
    options: &DisplayOptions,
    context: RenderContext,
    site_url: &str,
) -> Option<Banner> {
    let post = &active.post;
    if !post.is_published() {
        return None;
    }

    let custom = active.record.custom_title.trim();
    let title = if custom.is_empty() {
        post.title.clone()
    } else {
        active.record.custom_title.clone()
    };

    let link = match context {
        RenderContext::Public => post.permalink(site_url),
        RenderContext::Admin => post.edit_link(site_url),
    };

    Some(Banner {
        post_id: post.id,
        label: options.title.clone().unwrap_or_default(),
        title,
        link,
        background: options
            .background
            .clone()
            .unwrap_or_else(|| DEFAULT_BACKGROUND.into()),
        color: options.color.clone().unwrap_or_else(|| DEFAULT_COLOR.into()),
        context,
    })
}

impl Banner {
    pub fn to_html(&self) -> String {
        let layout = match self.context {
            RenderContext::Public => "width:100%;position:fixed;",
            RenderContext::Admin => "width:95%;font-size:16px;",
        };
        let background = format!("background:{};", self.background);
        let color = format!("color:{};", self.color);

        format!(
            r#"<center><div style="padding:10px;{}{}{}">{}: <a href="{}" style="{}">{}</a></div></center>"#,
            encode_double_quoted_attribute(layout),
            encode_double_quoted_attribute(&background),
            encode_double_quoted_attribute(&color),
            encode_text(&self.label),
            encode_double_quoted_attribute(&self.link),
            encode_double_quoted_attribute(&color),
            encode_text(&self.title),
        )
    }
}

pub struct RenderService;

impl RenderService {
    /// Evaluate the slot (clearing it if lapsed) and build the banner for
    /// `context`.
    pub async fn current_banner(
        store: &dyn OptionStore,
        posts: &dyn PostRepository,
        site_url: &str,
        context: RenderContext,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Banner>> {
        let active = match ExpiryService::get_active_post(store, posts, now).await? {
            Some(active) => active,
            None => return Ok(None),
        };
        let options = DisplayOptionsService::get(store).await?;

        let banner = build_banner(&active, &options, context, site_url);
        if banner.is_some() {
            RENDERS_COUNTER.with_label_values(&[context.as_str()]).inc();
        }
        Ok(banner)
    }
}
