use tracing::warn;

use crate::{
    db::{options, OptionStore},
    models::breaking_news::{DisplayOptions, SettingsError, SettingsForm, DISPLAY_OPTIONS_KEY},
    services::validation::{is_valid_hex_color, sanitize_text_field},
};

/// Validate one color field. A rejected value keeps `previous` and queues
/// an error; the rejected input itself goes nowhere.
fn validate_color(
    value: &str,
    label: &str,
    previous: Option<&String>,
    errors: &mut Vec<SettingsError>,
) -> Option<String> {
    let value = sanitize_text_field(value);
    if is_valid_hex_color(&value) {
        Some(value)
    } else {
        warn!("Rejected {} color {:?}", label, value);
        errors.push(SettingsError::invalid_color(label));
        previous.cloned()
    }
}

/// Build the options to store from a settings submission. Blank color
/// fields are removed so the banner falls back to its defaults.
pub fn validate(form: &SettingsForm, previous: &DisplayOptions) -> (DisplayOptions, Vec<SettingsError>) {
    let mut errors = Vec::new();

    let title = form.title.as_deref().map(sanitize_text_field);

    let background = form
        .background
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| validate_color(v, "Background", previous.background.as_ref(), &mut errors));

    let color = form
        .color
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| validate_color(v, "Color", previous.color.as_ref(), &mut errors));

    (DisplayOptions { title, background, color }, errors)
}

pub struct DisplayOptionsService;

impl DisplayOptionsService {
    pub async fn get(store: &dyn OptionStore) -> anyhow::Result<DisplayOptions> {
        Ok(options::load(store, DISPLAY_OPTIONS_KEY).await?)
    }

    /// Validate and store a settings submission, returning what was stored
    /// together with any queued validation errors.
    pub async fn update(
        store: &dyn OptionStore,
        form: &SettingsForm,
    ) -> anyhow::Result<(DisplayOptions, Vec<SettingsError>)> {
        let previous = Self::get(store).await?;
        let (next, errors) = validate(form, &previous);
        options::save(store, DISPLAY_OPTIONS_KEY, &next).await?;
        Ok((next, errors))
    }
}
