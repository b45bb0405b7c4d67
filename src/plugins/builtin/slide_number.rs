use super::string_option;
use crate::models::PluginOptions;
use crate::plugins::{Plugin, PluginContext, PluginError};
use crate::services::render::escape_html;
use crate::state::NavigationState;

const NAME: &str = "slide-number";

pub const DEFAULT_FORMAT: &str = "{current} / {total}";

/// Slide counter. `{current}` is the 1-based slide number, `{total}` the
/// slide count.
#[derive(Debug)]
pub struct SlideNumber {
    format: String,
    enabled: bool,
    context: Option<PluginContext>,
}

impl SlideNumber {
    pub fn from_options(options: &PluginOptions) -> Result<Self, PluginError> {
        let format = string_option(NAME, options, "format")?.unwrap_or(DEFAULT_FORMAT);
        if !format.contains("{current}") {
            return Err(PluginError::invalid_config(
                NAME,
                "format",
                "must contain {current}",
            ));
        }
        Ok(Self {
            format: format.to_string(),
            enabled: false,
            context: None,
        })
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn label(&self, state: &NavigationState) -> Option<String> {
        let current = state.slide_number()?;
        Some(
            self.format
                .replace("{current}", &current.to_string())
                .replace("{total}", &state.total_slides.to_string()),
        )
    }
}

impl Plugin for SlideNumber {
    fn init(&mut self, ctx: PluginContext) -> Result<(), PluginError> {
        self.context = Some(ctx);
        Ok(())
    }

    fn destroy(&mut self) {
        self.context = None;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn overlay(&self) -> Option<String> {
        let state = self.context.as_ref()?.navigation();
        let label = self.label(&state)?;
        Some(format!(
            r#"<div class="slidedeck-slide-number">{}</div>"#,
            escape_html(&label)
        ))
    }
}
