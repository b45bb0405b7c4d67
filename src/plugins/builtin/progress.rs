use super::string_option;
use crate::models::PluginOptions;
use crate::plugins::{Plugin, PluginContext, PluginError};

const NAME: &str = "progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BarPosition {
    Top,
    #[default]
    Bottom,
}

impl BarPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

/// Thin bar showing how far through the deck the viewer is.
#[derive(Debug, Default)]
pub struct ProgressBar {
    position: BarPosition,
    enabled: bool,
    context: Option<PluginContext>,
}

impl ProgressBar {
    pub fn from_options(options: &PluginOptions) -> Result<Self, PluginError> {
        let position = match string_option(NAME, options, "position")? {
            None | Some("bottom") => BarPosition::Bottom,
            Some("top") => BarPosition::Top,
            Some(other) => {
                return Err(PluginError::invalid_config(
                    NAME,
                    "position",
                    format!("expected top or bottom, got {other:?}"),
                ));
            }
        };
        Ok(Self {
            position,
            ..Self::default()
        })
    }

    pub fn position(&self) -> BarPosition {
        self.position
    }

    /// Share of the deck reached, counting the current slide. `None` before
    /// init or for an empty deck.
    pub fn fraction(&self) -> Option<f64> {
        let state = self.context.as_ref()?.navigation();
        let number = state.slide_number()?;
        Some(number as f64 / state.total_slides as f64)
    }
}

impl Plugin for ProgressBar {
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
        let fraction = self.fraction()?;
        Some(format!(
            r#"<div class="slidedeck-progress slidedeck-progress-{}" style="width: {:.1}%"></div>"#,
            self.position.as_str(),
            fraction * 100.0
        ))
    }
}
