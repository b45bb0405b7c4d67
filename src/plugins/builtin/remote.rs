use super::string_option;
use crate::engine::events::{EngineEvent, Topic};
use crate::engine::input::Action;
use crate::models::PluginOptions;
use crate::plugins::{Plugin, PluginContext, PluginError};
use serde_yaml_ng::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const NAME: &str = "remote";

/// Custom topic the remote control listens on.
pub const REMOTE_TOPIC: &str = "remote";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Next,
    Previous,
    First,
    Last,
    /// 0-based target, converted from the 1-based `slide` field
    GoTo(usize),
    Overview,
}

impl RemoteCommand {
    /// Parse a payload of the form `{command: next}` or `{command: goto, slide: 3}`.
    ///
    /// A bare string payload is accepted as the command name.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let (command, slide) = match payload {
            Value::String(command) => (command.as_str(), None),
            Value::Mapping(_) => (
                payload.get("command")?.as_str()?,
                payload.get("slide").and_then(Value::as_u64),
            ),
            _ => return None,
        };

        match command {
            "next" => Some(Self::Next),
            "prev" | "previous" => Some(Self::Previous),
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            "overview" => Some(Self::Overview),
            "goto" => {
                let slide = usize::try_from(slide?).ok()?;
                slide.checked_sub(1).map(Self::GoTo)
            }
            _ => None,
        }
    }

    pub fn action(&self) -> Action {
        match *self {
            Self::Next => Action::Next,
            Self::Previous => Action::Previous,
            Self::First => Action::First,
            Self::Last => Action::Last,
            Self::GoTo(index) => Action::GoTo(index),
            Self::Overview => Action::ToggleOverview,
        }
    }
}

/// Turns `remote` events into navigation requests.
///
/// When a `token` is configured, payloads must carry the same token.
#[derive(Debug, Default)]
pub struct RemoteControl {
    token: Option<String>,
    enabled: bool,
    context: Option<PluginContext>,
    accepted: Arc<AtomicUsize>,
}

impl RemoteControl {
    pub fn from_options(options: &PluginOptions) -> Result<Self, PluginError> {
        let token = string_option(NAME, options, "token")?;
        if token.is_some_and(str::is_empty) {
            return Err(PluginError::invalid_config(NAME, "token", "must not be empty"));
        }
        Ok(Self {
            token: token.map(str::to_string),
            ..Self::default()
        })
    }

    /// Commands forwarded to the engine so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Relaxed)
    }
}

impl Plugin for RemoteControl {
    fn init(&mut self, ctx: PluginContext) -> Result<(), PluginError> {
        let requester = ctx.requester();
        let token = self.token.clone();
        let accepted = Arc::clone(&self.accepted);

        ctx.subscribe(Topic::custom(REMOTE_TOPIC), move |event| {
            let EngineEvent::Custom { payload, .. } = event else {
                return Ok(());
            };
            if let Some(expected) = &token {
                let supplied = payload.get("token").and_then(Value::as_str);
                if supplied != Some(expected.as_str()) {
                    anyhow::bail!("remote command rejected: token mismatch");
                }
            }
            let command = RemoteCommand::from_payload(payload)
                .ok_or_else(|| anyhow::anyhow!("unrecognized remote command: {payload:?}"))?;
            if requester.request(command.action()) {
                accepted.fetch_add(1, Ordering::Relaxed);
            }
            Ok(())
        })
        .ok_or_else(|| PluginError::init_failed(NAME, "event bus is closed"))?;

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
}
