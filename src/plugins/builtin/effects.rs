use super::string_option;
use crate::models::PluginOptions;
use crate::plugins::{Plugin, PluginContext, PluginError};
use crate::services::render::escape_html;
use serde_yaml_ng::{Mapping, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const NAME: &str = "effects";

/// Custom topic effects are announced on, payload `{effect, slide}` with a
/// 1-based slide number.
pub const EFFECT_TOPIC: &str = "effect";

const DEFAULT_EFFECT: &str = "confetti";

/// Which slide fires the effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectTrigger {
    #[default]
    Last,
    /// 0-based index
    Slide(usize),
}

impl EffectTrigger {
    fn from_value(value: Option<&Value>) -> Result<Self, PluginError> {
        let invalid = || PluginError::invalid_config(NAME, "slide", "expected \"last\" or a slide number >= 1");
        match value {
            None | Some(Value::Null) => Ok(Self::Last),
            Some(Value::String(s)) if s == "last" => Ok(Self::Last),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .and_then(|n| n.checked_sub(1))
                .map(Self::Slide)
                .ok_or_else(invalid),
            Some(_) => Err(invalid()),
        }
    }

    pub fn matches(&self, index: usize, total: usize) -> bool {
        match *self {
            Self::Last => total > 0 && index + 1 == total,
            Self::Slide(target) => index == target && index < total,
        }
    }
}

/// Fires a one-shot visual effect whenever the trigger slide is reached.
#[derive(Debug, Default)]
pub struct Effects {
    effect: String,
    trigger: EffectTrigger,
    enabled: bool,
    context: Option<PluginContext>,
    fired: Arc<AtomicUsize>,
}

impl Effects {
    pub fn from_options(options: &PluginOptions) -> Result<Self, PluginError> {
        let effect = string_option(NAME, options, "effect")?.unwrap_or(DEFAULT_EFFECT);
        if effect.trim().is_empty() {
            return Err(PluginError::invalid_config(NAME, "effect", "must not be empty"));
        }
        Ok(Self {
            effect: effect.to_string(),
            trigger: EffectTrigger::from_value(options.get("slide"))?,
            ..Self::default()
        })
    }

    pub fn effect(&self) -> &str {
        &self.effect
    }

    pub fn trigger(&self) -> EffectTrigger {
        self.trigger
    }

    /// How many times the effect has been announced
    pub fn fired(&self) -> usize {
        self.fired.load(Ordering::Relaxed)
    }
}

impl Plugin for Effects {
    fn init(&mut self, ctx: PluginContext) -> Result<(), PluginError> {
        let publisher = ctx.publisher();
        let navigation = ctx.navigation_view();
        let effect = self.effect.clone();
        let trigger = self.trigger;
        let fired = Arc::clone(&self.fired);

        ctx.on_slide_change(move |change| {
            if !trigger.matches(change.new_index, navigation.total_slides()) {
                return Ok(());
            }
            let mut payload = Mapping::new();
            payload.insert("effect".into(), effect.as_str().into());
            payload.insert("slide".into(), (change.new_index as u64 + 1).into());
            if publisher.publish(EFFECT_TOPIC, Value::Mapping(payload)) {
                fired.fetch_add(1, Ordering::Relaxed);
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

    fn overlay(&self) -> Option<String> {
        let state = self.context.as_ref()?.navigation();
        self.trigger
            .matches(state.current_index, state.total_slides)
            .then(|| {
                format!(
                    r#"<div class="slidedeck-effect slidedeck-effect-{}" aria-hidden="true"></div>"#,
                    escape_html(&self.effect)
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::{EngineEvent, EventBus, Topic};
    use crate::plugins::context::{ContextSeed, SlideView};
    use crate::services::SlideDeck;
    use crate::state::{Navigator, SlideChange};
    use std::sync::{Mutex, RwLock};
    use tokio::sync::mpsc;

    fn options(yaml: &str) -> PluginOptions {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn test_trigger_options() {
        assert_eq!(
            Effects::from_options(&PluginOptions::new()).unwrap().trigger(),
            EffectTrigger::Last
        );
        assert_eq!(
            Effects::from_options(&options("slide: 2")).unwrap().trigger(),
            EffectTrigger::Slide(1)
        );
        assert!(Effects::from_options(&options("slide: 0")).is_err());
        assert!(Effects::from_options(&options("slide: first")).is_err());
        assert!(Effects::from_options(&options("effect: ''")).is_err());
    }

    #[test]
    fn test_trigger_matching() {
        assert!(EffectTrigger::Last.matches(2, 3));
        assert!(!EffectTrigger::Last.matches(1, 3));
        assert!(!EffectTrigger::Last.matches(0, 0));
        assert!(EffectTrigger::Slide(1).matches(1, 3));
        assert!(!EffectTrigger::Slide(5).matches(5, 3));
    }

    #[test]
    fn test_reaching_trigger_publishes_effect() {
        let navigator = Navigator::new(false);
        navigator.set_slide_count(3);
        let bus = EventBus::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let seed = ContextSeed::new(
            navigator.view(),
            SlideView::new(Arc::new(RwLock::new(SlideDeck::new()))),
            bus.clone(),
            tx,
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.on(Topic::custom(EFFECT_TOPIC), move |event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });

        let mut effects = Effects::from_options(&options("effect: fireworks")).unwrap();
        let ctx = seed.context_for(NAME, &PluginOptions::new());
        effects.init(ctx.clone()).unwrap();
        ctx.go_live();
        assert!(effects.overlay().is_none());

        let change = navigator.last().unwrap().unwrap();
        bus.emit(&EngineEvent::SlideChanged(change));
        bus.emit(&EngineEvent::SlideChanged(SlideChange {
            previous_index: Some(2),
            new_index: 1,
        }));

        assert_eq!(effects.fired(), 1);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let EngineEvent::Custom { payload, .. } = &seen[0] else {
            panic!("expected a custom event");
        };
        assert_eq!(payload.get("effect").and_then(Value::as_str), Some("fireworks"));
        assert_eq!(payload.get("slide").and_then(Value::as_u64), Some(3));
        assert!(effects.overlay().unwrap().contains("slidedeck-effect-fireworks"));
    }

    #[test]
    fn test_overlay_escapes_effect_name() {
        let navigator = Navigator::new(false);
        navigator.set_slide_count(1);
        let (tx, _rx) = mpsc::unbounded_channel();
        let seed = ContextSeed::new(
            navigator.view(),
            SlideView::new(Arc::new(RwLock::new(SlideDeck::new()))),
            EventBus::new(),
            tx,
        );

        let mut effects =
            Effects::from_options(&options(r#"effect: 'x" onclick="go'"#)).unwrap();
        effects
            .init(seed.context_for(NAME, &PluginOptions::new()))
            .unwrap();

        let overlay = effects.overlay().unwrap();
        assert!(!overlay.contains(r#"x" onclick"#), "{overlay}");
        assert!(overlay.contains("slidedeck-effect-x&quot; onclick=&quot;go"));
    }
}
