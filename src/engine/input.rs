// Input bindings - keyboard mapping and gesture tracking
//
// The engine owns one InputBindings. Hosts forward raw input to the engine;
// nothing is interpreted while the corresponding source is detached.

use crate::state::{Point, SwipeIntent, swipe_intent};

/// A navigation intent, from input or from a plugin request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Previous,
    First,
    Last,
    /// 0-based
    GoTo(usize),
    ToggleOverview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    PageUp,
    PageDown,
    Home,
    End,
    Space,
    Escape,
    Enter,
    Char(char),
}

impl Key {
    /// Parse a DOM `KeyboardEvent.key` style name.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Home" => Self::Home,
            "End" => Self::End,
            " " | "Space" | "Spacebar" => Self::Space,
            "Escape" | "Esc" => Self::Escape,
            "Enter" => Self::Enter,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

/// Where keyboard focus was when the key was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Document,
    /// Text input, textarea or contenteditable element
    TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
    pub focus: FocusTarget,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            focus: FocusTarget::Document,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn in_text_input(mut self) -> Self {
        self.focus = FocusTarget::TextInput;
        self
    }
}

/// Fixed key map. Keys typed into a text field never navigate.
pub fn key_action(input: &KeyInput) -> Option<Action> {
    if input.focus == FocusTarget::TextInput {
        return None;
    }

    match input.key {
        Key::Space if input.shift => Some(Action::Previous),
        Key::ArrowRight | Key::ArrowDown | Key::PageDown | Key::Space => Some(Action::Next),
        Key::ArrowLeft | Key::ArrowUp | Key::PageUp => Some(Action::Previous),
        Key::Home => Some(Action::First),
        Key::End => Some(Action::Last),
        Key::Escape => Some(Action::ToggleOverview),
        Key::Char(c) => match c.to_ascii_lowercase() {
            'n' | 'l' | 'j' => Some(Action::Next),
            'p' | 'h' | 'k' => Some(Action::Previous),
            'o' => Some(Action::ToggleOverview),
            _ => None,
        },
        Key::Enter => None,
    }
}

fn intent_action(intent: SwipeIntent) -> Option<Action> {
    match intent {
        SwipeIntent::Next => Some(Action::Next),
        SwipeIntent::Previous => Some(Action::Previous),
        SwipeIntent::None => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Keyboard,
    Touch,
    Pointer,
}

/// The bounded set of input listeners the engine registers.
///
/// Gesture sources remember only the start point; the end point arrives with
/// the release and the pair is handed to [`swipe_intent`].
#[derive(Debug, Default)]
pub struct InputBindings {
    keyboard: bool,
    touch: bool,
    pointer: bool,
    touch_start: Option<Point>,
    pointer_start: Option<Point>,
}

impl InputBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the attached set. Touch and pointer drag both follow `gestures`.
    pub fn attach(&mut self, keyboard: bool, gestures: bool) {
        self.detach_all();
        self.keyboard = keyboard;
        self.touch = gestures;
        self.pointer = gestures;
        tracing::debug!("Input attached: keyboard={}, gestures={}", keyboard, gestures);
    }

    pub fn detach_all(&mut self) {
        *self = Self::default();
    }

    pub fn is_attached(&self, source: InputSource) -> bool {
        match source {
            InputSource::Keyboard => self.keyboard,
            InputSource::Touch => self.touch,
            InputSource::Pointer => self.pointer,
        }
    }

    pub fn attached(&self) -> Vec<InputSource> {
        [InputSource::Keyboard, InputSource::Touch, InputSource::Pointer]
            .into_iter()
            .filter(|source| self.is_attached(*source))
            .collect()
    }

    pub fn key(&self, input: &KeyInput) -> Option<Action> {
        if !self.keyboard {
            return None;
        }
        key_action(input)
    }

    /// Returns false when touch input is detached
    pub fn touch_start(&mut self, point: Point) -> bool {
        if !self.touch {
            return false;
        }
        self.touch_start = Some(point);
        true
    }

    pub fn touch_end(&mut self, point: Point) -> Option<Action> {
        let start = self.touch_start.take()?;
        intent_action(swipe_intent(start, point))
    }

    pub fn pointer_down(&mut self, point: Point) -> bool {
        if !self.pointer {
            return false;
        }
        self.pointer_start = Some(point);
        true
    }

    pub fn pointer_up(&mut self, point: Point) -> Option<Action> {
        let start = self.pointer_start.take()?;
        intent_action(swipe_intent(start, point))
    }
}
