// Navigation state module
//
// This module provides the Navigator, the only writer of NavigationState. It
// wraps the state in Arc<RwLock<T>> so read-only NavigationViews can be handed
// to plugins while every mutation stays here.

pub mod gesture;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

pub use gesture::{Point, SWIPE_THRESHOLD, SwipeIntent, swipe_intent};

/// Why a navigation request was refused. State is unchanged in both cases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("slide index {index} is out of range (deck has {total} slides)")]
    OutOfRange { index: usize, total: usize },

    #[error("the deck has no slides")]
    Empty,
}

/// Notification produced by every successful transition.
///
/// `previous_index` is `None` when the deck went from empty to populated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlideChange {
    pub previous_index: Option<usize>,
    pub new_index: usize,
}

impl SlideChange {
    /// Whether the move went towards the end of the deck
    pub fn is_forward(&self) -> bool {
        self.previous_index.is_none_or(|prev| self.new_index >= prev)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavPhase {
    Empty,
    Ready,
}

/// Current position within the deck plus loop policy.
///
/// When `total_slides > 0`, `current_index < total_slides` always holds. With
/// zero slides `current_index` is 0 and meaningless.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct NavigationState {
    pub current_index: usize,
    pub total_slides: usize,
    pub loop_slides: bool,
}

impl NavigationState {
    pub fn phase(&self) -> NavPhase {
        if self.total_slides == 0 {
            NavPhase::Empty
        } else {
            NavPhase::Ready
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_slides == 0
    }

    pub fn is_first(&self) -> bool {
        !self.is_empty() && self.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        !self.is_empty() && self.current_index + 1 == self.total_slides
    }

    /// Position as a 1-based slide number, `None` when empty
    pub fn slide_number(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.current_index + 1)
    }
}

/// Navigation state machine.
///
/// States are `Empty` (no slides) and `Ready`. Every operation takes the write
/// lock once, so readers never observe a half-applied transition. Operations
/// return `Ok(Some(change))` when the position moved, `Ok(None)` for a no-op
/// (edge without loop, or already there) and `Err` when the request is invalid.
#[derive(Debug)]
pub struct Navigator {
    state: Arc<RwLock<NavigationState>>,
}

impl Navigator {
    pub fn new(loop_slides: bool) -> Self {
        Self {
            state: Arc::new(RwLock::new(NavigationState {
                loop_slides,
                ..NavigationState::default()
            })),
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, NavigationState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, NavigationState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> NavigationState {
        *self.read_guard()
    }

    /// Execute a function with read access to the state
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&NavigationState) -> R,
    {
        f(&self.read_guard())
    }

    /// Read-only handle sharing this navigator's state
    pub fn view(&self) -> NavigationView {
        NavigationView {
            state: Arc::clone(&self.state),
        }
    }

    pub fn set_loop(&self, loop_slides: bool) {
        self.write_guard().loop_slides = loop_slides;
    }

    /// Seed a fresh position: index 0 of `total_slides`, no notification.
    pub fn reset(&self, total_slides: usize) {
        let mut state = self.write_guard();
        state.total_slides = total_slides;
        state.current_index = 0;
    }

    /// Adjust to a new slide count.
    ///
    /// - `Empty -> Ready`: position 0, reported as a change from `None`
    /// - `Ready -> Empty`: position cleared, no change reported
    /// - `Ready -> Ready`: position kept when still valid, otherwise clamped to
    ///   the new last slide and reported
    pub fn set_slide_count(&self, total_slides: usize) -> Option<SlideChange> {
        let mut state = self.write_guard();
        let previous = *state;
        state.total_slides = total_slides;

        match (previous.phase(), total_slides) {
            (_, 0) => {
                state.current_index = 0;
                None
            }
            (NavPhase::Empty, _) => {
                state.current_index = 0;
                Some(SlideChange {
                    previous_index: None,
                    new_index: 0,
                })
            }
            (NavPhase::Ready, total) => {
                if previous.current_index < total {
                    None
                } else {
                    state.current_index = total - 1;
                    Some(SlideChange {
                        previous_index: Some(previous.current_index),
                        new_index: total - 1,
                    })
                }
            }
        }
    }

    /// Jump to `index`. Out-of-range indices are refused, never clamped.
    pub fn go_to(&self, index: usize) -> Result<Option<SlideChange>, NavigationError> {
        let mut state = self.write_guard();
        if state.is_empty() {
            return Err(NavigationError::Empty);
        }
        if index >= state.total_slides {
            return Err(NavigationError::OutOfRange {
                index,
                total: state.total_slides,
            });
        }
        Ok(Self::move_to(&mut state, index))
    }

    pub fn next(&self) -> Result<Option<SlideChange>, NavigationError> {
        let mut state = self.write_guard();
        if state.is_empty() {
            return Err(NavigationError::Empty);
        }
        let target = if !state.is_last() {
            state.current_index + 1
        } else if state.loop_slides {
            0
        } else {
            return Ok(None);
        };
        Ok(Self::move_to(&mut state, target))
    }

    pub fn previous(&self) -> Result<Option<SlideChange>, NavigationError> {
        let mut state = self.write_guard();
        if state.is_empty() {
            return Err(NavigationError::Empty);
        }
        let target = if !state.is_first() {
            state.current_index - 1
        } else if state.loop_slides {
            state.total_slides - 1
        } else {
            return Ok(None);
        };
        Ok(Self::move_to(&mut state, target))
    }

    pub fn first(&self) -> Result<Option<SlideChange>, NavigationError> {
        self.go_to(0)
    }

    pub fn last(&self) -> Result<Option<SlideChange>, NavigationError> {
        let total = self.read_guard().total_slides;
        if total == 0 {
            return Err(NavigationError::Empty);
        }
        self.go_to(total - 1)
    }

    fn move_to(state: &mut NavigationState, target: usize) -> Option<SlideChange> {
        if target == state.current_index {
            return None;
        }
        let change = SlideChange {
            previous_index: Some(state.current_index),
            new_index: target,
        };
        state.current_index = target;
        tracing::debug!(
            "Navigated {:?} -> {} of {}",
            change.previous_index,
            target,
            state.total_slides
        );
        Some(change)
    }
}

/// Read-only view of navigation state, cheap to clone.
///
/// This is what plugins get. It has no way to mutate the state; navigation
/// requests go through the engine.
#[derive(Clone, Debug)]
pub struct NavigationView {
    state: Arc<RwLock<NavigationState>>,
}

impl NavigationView {
    pub fn snapshot(&self) -> NavigationState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_index(&self) -> usize {
        self.snapshot().current_index
    }

    pub fn total_slides(&self) -> usize {
        self.snapshot().total_slides
    }
}
