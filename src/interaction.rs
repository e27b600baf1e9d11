//! Hover and click handling for one particle group
//!
//! Pointer events are queued as they arrive and drained once per frame, before
//! the interpolator runs. Hover is exclusive across the group; the click "pop"
//! is an independent per-slot timer that expires lazily during the frame pass.

use bevy::prelude::*;
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::Arc;
use crate::audio::{AudioCue, AudioSink};
use crate::constants::*;
use crate::types::TreeMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    PointerEnter(usize),
    PointerLeave,
    Click(usize),
}

/// Cursor look requested by the layer after a hover transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorAffordance {
    Pointer,
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PopAnimation {
    pub start_time: f32,
}

/// Which interactions a group exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteractionRules {
    pub hover: bool,
    pub pop: bool,
    pub click_cue: bool,
}

impl InteractionRules {
    pub const NONE: Self = Self { hover: false, pop: false, click_cue: false };
    pub const ORNAMENT: Self = Self { hover: true, pop: true, click_cue: true };
    pub const TOPPER: Self = Self { hover: true, pop: false, click_cue: true };

    pub fn is_interactive(&self) -> bool {
        self.hover || self.click_cue
    }
}

pub struct InteractionLayer {
    rules: InteractionRules,
    capacity: usize,
    hovered: Option<usize>,
    pops: Vec<Option<PopAnimation>>,
    pop_duration: f32,
    queue: VecDeque<InteractionEvent>,
    sink: Arc<dyn AudioSink>,
}

impl InteractionLayer {
    pub fn new(capacity: usize, rules: InteractionRules, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            rules,
            capacity,
            hovered: None,
            pops: vec![None; if rules.pop { capacity } else { 0 }],
            pop_duration: POP_DURATION,
            queue: VecDeque::with_capacity(8),
            sink,
        }
    }

    pub fn rules(&self) -> InteractionRules {
        self.rules
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn is_hovered(&self, index: usize) -> bool {
        self.hovered == Some(index)
    }

    pub fn pop(&self, index: usize) -> Option<PopAnimation> {
        self.pops.get(index).copied().flatten()
    }

    pub fn active_pops(&self) -> usize {
        self.pops.iter().filter(|p| p.is_some()).count()
    }

    pub fn pop_duration(&self) -> f32 {
        self.pop_duration
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue an event; it takes effect on the next `drain`.
    pub fn push(&mut self, event: InteractionEvent) {
        self.queue.push_back(event);
    }

    /// Apply queued events in arrival order. Returns the last cursor change, if any.
    pub fn drain(&mut self, mode: TreeMode, now: f32) -> Option<CursorAffordance> {
        let mut cursor = None;
        while let Some(event) = self.queue.pop_front() {
            if let Some(change) = self.apply(event, mode, now) {
                cursor = Some(change);
            }
        }
        cursor
    }

    fn apply(&mut self, event: InteractionEvent, mode: TreeMode, now: f32) -> Option<CursorAffordance> {
        match event {
            InteractionEvent::PointerEnter(index) => {
                if !self.rules.hover || index >= self.capacity || self.hovered == Some(index) {
                    return None;
                }
                // Entering a new instance implicitly leaves the previous one
                self.hovered = Some(index);
                self.sink.trigger(AudioCue::Chime);
                Some(CursorAffordance::Pointer)
            }
            InteractionEvent::PointerLeave => {
                self.hovered.take().map(|_| CursorAffordance::Default)
            }
            InteractionEvent::Click(index) => {
                if !mode.is_assembled() || index >= self.capacity {
                    return None;
                }
                if self.rules.pop {
                    // A second click restarts the timer instead of stacking
                    self.pops[index] = Some(PopAnimation { start_time: now });
                    debug!("pop started on instance {} at {:.2}s", index, now);
                }
                if self.rules.click_cue {
                    self.sink.trigger(AudioCue::Arpeggio);
                }
                None
            }
        }
    }

    /// Elapsed time of the slot's pop, clearing it once `duration` has passed.
    pub fn pop_elapsed(&mut self, index: usize, now: f32) -> Option<f32> {
        let slot = self.pops.get_mut(index)?;
        let pop = (*slot)?;
        let elapsed = (now - pop.start_time).max(0.0);
        if elapsed >= self.pop_duration {
            *slot = None;
            debug!("pop on instance {} finished", index);
            return None;
        }
        Some(elapsed)
    }

    /// Stop every running pop (mode switch or unmount).
    pub fn cancel_pops(&mut self) {
        for slot in &mut self.pops {
            *slot = None;
        }
    }
}

/// Extra scale fraction of a pop: a half sine that is 0 at both ends.
pub fn pop_envelope(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 || elapsed <= 0.0 || elapsed >= duration {
        return 0.0;
    }
    (elapsed / duration * PI).sin() * POP_SCALE_BOOST
}
