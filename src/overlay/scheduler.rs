//! Deferred-wake scheduling boundary.
//!
//! The coordinator never sleeps or polls; every wait is a named wake
//! requested through a [`Scheduler`]. A real host maps wakes onto its
//! event loop (next-tick queue, animation frames, timers); tests use the
//! in-process [`SimulatedScheduler`] and drain wakes by hand.

use std::collections::VecDeque;

/// A deferred continuation the coordinator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Let mutations from the triggering event settle before mounting.
    NextTick,
    /// One frame after mount, so measurement sees a laid-out panel.
    MeasureFrame,
    /// The frame after placement, when the entry scale is released.
    SettleFrame,
    /// Fixed short delay guarding against accidental double-taps; the
    /// duration comes from `OverlayConfig::interaction_delay`.
    InteractionDelay,
    /// The close transition reported completion.
    TransitionEnd,
}

/// Host-side scheduling of deferred wakes. The host delivers each
/// scheduled wake back to `OverlayCoordinator::wake` once its condition
/// holds, in the order scheduled.
pub trait Scheduler {
    fn schedule(&mut self, wake: Wake);
}

/// FIFO scheduler with no notion of time; wakes fire when drained.
#[derive(Debug, Default)]
pub struct SimulatedScheduler {
    queue: VecDeque<Wake>,
}

impl SimulatedScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&mut self) -> Option<Wake> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for SimulatedScheduler {
    fn schedule(&mut self, wake: Wake) {
        self.queue.push_back(wake);
    }
}
