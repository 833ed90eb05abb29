//! New-entry announcement queue
//!
//! Newly created entries are announced one at a time in a full-screen
//! overlay. Each announcement types out its text, holds, plays an exit
//! transition, and then releases the next item after a short gap.
//!
//! The queue never owns a timer itself. Every transition returns the delay
//! and step to schedule next; the caller feeds the step back into `advance`
//! when the delay has elapsed. The `processing` flag keeps a second item from
//! starting while one is still running or inside the release gap.

use std::collections::VecDeque;
use std::time::Duration;

use crate::models::EntryId;

/// Overlay timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayTimings {
    /// Delay between revealed characters
    pub char_interval: Duration,
    /// How long the complete text stays up
    pub hold: Duration,
    /// Length of the exit transition
    pub exit: Duration,
    /// Pause between one item clearing and the next starting
    pub gap: Duration,
}

impl Default for OverlayTimings {
    fn default() -> Self {
        Self {
            char_interval: Duration::from_millis(40),
            hold: Duration::from_millis(2000),
            exit: Duration::from_millis(300),
            gap: Duration::from_millis(100),
        }
    }
}

/// An entry waiting for or showing its announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayItem {
    pub id: EntryId,
    pub content: String,
    /// When the item was enqueued
    pub start_time: Duration,
}

/// Phase of the active announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Revealing,
    Holding,
    /// Still on screen, marked as leaving
    Exiting,
}

/// Timer payload driving the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStep {
    RevealChar,
    HoldDone,
    ExitDone,
    GapDone,
}

/// The next step to schedule and how long to wait for it
pub type Scheduled = (Duration, OverlayStep);

#[derive(Debug, Clone)]
struct ActiveOverlay {
    item: OverlayItem,
    chars: Vec<char>,
    shown: usize,
    phase: OverlayPhase,
}

/// What the overlay currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayView {
    pub id: EntryId,
    /// The revealed prefix
    pub text: String,
    /// The whole announcement, for reserving space up front
    pub full_text: String,
    pub shown: usize,
    pub total: usize,
    pub phase: OverlayPhase,
}

/// Strictly sequential FIFO of announcements
#[derive(Debug, Default)]
pub struct OverlayQueue {
    timings: OverlayTimings,
    queue: VecDeque<OverlayItem>,
    active: Option<ActiveOverlay>,
    processing: bool,
}

impl OverlayQueue {
    pub fn new(timings: OverlayTimings) -> Self {
        Self {
            timings,
            ..Self::default()
        }
    }

    /// Add an item. If the queue was idle it becomes active right away and
    /// the first step is returned.
    pub fn enqueue(&mut self, item: OverlayItem) -> Option<Scheduled> {
        self.queue.push_back(item);
        if self.processing {
            return None;
        }
        self.activate_next()
    }

    /// Run a scheduled step
    pub fn advance(&mut self, step: OverlayStep) -> Option<Scheduled> {
        match step {
            OverlayStep::RevealChar => {
                let active = self.active.as_mut()?;
                if active.phase != OverlayPhase::Revealing {
                    return None;
                }
                active.shown = (active.shown + 1).min(active.chars.len());
                if active.shown == active.chars.len() {
                    active.phase = OverlayPhase::Holding;
                    Some((self.timings.hold, OverlayStep::HoldDone))
                } else {
                    Some((self.timings.char_interval, OverlayStep::RevealChar))
                }
            }
            OverlayStep::HoldDone => {
                let active = self.active.as_mut()?;
                active.phase = OverlayPhase::Exiting;
                Some((self.timings.exit, OverlayStep::ExitDone))
            }
            OverlayStep::ExitDone => {
                self.active.take()?;
                Some((self.timings.gap, OverlayStep::GapDone))
            }
            OverlayStep::GapDone => {
                if self.active.is_some() {
                    return None;
                }
                self.activate_next()
            }
        }
    }

    fn activate_next(&mut self) -> Option<Scheduled> {
        let Some(item) = self.queue.pop_front() else {
            self.processing = false;
            return None;
        };

        self.processing = true;
        let chars: Vec<char> = item.content.chars().collect();
        let (phase, next) = if chars.is_empty() {
            (OverlayPhase::Holding, (self.timings.hold, OverlayStep::HoldDone))
        } else {
            (
                OverlayPhase::Revealing,
                (self.timings.char_interval, OverlayStep::RevealChar),
            )
        };

        self.active = Some(ActiveOverlay {
            item,
            chars,
            shown: 0,
            phase,
        });
        Some(next)
    }

    /// Id of the item on screen
    pub fn active_id(&self) -> Option<&EntryId> {
        self.active.as_ref().map(|a| &a.item.id)
    }

    pub fn active_item(&self) -> Option<&OverlayItem> {
        self.active.as_ref().map(|a| &a.item)
    }

    pub fn view(&self) -> Option<OverlayView> {
        self.active.as_ref().map(|a| OverlayView {
            id: a.item.id.clone(),
            text: a.chars[..a.shown].iter().collect(),
            full_text: a.chars.iter().collect(),
            shown: a.shown,
            total: a.chars.len(),
            phase: a.phase,
        })
    }

    /// Items waiting behind the active one
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Drop the active item and everything queued
    pub fn teardown(&mut self) {
        self.queue.clear();
        self.active = None;
        self.processing = false;
    }
}
