//! The word wall engine
//!
//! `Wall` ties the entry store, reveal animation, weight decay, viewport
//! fitting and the announcement overlay together behind one scheduler. It is
//! single-threaded and does nothing on its own: the host calls `advance`
//! whenever `next_deadline` has passed, feeds it new entries with
//! `on_create`, reports viewport changes with `resize`, and samples `frame`
//! to draw.
//!
//! ## Timers
//!
//! - one reveal tick per entry that is still typing out
//! - one decay tick while any character is still thinning
//! - one overlay step for the active announcement
//!
//! Timers are dispatched at their own deadline, so a host that wakes late
//! still sees every tick with the timestamp it was due at.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::{Clock, Scheduler, TimerId};
use crate::decay::{layout_entry, DecayTicker, EntryLayout};
use crate::fit::{FitParams, SizeTransition, Viewport, ViewportFitter};
use crate::models::{Entry, EntryId};
use crate::overlay::{OverlayItem, OverlayQueue, OverlayStep, OverlayTimings, OverlayView};
use crate::reveal::RevealAnimator;
use crate::store::EntryStore;

/// Animation timing for the whole wall
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallTimings {
    /// Period of the per-entry reveal tick
    pub reveal_interval: Duration,
    /// How long a character takes to thin back to normal weight
    pub decay_window: Duration,
    /// Period of the weight re-evaluation tick
    pub decay_tick: Duration,
    /// Length of the eased font-size transition
    pub size_transition: Duration,
    pub overlay: OverlayTimings,
}

impl Default for WallTimings {
    fn default() -> Self {
        Self {
            reveal_interval: Duration::from_millis(60),
            decay_window: Duration::from_millis(400),
            decay_tick: Duration::from_millis(16),
            size_transition: Duration::from_millis(300),
            overlay: OverlayTimings::default(),
        }
    }
}

/// Timer payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WallTimer {
    RevealTick(EntryId),
    DecayTick,
    Overlay(OverlayStep),
}

/// Notifications for the host, drained with `Wall::drain_events`
#[derive(Debug, Clone, PartialEq)]
pub enum WallEvent {
    /// An entry's displayed length grew
    LengthChanged {
        id: EntryId,
        displayed_length: usize,
    },
    /// The fitted font size changed
    FontSizeChanged { size: f64 },
    /// An announcement became active
    OverlayStarted { id: EntryId },
    /// An announcement finished its exit transition
    OverlayFinished { id: EntryId },
}

/// Everything needed to draw one frame
#[derive(Debug, Clone)]
pub struct WallFrame {
    /// Entries in wall order
    pub entries: Vec<EntryLayout>,
    /// Eased font size at the frame's time
    pub font_size: f64,
    /// Fitted size the transition is heading to
    pub target_font_size: f64,
    pub total_displayed: usize,
    pub overlay: Option<OverlayView>,
}

/// Live text rendering and animation engine
pub struct Wall {
    clock: Arc<dyn Clock>,
    timings: WallTimings,
    store: EntryStore,
    reveals: RevealAnimator,
    reveal_timers: HashMap<EntryId, TimerId>,
    decay: DecayTicker,
    decay_timer: Option<TimerId>,
    overlay: OverlayQueue,
    overlay_timer: Option<TimerId>,
    fitter: ViewportFitter,
    viewport: Viewport,
    font_size: f64,
    transition: SizeTransition,
    scheduler: Scheduler<WallTimer>,
    events: Vec<WallEvent>,
    dirty: bool,
}

impl Wall {
    pub fn new(clock: Arc<dyn Clock>, timings: WallTimings) -> Self {
        Self::with_fit_params(clock, timings, FitParams::default())
    }

    pub fn with_fit_params(clock: Arc<dyn Clock>, timings: WallTimings, params: FitParams) -> Self {
        let font_size = params.default_size;
        Self {
            clock,
            transition: SizeTransition::new(font_size, timings.size_transition),
            overlay: OverlayQueue::new(timings.overlay.clone()),
            timings,
            store: EntryStore::new(),
            reveals: RevealAnimator::new(),
            reveal_timers: HashMap::new(),
            decay: DecayTicker::new(),
            decay_timer: None,
            overlay_timer: None,
            fitter: ViewportFitter::new(params),
            viewport: Viewport::default(),
            font_size,
            scheduler: Scheduler::new(),
            events: Vec::new(),
            dirty: true,
        }
    }

    /// Load the entries present at start-up. They show in full, without animation.
    pub fn mount(&mut self, snapshot: Vec<Entry>) {
        self.teardown();
        self.reveals.clear();
        self.store.merge(snapshot);
        for entry in self.store.get() {
            self.reveals.insert_settled(entry);
        }
        info!("Mounted wall with {} entries", self.store.len());

        // the initial size is applied without easing
        self.refit(self.clock.now());
        self.transition.snap(self.font_size);
        self.dirty = true;
    }

    /// Handle an entry created while the display is running
    ///
    /// Returns false if the entry was already on the wall.
    pub fn on_create(&mut self, entry: Entry) -> bool {
        let now = self.clock.now();
        if !self.store.append(entry.clone()) {
            return false;
        }
        debug!("New entry {} ({} chars)", entry.id, entry.char_len());

        self.reveals.start(&entry);
        let timer = self.scheduler.after(
            now,
            self.timings.reveal_interval,
            WallTimer::RevealTick(entry.id.clone()),
        );
        self.reveal_timers.insert(entry.id.clone(), timer);

        if self.decay.start() {
            self.schedule_decay(now);
        }

        let before = self.overlay.active_id().cloned();
        let next = self.overlay.enqueue(OverlayItem {
            id: entry.id.clone(),
            content: entry.content,
            start_time: now,
        });
        self.after_overlay_transition(now, before, next);

        self.refit(now);
        self.dirty = true;
        true
    }

    /// Update the viewport and refit
    pub fn resize(&mut self, width: f64, height: f64) {
        let viewport = Viewport::new(width, height);
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.refit(self.clock.now());
        self.dirty = true;
    }

    /// Run every timer that is due. Returns how many fired.
    pub fn advance(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some((at, timer)) = self.scheduler.pop_due(now) {
            self.dispatch(at, timer);
            fired += 1;
        }
        fired
    }

    fn dispatch(&mut self, at: Duration, timer: WallTimer) {
        match timer {
            WallTimer::RevealTick(id) => self.on_reveal_tick(at, id),
            WallTimer::DecayTick => self.on_decay_tick(at),
            WallTimer::Overlay(step) => {
                self.overlay_timer = None;
                let before = self.overlay.active_id().cloned();
                let next = self.overlay.advance(step);
                self.after_overlay_transition(at, before, next);
            }
        }
        self.dirty = true;
    }

    fn on_reveal_tick(&mut self, at: Duration, id: EntryId) {
        self.reveal_timers.remove(&id);
        let Some(displayed_length) = self.reveals.tick(&id, at) else {
            return;
        };

        self.events.push(WallEvent::LengthChanged {
            id: id.clone(),
            displayed_length,
        });
        self.refit(at);

        if self.reveals.is_revealing(&id) {
            let timer = self.scheduler.after(
                at,
                self.timings.reveal_interval,
                WallTimer::RevealTick(id.clone()),
            );
            self.reveal_timers.insert(id, timer);
        } else {
            debug!("Entry {} fully revealed", id);
        }
    }

    fn on_decay_tick(&mut self, at: Duration) {
        self.decay_timer = None;
        let animating = self.reveals.any_animating(at, self.timings.decay_window);
        if self.decay.on_tick(animating) {
            self.schedule_decay(at);
        }
    }

    fn schedule_decay(&mut self, now: Duration) {
        let timer = self
            .scheduler
            .after(now, self.timings.decay_tick, WallTimer::DecayTick);
        self.decay_timer = Some(timer);
    }

    fn after_overlay_transition(
        &mut self,
        now: Duration,
        before: Option<EntryId>,
        next: Option<(Duration, OverlayStep)>,
    ) {
        let after = self.overlay.active_id().cloned();
        if before != after {
            if let Some(id) = before {
                self.events.push(WallEvent::OverlayFinished { id });
            }
            if let Some(id) = after {
                debug!("Announcing entry {}", id);
                self.events.push(WallEvent::OverlayStarted { id });
            }
        }

        if let Some((delay, step)) = next {
            if let Some(stale) = self.overlay_timer.take() {
                self.scheduler.cancel(stale);
            }
            let timer = self.scheduler.after(now, delay, WallTimer::Overlay(step));
            self.overlay_timer = Some(timer);
        }
    }

    /// Recompute the fitted size from current per-entry state
    fn refit(&mut self, now: Duration) {
        let size = self.fitter.fit(self.total_displayed(), self.viewport);
        if size != self.font_size {
            self.font_size = size;
            self.transition.retarget(size, now);
            self.events.push(WallEvent::FontSizeChanged { size });
        }
    }

    /// Sum of every entry's displayed length
    pub fn total_displayed(&self) -> usize {
        self.store
            .get()
            .iter()
            .map(|e| self.reveals.displayed_length(&e.id))
            .sum()
    }

    pub fn displayed_length(&self, id: &EntryId) -> usize {
        self.reveals.displayed_length(id)
    }

    pub fn is_revealing(&self, id: &EntryId) -> bool {
        self.reveal_timers.contains_key(id)
    }

    pub fn is_decay_ticking(&self) -> bool {
        self.decay_timer.is_some()
    }

    /// Fitted font size (the transition target)
    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Font size currently applied, part way through the easing
    pub fn applied_font_size(&self, now: Duration) -> f64 {
        self.transition.value(now)
    }

    pub fn entries(&self) -> &[Entry] {
        self.store.get()
    }

    pub fn overlay(&self) -> Option<OverlayView> {
        self.overlay.view()
    }

    pub fn overlay_pending(&self) -> usize {
        self.overlay.pending()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Earliest pending timer, for the host's sleep
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Whether anything visible changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        let dirty = self.dirty || !self.transition.is_settled(self.clock.now());
        self.dirty = false;
        dirty
    }

    pub fn drain_events(&mut self) -> Vec<WallEvent> {
        std::mem::take(&mut self.events)
    }

    /// Sample the wall for drawing
    pub fn frame(&self, now: Duration) -> WallFrame {
        let window = self.timings.decay_window;
        let entries = self
            .store
            .get()
            .iter()
            .filter_map(|entry| {
                self.reveals
                    .get(&entry.id)
                    .map(|state| layout_entry(entry, state, now, window))
            })
            .collect();

        WallFrame {
            entries,
            font_size: self.transition.value(now),
            target_font_size: self.font_size,
            total_displayed: self.total_displayed(),
            overlay: self.overlay.view(),
        }
    }

    /// Cancel every timer and drop queued announcements
    pub fn teardown(&mut self) {
        self.scheduler.clear();
        self.reveal_timers.clear();
        self.decay.stop();
        self.decay_timer = None;
        self.overlay.teardown();
        self.overlay_timer = None;
    }
}
