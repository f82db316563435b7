#![forbid(unsafe_code)]

//! Snapshot publishing with per-field change sets.
//!
//! The navigator hands a fresh [`NavigationSnapshot`] to the
//! [`SnapshotPublisher`] after every input event and frame. The publisher
//! diffs it against the previous one into a [`SnapshotChanges`] set and
//! wakes only the listeners interested in those fields, so a renderer that
//! draws the flashlight does not run for scan progress and a progress bar
//! does not run for flashlight jitter.
//!
//! # Invariants
//!
//! 1. `version()` grows by exactly one per publish that changes at least
//!    one field. Identical snapshots publish nothing.
//! 2. A listener runs only when its interest intersects the change set.
//! 3. Listeners run in subscription order with no borrow held, so a callback
//!    may read the publisher, subscribe, or drop any [`Subscription`].
//! 4. Once a [`Subscription`] is dropped its callback never runs again, even
//!    if the drop happens in the middle of a publish.
//!
//! # Failure Modes
//!
//! - A guard dropped while the listener list is borrowed (a callback that
//!   publishes re-entrantly and drops a guard from the inner round) is only
//!   marked dead; the entry is pruned on the next publish.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use tracing::{debug, info_span};
use web_time::Instant;

use crate::snapshot::NavigationSnapshot;

bitflags! {
    /// Snapshot fields that differ between two publishes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SnapshotChanges: u16 {
        /// Scroll position and normalized progress.
        const POSITION   = 1 << 0;
        /// Camera point.
        const CAMERA     = 1 << 1;
        /// Current waypoint id.
        const WAYPOINT   = 1 << 2;
        /// Friction state, and with it the render flags.
        const FRICTION   = 1 << 3;
        /// Sticky-zone membership.
        const STICKY     = 1 << 4;
        /// Scan progress.
        const SCAN       = 1 << 5;
        /// Flashlight target, radius or mode.
        const FLASHLIGHT = 1 << 6;
        /// Click-to-travel started or finished.
        const TRAVEL     = 1 << 7;
    }
}

impl Default for SnapshotChanges {
    fn default() -> Self {
        Self::empty()
    }
}

impl SnapshotChanges {
    /// Fields that differ between `old` and `new`.
    #[must_use]
    pub fn between(old: &NavigationSnapshot, new: &NavigationSnapshot) -> Self {
        let mut changes = Self::empty();
        changes.set(
            Self::POSITION,
            old.position != new.position || old.progress != new.progress,
        );
        changes.set(Self::CAMERA, old.camera != new.camera);
        changes.set(Self::WAYPOINT, old.waypoint_id != new.waypoint_id);
        changes.set(Self::FRICTION, old.friction_state != new.friction_state);
        changes.set(Self::STICKY, old.in_sticky_zone != new.in_sticky_zone);
        changes.set(Self::SCAN, old.scan_progress != new.scan_progress);
        changes.set(Self::FLASHLIGHT, old.flashlight != new.flashlight);
        changes.set(Self::TRAVEL, old.travelling != new.travelling);
        changes
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

type Callback = dyn Fn(&NavigationSnapshot, SnapshotChanges);

struct Listener {
    interest: SnapshotChanges,
    live: Cell<bool>,
    callback: Box<Callback>,
}

struct PublisherState {
    current: NavigationSnapshot,
    version: u64,
    listeners: Vec<Rc<Listener>>,
}

/// Latest navigation snapshot plus the listeners waiting on it.
///
/// Cloning yields another handle to the same state.
#[derive(Clone)]
pub struct SnapshotPublisher {
    state: Rc<RefCell<PublisherState>>,
}

impl fmt::Debug for SnapshotPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SnapshotPublisher")
            .field("version", &state.version)
            .field("listeners", &state.listeners.len())
            .finish_non_exhaustive()
    }
}

impl SnapshotPublisher {
    /// Start at version 0 holding `initial`.
    #[must_use]
    pub fn new(initial: NavigationSnapshot) -> Self {
        Self {
            state: Rc::new(RefCell::new(PublisherState {
                current: initial,
                version: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Clone of the latest snapshot.
    #[must_use]
    pub fn current(&self) -> NavigationSnapshot {
        self.state.borrow().current.clone()
    }

    /// Read the latest snapshot without cloning it.
    pub fn with_current<R>(&self, f: impl FnOnce(&NavigationSnapshot) -> R) -> R {
        f(&self.state.borrow().current)
    }

    /// Number of publishes that changed something.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.borrow().version
    }

    /// Live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.live.get())
            .count()
    }

    /// Run `callback` on every change until the guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&NavigationSnapshot) + 'static) -> Subscription {
        self.subscribe_to(SnapshotChanges::all(), move |snapshot, _| callback(snapshot))
    }

    /// Run `callback` whenever a field in `interest` changes.
    pub fn subscribe_to(
        &self,
        interest: SnapshotChanges,
        callback: impl Fn(&NavigationSnapshot, SnapshotChanges) + 'static,
    ) -> Subscription {
        let listener = Rc::new(Listener {
            interest,
            live: Cell::new(true),
            callback: Box::new(callback),
        });
        self.state.borrow_mut().listeners.push(Rc::clone(&listener));
        Subscription {
            state: Rc::downgrade(&self.state),
            listener,
        }
    }

    /// Replace the snapshot and notify interested listeners.
    ///
    /// Returns the change set; empty means nothing was published.
    pub fn publish(&self, next: NavigationSnapshot) -> SnapshotChanges {
        let (changes, version, woken) = {
            let mut state = self.state.borrow_mut();
            let changes = SnapshotChanges::between(&state.current, &next);
            if changes.is_empty() {
                return changes;
            }
            state.current = next.clone();
            state.version += 1;
            state.listeners.retain(|l| l.live.get());
            let woken: Vec<Rc<Listener>> = state
                .listeners
                .iter()
                .filter(|l| l.interest.intersects(changes))
                .cloned()
                .collect();
            (changes, state.version, woken)
        };
        if woken.is_empty() {
            return changes;
        }

        let started = Instant::now();
        let span = info_span!(
            "waypath.publish",
            version,
            listeners = woken.len() as u64,
            changes = changes.bits(),
            duration_us = tracing::field::Empty
        );
        let _entered = span.enter();
        for listener in &woken {
            if listener.live.get() {
                (listener.callback)(&next, changes);
            }
        }
        let duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        span.record("duration_us", duration_us);
        debug!(version, ?changes, duration_us, "snapshot published");
        changes
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    state: Weak<RefCell<PublisherState>>,
    listener: Rc<Listener>,
}

impl Subscription {
    /// Fields this listener wakes for.
    #[inline]
    #[must_use]
    pub fn interest(&self) -> SnapshotChanges {
        self.listener.interest
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("interest", &self.listener.interest)
            .finish_non_exhaustive()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.listener.live.set(false);
        if let Some(state) = self.state.upgrade()
            && let Ok(mut state) = state.try_borrow_mut()
        {
            state
                .listeners
                .retain(|l| !Rc::ptr_eq(l, &self.listener));
        }
    }
}
