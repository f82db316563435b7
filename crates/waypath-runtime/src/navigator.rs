#![forbid(unsafe_code)]

//! Navigator: one active navigation view.
//!
//! A [`Navigator`] owns the session, travel animator, flashlight mapper and
//! input normalizer for one view, together with the host resources that
//! feed them. There is no global state; each view gets its own navigator.
//!
//! # Lifecycle
//!
//! ```text
//!  new ──► inactive ──activate──► active ──deactivate──► inactive
//!                                   │  ▲
//!                       handle_input│  │frame(now)
//!                                   ▼  │
//!                              publish snapshot
//! ```
//!
//! Activation registers wheel, touch, pointer and resize listeners with the
//! [`Host`] and requests a frame. Deactivation (or drop) releases every
//! listener guard, cancels the pending frame and cancels any travel; after
//! that input and frames are ignored.
//!
//! # Invariants
//!
//! 1. Only one writer moves the position at a time: raw input during a
//!    travel either cancels it or is dropped, per [`ArbitrationPolicy`].
//! 2. At most one frame request is pending.
//! 3. Every input event and frame ends with a snapshot publish; subscribers
//!    only hear about actual changes.

use std::time::Duration;

use tracing::{debug, trace, warn};
use waypath_core::flashlight::FlashlightInputs;
use waypath_core::{
    DeltaOutcome, DeviceClass, FlashlightMapper, InputError, InputEvent, InputNormalizer, Point,
    Session, Size, TravelAnimator, TravelOutcome,
};

use crate::config::{ArbitrationPolicy, ConfigError, NavigationConfig};
use crate::host::{FrameClock, FrameGuard, Host, ListenerGuard, ListenerKind};
use crate::publisher::{SnapshotChanges, SnapshotPublisher, Subscription};
use crate::snapshot::NavigationSnapshot;

/// One navigation view bound to a host.
pub struct Navigator<H: Host> {
    host: H,
    session: Session,
    travel: TravelAnimator,
    flashlight: FlashlightMapper,
    input: InputNormalizer,
    arbitration: ArbitrationPolicy,
    snapshot: SnapshotPublisher,
    clock: FrameClock,
    pointer: Option<Point>,
    viewport: Size,
    device: DeviceClass,
    listeners: Vec<ListenerGuard>,
    pending_frame: Option<FrameGuard>,
    active: bool,
}

impl<H: Host> std::fmt::Debug for Navigator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("session", &self.session)
            .field("travel", &self.travel)
            .field("arbitration", &self.arbitration)
            .field("device", &self.device)
            .field("listeners", &self.listeners.len())
            .field("frame_pending", &self.pending_frame.is_some())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Navigator<H> {
    /// Build an inactive navigator at position 0.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Validation`] if any tunable is out of range, or
    /// [`ConfigError::Path`] if the waypoint table is malformed.
    pub fn new(host: H, config: &NavigationConfig) -> Result<Self, ConfigError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        let path = config.build_path()?;
        let session = Session::with_tuning(path, config.friction, config.scan);
        let flashlight = FlashlightMapper::new(config.flashlight);
        let snapshot = SnapshotPublisher::new(NavigationSnapshot::capture(
            &session,
            flashlight.current(),
            false,
        ));
        Ok(Self {
            host,
            session,
            travel: TravelAnimator::new(config.travel),
            flashlight,
            input: InputNormalizer::new(config.input),
            arbitration: config.arbitration,
            snapshot,
            clock: FrameClock::new(),
            pointer: None,
            viewport: Size::default(),
            device: DeviceClass::default(),
            listeners: Vec::new(),
            pending_frame: None,
            active: false,
        })
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    #[must_use]
    pub fn is_travelling(&self) -> bool {
        self.travel.is_travelling()
    }

    #[inline]
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> NavigationSnapshot {
        self.snapshot.current()
    }

    /// Shared handle to the publisher, for renderers that poll `version()`.
    #[must_use]
    pub fn publisher(&self) -> SnapshotPublisher {
        self.snapshot.clone()
    }

    /// Call `callback` with every changed snapshot until the returned
    /// guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&NavigationSnapshot) + 'static) -> Subscription {
        self.snapshot.subscribe(callback)
    }

    /// Call `callback` only when a field in `interest` changes.
    pub fn subscribe_to(
        &self,
        interest: SnapshotChanges,
        callback: impl Fn(&NavigationSnapshot, SnapshotChanges) + 'static,
    ) -> Subscription {
        self.snapshot.subscribe_to(interest, callback)
    }

    // -- Lifecycle ----------------------------------------------------------

    /// Register host listeners and start the frame loop. Idempotent.
    pub fn activate(&mut self) {
        if self.active {
            return;
        }
        self.listeners = ListenerKind::ALL
            .into_iter()
            .map(|kind| self.host.add_listener(kind))
            .collect();
        self.active = true;
        self.clock.reset();
        self.flashlight.reset();
        debug!(position = self.session.position(), "navigator activated");
        self.schedule_frame();
    }

    /// Release every host resource and cancel any travel. Idempotent.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.listeners.clear();
        self.pending_frame = None;
        self.travel.cancel();
        debug!(position = self.session.position(), "navigator deactivated");
        self.publish();
    }

    /// Device class reported by the host.
    pub fn set_device(&mut self, device: DeviceClass) {
        self.device = device;
    }

    // -- Input --------------------------------------------------------------

    /// Feed one host event.
    ///
    /// Returns what the resulting scroll delta did, if the event carried
    /// one. Inactive navigators ignore input and return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Non-finite deltas or coordinates; the navigator is unchanged.
    pub fn handle_input(&mut self, event: InputEvent) -> Result<Option<DeltaOutcome>, InputError> {
        if !self.active {
            trace!(?event, "input on inactive navigator ignored");
            return Ok(None);
        }
        let normalized = self
            .input
            .process(event)
            .inspect_err(|err| warn!(%err, "dropping input event"))?;
        if let Some(pointer) = normalized.pointer {
            self.pointer = Some(pointer);
        }
        if let Some(viewport) = normalized.viewport {
            self.viewport = viewport;
        }
        let outcome = normalized.delta.map(|delta| self.apply_scroll(delta));
        self.publish();
        self.schedule_frame();
        Ok(outcome)
    }

    fn apply_scroll(&mut self, delta: f64) -> DeltaOutcome {
        if delta != 0.0 && self.travel.is_travelling() {
            match self.arbitration {
                ArbitrationPolicy::CancelTravel => {
                    self.travel.cancel();
                }
                ArbitrationPolicy::IgnoreInput => {
                    trace!(delta, "scroll ignored during travel");
                    return DeltaOutcome::Ignored;
                }
            }
        }
        self.session.apply_delta(delta)
    }

    // -- Imperative navigation ---------------------------------------------

    /// Reposition directly. Cancels any travel.
    ///
    /// Allowed while inactive so deep links can be restored before
    /// activation.
    pub fn jump_to(&mut self, position: f64) -> Result<(), InputError> {
        self.session.jump_to(position)?;
        self.travel.cancel();
        self.publish();
        Ok(())
    }

    /// Jump to the center of waypoint `id`. Returns `false` for unknown ids.
    pub fn jump_to_waypoint(&mut self, id: &str) -> bool {
        if !self.session.jump_to_waypoint(id) {
            return false;
        }
        self.travel.cancel();
        self.publish();
        true
    }

    /// Fly to waypoint `id` along the shorter arc.
    ///
    /// `on_complete` runs exactly once. Inactive navigators report
    /// [`TravelOutcome::Cancelled`] immediately.
    pub fn animate_to(
        &mut self,
        id: &str,
        on_complete: impl FnOnce(TravelOutcome) + 'static,
    ) -> bool {
        if !self.active {
            debug!(id, "travel requested on inactive navigator");
            on_complete(TravelOutcome::Cancelled);
            return false;
        }
        let started = self.travel.animate_to(&self.session, id, on_complete);
        if started {
            self.publish();
            self.schedule_frame();
        }
        started
    }

    /// Abort the current travel. Returns `true` if one was running.
    pub fn cancel_travel(&mut self) -> bool {
        let cancelled = self.travel.cancel();
        if cancelled {
            self.publish();
        }
        cancelled
    }

    // -- Frames -------------------------------------------------------------

    /// Run one frame at host monotonic time `now`.
    pub fn frame(&mut self, now: Duration) {
        if !self.active {
            trace!("frame on inactive navigator ignored");
            return;
        }
        if let Some(guard) = self.pending_frame.take() {
            guard.fired();
        }
        let dt = self.clock.tick(now);
        if let Some(outcome) = self.travel.advance(dt, &mut self.session) {
            debug!(%outcome, position = self.session.position(), "travel finished");
        }
        let inputs = self.flashlight_inputs();
        self.flashlight.update(&self.session, &inputs, dt);
        self.publish();
        if self.wants_frames() {
            self.schedule_frame();
        }
    }

    fn flashlight_inputs(&self) -> FlashlightInputs {
        FlashlightInputs {
            pointer: self.pointer.unwrap_or_else(|| self.viewport.center()),
            viewport: self.viewport,
            device: self.device,
        }
    }

    fn wants_frames(&self) -> bool {
        self.travel.is_travelling()
            || !self.flashlight.is_settled()
            || self.flashlight.config().jitter_amplitude > 0.0
    }

    fn schedule_frame(&mut self) {
        if self.active && self.pending_frame.is_none() {
            self.pending_frame = Some(self.host.request_frame());
        }
    }

    fn publish(&self) {
        self.snapshot.publish(NavigationSnapshot::capture(
            &self.session,
            self.flashlight.current(),
            self.travel.is_travelling(),
        ));
    }
}

impl<H: Host> Drop for Navigator<H> {
    fn drop(&mut self) {
        self.deactivate();
    }
}
