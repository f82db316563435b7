#![forbid(unsafe_code)]

//! Host integration: input listeners, frame requests and the frame clock.
//!
//! The navigator never talks to a platform directly. A [`Host`] registers
//! input listeners and schedules animation frames on its behalf, handing
//! back RAII guards. Dropping a guard releases the underlying resource
//! (removes the listener, cancels the pending frame), so deactivating a
//! navigator is just dropping its guards.
//!
//! [`HeadlessHost`] is an in-memory host for tests and server-side
//! embedding; it counts live resources instead of touching a platform.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Kind of input listener the navigator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Wheel,
    Touch,
    Pointer,
    Resize,
}

impl ListenerKind {
    /// Every listener an active navigator holds.
    pub const ALL: [Self; 4] = [Self::Wheel, Self::Touch, Self::Pointer, Self::Resize];
}

/// Registered input listener. Dropping it removes the listener.
pub struct ListenerGuard {
    kind: ListenerKind,
    remove: Option<Box<dyn FnOnce()>>,
}

impl ListenerGuard {
    /// Wrap a listener whose removal runs `remove`.
    #[must_use]
    pub fn new(kind: ListenerKind, remove: impl FnOnce() + 'static) -> Self {
        Self {
            kind,
            remove: Some(Box::new(remove)),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// How a frame request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRelease {
    /// The frame callback ran.
    Fired,
    /// The request was dropped before it ran.
    Cancelled,
}

/// Pending frame request. Dropping it cancels the frame.
pub struct FrameGuard {
    release: Option<Box<dyn FnOnce(FrameRelease)>>,
}

impl FrameGuard {
    /// Wrap a frame request; `release` learns whether it fired or was
    /// cancelled.
    #[must_use]
    pub fn new(release: impl FnOnce(FrameRelease) + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Mark the frame as delivered; nothing is left to cancel.
    pub fn fired(mut self) {
        if let Some(release) = self.release.take() {
            release(FrameRelease::Fired);
        }
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(FrameRelease::Cancelled);
        }
    }
}

impl fmt::Debug for FrameGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// Platform services the navigator needs.
pub trait Host {
    /// Start delivering events of `kind`.
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerGuard;

    /// Schedule one frame callback.
    fn request_frame(&mut self) -> FrameGuard;
}

// ---------------------------------------------------------------------------
// Frame clock
// ---------------------------------------------------------------------------

/// Longest delta [`FrameClock::tick`] reports. Hosts stop delivering frames
/// while a view is hidden; the first frame back advances by at most this.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// Converts host frame timestamps into deltas.
///
/// The first frame after a reset has a zero delta. Timestamps that go
/// backwards also yield zero. Gaps longer than [`MAX_FRAME_DELTA`] are
/// clamped to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last: Option<Duration>,
}

impl FrameClock {
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Record a frame at monotonic time `now` and return the delta.
    pub fn tick(&mut self, now: Duration) -> Duration {
        let dt = self
            .last
            .map_or(Duration::ZERO, |last| now.saturating_sub(last))
            .min(MAX_FRAME_DELTA);
        self.last = Some(self.last.map_or(now, |last| last.max(now)));
        dt
    }

    /// Forget the previous frame.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

// ---------------------------------------------------------------------------
// Headless host
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct HeadlessState {
    listeners: HashMap<ListenerKind, usize>,
    pending_frames: usize,
    frames_requested: u64,
    frames_fired: u64,
    frames_cancelled: u64,
}

/// In-memory host that counts live resources.
///
/// Clones share state, so a test can keep one handle while the navigator
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live listeners of `kind`.
    #[must_use]
    pub fn listeners(&self, kind: ListenerKind) -> usize {
        self.state.borrow().listeners.get(&kind).copied().unwrap_or(0)
    }

    /// Live listeners of every kind.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.values().sum()
    }

    /// Frame requests neither fired nor cancelled.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().pending_frames
    }

    #[must_use]
    pub fn frames_requested(&self) -> u64 {
        self.state.borrow().frames_requested
    }

    #[must_use]
    pub fn frames_fired(&self) -> u64 {
        self.state.borrow().frames_fired
    }

    #[must_use]
    pub fn frames_cancelled(&self) -> u64 {
        self.state.borrow().frames_cancelled
    }
}

impl Host for HeadlessHost {
    fn add_listener(&mut self, kind: ListenerKind) -> ListenerGuard {
        *self.state.borrow_mut().listeners.entry(kind).or_insert(0) += 1;
        let state = Rc::clone(&self.state);
        ListenerGuard::new(kind, move || {
            if let Some(count) = state.borrow_mut().listeners.get_mut(&kind) {
                *count = count.saturating_sub(1);
            }
        })
    }

    fn request_frame(&mut self) -> FrameGuard {
        {
            let mut state = self.state.borrow_mut();
            state.pending_frames += 1;
            state.frames_requested += 1;
        }
        let state = Rc::clone(&self.state);
        FrameGuard::new(move |release| {
            let mut state = state.borrow_mut();
            state.pending_frames = state.pending_frames.saturating_sub(1);
            match release {
                FrameRelease::Fired => state.frames_fired += 1,
                FrameRelease::Cancelled => state.frames_cancelled += 1,
            }
        })
    }
}
