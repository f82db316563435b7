#![forbid(unsafe_code)]

//! Runtime: activation, frame scheduling and change notification.
//!
//! # Role in Waypath
//! `waypath-runtime` wraps the pure `waypath-core` engine in a per-view
//! [`Navigator`] context. The host environment (browser shell, native
//! window, test harness) implements [`Host`] to register input listeners
//! and schedule frames; the navigator turns host events and frame
//! timestamps into engine calls and publishes a [`NavigationSnapshot`]
//! through a [`SnapshotPublisher`].
//!
//! # Primary responsibilities
//! - **Navigator**: lifecycle, input arbitration, frame loop.
//! - **Host**: RAII listener and frame guards, released on deactivation.
//! - **Publisher**: snapshot diffing into per-field change sets, with
//!   filtered RAII subscriptions.
//! - **Config**: every tunable as data, loadable from TOML/JSON with the
//!   `config` feature.

pub mod config;
pub mod host;
pub mod navigator;
pub mod publisher;
pub mod snapshot;

pub use config::{ArbitrationPolicy, ConfigError, NavigationConfig, PathConfig};
pub use host::{
    FrameClock, FrameGuard, HeadlessHost, Host, ListenerGuard, ListenerKind, MAX_FRAME_DELTA,
};
pub use navigator::Navigator;
pub use publisher::{SnapshotChanges, SnapshotPublisher, Subscription};
pub use snapshot::NavigationSnapshot;
