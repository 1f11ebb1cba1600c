//! The shared field for Plaza: join admission, movement, and event
//! fan-out, all behind a single actor task.
//!
//! # Key types
//!
//! - [`FieldHandle`] / [`spawn_field`] — talk to the running field actor
//! - [`FieldConfig`] — field dimensions, step size, clamp policy
//! - [`BroadcastRouter`] / [`Audience`] — audience-targeted fan-out
//! - [`FieldError`] — what can go wrong
//!
//! The actor owns the member store and the router; everything the
//! outside world does goes through commands on the handle, which is
//! what guarantees that joins, moves, and disconnects are applied one
//! at a time.

mod actor;
mod config;
mod error;
pub mod motion;
mod route;

pub use actor::{FieldHandle, spawn_field};
pub use config::FieldConfig;
pub use error::FieldError;
pub use route::{Audience, BroadcastRouter, OutboundSender};
