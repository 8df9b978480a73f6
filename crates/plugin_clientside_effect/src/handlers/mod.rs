//! # Event Handlers
//!
//! Per-message behaviour of the [`EffectDispatcher`](crate::EffectDispatcher),
//! split by concern:
//!
//! - [`connection`] - connection open/close resets the avatar list
//! - [`users`] - `Users` and `UserRemove` keep the registry current and
//!   trigger room-change reapplication
//! - [`effects`] - `AvatarEffect` echoes and the form's set/clear actions
//! - [`catalog`] - effect catalog loading and the ready notification
//!
//! Every inbound handler returns `Result<(), ExtensionError>`; errors are
//! logged by the interceptor and only cost the offending packet.

pub mod catalog;
pub mod connection;
pub mod effects;
pub mod users;
