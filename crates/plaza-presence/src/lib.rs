//! Presence layer for Plaza: who is connected, who has joined, and what
//! the server knows about each of them.
//!
//! 1. **Token issuance** — deriving the per-connection credential
//!    ([`TokenIssuer`])
//! 2. **Member records** — the authoritative connection → member mapping
//!    and the ordered roster ([`MemberStore`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Field actor (above)  ← mutates the store, one event at a time
//!     ↕
//! Presence layer (this crate)  ← owns identity and member state
//!     ↕
//! Protocol layer (below)  ← provides Credential, PublicId, Position
//! ```
//!
//! The store is deliberately a plain, single-owner object: the field
//! actor constructs it at startup and is the only task that touches it.

mod error;
mod store;
mod token;

pub use error::PresenceError;
pub use store::{MemberRecord, MemberStore};
pub use token::TokenIssuer;
