//! Wire protocol for Plaza.
//!
//! This crate defines the "language" that clients and the field server
//! speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Credential`],
//!   [`PublicId`], etc.) — the messages and identities on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the field
//! actor (authoritative state). It doesn't know about connections or
//! members — it only knows message shapes.
//!
//! ```text
//! Transport (bytes) → Protocol (messages) → Field (member state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, Credential, MemberInfo, MemberRef, Position, PublicId,
    ServerMessage,
};
