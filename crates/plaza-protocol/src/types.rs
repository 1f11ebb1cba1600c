//! Core protocol types for Plaza's wire format.
//!
//! This module defines every type that travels "on the wire" between a
//! client and the field server: the two client→server requests (`join`,
//! `move`) and the server→client session events (`token`, `join-result`,
//! `member-join`, `member-move`, `member-quit`).
//!
//! The central design point is the split between a member's two
//! identities:
//!
//! - [`Credential`] — the secret token issued at connection time. Only
//!   the owning client ever sees it.
//! - [`PublicId`] — the sequence number peers use to track that member's
//!   avatar without learning the secret.
//!
//! Server events that fan out to both audiences carry a [`MemberRef`],
//! which is one projection or the other.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A member's public identity: a small, strictly increasing sequence
/// number assigned when the connection opens.
///
/// Public ids are unique for the lifetime of the server process and are
/// never reclaimed on disconnect — peers can safely use one as a stable
/// key for an avatar.
///
/// `#[serde(transparent)]` makes `PublicId(42)` serialize as plain `42`,
/// which is what the client SDK expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(pub u64);

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// A member's secret identity: the per-connection token the server issues
/// immediately after the connection opens.
///
/// A request is authenticated by comparing the presented credential
/// against the one stored for that exact connection — credentials are
/// never validated cross-connection. The credential must never appear in
/// any payload routed to other members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(pub String);

impl Credential {
    /// Returns the credential as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One of the two identity projections carried by fan-out events.
///
/// The self-facing copy of an event carries the credential (the client
/// recognizes its own secret and updates local state); the peer-facing
/// copy carries the public id. `#[serde(untagged)]` keeps the original
/// wire shape: the same field holds either a hex string or a number, and
/// deserialization disambiguates by JSON type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberRef {
    /// Self-facing projection: the member's own secret token.
    Secret(Credential),
    /// Peer-facing projection: the non-secret sequence number.
    Public(PublicId),
}

// ---------------------------------------------------------------------------
// Field data
// ---------------------------------------------------------------------------

/// An avatar's coordinates on the shared 2D field.
///
/// Signed, because the default movement policy does not clamp to the
/// field bounds — repeated moves in one direction can walk an avatar
/// past the visible edge (see `FieldConfig::clamp` in `plaza-field`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Convenience constructor, mostly for tests.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One entry in the "who else is here" list a freshly joined client
/// receives. Carries only the public projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// The member's public id.
    pub id: PublicId,
    /// The avatar the member picked when joining.
    pub avatar: u8,
    /// The member's current position.
    pub pos: Position,
}

// ---------------------------------------------------------------------------
// ClientMessage — requests from the client
// ---------------------------------------------------------------------------

/// A request from a client to the field server.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "Join", "token": "ab12…", "avatar": 2 }`. This format is
/// easy to build and match on from a JavaScript client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Admission request: present the issued credential and pick an
    /// avatar. The server assigns the initial position.
    Join { token: Credential, avatar: u8 },

    /// Movement command. `key` is a platform key-code integer; the
    /// server maps W/A/S/D (87/65/83/68) to a fixed-step displacement
    /// and ignores anything else.
    Move { token: Credential, key: u32 },
}

// ---------------------------------------------------------------------------
// ServerMessage — session events from the server
// ---------------------------------------------------------------------------

/// A session event from the field server to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent once per connection, immediately after open. Delivers the
    /// secret credential to its owner and nobody else.
    Token { token: Credential },

    /// Requester-only reply to a `Join`. On success `members` holds the
    /// other currently joined members in roster order; on failure
    /// `message` says why (without distinguishing the exact cause).
    JoinResult {
        status: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        members: Option<Vec<MemberInfo>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Requester-only failure reply to a `Move`. Successful moves are
    /// answered with a self-facing [`MemberMove`](Self::MemberMove)
    /// instead.
    MoveResult { status: bool, message: String },

    /// A member joined the field. Sent twice per successful join:
    /// self-facing first (`who` is the credential), then peer-facing to
    /// everyone else (`who` is the public id).
    MemberJoin {
        who: MemberRef,
        avatar: u8,
        pos: Position,
    },

    /// A member moved. Same two-projection fan-out as `MemberJoin`.
    MemberMove { who: MemberRef, pos: Position },

    /// A member disconnected. Peer-facing only — the disconnecting
    /// client is gone and gets nothing.
    MemberQuit { who: PublicId },
}

// =========================================================================
// Tests
// =========================================================================
