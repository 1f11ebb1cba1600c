//! The member store: the authoritative record of everyone on the field.
//!
//! This is the central piece of the presence layer. It owns, for each
//! open connection, the issued credential, the public sequence number,
//! and (once joined) the avatar choice and position — plus the roster,
//! an ordered list of joined connections used for deterministic
//! enumeration.
//!
//! # Concurrency note
//!
//! `MemberStore` is NOT thread-safe by itself — plain `HashMap` and
//! `Vec`, no locks. This is intentional: the store is owned by the
//! single field actor task and every event is processed to completion
//! against it before the next one starts, so interior locking would be
//! pure overhead.

use std::collections::HashMap;

use plaza_protocol::{Credential, MemberInfo, Position, PublicId};
use plaza_transport::ConnectionId;

use crate::{PresenceError, TokenIssuer};

/// A single member's authoritative state.
///
/// Created at registration with identity only; `avatar` and `pos` stay
/// empty until the member's join is admitted. Destroyed at disconnect.
#[derive(Debug, Clone)]
pub struct MemberRecord {
    /// The secret credential issued for this connection.
    pub credential: Credential,

    /// The non-secret sequence number peers use to track this member.
    pub public_id: PublicId,

    /// The avatar picked at join time. `None` until joined.
    pub avatar: Option<u8>,

    /// The current field position. `None` until joined.
    pub pos: Option<Position>,
}

impl MemberRecord {
    /// A member counts as joined once an avatar is set.
    pub fn is_joined(&self) -> bool {
        self.avatar.is_some()
    }
}

/// Authoritative mapping of connection → member record, plus the roster.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ complete_join() ──→ update_position()* ──→ remove()
///    │                 │
///    ▼                 ▼
/// [record, no avatar]  [record + roster entry]
/// ```
///
/// Constructed at server start with the token issuer and handed to the
/// field actor; the store has no ambient global state.
pub struct MemberStore {
    /// All registered connections, joined or not.
    members: HashMap<ConnectionId, MemberRecord>,

    /// Joined connections in join order. Gives `snapshot` a stable,
    /// deterministic iteration order; membership itself lives in
    /// `members`.
    roster: Vec<ConnectionId>,

    /// Derives credentials for new registrations.
    issuer: TokenIssuer,

    /// The next public sequence number. Strictly increasing for the
    /// lifetime of the process, incremented once per registration and
    /// never reclaimed on disconnect.
    next_public: u64,
}

impl MemberStore {
    /// Creates an empty store that issues credentials with `issuer`.
    pub fn new(issuer: TokenIssuer) -> Self {
        Self {
            members: HashMap::new(),
            roster: Vec::new(),
            issuer,
            next_public: 1,
        }
    }

    /// Allocates a record for a newly opened connection and returns the
    /// credential to deliver to it plus its public id.
    ///
    /// # Errors
    /// Returns [`PresenceError::DuplicateConnection`] if the connection
    /// already has a record.
    pub fn register(
        &mut self,
        conn: ConnectionId,
    ) -> Result<(Credential, PublicId), PresenceError> {
        if self.members.contains_key(&conn) {
            return Err(PresenceError::DuplicateConnection(conn));
        }

        let credential = self.issuer.issue(conn);
        let public_id = PublicId(self.next_public);
        self.next_public += 1;

        self.members.insert(
            conn,
            MemberRecord {
                credential: credential.clone(),
                public_id,
                avatar: None,
                pos: None,
            },
        );

        tracing::info!(%conn, %public_id, "member registered");
        Ok((credential, public_id))
    }

    /// Completes a member's join: records the avatar and initial
    /// position and appends the connection to the roster.
    ///
    /// # Errors
    /// - [`PresenceError::NotRegistered`] — no record for this connection
    /// - [`PresenceError::AlreadyJoined`] — avatar already set
    pub fn complete_join(
        &mut self,
        conn: ConnectionId,
        avatar: u8,
        pos: Position,
    ) -> Result<(), PresenceError> {
        let record = self
            .members
            .get_mut(&conn)
            .ok_or(PresenceError::NotRegistered(conn))?;

        if record.is_joined() {
            return Err(PresenceError::AlreadyJoined(conn));
        }

        record.avatar = Some(avatar);
        record.pos = Some(pos);
        self.roster.push(conn);

        tracing::info!(
            %conn,
            public_id = %record.public_id,
            avatar,
            %pos,
            "member joined"
        );
        Ok(())
    }

    /// Overwrites a joined member's position in place.
    ///
    /// # Errors
    /// Returns [`PresenceError::NotJoined`] if the connection has no
    /// record or has not joined yet.
    pub fn update_position(
        &mut self,
        conn: ConnectionId,
        pos: Position,
    ) -> Result<(), PresenceError> {
        let record = self
            .members
            .get_mut(&conn)
            .filter(|r| r.is_joined())
            .ok_or(PresenceError::NotJoined(conn))?;

        record.pos = Some(pos);
        Ok(())
    }

    /// Deletes a member's record and roster entry.
    ///
    /// Returns the removed member's public id, or `None` if the
    /// connection had no record. Absence is deliberately NOT an error:
    /// disconnect signals from the transport can be duplicated or race
    /// with other cleanup.
    pub fn remove(&mut self, conn: ConnectionId) -> Option<PublicId> {
        self.roster.retain(|c| *c != conn);
        let record = self.members.remove(&conn)?;
        tracing::info!(%conn, public_id = %record.public_id, "member removed");
        Some(record.public_id)
    }

    /// Enumerates all joined members except `excluding`, in roster
    /// order. This answers a newly joined client's "who else is here".
    pub fn snapshot(&self, excluding: ConnectionId) -> Vec<MemberInfo> {
        self.roster
            .iter()
            .filter(|conn| **conn != excluding)
            .filter_map(|conn| {
                let record = self.members.get(conn)?;
                Some(MemberInfo {
                    id: record.public_id,
                    avatar: record.avatar?,
                    pos: record.pos?,
                })
            })
            .collect()
    }

    /// Checks a presented credential against the one stored for this
    /// exact connection. `false` when the connection is not registered —
    /// credentials are never matched cross-connection.
    pub fn credential_matches(
        &self,
        conn: ConnectionId,
        presented: &Credential,
    ) -> bool {
        self.members
            .get(&conn)
            .is_some_and(|record| record.credential == *presented)
    }

    /// Looks up the record for a connection.
    pub fn get(&self, conn: ConnectionId) -> Option<&MemberRecord> {
        self.members.get(&conn)
    }

    /// Returns the number of registered connections (joined or not).
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the connection ids of all joined members, roster order.
    pub fn joined(&self) -> &[ConnectionId] {
        &self.roster
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `MemberStore`, covering the registration → join →
    //! move → remove lifecycle and the invariants on credentials and
    //! public ids.

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn store() -> MemberStore {
        MemberStore::new(TokenIssuer::new("abcdefghijklmn12345"))
    }

    fn conn(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    /// Registers and joins a connection at the given position.
    fn join(s: &mut MemberStore, c: ConnectionId, avatar: u8) -> Credential {
        let (cred, _) = s.register(c).expect("register should succeed");
        s.complete_join(c, avatar, Position::new(100, 100))
            .expect("join should succeed");
        cred
    }

    // =====================================================================
    // register()
    // =====================================================================

    #[test]
    fn test_register_returns_credential_and_public_id() {
        let mut s = store();

        let (cred, public_id) = s.register(conn(1)).expect("should succeed");

        assert_eq!(cred.as_str().len(), 40);
        assert_eq!(public_id, PublicId(1));

        // Record exists but is not joined yet.
        let record = s.get(conn(1)).expect("record should exist");
        assert!(!record.is_joined());
        assert!(record.pos.is_none());
    }

    #[test]
    fn test_register_duplicate_connection_returns_error() {
        let mut s = store();
        s.register(conn(1)).unwrap();

        let result = s.register(conn(1));

        assert!(matches!(
            result,
            Err(PresenceError::DuplicateConnection(c)) if c == conn(1)
        ));
    }

    #[test]
    fn test_register_assigns_strictly_increasing_public_ids() {
        let mut s = store();

        let (_, first) = s.register(conn(1)).unwrap();
        let (_, second) = s.register(conn(2)).unwrap();
        let (_, third) = s.register(conn(3)).unwrap();

        assert_eq!(first, PublicId(1));
        assert_eq!(second, PublicId(2));
        assert_eq!(third, PublicId(3));
    }

    #[test]
    fn test_public_ids_never_reused_after_remove() {
        // The sequence counter is not reclaimed on disconnect: a new
        // connection after a removal still gets a fresh id.
        let mut s = store();
        s.register(conn(1)).unwrap();
        s.register(conn(2)).unwrap();
        s.remove(conn(1));
        s.remove(conn(2));

        let (_, id) = s.register(conn(3)).unwrap();

        assert_eq!(id, PublicId(3));
    }

    #[test]
    fn test_register_credential_is_deterministic_per_connection() {
        // Same identity, same secret → same credential, even in a fresh
        // store.
        let mut a = store();
        let mut b = store();

        let (cred_a, _) = a.register(conn(5)).unwrap();
        let (cred_b, _) = b.register(conn(5)).unwrap();

        assert_eq!(cred_a, cred_b);
    }

    // =====================================================================
    // complete_join()
    // =====================================================================

    #[test]
    fn test_complete_join_fills_avatar_and_position() {
        let mut s = store();
        s.register(conn(1)).unwrap();

        s.complete_join(conn(1), 2, Position::new(30, 40))
            .expect("should succeed");

        let record = s.get(conn(1)).unwrap();
        assert!(record.is_joined());
        assert_eq!(record.avatar, Some(2));
        assert_eq!(record.pos, Some(Position::new(30, 40)));
    }

    #[test]
    fn test_complete_join_unregistered_returns_not_registered() {
        let mut s = store();

        let result = s.complete_join(conn(9), 1, Position::default());

        assert!(matches!(
            result,
            Err(PresenceError::NotRegistered(c)) if c == conn(9)
        ));
    }

    #[test]
    fn test_complete_join_twice_returns_already_joined() {
        let mut s = store();
        join(&mut s, conn(1), 1);

        let result = s.complete_join(conn(1), 2, Position::default());

        assert!(matches!(
            result,
            Err(PresenceError::AlreadyJoined(c)) if c == conn(1)
        ));

        // The first join's avatar is untouched.
        assert_eq!(s.get(conn(1)).unwrap().avatar, Some(1));
    }

    // =====================================================================
    // update_position()
    // =====================================================================

    #[test]
    fn test_update_position_overwrites_in_place() {
        let mut s = store();
        join(&mut s, conn(1), 1);

        s.update_position(conn(1), Position::new(310, 200))
            .expect("should succeed");

        assert_eq!(
            s.get(conn(1)).unwrap().pos,
            Some(Position::new(310, 200))
        );
    }

    #[test]
    fn test_update_position_before_join_returns_not_joined() {
        let mut s = store();
        s.register(conn(1)).unwrap();

        let result = s.update_position(conn(1), Position::new(1, 1));

        assert!(matches!(
            result,
            Err(PresenceError::NotJoined(c)) if c == conn(1)
        ));
    }

    #[test]
    fn test_update_position_unknown_connection_returns_not_joined() {
        let mut s = store();

        let result = s.update_position(conn(42), Position::new(1, 1));

        assert!(matches!(result, Err(PresenceError::NotJoined(_))));
    }

    // =====================================================================
    // remove()
    // =====================================================================

    #[test]
    fn test_remove_returns_public_id_and_deletes_record() {
        let mut s = store();
        join(&mut s, conn(1), 1);

        let removed = s.remove(conn(1));

        assert_eq!(removed, Some(PublicId(1)));
        assert!(s.get(conn(1)).is_none());
        assert!(s.is_empty());
    }

    #[test]
    fn test_remove_absent_connection_is_noop() {
        // Disconnects can be duplicated or race with other cleanup;
        // removing a missing record must not be an error.
        let mut s = store();

        assert_eq!(s.remove(conn(7)), None);

        // A second remove of a real record is equally harmless.
        join(&mut s, conn(1), 1);
        assert!(s.remove(conn(1)).is_some());
        assert_eq!(s.remove(conn(1)), None);
    }

    #[test]
    fn test_remove_drops_roster_entry() {
        let mut s = store();
        join(&mut s, conn(1), 1);
        join(&mut s, conn(2), 2);

        s.remove(conn(1));

        // Only the survivor is enumerated, from any viewpoint.
        let snap = s.snapshot(conn(99));
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id, PublicId(2));
    }

    // =====================================================================
    // snapshot()
    // =====================================================================

    #[test]
    fn test_snapshot_excludes_the_given_connection() {
        let mut s = store();
        join(&mut s, conn(1), 1);
        join(&mut s, conn(2), 2);
        join(&mut s, conn(3), 3);

        let snap = s.snapshot(conn(2));

        let ids: Vec<_> = snap.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![PublicId(1), PublicId(3)]);
    }

    #[test]
    fn test_snapshot_skips_registered_but_unjoined_members() {
        let mut s = store();
        join(&mut s, conn(1), 1);
        s.register(conn(2)).unwrap(); // never joins

        let snap = s.snapshot(conn(99));

        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id, PublicId(1));
    }

    #[test]
    fn test_snapshot_is_in_roster_order() {
        // Join order, not connection-id order.
        let mut s = store();
        s.register(conn(1)).unwrap();
        s.register(conn(2)).unwrap();
        s.register(conn(3)).unwrap();
        s.complete_join(conn(3), 3, Position::default()).unwrap();
        s.complete_join(conn(1), 1, Position::default()).unwrap();
        s.complete_join(conn(2), 2, Position::default()).unwrap();

        let ids: Vec<_> =
            s.snapshot(conn(99)).iter().map(|m| m.id).collect();

        assert_eq!(ids, vec![PublicId(3), PublicId(1), PublicId(2)]);
    }

    #[test]
    fn test_snapshot_carries_avatar_and_position() {
        let mut s = store();
        s.register(conn(1)).unwrap();
        s.complete_join(conn(1), 2, Position::new(20, 13)).unwrap();

        let snap = s.snapshot(conn(99));

        assert_eq!(snap[0].avatar, 2);
        assert_eq!(snap[0].pos, Position::new(20, 13));
    }

    #[test]
    fn test_snapshot_empty_store_is_empty() {
        let s = store();
        assert!(s.snapshot(conn(1)).is_empty());
    }

    // =====================================================================
    // credential_matches()
    // =====================================================================

    #[test]
    fn test_credential_matches_own_credential() {
        let mut s = store();
        let (cred, _) = s.register(conn(1)).unwrap();

        assert!(s.credential_matches(conn(1), &cred));
    }

    #[test]
    fn test_credential_rejects_wrong_credential() {
        let mut s = store();
        s.register(conn(1)).unwrap();

        assert!(!s.credential_matches(
            conn(1),
            &Credential("0000000000000000000000000000000000000000".into())
        ));
    }

    #[test]
    fn test_credential_never_validates_cross_connection() {
        // Presenting another member's (real!) credential must fail:
        // credentials bind to their own connection only.
        let mut s = store();
        let (cred_one, _) = s.register(conn(1)).unwrap();
        s.register(conn(2)).unwrap();

        assert!(!s.credential_matches(conn(2), &cred_one));
    }

    #[test]
    fn test_credential_matches_false_for_unregistered() {
        let s = store();
        assert!(!s.credential_matches(
            conn(9),
            &Credential("cafe".into())
        ));
    }

    // =====================================================================
    // len() / is_empty() / joined()
    // =====================================================================

    #[test]
    fn test_len_counts_registered_not_joined() {
        let mut s = store();
        assert!(s.is_empty());

        s.register(conn(1)).unwrap();
        s.register(conn(2)).unwrap();
        assert_eq!(s.len(), 2);

        // joined() only lists roster members.
        assert!(s.joined().is_empty());
        s.complete_join(conn(1), 1, Position::default()).unwrap();
        assert_eq!(s.joined(), &[conn(1)]);
    }
}
