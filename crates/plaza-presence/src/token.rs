//! Token issuance: deriving a per-connection credential.
//!
//! The credential is a keyed digest of the server secret and the
//! connection id. It is deterministic on purpose — re-issuing for the
//! same connection yields the same credential — and it is only meant to
//! bind requests to the connection they arrived on. A client that knows
//! the algorithm and the secret could forge one, but the threat model
//! here is replay binding, not secrecy against the server's own
//! operator.

use sha1::{Digest, Sha1};

use plaza_protocol::Credential;
use plaza_transport::ConnectionId;

/// Derives credentials from a server secret.
///
/// Constructed once at server start with the configured secret and
/// handed to the member store; there are no error cases, issuing is a
/// pure function of `(secret, connection id)`.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    secret: String,
}

impl TokenIssuer {
    /// Creates an issuer with the given server secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Issues the credential for a connection: the lowercase hex SHA-1
    /// digest of the secret followed by the decimal connection id.
    pub fn issue(&self, conn: ConnectionId) -> Credential {
        let mut hasher = Sha1::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(conn.into_inner().to_string().as_bytes());
        let digest = hasher.finalize();
        Credential(digest.iter().map(|b| format!("{b:02x}")).collect())
    }
}
