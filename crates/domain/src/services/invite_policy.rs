//! Invite usability policy.
//!
//! `evaluate` is the single decision function for whether an invite can be
//! redeemed at a given instant. It never mutates state, so it is safe for
//! read-only previews; the join path calls it again on a snapshot taken
//! under the row lock, which is what makes the check authoritative.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why an invite cannot be used.
///
/// Variants are ordered by check priority; the first failing check wins so
/// diagnostics stay stable (a disabled invite reports `disabled` even when
/// it is also past its expiry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteRejection {
    /// No invite exists for the presented token.
    InvalidToken,
    /// The invite was deactivated; this is terminal.
    Disabled,
    /// The invite's expiry is in the past.
    Expired,
    /// Every allowed use has been consumed.
    Exhausted,
}

impl InviteRejection {
    /// Machine-readable reason string carried in error responses.
    pub fn reason(&self) -> &'static str {
        match self {
            InviteRejection::InvalidToken => "invalid_token",
            InviteRejection::Disabled => "disabled",
            InviteRejection::Expired => "expired",
            InviteRejection::Exhausted => "exhausted",
        }
    }

    /// Human-readable message for client display.
    pub fn message(&self) -> &'static str {
        match self {
            InviteRejection::InvalidToken => "Invalid invite link",
            InviteRejection::Disabled => "This invite link has been disabled",
            InviteRejection::Expired => "This invite link has expired",
            InviteRejection::Exhausted => {
                "This invite link has reached its maximum number of uses"
            }
        }
    }
}

impl std::fmt::Display for InviteRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// The fields of an invite that determine usability.
///
/// Callers build this from whatever row representation they hold; the join
/// path builds it from the row read under `SELECT ... FOR UPDATE`.
#[derive(Debug, Clone, Copy)]
pub struct InviteSnapshot {
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
}

/// Decides whether an invite is usable at `now`.
///
/// Check order: disabled, expired, exhausted. An invite whose expiry equals
/// `now` exactly is still usable; only a strictly past expiry rejects.
pub fn evaluate(invite: &InviteSnapshot, now: DateTime<Utc>) -> Result<(), InviteRejection> {
    if !invite.is_active {
        return Err(InviteRejection::Disabled);
    }

    if let Some(expires_at) = invite.expires_at {
        if expires_at < now {
            return Err(InviteRejection::Expired);
        }
    }

    if let Some(max_uses) = invite.max_uses {
        if invite.current_uses >= max_uses {
            return Err(InviteRejection::Exhausted);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn usable() -> InviteSnapshot {
        InviteSnapshot {
            is_active: true,
            expires_at: Some(Utc::now() + Duration::days(1)),
            max_uses: Some(5),
            current_uses: 0,
        }
    }

    #[test]
    fn test_usable_invite_passes() {
        assert!(evaluate(&usable(), Utc::now()).is_ok());
    }

    #[test]
    fn test_unlimited_invite_passes() {
        let invite = InviteSnapshot {
            is_active: true,
            expires_at: None,
            max_uses: None,
            current_uses: 1_000_000,
        };
        assert!(evaluate(&invite, Utc::now()).is_ok());
    }

    #[test]
    fn test_disabled_is_terminal() {
        let invite = InviteSnapshot {
            is_active: false,
            ..usable()
        };
        assert_eq!(evaluate(&invite, Utc::now()), Err(InviteRejection::Disabled));
    }

    #[test]
    fn test_disabled_wins_over_expired_and_exhausted() {
        let invite = InviteSnapshot {
            is_active: false,
            expires_at: Some(Utc::now() - Duration::days(1)),
            max_uses: Some(1),
            current_uses: 1,
        };
        assert_eq!(evaluate(&invite, Utc::now()), Err(InviteRejection::Disabled));
    }

    #[test]
    fn test_expired_wins_over_exhausted() {
        let invite = InviteSnapshot {
            is_active: true,
            expires_at: Some(Utc::now() - Duration::seconds(1)),
            max_uses: Some(1),
            current_uses: 1,
        };
        assert_eq!(evaluate(&invite, Utc::now()), Err(InviteRejection::Expired));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let invite = InviteSnapshot {
            is_active: true,
            expires_at: Some(now),
            max_uses: None,
            current_uses: 0,
        };
        // expires_at == now is still usable; only strictly past rejects
        assert!(evaluate(&invite, now).is_ok());
        assert_eq!(
            evaluate(&invite, now + Duration::milliseconds(1)),
            Err(InviteRejection::Expired)
        );
    }

    #[test]
    fn test_exhausted_at_cap() {
        let invite = InviteSnapshot {
            is_active: true,
            expires_at: None,
            max_uses: Some(3),
            current_uses: 3,
        };
        assert_eq!(
            evaluate(&invite, Utc::now()),
            Err(InviteRejection::Exhausted)
        );
    }

    #[test]
    fn test_one_use_left() {
        let invite = InviteSnapshot {
            is_active: true,
            expires_at: None,
            max_uses: Some(3),
            current_uses: 2,
        };
        assert!(evaluate(&invite, Utc::now()).is_ok());
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(InviteRejection::InvalidToken.reason(), "invalid_token");
        assert_eq!(InviteRejection::Disabled.reason(), "disabled");
        assert_eq!(InviteRejection::Expired.reason(), "expired");
        assert_eq!(InviteRejection::Exhausted.reason(), "exhausted");
    }
}
