//! Common validation utilities.

use chrono::{DateTime, Utc};
use validator::ValidationError;

/// Validates that an optional expiry timestamp lies in the future.
///
/// An invite that expires before it is created can never be redeemed, so the
/// request is rejected up front instead of producing a dead token.
pub fn validate_future_timestamp(ts: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *ts > Utc::now() {
        Ok(())
    } else {
        let mut err = ValidationError::new("expiry_in_past");
        err.message = Some("expires_at must be in the future".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_future_timestamp_accepted() {
        let ts = Utc::now() + Duration::hours(1);
        assert!(validate_future_timestamp(&ts).is_ok());
    }

    #[test]
    fn test_past_timestamp_rejected() {
        let ts = Utc::now() - Duration::hours(1);
        assert!(validate_future_timestamp(&ts).is_err());
    }
}
