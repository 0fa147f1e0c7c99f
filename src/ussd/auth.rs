//! PIN authorization shared by every protected change.

use crate::effects::ServiceError;
use crate::ussd::context::UssdContext;
use crate::ussd::resources::{PinCheck, Resources};
use tracing::warn;

pub const INVALID_PIN: &str = "INVALID_PIN";

/// Reject unless `pin` matches the account's PIN.
///
/// A blocked account rejects with `AccountBlocked` before the PIN is even
/// checked, and so does the wrong entry that exhausts the remaining attempts.
pub async fn validate_pin(resources: &Resources, context: &UssdContext, pin: &str) -> Result<(), ServiceError> {
    if context.is_blocked() {
        return Err(ServiceError::AccountBlocked);
    }

    let phone_number = context.phone_number();
    match resources.accounts.verify_pin(phone_number, pin).await {
        Ok(PinCheck::Valid) => Ok(()),
        Ok(PinCheck::Invalid { remaining }) => Err(ServiceError::machine(
            INVALID_PIN,
            format!("Invalid PIN. {remaining} attempts remaining."),
        )),
        Ok(PinCheck::Blocked) => {
            warn!(phone_number, "account blocked after PIN attempts");
            Err(ServiceError::AccountBlocked)
        }
        Err(err) => Err(ServiceError::Unexpected(err.to_string())),
    }
}
