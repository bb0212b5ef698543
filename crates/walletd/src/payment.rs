//! Payments passed to `quicksend`.

use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// A payment as requested by application code.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaymentRequest {
    /// Recipient address.
    pub address: String,
    /// Amount in zatoshis; fractions are rounded up.
    pub amount: f64,
    /// Memo; the service default is used when absent.
    pub memo: Option<String>,
}

/// A payment in the shape the wallet tool expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    /// Recipient address.
    pub address: String,
    /// Whole zatoshis.
    pub amount: u64,
    /// Memo attached to the output.
    pub memo: String,
}

impl Payment {
    /// Normalises `request`, rounding the amount up and filling in
    /// `default_memo`.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::InvalidArgument`] for an empty address or an
    /// amount that is negative or not finite.
    pub fn from_request(request: &PaymentRequest, default_memo: &str) -> Result<Self, WalletError> {
        let address = request.address.trim();
        if address.is_empty() {
            return Err(WalletError::invalid("payment address is empty"));
        }

        Ok(Self {
            address: address.to_owned(),
            amount: whole_zatoshis(request.amount)?,
            memo: request
                .memo
                .clone()
                .unwrap_or_else(|| default_memo.to_owned()),
        })
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "amount is checked to be finite, non-negative and within u64 range before the cast"
)]
fn whole_zatoshis(amount: f64) -> Result<u64, WalletError> {
    let rounded = amount.ceil();
    if !rounded.is_finite() || rounded < 0.0 || rounded >= 18_446_744_073_709_551_616.0 {
        return Err(WalletError::invalid(format!(
            "payment amount {amount} is not a whole number of zatoshis"
        )));
    }
    Ok(rounded as u64)
}
