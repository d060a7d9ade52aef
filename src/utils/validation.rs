//! Validation utilities

use crate::traits::*;
use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> LedgerResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(LedgerError::InvalidAmount(amount.clone()))
    } else {
        Ok(())
    }
}

/// Validate that an account code is well formed
pub fn validate_account_code(code: &str) -> LedgerResult<()> {
    if code.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account code cannot be empty".to_string(),
        ));
    }

    if code.len() > 20 {
        return Err(LedgerError::Validation(
            "Account code cannot exceed 20 characters".to_string(),
        ));
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "Account code can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that an account name is valid
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a voucher narration is valid
pub fn validate_narration(narration: &str) -> LedgerResult<()> {
    if narration.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Voucher narration cannot be empty".to_string(),
        ));
    }

    if narration.len() > 500 {
        return Err(LedgerError::Validation(
            "Voucher narration cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Strict voucher validator with detailed checks
pub struct StrictVoucherValidator;

impl VoucherValidator for StrictVoucherValidator {
    fn validate_voucher(&self, voucher: &Voucher) -> LedgerResult<()> {
        voucher.validate()?;
        validate_narration(&voucher.narration)?;

        for entry in &voucher.entries {
            validate_positive_amount(&entry.amount)?;
        }

        // The same account must not appear twice on the same side.
        let mut seen = std::collections::HashSet::new();
        for entry in &voucher.entries {
            if !seen.insert((entry.account_id, entry.entry_type)) {
                return Err(LedgerError::Validation(format!(
                    "account '{}' appears multiple times on the same side of the voucher",
                    entry.account_id
                )));
            }
        }

        Ok(())
    }
}

/// Strict account validator with detailed checks
pub struct StrictAccountValidator;

impl AccountValidator for StrictAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        validate_account_code(&account.code)?;
        validate_account_name(&account.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn account_codes_are_shape_checked() {
        assert!(validate_account_code("1000").is_ok());
        assert!(validate_account_code("CASH_MAIN-01").is_ok());
        assert!(validate_account_code("").is_err());
        assert!(validate_account_code("no spaces").is_err());
    }

    #[test]
    fn strict_validator_rejects_same_side_duplicates() {
        let mut voucher = Voucher::new(
            VoucherType::Journal,
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            "duplicate sides".to_string(),
            1,
            "clerk".to_string(),
        );
        let account_id = Uuid::new_v4();
        voucher.add_entry(VoucherEntry::debit(account_id, BigDecimal::from(100), None));
        voucher.add_entry(VoucherEntry::debit(account_id, BigDecimal::from(100), None));
        voucher.add_entry(VoucherEntry::credit(
            Uuid::new_v4(),
            BigDecimal::from(200),
            None,
        ));

        let err = StrictVoucherValidator.validate_voucher(&voucher).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
