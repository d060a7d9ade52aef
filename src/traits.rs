//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::*;

/// Everything the posting engine writes for one voucher, committed as a unit.
///
/// Storage must apply the whole batch atomically: the posted voucher, the new
/// ledger rows, the rewritten running balances of backdated-over rows, and
/// the refreshed account balance caches either all land or none do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingBatch {
    /// The voucher in its Posted state, number assigned
    pub voucher: Voucher,
    /// New rows in voucher line order; ids are assigned by storage on commit
    pub new_entries: Vec<LedgerEntry>,
    /// Existing rows whose running balance a backdated insertion changed
    pub rebalanced: Vec<(u64, BigDecimal)>,
    /// Accounts with their `current_balance` cache moved to the new chain tip
    pub accounts: Vec<Account>,
}

/// Storage abstraction for the ledger system
///
/// This trait allows the posting core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these
/// methods. Receivers are `&self` because postings run concurrently over a
/// shared backend; implementations provide their own interior mutability.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Save an account (insert or update)
    async fn save_account(&self, account: &Account) -> LedgerResult<()>;

    /// Get an account by id
    async fn get_account(&self, account_id: Uuid) -> LedgerResult<Option<Account>>;

    /// Get an account by code within a pump scope
    async fn get_account_by_code(&self, code: &str, pump_id: i64)
        -> LedgerResult<Option<Account>>;

    /// List all accounts for a pump
    async fn list_accounts(&self, pump_id: i64) -> LedgerResult<Vec<Account>>;

    /// Save a voucher (insert or update); rejected once the stored voucher is posted
    async fn save_voucher(&self, voucher: &Voucher) -> LedgerResult<()>;

    /// Get a voucher by id
    async fn get_voucher(&self, voucher_id: Uuid) -> LedgerResult<Option<Voucher>>;

    /// Get the posted voucher holding a number within a pump scope.
    /// Numbers are claimed at posting time; drafts carrying a requested
    /// number do not hold it yet.
    async fn get_voucher_by_number(
        &self,
        number: &str,
        pump_id: i64,
    ) -> LedgerResult<Option<Voucher>>;

    /// Mint the next voucher number for a (type, scope, period) sequence.
    /// Numbers are opaque to the engine; the sequence must be monotonic.
    async fn next_voucher_number(
        &self,
        voucher_type: VoucherType,
        pump_id: i64,
        date: NaiveDate,
    ) -> LedgerResult<String>;

    /// Commit one posting batch atomically and return the ids assigned to
    /// `batch.new_entries`, in order. On error nothing may be written.
    async fn append_ledger_entries(&self, batch: PostingBatch) -> LedgerResult<Vec<u64>>;

    /// All ledger entries for an account ordered by `(transaction_date, id)`
    async fn ledger_entries_for_account(&self, account_id: Uuid)
        -> LedgerResult<Vec<LedgerEntry>>;

    /// Get a single ledger entry by id
    async fn get_ledger_entry(&self, entry_id: u64) -> LedgerResult<Option<LedgerEntry>>;

    /// Set reconciliation metadata on an entry. Amounts and running balance
    /// are not touched.
    async fn set_reconciled(
        &self,
        entry_id: u64,
        reconciled_by: &str,
        reconciled_at: NaiveDateTime,
    ) -> LedgerResult<()>;

    /// Save a financial year (insert or update)
    async fn save_financial_year(&self, year: &FinancialYear) -> LedgerResult<()>;

    /// Get a financial year by id
    async fn get_financial_year(&self, year_id: Uuid) -> LedgerResult<Option<FinancialYear>>;

    /// List financial years for a scope (None = global scope)
    async fn list_financial_years(&self, pump_id: Option<i64>)
        -> LedgerResult<Vec<FinancialYear>>;

    /// The scope's active financial year, if any
    async fn get_active_financial_year(
        &self,
        pump_id: Option<i64>,
    ) -> LedgerResult<Option<FinancialYear>>;

    /// Atomically deactivate the scope's active year (if any) and activate
    /// the given one. Returns (previously active, now active). No state where
    /// zero or two years are active may be observable.
    async fn swap_active_financial_year(
        &self,
        pump_id: Option<i64>,
        year_id: Uuid,
    ) -> LedgerResult<(Option<FinancialYear>, FinancialYear)>;
}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &Account) -> LedgerResult<()>;
}

/// Trait for implementing custom voucher validation rules
pub trait VoucherValidator: Send + Sync {
    /// Validate a voucher before it is saved or approved
    fn validate_voucher(&self, voucher: &Voucher) -> LedgerResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        if account.code.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Account code cannot be empty".to_string(),
            ));
        }

        if account.name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Account name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default voucher validator applying the structural double-entry rules
pub struct DefaultVoucherValidator;

impl VoucherValidator for DefaultVoucherValidator {
    fn validate_voucher(&self, voucher: &Voucher) -> LedgerResult<()> {
        voucher.validate()
    }
}
