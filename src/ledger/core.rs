//! Main ledger facade that coordinates accounts, vouchers, periods and
//! reconciliation

use std::time::Duration;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::fiscal::FinancialYearGuard;
use crate::ledger::accounts::{AccountRegistry, NewAccount};
use crate::ledger::posting::PostingEngine;
use crate::reconciliation::ReconciliationTracker;
use crate::traits::*;
use crate::types::*;

/// Transport-agnostic entry point for the fuel-station ledger core.
///
/// Controllers and schedulers map external requests onto these operations;
/// the facade wires the registry, posting engine, financial-year guard and
/// reconciliation tracker over one shared storage backend.
pub struct Ledger<S: LedgerStorage> {
    storage: S,
    accounts: AccountRegistry<S>,
    posting: PostingEngine<S>,
    fiscal: FinancialYearGuard<S>,
    reconciliation: ReconciliationTracker<S>,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            accounts: AccountRegistry::new(storage.clone()),
            posting: PostingEngine::new(storage.clone()),
            fiscal: FinancialYearGuard::new(storage.clone()),
            reconciliation: ReconciliationTracker::new(storage.clone()),
            storage,
        }
    }

    /// Create a ledger with a custom posting lock timeout
    pub fn with_lock_timeout(storage: S, lock_timeout: Duration) -> Self {
        Self {
            accounts: AccountRegistry::new(storage.clone()),
            posting: PostingEngine::with_lock_timeout(storage.clone(), lock_timeout),
            fiscal: FinancialYearGuard::new(storage.clone()),
            reconciliation: ReconciliationTracker::new(storage.clone()),
            storage,
        }
    }

    /// Create a ledger with custom validators
    pub fn with_validators(
        storage: S,
        account_validator: Box<dyn AccountValidator>,
        voucher_validator: Box<dyn VoucherValidator>,
    ) -> Self {
        Self {
            accounts: AccountRegistry::with_validator(storage.clone(), account_validator),
            posting: PostingEngine::new(storage.clone()).with_validator(voucher_validator),
            fiscal: FinancialYearGuard::new(storage.clone()),
            reconciliation: ReconciliationTracker::new(storage.clone()),
            storage,
        }
    }

    // Account operations
    /// Open a new account in the chart
    pub async fn create_account(&self, params: NewAccount) -> LedgerResult<Account> {
        self.accounts.create(params).await
    }

    /// Get an account by id
    pub async fn get_account(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        self.accounts.get(account_id).await
    }

    /// Get an account by code within a pump scope
    pub async fn account_by_code(&self, code: &str, pump_id: i64) -> LedgerResult<Option<Account>> {
        self.accounts.by_code(code, pump_id).await
    }

    /// List a pump's accounts
    pub async fn list_accounts(&self, pump_id: i64) -> LedgerResult<Vec<Account>> {
        self.accounts.list(pump_id).await
    }

    /// Parent chain of an account, root first
    pub async fn account_path(&self, account_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.accounts.account_path(account_id).await
    }

    /// Lock an account against new postings
    pub async fn lock_account(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.accounts.lock(account_id).await
    }

    /// Unlock an account
    pub async fn unlock_account(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.accounts.unlock(account_id).await
    }

    /// Deactivate an account (accounts are never deleted)
    pub async fn deactivate_account(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.accounts.deactivate(account_id).await
    }

    /// Reactivate an account
    pub async fn reactivate_account(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.accounts.reactivate(account_id).await
    }

    // Voucher operations
    /// Persist a draft voucher produced by the builder
    pub async fn save_draft(&self, voucher: &Voucher) -> LedgerResult<()> {
        self.storage.save_voucher(voucher).await
    }

    /// Get a voucher by id
    pub async fn get_voucher(&self, voucher_id: Uuid) -> LedgerResult<Option<Voucher>> {
        self.storage.get_voucher(voucher_id).await
    }

    /// Validate a draft and move it to Approved
    pub async fn approve_voucher(&self, voucher_id: Uuid) -> LedgerResult<Voucher> {
        self.posting.approve(voucher_id).await
    }

    /// Post an approved voucher to the ledger
    pub async fn post_voucher(
        &self,
        voucher_id: Uuid,
        posted_by: &str,
    ) -> LedgerResult<PostingResult> {
        self.posting.post(voucher_id, posted_by).await
    }

    /// Cancel a draft or approved voucher with a reason
    pub async fn cancel_voucher(&self, voucher_id: Uuid, reason: &str) -> LedgerResult<Voucher> {
        self.posting.cancel(voucher_id, reason).await
    }

    /// Build and save a draft voucher reversing a posted one
    pub async fn reverse_voucher(&self, voucher_id: Uuid, author: &str) -> LedgerResult<Voucher> {
        let voucher = self
            .storage
            .get_voucher(voucher_id)
            .await?
            .ok_or(LedgerError::VoucherNotFound(voucher_id))?;
        let reversal = self.posting.reversal_of(&voucher, author.to_string())?;
        self.storage.save_voucher(&reversal).await?;
        Ok(reversal)
    }

    // Balance and statement operations
    /// Account balance, from the cache for "now" or reconstructed from the
    /// ledger for a historical date
    pub async fn get_balance(
        &self,
        account_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> LedgerResult<BigDecimal> {
        self.accounts.balance_as_of(account_id, as_of).await
    }

    /// Ordered ledger rows with running balances for a date range
    pub async fn get_statement(
        &self,
        account_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        self.accounts.statement(account_id, from, to).await
    }

    // Reconciliation operations
    /// Mark a ledger entry as matched against an external statement
    pub async fn reconcile(
        &self,
        entry_id: u64,
        user: &str,
        as_of: NaiveDateTime,
    ) -> LedgerResult<LedgerEntry> {
        self.reconciliation.reconcile(entry_id, user, as_of).await
    }

    /// Entries of an account not yet reconciled
    pub async fn unreconciled_entries(&self, account_id: Uuid) -> LedgerResult<Vec<LedgerEntry>> {
        self.reconciliation.unreconciled(account_id).await
    }

    // Financial year operations
    /// Create an inactive financial year
    pub async fn create_financial_year(
        &self,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        pump_id: Option<i64>,
    ) -> LedgerResult<FinancialYear> {
        self.fiscal.create(name, start_date, end_date, pump_id).await
    }

    /// Activate a financial year, swapping out the scope's active one
    pub async fn activate_financial_year(
        &self,
        year_id: Uuid,
    ) -> LedgerResult<(Option<FinancialYear>, FinancialYear)> {
        self.fiscal.activate(year_id).await
    }

    /// The active year governing a pump (pump scope, then global)
    pub async fn active_financial_year(&self, pump_id: i64) -> LedgerResult<FinancialYear> {
        self.fiscal.active_year(pump_id).await
    }
}
