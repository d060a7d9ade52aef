//! Voucher state machine and atomic ledger materialization

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::fiscal::FinancialYearGuard;
use crate::ledger::accounts::assert_postable;
use crate::ledger::locking::KeyedLocks;
use crate::traits::*;
use crate::types::*;

/// How long a posting waits for a contended account lock before giving up
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// The posting engine: validates vouchers, drives their lifecycle and
/// atomically materializes ledger entries with correct running balances.
///
/// States: Draft -> Approved -> Posted, Draft/Approved -> Cancelled. Posting
/// acquires one advisory lock per touched account in ascending-id order, so
/// concurrent vouchers sharing accounts serialize instead of deadlocking.
pub struct PostingEngine<S: LedgerStorage> {
    storage: S,
    fiscal: FinancialYearGuard<S>,
    validator: Box<dyn VoucherValidator>,
    locks: Arc<KeyedLocks<Uuid>>,
    lock_timeout: Duration,
}

impl<S: LedgerStorage + Clone> PostingEngine<S> {
    /// Create an engine with the default lock timeout
    pub fn new(storage: S) -> Self {
        Self::with_lock_timeout(storage, DEFAULT_LOCK_TIMEOUT)
    }

    /// Create an engine with a custom lock timeout
    pub fn with_lock_timeout(storage: S, lock_timeout: Duration) -> Self {
        Self {
            fiscal: FinancialYearGuard::new(storage.clone()),
            storage,
            validator: Box::new(DefaultVoucherValidator),
            locks: Arc::new(KeyedLocks::new()),
            lock_timeout,
        }
    }

    /// Replace the voucher validator
    pub fn with_validator(mut self, validator: Box<dyn VoucherValidator>) -> Self {
        self.validator = validator;
        self
    }

    async fn load_voucher(&self, voucher_id: Uuid) -> LedgerResult<Voucher> {
        self.storage
            .get_voucher(voucher_id)
            .await?
            .ok_or(LedgerError::VoucherNotFound(voucher_id))
    }

    /// Validate a draft voucher and move it to Approved.
    pub async fn approve(&self, voucher_id: Uuid) -> LedgerResult<Voucher> {
        let mut voucher = self.load_voucher(voucher_id).await?;

        match voucher.status {
            VoucherStatus::Draft => {}
            VoucherStatus::Approved => {
                return Err(LedgerError::InvalidTransition {
                    voucher_id,
                    from: "approved",
                    to: "approved",
                })
            }
            VoucherStatus::Posted { .. } => return Err(LedgerError::AlreadyPosted(voucher_id)),
            VoucherStatus::Cancelled { .. } => {
                return Err(LedgerError::AlreadyCancelled(voucher_id))
            }
        }

        self.validator.validate_voucher(&voucher)?;
        voucher.status = VoucherStatus::Approved;
        voucher.updated_at = chrono::Utc::now().naive_utc();
        self.storage.save_voucher(&voucher).await?;
        info!(voucher = %voucher.id, "voucher approved");

        Ok(voucher)
    }

    /// Cancel a Draft or Approved voucher with a mandatory reason.
    pub async fn cancel(&self, voucher_id: Uuid, reason: &str) -> LedgerResult<Voucher> {
        if reason.trim().is_empty() {
            return Err(LedgerError::Validation(
                "cancellation reason cannot be empty".to_string(),
            ));
        }

        let mut voucher = self.load_voucher(voucher_id).await?;
        match voucher.status {
            VoucherStatus::Draft | VoucherStatus::Approved => {}
            VoucherStatus::Posted { .. } => return Err(LedgerError::AlreadyPosted(voucher_id)),
            VoucherStatus::Cancelled { .. } => {
                return Err(LedgerError::AlreadyCancelled(voucher_id))
            }
        }

        voucher.status = VoucherStatus::Cancelled {
            reason: reason.to_string(),
            cancelled_at: chrono::Utc::now().naive_utc(),
        };
        voucher.updated_at = chrono::Utc::now().naive_utc();
        self.storage.save_voucher(&voucher).await?;
        info!(voucher = %voucher.id, reason, "voucher cancelled");

        Ok(voucher)
    }

    /// Post an Approved voucher: materialize its ledger entries, maintain
    /// running balances and refresh the account balance caches, all in one
    /// atomic storage commit.
    ///
    /// A voucher dated before existing entries re-chains every later entry
    /// of each touched account. The whole chain is refolded from the opening
    /// balance, so recomputation is idempotent. On any failure nothing is
    /// written and the voucher stays Approved.
    pub async fn post(&self, voucher_id: Uuid, posted_by: &str) -> LedgerResult<PostingResult> {
        let mut voucher = self.load_voucher(voucher_id).await?;

        match voucher.status {
            VoucherStatus::Approved => {}
            VoucherStatus::Draft => {
                return Err(LedgerError::InvalidTransition {
                    voucher_id,
                    from: "draft",
                    to: "posted",
                })
            }
            VoucherStatus::Posted { .. } => return Err(LedgerError::AlreadyPosted(voucher_id)),
            VoucherStatus::Cancelled { .. } => {
                return Err(LedgerError::AlreadyCancelled(voucher_id))
            }
        }

        self.validator.validate_voucher(&voucher)?;
        self.fiscal
            .assert_open_period(voucher.date, voucher.pump_id)
            .await?;

        // Scope and flag checks run before any lock is taken.
        for entry in &voucher.entries {
            let account = self
                .storage
                .get_account(entry.account_id)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(entry.account_id.to_string()))?;
            assert_postable(&account, voucher.pump_id)?;
        }

        let number = match &voucher.number {
            Some(number) => number.clone(),
            None => {
                self.storage
                    .next_voucher_number(voucher.voucher_type, voucher.pump_id, voucher.date)
                    .await?
            }
        };
        if let Some(existing) = self
            .storage
            .get_voucher_by_number(&number, voucher.pump_id)
            .await?
        {
            if existing.id != voucher.id {
                return Err(LedgerError::DuplicateVoucherNumber(number));
            }
        }
        voucher.number = Some(number.clone());

        let account_ids: Vec<Uuid> = voucher.entries.iter().map(|e| e.account_id).collect();
        let _guards = self
            .locks
            .acquire_ordered(&account_ids, self.lock_timeout)
            .await
            .map_err(LedgerError::LockTimeout)?;

        let batch = self.build_batch(&voucher, posted_by).await?;
        let posted_entry_ids = self.storage.append_ledger_entries(batch).await?;

        info!(
            voucher = %voucher.id,
            number = %number,
            entries = posted_entry_ids.len(),
            "voucher posted"
        );

        Ok(PostingResult {
            voucher_id: voucher.id,
            voucher_number: number,
            posted_entry_ids,
        })
    }

    /// Compute the posting batch while the account locks are held.
    ///
    /// Accounts and their entry chains are re-read under the lock so the
    /// fold starts from committed state, not from the pre-lock snapshot.
    async fn build_batch(&self, voucher: &Voucher, posted_by: &str) -> LedgerResult<PostingBatch> {
        let now = chrono::Utc::now().naive_utc();

        let mut new_rows: Vec<LedgerEntry> = voucher
            .entries
            .iter()
            .map(|entry| {
                let (debit_amount, credit_amount) = match entry.entry_type {
                    EntryType::Debit => (entry.amount.clone(), BigDecimal::from(0)),
                    EntryType::Credit => (BigDecimal::from(0), entry.amount.clone()),
                };
                LedgerEntry {
                    id: 0,
                    account_id: entry.account_id,
                    voucher_id: voucher.id,
                    transaction_date: voucher.date,
                    entry_type: entry.entry_type,
                    debit_amount,
                    credit_amount,
                    running_balance: BigDecimal::from(0),
                    reconciled: false,
                    reconciled_at: None,
                    reconciled_by: None,
                    created_at: now,
                }
            })
            .collect();

        // Voucher line positions grouped per account, preserving line order.
        let mut lines_by_account: BTreeMap<Uuid, Vec<usize>> = BTreeMap::new();
        for (position, entry) in voucher.entries.iter().enumerate() {
            lines_by_account
                .entry(entry.account_id)
                .or_default()
                .push(position);
        }

        let mut rebalanced = Vec::new();
        let mut accounts = Vec::new();

        for (&account_id, positions) in &lines_by_account {
            let mut account = self
                .storage
                .get_account(account_id)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))?;
            let existing = self.storage.ledger_entries_for_account(account_id).await?;

            // New rows sort after every existing row dated on or before the
            // voucher date, because append ids are larger than all stored ids.
            let insert_at = existing
                .iter()
                .take_while(|e| e.transaction_date <= voucher.date)
                .count();

            let mut balance = account.opening_balance.clone();
            for entry in &existing[..insert_at] {
                balance += account.signed_delta(entry.entry_type, entry.amount());
                if entry.running_balance != balance {
                    rebalanced.push((entry.id, balance.clone()));
                }
            }
            for &position in positions {
                let delta = {
                    let row = &new_rows[position];
                    account.signed_delta(row.entry_type, row.amount())
                };
                balance += delta;
                new_rows[position].running_balance = balance.clone();
            }
            for entry in &existing[insert_at..] {
                balance += account.signed_delta(entry.entry_type, entry.amount());
                if entry.running_balance != balance {
                    rebalanced.push((entry.id, balance.clone()));
                }
            }

            if insert_at < existing.len() {
                debug!(
                    account = %account.code,
                    rechained = existing.len() - insert_at,
                    "backdated posting re-chained running balances"
                );
            }

            account.current_balance = balance;
            account.updated_at = now;
            accounts.push(account);
        }

        let mut posted = voucher.clone();
        posted.status = VoucherStatus::Posted {
            posted_at: now,
            posted_by: posted_by.to_string(),
        };
        posted.updated_at = now;

        Ok(PostingBatch {
            voucher: posted,
            new_entries: new_rows,
            rebalanced,
            accounts,
        })
    }

    /// Build a brand-new draft voucher reversing a posted one.
    ///
    /// Corrections never mutate posted vouchers; the reversal mirrors every
    /// line on the opposite side and goes through the normal
    /// approve-then-post flow.
    pub fn reversal_of(&self, voucher: &Voucher, author: String) -> LedgerResult<Voucher> {
        let number = match &voucher.status {
            VoucherStatus::Posted { .. } => voucher
                .number
                .clone()
                .unwrap_or_else(|| voucher.id.to_string()),
            _ => {
                return Err(LedgerError::InvalidTransition {
                    voucher_id: voucher.id,
                    from: voucher.status.name(),
                    to: "reversed",
                })
            }
        };

        let mut reversal = Voucher::new(
            VoucherType::Journal,
            voucher.date,
            format!("reversal of {}", number),
            voucher.pump_id,
            author,
        );
        for entry in &voucher.entries {
            reversal.add_entry(VoucherEntry::new(
                entry.account_id,
                entry.entry_type.opposite(),
                entry.amount.clone(),
                entry.narration.clone(),
            ));
        }

        Ok(reversal)
    }
}
