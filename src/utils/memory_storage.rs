//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    vouchers: HashMap<Uuid, Voucher>,
    entries: BTreeMap<u64, LedgerEntry>,
    years: HashMap<Uuid, FinancialYear>,
    next_entry_id: u64,
    voucher_sequences: HashMap<(VoucherType, i64, i32), u64>,
}

/// In-memory storage backend.
///
/// All maps live behind one `RwLock`, so `append_ledger_entries` and
/// `swap_active_financial_year` are naturally atomic: they take the write
/// lock once and every mutation inside lands or none does. Readers only ever
/// see fully committed postings.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    inner: Arc<RwLock<Inner>>,
    fail_next_append: Arc<AtomicBool>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                next_entry_id: 1,
                ..Inner::default()
            })),
            fail_next_append: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        *inner = Inner {
            next_entry_id: 1,
            ..Inner::default()
        };
    }

    /// Make the next `append_ledger_entries` call fail before writing
    /// anything. Used to exercise the all-or-nothing posting guarantee.
    pub fn fail_next_append(&self) {
        self.fail_next_append.store(true, Ordering::SeqCst);
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_account(&self, account: &Account) -> LedgerResult<()> {
        self.inner
            .write()
            .unwrap()
            .accounts
            .insert(account.id, account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        Ok(self.inner.read().unwrap().accounts.get(&account_id).cloned())
    }

    async fn get_account_by_code(
        &self,
        code: &str,
        pump_id: i64,
    ) -> LedgerResult<Option<Account>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .accounts
            .values()
            .find(|a| a.code == code && a.pump_id == pump_id)
            .cloned())
    }

    async fn list_accounts(&self, pump_id: i64) -> LedgerResult<Vec<Account>> {
        let inner = self.inner.read().unwrap();
        let mut accounts: Vec<Account> = inner
            .accounts
            .values()
            .filter(|a| a.pump_id == pump_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn save_voucher(&self, voucher: &Voucher) -> LedgerResult<()> {
        let mut inner = self.inner.write().unwrap();
        if let Some(existing) = inner.vouchers.get(&voucher.id) {
            if matches!(existing.status, VoucherStatus::Posted { .. }) {
                return Err(LedgerError::AlreadyPosted(voucher.id));
            }
        }
        inner.vouchers.insert(voucher.id, voucher.clone());
        Ok(())
    }

    async fn get_voucher(&self, voucher_id: Uuid) -> LedgerResult<Option<Voucher>> {
        Ok(self.inner.read().unwrap().vouchers.get(&voucher_id).cloned())
    }

    async fn get_voucher_by_number(
        &self,
        number: &str,
        pump_id: i64,
    ) -> LedgerResult<Option<Voucher>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .vouchers
            .values()
            .find(|v| {
                v.number.as_deref() == Some(number)
                    && v.pump_id == pump_id
                    && matches!(v.status, VoucherStatus::Posted { .. })
            })
            .cloned())
    }

    async fn next_voucher_number(
        &self,
        voucher_type: VoucherType,
        pump_id: i64,
        date: NaiveDate,
    ) -> LedgerResult<String> {
        let mut inner = self.inner.write().unwrap();
        let sequence = inner
            .voucher_sequences
            .entry((voucher_type, pump_id, date.year()))
            .or_insert(0);
        *sequence += 1;
        Ok(format!(
            "{}-{}-{:04}",
            voucher_type.prefix(),
            date.year(),
            sequence
        ))
    }

    async fn append_ledger_entries(&self, batch: PostingBatch) -> LedgerResult<Vec<u64>> {
        if self.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Storage(
                "injected append failure".to_string(),
            ));
        }

        let mut inner = self.inner.write().unwrap();

        // Verify the whole batch before mutating anything.
        for (entry_id, _) in &batch.rebalanced {
            if !inner.entries.contains_key(entry_id) {
                return Err(LedgerError::Storage(format!(
                    "re-chained entry {} does not exist",
                    entry_id
                )));
            }
        }

        let mut ids = Vec::with_capacity(batch.new_entries.len());
        for mut entry in batch.new_entries {
            entry.id = inner.next_entry_id;
            inner.next_entry_id += 1;
            ids.push(entry.id);
            inner.entries.insert(entry.id, entry);
        }

        for (entry_id, running_balance) in batch.rebalanced {
            if let Some(entry) = inner.entries.get_mut(&entry_id) {
                entry.running_balance = running_balance;
            }
        }

        for account in &batch.accounts {
            inner.accounts.insert(account.id, account.clone());
        }
        inner.vouchers.insert(batch.voucher.id, batch.voucher);

        Ok(ids)
    }

    async fn ledger_entries_for_account(
        &self,
        account_id: Uuid,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        let inner = self.inner.read().unwrap();
        let mut entries: Vec<LedgerEntry> = inner
            .entries
            .values()
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then(a.id.cmp(&b.id))
        });
        Ok(entries)
    }

    async fn get_ledger_entry(&self, entry_id: u64) -> LedgerResult<Option<LedgerEntry>> {
        Ok(self.inner.read().unwrap().entries.get(&entry_id).cloned())
    }

    async fn set_reconciled(
        &self,
        entry_id: u64,
        reconciled_by: &str,
        reconciled_at: NaiveDateTime,
    ) -> LedgerResult<()> {
        let mut inner = self.inner.write().unwrap();
        let entry = inner
            .entries
            .get_mut(&entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        entry.reconciled = true;
        entry.reconciled_at = Some(reconciled_at);
        entry.reconciled_by = Some(reconciled_by.to_string());
        Ok(())
    }

    async fn save_financial_year(&self, year: &FinancialYear) -> LedgerResult<()> {
        self.inner
            .write()
            .unwrap()
            .years
            .insert(year.id, year.clone());
        Ok(())
    }

    async fn get_financial_year(&self, year_id: Uuid) -> LedgerResult<Option<FinancialYear>> {
        Ok(self.inner.read().unwrap().years.get(&year_id).cloned())
    }

    async fn list_financial_years(
        &self,
        pump_id: Option<i64>,
    ) -> LedgerResult<Vec<FinancialYear>> {
        let inner = self.inner.read().unwrap();
        let mut years: Vec<FinancialYear> = inner
            .years
            .values()
            .filter(|y| y.pump_id == pump_id)
            .cloned()
            .collect();
        years.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        Ok(years)
    }

    async fn get_active_financial_year(
        &self,
        pump_id: Option<i64>,
    ) -> LedgerResult<Option<FinancialYear>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .years
            .values()
            .find(|y| y.pump_id == pump_id && y.is_active)
            .cloned())
    }

    async fn swap_active_financial_year(
        &self,
        pump_id: Option<i64>,
        year_id: Uuid,
    ) -> LedgerResult<(Option<FinancialYear>, FinancialYear)> {
        let mut inner = self.inner.write().unwrap();

        if !inner.years.contains_key(&year_id) {
            return Err(LedgerError::FinancialYearNotFound(year_id));
        }

        let previous_id = inner
            .years
            .values()
            .find(|y| y.pump_id == pump_id && y.is_active && y.id != year_id)
            .map(|y| y.id);

        let previous = previous_id.map(|id| {
            let year = inner.years.get_mut(&id).unwrap();
            year.is_active = false;
            year.clone()
        });

        let activated = {
            let year = inner.years.get_mut(&year_id).unwrap();
            year.is_active = true;
            year.clone()
        };

        Ok((previous, activated))
    }
}
