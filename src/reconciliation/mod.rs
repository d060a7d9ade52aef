//! Statement reconciliation over posted ledger entries

use chrono::NaiveDateTime;
use tracing::info;
use uuid::Uuid;

use crate::traits::LedgerStorage;
use crate::types::*;

/// Marks posted entries as matched against external statements.
///
/// Reconciliation only ever touches metadata: the entry's amounts and
/// running balance are frozen at posting time and stay that way.
pub struct ReconciliationTracker<S: LedgerStorage> {
    storage: S,
}

impl<S: LedgerStorage> ReconciliationTracker<S> {
    /// Create a new tracker
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Mark one ledger entry as reconciled and lift the account's
    /// reconciled balance to that entry's running balance.
    pub async fn reconcile(
        &self,
        entry_id: u64,
        user: &str,
        as_of: NaiveDateTime,
    ) -> LedgerResult<LedgerEntry> {
        let entry = self
            .storage
            .get_ledger_entry(entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        if entry.reconciled {
            return Err(LedgerError::AlreadyReconciled(entry_id));
        }

        self.storage.set_reconciled(entry_id, user, as_of).await?;

        let mut account = self
            .storage
            .get_account(entry.account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(entry.account_id.to_string()))?;
        account.reconciled_balance = entry.running_balance.clone();
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.save_account(&account).await?;

        info!(entry = entry_id, account = %account.code, user, "ledger entry reconciled");

        self.storage
            .get_ledger_entry(entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))
    }

    /// Entries not yet matched against a statement, in chain order
    pub async fn unreconciled(&self, account_id: Uuid) -> LedgerResult<Vec<LedgerEntry>> {
        let entries = self.storage.ledger_entries_for_account(account_id).await?;
        Ok(entries.into_iter().filter(|e| !e.reconciled).collect())
    }
}
