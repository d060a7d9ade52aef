//! Chart of accounts management

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// Parameters for opening a new account
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// Account code, unique within the pump
    pub code: String,
    /// Display name
    pub name: String,
    /// Account classification
    pub account_type: AccountType,
    /// Reporting group
    pub group: String,
    /// Side the account carries its balance on
    pub balance_type: EntryType,
    /// Balance brought in at opening
    pub opening_balance: BigDecimal,
    /// Code of the parent account, if part of a hierarchy
    pub parent_code: Option<String>,
    /// Owning pump
    pub pump_id: i64,
    /// Whether this is a protected system account
    pub is_system_account: bool,
}

/// Reject postings against accounts that are out of scope, inactive or locked
pub fn assert_postable(account: &Account, voucher_pump: i64) -> LedgerResult<()> {
    if account.pump_id != voucher_pump {
        return Err(LedgerError::CrossPumpMismatch {
            code: account.code.clone(),
            account_pump: account.pump_id,
            voucher_pump,
        });
    }
    if !account.is_active {
        return Err(LedgerError::AccountInactive(account.code.clone()));
    }
    if account.is_locked {
        return Err(LedgerError::AccountLocked(account.code.clone()));
    }
    Ok(())
}

/// Registry owning the chart of accounts, hierarchy and lock/active flags
pub struct AccountRegistry<S: LedgerStorage> {
    pub(crate) storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: LedgerStorage> AccountRegistry<S> {
    /// Create a new registry
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a new registry with a custom validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Open a new account in the chart.
    ///
    /// Fails with `DuplicateAccountCode` when the code is taken in the scope
    /// and `InvalidHierarchy` when the parent chain loops back on itself.
    pub async fn create(&self, params: NewAccount) -> LedgerResult<Account> {
        if self
            .storage
            .get_account_by_code(&params.code, params.pump_id)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateAccountCode {
                code: params.code,
                pump_id: params.pump_id,
            });
        }

        let parent_id = match &params.parent_code {
            Some(parent_code) => {
                let parent = self
                    .storage
                    .get_account_by_code(parent_code, params.pump_id)
                    .await?
                    .ok_or_else(|| LedgerError::AccountNotFound(parent_code.clone()))?;
                self.assert_acyclic(&parent).await?;
                Some(parent.id)
            }
            None => None,
        };

        let now = chrono::Utc::now().naive_utc();
        let account = Account {
            id: Uuid::new_v4(),
            code: params.code,
            name: params.name,
            account_type: params.account_type,
            group: params.group,
            balance_type: params.balance_type,
            current_balance: params.opening_balance.clone(),
            opening_balance: params.opening_balance,
            reconciled_balance: BigDecimal::from(0),
            parent_id,
            is_system_account: params.is_system_account,
            is_active: true,
            is_locked: false,
            pump_id: params.pump_id,
            created_at: now,
            updated_at: now,
        };

        self.validator.validate_account(&account)?;
        self.storage.save_account(&account).await?;
        info!(code = %account.code, pump = account.pump_id, "account created");

        Ok(account)
    }

    /// Get an account by id
    pub async fn get(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by id, returning an error if not found
    pub async fn get_required(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    /// Get an account by code within a pump scope
    pub async fn by_code(&self, code: &str, pump_id: i64) -> LedgerResult<Option<Account>> {
        self.storage.get_account_by_code(code, pump_id).await
    }

    /// List all accounts for a pump
    pub async fn list(&self, pump_id: i64) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(pump_id).await
    }

    /// Walk the parent chain of the account with the given code, root first.
    /// Fails with `InvalidHierarchy` if the chain loops.
    pub async fn resolve_parent(&self, code: &str, pump_id: i64) -> LedgerResult<Vec<Account>> {
        let account = self
            .by_code(code, pump_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))?;
        self.account_path(account.id).await
    }

    /// Walk the parent chain from the account to the root, root first.
    /// Fails with `InvalidHierarchy` if the chain loops.
    pub async fn account_path(&self, account_id: Uuid) -> LedgerResult<Vec<Account>> {
        let mut path = Vec::new();
        let mut visited = std::collections::HashSet::new();
        let mut current = Some(account_id);

        while let Some(id) = current {
            if !visited.insert(id) {
                return Err(LedgerError::InvalidHierarchy(id.to_string()));
            }
            let account = self.get_required(id).await?;
            current = account.parent_id;
            path.insert(0, account);
        }

        Ok(path)
    }

    async fn assert_acyclic(&self, start: &Account) -> LedgerResult<()> {
        self.account_path(start.id).await.map(|_| ())
    }

    /// Lock an account against new postings
    pub async fn lock(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.set_locked(account_id, true).await
    }

    /// Unlock an account
    pub async fn unlock(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.set_locked(account_id, false).await
    }

    async fn set_locked(&self, account_id: Uuid, locked: bool) -> LedgerResult<Account> {
        let mut account = self.get_required(account_id).await?;
        account.is_locked = locked;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.save_account(&account).await?;
        info!(code = %account.code, locked, "account lock flag changed");
        Ok(account)
    }

    /// Deactivate an account. Accounts are never deleted; system accounts
    /// cannot be deactivated.
    pub async fn deactivate(&self, account_id: Uuid) -> LedgerResult<Account> {
        let mut account = self.get_required(account_id).await?;
        if account.is_system_account {
            return Err(LedgerError::Validation(format!(
                "system account '{}' cannot be deactivated",
                account.code
            )));
        }
        account.is_active = false;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.save_account(&account).await?;
        info!(code = %account.code, "account deactivated");
        Ok(account)
    }

    /// Reactivate a previously deactivated account
    pub async fn reactivate(&self, account_id: Uuid) -> LedgerResult<Account> {
        let mut account = self.get_required(account_id).await?;
        account.is_active = true;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.save_account(&account).await?;
        Ok(account)
    }

    /// Account balance as of a date.
    ///
    /// With a date this is reconstructed from the posted ledger, not the
    /// cached balance, because backdated postings invalidate the cache for
    /// dates before now. Without a date the cache is the chain tip and is
    /// returned directly.
    pub async fn balance_as_of(
        &self,
        account_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> LedgerResult<BigDecimal> {
        let account = self.get_required(account_id).await?;

        let Some(date) = as_of else {
            return Ok(account.current_balance);
        };

        let entries = self.storage.ledger_entries_for_account(account_id).await?;
        let mut balance = account.opening_balance.clone();
        for entry in entries
            .iter()
            .filter(|e| e.transaction_date <= date)
        {
            balance += account.signed_delta(entry.entry_type, entry.amount());
        }

        Ok(balance)
    }

    /// Ledger rows for an account between two dates, chain order, with the
    /// stored running balances
    pub async fn statement(
        &self,
        account_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        // get_required also surfaces AccountNotFound for bogus statements
        self.get_required(account_id).await?;
        let entries = self.storage.ledger_entries_for_account(account_id).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.transaction_date >= from && e.transaction_date <= to)
            .collect())
    }
}
