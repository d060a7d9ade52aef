//! Core types and data structures for the voucher-posting ledger

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets - what the station owns (cash, fuel stock, equipment, etc.)
    Asset,
    /// Liabilities - what the station owes (supplier credit, loans, etc.)
    Liability,
    /// Equity - owner's interest in the business
    Equity,
    /// Income - money earned (fuel sales, lubricant sales, etc.)
    Income,
    /// Expenses - costs incurred (salaries, electricity, transport, etc.)
    Expense,
}

impl AccountType {
    /// Returns the normal balance side for this account type.
    /// Assets and Expenses carry debit balances; Liabilities, Equity and
    /// Income carry credit balances.
    pub fn normal_balance(&self) -> EntryType {
        match self {
            AccountType::Asset | AccountType::Expense => EntryType::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Income => EntryType::Credit,
        }
    }
}

/// Sides of a double-entry posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Debit entry - increases debit-balance accounts, decreases credit-balance accounts
    Debit,
    /// Credit entry - increases credit-balance accounts, decreases debit-balance accounts
    Credit,
}

impl EntryType {
    /// The opposite side, used when building reversal vouchers
    pub fn opposite(&self) -> EntryType {
        match self {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }
}

/// An account in the chart of accounts.
///
/// Accounts are created once at setup and only deactivated afterwards, never
/// deleted. `current_balance` is a cache of the latest running balance and is
/// rewritten only by the posting engine while it holds the account lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: Uuid,
    /// Account code, unique within the owning pump
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Reporting group (e.g. "Current Assets", "Direct Income")
    pub group: String,
    /// Side on which this account normally carries its balance
    pub balance_type: EntryType,
    /// Balance brought in when the account was opened
    pub opening_balance: BigDecimal,
    /// Cached balance after the latest posted entry
    pub current_balance: BigDecimal,
    /// Balance up to the latest reconciled entry
    pub reconciled_balance: BigDecimal,
    /// Parent account in the hierarchy, resolved and cycle-checked at creation
    pub parent_id: Option<Uuid>,
    /// System accounts are seeded by setup and cannot be deactivated
    pub is_system_account: bool,
    /// Inactive accounts reject new postings
    pub is_active: bool,
    /// Locked accounts reject new postings until unlocked
    pub is_locked: bool,
    /// Owning pump (scope)
    pub pump_id: i64,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Signed balance movement of an entry against this account.
    ///
    /// An entry on the account's normal side increases the balance; an entry
    /// on the opposite side decreases it.
    pub fn signed_delta(&self, entry_type: EntryType, amount: &BigDecimal) -> BigDecimal {
        if entry_type == self.balance_type {
            amount.clone()
        } else {
            -amount.clone()
        }
    }

    /// Whether new postings may reference this account
    pub fn accepts_postings(&self) -> bool {
        self.is_active && !self.is_locked
    }
}

/// The kinds of vouchers the station back office raises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoucherType {
    /// Money received (customer payments, cash deposits)
    Receipt,
    /// Money paid out (supplier payments, expenses)
    Payment,
    /// General journal adjustment
    Journal,
    /// Transfer between cash/bank accounts
    Contra,
    /// Fuel and shop sales
    Sales,
    /// Fuel and stock purchases
    Purchase,
    /// Debit note issued to a supplier
    DebitNote,
    /// Credit note issued to a customer
    CreditNote,
    /// Goods returned by a customer
    SalesReturn,
    /// Goods returned to a supplier
    PurchaseReturn,
}

impl VoucherType {
    /// Short prefix used when minting voucher numbers
    pub fn prefix(&self) -> &'static str {
        match self {
            VoucherType::Receipt => "RV",
            VoucherType::Payment => "PV",
            VoucherType::Journal => "JV",
            VoucherType::Contra => "CV",
            VoucherType::Sales => "SV",
            VoucherType::Purchase => "PUR",
            VoucherType::DebitNote => "DN",
            VoucherType::CreditNote => "CN",
            VoucherType::SalesReturn => "SRN",
            VoucherType::PurchaseReturn => "PRN",
        }
    }
}

/// Lifecycle state of a voucher.
///
/// Draft -> Approved -> Posted, with Draft/Approved -> Cancelled. Posted and
/// Cancelled are terminal. The posting and cancellation facts live inside the
/// state so illegal flag combinations cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VoucherStatus {
    /// Being assembled, entries may still change
    Draft,
    /// Validated and frozen for posting
    Approved,
    /// Materialized in the ledger, append-only from here on
    Posted {
        posted_at: NaiveDateTime,
        posted_by: String,
    },
    /// Abandoned before posting, with the reason recorded
    Cancelled {
        reason: String,
        cancelled_at: NaiveDateTime,
    },
}

impl VoucherStatus {
    /// Short label for logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            VoucherStatus::Draft => "draft",
            VoucherStatus::Approved => "approved",
            VoucherStatus::Posted { .. } => "posted",
            VoucherStatus::Cancelled { .. } => "cancelled",
        }
    }

    /// Whether the voucher has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VoucherStatus::Posted { .. } | VoucherStatus::Cancelled { .. }
        )
    }
}

/// One debit or credit line inside a voucher.
///
/// Exists only inside its owning voucher; the account reference is a plain id
/// resolved at validation and posting time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherEntry {
    /// Account being affected
    pub account_id: Uuid,
    /// Side of the entry (Debit or Credit)
    pub entry_type: EntryType,
    /// Amount of the entry, always positive
    pub amount: BigDecimal,
    /// Optional line-level narration
    pub narration: Option<String>,
}

impl VoucherEntry {
    /// Create a new entry
    pub fn new(
        account_id: Uuid,
        entry_type: EntryType,
        amount: BigDecimal,
        narration: Option<String>,
    ) -> Self {
        Self {
            account_id,
            entry_type,
            amount,
            narration,
        }
    }

    /// Create a debit entry
    pub fn debit(account_id: Uuid, amount: BigDecimal, narration: Option<String>) -> Self {
        Self::new(account_id, EntryType::Debit, amount, narration)
    }

    /// Create a credit entry
    pub fn credit(account_id: Uuid, amount: BigDecimal, narration: Option<String>) -> Self {
        Self::new(account_id, EntryType::Credit, amount, narration)
    }
}

/// A balanced set of debit/credit instructions representing one business
/// transaction.
///
/// The voucher owns its entries while Draft or Approved; once Posted the
/// entry list is frozen and corrections go through a new reversing voucher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    /// Unique identifier for the voucher
    pub id: Uuid,
    /// Voucher number, assigned at posting if still unassigned
    pub number: Option<String>,
    /// Kind of voucher
    pub voucher_type: VoucherType,
    /// Transaction date the voucher is effective on
    pub date: NaiveDate,
    /// Description of the transaction
    pub narration: String,
    /// Lifecycle state
    pub status: VoucherStatus,
    /// Owning pump (scope)
    pub pump_id: i64,
    /// User who created the voucher
    pub created_by: String,
    /// Ordered debit/credit lines
    pub entries: Vec<VoucherEntry>,
    /// When the voucher was created
    pub created_at: NaiveDateTime,
    /// When the voucher was last updated
    pub updated_at: NaiveDateTime,
}

impl Voucher {
    /// Create a new draft voucher with no entries
    pub fn new(
        voucher_type: VoucherType,
        date: NaiveDate,
        narration: String,
        pump_id: i64,
        created_by: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            number: None,
            voucher_type,
            date,
            narration,
            status: VoucherStatus::Draft,
            pump_id,
            created_by,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append an entry to the voucher
    pub fn add_entry(&mut self, entry: VoucherEntry) {
        self.entries.push(entry);
        self.updated_at = chrono::Utc::now().naive_utc();
    }

    /// Sum of all debit lines
    pub fn total_debits(&self) -> BigDecimal {
        self.entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Debit)
            .map(|e| &e.amount)
            .sum()
    }

    /// Sum of all credit lines
    pub fn total_credits(&self) -> BigDecimal {
        self.entries
            .iter()
            .filter(|e| e.entry_type == EntryType::Credit)
            .map(|e| &e.amount)
            .sum()
    }

    /// Total transaction amount (the debit side of a balanced voucher)
    pub fn total_amount(&self) -> BigDecimal {
        self.total_debits()
    }

    /// Check the double-entry invariant (debits == credits)
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    /// Structural validation of the voucher body.
    ///
    /// Requires at least two lines with a debit/credit pair, positive
    /// amounts on every line, and equal debit and credit totals.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.entries.len() < 2 {
            return Err(LedgerError::InsufficientEntries(self.entries.len()));
        }

        let has_debit = self.entries.iter().any(|e| e.entry_type == EntryType::Debit);
        let has_credit = self
            .entries
            .iter()
            .any(|e| e.entry_type == EntryType::Credit);
        if !has_debit || !has_credit {
            return Err(LedgerError::InsufficientEntries(self.entries.len()));
        }

        for entry in &self.entries {
            if entry.amount <= BigDecimal::from(0) {
                return Err(LedgerError::InvalidAmount(entry.amount.clone()));
            }
        }

        if !self.is_balanced() {
            return Err(LedgerError::Unbalanced {
                debits: self.total_debits(),
                credits: self.total_credits(),
            });
        }

        Ok(())
    }
}

/// An immutable posted record of one account-side effect of a voucher.
///
/// Ids are assigned by storage in append order, so `(transaction_date, id)`
/// is the canonical chain order for running balances. Rows are write-once
/// apart from the reconciliation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Storage-assigned sequence id, monotonic per append
    pub id: u64,
    /// Account the entry belongs to
    pub account_id: Uuid,
    /// Voucher that produced the entry
    pub voucher_id: Uuid,
    /// Date the entry takes effect
    pub transaction_date: NaiveDate,
    /// Side of the entry
    pub entry_type: EntryType,
    /// Debit amount, zero for credit entries
    pub debit_amount: BigDecimal,
    /// Credit amount, zero for debit entries
    pub credit_amount: BigDecimal,
    /// Account balance immediately after this entry in chain order
    pub running_balance: BigDecimal,
    /// Whether the entry has been matched against an external statement
    pub reconciled: bool,
    /// When the entry was reconciled
    pub reconciled_at: Option<NaiveDateTime>,
    /// Who reconciled the entry
    pub reconciled_by: Option<String>,
    /// When the entry was written
    pub created_at: NaiveDateTime,
}

impl LedgerEntry {
    /// The entry amount on whichever side it was posted
    pub fn amount(&self) -> &BigDecimal {
        match self.entry_type {
            EntryType::Debit => &self.debit_amount,
            EntryType::Credit => &self.credit_amount,
        }
    }
}

/// A bounded accounting period; at most one may be active per scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialYear {
    /// Unique identifier
    pub id: Uuid,
    /// Unique display name, e.g. "FY2025-26"
    pub name: String,
    /// First date of the period (inclusive)
    pub start_date: NaiveDate,
    /// Last date of the period (inclusive)
    pub end_date: NaiveDate,
    /// Whether this is the scope's active year
    pub is_active: bool,
    /// Owning pump, or None for a global year
    pub pump_id: Option<i64>,
    /// When the year was created
    pub created_at: NaiveDateTime,
}

impl FinancialYear {
    /// Whether a date falls inside `[start_date, end_date]`
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Position of a date relative to a financial year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodPosition {
    /// Before the year starts
    Past,
    /// Inside the year
    Current,
    /// After the year ends
    Future,
}

/// Outcome of a successful posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingResult {
    /// The posted voucher
    pub voucher_id: Uuid,
    /// The voucher number in effect after posting
    pub voucher_number: String,
    /// Ids of the ledger entries written, in voucher line order
    pub posted_entry_ids: Vec<u64>,
}

/// Broad classification of ledger errors, mirroring how callers should react
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Rejected before any persistence; fix the request
    Validation,
    /// Illegal lifecycle transition; not retryable
    State,
    /// A referenced record is missing or unusable; not retryable
    Reference,
    /// The voucher date has no open financial year; open one first
    Period,
    /// Lock contention; safe to retry after backoff
    Concurrency,
    /// Backend failure
    Storage,
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("entry amount must be positive, got {0}")]
    InvalidAmount(BigDecimal),
    #[error("voucher is not balanced: debits = {debits}, credits = {credits}")]
    Unbalanced {
        debits: BigDecimal,
        credits: BigDecimal,
    },
    #[error("voucher needs at least one debit and one credit line, has {0} line(s)")]
    InsufficientEntries(usize),
    #[error("financial year '{0}' has an invalid period")]
    InvalidPeriod(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("voucher not found: {0}")]
    VoucherNotFound(Uuid),
    #[error("ledger entry not found: {0}")]
    EntryNotFound(u64),
    #[error("financial year not found: {0}")]
    FinancialYearNotFound(Uuid),
    #[error("account '{0}' is locked against posting")]
    AccountLocked(String),
    #[error("account '{0}' is inactive")]
    AccountInactive(String),
    #[error("account '{code}' belongs to pump {account_pump}, voucher is for pump {voucher_pump}")]
    CrossPumpMismatch {
        code: String,
        account_pump: i64,
        voucher_pump: i64,
    },
    #[error("voucher number '{0}' is already in use")]
    DuplicateVoucherNumber(String),
    #[error("account code '{code}' already exists for pump {pump_id}")]
    DuplicateAccountCode { code: String, pump_id: i64 },
    #[error("account hierarchy cycle detected at '{0}'")]
    InvalidHierarchy(String),
    #[error("voucher {0} is already posted")]
    AlreadyPosted(Uuid),
    #[error("voucher {0} is already cancelled")]
    AlreadyCancelled(Uuid),
    #[error("ledger entry {0} is already reconciled")]
    AlreadyReconciled(u64),
    #[error("voucher {voucher_id} cannot move from {from} to {to}")]
    InvalidTransition {
        voucher_id: Uuid,
        from: &'static str,
        to: &'static str,
    },
    #[error("no active financial year for scope {scope:?}")]
    NoActiveFinancialYear { scope: Option<i64> },
    #[error("date {date} falls outside the active financial year '{year}'")]
    DateOutsideActiveYear { date: NaiveDate, year: String },
    #[error("timed out waiting for the posting lock on account {0}")]
    LockTimeout(Uuid),
}

impl LedgerError {
    /// The broad class this error belongs to
    pub fn class(&self) -> ErrorClass {
        match self {
            LedgerError::Storage(_) => ErrorClass::Storage,
            LedgerError::Validation(_)
            | LedgerError::InvalidAmount(_)
            | LedgerError::Unbalanced { .. }
            | LedgerError::InsufficientEntries(_)
            | LedgerError::InvalidPeriod(_) => ErrorClass::Validation,
            LedgerError::AlreadyPosted(_)
            | LedgerError::AlreadyCancelled(_)
            | LedgerError::AlreadyReconciled(_)
            | LedgerError::InvalidTransition { .. } => ErrorClass::State,
            LedgerError::AccountNotFound(_)
            | LedgerError::VoucherNotFound(_)
            | LedgerError::EntryNotFound(_)
            | LedgerError::FinancialYearNotFound(_)
            | LedgerError::AccountLocked(_)
            | LedgerError::AccountInactive(_)
            | LedgerError::CrossPumpMismatch { .. }
            | LedgerError::DuplicateVoucherNumber(_)
            | LedgerError::DuplicateAccountCode { .. }
            | LedgerError::InvalidHierarchy(_) => ErrorClass::Reference,
            LedgerError::NoActiveFinancialYear { .. }
            | LedgerError::DateOutsideActiveYear { .. } => ErrorClass::Period,
            LedgerError::LockTimeout(_) => ErrorClass::Concurrency,
        }
    }

    /// Whether a caller may retry the operation after backoff.
    /// Only lock timeouts qualify; a timeout guarantees nothing was written.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Concurrency
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
