//! # Forecourt Ledger
//!
//! The double-entry accounting core of a fuel-station management backend:
//! voucher assembly, atomic posting with per-account running balances,
//! financial-year control and statement reconciliation.
//!
//! ## Features
//!
//! - **Double-entry posting**: multi-line vouchers validated against the
//!   debits == credits invariant before anything is persisted
//! - **Chart of accounts**: hierarchical accounts with lock/active flags,
//!   scoped per pump
//! - **Running balances**: each posted entry carries the account balance
//!   after it, re-chained correctly for backdated corrections
//! - **Financial years**: exactly one active period per scope, enforced
//!   through an atomic activation swap
//! - **Reconciliation**: posted entries matched against external statements
//!   without ever touching amounts
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use forecourt_ledger::Ledger;
//! use forecourt_ledger::utils::MemoryStorage;
//!
//! // Wire the core over any LedgerStorage implementation.
//! let ledger = Ledger::new(MemoryStorage::new());
//! ```

pub mod fiscal;
pub mod ledger;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use fiscal::*;
pub use ledger::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;

// Re-export voucher patterns for convenience
pub use ledger::voucher::patterns;
