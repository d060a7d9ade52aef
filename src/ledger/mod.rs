//! Ledger module containing the chart of accounts, voucher assembly and the
//! posting engine

pub mod accounts;
pub mod core;
pub mod locking;
pub mod posting;
pub mod voucher;

pub use accounts::*;
pub use core::*;
pub use locking::*;
pub use posting::*;
pub use voucher::*;
