//! Draft voucher assembly and validation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::ledger::accounts::assert_postable;
use crate::types::*;

/// Builder assembling a draft voucher line by line.
///
/// Lines are checked against the live account flags and the voucher scope as
/// they are added; the structural double-entry rules run at `build`.
#[derive(Debug)]
pub struct VoucherBuilder {
    voucher: Voucher,
}

impl VoucherBuilder {
    /// Start a new draft voucher
    pub fn start_draft(
        voucher_type: VoucherType,
        date: NaiveDate,
        narration: String,
        pump_id: i64,
        author: String,
    ) -> Self {
        Self {
            voucher: Voucher::new(voucher_type, date, narration, pump_id, author),
        }
    }

    /// Add a debit or credit line.
    ///
    /// Rejects non-positive amounts and accounts that are inactive, locked
    /// or owned by a different pump than the voucher.
    pub fn add_line(
        mut self,
        account: &Account,
        entry_type: EntryType,
        amount: BigDecimal,
        narration: Option<String>,
    ) -> LedgerResult<Self> {
        if amount <= BigDecimal::from(0) {
            return Err(LedgerError::InvalidAmount(amount));
        }
        assert_postable(account, self.voucher.pump_id)?;

        self.voucher
            .add_entry(VoucherEntry::new(account.id, entry_type, amount, narration));
        Ok(self)
    }

    /// Add a debit line
    pub fn debit(
        self,
        account: &Account,
        amount: BigDecimal,
        narration: Option<String>,
    ) -> LedgerResult<Self> {
        self.add_line(account, EntryType::Debit, amount, narration)
    }

    /// Add a credit line
    pub fn credit(
        self,
        account: &Account,
        amount: BigDecimal,
        narration: Option<String>,
    ) -> LedgerResult<Self> {
        self.add_line(account, EntryType::Credit, amount, narration)
    }

    /// Run the structural checks without consuming the builder
    pub fn validate(&self) -> LedgerResult<()> {
        self.voucher.validate()
    }

    /// Validate and yield the draft voucher
    pub fn build(self) -> LedgerResult<Voucher> {
        self.voucher.validate()?;
        Ok(self.voucher)
    }
}

/// Common voucher patterns for station bookkeeping
pub mod patterns {
    use super::*;

    /// Money received into cash from a customer or debtor account
    pub fn receipt_voucher(
        date: NaiveDate,
        narration: String,
        author: String,
        cash: &Account,
        received_from: &Account,
        amount: BigDecimal,
    ) -> LedgerResult<Voucher> {
        VoucherBuilder::start_draft(VoucherType::Receipt, date, narration, cash.pump_id, author)
            .debit(cash, amount.clone(), None)
            .and_then(|b| b.credit(received_from, amount, None))
            .and_then(|b| b.build())
    }

    /// Money paid out of cash to a supplier or expense account
    pub fn payment_voucher(
        date: NaiveDate,
        narration: String,
        author: String,
        paid_to: &Account,
        cash: &Account,
        amount: BigDecimal,
    ) -> LedgerResult<Voucher> {
        VoucherBuilder::start_draft(VoucherType::Payment, date, narration, cash.pump_id, author)
            .debit(paid_to, amount.clone(), None)
            .and_then(|b| b.credit(cash, amount, None))
            .and_then(|b| b.build())
    }

    /// Transfer between two cash/bank accounts
    pub fn contra_voucher(
        date: NaiveDate,
        narration: String,
        author: String,
        into: &Account,
        out_of: &Account,
        amount: BigDecimal,
    ) -> LedgerResult<Voucher> {
        VoucherBuilder::start_draft(VoucherType::Contra, date, narration, into.pump_id, author)
            .debit(into, amount.clone(), None)
            .and_then(|b| b.credit(out_of, amount, None))
            .and_then(|b| b.build())
    }

    /// Day's fuel sales banked into cash against a fuel income account
    pub fn fuel_sales_voucher(
        date: NaiveDate,
        narration: String,
        author: String,
        cash: &Account,
        fuel_income: &Account,
        amount: BigDecimal,
    ) -> LedgerResult<Voucher> {
        VoucherBuilder::start_draft(VoucherType::Sales, date, narration, cash.pump_id, author)
            .debit(cash, amount.clone(), None)
            .and_then(|b| b.credit(fuel_income, amount, None))
            .and_then(|b| b.build())
    }
}
