//! Integration tests for forecourt-ledger

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use forecourt_ledger::{
    patterns, utils::MemoryStorage, AccountType, EntryType, Ledger, LedgerError, NewAccount,
    VoucherBuilder, VoucherStatus, VoucherType,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn account_params(
    code: &str,
    name: &str,
    account_type: AccountType,
    balance_type: EntryType,
    opening: i64,
    pump_id: i64,
) -> NewAccount {
    NewAccount {
        code: code.to_string(),
        name: name.to_string(),
        account_type,
        group: "General".to_string(),
        balance_type,
        opening_balance: BigDecimal::from(opening),
        parent_code: None,
        pump_id,
        is_system_account: false,
    }
}

/// Ledger over memory storage with an active global FY2025-26.
async fn setup() -> (Ledger<MemoryStorage>, MemoryStorage) {
    let storage = MemoryStorage::new();
    let ledger = Ledger::new(storage.clone());
    let year = ledger
        .create_financial_year(
            "FY2025-26".to_string(),
            date(2025, 4, 1),
            date(2026, 3, 31),
            None,
        )
        .await
        .unwrap();
    ledger.activate_financial_year(year.id).await.unwrap();
    (ledger, storage)
}

#[tokio::test]
async fn posted_voucher_ledger_rows_balance() {
    let (ledger, _) = setup().await;

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            0,
            1,
        ))
        .await
        .unwrap();
    let fuel = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();
    let lubes = ledger
        .create_account(account_params(
            "4100",
            "Lubricant Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    let voucher = VoucherBuilder::start_draft(
        VoucherType::Sales,
        date(2025, 6, 1),
        "day sales".to_string(),
        1,
        "clerk".to_string(),
    )
    .debit(&cash, BigDecimal::from(5300), None)
    .and_then(|b| b.credit(&fuel, BigDecimal::from(5000), None))
    .and_then(|b| b.credit(&lubes, BigDecimal::from(300), None))
    .and_then(|b| b.build())
    .unwrap();

    ledger.save_draft(&voucher).await.unwrap();
    ledger.approve_voucher(voucher.id).await.unwrap();
    let result = ledger.post_voucher(voucher.id, "manager").await.unwrap();
    assert_eq!(result.posted_entry_ids.len(), 3);

    let mut debits = BigDecimal::from(0);
    let mut credits = BigDecimal::from(0);
    for account in [&cash, &fuel, &lubes] {
        for row in ledger
            .get_statement(account.id, date(2025, 6, 1), date(2025, 6, 30))
            .await
            .unwrap()
        {
            debits += row.debit_amount;
            credits += row.credit_amount;
        }
    }
    assert_eq!(debits, BigDecimal::from(5300));
    assert_eq!(debits, credits);
}

#[tokio::test]
async fn posting_is_atomic_under_injected_failure() {
    let (ledger, storage) = setup().await;

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            1000,
            1,
        ))
        .await
        .unwrap();
    let sales = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    let voucher = patterns::fuel_sales_voucher(
        date(2025, 6, 1),
        "doomed then retried".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(700),
    )
    .unwrap();
    ledger.save_draft(&voucher).await.unwrap();
    ledger.approve_voucher(voucher.id).await.unwrap();

    storage.fail_next_append();
    let err = ledger.post_voucher(voucher.id, "manager").await.unwrap_err();
    assert!(matches!(err, LedgerError::Storage(_)));

    // Nothing was written and the voucher is still approved.
    let stored = ledger.get_voucher(voucher.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VoucherStatus::Approved);
    assert!(ledger
        .get_statement(cash.id, date(2025, 4, 1), date(2026, 3, 31))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        ledger.get_balance(cash.id, None).await.unwrap(),
        BigDecimal::from(1000)
    );

    // The same voucher posts cleanly on retry.
    let result = ledger.post_voucher(voucher.id, "manager").await.unwrap();
    assert_eq!(result.posted_entry_ids.len(), 2);
    assert_eq!(
        ledger.get_balance(cash.id, None).await.unwrap(),
        BigDecimal::from(1700)
    );
}

#[tokio::test]
async fn backdated_posting_rechains_running_balances() {
    let (ledger, _) = setup().await;

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            0,
            1,
        ))
        .await
        .unwrap();
    let sales = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    for (day, amount) in [(10, 100), (20, 200)] {
        let voucher = patterns::fuel_sales_voucher(
            date(2025, 6, day),
            format!("sales day {}", day),
            "clerk".to_string(),
            &cash,
            &sales,
            BigDecimal::from(amount),
        )
        .unwrap();
        ledger.save_draft(&voucher).await.unwrap();
        ledger.approve_voucher(voucher.id).await.unwrap();
        ledger.post_voucher(voucher.id, "manager").await.unwrap();
    }

    // Backdated correction before both existing entries.
    let backdated = patterns::fuel_sales_voucher(
        date(2025, 6, 1),
        "late-entered sales".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(50),
    )
    .unwrap();
    ledger.save_draft(&backdated).await.unwrap();
    ledger.approve_voucher(backdated.id).await.unwrap();
    ledger.post_voucher(backdated.id, "manager").await.unwrap();

    let statement = ledger
        .get_statement(cash.id, date(2025, 6, 1), date(2025, 6, 30))
        .await
        .unwrap();
    let runnings: Vec<BigDecimal> = statement.iter().map(|e| e.running_balance.clone()).collect();
    assert_eq!(
        runnings,
        vec![
            BigDecimal::from(50),
            BigDecimal::from(150),
            BigDecimal::from(350)
        ]
    );

    // Recomputing the chain from the raw ledger reproduces the stored
    // running balances exactly.
    for entry in &statement {
        let recomputed = ledger
            .get_balance(cash.id, Some(entry.transaction_date))
            .await
            .unwrap();
        let last_on_date = statement
            .iter()
            .filter(|e| e.transaction_date <= entry.transaction_date)
            .next_back()
            .unwrap();
        assert_eq!(recomputed, last_on_date.running_balance);
    }

    assert_eq!(
        ledger.get_balance(cash.id, None).await.unwrap(),
        BigDecimal::from(350)
    );
}

#[tokio::test]
async fn current_balance_equals_opening_plus_signed_deltas() {
    let (ledger, _) = setup().await;

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            2500,
            1,
        ))
        .await
        .unwrap();
    let supplier = ledger
        .create_account(account_params(
            "2000",
            "Fuel Supplier",
            AccountType::Liability,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();
    let sales = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    let sale = patterns::fuel_sales_voucher(
        date(2025, 5, 2),
        "sales".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(900),
    )
    .unwrap();
    let payment = patterns::payment_voucher(
        date(2025, 5, 3),
        "supplier payment".to_string(),
        "clerk".to_string(),
        &supplier,
        &cash,
        BigDecimal::from(400),
    )
    .unwrap();

    for voucher in [&sale, &payment] {
        ledger.save_draft(voucher).await.unwrap();
        ledger.approve_voucher(voucher.id).await.unwrap();
        ledger.post_voucher(voucher.id, "manager").await.unwrap();
    }

    // Debit account: opening 2500 + 900 - 400.
    assert_eq!(
        ledger.get_balance(cash.id, None).await.unwrap(),
        BigDecimal::from(3000)
    );
    // Credit-balance liability debited by the payment: 0 - 400.
    assert_eq!(
        ledger.get_balance(supplier.id, None).await.unwrap(),
        BigDecimal::from(-400)
    );
    // The cache equals the ledger reconstruction at the latest date.
    assert_eq!(
        ledger.get_balance(cash.id, None).await.unwrap(),
        ledger
            .get_balance(cash.id, Some(date(2025, 5, 3)))
            .await
            .unwrap()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_postings_keep_the_shared_account_consistent() {
    let (ledger, _) = setup().await;
    let ledger = Arc::new(ledger);

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            0,
            1,
        ))
        .await
        .unwrap();

    let mut incomes = Vec::new();
    for i in 0..8 {
        incomes.push(
            ledger
                .create_account(account_params(
                    &format!("40{:02}", i),
                    &format!("Income {}", i),
                    AccountType::Income,
                    EntryType::Credit,
                    0,
                    1,
                ))
                .await
                .unwrap(),
        );
    }

    let mut handles = Vec::new();
    let mut expected_total = BigDecimal::from(0);
    for (i, income) in incomes.into_iter().enumerate() {
        let amount = BigDecimal::from((i as i64 + 1) * 100);
        expected_total += &amount;
        let ledger = Arc::clone(&ledger);
        let cash = cash.clone();
        handles.push(tokio::spawn(async move {
            let voucher = patterns::fuel_sales_voucher(
                date(2025, 6, 10),
                format!("concurrent sale {}", i),
                "clerk".to_string(),
                &cash,
                &income,
                amount,
            )
            .unwrap();
            ledger.save_draft(&voucher).await.unwrap();
            ledger.approve_voucher(voucher.id).await.unwrap();
            ledger.post_voucher(voucher.id, "manager").await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(
        ledger.get_balance(cash.id, None).await.unwrap(),
        expected_total
    );

    // The running-balance chain is contiguous: each row adds its own delta.
    let statement = ledger
        .get_statement(cash.id, date(2025, 6, 1), date(2025, 6, 30))
        .await
        .unwrap();
    assert_eq!(statement.len(), 8);
    let mut balance = BigDecimal::from(0);
    for row in &statement {
        balance += &row.debit_amount - &row.credit_amount;
        assert_eq!(row.running_balance, balance);
    }
    assert_eq!(balance, expected_total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_activation_leaves_exactly_one_active_year() {
    let storage = MemoryStorage::new();
    let ledger = Arc::new(Ledger::new(storage.clone()));

    let mut year_ids = Vec::new();
    for (i, name) in ["FY2023-24", "FY2024-25", "FY2025-26"].iter().enumerate() {
        let start = date(2023 + i as i32, 4, 1);
        let end = date(2024 + i as i32, 3, 31);
        let year = ledger
            .create_financial_year(name.to_string(), start, end, Some(7))
            .await
            .unwrap();
        year_ids.push(year.id);
    }

    let mut handles = Vec::new();
    for round in 0..12 {
        let ledger = Arc::clone(&ledger);
        let year_id = year_ids[round % year_ids.len()];
        handles.push(tokio::spawn(async move {
            ledger.activate_financial_year(year_id).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    use forecourt_ledger::LedgerStorage;
    let years = storage.list_financial_years(Some(7)).await.unwrap();
    let active = years.iter().filter(|y| y.is_active).count();
    assert_eq!(active, 1);
}

#[tokio::test]
async fn reconciliation_touches_only_metadata() {
    let (ledger, _) = setup().await;

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            0,
            1,
        ))
        .await
        .unwrap();
    let sales = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    let voucher = patterns::fuel_sales_voucher(
        date(2025, 6, 5),
        "sales".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(1200),
    )
    .unwrap();
    ledger.save_draft(&voucher).await.unwrap();
    ledger.approve_voucher(voucher.id).await.unwrap();
    let result = ledger.post_voucher(voucher.id, "manager").await.unwrap();

    let before = ledger
        .unreconciled_entries(cash.id)
        .await
        .unwrap()
        .into_iter()
        .find(|e| result.posted_entry_ids.contains(&e.id))
        .unwrap();

    let after = ledger
        .reconcile(before.id, "auditor", chrono::Utc::now().naive_utc())
        .await
        .unwrap();

    assert!(after.reconciled);
    assert_eq!(after.reconciled_by.as_deref(), Some("auditor"));
    assert_eq!(after.debit_amount, before.debit_amount);
    assert_eq!(after.credit_amount, before.credit_amount);
    assert_eq!(after.running_balance, before.running_balance);

    // The account's reconciled balance moved to the entry's running balance.
    let account = ledger.get_account(cash.id).await.unwrap().unwrap();
    assert_eq!(account.reconciled_balance, after.running_balance);

    // Reconciling twice is an error; the entry is no longer listed.
    assert!(matches!(
        ledger
            .reconcile(before.id, "auditor", chrono::Utc::now().naive_utc())
            .await,
        Err(LedgerError::AlreadyReconciled(_))
    ));
    assert!(ledger
        .unreconciled_entries(cash.id)
        .await
        .unwrap()
        .iter()
        .all(|e| e.id != before.id));
}

#[tokio::test]
async fn contra_posting_moves_two_debit_accounts_in_opposite_directions() {
    let (ledger, _) = setup().await;

    let a1001 = ledger
        .create_account(account_params(
            "A1001",
            "Cash in Hand",
            AccountType::Asset,
            EntryType::Debit,
            1000,
            1,
        ))
        .await
        .unwrap();
    let a2001 = ledger
        .create_account(account_params(
            "A2001",
            "Bank",
            AccountType::Asset,
            EntryType::Debit,
            0,
            1,
        ))
        .await
        .unwrap();

    let voucher = patterns::contra_voucher(
        date(2025, 6, 1),
        "cash withdrawn from bank".to_string(),
        "clerk".to_string(),
        &a1001,
        &a2001,
        BigDecimal::from(500),
    )
    .unwrap();
    ledger.save_draft(&voucher).await.unwrap();
    ledger.approve_voucher(voucher.id).await.unwrap();
    ledger.post_voucher(voucher.id, "manager").await.unwrap();

    // The debited account rises, the credited debit-type account falls.
    assert_eq!(
        ledger.get_balance(a1001.id, None).await.unwrap(),
        BigDecimal::from(1500)
    );
    assert_eq!(
        ledger.get_balance(a2001.id, None).await.unwrap(),
        BigDecimal::from(-500)
    );
}

#[tokio::test]
async fn cancelled_draft_leaves_no_trace() {
    let (ledger, _) = setup().await;

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            1000,
            1,
        ))
        .await
        .unwrap();
    let sales = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    let voucher = patterns::fuel_sales_voucher(
        date(2025, 6, 1),
        "entered twice".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(300),
    )
    .unwrap();
    ledger.save_draft(&voucher).await.unwrap();

    let cancelled = ledger
        .cancel_voucher(voucher.id, "duplicate entry")
        .await
        .unwrap();
    match &cancelled.status {
        VoucherStatus::Cancelled { reason, .. } => assert_eq!(reason, "duplicate entry"),
        other => panic!("expected cancelled, got {:?}", other),
    }

    assert!(ledger
        .get_statement(cash.id, date(2025, 4, 1), date(2026, 3, 31))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        ledger.get_balance(cash.id, None).await.unwrap(),
        BigDecimal::from(1000)
    );

    // Terminal state: no further transitions.
    assert!(matches!(
        ledger.approve_voucher(voucher.id).await,
        Err(LedgerError::AlreadyCancelled(_))
    ));
    assert!(matches!(
        ledger.cancel_voucher(voucher.id, "again").await,
        Err(LedgerError::AlreadyCancelled(_))
    ));

    // An empty reason never cancels anything.
    let another = patterns::fuel_sales_voucher(
        date(2025, 6, 2),
        "kept".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(100),
    )
    .unwrap();
    ledger.save_draft(&another).await.unwrap();
    assert!(matches!(
        ledger.cancel_voucher(another.id, "  ").await,
        Err(LedgerError::Validation(_))
    ));
}

#[tokio::test]
async fn posting_requires_an_open_financial_year() {
    let storage = MemoryStorage::new();
    let ledger = Ledger::new(storage);

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            0,
            1,
        ))
        .await
        .unwrap();
    let sales = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    let voucher = patterns::fuel_sales_voucher(
        date(2025, 6, 1),
        "no period yet".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(100),
    )
    .unwrap();
    ledger.save_draft(&voucher).await.unwrap();
    ledger.approve_voucher(voucher.id).await.unwrap();

    assert!(matches!(
        ledger.post_voucher(voucher.id, "manager").await,
        Err(LedgerError::NoActiveFinancialYear { .. })
    ));

    // Opening a year that does not cover the date is still a rejection.
    let year = ledger
        .create_financial_year(
            "FY2024-25".to_string(),
            date(2024, 4, 1),
            date(2025, 3, 31),
            None,
        )
        .await
        .unwrap();
    ledger.activate_financial_year(year.id).await.unwrap();

    assert!(matches!(
        ledger.post_voucher(voucher.id, "manager").await,
        Err(LedgerError::DateOutsideActiveYear { .. })
    ));

    // The voucher survives both rejections untouched.
    let stored = ledger.get_voucher(voucher.id).await.unwrap().unwrap();
    assert_eq!(stored.status, VoucherStatus::Approved);
}

#[tokio::test]
async fn locked_and_cross_pump_accounts_block_posting() {
    let (ledger, _) = setup().await;

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            0,
            1,
        ))
        .await
        .unwrap();
    let sales = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    let voucher = patterns::fuel_sales_voucher(
        date(2025, 6, 1),
        "sales".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(100),
    )
    .unwrap();
    ledger.save_draft(&voucher).await.unwrap();
    ledger.approve_voucher(voucher.id).await.unwrap();

    // Locked after approval: posting still refuses.
    ledger.lock_account(cash.id).await.unwrap();
    assert!(matches!(
        ledger.post_voucher(voucher.id, "manager").await,
        Err(LedgerError::AccountLocked(_))
    ));
    ledger.unlock_account(cash.id).await.unwrap();

    // A voucher whose line points at another pump's account is refused.
    let foreign = ledger
        .create_account(account_params(
            "1000",
            "Other Pump Cash",
            AccountType::Asset,
            EntryType::Debit,
            0,
            2,
        ))
        .await
        .unwrap();
    let mut crossed = ledger.get_voucher(voucher.id).await.unwrap().unwrap();
    crossed.entries[0].account_id = foreign.id;
    ledger.save_draft(&crossed).await.unwrap();
    assert!(matches!(
        ledger.post_voucher(crossed.id, "manager").await,
        Err(LedgerError::CrossPumpMismatch { .. })
    ));
}

#[tokio::test]
async fn duplicate_voucher_numbers_are_rejected() {
    let (ledger, _) = setup().await;

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            0,
            1,
        ))
        .await
        .unwrap();
    let sales = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    let first = patterns::fuel_sales_voucher(
        date(2025, 6, 1),
        "first".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(100),
    )
    .unwrap();
    ledger.save_draft(&first).await.unwrap();
    ledger.approve_voucher(first.id).await.unwrap();
    let posted = ledger.post_voucher(first.id, "manager").await.unwrap();

    // A second voucher pre-assigned the same number collides.
    let mut second = patterns::fuel_sales_voucher(
        date(2025, 6, 2),
        "second".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(200),
    )
    .unwrap();
    second.number = Some(posted.voucher_number.clone());
    ledger.save_draft(&second).await.unwrap();
    ledger.approve_voucher(second.id).await.unwrap();

    assert!(matches!(
        ledger.post_voucher(second.id, "manager").await,
        Err(LedgerError::DuplicateVoucherNumber(number)) if number == posted.voucher_number
    ));
}

#[tokio::test]
async fn reversal_voucher_restores_balances() {
    let (ledger, _) = setup().await;

    let cash = ledger
        .create_account(account_params(
            "1000",
            "Cash",
            AccountType::Asset,
            EntryType::Debit,
            500,
            1,
        ))
        .await
        .unwrap();
    let sales = ledger
        .create_account(account_params(
            "4000",
            "Fuel Sales",
            AccountType::Income,
            EntryType::Credit,
            0,
            1,
        ))
        .await
        .unwrap();

    let voucher = patterns::fuel_sales_voucher(
        date(2025, 6, 1),
        "mistaken sale".to_string(),
        "clerk".to_string(),
        &cash,
        &sales,
        BigDecimal::from(800),
    )
    .unwrap();
    ledger.save_draft(&voucher).await.unwrap();
    ledger.approve_voucher(voucher.id).await.unwrap();
    ledger.post_voucher(voucher.id, "manager").await.unwrap();

    // Posted vouchers cannot be cancelled; corrections reverse instead.
    assert!(matches!(
        ledger.cancel_voucher(voucher.id, "oops").await,
        Err(LedgerError::AlreadyPosted(_))
    ));

    let reversal = ledger.reverse_voucher(voucher.id, "manager").await.unwrap();
    assert_eq!(reversal.entries.len(), 2);
    ledger.approve_voucher(reversal.id).await.unwrap();
    ledger.post_voucher(reversal.id, "manager").await.unwrap();

    assert_eq!(
        ledger.get_balance(cash.id, None).await.unwrap(),
        BigDecimal::from(500)
    );
    assert_eq!(
        ledger.get_balance(sales.id, None).await.unwrap(),
        BigDecimal::from(0)
    );
}

#[tokio::test]
async fn activating_the_next_year_swaps_scope_seven() {
    let storage = MemoryStorage::new();
    let ledger = Ledger::new(storage.clone());

    let fy24 = ledger
        .create_financial_year(
            "FY2024-25".to_string(),
            date(2024, 4, 1),
            date(2025, 3, 31),
            Some(7),
        )
        .await
        .unwrap();
    let fy25 = ledger
        .create_financial_year(
            "FY2025-26".to_string(),
            date(2025, 4, 1),
            date(2026, 3, 31),
            Some(7),
        )
        .await
        .unwrap();

    ledger.activate_financial_year(fy24.id).await.unwrap();
    let (previous, active) = ledger.activate_financial_year(fy25.id).await.unwrap();

    assert_eq!(previous.as_ref().map(|y| y.name.as_str()), Some("FY2024-25"));
    assert!(!previous.unwrap().is_active);
    assert_eq!(active.name, "FY2025-26");
    assert!(active.is_active);

    use forecourt_ledger::LedgerStorage;
    let years = storage.list_financial_years(Some(7)).await.unwrap();
    assert_eq!(years.iter().filter(|y| y.is_active).count(), 1);
}
