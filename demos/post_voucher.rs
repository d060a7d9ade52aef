//! End-to-end voucher posting example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use forecourt_ledger::utils::MemoryStorage;
use forecourt_ledger::{patterns, AccountType, Ledger, NewAccount, VoucherBuilder, VoucherType};

fn account(code: &str, name: &str, account_type: AccountType, opening: i64) -> NewAccount {
    NewAccount {
        code: code.to_string(),
        name: name.to_string(),
        account_type,
        group: "General".to_string(),
        balance_type: account_type.normal_balance(),
        opening_balance: BigDecimal::from(opening),
        parent_code: None,
        pump_id: 1,
        is_system_account: false,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("⛽ Forecourt Ledger - Voucher Posting Example\n");

    let ledger = Ledger::new(MemoryStorage::new());

    // 1. Open a financial year for pump 1
    println!("📅 Opening financial year...");
    let year = ledger
        .create_financial_year(
            "FY2025-26".to_string(),
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            Some(1),
        )
        .await?;
    ledger.activate_financial_year(year.id).await?;
    println!("  ✓ {} is active\n", year.name);

    // 2. Set up a minimal chart of accounts
    println!("📊 Setting up Chart of Accounts...");
    let cash = ledger
        .create_account(account("1000", "Cash in Hand", AccountType::Asset, 25000))
        .await?;
    let bank = ledger
        .create_account(account("1100", "Bank", AccountType::Asset, 100000))
        .await?;
    let fuel_sales = ledger
        .create_account(account("4000", "Fuel Sales", AccountType::Income, 0))
        .await?;
    let fuel_stock = ledger
        .create_account(account("1300", "Fuel Stock", AccountType::Asset, 0))
        .await?;
    let supplier = ledger
        .create_account(account("2000", "Fuel Supplier", AccountType::Liability, 0))
        .await?;
    for a in [&cash, &bank, &fuel_stock, &fuel_sales, &supplier] {
        println!("  ✓ {} - {} ({:?})", a.code, a.name, a.account_type);
    }
    println!();

    // 3. Record the day's fuel sales
    println!("💰 Posting vouchers...\n");
    let sales = patterns::fuel_sales_voucher(
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        "Shift A fuel sales".to_string(),
        "clerk".to_string(),
        &cash,
        &fuel_sales,
        BigDecimal::from(48500),
    )?;
    ledger.save_draft(&sales).await?;
    ledger.approve_voucher(sales.id).await?;
    let result = ledger.post_voucher(sales.id, "manager").await?;
    println!(
        "  ✓ Posted {} with {} ledger entries",
        result.voucher_number,
        result.posted_entry_ids.len()
    );

    // A multi-line purchase paid partly from bank, partly on credit
    let purchase = VoucherBuilder::start_draft(
        VoucherType::Purchase,
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        "Tanker delivery 12kl".to_string(),
        1,
        "clerk".to_string(),
    )
    .debit(&fuel_stock, BigDecimal::from(60000), Some("invoice 881".to_string()))?
    .credit(&bank, BigDecimal::from(40000), None)?
    .credit(&supplier, BigDecimal::from(20000), Some("on credit".to_string()))?
    .build()?;
    ledger.save_draft(&purchase).await?;
    ledger.approve_voucher(purchase.id).await?;
    let result = ledger.post_voucher(purchase.id, "manager").await?;
    println!("  ✓ Posted {}\n", result.voucher_number);

    // 4. Balances and statement
    println!("📈 Balances after posting:");
    for a in [&cash, &bank, &fuel_sales] {
        println!(
            "  {} {}: {}",
            a.code,
            a.name,
            ledger.get_balance(a.id, None).await?
        );
    }
    println!();

    println!("📜 Cash statement:");
    let statement = ledger
        .get_statement(
            cash.id,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        )
        .await?;
    for row in statement {
        println!(
            "  {} debit {} credit {} running {}",
            row.transaction_date, row.debit_amount, row.credit_amount, row.running_balance
        );
    }

    Ok(())
}
