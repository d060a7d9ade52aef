//! Financial year (fiscal period) management

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::ledger::locking::KeyedLocks;
use crate::traits::LedgerStorage;
use crate::types::*;

/// Owns the set of fiscal periods and the "exactly one active year per
/// scope" invariant.
///
/// Activation swaps run under a per-scope advisory lock and commit through a
/// single atomic storage call, so concurrent activations can never leave a
/// scope with zero or two active years.
pub struct FinancialYearGuard<S: LedgerStorage> {
    storage: S,
    scope_locks: Arc<KeyedLocks<Option<i64>>>,
}

impl<S: LedgerStorage> FinancialYearGuard<S> {
    /// Create a new guard
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            scope_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Create a financial year. Years start inactive; `activate` brings them
    /// into effect.
    pub async fn create(
        &self,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        pump_id: Option<i64>,
    ) -> LedgerResult<FinancialYear> {
        if start_date > end_date {
            return Err(LedgerError::InvalidPeriod(name));
        }
        let existing = self.storage.list_financial_years(pump_id).await?;
        if existing.iter().any(|y| y.name == name) {
            return Err(LedgerError::Validation(format!(
                "financial year '{}' already exists for scope {:?}",
                name, pump_id
            )));
        }

        let year = FinancialYear {
            id: Uuid::new_v4(),
            name,
            start_date,
            end_date,
            is_active: false,
            pump_id,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.storage.save_financial_year(&year).await?;
        info!(year = %year.name, scope = ?pump_id, "financial year created");

        Ok(year)
    }

    /// Get a financial year by id, returning an error if not found
    pub async fn get_required(&self, year_id: Uuid) -> LedgerResult<FinancialYear> {
        self.storage
            .get_financial_year(year_id)
            .await?
            .ok_or(LedgerError::FinancialYearNotFound(year_id))
    }

    /// Activate a year, deactivating whichever year was active in the same
    /// scope. Returns (previously active, now active).
    pub async fn activate(
        &self,
        year_id: Uuid,
    ) -> LedgerResult<(Option<FinancialYear>, FinancialYear)> {
        let year = self.get_required(year_id).await?;

        let _guard = self.scope_locks.lock(&year.pump_id).await;
        let (previous, activated) = self
            .storage
            .swap_active_financial_year(year.pump_id, year_id)
            .await?;

        info!(
            year = %activated.name,
            scope = ?activated.pump_id,
            replaced = previous.as_ref().map(|y| y.name.as_str()),
            "financial year activated"
        );

        Ok((previous, activated))
    }

    /// Where a date sits relative to a year's `[start_date, end_date]`
    pub fn classify(&self, date: NaiveDate, year: &FinancialYear) -> PeriodPosition {
        if date < year.start_date {
            PeriodPosition::Past
        } else if date > year.end_date {
            PeriodPosition::Future
        } else {
            PeriodPosition::Current
        }
    }

    /// The active year governing a pump: the pump-scoped active year when
    /// one exists, otherwise the global one.
    pub async fn active_year(&self, pump_id: i64) -> LedgerResult<FinancialYear> {
        if let Some(year) = self.storage.get_active_financial_year(Some(pump_id)).await? {
            return Ok(year);
        }
        self.storage
            .get_active_financial_year(None)
            .await?
            .ok_or(LedgerError::NoActiveFinancialYear {
                scope: Some(pump_id),
            })
    }

    /// Reject posting dates that fall outside the scope's active year.
    ///
    /// The legacy system never enforced this; it is a deliberate hardening
    /// policy, so the posting engine calls it before touching any account.
    pub async fn assert_open_period(&self, date: NaiveDate, pump_id: i64) -> LedgerResult<()> {
        let year = self.active_year(pump_id).await?;
        if !year.contains(date) {
            return Err(LedgerError::DateOutsideActiveYear {
                date,
                year: year.name,
            });
        }
        Ok(())
    }
}
