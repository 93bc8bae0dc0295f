use crate::error::AnalyticsError;
use crate::report::{to_f64, Metric, PerformanceReport, UndefinedReason};
use crate::xirr::{DatedAmount, SolverParams, XirrSolver};
use core_types::{CashflowRecord, DayCountBasis, FlowDirection, Owner};
use ledger::CashflowLedger;
use rust_decimal::Decimal;

/// A stateless calculator for deriving performance metrics from a cashflow ledger.
///
/// Every metric in a report is computed from the same date-sorted record set,
/// and with the same day-count basis.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEngine {
    solver: XirrSolver,
}

impl MetricsEngine {
    pub fn new(basis: DayCountBasis, params: SolverParams) -> Result<Self, AnalyticsError> {
        Ok(Self {
            solver: XirrSolver::new(params, basis)?,
        })
    }

    pub fn basis(&self) -> DayCountBasis {
        self.solver.basis()
    }

    pub fn params(&self) -> &SolverParams {
        self.solver.params()
    }

    /// Filters the ledger down to `owner`, then calculates their report.
    pub fn report_for_owner(&self, ledger: &CashflowLedger, owner: &Owner) -> PerformanceReport {
        self.calculate(&ledger.filter_by_owner(owner))
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// The ledger is expected to hold a single owner's records. This never fails:
    /// metrics that make no sense for the ledger come back as
    /// [`Metric::Undefined`].
    pub fn calculate(&self, ledger: &CashflowLedger) -> PerformanceReport {
        let mut report = PerformanceReport::new();
        if ledger.is_empty() {
            return report;
        }

        let sorted = ledger.sorted_by_date();
        report.record_count = sorted.len();
        report.first_date = sorted.first().map(|r| r.date);
        report.last_date = sorted.last().map(|r| r.date);

        match CapitalTotals::of(&sorted) {
            Some(totals) => {
                totals.fill(&mut report);
                self.calculate_returns(&sorted, &mut report);
            }
            None => {
                tracing::warn!(
                    records = report.record_count,
                    "Cashflow totals exceed the decimal range; ratios are undefined."
                );
                report.absolute_return = Metric::Undefined(UndefinedReason::NonFiniteValue);
                report.cagr = Metric::Undefined(UndefinedReason::NonFiniteValue);
                report.xirr = self.xirr(&sorted);
            }
        }

        tracing::debug!(
            records = report.record_count,
            invested = %report.invested,
            xirr = ?report.xirr,
            "Calculated performance report."
        );
        report
    }

    /// XIRR of records that are already in chronological order.
    pub fn xirr(&self, sorted: &[&CashflowRecord]) -> Metric {
        let flows: Vec<DatedAmount> = sorted
            .iter()
            .map(|r| DatedAmount::new(r.date, to_f64(r.amount)))
            .collect();
        self.solver.solve(&flows)
    }

    /// Calculates the absolute return, CAGR and XIRR.
    fn calculate_returns(&self, sorted: &[&CashflowRecord], report: &mut PerformanceReport) {
        report.absolute_return = if report.invested > Decimal::ZERO {
            Metric::finite(ratio(report.profit, report.invested))
        } else {
            Metric::Undefined(UndefinedReason::NothingInvested)
        };

        report.cagr = self.cagr(report);
        report.xirr = self.xirr(sorted);
    }

    /// Growth from invested capital to net value, annualised over the ledger span.
    fn cagr(&self, report: &PerformanceReport) -> Metric {
        if report.record_count < 2 {
            return Metric::Undefined(UndefinedReason::TooFewRecords);
        }
        if report.invested <= Decimal::ZERO {
            return Metric::Undefined(UndefinedReason::NothingInvested);
        }
        let (Some(first), Some(last)) = (report.first_date, report.last_date) else {
            return Metric::Undefined(UndefinedReason::TooFewRecords);
        };
        let span_days = (last - first).num_days();
        if span_days <= 0 {
            return Metric::Undefined(UndefinedReason::NonPositiveSpan);
        }

        let years = self.basis().years(span_days);
        let growth = ratio(report.net_value, report.invested);
        Metric::finite(growth.powf(1.0 / years) - 1.0)
    }
}

/// The decimal capital figures of a ledger.
struct CapitalTotals {
    invested: Decimal,
    withdrawn: Decimal,
    net_value: Decimal,
    profit: Decimal,
}

impl CapitalTotals {
    /// Sums the ledger, or `None` if any total leaves the `Decimal` range.
    fn of(sorted: &[&CashflowRecord]) -> Option<Self> {
        let mut invested = Decimal::ZERO;
        let mut withdrawn = Decimal::ZERO;
        let mut net_cashflow = Decimal::ZERO;

        for record in sorted {
            net_cashflow = net_cashflow.checked_add(record.amount)?;
            match record.direction() {
                FlowDirection::Contribution => {
                    invested = invested.checked_add(record.amount.abs())?;
                }
                FlowDirection::Return => withdrawn = withdrawn.checked_add(record.amount)?,
                FlowDirection::Inert => {}
            }
        }

        let net_value = invested.checked_add(net_cashflow)?;
        let profit = net_value.checked_sub(invested)?;
        Some(Self {
            invested,
            withdrawn,
            net_value,
            profit,
        })
    }

    fn fill(self, report: &mut PerformanceReport) {
        report.invested = self.invested;
        report.withdrawn = self.withdrawn;
        report.net_value = self.net_value;
        report.profit = self.profit;
    }
}

/// `numerator / denominator` as `f64`.
///
/// Quotients beyond the `Decimal` range, such as a large profit on a tiny
/// investment, are divided in floating point instead.
fn ratio(numerator: Decimal, denominator: Decimal) -> f64 {
    match numerator.checked_div(denominator) {
        Some(quotient) => to_f64(quotient),
        None => to_f64(numerator) / to_f64(denominator),
    }
}
