use crate::error::AnalyticsError;
use crate::report::{Metric, UndefinedReason};
use chrono::NaiveDate;
use core_types::{DayCountBasis, FlowDirection};
use serde::{Deserialize, Serialize};

/// A single cashflow as the solver sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedAmount {
    pub date: NaiveDate,
    /// Negative for money put in, positive for money taken out.
    pub amount: f64,
}

impl DatedAmount {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Tuning knobs for the Newton–Raphson iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverParams {
    /// Starting rate.
    pub initial_guess: f64,
    /// The iteration has converged once an update is smaller than this.
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Lower clamp for every iterate. Must stay above -1, where NPV is singular.
    pub min_rate: f64,
    /// Upper clamp for every iterate.
    pub max_rate: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            initial_guess: 0.10,
            tolerance: 1e-6,
            max_iterations: 100,
            min_rate: -0.99,
            max_rate: 10.0,
        }
    }
}

impl SolverParams {
    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(AnalyticsError::InvalidSolverParameter(
                "tolerance",
                format!("must be positive, got {}", self.tolerance),
            ));
        }
        if self.max_iterations == 0 {
            return Err(AnalyticsError::InvalidSolverParameter(
                "max_iterations",
                "must be at least 1".to_string(),
            ));
        }
        if !(self.min_rate.is_finite() && self.min_rate > -1.0) {
            return Err(AnalyticsError::InvalidSolverParameter(
                "min_rate",
                format!("must be greater than -1, got {}", self.min_rate),
            ));
        }
        if !(self.max_rate.is_finite() && self.max_rate > self.min_rate) {
            return Err(AnalyticsError::InvalidSolverParameter(
                "max_rate",
                format!("must be greater than min_rate ({}), got {}", self.min_rate, self.max_rate),
            ));
        }
        if !self.initial_guess.is_finite() {
            return Err(AnalyticsError::InvalidSolverParameter(
                "initial_guess",
                "must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Finds the annualised rate at which the discounted cashflows sum to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct XirrSolver {
    params: SolverParams,
    basis: DayCountBasis,
}

impl XirrSolver {
    pub fn new(params: SolverParams, basis: DayCountBasis) -> Result<Self, AnalyticsError> {
        params.validate()?;
        Ok(Self { params, basis })
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn basis(&self) -> DayCountBasis {
        self.basis
    }

    /// Solves for XIRR over cashflows given in chronological order.
    ///
    /// Every cashflow is discounted to the earliest date. The summation follows
    /// the order of `flows`, so identical input always yields an identical rate.
    pub fn solve(&self, flows: &[DatedAmount]) -> Metric {
        if flows.len() < 2 {
            return Metric::Undefined(UndefinedReason::TooFewRecords);
        }

        let has_direction =
            |direction| flows.iter().any(|cf| FlowDirection::of_f64(cf.amount) == direction);
        let has_negative = has_direction(FlowDirection::Contribution);
        let has_positive = has_direction(FlowDirection::Return);
        if !has_negative || !has_positive {
            return Metric::Undefined(UndefinedReason::SameSignCashflows);
        }

        let Some(anchor) = flows.iter().map(|cf| cf.date).min() else {
            return Metric::Undefined(UndefinedReason::TooFewRecords);
        };
        let terms: Vec<(f64, f64)> = flows
            .iter()
            .map(|cf| (self.basis.years((cf.date - anchor).num_days()), cf.amount))
            .collect();

        let SolverParams {
            initial_guess,
            tolerance,
            max_iterations,
            min_rate,
            max_rate,
        } = self.params;

        let mut rate = initial_guess;
        for iteration in 0..max_iterations {
            rate = rate.clamp(min_rate, max_rate);

            let (npv, derivative) = npv_and_derivative(&terms, rate);
            if !npv.is_finite() || !derivative.is_finite() {
                return Metric::Undefined(UndefinedReason::NonFiniteValue);
            }
            if derivative == 0.0 {
                tracing::debug!(iteration, rate, "XIRR derivative vanished.");
                return Metric::Undefined(UndefinedReason::ZeroDerivative);
            }

            let step = npv / derivative;
            let next = rate - step;
            if step.abs() < tolerance {
                return Metric::finite(next.clamp(min_rate, max_rate));
            }
            rate = next;
        }

        tracing::debug!(max_iterations, last_rate = rate, "XIRR did not converge.");
        Metric::Undefined(UndefinedReason::NoConvergence)
    }
}

/// NPV at `rate` and its derivative, over `(years, amount)` terms.
fn npv_and_derivative(terms: &[(f64, f64)], rate: f64) -> (f64, f64) {
    let base = 1.0 + rate;
    terms
        .iter()
        .fold((0.0, 0.0), |(npv, derivative), &(years, amount)| {
            (
                npv + amount / base.powf(years),
                derivative - years * amount / base.powf(years + 1.0),
            )
        })
}
