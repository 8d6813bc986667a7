//! Fee domain types: loan-type templates and materialized loan fees.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use kopa_shared::types::FeeId;

use crate::fees::error::FeeError;
use crate::fees::materializer::is_storable_amount;

/// How often a fee is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeType {
    /// Charged once over the life of the loan.
    OneTime,
    /// Accrues every month over the loan term.
    RecurringMonthly,
}

impl ChargeType {
    /// Returns the string representation of the charge type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "ONE_TIME",
            Self::RecurringMonthly => "RECURRING_MONTHLY",
        }
    }

    /// Parses a charge type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ONE_TIME" => Some(Self::OneTime),
            "RECURRING_MONTHLY" => Some(Self::RecurringMonthly),
            _ => None,
        }
    }
}

impl fmt::Display for ChargeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When a one-time fee falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OneTimeTiming {
    /// Due at disbursement.
    Immediate,
    /// Due after a configured period.
    AfterPeriod,
}

impl OneTimeTiming {
    /// Returns the string representation of the timing.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "IMMEDIATE",
            Self::AfterPeriod => "AFTER_PERIOD",
        }
    }

    /// Parses a timing from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "IMMEDIATE" => Some(Self::Immediate),
            "AFTER_PERIOD" => Some(Self::AfterPeriod),
            _ => None,
        }
    }
}

/// Calendar unit used by fee timing periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodUnit {
    /// Days.
    Days,
    /// Weeks.
    Weeks,
    /// Months.
    Months,
}

impl PeriodUnit {
    /// Returns the string representation of the unit.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Days => "DAYS",
            Self::Weeks => "WEEKS",
            Self::Months => "MONTHS",
        }
    }

    /// Parses a unit from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DAYS" => Some(Self::Days),
            "WEEKS" => Some(Self::Weeks),
            "MONTHS" => Some(Self::Months),
            _ => None,
        }
    }
}

/// Resolved timing of a one-time fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "timing", rename_all = "snake_case")]
pub enum FeeTiming {
    /// No timing configured.
    Unspecified,
    /// Due at disbursement.
    Immediate,
    /// Due a fixed period after disbursement.
    AfterPeriod {
        /// Number of units.
        value: u32,
        /// Calendar unit.
        unit: PeriodUnit,
    },
}

/// Typed view of a fee attribute's charging rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeSchedule {
    /// Charged once, with the given timing.
    OneTime(FeeTiming),
    /// Charged monthly over the term.
    RecurringMonthly,
}

/// A fee or interest attribute on a loan type's template.
///
/// The one-time timing fields mirror what an administrator configures and
/// are only meaningful for [`ChargeType::OneTime`]; for recurring charges
/// they are ignored entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAttribute {
    /// Display name (e.g. "Processing").
    pub name: String,
    /// Fixed amount, or percentage of principal when `is_percentage`.
    pub value: Decimal,
    /// Whether `value` is a percentage of the principal.
    pub is_percentage: bool,
    /// Charge frequency.
    pub charge_type: ChargeType,
    /// Timing of a one-time charge.
    #[serde(default)]
    pub one_time_timing: Option<OneTimeTiming>,
    /// Period length, required for `AFTER_PERIOD`.
    #[serde(default)]
    pub one_time_period_value: Option<u32>,
    /// Period unit, required for `AFTER_PERIOD`.
    #[serde(default)]
    pub one_time_period_unit: Option<PeriodUnit>,
}

impl FeeAttribute {
    /// Creates a one-time attribute with no timing configured.
    #[must_use]
    pub fn one_time(name: impl Into<String>, value: Decimal, is_percentage: bool) -> Self {
        Self {
            name: name.into(),
            value,
            is_percentage,
            charge_type: ChargeType::OneTime,
            one_time_timing: None,
            one_time_period_value: None,
            one_time_period_unit: None,
        }
    }

    /// Creates a recurring monthly attribute.
    #[must_use]
    pub fn recurring_monthly(name: impl Into<String>, value: Decimal, is_percentage: bool) -> Self {
        Self {
            charge_type: ChargeType::RecurringMonthly,
            ..Self::one_time(name, value, is_percentage)
        }
    }

    /// Resolves the charging rules.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::MalformedAttribute` when an `AFTER_PERIOD` one-time
    /// charge lacks a positive period value or a period unit.
    pub fn schedule(&self) -> Result<ChargeSchedule, FeeError> {
        match self.charge_type {
            ChargeType::RecurringMonthly => Ok(ChargeSchedule::RecurringMonthly),
            ChargeType::OneTime => {
                let timing = match self.one_time_timing {
                    None => FeeTiming::Unspecified,
                    Some(OneTimeTiming::Immediate) => FeeTiming::Immediate,
                    Some(OneTimeTiming::AfterPeriod) => {
                        match (self.one_time_period_value, self.one_time_period_unit) {
                            (None, _) => {
                                return Err(
                                    self.malformed("AFTER_PERIOD timing requires a period value")
                                );
                            }
                            (Some(0), _) => {
                                return Err(self.malformed("period value must be positive"));
                            }
                            (Some(_), None) => {
                                return Err(
                                    self.malformed("AFTER_PERIOD timing requires a period unit")
                                );
                            }
                            (Some(value), Some(unit)) => FeeTiming::AfterPeriod { value, unit },
                        }
                    }
                };
                Ok(ChargeSchedule::OneTime(timing))
            }
        }
    }

    /// Validates the attribute as a whole.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::MalformedAttribute` for a blank name, a negative
    /// or unstorable value, or an invalid one-time schedule.
    pub fn validate(&self) -> Result<(), FeeError> {
        if self.name.trim().is_empty() {
            return Err(self.malformed("name is required"));
        }
        if self.value.is_sign_negative() && !self.value.is_zero() {
            return Err(self.malformed("value must not be negative"));
        }
        if !is_storable_amount(self.value) {
            return Err(self.malformed(
                "value must have at most 4 decimal places and stay below 10^15",
            ));
        }
        self.schedule().map(|_| ())
    }

    fn malformed(&self, reason: &str) -> FeeError {
        FeeError::MalformedAttribute {
            name: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

/// A concrete fee charged to one loan.
///
/// Produced once when the loan is created and never recomputed in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Fee identifier.
    pub id: FeeId,
    /// Name copied from the template.
    pub name: String,
    /// Resolved monetary amount.
    pub amount: Decimal,
    /// Whether the template value was a percentage.
    pub is_percentage: bool,
    /// Template value before resolution.
    pub original_value: Decimal,
    /// Charge frequency copied from the template.
    pub charge_type: ChargeType,
}

impl Fee {
    /// Returns true if the fee counts toward the payable total at origination.
    #[must_use]
    pub fn is_one_time(&self) -> bool {
        self.charge_type == ChargeType::OneTime
    }
}
