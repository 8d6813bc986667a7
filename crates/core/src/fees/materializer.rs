//! Fee materialization.
//!
//! Converts a loan type's fee-attribute catalog into concrete fee line items
//! for one principal amount.

use rust_decimal::{Decimal, RoundingStrategy};

use kopa_shared::types::FeeId;

use crate::fees::error::FeeError;
use crate::fees::types::{Fee, FeeAttribute};

/// Decimal places kept on resolved percentage fees.
pub const FEE_DECIMAL_PLACES: u32 = 2;

/// Most decimal places a stored amount can carry.
pub const AMOUNT_DECIMAL_PLACES: u32 = 4;

/// Stored amounts stay strictly below 10^15.
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// True if `amount` can be stored without rounding or overflow.
#[must_use]
pub fn is_storable_amount(amount: Decimal) -> bool {
    amount.abs() < AMOUNT_LIMIT && amount.normalize().scale() <= AMOUNT_DECIMAL_PLACES
}

/// Stateless service that resolves fee templates against a principal.
pub struct FeeMaterializer;

impl FeeMaterializer {
    /// Materialize a catalog into one fee per attribute, in catalog order.
    ///
    /// The whole catalog is validated before any fee is produced, so a caller
    /// gets either every fee or an error.
    ///
    /// # Errors
    ///
    /// * `FeeError::NonPositivePrincipal` if `principal <= 0`
    /// * `FeeError::MalformedAttribute` if any attribute is invalid
    /// * `FeeError::AmountOverflow` if a percentage cannot be applied
    pub fn materialize(catalog: &[FeeAttribute], principal: Decimal) -> Result<Vec<Fee>, FeeError> {
        if principal <= Decimal::ZERO {
            return Err(FeeError::NonPositivePrincipal(principal));
        }

        for attribute in catalog {
            attribute.validate()?;
        }

        catalog
            .iter()
            .map(|attribute| {
                Ok(Fee {
                    id: FeeId::new(),
                    name: attribute.name.clone(),
                    amount: Self::resolve_amount(attribute, principal)?,
                    is_percentage: attribute.is_percentage,
                    original_value: attribute.value,
                    charge_type: attribute.charge_type,
                })
            })
            .collect()
    }

    /// Resolve one attribute's amount.
    ///
    /// Percentages are rounded half-up to two decimal places; fixed values
    /// are returned verbatim.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::AmountOverflow` if the multiplication overflows or
    /// the amount reaches [`AMOUNT_LIMIT`].
    pub fn resolve_amount(attribute: &FeeAttribute, principal: Decimal) -> Result<Decimal, FeeError> {
        let amount = if attribute.is_percentage {
            principal
                .checked_mul(attribute.value)
                .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
                .map(|amount| {
                    amount.round_dp_with_strategy(
                        FEE_DECIMAL_PLACES,
                        RoundingStrategy::MidpointAwayFromZero,
                    )
                })
        } else {
            Some(attribute.value)
        };

        amount
            .filter(|amount| *amount < AMOUNT_LIMIT)
            .ok_or_else(|| FeeError::AmountOverflow {
                name: attribute.name.clone(),
                principal,
            })
    }

    /// Sum of one-time fee amounts. Recurring fees accrue over the term and
    /// are excluded.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::TotalOverflow` if the sum does not fit.
    pub fn one_time_total(fees: &[Fee]) -> Result<Decimal, FeeError> {
        fees.iter()
            .filter(|fee| fee.is_one_time())
            .try_fold(Decimal::ZERO, |total, fee| total.checked_add(fee.amount))
            .ok_or(FeeError::TotalOverflow {
                principal: Decimal::ZERO,
            })
    }

    /// Principal plus all one-time fees.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::TotalOverflow` if the total reaches
    /// [`AMOUNT_LIMIT`].
    pub fn total_payable(principal: Decimal, fees: &[Fee]) -> Result<Decimal, FeeError> {
        Self::one_time_total(fees)
            .ok()
            .and_then(|fees_total| principal.checked_add(fees_total))
            .filter(|total| *total < AMOUNT_LIMIT)
            .ok_or(FeeError::TotalOverflow { principal })
    }
}
