//! Loan type catalog management.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use kopa_shared::types::{LoanTypeId, PageRequest, PageResponse};

use crate::fees::materializer::is_storable_amount;
use crate::fees::types::FeeAttribute;
use crate::loan::error::LoanError;
use crate::loan::ports::LoanTypeCatalog;
use crate::loan::types::{LoanType, LoanTypeInput};

/// Service for creating and maintaining loan types.
///
/// Changing a loan type never touches loans already originated from it.
pub struct LoanTypeService<C> {
    catalog: Arc<C>,
}

impl<C> Clone for LoanTypeService<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<C: LoanTypeCatalog> LoanTypeService<C> {
    /// Create a new loan type service.
    #[must_use]
    pub fn new(catalog: Arc<C>) -> Self {
        Self { catalog }
    }

    /// Validate and store a new loan type.
    pub async fn create(&self, input: LoanTypeInput) -> Result<LoanType, LoanError> {
        validate_loan_type(&input)?;

        let now = Utc::now();
        let loan_type = LoanType {
            id: LoanTypeId::new(),
            name: input.name.trim().to_string(),
            description: input.description,
            classification: input.classification,
            min_amount: input.min_amount,
            max_amount: input.max_amount,
            max_term: input.max_term,
            approvers: input.approvers,
            attributes: input.attributes,
            created_at: now,
            updated_at: now,
        };
        self.catalog.insert_loan_type(&loan_type).await?;

        info!(
            loan_type_id = %loan_type.id,
            name = %loan_type.name,
            approvers = loan_type.approvers.len(),
            attributes = loan_type.attributes.len(),
            "Loan type created"
        );
        Ok(loan_type)
    }

    /// Get a loan type by ID.
    pub async fn get(&self, id: LoanTypeId) -> Result<LoanType, LoanError> {
        self.catalog
            .find_loan_type(id)
            .await?
            .ok_or(LoanError::LoanTypeNotFound(id))
    }

    /// List loan types.
    pub async fn list(&self, page: PageRequest) -> Result<PageResponse<LoanType>, LoanError> {
        self.catalog.list_loan_types(page.normalized()).await
    }

    /// Replace a loan type's definition.
    pub async fn update(&self, id: LoanTypeId, input: LoanTypeInput) -> Result<LoanType, LoanError> {
        validate_loan_type(&input)?;
        let existing = self.get(id).await?;

        let loan_type = LoanType {
            id,
            name: input.name.trim().to_string(),
            description: input.description,
            classification: input.classification,
            min_amount: input.min_amount,
            max_amount: input.max_amount,
            max_term: input.max_term,
            approvers: input.approvers,
            attributes: input.attributes,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        self.catalog.update_loan_type(&loan_type).await?;

        info!(loan_type_id = %id, "Loan type updated");
        Ok(loan_type)
    }

    /// Delete a loan type that no loan references.
    pub async fn delete(&self, id: LoanTypeId) -> Result<(), LoanError> {
        if self.catalog.is_referenced(id).await? {
            return Err(LoanError::LoanTypeInUse(id));
        }
        if !self.catalog.delete_loan_type(id).await? {
            return Err(LoanError::LoanTypeNotFound(id));
        }

        info!(loan_type_id = %id, "Loan type deleted");
        Ok(())
    }

    /// The loan type's fee-attribute catalog.
    pub async fn attributes(&self, id: LoanTypeId) -> Result<Vec<FeeAttribute>, LoanError> {
        Ok(self.get(id).await?.attributes)
    }
}

/// Validate a loan type definition.
pub fn validate_loan_type(input: &LoanTypeInput) -> Result<(), LoanError> {
    if input.name.trim().is_empty() {
        return Err(LoanError::validation("Loan type name is required"));
    }

    for (label, amount) in [("minimum", input.min_amount), ("maximum", input.max_amount)] {
        if let Some(amount) = amount
            && amount <= Decimal::ZERO
        {
            return Err(LoanError::validation(format!(
                "The {label} amount must be positive, got {amount}"
            )));
        }
        if let Some(amount) = amount
            && !is_storable_amount(amount)
        {
            return Err(LoanError::validation(format!(
                "The {label} amount {amount} has more than 4 decimal places or reaches 10^15"
            )));
        }
    }

    if let (Some(min), Some(max)) = (input.min_amount, input.max_amount)
        && min > max
    {
        return Err(LoanError::validation(format!(
            "Minimum amount {min} exceeds maximum amount {max}"
        )));
    }

    if input.max_term.is_some_and(|term| term.value == 0) {
        return Err(LoanError::validation("Maximum term must be positive"));
    }

    for attribute in &input.attributes {
        attribute.validate()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::error::FeeError;
    use crate::fees::types::OneTimeTiming;
    use crate::loan::types::{LoanClassification, LoanTerm, TermUnit};
    use rust_decimal_macros::dec;

    fn input() -> LoanTypeInput {
        LoanTypeInput {
            name: "Biashara".to_string(),
            description: Some("Business loan".to_string()),
            classification: LoanClassification::Cash,
            min_amount: Some(dec!(500)),
            max_amount: Some(dec!(50000)),
            max_term: Some(LoanTerm::new(12, TermUnit::Months)),
            approvers: Vec::new(),
            attributes: vec![FeeAttribute::one_time("Processing", dec!(5), true)],
        }
    }

    #[test]
    fn test_valid_loan_type() {
        assert!(validate_loan_type(&input()).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let input = LoanTypeInput {
            name: "  ".to_string(),
            ..input()
        };
        assert!(matches!(validate_loan_type(&input), Err(LoanError::Validation(_))));
    }

    #[test]
    fn test_min_above_max_rejected() {
        let input = LoanTypeInput {
            min_amount: Some(dec!(1000)),
            max_amount: Some(dec!(999)),
            ..input()
        };
        assert!(matches!(validate_loan_type(&input), Err(LoanError::Validation(_))));
    }

    #[test]
    fn test_unstorable_bounds_rejected() {
        let too_precise = LoanTypeInput {
            min_amount: Some(dec!(500.00001)),
            ..input()
        };
        let too_large = LoanTypeInput {
            max_amount: Some(dec!(1000000000000000)),
            ..input()
        };
        assert!(matches!(validate_loan_type(&too_precise), Err(LoanError::Validation(_))));
        assert!(matches!(validate_loan_type(&too_large), Err(LoanError::Validation(_))));
    }

    #[test]
    fn test_zero_max_term_rejected() {
        let input = LoanTypeInput {
            max_term: Some(LoanTerm::new(0, TermUnit::Days)),
            ..input()
        };
        assert!(validate_loan_type(&input).is_err());
    }

    #[test]
    fn test_malformed_attribute_rejected() {
        let input = LoanTypeInput {
            attributes: vec![FeeAttribute {
                one_time_timing: Some(OneTimeTiming::AfterPeriod),
                ..FeeAttribute::one_time("Insurance", dec!(100), false)
            }],
            ..input()
        };
        assert!(matches!(
            validate_loan_type(&input),
            Err(LoanError::Fee(FeeError::MalformedAttribute { .. }))
        ));
    }
}
