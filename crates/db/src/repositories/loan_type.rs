//! Loan type repository for database operations.
//!
//! A loan type is stored across three tables: the type row, its ordered
//! approver chain and its fee-attribute catalog. Writes replace the children
//! wholesale inside one database transaction.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use kopa_core::fees::{ChargeType, FeeAttribute, OneTimeTiming, PeriodUnit};
use kopa_core::loan::{LoanClassification, LoanError, LoanTerm, LoanType, LoanTypeCatalog, TermUnit};
use kopa_shared::types::{LoanTypeId, PageRequest, PageResponse, UserId};

use super::{corrupt, db_err, from_db_int, position, to_db_int};
use crate::entities::{fee_attributes, loan_type_approvers, loan_types, loans};

/// Loan type repository implementation.
#[derive(Debug, Clone)]
pub struct LoanTypeRepository {
    db: DatabaseConnection,
}

impl LoanTypeRepository {
    /// Create a new loan type repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl LoanTypeCatalog for LoanTypeRepository {
    async fn find_loan_type(&self, id: LoanTypeId) -> Result<Option<LoanType>, LoanError> {
        let model = loan_types::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        match model {
            Some(model) => Ok(hydrate(&self.db, vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_loan_types(
        &self,
        page: PageRequest,
    ) -> Result<PageResponse<LoanType>, LoanError> {
        let paginator = loan_types::Entity::find()
            .order_by_asc(loan_types::Column::Name)
            .order_by_asc(loan_types::Column::Id)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await.map_err(db_err)?;
        let models = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await
            .map_err(db_err)?;

        let data = hydrate(&self.db, models).await?;
        Ok(PageResponse::new(data, page, total))
    }

    async fn insert_loan_type(&self, loan_type: &LoanType) -> Result<(), LoanError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        to_active_model(loan_type)?
            .insert(&txn)
            .await
            .map_err(db_err)?;
        insert_children(&txn, loan_type).await?;

        txn.commit().await.map_err(db_err)
    }

    async fn update_loan_type(&self, loan_type: &LoanType) -> Result<(), LoanError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let id = loan_type.id.into_inner();

        to_active_model(loan_type)?
            .update(&txn)
            .await
            .map_err(db_err)?;

        loan_type_approvers::Entity::delete_many()
            .filter(loan_type_approvers::Column::LoanTypeId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        fee_attributes::Entity::delete_many()
            .filter(fee_attributes::Column::LoanTypeId.eq(id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        insert_children(&txn, loan_type).await?;

        txn.commit().await.map_err(db_err)
    }

    async fn delete_loan_type(&self, id: LoanTypeId) -> Result<bool, LoanError> {
        let result = loan_types::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn is_referenced(&self, id: LoanTypeId) -> Result<bool, LoanError> {
        let count = loans::Entity::find()
            .filter(loans::Column::LoanTypeId.eq(id.into_inner()))
            .count(&self.db)
            .await
            .map_err(db_err)?;

        Ok(count > 0)
    }
}

fn to_active_model(loan_type: &LoanType) -> Result<loan_types::ActiveModel, LoanError> {
    let max_term_value = loan_type
        .max_term
        .map(|term| to_db_int("max_term_value", term.value))
        .transpose()?;

    Ok(loan_types::ActiveModel {
        id: Set(loan_type.id.into_inner()),
        name: Set(loan_type.name.clone()),
        description: Set(loan_type.description.clone()),
        classification: Set(loan_type.classification.as_str().to_string()),
        min_amount: Set(loan_type.min_amount),
        max_amount: Set(loan_type.max_amount),
        max_term_value: Set(max_term_value),
        max_term_unit: Set(loan_type.max_term.map(|term| term.unit.as_str().to_string())),
        created_at: Set(loan_type.created_at.into()),
        updated_at: Set(Utc::now().into()),
    })
}

async fn insert_children<C: ConnectionTrait>(
    conn: &C,
    loan_type: &LoanType,
) -> Result<(), LoanError> {
    let loan_type_id = loan_type.id.into_inner();

    for (index, approver) in loan_type.approvers.iter().enumerate() {
        loan_type_approvers::ActiveModel {
            loan_type_id: Set(loan_type_id),
            position: Set(position(index)?),
            approver_id: Set(approver.into_inner()),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
    }

    for (index, attribute) in loan_type.attributes.iter().enumerate() {
        let period_value = attribute
            .one_time_period_value
            .map(|value| to_db_int("one_time_period_value", value))
            .transpose()?;

        fee_attributes::ActiveModel {
            id: Set(Uuid::now_v7()),
            loan_type_id: Set(loan_type_id),
            position: Set(position(index)?),
            name: Set(attribute.name.clone()),
            value: Set(attribute.value),
            is_percentage: Set(attribute.is_percentage),
            charge_type: Set(attribute.charge_type.as_str().to_string()),
            one_time_timing: Set(attribute.one_time_timing.map(|t| t.as_str().to_string())),
            one_time_period_value: Set(period_value),
            one_time_period_unit: Set(attribute.one_time_period_unit.map(|u| u.as_str().to_string())),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
    }

    Ok(())
}

/// Load the approver chains and attribute catalogs for a page of loan types.
async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    models: Vec<loan_types::Model>,
) -> Result<Vec<LoanType>, LoanError> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();

    let approver_rows = loan_type_approvers::Entity::find()
        .filter(loan_type_approvers::Column::LoanTypeId.is_in(ids.clone()))
        .order_by_asc(loan_type_approvers::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)?;
    let attribute_rows = fee_attributes::Entity::find()
        .filter(fee_attributes::Column::LoanTypeId.is_in(ids))
        .order_by_asc(fee_attributes::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)?;

    let mut approvers: HashMap<Uuid, Vec<UserId>> = HashMap::new();
    for row in approver_rows {
        approvers
            .entry(row.loan_type_id)
            .or_default()
            .push(UserId::from_uuid(row.approver_id));
    }

    let mut attributes: HashMap<Uuid, Vec<FeeAttribute>> = HashMap::new();
    for row in attribute_rows {
        let loan_type_id = row.loan_type_id;
        attributes
            .entry(loan_type_id)
            .or_default()
            .push(attribute_to_domain(row)?);
    }

    models
        .into_iter()
        .map(|model| {
            let id = model.id;
            to_domain(
                model,
                approvers.remove(&id).unwrap_or_default(),
                attributes.remove(&id).unwrap_or_default(),
            )
        })
        .collect()
}

fn to_domain(
    model: loan_types::Model,
    approvers: Vec<UserId>,
    attributes: Vec<FeeAttribute>,
) -> Result<LoanType, LoanError> {
    let classification = LoanClassification::parse(&model.classification)
        .ok_or_else(|| corrupt("classification", &model.classification))?;

    let max_term = match (model.max_term_value, model.max_term_unit) {
        (Some(value), Some(unit)) => Some(LoanTerm::new(
            from_db_int("max_term_value", value)?,
            TermUnit::parse(&unit).ok_or_else(|| corrupt("max_term_unit", &unit))?,
        )),
        (None, None) => None,
        (value, unit) => {
            return Err(corrupt(
                "max_term_value",
                format!("{value:?}/{unit:?}"),
            ));
        }
    };

    Ok(LoanType {
        id: LoanTypeId::from_uuid(model.id),
        name: model.name,
        description: model.description,
        classification,
        min_amount: model.min_amount,
        max_amount: model.max_amount,
        max_term,
        approvers,
        attributes,
        created_at: model.created_at.to_utc(),
        updated_at: model.updated_at.to_utc(),
    })
}

fn attribute_to_domain(row: fee_attributes::Model) -> Result<FeeAttribute, LoanError> {
    let charge_type =
        ChargeType::parse(&row.charge_type).ok_or_else(|| corrupt("charge_type", &row.charge_type))?;
    let one_time_timing = row
        .one_time_timing
        .map(|t| OneTimeTiming::parse(&t).ok_or_else(|| corrupt("one_time_timing", &t)))
        .transpose()?;
    let one_time_period_value = row
        .one_time_period_value
        .map(|v| from_db_int("one_time_period_value", v))
        .transpose()?;
    let one_time_period_unit = row
        .one_time_period_unit
        .map(|u| PeriodUnit::parse(&u).ok_or_else(|| corrupt("one_time_period_unit", &u)))
        .transpose()?;

    Ok(FeeAttribute {
        name: row.name,
        value: row.value,
        is_percentage: row.is_percentage,
        charge_type,
        one_time_timing,
        one_time_period_value,
        one_time_period_unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn model() -> loan_types::Model {
        let now = Utc::now().into();
        loan_types::Model {
            id: Uuid::now_v7(),
            name: "Biashara".to_string(),
            description: None,
            classification: "CASH".to_string(),
            min_amount: Some(dec!(100)),
            max_amount: None,
            max_term_value: Some(12),
            max_term_unit: Some("MONTHS".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_to_domain_parses_term() {
        let loan_type = to_domain(model(), Vec::new(), Vec::new()).unwrap();
        assert_eq!(loan_type.classification, LoanClassification::Cash);
        assert_eq!(loan_type.max_term, Some(LoanTerm::new(12, TermUnit::Months)));
    }

    #[test]
    fn test_half_set_term_is_corrupt() {
        let model = loan_types::Model {
            max_term_unit: None,
            ..model()
        };
        assert!(matches!(
            to_domain(model, Vec::new(), Vec::new()),
            Err(LoanError::Repository(_))
        ));
    }

    #[test]
    fn test_unknown_classification_is_corrupt() {
        let model = loan_types::Model {
            classification: "BARTER".to_string(),
            ..model()
        };
        assert!(to_domain(model, Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn test_attribute_row_to_domain() {
        let row = fee_attributes::Model {
            id: Uuid::now_v7(),
            loan_type_id: Uuid::now_v7(),
            position: 1,
            name: "Insurance".to_string(),
            value: dec!(250),
            is_percentage: false,
            charge_type: "ONE_TIME".to_string(),
            one_time_timing: Some("AFTER_PERIOD".to_string()),
            one_time_period_value: Some(3),
            one_time_period_unit: Some("MONTHS".to_string()),
        };
        let attribute = attribute_to_domain(row).unwrap();
        assert_eq!(attribute.one_time_timing, Some(OneTimeTiming::AfterPeriod));
        assert_eq!(attribute.one_time_period_value, Some(3));
        assert!(attribute.validate().is_ok());
    }
}
