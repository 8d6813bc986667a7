//! `SeaORM` Entity for loan_types table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loan_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub classification: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub min_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub max_amount: Option<Decimal>,
    pub max_term_value: Option<i32>,
    pub max_term_unit: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::loan_type_approvers::Entity")]
    LoanTypeApprovers,
    #[sea_orm(has_many = "super::fee_attributes::Entity")]
    FeeAttributes,
    #[sea_orm(has_many = "super::loans::Entity")]
    Loans,
}

impl Related<super::loan_type_approvers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanTypeApprovers.def()
    }
}

impl Related<super::fee_attributes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeAttributes.def()
    }
}

impl Related<super::loans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
