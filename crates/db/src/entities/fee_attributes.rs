//! `SeaORM` Entity for fee_attributes table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "fee_attributes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub loan_type_id: Uuid,
    pub position: i32,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub value: Decimal,
    pub is_percentage: bool,
    pub charge_type: String,
    pub one_time_timing: Option<String>,
    pub one_time_period_value: Option<i32>,
    pub one_time_period_unit: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loan_types::Entity",
        from = "Column::LoanTypeId",
        to = "super::loan_types::Column::Id",
        on_delete = "Cascade"
    )]
    LoanTypes,
}

impl Related<super::loan_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
