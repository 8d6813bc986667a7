//! `SeaORM` Entity for loan_type_approvers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loan_type_approvers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub loan_type_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub position: i32,
    pub approver_id: Uuid,
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
