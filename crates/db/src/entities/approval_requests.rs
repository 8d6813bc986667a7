//! `SeaORM` Entity for approval_requests table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub loan_id: Uuid,
    pub title: String,
    pub description: String,
    pub requested_by: Uuid,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loans::Entity",
        from = "Column::LoanId",
        to = "super::loans::Column::Id",
        on_delete = "Cascade"
    )]
    Loans,
    #[sea_orm(has_many = "super::approval_steps::Entity")]
    ApprovalSteps,
}

impl Related<super::loans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl Related<super::approval_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalSteps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
