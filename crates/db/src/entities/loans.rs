//! `SeaORM` Entity for loans table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub loan_type_id: Uuid,
    pub client_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub principal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((9, 4)))", nullable)]
    pub interest_rate: Option<Decimal>,
    pub term_value: i32,
    pub term_unit: String,
    pub repayment_frequency: Option<String>,
    pub purpose: Option<String>,
    pub creation_date: Date,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub repayment_account_id: Option<Uuid>,
    pub selected_product_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_payable: Decimal,
    pub posting_id: Option<Uuid>,
    pub paying_account_id: Option<Uuid>,
    pub receivable_account_id: Option<Uuid>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub disbursed_amount: Option<Decimal>,
    pub disbursed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loan_types::Entity",
        from = "Column::LoanTypeId",
        to = "super::loan_types::Column::Id"
    )]
    LoanTypes,
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id"
    )]
    Clients,
    #[sea_orm(has_many = "super::loan_fees::Entity")]
    LoanFees,
    #[sea_orm(has_one = "super::approval_requests::Entity")]
    ApprovalRequests,
}

impl Related<super::loan_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanTypes.def()
    }
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl Related<super::loan_fees::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoanFees.def()
    }
}

impl Related<super::approval_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
