//! Loan repository for database operations.
//!
//! A loan aggregate spans the loan row, its materialized fees, its approval
//! request and the request's steps. Reads hydrate all four; writes go through
//! [`PgLoanTransaction`] so the aggregate is replaced atomically.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait, sea_query::JoinType,
};
use uuid::Uuid;

use kopa_core::approval::{ApprovalRequest, ApprovalStatus, ApprovalStep, StepStatus};
use kopa_core::fees::{ChargeType, Fee};
use kopa_core::loan::{
    Disbursement, Loan, LoanError, LoanFilter, LoanRepository as LoanRepoTrait, LoanTerm,
    LoanTransaction, RepaymentFrequency, TermUnit,
};
use kopa_shared::types::{
    AccountId, ApprovalRequestId, ApprovalStepId, ClientId, FeeId, LoanId, LoanTypeId,
    PageRequest, PageResponse, PostingId, UserId,
};

use super::{corrupt, db_err, from_db_int, position, to_db_int};
use crate::entities::{approval_requests, approval_steps, loan_fees, loans};

/// Loan repository implementation.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    db: DatabaseConnection,
}

impl LoanRepository {
    /// Create a new loan repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// A database transaction over loan aggregates.
///
/// Rows loaded with `load_for_update` are locked with `SELECT ... FOR UPDATE`
/// until the transaction commits or is dropped.
pub struct PgLoanTransaction {
    txn: DatabaseTransaction,
}

impl LoanTransaction for PgLoanTransaction {
    async fn load_for_update(&mut self, id: LoanId) -> Result<Option<Loan>, LoanError> {
        let model = loans::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(db_err)?;

        match model {
            Some(model) => Ok(hydrate(&self.txn, vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn insert(&mut self, loan: &Loan) -> Result<(), LoanError> {
        to_active_model(loan)?
            .insert(&self.txn)
            .await
            .map_err(db_err)?;
        insert_children(&self.txn, loan).await
    }

    async fn update(&mut self, loan: &Loan) -> Result<(), LoanError> {
        let loan_id = loan.id.into_inner();

        to_active_model(loan)?
            .update(&self.txn)
            .await
            .map_err(db_err)?;

        // Steps cascade with their request.
        loan_fees::Entity::delete_many()
            .filter(loan_fees::Column::LoanId.eq(loan_id))
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        approval_requests::Entity::delete_many()
            .filter(approval_requests::Column::LoanId.eq(loan_id))
            .exec(&self.txn)
            .await
            .map_err(db_err)?;

        insert_children(&self.txn, loan).await
    }

    async fn delete(&mut self, id: LoanId) -> Result<(), LoanError> {
        loans::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), LoanError> {
        self.txn.commit().await.map_err(db_err)
    }
}

impl LoanRepoTrait for LoanRepository {
    type Tx = PgLoanTransaction;

    async fn begin(&self) -> Result<PgLoanTransaction, LoanError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        Ok(PgLoanTransaction { txn })
    }

    async fn find_by_id(&self, id: LoanId) -> Result<Option<Loan>, LoanError> {
        let model = loans::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;

        match model {
            Some(model) => Ok(hydrate(&self.db, vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        filter: LoanFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Loan>, LoanError> {
        let mut query = loans::Entity::find();
        if let Some(status) = filter.status {
            query = query
                .join(JoinType::InnerJoin, loans::Relation::ApprovalRequests.def())
                .filter(approval_requests::Column::Status.eq(status.as_str()));
        }

        let paginator = query
            .order_by_desc(loans::Column::CreatedAt)
            .order_by_desc(loans::Column::Id)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await.map_err(db_err)?;
        let models = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await
            .map_err(db_err)?;

        let data = hydrate(&self.db, models).await?;
        Ok(PageResponse::new(data, page, total))
    }

    async fn find_with_pending_step_for(&self, approver: UserId) -> Result<Vec<Loan>, LoanError> {
        let request_ids: Vec<Uuid> = approval_steps::Entity::find()
            .filter(approval_steps::Column::ApproverId.eq(approver.into_inner()))
            .filter(approval_steps::Column::Status.eq(StepStatus::Pending.as_str()))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|step| step.request_id)
            .collect();
        if request_ids.is_empty() {
            return Ok(Vec::new());
        }

        let loan_ids: Vec<Uuid> = approval_requests::Entity::find()
            .filter(approval_requests::Column::Id.is_in(request_ids))
            .filter(approval_requests::Column::Status.eq(ApprovalStatus::Pending.as_str()))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|request| request.loan_id)
            .collect();
        if loan_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = loans::Entity::find()
            .filter(loans::Column::Id.is_in(loan_ids))
            .order_by_asc(loans::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        hydrate(&self.db, models).await
    }

    async fn find_by_status(&self, status: ApprovalStatus) -> Result<Vec<Loan>, LoanError> {
        let models = loans::Entity::find()
            .join(JoinType::InnerJoin, loans::Relation::ApprovalRequests.def())
            .filter(approval_requests::Column::Status.eq(status.as_str()))
            .order_by_asc(loans::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        hydrate(&self.db, models).await
    }
}

fn to_active_model(loan: &Loan) -> Result<loans::ActiveModel, LoanError> {
    let disbursement = loan.disbursement.as_ref();

    Ok(loans::ActiveModel {
        id: Set(loan.id.into_inner()),
        loan_type_id: Set(loan.loan_type_id.into_inner()),
        client_id: Set(loan.client_id.into_inner()),
        principal: Set(loan.principal),
        interest_rate: Set(loan.interest_rate),
        term_value: Set(to_db_int("term_value", loan.term.value)?),
        term_unit: Set(loan.term.unit.as_str().to_string()),
        repayment_frequency: Set(loan.repayment_frequency.map(|f| f.as_str().to_string())),
        purpose: Set(loan.purpose.clone()),
        creation_date: Set(loan.creation_date),
        start_date: Set(loan.start_date),
        end_date: Set(loan.end_date),
        repayment_account_id: Set(loan.repayment_account.map(AccountId::into_inner)),
        selected_product_id: Set(loan.selected_product_id),
        total_payable: Set(loan.total_payable),
        posting_id: Set(disbursement.map(|d| d.posting_id.into_inner())),
        paying_account_id: Set(disbursement.map(|d| d.paying_account.into_inner())),
        receivable_account_id: Set(disbursement.map(|d| d.receivable_account.into_inner())),
        disbursed_amount: Set(disbursement.map(|d| d.amount)),
        disbursed_at: Set(disbursement.map(|d| d.disbursed_at.into())),
        created_at: Set(loan.created_at.into()),
        updated_at: Set(loan.updated_at.into()),
    })
}

async fn insert_children<C: ConnectionTrait>(conn: &C, loan: &Loan) -> Result<(), LoanError> {
    let loan_id = loan.id.into_inner();

    for (index, fee) in loan.fees.iter().enumerate() {
        loan_fees::ActiveModel {
            id: Set(fee.id.into_inner()),
            loan_id: Set(loan_id),
            position: Set(position(index)?),
            name: Set(fee.name.clone()),
            amount: Set(fee.amount),
            is_percentage: Set(fee.is_percentage),
            original_value: Set(fee.original_value),
            charge_type: Set(fee.charge_type.as_str().to_string()),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
    }

    let request = &loan.approval;
    approval_requests::ActiveModel {
        id: Set(request.id.into_inner()),
        loan_id: Set(loan_id),
        title: Set(request.title.clone()),
        description: Set(request.description.clone()),
        requested_by: Set(request.requested_by.into_inner()),
        status: Set(request.status.as_str().to_string()),
        created_at: Set(request.created_at.into()),
    }
    .insert(conn)
    .await
    .map_err(db_err)?;

    for step in &request.steps {
        approval_steps::ActiveModel {
            id: Set(step.id.into_inner()),
            request_id: Set(request.id.into_inner()),
            approver_id: Set(step.approver.into_inner()),
            step_order: Set(to_db_int("step_order", step.step_order)?),
            status: Set(step.status.as_str().to_string()),
            action_date: Set(step.action_date.map(Into::into)),
            remarks: Set(step.remarks.clone()),
        }
        .insert(conn)
        .await
        .map_err(db_err)?;
    }

    Ok(())
}

/// Load fees, approval requests and steps for a batch of loan rows.
async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    models: Vec<loans::Model>,
) -> Result<Vec<Loan>, LoanError> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();

    let fee_rows = loan_fees::Entity::find()
        .filter(loan_fees::Column::LoanId.is_in(ids.clone()))
        .order_by_asc(loan_fees::Column::Position)
        .all(conn)
        .await
        .map_err(db_err)?;
    let request_rows = approval_requests::Entity::find()
        .filter(approval_requests::Column::LoanId.is_in(ids))
        .all(conn)
        .await
        .map_err(db_err)?;
    let request_ids: Vec<Uuid> = request_rows.iter().map(|r| r.id).collect();
    let step_rows = approval_steps::Entity::find()
        .filter(approval_steps::Column::RequestId.is_in(request_ids))
        .order_by_asc(approval_steps::Column::StepOrder)
        .all(conn)
        .await
        .map_err(db_err)?;

    let mut fees: HashMap<Uuid, Vec<Fee>> = HashMap::new();
    for row in fee_rows {
        let loan_id = row.loan_id;
        fees.entry(loan_id).or_default().push(fee_to_domain(row)?);
    }

    let mut steps: HashMap<Uuid, Vec<ApprovalStep>> = HashMap::new();
    for row in step_rows {
        let request_id = row.request_id;
        steps.entry(request_id).or_default().push(step_to_domain(row)?);
    }

    let mut requests: HashMap<Uuid, ApprovalRequest> = HashMap::new();
    for row in request_rows {
        let loan_id = row.loan_id;
        let request_steps = steps.remove(&row.id).unwrap_or_default();
        requests.insert(loan_id, request_to_domain(row, request_steps)?);
    }

    models
        .into_iter()
        .map(|model| {
            let id = model.id;
            let approval = requests
                .remove(&id)
                .ok_or_else(|| corrupt("approval_requests.loan_id", id))?;
            to_domain(model, fees.remove(&id).unwrap_or_default(), approval)
        })
        .collect()
}

fn to_domain(
    model: loans::Model,
    fees: Vec<Fee>,
    approval: ApprovalRequest,
) -> Result<Loan, LoanError> {
    let term = LoanTerm::new(
        from_db_int("term_value", model.term_value)?,
        TermUnit::parse(&model.term_unit).ok_or_else(|| corrupt("term_unit", &model.term_unit))?,
    );
    let repayment_frequency = model
        .repayment_frequency
        .as_deref()
        .map(|f| RepaymentFrequency::parse(f).ok_or_else(|| corrupt("repayment_frequency", f)))
        .transpose()?;

    let disbursement = match (
        model.posting_id,
        model.paying_account_id,
        model.receivable_account_id,
        model.disbursed_amount,
        model.disbursed_at,
    ) {
        (Some(posting_id), Some(paying), Some(receivable), Some(amount), Some(at)) => {
            Some(Disbursement {
                posting_id: PostingId::from_uuid(posting_id),
                paying_account: AccountId::from_uuid(paying),
                receivable_account: AccountId::from_uuid(receivable),
                amount,
                disbursed_at: at.to_utc(),
            })
        }
        (None, None, None, None, None) => None,
        _ => return Err(corrupt("posting_id", model.id)),
    };

    Ok(Loan {
        id: LoanId::from_uuid(model.id),
        loan_type_id: LoanTypeId::from_uuid(model.loan_type_id),
        client_id: ClientId::from_uuid(model.client_id),
        principal: model.principal,
        interest_rate: model.interest_rate,
        term,
        repayment_frequency,
        purpose: model.purpose,
        creation_date: model.creation_date,
        start_date: model.start_date,
        end_date: model.end_date,
        repayment_account: model.repayment_account_id.map(AccountId::from_uuid),
        selected_product_id: model.selected_product_id,
        total_payable: model.total_payable,
        fees,
        approval,
        disbursement,
        created_at: model.created_at.to_utc(),
        updated_at: model.updated_at.to_utc(),
    })
}

fn fee_to_domain(row: loan_fees::Model) -> Result<Fee, LoanError> {
    let charge_type =
        ChargeType::parse(&row.charge_type).ok_or_else(|| corrupt("charge_type", &row.charge_type))?;

    Ok(Fee {
        id: FeeId::from_uuid(row.id),
        name: row.name,
        amount: row.amount,
        is_percentage: row.is_percentage,
        original_value: row.original_value,
        charge_type,
    })
}

fn request_to_domain(
    row: approval_requests::Model,
    steps: Vec<ApprovalStep>,
) -> Result<ApprovalRequest, LoanError> {
    let status =
        ApprovalStatus::parse(&row.status).ok_or_else(|| corrupt("approval_requests.status", &row.status))?;

    Ok(ApprovalRequest {
        id: ApprovalRequestId::from_uuid(row.id),
        title: row.title,
        description: row.description,
        requested_by: UserId::from_uuid(row.requested_by),
        status,
        steps,
        created_at: row.created_at.to_utc(),
    })
}

fn step_to_domain(row: approval_steps::Model) -> Result<ApprovalStep, LoanError> {
    let status =
        StepStatus::parse(&row.status).ok_or_else(|| corrupt("approval_steps.status", &row.status))?;

    Ok(ApprovalStep {
        id: ApprovalStepId::from_uuid(row.id),
        request_id: ApprovalRequestId::from_uuid(row.request_id),
        approver: UserId::from_uuid(row.approver_id),
        step_order: from_db_int("step_order", row.step_order)?,
        status,
        action_date: row.action_date.map(|at| at.to_utc()),
        remarks: row.remarks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn loan_model() -> loans::Model {
        let now = Utc::now().into();
        loans::Model {
            id: Uuid::now_v7(),
            loan_type_id: Uuid::now_v7(),
            client_id: Uuid::now_v7(),
            principal: dec!(10000),
            interest_rate: Some(dec!(12.5)),
            term_value: 6,
            term_unit: "MONTHS".to_string(),
            repayment_frequency: Some("MONTHLY".to_string()),
            purpose: Some("Stock".to_string()),
            creation_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            start_date: None,
            end_date: None,
            repayment_account_id: None,
            selected_product_id: None,
            total_payable: dec!(10500),
            posting_id: None,
            paying_account_id: None,
            receivable_account_id: None,
            disbursed_amount: None,
            disbursed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn request() -> ApprovalRequest {
        ApprovalRequest {
            id: ApprovalRequestId::new(),
            title: "Loan Application: 27845120".to_string(),
            description: "Approval for loan application for 10000".to_string(),
            requested_by: UserId::new(),
            status: ApprovalStatus::Pending,
            steps: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_undisbursed_row_to_domain() {
        let loan = to_domain(loan_model(), Vec::new(), request()).unwrap();
        assert_eq!(loan.term, LoanTerm::new(6, TermUnit::Months));
        assert_eq!(loan.repayment_frequency, Some(RepaymentFrequency::Monthly));
        assert!(loan.disbursement.is_none());
    }

    #[test]
    fn test_disbursed_row_to_domain() {
        let model = loans::Model {
            posting_id: Some(Uuid::now_v7()),
            paying_account_id: Some(Uuid::now_v7()),
            receivable_account_id: Some(Uuid::now_v7()),
            disbursed_amount: Some(dec!(10000)),
            disbursed_at: Some(Utc::now().into()),
            ..loan_model()
        };
        let loan = to_domain(model, Vec::new(), request()).unwrap();
        assert_eq!(loan.disbursement.unwrap().amount, dec!(10000));
    }

    #[test]
    fn test_partial_disbursement_is_corrupt() {
        let model = loans::Model {
            posting_id: Some(Uuid::now_v7()),
            ..loan_model()
        };
        assert!(matches!(
            to_domain(model, Vec::new(), request()),
            Err(LoanError::Repository(_))
        ));
    }

    #[test]
    fn test_step_row_to_domain() {
        let row = approval_steps::Model {
            id: Uuid::now_v7(),
            request_id: Uuid::now_v7(),
            approver_id: Uuid::now_v7(),
            step_order: 2,
            status: "APPROVED".to_string(),
            action_date: Some(Utc::now().into()),
            remarks: Some("ok".to_string()),
        };
        let step = step_to_domain(row).unwrap();
        assert_eq!(step.step_order, 2);
        assert_eq!(step.status, StepStatus::Approved);
    }

    #[test]
    fn test_unknown_step_status_is_corrupt() {
        let row = approval_steps::Model {
            id: Uuid::now_v7(),
            request_id: Uuid::now_v7(),
            approver_id: Uuid::now_v7(),
            step_order: 1,
            status: "MAYBE".to_string(),
            action_date: None,
            remarks: None,
        };
        assert!(step_to_domain(row).is_err());
    }
}
