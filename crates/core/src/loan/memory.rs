//! In-memory collaborators for exercising the loan services in tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use kopa_shared::types::{
    AccountId, ClientId, LoanId, LoanTypeId, PageRequest, PageResponse, PostingId, UserId,
};

use crate::approval::types::{ApprovalStatus, StepStatus};
use crate::loan::error::{LedgerError, LoanError};
use crate::loan::ports::{
    AccountDirectory, ClientDirectory, LedgerGateway, LoanRepository, LoanTransaction,
    LoanTypeCatalog,
};
use crate::loan::types::{AccountCategory, BalancedPosting, ClientRef, Loan, LoanFilter, LoanType};

type LoanMap = Arc<Mutex<HashMap<LoanId, Loan>>>;

#[derive(Default)]
pub(crate) struct MemoryLoans {
    loans: LoanMap,
    pub fail_commit: AtomicBool,
}

impl MemoryLoans {
    pub fn stored(&self, id: LoanId) -> Option<Loan> {
        self.loans.lock().unwrap().get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.loans.lock().unwrap().len()
    }

    fn all(&self) -> Vec<Loan> {
        let mut loans: Vec<Loan> = self.loans.lock().unwrap().values().cloned().collect();
        loans.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        loans
    }
}

enum Staged {
    Put(Loan),
    Delete(LoanId),
}

pub(crate) struct MemoryTx {
    loans: LoanMap,
    staged: Vec<Staged>,
    fail_commit: bool,
    commits: Arc<AtomicUsize>,
}

impl LoanTransaction for MemoryTx {
    async fn load_for_update(&mut self, id: LoanId) -> Result<Option<Loan>, LoanError> {
        Ok(self.loans.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&mut self, loan: &Loan) -> Result<(), LoanError> {
        self.staged.push(Staged::Put(loan.clone()));
        Ok(())
    }

    async fn update(&mut self, loan: &Loan) -> Result<(), LoanError> {
        self.staged.push(Staged::Put(loan.clone()));
        Ok(())
    }

    async fn delete(&mut self, id: LoanId) -> Result<(), LoanError> {
        self.staged.push(Staged::Delete(id));
        Ok(())
    }

    async fn commit(self) -> Result<(), LoanError> {
        if self.fail_commit {
            return Err(LoanError::Repository("commit failed".to_string()));
        }
        let mut loans = self.loans.lock().unwrap();
        for op in self.staged {
            match op {
                Staged::Put(loan) => {
                    loans.insert(loan.id, loan);
                }
                Staged::Delete(id) => {
                    loans.remove(&id);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct MemoryLoanRepo {
    pub inner: Arc<MemoryLoans>,
    commits: Arc<AtomicUsize>,
}

impl MemoryLoanRepo {
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

impl LoanRepository for MemoryLoanRepo {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, LoanError> {
        Ok(MemoryTx {
            loans: Arc::clone(&self.inner.loans),
            staged: Vec::new(),
            fail_commit: self.inner.fail_commit.load(Ordering::SeqCst),
            commits: Arc::clone(&self.commits),
        })
    }

    async fn find_by_id(&self, id: LoanId) -> Result<Option<Loan>, LoanError> {
        Ok(self.inner.stored(id))
    }

    async fn list(
        &self,
        filter: LoanFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Loan>, LoanError> {
        let matching: Vec<Loan> = self
            .inner
            .all()
            .into_iter()
            .filter(|loan| filter.status.is_none_or(|status| loan.status() == status))
            .collect();
        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap())
            .take(usize::try_from(page.limit()).unwrap())
            .collect();
        Ok(PageResponse::new(data, page, total))
    }

    async fn find_with_pending_step_for(&self, approver: UserId) -> Result<Vec<Loan>, LoanError> {
        Ok(self
            .inner
            .all()
            .into_iter()
            .filter(|loan| {
                loan.status() == ApprovalStatus::Pending
                    && loan
                        .approval
                        .steps
                        .iter()
                        .any(|s| s.approver == approver && s.status == StepStatus::Pending)
            })
            .collect())
    }

    async fn find_by_status(&self, status: ApprovalStatus) -> Result<Vec<Loan>, LoanError> {
        Ok(self
            .inner
            .all()
            .into_iter()
            .filter(|loan| loan.status() == status)
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct MemoryCatalog {
    types: Mutex<HashMap<LoanTypeId, LoanType>>,
    pub referenced: Mutex<HashSet<LoanTypeId>>,
}

impl MemoryCatalog {
    pub fn with(loan_type: LoanType) -> Self {
        let catalog = Self::default();
        catalog
            .types
            .lock()
            .unwrap()
            .insert(loan_type.id, loan_type);
        catalog
    }

    pub fn put(&self, loan_type: LoanType) {
        self.types.lock().unwrap().insert(loan_type.id, loan_type);
    }
}

impl LoanTypeCatalog for MemoryCatalog {
    async fn find_loan_type(&self, id: LoanTypeId) -> Result<Option<LoanType>, LoanError> {
        Ok(self.types.lock().unwrap().get(&id).cloned())
    }

    async fn list_loan_types(
        &self,
        page: PageRequest,
    ) -> Result<PageResponse<LoanType>, LoanError> {
        let mut all: Vec<LoanType> = self.types.lock().unwrap().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        let total = all.len() as u64;
        let data = all
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap())
            .take(usize::try_from(page.limit()).unwrap())
            .collect();
        Ok(PageResponse::new(data, page, total))
    }

    async fn insert_loan_type(&self, loan_type: &LoanType) -> Result<(), LoanError> {
        self.put(loan_type.clone());
        Ok(())
    }

    async fn update_loan_type(&self, loan_type: &LoanType) -> Result<(), LoanError> {
        self.put(loan_type.clone());
        Ok(())
    }

    async fn delete_loan_type(&self, id: LoanTypeId) -> Result<bool, LoanError> {
        Ok(self.types.lock().unwrap().remove(&id).is_some())
    }

    async fn is_referenced(&self, id: LoanTypeId) -> Result<bool, LoanError> {
        Ok(self.referenced.lock().unwrap().contains(&id))
    }
}

#[derive(Default)]
pub(crate) struct MemoryClients {
    clients: HashMap<ClientId, ClientRef>,
}

impl MemoryClients {
    pub fn with(client: ClientRef) -> Self {
        let mut clients = HashMap::new();
        clients.insert(client.id, client);
        Self { clients }
    }
}

impl ClientDirectory for MemoryClients {
    async fn find_client(&self, id: ClientId) -> Result<Option<ClientRef>, LoanError> {
        Ok(self.clients.get(&id).cloned())
    }
}

#[derive(Default)]
pub(crate) struct FakeLedger {
    pub postings: Mutex<Vec<(PostingId, BalancedPosting)>>,
    pub reversals: Mutex<Vec<PostingId>>,
    pub accounts: Mutex<HashMap<(String, AccountCategory), AccountId>>,
    pub fail_post: AtomicBool,
    pub lose_reply: AtomicBool,
    pub fail_reverse: AtomicBool,
}

impl FakeLedger {
    pub fn posting_count(&self) -> usize {
        self.postings.lock().unwrap().len()
    }
}

impl LedgerGateway for FakeLedger {
    async fn post_balanced_entry(&self, posting: &BalancedPosting) -> Result<PostingId, LedgerError> {
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }
        let id = {
            let mut postings = self.postings.lock().unwrap();
            let reversals = self.reversals.lock().unwrap();
            let live = postings
                .iter()
                .find(|(id, p)| p.reference == posting.reference && !reversals.contains(id));
            match live {
                Some((id, _)) => *id,
                None => {
                    let id = PostingId::new();
                    postings.push((id, posting.clone()));
                    id
                }
            }
        };
        if self.lose_reply.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("operation timed out".to_string()));
        }
        Ok(id)
    }

    async fn reverse_posting(&self, posting_id: PostingId, _reason: &str) -> Result<(), LedgerError> {
        if self.fail_reverse.load(Ordering::SeqCst) {
            return Err(LedgerError::Rejected {
                status: 409,
                message: "period closed".to_string(),
            });
        }
        self.reversals.lock().unwrap().push(posting_id);
        Ok(())
    }
}

impl AccountDirectory for FakeLedger {
    async fn get_or_create_account(
        &self,
        owner_name: &str,
        category: AccountCategory,
    ) -> Result<AccountId, LedgerError> {
        Ok(*self
            .accounts
            .lock()
            .unwrap()
            .entry((owner_name.to_string(), category))
            .or_default())
    }
}
