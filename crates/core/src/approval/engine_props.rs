//! Property-based tests for ApprovalEngine.

use chrono::Utc;
use proptest::prelude::*;

use kopa_shared::types::UserId;

use crate::approval::engine::ApprovalEngine;
use crate::approval::error::ApprovalError;
use crate::approval::types::{ApprovalDecision, ApprovalStatus, StepStatus};

fn approvers(n: usize) -> Vec<UserId> {
    (0..n).map(|_| UserId::new()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Acting on any step above the head fails with an ordering violation
    /// naming the head, and leaves the request untouched.
    #[test]
    fn prop_only_head_step_is_actionable(
        n in 2usize..8,
        approved in 0usize..7,
        jump in 1usize..7,
    ) {
        let approved = approved % (n - 1);
        let users = approvers(n);
        let mut request = ApprovalEngine::build_request("t", "d", UserId::new(), &users, Utc::now());

        for user in users.iter().take(approved) {
            ApprovalEngine::act(&mut request, *user, ApprovalDecision::Approve, None, Utc::now()).unwrap();
        }

        let head = approved + 1;
        let target = head + 1 + jump % (n - head).max(1);
        prop_assume!(target <= n);

        let before = request.clone();
        let result = ApprovalEngine::act_on_step(
            &mut request,
            u32::try_from(target).unwrap(),
            users[target - 1],
            ApprovalDecision::Approve,
            None,
            Utc::now(),
        );

        prop_assert_eq!(
            result,
            Err(ApprovalError::OutOfOrder {
                step_order: u32::try_from(target).unwrap(),
                blocking_step: u32::try_from(head).unwrap(),
            })
        );
        prop_assert_eq!(request, before);
    }

    /// Approving in order reaches APPROVED exactly after the last step, and a
    /// request is APPROVED only if every step is APPROVED.
    #[test]
    fn prop_approved_iff_all_steps_approved(n in 0usize..8) {
        let users = approvers(n);
        let mut request = ApprovalEngine::build_request("t", "d", UserId::new(), &users, Utc::now());

        for (i, user) in users.iter().enumerate() {
            prop_assert_eq!(request.status, ApprovalStatus::Pending);
            let outcome = ApprovalEngine::act(&mut request, *user, ApprovalDecision::Approve, None, Utc::now()).unwrap();
            let all = request.steps.iter().all(|s| s.status == StepStatus::Approved);
            prop_assert_eq!(outcome.request_status == ApprovalStatus::Approved, all);
            prop_assert_eq!(all, i + 1 == n);
        }

        prop_assert_eq!(request.status, ApprovalStatus::Approved);
    }

    /// A rejection at any step is terminal; later steps stay pending.
    #[test]
    fn prop_rejection_is_terminal(n in 1usize..8, reject_at in 0usize..7) {
        let reject_at = reject_at % n;
        let users = approvers(n);
        let mut request = ApprovalEngine::build_request("t", "d", UserId::new(), &users, Utc::now());

        for user in users.iter().take(reject_at) {
            ApprovalEngine::act(&mut request, *user, ApprovalDecision::Approve, None, Utc::now()).unwrap();
        }
        ApprovalEngine::act(&mut request, users[reject_at], ApprovalDecision::Reject, None, Utc::now()).unwrap();

        prop_assert_eq!(request.status, ApprovalStatus::Rejected);
        prop_assert!(request.steps.iter().skip(reject_at + 1).all(|s| s.status == StepStatus::Pending));
        for user in &users {
            prop_assert!(ApprovalEngine::pending_step_for(&request, *user).is_none());
            let is_closed = matches!(
                ApprovalEngine::act(&mut request, *user, ApprovalDecision::Approve, None, Utc::now()),
                Err(ApprovalError::RequestClosed { .. })
            );
            prop_assert!(is_closed);
        }
        prop_assert!(ApprovalEngine::ensure_disbursable(&request).is_err());
    }
}
