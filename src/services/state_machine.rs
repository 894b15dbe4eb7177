use std::future::Future;

use crate::models::order::OrderStatus;

use super::error::DomainError;

/// `transition(order_id, target, metadata?)` from §4.8: loads the current
/// state via the injected `load_fn`, validates the DAG edge, and persists
/// the new state plus an additive metadata merge via `persist_fn`. Injected
/// so tests can drive the machine against an in-memory map instead of a
/// database. Re-applying an already-applied transition is a no-op success.
pub async fn transition<LoadFn, LoadFut, PersistFn, PersistFut>(
    target: OrderStatus,
    metadata_patch: Option<serde_json::Value>,
    load_fn: LoadFn,
    persist_fn: PersistFn,
) -> Result<OrderStatus, DomainError>
where
    LoadFn: FnOnce() -> LoadFut,
    LoadFut: Future<Output = Result<OrderStatus, DomainError>>,
    PersistFn: FnOnce(OrderStatus, Option<serde_json::Value>) -> PersistFut,
    PersistFut: Future<Output = Result<(), DomainError>>,
{
    let current = load_fn().await?;

    if current == target {
        return Ok(current);
    }

    if !current.can_transition_to(target) {
        return Err(DomainError::InvalidTransition {
            from: current.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }

    persist_fn(target, metadata_patch).await?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[tokio::test]
    async fn idempotent_reapplication_is_a_no_op() {
        let state = RefCell::new(OrderStatus::Delivered);
        let persist_calls = RefCell::new(0);

        let result = transition(
            OrderStatus::Delivered,
            None,
            || async { Ok(*state.borrow()) },
            |_, _| {
                *persist_calls.borrow_mut() += 1;
                async { Ok(()) }
            },
        )
        .await;

        assert_eq!(result.unwrap(), OrderStatus::Delivered);
        assert_eq!(*persist_calls.borrow(), 0);
    }

    #[tokio::test]
    async fn illegal_edge_is_rejected_before_persisting() {
        let persist_calls = RefCell::new(0);

        let result = transition(
            OrderStatus::Delivered,
            None,
            || async { Ok(OrderStatus::PaymentReceived) },
            |_, _| {
                *persist_calls.borrow_mut() += 1;
                async { Ok(()) }
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(*persist_calls.borrow(), 0);
    }

    #[tokio::test]
    async fn persistence_failure_propagates_and_is_not_masked() {
        let result: Result<OrderStatus, DomainError> = transition(
            OrderStatus::FulfillmentStarted,
            None,
            || async { Ok(OrderStatus::PaymentReceived) },
            |_, _| async { Err(DomainError::Persistence("write conflict".to_string())) },
        )
        .await;

        assert!(result.is_err());
    }
}
