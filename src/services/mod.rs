//! Workflow engine operations.
//!
//! Every operation authorizes the caller once, hands the change to the
//! [`WorkflowStore`](crate::repository::WorkflowStore) as a single atomic
//! unit, and only then fans out notifications, live events and emails.

use pushkind_common::repository::errors::RepositoryError;
use thiserror::Error;

use crate::domain::order::Order;
use crate::domain::transition::{TransitionCommand, TransitionOutcome, TransitionRequest};
use crate::domain::workflow::TransitionError;
use crate::files::FileStoreError;
use crate::repository::{WorkflowStore, WorkflowStoreError};
use crate::services::access::Authorized;

pub mod access;
pub mod delivery;
pub mod notifications;
pub mod orders;
pub mod purchase_orders;
pub mod quotations;

#[cfg(test)]
pub(crate) mod test_support;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthorized,
    #[error("not allowed to act on this order")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Form(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<FileStoreError> for ServiceError {
    fn from(err: FileStoreError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Repository(other),
        }
    }
}

impl From<WorkflowStoreError> for ServiceError {
    fn from(err: WorkflowStoreError) -> Self {
        match err {
            WorkflowStoreError::Repository(err) => ServiceError::from(err),
            WorkflowStoreError::Transition(err) => ServiceError::Transition(err),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Hand `command` to the store on behalf of an authorized actor.
pub(crate) fn apply_transition<R>(
    repo: &R,
    order: &Order,
    authorized: &Authorized<'_>,
    command: TransitionCommand,
    note: Option<String>,
) -> ServiceResult<TransitionOutcome>
where
    R: WorkflowStore + ?Sized,
{
    let request =
        TransitionRequest::new(order, authorized.history_actor(), command).with_note(note);

    let outcome = repo.transition_order(&request).map_err(|err| {
        log::warn!(
            "Order {} rejected {}: {err}",
            order.id,
            request.command.operation().name()
        );
        ServiceError::from(err)
    })?;

    log::info!(
        "Order {} {}: {}/{} -> {}/{}",
        outcome.order.id,
        outcome.history.action,
        outcome.previous.status,
        outcome.previous.stage,
        outcome.order.status,
        outcome.order.stage
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_meaning() {
        assert!(matches!(
            ServiceError::from(WorkflowStoreError::Repository(RepositoryError::NotFound)),
            ServiceError::NotFound
        ));
        assert!(matches!(
            ServiceError::from(WorkflowStoreError::Transition(
                TransitionError::QuotationAlreadyAnswered
            )),
            ServiceError::Transition(TransitionError::QuotationAlreadyAnswered)
        ));
    }
}
