use diesel::RunQueryDsl;
use pushkind_common::db::{DbConnection, DbPool};
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};
use thiserror::Error;

use crate::domain::customer::{Customer, NewCustomer};
use crate::domain::delivery_note::DeliveryNote;
use crate::domain::history::{HistoryActor, HistoryEntry};
use crate::domain::notification::{
    NewNotification, Notification, NotificationListQuery, Recipient,
};
use crate::domain::order::{NewOrder, Order, OrderListQuery};
use crate::domain::payment::Payment;
use crate::domain::purchase_order::PurchaseOrder;
use crate::domain::quotation::Quotation;
use crate::domain::transition::{TransitionOutcome, TransitionRequest};
use crate::domain::user::{NewUser, UpdateUser, User};
use crate::domain::workflow::TransitionError;

pub mod customer;
pub mod document;
pub mod history;
pub mod notification;
pub mod order;
pub mod user;
pub mod workflow;

#[cfg(test)]
pub mod mock;

/// Milliseconds a connection waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        let mut conn = self.pool.get()?;
        diesel::sql_query(format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}"))
            .execute(&mut conn)?;
        Ok(conn)
    }
}

/// Failure of a workflow transition.
#[derive(Debug, Error)]
pub enum WorkflowStoreError {
    #[error("{0}")]
    Repository(RepositoryError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<RepositoryError> for WorkflowStoreError {
    fn from(err: RepositoryError) -> Self {
        WorkflowStoreError::Repository(err)
    }
}

impl From<diesel::result::Error> for WorkflowStoreError {
    fn from(err: diesel::result::Error) -> Self {
        WorkflowStoreError::Repository(RepositoryError::from(err))
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowStoreError>;

/// Read-only operations over orders.
pub trait OrderReader {
    /// Load an order regardless of hub so callers can tell foreign from missing.
    fn find_order(&self, id: i32) -> RepositoryResult<Option<Order>>;
    fn get_order_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Order>>;
    fn get_order_by_token(&self, token: &str) -> RepositoryResult<Option<Order>>;
    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
}

/// Write operations over orders that sit outside the transition table.
pub trait OrderWriter {
    /// Insert the order, its items and the `order_created` history entry atomically.
    fn create_order(&self, new_order: &NewOrder, actor: &HistoryActor)
    -> RepositoryResult<Order>;
}

/// Applies workflow operations to orders.
pub trait WorkflowStore {
    /// Check the operation against the stored state and apply it in one transaction.
    fn transition_order(&self, request: &TransitionRequest) -> WorkflowResult<TransitionOutcome>;
}

/// Read-only access to the documents attached to an order.
pub trait DocumentReader {
    fn get_quotation(&self, id: i32) -> RepositoryResult<Option<Quotation>>;
    fn list_quotations(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<Quotation>>;
    fn get_purchase_order(&self, id: i32) -> RepositoryResult<Option<PurchaseOrder>>;
    fn list_purchase_orders(
        &self,
        order_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Vec<PurchaseOrder>>;
    fn list_delivery_notes(&self, order_id: i32, hub_id: i32)
    -> RepositoryResult<Vec<DeliveryNote>>;
    fn list_payments(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<Payment>>;
}

/// Read-only access to the append-only order history.
pub trait HistoryReader {
    /// Entries of an order in the order they were written.
    fn list_history(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<HistoryEntry>>;
}

pub trait NotificationReader {
    fn list_notifications(
        &self,
        query: NotificationListQuery,
    ) -> RepositoryResult<(usize, Vec<Notification>)>;
    fn count_unread(&self, hub_id: i32, recipient: Recipient) -> RepositoryResult<usize>;
}

pub trait NotificationWriter {
    fn create_notifications(&self, notifications: &[NewNotification]) -> RepositoryResult<usize>;
    fn mark_notification_read(
        &self,
        notification_id: i32,
        hub_id: i32,
        recipient: Recipient,
    ) -> RepositoryResult<()>;
    fn mark_all_notifications_read(
        &self,
        hub_id: i32,
        recipient: Recipient,
    ) -> RepositoryResult<usize>;
}

pub trait CustomerReader {
    fn get_customer_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Customer>>;
    fn get_customer_by_email(&self, email: &str, hub_id: i32)
    -> RepositoryResult<Option<Customer>>;
}

pub trait CustomerWriter {
    fn create_customer(&self, new_customer: &NewCustomer) -> RepositoryResult<Customer>;
}

pub trait UserReader {
    fn get_user_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<User>>;
    /// Staff members of the hub that receive order notifications.
    fn list_admins(&self, hub_id: i32) -> RepositoryResult<Vec<User>>;
}

pub trait UserWriter {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
    fn update_user(&self, user_id: i32, hub_id: i32, updates: &UpdateUser)
    -> RepositoryResult<User>;
}
