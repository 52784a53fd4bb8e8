use mockall::mock;

use super::{
    CustomerReader, CustomerWriter, DocumentReader, HistoryReader, NotificationReader,
    NotificationWriter, OrderReader, OrderWriter, UserReader, UserWriter, WorkflowResult,
    WorkflowStore,
};
use crate::domain::{
    customer::{Customer, NewCustomer},
    delivery_note::DeliveryNote,
    history::{HistoryActor, HistoryEntry},
    notification::{NewNotification, Notification, NotificationListQuery, Recipient},
    order::{NewOrder, Order, OrderListQuery},
    payment::Payment,
    purchase_order::PurchaseOrder,
    quotation::Quotation,
    transition::{TransitionOutcome, TransitionRequest},
    user::{NewUser, UpdateUser, User},
};
use pushkind_common::repository::errors::RepositoryResult;

mock! {
    pub OrderReader {}

    impl OrderReader for OrderReader {
        fn find_order(&self, id: i32) -> RepositoryResult<Option<Order>>;
        fn get_order_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Order>>;
        fn get_order_by_token(&self, token: &str) -> RepositoryResult<Option<Order>>;
        fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
    }
}

mock! {
    pub OrderWriter {}

    impl OrderWriter for OrderWriter {
        fn create_order(&self, new_order: &NewOrder, actor: &HistoryActor) -> RepositoryResult<Order>;
    }
}

mock! {
    pub WorkflowStore {}

    impl WorkflowStore for WorkflowStore {
        fn transition_order(&self, request: &TransitionRequest) -> WorkflowResult<TransitionOutcome>;
    }
}

mock! {
    pub DocumentReader {}

    impl DocumentReader for DocumentReader {
        fn get_quotation(&self, id: i32) -> RepositoryResult<Option<Quotation>>;
        fn list_quotations(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<Quotation>>;
        fn get_purchase_order(&self, id: i32) -> RepositoryResult<Option<PurchaseOrder>>;
        fn list_purchase_orders(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<PurchaseOrder>>;
        fn list_delivery_notes(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<DeliveryNote>>;
        fn list_payments(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<Payment>>;
    }
}

mock! {
    pub HistoryReader {}

    impl HistoryReader for HistoryReader {
        fn list_history(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<HistoryEntry>>;
    }
}

mock! {
    pub NotificationReader {}

    impl NotificationReader for NotificationReader {
        fn list_notifications(&self, query: NotificationListQuery) -> RepositoryResult<(usize, Vec<Notification>)>;
        fn count_unread(&self, hub_id: i32, recipient: Recipient) -> RepositoryResult<usize>;
    }
}

mock! {
    pub NotificationWriter {}

    impl NotificationWriter for NotificationWriter {
        fn create_notifications(&self, notifications: &[NewNotification]) -> RepositoryResult<usize>;
        fn mark_notification_read(&self, notification_id: i32, hub_id: i32, recipient: Recipient) -> RepositoryResult<()>;
        fn mark_all_notifications_read(&self, hub_id: i32, recipient: Recipient) -> RepositoryResult<usize>;
    }
}

mock! {
    pub CustomerReader {}

    impl CustomerReader for CustomerReader {
        fn get_customer_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Customer>>;
        fn get_customer_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<Customer>>;
    }
}

mock! {
    pub CustomerWriter {}

    impl CustomerWriter for CustomerWriter {
        fn create_customer(&self, new_customer: &NewCustomer) -> RepositoryResult<Customer>;
    }
}

mock! {
    pub UserReader {}

    impl UserReader for UserReader {
        fn get_user_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<User>>;
        fn list_admins(&self, hub_id: i32) -> RepositoryResult<Vec<User>>;
    }
}

mock! {
    pub UserWriter {}

    impl UserWriter for UserWriter {
        fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
        fn update_user(&self, user_id: i32, hub_id: i32, updates: &UpdateUser) -> RepositoryResult<User>;
    }
}

/// Repository double that routes every trait to its own mock.
#[derive(Default)]
pub struct FakeRepo {
    pub orders: MockOrderReader,
    pub order_writer: MockOrderWriter,
    pub workflow: MockWorkflowStore,
    pub documents: MockDocumentReader,
    pub history: MockHistoryReader,
    pub notification_reader: MockNotificationReader,
    pub notification_writer: MockNotificationWriter,
    pub customers: MockCustomerReader,
    pub customer_writer: MockCustomerWriter,
    pub users: MockUserReader,
    pub user_writer: MockUserWriter,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderReader for FakeRepo {
    fn find_order(&self, id: i32) -> RepositoryResult<Option<Order>> {
        self.orders.find_order(id)
    }

    fn get_order_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Order>> {
        self.orders.get_order_by_id(id, hub_id)
    }

    fn get_order_by_token(&self, token: &str) -> RepositoryResult<Option<Order>> {
        self.orders.get_order_by_token(token)
    }

    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)> {
        self.orders.list_orders(query)
    }
}

impl OrderWriter for FakeRepo {
    fn create_order(&self, new_order: &NewOrder, actor: &HistoryActor) -> RepositoryResult<Order> {
        self.order_writer.create_order(new_order, actor)
    }
}

impl WorkflowStore for FakeRepo {
    fn transition_order(&self, request: &TransitionRequest) -> WorkflowResult<TransitionOutcome> {
        self.workflow.transition_order(request)
    }
}

impl DocumentReader for FakeRepo {
    fn get_quotation(&self, id: i32) -> RepositoryResult<Option<Quotation>> {
        self.documents.get_quotation(id)
    }

    fn list_quotations(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<Quotation>> {
        self.documents.list_quotations(order_id, hub_id)
    }

    fn get_purchase_order(&self, id: i32) -> RepositoryResult<Option<PurchaseOrder>> {
        self.documents.get_purchase_order(id)
    }

    fn list_purchase_orders(
        &self,
        order_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Vec<PurchaseOrder>> {
        self.documents.list_purchase_orders(order_id, hub_id)
    }

    fn list_delivery_notes(
        &self,
        order_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Vec<DeliveryNote>> {
        self.documents.list_delivery_notes(order_id, hub_id)
    }

    fn list_payments(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<Payment>> {
        self.documents.list_payments(order_id, hub_id)
    }
}

impl HistoryReader for FakeRepo {
    fn list_history(&self, order_id: i32, hub_id: i32) -> RepositoryResult<Vec<HistoryEntry>> {
        self.history.list_history(order_id, hub_id)
    }
}

impl NotificationReader for FakeRepo {
    fn list_notifications(
        &self,
        query: NotificationListQuery,
    ) -> RepositoryResult<(usize, Vec<Notification>)> {
        self.notification_reader.list_notifications(query)
    }

    fn count_unread(&self, hub_id: i32, recipient: Recipient) -> RepositoryResult<usize> {
        self.notification_reader.count_unread(hub_id, recipient)
    }
}

impl NotificationWriter for FakeRepo {
    fn create_notifications(&self, notifications: &[NewNotification]) -> RepositoryResult<usize> {
        self.notification_writer.create_notifications(notifications)
    }

    fn mark_notification_read(
        &self,
        notification_id: i32,
        hub_id: i32,
        recipient: Recipient,
    ) -> RepositoryResult<()> {
        self.notification_writer
            .mark_notification_read(notification_id, hub_id, recipient)
    }

    fn mark_all_notifications_read(
        &self,
        hub_id: i32,
        recipient: Recipient,
    ) -> RepositoryResult<usize> {
        self.notification_writer
            .mark_all_notifications_read(hub_id, recipient)
    }
}

impl CustomerReader for FakeRepo {
    fn get_customer_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<Customer>> {
        self.customers.get_customer_by_id(id, hub_id)
    }

    fn get_customer_by_email(
        &self,
        email: &str,
        hub_id: i32,
    ) -> RepositoryResult<Option<Customer>> {
        self.customers.get_customer_by_email(email, hub_id)
    }
}

impl CustomerWriter for FakeRepo {
    fn create_customer(&self, new_customer: &NewCustomer) -> RepositoryResult<Customer> {
        self.customer_writer.create_customer(new_customer)
    }
}

impl UserReader for FakeRepo {
    fn get_user_by_email(&self, email: &str, hub_id: i32) -> RepositoryResult<Option<User>> {
        self.users.get_user_by_email(email, hub_id)
    }

    fn list_admins(&self, hub_id: i32) -> RepositoryResult<Vec<User>> {
        self.users.list_admins(hub_id)
    }
}

impl UserWriter for FakeRepo {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User> {
        self.user_writer.create_user(new_user)
    }

    fn update_user(&self, user_id: i32, hub_id: i32, updates: &UpdateUser) -> RepositoryResult<User> {
        self.user_writer.update_user(user_id, hub_id, updates)
    }
}
