use diesel::prelude::*;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::notification::{
        NewNotification as DomainNewNotification, Notification as DomainNotification,
        NotificationListQuery, Recipient,
    },
    models::notification::{NewNotification as DbNewNotification, Notification as DbNotification},
    repository::{DieselRepository, NotificationReader, NotificationWriter},
};

type BoxedNotifications<'a> =
    crate::schema::notifications::BoxedQuery<'a, diesel::sqlite::Sqlite>;

/// Notifications of one hub addressed to `recipient`.
fn addressed_to<'a>(hub_id: i32, recipient: Recipient) -> BoxedNotifications<'a> {
    use crate::schema::notifications;

    let query = notifications::table
        .filter(notifications::hub_id.eq(hub_id))
        .into_boxed::<diesel::sqlite::Sqlite>();

    match recipient {
        Recipient::Staff(user_id) => query.filter(notifications::user_id.eq(user_id)),
        Recipient::Client(customer_id) => {
            query.filter(notifications::customer_id.eq(customer_id))
        }
    }
}

impl NotificationReader for DieselRepository {
    fn list_notifications(
        &self,
        query: NotificationListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainNotification>)> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;

        let mut count_query = addressed_to(query.hub_id, query.recipient);
        if query.unread_only {
            count_query = count_query.filter(notifications::is_read.eq(false));
        }
        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = addressed_to(query.hub_id, query.recipient);
        if query.unread_only {
            items = items.filter(notifications::is_read.eq(false));
        }
        items = items.order(notifications::id.desc());

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let rows = items.load::<DbNotification>(&mut conn)?;

        Ok((total, rows.into_iter().map(Into::into).collect()))
    }

    fn count_unread(&self, hub_id: i32, recipient: Recipient) -> RepositoryResult<usize> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;
        let total = addressed_to(hub_id, recipient)
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(total as usize)
    }
}

impl NotificationWriter for DieselRepository {
    fn create_notifications(
        &self,
        notifications: &[DomainNewNotification],
    ) -> RepositoryResult<usize> {
        use crate::schema::notifications as table;

        if notifications.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let rows: Vec<DbNewNotification> = notifications.iter().map(Into::into).collect();

        let inserted = diesel::insert_into(table::table)
            .values(&rows)
            .execute(&mut conn)?;

        Ok(inserted)
    }

    fn mark_notification_read(
        &self,
        notification_id: i32,
        hub_id: i32,
        recipient: Recipient,
    ) -> RepositoryResult<()> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;

        let target = notifications::table
            .filter(notifications::id.eq(notification_id))
            .filter(notifications::hub_id.eq(hub_id));

        let affected = match recipient {
            Recipient::Staff(user_id) => diesel::update(
                target.filter(notifications::user_id.eq(user_id)),
            )
            .set(notifications::is_read.eq(true))
            .execute(&mut conn)?,
            Recipient::Client(customer_id) => diesel::update(
                target.filter(notifications::customer_id.eq(customer_id)),
            )
            .set(notifications::is_read.eq(true))
            .execute(&mut conn)?,
        };

        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    fn mark_all_notifications_read(
        &self,
        hub_id: i32,
        recipient: Recipient,
    ) -> RepositoryResult<usize> {
        use crate::schema::notifications;

        let mut conn = self.conn()?;

        let target = notifications::table
            .filter(notifications::hub_id.eq(hub_id))
            .filter(notifications::is_read.eq(false));

        let affected = match recipient {
            Recipient::Staff(user_id) => {
                diesel::update(target.filter(notifications::user_id.eq(user_id)))
                    .set(notifications::is_read.eq(true))
                    .execute(&mut conn)?
            }
            Recipient::Client(customer_id) => {
                diesel::update(target.filter(notifications::customer_id.eq(customer_id)))
                    .set(notifications::is_read.eq(true))
                    .execute(&mut conn)?
            }
        };

        Ok(affected)
    }
}
