use std::collections::HashMap;

use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};
use serde_json::json;

use crate::{
    domain::{
        history::{HistoryAction, HistoryActor, NewHistoryEntry},
        order::{
            NewOrder as DomainNewOrder, Order as DomainOrder, OrderListQuery, OrderStage,
            OrderStatus, generate_public_token,
        },
    },
    models::{
        history::NewHistoryEntry as DbNewHistoryEntry,
        order::{
            NewOrder as DbNewOrder, NewOrderItem as DbNewOrderItem, Order as DbOrder,
            OrderItem as DbOrderItem,
        },
    },
    repository::{DieselRepository, OrderReader, OrderWriter},
};

/// Attach the item rows of `order` and convert it into the domain type.
pub(crate) fn load_order(
    conn: &mut SqliteConnection,
    order: DbOrder,
) -> RepositoryResult<DomainOrder> {
    use crate::schema::order_items;

    let items = order_items::table
        .filter(order_items::order_id.eq(order.id))
        .order(order_items::id.asc())
        .load::<DbOrderItem>(conn)?;

    Ok(DomainOrder::from((order, items)))
}

fn unique_public_token(conn: &mut SqliteConnection) -> RepositoryResult<String> {
    use crate::schema::orders;

    loop {
        let candidate = generate_public_token();
        let taken = diesel::select(exists(
            orders::table.filter(orders::public_token.eq(&candidate)),
        ))
        .get_result::<bool>(conn)?;
        if !taken {
            return Ok(candidate);
        }
    }
}

impl OrderReader for DieselRepository {
    fn find_order(&self, id: i32) -> RepositoryResult<Option<DomainOrder>> {
        use crate::schema::orders;

        let mut conn = self.conn()?;
        let order = orders::table
            .filter(orders::id.eq(id))
            .first::<DbOrder>(&mut conn)
            .optional()?;

        order.map(|order| load_order(&mut conn, order)).transpose()
    }

    fn get_order_by_id(&self, id: i32, hub_id: i32) -> RepositoryResult<Option<DomainOrder>> {
        use crate::schema::orders;

        let mut conn = self.conn()?;
        let order = orders::table
            .filter(orders::id.eq(id))
            .filter(orders::hub_id.eq(hub_id))
            .first::<DbOrder>(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        Ok(Some(load_order(&mut conn, order)?))
    }

    fn get_order_by_token(&self, token: &str) -> RepositoryResult<Option<DomainOrder>> {
        use crate::schema::orders;

        let mut conn = self.conn()?;
        let order = orders::table
            .filter(orders::public_token.eq(token))
            .first::<DbOrder>(&mut conn)
            .optional()?;

        order.map(|order| load_order(&mut conn, order)).transpose()
    }

    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<DomainOrder>)> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;

        let OrderListQuery {
            hub_id,
            status,
            stage,
            customer_id,
            search,
            pagination,
        } = query;

        let search_pattern = search.as_ref().map(|term| format!("%{}%", term));

        let build = || {
            let mut boxed = orders::table
                .filter(orders::hub_id.eq(hub_id))
                .into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(status) = status {
                boxed = boxed.filter(orders::status.eq(status.as_str()));
            }

            if let Some(stage) = stage {
                boxed = boxed.filter(orders::stage.eq(stage.as_str()));
            }

            if let Some(customer) = customer_id {
                boxed = boxed.filter(orders::customer_id.eq(customer));
            }

            if let Some(ref pattern) = search_pattern {
                boxed = boxed.filter(
                    orders::public_token
                        .like(pattern.clone())
                        .or(orders::notes.like(pattern.clone())),
                );
            }

            boxed
        };

        let total = build().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = build().order((orders::updated_at.desc(), orders::id.desc()));

        if let Some(pagination) = pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let db_orders = items.load::<DbOrder>(&mut conn)?;
        if db_orders.is_empty() {
            return Ok((total, Vec::new()));
        }

        let order_ids: Vec<i32> = db_orders.iter().map(|order| order.id).collect();

        let mut items_by_order: HashMap<i32, Vec<DbOrderItem>> = HashMap::new();
        let rows = order_items::table
            .filter(order_items::order_id.eq_any(&order_ids))
            .order(order_items::id.asc())
            .load::<DbOrderItem>(&mut conn)?;

        for item in rows {
            items_by_order.entry(item.order_id).or_default().push(item);
        }

        let orders = db_orders
            .into_iter()
            .map(|order| {
                let items = items_by_order.remove(&order.id).unwrap_or_default();
                DomainOrder::from((order, items))
            })
            .collect();

        Ok((total, orders))
    }
}

impl OrderWriter for DieselRepository {
    fn create_order(
        &self,
        new_order: &DomainNewOrder,
        actor: &HistoryActor,
    ) -> RepositoryResult<DomainOrder> {
        use crate::schema::{order_history, order_items, orders};

        let mut conn = self.conn()?;

        conn.immediate_transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let token = unique_public_token(conn)?;
            let db_new = DbNewOrder::from_domain(new_order, &token);

            let created = diesel::insert_into(orders::table)
                .values(&db_new)
                .get_result::<DbOrder>(conn)?;

            let order_id = created.id;

            if !new_order.items.is_empty() {
                let payload: Vec<DbNewOrderItem> = new_order
                    .items
                    .iter()
                    .map(|item| DbNewOrderItem::from_domain(order_id, item))
                    .collect();

                diesel::insert_into(order_items::table)
                    .values(&payload)
                    .execute(conn)?;
            }

            let entry = NewHistoryEntry {
                order_id,
                hub_id: created.hub_id,
                actor: actor.clone(),
                action: HistoryAction::OrderCreated,
                payload: json!({
                    "previousStatus": null,
                    "newStatus": OrderStatus::Pending,
                    "previousStage": null,
                    "newStage": OrderStage::Received,
                    "itemCount": new_order.items.len(),
                    "attachmentCount": new_order.attachments.len(),
                }),
            };

            diesel::insert_into(order_history::table)
                .values(&DbNewHistoryEntry::from(&entry))
                .execute(conn)?;

            load_order(conn, created)
        })
    }
}
