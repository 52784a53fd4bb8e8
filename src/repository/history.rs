use diesel::prelude::*;
use pushkind_common::repository::errors::RepositoryResult;

use crate::{
    domain::history::HistoryEntry as DomainHistoryEntry,
    models::history::HistoryEntry as DbHistoryEntry,
    repository::{DieselRepository, HistoryReader},
};

impl HistoryReader for DieselRepository {
    fn list_history(
        &self,
        order_id: i32,
        hub_id: i32,
    ) -> RepositoryResult<Vec<DomainHistoryEntry>> {
        use crate::schema::order_history;

        let mut conn = self.conn()?;
        let entries = order_history::table
            .filter(order_history::order_id.eq(order_id))
            .filter(order_history::hub_id.eq(hub_id))
            .order(order_history::id.asc())
            .load::<DbHistoryEntry>(&mut conn)?;

        Ok(entries.into_iter().map(Into::into).collect())
    }
}
