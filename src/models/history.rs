use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::history::{
    ActorKind, HistoryAction, HistoryActor, HistoryEntry as DomainHistoryEntry,
    NewHistoryEntry as DomainNewHistoryEntry,
};
use crate::models::{decode_json, encode_json};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::order_history)]
pub struct HistoryEntry {
    pub id: i32,
    pub order_id: i32,
    pub hub_id: i32,
    pub actor_kind: String,
    pub actor_id: Option<i32>,
    pub actor_name: Option<String>,
    pub action: String,
    pub payload: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::order_history)]
pub struct NewHistoryEntry<'a> {
    pub order_id: i32,
    pub hub_id: i32,
    pub actor_kind: &'a str,
    pub actor_id: Option<i32>,
    pub actor_name: Option<&'a str>,
    pub action: &'a str,
    pub payload: String,
}

impl From<HistoryEntry> for DomainHistoryEntry {
    fn from(value: HistoryEntry) -> Self {
        Self {
            id: value.id,
            order_id: value.order_id,
            hub_id: value.hub_id,
            actor: HistoryActor {
                kind: value.actor_kind.parse().unwrap_or(ActorKind::System),
                id: value.actor_id,
                name: value.actor_name,
            },
            action: value
                .action
                .parse()
                .unwrap_or(HistoryAction::StatusChanged),
            payload: decode_json(&value.payload, "order_history.payload"),
            created_at: value.created_at,
        }
    }
}

impl<'a> From<&'a DomainNewHistoryEntry> for NewHistoryEntry<'a> {
    fn from(value: &'a DomainNewHistoryEntry) -> Self {
        Self {
            order_id: value.order_id,
            hub_id: value.hub_id,
            actor_kind: value.actor.kind.as_str(),
            actor_id: value.actor.id,
            actor_name: value.actor.name.as_deref(),
            action: value.action.as_str(),
            payload: encode_json(&value.payload),
        }
    }
}
