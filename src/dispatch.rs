//! Outbound side effects of order operations: live events and emails.
//!
//! Both ports are best effort. A failing sink is logged and never undoes a
//! committed order change.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::order::{Order, OrderStage, OrderStatus};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch channel unavailable: {0}")]
    Unavailable(String),
    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Event pushed to connected dashboards of a hub.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveEvent {
    pub event: String,
    pub order_id: i32,
    pub status: OrderStatus,
    pub stage: OrderStage,
    pub progress: u8,
    pub data: Value,
}

impl LiveEvent {
    pub fn for_order(event: impl Into<String>, order: &Order, data: Value) -> Self {
        Self {
            event: event.into(),
            order_id: order.id,
            status: order.status,
            stage: order.stage,
            progress: order.progress_percent(),
            data,
        }
    }
}

/// Templated email handed to the mail transport.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: Value,
}

impl EmailMessage {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        template: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            template: template.into(),
            data,
        }
    }
}

/// Publishes live events on named channels.
pub trait EventSink: Send + Sync {
    fn emit(&self, channel: &str, event: &LiveEvent) -> Result<(), DispatchError>;
}

/// Delivers templated emails.
pub trait EmailSender: Send + Sync {
    fn send_email(&self, message: &EmailMessage) -> Result<(), DispatchError>;
}

/// Channel shared by every staff member of a hub.
pub fn company_channel(hub_id: i32) -> String {
    format!("company_{hub_id}")
}

/// Writes events to the application log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, channel: &str, event: &LiveEvent) -> Result<(), DispatchError> {
        let payload =
            serde_json::to_string(event).map_err(|err| DispatchError::Rejected(err.to_string()))?;
        log::info!("live event on {channel}: {payload}");
        Ok(())
    }
}

/// Writes emails to the application log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send_email(&self, message: &EmailMessage) -> Result<(), DispatchError> {
        if message.to.trim().is_empty() {
            return Err(DispatchError::Rejected("empty recipient".to_string()));
        }
        log::info!(
            "email `{}` to {}: {}",
            message.template,
            message.to,
            message.subject
        );
        Ok(())
    }
}

/// Handle to the configured event and email ports.
#[derive(Clone)]
pub struct Dispatcher {
    events: Arc<dyn EventSink>,
    mailer: Arc<dyn EmailSender>,
}

impl Dispatcher {
    pub fn new(events: Arc<dyn EventSink>, mailer: Arc<dyn EmailSender>) -> Self {
        Self { events, mailer }
    }

    /// Dispatcher that only logs.
    pub fn logging() -> Self {
        Self::new(Arc::new(LogEventSink), Arc::new(LogEmailSender))
    }

    /// Emit `event` on `channel`, returning whether the sink accepted it.
    pub fn emit(&self, channel: &str, event: &LiveEvent) -> bool {
        match self.events.emit(channel, event) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to emit `{}` on {channel}: {err}", event.event);
                false
            }
        }
    }

    /// Send `message`, returning whether the transport accepted it.
    pub fn send_email(&self, message: &EmailMessage) -> bool {
        match self.mailer.send_email(message) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to send `{}` to {}: {err}", message.template, message.to);
                false
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::{Broken, recording};
    use super::*;

    fn event() -> LiveEvent {
        LiveEvent {
            event: "order_updated".to_string(),
            order_id: 7,
            status: OrderStatus::Approved,
            stage: OrderStage::InManufacturing,
            progress: OrderStage::InManufacturing.progress_percent(),
            data: json!({}),
        }
    }

    #[test]
    fn company_channel_is_scoped_by_hub() {
        assert_eq!(company_channel(12), "company_12");
    }

    #[test]
    fn live_events_serialize_in_camel_case() {
        let value = serde_json::to_value(event()).expect("serializable");

        assert_eq!(value["orderId"], 7);
        assert_eq!(value["stage"], "in_manufacturing");
        assert_eq!(value["progress"], 57);
    }

    #[test]
    fn failing_ports_are_reported_not_raised() {
        let dispatcher = Dispatcher::new(Arc::new(Broken), Arc::new(Broken));

        assert!(!dispatcher.emit("company_1", &event()));
        assert!(!dispatcher.send_email(&EmailMessage::new("a@b.c", "s", "t", json!({}))));
    }

    #[test]
    fn recording_ports_capture_traffic() {
        let (dispatcher, events, mailer) = recording();

        assert!(dispatcher.emit("company_1", &event()));
        assert!(dispatcher.send_email(&EmailMessage::new("a@b.c", "s", "t", json!({}))));

        assert_eq!(events.events.lock().expect("lock").len(), 1);
        assert_eq!(mailer.messages.lock().expect("lock")[0].to, "a@b.c");
    }

    #[test]
    fn log_mailer_rejects_blank_recipients() {
        let result = LogEmailSender.send_email(&EmailMessage::new(" ", "s", "t", json!({})));
        assert!(matches!(result, Err(DispatchError::Rejected(_))));
    }
}
