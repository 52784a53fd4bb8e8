pub mod customer;
pub mod delivery_note;
pub mod history;
pub mod notification;
pub mod order;
pub mod payment;
pub mod purchase_order;
pub mod quotation;
pub mod transition;
pub mod user;
pub mod workflow;
