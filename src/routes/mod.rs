pub mod api;
pub mod main;
pub mod tracking;
