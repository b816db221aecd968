pub mod api;
pub mod event;
pub mod node;
pub mod serialize;
