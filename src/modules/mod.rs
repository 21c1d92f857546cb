pub mod auth;
pub mod cart;
pub mod catalog;
pub mod notification;
pub mod order;
pub mod payment;
pub mod user;

mod router;
pub use router::get_router;
