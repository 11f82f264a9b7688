//! Row types for the local identifier cache.

pub mod address;
pub mod client;
pub mod order;
pub mod user;

pub use address::ShippingAddress;
pub use client::{Client, NewClient};
pub use order::{NewOrder, Order, PatientOrder};
pub use user::User;
