//! Domain models and wire DTOs

pub mod basket;
pub mod item;
pub mod order;
pub mod user;

pub use basket::*;
pub use item::*;
pub use order::*;
pub use user::*;
