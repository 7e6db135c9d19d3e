pub mod order;
pub mod quote;

pub use order::{Order, OrderId, OrderStatus, OrderType, RoutingStrategy};
pub use quote::{Preferences, Quote, QuoteTuple, ValidationReport};
