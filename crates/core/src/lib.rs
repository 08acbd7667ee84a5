//! Core storefront logic. Keep this crate free of IO and platform concerns.

pub mod category;
pub mod config;
pub mod deck;
pub mod message;
pub mod notify;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod rng;
pub mod storage;
pub mod store;
pub mod summary;
pub mod validation;

pub use category::*;
pub use config::*;
pub use deck::*;
pub use message::*;
pub use notify::*;
pub use order::*;
pub use payment::*;
pub use pricing::*;
pub use rng::*;
pub use storage::*;
pub use store::*;
pub use summary::*;
pub use validation::*;
