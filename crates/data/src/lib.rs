//! Asset loading and file-backed persistence for the storefront.

pub mod load;
pub mod orders;
pub mod storage;

pub use load::*;
pub use orders::*;
pub use storage::*;
