pub mod client;
pub mod error;
pub mod service;
pub mod signing;
pub mod xml;

pub use client::*;
pub use error::*;
pub use service::*;
pub use signing::*;
