pub mod config;
pub mod logging;
pub mod message;
pub mod mime;
pub mod sanitize;
pub mod transformer;
pub mod transformers;

pub use config::*;
pub use logging::*;
pub use message::*;
pub use mime::*;
pub use sanitize::*;
pub use transformer::*;
pub use transformers::*;
