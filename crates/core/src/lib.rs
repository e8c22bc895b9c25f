pub mod config;
pub mod error;
pub mod path;
pub mod value;

pub use config::Config;
pub use error::*;
pub use path::{resolve, FieldPath};
pub use value::Value;
