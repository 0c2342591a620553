pub mod assignment;
pub mod error;
pub mod extract;
pub mod health;
pub mod intake;
pub mod patient;

pub use assignment::*;
pub use error::ApiError;
pub use extract::{ApiJson, ApiPath};
pub use health::*;
pub use intake::*;
pub use patient::*;
