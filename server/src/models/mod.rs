pub mod assignment;
pub mod error;
pub mod intake;
pub mod patient;

pub use assignment::*;
pub use error::*;
pub use intake::*;
pub use patient::*;
