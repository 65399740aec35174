pub mod form;
pub mod health;
pub mod reports;

pub use form::*;
pub use health::*;
pub use reports::*;
