pub mod builder;
pub mod context;
pub mod mapping;
pub mod order_manager;
pub mod token;
pub mod xero;

pub use context::{derive_context, DerivedContext};
pub use order_manager::OrderManagerClient;
pub use token::XeroSession;
pub use xero::XeroClient;
