//! Domain models for the invoice bridge.

mod invoice;
mod order;
mod token;

pub use invoice::{Contact, InvoiceLineItem, InvoiceModel, TrackingCategory};
pub use order::{as_bool, as_f64, as_string, OrderDetail, OrderItem, OrderPayload};
pub use token::TokenSet;
