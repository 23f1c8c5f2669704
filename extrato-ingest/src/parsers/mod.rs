//! Payload decoders, one per subject kind.

mod fields;
pub mod bill;
pub mod statement;

pub use fields::parse_amount;
