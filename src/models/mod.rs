pub mod visitor;

pub use visitor::{decode_visitors, encode_visitors, VisitorRecord};
