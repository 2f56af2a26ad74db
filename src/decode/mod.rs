//! Response decoder module
//!
//! Turns cached response bodies into JSON values. A missing response or an
//! empty body decodes to an empty array; anything else must be valid JSON.

mod decoder;

pub use decoder::{into_items, JsonDecoder};
