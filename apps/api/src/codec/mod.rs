//! Visibility codec: normalization, encode/decode between the canonical
//! editing model and the clean/extended documents, and schema validation.

pub mod decode;
pub mod encode;
pub mod extensions;
pub mod import;
pub mod normalize;
pub mod preserver;
pub mod schema;
pub mod sub_item;
