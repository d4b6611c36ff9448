//! The two structural mapping passes between a decoded volume and the
//! document tree.

mod to_document;
mod to_volume;

pub use to_document::to_document;
pub use to_volume::to_volume;
