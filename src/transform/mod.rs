//! Conversion of a [`GenericNode`](crate::document::GenericNode) into the
//! `ActorFrame` XML layout.
//!
//! The shape is fixed: the document root becomes `ActorFrame`, every mapping
//! key except `children` becomes an attribute, and the `children` sequence is
//! wrapped in a `children` element holding one `Layer` per item.

mod element;
mod transformer;

pub use element::ElementNode;
pub use transformer::{SchemaError, TransformOptions, TreeTransformer};
