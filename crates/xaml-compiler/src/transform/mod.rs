//! AST Transformation Passes
//!
//! Each pass rewrites one node at a time; the engine in
//! [`crate::compiler::XamlCompiler`] drives the passes bottom-up over the whole
//! tree, in order, running the simplifiers to a fixed point after each one.

mod context;
mod directives;
mod flatten;
pub mod helpers;
mod intrinsics;
mod new_object;
mod property_reference;
mod property_value;
pub mod resolve;
mod struct_convert;
mod top_down;
mod type_reference;

pub use context::{TransformContext, TransformFailure};
pub use directives::KnownDirectivesTransformer;
pub use flatten::FlattenTransformer;
pub use intrinsics::IntrinsicsTransformer;
pub use new_object::NewObjectTransformer;
pub use property_reference::PropertyReferenceResolver;
pub use property_value::PropertyValueTransformer;
pub use struct_convert::StructConvertTransformer;
pub use top_down::TopDownInitializationTransformer;
pub use type_reference::TypeReferenceResolver;

use crate::ast::XamlNode;

/// A single rewrite rule applied to every node of the tree
pub trait AstTransformer {
    /// Pass name for logging
    fn name(&self) -> &'static str;

    /// Rewrite `node`, whose children have already been rewritten
    fn transform(&self, ctx: &mut TransformContext, node: XamlNode) -> Result<XamlNode, TransformFailure>;
}

/// Primary passes in their required order
pub fn default_transformers() -> Vec<Box<dyn AstTransformer>> {
    vec![
        Box::new(KnownDirectivesTransformer),
        Box::new(TypeReferenceResolver),
        Box::new(IntrinsicsTransformer),
        Box::new(PropertyReferenceResolver),
        Box::new(StructConvertTransformer),
        Box::new(NewObjectTransformer),
        Box::new(PropertyValueTransformer),
        Box::new(TopDownInitializationTransformer),
    ]
}

/// Simplification passes
pub fn default_simplifiers() -> Vec<Box<dyn AstTransformer>> {
    vec![Box::new(FlattenTransformer)]
}
