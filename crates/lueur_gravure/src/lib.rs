//! Gravure - the lowering stage of the Lueur template compiler.
//!
//! Takes the parsed template AST, applies the transform pipeline (structural
//! directives, element lowering with patch-flag analysis, text merging,
//! static hoisting), and prints the resulting render program.

pub mod codegen;
pub mod transform;
pub mod transforms;

pub use codegen::{generate, CodegenResult};
pub use transform::{transform, TransformContext};
