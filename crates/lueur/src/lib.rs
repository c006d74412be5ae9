//! Lueur - a reactive UI framework core.
//!
//! Three engines: a template compiler (tokenizer, parser, transforms, code
//! generation), a dependency-tracking reactivity kernel, and a virtual-DOM
//! reconciler with block fast paths and a KeepAlive cache. This facade crate
//! wires them together and re-exports the public surface.

pub mod eval;

use lueur_esquisse::errors::CompilerError;
use lueur_esquisse::options::CompilerOptions;
use lueur_socle::Bump;

pub use lueur_esquisse as esquisse;
pub use lueur_fusain as fusain;
pub use lueur_gravure as gravure;
pub use lueur_socle as socle;
pub use lueur_toile as toile;
pub use lueur_vif as vif;

/// The result of a one-call compilation.
pub struct CompiledTemplate {
    /// Render function body
    pub code: String,
    /// Helper imports / destructuring plus hoist declarations
    pub preamble: String,
    /// Diagnostics from every stage; compilation always completes
    pub errors: Vec<CompilerError>,
    /// Content hash of the generated code, for host-side cache invalidation
    pub hash: String,
}

/// Compile a template: parse, transform, generate.
pub fn compile(source: &str, options: CompilerOptions) -> CompiledTemplate {
    let allocator = Bump::new();
    let (mut root, parse_errors) =
        lueur_fusain::parse_with_options(&allocator, source, options.parser);

    let transform_errors = lueur_gravure::transform(&mut root, &allocator, options.transform);

    let result = lueur_gravure::generate(&root, options.codegen);

    let mut errors: Vec<CompilerError> = parse_errors.iter().cloned().collect();
    errors.extend(transform_errors);

    let hash = lueur_socle::hash::content_hash(&result.code);
    CompiledTemplate {
        code: result.code,
        preamble: result.preamble,
        errors,
        hash,
    }
}
