//! Compiler options.

use lueur_socle::String;
use serde::{Deserialize, Serialize};

/// Parse mode for the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Platform-agnostic mode: all tags are equal
    #[default]
    Base,
    /// HTML mode: script/style are RAWTEXT, title/textarea are RCDATA
    Html,
    /// Single-file-component mode: root-level non-template tags are RAWTEXT
    Sfc,
}

/// Whitespace handling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespaceStrategy {
    /// Condense whitespace (default)
    #[default]
    Condense,
    /// Preserve all whitespace
    Preserve,
}

/// Parser options
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Parse mode
    pub mode: ParseMode,
    /// Whitespace strategy
    pub whitespace: WhitespaceStrategy,
    /// Interpolation delimiters (default: ["{{", "}}"])
    pub delimiters: (String, String),
    /// Whether a tag preserves whitespace (`<pre>`)
    pub is_pre_tag: fn(&str) -> bool,
    /// Whether a tag is a native platform tag
    pub is_native_tag: Option<fn(&str) -> bool>,
    /// Whether a tag is a custom element handled by the host
    pub is_custom_element: Option<fn(&str) -> bool>,
    /// Whether a tag is a void tag
    pub is_void_tag: fn(&str) -> bool,
    /// Namespace for a tag given its parent's tag
    pub get_namespace: fn(&str, Option<&str>, crate::Namespace) -> crate::Namespace,
    /// Enable comment preservation
    pub comments: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            mode: ParseMode::Base,
            whitespace: WhitespaceStrategy::Condense,
            delimiters: (String::const_new("{{"), String::const_new("}}")),
            is_pre_tag: lueur_socle::is_pre_tag,
            is_native_tag: None,
            is_custom_element: None,
            is_void_tag: lueur_socle::is_void_tag,
            get_namespace: default_namespace,
            comments: true,
        }
    }
}

/// Default namespace resolution: `<svg>` enters SVG, `<math>` enters MathML,
/// and HTML is re-entered inside SVG integration points.
pub fn default_namespace(tag: &str, parent: Option<&str>, parent_ns: crate::Namespace) -> crate::Namespace {
    use crate::Namespace;
    if let Some(parent) = parent {
        if parent_ns == Namespace::Svg
            && matches!(parent, "foreignObject" | "desc" | "title")
        {
            return Namespace::Html;
        }
    }
    match tag {
        "svg" => Namespace::Svg,
        "math" => Namespace::MathMl,
        _ => parent_ns,
    }
}

/// Transform options
#[derive(Debug, Clone)]
pub struct TransformOptions {
    /// Filename for diagnostics
    pub filename: String,
    /// Whether to rewrite identifiers to `_ctx.` access
    pub prefix_identifiers: bool,
    /// Whether to hoist static subtrees
    pub hoist_static: bool,
    /// Whether to cache v-on handlers in `_cache` slots
    pub cache_handlers: bool,
    /// Scope ID for scoped styles
    pub scope_id: Option<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            filename: String::const_new("template.lueur"),
            prefix_identifiers: false,
            hoist_static: false,
            cache_handlers: false,
            scope_id: None,
        }
    }
}

/// Codegen output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodegenMode {
    /// Generate a plain function destructuring helpers from a runtime global
    #[default]
    Function,
    /// Generate an ES module importing helpers
    Module,
}

/// Codegen options
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Output mode
    pub mode: CodegenMode,
    /// Whether identifiers were prefixed during transform
    pub prefix_identifiers: bool,
    /// Filename for diagnostics
    pub filename: String,
    /// Runtime module name for module-mode imports
    pub runtime_module_name: String,
    /// Runtime global name for function-mode destructuring
    pub runtime_global_name: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            mode: CodegenMode::Function,
            prefix_identifiers: false,
            filename: String::const_new("template.lueur"),
            runtime_module_name: String::const_new("lueur"),
            runtime_global_name: String::const_new("Lueur"),
        }
    }
}

/// Combined compiler options
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    pub parser: ParserOptions,
    pub transform: TransformOptions,
    pub codegen: CodegenOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Namespace;

    #[test]
    fn test_default_delimiters() {
        let opts = ParserOptions::default();
        assert_eq!(opts.delimiters.0.as_str(), "{{");
        assert_eq!(opts.delimiters.1.as_str(), "}}");
    }

    #[test]
    fn test_namespace_resolution() {
        assert_eq!(default_namespace("svg", None, Namespace::Html), Namespace::Svg);
        assert_eq!(default_namespace("circle", Some("svg"), Namespace::Svg), Namespace::Svg);
        assert_eq!(
            default_namespace("div", Some("foreignObject"), Namespace::Svg),
            Namespace::Html
        );
        assert_eq!(default_namespace("math", None, Namespace::Html), Namespace::MathMl);
    }
}
