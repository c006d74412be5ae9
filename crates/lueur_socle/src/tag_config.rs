//! HTML/SVG tag classification tables.
//!
//! Built as compile-time perfect hash sets so the parser can classify tags
//! without allocation.

use phf::phf_set;

/// Void elements that never have children and need no end tag.
static VOID_TAGS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
};

/// Known native HTML tags.
static HTML_TAGS: phf::Set<&'static str> = phf_set! {
    "html", "body", "base", "head", "link", "meta", "style", "title",
    "address", "article", "aside", "footer", "header", "hgroup", "h1",
    "h2", "h3", "h4", "h5", "h6", "nav", "section", "div", "dd", "dl",
    "dt", "figcaption", "figure", "picture", "hr", "img", "li", "main",
    "ol", "p", "pre", "ul", "a", "b", "abbr", "bdi", "bdo", "br", "cite",
    "code", "data", "dfn", "em", "i", "kbd", "mark", "q", "rp", "rt",
    "ruby", "s", "samp", "small", "span", "strong", "sub", "sup", "time",
    "u", "var", "wbr", "area", "audio", "map", "track", "video", "embed",
    "object", "param", "source", "canvas", "script", "noscript", "del",
    "ins", "caption", "col", "colgroup", "table", "thead", "tbody", "td",
    "th", "tr", "button", "datalist", "fieldset", "form", "input",
    "label", "legend", "meter", "optgroup", "option", "output",
    "progress", "select", "textarea", "details", "dialog", "menu",
    "summary", "template", "blockquote", "iframe", "tfoot", "slot",
};

/// Known native SVG tags.
static SVG_TAGS: phf::Set<&'static str> = phf_set! {
    "svg", "animate", "animateMotion", "animateTransform", "circle",
    "clipPath", "defs", "desc", "ellipse", "feBlend", "feColorMatrix",
    "feComponentTransfer", "feComposite", "feConvolveMatrix",
    "feDiffuseLighting", "feDisplacementMap", "feDistantLight",
    "feDropShadow", "feFlood", "feFuncA", "feFuncB", "feFuncG",
    "feFuncR", "feGaussianBlur", "feImage", "feMerge", "feMergeNode",
    "feMorphology", "feOffset", "fePointLight", "feSpecularLighting",
    "feSpotLight", "feTile", "feTurbulence", "filter", "foreignObject",
    "g", "image", "line", "linearGradient", "marker", "mask", "metadata",
    "mpath", "path", "pattern", "polygon", "polyline", "radialGradient",
    "rect", "set", "stop", "switch", "symbol", "text", "textPath",
    "tspan", "use", "view",
};

/// Tags whose content is RAWTEXT in HTML mode: no tags, no entities, no
/// interpolation until the literal end-tag sequence.
static RAWTEXT_TAGS: phf::Set<&'static str> = phf_set! {
    "style", "script", "iframe", "noscript",
};

/// Tags whose content is RCDATA in HTML mode: entities and interpolation
/// are parsed, nested tags are not.
static RCDATA_TAGS: phf::Set<&'static str> = phf_set! {
    "title", "textarea",
};

/// Built-in component tags resolved by the runtime rather than the host.
static BUILTIN_COMPONENTS: phf::Set<&'static str> = phf_set! {
    "Teleport", "Suspense", "KeepAlive", "BaseTransition", "Transition",
    "TransitionGroup",
};

/// Check if tag is a void element.
#[inline]
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag)
}

/// Check if tag is a known native HTML or SVG tag.
#[inline]
pub fn is_native_tag(tag: &str) -> bool {
    HTML_TAGS.contains(tag) || SVG_TAGS.contains(tag)
}

/// Check if tag is a known SVG tag.
#[inline]
pub fn is_svg_tag(tag: &str) -> bool {
    SVG_TAGS.contains(tag)
}

/// Check if tag content is RAWTEXT in HTML mode.
#[inline]
pub fn is_rawtext_tag(tag: &str) -> bool {
    RAWTEXT_TAGS.contains(tag)
}

/// Check if tag content is RCDATA in HTML mode.
#[inline]
pub fn is_rcdata_tag(tag: &str) -> bool {
    RCDATA_TAGS.contains(tag)
}

/// Check if tag names a built-in component.
#[inline]
pub fn is_builtin_component(tag: &str) -> bool {
    BUILTIN_COMPONENTS.contains(tag)
}

/// Check if tag preserves whitespace (`<pre>`).
#[inline]
pub fn is_pre_tag(tag: &str) -> bool {
    tag == "pre"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_tags() {
        assert!(is_void_tag("br"));
        assert!(is_void_tag("input"));
        assert!(!is_void_tag("div"));
    }

    #[test]
    fn test_native_tags() {
        assert!(is_native_tag("div"));
        assert!(is_native_tag("svg"));
        assert!(is_native_tag("foreignObject"));
        assert!(!is_native_tag("MyComponent"));
    }

    #[test]
    fn test_content_models() {
        assert!(is_rawtext_tag("script"));
        assert!(is_rawtext_tag("style"));
        assert!(is_rcdata_tag("textarea"));
        assert!(is_rcdata_tag("title"));
        assert!(!is_rawtext_tag("div"));
    }

    #[test]
    fn test_builtin_components() {
        assert!(is_builtin_component("KeepAlive"));
        assert!(is_builtin_component("Teleport"));
        assert!(!is_builtin_component("keep-alive"));
    }
}
