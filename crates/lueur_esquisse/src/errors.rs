//! Compile-time error model.
//!
//! The compiler never throws: every malformed input produces a typed error
//! value and parsing continues from the nearest resynchronization point, so a
//! single pass collects every diagnostic in the source.

use thiserror::Error;

use crate::ast::SourceLocation;

/// Compile error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    // Tokenizer-level
    AbruptClosingOfEmptyComment,
    CDataInHtmlContent,
    EofBeforeTagName,
    EofInCdata,
    EofInComment,
    EofInTag,
    IncorrectlyClosedComment,
    IncorrectlyOpenedComment,
    InvalidFirstCharacterOfTagName,
    MissingAttributeValue,
    MissingEndTagName,
    MissingWhitespaceBetweenAttributes,
    NestedComment,
    UnexpectedCharacterInAttributeName,
    UnexpectedCharacterInUnquotedAttributeValue,
    UnexpectedEqualsSignBeforeAttributeName,
    UnexpectedQuestionMarkInsteadOfTagName,
    UnexpectedSolidusInTag,
    MissingInterpolationEnd,
    MissingDynamicDirectiveArgumentEnd,

    // Parser-level
    InvalidEndTag,
    MissingEndTag,
    DuplicateAttribute,
    MissingDirectiveName,
    InvalidExpression,
    IgnoredSideEffectTag,

    // Transform-level
    VIfNoExpression,
    VIfSameKey,
    VElseNoAdjacentIf,
    VForNoExpression,
    VForMalformedExpression,
    VBindNoExpression,
    VOnNoExpression,
    VSlotMisplaced,
    VSlotUnexpectedDirectiveOnSlotOutlet,
    VSlotDuplicateSlotNames,
    VModelNoExpression,
    VModelOnInvalidElement,
}

impl ErrorCode {
    pub fn message(&self) -> &'static str {
        match self {
            Self::AbruptClosingOfEmptyComment => "Illegal comment.",
            Self::CDataInHtmlContent => {
                "CDATA section is allowed only in XML context."
            }
            Self::EofBeforeTagName => "Unexpected EOF in tag.",
            Self::EofInCdata => "Unexpected EOF in CDATA section.",
            Self::EofInComment => "Unexpected EOF in comment.",
            Self::EofInTag => "Unexpected EOF in tag.",
            Self::IncorrectlyClosedComment => "Incorrectly closed comment.",
            Self::IncorrectlyOpenedComment => "Incorrectly opened comment.",
            Self::InvalidFirstCharacterOfTagName => "Illegal tag name.",
            Self::MissingAttributeValue => "Attribute value was expected.",
            Self::MissingEndTagName => "End tag name was expected.",
            Self::MissingWhitespaceBetweenAttributes => {
                "Whitespace was expected between attributes."
            }
            Self::NestedComment => "Unexpected \"<!--\" in comment.",
            Self::UnexpectedCharacterInAttributeName => {
                "Attribute name cannot contain U+0022, U+0027 or U+003C."
            }
            Self::UnexpectedCharacterInUnquotedAttributeValue => {
                "Unquoted attribute value cannot contain U+0022, U+0027, U+003C, U+003D or U+0060."
            }
            Self::UnexpectedEqualsSignBeforeAttributeName => {
                "Attribute name cannot start with \"=\"."
            }
            Self::UnexpectedQuestionMarkInsteadOfTagName => "Illegal \"<?\" in tag name.",
            Self::UnexpectedSolidusInTag => "Illegal \"/\" in tag.",
            Self::MissingInterpolationEnd => "Interpolation end sign was not found.",
            Self::MissingDynamicDirectiveArgumentEnd => {
                "End bracket for dynamic directive argument was not found."
            }
            Self::InvalidEndTag => "Invalid end tag.",
            Self::MissingEndTag => "Element is missing end tag.",
            Self::DuplicateAttribute => "Duplicate attribute.",
            Self::MissingDirectiveName => "Legal directive name was expected.",
            Self::InvalidExpression => "Error parsing expression.",
            Self::IgnoredSideEffectTag => {
                "Tags with side effect (<script> and <style>) are ignored in client templates."
            }
            Self::VIfNoExpression => "v-if/v-else-if is missing expression.",
            Self::VIfSameKey => "v-if/else branches must use unique keys.",
            Self::VElseNoAdjacentIf => "v-else/v-else-if has no adjacent v-if or v-else-if.",
            Self::VForNoExpression => "v-for is missing expression.",
            Self::VForMalformedExpression => "v-for has invalid expression.",
            Self::VBindNoExpression => "v-bind is missing expression.",
            Self::VOnNoExpression => "v-on is missing expression.",
            Self::VSlotMisplaced => "v-slot can only be used on components or <template> tags.",
            Self::VSlotUnexpectedDirectiveOnSlotOutlet => {
                "Unexpected custom directive on <slot> outlet."
            }
            Self::VSlotDuplicateSlotNames => "Duplicate slot names found.",
            Self::VModelNoExpression => "v-model is missing expression.",
            Self::VModelOnInvalidElement => "v-model can only be used on supported elements.",
        }
    }
}

/// A compile error with an optional source location.
#[derive(Debug, Clone, Error)]
#[error("{}", .code.message())]
pub struct CompilerError {
    pub code: ErrorCode,
    pub loc: Option<SourceLocation>,
}

impl CompilerError {
    pub fn new(code: ErrorCode, loc: Option<SourceLocation>) -> Self {
        Self { code, loc }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_uses_code_message() {
        let err = CompilerError::new(ErrorCode::MissingEndTag, None);
        assert_eq!(err.to_string(), "Element is missing end tag.");
    }
}
