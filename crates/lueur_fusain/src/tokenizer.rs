//! Template tokenizer.
//!
//! A byte-indexed state machine over the template source. The tokenizer never
//! allocates substrings: every callback receives (start, end) byte spans into
//! the original input, except entity callbacks which pass the decoded char.
//! It also never fails; malformed input emits a typed error and the machine
//! resynchronizes, usually back to `Text`.

use lueur_esquisse::{ErrorCode, Position};
use lueur_socle::SmallVec;

use crate::entity;

/// Character codes for fast comparison
pub mod char_codes {
    pub const TAB: u8 = 0x09;
    pub const NEWLINE: u8 = 0x0A;
    pub const FORM_FEED: u8 = 0x0C;
    pub const CARRIAGE_RETURN: u8 = 0x0D;
    pub const SPACE: u8 = 0x20;
    pub const EXCLAMATION_MARK: u8 = 0x21;
    pub const DOUBLE_QUOTE: u8 = 0x22;
    pub const NUMBER: u8 = 0x23;
    pub const AMP: u8 = 0x26;
    pub const SINGLE_QUOTE: u8 = 0x27;
    pub const DASH: u8 = 0x2D;
    pub const DOT: u8 = 0x2E;
    pub const SLASH: u8 = 0x2F;
    pub const ZERO: u8 = 0x30;
    pub const NINE: u8 = 0x39;
    pub const COLON: u8 = 0x3A;
    pub const SEMI: u8 = 0x3B;
    pub const LT: u8 = 0x3C;
    pub const EQ: u8 = 0x3D;
    pub const GT: u8 = 0x3E;
    pub const QUESTION_MARK: u8 = 0x3F;
    pub const AT: u8 = 0x40;
    pub const UPPER_A: u8 = 0x41;
    pub const UPPER_Z: u8 = 0x5A;
    pub const LEFT_SQUARE: u8 = 0x5B;
    pub const RIGHT_SQUARE: u8 = 0x5D;
    pub const GRAVE_ACCENT: u8 = 0x60;
    pub const LOWER_A: u8 = 0x61;
    pub const LOWER_V: u8 = 0x76;
    pub const LOWER_X: u8 = 0x78;
    pub const LOWER_Z: u8 = 0x7A;
}

use char_codes::*;

/// All the states the tokenizer can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    Text = 1,

    // Interpolation
    InterpolationOpen,
    Interpolation,
    InterpolationClose,

    // Tags
    BeforeTagName,
    InTagName,
    InSelfClosingTag,
    BeforeClosingTagName,
    InClosingTagName,
    AfterClosingTagName,

    // Attributes
    BeforeAttrName,
    InAttrName,
    InDirName,
    InDirArg,
    InDirDynamicArg,
    InDirModifier,
    AfterAttrName,
    BeforeAttrValue,
    InAttrValueDq,
    InAttrValueSq,
    InAttrValueNq,

    // Declarations
    BeforeDeclaration,
    InDeclaration,

    // Processing instructions
    InProcessingInstruction,

    // Comments & CDATA
    BeforeComment,
    CDATASequence,
    InCommentLike,

    // Special tags (RAWTEXT / RCDATA content)
    InRCDATA,

    InEntity,
}

/// Quote type for attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum QuoteType {
    NoValue = 0,
    Unquoted = 1,
    Single = 2,
    Double = 3,
}

/// Content model for a just-opened tag, decided by the parser which knows the
/// parse mode and nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialKind {
    /// Regular content: tags, entities and interpolation all parse
    #[default]
    None,
    /// No tags, no entities, no interpolation until the literal end tag
    RawText,
    /// Entities and interpolation parse, nested tags do not
    RcData,
}

/// Numeric sub-mode inside `InEntity`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntityMode {
    Start,
    NumericStart,
    Named,
    Decimal,
    Hex,
}

/// Tokenizer callbacks
pub trait Callbacks {
    fn on_text(&mut self, start: usize, end: usize);
    fn on_text_entity(&mut self, ch: char, start: usize, end: usize);

    fn on_interpolation(&mut self, start: usize, end: usize);

    fn on_open_tag_name(&mut self, start: usize, end: usize);
    fn on_open_tag_end(&mut self, end: usize);
    fn on_self_closing_tag(&mut self, end: usize);
    fn on_close_tag(&mut self, start: usize, end: usize);

    fn on_attrib_data(&mut self, start: usize, end: usize);
    fn on_attrib_entity(&mut self, ch: char, start: usize, end: usize);
    fn on_attrib_end(&mut self, quote: QuoteType, end: usize);
    fn on_attrib_name(&mut self, start: usize, end: usize);
    fn on_attrib_name_end(&mut self, end: usize);

    fn on_dir_name(&mut self, start: usize, end: usize);
    fn on_dir_arg(&mut self, start: usize, end: usize);
    fn on_dir_modifier(&mut self, start: usize, end: usize);

    fn on_comment(&mut self, start: usize, end: usize);
    fn on_cdata(&mut self, start: usize, end: usize);
    fn on_processing_instruction(&mut self, start: usize, end: usize);

    fn on_end(&mut self);
    fn on_error(&mut self, code: ErrorCode, index: usize);

    /// Check if the parser is currently inside a v-pre block. When true, the
    /// tokenizer skips directive parsing, treats all attributes as regular
    /// attributes, and skips interpolation detection.
    fn is_in_v_pre(&self) -> bool {
        false
    }

    /// Content model for the tag that was just opened. The parser decides
    /// based on parse mode (HTML: script/style RAWTEXT, title/textarea
    /// RCDATA; SFC: root-level non-template tags RAWTEXT).
    fn special_kind(&self, _tag: &str) -> SpecialKind {
        SpecialKind::None
    }
}

/// Check if character is a tag start character (a-z, A-Z)
#[inline]
pub fn is_tag_start_char(c: u8) -> bool {
    (LOWER_A..=LOWER_Z).contains(&c) || (UPPER_A..=UPPER_Z).contains(&c)
}

/// Check if character is whitespace
#[inline]
pub fn is_whitespace(c: u8) -> bool {
    c == SPACE || c == NEWLINE || c == TAB || c == FORM_FEED || c == CARRIAGE_RETURN
}

/// Check if character ends a tag section
#[inline]
pub fn is_end_of_tag_section(c: u8) -> bool {
    c == SLASH || c == GT || is_whitespace(c)
}

#[inline]
fn is_ascii_alphanumeric(c: u8) -> bool {
    c.is_ascii_alphanumeric()
}

const COMMENT_END: &[u8] = b"-->";
const CDATA_END: &[u8] = b"]]>";
const CDATA_SEQUENCE: &[u8] = b"CDATA[";

/// Template tokenizer
pub struct Tokenizer<'a, C: Callbacks> {
    /// Input source
    input: &'a [u8],
    /// Current state
    state: State,
    /// State to return to after an entity
    return_state: State,
    /// Buffer start position
    section_start: usize,
    /// Current index
    index: usize,
    /// Start of a pending entity (at the `&`)
    entity_start: usize,
    /// Entity sub-mode
    entity_mode: EntityMode,
    /// Newline positions for line/column calculation
    newlines: std::vec::Vec<usize>,
    /// Callbacks
    callbacks: C,
    /// Delimiter open sequence
    delimiter_open: &'a [u8],
    /// Delimiter close sequence
    delimiter_close: &'a [u8],
    /// Current delimiter index
    delimiter_index: usize,
    /// Content model of the current special tag
    special_kind: SpecialKind,
    /// Sequence being matched: `</tag` in RCDATA, `-->` / `]]>` / `CDATA[`
    sequence: SmallVec<[u8; 16]>,
    /// Current sequence index
    sequence_index: usize,
}

impl<'a, C: Callbacks> Tokenizer<'a, C> {
    /// Create a new tokenizer
    pub fn new(input: &'a str, callbacks: C) -> Self {
        Self::with_delimiters(input, callbacks, b"{{", b"}}")
    }

    /// Create a new tokenizer with custom interpolation delimiters
    pub fn with_delimiters(
        input: &'a str,
        callbacks: C,
        delimiter_open: &'a [u8],
        delimiter_close: &'a [u8],
    ) -> Self {
        Self {
            input: input.as_bytes(),
            state: State::Text,
            return_state: State::Text,
            section_start: 0,
            index: 0,
            entity_start: 0,
            entity_mode: EntityMode::Start,
            newlines: std::vec::Vec::new(),
            callbacks,
            delimiter_open,
            delimiter_close,
            delimiter_index: 0,
            special_kind: SpecialKind::None,
            sequence: SmallVec::new(),
            sequence_index: 0,
        }
    }

    /// Get the position for a given byte offset
    pub fn get_pos(&self, index: usize) -> Position {
        let line = match self.newlines.binary_search(&index) {
            Ok(i) => i + 1,
            Err(i) => i + 1,
        };

        let column = if line == 1 {
            index + 1
        } else {
            index - self.newlines[line - 2]
        };

        Position {
            offset: index as u32,
            line: line as u32,
            column: column as u32,
        }
    }

    /// Consume the callbacks back out of the tokenizer
    pub fn into_callbacks(self) -> C {
        self.callbacks
    }

    /// Tokenize the input
    pub fn tokenize(&mut self) {
        while self.index < self.input.len() {
            let c = self.input[self.index];

            // Track newlines
            if c == NEWLINE {
                self.newlines.push(self.index);
            }

            match self.state {
                State::Text => self.state_text(c),
                State::InterpolationOpen => self.state_interpolation_open(c),
                State::Interpolation => self.state_interpolation(c),
                State::InterpolationClose => self.state_interpolation_close(c),
                State::BeforeTagName => self.state_before_tag_name(c),
                State::InTagName => self.state_in_tag_name(c),
                State::InSelfClosingTag => self.state_in_self_closing_tag(c),
                State::BeforeClosingTagName => self.state_before_closing_tag_name(c),
                State::InClosingTagName => self.state_in_closing_tag_name(c),
                State::AfterClosingTagName => self.state_after_closing_tag_name(c),
                State::BeforeAttrName => self.state_before_attr_name(c),
                State::InAttrName => self.state_in_attr_name(c),
                State::InDirName => self.state_in_dir_name(c),
                State::InDirArg => self.state_in_dir_arg(c),
                State::InDirDynamicArg => self.state_in_dir_dynamic_arg(c),
                State::InDirModifier => self.state_in_dir_modifier(c),
                State::AfterAttrName => self.state_after_attr_name(c),
                State::BeforeAttrValue => self.state_before_attr_value(c),
                State::InAttrValueDq => self.state_in_attr_value_dq(c),
                State::InAttrValueSq => self.state_in_attr_value_sq(c),
                State::InAttrValueNq => self.state_in_attr_value_nq(c),
                State::BeforeDeclaration => self.state_before_declaration(c),
                State::InDeclaration => self.state_in_declaration(c),
                State::InProcessingInstruction => self.state_in_processing_instruction(c),
                State::BeforeComment => self.state_before_comment(c),
                State::CDATASequence => self.state_cdata_sequence(c),
                State::InCommentLike => self.state_in_comment_like(c),
                State::InRCDATA => self.state_in_rcdata(c),
                State::InEntity => self.state_in_entity(c),
            }

            self.index += 1;
        }

        // Handle remaining content
        self.cleanup();
        self.callbacks.on_end();
    }

    fn cleanup(&mut self) {
        // A pending entity at EOF is literal text of its return context
        if self.state == State::InEntity {
            self.state = self.return_state;
        }

        if self.section_start < self.index {
            match self.state {
                State::Text | State::InRCDATA => {
                    self.callbacks.on_text(self.section_start, self.index);
                }
                State::Interpolation | State::InterpolationClose => {
                    self.callbacks
                        .on_error(ErrorCode::MissingInterpolationEnd, self.index);
                    self.callbacks.on_text(self.section_start, self.index);
                }
                State::InDirDynamicArg => {
                    self.callbacks
                        .on_error(ErrorCode::MissingDynamicDirectiveArgumentEnd, self.index);
                }
                State::InTagName
                | State::BeforeClosingTagName
                | State::InClosingTagName
                | State::BeforeAttrName
                | State::InAttrName
                | State::InDirName
                | State::InDirArg
                | State::InDirModifier
                | State::AfterAttrName
                | State::BeforeAttrValue
                | State::InAttrValueDq
                | State::InAttrValueSq
                | State::InAttrValueNq => {
                    self.callbacks.on_error(ErrorCode::EofInTag, self.index);
                }
                State::InCommentLike => {
                    if self.sequence.first() == Some(&RIGHT_SQUARE) {
                        self.callbacks.on_error(ErrorCode::EofInCdata, self.index);
                        self.callbacks.on_cdata(self.section_start, self.index);
                    } else {
                        self.callbacks.on_error(ErrorCode::EofInComment, self.index);
                        self.callbacks.on_comment(self.section_start, self.index);
                    }
                }
                _ => {}
            }
        } else if matches!(
            self.state,
            State::BeforeTagName | State::BeforeDeclaration | State::BeforeComment
        ) {
            self.callbacks
                .on_error(ErrorCode::EofBeforeTagName, self.index);
        }
    }

    /// Record newline positions in [from, to) without visiting the bytes in
    /// the main loop (used when fast-forwarding).
    fn record_newlines(&mut self, from: usize, to: usize) {
        for pos in memchr::memchr_iter(NEWLINE, &self.input[from..to]) {
            self.newlines.push(from + pos);
        }
    }

    // ========== State handlers ==========

    fn state_text(&mut self, c: u8) {
        if c == LT {
            if self.index > self.section_start {
                self.callbacks.on_text(self.section_start, self.index);
            }
            self.state = State::BeforeTagName;
            self.section_start = self.index;
        } else if !self.callbacks.is_in_v_pre() && c == self.delimiter_open[0] {
            self.state = State::InterpolationOpen;
            self.delimiter_index = 0;
            self.state_interpolation_open(c);
        } else if c == AMP {
            self.start_entity(State::Text);
        } else {
            // Fast-forward to the next byte of interest
            let from = self.index + 1;
            if from < self.input.len() {
                match memchr::memchr3(LT, AMP, self.delimiter_open[0], &self.input[from..]) {
                    Some(off) => {
                        self.record_newlines(from, from + off);
                        self.index = from + off - 1;
                    }
                    None => {
                        self.record_newlines(from, self.input.len());
                        self.index = self.input.len() - 1;
                    }
                }
            }
        }
    }

    fn state_interpolation_open(&mut self, c: u8) {
        if c == self.delimiter_open[self.delimiter_index] {
            self.delimiter_index += 1;
            if self.delimiter_index == self.delimiter_open.len() {
                // Emit text before interpolation
                let start = self.index + 1 - self.delimiter_open.len();
                if start > self.section_start {
                    self.callbacks.on_text(self.section_start, start);
                }
                self.section_start = self.index + 1;
                self.state = State::Interpolation;
                self.delimiter_index = 0;
            }
        } else if self.special_kind != SpecialKind::None {
            self.state = State::InRCDATA;
            self.state_in_rcdata(c);
        } else {
            self.state = State::Text;
            self.state_text(c);
        }
    }

    fn state_interpolation(&mut self, c: u8) {
        if c == self.delimiter_close[0] {
            self.state = State::InterpolationClose;
            self.delimiter_index = 0;
            self.state_interpolation_close(c);
        }
    }

    fn state_interpolation_close(&mut self, c: u8) {
        if c == self.delimiter_close[self.delimiter_index] {
            self.delimiter_index += 1;
            if self.delimiter_index == self.delimiter_close.len() {
                self.callbacks.on_interpolation(
                    self.section_start,
                    self.index + 1 - self.delimiter_close.len(),
                );
                self.section_start = self.index + 1;
                self.delimiter_index = 0;
                self.state = if self.special_kind != SpecialKind::None {
                    State::InRCDATA
                } else {
                    State::Text
                };
            }
        } else {
            self.state = State::Interpolation;
            self.state_interpolation(c);
        }
    }

    fn state_before_tag_name(&mut self, c: u8) {
        if c == EXCLAMATION_MARK {
            self.state = State::BeforeDeclaration;
            self.section_start = self.index + 1;
        } else if c == QUESTION_MARK {
            self.callbacks
                .on_error(ErrorCode::UnexpectedQuestionMarkInsteadOfTagName, self.index);
            self.state = State::InProcessingInstruction;
            self.section_start = self.index + 1;
        } else if is_tag_start_char(c) {
            self.section_start = self.index;
            self.state = State::InTagName;
        } else if c == SLASH {
            self.state = State::BeforeClosingTagName;
        } else {
            self.state = State::Text;
            self.state_text(c);
        }
    }

    fn state_in_tag_name(&mut self, c: u8) {
        if is_end_of_tag_section(c) {
            let (start, end) = (self.section_start, self.index);
            // Ask the parser for the content model before emitting, so it can
            // consult the not-yet-updated element stack.
            let tag = std::str::from_utf8(&self.input[start..end]).unwrap_or("");
            self.special_kind = self.callbacks.special_kind(tag);
            if self.special_kind != SpecialKind::None {
                self.sequence.clear();
                self.sequence.push(LT);
                self.sequence.push(SLASH);
                for &b in &self.input[start..end] {
                    self.sequence.push(b.to_ascii_lowercase());
                }
            }
            self.callbacks.on_open_tag_name(start, end);
            self.section_start = self.index;
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        }
    }

    fn state_in_self_closing_tag(&mut self, c: u8) {
        if c == GT {
            // A self-closing special tag has no content to scan
            self.special_kind = SpecialKind::None;
            self.callbacks.on_self_closing_tag(self.index);
            self.state = State::Text;
            self.section_start = self.index + 1;
        } else if !is_whitespace(c) {
            self.callbacks
                .on_error(ErrorCode::UnexpectedSolidusInTag, self.index);
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        }
    }

    fn state_before_closing_tag_name(&mut self, c: u8) {
        if is_whitespace(c) {
            // Skip
        } else if c == GT {
            self.callbacks
                .on_error(ErrorCode::MissingEndTagName, self.index);
            self.state = State::Text;
            self.section_start = self.index + 1;
        } else {
            self.state = State::InClosingTagName;
            self.section_start = self.index;
        }
    }

    fn state_in_closing_tag_name(&mut self, c: u8) {
        if c == GT || is_whitespace(c) {
            self.callbacks.on_close_tag(self.section_start, self.index);
            self.section_start = self.index + 1;
            self.state = if c == GT {
                State::Text
            } else {
                State::AfterClosingTagName
            };
        }
    }

    fn state_after_closing_tag_name(&mut self, c: u8) {
        if c == GT {
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_before_attr_name(&mut self, c: u8) {
        if c == GT {
            self.callbacks.on_open_tag_end(self.index);
            self.section_start = self.index + 1;
            if self.special_kind != SpecialKind::None {
                self.sequence_index = 0;
                self.state = State::InRCDATA;
            } else {
                self.state = State::Text;
            }
        } else if c == SLASH {
            self.state = State::InSelfClosingTag;
        } else if c == EQ {
            self.callbacks
                .on_error(ErrorCode::UnexpectedEqualsSignBeforeAttributeName, self.index);
            self.state = State::InAttrName;
            self.section_start = self.index;
        } else if !is_whitespace(c) {
            self.handle_attr_start(c);
        }
    }

    fn handle_attr_start(&mut self, c: u8) {
        if self.callbacks.is_in_v_pre() {
            // In v-pre mode every attribute is a regular attribute
            self.state = State::InAttrName;
            self.section_start = self.index;
            return;
        }
        if c == LOWER_V && self.input.get(self.index + 1) == Some(&DASH) {
            self.state = State::InDirName;
            self.section_start = self.index;
        } else if c == DOT || c == COLON || c == AT || c == NUMBER {
            // Shorthand directives (@, :, ., #): emit the prefix immediately
            // and shift into argument state
            self.callbacks.on_dir_name(self.index, self.index + 1);
            self.state = State::InDirArg;
            self.section_start = self.index + 1;
        } else {
            self.state = State::InAttrName;
            self.section_start = self.index;
        }
    }

    fn state_in_attr_name(&mut self, c: u8) {
        if c == EQ || is_end_of_tag_section(c) {
            self.callbacks.on_attrib_name(self.section_start, self.index);
            self.callbacks.on_attrib_name_end(self.index);
            self.section_start = self.index;
            self.state = State::AfterAttrName;
            self.state_after_attr_name(c);
        } else if c == DOUBLE_QUOTE || c == SINGLE_QUOTE || c == LT {
            self.callbacks
                .on_error(ErrorCode::UnexpectedCharacterInAttributeName, self.index);
        }
    }

    fn state_in_dir_name(&mut self, c: u8) {
        if c == EQ || is_end_of_tag_section(c) {
            self.callbacks.on_dir_name(self.section_start, self.index);
            self.callbacks.on_attrib_name_end(self.index);
            self.section_start = self.index;
            self.state = State::AfterAttrName;
            self.state_after_attr_name(c);
        } else if c == COLON {
            self.callbacks.on_dir_name(self.section_start, self.index);
            self.state = State::InDirArg;
            self.section_start = self.index + 1;
        } else if c == DOT {
            self.callbacks.on_dir_name(self.section_start, self.index);
            self.state = State::InDirModifier;
            self.section_start = self.index + 1;
        }
    }

    fn state_in_dir_arg(&mut self, c: u8) {
        if c == EQ || is_end_of_tag_section(c) {
            if self.section_start < self.index {
                self.callbacks.on_dir_arg(self.section_start, self.index);
            }
            self.callbacks.on_attrib_name_end(self.index);
            self.section_start = self.index;
            self.state = State::AfterAttrName;
            self.state_after_attr_name(c);
        } else if c == LEFT_SQUARE {
            self.state = State::InDirDynamicArg;
            self.section_start = self.index + 1;
        } else if c == DOT {
            if self.section_start < self.index {
                self.callbacks.on_dir_arg(self.section_start, self.index);
            }
            self.state = State::InDirModifier;
            self.section_start = self.index + 1;
        }
    }

    fn state_in_dir_dynamic_arg(&mut self, c: u8) {
        if c == RIGHT_SQUARE {
            self.callbacks.on_dir_arg(self.section_start, self.index);
            self.state = State::InDirArg;
            self.section_start = self.index + 1;
        } else if c == EQ || is_end_of_tag_section(c) {
            self.callbacks
                .on_error(ErrorCode::MissingDynamicDirectiveArgumentEnd, self.index);
            self.callbacks.on_dir_arg(self.section_start, self.index);
            self.callbacks.on_attrib_name_end(self.index);
            self.section_start = self.index;
            self.state = State::AfterAttrName;
            self.state_after_attr_name(c);
        }
    }

    fn state_in_dir_modifier(&mut self, c: u8) {
        if c == EQ || is_end_of_tag_section(c) {
            self.callbacks
                .on_dir_modifier(self.section_start, self.index);
            self.callbacks.on_attrib_name_end(self.index);
            self.section_start = self.index;
            self.state = State::AfterAttrName;
            self.state_after_attr_name(c);
        } else if c == DOT {
            self.callbacks
                .on_dir_modifier(self.section_start, self.index);
            self.section_start = self.index + 1;
        }
    }

    fn state_after_attr_name(&mut self, c: u8) {
        if c == EQ {
            self.state = State::BeforeAttrValue;
        } else if c == SLASH || c == GT {
            self.callbacks.on_attrib_end(QuoteType::NoValue, self.index);
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        } else if !is_whitespace(c) {
            self.callbacks.on_attrib_end(QuoteType::NoValue, self.index);
            self.handle_attr_start(c);
        }
    }

    fn state_before_attr_value(&mut self, c: u8) {
        if c == DOUBLE_QUOTE {
            self.state = State::InAttrValueDq;
            self.section_start = self.index + 1;
        } else if c == SINGLE_QUOTE {
            self.state = State::InAttrValueSq;
            self.section_start = self.index + 1;
        } else if c == GT {
            self.callbacks
                .on_error(ErrorCode::MissingAttributeValue, self.index);
            self.callbacks.on_attrib_end(QuoteType::NoValue, self.index);
            self.state = State::BeforeAttrName;
            self.state_before_attr_name(c);
        } else if !is_whitespace(c) {
            self.section_start = self.index;
            self.state = State::InAttrValueNq;
            self.state_in_attr_value_nq(c);
        }
    }

    fn state_in_attr_value_dq(&mut self, c: u8) {
        if c == DOUBLE_QUOTE {
            self.emit_attr_value(QuoteType::Double);
        } else if c == AMP {
            self.start_entity(State::InAttrValueDq);
        }
    }

    fn state_in_attr_value_sq(&mut self, c: u8) {
        if c == SINGLE_QUOTE {
            self.emit_attr_value(QuoteType::Single);
        } else if c == AMP {
            self.start_entity(State::InAttrValueSq);
        }
    }

    fn state_in_attr_value_nq(&mut self, c: u8) {
        if is_whitespace(c) || c == GT {
            self.emit_attr_value(QuoteType::Unquoted);
            self.state_before_attr_name(c);
        } else if c == AMP {
            self.start_entity(State::InAttrValueNq);
        } else if c == DOUBLE_QUOTE || c == SINGLE_QUOTE || c == LT || c == EQ || c == GRAVE_ACCENT
        {
            self.callbacks.on_error(
                ErrorCode::UnexpectedCharacterInUnquotedAttributeValue,
                self.index,
            );
        }
    }

    fn emit_attr_value(&mut self, quote: QuoteType) {
        if self.section_start < self.index {
            self.callbacks.on_attrib_data(self.section_start, self.index);
        }
        self.callbacks.on_attrib_end(quote, self.index);
        self.section_start = self.index + 1;
        self.state = State::BeforeAttrName;
    }

    fn state_before_declaration(&mut self, c: u8) {
        if c == DASH {
            self.state = State::BeforeComment;
            self.section_start = self.index + 1;
        } else if c == LEFT_SQUARE {
            self.state = State::CDATASequence;
            self.sequence_index = 0;
        } else {
            self.state = State::InDeclaration;
        }
    }

    fn state_in_declaration(&mut self, c: u8) {
        if c == GT {
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_in_processing_instruction(&mut self, c: u8) {
        if c == GT {
            self.callbacks
                .on_processing_instruction(self.section_start, self.index);
            self.state = State::Text;
            self.section_start = self.index + 1;
        }
    }

    fn state_before_comment(&mut self, c: u8) {
        if c == DASH {
            self.state = State::InCommentLike;
            self.sequence.clear();
            self.sequence.extend_from_slice(COMMENT_END);
            self.sequence_index = 0;
            self.section_start = self.index + 1;
        } else {
            self.callbacks
                .on_error(ErrorCode::IncorrectlyOpenedComment, self.index);
            self.state = State::InDeclaration;
        }
    }

    fn state_cdata_sequence(&mut self, c: u8) {
        if c == CDATA_SEQUENCE[self.sequence_index] {
            self.sequence_index += 1;
            if self.sequence_index == CDATA_SEQUENCE.len() {
                self.callbacks
                    .on_error(ErrorCode::CDataInHtmlContent, self.index);
                self.state = State::InCommentLike;
                self.sequence.clear();
                self.sequence.extend_from_slice(CDATA_END);
                self.sequence_index = 0;
                self.section_start = self.index + 1;
            }
        } else {
            self.sequence_index = 0;
            self.state = State::InDeclaration;
            self.state_in_declaration(c);
        }
    }

    fn state_in_comment_like(&mut self, c: u8) {
        // `<!-->` closes an (illegal) empty comment immediately
        if c == GT && self.index == self.section_start && self.sequence[0] == DASH {
            self.callbacks
                .on_error(ErrorCode::AbruptClosingOfEmptyComment, self.index);
            self.callbacks.on_comment(self.section_start, self.section_start);
            self.state = State::Text;
            self.section_start = self.index + 1;
            return;
        }
        if c == self.sequence[self.sequence_index] {
            self.sequence_index += 1;
            if self.sequence_index == self.sequence.len() {
                let content_end = self.index + 1 - self.sequence.len();
                if self.sequence[0] == RIGHT_SQUARE {
                    self.callbacks.on_cdata(self.section_start, content_end);
                } else {
                    self.callbacks.on_comment(self.section_start, content_end);
                }
                self.sequence_index = 0;
                self.section_start = self.index + 1;
                self.state = State::Text;
            }
        } else {
            self.sequence_index = usize::from(c == self.sequence[0]);
        }
    }

    fn state_in_rcdata(&mut self, c: u8) {
        if self.sequence_index == self.sequence.len() {
            if c == GT || is_whitespace(c) {
                // End tag of the special element found; everything before it
                // is literal content.
                let end_of_text = self.index - self.sequence.len();
                if self.section_start < end_of_text {
                    self.callbacks.on_text(self.section_start, end_of_text);
                }
                // Skip over "</"
                self.section_start = end_of_text + 2;
                self.special_kind = SpecialKind::None;
                self.sequence_index = 0;
                self.state = State::InClosingTagName;
                self.state_in_closing_tag_name(c);
                return;
            }
            self.sequence_index = 0;
        }
        if (c | 0x20) == self.sequence[self.sequence_index] {
            self.sequence_index += 1;
        } else if self.sequence_index == 0 {
            if self.special_kind == SpecialKind::RcData {
                if !self.callbacks.is_in_v_pre() && c == self.delimiter_open[0] {
                    self.state = State::InterpolationOpen;
                    self.delimiter_index = 0;
                    self.state_interpolation_open(c);
                } else if c == AMP {
                    self.start_entity(State::InRCDATA);
                }
            }
        } else {
            self.sequence_index = usize::from(c == LT);
        }
    }

    // ========== Entities ==========

    fn start_entity(&mut self, return_state: State) {
        self.return_state = return_state;
        self.entity_start = self.index;
        self.entity_mode = EntityMode::Start;
        self.state = State::InEntity;
    }

    fn state_in_entity(&mut self, c: u8) {
        match self.entity_mode {
            EntityMode::Start => {
                if c == NUMBER {
                    self.entity_mode = EntityMode::NumericStart;
                } else if is_ascii_alphanumeric(c) {
                    self.entity_mode = EntityMode::Named;
                } else {
                    self.abandon_entity(c);
                }
            }
            EntityMode::NumericStart => {
                if c == LOWER_X || c == LOWER_X - 0x20 {
                    self.entity_mode = EntityMode::Hex;
                } else if c.is_ascii_digit() {
                    self.entity_mode = EntityMode::Decimal;
                } else {
                    self.abandon_entity(c);
                }
            }
            EntityMode::Named => {
                if c == SEMI {
                    let name = self.entity_slice(0, 0);
                    let decoded = entity::decode_named(&name, true);
                    self.finish_entity(decoded, self.index + 1);
                } else if !is_ascii_alphanumeric(c) {
                    let name = self.entity_slice(0, 0);
                    let mut decoded = entity::decode_named(&name, false);
                    // Attribute context: a legacy reference followed by `=`
                    // stays literal per the HTML spec.
                    if self.in_attr_entity() && c == EQ {
                        decoded = None;
                    }
                    self.finish_entity(decoded, self.index);
                    self.reprocess(c);
                }
            }
            EntityMode::Decimal | EntityMode::Hex => {
                let hex = self.entity_mode == EntityMode::Hex;
                let valid = if hex {
                    c.is_ascii_hexdigit()
                } else {
                    c.is_ascii_digit()
                };
                if valid {
                    // Keep consuming digits
                } else {
                    let skip = if hex { 2 } else { 1 }; // "&#x" / "&#"
                    let digits = self.entity_slice(skip, 0);
                    let decoded = if digits.is_empty() {
                        None
                    } else {
                        entity::decode_numeric(&digits, hex)
                    };
                    if c == SEMI {
                        self.finish_entity(decoded, self.index + 1);
                    } else {
                        self.finish_entity(decoded, self.index);
                        self.reprocess(c);
                    }
                }
            }
        }
    }

    /// Entity body between `&` (+skip extra prefix bytes) and the current index
    fn entity_slice(&self, skip: usize, trim_end: usize) -> std::string::String {
        let start = self.entity_start + 1 + skip;
        let end = self.index - trim_end;
        if start >= end {
            return std::string::String::new();
        }
        std::str::from_utf8(&self.input[start..end])
            .unwrap_or("")
            .to_owned()
    }

    fn in_attr_entity(&self) -> bool {
        matches!(
            self.return_state,
            State::InAttrValueDq | State::InAttrValueSq | State::InAttrValueNq
        )
    }

    /// Leave entity state without decoding; the raw text stays in the running
    /// section.
    fn abandon_entity(&mut self, c: u8) {
        self.state = self.return_state;
        self.reprocess(c);
    }

    fn finish_entity(&mut self, decoded: Option<char>, end: usize) {
        if let Some(ch) = decoded {
            let in_attr = self.in_attr_entity();
            if self.section_start < self.entity_start {
                if in_attr {
                    self.callbacks.on_attrib_data(self.section_start, self.entity_start);
                } else {
                    self.callbacks.on_text(self.section_start, self.entity_start);
                }
            }
            if in_attr {
                self.callbacks.on_attrib_entity(ch, self.entity_start, end);
            } else {
                self.callbacks.on_text_entity(ch, self.entity_start, end);
            }
            self.section_start = end;
        }
        self.state = self.return_state;
    }

    /// Re-dispatch the current character in the (restored) current state.
    fn reprocess(&mut self, c: u8) {
        match self.state {
            State::Text => self.state_text(c),
            State::InRCDATA => self.state_in_rcdata(c),
            State::InAttrValueDq => self.state_in_attr_value_dq(c),
            State::InAttrValueSq => self.state_in_attr_value_sq(c),
            State::InAttrValueNq => self.state_in_attr_value_nq(c),
            _ => {}
        }
    }
}
