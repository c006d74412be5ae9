//! Template parser.
//!
//! Consumes tokenizer events and builds the template AST. The parser keeps an
//! ancestor stack of open elements; close tags search the stack top-down and
//! implicitly close anything in between. It never fails: every recoverable
//! problem is collected as a `CompilerError`.

use lueur_esquisse::ast::*;
use lueur_esquisse::errors::{CompilerError, ErrorCode};
use lueur_esquisse::options::{ParseMode, ParserOptions, WhitespaceStrategy};
use lueur_socle::{Box, Bump, String, Vec};

use crate::tokenizer::{Callbacks, QuoteType, SpecialKind, Tokenizer};

/// Parser context for building the AST
pub struct Parser<'a> {
    /// Arena allocator
    allocator: &'a Bump,
    /// Source code
    source: &'a str,
    /// Parser options
    options: ParserOptions,
    /// Current node stack
    stack: Vec<'a, ParserStackEntry<'a>>,
    /// Root node
    root: Option<RootNode<'a>>,
    /// Current element being parsed
    current_element: Option<CurrentElement<'a>>,
    /// Current attribute being parsed
    current_attr: Option<CurrentAttribute>,
    /// Current directive being parsed
    current_dir: Option<CurrentDirective<'a>>,
    /// Pending text run (raw slices + decoded entities)
    pending_text: Option<PendingText>,
    /// Errors collected during parsing
    errors: Vec<'a, CompilerError>,
    /// Newline positions for calculating line/column
    newlines: Vec<'a, usize>,
    /// Whether in a whitespace-preserving tag
    in_pre: bool,
    /// Whether in a v-pre block
    in_v_pre: bool,
}

/// Stack entry for tracking parent elements
struct ParserStackEntry<'a> {
    element: ElementNode<'a>,
    /// `in_pre` value to restore when this element closes
    prev_in_pre: bool,
    /// `in_v_pre` value to restore when this element closes
    prev_in_v_pre: bool,
}

/// Element staged between open-tag-name and open-tag-end
struct CurrentElement<'a> {
    tag: String,
    tag_start: usize,
    ns: Namespace,
    is_self_closing: bool,
    props: Vec<'a, PropNode<'a>>,
    /// `in_v_pre` value before this element's own v-pre applied
    prev_in_v_pre: bool,
    /// Whether this element carries v-pre itself
    started_v_pre: bool,
}

/// Attribute staged between name and attrib-end
struct CurrentAttribute {
    name: String,
    name_start: usize,
    name_end: usize,
    value: Option<String>,
    value_start: usize,
    value_end: usize,
}

/// Directive staged between name and attrib-end
struct CurrentDirective<'a> {
    name: String,
    raw_name: String,
    name_start: usize,
    arg: Option<(String, usize, usize, bool)>, // (content, start, end, is_dynamic)
    modifiers: Vec<'a, (String, usize, usize)>,
    value: Option<String>,
    value_start: usize,
    value_end: usize,
}

/// Accumulated text run
struct PendingText {
    start: usize,
    end: usize,
    content: String,
}

impl<'a> Parser<'a> {
    /// Create a new parser
    pub fn new(allocator: &'a Bump, source: &'a str) -> Self {
        Self::with_options(allocator, source, ParserOptions::default())
    }

    /// Create a new parser with options
    pub fn with_options(allocator: &'a Bump, source: &'a str, options: ParserOptions) -> Self {
        let mut newlines = Vec::new_in(allocator);
        newlines.extend(memchr::memchr_iter(b'\n', source.as_bytes()));
        Self {
            allocator,
            source,
            options,
            stack: Vec::new_in(allocator),
            root: None,
            current_element: None,
            current_attr: None,
            current_dir: None,
            pending_text: None,
            errors: Vec::new_in(allocator),
            newlines,
            in_pre: false,
            in_v_pre: false,
        }
    }

    /// Parse the source and return the AST plus collected errors
    pub fn parse(mut self) -> (RootNode<'a>, Vec<'a, CompilerError>) {
        let mut root = RootNode::new(self.allocator, self.source);
        root.loc = self.create_loc(0, self.source.len());
        self.root = Some(root);

        // Copy delimiters into the arena so they outlive the borrow below
        let delimiter_open: Vec<'a, u8> =
            Vec::from_iter_in(self.options.delimiters.0.bytes(), self.allocator);
        let delimiter_close: Vec<'a, u8> =
            Vec::from_iter_in(self.options.delimiters.1.bytes(), self.allocator);

        let mut tokenizer = Tokenizer::with_delimiters(
            self.source,
            ParserCallbacks { parser: &mut self },
            &delimiter_open,
            &delimiter_close,
        );
        tokenizer.tokenize();

        self.flush_text();
        self.handle_unclosed_elements();

        if let Some(ref mut root) = self.root {
            if self.options.whitespace == WhitespaceStrategy::Condense {
                condense_whitespace(&mut root.children, self.options.is_pre_tag, false);
            } else {
                normalize_pre_newlines(&mut root.children, self.options.is_pre_tag, false);
            }
        }

        let root = self.root.take().unwrap();
        (root, self.errors)
    }

    /// Get source slice
    fn get_source(&self, start: usize, end: usize) -> &str {
        &self.source[start..end]
    }

    /// Calculate position from byte offset
    fn get_pos(&self, offset: usize) -> Position {
        let line = match self.newlines.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i + 1,
        };

        let column = if line == 1 {
            offset + 1
        } else {
            offset - self.newlines[line - 2]
        };

        Position::new(offset as u32, line as u32, column as u32)
    }

    /// Create a source location
    fn create_loc(&self, start: usize, end: usize) -> SourceLocation {
        SourceLocation::new(
            self.get_pos(start),
            self.get_pos(end),
            self.get_source(start, end),
        )
    }

    /// Add child to current context (stack top or root)
    fn add_child(&mut self, child: TemplateChildNode<'a>) {
        if let Some(entry) = self.stack.last_mut() {
            entry.element.children.push(child);
        } else if let Some(ref mut root) = self.root {
            root.children.push(child);
        }
    }

    /// Handle unclosed elements at end of parsing
    fn handle_unclosed_elements(&mut self) {
        while let Some(entry) = self.stack.pop() {
            let loc = entry.element.loc.clone();
            self.errors
                .push(CompilerError::new(ErrorCode::MissingEndTag, Some(loc)));

            self.in_pre = entry.prev_in_pre;
            self.in_v_pre = entry.prev_in_v_pre;

            let boxed = Box::new_in(entry.element, self.allocator);
            self.add_child(TemplateChildNode::Element(boxed));
        }
    }

    /// Flush the pending text run into a text node
    fn flush_text(&mut self) {
        if let Some(text) = self.pending_text.take() {
            let loc = self.create_loc(text.start, text.end);
            let text_node = TextNode::new(text.content, loc);
            let boxed = Box::new_in(text_node, self.allocator);
            self.add_child(TemplateChildNode::Text(boxed));
        }
    }

    /// Process raw text content
    fn on_text_impl(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let slice = self.get_source(start, end).to_string();
        match self.pending_text {
            Some(ref mut text) => {
                text.content.push_str(&slice);
                text.end = end;
            }
            None => {
                self.pending_text = Some(PendingText {
                    start,
                    end,
                    content: slice.into(),
                });
            }
        }
    }

    /// Process a decoded entity in text position
    fn on_text_entity_impl(&mut self, ch: char, start: usize, end: usize) {
        match self.pending_text {
            Some(ref mut text) => {
                text.content.push(ch);
                text.end = end;
            }
            None => {
                let mut content = String::default();
                content.push(ch);
                self.pending_text = Some(PendingText {
                    start,
                    end,
                    content,
                });
            }
        }
    }

    /// Process interpolation
    fn on_interpolation_impl(&mut self, start: usize, end: usize) {
        self.flush_text();

        let raw_content = self.get_source(start, end);
        let content = raw_content.trim();

        // Trimmed positions for accurate source mapping
        let leading_ws = raw_content.len() - raw_content.trim_start().len();
        let trimmed_start = start + leading_ws;
        let trimmed_end = trimmed_start + content.len();

        let delim_len = self.options.delimiters.0.len();
        let full_start = start - delim_len;
        let full_end = end + self.options.delimiters.1.len();
        let loc = self.create_loc(full_start, full_end);
        let inner_loc = self.create_loc(trimmed_start, trimmed_end);

        let expr = SimpleExpressionNode::new(content, false, inner_loc);
        let expr_boxed = Box::new_in(expr, self.allocator);

        let interp = InterpolationNode {
            content: ExpressionNode::Simple(expr_boxed),
            loc,
        };
        let boxed = Box::new_in(interp, self.allocator);
        self.add_child(TemplateChildNode::Interpolation(boxed));
    }

    /// Process open tag name
    fn on_open_tag_name_impl(&mut self, start: usize, end: usize) {
        self.flush_text();

        let tag = self.get_source(start, end);
        let (parent_tag, parent_ns) = match self.stack.last() {
            Some(entry) => (Some(entry.element.tag.as_str()), entry.element.ns),
            None => (None, Namespace::Html),
        };
        let ns = (self.options.get_namespace)(tag, parent_tag, parent_ns);

        self.current_element = Some(CurrentElement {
            tag: tag.into(),
            tag_start: start,
            ns,
            is_self_closing: false,
            props: Vec::new_in(self.allocator),
            prev_in_v_pre: self.in_v_pre,
            started_v_pre: false,
        });
    }

    /// Process open tag end
    fn on_open_tag_end_impl(&mut self, end: usize) {
        if let Some(current) = self.current_element.take() {
            let tag_start = current.tag_start;
            let loc = self.create_loc(tag_start - 1, end + 1); // Include < and >

            let mut element = ElementNode::new(self.allocator, current.tag.clone(), loc);
            element.ns = current.ns;
            element.is_self_closing = current.is_self_closing;
            element.props = current.props;

            element.tag_type = if current.prev_in_v_pre || current.started_v_pre {
                // Inside v-pre everything is a plain element
                ElementType::Element
            } else {
                self.determine_element_type(&element)
            };

            let is_pre = (self.options.is_pre_tag)(element.tag.as_str());

            if current.is_self_closing || (self.options.is_void_tag)(element.tag.as_str()) {
                // Self-closing or void tag, add directly
                let boxed = Box::new_in(element, self.allocator);
                self.add_child(TemplateChildNode::Element(boxed));
                // v-pre on a childless element ends with it
                self.in_v_pre = current.prev_in_v_pre;
            } else {
                self.stack.push(ParserStackEntry {
                    element,
                    prev_in_pre: self.in_pre,
                    prev_in_v_pre: current.prev_in_v_pre,
                });
                self.in_pre = is_pre || self.in_pre;
            }
        }
    }

    /// Process self-closing tag
    fn on_self_closing_tag_impl(&mut self) {
        if let Some(ref mut current) = self.current_element {
            current.is_self_closing = true;
        }
    }

    /// Process close tag
    fn on_close_tag_impl(&mut self, start: usize, end: usize) {
        self.flush_text();

        let tag = self.get_source(start, end);
        let close_end = (end + 1).min(self.source.len()); // Include >

        // Find matching open tag, case-insensitively
        let mut found = false;
        for i in (0..self.stack.len()).rev() {
            if self.stack[i].element.tag.eq_ignore_ascii_case(tag) {
                found = true;

                // Pop everything above and including the match, top first
                let mut entries: Vec<'a, ParserStackEntry<'a>> = Vec::new_in(self.allocator);
                while self.stack.len() > i {
                    entries.push(self.stack.pop().unwrap());
                }

                // Entries popped before the matching one were never closed
                for entry in entries.iter().take(entries.len() - 1) {
                    let loc = entry.element.loc.clone();
                    self.errors
                        .push(CompilerError::new(ErrorCode::MissingEndTag, Some(loc)));
                }

                // Each implicitly closed element becomes a child of the next
                // entry down; the matching element goes to the current parent.
                let matching_index = entries.len() - 1;
                let mut completed: Option<TemplateChildNode<'a>> = None;
                for (idx, mut entry) in entries.into_iter().enumerate() {
                    if let Some(child) = completed.take() {
                        entry.element.children.push(child);
                    }
                    self.in_pre = entry.prev_in_pre;
                    self.in_v_pre = entry.prev_in_v_pre;

                    if idx == matching_index {
                        // Extend the element span over the close tag
                        let open_start = entry.element.loc.start.offset as usize;
                        entry.element.loc = self.create_loc(open_start, close_end);
                    }

                    let boxed = Box::new_in(entry.element, self.allocator);
                    completed = Some(TemplateChildNode::Element(boxed));
                }
                if let Some(child) = completed {
                    self.add_child(child);
                }

                break;
            }
        }

        if !found {
            let loc_start = start.saturating_sub(2); // Include </
            let loc = self.create_loc(loc_start, (end + 1).min(self.source.len()));
            self.errors
                .push(CompilerError::new(ErrorCode::InvalidEndTag, Some(loc)));
        }
    }

    /// Classify the element on close (element, component, slot, template)
    fn determine_element_type(&self, element: &ElementNode<'a>) -> ElementType {
        let tag = element.tag.as_str();

        if tag == "slot" {
            return ElementType::Slot;
        }

        if tag == "template" {
            let has_structural_directive = element.props.iter().any(|p| {
                matches!(p, PropNode::Directive(d) if matches!(d.name.as_str(), "if" | "else-if" | "else" | "for" | "slot"))
            });
            if has_structural_directive {
                return ElementType::Template;
            }
        }

        if self.is_component(tag, element) {
            return ElementType::Component;
        }

        ElementType::Element
    }

    /// Check if tag is a component
    fn is_component(&self, tag: &str, element: &ElementNode<'a>) -> bool {
        if lueur_socle::is_builtin_component(tag) {
            return true;
        }

        if let Some(is_custom) = self.options.is_custom_element {
            if is_custom(tag) {
                return false;
            }
        }

        // An explicit `is` attribute marks a component regardless of the tag
        if element.props.iter().any(|p| {
            matches!(p, PropNode::Attribute(a) if a.name == "is")
                || matches!(p, PropNode::Directive(d) if d.name == "bind" && d.static_arg() == Some("is"))
        }) {
            return true;
        }

        if tag.chars().next().is_some_and(|c| c.is_uppercase()) {
            return true;
        }

        if let Some(is_native) = self.options.is_native_tag {
            if !is_native(tag) {
                return true;
            }
        }

        false
    }

    /// Process attribute name
    fn on_attrib_name_impl(&mut self, start: usize, end: usize) {
        let name = self.get_source(start, end);
        self.current_attr = Some(CurrentAttribute {
            name: name.into(),
            name_start: start,
            name_end: end,
            value: None,
            value_start: 0,
            value_end: 0,
        });
    }

    /// Process directive name
    fn on_dir_name_impl(&mut self, start: usize, end: usize) {
        let raw_name = self.get_source(start, end).to_string();
        let name = parse_directive_name(&raw_name);

        if name.is_empty() {
            self.errors.push(CompilerError::new(
                ErrorCode::MissingDirectiveName,
                Some(self.create_loc(start, end)),
            ));
        }

        self.current_dir = Some(CurrentDirective {
            name: name.into(),
            raw_name: raw_name.into(),
            name_start: start,
            arg: None,
            modifiers: Vec::new_in(self.allocator),
            value: None,
            value_start: 0,
            value_end: 0,
        });
    }

    /// Process directive argument
    fn on_dir_arg_impl(&mut self, start: usize, end: usize) {
        let arg: String = self.get_source(start, end).into();
        let is_dynamic = start > 0 && self.source.as_bytes().get(start - 1) == Some(&b'[');
        if let Some(ref mut dir) = self.current_dir {
            dir.arg = Some((arg, start, end, is_dynamic));
        }
    }

    /// Process directive modifier
    fn on_dir_modifier_impl(&mut self, start: usize, end: usize) {
        let modifier: String = self.get_source(start, end).into();
        if let Some(ref mut dir) = self.current_dir {
            dir.modifiers.push((modifier, start, end));
        }
    }

    /// Process attribute value content
    fn on_attrib_data_impl(&mut self, start: usize, end: usize) {
        let slice = self.get_source(start, end).to_string();
        if let Some(ref mut attr) = self.current_attr {
            match attr.value {
                Some(ref mut v) => v.push_str(&slice),
                None => {
                    attr.value = Some(slice.clone().into());
                    attr.value_start = start;
                }
            }
            attr.value_end = end;
        }
        if let Some(ref mut dir) = self.current_dir {
            match dir.value {
                Some(ref mut v) => v.push_str(&slice),
                None => {
                    dir.value = Some(slice.into());
                    dir.value_start = start;
                }
            }
            dir.value_end = end;
        }
    }

    /// Process a decoded entity inside an attribute value
    fn on_attrib_entity_impl(&mut self, ch: char, start: usize, end: usize) {
        if let Some(ref mut attr) = self.current_attr {
            match attr.value {
                Some(ref mut v) => v.push(ch),
                None => {
                    let mut v = String::default();
                    v.push(ch);
                    attr.value = Some(v);
                    attr.value_start = start;
                }
            }
            attr.value_end = end;
        }
        if let Some(ref mut dir) = self.current_dir {
            match dir.value {
                Some(ref mut v) => v.push(ch),
                None => {
                    let mut v = String::default();
                    v.push(ch);
                    dir.value = Some(v);
                    dir.value_start = start;
                }
            }
            dir.value_end = end;
        }
    }

    /// Process attribute end
    fn on_attrib_end_impl(&mut self, quote: QuoteType, end: usize) {
        if let Some(attr) = self.current_attr.take() {
            self.finish_attribute(attr, quote, end);
        }
        if let Some(dir) = self.current_dir.take() {
            self.finish_directive(dir, end);
        }
    }

    /// Check for a prop with the same effective name already on the element
    fn is_duplicate_prop(&self, name: &str) -> bool {
        let Some(ref current) = self.current_element else {
            return false;
        };
        current.props.iter().any(|p| match p {
            PropNode::Attribute(a) => a.name == name,
            PropNode::Directive(d) => d.raw_name.as_deref() == Some(name),
        })
    }

    /// Finish building an attribute node
    fn finish_attribute(&mut self, attr: CurrentAttribute, quote: QuoteType, end: usize) {
        if self.is_duplicate_prop(attr.name.as_str()) {
            self.errors.push(CompilerError::new(
                ErrorCode::DuplicateAttribute,
                Some(self.create_loc(attr.name_start, attr.name_end)),
            ));
            return;
        }

        let loc = self.create_loc(attr.name_start, end);
        let name_loc = self.create_loc(attr.name_start, attr.name_end);

        let mut attr_node = AttributeNode::new(attr.name.clone(), loc);
        attr_node.name_loc = name_loc;

        if let Some(value) = attr.value {
            let value_loc = self.create_loc(attr.value_start, attr.value_end);
            attr_node.value = Some(TextNode::new(value, value_loc));
        } else if matches!(quote, QuoteType::Double | QuoteType::Single) {
            // alt="" is an empty string value, not a boolean attribute
            let empty_loc = self.create_loc(end, end);
            attr_node.value = Some(TextNode::new("", empty_loc));
        }

        if let Some(ref mut current) = self.current_element {
            let boxed = Box::new_in(attr_node, self.allocator);
            current.props.push(PropNode::Attribute(boxed));
        }
    }

    /// Finish building a directive node
    fn finish_directive(&mut self, dir: CurrentDirective<'a>, end: usize) {
        if dir.name == "pre" {
            // v-pre switches this element's remaining attributes and its
            // children into literal mode; the directive itself is dropped.
            if let Some(ref mut current) = self.current_element {
                if !self.in_v_pre {
                    self.in_v_pre = true;
                    current.started_v_pre = true;
                }
            }
            return;
        }

        if self.is_duplicate_prop(dir.raw_name.as_str()) {
            self.errors.push(CompilerError::new(
                ErrorCode::DuplicateAttribute,
                Some(self.create_loc(dir.name_start, end)),
            ));
            return;
        }

        let loc = self.create_loc(dir.name_start, end);

        let mut dir_node = DirectiveNode::new(self.allocator, dir.name.clone(), loc);
        dir_node.raw_name = Some(dir.raw_name);

        if let Some((arg_content, arg_start, arg_end, is_dynamic)) = dir.arg {
            let arg_loc = self.create_loc(arg_start, arg_end);
            let mut arg_expr = SimpleExpressionNode::new(arg_content, !is_dynamic, arg_loc);
            if is_dynamic {
                arg_expr.const_type = ConstantType::NotConstant;
            }
            let arg_boxed = Box::new_in(arg_expr, self.allocator);
            dir_node.arg = Some(ExpressionNode::Simple(arg_boxed));
        }

        for (mod_content, mod_start, mod_end) in dir.modifiers {
            let mod_loc = self.create_loc(mod_start, mod_end);
            let mod_expr = SimpleExpressionNode::new(mod_content, true, mod_loc);
            dir_node.modifiers.push(mod_expr);
        }

        if dir.value.is_some() {
            // v-for expressions are parsed from the raw slice so alias
            // sub-locations stay byte-exact.
            if dir.name == "for" {
                match self.parse_for_expression(dir.value_start, dir.value_end) {
                    Some(result) => dir_node.for_parse_result = Some(result),
                    None => {
                        self.errors.push(CompilerError::new(
                            ErrorCode::VForMalformedExpression,
                            Some(self.create_loc(dir.value_start, dir.value_end)),
                        ));
                    }
                }
            }

            let exp_loc = self.create_loc(dir.value_start, dir.value_end);
            let exp_node = SimpleExpressionNode::new(dir.value.unwrap(), false, exp_loc);
            let exp_boxed = Box::new_in(exp_node, self.allocator);
            dir_node.exp = Some(ExpressionNode::Simple(exp_boxed));
        }

        if let Some(ref mut current) = self.current_element {
            let boxed = Box::new_in(dir_node, self.allocator);
            current.props.push(PropNode::Directive(boxed));
        }
    }

    /// Split a v-for expression around the `in`/`of` alias operator into
    /// source and a (value, key, index) destructure.
    fn parse_for_expression(&self, start: usize, end: usize) -> Option<ForParseResult<'a>> {
        let raw = self.get_source(start, end);
        let split = find_for_alias_operator(raw)?;

        let lhs_raw = &raw[..split];
        let rhs_raw = &raw[split + 4..]; // " in " / " of "

        // Source expression
        let rhs_trim = rhs_raw.trim();
        if rhs_trim.is_empty() {
            return None;
        }
        let rhs_offset = start + split + 4 + (rhs_raw.len() - rhs_raw.trim_start().len());
        let source_expr = self.sub_expression(rhs_trim, rhs_offset);

        // Alias destructure: strip wrapping parens, split top-level commas
        let lhs_trim = lhs_raw.trim();
        let lhs_offset = start + (lhs_raw.len() - lhs_raw.trim_start().len());
        let (aliases_str, aliases_offset) =
            if lhs_trim.starts_with('(') && lhs_trim.ends_with(')') {
                (&lhs_trim[1..lhs_trim.len() - 1], lhs_offset + 1)
            } else {
                (lhs_trim, lhs_offset)
            };

        let mut aliases: [Option<ExpressionNode<'a>>; 3] = [None, None, None];
        let mut slot = 0;
        let mut seg_start = 0;
        let bytes = aliases_str.as_bytes();
        let mut depth = 0i32;
        for i in 0..=bytes.len() {
            let at_end = i == bytes.len();
            let c = if at_end { b',' } else { bytes[i] };
            match c {
                b'(' | b'[' | b'{' if !at_end => depth += 1,
                b')' | b']' | b'}' if !at_end => depth -= 1,
                b',' if depth == 0 => {
                    if slot < 3 {
                        let seg = &aliases_str[seg_start..i];
                        let seg_trim = seg.trim();
                        if !seg_trim.is_empty() {
                            let seg_offset =
                                aliases_offset + seg_start + (seg.len() - seg.trim_start().len());
                            aliases[slot] = Some(self.sub_expression(seg_trim, seg_offset));
                        }
                        slot += 1;
                    }
                    seg_start = i + 1;
                }
                _ => {}
            }
        }

        let [value, key, index] = aliases;
        Some(ForParseResult {
            source: source_expr,
            value,
            key,
            index,
        })
    }

    /// Build a non-static simple expression for a slice of the source
    fn sub_expression(&self, content: &str, offset: usize) -> ExpressionNode<'a> {
        let loc = self.create_loc(offset, offset + content.len());
        let expr = SimpleExpressionNode::new(content, false, loc);
        ExpressionNode::Simple(Box::new_in(expr, self.allocator))
    }

    /// Process comment
    fn on_comment_impl(&mut self, start: usize, end: usize) {
        self.flush_text();

        if !self.options.comments {
            return;
        }

        let content = self.get_source(start, end);
        let loc_start = start.saturating_sub(4); // Include <!--
        let loc_end = (end + 3).min(self.source.len()); // Include -->
        let loc = self.create_loc(loc_start, loc_end);

        let comment = CommentNode::new(content, loc);
        let boxed = Box::new_in(comment, self.allocator);
        self.add_child(TemplateChildNode::Comment(boxed));
    }

    /// Handle error
    fn on_error_impl(&mut self, code: ErrorCode, index: usize) {
        let loc = self.create_loc(index.min(self.source.len()), (index + 1).min(self.source.len()));
        self.errors.push(CompilerError::new(code, Some(loc)));
    }
}

/// Find the byte offset of a top-level ` in ` / ` of ` operator.
fn find_for_alias_operator(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i + 4 <= bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b' ' if depth == 0 => {
                let rest = &bytes[i + 1..];
                if (rest.starts_with(b"in ") || rest.starts_with(b"of ")) && i > 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parse directive name from raw attribute name
fn parse_directive_name(raw: &str) -> &str {
    match raw.chars().next() {
        Some(':') => return "bind",
        Some('@') => return "on",
        Some('#') => return "slot",
        Some('.') => return "bind", // .prop shorthand
        _ => {}
    }

    if let Some(rest) = raw.strip_prefix("v-") {
        let end = rest.find([':', '.']).unwrap_or(rest.len());
        return &rest[..end];
    }

    raw
}

/// Wrapper struct for implementing Callbacks
struct ParserCallbacks<'a, 'p> {
    parser: &'p mut Parser<'a>,
}

impl<'a, 'p> Callbacks for ParserCallbacks<'a, 'p> {
    fn on_text(&mut self, start: usize, end: usize) {
        self.parser.on_text_impl(start, end);
    }

    fn on_text_entity(&mut self, ch: char, start: usize, end: usize) {
        self.parser.on_text_entity_impl(ch, start, end);
    }

    fn on_interpolation(&mut self, start: usize, end: usize) {
        self.parser.on_interpolation_impl(start, end);
    }

    fn on_open_tag_name(&mut self, start: usize, end: usize) {
        self.parser.on_open_tag_name_impl(start, end);
    }

    fn on_open_tag_end(&mut self, end: usize) {
        self.parser.on_open_tag_end_impl(end);
    }

    fn on_self_closing_tag(&mut self, end: usize) {
        self.parser.on_self_closing_tag_impl();
        self.parser.on_open_tag_end_impl(end);
    }

    fn on_close_tag(&mut self, start: usize, end: usize) {
        self.parser.on_close_tag_impl(start, end);
    }

    fn on_attrib_data(&mut self, start: usize, end: usize) {
        self.parser.on_attrib_data_impl(start, end);
    }

    fn on_attrib_entity(&mut self, ch: char, start: usize, end: usize) {
        self.parser.on_attrib_entity_impl(ch, start, end);
    }

    fn on_attrib_end(&mut self, quote: QuoteType, end: usize) {
        self.parser.on_attrib_end_impl(quote, end);
    }

    fn on_attrib_name(&mut self, start: usize, end: usize) {
        self.parser.on_attrib_name_impl(start, end);
    }

    fn on_attrib_name_end(&mut self, _end: usize) {}

    fn on_dir_name(&mut self, start: usize, end: usize) {
        self.parser.on_dir_name_impl(start, end);
    }

    fn on_dir_arg(&mut self, start: usize, end: usize) {
        self.parser.on_dir_arg_impl(start, end);
    }

    fn on_dir_modifier(&mut self, start: usize, end: usize) {
        self.parser.on_dir_modifier_impl(start, end);
    }

    fn on_comment(&mut self, start: usize, end: usize) {
        self.parser.on_comment_impl(start, end);
    }

    fn on_cdata(&mut self, start: usize, end: usize) {
        // CDATA content is treated as plain text in templates
        self.parser.on_text_impl(start, end);
    }

    fn on_processing_instruction(&mut self, _start: usize, _end: usize) {}

    fn on_end(&mut self) {}

    fn on_error(&mut self, code: ErrorCode, index: usize) {
        self.parser.on_error_impl(code, index);
    }

    fn is_in_v_pre(&self) -> bool {
        self.parser.in_v_pre
    }

    fn special_kind(&self, tag: &str) -> SpecialKind {
        match self.parser.options.mode {
            ParseMode::Base => SpecialKind::None,
            ParseMode::Html => {
                if lueur_socle::is_rawtext_tag(tag) {
                    SpecialKind::RawText
                } else if lueur_socle::is_rcdata_tag(tag) {
                    SpecialKind::RcData
                } else {
                    SpecialKind::None
                }
            }
            ParseMode::Sfc => {
                if self.parser.stack.is_empty() && tag != "template" {
                    SpecialKind::RawText
                } else {
                    SpecialKind::None
                }
            }
        }
    }
}

/// Whether a text node consists entirely of whitespace
fn is_all_whitespace(content: &str) -> bool {
    content.chars().all(char::is_whitespace)
}

/// Collapse internal whitespace runs to single spaces
fn condense_text(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_ws = false;
    for c in content.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push(' ');
                in_ws = true;
            }
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    out
}

/// Condense whitespace in children per the default whitespace policy.
///
/// Whitespace-only text nodes are removed when leading/trailing, adjacent to
/// a comment, or between two element siblings when the run contains a
/// newline; remaining runs collapse to single spaces. Inside `<pre>` content
/// is preserved apart from CRLF normalization.
fn condense_whitespace<'a>(
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    is_pre_tag: fn(&str) -> bool,
    in_pre: bool,
) {
    if in_pre {
        normalize_pre_newlines(children, is_pre_tag, true);
        return;
    }

    let mut i = 0;
    while i < children.len() {
        enum Action {
            Keep,
            Remove,
            Condense,
        }

        let action = if let TemplateChildNode::Text(ref text) = children[i] {
            if is_all_whitespace(&text.content) {
                let first = i == 0;
                let last = i + 1 == children.len();
                let prev_comment =
                    i > 0 && matches!(children[i - 1], TemplateChildNode::Comment(_));
                let next_comment = i + 1 < children.len()
                    && matches!(children[i + 1], TemplateChildNode::Comment(_));
                let between_elements = i > 0
                    && i + 1 < children.len()
                    && matches!(children[i - 1], TemplateChildNode::Element(_))
                    && matches!(children[i + 1], TemplateChildNode::Element(_));

                if first
                    || last
                    || prev_comment
                    || next_comment
                    || (between_elements && text.content.contains('\n'))
                {
                    Action::Remove
                } else {
                    Action::Condense
                }
            } else {
                Action::Condense
            }
        } else {
            Action::Keep
        };

        match action {
            Action::Remove => {
                children.remove(i);
                continue;
            }
            Action::Condense => {
                if let TemplateChildNode::Text(ref mut text) = children[i] {
                    text.content = condense_text(&text.content);
                }
            }
            Action::Keep => {}
        }

        if let TemplateChildNode::Element(ref mut el) = children[i] {
            let child_in_pre = is_pre_tag(el.tag.as_str());
            condense_whitespace(&mut el.children, is_pre_tag, child_in_pre);
        }

        i += 1;
    }
}

/// Normalize Windows newlines inside preserved content.
fn normalize_pre_newlines<'a>(
    children: &mut Vec<'a, TemplateChildNode<'a>>,
    is_pre_tag: fn(&str) -> bool,
    in_pre: bool,
) {
    for child in children.iter_mut() {
        match child {
            TemplateChildNode::Text(text) if in_pre => {
                if text.content.contains("\r\n") {
                    text.content = text.content.replace("\r\n", "\n").into();
                }
            }
            TemplateChildNode::Element(el) => {
                let child_in_pre = in_pre || is_pre_tag(el.tag.as_str());
                normalize_pre_newlines(&mut el.children, is_pre_tag, child_in_pre);
            }
            _ => {}
        }
    }
}

/// Parse a template
pub fn parse<'a>(allocator: &'a Bump, source: &'a str) -> (RootNode<'a>, Vec<'a, CompilerError>) {
    Parser::new(allocator, source).parse()
}

/// Parse a template with options
pub fn parse_with_options<'a>(
    allocator: &'a Bump,
    source: &'a str,
    options: ParserOptions,
) -> (RootNode<'a>, Vec<'a, CompilerError>) {
    Parser::with_options(allocator, source, options).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_element() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div></div>");

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);

        if let TemplateChildNode::Element(el) = &root.children[0] {
            assert_eq!(el.tag.as_str(), "div");
            assert!(!el.is_self_closing);
        } else {
            panic!("Expected element node");
        }
    }

    #[test]
    fn test_parse_text() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "hello");

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);

        if let TemplateChildNode::Text(text) = &root.children[0] {
            assert_eq!(text.content.as_str(), "hello");
        } else {
            panic!("Expected text node");
        }
    }

    #[test]
    fn test_parse_interpolation() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "{{ msg }}");

        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);

        if let TemplateChildNode::Interpolation(interp) = &root.children[0] {
            let ExpressionNode::Simple(expr) = &interp.content else {
                panic!("Expected simple expression");
            };
            assert_eq!(expr.content.as_str(), "msg");
        } else {
            panic!("Expected interpolation node");
        }
    }

    #[test]
    fn test_parse_directive() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<div v-if="ok"></div>"#);

        assert!(errors.is_empty());

        if let TemplateChildNode::Element(el) = &root.children[0] {
            assert_eq!(el.props.len(), 1);
            if let PropNode::Directive(dir) = &el.props[0] {
                assert_eq!(dir.name.as_str(), "if");
                if let Some(ExpressionNode::Simple(exp)) = &dir.exp {
                    assert_eq!(exp.content.as_str(), "ok");
                }
            } else {
                panic!("Expected directive");
            }
        } else {
            panic!("Expected element node");
        }
    }

    #[test]
    fn test_parse_shorthand_bind() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<div :class="cls"></div>"#);

        assert!(errors.is_empty());

        if let TemplateChildNode::Element(el) = &root.children[0] {
            if let PropNode::Directive(dir) = &el.props[0] {
                assert_eq!(dir.name.as_str(), "bind");
                if let Some(ExpressionNode::Simple(arg)) = &dir.arg {
                    assert_eq!(arg.content.as_str(), "class");
                }
            } else {
                panic!("Expected directive");
            }
        }
    }

    #[test]
    fn test_parse_shorthand_on_with_modifiers() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<button @click.stop.prevent="h"></button>"#);

        assert!(errors.is_empty());

        if let TemplateChildNode::Element(el) = &root.children[0] {
            if let PropNode::Directive(dir) = &el.props[0] {
                assert_eq!(dir.name.as_str(), "on");
                if let Some(ExpressionNode::Simple(arg)) = &dir.arg {
                    assert_eq!(arg.content.as_str(), "click");
                }
                assert_eq!(dir.modifiers.len(), 2);
                assert_eq!(dir.modifiers[0].content.as_str(), "stop");
                assert_eq!(dir.modifiers[1].content.as_str(), "prevent");
            } else {
                panic!("Expected directive");
            }
        }
    }

    #[test]
    fn test_parse_dynamic_directive_arg() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<div v-bind:[attr]="val"></div>"#);
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(el) = &root.children[0] {
            if let PropNode::Directive(dir) = &el.props[0] {
                assert_eq!(dir.name.as_str(), "bind");
                if let Some(ExpressionNode::Simple(arg)) = &dir.arg {
                    assert_eq!(arg.content.as_str(), "attr");
                    assert!(!arg.is_static);
                } else {
                    panic!("Expected arg");
                }
            }
        }
    }

    #[test]
    fn test_parse_v_for_result() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<li v-for="(item, i) in items"></li>"#);
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(el) = &root.children[0] {
            if let PropNode::Directive(dir) = &el.props[0] {
                assert_eq!(dir.name.as_str(), "for");
                let result = dir.for_parse_result.as_ref().expect("for parse result");
                if let ExpressionNode::Simple(src) = &result.source {
                    assert_eq!(src.content.as_str(), "items");
                }
                if let Some(ExpressionNode::Simple(value)) = &result.value {
                    assert_eq!(value.content.as_str(), "item");
                } else {
                    panic!("Expected value alias");
                }
                if let Some(ExpressionNode::Simple(key)) = &result.key {
                    assert_eq!(key.content.as_str(), "i");
                } else {
                    panic!("Expected key alias");
                }
                assert!(result.index.is_none());
            }
        }
    }

    #[test]
    fn test_parse_v_for_of_and_destructure() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<li v-for="{ id } of rows"></li>"#);
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(el) = &root.children[0] {
            if let PropNode::Directive(dir) = &el.props[0] {
                let result = dir.for_parse_result.as_ref().expect("for parse result");
                if let ExpressionNode::Simple(src) = &result.source {
                    assert_eq!(src.content.as_str(), "rows");
                }
                if let Some(ExpressionNode::Simple(value)) = &result.value {
                    assert_eq!(value.content.as_str(), "{ id }");
                }
            }
        }
    }

    #[test]
    fn test_parse_v_for_malformed() {
        let allocator = Bump::new();
        let (_root, errors) = parse(&allocator, r#"<li v-for="items"></li>"#);
        assert!(errors
            .iter()
            .any(|e| e.code == ErrorCode::VForMalformedExpression));
    }

    #[test]
    fn test_parse_text_entities() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "a &amp; b &#64; c");
        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);
        if let TemplateChildNode::Text(text) = &root.children[0] {
            assert_eq!(text.content.as_str(), "a & b @ c");
        } else {
            panic!("Expected text node");
        }
    }

    #[test]
    fn test_parse_attr_entity() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<a title="x &amp; y"></a>"#);
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(el) = &root.children[0] {
            if let PropNode::Attribute(attr) = &el.props[0] {
                assert_eq!(attr.value.as_ref().unwrap().content.as_str(), "x & y");
            }
        }
    }

    #[test]
    fn test_unterminated_named_entity_stays_literal() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "a &hellip b");
        assert!(errors.is_empty());
        if let TemplateChildNode::Text(text) = &root.children[0] {
            assert_eq!(text.content.as_str(), "a &hellip b");
        } else {
            panic!("Expected text node");
        }
    }

    #[test]
    fn test_rawtext_script_in_html_mode() {
        let allocator = Bump::new();
        let mut options = ParserOptions::default();
        options.mode = ParseMode::Html;
        let (root, errors) = parse_with_options(
            &allocator,
            "<script>if (a < b) { x(\"{{ not interp }}\") }</script>",
            options,
        );
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(el) = &root.children[0] {
            assert_eq!(el.tag.as_str(), "script");
            assert_eq!(el.children.len(), 1);
            if let TemplateChildNode::Text(text) = &el.children[0] {
                assert_eq!(
                    text.content.as_str(),
                    "if (a < b) { x(\"{{ not interp }}\") }"
                );
            } else {
                panic!("Expected raw text child");
            }
        }
    }

    #[test]
    fn test_rcdata_textarea_parses_interpolation() {
        let allocator = Bump::new();
        let mut options = ParserOptions::default();
        options.mode = ParseMode::Html;
        let (root, errors) =
            parse_with_options(&allocator, "<textarea>a {{ msg }} &amp; b</textarea>", options);
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(el) = &root.children[0] {
            assert_eq!(el.tag.as_str(), "textarea");
            assert_eq!(el.children.len(), 3);
            assert!(matches!(&el.children[1], TemplateChildNode::Interpolation(_)));
            if let TemplateChildNode::Text(t) = &el.children[2] {
                assert_eq!(t.content.as_str(), " & b");
            }
        }
    }

    #[test]
    fn test_duplicate_attribute_error() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<div id="a" id="b"></div>"#);
        assert!(errors.iter().any(|e| e.code == ErrorCode::DuplicateAttribute));
        if let TemplateChildNode::Element(el) = &root.children[0] {
            assert_eq!(el.props.len(), 1);
        }
    }

    #[test]
    fn test_namespace_svg() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<svg><circle/><foreignObject><div/></foreignObject></svg>");
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(svg) = &root.children[0] {
            assert_eq!(svg.ns, Namespace::Svg);
            if let TemplateChildNode::Element(circle) = &svg.children[0] {
                assert_eq!(circle.ns, Namespace::Svg);
            }
            if let TemplateChildNode::Element(fo) = &svg.children[1] {
                assert_eq!(fo.ns, Namespace::Svg);
                if let TemplateChildNode::Element(div) = &fo.children[0] {
                    assert_eq!(div.ns, Namespace::Html);
                }
            }
        }
    }

    #[test]
    fn test_v_pre_children_are_literal() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<div v-pre><span :id="x">{{ raw }}</span></div>"#);
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(div) = &root.children[0] {
            // v-pre itself is dropped
            assert!(div.props.is_empty());
            if let TemplateChildNode::Element(span) = &div.children[0] {
                assert_eq!(span.tag_type, ElementType::Element);
                // :id parsed as a plain attribute
                assert!(matches!(&span.props[0], PropNode::Attribute(a) if a.name == ":id"));
                // interpolation not parsed
                if let TemplateChildNode::Text(t) = &span.children[0] {
                    assert_eq!(t.content.as_str(), "{{ raw }}");
                } else {
                    panic!("Expected literal text");
                }
            }
        }
    }

    #[test]
    fn test_element_classification() {
        let allocator = Bump::new();
        let (root, errors) = parse(
            &allocator,
            r#"<MyWidget/><slot/><template v-if="ok"></template><KeepAlive/>"#,
        );
        assert!(errors.is_empty());
        let types: std::vec::Vec<ElementType> = root
            .children
            .iter()
            .filter_map(|c| match c {
                TemplateChildNode::Element(el) => Some(el.tag_type),
                _ => None,
            })
            .collect();
        assert_eq!(
            types,
            vec![
                ElementType::Component,
                ElementType::Slot,
                ElementType::Template,
                ElementType::Component,
            ]
        );
    }

    #[test]
    fn test_implicit_close_with_error() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div><span></div>");
        assert!(errors.iter().any(|e| e.code == ErrorCode::MissingEndTag));
        if let TemplateChildNode::Element(div) = &root.children[0] {
            assert_eq!(div.tag.as_str(), "div");
            assert_eq!(div.children.len(), 1);
        }
    }

    #[test]
    fn test_invalid_end_tag_error() {
        let allocator = Bump::new();
        let (_root, errors) = parse(&allocator, "<div></span></div>");
        assert!(errors.iter().any(|e| e.code == ErrorCode::InvalidEndTag));
    }

    #[test]
    fn test_eof_missing_end_tag() {
        let allocator = Bump::new();
        let (_root, errors) = parse(&allocator, "<div>");
        assert!(errors.iter().any(|e| e.code == ErrorCode::MissingEndTag));
    }

    #[test]
    fn test_whitespace_condense_between_elements() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div>\n  <span/>\n  <span/>\n</div>");
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(div) = &root.children[0] {
            // leading/trailing removed, newline run between elements removed
            assert_eq!(div.children.len(), 2);
            assert!(matches!(&div.children[0], TemplateChildNode::Element(_)));
            assert!(matches!(&div.children[1], TemplateChildNode::Element(_)));
        }
    }

    #[test]
    fn test_whitespace_inline_space_kept() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div><b>a</b> <b>b</b></div>");
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(div) = &root.children[0] {
            assert_eq!(div.children.len(), 3);
            if let TemplateChildNode::Text(t) = &div.children[1] {
                assert_eq!(t.content.as_str(), " ");
            } else {
                panic!("Expected condensed space");
            }
        }
    }

    #[test]
    fn test_whitespace_runs_collapse_in_text() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<div>foo  \n  bar</div>");
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(div) = &root.children[0] {
            if let TemplateChildNode::Text(t) = &div.children[0] {
                assert_eq!(t.content.as_str(), "foo bar");
            }
        }
    }

    #[test]
    fn test_pre_preserves_whitespace() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<pre>  a\r\n  b  </pre>");
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(pre) = &root.children[0] {
            if let TemplateChildNode::Text(t) = &pre.children[0] {
                assert_eq!(t.content.as_str(), "  a\n  b  ");
            } else {
                panic!("Expected text child");
            }
        }
    }

    #[test]
    fn test_comment_node() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<!-- hello -->");
        assert!(errors.is_empty());
        if let TemplateChildNode::Comment(c) = &root.children[0] {
            assert_eq!(c.content.as_str(), " hello ");
        } else {
            panic!("Expected comment node");
        }
    }

    #[test]
    fn test_comments_disabled() {
        let allocator = Bump::new();
        let mut options = ParserOptions::default();
        options.comments = false;
        let (root, errors) = parse_with_options(&allocator, "<!-- hidden -->", options);
        assert!(errors.is_empty());
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "");
        assert!(errors.is_empty());
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_node_locations_roundtrip() {
        let allocator = Bump::new();
        let source = "<div id=\"a\">\n  {{ msg }}\n</div>";
        let (root, errors) = parse(&allocator, source);
        assert!(errors.is_empty());
        // Re-serializing from recorded locations yields the covered source
        if let TemplateChildNode::Element(el) = &root.children[0] {
            let start = el.loc.start.offset as usize;
            let end = el.loc.end.offset as usize;
            assert_eq!(&source[start..end], el.loc.source.as_str());
            assert_eq!(el.loc.start.line, 1);
            assert_eq!(el.loc.end.line, 3);
            for child in el.children.iter() {
                let loc = child.loc();
                let (s, e) = (loc.start.offset as usize, loc.end.offset as usize);
                assert_eq!(&source[s..e], loc.source.as_str());
                // children strictly nest within the parent span
                assert!(s >= start && e <= end);
            }
        }
    }

    #[test]
    fn test_custom_delimiters() {
        let allocator = Bump::new();
        let mut options = ParserOptions::default();
        options.delimiters = (String::const_new("[["), String::const_new("]]"));
        let (root, errors) = parse_with_options(&allocator, "[[ msg ]]", options);
        assert!(errors.is_empty());
        assert!(matches!(&root.children[0], TemplateChildNode::Interpolation(_)));
    }

    #[test]
    fn test_unclosed_interpolation_error() {
        let allocator = Bump::new();
        let (_root, errors) = parse(&allocator, "{{ msg ");
        assert!(errors
            .iter()
            .any(|e| e.code == ErrorCode::MissingInterpolationEnd));
    }

    #[test]
    fn test_empty_quoted_attribute() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, r#"<img alt="" />"#);
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(el) = &root.children[0] {
            if let PropNode::Attribute(attr) = &el.props[0] {
                assert_eq!(attr.name.as_str(), "alt");
                let value = attr.value.as_ref().expect("alt=\"\" should have a value");
                assert_eq!(value.content.as_str(), "");
            } else {
                panic!("Expected attribute prop");
            }
        }
    }

    #[test]
    fn test_boolean_attribute_no_value() {
        let allocator = Bump::new();
        let (root, errors) = parse(&allocator, "<input disabled>");
        assert!(errors.is_empty());
        if let TemplateChildNode::Element(el) = &root.children[0] {
            if let PropNode::Attribute(attr) = &el.props[0] {
                assert_eq!(attr.name.as_str(), "disabled");
                assert!(attr.value.is_none());
            }
        }
    }

    #[test]
    fn test_sfc_root_raw_text() {
        let allocator = Bump::new();
        let mut options = ParserOptions::default();
        options.mode = ParseMode::Sfc;
        let (root, errors) = parse_with_options(
            &allocator,
            "<script>const a = 1 < 2</script><template><div/></template>",
            options,
        );
        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 2);
        if let TemplateChildNode::Element(script) = &root.children[0] {
            if let TemplateChildNode::Text(t) = &script.children[0] {
                assert_eq!(t.content.as_str(), "const a = 1 < 2");
            } else {
                panic!("Expected raw text child");
            }
        }
        if let TemplateChildNode::Element(template) = &root.children[1] {
            assert!(matches!(&template.children[0], TemplateChildNode::Element(_)));
        }
    }
}
