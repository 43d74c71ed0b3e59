//! Highlighted markup → fixed-width colour rows.
//!
//! Each file's highlighter output is walked line by line. Tags open and close
//! colour scopes; every character of literal text becomes one pixel, coloured
//! with the innermost scope's foreground (non-whitespace) or background
//! (whitespace).
//!
//! ```text
//! <div class="lang-rust"><pre><span class="k">fn</span> main
//! ^ block scope: redefines the file's base colours
//!                                  ^ inline scope: k over lang-rust
//! ```
//!
//! ## Scope stack
//!
//! [`ScopeStack`] holds merged `{fg, bg}` records. Opening a `span` or `div`
//! pushes the top merged with the tag's class rules; closing one pops. The
//! bottom entry is the base scope and is never popped, so stray closing tags
//! are ignored. A `div` additionally replaces the base, so the file's
//! language wrapper sets the fill colour for every following line.
//!
//! Rows are padded with the base background as it stands at the end of the
//! line, not with the line's trailing inline scope.
//!
//! ## Tags
//!
//! A tag runs from `<` to the next `>`. Only `span` (inline) and `div`
//! (block) affect scopes; a classless `span`/`div` pushes an unchanged copy
//! of the top so its closing tag stays balanced. Every other tag (`<pre>`,
//! `</pre>`, ...) is skipped and never rendered as pixels.

use crate::entities;
use crate::pixels::pad;
use crate::stylesheet::{ColorRule, ColorTable};
use crate::types::{Color, Row, UNKNOWN_LANG_CSS};

/// The highlighter's per-file footer, dropped from the output.
pub const FOOTER: &str = "</pre></div>";

/// Colours in effect at a point in the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScope {
    pub fg: Color,
    pub bg: Color,
}

impl ColorScope {
    /// This scope with the rule's declared fields overriding.
    pub fn merged(&self, rule: Option<&ColorRule>) -> ColorScope {
        let Some(rule) = rule else {
            return self.clone();
        };
        ColorScope {
            fg: rule.fg.clone().unwrap_or_else(|| self.fg.clone()),
            bg: rule.bg.clone().unwrap_or_else(|| self.bg.clone()),
        }
    }
}

/// Stack of merged scopes with a non-removable base entry.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<ColorScope>,
}

impl ScopeStack {
    pub fn new(base: ColorScope) -> Self {
        Self { scopes: vec![base] }
    }

    pub fn top(&self) -> &ColorScope {
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn base(&self) -> &ColorScope {
        &self.scopes[0]
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self, scope: ColorScope) {
        self.scopes.push(scope);
    }

    /// Pop the innermost scope. A pop that would remove the base is ignored.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn set_base(&mut self, scope: ColorScope) {
        self.scopes[0] = scope;
    }
}

/// A piece of a markup line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// `<...>` including the brackets.
    Tag(&'a str),
    Text(&'a str),
}

/// Split a line into alternating tags and text.
///
/// A `<` with no later `>`, or an empty `<>`, is text.
pub fn segments(line: &str) -> Vec<Segment<'_>> {
    let mut parts = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;
    while let Some(rel) = line[pos..].find('<') {
        let open = pos + rel;
        let Some(len) = line[open + 1..].find('>') else {
            break;
        };
        if len == 0 {
            pos = open + 1;
            continue;
        }
        if open > text_start {
            parts.push(Segment::Text(&line[text_start..open]));
        }
        let close = open + 1 + len;
        parts.push(Segment::Tag(&line[open..=close]));
        text_start = close + 1;
        pos = text_start;
    }
    if text_start < line.len() {
        parts.push(Segment::Text(&line[text_start..]));
    }
    parts
}

/// What a tag does to the scope stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind<'a> {
    /// Opening `span`/`div`, with its classes in attribute order.
    Open { block: bool, classes: Vec<&'a str> },
    /// Closing `span`/`div`.
    Close,
    /// Anything else.
    Other,
}

/// Classify a tag (including its angle brackets).
pub fn classify_tag(tag: &str) -> TagKind<'_> {
    let inner = tag.trim_start_matches('<').trim_end_matches('>');
    if let Some(name) = inner.strip_prefix('/') {
        return match element_name(name) {
            "span" | "div" => TagKind::Close,
            _ => TagKind::Other,
        };
    }
    let name = element_name(inner);
    let block = match name {
        "div" => true,
        "span" => false,
        _ => return TagKind::Other,
    };
    let attrs = &inner[name.len()..];
    // `<spanx>` is a different element.
    if !attrs.is_empty() && !attrs.starts_with(char::is_whitespace) && !attrs.starts_with('/') {
        return TagKind::Other;
    }
    TagKind::Open {
        block,
        classes: class_attr(attrs)
            .map(|value| value.split_whitespace().collect())
            .unwrap_or_default(),
    }
}

fn element_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    &s[..end]
}

fn class_attr(attrs: &str) -> Option<&str> {
    let start = attrs.find("class=\"")? + "class=\"".len();
    let len = attrs[start..].find('"')?;
    Some(&attrs[start..start + len])
}

/// Converts highlighter markup into colour rows of a fixed width.
#[derive(Debug, Clone)]
pub struct MarkupRasterizer<'a> {
    table: &'a ColorTable,
    cols: usize,
    base: ColorScope,
}

impl<'a> MarkupRasterizer<'a> {
    pub fn new(table: &'a ColorTable, cols: usize, default_fg: &str, default_bg: &str) -> Self {
        let defaults = ColorScope {
            fg: default_fg.to_string(),
            bg: default_bg.to_string(),
        };
        let base = defaults.merged(table.get(UNKNOWN_LANG_CSS));
        Self { table, cols, base }
    }

    /// Rasterize every file, concatenating rows in file order then line order.
    pub fn rasterize<S: AsRef<str>>(&self, files: &[S]) -> Vec<Row> {
        files
            .iter()
            .flat_map(|markup| self.rasterize_file(markup.as_ref()))
            .collect()
    }

    /// Rasterize one file's markup.
    pub fn rasterize_file(&self, markup: &str) -> Vec<Row> {
        let mut stack = ScopeStack::new(self.base.clone());
        let mut rows = Vec::new();

        for raw in markup.lines() {
            let line = entities::decode(raw);
            let mut colors: Vec<Color> = Vec::new();

            for segment in segments(&line) {
                match segment {
                    Segment::Tag(tag) => self.apply_tag(&mut stack, tag),
                    Segment::Text(text) => {
                        let top = stack.top();
                        colors.extend(text.chars().map(|c| {
                            if c.is_whitespace() {
                                top.bg.clone()
                            } else {
                                top.fg.clone()
                            }
                        }));
                    }
                }
            }

            if line == FOOTER {
                continue;
            }
            rows.push(pad(colors, self.cols, &stack.base().bg));
        }
        rows
    }

    fn apply_tag(&self, stack: &mut ScopeStack, tag: &str) {
        match classify_tag(tag) {
            TagKind::Open { block, classes } => {
                let merged = classes
                    .iter()
                    .fold(stack.top().clone(), |scope, class| {
                        scope.merged(self.table.get(class))
                    });
                if block {
                    stack.set_base(merged.clone());
                }
                stack.push(merged);
            }
            TagKind::Close => stack.pop(),
            TagKind::Other => {}
        }
    }
}
