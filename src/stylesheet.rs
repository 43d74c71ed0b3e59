//! Colour tables parsed from highlighter stylesheets.
//!
//! A [`ColorTable`] maps a CSS class name to the foreground and background
//! colours declared for it. Two stylesheets feed it:
//!
//! - the highlighter theme (`pygmentize -S <style> -f html`), and
//! - a synthetic stylesheet generated from the language table, one
//!   `.lang-<alias> { <property>: #<colour> }` rule per language and property.
//!
//! The combined table is the theme overlaid on the language table: a class
//! defined by the theme replaces the language entry outright.
//!
//! ## Grammar
//!
//! Parsing is line-oriented and tolerant. A line contributes only if it starts
//! with `.<class> {`; within it, `color: #hex` sets the foreground and
//! `background-color: #hex` the background. Later lines for the same class
//! overwrite only the fields they declare. Everything else is ignored.

use crate::config::CssProperty;
use crate::types::{Color, Language, UNKNOWN_LANG_CSS, lang_css};
use std::collections::HashMap;

/// Colours declared for one CSS class. Absent fields inherit from the
/// enclosing scope during rasterization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorRule {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
}

/// Class name → declared colours.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    rules: HashMap<String, ColorRule>,
}

impl ColorTable {
    /// Parse stylesheet text into a table. Malformed lines are skipped.
    pub fn parse(css: &str) -> Self {
        let mut rules: HashMap<String, ColorRule> = HashMap::new();
        for line in css.lines() {
            let Some(class) = rule_class(line) else {
                continue;
            };
            let rule = rules.entry(class.to_string()).or_default();
            if let Some(fg) = declared_color(line, " color:") {
                rule.fg = Some(fg);
            }
            if let Some(bg) = declared_color(line, " background-color:") {
                rule.bg = Some(bg);
            }
        }
        Self { rules }
    }

    pub fn get(&self, class: &str) -> Option<&ColorRule> {
        self.rules.get(class)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Lay `self` over `base`: classes defined here replace those in `base`.
    pub fn overlay(self, base: ColorTable) -> ColorTable {
        let mut rules = base.rules;
        rules.extend(self.rules);
        ColorTable { rules }
    }
}

/// Extract `<class>` from a line starting with `.<class> {`.
fn rule_class(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('.')?;
    let end = rest.find(char::is_whitespace)?;
    if end == 0 || !rest[end..].starts_with(" {") {
        return None;
    }
    Some(&rest[..end])
}

/// Find `<property> #hex` in a line and normalise the colour.
///
/// The leading space in `property` keeps ` color:` from matching inside
/// `background-color:`.
fn declared_color(line: &str, property: &str) -> Option<Color> {
    let start = line.find(property)? + property.len();
    let value = line[start..].trim_start().strip_prefix('#')?;
    let len = value
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(value.len());
    normalize_hex(&value[..len])
}

/// Lower-case a hex colour, expanding `rgb` shorthand to `rrggbb`.
///
/// Returns `None` for anything that is not 3, 6 or 8 hex digits.
pub fn normalize_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => Some(
            hex.chars()
                .flat_map(|c| [c, c])
                .collect::<String>()
                .to_ascii_lowercase(),
        ),
        6 | 8 => Some(hex.to_ascii_lowercase()),
        _ => None,
    }
}

/// Generate the synthetic per-language stylesheet.
///
/// Every language with a colour gets one declaration per requested property;
/// `lang-unknown` is painted with `unknown_color` (the run's default
/// background, so files of unknown language fade into the canvas).
pub fn language_css(languages: &[Language], props: &[CssProperty], unknown_color: &str) -> String {
    let mut classes: Vec<(String, String)> = languages
        .iter()
        .filter_map(|lang| {
            let color = lang.color.as_ref()?;
            Some((lang_css(Some(lang)), color.clone()))
        })
        .collect();
    classes.push((UNKNOWN_LANG_CSS.to_string(), format!("#{unknown_color}")));

    let mut css = String::new();
    for (class, color) in &classes {
        for prop in props {
            css.push_str(&format!(".{} {{ {}: {} }}\n", class, prop.as_css(), color));
        }
    }
    css
}

/// Build the run's colour table: theme rules over language rules.
pub fn build_color_table(
    theme_css: Option<&str>,
    languages: &[Language],
    props: &[CssProperty],
    unknown_color: &str,
) -> ColorTable {
    let lang_table = if props.is_empty() {
        ColorTable::default()
    } else {
        ColorTable::parse(&language_css(languages, props, unknown_color))
    };
    match theme_css {
        Some(css) => ColorTable::parse(css).overlay(lang_table),
        None => lang_table,
    }
}
