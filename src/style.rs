//! Inline `style` parsing and resolution into run/paragraph directives.

use crate::docx::{Alignment, Rgb, RunFormat};
use std::collections::BTreeMap;

// values in inches
pub const INDENT_STEP: f64 = 0.25;
pub const MAX_INDENT: f64 = 5.5;
// largest run size Word accepts (1638pt)
pub const MAX_FONT_HALF_POINTS: f64 = 3276.0;

/// Property name -> value, parsed from a `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclaration(BTreeMap<String, String>);

impl StyleDeclaration {
    /// Parses `key:value;key:value`. Whitespace is removed before splitting, and entries
    /// without a `:` are dropped.
    pub fn parse(raw: &str) -> Self {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let mut map = BTreeMap::new();
        for entry in compact.split(';') {
            match entry.split_once(':') {
                Some((key, value)) if !key.is_empty() => {
                    map.insert(key.to_ascii_lowercase(), value.to_string());
                }
                _ if entry.is_empty() => {}
                _ => log::debug!("ignoring malformed style entry {entry:?}"),
            }
        }
        StyleDeclaration(map)
    }

    pub fn from_attr(style: Option<&str>) -> Self {
        style.map(Self::parse).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The closed set of character effects a tag or declaration can contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Highlight,
    ColorOverride(Rgb),
}

/// Canonical effect of an inline-formatting tag.
pub fn tag_effect(tag: &str) -> Option<Effect> {
    match tag {
        "b" | "strong" | "th" => Some(Effect::Bold),
        "em" | "i" => Some(Effect::Italic),
        "u" => Some(Effect::Underline),
        "s" => Some(Effect::Strikethrough),
        "sup" => Some(Effect::Superscript),
        "sub" => Some(Effect::Subscript),
        _ => None,
    }
}

/// Tags that open a style frame. `span` carries only its inline style.
pub fn is_font_tag(tag: &str) -> bool {
    tag == "span" || tag_effect(tag).is_some()
}

/// Resolved character-level directives for one style frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStyle {
    pub effects: Vec<Effect>,
    /// Font size in points.
    pub size: Option<f64>,
}

impl RunStyle {
    /// Resolves a tag's canonical effect merged with its inline declaration.
    pub fn resolve(tag: &str, decl: &StyleDeclaration) -> Self {
        let mut style = RunStyle::from_declaration(decl);
        if let Some(effect) = tag_effect(tag) {
            style.add(effect);
        }
        style
    }

    pub fn from_declaration(decl: &StyleDeclaration) -> Self {
        let mut style = RunStyle::default();

        if let Some(rgb) = decl.get("color").and_then(parse_color) {
            style.add(Effect::ColorOverride(rgb));
        }
        if decl.get("background-color").is_some() {
            style.add(Effect::Highlight);
        }
        if let Some(size) = decl.get("font-size").and_then(leading_number) {
            if size > 0.0 {
                style.size = Some(size);
            }
        }
        if let Some(weight) = decl.get("font-weight") {
            let numeric_bold = weight.parse::<u32>().map(|w| w >= 600).unwrap_or(false);
            if weight.eq_ignore_ascii_case("bold") || numeric_bold {
                style.add(Effect::Bold);
            }
        }
        if decl
            .get("font-style")
            .is_some_and(|v| v.eq_ignore_ascii_case("italic"))
        {
            style.add(Effect::Italic);
        }
        if let Some(decoration) = decl.get("text-decoration") {
            let decoration = decoration.to_ascii_lowercase();
            if decoration.contains("underline") {
                style.add(Effect::Underline);
            }
            if decoration.contains("line-through") {
                style.add(Effect::Strikethrough);
            }
        }
        style
    }

    fn add(&mut self, effect: Effect) {
        if !self.effects.contains(&effect) {
            self.effects.push(effect);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.size.is_none()
    }

    /// Stamps this style onto a run. Flags are unioned; color and size only fill in when
    /// the run has none yet, so the innermost frame (flushed first) wins.
    pub fn apply(&self, format: &mut RunFormat) {
        for effect in &self.effects {
            match *effect {
                Effect::Bold => format.bold = true,
                Effect::Italic => format.italic = true,
                Effect::Underline => format.underline = true,
                Effect::Strikethrough => format.strike = true,
                Effect::Superscript => format.superscript = true,
                Effect::Subscript => format.subscript = true,
                Effect::Highlight => format.highlight = true,
                Effect::ColorOverride(rgb) => {
                    format.color.get_or_insert(rgb);
                }
            }
        }
        if let Some(size) = self.size {
            let half_points = (size * 2.0).round().min(MAX_FONT_HALF_POINTS);
            format.size_half_points.get_or_insert(half_points as u32);
        }
    }
}

/// Paragraph-level directives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockStyle {
    pub alignment: Option<Alignment>,
    /// Left indent in inches.
    pub left_indent: Option<f64>,
}

impl BlockStyle {
    pub fn from_declaration(decl: &StyleDeclaration) -> Self {
        let alignment = match decl.get("text-align") {
            Some("center") => Some(Alignment::Center),
            Some("right") => Some(Alignment::Right),
            Some("justify") => Some(Alignment::Justify),
            _ => None,
        };
        let left_indent = decl.get("margin-left").and_then(margin_to_indent);
        BlockStyle {
            alignment,
            left_indent,
        }
    }
}

/// `Npx` -> min(floor(N / 10) * 0.25in, 5.5in). Other units are not converted.
pub fn margin_to_indent(value: &str) -> Option<f64> {
    let units: String = value
        .chars()
        .filter(|c| !c.is_ascii_digit() && *c != '.' && *c != '-')
        .collect();
    let amount = leading_number(value)?;
    if units != "px" {
        log::debug!("margin-left unit {units:?} is not converted");
        return None;
    }
    let steps = (amount / 10.0).floor().max(0.0);
    Some((steps * INDENT_STEP).min(MAX_INDENT))
}

/// `rgb(r, g, b)` or `#rrggbb`.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(Rgb(channel(0)?, channel(2)?, channel(4)?));
    }

    let inner: String = value
        .chars()
        .filter(|c| !c.is_ascii_alphabetic() && *c != '(' && *c != ')')
        .collect();
    let channels: Vec<u8> = inner
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0) as u8))
        .collect::<Option<Vec<_>>>()?;
    match channels.as_slice() {
        [r, g, b] | [r, g, b, _] => Some(Rgb(*r, *g, *b)),
        _ => None,
    }
}

fn leading_number(value: &str) -> Option<f64> {
    let end = value
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (c == '-' && i == 0)))
        .map(|(i, _)| i)
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drops_malformed_entries() {
        let decl = StyleDeclaration::parse("color: rgb(1, 2, 3); bogus; font-size:12px;");
        assert_eq!(decl.get("color"), Some("rgb(1,2,3)"));
        assert_eq!(decl.get("font-size"), Some("12px"));
        assert_eq!(decl.get("bogus"), None);
    }

    #[test]
    fn test_margin_left_px() {
        assert_eq!(margin_to_indent("100px"), Some(2.5));
        assert_eq!(margin_to_indent("105px"), Some(2.5));
        assert_eq!(margin_to_indent("9px"), Some(0.0));
        assert_eq!(margin_to_indent("1000px"), Some(MAX_INDENT));
        assert_eq!(margin_to_indent("2em"), None);
    }

    #[test]
    fn test_block_style() {
        let decl = StyleDeclaration::parse("text-align:center;margin-left:40px");
        let block = BlockStyle::from_declaration(&decl);
        assert_eq!(block.alignment, Some(Alignment::Center));
        assert_eq!(block.left_indent, Some(1.0));

        let left = BlockStyle::from_declaration(&StyleDeclaration::parse("text-align:left"));
        assert_eq!(left.alignment, None);
    }

    #[test]
    fn test_tag_merged_with_inline_style() {
        let decl = StyleDeclaration::parse("color:rgb(255,0,0);text-decoration:underline");
        let style = RunStyle::resolve("b", &decl);
        assert!(style.effects.contains(&Effect::Bold));
        assert!(style.effects.contains(&Effect::Underline));
        assert!(style.effects.contains(&Effect::ColorOverride(Rgb(255, 0, 0))));
    }

    #[test]
    fn test_unknown_properties_ignored() {
        let style = RunStyle::from_declaration(&StyleDeclaration::parse("float:left;zoom:2"));
        assert!(style.is_empty());
    }

    #[test]
    fn test_apply_inner_color_wins() {
        let mut format = RunFormat::default();
        let inner = RunStyle::from_declaration(&StyleDeclaration::parse("color:#0000ff"));
        let outer = RunStyle::from_declaration(&StyleDeclaration::parse(
            "color:rgb(255,0,0);background-color:yellow;font-size:13px",
        ));
        inner.apply(&mut format);
        outer.apply(&mut format);
        assert_eq!(format.color, Some(Rgb(0, 0, 255)));
        assert!(format.highlight);
        assert_eq!(format.size_half_points, Some(26));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("rgb(10,20,30)"), Some(Rgb(10, 20, 30)));
        assert_eq!(parse_color("rgba(10,20,30,0.5)"), Some(Rgb(10, 20, 30)));
        assert_eq!(parse_color("#FF8000"), Some(Rgb(255, 128, 0)));
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#aé123"), None);
        assert_eq!(parse_color("#12345g"), None);
    }

    #[test]
    fn test_font_size_clamped() {
        let mut format = RunFormat::default();
        RunStyle::from_declaration(&StyleDeclaration::parse("font-size:99999999999px"))
            .apply(&mut format);
        assert_eq!(format.size_half_points, Some(3276));
    }

    #[test]
    fn test_subscript_tag() {
        let mut format = RunFormat::default();
        RunStyle::resolve("sub", &StyleDeclaration::default()).apply(&mut format);
        assert!(format.subscript);
        assert!(!format.superscript);
    }

    #[test]
    fn test_inline_weight_style_and_decoration() {
        let decl = StyleDeclaration::parse(
            "font-weight:bold;font-style:italic;text-decoration:line-through",
        );
        let mut format = RunFormat::default();
        RunStyle::resolve("span", &decl).apply(&mut format);
        assert!(format.bold && format.italic && format.strike);
        assert!(!format.underline);

        let mut heavy = RunFormat::default();
        RunStyle::from_declaration(&StyleDeclaration::parse("font-weight:700")).apply(&mut heavy);
        assert!(heavy.bold);
    }
}
