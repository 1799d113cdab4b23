/// Spintext template grammar — token types and parsing.
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// How a placeholder was written in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderKind {
    /// `{keyword}`
    Bare,
    /// `{location(city_name)}`
    Location,
}

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateSegment {
    /// Literal text, emitted as-is. Malformed brace spans end up here too.
    Literal(String),
    /// Alternation group: `{Call|Contact|Reach}`.
    Alternation { raw: String, options: Vec<String> },
    /// Context lookup: `{keyword}` or `{location(city_name)}`.
    Placeholder {
        raw: String,
        name: String,
        kind: PlaceholderKind,
    },
}

impl TemplateSegment {
    /// The exact source text this segment was parsed from.
    pub fn raw(&self) -> &str {
        match self {
            Self::Literal(text) => text,
            Self::Alternation { raw, .. } | Self::Placeholder { raw, .. } => raw,
        }
    }

    pub fn is_token(&self) -> bool {
        !matches!(self, Self::Literal(_))
    }
}

/// A parsed template — a sequence of segments whose raw text
/// concatenates back to the original input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Template {
    pub segments: Vec<TemplateSegment>,
}

impl Template {
    /// Parse a template string into a sequence of segments.
    ///
    /// Syntax:
    /// - `{a|b|c}` → `Alternation` (split on `|`)
    /// - `{location(field)}` → `Placeholder` of kind `Location`
    /// - `{name}` → `Placeholder` of kind `Bare`, name trimmed
    /// - Everything else → `Literal`
    ///
    /// Parsing never fails. An unterminated `{`, empty braces, an
    /// alternation with only empty options, or a `{` directly followed
    /// by another `{` before any `}` is kept as literal text.
    pub fn parse(input: &str) -> Template {
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut cursor = 0;

        while let Some(offset) = input[cursor..].find('{') {
            let open = cursor + offset;
            let body_start = open + 1;
            let rest = &input[body_start..];

            let close = match rest.find(['{', '}']) {
                Some(pos) if rest.as_bytes()[pos] == b'}' => body_start + pos,
                Some(pos) => {
                    // Inner `{` before any `}`: the outer brace is literal.
                    cursor = body_start + pos;
                    continue;
                }
                None => {
                    trace!(position = open, "unterminated brace kept as literal");
                    break;
                }
            };

            let raw = &input[open..=close];
            match classify(&input[body_start..close], raw) {
                Some(segment) => {
                    if literal_start < open {
                        segments.push(TemplateSegment::Literal(
                            input[literal_start..open].to_string(),
                        ));
                    }
                    segments.push(segment);
                    literal_start = close + 1;
                }
                None => trace!(span = raw, "malformed token kept as literal"),
            }
            cursor = close + 1;
        }

        if literal_start < input.len() {
            segments.push(TemplateSegment::Literal(input[literal_start..].to_string()));
        }

        Template { segments }
    }

    /// Reconstruct the original template text.
    pub fn source(&self) -> String {
        self.segments.iter().map(TemplateSegment::raw).collect()
    }

    /// True when the template contains no tokens at all.
    pub fn is_literal(&self) -> bool {
        !self.segments.iter().any(TemplateSegment::is_token)
    }

    /// Iterate over the token segments, skipping literals.
    pub fn tokens(&self) -> impl Iterator<Item = &TemplateSegment> {
        self.segments.iter().filter(|s| s.is_token())
    }

    /// Placeholder names referenced by this template, in order.
    pub fn placeholders(&self) -> impl Iterator<Item = (&str, PlaceholderKind)> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Placeholder { name, kind, .. } => Some((name.as_str(), *kind)),
            _ => None,
        })
    }

    /// Option lists of every alternation group, in order.
    pub fn alternations(&self) -> impl Iterator<Item = &[String]> {
        self.segments.iter().filter_map(|s| match s {
            TemplateSegment::Alternation { options, .. } => Some(options.as_slice()),
            _ => None,
        })
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            f.write_str(segment.raw())?;
        }
        Ok(())
    }
}

impl From<&str> for Template {
    fn from(input: &str) -> Self {
        Template::parse(input)
    }
}

fn classify(content: &str, raw: &str) -> Option<TemplateSegment> {
    if content.contains('|') {
        let options: Vec<String> = content.split('|').map(str::to_string).collect();
        if options.iter().all(|o| o.trim().is_empty()) {
            return None;
        }
        return Some(TemplateSegment::Alternation {
            raw: raw.to_string(),
            options,
        });
    }

    let name = content.trim();
    if name.is_empty() {
        return None;
    }

    if let Some(field) = location_field(name) {
        return Some(TemplateSegment::Placeholder {
            raw: raw.to_string(),
            name: field.to_string(),
            kind: PlaceholderKind::Location,
        });
    }

    Some(TemplateSegment::Placeholder {
        raw: raw.to_string(),
        name: name.to_string(),
        kind: PlaceholderKind::Bare,
    })
}

/// Extract `field` from `location(field)`, tolerating inner whitespace.
fn location_field(content: &str) -> Option<&str> {
    let field = content
        .strip_prefix("location")?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?
        .trim();
    is_identifier(field).then_some(field)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(s: &str) -> TemplateSegment {
        TemplateSegment::Literal(s.to_string())
    }

    #[test]
    fn parse_literal_only() {
        let t = Template::parse("Hello, world.");
        assert_eq!(t.segments, vec![literal("Hello, world.")]);
        assert!(t.is_literal());
    }

    #[test]
    fn parse_empty_input() {
        let t = Template::parse("");
        assert!(t.segments.is_empty());
        assert_eq!(t.source(), "");
    }

    #[test]
    fn parse_alternation() {
        let t = Template::parse("{Call|Contact|Reach} us today");
        assert_eq!(t.segments.len(), 2);
        assert_eq!(
            t.segments[0],
            TemplateSegment::Alternation {
                raw: "{Call|Contact|Reach}".to_string(),
                options: vec![
                    "Call".to_string(),
                    "Contact".to_string(),
                    "Reach".to_string()
                ],
            }
        );
        assert_eq!(t.segments[1], literal(" us today"));
    }

    #[test]
    fn alternation_keeps_empty_and_spaced_options() {
        let t = Template::parse("{very |}good");
        let options: Vec<&[String]> = t.alternations().collect();
        assert_eq!(options, vec![&["very ".to_string(), String::new()][..]]);
    }

    #[test]
    fn parse_bare_placeholder_trims_name() {
        let t = Template::parse("Rent a { keyword } now");
        assert_eq!(
            t.segments[1],
            TemplateSegment::Placeholder {
                raw: "{ keyword }".to_string(),
                name: "keyword".to_string(),
                kind: PlaceholderKind::Bare,
            }
        );
    }

    #[test]
    fn parse_location_placeholder() {
        let t = Template::parse("Serving {location(city_name)} and {location( region_name )}");
        let names: Vec<_> = t.placeholders().collect();
        assert_eq!(
            names,
            vec![
                ("city_name", PlaceholderKind::Location),
                ("region_name", PlaceholderKind::Location),
            ]
        );
    }

    #[test]
    fn malformed_location_call_is_bare_placeholder() {
        let t = Template::parse("{location(two words)}");
        let names: Vec<_> = t.placeholders().collect();
        assert_eq!(names, vec![("location(two words)", PlaceholderKind::Bare)]);
    }

    #[test]
    fn unterminated_brace_is_literal() {
        let t = Template::parse("Hello {unterminated");
        assert_eq!(t.segments, vec![literal("Hello {unterminated")]);
    }

    #[test]
    fn empty_braces_are_literal() {
        let t = Template::parse("Bad {} and {   } here");
        assert_eq!(t.segments, vec![literal("Bad {} and {   } here")]);
    }

    #[test]
    fn empty_alternation_is_literal() {
        let t = Template::parse("x{|}y{ | }z");
        assert!(t.is_literal());
        assert_eq!(t.source(), "x{|}y{ | }z");
    }

    #[test]
    fn nested_open_brace_restarts_scan() {
        let t = Template::parse("{outer{inner}}");
        assert_eq!(
            t.segments,
            vec![
                literal("{outer"),
                TemplateSegment::Placeholder {
                    raw: "{inner}".to_string(),
                    name: "inner".to_string(),
                    kind: PlaceholderKind::Bare,
                },
                literal("}"),
            ]
        );
    }

    #[test]
    fn stray_closing_brace_is_literal() {
        let t = Template::parse("a } b");
        assert_eq!(t.segments, vec![literal("a } b")]);
    }

    #[test]
    fn source_reconstructs_mixed_input() {
        let input = "{Rent|Hire} a {keyword} in {location(city_name)} {oops {|} }";
        let t = Template::parse(input);
        assert_eq!(t.source(), input);
        assert_eq!(t.to_string(), input);
        assert_eq!(t.tokens().count(), 3);
    }

    #[test]
    fn multibyte_text_around_tokens() {
        let input = "Café {niño|señor} — {ciudad}";
        let t = Template::parse(input);
        assert_eq!(t.source(), input);
        assert_eq!(t.tokens().count(), 2);
    }

    #[test]
    fn ron_round_trip() {
        let t = Template::parse("{Call|Contact} {keyword}");
        let serialized = ron::to_string(&t).unwrap();
        let deserialized: Template = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized, t);
    }
}
