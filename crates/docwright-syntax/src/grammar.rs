//! Grammars: ordered lexical rules that classify spans of text.
//!
//! A grammar is a list of regex rules tried in order at every position of
//! the input. The first rule that matches a non-empty span wins; text that
//! no rule claims is given the grammar's fallback class. Because rules are
//! anchored at the current position and unmatched text is still emitted,
//! tokenization never drops or duplicates characters.
//!
//! A rule may name a class per capture group. The groups of a match are
//! emitted as separate tokens and the text between them takes the rule's
//! own class.
//!
//! Patterns are compiled without multi-line mode, so `^` and `$` refer to
//! the current position and the end of input. Rules that should only fire
//! at the beginning of a line set `line_start` instead. A line starts after
//! any of the terminators the text buffer splits lines on.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

use crate::tokenizer::Tokens;
use crate::{SyntaxError, SyntaxResult};

/// Index of a token class inside its grammar.
pub type ClassId = usize;

/// A compiled lexical rule.
#[derive(Debug, Clone)]
struct Rule {
    regex: Regex,
    class: ClassId,
    /// Classes of capture groups 1..=n
    groups: Vec<ClassId>,
    line_start: bool,
}

/// A rule that matched at some position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RuleMatch {
    /// Matched length in bytes
    pub len: usize,
    rule: usize,
}

/// A compiled grammar.
///
/// Token classes are interned when the grammar is built, so the set of
/// classes a grammar can emit is known up front and can be checked against
/// a theme before any text is highlighted.
#[derive(Debug, Clone)]
pub struct Grammar {
    name: String,
    aliases: Vec<String>,
    extensions: Vec<String>,
    classes: Vec<String>,
    fallback: ClassId,
    rules: Vec<Rule>,
}

impl Grammar {
    /// Compiles a grammar from its declarative form.
    pub fn compile(spec: &GrammarSpec) -> SyntaxResult<Self> {
        let mut classes = vec![spec.fallback.clone()];
        let mut rules = Vec::with_capacity(spec.rules.len());

        for rule in &spec.rules {
            let regex = Regex::new(&format!(r"\A(?:{})", rule.pattern)).map_err(|source| {
                SyntaxError::InvalidPattern {
                    grammar: spec.name.clone(),
                    pattern: rule.pattern.clone(),
                    source,
                }
            })?;
            let captures = regex.captures_len() - 1;
            if rule.groups.len() > captures {
                return Err(SyntaxError::GroupCount {
                    grammar: spec.name.clone(),
                    pattern: rule.pattern.clone(),
                    groups: rule.groups.len(),
                    captures,
                });
            }
            rules.push(Rule {
                regex,
                class: intern(&mut classes, &rule.class),
                groups: rule.groups.iter().map(|g| intern(&mut classes, g)).collect(),
                line_start: rule.line_start,
            });
        }

        tracing::debug!(
            grammar = %spec.name,
            rules = rules.len(),
            classes = classes.len(),
            "compiled grammar"
        );

        Ok(Self {
            name: spec.name.clone(),
            aliases: spec.aliases.clone(),
            extensions: spec.extensions.clone(),
            classes,
            fallback: 0,
            rules,
        })
    }

    /// Loads and compiles a grammar definition from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> SyntaxResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::compile(&GrammarSpec::from_toml(&content)?)
    }

    /// Returns the canonical grammar name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns alternative names this grammar answers to.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns the file extensions associated with this grammar.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Returns true if `name` is the grammar name or one of its aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Every token class this grammar can emit, indexed by [`ClassId`].
    pub fn token_classes(&self) -> &[String] {
        &self.classes
    }

    /// Returns the name of a class id.
    pub fn class_name(&self, id: ClassId) -> &str {
        &self.classes[id]
    }

    /// Returns the class given to text no rule matches.
    pub fn fallback_class(&self) -> ClassId {
        self.fallback
    }

    /// Tokenizes `text` lazily.
    ///
    /// Each call starts from the beginning; the returned iterator cannot be
    /// rewound.
    pub fn tokenize<'g, 't>(&'g self, text: &'t str) -> Tokens<'g, 't> {
        Tokens::new(self, text)
    }

    /// Tries every rule at byte offset `pos`.
    pub(crate) fn match_at(&self, text: &str, pos: usize) -> Option<RuleMatch> {
        let at_line_start = is_line_start(text, pos);
        let rest = &text[pos..];

        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| at_line_start || !rule.line_start)
            .find_map(|(index, rule)| match rule.regex.find(rest) {
                Some(m) if m.end() > 0 => Some(RuleMatch {
                    len: m.end(),
                    rule: index,
                }),
                _ => None,
            })
    }

    /// Splits a match at `pos` into `(start, end, class)` byte spans.
    pub(crate) fn split_match(
        &self,
        text: &str,
        pos: usize,
        found: RuleMatch,
        spans: &mut VecDeque<(usize, usize, ClassId)>,
    ) {
        let rule = &self.rules[found.rule];
        let end = pos + found.len;
        let captures = if rule.groups.is_empty() {
            None
        } else {
            rule.regex.captures(&text[pos..])
        };
        let Some(captures) = captures else {
            spans.push_back((pos, end, rule.class));
            return;
        };

        let mut cursor = pos;
        for (i, &class) in rule.groups.iter().enumerate() {
            let Some(group) = captures.get(i + 1) else {
                continue;
            };
            let (start, stop) = (pos + group.start(), pos + group.end());
            // Empty and nested groups add nothing.
            if start < cursor || start == stop {
                continue;
            }
            if start > cursor {
                spans.push_back((cursor, start, rule.class));
            }
            spans.push_back((start, stop, class));
            cursor = stop;
        }
        if cursor < end {
            spans.push_back((cursor, end, rule.class));
        }
    }
}

fn intern(classes: &mut Vec<String>, class: &str) -> ClassId {
    match classes.iter().position(|c| c == class) {
        Some(id) => id,
        None => {
            classes.push(class.to_string());
            classes.len() - 1
        }
    }
}

/// Returns true if byte offset `pos` begins a line.
///
/// `\r\n` counts as one terminator, so the position between its two
/// characters is not a line start.
fn is_line_start(text: &str, pos: usize) -> bool {
    match text[..pos].chars().next_back() {
        None => true,
        Some('\r') => !text[pos..].starts_with('\n'),
        Some(c) => matches!(c, '\n' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'),
    }
}

/// Declarative grammar definition, as written in grammar TOML files.
///
/// ```toml
/// name = "notes"
/// aliases = ["nt"]
/// extensions = ["notes"]
/// fallback = "text.plain"
///
/// [[rules]]
/// pattern = "#[^\n]*"
/// class = "comment.heading"
/// line_start = true
///
/// [[rules]]
/// pattern = "(@)([a-z]+)"
/// class = "text.plain"
/// groups = ["punctuation", "name.tag"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

fn default_fallback() -> String {
    "text".to_string()
}

/// One rule of a [`GrammarSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub class: String,
    #[serde(default)]
    pub line_start: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}

impl GrammarSpec {
    /// Starts an empty grammar definition.
    pub fn new(name: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            extensions: Vec::new(),
            fallback: fallback.into(),
            rules: Vec::new(),
        }
    }

    /// Parses a definition from TOML.
    pub fn from_toml(content: &str) -> SyntaxResult<Self> {
        toml::from_str(content).map_err(SyntaxError::GrammarParse)
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into());
        self
    }

    /// Adds a rule that may match anywhere.
    pub fn rule(self, pattern: impl Into<String>, class: impl Into<String>) -> Self {
        self.push_rule(pattern.into(), class.into(), false)
    }

    /// Adds a rule that only matches at the beginning of a line.
    pub fn line_rule(self, pattern: impl Into<String>, class: impl Into<String>) -> Self {
        self.push_rule(pattern.into(), class.into(), true)
    }

    /// Names the classes of the capture groups of the last added rule.
    pub fn groups<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(rule) = self.rules.last_mut() {
            rule.groups = classes.into_iter().map(Into::into).collect();
        }
        self
    }

    fn push_rule(mut self, pattern: String, class: String, line_start: bool) -> Self {
        self.rules.push(RuleSpec {
            pattern,
            class,
            line_start,
            groups: Vec::new(),
        });
        self
    }

    /// Compiles this definition.
    pub fn build(&self) -> SyntaxResult<Grammar> {
        Grammar::compile(self)
    }
}

/// reStructuredText.
pub fn restructured_text() -> GrammarSpec {
    // Every line terminator the text buffer splits on.
    const BREAKS: &str = r"\n\r\x0B\x0C\x{85}\x{2028}\x{2029}";
    const ADORNMENT: &str =
        r#"(?:={3,}|-{3,}|~{3,}|\^{3,}|\*{3,}|#{3,}|\+{3,}|"{3,}|'{3,}|`{3,}|:{3,}|_{3,})"#;

    let newline = format!(r"(?:\r\n|[{BREAKS}])");
    let eol = format!(r"(?:{newline}|\z)");
    let line = format!("[^{BREAKS}]");
    // Indented and blank lines, captured as one group.
    let body = format!(r"((?:[ \t]+{line}*{eol}|[ \t]*{newline})*)");

    GrammarSpec::new("rst", "text")
        .alias("restructuredtext")
        .alias("rest")
        .extension("rst")
        .extension("rest")
        // Section title with its underline, then a bare adornment (overline).
        .line_rule(
            format!(r"[^ \t{BREAKS}]{line}*{newline}{ADORNMENT}[ \t]*{eol}"),
            "generic.heading",
        )
        .line_rule(format!(r"{ADORNMENT}[ \t]*{eol}"), "generic.heading")
        // Explicit markup.
        .line_rule(
            format!(r"(\.\. (?:code-block|sourcecode|code)::){line}*{newline}{body}"),
            "text",
        )
        .groups(["keyword.directive", "literal.block"])
        .line_rule(r"\.\. [A-Za-z0-9_.:+-]+?::", "keyword.directive")
        .line_rule(format!(r"\.\. _[^:{BREAKS}]*:"), "name.label")
        .line_rule(format!(r"\.\. \[[^\]{BREAKS}]+\]"), "name.footnote")
        .line_rule(format!(r"\.\. \|[^|{BREAKS}]+\|"), "name.substitution")
        .line_rule(format!(r"\.\.(?:[ \t]{line}*|[ \t]*{eol})"), "comment")
        // Lists and fields.
        .line_rule(
            r"[ \t]*(?:[-*+•‣⁃]|\d+[.)]|#\.|[A-Za-z][.)]|\(\d+\))[ \t]+",
            "punctuation.bullet",
        )
        .line_rule(
            format!(r":[A-Za-z0-9][^:{BREAKS}]*:(?:[ \t]+|{eol})"),
            "name.field",
        )
        .line_rule(format!(">>>{line}*"), "generic.prompt")
        // Literal block after a paragraph ending in `::`.
        .rule(format!(r"(::)[ \t]*{newline}[ \t]*{newline}{body}"), "text")
        .groups(["punctuation.literal_marker", "literal.block"])
        // Inline markup.
        .rule(format!(r"``[^`{BREAKS}]+``"), "literal.inline")
        .rule(
            format!(r":[A-Za-z0-9_.+-]+(?::[A-Za-z0-9_.+-]+)*:`[^`{BREAKS}]+`"),
            "name.role",
        )
        .rule(format!(r"`[^`{BREAKS}]+`__?"), "name.reference")
        .rule(format!(r"`[^`{BREAKS}]+`"), "name.interpreted")
        .rule(r"\[[0-9#*][A-Za-z0-9_-]*\]_", "name.footnote")
        .rule(format!(r"\*\*[^*{BREAKS}]+\*\*"), "generic.strong")
        .rule(format!(r"\*[^*{BREAKS}]+\*"), "generic.emphasis")
        .rule(format!(r"\|[^|{BREAKS}]+\|_{{0,2}}"), "name.substitution")
        .rule(r"https?://[^\s<>`]+", "literal.url")
        .rule(format!(r"::[ \t]*{eol}"), "punctuation.literal_marker")
}

/// Plain text: everything is one class.
pub fn plain_text() -> GrammarSpec {
    GrammarSpec::new("text", "text")
        .alias("plain")
        .alias("txt")
        .extension("txt")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes_of<'a>(grammar: &'a Grammar, text: &'a str) -> Vec<(&'a str, &'a str)> {
        grammar.tokenize(text).map(|t| (t.class, t.text)).collect()
    }

    #[test]
    fn test_class_interning() {
        let grammar = GrammarSpec::new("g", "text")
            .rule("a+", "letter")
            .rule("b+", "letter")
            .rule("[0-9]+", "digit")
            .build()
            .unwrap();

        assert_eq!(grammar.token_classes(), &["text", "letter", "digit"]);
        assert_eq!(grammar.fallback_class(), 0);
        assert_eq!(grammar.class_name(2), "digit");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = GrammarSpec::new("broken", "text")
            .rule("(unclosed", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, SyntaxError::InvalidPattern { .. }));
    }

    #[test]
    fn test_answers_to_aliases() {
        let grammar = restructured_text().build().unwrap();
        assert!(grammar.answers_to("rst"));
        assert!(grammar.answers_to("ReStructuredText"));
        assert!(!grammar.answers_to("markdown"));
    }

    #[test]
    fn test_rst_heading_and_directive() {
        let grammar = restructured_text().build().unwrap();
        let tokens = classes_of(&grammar, "Title\n=====\n\n.. note::\n   Careful.\n");

        assert_eq!(tokens[0], ("generic.heading", "Title\n=====\n"));
        assert!(tokens.contains(&("keyword.directive", ".. note::")));
    }

    #[test]
    fn test_rst_overlined_title() {
        let grammar = restructured_text().build().unwrap();
        let tokens = classes_of(&grammar, "=====\nTitle\n=====\n\nBody\n");

        assert_eq!(tokens[0], ("generic.heading", "=====\n"));
        assert_eq!(tokens[1], ("generic.heading", "Title\n=====\n"));
        assert_eq!(tokens[2], ("text", "\nBody\n"));
    }

    #[test]
    fn test_rst_crlf_title() {
        let grammar = restructured_text().build().unwrap();
        let tokens = classes_of(&grammar, "Intro\r\n-----\r\n- item\r\n");

        assert_eq!(tokens[0], ("generic.heading", "Intro\r\n-----\r\n"));
        assert_eq!(tokens[1], ("punctuation.bullet", "- "));
    }

    #[test]
    fn test_rst_literal_block() {
        let grammar = restructured_text().build().unwrap();
        let tokens = classes_of(&grammar, "Example::\n\n   make html\n   open it\n\nAfter\n");

        assert_eq!(
            tokens,
            vec![
                ("text", "Example"),
                ("punctuation.literal_marker", "::"),
                ("text", "\n\n"),
                ("literal.block", "   make html\n   open it\n\n"),
                ("text", "After\n"),
            ]
        );
    }

    #[test]
    fn test_rst_marker_without_block() {
        let grammar = restructured_text().build().unwrap();
        let tokens = classes_of(&grammar, "See below::");
        assert_eq!(tokens[1], ("punctuation.literal_marker", "::"));
    }

    #[test]
    fn test_rst_code_block_body() {
        let grammar = restructured_text().build().unwrap();
        let tokens = classes_of(&grammar, ".. code-block:: python\n\n   print(1)\n\nDone\n");

        assert_eq!(tokens[0], ("keyword.directive", ".. code-block::"));
        assert_eq!(tokens[1], ("text", " python\n"));
        assert_eq!(tokens[2], ("literal.block", "\n   print(1)\n\n"));
        assert_eq!(tokens[3], ("text", "Done\n"));
    }

    #[test]
    fn test_rst_classes_are_known_up_front() {
        let grammar = restructured_text().build().unwrap();
        for class in ["literal.block", "punctuation.literal_marker", "generic.heading"] {
            assert!(grammar.token_classes().iter().any(|c| c == class), "{class}");
        }
    }

    #[test]
    fn test_too_many_groups() {
        let err = GrammarSpec::new("g", "text")
            .rule("(a)b", "x")
            .groups(["one", "two"])
            .build()
            .unwrap_err();
        assert!(matches!(err, SyntaxError::GroupCount { groups: 2, captures: 1, .. }));
    }

    #[test]
    fn test_rst_inline_markup() {
        let grammar = restructured_text().build().unwrap();
        let tokens = classes_of(&grammar, "Use ``make html`` and see :ref:`intro` **now**.");

        assert!(tokens.contains(&("literal.inline", "``make html``")));
        assert!(tokens.contains(&("name.role", ":ref:`intro`")));
        assert!(tokens.contains(&("generic.strong", "**now**")));
    }

    #[test]
    fn test_rst_comment_and_target() {
        let grammar = restructured_text().build().unwrap();
        let tokens = classes_of(&grammar, ".. _intro:\n\n.. a comment\n");

        assert_eq!(tokens[0], ("name.label", ".. _intro:"));
        assert!(tokens.contains(&("comment", ".. a comment")));
    }

    #[test]
    fn test_line_start_rules_only_fire_at_line_start() {
        let grammar = restructured_text().build().unwrap();
        let tokens = classes_of(&grammar, "not a - bullet\n- bullet\n");

        let bullets: Vec<_> = tokens
            .iter()
            .filter(|(class, _)| *class == "punctuation.bullet")
            .collect();
        assert_eq!(bullets, vec![&("punctuation.bullet", "- ")]);
    }

    #[test]
    fn test_spec_from_toml() {
        let spec = GrammarSpec::from_toml(
            r##"
            name = "notes"
            aliases = ["nt"]
            fallback = "text.plain"

            [[rules]]
            pattern = '#[^\n]*'
            class = "comment.heading"
            line_start = true
            "##,
        )
        .unwrap();

        assert_eq!(spec.name, "notes");
        assert_eq!(spec.rules.len(), 1);
        assert!(spec.rules[0].line_start);

        let grammar = spec.build().unwrap();
        assert_eq!(grammar.token_classes(), &["text.plain", "comment.heading"]);

        let spec = GrammarSpec::from_toml(
            r#"
            name = "tags"
            [[rules]]
            pattern = '(@)([a-z]+)'
            class = "text"
            groups = ["punctuation", "name.tag"]
            "#,
        )
        .unwrap();
        assert_eq!(spec.rules[0].groups, vec!["punctuation", "name.tag"]);
        assert_eq!(spec.build().unwrap().token_classes(), &["text", "punctuation", "name.tag"]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ini.toml");
        std::fs::write(
            &path,
            "name = \"ini\"\n[[rules]]\npattern = '\\[[^\\]\\n]*\\]'\nclass = \"keyword.section\"\nline_start = true\n",
        )
        .unwrap();

        let grammar = Grammar::load(&path).unwrap();
        assert_eq!(grammar.name(), "ini");
        assert_eq!(grammar.token_classes(), &["text", "keyword.section"]);
    }
}
