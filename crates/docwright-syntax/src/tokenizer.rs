//! Lazy tokenization of a text snapshot.

use std::collections::VecDeque;

use crate::grammar::{ClassId, Grammar};

/// A classified span of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'g, 't> {
    pub class_id: ClassId,
    pub class: &'g str,
    pub text: &'t str,
}

impl Token<'_, '_> {
    /// Length of the token in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Iterator over the tokens of one text snapshot.
///
/// Created by [`Grammar::tokenize`]. Runs of text that no rule matches are
/// emitted as a single token of the grammar's fallback class.
pub struct Tokens<'g, 't> {
    grammar: &'g Grammar,
    text: &'t str,
    pos: usize,
    /// Spans of a grouped match not yet emitted
    pending: VecDeque<(usize, usize, ClassId)>,
}

impl<'g, 't> Tokens<'g, 't> {
    pub(crate) fn new(grammar: &'g Grammar, text: &'t str) -> Self {
        Self {
            grammar,
            text,
            pos: 0,
            pending: VecDeque::new(),
        }
    }

    fn token(&self, class_id: ClassId, start: usize, end: usize) -> Token<'g, 't> {
        Token {
            class_id,
            class: self.grammar.class_name(class_id),
            text: &self.text[start..end],
        }
    }

    fn next_pending(&mut self) -> Option<Token<'g, 't>> {
        let (start, end, class) = self.pending.pop_front()?;
        Some(self.token(class, start, end))
    }
}

impl<'g, 't> Iterator for Tokens<'g, 't> {
    type Item = Token<'g, 't>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.next_pending() {
            return Some(token);
        }

        let start = self.pos;
        if start >= self.text.len() {
            return None;
        }

        let mut cursor = start;
        while cursor < self.text.len() {
            if let Some(found) = self.grammar.match_at(self.text, cursor) {
                if cursor == start {
                    self.pos = start + found.len;
                    self.grammar
                        .split_match(self.text, start, found, &mut self.pending);
                    return self.next_pending();
                }
                // Flush the unmatched run; the match is picked up next call.
                self.pos = cursor;
                return Some(self.token(self.grammar.fallback_class(), start, cursor));
            }
            cursor += self.text[cursor..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
        }

        self.pos = self.text.len();
        Some(self.token(self.grammar.fallback_class(), start, self.text.len()))
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::{plain_text, restructured_text, GrammarSpec};
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_has_no_tokens() {
        let grammar = plain_text().build().unwrap();
        assert_eq!(grammar.tokenize("").count(), 0);
    }

    #[test]
    fn test_plain_text_is_one_token() {
        let grammar = plain_text().build().unwrap();
        let tokens: Vec<_> = grammar.tokenize("hello\nworld").collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].class, "text");
        assert_eq!(tokens[0].text, "hello\nworld");
    }

    #[test]
    fn test_unmatched_runs_are_merged() {
        let grammar = GrammarSpec::new("digits", "other")
            .rule("[0-9]+", "number")
            .build()
            .unwrap();
        let tokens: Vec<_> = grammar
            .tokenize("ab12cd3")
            .map(|t| (t.class, t.text))
            .collect();

        assert_eq!(
            tokens,
            vec![
                ("other", "ab"),
                ("number", "12"),
                ("other", "cd"),
                ("number", "3"),
            ]
        );
    }

    #[test]
    fn test_empty_matches_are_ignored() {
        let grammar = GrammarSpec::new("lazy", "text")
            .rule("x*", "x")
            .build()
            .unwrap();
        let tokens: Vec<_> = grammar.tokenize("axxb").map(|t| (t.class, t.text)).collect();
        assert_eq!(tokens, vec![("text", "a"), ("x", "xx"), ("text", "b")]);
    }

    #[test]
    fn test_multibyte_characters() {
        let grammar = GrammarSpec::new("g", "text")
            .rule("é+", "accent")
            .build()
            .unwrap();
        let tokens: Vec<_> = grammar.tokenize("caféé ü").collect();

        assert_eq!(tokens[1].text, "éé");
        assert_eq!(tokens[1].char_len(), 2);
        assert_eq!(tokens[2].text, " ü");
    }

    #[test]
    fn test_fresh_iterator_per_call() {
        let grammar = restructured_text().build().unwrap();
        let text = "Title\n=====\n";
        let first: Vec<_> = grammar.tokenize(text).collect();
        let second: Vec<_> = grammar.tokenize(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_groups_split_a_match() {
        let grammar = GrammarSpec::new("tags", "text")
            .rule("(@)([a-z]+)", "text")
            .groups(["punctuation", "name.tag"])
            .build()
            .unwrap();
        let tokens: Vec<_> = grammar.tokenize("hi @bob!").map(|t| (t.class, t.text)).collect();

        assert_eq!(
            tokens,
            vec![
                ("text", "hi "),
                ("punctuation", "@"),
                ("name.tag", "bob"),
                ("text", "!"),
            ]
        );
    }

    #[test]
    fn test_text_between_groups_takes_rule_class() {
        let grammar = GrammarSpec::new("pairs", "other")
            .rule("([a-z]+)=([0-9]+)?;", "pair")
            .groups(["key", "value"])
            .build()
            .unwrap();
        let tokens: Vec<_> = grammar.tokenize("a=1;b=;").map(|t| (t.class, t.text)).collect();

        assert_eq!(
            tokens,
            vec![
                ("key", "a"),
                ("pair", "="),
                ("value", "1"),
                ("pair", ";"),
                ("key", "b"),
                ("pair", "=;"),
            ]
        );
    }

    #[test]
    fn test_line_start_after_any_terminator() {
        let grammar = GrammarSpec::new("g", "text")
            .line_rule("#", "mark")
            .build()
            .unwrap();
        for text in ["x\n#", "x\r#", "x\r\n#", "x\u{2028}#", "x\u{0085}#"] {
            let marks = grammar.tokenize(text).filter(|t| t.class == "mark").count();
            assert_eq!(marks, 1, "{text:?}");
        }
        assert_eq!(grammar.tokenize("x #").filter(|t| t.class == "mark").count(), 0);
    }

    proptest! {
        #[test]
        fn tokenization_is_lossless(text in "[a-z #*`:_.\\-=\n\r|é]{0,200}") {
            let grammar = restructured_text().build().unwrap();
            let joined: String = grammar.tokenize(&text).map(|t| t.text).collect();
            prop_assert_eq!(joined, text);
        }

        #[test]
        fn token_lengths_cover_input(text in "\\PC{0,120}") {
            let grammar = restructured_text().build().unwrap();
            let total: usize = grammar.tokenize(&text).map(|t| t.char_len()).sum();
            prop_assert_eq!(total, text.chars().count());
        }
    }
}
