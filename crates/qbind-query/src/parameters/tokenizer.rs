//! SQL Placeholder Tokenizer
//!
//! Splits a query into text, `:name` and `?` tokens. The scanner walks the
//! query one character at a time, so multi-byte text is never split.
//!
//! Recognized spans, tried in this order at every position:
//!
//! 1. `'...'` literal, where `''` and `\x` stay inside the literal
//! 2. `"..."` identifier, with the same `""` and `\x` escapes
//! 3. `:name` where the colon is not preceded by another colon
//! 4. `?`
//! 5. a run of anything except `'`, `"`, `?` and `:`
//! 6. any other single character
//!
//! A quote that is never closed is a single-character text token, and
//! scanning resumes right after it.

use regex::Regex;
use std::sync::LazyLock;

use super::Token;

// `\w` is Unicode-aware, so a span like `:café` is taken whole.
static NAMED_SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:[a-zA-Z_]\w*").expect("valid regex"));

static NAMED_PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:[a-zA-Z_][a-zA-Z0-9_]*$").expect("valid regex"));

/// Splits a query into placeholder-aware tokens.
pub trait QueryTokenizer: Send + Sync {
    /// Tokenize `query`. Never fails; the raw text of the returned tokens
    /// always concatenates back to `query`.
    fn tokenize<'q>(&self, query: &'q str) -> Vec<Token<'q>>;
}

/// The default character-scanning tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanningTokenizer;

impl QueryTokenizer for ScanningTokenizer {
    fn tokenize<'q>(&self, query: &'q str) -> Vec<Token<'q>> {
        Scanner::new(query).run()
    }
}

/// Tokenizes a query with the default [`ScanningTokenizer`].
///
/// # Example
///
/// ```
/// use qbind_query::parameters::{Token, tokenize};
///
/// let tokens = tokenize("SELECT ':skip' WHERE id = :id::int AND x = ?");
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Text("SELECT "),
///         Token::Text("':skip'"),
///         Token::Text(" WHERE id = "),
///         Token::Named(":id"),
///         Token::Text(":"),
///         Token::Text(":"),
///         Token::Text("int AND x = "),
///         Token::Positional,
///     ]
/// );
/// ```
pub fn tokenize(query: &str) -> Vec<Token<'_>> {
    ScanningTokenizer.tokenize(query)
}

struct Scanner<'q> {
    query: &'q str,
    pos: usize,
    /// Last character consumed, so `::` casts are not read as placeholders.
    prev: Option<char>,
    tokens: Vec<Token<'q>>,
}

impl<'q> Scanner<'q> {
    fn new(query: &'q str) -> Self {
        Self {
            query,
            pos: 0,
            prev: None,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token<'q>> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            let (token, end) = match c {
                '\'' | '"' => match self.closing_quote_end(c) {
                    Some(end) => (Token::Text(&self.query[start..end]), end),
                    None => self.single_char(c),
                },
                ':' => match self.named_end() {
                    Some(end) => (self.classify_named(&self.query[start..end]), end),
                    None => self.single_char(c),
                },
                '?' => (Token::Positional, start + 1),
                _ => {
                    let end = self.text_end();
                    (Token::Text(&self.query[start..end]), end)
                }
            };

            self.prev = self.query[start..end].chars().next_back();
            self.pos = end;
            self.tokens.push(token);
        }

        self.tokens
    }

    fn peek(&self) -> Option<char> {
        self.query[self.pos..].chars().next()
    }

    fn single_char(&self, c: char) -> (Token<'q>, usize) {
        let end = self.pos + c.len_utf8();
        (Token::Text(&self.query[self.pos..end]), end)
    }

    /// End offset of the quoted span opening at the current position.
    ///
    /// A doubled delimiter is an escape, but its first half is also a valid
    /// closing point: if the span never closes properly, it ends at the last
    /// such point instead. `None` means the quote does not open a span.
    fn closing_quote_end(&self, quote: char) -> Option<usize> {
        let body_start = self.pos + quote.len_utf8();
        let mut chars = self.query[body_start..].char_indices().peekable();
        let mut last_doubled = None;

        while let Some((offset, c)) = chars.next() {
            if c == '\\' {
                if chars.next().is_none() {
                    break;
                }
            } else if c == quote {
                let close = body_start + offset + c.len_utf8();
                if chars.peek().is_some_and(|&(_, next)| next == quote) {
                    chars.next();
                    last_doubled = Some(close);
                } else {
                    return Some(close);
                }
            }
        }

        last_doubled
    }

    /// End offset of a `:name` span at the current position, if one starts here.
    fn named_end(&self) -> Option<usize> {
        if self.prev == Some(':') {
            return None;
        }

        NAMED_SPAN_REGEX
            .find(&self.query[self.pos..])
            .map(|m| self.pos + m.end())
    }

    /// Names may only use ASCII letters, digits and underscores. A span that
    /// runs on into other word characters is kept whole as text.
    fn classify_named(&self, raw: &'q str) -> Token<'q> {
        if NAMED_PLACEHOLDER_REGEX.is_match(raw) {
            Token::Named(raw)
        } else {
            Token::Text(raw)
        }
    }

    fn text_end(&self) -> usize {
        self.query[self.pos..]
            .find(['\'', '"', '?', ':'])
            .map_or(self.query.len(), |offset| self.pos + offset)
    }
}
