//! Placeholder-aware query tokens

/// The classification of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Text,
    Named,
    Positional,
}

/// A classified slice of a query.
///
/// Tokens borrow from the query they were produced from; concatenating the
/// [`raw`](Token::raw) text of every token in order reproduces that query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token<'q> {
    /// SQL text with no placeholder meaning, including quoted literals.
    Text(&'q str),
    /// A named placeholder, stored with its leading colon (`:name`).
    Named(&'q str),
    /// A `?` placeholder.
    Positional,
}

impl<'q> Token<'q> {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Text(_) => TokenKind::Text,
            Token::Named(_) => TokenKind::Named,
            Token::Positional => TokenKind::Positional,
        }
    }

    /// The exact source text of this token.
    pub fn raw(&self) -> &'q str {
        match self {
            Token::Text(raw) | Token::Named(raw) => raw,
            Token::Positional => "?",
        }
    }

    /// The bare placeholder name, without the leading colon.
    pub fn name(&self) -> Option<&'q str> {
        match self {
            Token::Named(raw) => Some(raw.strip_prefix(':').unwrap_or(raw)),
            Token::Text(_) | Token::Positional => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Token::Named(_))
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Token::Positional)
    }
}
