//! Token definitions and lexer for the script language.

use logos::Logos;

/// All token kinds in the script language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    /// Spaces, tabs, carriage returns
    #[regex(r"[ \t\r]+")]
    Whitespace,

    /// `# ...` to end of line
    #[regex(r"#[^\n]*", allow_greedy = true)]
    Comment,

    /// Statement terminator
    #[token("\n")]
    Newline,

    // =========================================================================
    // PUNCTUATION AND OPERATORS
    // =========================================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("def")]
    KwDef,
    #[token("end")]
    KwEnd,
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("while")]
    KwWhile,
    #[token("return")]
    KwReturn,
    #[token("print")]
    KwPrint,
    #[token("raise")]
    KwRaise,
    #[token("exec")]
    KwExec,
    #[token("and")]
    KwAnd,
    #[token("or")]
    KwOr,
    #[token("not")]
    KwNot,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,
    #[token("none")]
    KwNone,

    // =========================================================================
    // LITERALS AND IDENTIFIERS
    // =========================================================================
    #[regex(r"[0-9]+")]
    IntLiteral,

    /// Double-quoted string with backslash escapes
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// Unrecognized input
    Error,
}

impl TokenKind {
    #[must_use]
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }
}

/// A significant token with its text and 1-based line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub line: u32,
}

/// Split source into significant tokens, dropping trivia.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1u32;
    while let Some(kind) = lexer.next() {
        let kind = kind.unwrap_or(TokenKind::Error);
        let text = lexer.slice();
        if !kind.is_trivia() {
            tokens.push(Token { kind, text, line });
        }
        if kind == TokenKind::Newline {
            line += 1;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            kinds("if ifx end"),
            vec![TokenKind::KwIf, TokenKind::Ident, TokenKind::KwEnd]
        );
    }

    #[test]
    fn comments_are_dropped_and_lines_counted() {
        let tokens = tokenize("x = 1 # one\n\ny <= \"a\\\"b\"\n");
        let lines: Vec<_> = tokens.iter().map(|token| (token.kind, token.line)).collect();
        assert_eq!(
            lines,
            vec![
                (TokenKind::Ident, 1),
                (TokenKind::Assign, 1),
                (TokenKind::IntLiteral, 1),
                (TokenKind::Newline, 1),
                (TokenKind::Newline, 2),
                (TokenKind::Ident, 3),
                (TokenKind::LtEq, 3),
                (TokenKind::StringLiteral, 3),
                (TokenKind::Newline, 3),
            ]
        );
    }

    #[test]
    fn unknown_characters_become_error_tokens() {
        assert_eq!(kinds("x @ 1")[1], TokenKind::Error);
    }
}
