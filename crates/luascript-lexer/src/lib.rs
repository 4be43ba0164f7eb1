//! Tokenizer for the LuaScript surface language.
//!
//! Turns a JS-flavored source string into a [`Token`] sequence ending in
//! `Eof`. Whitespace and comments are skipped; string literals keep their
//! quotes in the span so later passes can tell the quote style apart.
//!
//! Lex errors (unterminated string or block comment, unexpected character)
//! are fatal for the call and surface as [`LexError`].

mod cursor;

use cursor::Cursor;
use luascript_common::error::{LexError, LexErrorKind};
use luascript_common::span::Span;
use luascript_common::token::{keyword_from_str, Token, TokenKind};

/// The LuaScript lexer. Converts source text into a stream of tokens.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Tokenize the entire source.
    ///
    /// The returned vector always ends with an `Eof` token whose span is a
    /// zero-length point at the end of input.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Produce the next token, skipping whitespace and comments first.
    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;

        let start = self.cursor.pos();
        let Some(c) = self.cursor.first() else {
            return Ok(Token::new(TokenKind::Eof, start, start));
        };

        match c {
            // ── Delimiters ─────────────────────────────────────────────
            '(' => Ok(self.single(TokenKind::LParen, start)),
            ')' => Ok(self.single(TokenKind::RParen, start)),
            '{' => Ok(self.single(TokenKind::LBrace, start)),
            '}' => Ok(self.single(TokenKind::RBrace, start)),
            '[' => Ok(self.single(TokenKind::LBracket, start)),
            ']' => Ok(self.single(TokenKind::RBracket, start)),
            ',' => Ok(self.single(TokenKind::Comma, start)),
            ';' => Ok(self.single(TokenKind::Semicolon, start)),
            ':' => Ok(self.single(TokenKind::Colon, start)),
            '?' => Ok(self.single(TokenKind::Question, start)),
            '.' => Ok(self.single(TokenKind::Dot, start)),

            // ── Operators with lookahead ───────────────────────────────
            '=' => Ok(self.lex_eq(start)),
            '!' => Ok(self.lex_bang(start)),
            '<' => Ok(self.lex_two(start, '=', TokenKind::LtEq, TokenKind::Lt)),
            '>' => Ok(self.lex_two(start, '=', TokenKind::GtEq, TokenKind::Gt)),
            '+' => Ok(self.lex_plus(start)),
            '-' => Ok(self.lex_minus(start)),
            '*' => Ok(self.lex_two(start, '=', TokenKind::StarEq, TokenKind::Star)),
            '/' => Ok(self.lex_two(start, '=', TokenKind::SlashEq, TokenKind::Slash)),
            '%' => Ok(self.lex_two(start, '=', TokenKind::PercentEq, TokenKind::Percent)),
            '&' => self.lex_pair(start, '&', TokenKind::AmpAmp),
            '|' => self.lex_pair(start, '|', TokenKind::PipePipe),

            // ── Literals ───────────────────────────────────────────────
            '0'..='9' => Ok(self.lex_number(start)),
            '"' | '\'' => self.lex_string(start, c),
            c if is_ident_start(c) => Ok(self.lex_ident(start)),

            _ => {
                self.cursor.bump();
                Err(LexError::new(
                    LexErrorKind::UnexpectedCharacter(c),
                    Span::new(start, self.cursor.pos()),
                ))
            }
        }
    }

    // ── Trivia ─────────────────────────────────────────────────────────

    /// Skip whitespace, `//` line comments, and `/* */` block comments.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            self.cursor.bump_while(|c| c.is_ascii_whitespace());
            if self.cursor.first() != Some('/') {
                return Ok(());
            }
            match self.cursor.second() {
                Some('/') => {
                    self.cursor.bump_while(|c| c != '\n');
                }
                Some('*') => {
                    let open = self.cursor.pos();
                    self.cursor.bump();
                    self.cursor.bump();
                    loop {
                        match self.cursor.bump() {
                            Some('*') if self.cursor.first() == Some('/') => {
                                self.cursor.bump();
                                break;
                            }
                            Some(_) => continue,
                            None => {
                                return Err(LexError::new(
                                    LexErrorKind::UnterminatedBlockComment,
                                    Span::new(open, self.cursor.pos()),
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    // ── Operator helpers ───────────────────────────────────────────────

    /// Consume one character and emit `kind`.
    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.bump();
        Token::new(kind, start, self.cursor.pos())
    }

    /// Consume the leading character, then `follow` if present, choosing
    /// between the long and short token kinds.
    fn lex_two(&mut self, start: u32, follow: char, long: TokenKind, short: TokenKind) -> Token {
        self.cursor.bump();
        let kind = if self.cursor.bump_if(follow) { long } else { short };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `=`, `==`, `===`, or `=>`.
    fn lex_eq(&mut self, start: u32) -> Token {
        self.cursor.bump();
        let kind = if self.cursor.bump_if('>') {
            TokenKind::FatArrow
        } else if self.cursor.bump_if('=') {
            if self.cursor.bump_if('=') {
                TokenKind::EqEqEq
            } else {
                TokenKind::EqEq
            }
        } else {
            TokenKind::Eq
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `!`, `!=`, or `!==`.
    fn lex_bang(&mut self, start: u32) -> Token {
        self.cursor.bump();
        let kind = if self.cursor.bump_if('=') {
            if self.cursor.bump_if('=') {
                TokenKind::NotEqEq
            } else {
                TokenKind::NotEq
            }
        } else {
            TokenKind::Bang
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `+`, `++`, or `+=`.
    fn lex_plus(&mut self, start: u32) -> Token {
        self.cursor.bump();
        let kind = if self.cursor.bump_if('+') {
            TokenKind::PlusPlus
        } else if self.cursor.bump_if('=') {
            TokenKind::PlusEq
        } else {
            TokenKind::Plus
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// `-`, `--`, or `-=`.
    fn lex_minus(&mut self, start: u32) -> Token {
        self.cursor.bump();
        let kind = if self.cursor.bump_if('-') {
            TokenKind::MinusMinus
        } else if self.cursor.bump_if('=') {
            TokenKind::MinusEq
        } else {
            TokenKind::Minus
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// A doubled character (`&&`, `||`). A lone occurrence is an error
    /// since the surface language has no bitwise operators.
    fn lex_pair(&mut self, start: u32, c: char, kind: TokenKind) -> Result<Token, LexError> {
        self.cursor.bump();
        if self.cursor.bump_if(c) {
            Ok(Token::new(kind, start, self.cursor.pos()))
        } else {
            Err(LexError::new(
                LexErrorKind::UnexpectedCharacter(c),
                Span::new(start, self.cursor.pos()),
            ))
        }
    }

    // ── Literals ───────────────────────────────────────────────────────

    /// `[0-9]+ (. [0-9]*)?`
    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.bump_while(|c| c.is_ascii_digit());
        if self.cursor.first() == Some('.')
            && self.cursor.second().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.bump();
            self.cursor.bump_while(|c| c.is_ascii_digit());
        }
        Token::new(TokenKind::Number, start, self.cursor.pos())
    }

    /// A quoted string with `\` escapes. The span includes the quotes.
    fn lex_string(&mut self, start: u32, quote: char) -> Result<Token, LexError> {
        self.cursor.bump();
        loop {
            match self.cursor.bump() {
                Some(c) if c == quote => {
                    return Ok(Token::new(TokenKind::String, start, self.cursor.pos()));
                }
                Some('\\') => {
                    // Escape: consume the escaped character unconditionally.
                    if self.cursor.bump().is_none() {
                        return Err(LexError::new(
                            LexErrorKind::UnterminatedString,
                            Span::new(start, self.cursor.pos()),
                        ));
                    }
                }
                Some('\n') | None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::new(start, self.cursor.pos()),
                    ));
                }
                Some(_) => continue,
            }
        }
    }

    /// An identifier, reclassified against the keyword table.
    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.bump_while(is_ident_continue);
        let text = self.cursor.text(start, self.cursor.pos());
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, start, self.cursor.pos())
    }
}

/// `[A-Za-z_]`
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// `[A-Za-z0-9_]`
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .expect("tokenize failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn empty_source_yields_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn fat_arrow_is_one_token() {
        assert_eq!(
            kinds("x => x"),
            vec![
                TokenKind::Identifier,
                TokenKind::FatArrow,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn equality_ladder() {
        assert_eq!(
            kinds("= == === != !=="),
            vec![
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::EqEqEq,
                TokenKind::NotEq,
                TokenKind::NotEqEq,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn increments_and_compound_assignment() {
        assert_eq!(
            kinds("++ -- += -= *= /= %="),
            vec![
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::PlusEq,
                TokenKind::MinusEq,
                TokenKind::StarEq,
                TokenKind::SlashEq,
                TokenKind::PercentEq,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn keywords_are_reclassified() {
        assert_eq!(
            kinds("function foo"),
            vec![TokenKind::Function, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn number_with_fraction() {
        let tokens = Lexer::tokenize("3.14").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme("3.14"), "3.14");
    }

    #[test]
    fn number_then_method_call_keeps_dot() {
        // `1.toString` style: the dot is not part of the number unless a
        // digit follows.
        assert_eq!(
            kinds("1.x"),
            vec![
                TokenKind::Number,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn strings_keep_quotes_in_span() {
        let source = r#"'a' "b\"c""#;
        let tokens = Lexer::tokenize(source).unwrap();
        assert_eq!(tokens[0].lexeme(source), "'a'");
        assert_eq!(tokens[1].lexeme(source), r#""b\"c""#);
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = Lexer::tokenize("let s = \"oops").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.span.start, 8);
    }

    #[test]
    fn newline_terminates_string_with_error() {
        let err = Lexer::tokenize("\"a\nb\"").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("let x; // trailing\n/* block\n comment */ x"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_is_fatal() {
        let err = Lexer::tokenize("x /* never closed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedBlockComment);
    }

    #[test]
    fn lone_ampersand_is_rejected() {
        let err = Lexer::tokenize("a & b").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('&'));
    }

    #[test]
    fn unexpected_character() {
        let err = Lexer::tokenize("let § = 1;").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('§'));
        assert_eq!(err.span.start, 4);
    }

    #[test]
    fn spans_locate_tokens() {
        let source = "if (a) {\n  b;\n}";
        let tokens = Lexer::tokenize(source).unwrap();
        for token in &tokens {
            if token.kind != TokenKind::Eof {
                assert!(token.span.start < token.span.end);
                assert_eq!(
                    token.lexeme(source),
                    &source[token.span.start as usize..token.span.end as usize]
                );
            }
        }
    }
}
