use serde::Serialize;

use crate::span::Span;

/// A token produced by the LuaScript lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token from a kind and byte offsets.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }

    /// The token's text as a slice of the source it was lexed from.
    pub fn lexeme<'src>(&self, source: &'src str) -> &'src str {
        &source[self.span.start as usize..self.span.end as usize]
    }
}

/// Every kind of token in the JS-flavored surface language.
///
/// Covers keywords, operators, delimiters and literals for the transpiled
/// subset. Identifiers are reclassified against the keyword table by the
/// lexer via [`keyword_from_str`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords ───────────────────────────────────────────────────────
    Async,
    Break,
    Case,
    Const,
    Continue,
    Default,
    Do,
    Else,
    False,
    For,
    Function,
    If,
    In,
    Let,
    New,
    Null,
    Of,
    Return,
    Switch,
    True,
    Undefined,
    Var,
    While,

    // ── Operators ──────────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!=`
    NotEq,
    /// `!==`
    NotEqEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,
    /// `=>`
    FatArrow,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `.`
    Dot,

    // ── Delimiters ─────────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `,`
    Comma,
    /// `;`
    Semicolon,

    // ── Literals ───────────────────────────────────────────────────────
    Number,
    String,
    Identifier,

    /// End of input. Always the final token of a stream.
    Eof,
}

impl TokenKind {
    /// Human-readable name used in "expected X, found Y" diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Async => "`async`",
            TokenKind::Break => "`break`",
            TokenKind::Case => "`case`",
            TokenKind::Const => "`const`",
            TokenKind::Continue => "`continue`",
            TokenKind::Default => "`default`",
            TokenKind::Do => "`do`",
            TokenKind::Else => "`else`",
            TokenKind::False => "`false`",
            TokenKind::For => "`for`",
            TokenKind::Function => "`function`",
            TokenKind::If => "`if`",
            TokenKind::In => "`in`",
            TokenKind::Let => "`let`",
            TokenKind::New => "`new`",
            TokenKind::Null => "`null`",
            TokenKind::Of => "`of`",
            TokenKind::Return => "`return`",
            TokenKind::Switch => "`switch`",
            TokenKind::True => "`true`",
            TokenKind::Undefined => "`undefined`",
            TokenKind::Var => "`var`",
            TokenKind::While => "`while`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Star => "`*`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Eq => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::EqEqEq => "`===`",
            TokenKind::NotEq => "`!=`",
            TokenKind::NotEqEq => "`!==`",
            TokenKind::Lt => "`<`",
            TokenKind::LtEq => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::GtEq => "`>=`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::PipePipe => "`||`",
            TokenKind::Bang => "`!`",
            TokenKind::FatArrow => "`=>`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::PlusEq => "`+=`",
            TokenKind::MinusEq => "`-=`",
            TokenKind::StarEq => "`*=`",
            TokenKind::SlashEq => "`/=`",
            TokenKind::PercentEq => "`%=`",
            TokenKind::Question => "`?`",
            TokenKind::Colon => "`:`",
            TokenKind::Dot => "`.`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Number => "number literal",
            TokenKind::String => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::Eof => "end of input",
        }
    }
}

/// Reclassify an identifier against the keyword table.
///
/// Returns `None` when the text is an ordinary identifier.
pub fn keyword_from_str(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "async" => TokenKind::Async,
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "default" => TokenKind::Default,
        "do" => TokenKind::Do,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "in" => TokenKind::In,
        "let" => TokenKind::Let,
        "new" => TokenKind::New,
        "null" => TokenKind::Null,
        "of" => TokenKind::Of,
        "return" => TokenKind::Return,
        "switch" => TokenKind::Switch,
        "true" => TokenKind::True,
        "undefined" => TokenKind::Undefined,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}
