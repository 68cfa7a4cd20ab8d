//! Formula tokenizer.
//!
//! Tokenization is total: every input byte sequence produces a token
//! stream, and malformed sequences (a lone `@`, a stray character)
//! become tokens the parser rejects later. Editor tooling relies on
//! this to extract partial context from formulas mid-edit.

/// A single lexical token. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identifier -- primitive, function, direction, base system, or calendar flag
    Ident(String),
    /// Numeric literal -- kept as source text to preserve exact representation
    Number(String),
    /// Number immediately followed by `min` (no whitespace), e.g. `72min`.
    /// The numeric part is kept as source text; the parser checks it is
    /// a whole number of minutes.
    Minutes(String),
    /// `@` followed by a zman key. The key is empty for a lone `@`,
    /// which the parser reports as an error.
    AtRef(String),
    Plus,
    Minus,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    If,
    Else,
    /// A character the lexer does not recognize
    Unknown(char),
    Eof,
}

impl Token {
    /// Render the token the way it appears in source, for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(w) => format!("'{}'", w),
            Token::Number(n) => format!("'{}'", n),
            Token::Minutes(n) => format!("'{}min'", n),
            Token::AtRef(k) => format!("'@{}'", k),
            Token::Plus => "'+'".to_owned(),
            Token::Minus => "'-'".to_owned(),
            Token::LParen => "'('".to_owned(),
            Token::RParen => "')'".to_owned(),
            Token::LBrace => "'{'".to_owned(),
            Token::RBrace => "'}'".to_owned(),
            Token::Comma => "','".to_owned(),
            Token::If => "'if'".to_owned(),
            Token::Else => "'else'".to_owned(),
            Token::Unknown(c) => format!("'{}'", c),
            Token::Eof => "end of formula".to_owned(),
        }
    }
}

/// A token plus the char offset of its first character in the formula.
/// Formulas are single-line, so an offset is enough for highlighting.
#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub offset: u32,
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize a formula. Never fails -- see module docs.
pub fn tokenize(src: &str) -> Vec<Spanned> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];
        let tok_off = pos as u32;

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        // Number, optionally a `min` duration when the suffix is adjacent.
        // `30min` is one Minutes token; `30 min` is Number then Ident,
        // which the parser rejects.
        if c.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos < chars.len()
                && chars[pos] == '.'
                && pos + 1 < chars.len()
                && chars[pos + 1].is_ascii_digit()
            {
                pos += 1; // consume '.'
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            let number: String = chars[start..pos].iter().collect();
            if pos < chars.len() && is_ident_start(chars[pos]) {
                let suffix_start = pos;
                while pos < chars.len() && is_ident_continue(chars[pos]) {
                    pos += 1;
                }
                let suffix: String = chars[suffix_start..pos].iter().collect();
                if suffix == "min" {
                    tokens.push(Spanned {
                        token: Token::Minutes(number),
                        offset: tok_off,
                    });
                } else {
                    // Unknown unit suffix: emit both tokens adjacent so the
                    // parser can report the malformed duration with offsets.
                    tokens.push(Spanned {
                        token: Token::Number(number),
                        offset: tok_off,
                    });
                    tokens.push(Spanned {
                        token: Token::Ident(suffix),
                        offset: suffix_start as u32,
                    });
                }
            } else {
                tokens.push(Spanned {
                    token: Token::Number(number),
                    offset: tok_off,
                });
            }
            continue;
        }

        // @-reference. A lone `@` yields an empty key.
        if c == '@' {
            pos += 1;
            let start = pos;
            if pos < chars.len() && is_ident_start(chars[pos]) {
                while pos < chars.len() && is_ident_continue(chars[pos]) {
                    pos += 1;
                }
            }
            let key: String = chars[start..pos].iter().collect();
            tokens.push(Spanned {
                token: Token::AtRef(key),
                offset: tok_off,
            });
            continue;
        }

        // Identifier / keyword
        if is_ident_start(c) {
            let start = pos;
            while pos < chars.len() && is_ident_continue(chars[pos]) {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            let token = match word.as_str() {
                "if" => Token::If,
                "else" => Token::Else,
                _ => Token::Ident(word),
            };
            tokens.push(Spanned {
                token,
                offset: tok_off,
            });
            continue;
        }

        let token = match c {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            ',' => Token::Comma,
            other => Token::Unknown(other),
        };
        tokens.push(Spanned {
            token,
            offset: tok_off,
        });
        pos += 1;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: chars.len() as u32,
    });
    tokens
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
