//! Cursor-context analysis for formula editors.
//!
//! Given formula text and a cursor offset, answers "what is being
//! typed here" so an editor can offer the right completions and
//! tooltips. Works from the lexer's total token stream, so broken,
//! mid-edit formulas still yield useful partial context. Never
//! affects evaluation results.

use crate::lexer::{tokenize, Spanned, Token};
use crate::symbols::{self, ArgKind};

/// What the cursor is positioned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorContext {
    /// Inside a known or unknown function's argument list.
    FunctionArgument {
        function: String,
        /// Zero-based argument position
        index: usize,
        /// Expected kind for this position, when the function is known
        expected: Option<ArgKind>,
        /// Word fragment typed so far at the cursor
        prefix: String,
    },
    /// Typing an `@`-reference key.
    ReferenceKey { prefix: String },
    /// Typing a bare word outside any argument list.
    Word { prefix: String },
    /// Nothing being typed at the cursor.
    TopLevel,
}

fn source_len(token: &Token) -> usize {
    match token {
        Token::Ident(w) => w.chars().count(),
        Token::Number(n) => n.chars().count(),
        Token::Minutes(n) => n.chars().count() + 3,
        Token::AtRef(k) => k.chars().count() + 1,
        Token::If => 2,
        Token::Else => 4,
        Token::Eof => 0,
        _ => 1,
    }
}

/// Determine the cursor context for `text` at char offset `offset`.
pub fn cursor_context(text: &str, offset: usize) -> CursorContext {
    let offset = offset.min(text.chars().count());
    let tokens = tokenize(text);

    // Word fragment under the cursor, if the cursor sits inside or at
    // the end of an identifier or @-reference.
    let mut fragment: Option<(Token, usize)> = None;
    for spanned in &tokens {
        let start = spanned.offset as usize;
        let end = start + source_len(&spanned.token);
        if start < offset && offset <= end {
            match &spanned.token {
                Token::Ident(_) | Token::AtRef(_) => {
                    fragment = Some((spanned.token.clone(), offset - start));
                }
                _ => {}
            }
        }
    }

    if let Some((Token::AtRef(key), typed)) = &fragment {
        // typed includes the leading '@'
        let prefix: String = key.chars().take(typed.saturating_sub(1)).collect();
        return CursorContext::ReferenceKey { prefix };
    }

    let stack = call_stack_at(&tokens, offset);
    if let Some((function, index)) = stack.into_iter().rev().find_map(|frame| frame) {
        let expected = symbols::function_signature(&function)
            .and_then(|sig| sig.arg_kinds.get(index).copied());
        let prefix = match &fragment {
            Some((Token::Ident(w), typed)) => w.chars().take(*typed).collect(),
            _ => String::new(),
        };
        return CursorContext::FunctionArgument {
            function,
            index,
            expected,
            prefix,
        };
    }

    if let Some((Token::Ident(w), typed)) = fragment {
        return CursorContext::Word {
            prefix: w.chars().take(typed).collect(),
        };
    }

    CursorContext::TopLevel
}

/// Open parenthesis groups at the cursor, innermost last. Each frame
/// is `Some((function, arg_index))` for a call, `None` for a bare
/// grouping paren.
fn call_stack_at(tokens: &[Spanned], offset: usize) -> Vec<Option<(String, usize)>> {
    let mut stack: Vec<Option<(String, usize)>> = Vec::new();
    let mut prev_ident: Option<String> = None;

    for spanned in tokens {
        let start = spanned.offset as usize;
        if start >= offset {
            break;
        }
        match &spanned.token {
            Token::LParen => {
                stack.push(prev_ident.take().map(|name| (name, 0)));
            }
            Token::RParen => {
                stack.pop();
                prev_ident = None;
            }
            Token::Comma => {
                if let Some(Some((_, index))) = stack.last_mut() {
                    *index += 1;
                }
                prev_ident = None;
            }
            Token::Ident(w) => {
                // Only count identifiers fully behind the cursor as
                // potential callees; the fragment case is handled above.
                let end = start + source_len(&spanned.token);
                prev_ident = (end <= offset).then(|| w.clone());
            }
            _ => {
                prev_ident = None;
            }
        }
    }

    stack
}

/// Completion candidates for a context, drawn from the symbol table
/// and the publisher's zman keys.
pub fn completions(context: &CursorContext, zman_keys: &[String]) -> Vec<String> {
    fn filtered(candidates: &[&str], prefix: &str) -> Vec<String> {
        candidates
            .iter()
            .filter(|c| c.starts_with(prefix))
            .map(|c| (*c).to_owned())
            .collect()
    }

    match context {
        CursorContext::ReferenceKey { prefix } => zman_keys
            .iter()
            .filter(|k| k.starts_with(prefix.as_str()))
            .cloned()
            .collect(),

        CursorContext::FunctionArgument {
            expected, prefix, ..
        } => match expected {
            Some(ArgKind::Direction) => filtered(symbols::list_directions(), prefix),
            Some(ArgKind::BaseSystem) => filtered(symbols::list_base_systems(), prefix),
            // Numeric positions have no finite candidate set
            Some(ArgKind::Degrees) | Some(ArgKind::Hours) => Vec::new(),
            Some(ArgKind::Time) | None => expression_candidates(prefix),
        },

        CursorContext::Word { prefix } => expression_candidates(prefix),
        CursorContext::TopLevel => expression_candidates(""),
    }
}

fn expression_candidates(prefix: &str) -> Vec<String> {
    let mut out: Vec<String> = symbols::list_primitives()
        .iter()
        .filter(|p| p.starts_with(prefix))
        .map(|p| (*p).to_owned())
        .collect();
    out.extend(
        symbols::list_functions()
            .iter()
            .filter(|sig| sig.name.starts_with(prefix))
            .map(|sig| sig.name.to_owned()),
    );
    out
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_argument_of_solar() {
        let ctx = cursor_context("solar(", 6);
        assert_eq!(
            ctx,
            CursorContext::FunctionArgument {
                function: "solar".to_owned(),
                index: 0,
                expected: Some(ArgKind::Degrees),
                prefix: String::new(),
            }
        );
    }

    #[test]
    fn mid_word_direction_argument() {
        let text = "solar(16.1, bef";
        let ctx = cursor_context(text, text.len());
        assert_eq!(
            ctx,
            CursorContext::FunctionArgument {
                function: "solar".to_owned(),
                index: 1,
                expected: Some(ArgKind::Direction),
                prefix: "bef".to_owned(),
            }
        );
        let options = completions(&ctx, &[]);
        assert!(options.contains(&"before_sunrise".to_owned()));
        assert!(options.contains(&"before_sunset".to_owned()));
        assert!(!options.contains(&"after_sunset".to_owned()));
    }

    #[test]
    fn reference_prefix() {
        let ctx = cursor_context("@al", 3);
        assert_eq!(
            ctx,
            CursorContext::ReferenceKey {
                prefix: "al".to_owned()
            }
        );
        let keys = vec!["alos".to_owned(), "tzeis".to_owned()];
        assert_eq!(completions(&ctx, &keys), vec!["alos".to_owned()]);
    }

    #[test]
    fn reference_wins_inside_argument_lists() {
        let text = "min(@tz";
        let ctx = cursor_context(text, text.len());
        assert_eq!(
            ctx,
            CursorContext::ReferenceKey {
                prefix: "tz".to_owned()
            }
        );
    }

    #[test]
    fn bare_word_at_top_level() {
        let ctx = cursor_context("sunr", 4);
        assert_eq!(
            ctx,
            CursorContext::Word {
                prefix: "sunr".to_owned()
            }
        );
        assert_eq!(completions(&ctx, &[]), vec!["sunrise".to_owned()]);
    }

    #[test]
    fn closed_call_returns_to_top_level() {
        let text = "solar(16.1, before_sunrise) ";
        assert_eq!(cursor_context(text, text.len()), CursorContext::TopLevel);
    }

    #[test]
    fn grouping_parens_are_not_calls() {
        let text = "(sunrise ";
        assert_eq!(cursor_context(text, text.len()), CursorContext::TopLevel);
    }

    #[test]
    fn nested_call_reports_innermost() {
        let text = "min(midpoint(";
        let ctx = cursor_context(text, text.len());
        assert!(matches!(
            ctx,
            CursorContext::FunctionArgument { function, index: 0, .. } if function == "midpoint"
        ));
    }

    #[test]
    fn malformed_text_still_yields_context() {
        // Unbalanced and full of junk; the analyzer should not care.
        let text = "solar(16.1, $$ bef";
        let ctx = cursor_context(text, text.len());
        assert!(matches!(
            ctx,
            CursorContext::FunctionArgument { function, .. } if function == "solar"
        ));
    }

    #[test]
    fn empty_text_is_top_level() {
        assert_eq!(cursor_context("", 0), CursorContext::TopLevel);
    }
}
