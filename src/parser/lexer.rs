//! Lexer for the expressions inside template tags using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Why a tag body could not be tokenized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LexError {
    #[default]
    UnexpectedCharacter,
    IntegerOutOfRange,
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
#[logos(error = LexError)]
pub enum Token {
    // Literal keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Operators (longer first)
    #[token("??")]
    Fallback,

    // Delimiters
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape(&s[1..s.len()-1])
    })]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().map_err(|_| LexError::IntegerOutOfRange), priority = 3)]
    Integer(i64),

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().map_err(|_| LexError::UnexpectedCharacter))]
    Float(f64),
}

/// Resolve backslash escapes inside a string literal
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Lex a tag body into tokens with spans relative to `offset`
///
/// Lexing stops at the first token that fails; its kind and span are returned
/// as the error.
pub fn lex(input: &str, offset: usize) -> Result<Vec<(Token, Span)>, (LexError, Span)> {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| {
            let span = span.start + offset..span.end + offset;
            match tok {
                Ok(t) => Ok((t, span)),
                Err(err) => Err((err, span)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input, 0)
            .expect("Should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_call_tokens() {
        assert_eq!(
            tokens(r#"get("title", "x")"#),
            vec![
                Token::Ident("get".to_string()),
                Token::ParenOpen,
                Token::String("title".to_string()),
                Token::Comma,
                Token::String("x".to_string()),
                Token::ParenClose,
            ]
        );
    }

    #[test]
    fn test_keywords_and_numbers() {
        assert_eq!(
            tokens("true false null 42 -7 2.5"),
            vec![
                Token::True,
                Token::False,
                Token::Null,
                Token::Integer(42),
                Token::Integer(-7),
                Token::Float(2.5),
            ]
        );
    }

    #[test]
    fn test_fallback_and_path() {
        assert_eq!(
            tokens("user.name ?? \"anon\""),
            vec![
                Token::Ident("user".to_string()),
                Token::Dot,
                Token::Ident("name".to_string()),
                Token::Fallback,
                Token::String("anon".to_string()),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""say \"hi\"\n""#),
            vec![Token::String("say \"hi\"\n".to_string())]
        );
    }

    #[test]
    fn test_spans_are_offset() {
        let lexed = lex("a", 10).expect("Should lex");
        assert_eq!(lexed[0].1, 10..11);
    }

    #[test]
    fn test_unknown_character_is_reported() {
        assert_eq!(lex("title $", 4), Err((LexError::UnexpectedCharacter, 10..11)));
    }

    #[test]
    fn test_integer_overflow_is_reported() {
        assert_eq!(
            lex("99999999999999999999", 0),
            Err((LexError::IntegerOutOfRange, 0..20))
        );
        assert_eq!(tokens("9223372036854775807"), vec![Token::Integer(i64::MAX)]);
    }
}
