//! Parser implementation: a text/tag scanner with chumsky parsing each tag body

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::error::ParseError;
use crate::parser::ast::*;
use crate::parser::lexer::{self, LexError, Token};

const TAG_OPEN: &str = "{{";
const TAG_CLOSE: &str = "}}";
const COMMENT_OPEN: &str = "{#";
const COMMENT_CLOSE: &str = "#}";

/// Parse template source into a list of text, tag and comment segments
///
/// All syntax errors in the file are collected rather than stopping at the
/// first broken tag.
pub fn parse(input: &str) -> Result<Document, Vec<ParseError>> {
    let mut segments = Vec::new();
    let mut errors = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(open) = find_open(rest) else {
            segments.push(Spanned::new(
                Segment::Text(rest.to_string()),
                pos..input.len(),
            ));
            break;
        };

        if open > 0 {
            segments.push(Spanned::new(
                Segment::Text(rest[..open].to_string()),
                pos..pos + open,
            ));
        }

        let start = pos + open;
        let body_start = start + 2;

        if input[start..].starts_with(COMMENT_OPEN) {
            match input[body_start..].find(COMMENT_CLOSE) {
                Some(close) => {
                    let end = body_start + close + COMMENT_CLOSE.len();
                    segments.push(Spanned::new(Segment::Comment, start..end));
                    pos = end;
                }
                None => {
                    errors.push(unclosed(start..input.len(), COMMENT_CLOSE));
                    break;
                }
            }
            continue;
        }

        match find_tag_close(&input[body_start..]) {
            Some(close) => {
                let body_end = body_start + close;
                let end = body_end + TAG_CLOSE.len();
                match parse_tag(&input[body_start..body_end], body_start) {
                    Ok(expr) => segments.push(Spanned::new(Segment::Tag(expr), start..end)),
                    Err(errs) => errors.extend(errs),
                }
                pos = end;
            }
            None => {
                errors.push(unclosed(start..input.len(), TAG_CLOSE));
                break;
            }
        }
    }

    if errors.is_empty() {
        Ok(Document { segments })
    } else {
        Err(errors)
    }
}

/// Position of the next `{{` or `{#`
fn find_open(text: &str) -> Option<usize> {
    match (text.find(TAG_OPEN), text.find(COMMENT_OPEN)) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Position of the closing `}}`, skipping over string literals
fn find_tag_close(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'}' if !in_string && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn unclosed(span: Span, close: &str) -> ParseError {
    ParseError::Syntax {
        span,
        message: "Unclosed tag".to_string(),
        expected: vec![format!("'{}'", close)],
    }
}

/// Parse a single tag body; spans are absolute offsets into the file
fn parse_tag(body: &str, offset: usize) -> Result<Spanned<Expr>, Vec<ParseError>> {
    let tokens = lexer::lex(body, offset).map_err(|(err, span)| {
        let found = &body[span.start - offset..span.end - offset];
        let message = match err {
            LexError::UnexpectedCharacter => format!("Unexpected character '{}'", found),
            LexError::IntegerOutOfRange => format!("Integer literal {} out of range", found),
        };
        vec![ParseError::Syntax {
            span,
            message,
            expected: Vec::new(),
        }]
    })?;

    let eoi = offset + body.len();
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((eoi..eoi).into(), |(t, s): (_, _)| (t, s));

    expression_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn expression_parser<'a, I>(
) -> impl Parser<'a, I, Spanned<Expr>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let identifier = select! {
            Token::Ident(s) => Identifier::new(s),
        }
        .map_with(|id, e| Spanned::new(id, span_range(&e.span())));

        let string_literal = select! {
            Token::String(s) => s,
        }
        .map_with(|s, e| Spanned::new(s, span_range(&e.span())));

        let literal = select! {
            Token::String(s) => Literal::String(s),
            Token::Integer(n) => Literal::Integer(n),
            Token::Float(n) => Literal::Float(n),
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Null => Literal::Null,
        }
        .map(Expr::Literal);

        // Named argument keys: `title: ...` or `"root-title": ...`
        let key = choice((
            identifier.clone().map(|id| Spanned::new(id.node.0, id.span)),
            string_literal,
        ));

        // Named must be tried first; a bare string is also a positional value
        let argument = choice((
            key.then_ignore(just(Token::Colon))
                .then(expr.clone())
                .map(|(key, value)| Argument::Named { key, value }),
            expr.clone().map(Argument::Positional),
        ));

        let call = identifier
            .clone()
            .then(
                argument
                    .separated_by(just(Token::Comma))
                    .allow_trailing()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
            )
            .map(|(function, args)| Expr::Call { function, args });

        let variable = identifier
            .clone()
            .then(
                just(Token::Dot)
                    .ignore_then(identifier)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(first, rest)| {
                let mut path = vec![first];
                path.extend(rest);
                Expr::Variable(path)
            });

        // Call before variable: both start with an identifier
        let atom = choice((
            literal,
            call,
            variable,
            expr.clone()
                .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
                .map(|inner: Spanned<Expr>| inner.node),
        ))
        .map_with(|node, e| Spanned::new(node, span_range(&e.span())));

        atom.clone()
            .then(
                just(Token::Fallback)
                    .ignore_then(atom)
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(first, rest)| {
                rest.into_iter().fold(first, |value, fallback| {
                    let span = value.span.start..fallback.span.end;
                    Spanned::new(
                        Expr::Fallback {
                            value: Box::new(value),
                            fallback: Box::new(fallback),
                        },
                        span,
                    )
                })
            })
            .boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_tag(input: &str) -> Expr {
        let doc = parse(input).expect("Should parse");
        assert_eq!(doc.segments.len(), 1);
        match &doc.segments[0].node {
            Segment::Tag(expr) => expr.node.clone(),
            other => panic!("Expected tag, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_plain_text() {
        let doc = parse("<h1>Hello</h1>").expect("Should parse");
        assert_eq!(
            doc.segments,
            vec![Spanned::new(Segment::Text("<h1>Hello</h1>".to_string()), 0..14)]
        );
    }

    #[test]
    fn test_parse_empty_input() {
        let doc = parse("").expect("Should parse");
        assert!(doc.segments.is_empty());
    }

    #[test]
    fn test_parse_text_around_tag() {
        let doc = parse("<title>{{ title }}</title>").expect("Should parse");
        assert_eq!(doc.segments.len(), 3);
        assert_eq!(doc.segments[0].node, Segment::Text("<title>".to_string()));
        assert_eq!(doc.segments[1].span, 7..18);
        assert_eq!(doc.segments[2].node, Segment::Text("</title>".to_string()));
    }

    #[test]
    fn test_parse_variable_path() {
        match single_tag("{{ user.name }}") {
            Expr::Variable(path) => {
                let names: Vec<_> = path.iter().map(|p| p.node.as_str()).collect();
                assert_eq!(names, vec!["user", "name"]);
                assert_eq!(path[0].span, 3..7);
            }
            other => panic!("Expected variable, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_get_with_default() {
        match single_tag(r#"{{ get("title", "layouts default") }}"#) {
            Expr::Call { function, args } => {
                assert_eq!(function.node.as_str(), "get");
                assert_eq!(args.len(), 2);
                assert!(matches!(
                    &args[1],
                    Argument::Positional(Spanned { node: Expr::Literal(Literal::String(s)), .. })
                        if s == "layouts default"
                ));
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_named_arguments() {
        match single_tag(r#"{{ include_child("partial", title: "MAIN", "data-id": 3,) }}"#) {
            Expr::Call { args, .. } => {
                assert_eq!(args.len(), 3);
                match &args[1] {
                    Argument::Named { key, value } => {
                        assert_eq!(key.node, "title");
                        assert_eq!(value.node, Expr::Literal(Literal::String("MAIN".into())));
                    }
                    other => panic!("Expected named argument, got {:?}", other),
                }
                match &args[2] {
                    Argument::Named { key, value } => {
                        assert_eq!(key.node, "data-id");
                        assert_eq!(value.node, Expr::Literal(Literal::Integer(3)));
                    }
                    other => panic!("Expected named argument, got {:?}", other),
                }
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_fallback_chain() {
        match single_tag(r#"{{ title ?? subtitle ?? "..." }}"#) {
            Expr::Fallback { value, fallback } => {
                assert!(matches!(value.node, Expr::Fallback { .. }));
                assert_eq!(fallback.node, Expr::Literal(Literal::String("...".into())));
            }
            other => panic!("Expected fallback, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_call() {
        match single_tag(r#"{{ raw(get("body")) }}"#) {
            Expr::Call { function, args } => {
                assert_eq!(function.node.as_str(), "raw");
                assert!(matches!(
                    &args[0],
                    Argument::Positional(Spanned { node: Expr::Call { .. }, .. })
                ));
            }
            other => panic!("Expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_comment() {
        let doc = parse("a{# note {{ ignored }} #}b").expect("Should parse");
        assert_eq!(doc.segments.len(), 3);
        assert_eq!(doc.segments[1].node, Segment::Comment);
    }

    #[test]
    fn test_close_braces_inside_string() {
        match single_tag(r#"{{ "}}" }}"#) {
            Expr::Literal(Literal::String(s)) => assert_eq!(s, "}}"),
            other => panic!("Expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_tag_error() {
        let errors = parse("<p>{{ title </p>").unwrap_err();
        assert_eq!(errors.len(), 1);
        let ParseError::Syntax { span, message, .. } = &errors[0];
        assert_eq!(span.start, 3);
        assert_eq!(message, "Unclosed tag");
    }

    #[test]
    fn test_empty_tag_error() {
        assert!(parse("{{ }}").is_err());
    }

    #[test]
    fn test_unexpected_character_error() {
        let errors = parse("ok {{ $title }}").unwrap_err();
        let ParseError::Syntax { span, message, .. } = &errors[0];
        assert_eq!(*span, 6..7);
        assert!(message.contains('$'));
    }

    #[test]
    fn test_errors_collected_from_every_tag() {
        let errors = parse("{{ ( }} and {{ get( }}").unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_integer_out_of_range_error() {
        let errors = parse("{{ get(\"n\", 99999999999999999999) }}").unwrap_err();
        let ParseError::Syntax { span, message, .. } = &errors[0];
        assert_eq!(*span, 12..32);
        assert_eq!(message, "Integer literal 99999999999999999999 out of range");
    }
}
