//! Built-in renderer evaluating `{{ ... }}` tags
//!
//! Bodies are parsed on every render; nothing is cached between calls.

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use serde_json::Value;

use super::diagnostic::{escape_html, ErrorReporter};
use super::error::{line_of, ErrorCode, ExecutionError};
use super::{RenderConfig, RenderScope, Renderer, Variables};
use crate::parser::{parse, Argument, Expr, Identifier, Literal, Segment, Span, Spanned};
use crate::template::{Lookup, Placeholders};

/// Renderer for the tag syntax: text passes through, tags are evaluated
#[derive(Debug, Clone, Copy, Default)]
pub struct TagRenderer;

impl Renderer for TagRenderer {
    fn execute(&self, file: &Path, scope: &mut RenderScope<'_>) -> Result<String, ExecutionError> {
        let source = fs::read_to_string(file)
            .map_err(|e| ExecutionError::new(ErrorCode::Read, file, e.to_string()))?;
        let document =
            parse(&source).map_err(|errors| ExecutionError::from_parse(file, &source, &errors))?;

        let config = scope.config().clone();
        let mut out = String::with_capacity(source.len());
        for segment in &document.segments {
            match &segment.node {
                Segment::Text(text) => out.push_str(text),
                Segment::Comment => {}
                Segment::Tag(expr) => {
                    let output = evaluate(expr, scope).map_err(|e| {
                        ExecutionError::new(e.code, file, e.message).with_line(line_of(&source, &e.span))
                    })?;
                    write_output(&mut out, output, &config);
                }
            }
        }
        Ok(out)
    }
}

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
enum Output {
    /// Placeholder data, escaped on output
    Value(Value),
    /// Already rendered markup
    Markup(String),
    /// Placeholder resolved nowhere in the chain
    Undefined(String),
}

#[derive(Debug)]
struct EvalError {
    code: ErrorCode,
    message: String,
    span: Span,
}

impl EvalError {
    fn new(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span,
        }
    }
}

fn evaluate(expr: &Spanned<Expr>, scope: &mut RenderScope<'_>) -> Result<Output, EvalError> {
    match &expr.node {
        Expr::Literal(lit) => Ok(Output::Value(literal_value(lit))),
        Expr::Variable(path) => lookup_variable(path, scope.variables()).map(Output::Value),
        Expr::Fallback { value, fallback } => match evaluate(value, scope) {
            Ok(Output::Undefined(_)) | Ok(Output::Value(Value::Null)) => evaluate(fallback, scope),
            Err(err) if err.code == ErrorCode::UndefinedVariable => evaluate(fallback, scope),
            other => other,
        },
        Expr::Call { function, args } => call(function, args, &expr.span, scope),
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Integer(n) => Value::from(*n),
        Literal::Float(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

fn lookup_variable(path: &[Spanned<Identifier>], variables: &Variables) -> Result<Value, EvalError> {
    let undefined = |upto: usize| {
        let name = path[..=upto]
            .iter()
            .map(|p| p.node.as_str())
            .collect::<Vec<_>>()
            .join(".");
        EvalError::new(
            ErrorCode::UndefinedVariable,
            format!("undefined variable \"{}\"", name),
            path[upto].span.clone(),
        )
    };

    let Some((first, rest)) = path.split_first() else {
        return Err(EvalError::new(ErrorCode::Syntax, "empty variable path", 0..0));
    };
    let mut value = variables.get(first.node.as_str()).ok_or_else(|| undefined(0))?;
    for (i, segment) in rest.iter().enumerate() {
        value = value
            .get(segment.node.as_str())
            .ok_or_else(|| undefined(i + 1))?;
    }
    Ok(value.clone())
}

/// Arguments of one call split by kind
struct CallArgs<'e> {
    positional: Vec<&'e Spanned<Expr>>,
    named: Vec<(&'e Spanned<String>, &'e Spanned<Expr>)>,
}

impl<'e> CallArgs<'e> {
    fn split(args: &'e [Argument]) -> Self {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        for arg in args {
            match arg {
                Argument::Positional(expr) => positional.push(expr),
                Argument::Named { key, value } => named.push((key, value)),
            }
        }
        Self { positional, named }
    }

    fn check(
        &self,
        function: &str,
        count: RangeInclusive<usize>,
        named_allowed: bool,
        span: &Span,
    ) -> Result<(), EvalError> {
        if !named_allowed {
            if let Some((key, _)) = self.named.first() {
                return Err(EvalError::new(
                    ErrorCode::Argument,
                    format!("{}() takes no named arguments", function),
                    key.span.clone(),
                ));
            }
        }
        if !count.contains(&self.positional.len()) {
            let expected = if count.start() == count.end() {
                count.start().to_string()
            } else {
                format!("{} to {}", count.start(), count.end())
            };
            return Err(EvalError::new(
                ErrorCode::Argument,
                format!(
                    "{}() expects {} argument(s), got {}",
                    function,
                    expected,
                    self.positional.len()
                ),
                span.clone(),
            ));
        }
        Ok(())
    }

    /// Evaluate named arguments into a placeholder store
    fn placeholders(&self, scope: &mut RenderScope<'_>) -> Result<Placeholders, EvalError> {
        let mut placeholders = Placeholders::new();
        for (key, value) in &self.named {
            let value = into_value(evaluate(value, scope)?).unwrap_or(Value::Null);
            placeholders.set(key.node.clone(), value);
        }
        Ok(placeholders)
    }
}

fn call(
    function: &Spanned<Identifier>,
    args: &[Argument],
    span: &Span,
    scope: &mut RenderScope<'_>,
) -> Result<Output, EvalError> {
    let name = function.node.as_str();
    let args = CallArgs::split(args);

    match name {
        "get" => {
            args.check(name, 1..=2, false, span)?;
            let key = string_arg(name, args.positional[0], scope)?;
            let default = match args.positional.get(1) {
                Some(expr) => into_value(evaluate(expr, scope)?),
                None => None,
            };
            Ok(match scope.get(&key, default) {
                Lookup::Found(v) | Lookup::UsedDefault(v) => Output::Value(v),
                Lookup::Undefined(key) => Output::Undefined(key),
            })
        }
        "include_child" => {
            args.check(name, 1..=1, true, span)?;
            let child = string_arg(name, args.positional[0], scope)?;
            let overrides = args.placeholders(scope)?;
            Ok(Output::Markup(scope.include_child(&child, &overrides)))
        }
        "include" => {
            args.check(name, 1..=1, true, span)?;
            let file = string_arg(name, args.positional[0], scope)?;
            let placeholders = args.placeholders(scope)?;
            Ok(Output::Markup(scope.include(&file, placeholders)))
        }
        "raw" => {
            args.check(name, 1..=1, false, span)?;
            let output = evaluate(args.positional[0], scope)?;
            let mut out = String::new();
            let config = scope.config().clone().with_escape_html(false);
            write_output(&mut out, output, &config);
            Ok(Output::Markup(out))
        }
        "qualified_name" => {
            args.check(name, 0..=0, false, span)?;
            Ok(Output::Value(Value::String(scope.qualified_name())))
        }
        _ => Err(EvalError::new(
            ErrorCode::UnknownFunction,
            format!("unknown function \"{}\"", name),
            function.span.clone(),
        )),
    }
}

fn string_arg(
    function: &str,
    expr: &Spanned<Expr>,
    scope: &mut RenderScope<'_>,
) -> Result<String, EvalError> {
    match evaluate(expr, scope)? {
        Output::Value(Value::String(s)) => Ok(s),
        _ => Err(EvalError::new(
            ErrorCode::Argument,
            format!("{}() expects a string argument", function),
            expr.span.clone(),
        )),
    }
}

/// Data value of an output; undefined placeholders have none
fn into_value(output: Output) -> Option<Value> {
    match output {
        Output::Value(v) => Some(v),
        Output::Markup(m) => Some(Value::String(m)),
        Output::Undefined(_) => None,
    }
}

/// Text form of a value: strings as-is, `null` empty, containers as JSON
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn write_output(out: &mut String, output: Output, config: &RenderConfig) {
    match output {
        Output::Value(value) => {
            let text = value_to_text(&value);
            if config.escape_html {
                out.push_str(&escape_html(&text));
            } else {
                out.push_str(&text);
            }
        }
        Output::Markup(markup) => out.push_str(&markup),
        Output::Undefined(key) => out.push_str(&ErrorReporter::new(config).undefined(&key)),
    }
}
