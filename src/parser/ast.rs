//! Abstract Syntax Tree types for template files

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric + underscore, starts with letter/_)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Root AST node - a parsed template file
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub segments: Vec<Spanned<Segment>>,
}

/// A run of literal text, an output tag or a comment
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Text copied to the output verbatim
    Text(String),
    /// `{{ expr }}`
    Tag(Spanned<Expr>),
    /// `{# ... #}`
    Comment,
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// Expression inside an output tag
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// Dotted variable path like `user.name`
    Variable(Vec<Spanned<Identifier>>),
    /// Function call like `include_child("header", title: "Home")`
    Call {
        function: Spanned<Identifier>,
        args: Vec<Argument>,
    },
    /// `value ?? fallback`
    Fallback {
        value: Box<Spanned<Expr>>,
        fallback: Box<Spanned<Expr>>,
    },
}

/// Function call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Spanned<Expr>),
    /// `key: value`, the key may be an identifier or a string
    Named {
        key: Spanned<String>,
        value: Spanned<Expr>,
    },
}

impl Argument {
    /// Span of the whole argument
    pub fn span(&self) -> Span {
        match self {
            Argument::Positional(expr) => expr.span.clone(),
            Argument::Named { key, value } => key.span.start..value.span.end,
        }
    }
}
