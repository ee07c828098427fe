use serde::Serialize;
pub use yaral_core::{Span, Spanned};

pub type Identifier = String;

/// Every rule parsed from one source file.
#[salsa::tracked(debug)]
pub struct RuleSet<'db> {
    #[tracked]
    #[returns(ref)]
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Rule {
    pub name: Identifier,
    pub name_span: Span,
    pub sections: Vec<Section>,
    pub span: Span,
}

impl Rule {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind == kind)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    #[display("meta")]
    Meta,
    #[display("events")]
    Events,
    #[display("match")]
    Match,
    #[display("outcome")]
    Outcome,
    #[display("condition")]
    Condition,
    #[display("options")]
    Options,
}

impl SectionKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword {
            "meta" => SectionKind::Meta,
            "events" => SectionKind::Events,
            "match" => SectionKind::Match,
            "outcome" => SectionKind::Outcome,
            "condition" => SectionKind::Condition,
            "options" => SectionKind::Options,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Statement {
    Assignment(Assignment),
    Declaration(Declaration),
    Expression(Spanned<Expr>),
    Match(MatchExpression),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Assignment(assignment) => assignment.span,
            Statement::Declaration(declaration) => declaration.span,
            Statement::Expression((_, span)) => *span,
            Statement::Match(expression) => expression.span,
        }
    }
}

/// `left = right` where one side is a bare variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Assignment {
    pub left: Spanned<Expr>,
    pub right: Spanned<Expr>,
    pub span: Span,
}

/// `name = value`, as found in `meta` and `options`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Declaration {
    pub name: Identifier,
    pub value: Spanned<Literal>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Literal {
    String(String),
    Integer(i64),
    Boolean(bool),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Expr {
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Call(CallExpression),
    ReferenceList(ReferenceListExpression),
    Index(IndexExpression),
    Variable(Variable),
    String(String),
    Integer(i64),
    /// Kept as written; `1.` and `.5` are both valid.
    Float(String),
    Regex(String),
    Null,
    Paren(Box<Spanned<Expr>>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operand: Box<Spanned<Expr>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
pub enum UnaryOperator {
    #[display("all")]
    All,
    #[display("any")]
    Any,
    #[display("not")]
    Not,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BinaryExpression {
    pub left: Box<Spanned<Expr>>,
    pub operator: BinaryOperator,
    pub right: Box<Spanned<Expr>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
pub enum BinaryOperator {
    #[display("*")]
    Multiply,
    #[display("/")]
    Divide,
    #[display("+")]
    Add,
    #[display("-")]
    Subtract,
    #[display("=")]
    Equal,
    #[display("!=")]
    NotEqual,
    #[display("<")]
    Less,
    #[display("<=")]
    LessEqual,
    #[display(">")]
    Greater,
    #[display(">=")]
    GreaterEqual,
    #[display("and")]
    And,
    #[display("or")]
    Or,
}

impl BinaryOperator {
    pub fn from_token(token: &str) -> Option<Self> {
        let operator = match token {
            "*" => BinaryOperator::Multiply,
            "/" => BinaryOperator::Divide,
            "+" => BinaryOperator::Add,
            "-" => BinaryOperator::Subtract,
            "=" => BinaryOperator::Equal,
            "!=" => BinaryOperator::NotEqual,
            "<" => BinaryOperator::Less,
            "<=" => BinaryOperator::LessEqual,
            ">" => BinaryOperator::Greater,
            ">=" => BinaryOperator::GreaterEqual,
            "and" => BinaryOperator::And,
            "or" => BinaryOperator::Or,
            _ => return None,
        };
        Some(operator)
    }
}

/// `re.regex(...)` has namespace `re` and name `regex`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CallExpression {
    pub namespace: Option<Identifier>,
    pub name: Identifier,
    pub arguments: Vec<Spanned<Expr>>,
}

/// `$v [not] in [regex|cidr] %list`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ReferenceListExpression {
    pub variable: Spanned<Variable>,
    pub negated: bool,
    pub kind: ReferenceListKind,
    pub list: Identifier,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ReferenceListKind {
    Plain,
    Regex,
    Cidr,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct IndexExpression {
    pub operand: Spanned<Variable>,
    pub index: Spanned<Literal>,
}

/// `$name` optionally followed by a dotted attribute path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Variable {
    pub name: Identifier,
    /// Path without the leading dot, e.g. `metadata.event_type`.
    pub attribute: Option<String>,
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.name)?;
        if let Some(attribute) = &self.attribute {
            write!(f, ".{attribute}")?;
        }
        Ok(())
    }
}

/// `$a, $b [not] over 5m [before|after $c]`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MatchExpression {
    pub variables: Vec<Spanned<Variable>>,
    pub window: Option<MatchWindow>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MatchWindow {
    pub negated: bool,
    pub duration: Duration,
    pub anchor: Option<MatchAnchor>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct MatchAnchor {
    pub position: AnchorPosition,
    pub variable: Spanned<Variable>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AnchorPosition {
    Before,
    After,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Duration {
    pub value: u64,
    pub unit: DurationUnit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DurationUnit {
    Minutes,
    Hours,
    Days,
}
