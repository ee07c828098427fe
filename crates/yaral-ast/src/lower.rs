//! Lowering from the concrete syntax tree to the typed AST.
//!
//! Syntax errors are collected from the tree first: every `ERROR` node and
//! every `MISSING` node becomes one [`LowerError`]. Statements that contain
//! such nodes are then skipped, so a single broken statement never hides the
//! rest of the rule.

use salsa::Accumulator;
use tree_sitter::{Node, Tree};
use yaral_core::{CompilationPhase, Diagnostic, SourceFile};

use crate::ast::*;
use crate::escape::{StringLiteralError, process_escape_sequences};
use crate::parser::parse_with_thread_local;

/// Expressions nested deeper than this are rejected instead of lowered.
pub const MAX_EXPRESSION_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum LowerError {
    #[display("unexpected `{text}`")]
    Unexpected { text: String, span: Span },
    #[display("missing {expected}")]
    Missing { expected: String, span: Span },
    #[display("unexpected {kind} node")]
    UnexpectedNode { kind: &'static str, span: Span },
    #[display("invalid integer literal `{text}`")]
    InvalidInteger { text: String, span: Span },
    #[display("invalid string literal: {error}")]
    InvalidString { error: StringLiteralError, span: Span },
    #[display("expression is nested more than {limit} levels deep")]
    NestingTooDeep { limit: usize, span: Span },
}

impl LowerError {
    pub fn span(&self) -> Span {
        match self {
            LowerError::Unexpected { span, .. }
            | LowerError::Missing { span, .. }
            | LowerError::UnexpectedNode { span, .. }
            | LowerError::InvalidInteger { span, .. }
            | LowerError::InvalidString { span, .. }
            | LowerError::NestingTooDeep { span, .. } => *span,
        }
    }

    pub fn phase(&self) -> CompilationPhase {
        match self {
            LowerError::Unexpected { .. } | LowerError::Missing { .. } => CompilationPhase::Parsing,
            _ => CompilationPhase::Lowering,
        }
    }
}

/// Result of lowering one tree. `errors` is ordered by position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lowered {
    pub rules: Vec<Rule>,
    pub errors: Vec<LowerError>,
}

pub fn lower_tree(tree: &Tree, source: &str) -> Lowered {
    let mut lowerer = Lowerer {
        source,
        errors: Vec::new(),
    };
    let root = tree.root_node();
    lowerer.collect_syntax_errors(root);

    let mut rules = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "rule_definition" {
            rules.push(lowerer.lower_rule(child));
        }
    }

    let mut errors = lowerer.errors;
    errors.sort_by_key(|error| error.span().start);
    Lowered { rules, errors }
}

#[salsa::tracked]
pub fn parse_source_file<'db>(db: &'db dyn salsa::Database, source: SourceFile) -> RuleSet<'db> {
    let text = source.text(db);
    let tree = match parse_with_thread_local(text, None) {
        Ok(Some(tree)) => tree,
        Ok(None) => return RuleSet::new(db, Vec::new()),
        Err(err) => {
            Diagnostic::error(
                CompilationPhase::Parsing,
                Span::default(),
                format!("Error loading Yaral grammar: {err}"),
            )
            .accumulate(db);
            return RuleSet::new(db, Vec::new());
        }
    };

    let lowered = lower_tree(&tree, text);
    tracing::debug!(
        path = %source.path(db).display(),
        rules = lowered.rules.len(),
        errors = lowered.errors.len(),
        "parsed source file"
    );
    for error in &lowered.errors {
        Diagnostic::error(error.phase(), error.span(), error.to_string()).accumulate(db);
    }
    RuleSet::new(db, lowered.rules)
}

fn span_of(node: Node<'_>) -> Span {
    Span::from(node.byte_range())
}

fn unexpected_node(node: Node<'_>) -> LowerError {
    LowerError::UnexpectedNode {
        kind: node.kind(),
        span: span_of(node),
    }
}

/// First line of `text`, shortened for messages.
fn snippet(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    match line.char_indices().nth(40) {
        Some((end, _)) => format!("{}...", &line[..end]),
        None => line.to_string(),
    }
}

struct Lowerer<'s> {
    source: &'s str,
    errors: Vec<LowerError>,
}

impl<'s> Lowerer<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    /// Reports every `ERROR` and `MISSING` node, descending only into
    /// subtrees that contain one.
    fn collect_syntax_errors(&mut self, root: Node<'_>) {
        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            let descend = if node.is_error() {
                self.errors.push(LowerError::Unexpected {
                    text: snippet(self.text(node)),
                    span: span_of(node),
                });
                false
            } else if node.is_missing() {
                let expected = if node.is_named() {
                    node.kind().replace('_', " ")
                } else {
                    format!("`{}`", node.kind())
                };
                self.errors.push(LowerError::Missing {
                    expected,
                    span: span_of(node),
                });
                false
            } else {
                node.has_error()
            };

            if descend && cursor.goto_first_child() {
                continue;
            }
            while !cursor.goto_next_sibling() {
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    fn field<'t>(&self, node: Node<'t>, name: &'static str) -> Result<Node<'t>, LowerError> {
        node.child_by_field_name(name)
            .ok_or_else(|| LowerError::Missing {
                expected: name.to_string(),
                span: span_of(node),
            })
    }

    fn first_named<'t>(&self, node: Node<'t>) -> Result<Node<'t>, LowerError> {
        let mut cursor = node.walk();
        let first = node
            .named_children(&mut cursor)
            .find(|child| !child.is_extra());
        first.ok_or_else(|| LowerError::Missing {
            expected: "expression".to_string(),
            span: span_of(node),
        })
    }

    fn lower_rule(&mut self, node: Node<'_>) -> Rule {
        let (name, name_span) = match node.child_by_field_name("name") {
            Some(name) => (self.text(name).to_string(), span_of(name)),
            None => (String::new(), span_of(node)),
        };

        let mut sections = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "section"
                && let Some(section) = self.lower_section(child)
            {
                sections.push(section);
            }
        }

        Rule {
            name,
            name_span,
            sections,
            span: span_of(node),
        }
    }

    fn lower_section(&mut self, node: Node<'_>) -> Option<Section> {
        let mut cursor = node.walk();
        let key = node
            .children(&mut cursor)
            .find(|child| child.kind() == "section_key")?;
        let kind = SectionKind::from_keyword(self.text(key))?;

        let mut statements = Vec::new();
        for child in node.named_children(&mut cursor) {
            // Syntax errors inside were reported by `collect_syntax_errors`.
            if child.is_extra() || child.has_error() || child.kind() == "section_key" {
                continue;
            }
            match self.lower_statement(child, kind) {
                Ok(statement) => statements.push(statement),
                Err(error) => self.errors.push(error),
            }
        }

        Some(Section {
            kind,
            statements,
            span: span_of(node),
        })
    }

    /// A lone `$var` parses the same way in every section; the section it
    /// appears in decides whether it is a match key or an expression.
    fn lower_statement(&self, node: Node<'_>, section: SectionKind) -> Result<Statement, LowerError> {
        let span = span_of(node);
        match node.kind() {
            "assignment_statement" => {
                let left = self.lower_expr(self.field(node, "left")?, 0)?;
                let right = self.lower_expr(self.field(node, "right")?, 0)?;
                Ok(Statement::Assignment(Assignment { left, right, span }))
            }
            "declaration_statement" => {
                let name = self.text(self.field(node, "left")?).to_string();
                let value = self.lower_literal(self.field(node, "right")?)?;
                Ok(Statement::Declaration(Declaration { name, value, span }))
            }
            "expression_statement" => match self.lower_expr(self.first_named(node)?, 0)? {
                (Expr::Variable(variable), variable_span) if section == SectionKind::Match => {
                    Ok(Statement::Match(MatchExpression {
                        variables: vec![(variable, variable_span)],
                        window: None,
                        span,
                    }))
                }
                expr => Ok(Statement::Expression(expr)),
            },
            "match_statement" => {
                let mut expression = self.lower_match(self.first_named(node)?)?;
                if section != SectionKind::Match
                    && expression.window.is_none()
                    && expression.variables.len() == 1
                    && let Some((variable, variable_span)) = expression.variables.pop()
                {
                    return Ok(Statement::Expression((Expr::Variable(variable), variable_span)));
                }
                Ok(Statement::Match(expression))
            }
            _ => Err(unexpected_node(node)),
        }
    }

    fn lower_literal(&self, node: Node<'_>) -> Result<Spanned<Literal>, LowerError> {
        let literal = match node.kind() {
            "raw_string_literal" => Literal::String(self.raw_string(node)),
            "interpreted_string_literal" => Literal::String(self.interpreted_string(node)?),
            "integer_literal" => Literal::Integer(self.integer(node)?),
            "boolean_literal" => {
                Literal::Boolean(node.child(0).is_some_and(|value| value.kind() == "true"))
            }
            _ => return Err(unexpected_node(node)),
        };
        Ok((literal, span_of(node)))
    }

    fn lower_expr(&self, node: Node<'_>, depth: usize) -> Result<Spanned<Expr>, LowerError> {
        if depth > MAX_EXPRESSION_DEPTH {
            return Err(LowerError::NestingTooDeep {
                limit: MAX_EXPRESSION_DEPTH,
                span: span_of(node),
            });
        }
        let expr = match node.kind() {
            "unary_expression" => {
                let operator = match self.field(node, "operator")?.kind() {
                    "all" => UnaryOperator::All,
                    "any" => UnaryOperator::Any,
                    _ => UnaryOperator::Not,
                };
                let operand = self.lower_expr(self.field(node, "operand")?, depth + 1)?;
                Expr::Unary(UnaryExpression {
                    operator,
                    operand: Box::new(operand),
                })
            }
            "binary_expression" => {
                let operator = self.field(node, "operator")?;
                let operator =
                    BinaryOperator::from_token(operator.kind()).ok_or_else(|| unexpected_node(operator))?;
                let left = self.lower_expr(self.field(node, "left")?, depth + 1)?;
                let right = self.lower_expr(self.field(node, "right")?, depth + 1)?;
                Expr::Binary(BinaryExpression {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                })
            }
            "call_expression" => Expr::Call(self.lower_call(node, depth)?),
            "reference_list_expression" => Expr::ReferenceList(self.lower_reference_list(node)?),
            "index_expression" => Expr::Index(IndexExpression {
                operand: self.lower_variable(self.field(node, "operand")?)?,
                index: self.lower_literal(self.field(node, "index")?)?,
            }),
            "variable_identifier" => Expr::Variable(self.lower_variable(node)?.0),
            "interpreted_string_literal" => Expr::String(self.interpreted_string(node)?),
            "raw_string_literal" => Expr::String(self.raw_string(node)),
            "integer_literal" => Expr::Integer(self.integer(node)?),
            "float_literal" => Expr::Float(self.text(node).to_string()),
            "regex_literal" => {
                let text = self.text(node);
                let pattern = text
                    .strip_prefix('/')
                    .and_then(|rest| rest.strip_suffix('/'))
                    .unwrap_or(text);
                Expr::Regex(pattern.to_string())
            }
            "null" => Expr::Null,
            "parenthesized_expression" => Expr::Paren(Box::new(
                self.lower_expr(self.first_named(node)?, depth + 1)?,
            )),
            _ => return Err(unexpected_node(node)),
        };
        Ok((expr, span_of(node)))
    }

    fn lower_call(&self, node: Node<'_>, depth: usize) -> Result<CallExpression, LowerError> {
        let function = self.field(node, "function")?;
        let operand = self.text(self.field(function, "operand")?).to_string();
        let mut cursor = function.walk();
        // `field` spans both the `.` and the member name.
        let member = function
            .children_by_field_name("field", &mut cursor)
            .find(|child| child.is_named());
        let (namespace, name) = match member {
            Some(member) => (Some(operand), self.text(member).to_string()),
            None => (None, operand),
        };

        let arguments = self.field(node, "arguments")?;
        let mut cursor = arguments.walk();
        let arguments = arguments
            .named_children(&mut cursor)
            .filter(|child| !child.is_extra())
            .map(|argument| self.lower_expr(argument, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CallExpression {
            namespace,
            name,
            arguments,
        })
    }

    fn lower_reference_list(&self, node: Node<'_>) -> Result<ReferenceListExpression, LowerError> {
        let mut cursor = node.walk();
        let named: Vec<Node<'_>> = node
            .named_children(&mut cursor)
            .filter(|child| !child.is_extra())
            .collect();
        let variable = match named.first() {
            Some(variable) => self.lower_variable(*variable)?,
            None => return Err(unexpected_node(node)),
        };
        let list = match named.last() {
            Some(list) if list.kind() == "identifier" => self.text(*list).to_string(),
            _ => {
                return Err(LowerError::Missing {
                    expected: "reference list name".to_string(),
                    span: span_of(node),
                });
            }
        };

        let tokens: Vec<&str> = node.children(&mut cursor).map(|child| child.kind()).collect();
        let kind = if tokens.contains(&"regex") {
            ReferenceListKind::Regex
        } else if tokens.contains(&"cidr") {
            ReferenceListKind::Cidr
        } else {
            ReferenceListKind::Plain
        };

        Ok(ReferenceListExpression {
            variable,
            negated: tokens.contains(&"not"),
            kind,
            list,
        })
    }

    fn lower_variable(&self, node: Node<'_>) -> Result<Spanned<Variable>, LowerError> {
        if node.kind() != "variable_identifier" {
            return Err(unexpected_node(node));
        }
        let mut cursor = node.walk();
        let name = node
            .named_children(&mut cursor)
            .find(|child| child.kind() == "identifier")
            .map(|name| self.text(name).to_string())
            .unwrap_or_default();
        let attribute = node.child_by_field_name("attribute").map(|attribute| {
            let text = self.text(attribute);
            text.strip_prefix('.').unwrap_or(text).to_string()
        });
        Ok((Variable { name, attribute }, span_of(node)))
    }

    fn lower_match(&self, node: Node<'_>) -> Result<MatchExpression, LowerError> {
        let mut variables = Vec::new();
        let mut negated = false;
        let mut duration = None;
        let mut position = None;
        let mut anchor = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor).filter(|child| !child.is_extra()) {
            match child.kind() {
                "variable_identifier" if position.is_some() => {
                    anchor = Some(self.lower_variable(child)?);
                }
                "variable_identifier" => variables.push(self.lower_variable(child)?),
                "not" => negated = true,
                "duration_literal" => duration = Some(self.lower_duration(child)?),
                "before" => position = Some(AnchorPosition::Before),
                "after" => position = Some(AnchorPosition::After),
                _ => {}
            }
        }

        let window = duration.map(|duration| MatchWindow {
            negated,
            duration,
            anchor: position
                .zip(anchor)
                .map(|(position, variable)| MatchAnchor { position, variable }),
        });
        Ok(MatchExpression {
            variables,
            window,
            span: span_of(node),
        })
    }

    /// `5m`: comments may sit between the count and the unit.
    fn lower_duration(&self, node: Node<'_>) -> Result<Duration, LowerError> {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node
            .children(&mut cursor)
            .filter(|child| !child.is_extra())
            .collect();

        let value = children
            .iter()
            .find(|child| child.kind() == "integer_literal")
            .ok_or_else(|| unexpected_node(node))?;
        let text = self.text(*value);
        let value = text.parse::<u64>().map_err(|_| LowerError::InvalidInteger {
            text: text.to_string(),
            span: span_of(*value),
        })?;

        let unit = children
            .iter()
            .find_map(|child| match child.kind() {
                "m" => Some(DurationUnit::Minutes),
                "h" => Some(DurationUnit::Hours),
                "d" => Some(DurationUnit::Days),
                _ => None,
            })
            .ok_or_else(|| LowerError::Missing {
                expected: "duration unit".to_string(),
                span: span_of(node),
            })?;
        Ok(Duration { value, unit })
    }

    fn integer(&self, node: Node<'_>) -> Result<i64, LowerError> {
        let text = self.text(node);
        text.parse().map_err(|_| LowerError::InvalidInteger {
            text: text.to_string(),
            span: span_of(node),
        })
    }

    fn raw_string(&self, node: Node<'_>) -> String {
        let text = self.text(node);
        text.strip_prefix('`')
            .and_then(|rest| rest.strip_suffix('`'))
            .unwrap_or(text)
            .to_string()
    }

    fn interpreted_string(&self, node: Node<'_>) -> Result<String, LowerError> {
        let text = self.text(node);
        let body = text
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(text);
        process_escape_sequences(body).map_err(|error| LowerError::InvalidString {
            error,
            span: span_of(node),
        })
    }
}
