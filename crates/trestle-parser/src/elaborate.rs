//! Elaboration of parsed statements into diagram trees.
//!
//! Statements are processed in source order. A `let` binding is visible to
//! every statement after it, and each `diagram` statement produces one
//! [`NamedDiagram`] whose root is built through the [`Node`] constructors.
//!
//! Elaboration does not stop at the first problem. A sub-expression that fails
//! yields no node and the failure is reported once; enclosing expressions then
//! give up silently so a single mistake does not cascade.

use indexmap::{IndexMap, map::Entry};
use log::{debug, info, trace};

use trestle_core::diagram::{Node, OptionalDefault};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types::{Expr, Statement},
    span::{Span, Spanned},
};

/// A diagram defined by a `diagram "Name" = ...;` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedDiagram {
    name: String,
    span: Span,
    root: Node,
}

impl NamedDiagram {
    /// Returns the diagram name as written in the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the span of the whole `diagram` statement.
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }
}

/// The builtin functions of the notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Terminal,
    NonTerminal,
    Comment,
    Skip,
    Sequence,
    Stack,
    Choice,
    Optional,
    OneOrMore,
    ZeroOrMore,
}

impl Builtin {
    const ALL: [Builtin; 10] = [
        Builtin::Terminal,
        Builtin::NonTerminal,
        Builtin::Comment,
        Builtin::Skip,
        Builtin::Sequence,
        Builtin::Stack,
        Builtin::Choice,
        Builtin::Optional,
        Builtin::OneOrMore,
        Builtin::ZeroOrMore,
    ];

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Terminal => "terminal",
            Self::NonTerminal => "nonterminal",
            Self::Comment => "comment",
            Self::Skip => "skip",
            Self::Sequence => "sequence",
            Self::Stack => "stack",
            Self::Choice => "choice",
            Self::Optional => "optional",
            Self::OneOrMore => "one_or_more",
            Self::ZeroOrMore => "zero_or_more",
        }
    }

    /// Minimum and maximum argument count; `None` means unbounded.
    fn arity(self) -> (usize, Option<usize>) {
        match self {
            Self::Terminal | Self::Comment => (1, Some(1)),
            Self::NonTerminal => (1, Some(2)),
            Self::Skip => (0, Some(0)),
            Self::Sequence | Self::Stack => (0, None),
            Self::Choice => (1, None),
            Self::Optional | Self::OneOrMore => (1, Some(2)),
            Self::ZeroOrMore => (1, Some(3)),
        }
    }

    fn signature(self) -> &'static str {
        match self {
            Self::Terminal => "terminal(text)",
            Self::NonTerminal => "nonterminal(text[, link])",
            Self::Comment => "comment(text)",
            Self::Skip => "skip()",
            Self::Sequence => "sequence(item, ...)",
            Self::Stack => "stack(row, ...)",
            Self::Choice => "choice(default_index, branch, ...)",
            Self::Optional => "optional(item[, skip|include])",
            Self::OneOrMore => "one_or_more(item[, separator])",
            Self::ZeroOrMore => "zero_or_more(item[, separator[, skip|include]])",
        }
    }
}

/// A `let` binding. `value` is `None` when its expression failed to elaborate.
#[derive(Debug)]
struct Binding {
    value: Option<Node>,
    span: Span,
    used: bool,
}

/// Builds named diagrams from parsed statements.
pub(crate) struct Builder<'src> {
    bindings: IndexMap<&'src str, Binding>,
    diagrams: IndexMap<String, NamedDiagram>,
    diagnostics: DiagnosticCollector,
}

impl<'src> Builder<'src> {
    pub fn new() -> Self {
        Self {
            bindings: IndexMap::new(),
            diagrams: IndexMap::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Elaborates every statement.
    ///
    /// Returns the diagrams in definition order together with any warnings,
    /// or every diagnostic collected if at least one of them is an error.
    pub fn build(
        mut self,
        statements: &[Spanned<Statement<'src>>],
    ) -> Result<(Vec<NamedDiagram>, Vec<Diagnostic>), ParseError> {
        debug!(statements = statements.len(); "Elaborating statements");

        for statement in statements {
            match statement.inner() {
                Statement::Let { name, value } => self.define_binding(name, value),
                Statement::Diagram { name, body } => {
                    self.define_diagram(name, body, statement.span())
                }
            }
        }

        self.warn_unused_bindings();

        let warnings = self.diagnostics.finish()?;
        let diagrams: Vec<NamedDiagram> = self.diagrams.into_values().collect();
        info!(diagrams = diagrams.len(), warnings = warnings.len(); "Elaboration completed");
        Ok((diagrams, warnings))
    }

    fn define_binding(&mut self, name: &Spanned<&'src str>, value: &Spanned<Expr<'src>>) {
        let node = self.node(value);

        match self.bindings.entry(*name.inner()) {
            Entry::Occupied(first) => {
                self.diagnostics.emit(
                    Diagnostic::error(format!("`{}` is already defined", name.inner()))
                        .with_code(ErrorCode::E301)
                        .with_label(name.span(), "defined again here")
                        .with_secondary_label(first.get().span, "first defined here")
                        .with_help("give the second binding a different name"),
                );
            }
            Entry::Vacant(slot) => {
                trace!(name = *name.inner(); "Defined binding");
                slot.insert(Binding {
                    value: node,
                    span: name.span(),
                    used: false,
                });
            }
        }
    }

    fn define_diagram(&mut self, name: &Spanned<String>, body: &[Spanned<Expr<'src>>], span: Span) {
        if let Some(existing) = self.diagrams.get(name.inner()) {
            self.diagnostics.emit(
                Diagnostic::error(format!("diagram `{}` is already defined", name.inner()))
                    .with_code(ErrorCode::E302)
                    .with_label(name.span(), "defined again here")
                    .with_secondary_label(existing.span, "first defined here")
                    .with_help("each diagram is written to its own file, so names must be unique"),
            );
            return;
        }

        // Elaborate every expression so all of their errors are reported
        let nodes: Vec<Option<Node>> = body.iter().map(|expr| self.node(expr)).collect();
        let Some(mut nodes) = nodes.into_iter().collect::<Option<Vec<Node>>>() else {
            return;
        };

        let root = if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Node::sequence(nodes)
        };

        debug!(name = name.inner().as_str(); "Elaborated diagram");
        self.diagrams.insert(
            name.inner().clone(),
            NamedDiagram {
                name: name.inner().clone(),
                span,
                root,
            },
        );
    }

    fn warn_unused_bindings(&mut self) {
        let unused: Vec<(&str, Span)> = self
            .bindings
            .iter()
            .filter(|(_, binding)| !binding.used)
            .map(|(name, binding)| (*name, binding.span))
            .collect();

        for (name, span) in unused {
            self.diagnostics.emit(
                Diagnostic::warning(format!("binding `{name}` is never used"))
                    .with_label(span, "defined here"),
            );
        }
    }

    // ============================================================================
    // Expressions
    // ============================================================================

    /// Elaborates an expression in diagram position.
    fn node(&mut self, expr: &Spanned<Expr<'src>>) -> Option<Node> {
        match expr.inner() {
            Expr::Literal(text) => Some(Node::terminal(text.as_str())),
            Expr::Integer(value) => {
                self.emit_kind_mismatch(
                    expr.span(),
                    "diagram expression",
                    &format!("integer {value}"),
                );
                None
            }
            Expr::Reference(name) => self.reference(name, expr.span()),
            Expr::Call { name, args } => self.call(name, args, expr.span()),
        }
    }

    fn reference(&mut self, name: &str, span: Span) -> Option<Node> {
        if let Some(binding) = self.bindings.get_mut(name) {
            binding.used = true;
            // A failed binding was already reported where it was defined
            return binding.value.clone();
        }

        let mut diagnostic = Diagnostic::error(format!("`{name}` is not defined"))
            .with_code(ErrorCode::E300)
            .with_label(span, "undefined binding");
        diagnostic = match Builtin::from_name(name) {
            Some(builtin) => diagnostic.with_help(format!(
                "`{name}` is a function; call it as `{}`",
                builtin.signature()
            )),
            None => {
                diagnostic.with_help("bindings must be defined with `let` before they are used")
            }
        };
        self.diagnostics.emit(diagnostic);
        None
    }

    fn call(
        &mut self,
        name: &Spanned<&'src str>,
        args: &[Spanned<Expr<'src>>],
        span: Span,
    ) -> Option<Node> {
        let Some(builtin) = Builtin::from_name(name.inner()) else {
            self.diagnostics.emit(
                Diagnostic::error(format!("unknown function `{}`", name.inner()))
                    .with_code(ErrorCode::E303)
                    .with_label(name.span(), "unknown function")
                    .with_help(format!(
                        "available functions: {}",
                        Builtin::ALL.map(Builtin::name).join(", ")
                    )),
            );
            return None;
        };

        if !self.check_arity(builtin, args.len(), span) {
            return None;
        }

        trace!(function = builtin.name(), args = args.len(); "Elaborating call");

        let result = match builtin {
            Builtin::Terminal => Ok(Node::terminal(self.string_arg(&args[0])?)),
            Builtin::NonTerminal => {
                let text = self.string_arg(&args[0]);
                let link = args.get(1).map(|arg| self.string_arg(arg));
                match (text?, link) {
                    (text, None) => Ok(Node::non_terminal(text)),
                    (text, Some(link)) => Ok(Node::linked_non_terminal(text, link?)),
                }
            }
            Builtin::Comment => Ok(Node::comment(self.string_arg(&args[0])?)),
            Builtin::Skip => Ok(Node::skip()),
            Builtin::Sequence => Ok(Node::sequence(self.node_args(args)?)),
            Builtin::Stack => Ok(Node::stack(self.node_args(args)?)),
            Builtin::Choice => {
                let default = self.integer_arg(&args[0]);
                let branches = self.node_args(&args[1..]);
                Node::choice(default?, branches?)
            }
            Builtin::Optional => {
                let content = self.node(&args[0]);
                let mode = args.get(1).map(|arg| self.mode_arg(arg));
                Ok(Node::optional(content?, given(mode)?.unwrap_or_default()))
            }
            Builtin::OneOrMore => {
                let item = self.node(&args[0]);
                let separator = args.get(1).map(|arg| self.node(arg));
                Node::one_or_more(item?, given(separator)?)
            }
            Builtin::ZeroOrMore => {
                let item = self.node(&args[0]);
                let separator = args.get(1).map(|arg| self.node(arg));
                let mode = args.get(2).map(|arg| self.mode_arg(arg));
                let (item, separator, mode) = (item?, given(separator)?, given(mode)?);
                match mode.unwrap_or_default() {
                    OptionalDefault::Skip => Node::zero_or_more(item, separator),
                    OptionalDefault::Include => Node::one_or_more(item, separator)
                        .map(|repeat| Node::optional(repeat, OptionalDefault::Include)),
                }
            }
        };

        match result {
            Ok(node) => Some(node),
            Err(err) => {
                self.diagnostics.emit(
                    Diagnostic::error(err.to_string())
                        .with_code(ErrorCode::E306)
                        .with_label(span, format!("invalid `{}`", builtin.name()))
                        .with_help(format!("expected {}", builtin.signature())),
                );
                None
            }
        }
    }

    fn check_arity(&mut self, builtin: Builtin, count: usize, span: Span) -> bool {
        let (min, max) = builtin.arity();
        if count >= min && max.is_none_or(|max| count <= max) {
            return true;
        }

        let expected = match max {
            Some(max) if max == min => format!("{min}"),
            Some(max) => format!("{min} to {max}"),
            None => format!("at least {min}"),
        };
        self.diagnostics.emit(
            Diagnostic::error(format!(
                "`{}` takes {expected} argument(s) but {count} were given",
                builtin.name()
            ))
            .with_code(ErrorCode::E304)
            .with_label(span, "wrong number of arguments")
            .with_help(format!("expected {}", builtin.signature())),
        );
        false
    }

    /// Elaborates every argument, reporting all failures before giving up.
    fn node_args(&mut self, args: &[Spanned<Expr<'src>>]) -> Option<Vec<Node>> {
        let nodes: Vec<Option<Node>> = args.iter().map(|arg| self.node(arg)).collect();
        nodes.into_iter().collect()
    }

    fn string_arg(&mut self, arg: &Spanned<Expr<'src>>) -> Option<String> {
        match arg.inner() {
            Expr::Literal(text) => Some(text.clone()),
            other => {
                self.emit_kind_mismatch(arg.span(), "string literal", describe(other));
                None
            }
        }
    }

    fn integer_arg(&mut self, arg: &Spanned<Expr<'src>>) -> Option<usize> {
        match arg.inner() {
            Expr::Integer(value) => Some(*value),
            other => {
                self.emit_kind_mismatch(arg.span(), "integer", describe(other));
                None
            }
        }
    }

    fn mode_arg(&mut self, arg: &Spanned<Expr<'src>>) -> Option<OptionalDefault> {
        match arg.inner() {
            Expr::Reference("skip") => Some(OptionalDefault::Skip),
            Expr::Reference("include") => Some(OptionalDefault::Include),
            other => {
                self.emit_kind_mismatch(arg.span(), "`skip` or `include`", describe(other));
                None
            }
        }
    }

    fn emit_kind_mismatch(&mut self, span: Span, expected: &str, found: &str) {
        self.diagnostics.emit(
            Diagnostic::error(format!("expected {expected}, found {found}"))
                .with_code(ErrorCode::E305)
                .with_label(span, format!("expected {expected}")),
        );
    }
}

/// Lifts an optional argument: `None` when it was given but failed to elaborate.
fn given<T>(arg: Option<Option<T>>) -> Option<Option<T>> {
    match arg {
        Some(None) => None,
        Some(Some(value)) => Some(Some(value)),
        None => Some(None),
    }
}

fn describe(expr: &Expr<'_>) -> &'static str {
    match expr {
        Expr::Literal(_) => "string literal",
        Expr::Integer(_) => "integer",
        Expr::Reference(_) => "identifier",
        Expr::Call { .. } => "function call",
    }
}
