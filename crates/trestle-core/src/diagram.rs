//! Railroad diagram AST.
//!
//! A grammar rule is described as a tree of [`Node`] values built through the
//! constructor functions on [`Node`]. Constructors validate their structural
//! preconditions eagerly and return [`DiagramError::MalformedDiagram`] instead
//! of deferring the failure to layout.
//!
//! Only a small canonical set of variants exists. `optional` and
//! `zero_or_more` are thin constructors that build the equivalent canonical
//! form:
//!
//! - `optional(x, Skip)` is `Choice(0, [Skip, x])`
//! - `optional(x, Include)` is `Choice(1, [Skip, x])`
//! - `zero_or_more(x, sep)` is `optional(one_or_more(x, sep), Skip)`
//!
//! # Example
//!
//! ```
//! # use trestle_core::diagram::{Node, OptionalDefault};
//! # fn main() -> Result<(), trestle_core::DiagramError> {
//! let rule = Node::sequence(vec![
//!     Node::terminal("SELECT"),
//!     Node::one_or_more(Node::non_terminal("column"), Some(Node::terminal(",")))?,
//!     Node::optional(Node::terminal("LIMIT"), OptionalDefault::Skip),
//! ]);
//! assert_eq!(rule.to_string(), r#""SELECT" column { "," column } [ "LIMIT" ]"#);
//! # Ok(())
//! # }
//! ```

use std::fmt;

use crate::error::DiagramError;

/// Which side of an optional branch is drawn on the straight rail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptionalDefault {
    /// The empty path runs straight through; the content bulges below.
    #[default]
    Skip,
    /// The content runs straight through; the empty path bulges above.
    Include,
}

/// A reference to another rule, optionally hyperlinked to its definition.
///
/// The link target is an opaque locator; it is never dereferenced or checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonTerminal {
    text: String,
    link: Option<String>,
}

impl NonTerminal {
    /// Returns the display text of the reference.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the link target, if any.
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }
}

/// Mutually exclusive branches with one default branch on the straight rail.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    default: usize,
    branches: Vec<Node>,
}

impl Choice {
    /// Index of the branch drawn on the straight-through rail.
    pub fn default_index(&self) -> usize {
        self.default
    }

    /// All branches in input order (top to bottom).
    pub fn branches(&self) -> &[Node] {
        &self.branches
    }

    /// Re-checks the structural invariants of this choice.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::MalformedDiagram`] if the branches are empty or
    /// the default index is out of range.
    pub fn validate(&self) -> Result<(), DiagramError> {
        check_choice(self.default, self.branches.len())
    }

    /// Returns the content of an optional choice (`[Skip, x]` or `[x, Skip]`).
    fn optional_content(&self) -> Option<&Node> {
        match self.branches.as_slice() {
            [Node::Skip, content] | [content, Node::Skip] => Some(content),
            _ => None,
        }
    }
}

/// A repeated unit with an optional separator traversed between iterations.
#[derive(Debug, Clone, PartialEq)]
pub struct Repeat {
    item: Box<Node>,
    separator: Option<Box<Node>>,
}

impl Repeat {
    /// The repeated unit, drawn on the forward rail.
    pub fn item(&self) -> &Node {
        &self.item
    }

    /// The separator drawn on the loop-back rail, if any.
    pub fn separator(&self) -> Option<&Node> {
        self.separator.as_deref()
    }

    /// Re-checks that the repeated unit describes at least one token.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::MalformedDiagram`] if the item is an empty path.
    pub fn validate(&self) -> Result<(), DiagramError> {
        check_repeat_item(&self.item)
    }
}

/// A node of a railroad diagram.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A literal token: keyword, punctuation or character class.
    Terminal(String),
    /// A reference to another rule.
    NonTerminal(NonTerminal),
    /// An unboxed annotation sitting on the rail.
    Comment(String),
    /// An explicit empty path.
    Skip,
    /// Children connected left-to-right on one rail.
    Sequence(Vec<Node>),
    /// Alternatives stacked vertically.
    Choice(Choice),
    /// One or more traversals of a unit with a loop-back rail.
    OneOrMore(Repeat),
    /// Sequential rows continuing on the next visual line.
    Stack(Vec<Node>),
}

impl Node {
    /// Creates a terminal (literal token) node.
    pub fn terminal(text: impl Into<String>) -> Self {
        Self::Terminal(text.into())
    }

    /// Creates a non-terminal reference without a link.
    pub fn non_terminal(text: impl Into<String>) -> Self {
        Self::NonTerminal(NonTerminal {
            text: text.into(),
            link: None,
        })
    }

    /// Creates a non-terminal reference hyperlinked to `link`.
    pub fn linked_non_terminal(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self::NonTerminal(NonTerminal {
            text: text.into(),
            link: Some(link.into()),
        })
    }

    /// Creates a comment node.
    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    /// Creates an explicit empty path.
    pub fn skip() -> Self {
        Self::Skip
    }

    /// Creates a sequence. An empty sequence is a plain rail.
    pub fn sequence(children: Vec<Node>) -> Self {
        Self::Sequence(children)
    }

    /// Creates a stack of rows. An empty stack is a plain rail.
    pub fn stack(rows: Vec<Node>) -> Self {
        Self::Stack(rows)
    }

    /// Creates a choice whose `default` branch runs on the straight rail.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::MalformedDiagram`] if `branches` is empty or
    /// `default` does not index one of them.
    pub fn choice(default: usize, branches: Vec<Node>) -> Result<Self, DiagramError> {
        check_choice(default, branches.len())?;
        Ok(Self::Choice(Choice { default, branches }))
    }

    /// Creates an optional branch, i.e. a choice between `Skip` and `content`.
    pub fn optional(content: Node, default: OptionalDefault) -> Self {
        let default = match default {
            OptionalDefault::Skip => 0,
            OptionalDefault::Include => 1,
        };
        Self::Choice(Choice {
            default,
            branches: vec![Node::Skip, content],
        })
    }

    /// Creates a repetition of `item`, with `separator` between iterations.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::MalformedDiagram`] if `item` describes no
    /// tokens at all (a `Skip`, or sequences/stacks made only of those).
    pub fn one_or_more(item: Node, separator: Option<Node>) -> Result<Self, DiagramError> {
        check_repeat_item(&item)?;
        Ok(Self::OneOrMore(Repeat {
            item: Box::new(item),
            separator: separator.map(Box::new),
        }))
    }

    /// Creates a repetition that may also be skipped entirely.
    ///
    /// Built as `optional(one_or_more(item, separator), Skip)`.
    ///
    /// # Errors
    ///
    /// Same as [`Node::one_or_more`].
    pub fn zero_or_more(item: Node, separator: Option<Node>) -> Result<Self, DiagramError> {
        Ok(Self::optional(
            Self::one_or_more(item, separator)?,
            OptionalDefault::Skip,
        ))
    }

    /// Returns true if every path through this node is empty.
    pub fn is_empty_path(&self) -> bool {
        match self {
            Self::Skip => true,
            Self::Sequence(children) | Self::Stack(children) => {
                children.iter().all(Node::is_empty_path)
            }
            Self::Choice(choice) => choice.branches.iter().all(Node::is_empty_path),
            Self::OneOrMore(repeat) => repeat.item.is_empty_path(),
            Self::Terminal(_) | Self::NonTerminal(_) | Self::Comment(_) => false,
        }
    }

    /// Returns the direct children of this node in drawing order.
    ///
    /// For a repetition this is the item followed by the separator, if any.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Self::Terminal(_) | Self::NonTerminal(_) | Self::Comment(_) | Self::Skip => Vec::new(),
            Self::Sequence(children) | Self::Stack(children) => children.iter().collect(),
            Self::Choice(choice) => choice.branches.iter().collect(),
            Self::OneOrMore(repeat) => std::iter::once(repeat.item.as_ref())
                .chain(repeat.separator.as_deref())
                .collect(),
        }
    }
}

/// Checks the structural preconditions of a choice.
fn check_choice(default: usize, branch_count: usize) -> Result<(), DiagramError> {
    if branch_count == 0 {
        return Err(DiagramError::malformed("choice has no branches"));
    }
    if default >= branch_count {
        return Err(DiagramError::malformed(format!(
            "choice default index {default} is out of range for {branch_count} branch(es)"
        )));
    }
    Ok(())
}

/// Checks that a repeated unit describes at least one token.
fn check_repeat_item(item: &Node) -> Result<(), DiagramError> {
    if item.is_empty_path() {
        return Err(DiagramError::malformed("repetition has nothing to repeat"));
    }
    Ok(())
}

/// Grammar text form of the rule (EBNF-like).
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(text) => write!(f, "\"{}\"", text.replace('"', "\\\"")),
            Self::NonTerminal(reference) => write!(f, "{}", reference.text),
            Self::Comment(text) => write!(f, "(* {text} *)"),
            Self::Skip => write!(f, "ε"),
            Self::Sequence(children) | Self::Stack(children) => {
                if children.is_empty() {
                    return write!(f, "ε");
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Self::Choice(choice) => {
                if let [single] = choice.branches.as_slice() {
                    return write!(f, "{single}");
                }
                if let Some(content) = choice.optional_content() {
                    return write!(f, "[ {content} ]");
                }
                write!(f, "( ")?;
                for (i, branch) in choice.branches.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{branch}")?;
                }
                write!(f, " )")
            }
            Self::OneOrMore(repeat) => match &repeat.separator {
                Some(separator) => write!(f, "{0} {{ {1} {0} }}", repeat.item, separator),
                None => write!(f, "{0} {{ {0} }}", repeat.item),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_rejects_empty_branches() {
        let err = Node::choice(0, vec![]).unwrap_err();
        assert!(matches!(err, DiagramError::MalformedDiagram(_)));
    }

    #[test]
    fn test_choice_rejects_out_of_range_default() {
        let err = Node::choice(2, vec![Node::terminal("A"), Node::terminal("B")]).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_choice_accessors() {
        let node = Node::choice(1, vec![Node::terminal("A"), Node::terminal("B")]).unwrap();
        let Node::Choice(choice) = &node else {
            panic!("expected a choice");
        };
        assert_eq!(choice.default_index(), 1);
        assert_eq!(choice.branches().len(), 2);
    }

    #[test]
    fn test_optional_is_choice_with_skip_first() {
        let skip_default = Node::optional(Node::terminal("X"), OptionalDefault::Skip);
        let expected = Node::choice(0, vec![Node::Skip, Node::terminal("X")]).unwrap();
        assert_eq!(skip_default, expected);

        let include_default = Node::optional(Node::terminal("X"), OptionalDefault::Include);
        let expected = Node::choice(1, vec![Node::Skip, Node::terminal("X")]).unwrap();
        assert_eq!(include_default, expected);
    }

    #[test]
    fn test_zero_or_more_is_optional_one_or_more() {
        let zero = Node::zero_or_more(Node::terminal("x"), Some(Node::terminal(","))).unwrap();
        let expected = Node::optional(
            Node::one_or_more(Node::terminal("x"), Some(Node::terminal(","))).unwrap(),
            OptionalDefault::Skip,
        );
        assert_eq!(zero, expected);
        assert_eq!(zero.to_string(), expected.to_string());
    }

    #[test]
    fn test_one_or_more_rejects_empty_item() {
        assert!(Node::one_or_more(Node::Skip, None).is_err());
        assert!(Node::one_or_more(Node::sequence(vec![]), None).is_err());
        let nested_empty = Node::sequence(vec![Node::Skip, Node::stack(vec![])]);
        assert!(Node::one_or_more(nested_empty, None).is_err());
        assert!(Node::zero_or_more(Node::Skip, Some(Node::terminal(","))).is_err());
    }

    #[test]
    fn test_one_or_more_accepts_skip_separator() {
        let node = Node::one_or_more(Node::terminal("x"), Some(Node::Skip)).unwrap();
        let Node::OneOrMore(repeat) = &node else {
            panic!("expected a repetition");
        };
        assert_eq!(repeat.item(), &Node::terminal("x"));
        assert_eq!(repeat.separator(), Some(&Node::Skip));
    }

    #[test]
    fn test_non_terminal_link() {
        let plain = Node::non_terminal("expr");
        let linked = Node::linked_non_terminal("expr", "Expr.html#expr");

        let (Node::NonTerminal(plain), Node::NonTerminal(linked)) = (&plain, &linked) else {
            panic!("expected non-terminals");
        };
        assert_eq!(plain.text(), "expr");
        assert_eq!(plain.link(), None);
        assert_eq!(linked.link(), Some("Expr.html#expr"));
    }

    #[test]
    fn test_children_order() {
        let repeat = Node::one_or_more(Node::terminal("a"), Some(Node::terminal(","))).unwrap();
        assert_eq!(
            repeat.children(),
            vec![&Node::terminal("a"), &Node::terminal(",")]
        );
        assert!(Node::terminal("a").children().is_empty());
    }

    #[test]
    fn test_display_grammar_text() {
        let rule = Node::sequence(vec![
            Node::terminal("("),
            Node::zero_or_more(Node::non_terminal("name"), Some(Node::terminal(","))).unwrap(),
            Node::terminal(")"),
        ]);
        assert_eq!(rule.to_string(), r#""(" [ name { "," name } ] ")""#);

        let choice = Node::choice(
            0,
            vec![Node::terminal("ASC"), Node::terminal("DESC"), Node::comment("default")],
        )
        .unwrap();
        assert_eq!(choice.to_string(), r#"( "ASC" | "DESC" | (* default *) )"#);

        let single = Node::choice(0, vec![Node::terminal("only")]).unwrap();
        assert_eq!(single.to_string(), r#""only""#);
    }

    #[test]
    fn test_display_escapes_quotes() {
        assert_eq!(Node::terminal("\"").to_string(), r#""\"""#);
    }

    proptest::proptest! {
        #[test]
        fn prop_choice_default_must_index_a_branch(default in 0usize..8, branches in 0usize..6) {
            let nodes = (0..branches).map(|i| Node::terminal(i.to_string())).collect();
            let result = Node::choice(default, nodes);
            proptest::prop_assert_eq!(result.is_ok(), default < branches);
        }

        #[test]
        fn prop_zero_or_more_text_matches_optional_loop(
            item in "[a-z]{1,8}",
            sep in proptest::option::of("[,;|]")
        ) {
            let separator = sep.map(Node::terminal);
            let zero =
                Node::zero_or_more(Node::non_terminal(item.clone()), separator.clone()).unwrap();
            let looped = Node::optional(
                Node::one_or_more(Node::non_terminal(item), separator).unwrap(),
                OptionalDefault::Skip,
            );
            proptest::prop_assert_eq!(zero.to_string(), looped.to_string());
        }
    }
}
