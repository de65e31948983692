//! The meta-AST (spec.md §3 Meta-AST node, §4.2). An owned tree; constant
//! folding (`fold.rs`) rewrites it in place before lowering.

use dewy_cc_core::Charset;

#[derive(Debug, Clone, PartialEq)]
pub enum MetaAst {
    Eps,
    Charset(Charset),
    /// A literal string, one codepoint per `char`.
    String(Vec<char>),
    /// A string matched case-insensitively.
    Caseless(Vec<char>),
    Identifier(String),
    Star(Box<MetaAst>, Option<u32>),
    Plus(Box<MetaAst>, Option<u32>),
    Option(Box<MetaAst>),
    /// Exactly `n` repetitions, no trailing closure.
    Count(Box<MetaAst>, u32),
    Cat(Vec<MetaAst>),
    Or(Vec<MetaAst>),
    Compliment(Box<MetaAst>),
    Intersect(Box<MetaAst>, Box<MetaAst>),
    Reject(Box<MetaAst>, Box<MetaAst>),
    Nofollow(Box<MetaAst>, Box<MetaAst>),
    GreaterThan(Box<MetaAst>, Box<MetaAst>),
    LessThan(Box<MetaAst>, Box<MetaAst>),
    Capture(Box<MetaAst>),
}

impl MetaAst {
    /// Visits direct children, innermost-first traversal helper used by the
    /// constant folder; returns `None` for leaf nodes.
    pub fn children_mut(&mut self) -> Vec<&mut MetaAst> {
        match self {
            MetaAst::Eps
            | MetaAst::Charset(_)
            | MetaAst::String(_)
            | MetaAst::Caseless(_)
            | MetaAst::Identifier(_) => Vec::new(),
            MetaAst::Star(inner, _)
            | MetaAst::Plus(inner, _)
            | MetaAst::Option(inner)
            | MetaAst::Count(inner, _)
            | MetaAst::Compliment(inner)
            | MetaAst::Capture(inner) => vec![inner.as_mut()],
            MetaAst::Cat(items) | MetaAst::Or(items) => items.iter_mut().collect(),
            MetaAst::Intersect(l, r)
            | MetaAst::Reject(l, r)
            | MetaAst::Nofollow(l, r)
            | MetaAst::GreaterThan(l, r)
            | MetaAst::LessThan(l, r) => vec![l.as_mut(), r.as_mut()],
        }
    }
}

impl std::fmt::Display for MetaAst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaAst::Eps => write!(f, "\u{03f5}"),
            MetaAst::Charset(c) => write!(f, "{c:?}"),
            MetaAst::String(s) => write!(f, "\"{}\"", s.iter().collect::<String>()),
            MetaAst::Caseless(s) => write!(f, "`{}`", s.iter().collect::<String>()),
            MetaAst::Identifier(name) => write!(f, "#{name}"),
            MetaAst::Star(inner, None) => write!(f, "({inner})*"),
            MetaAst::Star(inner, Some(n)) => write!(f, "({inner}){n}*"),
            MetaAst::Plus(inner, None) => write!(f, "({inner})+"),
            MetaAst::Plus(inner, Some(n)) => write!(f, "({inner}){n}+"),
            MetaAst::Option(inner) => write!(f, "({inner})?"),
            MetaAst::Count(inner, n) => write!(f, "({inner}){n}"),
            MetaAst::Cat(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "({})", parts.join(" "))
            }
            MetaAst::Or(items) => {
                let parts: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "({})", parts.join(" | "))
            }
            MetaAst::Compliment(inner) => write!(f, "({inner})~"),
            MetaAst::Intersect(l, r) => write!(f, "({l} & {r})"),
            MetaAst::Reject(l, r) => write!(f, "({l} - {r})"),
            MetaAst::Nofollow(l, r) => write!(f, "({l} / {r})"),
            MetaAst::GreaterThan(l, r) => write!(f, "({l} > {r})"),
            MetaAst::LessThan(l, r) => write!(f, "({l} < {r})"),
            MetaAst::Capture(inner) => write!(f, "({inner})."),
        }
    }
}
