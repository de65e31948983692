//! Constant folding over the meta-AST (spec.md §4.2): post-order, recursive,
//! idempotent. Rewrites set-algebra over two charset literals into a single
//! charset literal, and unwraps `compliment` over a charset literal the same
//! way.

use super::ast::MetaAst;

pub fn fold(node: &mut MetaAst) {
    for child in node.children_mut() {
        fold(child);
    }
    fold_node(node);
}

fn fold_node(node: &mut MetaAst) {
    let replacement = match node {
        MetaAst::Compliment(inner) => match inner.as_ref() {
            MetaAst::Charset(c) => Some(MetaAst::Charset(c.complement())),
            _ => None,
        },
        MetaAst::Intersect(l, r) => charset_pair(l, r).map(|(a, b)| MetaAst::Charset(a.intersection(&b))),
        MetaAst::Reject(l, r) => charset_pair(l, r).map(|(a, b)| MetaAst::Charset(a.difference(&b))),
        MetaAst::String(chars) if chars.len() == 1 => {
            Some(MetaAst::Charset(dewy_cc_core::Charset::single(chars[0] as u32)))
        }
        _ => None,
    };
    if let Some(replacement) = replacement {
        *node = replacement;
    }
}

fn charset_pair<'a>(
    l: &'a MetaAst,
    r: &'a MetaAst,
) -> Option<(dewy_cc_core::Charset, dewy_cc_core::Charset)> {
    match (l, r) {
        (MetaAst::Charset(a), MetaAst::Charset(b)) => Some((a.clone(), b.clone())),
        _ => None,
    }
}

/// Folds to a fixed point: a single bottom-up pass can expose a new
/// reducible parent (e.g. a `compliment` wrapping an `intersect` that just
/// became a charset literal), so keep passing until nothing changes.
pub fn fold_to_fixpoint(node: &mut MetaAst) {
    loop {
        let before = format!("{node:?}");
        fold(node);
        if format!("{node:?}") == before {
            break;
        }
    }
}
