//! Top-level function extraction via tree-sitter.

use tree_sitter::{Node, Parser};

use crate::error::{IndexError, Result};
use crate::languages::{FunctionGrammar, Lang};

/// Source text of every top-level function in `source`, in document order,
/// trimmed of surrounding whitespace.
///
/// A decorated function contributes its inner definition without the
/// decorators. Nested functions and methods are not returned.
///
/// # Errors
///
/// Returns `IndexError::Parse` if `lang` has no function grammar or the
/// source contains any syntax error.
pub fn extract_functions(source: &str, lang: Lang) -> Result<Vec<String>> {
    let grammar = lang
        .function_grammar()
        .ok_or_else(|| IndexError::Parse(format!("no function grammar for {lang}")))?;

    let mut parser = Parser::new();
    parser
        .set_language(&grammar.language)
        .map_err(|e| IndexError::Parse(format!("set_language failed: {e}")))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| IndexError::Parse(format!("{lang} parser returned no tree")))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(IndexError::Parse(format!("{lang} source has syntax errors")));
    }

    let child_count = u32::try_from(root.named_child_count()).unwrap_or(u32::MAX);
    let mut functions = Vec::new();
    for i in 0..child_count {
        let Some(child) = root.named_child(i) else {
            continue;
        };
        if let Some(func) = function_node(&grammar, child) {
            functions.push(source[func.byte_range()].trim().to_owned());
        }
    }
    Ok(functions)
}

fn function_node<'t>(grammar: &FunctionGrammar, node: Node<'t>) -> Option<Node<'t>> {
    if grammar.function_kinds.contains(&node.kind()) {
        return Some(node);
    }
    if grammar.decorated_kind == Some(node.kind()) {
        let inner = node.child_by_field_name("definition")?;
        return grammar.function_kinds.contains(&inner.kind()).then_some(inner);
    }
    None
}
