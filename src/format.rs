use crate::constants::*;
use crate::graph::*;

/// Human readable byte count with `precision` decimals, in 1024 steps
pub fn format_size(num: u64, precision: usize) -> String {
    let n = num as f64;
    if num < BYTES_IN_KBYTE {
        format!("{:.*}B", precision, n)
    } else if num < BYTES_IN_MBYTE {
        format!("{:.*}KB", precision, n / BYTES_IN_KBYTE as f64)
    } else if num < BYTES_IN_GBYTE {
        format!("{:.*}MB", precision, n / BYTES_IN_MBYTE as f64)
    } else {
        format!("{:.*}GB", precision, n / BYTES_IN_GBYTE as f64)
    }
}

fn function_name<G: HeapGraph>(closure: &HeapNode<'_, G>) -> String {
    let name = closure.name();
    if name.is_empty() {
        "<anonymous>()".to_string()
    } else {
        format!("{}()", name)
    }
}

fn function_script<'g, G: HeapGraph>(closure: &HeapNode<'g, G>) -> &'g str {
    closure
        .child_by_edge_name("shared")
        .and_then(|shared| shared.child_by_edge_name("script"))
        .map(|script| script.name())
        .unwrap_or("")
}

/// The closure a context node belongs to
///
/// Newer V8 versions drop the `closure` slot from contexts, in which case
/// there is nothing to report.
fn context_closure<'g, G: HeapGraph>(context: &HeapNode<'g, G>) -> Option<HeapNode<'g, G>> {
    context
        .child_by_edge_name("closure")
        .filter(|c| c.kind() == NodeKind::Closure)
}

/// One-line summary used for suspects, accumulation points and path entries
///
/// Closures and contexts are followed by a second line naming the function
/// and the script it was defined in.
pub fn describe_node<G: HeapGraph>(node: &HeapNode<'_, G>) -> String {
    let mut result = format!("{} {}", format_size(node.retained_size(), 4), node.name());
    match node.kind() {
        NodeKind::Context => {
            let (name, script) = match context_closure(node) {
                Some(closure) => (function_name(&closure), function_script(&closure)),
                None => (String::new(), ""),
            };
            result += &format!("@{}\n(context of {} {})", node.id(), name, script);
        }
        NodeKind::Closure => {
            result += &format!(
                "@{}\n(closure of {} {})",
                node.id(),
                function_name(node),
                function_script(node)
            );
        }
        NodeKind::Plain | NodeKind::Native => {
            result += &format!("({}) @{}", node.class_name(), node.id());
        }
    }
    result
}
