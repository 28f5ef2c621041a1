//! Callable synthesis for named-function submissions
//!
//! Only a body and argument names are submitted; the `def` line is generated
//! here. Names are checked to be plain identifiers so nothing can be smuggled
//! into the signature.

use crate::request::FunctionArg;
use crate::runner::SetupError;

const INDENT: &str = "    ";

const KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Whether `name` can be used as a function or argument name
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && !KEYWORDS.contains(&name)
}

/// Build the full source of a named-function submission
pub fn synthesize(name: &str, args: &[FunctionArg], body: &str) -> Result<String, SetupError> {
    for ident in std::iter::once(name).chain(args.iter().map(|a| a.name.as_str())) {
        if !is_identifier(ident) {
            return Err(SetupError::InvalidIdentifier(ident.to_string()));
        }
    }

    let params = args
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut source = format!("def {name}({params}):\n");
    let lines = dedent(body);
    if lines.iter().all(|l| l.trim().is_empty()) {
        source.push_str(INDENT);
        source.push_str("pass\n");
        return Ok(source);
    }

    for line in lines {
        if !line.trim().is_empty() {
            source.push_str(INDENT);
            source.push_str(line);
        }
        source.push('\n');
    }
    Ok(source)
}

/// Strip the leading whitespace shared by every non-blank line.
///
/// Like Python's `textwrap.dedent`, the margin is the longest common prefix
/// of the indentation strings, so tabs and spaces are never traded for one
/// another. Lines inside multi-line string literals are treated as code and
/// shifted along with everything else.
fn dedent(body: &str) -> Vec<&str> {
    let margin = body
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| &l[..l.len() - l.trim_start_matches([' ', '\t']).len()])
        .reduce(common_prefix)
        .unwrap_or("");

    body.lines()
        .map(|l| if l.trim().is_empty() { "" } else { &l[margin.len()..] })
        .collect()
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count();
    &a[..len]
}
