//! Declaration emitter.
//!
//! Renders a closed set of structural nodes to Starlark-style BUILD text.
//! Rendering is a pure function of the node tree, so identical trees always
//! produce byte-identical text.

use std::fmt::Write as _;
use std::path::PathBuf;

const INDENT: &str = "    ";

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Atom {
    /// Rendered as quoted text.
    Str(String),
    /// Rendered as bare text.
    Sym(String),
    /// Rendered as quoted text with `/` separators.
    Path(PathBuf),
    /// Rendered as `True` / `False`.
    Bool(bool),
    Int(i64),
}

/// Ordered keyword arguments, e.g. `name = "x", deps = [...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KwArgs(Vec<(String, Node)>);

impl KwArgs {
    pub fn new() -> Self {
        KwArgs(Vec::new())
    }

    pub fn push(&mut self, key: impl Into<String>, value: Node) {
        self.0.push((key.into(), value));
    }

    pub fn with(mut self, key: impl Into<String>, value: Node) -> Self {
        self.push(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A named function call, e.g. a rule invocation or a `load` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Node>,
    pub kwargs: KwArgs,
}

impl Call {
    pub fn new(name: impl Into<String>) -> Self {
        Call {
            name: name.into(),
            args: Vec::new(),
            kwargs: KwArgs::new(),
        }
    }

    pub fn arg(mut self, node: Node) -> Self {
        self.args.push(node);
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: Node) -> Self {
        self.kwargs.push(key, value);
        self
    }
}

/// A renderable node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Atom(Atom),
    Map(Vec<(Node, Node)>),
    Seq(Vec<Node>),
    KwArgs(KwArgs),
    Call(Call),
}

impl Node {
    pub fn str(s: impl Into<String>) -> Node {
        Node::Atom(Atom::Str(s.into()))
    }

    pub fn sym(s: impl Into<String>) -> Node {
        Node::Atom(Atom::Sym(s.into()))
    }

    pub fn path(p: impl Into<PathBuf>) -> Node {
        Node::Atom(Atom::Path(p.into()))
    }

    pub fn bool(b: bool) -> Node {
        Node::Atom(Atom::Bool(b))
    }

    pub fn int(i: i64) -> Node {
        Node::Atom(Atom::Int(i))
    }

    /// A sequence of quoted strings.
    pub fn strs<I, S>(items: I) -> Node
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Node::Seq(items.into_iter().map(Node::str).collect())
    }

    /// The text of a string or symbol atom.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Atom(Atom::Str(s)) | Node::Atom(Atom::Sym(s)) => Some(s),
            _ => None,
        }
    }
}

impl From<Call> for Node {
    fn from(call: Call) -> Self {
        Node::Call(call)
    }
}

/// Render a single node at the top level.
pub fn render(node: &Node) -> String {
    let mut out = String::new();
    render_node(&mut out, node, 0);
    out
}

/// Render a sequence of top-level statements as a complete file.
pub fn render_file(statements: &[Node]) -> String {
    let rendered: Vec<String> = statements.iter().map(render).collect();
    let mut out = rendered.join("\n\n");
    out.push('\n');
    out
}

fn render_atom(out: &mut String, atom: &Atom) {
    match atom {
        Atom::Str(s) => quote(out, s),
        Atom::Sym(s) => out.push_str(s),
        Atom::Path(p) => quote(out, &p.to_string_lossy().replace('\\', "/")),
        Atom::Bool(true) => out.push_str("True"),
        Atom::Bool(false) => out.push_str("False"),
        Atom::Int(i) => {
            let _ = write!(out, "{}", i);
        }
    }
}

fn quote(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Render `node` inline if it fits on one line, otherwise `None`.
fn inline(node: &Node) -> Option<String> {
    let mut out = String::new();
    match node {
        Node::Atom(atom) => render_atom(&mut out, atom),
        Node::Seq(items) if items.len() <= 1 => {
            out.push('[');
            if let Some(item) = items.first() {
                out.push_str(&inline(item)?);
            }
            out.push(']');
        }
        Node::Map(entries) if entries.len() <= 1 => {
            out.push('{');
            if let Some((k, v)) = entries.first() {
                out.push_str(&inline(k)?);
                out.push_str(": ");
                out.push_str(&inline(v)?);
            }
            out.push('}');
        }
        Node::KwArgs(kwargs) => {
            let parts = kwargs
                .iter()
                .map(|(k, v)| inline(v).map(|v| format!("{} = {}", k, v)))
                .collect::<Option<Vec<_>>>()?;
            out.push_str(&parts.join(", "));
        }
        Node::Call(call) if call_is_inline(call) => {
            let mut parts = call.args.iter().map(inline).collect::<Option<Vec<_>>>()?;
            for (k, v) in call.kwargs.iter() {
                parts.push(format!("{} = {}", k, inline(v)?));
            }
            let _ = write!(out, "{}({})", call.name, parts.join(", "));
        }
        _ => return None,
    }
    Some(out)
}

/// Calls without keyword arguments, or with a single keyword argument and
/// nothing else, stay on one line.
fn call_is_inline(call: &Call) -> bool {
    call.kwargs.is_empty() || (call.args.is_empty() && call.kwargs.len() == 1)
}

fn render_node(out: &mut String, node: &Node, indent: usize) {
    if let Some(text) = inline(node) {
        out.push_str(&text);
        return;
    }

    let pad = INDENT.repeat(indent);
    let inner = INDENT.repeat(indent + 1);

    match node {
        Node::Atom(atom) => render_atom(out, atom),
        Node::Seq(items) => {
            out.push_str("[\n");
            for item in items {
                out.push_str(&inner);
                render_node(out, item, indent + 1);
                out.push_str(",\n");
            }
            out.push_str(&pad);
            out.push(']');
        }
        Node::Map(entries) => {
            out.push_str("{\n");
            for (k, v) in entries {
                out.push_str(&inner);
                render_node(out, k, indent + 1);
                out.push_str(": ");
                render_node(out, v, indent + 1);
                out.push_str(",\n");
            }
            out.push_str(&pad);
            out.push('}');
        }
        Node::KwArgs(kwargs) => {
            let mut first = true;
            for (k, v) in kwargs.iter() {
                if !first {
                    out.push_str(",\n");
                    out.push_str(&pad);
                }
                first = false;
                let _ = write!(out, "{} = ", k);
                render_node(out, v, indent);
            }
        }
        Node::Call(call) => {
            let _ = writeln!(out, "{}(", call.name);
            for arg in &call.args {
                out.push_str(&inner);
                render_node(out, arg, indent + 1);
                out.push_str(",\n");
            }
            for (k, v) in call.kwargs.iter() {
                out.push_str(&inner);
                let _ = write!(out, "{} = ", k);
                render_node(out, v, indent + 1);
                out.push_str(",\n");
            }
            out.push_str(&pad);
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atoms() {
        assert_eq!(render(&Node::str("a\"b")), r#""a\"b""#);
        assert_eq!(render(&Node::sym("None")), "None");
        assert_eq!(render(&Node::bool(true)), "True");
        assert_eq!(render(&Node::bool(false)), "False");
        assert_eq!(render(&Node::int(42)), "42");
        assert_eq!(render(&Node::path("repo/org/x.jar")), r#""repo/org/x.jar""#);
        assert_eq!(render(&Node::path("/m2/org/x.jar")), r#""/m2/org/x.jar""#);
    }

    #[test]
    fn test_short_sequences_stay_inline() {
        assert_eq!(render(&Node::strs(Vec::<String>::new())), "[]");
        assert_eq!(render(&Node::strs(["a"])), r#"["a"]"#);
    }

    #[test]
    fn test_rule_call_layout() {
        let call = Call::new("clojure_library")
            .kwarg("name", Node::str("core.clj"))
            .kwarg("srcs", Node::strs(["core.clj"]))
            .kwarg("deps", Node::strs(["//a:b.clj", "@deps//:x"]));

        let expected = r#"clojure_library(
    name = "core.clj",
    srcs = ["core.clj"],
    deps = [
        "//a:b.clj",
        "@deps//:x",
    ],
)"#;
        assert_eq!(render(&call.into()), expected);
    }

    #[test]
    fn test_load_and_package_statements_are_inline() {
        let load = Call::new("load")
            .arg(Node::str("@rules_clojure//:rules.bzl"))
            .arg(Node::str("clojure_library"));
        assert_eq!(
            render(&load.into()),
            r#"load("@rules_clojure//:rules.bzl", "clojure_library")"#
        );

        let package = Call::new("package")
            .kwarg("default_visibility", Node::strs(["//visibility:public"]));
        assert_eq!(
            render(&package.into()),
            r#"package(default_visibility = ["//visibility:public"])"#
        );
    }

    #[test]
    fn test_maps() {
        let map = Node::Map(vec![
            (Node::str("a"), Node::int(1)),
            (Node::str("b"), Node::bool(false)),
        ]);
        assert_eq!(render(&map), "{\n    \"a\": 1,\n    \"b\": False,\n}");
    }

    #[test]
    fn test_render_file_joins_statements() {
        let out = render_file(&[
            Call::new("a").into(),
            Call::new("b").into(),
        ]);
        assert_eq!(out, "a()\n\nb()\n");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let call = Call::new("filegroup")
            .kwarg("name", Node::str("__clj_files"))
            .kwarg("srcs", Node::strs(["a.clj", "b.clj"]));
        let node: Node = call.into();
        assert_eq!(render(&node), render(&node.clone()));
    }
}
