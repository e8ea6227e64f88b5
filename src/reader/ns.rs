//! `ns` form interpretation.
//!
//! Turns the leading form of a source file into a [`ModuleDecl`]: required
//! modules, imported classes, the `:gen-class` superclass, and inline
//! `:bazel/...` target metadata.

use thiserror::Error;

use crate::core::module::{is_valid_module_name, Dialect, GenClass, ModuleDecl};
use crate::core::target::ExtraConfig;
use crate::emit::Node;
use crate::reader::{read_first, Form, ReadError};

/// Metadata key for extra source-library attributes.
pub const LIBRARY_META_KEY: &str = "bazel/clojure_library";

/// Metadata key for extra test attributes.
pub const TEST_META_KEY: &str = "bazel/clojure_test";

/// Why a file did not yield a module declaration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The file's first form is not an `ns` declaration.
    #[error("first form is not a namespace declaration")]
    NoModuleForm,

    /// The file could not be read and does not start with `(ns`.
    #[error("unreadable source: {0}")]
    Unreadable(ReadError),

    /// The file starts with `(ns` but the declaration is broken.
    #[error("malformed namespace declaration: {0}")]
    Malformed(String),
}

impl ParseError {
    /// Malformed declarations abort generation; everything else is skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseError::Malformed(_))
    }
}

/// Whether the text, after whitespace and comments, opens an `ns` form.
pub fn starts_with_module_form(src: &str) -> bool {
    let mut rest = src;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.starts_with(';') {
            rest = rest.split_once('\n').map(|(_, r)| r).unwrap_or("");
        } else {
            break;
        }
    }
    rest.strip_prefix("(ns")
        .and_then(|r| r.chars().next())
        .is_some_and(|c| c.is_whitespace() || c == '^')
}

/// Parse the module declaration at the head of `src`.
pub fn parse_declaration(src: &str, dialect: Dialect) -> Result<ModuleDecl, ParseError> {
    let form = match read_first(src, dialect.feature()) {
        Ok(Some(form)) => form,
        Ok(None) => return Err(ParseError::NoModuleForm),
        Err(e) if starts_with_module_form(src) => return Err(ParseError::Malformed(e.to_string())),
        Err(e) => return Err(ParseError::Unreadable(e)),
    };

    let Form::List(items) = form.unwrap_meta() else {
        return Err(ParseError::NoModuleForm);
    };
    if items.first().and_then(Form::as_symbol) != Some("ns") {
        return Err(ParseError::NoModuleForm);
    }

    parse_ns(&items[1..])
}

fn parse_ns(items: &[Form]) -> Result<ModuleDecl, ParseError> {
    let Some(name_form) = items.first() else {
        return Err(ParseError::Malformed("missing namespace name".to_string()));
    };
    let name = name_form
        .as_symbol()
        .filter(|n| is_valid_module_name(n))
        .ok_or_else(|| ParseError::Malformed(format!("invalid namespace name {:?}", name_form)))?;

    let mut decl = ModuleDecl::new(name);
    let mut metadata: Vec<&Form> = Vec::new();
    if let Form::WithMeta { meta, .. } = name_form {
        metadata.push(meta);
    }

    let mut rest = &items[1..];
    if let Some(Form::Str(_)) = rest.first() {
        rest = &rest[1..];
    }
    if let Some(attr_map @ Form::Map(_)) = rest.first() {
        metadata.push(attr_map);
        rest = &rest[1..];
    }

    for meta in metadata {
        read_metadata(meta, &mut decl)?;
    }

    for clause in rest {
        let (Form::List(parts) | Form::Vector(parts)) = clause.unwrap_meta() else {
            return Err(ParseError::Malformed(format!(
                "unexpected namespace clause {:?}",
                clause
            )));
        };
        let Some(head) = parts.first().and_then(Form::as_keyword) else {
            return Err(ParseError::Malformed(
                "namespace clause must start with a keyword".to_string(),
            ));
        };

        match head {
            "require" | "use" | "require-macros" | "use-macros" => {
                let mut required = Vec::new();
                collect_libspecs(&parts[1..], None, &mut required);
                for module in required.into_iter().filter(|m| *m != decl.name) {
                    push_unique(&mut decl.requires, module);
                }
            }
            "import" => {
                for class in collect_imports(&parts[1..]) {
                    push_unique(&mut decl.imports, class);
                }
            }
            "gen-class" => decl.gen_class = Some(parse_gen_class(&parts[1..])),
            _ => {}
        }
    }

    Ok(decl)
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

fn join(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(p) => format!("{}.{}", p, name),
        None => name.to_string(),
    }
}

/// Libspecs: `a.b`, `[a.b :as x]`, `(prefix c [d :as y])`, `[prefix [c] d]`.
fn collect_libspecs(items: &[Form], prefix: Option<&str>, out: &mut Vec<String>) {
    for item in items {
        match item.unwrap_meta() {
            Form::Symbol(s) => out.push(join(prefix, s)),
            Form::Vector(spec) => {
                let Some(name) = spec.first().and_then(Form::as_symbol) else {
                    continue;
                };
                let is_prefix_form = spec
                    .get(1)
                    .is_some_and(|f| matches!(f.unwrap_meta(), Form::Symbol(_) | Form::Vector(_) | Form::List(_)));
                if is_prefix_form {
                    let full = join(prefix, name);
                    collect_libspecs(&spec[1..], Some(&full), out);
                } else {
                    out.push(join(prefix, name));
                }
            }
            Form::List(spec) => {
                if let Some(name) = spec.first().and_then(Form::as_symbol) {
                    let full = join(prefix, name);
                    collect_libspecs(&spec[1..], Some(&full), out);
                }
            }
            // Flags like `:reload` and string (npm) libspecs.
            _ => {}
        }
    }
}

/// Imports: `java.io.File`, `(java.util Date List)`, `[java.util Map]`.
fn collect_imports(items: &[Form]) -> Vec<String> {
    let mut out = Vec::new();
    for item in items {
        match item.unwrap_meta() {
            Form::Symbol(s) => out.push(s.clone()),
            Form::List(group) | Form::Vector(group) => {
                let Some(package) = group.first().and_then(Form::as_symbol) else {
                    continue;
                };
                out.extend(
                    group[1..]
                        .iter()
                        .filter_map(Form::as_symbol)
                        .map(|class| format!("{}.{}", package, class)),
                );
            }
            _ => {}
        }
    }
    out
}

fn parse_gen_class(options: &[Form]) -> GenClass {
    let extends = options
        .chunks(2)
        .find(|pair| pair[0].as_keyword() == Some("extends"))
        .and_then(|pair| pair.get(1))
        .and_then(Form::as_symbol)
        .map(str::to_string);
    GenClass { extends }
}

fn read_metadata(meta: &Form, decl: &mut ModuleDecl) -> Result<(), ParseError> {
    let Form::Map(entries) = meta else {
        return Ok(());
    };

    for (key, value) in entries {
        let target = match key.as_keyword() {
            Some(LIBRARY_META_KEY) => &mut decl.library_meta,
            Some(TEST_META_KEY) => &mut decl.test_meta,
            _ => continue,
        };
        let Form::Map(attrs) = value else {
            return Err(ParseError::Malformed(format!(
                "{:?} metadata must be a map",
                key
            )));
        };
        merge_attrs(attrs, target)?;
    }

    Ok(())
}

fn merge_attrs(attrs: &[(Form, Form)], config: &mut ExtraConfig) -> Result<(), ParseError> {
    for (k, v) in attrs {
        let key = match k {
            Form::Keyword(k) | Form::Symbol(k) | Form::Str(k) => k.clone(),
            other => {
                return Err(ParseError::Malformed(format!(
                    "metadata attribute name {:?} must be a keyword",
                    other
                )))
            }
        };
        let value = form_to_node(v)
            .ok_or_else(|| ParseError::Malformed(format!("unsupported value for `{}`", key)))?;
        config.insert(key, value);
    }
    Ok(())
}

/// Convert literal data to an emitter node.
pub fn form_to_node(form: &Form) -> Option<Node> {
    match form.unwrap_meta() {
        Form::Nil => Some(Node::sym("None")),
        Form::Bool(b) => Some(Node::bool(*b)),
        Form::Number(n) => Some(n.parse::<i64>().map(Node::int).unwrap_or_else(|_| Node::str(n))),
        Form::Str(s) | Form::Symbol(s) | Form::Keyword(s) => Some(Node::str(s)),
        Form::List(items) | Form::Vector(items) | Form::Set(items) => items
            .iter()
            .map(form_to_node)
            .collect::<Option<Vec<_>>>()
            .map(Node::Seq),
        Form::Map(entries) => entries
            .iter()
            .map(|(k, v)| Some((form_to_node(k)?, form_to_node(v)?)))
            .collect::<Option<Vec<_>>>()
            .map(Node::Map),
        Form::Char(_) | Form::Tagged(..) | Form::WithMeta { .. } => None,
    }
}
