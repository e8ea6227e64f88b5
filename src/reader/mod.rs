//! S-expression reader for module declarations.
//!
//! Reads just enough of the Clojure reader grammar to pull the leading `ns`
//! form out of a source file: collections, atoms, comments, dispatch macros
//! and reader conditionals. Values are not evaluated.

pub mod ns;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub use ns::{parse_declaration, ParseError};

/// Leading shape of a numeric literal.
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d").expect("number pattern is valid"));

/// A read form.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Nil,
    Bool(bool),
    /// Numeric literal text, unparsed.
    Number(String),
    Str(String),
    Char(String),
    /// Keyword text without leading colons, e.g. `require` or `bazel/clojure_test`.
    Keyword(String),
    Symbol(String),
    List(Vec<Form>),
    Vector(Vec<Form>),
    Map(Vec<(Form, Form)>),
    Set(Vec<Form>),
    Tagged(String, Box<Form>),
    WithMeta { meta: Box<Form>, form: Box<Form> },
}

impl Form {
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Form::Symbol(s) => Some(s),
            Form::WithMeta { form, .. } => form.as_symbol(),
            _ => None,
        }
    }

    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Form::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// Strip any metadata wrapper.
    pub fn unwrap_meta(&self) -> &Form {
        match self {
            Form::WithMeta { form, .. } => form.unwrap_meta(),
            other => other,
        }
    }
}

/// Failure to read source text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} at byte {offset}")]
pub struct ReadError {
    pub message: String,
    pub offset: usize,
}

/// One step of reading.
enum Item {
    Form(Form),
    /// `#?@` contents to splice into the enclosing collection.
    Splice(Vec<Form>),
    /// Discarded input (`#_`, unmatched reader conditional).
    Nothing,
    Close(char),
    Eof,
}

/// Reader over a source string.
pub struct Reader<'a> {
    src: &'a str,
    pos: usize,
    feature: &'a str,
}

impl<'a> Reader<'a> {
    /// Create a reader that selects `feature` in reader conditionals.
    pub fn new(src: &'a str, feature: &'a str) -> Self {
        Reader {
            src,
            pos: 0,
            feature,
        }
    }

    /// Read the next top-level form, or `None` at end of input.
    pub fn read(&mut self) -> Result<Option<Form>, ReadError> {
        loop {
            match self.read_item()? {
                Item::Form(form) => return Ok(Some(form)),
                Item::Nothing => continue,
                Item::Eof => return Ok(None),
                Item::Splice(_) => return Err(self.error("reader conditional splice at top level")),
                Item::Close(c) => return Err(self.error(format!("unmatched delimiter `{}`", c))),
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ReadError {
        ReadError {
            message: message.into(),
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' {
                self.bump();
            } else if c == ';' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn read_item(&mut self) -> Result<Item, ReadError> {
        self.skip_whitespace();
        let Some(c) = self.bump() else {
            return Ok(Item::Eof);
        };

        let form = match c {
            '(' => Form::List(self.read_seq(')')?),
            '[' => Form::Vector(self.read_seq(']')?),
            '{' => Form::Map(self.read_map()?),
            ')' | ']' | '}' => return Ok(Item::Close(c)),
            '"' => Form::Str(self.read_string()?),
            '\\' => Form::Char(self.read_char()),
            ':' => Form::Keyword(self.read_token().trim_start_matches(':').to_string()),
            '\'' => self.wrap("quote")?,
            '`' => self.wrap("quote")?,
            '@' => self.wrap("deref")?,
            '~' => {
                if self.peek() == Some('@') {
                    self.bump();
                    self.wrap("unquote-splicing")?
                } else {
                    self.wrap("unquote")?
                }
            }
            '^' => {
                let meta = normalize_meta(self.read_required()?);
                let form = self.read_required()?;
                Form::WithMeta {
                    meta: Box::new(meta),
                    form: Box::new(form),
                }
            }
            '#' => return self.read_dispatch(),
            _ => {
                self.pos -= c.len_utf8();
                atom(self.read_token())
            }
        };

        Ok(Item::Form(form))
    }

    /// Read exactly one form, skipping discards.
    fn read_required(&mut self) -> Result<Form, ReadError> {
        loop {
            match self.read_item()? {
                Item::Form(form) => return Ok(form),
                Item::Nothing => continue,
                Item::Splice(_) => return Err(self.error("unexpected reader conditional splice")),
                Item::Close(c) => return Err(self.error(format!("unexpected `{}`", c))),
                Item::Eof => return Err(self.error("unexpected end of input")),
            }
        }
    }

    fn wrap(&mut self, sym: &str) -> Result<Form, ReadError> {
        let form = self.read_required()?;
        Ok(Form::List(vec![Form::Symbol(sym.to_string()), form]))
    }

    fn read_seq(&mut self, close: char) -> Result<Vec<Form>, ReadError> {
        let mut items = Vec::new();
        loop {
            match self.read_item()? {
                Item::Form(form) => items.push(form),
                Item::Splice(forms) => items.extend(forms),
                Item::Nothing => {}
                Item::Close(c) if c == close => return Ok(items),
                Item::Close(c) => {
                    return Err(self.error(format!("expected `{}` but found `{}`", close, c)))
                }
                Item::Eof => return Err(self.error(format!("unexpected end of input, expected `{}`", close))),
            }
        }
    }

    fn read_map(&mut self) -> Result<Vec<(Form, Form)>, ReadError> {
        let items = self.read_seq('}')?;
        if items.len() % 2 != 0 {
            return Err(self.error("map literal must contain an even number of forms"));
        }
        let mut entries = Vec::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
            entries.push((k, v));
        }
        Ok(entries)
    }

    fn read_string(&mut self) -> Result<String, ReadError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    /// Read a regex literal body; backslashes are kept verbatim.
    fn read_regex(&mut self) -> Result<String, ReadError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated regex")),
                Some('"') => return Ok(out),
                Some('\\') => {
                    out.push('\\');
                    if let Some(c) = self.bump() {
                        out.push(c);
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn read_token(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    /// Character literal; the backslash has been consumed and the first
    /// character is taken even when it is a delimiter, e.g. `\(`.
    fn read_char(&mut self) -> String {
        let start = self.pos - 1;
        self.bump();
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }

    fn read_dispatch(&mut self) -> Result<Item, ReadError> {
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of input after `#`"));
        };

        let form = match c {
            '{' => {
                self.bump();
                Form::Set(self.read_seq('}')?)
            }
            '_' => {
                self.bump();
                self.read_required()?;
                return Ok(Item::Nothing);
            }
            '"' => {
                self.bump();
                Form::Str(self.read_regex()?)
            }
            '(' => {
                self.bump();
                Form::List(self.read_seq(')')?)
            }
            '\'' => {
                self.bump();
                self.wrap("var")?
            }
            '^' => {
                self.bump();
                let meta = normalize_meta(self.read_required()?);
                let form = self.read_required()?;
                Form::WithMeta {
                    meta: Box::new(meta),
                    form: Box::new(form),
                }
            }
            '?' => {
                self.bump();
                return self.read_conditional();
            }
            ':' => {
                self.bump();
                // Namespaced map: the namespace prefix does not matter here.
                self.read_token();
                self.skip_whitespace();
                if self.bump() != Some('{') {
                    return Err(self.error("expected map after namespaced map prefix"));
                }
                Form::Map(self.read_map()?)
            }
            '#' => {
                self.bump();
                Form::Symbol(format!("##{}", self.read_token()))
            }
            '=' => return Err(self.error("read-eval is not supported")),
            _ => {
                let tag = self.read_token();
                if tag.is_empty() {
                    return Err(self.error("invalid dispatch character"));
                }
                let form = self.read_required()?;
                Form::Tagged(tag, Box::new(form))
            }
        };

        Ok(Item::Form(form))
    }

    /// `#?(...)` and `#?@(...)`: keep the branch for our feature, or `:default`.
    fn read_conditional(&mut self) -> Result<Item, ReadError> {
        let splice = if self.peek() == Some('@') {
            self.bump();
            true
        } else {
            false
        };

        self.skip_whitespace();
        if self.bump() != Some('(') {
            return Err(self.error("reader conditional body must be a list"));
        }
        let branches = self.read_seq(')')?;
        if branches.len() % 2 != 0 {
            return Err(self.error("reader conditional requires an even number of forms"));
        }

        let mut chosen = None;
        for pair in branches.chunks(2) {
            let Some(feature) = pair[0].as_keyword() else {
                return Err(self.error("reader conditional feature must be a keyword"));
            };
            if chosen.is_none() && (feature == self.feature || feature == "default") {
                chosen = Some(pair[1].clone());
            }
        }

        match (chosen, splice) {
            (None, _) => Ok(Item::Nothing),
            (Some(form), false) => Ok(Item::Form(form)),
            (Some(Form::List(items)), true) | (Some(Form::Vector(items)), true) => {
                Ok(Item::Splice(items))
            }
            (Some(_), true) => Err(self.error("spliced reader conditional must be a sequence")),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';')
}

fn atom(token: String) -> Form {
    match token.as_str() {
        "nil" => Form::Nil,
        "true" => Form::Bool(true),
        "false" => Form::Bool(false),
        _ if NUMBER.is_match(&token) => Form::Number(token),
        _ => Form::Symbol(token),
    }
}

/// `^:kw` is `{:kw true}`; `^Sym` and `^"str"` are `{:tag ...}`.
fn normalize_meta(meta: Form) -> Form {
    match meta {
        Form::Keyword(k) => Form::Map(vec![(Form::Keyword(k), Form::Bool(true))]),
        Form::Symbol(_) | Form::Str(_) => Form::Map(vec![(Form::Keyword("tag".to_string()), meta)]),
        other => other,
    }
}

/// Read the first form of `src`.
pub fn read_first(src: &str, feature: &str) -> Result<Option<Form>, ReadError> {
    Reader::new(src, feature).read()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(src: &str) -> Form {
        read_first(src, "clj").unwrap().unwrap()
    }

    fn sym(s: &str) -> Form {
        Form::Symbol(s.to_string())
    }

    #[test]
    fn test_atoms() {
        assert_eq!(read("nil"), Form::Nil);
        assert_eq!(read("true"), Form::Bool(true));
        assert_eq!(read("-12"), Form::Number("-12".to_string()));
        assert_eq!(read("foo.bar"), sym("foo.bar"));
        assert_eq!(read(":require"), Form::Keyword("require".to_string()));
        assert_eq!(read("::local"), Form::Keyword("local".to_string()));
        assert_eq!(read(r#""a\"b""#), Form::Str("a\"b".to_string()));
        assert_eq!(read(r"\a"), Form::Char(r"\a".to_string()));
        assert_eq!(read(r"\("), Form::Char(r"\(".to_string()));
    }

    #[test]
    fn test_collections_and_comments() {
        let form = read("; leading comment\n(a [b c] {:k 1} #{d})");
        assert_eq!(
            form,
            Form::List(vec![
                sym("a"),
                Form::Vector(vec![sym("b"), sym("c")]),
                Form::Map(vec![(
                    Form::Keyword("k".to_string()),
                    Form::Number("1".to_string())
                )]),
                Form::Set(vec![sym("d")]),
            ])
        );
    }

    #[test]
    fn test_discard_and_quote() {
        assert_eq!(
            read("(a #_b c 'd)"),
            Form::List(vec![
                sym("a"),
                sym("c"),
                Form::List(vec![sym("quote"), sym("d")])
            ])
        );
    }

    #[test]
    fn test_metadata() {
        let form = read("^:private foo");
        assert_eq!(
            form,
            Form::WithMeta {
                meta: Box::new(Form::Map(vec![(
                    Form::Keyword("private".to_string()),
                    Form::Bool(true)
                )])),
                form: Box::new(sym("foo")),
            }
        );
        assert_eq!(form.as_symbol(), Some("foo"));
    }

    #[test]
    fn test_reader_conditionals_select_feature() {
        let src = "[#?(:clj a :cljs b) #?(:cljs c) #?@(:clj [d e] :default [f])]";
        assert_eq!(
            read_first(src, "clj").unwrap().unwrap(),
            Form::Vector(vec![sym("a"), sym("d"), sym("e")])
        );
        assert_eq!(
            read_first(src, "cljs").unwrap().unwrap(),
            Form::Vector(vec![sym("b"), sym("c"), sym("f")])
        );
    }

    #[test]
    fn test_dispatch_forms() {
        assert_eq!(read(r#"#"\d+""#), Form::Str(r"\d+".to_string()));
        assert_eq!(
            read("#inst \"2020-01-01\""),
            Form::Tagged("inst".to_string(), Box::new(Form::Str("2020-01-01".to_string())))
        );
        assert_eq!(
            read("#:a{:b 1}"),
            Form::Map(vec![(
                Form::Keyword("b".to_string()),
                Form::Number("1".to_string())
            )])
        );
        assert!(matches!(read("#(inc %)"), Form::List(_)));
    }

    #[test]
    fn test_errors_carry_offsets() {
        let err = read_first("(a [b)", "clj").unwrap_err();
        assert!(err.message.contains("expected `]`"));

        let err = read_first("(a b", "clj").unwrap_err();
        assert_eq!(err.offset, 4);

        assert!(read_first(")", "clj").is_err());
        assert!(read_first("{:a}", "clj").is_err());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(read_first("  ; nothing\n", "clj").unwrap(), None);
    }
}
