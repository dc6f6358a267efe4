//! The XPath 1.0 dialect: per-parse state and engine hooks.

use std::rc::Rc;

use indexmap::IndexMap;
use treepath_tdop::Dialect;

/// The `xml` namespace, bound by default.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// The XML Schema namespace, recognized for constructor-style names.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

pub(crate) const XML_LANG: &str = "{http://www.w3.org/XML/1998/namespace}lang";
pub(crate) const XML_ID: &str = "{http://www.w3.org/XML/1998/namespace}id";

/// Accepted argument count of a function symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// One or more arguments.
    Variadic,
    Exact(usize),
    Range(usize, usize),
}

/// Per-kind payload: function arity.
#[derive(Debug, Clone, Copy, Default)]
pub struct KindMeta {
    pub nargs: Option<Nargs>,
}

/// Per-token payload.
#[derive(Debug, Clone, Default)]
pub struct TokenMeta {
    /// Namespace bound onto the token by a `prefix:` or `{uri}` qualifier.
    pub namespace: Option<String>,
    /// Only the outermost union in a `|` chain re-sorts its results.
    pub cut_and_sort: bool,
}

/// XPath 1.0 parser state: a prefix-to-URI map and the strict flag.
///
/// With `strict` unset the parser also accepts `{uri}name` extended names,
/// as the ElementPath-style libraries do.
#[derive(Debug, Clone)]
pub struct XPath1 {
    pub namespaces: Rc<IndexMap<String, String>>,
    pub strict: bool,
}

impl XPath1 {
    pub fn new(namespaces: &IndexMap<String, String>, strict: bool) -> Self {
        let mut map = IndexMap::new();
        map.insert("xml".to_owned(), XML_NAMESPACE.to_owned());
        for (prefix, uri) in namespaces {
            map.insert(prefix.clone(), uri.clone());
        }
        XPath1 {
            namespaces: Rc::new(map),
            strict,
        }
    }

    /// Resolve a namespace prefix.
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }
}

impl Default for XPath1 {
    fn default() -> Self {
        XPath1::new(&IndexMap::new(), true)
    }
}

impl Dialect for XPath1 {
    type KindMeta = KindMeta;
    type TokenMeta = TokenMeta;

    /// Strings use quote doubling; numbers allow a leading point and an
    /// exponent.
    const LITERALS_PATTERN: &'static str =
        r#"'(?:[^']|'')*'|"(?:[^"]|"")*"|(?:\d+|\.\d+)(?:\.\d*)?(?:[Ee][+\-]?\d+)?"#;

    /// XML-style names: no leading digit, with dots, hyphens, middle dots
    /// and combining marks allowed inside.
    const NAME_PATTERN: &'static str =
        r"[^\d\W][\w.\-\x{B7}\x{0300}-\x{036F}\x{203F}\x{2040}]*";

    fn unescape(literal: &str) -> String {
        let inner = &literal[1..literal.len() - 1];
        if literal.starts_with('\'') {
            inner.replace("''", "'")
        } else {
            inner.replace("\"\"", "\"")
        }
    }
}
