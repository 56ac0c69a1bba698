// Lightweight Python syntax tree: modules, classes, functions, parameters
//
// Only the structure needed to recover keyword vocabularies is modelled.
// Statement bodies stay token streams; definitions nested in them are lifted
// out into their own nodes.

mod parser;
mod recover;

pub use recover::{Recovered, Unparsed, UnparsedKind};

use crate::tokenizer::{LexError, Token, tokenize};

/// Error type for module parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("malformed {what} header at line {line}")]
    MalformedHeader { what: &'static str, line: usize },
    #[error("malformed parameter list at line {line}")]
    MalformedParameters { line: usize },
    #[error("unexpected end of input while parsing {what}")]
    UnexpectedEof { what: &'static str },
}

/// How a parameter binds arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Declared before a `/` marker.
    PositionalOnly,
    PositionalOrKeyword,
    /// `*args`.
    VarPositional,
    /// Declared after `*` or `*args`.
    KeywordOnly,
    /// `**kwargs`: the catch-all keyword bucket.
    VarKeyword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub has_default: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind, has_default: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            has_default,
        }
    }

    /// Check whether a caller may pass this parameter by name.
    pub fn accepts_keyword(&self) -> bool {
        matches!(
            self.kind,
            ParamKind::PositionalOrKeyword | ParamKind::KeywordOnly
        )
    }
}

/// A `def` (or `async def`) statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub name: String,
    /// Dotted path such as `Foo.__init__` or `outer.<locals>.inner`.
    pub qualname: String,
    pub line: usize,
    pub is_async: bool,
    pub params: Vec<Param>,
    /// Body tokens, with nested `def`/`class` statements cut out.
    pub body: Vec<Token>,
    /// Source lines spanned by the definition, decorators included.
    pub source: String,
    pub functions: Vec<FunctionDef>,
    pub classes: Vec<ClassDef>,
}

impl FunctionDef {
    /// The catch-all keyword parameter, if declared.
    pub fn var_keyword(&self) -> Option<&Param> {
        self.params.iter().rfind(|p| p.kind == ParamKind::VarKeyword)
    }
}

/// A `class` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub name: String,
    pub qualname: String,
    pub line: usize,
    /// Base classes that are plain (possibly dotted) names, in order.
    pub bases: Vec<String>,
    pub methods: Vec<FunctionDef>,
    pub classes: Vec<ClassDef>,
}

impl ClassDef {
    /// Look up a method declared directly in the class body. The last
    /// definition wins, as at run time.
    pub fn method(&self, name: &str) -> Option<&FunctionDef> {
        self.methods.iter().rev().find(|m| m.name == name)
    }

    /// The class's own `__init__`, if it declares one.
    pub fn constructor(&self) -> Option<&FunctionDef> {
        self.method("__init__")
    }
}

/// A parsed module: its top-level definitions plus the full token stream.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub functions: Vec<FunctionDef>,
    pub classes: Vec<ClassDef>,
    tokens: Vec<Token>,
}

impl Module {
    /// Tokenize and parse Python source.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(source)?;
        let lines: Vec<&str> = source.lines().collect();
        let (functions, classes) = parser::Parser::new(&tokens, &lines).parse_module()?;
        Ok(Self {
            functions,
            classes,
            tokens,
        })
    }

    /// The complete token stream of the module.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Find a function by qualified name anywhere in the module, including
    /// methods (`Foo.bar`) and nested functions (`f.<locals>.g`).
    pub fn function(&self, qualname: &str) -> Option<&FunctionDef> {
        fn in_functions<'a>(fs: &'a [FunctionDef], q: &str) -> Option<&'a FunctionDef> {
            fs.iter().rev().find_map(|f| {
                if f.qualname == q {
                    Some(f)
                } else {
                    in_functions(&f.functions, q).or_else(|| in_classes(&f.classes, q))
                }
            })
        }
        fn in_classes<'a>(cs: &'a [ClassDef], q: &str) -> Option<&'a FunctionDef> {
            cs.iter()
                .rev()
                .find_map(|c| in_functions(&c.methods, q).or_else(|| in_classes(&c.classes, q)))
        }
        in_functions(&self.functions, qualname).or_else(|| in_classes(&self.classes, qualname))
    }

    /// Find a class by qualified name anywhere in the module.
    pub fn class(&self, qualname: &str) -> Option<&ClassDef> {
        self.all_classes().into_iter().rev().find(|c| c.qualname == qualname)
    }

    /// Every class in the module, wherever it is nested, ordered by the line
    /// of its `class` statement.
    pub fn all_classes(&self) -> Vec<&ClassDef> {
        fn walk_class<'a>(c: &'a ClassDef, out: &mut Vec<&'a ClassDef>) {
            for nested in &c.classes {
                walk_class(nested, out);
            }
            for m in &c.methods {
                walk_function(m, out);
            }
            out.push(c);
        }
        fn walk_function<'a>(f: &'a FunctionDef, out: &mut Vec<&'a ClassDef>) {
            for c in &f.classes {
                walk_class(c, out);
            }
            for nested in &f.functions {
                walk_function(nested, out);
            }
        }
        let mut out = Vec::new();
        for c in &self.classes {
            walk_class(c, &mut out);
        }
        for f in &self.functions {
            walk_function(f, &mut out);
        }
        out.sort_by_key(|c| c.line);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
def foo(arg1, arg2=1, **kwargs):
    return kwargs.get('bar')

class Foo(object):
    def __init__(self, arg1, arg2=1, **kwargs):
        self.kwa1 = kwargs['foo']

    class Inner:
        pass

def outer():
    def inner(**kw):
        return kw['x']
    return inner
";

    #[test]
    fn finds_top_level_and_nested_functions() {
        let m = Module::parse(SOURCE).unwrap();
        assert_eq!(m.function("foo").unwrap().line, 1);
        assert_eq!(m.function("Foo.__init__").unwrap().line, 5);
        assert_eq!(m.function("outer.<locals>.inner").unwrap().line, 12);
        assert!(m.function("inner").is_none());
    }

    #[test]
    fn finds_classes_by_qualname() {
        let m = Module::parse(SOURCE).unwrap();
        assert_eq!(m.class("Foo").unwrap().bases, vec!["object"]);
        assert!(m.class("Foo.Inner").is_some());
        let order: Vec<&str> = m.all_classes().iter().map(|c| c.qualname.as_str()).collect();
        assert_eq!(order, vec!["Foo", "Foo.Inner"]);
    }

    #[test]
    fn constructor_lookup() {
        let m = Module::parse(SOURCE).unwrap();
        let foo = m.class("Foo").unwrap();
        assert_eq!(foo.constructor().unwrap().qualname, "Foo.__init__");
        assert!(m.class("Foo.Inner").unwrap().constructor().is_none());
    }

    #[test]
    fn param_keyword_capability() {
        assert!(Param::new("a", ParamKind::PositionalOrKeyword, false).accepts_keyword());
        assert!(Param::new("a", ParamKind::KeywordOnly, true).accepts_keyword());
        assert!(!Param::new("a", ParamKind::PositionalOnly, true).accepts_keyword());
        assert!(!Param::new("kw", ParamKind::VarKeyword, false).accepts_keyword());
    }

    #[test]
    fn lex_errors_surface_as_parse_errors() {
        let err = Module::parse("x = 'oops\n").unwrap_err();
        assert!(matches!(err, ParseError::Lex(LexError::UnterminatedString { line: 1 })));
    }
}
