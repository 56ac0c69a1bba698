// Per-definition recovery for modules that do not parse as a whole
//
// The source is cut into top-level statements by indentation alone. Each
// statement is parsed on its own; the ones that fail are blanked out (line
// numbers are kept) and the rest of the module is parsed again. Failed
// `def` and `class` statements are handed back as raw text.

use tracing::debug;

use super::{Module, ParseError};

/// What a definition that failed to parse was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnparsedKind {
    Function,
    Class,
}

/// A top-level definition that could only be kept as source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unparsed {
    pub kind: UnparsedKind,
    pub name: String,
    /// Line of the `def` / `class` keyword.
    pub line: usize,
    /// Base classes that are plain (possibly dotted) names.
    pub bases: Vec<String>,
    /// The definition's source lines, decorators included.
    pub source: String,
}

impl Unparsed {
    /// For a class, the text from its `__init__` header to the end of the
    /// class.
    pub fn constructor_source(&self) -> Option<&str> {
        if self.kind != UnparsedKind::Class {
            return None;
        }
        let mut offset = 0;
        for line in self.source.split_inclusive('\n') {
            let code = line.trim_start();
            let code = code.strip_prefix("async").map_or(code, str::trim_start);
            if line.len() > code.len()
                && code
                    .strip_prefix("def")
                    .is_some_and(|rest| rest.trim_start().starts_with("__init__"))
            {
                return Some(&self.source[offset..]);
            }
            offset += line.len();
        }
        None
    }
}

/// A module parsed statement by statement, plus the definitions that had to
/// be left as text.
#[derive(Debug, Clone)]
pub struct Recovered {
    pub module: Module,
    pub unparsed: Vec<Unparsed>,
    /// The error that stopped the whole-module parse, if any.
    pub error: Option<ParseError>,
}

impl Module {
    /// Parse `source`, degrading per top-level statement instead of failing.
    pub fn parse_recovering(source: &str) -> Recovered {
        let error = match Module::parse(source) {
            Ok(module) => {
                return Recovered {
                    module,
                    unparsed: Vec::new(),
                    error: None,
                };
            }
            Err(err) => err,
        };
        debug!(%error, "module parse failed, recovering per statement");

        let lines: Vec<&str> = source.lines().collect();
        let chunks = statements(&lines);
        let mut kept: Vec<&str> = lines.clone();
        let mut unparsed = Vec::new();

        for chunk in &chunks {
            let text = lines[chunk.clone()].join("\n") + "\n";
            if let Err(err) = Module::parse(&text) {
                debug!(line = chunk.start + 1, %err, "statement left unparsed");
                for line in &mut kept[chunk.clone()] {
                    *line = "";
                }
                unparsed.extend(definition(&lines, chunk.clone()));
            }
        }

        let module = match Module::parse(&(kept.join("\n") + "\n")) {
            Ok(module) => module,
            Err(err) => {
                // Statements that parse alone can still fail together, e.g.
                // with inconsistent indentation between them.
                debug!(%err, "recovered module still fails, keeping text only");
                unparsed = chunks
                    .iter()
                    .filter_map(|chunk| definition(&lines, chunk.clone()))
                    .collect();
                Module::default()
            }
        };

        Recovered {
            module,
            unparsed,
            error: Some(error),
        }
    }
}

/// Line ranges of the top-level statements, decorators attached to the
/// statement they decorate.
fn statements(lines: &[&str]) -> Vec<std::ops::Range<usize>> {
    let mut chunks: Vec<std::ops::Range<usize>> = Vec::new();
    let mut decorating = false;
    for (i, line) in lines.iter().enumerate() {
        let starts_statement = line
            .chars()
            .next()
            .is_some_and(|c| !c.is_whitespace() && c != '#' && !matches!(c, ')' | ']' | '}'))
            && !continues_compound(line);
        match chunks.last_mut() {
            Some(last) if !starts_statement || decorating => last.end = i + 1,
            _ if starts_statement => chunks.push(i..i + 1),
            // Leading blank or comment lines.
            _ => {}
        }
        if starts_statement {
            decorating = line.starts_with('@');
        }
    }
    chunks
}

fn continues_compound(line: &str) -> bool {
    ["else", "elif", "except", "finally"].iter().any(|keyword| {
        line.strip_prefix(keyword)
            .is_some_and(|rest| rest.starts_with([':', ' ', '(', '*']))
    })
}

/// Describe the statement at `range` if it is a `def` or `class`.
fn definition(lines: &[&str], range: std::ops::Range<usize>) -> Option<Unparsed> {
    let offset = lines[range.clone()]
        .iter()
        .position(|line| !line.starts_with('@'))?;
    let header = lines[range.start + offset];
    let code = header.strip_prefix("async").map_or(header, str::trim_start);

    let (kind, rest) = if let Some(rest) = code.strip_prefix("def") {
        (UnparsedKind::Function, rest)
    } else if let Some(rest) = code.strip_prefix("class") {
        (UnparsedKind::Class, rest)
    } else {
        return None;
    };
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let end = rest
        .find(|c: char| !(c == '_' || c.is_alphanumeric()))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    let bases = match kind {
        UnparsedKind::Class => header_bases(&rest[end..]),
        UnparsedKind::Function => Vec::new(),
    };
    Some(Unparsed {
        kind,
        name: rest[..end].to_string(),
        line: range.start + offset + 1,
        bases,
        source: lines[range].join("\n") + "\n",
    })
}

/// Base names from the text after a class name: `[T](pkg.Base, Mixin[T])`.
fn header_bases(after_name: &str) -> Vec<String> {
    let mut rest = after_name.trim_start();
    if rest.starts_with('[') {
        rest = match bracket_end(rest) {
            Some(end) => rest[end..].trim_start(),
            None => return Vec::new(),
        };
    }
    if !rest.starts_with('(') {
        return Vec::new();
    }
    let Some(end) = bracket_end(rest) else {
        return Vec::new();
    };

    let inner = &rest[1..end - 1];
    let mut bases = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices().chain([(inner.len(), ',')]) {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                let part = inner[start..i].trim();
                let name = part.split('[').next().unwrap_or("").trim();
                let dotted = !name.is_empty()
                    && name
                        .split('.')
                        .all(|s| !s.is_empty() && s.chars().all(|c| c == '_' || c.is_alphanumeric()));
                if dotted && !part.contains('=') {
                    bases.push(name.to_string());
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    bases
}

/// Offset just past the bracket matching the one `text` starts with.
fn bracket_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BROKEN: &str = "\
import os

@decorator
def good(**kwargs):
    return kwargs['fine']

def bad(x, **kwargs):
    a = kwargs['alpha']
    s = 'unterminated

class Broken(pkg.Base, Mixin[T], metaclass=Meta):
    def helper(self):
        pass

    def __init__(self, **kw):
        self.v = kw.get('beta')
        s = 'unterminated

if True:
    x = 1
else:
    x = 2

good(fine=1)
";

    #[test]
    fn whole_module_parses_without_recovery() {
        let recovered = Module::parse_recovering("def f(**kw):\n    return kw['a']\n");
        assert!(recovered.error.is_none());
        assert!(recovered.unparsed.is_empty());
        assert_eq!(recovered.module.functions.len(), 1);
    }

    #[test]
    fn bad_definitions_are_kept_as_text() {
        let recovered = Module::parse_recovering(BROKEN);
        assert!(recovered.error.is_some());

        let names: Vec<&str> = recovered.module.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["good"]);
        assert_eq!(recovered.module.functions[0].line, 4);

        let unparsed: Vec<(&str, UnparsedKind, usize)> = recovered
            .unparsed
            .iter()
            .map(|u| (u.name.as_str(), u.kind, u.line))
            .collect();
        assert_eq!(
            unparsed,
            vec![
                ("bad", UnparsedKind::Function, 7),
                ("Broken", UnparsedKind::Class, 11),
            ]
        );
        assert_eq!(recovered.unparsed[1].bases, vec!["pkg.Base", "Mixin"]);
    }

    #[test]
    fn kept_statements_keep_their_lines() {
        let recovered = Module::parse_recovering(BROKEN);
        let call = recovered
            .module
            .tokens()
            .iter()
            .rev()
            .find(|t| t.is_name("good"))
            .unwrap();
        assert_eq!(call.line, 24);
    }

    #[test]
    fn constructor_text_of_a_class() {
        let recovered = Module::parse_recovering(BROKEN);
        let init = recovered.unparsed[1].constructor_source().unwrap();
        assert!(init.trim_start().starts_with("def __init__"));
        assert!(recovered.unparsed[0].constructor_source().is_none());
    }

    #[test]
    fn statements_split_on_column_zero() {
        let lines: Vec<&str> = BROKEN.lines().collect();
        let chunks = statements(&lines);
        let starts: Vec<usize> = chunks.iter().map(|c| c.start + 1).collect();
        assert_eq!(starts, vec![1, 3, 7, 11, 19, 24]);
    }

    #[test]
    fn bases_from_header_text() {
        assert_eq!(header_bases("[T](A, b.C[T], *rest, x=1):"), vec!["A", "b.C"]);
        assert!(header_bases(":").is_empty());
    }
}
