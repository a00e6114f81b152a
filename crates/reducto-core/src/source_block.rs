//! Statement access for C-family sources (Rust, C#, Java, C, Go).
//!
//! A unit is a function whose body is a brace block. Its elements are the
//! top-level statements of that block. Every statement carries the
//! whitespace that preceded it, so writing back the statements that were
//! read reproduces the file byte for byte.

use crate::error::ReduceError;
use crate::lock::{LockPolicy, StagingLock};
use crate::source::SourceAccessor;
use regex::Regex;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    leading: String,
    text: String,
}

impl Statement {
    pub fn with_leading(leading: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            leading: leading.into(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn leading(&self) -> &str {
        &self.leading
    }
}

#[derive(Debug, Clone)]
pub struct BlockSourceAccessor {
    lock_policy: Option<LockPolicy>,
}

impl Default for BlockSourceAccessor {
    fn default() -> Self {
        Self {
            lock_policy: Some(LockPolicy::default()),
        }
    }
}

impl BlockSourceAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` writes without claiming the staging lock.
    pub fn with_lock_policy(lock_policy: Option<LockPolicy>) -> Self {
        Self { lock_policy }
    }
}

impl SourceAccessor for BlockSourceAccessor {
    type Element = Statement;

    fn read_elements(&self, container: &Path, unit: &str) -> Result<Vec<Statement>, ReduceError> {
        let source = read_source(container)?;
        unit_statements(&source, unit, container)
    }

    fn write_elements(
        &self,
        container: &Path,
        output: &Path,
        unit: &str,
        elements: &[Statement],
    ) -> Result<(), ReduceError> {
        if let Some(parent) = output
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).map_err(|err| ReduceError::io(parent, err))?;
        }
        match self.lock_policy {
            Some(policy) => {
                let mut lock = StagingLock::acquire(output, policy)?;
                let source = read_source(container)?;
                let rendered = replace_unit_body(&source, unit, elements, container)?;
                lock.replace(rendered.as_bytes())
            }
            None => {
                let source = read_source(container)?;
                let rendered = replace_unit_body(&source, unit, elements, container)?;
                write_atomic(output, rendered.as_bytes())
            }
        }
    }

    fn qualified_name(&self, container: &Path, unit: &str) -> Result<String, ReduceError> {
        let source = read_source(container)?;
        qualified_name(&source, unit, container)
    }
}

pub fn unit_statements(
    source: &str,
    unit: &str,
    path: &Path,
) -> Result<Vec<Statement>, ReduceError> {
    let span = locate_unit(source, unit, path)?;
    Ok(split_statements(source, &span).0)
}

/// Path of the unit as a test runner names it: `tests::repro` for Rust
/// (including the file's module path under `src/`), `Demo.Tests.Class.Test`
/// for the namespace and class languages.
pub fn qualified_name(source: &str, unit: &str, path: &Path) -> Result<String, ReduceError> {
    let span = locate_unit(source, unit, path)?;
    let rust = path.extension().is_some_and(|ext| ext == "rs");
    let mut segments = if rust {
        rust_file_modules(path)
    } else {
        Vec::new()
    };
    segments.extend(enclosing_scopes(source, span.header, rust));
    segments.push(unit.to_string());
    Ok(segments.join(if rust { "::" } else { "." }))
}

pub fn replace_unit_body(
    source: &str,
    unit: &str,
    statements: &[Statement],
    path: &Path,
) -> Result<String, ReduceError> {
    let span = locate_unit(source, unit, path)?;
    let (_, trailing) = split_statements(source, &span);

    let mut out = String::with_capacity(source.len());
    out.push_str(&source[..=span.open]);
    for statement in statements {
        out.push_str(&statement.leading);
        out.push_str(&statement.text);
    }
    out.push_str(&source[trailing]);
    out.push_str(&source[span.close..]);
    Ok(out)
}

fn read_source(path: &Path) -> Result<String, ReduceError> {
    fs::read_to_string(path).map_err(|err| ReduceError::io(path, err))
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ReduceError> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    fs::write(&tmp_path, contents).map_err(|err| ReduceError::io(&tmp_path, err))?;
    fs::rename(&tmp_path, path).map_err(|err| ReduceError::io(path, err))
}

#[derive(Debug, Clone, Copy)]
struct UnitSpan {
    header: usize,
    open: usize,
    close: usize,
}

fn locate_unit(source: &str, unit: &str, path: &Path) -> Result<UnitSpan, ReduceError> {
    let pattern = format!(r"\b{}\s*(?:<[^<>{{}};]*>\s*)?\(", regex::escape(unit));
    let header = Regex::new(&pattern)
        .map_err(|err| ReduceError::Validation(format!("invalid unit name `{unit}`: {err}")))?;
    let bytes = source.as_bytes();
    let literals = literal_ranges(bytes);

    for found in header.find_iter(source) {
        if literals.iter().any(|range| range.contains(&found.start())) {
            continue;
        }
        let paren = found.end() - 1;
        let Some(paren_close) = matching_close(bytes, paren) else {
            continue;
        };
        let Some(open) = body_open(bytes, paren_close + 1) else {
            continue;
        };
        let close = matching_close(bytes, open).ok_or_else(|| ReduceError::Parse {
            path: path.to_path_buf(),
            line: line_of(source, open),
            message: format!("unbalanced braces in body of `{unit}`"),
        })?;
        return Ok(UnitSpan {
            header: found.start(),
            open,
            close,
        });
    }

    Err(ReduceError::UnitNotFound {
        path: path.to_path_buf(),
        unit: unit.to_string(),
    })
}

/// Returns the statements of the body and the whitespace range that
/// follows the last one.
fn split_statements(source: &str, span: &UnitSpan) -> (Vec<Statement>, Range<usize>) {
    let bytes = source.as_bytes();
    let mut statements = Vec::new();
    let mut start = span.open + 1;
    let mut depth = 0usize;
    let mut idx = start;

    while idx < span.close {
        if let Some(end) = skip_literal(bytes, idx) {
            idx = end.min(span.close);
            continue;
        }
        match bytes[idx] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && !continues_statement(source, start, idx + 1, span.close) {
                    statements.push(make_statement(source, start, idx + 1));
                    start = idx + 1;
                }
            }
            b';' if depth == 0 => {
                statements.push(make_statement(source, start, idx + 1));
                start = idx + 1;
            }
            _ => {}
        }
        idx += 1;
    }

    let rest = &source[start..span.close];
    if rest.trim().is_empty() {
        return (statements, start..span.close);
    }
    let end = start + rest.trim_end().len();
    statements.push(make_statement(source, start, end));
    (statements, end..span.close)
}

fn make_statement(source: &str, start: usize, end: usize) -> Statement {
    let segment = &source[start..end];
    let text = segment.trim_start();
    let leading = &segment[..segment.len() - text.len()];
    Statement::with_leading(leading, text)
}

fn continues_statement(source: &str, statement_start: usize, after: usize, close: usize) -> bool {
    let bytes = source.as_bytes();
    let Some(next) = next_token(bytes, after, close) else {
        return false;
    };
    let rest = &source[next..close];
    if rest.starts_with("=>") || matches!(bytes[next], b';' | b'.' | b'?' | b',' | b')') {
        return true;
    }
    if ["else", "catch", "finally"]
        .iter()
        .any(|keyword| starts_with_word(rest, keyword))
    {
        return true;
    }
    starts_with_word(rest, "while")
        && starts_with_word(source[statement_start..].trim_start(), "do")
}

fn next_token(bytes: &[u8], from: usize, limit: usize) -> Option<usize> {
    let mut idx = from;
    while idx < limit {
        if bytes[idx].is_ascii_whitespace() {
            idx += 1;
            continue;
        }
        if bytes[idx] == b'/' && matches!(bytes.get(idx + 1), Some(&b'/') | Some(&b'*')) {
            idx = skip_literal(bytes, idx).unwrap_or(limit);
            continue;
        }
        return Some(idx);
    }
    None
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.starts_with(word)
        && text[word.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
}

fn body_open(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut idx = from;
    while idx < bytes.len() {
        if let Some(end) = skip_literal(bytes, idx) {
            idx = end;
            continue;
        }
        match bytes[idx] {
            b'{' if depth == 0 => return Some(idx),
            b'(' | b'[' => depth += 1,
            b')' | b']' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            b';' | b'}' if depth == 0 => return None,
            b'=' if depth == 0 && bytes.get(idx + 1) == Some(&b'>') => return None,
            _ => {}
        }
        idx += 1;
    }
    None
}

fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let open_byte = bytes[open];
    let close_byte = match open_byte {
        b'(' => b')',
        b'[' => b']',
        b'{' => b'}',
        _ => return None,
    };
    let mut depth = 0usize;
    let mut idx = open;
    while idx < bytes.len() {
        if let Some(end) = skip_literal(bytes, idx) {
            idx = end;
            continue;
        }
        if bytes[idx] == open_byte {
            depth += 1;
        } else if bytes[idx] == close_byte {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
        idx += 1;
    }
    None
}

/// Names of the modules, namespaces and classes whose blocks contain `offset`.
fn enclosing_scopes(source: &str, offset: usize, rust: bool) -> Vec<String> {
    let kinds = if rust {
        "mod"
    } else {
        "namespace|package|class|struct|interface|record"
    };
    let Ok(declaration) = Regex::new(&format!(r"\b(?:{kinds})\s+([A-Za-z_][\w.]*)")) else {
        return Vec::new();
    };
    let bytes = source.as_bytes();
    let mut file_scope: Vec<String> = Vec::new();
    let mut stack: Vec<Option<String>> = Vec::new();
    let mut segment_start = 0;
    let mut idx = 0;

    while idx < offset {
        if let Some(end) = skip_literal(bytes, idx) {
            idx = end;
            continue;
        }
        match bytes[idx] {
            b'{' => {
                let name = declaration
                    .captures_iter(&source[segment_start..idx])
                    .last()
                    .map(|captures| captures[1].to_string());
                stack.push(name);
                segment_start = idx + 1;
            }
            b'}' => {
                stack.pop();
                segment_start = idx + 1;
            }
            b';' => {
                // File-scoped `namespace A.B;` or Java's `package a.b;`.
                if !rust && stack.is_empty() {
                    if let Some(captures) = declaration.captures(&source[segment_start..idx]) {
                        file_scope.push(captures[1].to_string());
                    }
                }
                segment_start = idx + 1;
            }
            _ => {}
        }
        idx += 1;
    }

    file_scope.extend(stack.into_iter().flatten());
    file_scope
}

/// Module path the crate layout gives a Rust file: `src/lib.rs` is the
/// root, `src/net/codec.rs` is `net::codec`, `src/net/mod.rs` is `net`.
fn rust_file_modules(path: &Path) -> Vec<String> {
    let components: Vec<String> = path
        .components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect();
    let root = components.iter().rposition(|name| name == "src").or_else(|| {
        components
            .iter()
            .rposition(|name| matches!(name.as_str(), "tests" | "benches" | "examples"))
    });
    let Some(root) = root else {
        return Vec::new();
    };

    let mut modules: Vec<String> = components[root + 1..]
        .iter()
        .map(|name| name.strip_suffix(".rs").unwrap_or(name).to_string())
        .collect();
    // Files directly under src/bin, tests, benches and examples are crate roots.
    let crate_root = if components[root] != "src" {
        1
    } else if modules.first().is_some_and(|name| name == "bin") {
        2
    } else {
        0
    };
    modules.drain(..crate_root.min(modules.len()));
    if modules.len() == 1 && matches!(modules[0].as_str(), "lib" | "main") {
        modules.clear();
    }
    if modules.last().is_some_and(|name| name == "mod") {
        modules.pop();
    }
    modules
}

fn literal_ranges(bytes: &[u8]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut idx = 0;
    while idx < bytes.len() {
        match skip_literal(bytes, idx) {
            Some(end) => {
                ranges.push(idx..end);
                idx = end;
            }
            None => idx += 1,
        }
    }
    ranges
}

/// End (exclusive) of the comment, string or char literal starting at `pos`.
fn skip_literal(bytes: &[u8], pos: usize) -> Option<usize> {
    match bytes[pos] {
        b'/' if bytes.get(pos + 1) == Some(&b'/') => Some(
            find_from(bytes, pos + 2, b"\n").unwrap_or(bytes.len()),
        ),
        b'/' if bytes.get(pos + 1) == Some(&b'*') => Some(
            find_from(bytes, pos + 2, b"*/")
                .map(|end| end + 2)
                .unwrap_or(bytes.len()),
        ),
        b'"' => Some(skip_string(bytes, pos)),
        b'\'' => skip_char(bytes, pos),
        _ => None,
    }
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn skip_string(bytes: &[u8], quote: usize) -> usize {
    if let Some(hashes) = raw_string_hashes(bytes, quote) {
        let mut terminator = vec![b'"'];
        terminator.extend(std::iter::repeat(b'#').take(hashes));
        return find_from(bytes, quote + 1, &terminator)
            .map(|end| end + terminator.len())
            .unwrap_or(bytes.len());
    }

    let verbatim = quote > 0
        && (bytes[quote - 1] == b'@'
            || (quote > 1 && bytes[quote - 1] == b'$' && bytes[quote - 2] == b'@'));
    let mut idx = quote + 1;
    while idx < bytes.len() {
        match bytes[idx] {
            b'\\' if !verbatim => idx += 2,
            b'"' if verbatim && bytes.get(idx + 1) == Some(&b'"') => idx += 2,
            b'"' => return idx + 1,
            _ => idx += 1,
        }
    }
    bytes.len()
}

/// `Some(n)` when the quote opens a Rust raw string `r#..#"` with `n` hashes.
fn raw_string_hashes(bytes: &[u8], quote: usize) -> Option<usize> {
    let hashes = bytes[..quote]
        .iter()
        .rev()
        .take_while(|byte| **byte == b'#')
        .count();
    let r_pos = quote.checked_sub(hashes + 1)?;
    if bytes[r_pos] != b'r' {
        return None;
    }
    let standalone = match r_pos.checked_sub(1).map(|idx| bytes[idx]) {
        None => true,
        Some(b'b') => r_pos
            .checked_sub(2)
            .map_or(true, |idx| !is_ident_byte(bytes[idx])),
        Some(prev) => !is_ident_byte(prev),
    };
    standalone.then_some(hashes)
}

fn skip_char(bytes: &[u8], quote: usize) -> Option<usize> {
    let next = *bytes.get(quote + 1)?;
    if next == b'\\' {
        let limit = (quote + 12).min(bytes.len());
        return (quote + 3..limit)
            .find(|idx| bytes[*idx] == b'\'')
            .map(|idx| idx + 1);
    }
    if next == b'\'' || next == b'\n' {
        return None;
    }
    let width = match next {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    };
    (bytes.get(quote + 1 + width) == Some(&b'\'')).then_some(quote + 2 + width)
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSHARP: &str = r#"using Xunit;

namespace Demo.Tests
{
    public class QuickSortTests
    {
        [Fact]
        public void Helper() { Setup(); }

        [Fact]
        public void NoDuplicateEntries()
        {
            var array = new[] { 72, 12, 20, 1, 20 };
            // sorting must not throw
            var ok = QuickSort.Sort(array);
            if (ok) { Console.WriteLine("{sorted}"); } else { Console.WriteLine("}"); }
            for (int i = 0; i < array.Length; i++) { Check(array[i]); }
            Assert.True(ok);
        }
    }
}
"#;

    fn texts(statements: &[Statement]) -> Vec<&str> {
        statements.iter().map(Statement::text).collect()
    }

    fn path() -> &'static Path {
        Path::new("QuickSortTests.cs")
    }

    #[test]
    fn splits_csharp_test_body() {
        let statements = unit_statements(CSHARP, "NoDuplicateEntries", path()).expect("statements");
        assert_eq!(
            texts(&statements),
            vec![
                "var array = new[] { 72, 12, 20, 1, 20 };",
                "// sorting must not throw\n            var ok = QuickSort.Sort(array);",
                "if (ok) { Console.WriteLine(\"{sorted}\"); } else { Console.WriteLine(\"}\"); }",
                "for (int i = 0; i < array.Length; i++) { Check(array[i]); }",
                "Assert.True(ok);",
            ]
        );
        assert_eq!(statements[0].leading(), "\n            ");
    }

    #[test]
    fn writing_read_statements_reproduces_source() {
        let statements = unit_statements(CSHARP, "NoDuplicateEntries", path()).expect("statements");
        let rendered =
            replace_unit_body(CSHARP, "NoDuplicateEntries", &statements, path()).expect("render");
        assert_eq!(rendered, CSHARP);
    }

    #[test]
    fn replacing_body_leaves_other_units_alone() {
        let statements = unit_statements(CSHARP, "NoDuplicateEntries", path()).expect("statements");
        let kept = vec![statements[0].clone(), statements[4].clone()];
        let rendered =
            replace_unit_body(CSHARP, "NoDuplicateEntries", &kept, path()).expect("render");

        assert!(rendered.contains("public void Helper() { Setup(); }"));
        assert!(!rendered.contains("QuickSort.Sort"));
        assert_eq!(
            texts(&unit_statements(&rendered, "NoDuplicateEntries", path()).expect("reparse")),
            vec!["var array = new[] { 72, 12, 20, 1, 20 };", "Assert.True(ok);"]
        );
        assert!(rendered.ends_with("Assert.True(ok);\n        }\n    }\n}\n"));
    }

    #[test]
    fn empty_body_keeps_closing_layout() {
        let rendered =
            replace_unit_body(CSHARP, "NoDuplicateEntries", &[], path()).expect("render");
        assert!(rendered.contains("public void NoDuplicateEntries()\n        {\n        }\n"));
        assert!(unit_statements(&rendered, "NoDuplicateEntries", path())
            .expect("reparse")
            .is_empty());
    }

    #[test]
    fn rust_literals_and_tail_expressions() {
        let source = r##"fn helper<'a>(x: &'a str) -> &'a str { x }

#[test]
fn repro() -> Result<(), String> {
    let open = '{';
    let raw = r#"a "quoted" } brace"#;
    /* a } stray ; brace */
    let value = match open { '{' => 1, _ => 2 };
    'outer: loop { break 'outer; }
    assert_eq!(value, 1);
    Ok(())
}
"##;
        let statements = unit_statements(source, "repro", Path::new("lib.rs")).expect("statements");
        assert_eq!(
            texts(&statements),
            vec![
                "let open = '{';",
                "let raw = r#\"a \"quoted\" } brace\"#;",
                "/* a } stray ; brace */\n    let value = match open { '{' => 1, _ => 2 };",
                "'outer: loop { break 'outer; }",
                "assert_eq!(value, 1);",
                "Ok(())",
            ]
        );
        let rendered =
            replace_unit_body(source, "repro", &statements, Path::new("lib.rs")).expect("render");
        assert_eq!(rendered, source);
    }

    #[test]
    fn call_sites_and_comments_are_not_definitions() {
        let source = "// repro() { fake }\nvoid caller() { repro(); }\nvoid repro() { a(); b(); }\n";
        let statements = unit_statements(source, "repro", Path::new("t.c")).expect("statements");
        assert_eq!(texts(&statements), vec!["a();", "b();"]);
    }

    #[test]
    fn do_while_and_try_catch_stay_whole() {
        let source = "void t() {\n  do { step(); } while (busy);\n  try { run(); } catch (Exception e) { log(e); } finally { done(); }\n  x = new Point { X = 1 };\n}\n";
        let statements = unit_statements(source, "t", Path::new("t.cs")).expect("statements");
        assert_eq!(
            texts(&statements),
            vec![
                "do { step(); } while (busy);",
                "try { run(); } catch (Exception e) { log(e); } finally { done(); }",
                "x = new Point { X = 1 };",
            ]
        );
    }

    #[test]
    fn missing_unit_is_reported() {
        let err = unit_statements(CSHARP, "Missing", path()).expect_err("missing");
        assert!(matches!(err, ReduceError::UnitNotFound { ref unit, .. } if unit == "Missing"));
    }

    #[test]
    fn unbalanced_body_is_a_parse_error() {
        let source = "fn broken() {\n    let x = (1;\n";
        let err = unit_statements(source, "broken", Path::new("b.rs")).expect_err("unbalanced");
        assert!(matches!(err, ReduceError::Parse { line: 1, .. }));
    }

    #[test]
    fn accessor_writes_archive_copy_without_touching_container() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = dir.path().join("QuickSortTests.cs");
        fs::write(&container, CSHARP).expect("write container");
        let accessor = BlockSourceAccessor::new();

        let statements = accessor
            .read_elements(&container, "NoDuplicateEntries")
            .expect("read");
        let archive = dir.path().join("out").join("Simplified").join("copy.cs");
        accessor
            .write_elements(&container, &archive, "NoDuplicateEntries", &statements[4..])
            .expect("write archive");

        assert_eq!(fs::read_to_string(&container).expect("container"), CSHARP);
        let archived = accessor
            .read_elements(&archive, "NoDuplicateEntries")
            .expect("read archive");
        assert_eq!(texts(&archived), vec!["Assert.True(ok);"]);
        assert!(!dir.path().join("out").join("Simplified").join("copy.cs.tmp").exists());
    }

    #[test]
    fn qualified_name_follows_csharp_namespace_and_class() {
        let name = qualified_name(CSHARP, "NoDuplicateEntries", path()).expect("name");
        assert_eq!(name, "Demo.Tests.QuickSortTests.NoDuplicateEntries");
    }

    #[test]
    fn qualified_name_uses_file_scoped_namespace_and_package() {
        let csharp = "namespace Demo.Tests;\n\npublic class SortTests\n{\n    public void Repro() { Run(); }\n}\n";
        assert_eq!(
            qualified_name(csharp, "Repro", Path::new("SortTests.cs")).expect("csharp"),
            "Demo.Tests.SortTests.Repro"
        );

        let java = "package org.demo;\n\nclass SortTest {\n    @Test\n    void repro() { run(); }\n}\n";
        assert_eq!(
            qualified_name(java, "repro", Path::new("SortTest.java")).expect("java"),
            "org.demo.SortTest.repro"
        );
    }

    #[test]
    fn qualified_name_separates_similar_rust_tests() {
        let source = r#"pub fn add(a: i32, b: i32) -> i32 { a + b }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repro_other() {
        panic!("unrelated {}", "}");
    }

    mod nested {
        #[test]
        fn repro() {
            assert_eq!(super::super::add(1, 1), 3);
        }
    }
}
"#;
        let lib = Path::new("/work/demo/src/lib.rs");
        assert_eq!(
            qualified_name(source, "repro_other", lib).expect("other"),
            "tests::repro_other"
        );
        assert_eq!(
            qualified_name(source, "repro", lib).expect("repro"),
            "tests::nested::repro"
        );
    }

    #[test]
    fn rust_module_path_comes_from_crate_layout() {
        let modules = |path: &str| rust_file_modules(Path::new(path)).join("::");
        assert_eq!(modules("/w/src/lib.rs"), "");
        assert_eq!(modules("/w/src/main.rs"), "");
        assert_eq!(modules("/w/src/net/codec.rs"), "net::codec");
        assert_eq!(modules("/w/src/net/mod.rs"), "net");
        assert_eq!(modules("/w/src/bin/tool.rs"), "");
        assert_eq!(modules("/w/tests/session.rs"), "");
        assert_eq!(modules("/home/src/demo/src/net/mod.rs"), "net");
        assert_eq!(modules("scratch.rs"), "");
    }
}
