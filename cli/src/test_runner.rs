use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Deserialize;

const TEST_SUFFIX: &str = ".test.txt";

#[derive(Debug, Deserialize)]
pub struct ExpectedWarning {
    /// Substring that must appear in the warning message.
    pub contains: String,

    /// If set, the warning's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Expected report (trimmed comparison).
    #[serde(default)]
    pub expect_output: Option<String>,

    /// Expected warnings, parse-time first, then engine. If present (even
    /// empty), warning count and content are checked.
    #[serde(default)]
    pub expect_warnings: Option<Vec<ExpectedWarning>>,
}

/// Split a `.test.txt` file into its TOML front matter and command script.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- front matter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- front matter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(TEST_SUFFIX))
                .unwrap_or("?")
        })
    }
}

/// A warning from either the parser or the engine, reduced to what the
/// expectations check.
struct Warning {
    message: String,
    span: Option<Range<usize>>,
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("front matter error: {}", e)),
    };
    let description = config.description.clone();

    let script = blockworld::parser::Parser::new(source.to_string(), 0).parse();
    let (report, engine_warnings) = match arm::run_script(&script) {
        Ok(pair) => pair,
        Err(e) => return fail(description, format!("unexpected error: {}", e)),
    };

    if let Some(expected) = &config.expect_output {
        let actual = report.to_string();
        if actual.trim() != expected.trim() {
            return fail(
                description,
                format!(
                    "output mismatch\n  expected:\n{}\n  actual:\n{}",
                    indent(expected.trim()),
                    indent(actual.trim())
                ),
            );
        }
    }

    if let Some(expected) = &config.expect_warnings {
        let warnings: Vec<Warning> = script
            .warnings
            .iter()
            .map(|w| Warning {
                message: format!("{}: {}", w.message, w.notes.join("; ")),
                span: Some(w.span.clone()),
            })
            .chain(engine_warnings.iter().map(|w| Warning {
                message: w.to_string(),
                span: w.span.clone(),
            }))
            .collect();
        if let Some(reason) = check_warnings(source, &warnings, expected) {
            return fail(description, reason);
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("    {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual warnings match expectations. Returns `Some(reason)` on mismatch.
fn check_warnings(source: &str, actual: &[Warning], expected: &[ExpectedWarning]) -> Option<String> {
    if actual.len() != expected.len() {
        let listed: Vec<String> = actual.iter().map(|w| format!("    - {}", w.message)).collect();
        return Some(format!(
            "expected {} warning(s), got {}\n  actual warnings:\n{}",
            expected.len(),
            actual.len(),
            if listed.is_empty() {
                "    (none)".to_string()
            } else {
                listed.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "warning[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        let Some(expected_line) = expected.line else {
            continue;
        };
        match &actual.span {
            Some(span) => {
                let actual_line = byte_offset_to_line(source, span.start);
                if actual_line != expected_line {
                    return Some(format!(
                        "warning[{}]: expected on line {}, but span is on line {}",
                        i, expected_line, actual_line
                    ));
                }
            }
            None => {
                return Some(format!(
                    "warning[{}]: expected on line {}, but warning has no span",
                    i, expected_line
                ));
            }
        }
    }

    None
}

/// Discover test files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
            continue;
        }
        let is_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(TEST_SUFFIX));
        if is_test {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn paint(text: &str, code: &str, no_color: bool) -> String {
    if no_color {
        text.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    }
}

/// Keep only the requested categories (and their subcategories).
fn filter_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut filtered = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let before = filtered.len();
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.as_str(), files);
            }
        }
        if filtered.len() == before {
            let available: Vec<&str> = all
                .keys()
                .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                .collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                available.join(", ")
            );
        }
    }
    filtered
}

/// Run all test files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let groups: Vec<(String, Vec<PathBuf>)> = if path.is_file() {
        vec![(String::new(), vec![path.to_path_buf()])]
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
            return 1;
        }
        let selected = filter_categories(&all, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        selected
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    };

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &groups {
        if !path.is_file() {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", paint(header, "1", no_color));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", paint("PASS", "32", no_color), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", paint("FAIL", "31", no_color), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            paint("ok", "32", no_color),
            passed
        );
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cases_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/cases")
    }

    fn write_case(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn front_matter_is_split_from_script() {
        let content = "---\ndescription = \"d\"\nexpect_output = \"0: 0\"\n---\n1\nquit\n";
        let (config, source) = parse_test_file(content).unwrap();
        assert_eq!(config.description.as_deref(), Some("d"));
        assert_eq!(config.expect_output.as_deref(), Some("0: 0"));
        assert!(config.expect_warnings.is_none());
        assert_eq!(source, "1\nquit\n");
    }

    #[test]
    fn front_matter_errors() {
        assert!(parse_test_file("1\nquit\n").is_err());
        assert!(parse_test_file("---\ndescription = \"d\"\n1\n").is_err());
        assert!(parse_test_file("---\nexpect_output = \n---\n1\n").is_err());
    }

    #[test]
    fn bundled_cases_pass() {
        assert_eq!(run_tests(&cases_dir(), true, &[]), 0);
    }

    #[test]
    fn single_category_runs() {
        assert_eq!(run_tests(&cases_dir(), true, &["warnings".to_string()]), 0);
        assert_eq!(run_tests(&cases_dir(), true, &["nope".to_string()]), 1);
    }

    #[test]
    fn output_is_compared_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_case(
            dir.path(),
            "wrong.test.txt",
            "---\nexpect_output = \"0\\n1: 1 0\"\n---\n2\nmove 0 onto 1\n",
        );
        let result = run_single_test(&path);
        assert!(matches!(result.outcome, TestOutcome::Pass));

        let path = write_case(
            dir.path(),
            "wrong.test.txt",
            "---\nexpect_output = \"0: 0\\n1: 1\"\n---\n2\nmove 0 onto 1\n",
        );
        let result = run_single_test(&path);
        match result.outcome {
            TestOutcome::Fail(reason) => assert!(reason.contains("output mismatch")),
            TestOutcome::Pass => panic!("expected failure"),
        }
        assert_eq!(run_tests(&path, true, &[]), 1);
    }

    #[test]
    fn warning_expectations_are_checked() {
        let dir = tempfile::tempdir().unwrap();
        let content = "---\n[[expect_warnings]]\ncontains = \"unrecognized\"\nline = 3\n---\n2\n\nlift 0\n";
        let path = write_case(dir.path(), "w.test.txt", content);
        assert!(matches!(run_single_test(&path).outcome, TestOutcome::Pass));

        let content = "---\nexpect_warnings = []\n---\n2\nmove 0 onto 5\n";
        let path = write_case(dir.path(), "w.test.txt", content);
        match run_single_test(&path).outcome {
            TestOutcome::Fail(reason) => assert!(reason.contains("expected 0 warning(s), got 1")),
            TestOutcome::Pass => panic!("expected failure"),
        }
    }

    #[test]
    fn label_falls_back_to_file_stem() {
        let result = TestResult {
            path: PathBuf::from("cases/basic/scenario.test.txt"),
            description: None,
            outcome: TestOutcome::Pass,
        };
        assert_eq!(result.label(), "scenario");
    }

    #[test]
    fn byte_offsets_map_to_lines() {
        let source = "a\nbb\nccc";
        assert_eq!(byte_offset_to_line(source, 0), 1);
        assert_eq!(byte_offset_to_line(source, 2), 2);
        assert_eq!(byte_offset_to_line(source, 5), 3);
        assert_eq!(byte_offset_to_line(source, 100), 3);
    }
}
