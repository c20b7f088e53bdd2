//! Structural tests for architectural boundary enforcement.
//!
//! These tests scan source files to verify that the layer boundaries
//! (domain, application, infra, commands) hold.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-comment lines outside `#[cfg(test)]` blocks, with their line numbers.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut tracker = CfgTestTracker::new();
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            !in_test && !trimmed.starts_with("//") && !trimmed.starts_with('*')
        })
        .map(|(i, line)| (i + 1, line.to_string()))
        .collect()
}

fn src_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("src")
}

fn relative(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Scan every file under `dir` for any of `forbidden`.
fn violations_in(dir: &Path, forbidden: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        let rel = relative(&file);
        for (lineno, line) in production_lines(&file) {
            if let Some(pattern) = forbidden.iter().find(|p| line.contains(*p)) {
                violations.push(format!("{rel}:{lineno}: `{pattern}`: {}", line.trim()));
            }
        }
    }
    violations
}

#[test]
fn domain_is_pure() {
    let violations = violations_in(
        &src_dir().join("domain"),
        &[
            "crate::infra",
            "crate::commands",
            "crate::application",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must not depend on I/O or outer layers:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_does_not_reach_into_adapters() {
    let violations = violations_in(
        &src_dir().join("application"),
        &[
            "crate::infra",
            "crate::commands",
            "crate::output",
            "TokioCommandRunner",
            "GcloudEnvironment",
        ],
    );
    assert!(
        violations.is_empty(),
        "application/ must only see ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = violations_in(&src_dir().join("infra"), &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = violations_in(
        &src_dir().join("infra"),
        &["println!", "eprintln!", "print!(", "eprint!("],
    );
    assert!(
        violations.is_empty(),
        "infra/ must report through return values, not the terminal:\n{}",
        violations.join("\n")
    );
}

#[test]
fn command_runner_is_built_only_by_app_context() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir()) {
        let rel = relative(&file);
        if rel.ends_with("app.rs") || rel.ends_with("command_runner.rs") {
            continue;
        }
        for (lineno, line) in production_lines(&file) {
            if line.contains("TokioCommandRunner::new") {
                violations.push(format!("{rel}:{lineno}: {}", line.trim()));
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Only AppContext constructs the command runner:\n{}",
        violations.join("\n")
    );
}

#[test]
fn command_handlers_finish_through_the_tui() {
    let commands = src_dir().join("commands");
    let mut missing = Vec::new();
    for name in ["init", "force_unlock", "model", "dvc", "experiments", "config"] {
        let path = commands.join(format!("{name}.rs"));
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        if !content.contains("tui.conclude(") {
            missing.push(relative(&path));
        }
    }
    assert!(
        missing.is_empty(),
        "Command handlers must end with `tui.conclude(..)`:\n{}",
        missing.join("\n")
    );
}
