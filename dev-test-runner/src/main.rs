//! Runs every `fixtures/*/` project through the pipeline and checks it
//! against the fixture's `expected.json`.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Expected {
    has_errors: bool,
    /// Diagnostic codes in report order.
    #[serde(default)]
    diagnostics: Vec<String>,
    #[serde(default)]
    sdl_contains: Vec<String>,
}

fn main() -> ExitCode {
    let root = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("fixtures"));
    match run_all(&root) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("{failed} fixture(s) failed");
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn run_all(root: &Path) -> anyhow::Result<usize> {
    let pattern = format!("{}/*/expected.json", glob::Pattern::escape(&root.to_string_lossy()));
    let mut failed = 0;
    for entry in glob::glob(&pattern)? {
        let expected_path = entry?;
        let dir = expected_path.parent().ok_or_else(|| anyhow!("fixture without a directory"))?;
        match run_one(dir, &expected_path) {
            Ok(problems) if problems.is_empty() => println!("ok      {}", dir.display()),
            Ok(problems) => {
                failed += 1;
                println!("FAILED  {}", dir.display());
                for problem in problems {
                    println!("          {problem}");
                }
            }
            Err(error) => {
                failed += 1;
                println!("ERROR   {}: {error:#}", dir.display());
            }
        }
    }
    Ok(failed)
}

fn run_one(dir: &Path, expected_path: &Path) -> anyhow::Result<Vec<String>> {
    let src = std::fs::read_to_string(expected_path).with_context(|| format!("reading {}", expected_path.display()))?;
    let expected: Expected = gqlkit::path_de::from_str_with_path(&src).map_err(|e| anyhow!(e))?;

    let load = gqlkit::config::load_config(dir, None)?;
    let config = load.config.ok_or_else(|| anyhow!("invalid gqlkit.config.json"))?;
    let result = gqlkit::generate_schema(dir, &config)?;

    let mut problems = Vec::new();
    if result.has_errors != expected.has_errors {
        problems.push(format!("hasErrors: expected {}, got {}", expected.has_errors, result.has_errors));
    }
    let codes: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
    if codes != expected.diagnostics {
        problems.push(format!("diagnostics: expected {:?}, got {:?}", expected.diagnostics, codes));
    }
    for needle in &expected.sdl_contains {
        if !result.sdl_content.contains(needle.as_str()) {
            problems.push(format!("schema does not contain {needle:?}"));
        }
    }
    Ok(problems)
}
