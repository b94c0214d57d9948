//! Thin CLI: gen | check
use std::path::{Path, PathBuf};
use std::process::Command as Process;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use crate::config::{load_config, ResolvedConfig};
use crate::diagnostics::{Diagnostic, Severity};
use crate::error::GqlkitError;
use crate::generate::{generate_schema, GenerateSchemaResult};

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// generate a GraphQL schema and resolver map from TypeScript sources
#[derive(Parser, Debug)]
#[command(name = "gqlkit", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// run the pipeline and write schema, typeDefs and resolvers
    Gen(Settings),
    /// run the pipeline and only report diagnostics
    Check(Settings),
}

#[derive(Args, Debug, Clone)]
struct Settings {
    /// config file (default: ./gqlkit.config.json when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// project directory every configured path is relative to
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// debug logging (RUST_LOG overrides)
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATION
// ---------------------------------------------------------------------------

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbose(&self) -> bool {
        self.settings().verbose
    }

    fn settings(&self) -> &Settings {
        match &self.cmd {
            Command::Gen(settings) | Command::Check(settings) => settings,
        }
    }

    /// `Ok(false)` when diagnostics contain errors.
    pub fn run(&self) -> anyhow::Result<bool> {
        let settings = self.settings();
        let cwd = match &settings.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir().context("failed to determine the working directory")?,
        };
        let load = load_config(&cwd, settings.config.as_deref())?;
        print_diagnostics(&load.diagnostics);
        let Some(config) = load.config else {
            return Ok(false);
        };

        let result = generate_schema(&cwd, &config)?;
        print_diagnostics(&result.diagnostics);
        if let Some(pruned) = result.pruned_types.as_ref().filter(|p| !p.is_empty()) {
            info!(count = pruned.len(), types = %pruned.join(", "), "pruned unreferenced types");
        }

        if let Command::Gen(_) = self.cmd {
            let written = write_artifacts(&cwd, &config, &result)?;
            run_hooks(&cwd, &config.after_all_file_write, &written)?;
        }
        Ok(!result.has_errors)
    }
}

// ---------------------------------------------------------------------------
// INTERNAL HELPERS
// ---------------------------------------------------------------------------

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => format!("error[{}]", diagnostic.code).red().bold(),
            Severity::Warning => format!("warning[{}]", diagnostic.code).yellow().bold(),
        };
        eprintln!("{label}: {}", diagnostic.message);
        if let Some(location) = &diagnostic.location {
            eprintln!("  {} {location}", "-->".blue());
        }
    }
}

fn write_artifacts(cwd: &Path, config: &ResolvedConfig, result: &GenerateSchemaResult) -> crate::error::Result<Vec<PathBuf>> {
    let outputs = [
        (&config.output.resolvers_path, &result.resolvers_code),
        (&config.output.type_defs_path, &result.type_defs_code),
        (&config.output.schema_path, &result.sdl_content),
    ];
    let mut written = Vec::new();
    for (path, content) in outputs {
        let Some(path) = path else { continue };
        let full = cwd.join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|source| GqlkitError::Write { path: full.clone(), source })?;
        }
        std::fs::write(&full, content).map_err(|source| GqlkitError::Write { path: full.clone(), source })?;
        info!(path = %path.display(), "wrote");
        written.push(path.clone());
    }
    Ok(written)
}

/// Each hook runs through `sh -c` in `cwd` with the written paths appended.
fn run_hooks(cwd: &Path, commands: &[String], written: &[PathBuf]) -> crate::error::Result<()> {
    if written.is_empty() {
        return Ok(());
    }
    let args: Vec<String> = written.iter().map(|p| shell_quote(&p.to_string_lossy())).collect();
    for command in commands {
        let line = format!("{command} {}", args.join(" "));
        info!(hook = %line, "running afterAllFileWrite");
        let status = Process::new("sh").arg("-c").arg(&line).current_dir(cwd).status()?;
        if !status.success() {
            return Err(GqlkitError::Hook { command: command.clone(), status });
        }
    }
    Ok(())
}

fn shell_quote(arg: &str) -> String {
    if arg.chars().all(|c| c.is_ascii_alphanumeric() || "/._-".contains(c)) {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

// ------------------------------- Tests ------------------------------------ //
