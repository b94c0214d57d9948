//! The end-to-end pipeline: sources → extraction → lowering → integration →
//! validation → (pruning) → SDL and code strings.
//!
//! [`generate_from_program`] is pure. [`generate_schema`] adds source discovery
//! and reading on top of it; writing artifacts and running hooks is the CLI's job.
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::codegen::{resolvers_code, type_defs_code};
use crate::config::ResolvedConfig;
use crate::diagnostics::{has_errors, Diagnostic};
use crate::error::Result;
use crate::extract::resolvers::extract_resolvers;
use crate::extract::scalars::{collect_scalars, ScalarRegistry};
use crate::extract::types::extract_types;
use crate::integrate::integrate;
use crate::lower::{lower_resolvers, lower_types};
use crate::program::Program;
use crate::prune::prune_unreferenced;
use crate::sdl::{build_document, print_sdl};
use crate::validate::{validate_arguments, validate_output_fields, ValidationContext};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSchemaResult {
    pub type_defs_code: String,
    pub resolvers_code: String,
    pub sdl_content: String,
    pub diagnostics: Vec<Diagnostic>,
    pub has_errors: bool,
    /// Present only when pruning is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pruned_types: Option<Vec<String>>,
}

/// Discovers sources under `config.source_dir`, loads them and runs the pipeline.
pub fn generate_schema(cwd: &Path, config: &ResolvedConfig) -> Result<GenerateSchemaResult> {
    let files = discover_sources(cwd, config)?;
    info!(files = files.len(), dir = %config.source_dir.display(), "sources discovered");
    let load = Program::load(&files);
    let resolvers_dir = config
        .output
        .resolvers_path
        .as_ref()
        .and_then(|p| p.parent())
        .map(|dir| cwd.join(dir))
        .unwrap_or_else(|| cwd.to_path_buf());
    let mut result = generate_from_program(&load.program, load.diagnostics, config, &resolvers_dir);
    for diagnostic in &mut result.diagnostics {
        if let Some(location) = &mut diagnostic.location {
            if let Ok(relative) = location.file.strip_prefix(cwd) {
                location.file = relative.to_path_buf();
            }
        }
    }
    Ok(result)
}

/// Runs every pipeline stage over an already-loaded program.
///
/// `upstream` diagnostics (e.g. from loading) are reported first. `resolvers_dir`
/// is where the resolvers module will live; its imports are relative to it.
pub fn generate_from_program(
    program: &Program,
    upstream: Vec<Diagnostic>,
    config: &ResolvedConfig,
    resolvers_dir: &Path,
) -> GenerateSchemaResult {
    let registry = ScalarRegistry::build(program, &config.scalars);
    let types = extract_types(program, &registry.registry);
    let scalars = collect_scalars(registry.registry.bindings());
    let lowered = lower_types(&types, &scalars);
    let resolvers = extract_resolvers(program, &registry.registry);
    debug!(types = types.types.len(), resolvers = resolvers.resolvers.len(), "extracted");
    let lowered_resolvers = lower_resolvers(&resolvers);

    let mut integrated = integrate(&lowered, &lowered_resolvers, Some(&scalars));
    let ctx = ValidationContext::from_integrated(&integrated);
    let arguments = validate_arguments(&integrated.type_extensions, &integrated.input_types, &ctx);
    let outputs = validate_output_fields(&integrated, &ctx);

    let mut diagnostics = upstream;
    diagnostics.extend(registry.diagnostics);
    diagnostics.append(&mut integrated.diagnostics);
    diagnostics.extend(arguments.diagnostics);
    diagnostics.extend(outputs);
    integrated.has_errors = has_errors(&diagnostics);

    let (integrated, pruned_types) = if config.enable_pruning {
        let pruned = prune_unreferenced(&integrated);
        (pruned.integrated, Some(pruned.pruned_types))
    } else {
        (integrated, None)
    };

    let document = build_document(&integrated);
    let has_errors = integrated.has_errors;
    info!(diagnostics = diagnostics.len(), has_errors, "schema generated");
    GenerateSchemaResult {
        type_defs_code: type_defs_code(&document),
        resolvers_code: resolvers_code(&integrated, resolvers_dir),
        sdl_content: print_sdl(&document),
        diagnostics,
        has_errors,
        pruned_types,
    }
}

// ------------------------------ Discovery --------------------------------- //

/// `*.ts` / `*.tsx` under the source dir, minus declaration files, generated
/// output and `source_ignore_globs` (matched relative to `cwd`). Sorted.
pub fn discover_sources(cwd: &Path, config: &ResolvedConfig) -> Result<Vec<PathBuf>> {
    let root = cwd.join(&config.source_dir);
    let ignore = config
        .source_ignore_globs
        .iter()
        .map(|pattern| glob::Pattern::new(pattern))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let base = glob::Pattern::escape(&root.to_string_lossy());
    let mut files = Vec::new();
    for extension in ["ts", "tsx"] {
        for entry in glob::glob(&format!("{base}/**/*.{extension}"))? {
            let path = entry?;
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            if name.ends_with(".d.ts") || path.components().any(|c| c.as_os_str() == "__generated__") {
                continue;
            }
            let relative = path.strip_prefix(cwd).unwrap_or(&path);
            if ignore.iter().any(|pattern| pattern.matches_path(relative)) {
                debug!(path = %relative.display(), "ignored by sourceIgnoreGlobs");
                continue;
            }
            files.push(path);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;

    #[test]
    fn discovery_skips_generated_declarations_and_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src/gqlkit");
        for file in ["schema/user.ts", "schema/view.tsx", "schema/types.d.ts", "__generated__/resolvers.ts", "legacy/old.ts"] {
            let path = src.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, "export {};\n").unwrap();
        }
        let config = ResolvedConfig { source_ignore_globs: vec!["src/gqlkit/legacy/**".into()], ..Default::default() };
        let files = discover_sources(dir.path(), &config).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.strip_prefix(&src).unwrap().to_path_buf()).collect();
        assert_eq!(names, [PathBuf::from("schema/user.ts"), PathBuf::from("schema/view.tsx")]);
    }

    #[test]
    fn generate_schema_reports_relative_locations() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src/gqlkit");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("types.ts"), "export type String = { value: string };\n").unwrap();
        let result = generate_schema(dir.path(), &ResolvedConfig::default()).unwrap();
        assert!(result.has_errors);
        let diag = result.diagnostics.iter().find(|d| d.code == DiagnosticCode::ReservedTypeName).unwrap();
        let location = diag.location.as_ref().unwrap();
        assert_eq!(location.file, PathBuf::from("src/gqlkit/types.ts"));
        assert!(result.pruned_types.is_none());
    }
}
