//! `gqlkit.config.json`: raw validation, typed deserialization, defaults.
//!
//! Validation walks the untyped [`serde_json::Value`] first so that every
//! problem surfaces as a `CONFIG_*` diagnostic in one pass. Only a document
//! without errors is deserialized into [`GqlkitConfig`].
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::diagnostics::{has_errors, Diagnostic, DiagnosticCode, SourceLocation};
use crate::error::{GqlkitError, Result};
use crate::extract::scalars::ScalarMapping;
use crate::extract::shape::ScalarOnly;
use crate::ir::is_builtin_scalar;

pub const CONFIG_FILE: &str = "gqlkit.config.json";
pub const DEFAULT_SOURCE_DIR: &str = "src/gqlkit";
pub const DEFAULT_RESOLVERS_PATH: &str = "src/gqlkit/__generated__/resolvers.ts";
pub const DEFAULT_TYPE_DEFS_PATH: &str = "src/gqlkit/__generated__/typeDefs.ts";
pub const DEFAULT_SCHEMA_PATH: &str = "src/gqlkit/__generated__/schema.graphql";

// ------------------------------ File shape -------------------------------- //

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GqlkitConfig {
    pub source_dir: Option<String>,
    pub source_ignore_globs: Option<Vec<String>>,
    pub tsconfig_path: Option<String>,
    pub output: Option<OutputConfig>,
    pub scalars: Vec<ScalarConfig>,
    pub hooks: Option<HooksConfig>,
    pub enable_pruning: bool,
}

/// Each path is tri-state: absent (default), `null` (suppressed), or a path.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    #[serde(default, deserialize_with = "present")]
    pub resolvers_path: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub type_defs_path: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub schema_path: Option<Option<String>>,
}

fn present<'de, D, T>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarConfig {
    pub name: String,
    pub ts_type: TsTypeConfig,
    #[serde(default)]
    pub only: Option<ScalarOnly>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TsTypeConfig {
    pub name: String,
    #[serde(default)]
    pub from: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HooksConfig {
    pub after_all_file_write: Option<HookCommands>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HookCommands {
    One(String),
    Many(Vec<String>),
}

// ------------------------------- Resolved --------------------------------- //

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedOutput {
    pub resolvers_path: Option<PathBuf>,
    pub type_defs_path: Option<PathBuf>,
    pub schema_path: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedConfig {
    pub source_dir: PathBuf,
    pub source_ignore_globs: Vec<String>,
    pub tsconfig_path: Option<PathBuf>,
    pub output: ResolvedOutput,
    pub scalars: Vec<ScalarMapping>,
    pub after_all_file_write: Vec<String>,
    pub enable_pruning: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        GqlkitConfig::default().resolve()
    }
}

impl GqlkitConfig {
    pub fn resolve(self) -> ResolvedConfig {
        let output = self.output.unwrap_or_default();
        let path = |value: Option<Option<String>>, default: &str| match value {
            None => Some(PathBuf::from(default)),
            Some(value) => value.map(PathBuf::from),
        };
        let after_all_file_write = match self.hooks.and_then(|h| h.after_all_file_write) {
            None => Vec::new(),
            Some(HookCommands::One(command)) => vec![command],
            Some(HookCommands::Many(commands)) => commands,
        };
        ResolvedConfig {
            source_dir: PathBuf::from(self.source_dir.unwrap_or_else(|| DEFAULT_SOURCE_DIR.to_string())),
            source_ignore_globs: self.source_ignore_globs.unwrap_or_default(),
            tsconfig_path: self.tsconfig_path.map(PathBuf::from),
            output: ResolvedOutput {
                resolvers_path: path(output.resolvers_path, DEFAULT_RESOLVERS_PATH),
                type_defs_path: path(output.type_defs_path, DEFAULT_TYPE_DEFS_PATH),
                schema_path: path(output.schema_path, DEFAULT_SCHEMA_PATH),
            },
            scalars: self
                .scalars
                .into_iter()
                .map(|s| ScalarMapping {
                    graphql_name: s.name,
                    type_name: s.ts_type.name,
                    import_path: s.ts_type.from,
                    only: s.only,
                    description: s.description,
                })
                .collect(),
            after_all_file_write,
            enable_pruning: self.enable_pruning,
        }
    }
}

// ------------------------------- Loading ---------------------------------- //

#[derive(Debug)]
pub struct ConfigLoad {
    /// `None` when validation reported errors.
    pub config: Option<ResolvedConfig>,
    pub diagnostics: Vec<Diagnostic>,
    /// File the configuration came from; `None` when defaults were used.
    pub path: Option<PathBuf>,
}

/// Loads `explicit`, or `<cwd>/gqlkit.config.json` when present, else defaults.
pub fn load_config(cwd: &Path, explicit: Option<&Path>) -> Result<ConfigLoad> {
    let path = match explicit {
        Some(path) => cwd.join(path),
        None => {
            let candidate = cwd.join(CONFIG_FILE);
            if !candidate.exists() {
                debug!("no {CONFIG_FILE}, using defaults");
                return Ok(ConfigLoad { config: Some(ResolvedConfig::default()), diagnostics: Vec::new(), path: None });
            }
            candidate
        }
    };
    let source = std::fs::read_to_string(&path).map_err(|source| GqlkitError::Read { path: path.clone(), source })?;
    let value: Value = serde_json::from_str(&source)?;
    let mut load = parse_config(value, Some(&path))?;
    load.path = Some(path);
    Ok(load)
}

/// Validates and resolves an already-parsed document.
pub fn parse_config(value: Value, path: Option<&Path>) -> Result<ConfigLoad> {
    let diagnostics = validate_config(&value, path);
    if has_errors(&diagnostics) {
        return Ok(ConfigLoad { config: None, diagnostics, path: None });
    }
    let config: GqlkitConfig = crate::path_de::from_value_with_path(value).map_err(|message| GqlkitError::Config {
        path: path.map(Path::to_path_buf).unwrap_or_default(),
        message,
    })?;
    Ok(ConfigLoad { config: Some(config.resolve()), diagnostics, path: None })
}

// ------------------------------ Validation -------------------------------- //

struct Validator {
    location: Option<SourceLocation>,
    diagnostics: Vec<Diagnostic>,
}

impl Validator {
    fn report(&mut self, code: DiagnosticCode, message: String) {
        self.diagnostics.push(Diagnostic::error(code, message).at(self.location.clone()));
    }
}

/// Every `CONFIG_*` problem in the document, in document order.
pub fn validate_config(value: &Value, path: Option<&Path>) -> Vec<Diagnostic> {
    let mut v = Validator { location: path.map(SourceLocation::file_only), diagnostics: Vec::new() };
    let Some(root) = value.as_object() else {
        v.report(DiagnosticCode::ConfigInvalidType, "configuration must be a JSON object".into());
        return v.diagnostics;
    };

    if let Some(source_dir) = root.get("sourceDir") {
        match source_dir.as_str() {
            Some(dir) if !dir.trim().is_empty() => {}
            _ => v.report(DiagnosticCode::ConfigInvalidSourceDir, "sourceDir must be a non-empty string".into()),
        }
    }

    if let Some(globs) = root.get("sourceIgnoreGlobs") {
        match globs.as_array() {
            Some(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    match entry.as_str() {
                        Some(pattern) if glob::Pattern::new(pattern).is_ok() => {}
                        Some(pattern) => v.report(
                            DiagnosticCode::ConfigInvalidIgnoreGlobs,
                            format!("sourceIgnoreGlobs[{i}] \"{pattern}\" is not a valid glob pattern"),
                        ),
                        None => v.report(
                            DiagnosticCode::ConfigInvalidIgnoreGlobs,
                            format!("sourceIgnoreGlobs[{i}] must be a string"),
                        ),
                    }
                }
            }
            None => v.report(DiagnosticCode::ConfigInvalidIgnoreGlobs, "sourceIgnoreGlobs must be an array of strings".into()),
        }
    }

    if let Some(tsconfig) = root.get("tsconfigPath") {
        if !(tsconfig.is_null() || tsconfig.is_string()) {
            v.report(DiagnosticCode::ConfigInvalidPath, "tsconfigPath must be a string or null".into());
        }
    }

    if let Some(output) = root.get("output") {
        match output.as_object() {
            Some(output) => {
                for key in ["resolversPath", "typeDefsPath", "schemaPath"] {
                    match output.get(key) {
                        None | Some(Value::Null) => {}
                        Some(Value::String(s)) if !s.trim().is_empty() => {}
                        Some(_) => v.report(
                            DiagnosticCode::ConfigInvalidOutputPath,
                            format!("output.{key} must be a non-empty string or null"),
                        ),
                    }
                }
            }
            None => v.report(DiagnosticCode::ConfigInvalidType, "output must be an object".into()),
        }
    }

    if let Some(scalars) = root.get("scalars") {
        match scalars.as_array() {
            Some(entries) => validate_scalars(&mut v, entries),
            None => v.report(DiagnosticCode::ConfigInvalidType, "scalars must be an array".into()),
        }
    }

    if let Some(hooks) = root.get("hooks") {
        match hooks.as_object() {
            Some(hooks) => match hooks.get("afterAllFileWrite") {
                None | Some(Value::Null) => {}
                Some(Value::String(command)) => {
                    if command.trim().is_empty() {
                        v.report(DiagnosticCode::ConfigInvalidHookCommand, "hooks.afterAllFileWrite is empty".into());
                    }
                }
                Some(Value::Array(commands)) => {
                    for (i, command) in commands.iter().enumerate() {
                        match command.as_str() {
                            Some(c) if c.trim().is_empty() => v.report(
                                DiagnosticCode::ConfigInvalidHookCommand,
                                format!("hooks.afterAllFileWrite[{i}] is empty"),
                            ),
                            Some(_) => {}
                            None => v.report(
                                DiagnosticCode::ConfigInvalidHookType,
                                format!("hooks.afterAllFileWrite[{i}] must be a string"),
                            ),
                        }
                    }
                }
                Some(_) => v.report(
                    DiagnosticCode::ConfigInvalidHookType,
                    "hooks.afterAllFileWrite must be a string or an array of strings".into(),
                ),
            },
            None => v.report(DiagnosticCode::ConfigInvalidType, "hooks must be an object".into()),
        }
    }

    if let Some(pruning) = root.get("enablePruning") {
        if !pruning.is_boolean() {
            v.report(DiagnosticCode::ConfigInvalidType, "enablePruning must be a boolean".into());
        }
    }

    v.diagnostics
}

struct SeenMapping {
    index: usize,
    only: Option<ScalarOnly>,
}

fn validate_scalars(v: &mut Validator, entries: &[Value]) {
    let mut by_name: BTreeMap<String, Vec<SeenMapping>> = BTreeMap::new();
    let mut by_type: BTreeMap<(String, Option<String>), (usize, String)> = BTreeMap::new();

    for (i, entry) in entries.iter().enumerate() {
        let at = format!("scalars[{i}]");
        let Some(entry) = entry.as_object() else {
            v.report(DiagnosticCode::ConfigInvalidType, format!("{at} must be an object"));
            continue;
        };

        let name = match entry.get("name") {
            None => {
                v.report(DiagnosticCode::ConfigMissingProperty, format!("{at} is missing \"name\""));
                None
            }
            Some(Value::String(name)) => Some(name.clone()),
            Some(_) => {
                v.report(DiagnosticCode::ConfigInvalidType, format!("{at}.name must be a string"));
                None
            }
        };
        if let Some(name) = &name {
            if is_builtin_scalar(name) {
                v.report(
                    DiagnosticCode::ConfigBuiltinOverride,
                    format!("{at} maps built-in scalar \"{name}\", which cannot be overridden"),
                );
            }
        }

        let ts_type = match entry.get("tsType") {
            None => {
                v.report(DiagnosticCode::ConfigMissingProperty, format!("{at} is missing \"tsType\""));
                None
            }
            Some(Value::Object(ts_type)) => {
                let type_name = match ts_type.get("name") {
                    None => {
                        v.report(DiagnosticCode::ConfigMissingProperty, format!("{at}.tsType is missing \"name\""));
                        None
                    }
                    Some(Value::String(n)) => Some(n.clone()),
                    Some(_) => {
                        v.report(DiagnosticCode::ConfigInvalidType, format!("{at}.tsType.name must be a string"));
                        None
                    }
                };
                let from = match ts_type.get("from") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(from)) => Some(from.clone()),
                    Some(_) => {
                        v.report(DiagnosticCode::ConfigInvalidType, format!("{at}.tsType.from must be a string or null"));
                        None
                    }
                };
                type_name.map(|n| (n, from))
            }
            Some(_) => {
                v.report(DiagnosticCode::ConfigInvalidType, format!("{at}.tsType must be an object"));
                None
            }
        };

        let only = match entry.get("only") {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) if ScalarOnly::parse(s).is_some() => Some(ScalarOnly::parse(s)),
            Some(other) => {
                v.report(
                    DiagnosticCode::ConfigInvalidOutputType,
                    format!("{at}.only must be \"input\", \"output\" or null, found {other}"),
                );
                None
            }
        };

        if let Some(description) = entry.get("description") {
            if !(description.is_null() || description.is_string()) {
                v.report(DiagnosticCode::ConfigInvalidType, format!("{at}.description must be a string or null"));
            }
        }

        if let (Some(name), Some(only)) = (&name, only) {
            let seen = by_name.entry(name.clone()).or_default();
            if let Some(prior) = seen.iter().find(|s| s.only.is_none() || only.is_none() || s.only == only) {
                let role = only.or(prior.only).map(|o| o.as_str()).unwrap_or("input and output");
                v.report(
                    DiagnosticCode::ConfigDuplicateMapping,
                    format!("{at} maps scalar \"{name}\" for {role} again (first mapped at scalars[{}])", prior.index),
                );
            }
            seen.push(SeenMapping { index: i, only });
        }

        if let (Some(name), Some(key)) = (&name, ts_type) {
            match by_type.get(&key) {
                Some((prior, prior_name)) if prior_name != name => v.report(
                    DiagnosticCode::ConfigDuplicateType,
                    format!(
                        "{at} maps TypeScript type \"{}\" to \"{name}\", but scalars[{prior}] already maps it to \"{prior_name}\"",
                        key.0
                    ),
                ),
                Some(_) => {}
                None => {
                    by_type.insert(key, (i, name.clone()));
                }
            }
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
