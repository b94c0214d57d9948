//! Custom scalars: where they are registered and how the bindings are collected.
//!
//! A scalar binding ties a TypeScript type to a GraphQL scalar name. Bindings come
//! from `DefineScalar<..>` aliases anywhere in the program and from config
//! mappings. [`collect_scalars`] folds them into one [`ScalarDefinition`] per name.
use std::collections::BTreeMap;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use swc_ecma_ast::TsType;
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticCode, SourceLocation};
use crate::ir::BUILTIN_SCALARS;
use crate::program::{Program, SymbolRef, TypeDeclKind, TypeDeclNode};
use super::shape::{define_scalar_args, strip_parens, ScalarOnly};

/// One `scalars[]` entry of the configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScalarMapping {
    pub graphql_name: String,
    pub type_name: String,
    pub import_path: Option<String>,
    pub only: Option<ScalarOnly>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScalarBinding {
    pub scalar_name: String,
    pub type_name: String,
    pub base: Option<String>,
    pub only: Option<ScalarOnly>,
    pub description: Option<String>,
    pub source_file: Option<PathBuf>,   // declaring file, None for config
    pub import_path: Option<String>,    // config `tsType.from`
    pub location: Option<SourceLocation>,
}

impl ScalarBinding {
    fn input_capable(&self) -> bool {
        self.only != Some(ScalarOnly::Output)
    }

    fn output_capable(&self) -> bool {
        self.only != Some(ScalarOnly::Input)
    }

    fn origin(&self) -> String {
        match &self.location {
            Some(location) => format!("{} ({location})", self.type_name),
            None => format!("{} (config)", self.type_name),
        }
    }
}

#[derive(Default)]
pub struct ScalarRegistry {
    declared: IndexMap<SymbolRef, ScalarBinding>,
    mapped: Vec<ScalarBinding>,
}

pub struct RegistryLoad {
    pub registry: ScalarRegistry,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScalarRegistry {
    pub fn build(program: &Program, mappings: &[ScalarMapping]) -> RegistryLoad {
        let mut registry = ScalarRegistry::default();
        let mut diagnostics = Vec::new();

        for module in program.modules() {
            for (name, site) in &module.symbols.type_decls {
                if site.kind != TypeDeclKind::TypeAlias {
                    continue;
                }
                let symbol = SymbolRef { module: module.path().to_path_buf(), local: name.clone() };
                let Some(decl) = program.type_decl(&symbol) else { continue };
                let TypeDeclNode::Alias(alias) = decl.node else { continue };
                let TsType::TsTypeRef(type_ref) = strip_parens(&alias.type_ann) else { continue };
                let swc_ecma_ast::TsEntityName::Ident(callee) = &type_ref.type_name else { continue };
                let is_define_scalar = match program.resolve_name(module.path(), &callee.sym) {
                    Some(resolved) => resolved.is_runtime("DefineScalar"),
                    None => &*callee.sym == "DefineScalar",
                };
                if !is_define_scalar {
                    continue;
                }
                match define_scalar_args(module, type_ref) {
                    Ok(scalar) => {
                        let doc = module.parsed.doc_at_any(&[decl.item_lo, alias.span.lo]);
                        registry.declared.insert(symbol, ScalarBinding {
                            scalar_name: scalar.scalar_name,
                            type_name: name.clone(),
                            base: Some(scalar.base),
                            only: scalar.only,
                            description: doc.description,
                            source_file: Some(module.path().to_path_buf()),
                            import_path: None,
                            location: Some(module.parsed.location(alias.span)),
                        });
                    }
                    Err(message) if module.scanned => diagnostics.push(
                        Diagnostic::error(DiagnosticCode::UnsupportedSyntax, format!("`{name}`: {message}"))
                            .at(Some(module.parsed.location(alias.span))),
                    ),
                    Err(_) => {}
                }
            }
        }

        registry.mapped = mappings
            .iter()
            .map(|m| ScalarBinding {
                scalar_name: m.graphql_name.clone(),
                type_name: m.type_name.clone(),
                base: None,
                only: m.only,
                description: m.description.clone(),
                source_file: None,
                import_path: m.import_path.clone(),
                location: None,
            })
            .collect();

        debug!(declared = registry.declared.len(), mapped = registry.mapped.len(), "scalar registry built");
        RegistryLoad { registry, diagnostics }
    }

    pub fn declared(&self, symbol: &SymbolRef) -> Option<&ScalarBinding> {
        self.declared.get(symbol)
    }

    /// Config mapping for a TS type name; a mapping with `from` only matches names
    /// imported from that specifier.
    pub fn mapped(&self, type_name: &str, specifier: Option<&str>) -> Option<&ScalarBinding> {
        self.mapped.iter().find(|binding| {
            binding.type_name == type_name
                && binding.import_path.as_deref().is_none_or(|from| Some(from) == specifier)
        })
    }

    pub fn bindings(&self) -> impl Iterator<Item = &ScalarBinding> {
        self.declared.values().chain(self.mapped.iter())
    }
}

// ------------------------------- Collector -------------------------------- //

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScalarTypeRef {
    pub type_name: String,
    pub source_file: Option<PathBuf>,
    pub import_path: Option<String>,
    pub location: Option<SourceLocation>,
}

impl From<&ScalarBinding> for ScalarTypeRef {
    fn from(binding: &ScalarBinding) -> Self {
        Self {
            type_name: binding.type_name.clone(),
            source_file: binding.source_file.clone(),
            import_path: binding.import_path.clone(),
            location: binding.location.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScalarDefinition {
    pub scalar_name: String,
    pub input_type: Option<ScalarTypeRef>,
    pub output_types: Vec<ScalarTypeRef>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ScalarsResult {
    pub success: bool,
    pub scalars: Vec<ScalarDefinition>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn collect_scalars<'a>(bindings: impl IntoIterator<Item = &'a ScalarBinding>) -> ScalarsResult {
    let mut by_name: BTreeMap<&str, Vec<&ScalarBinding>> = BTreeMap::new();
    for binding in bindings {
        if BUILTIN_SCALARS.contains(&binding.scalar_name.as_str()) {
            continue;
        }
        let group = by_name.entry(binding.scalar_name.as_str()).or_default();
        let duplicate = group.iter().any(|seen| {
            seen.type_name == binding.type_name
                && seen.source_file == binding.source_file
                && seen.import_path == binding.import_path
                && seen.only == binding.only
        });
        if !duplicate {
            group.push(binding);
        }
    }

    let mut diagnostics = Vec::new();
    let mut scalars = Vec::new();
    for (name, group) in by_name {
        let first_location = group.iter().find_map(|b| b.location.clone());
        let inputs: Vec<&ScalarBinding> = group.iter().copied().filter(|b| b.input_capable()).collect();
        if inputs.len() > 1 {
            let listed = inputs.iter().map(|b| b.origin()).collect::<Vec<_>>().join(", ");
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::MultipleInputTypes,
                    format!("scalar \"{name}\" has multiple input types: {listed}"),
                )
                .at(inputs.iter().find_map(|b| b.location.clone())),
            );
        }
        if inputs.is_empty() {
            diagnostics.push(
                Diagnostic::error(DiagnosticCode::MissingInputType, format!("scalar \"{name}\" has no input type"))
                    .at(first_location.clone()),
            );
        }

        let mut output_types: Vec<ScalarTypeRef> = Vec::new();
        for binding in group.iter().filter(|b| b.output_capable()) {
            let output = ScalarTypeRef::from(*binding);
            if !output_types.contains(&output) {
                output_types.push(output);
            }
        }
        if output_types.is_empty() {
            diagnostics.push(
                Diagnostic::error(DiagnosticCode::MissingOutputType, format!("scalar \"{name}\" has no output type"))
                    .at(first_location),
            );
        }

        scalars.push(ScalarDefinition {
            scalar_name: name.to_string(),
            input_type: inputs.first().map(|b| ScalarTypeRef::from(*b)),
            output_types,
            description: merge_descriptions(&group),
        });
    }

    debug!(scalars = scalars.len(), errors = diagnostics.len(), "scalars collected");
    ScalarsResult { success: diagnostics.is_empty(), scalars, diagnostics }
}

/// Ordered by (file, line); config entries have neither and sort first.
fn merge_descriptions(group: &[&ScalarBinding]) -> Option<String> {
    let mut described: Vec<(Option<&PathBuf>, u32, &str)> = group
        .iter()
        .filter_map(|b| {
            let description = b.description.as_deref()?;
            let line = b.location.as_ref().map(|l| l.line).unwrap_or(0);
            Some((b.source_file.as_ref(), line, description))
        })
        .collect();
    described.sort();
    described.dedup_by(|a, b| a.2 == b.2);
    if described.is_empty() {
        return None;
    }
    Some(described.into_iter().map(|(_, _, d)| d).collect::<Vec<_>>().join("\n\n"))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(scalar: &str, type_name: &str, file: &str, line: u32, only: Option<ScalarOnly>) -> ScalarBinding {
        ScalarBinding {
            scalar_name: scalar.into(),
            type_name: type_name.into(),
            base: Some("string".into()),
            only,
            description: None,
            source_file: Some(PathBuf::from(file)),
            import_path: None,
            location: Some(SourceLocation::new(file, line, 1)),
        }
    }

    fn mapped(scalar: &str, type_name: &str, only: Option<ScalarOnly>) -> ScalarBinding {
        ScalarBinding {
            scalar_name: scalar.into(),
            type_name: type_name.into(),
            base: None,
            only,
            description: None,
            source_file: None,
            import_path: None,
            location: None,
        }
    }

    #[test]
    fn input_and_output_split_across_bindings() {
        let bindings = [
            mapped("DateTime", "DateTimeInput", Some(ScalarOnly::Input)),
            mapped("DateTime", "DateTimeOutput", Some(ScalarOnly::Output)),
        ];
        let result = collect_scalars(&bindings);
        assert!(result.success);
        assert_eq!(result.scalars.len(), 1);
        let scalar = &result.scalars[0];
        assert_eq!(scalar.input_type.as_ref().unwrap().type_name, "DateTimeInput");
        assert_eq!(scalar.output_types.len(), 1);
        assert_eq!(scalar.output_types[0].type_name, "DateTimeOutput");
    }

    #[test]
    fn untagged_binding_serves_both_directions() {
        let bindings = [
            declared("Url", "Url", "src/scalars.ts", 3, None),
            declared("Url", "UrlObject", "src/scalars.ts", 5, Some(ScalarOnly::Output)),
        ];
        let result = collect_scalars(&bindings);
        assert!(result.success);
        let names: Vec<_> = result.scalars[0].output_types.iter().map(|t| t.type_name.as_str()).collect();
        assert_eq!(names, ["Url", "UrlObject"]);
    }

    #[test]
    fn multiple_inputs_name_every_conflict() {
        let bindings = [
            declared("DateTime", "DateA", "src/a.ts", 2, None),
            declared("DateTime", "DateB", "src/b.ts", 7, Some(ScalarOnly::Input)),
        ];
        let result = collect_scalars(&bindings);
        assert!(!result.success);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.code, DiagnosticCode::MultipleInputTypes);
        assert!(diag.message.contains("DateA (src/a.ts:2:1)"));
        assert!(diag.message.contains("DateB (src/b.ts:7:1)"));
    }

    #[test]
    fn missing_directions_are_reported_per_scalar() {
        let bindings = [
            mapped("Only", "OnlyOut", Some(ScalarOnly::Output)),
            mapped("Other", "OtherIn", Some(ScalarOnly::Input)),
        ];
        let result = collect_scalars(&bindings);
        let codes: Vec<_> = result.diagnostics.iter().map(|d| (d.code, d.message.clone())).collect();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].0, DiagnosticCode::MissingInputType);
        assert!(codes[0].1.contains("Only"));
        assert_eq!(codes[1].0, DiagnosticCode::MissingOutputType);
        assert!(codes[1].1.contains("Other"));
    }

    #[test]
    fn builtins_are_never_collected_and_output_is_sorted() {
        let bindings = [
            mapped("Zed", "Zed", None),
            mapped("Int", "MyInt", None),
            mapped("Alpha", "Alpha", None),
        ];
        let result = collect_scalars(&bindings);
        let names: Vec<_> = result.scalars.iter().map(|s| s.scalar_name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Zed"]);
    }

    #[test]
    fn descriptions_merge_in_file_order_with_config_first() {
        let mut late = declared("DateTime", "DateTime", "src/z.ts", 1, Some(ScalarOnly::Output));
        late.description = Some("From z.".into());
        let mut early = declared("DateTime", "DateTimeIn", "src/a.ts", 9, Some(ScalarOnly::Input));
        early.description = Some("From a.".into());
        let mut config = mapped("DateTime", "Date", Some(ScalarOnly::Output));
        config.description = Some("From config.".into());
        let result = collect_scalars(&[late, early, config]);
        assert_eq!(
            result.scalars[0].description.as_deref(),
            Some("From config.\n\nFrom a.\n\nFrom z.")
        );
    }

    #[test]
    fn the_same_binding_seen_twice_counts_once() {
        let binding = declared("DateTime", "DateTime", "src/a.ts", 1, None);
        let result = collect_scalars(&[binding.clone(), binding]);
        assert!(result.success);
    }

    #[test]
    fn registry_finds_define_scalar_aliases() {
        let load = Program::builder()
            .scanned(
                "src/scalars.ts",
                "import type { DefineScalar } from \"@gqlkit-ts/runtime\";\n\
                 /** ISO-8601 timestamp. */\n\
                 export type DateTime = DefineScalar<\"DateTime\", Date>;\n\
                 export type DateTimeIn = DefineScalar<\"DateTime\", string, \"input\">;\n\
                 export type Broken = DefineScalar<Foo, string>;\n",
            )
            .build();
        let built = ScalarRegistry::build(&load.program, &[]);
        let names: Vec<_> = built.registry.bindings().map(|b| b.type_name.as_str()).collect();
        assert_eq!(names, ["DateTime", "DateTimeIn"]);
        assert_eq!(built.diagnostics.len(), 1);
        let date = built.registry.bindings().next().unwrap();
        assert_eq!(date.description.as_deref(), Some("ISO-8601 timestamp."));
        assert_eq!(date.base.as_deref(), Some("Date"));
    }

    #[test]
    fn config_mappings_respect_from() {
        let mapping = ScalarMapping {
            graphql_name: "DateTime".into(),
            type_name: "Temporal".into(),
            import_path: Some("temporal-polyfill".into()),
            only: None,
            description: None,
        };
        let built = ScalarRegistry::build(&Program::default(), &[mapping]);
        assert!(built.registry.mapped("Temporal", Some("temporal-polyfill")).is_some());
        assert!(built.registry.mapped("Temporal", None).is_none());
    }
}
