//! Merges lowered declarations with resolver-declared fields into one schema graph.
use tracing::debug;

use crate::diagnostics::{has_errors, Diagnostic, DiagnosticCode};
use crate::extract::scalars::ScalarsResult;
use crate::ir::{
    is_builtin_scalar, ConvertedType, ExtensionField, GraphQLTypeKind, InputType, IntegratedResult, TypeExtension,
};
use crate::lower::{ResolversResult, TypesResult};

pub const QUERY: &str = "Query";
pub const MUTATION: &str = "Mutation";

pub fn integrate(types: &TypesResult, resolvers: &ResolversResult, scalars: Option<&ScalarsResult>) -> IntegratedResult {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut result = IntegratedResult::default();

    let mut seen: Vec<&ConvertedType> = Vec::new();
    for converted in types.types.iter().chain(&resolvers.synthesized_types) {
        if let Some(existing) = seen.iter().find(|t| t.name == converted.name) {
            if *existing != converted {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::DuplicateTypeName,
                        format!("type \"{}\" is produced by more than one declaration", converted.name),
                    )
                    .at(converted.location.clone()),
                );
            }
            continue;
        }
        seen.push(converted);
        match converted.kind {
            GraphQLTypeKind::InputObject => result.input_types.push(to_input_type(converted)),
            _ => result.base_types.push(converted.clone()),
        }
    }

    if let Some(scalars) = scalars {
        result.custom_scalars = scalars.scalars.clone();
        result.custom_scalar_names = scalars.scalars.iter().map(|s| s.scalar_name.clone()).collect();
    }

    if !resolvers.query_fields.is_empty() {
        result.has_query = true;
        synthesize_root(&mut result, QUERY);
    }
    if !resolvers.mutation_fields.is_empty() {
        result.has_mutation = true;
        synthesize_root(&mut result, MUTATION);
    }

    let targets = [(QUERY, &resolvers.query_fields), (MUTATION, &resolvers.mutation_fields)]
        .into_iter()
        .filter(|(_, fields)| !fields.is_empty())
        .chain(resolvers.type_extensions.iter().map(|(name, fields)| (name.as_str(), fields)));
    for (target, fields) in targets {
        let extension = build_extension(&result, target, fields, &mut diagnostics);
        check_target(&result, &extension, &mut diagnostics);
        result.type_extensions.push(extension);
    }

    result.diagnostics = types.diagnostics.clone();
    result.diagnostics.extend(resolvers.diagnostics.iter().cloned());
    result.diagnostics.extend(diagnostics);
    result.has_errors = has_errors(&result.diagnostics);
    debug!(
        base_types = result.base_types.len(),
        input_types = result.input_types.len(),
        extensions = result.type_extensions.len(),
        "integrated"
    );
    result
}

fn to_input_type(converted: &ConvertedType) -> InputType {
    InputType {
        name: converted.name.clone(),
        fields: converted.fields.iter().map(|f| f.as_input_value()).collect(),
        one_of: converted.one_of,
        description: converted.description.clone(),
        deprecated: converted.deprecated.clone(),
        source_file: converted.source_file.clone(),
        location: converted.location.clone(),
    }
}

fn synthesize_root(result: &mut IntegratedResult, name: &str) {
    if result.base_type(name).is_none() {
        result.base_types.push(ConvertedType::new(name, GraphQLTypeKind::Object));
    }
}

/// Keeps fields in resolver order; drops repeats of a field already defined on the target.
fn build_extension(
    result: &IntegratedResult,
    target: &str,
    fields: &[ExtensionField],
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeExtension {
    let declared = result.base_type(target).map(|t| t.fields.as_slice()).unwrap_or_default();
    let mut extension = TypeExtension { target_type_name: target.to_string(), fields: Vec::new() };
    for field in fields {
        let name = &field.field.name;
        let clash = if declared.iter().any(|f| &f.name == name) {
            Some(format!("field \"{target}.{name}\" is declared on the type and also defined by a resolver"))
        } else if extension.fields.iter().any(|f| &f.field.name == name) {
            Some(format!("field \"{target}.{name}\" is defined by more than one resolver"))
        } else {
            None
        };
        match clash {
            Some(message) => diagnostics.push(
                Diagnostic::error(DiagnosticCode::DuplicateFieldDefinition, message).at(field.field.location.clone()),
            ),
            None => extension.fields.push(field.clone()),
        }
    }
    extension
}

fn check_target(result: &IntegratedResult, extension: &TypeExtension, diagnostics: &mut Vec<Diagnostic>) {
    let target = &extension.target_type_name;
    let origin = extension.fields.first();
    let location = origin.and_then(|f| f.field.location.clone());
    let source = origin
        .and_then(|f| f.resolver_source_file.as_ref())
        .map(|p| format!(" (resolver in {})", p.display()))
        .unwrap_or_default();

    let wrong_kind = match result.base_type(target) {
        Some(base) if base.kind == GraphQLTypeKind::Object => return,
        Some(base) => Some(base.kind.as_str()),
        None if result.input_type(target).is_some() => Some(GraphQLTypeKind::InputObject.as_str()),
        None if is_builtin_scalar(target) || result.custom_scalar_names.iter().any(|s| s == target) => {
            Some(GraphQLTypeKind::Scalar.as_str())
        }
        None => None,
    };
    let diagnostic = match wrong_kind {
        Some(kind) => Diagnostic::error(
            DiagnosticCode::InvalidExtensionTarget,
            format!("field resolvers can only extend object types, but \"{target}\" is {kind}{source}"),
        ),
        None => Diagnostic::error(
            DiagnosticCode::UnknownTargetType,
            format!("resolver fields target unknown type \"{target}\"{source}"),
        ),
    };
    diagnostics.push(diagnostic.at(location));
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Severity, SourceLocation};
    use crate::extract::scalars::ScalarDefinition;
    use crate::ir::{GraphQLField, GraphQLFieldType};
    use std::path::PathBuf;

    fn field(name: &str, type_name: &str) -> GraphQLField {
        GraphQLField {
            name: name.into(),
            field_type: GraphQLFieldType::named(type_name, false),
            args: Vec::new(),
            description: None,
            deprecated: None,
            location: Some(SourceLocation::new("src/resolvers.ts", 3, 14)),
        }
    }

    fn ext(name: &str, type_name: &str) -> ExtensionField {
        ExtensionField {
            field: field(name, type_name),
            resolver_source_file: Some(PathBuf::from("src/resolvers.ts")),
            resolver_export_name: Some(name.into()),
        }
    }

    fn object(name: &str, fields: Vec<GraphQLField>) -> ConvertedType {
        let mut t = ConvertedType::new(name, GraphQLTypeKind::Object);
        t.fields = fields;
        t
    }

    #[test]
    fn query_is_synthesized_for_query_fields() {
        let types = TypesResult { types: vec![object("User", vec![field("id", "ID")])], diagnostics: Vec::new() };
        let resolvers = ResolversResult { query_fields: vec![ext("users", "User")], ..Default::default() };
        let result = integrate(&types, &resolvers, None);
        assert!(result.has_query);
        assert!(!result.has_mutation);
        assert!(!result.has_errors);
        assert!(result.base_type("Query").is_some_and(|q| q.fields.is_empty()));
        assert_eq!(result.type_extensions[0].target_type_name, "Query");
        assert_eq!(result.type_extensions[0].fields[0].resolver_export_name.as_deref(), Some("users"));
    }

    #[test]
    fn input_objects_are_split_out() {
        let mut input = ConvertedType::new("CreateUserInput", GraphQLTypeKind::InputObject);
        input.fields = vec![field("name", "String")];
        let types = TypesResult { types: vec![input], diagnostics: Vec::new() };
        let result = integrate(&types, &ResolversResult::default(), None);
        assert!(result.base_types.is_empty());
        assert_eq!(result.input_types[0].fields[0].name, "name");
    }

    #[test]
    fn unknown_target_still_emits_extension() {
        let mut resolvers = ResolversResult::default();
        resolvers.type_extensions.insert("NonExistentType".into(), vec![ext("x", "String")]);
        let result = integrate(&TypesResult::default(), &resolvers, None);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.code, DiagnosticCode::UnknownTargetType);
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.message.contains("NonExistentType") && diag.message.contains("src/resolvers.ts"));
        assert!(result.has_errors);
        assert_eq!(result.type_extensions[0].target_type_name, "NonExistentType");
    }

    #[test]
    fn extending_non_objects_is_rejected() {
        let types = TypesResult {
            types: vec![ConvertedType::new("Status", GraphQLTypeKind::Enum)],
            diagnostics: Vec::new(),
        };
        let mut resolvers = ResolversResult::default();
        resolvers.type_extensions.insert("Status".into(), vec![ext("label", "String")]);
        resolvers.type_extensions.insert("DateTime".into(), vec![ext("iso", "String")]);
        let scalars = ScalarsResult {
            success: true,
            scalars: vec![ScalarDefinition {
                scalar_name: "DateTime".into(),
                input_type: None,
                output_types: Vec::new(),
                description: None,
            }],
            diagnostics: Vec::new(),
        };
        let result = integrate(&types, &resolvers, Some(&scalars));
        let codes: Vec<_> = result.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, [DiagnosticCode::InvalidExtensionTarget, DiagnosticCode::InvalidExtensionTarget]);
        assert_eq!(result.custom_scalar_names, ["DateTime"]);
    }

    #[test]
    fn duplicate_resolver_fields() {
        let types = TypesResult { types: vec![object("User", vec![field("name", "String")])], diagnostics: Vec::new() };
        let mut resolvers = ResolversResult::default();
        resolvers
            .type_extensions
            .insert("User".into(), vec![ext("name", "String"), ext("age", "Int"), ext("age", "Int")]);
        let result = integrate(&types, &resolvers, None);
        assert_eq!(result.diagnostics.len(), 2);
        assert!(result.diagnostics.iter().all(|d| d.code == DiagnosticCode::DuplicateFieldDefinition));
        let names: Vec<_> = result.type_extensions[0].fields.iter().map(|f| f.field.name.as_str()).collect();
        assert_eq!(names, ["age"]);
    }

    #[test]
    fn warnings_do_not_set_has_errors() {
        let types = TypesResult {
            types: Vec::new(),
            diagnostics: vec![Diagnostic::warning(DiagnosticCode::UnsupportedSyntax, "generic parameters")],
        };
        let result = integrate(&types, &ResolversResult::default(), None);
        assert!(!result.has_errors);
        assert_eq!(result.diagnostics.len(), 1);
    }
}
