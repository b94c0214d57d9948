//! Lowering: TypeScript-level records → GraphQL kinds.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticCode, SourceLocation};
use crate::extract::resolvers::{ExtractResolversResult, ExtractedResolver, ResolverType};
use crate::extract::scalars::ScalarsResult;
use crate::extract::shape::{Literal, Primitive, ScalarOnly, TsTypeReference, TypeShape};
use crate::extract::types::ExtractTypesResult;
use crate::extract::{ExtractedTypeInfo, FieldDefinition, TypeKind};
use crate::ir::{
    is_builtin_scalar, ConvertedType, ExtensionField, GraphQLEnumValue, GraphQLField, GraphQLFieldType,
    GraphQLInputValue, GraphQLTypeKind,
};

static ENUM_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_A-Za-z][_A-Za-z0-9]*$").expect("enum value pattern is a valid regex"));

const INPUT_SUFFIX: &str = "Input";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Position {
    Output,
    Input,
}

#[derive(Debug, Default)]
pub struct TypesResult {
    pub types: Vec<ConvertedType>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolver-declared fields grouped by the type they extend.
#[derive(Debug, Default)]
pub struct ResolversResult {
    pub query_fields: Vec<ExtensionField>,
    pub mutation_fields: Vec<ExtensionField>,
    pub type_extensions: IndexMap<String, Vec<ExtensionField>>,
    /// Named types synthesized for inline argument and return objects.
    pub synthesized_types: Vec<ConvertedType>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn lower_types(extracted: &ExtractTypesResult, scalars: &ScalarsResult) -> TypesResult {
    let mut lowerer = Lowerer::default();
    let mut types: Vec<ConvertedType> = Vec::new();
    for info in &extracted.types {
        let name = info.name();
        if is_builtin_scalar(name) {
            lowerer.diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::ReservedTypeName,
                    format!("type name \"{name}\" is reserved for a built-in GraphQL scalar"),
                )
                .at(Some(info.metadata.location.clone())),
            );
            continue;
        }
        if types.iter().any(|t| t.name == name) {
            lowerer.diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::DuplicateTypeName,
                    format!("type \"{name}\" is declared more than once"),
                )
                .at(Some(info.metadata.location.clone())),
            );
            continue;
        }
        if let Some(converted) = lowerer.convert(info) {
            types.push(converted);
        }
    }
    for synthesized in std::mem::take(&mut lowerer.synthesized) {
        if types.iter().any(|t| t.name == synthesized.name) {
            lowerer.diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::DuplicateTypeName,
                    format!("inline object type \"{}\" collides with a declared type", synthesized.name),
                )
                .at(synthesized.location.clone()),
            );
            continue;
        }
        types.push(synthesized);
    }

    let mut diagnostics = extracted.diagnostics.clone();
    diagnostics.extend(scalars.diagnostics.iter().cloned());
    diagnostics.extend(lowerer.diagnostics);
    debug!(types = types.len(), "types lowered");
    TypesResult { types, diagnostics }
}

pub fn lower_resolvers(extracted: &ExtractResolversResult) -> ResolversResult {
    let mut lowerer = Lowerer::default();
    let mut result = ResolversResult::default();
    for resolver in &extracted.resolvers {
        let Some(field) = lowerer.resolver_field(resolver) else { continue };
        let field = ExtensionField {
            field,
            resolver_source_file: Some(resolver.source_file.clone()),
            resolver_export_name: Some(resolver.export_name.clone()),
        };
        match (resolver.resolver_type, &resolver.parent_type_name) {
            (ResolverType::Query, _) => result.query_fields.push(field),
            (ResolverType::Mutation, _) => result.mutation_fields.push(field),
            (ResolverType::Field, Some(parent)) => {
                result.type_extensions.entry(parent.clone()).or_default().push(field);
            }
            (ResolverType::Field, None) => {}
        }
    }
    result.synthesized_types = lowerer.synthesized;
    result.diagnostics = extracted.diagnostics.clone();
    result.diagnostics.extend(lowerer.diagnostics);
    result
}

// ------------------------------- Lowerer ---------------------------------- //

#[derive(Default)]
struct Lowerer {
    synthesized: Vec<ConvertedType>,
    diagnostics: Vec<Diagnostic>,
}

impl Lowerer {
    fn convert(&mut self, info: &ExtractedTypeInfo) -> Option<ConvertedType> {
        let meta = &info.metadata;
        let is_input_name = meta.name.ends_with(INPUT_SUFFIX);
        let mut out = ConvertedType::new(&meta.name, GraphQLTypeKind::Object);
        out.description = meta.description.clone();
        out.deprecated = meta.deprecated.clone();
        out.source_file = Some(meta.source_file.clone());
        out.location = Some(meta.location.clone());

        let invalid_input = |lowerer: &mut Lowerer| {
            lowerer.diagnostics.push(
                Diagnostic::error(
                    DiagnosticCode::InvalidInputType,
                    format!(
                        "type \"{}\" ends with \"Input\" but is a {}; only object types can be input types",
                        meta.name,
                        meta.kind.as_str()
                    ),
                )
                .at(Some(meta.location.clone())),
            );
        };

        match meta.kind {
            TypeKind::Interface | TypeKind::Object if is_input_name => {
                out.kind = GraphQLTypeKind::InputObject;
                out.fields = self.fields(&meta.name, &info.fields, Position::Input);
            }
            TypeKind::Interface | TypeKind::Object => {
                out.fields = self.fields(&meta.name, &info.fields, Position::Output);
                out.implemented_interfaces = info.implemented_interfaces.clone();
            }
            TypeKind::GraphqlInterface if is_input_name => {
                invalid_input(self);
                return None;
            }
            TypeKind::GraphqlInterface => {
                out.kind = GraphQLTypeKind::Interface;
                out.fields = self.fields(&meta.name, &info.fields, Position::Output);
                out.implemented_interfaces = info.implemented_interfaces.clone();
            }
            TypeKind::Enum if is_input_name => {
                invalid_input(self);
                return None;
            }
            TypeKind::Enum => {
                out.kind = GraphQLTypeKind::Enum;
                for member in &info.enum_members {
                    let name = to_screaming_snake_case(&member.name);
                    if !ENUM_VALUE.is_match(&name) {
                        self.diagnostics.push(
                            Diagnostic::error(
                                DiagnosticCode::InvalidEnumMember,
                                format!(
                                    "enum \"{}\" member \"{}\" becomes \"{name}\", which is not a valid GraphQL enum value",
                                    meta.name, member.name
                                ),
                            )
                            .at(Some(meta.location.clone())),
                        );
                        continue;
                    }
                    out.enum_values.push(GraphQLEnumValue {
                        name,
                        original_value: member.value.clone(),
                        description: member.description.clone(),
                        deprecated: member.deprecated.clone(),
                    });
                }
            }
            TypeKind::Union if !info.inline_object_members.is_empty() => {
                if !is_input_name {
                    self.diagnostics.push(
                        Diagnostic::error(
                            DiagnosticCode::UnsupportedSyntax,
                            format!(
                                "union \"{}\" of object literals is only supported as a oneOf input (name it `{}Input`)",
                                meta.name, meta.name
                            ),
                        )
                        .at(Some(meta.location.clone())),
                    );
                    return None;
                }
                out.kind = GraphQLTypeKind::InputObject;
                out.one_of = true;
                for member in &info.inline_object_members {
                    let [prop] = member.as_slice() else {
                        self.diagnostics.push(
                            Diagnostic::error(
                                DiagnosticCode::InvalidOneOfMember,
                                format!(
                                    "oneOf input \"{}\" members must have exactly one property, found {}",
                                    meta.name,
                                    member.len()
                                ),
                            )
                            .at(member.first().and_then(|f| f.location.clone()).or(Some(meta.location.clone()))),
                        );
                        continue;
                    };
                    let mut field = self.field(&meta.name, prop, Position::Input);
                    field.field_type.nullable = true;
                    out.fields.push(field);
                }
            }
            TypeKind::Union if is_input_name => {
                invalid_input(self);
                return None;
            }
            TypeKind::Union => {
                out.kind = GraphQLTypeKind::Union;
                out.union_members = info.union_members.clone();
            }
        }
        Some(out)
    }

    fn fields(&mut self, owner: &str, fields: &[FieldDefinition], position: Position) -> Vec<GraphQLField> {
        fields.iter().map(|field| self.field(owner, field, position)).collect()
    }

    fn field(&mut self, owner: &str, field: &FieldDefinition, position: Position) -> GraphQLField {
        let hint = format!("{}{}", strip_input_suffix(owner), to_pascal_case(&field.name));
        let field_type = self.field_type(&field.ts_type, field.optional, position, &hint, field.location.as_ref());
        GraphQLField {
            name: field.name.clone(),
            field_type,
            args: Vec::new(),
            description: field.description.clone(),
            deprecated: field.deprecated.clone(),
            location: field.location.clone(),
        }
    }

    /// `hint` names any inline object found here; input objects get an `Input` suffix.
    fn field_type(
        &mut self,
        ts: &TsTypeReference,
        optional: bool,
        position: Position,
        hint: &str,
        location: Option<&SourceLocation>,
    ) -> GraphQLFieldType {
        let nullable = ts.nullable || optional;
        match &ts.shape {
            TypeShape::Array(element) => {
                if matches!(element.shape, TypeShape::Array(_)) {
                    self.diagnostics.push(
                        Diagnostic::error(DiagnosticCode::UnsupportedSyntax, "nested lists are not supported")
                            .at(location.cloned()),
                    );
                }
                let item = self.named(element, position, hint, location);
                GraphQLFieldType::list_of(item, nullable, element.nullable)
            }
            _ => GraphQLFieldType::named(self.named(ts, position, hint, location), nullable),
        }
    }

    fn named(
        &mut self,
        ts: &TsTypeReference,
        position: Position,
        hint: &str,
        location: Option<&SourceLocation>,
    ) -> String {
        match &ts.shape {
            TypeShape::Primitive(Primitive::String) | TypeShape::Literal(Literal::String(_)) => "String".into(),
            TypeShape::Primitive(Primitive::Number) | TypeShape::Literal(Literal::Number(_)) => "Float".into(),
            TypeShape::Primitive(Primitive::Boolean) | TypeShape::Literal(Literal::Boolean(_)) => "Boolean".into(),
            TypeShape::Reference(name) => name.clone(),
            TypeShape::Scalar(info) => {
                let misuse = match (position, info.only) {
                    (Position::Input, Some(ScalarOnly::Output)) => Some((DiagnosticCode::OutputOnlyScalarInInput, "output")),
                    (Position::Output, Some(ScalarOnly::Input)) => Some((DiagnosticCode::InputOnlyScalarInOutput, "input")),
                    _ => None,
                };
                if let Some((code, only)) = misuse {
                    self.diagnostics.push(
                        Diagnostic::error(
                            code,
                            format!(
                                "`{}` is an {only}-only binding of scalar \"{}\" and cannot be used here",
                                info.type_name, info.scalar_name
                            ),
                        )
                        .at(location.cloned()),
                    );
                }
                info.scalar_name.clone()
            }
            TypeShape::Array(element) => self.named(element, position, hint, location),
            TypeShape::Union(members) => {
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::UnsupportedSyntax,
                        "inline unions must be declared as a named type alias",
                    )
                    .at(location.cloned()),
                );
                members
                    .first()
                    .map(|m| self.named(m, position, hint, location))
                    .unwrap_or_else(|| "String".into())
            }
            TypeShape::InlineObject(props) => self.synthesize(props, position, hint, location),
        }
    }

    fn synthesize(
        &mut self,
        props: &[FieldDefinition],
        position: Position,
        hint: &str,
        location: Option<&SourceLocation>,
    ) -> String {
        let (name, kind) = match position {
            Position::Output => (hint.to_string(), GraphQLTypeKind::Object),
            Position::Input => (format!("{hint}{INPUT_SUFFIX}"), GraphQLTypeKind::InputObject),
        };
        let mut converted = ConvertedType::new(&name, kind);
        converted.fields = self.fields(&name, props, position);
        converted.source_file = location.map(|l| l.file.clone());
        converted.location = location.cloned();

        match self.synthesized.iter().find(|t| t.name == name) {
            Some(existing) if existing.fields != converted.fields => {
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::DuplicateTypeName,
                        format!("two different inline objects would both be named \"{name}\""),
                    )
                    .at(location.cloned()),
                );
            }
            Some(_) => {}
            None => self.synthesized.push(converted),
        }
        name
    }

    fn resolver_field(&mut self, resolver: &ExtractedResolver) -> Option<GraphQLField> {
        let field_pascal = to_pascal_case(&resolver.field_name);
        let (arg_prefix, return_hint) = match (resolver.resolver_type, &resolver.parent_type_name) {
            (ResolverType::Query, _) => (field_pascal.clone(), format!("Query{field_pascal}Payload")),
            (ResolverType::Mutation, _) => (field_pascal.clone(), format!("Mutation{field_pascal}Payload")),
            (ResolverType::Field, Some(parent)) => (format!("{parent}{field_pascal}"), format!("{parent}{field_pascal}")),
            (ResolverType::Field, None) => return None,
        };
        let location = Some(&resolver.location);

        let args = resolver
            .args
            .iter()
            .flatten()
            .map(|arg| {
                let hint = format!("{arg_prefix}{}", to_pascal_case(&arg.name));
                GraphQLInputValue {
                    name: arg.name.clone(),
                    field_type: self.field_type(&arg.ts_type, arg.optional, Position::Input, &hint, arg.location.as_ref().or(location)),
                    description: arg.description.clone(),
                    deprecated: arg.deprecated.clone(),
                    location: arg.location.clone().or_else(|| location.cloned()),
                }
            })
            .collect();
        let field_type = self.field_type(&resolver.return_type, false, Position::Output, &return_hint, location);

        Some(GraphQLField {
            name: resolver.field_name.clone(),
            field_type,
            args,
            description: resolver.description.clone(),
            deprecated: resolver.deprecated.clone(),
            location: Some(resolver.location.clone()),
        })
    }
}

fn strip_input_suffix(name: &str) -> &str {
    name.strip_suffix(INPUT_SUFFIX).unwrap_or(name)
}

// ------------------------------ Name casing ------------------------------- //

/// `inProgress` → `IN_PROGRESS`, `XMLParser` → `XML_PARSER`, `in-progress` → `IN_PROGRESS`.
/// Input that already is SCREAMING_SNAKE_CASE comes back unchanged. Leading
/// underscores are kept: `_private` → `_PRIVATE`.
pub fn to_screaming_snake_case(input: &str) -> String {
    if !input.is_empty() && input.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_') {
        return input.to_string();
    }
    let body = input.trim_start_matches('_');
    let prefix = &input[..input.len() - body.len()];
    let chars: Vec<char> = body.chars().collect();
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '-' | ' ' | '_') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    let words: Vec<String> = words.iter().map(|w| w.to_uppercase()).collect();
    format!("{prefix}{}", words.join("_"))
}

/// `user_name` / `user-name` / `userName` → `UserName`.
pub fn to_pascal_case(input: &str) -> String {
    input
        .split(['_', '-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::shape::ScalarInfo;
    use crate::extract::{EnumMemberInfo, ExportKind, TypeMetadata};
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn info(name: &str, kind: TypeKind) -> ExtractedTypeInfo {
        ExtractedTypeInfo::new(TypeMetadata {
            name: name.into(),
            kind,
            source_file: PathBuf::from("src/types.ts"),
            location: SourceLocation::new("src/types.ts", 1, 1),
            export_kind: ExportKind::Named,
            description: None,
            deprecated: None,
        })
    }

    fn prop(name: &str, ts_type: TsTypeReference) -> FieldDefinition {
        FieldDefinition {
            name: name.into(),
            ts_type,
            optional: false,
            description: None,
            deprecated: None,
            location: Some(SourceLocation::new("src/types.ts", 2, 3)),
        }
    }

    fn lower(types: Vec<ExtractedTypeInfo>) -> TypesResult {
        let extracted = ExtractTypesResult { types, diagnostics: Vec::new() };
        lower_types(&extracted, &ScalarsResult::default())
    }

    #[test]
    fn screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("inProgress"), "IN_PROGRESS");
        assert_eq!(to_screaming_snake_case("InProgress"), "IN_PROGRESS");
        assert_eq!(to_screaming_snake_case("in-progress"), "IN_PROGRESS");
        assert_eq!(to_screaming_snake_case("in progress"), "IN_PROGRESS");
        assert_eq!(to_screaming_snake_case("XMLParser"), "XML_PARSER");
        assert_eq!(to_screaming_snake_case("ALREADY_DONE"), "ALREADY_DONE");
        assert_eq!(to_screaming_snake_case("v2Beta"), "V2_BETA");
        assert_eq!(to_screaming_snake_case("active"), "ACTIVE");
        assert_eq!(to_screaming_snake_case("_private"), "_PRIVATE");
        assert_eq!(to_screaming_snake_case("__internalState"), "__INTERNAL_STATE");
    }

    #[test]
    fn pascal_case() {
        assert_eq!(to_pascal_case("address"), "Address");
        assert_eq!(to_pascal_case("billing_address"), "BillingAddress");
        assert_eq!(to_pascal_case("shippingAddress"), "ShippingAddress");
    }

    proptest! {
        #[test]
        fn screaming_snake_is_idempotent(input in "_{0,2}[A-Za-z][A-Za-z0-9 _-]{0,16}") {
            let once = to_screaming_snake_case(&input);
            prop_assert_eq!(to_screaming_snake_case(&once), once.clone());
        }
    }

    #[test]
    fn primitives_map_and_number_is_float() {
        let mut user = info("User", TypeKind::Interface);
        user.fields = vec![
            prop("name", TsTypeReference::primitive(Primitive::String)),
            prop("score", TsTypeReference::primitive(Primitive::Number).or_nullable(true)),
            prop("tags", TsTypeReference::array_of(TsTypeReference::primitive(Primitive::String).or_nullable(true))),
        ];
        let result = lower(vec![user]);
        let fields = &result.types[0].fields;
        assert_eq!(fields[0].field_type, GraphQLFieldType::named("String", false));
        assert_eq!(fields[1].field_type, GraphQLFieldType::named("Float", true));
        assert_eq!(fields[2].field_type, GraphQLFieldType::list_of("String", false, true));
    }

    #[test]
    fn input_suffix_reclassifies_objects_only() {
        let result = lower(vec![
            info("CreateUserInput", TypeKind::Object),
            info("StatusInput", TypeKind::Enum),
        ]);
        assert_eq!(result.types.len(), 1);
        assert_eq!(result.types[0].kind, GraphQLTypeKind::InputObject);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.code, DiagnosticCode::InvalidInputType);
        assert!(diag.message.contains("StatusInput") && diag.message.contains("enum"));
    }

    #[test]
    fn reserved_names_are_rejected_for_every_kind() {
        let result = lower(vec![info("String", TypeKind::Object), info("ID", TypeKind::Enum)]);
        assert!(result.types.is_empty());
        assert!(result.diagnostics.iter().all(|d| d.code == DiagnosticCode::ReservedTypeName));
        assert!(result.diagnostics[0].message.contains("\"String\""));
    }

    #[test]
    fn enum_values_convert_and_keep_original_values() {
        let mut status = info("Status", TypeKind::Enum);
        status.enum_members = ["inProgress", "done", "1st"]
            .iter()
            .map(|v| EnumMemberInfo { name: v.to_string(), value: v.to_string(), description: None, deprecated: None })
            .collect();
        let result = lower(vec![status]);
        let values: Vec<_> = result.types[0].enum_values.iter().map(|v| (v.name.as_str(), v.original_value.as_str())).collect();
        assert_eq!(values, [("IN_PROGRESS", "inProgress"), ("DONE", "done")]);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::InvalidEnumMember);
    }

    #[test]
    fn inline_objects_are_synthesized_with_owner_names() {
        let address = TsTypeReference::new(TypeShape::InlineObject(vec![prop(
            "city",
            TsTypeReference::primitive(Primitive::String),
        )]));
        let mut user = info("User", TypeKind::Object);
        user.fields = vec![prop("address", address.clone())];
        let mut input = info("CreateUserInput", TypeKind::Object);
        input.fields = vec![prop("address", address)];
        let result = lower(vec![user, input]);
        let names: Vec<_> = result.types.iter().map(|t| (t.name.as_str(), t.kind)).collect();
        assert_eq!(
            names,
            [
                ("User", GraphQLTypeKind::Object),
                ("CreateUserInput", GraphQLTypeKind::InputObject),
                ("UserAddress", GraphQLTypeKind::Object),
                ("CreateUserAddressInput", GraphQLTypeKind::InputObject),
            ]
        );
        assert_eq!(result.types[0].fields[0].field_type.type_name, "UserAddress");
    }

    #[test]
    fn one_of_inputs_need_single_property_members() {
        let mut contact = info("ContactInput", TypeKind::Union);
        contact.inline_object_members = vec![
            vec![prop("email", TsTypeReference::primitive(Primitive::String))],
            vec![prop("phone", TsTypeReference::primitive(Primitive::String))],
            vec![
                prop("a", TsTypeReference::primitive(Primitive::String)),
                prop("b", TsTypeReference::primitive(Primitive::String)),
            ],
        ];
        let result = lower(vec![contact]);
        let converted = &result.types[0];
        assert!(converted.one_of);
        assert_eq!(converted.kind, GraphQLTypeKind::InputObject);
        assert_eq!(converted.fields.len(), 2);
        assert!(converted.fields.iter().all(|f| f.field_type.nullable));
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::InvalidOneOfMember);
    }

    #[test]
    fn restricted_scalars_in_the_wrong_position() {
        let scalar = |only| {
            TsTypeReference::new(TypeShape::Scalar(ScalarInfo {
                scalar_name: "DateTime".into(),
                type_name: "DateTimeOut".into(),
                base: None,
                custom: true,
                only: Some(only),
            }))
        };
        let mut input = info("EventInput", TypeKind::Object);
        input.fields = vec![prop("at", scalar(ScalarOnly::Output))];
        let mut output = info("Event", TypeKind::Object);
        output.fields = vec![prop("at", scalar(ScalarOnly::Input))];
        let result = lower(vec![input, output]);
        let codes: Vec<_> = result.diagnostics.iter().map(|d| d.code).collect();
        assert_eq!(codes, [DiagnosticCode::OutputOnlyScalarInInput, DiagnosticCode::InputOnlyScalarInOutput]);
        assert_eq!(result.types[0].fields[0].field_type.type_name, "DateTime");
    }

    #[test]
    fn upstream_diagnostics_are_carried() {
        let extracted = ExtractTypesResult {
            types: Vec::new(),
            diagnostics: vec![Diagnostic::warning(DiagnosticCode::UnsupportedSyntax, "generic")],
        };
        let scalars = ScalarsResult {
            success: false,
            scalars: Vec::new(),
            diagnostics: vec![Diagnostic::error(DiagnosticCode::MissingInputType, "x")],
        };
        let result = lower_types(&extracted, &scalars);
        assert_eq!(result.diagnostics.len(), 2);
    }

    #[test]
    fn resolvers_group_by_target() {
        let resolver = |name: &str, kind, parent: Option<&str>, ret: TsTypeReference| ExtractedResolver {
            field_name: name.into(),
            resolver_type: kind,
            parent_type_name: parent.map(String::from),
            args: None,
            return_type: ret,
            exported_input_types: Vec::new(),
            description: None,
            deprecated: None,
            source_file: PathBuf::from("src/resolvers.ts"),
            export_name: name.into(),
            location: SourceLocation::new("src/resolvers.ts", 1, 1),
        };
        let payload = TsTypeReference::new(TypeShape::InlineObject(vec![prop(
            "ok",
            TsTypeReference::primitive(Primitive::Boolean),
        )]));
        let extracted = ExtractResolversResult {
            resolvers: vec![
                resolver("users", ResolverType::Query, None, TsTypeReference::array_of(TsTypeReference::reference("User"))),
                resolver("createUser", ResolverType::Mutation, None, payload),
                resolver("fullName", ResolverType::Field, Some("User"), TsTypeReference::primitive(Primitive::String)),
            ],
            diagnostics: Vec::new(),
        };
        let result = lower_resolvers(&extracted);
        assert_eq!(result.query_fields[0].field.field_type, GraphQLFieldType::list_of("User", false, false));
        assert_eq!(result.mutation_fields[0].field.field_type.type_name, "MutationCreateUserPayload");
        assert_eq!(result.synthesized_types[0].name, "MutationCreateUserPayload");
        assert_eq!(result.type_extensions["User"][0].resolver_export_name.as_deref(), Some("fullName"));
    }
}
