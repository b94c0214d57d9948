//! Source strings for the generated TypeScript modules.
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use graphql_parser::query::Value as GqlValue;
use graphql_parser::schema::{
    Definition, Directive, EnumValue, Field, InputValue, Type, TypeDefinition, TypeExtension,
};
use serde_json::{json, Value};

use crate::extract::scalars::{ScalarDefinition, ScalarTypeRef};
use crate::ir::{GraphQLTypeKind, IntegratedResult};
use crate::sdl::SchemaDocument;

pub const HEADER: &str = "// Code generated by gqlkit. DO NOT EDIT.\n";

// ----------------------------- typeDefs.ts -------------------------------- //

/// A module exporting `typeDefs` as a graphql-js `DocumentNode` literal.
pub fn type_defs_code(document: &SchemaDocument) -> String {
    format!(
        "{HEADER}import type {{ DocumentNode }} from \"graphql\";\n\nexport const typeDefs: DocumentNode = {:#};\n",
        document_node(document)
    )
}

pub fn document_node(document: &SchemaDocument) -> Value {
    let definitions: Vec<Value> = document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::TypeDefinition(def) => Some(type_definition_node(def)),
            Definition::TypeExtension(TypeExtension::Object(ext)) => Some(json!({
                "kind": "ObjectTypeExtension",
                "name": name_node(&ext.name),
                "interfaces": ext.implements_interfaces.iter().map(|i| named_type_node(i)).collect::<Vec<_>>(),
                "directives": directives_node(&ext.directives),
                "fields": ext.fields.iter().map(field_node).collect::<Vec<_>>(),
            })),
            _ => None,
        })
        .collect();
    json!({ "kind": "Document", "definitions": definitions })
}

fn name_node(value: &str) -> Value {
    json!({ "kind": "Name", "value": value })
}

fn named_type_node(value: &str) -> Value {
    json!({ "kind": "NamedType", "name": name_node(value) })
}

fn string_value_node(value: &str) -> Value {
    json!({ "kind": "StringValue", "value": value, "block": false })
}

fn type_node(ty: &Type<'static, String>) -> Value {
    match ty {
        Type::NamedType(name) => named_type_node(name),
        Type::ListType(inner) => json!({ "kind": "ListType", "type": type_node(inner) }),
        Type::NonNullType(inner) => json!({ "kind": "NonNullType", "type": type_node(inner) }),
    }
}

fn directives_node(directives: &[Directive<'static, String>]) -> Value {
    directives
        .iter()
        .map(|directive| {
            let arguments: Vec<Value> = directive
                .arguments
                .iter()
                .map(|(name, value)| {
                    let value = match value {
                        GqlValue::String(s) => string_value_node(s),
                        _ => Value::Null,
                    };
                    json!({ "kind": "Argument", "name": name_node(name), "value": value })
                })
                .collect();
            json!({ "kind": "Directive", "name": name_node(&directive.name), "arguments": arguments })
        })
        .collect()
}

/// Inserts `description` only when present, right after `kind`.
fn with_description(kind: &str, description: &Option<String>, rest: Value) -> Value {
    let mut node = serde_json::Map::new();
    node.insert("kind".into(), json!(kind));
    if let Some(description) = description {
        node.insert("description".into(), string_value_node(description));
    }
    if let Value::Object(rest) = rest {
        node.extend(rest);
    }
    Value::Object(node)
}

fn input_value_node(value: &InputValue<'static, String>) -> Value {
    with_description(
        "InputValueDefinition",
        &value.description,
        json!({
            "name": name_node(&value.name),
            "type": type_node(&value.value_type),
            "directives": directives_node(&value.directives),
        }),
    )
}

fn field_node(field: &Field<'static, String>) -> Value {
    with_description(
        "FieldDefinition",
        &field.description,
        json!({
            "name": name_node(&field.name),
            "arguments": field.arguments.iter().map(input_value_node).collect::<Vec<_>>(),
            "type": type_node(&field.field_type),
            "directives": directives_node(&field.directives),
        }),
    )
}

fn enum_value_node(value: &EnumValue<'static, String>) -> Value {
    with_description(
        "EnumValueDefinition",
        &value.description,
        json!({ "name": name_node(&value.name), "directives": directives_node(&value.directives) }),
    )
}

fn type_definition_node(definition: &TypeDefinition<'static, String>) -> Value {
    match definition {
        TypeDefinition::Scalar(t) => with_description(
            "ScalarTypeDefinition",
            &t.description,
            json!({ "name": name_node(&t.name), "directives": directives_node(&t.directives) }),
        ),
        TypeDefinition::Object(t) => with_description(
            "ObjectTypeDefinition",
            &t.description,
            json!({
                "name": name_node(&t.name),
                "interfaces": t.implements_interfaces.iter().map(|i| named_type_node(i)).collect::<Vec<_>>(),
                "directives": directives_node(&t.directives),
                "fields": t.fields.iter().map(field_node).collect::<Vec<_>>(),
            }),
        ),
        TypeDefinition::Interface(t) => with_description(
            "InterfaceTypeDefinition",
            &t.description,
            json!({
                "name": name_node(&t.name),
                "interfaces": t.implements_interfaces.iter().map(|i| named_type_node(i)).collect::<Vec<_>>(),
                "directives": directives_node(&t.directives),
                "fields": t.fields.iter().map(field_node).collect::<Vec<_>>(),
            }),
        ),
        TypeDefinition::Union(t) => with_description(
            "UnionTypeDefinition",
            &t.description,
            json!({
                "name": name_node(&t.name),
                "directives": directives_node(&t.directives),
                "types": t.types.iter().map(|m| named_type_node(m)).collect::<Vec<_>>(),
            }),
        ),
        TypeDefinition::Enum(t) => with_description(
            "EnumTypeDefinition",
            &t.description,
            json!({
                "name": name_node(&t.name),
                "directives": directives_node(&t.directives),
                "values": t.values.iter().map(enum_value_node).collect::<Vec<_>>(),
            }),
        ),
        TypeDefinition::InputObject(t) => with_description(
            "InputObjectTypeDefinition",
            &t.description,
            json!({
                "name": name_node(&t.name),
                "directives": directives_node(&t.directives),
                "fields": t.fields.iter().map(input_value_node).collect::<Vec<_>>(),
            }),
        ),
    }
}

// ----------------------------- resolvers.ts ------------------------------- //

/// A module exporting `createResolvers`, wiring every resolver export and scalar.
///
/// `output_dir` is the directory the module is written to; imports are relative to it.
pub fn resolvers_code(integrated: &IntegratedResult, output_dir: &Path) -> String {
    let mut namespaces = Namespaces::default();
    let mut entries: BTreeMap<String, String> = BTreeMap::new();

    for extension in &integrated.type_extensions {
        let mut fields: BTreeMap<&str, String> = BTreeMap::new();
        for ext_field in &extension.fields {
            let (Some(file), Some(export)) = (&ext_field.resolver_source_file, &ext_field.resolver_export_name) else {
                continue;
            };
            let ns = namespaces.get(output_dir, file);
            fields.insert(&ext_field.field.name, format!("{ns}.{export}"));
        }
        if fields.is_empty() {
            continue;
        }
        let body: Vec<String> = fields.iter().map(|(name, value)| format!("      {name}: {value},")).collect();
        entries.insert(extension.target_type_name.clone(), format!("{{\n{}\n    }}", body.join("\n")));
    }

    for base in &integrated.base_types {
        let remapped = base.kind == GraphQLTypeKind::Enum
            && base.enum_values.iter().any(|v| v.name != v.original_value);
        if !remapped || entries.contains_key(&base.name) {
            continue;
        }
        let body: Vec<String> = base
            .enum_values
            .iter()
            .map(|v| format!("      {}: {},", v.name, Value::String(v.original_value.clone())))
            .collect();
        entries.insert(base.name.clone(), format!("{{\n{}\n    }}", body.join("\n")));
    }

    let mut scalars: Vec<&ScalarDefinition> = integrated.custom_scalars.iter().collect();
    scalars.sort_by(|a, b| a.scalar_name.cmp(&b.scalar_name));
    for scalar in &scalars {
        entries.insert(scalar.scalar_name.clone(), format!("scalars.{}", scalar.scalar_name));
    }

    let mut type_imports: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for scalar in &scalars {
        for type_ref in scalar.input_type.iter().chain(&scalar.output_types) {
            if let Some(module) = scalar_import_module(type_ref, output_dir) {
                let names = type_imports.entry(module).or_default();
                if !names.contains(&type_ref.type_name) {
                    names.push(type_ref.type_name.clone());
                }
            }
        }
    }

    let mut out = String::from(HEADER);
    if !scalars.is_empty() {
        out.push_str("import type { GraphQLScalarType } from \"graphql\";\n");
    }
    for (module, mut names) in type_imports {
        names.sort();
        out.push_str(&format!("import type {{ {} }} from \"{module}\";\n", names.join(", ")));
    }
    for (module, ns) in &namespaces.by_module {
        out.push_str(&format!("import * as {ns} from \"{module}\";\n"));
    }
    out.push('\n');

    if scalars.is_empty() {
        out.push_str("export function createResolvers() {\n");
    } else {
        let params: Vec<String> = scalars.iter().map(|s| format!("    {}: {};", s.scalar_name, scalar_param_type(s))).collect();
        out.push_str(&format!(
            "export function createResolvers({{ scalars }}: {{\n  scalars: {{\n{}\n  }};\n}}) {{\n",
            params.iter().map(|p| format!("  {p}")).collect::<Vec<_>>().join("\n")
        ));
    }
    out.push_str("  return {\n");
    for (name, value) in &entries {
        out.push_str(&format!("    {name}: {value},\n"));
    }
    out.push_str("  };\n}\n");
    out
}

/// `GraphQLScalarType<Input, Output1 | Output2>`
fn scalar_param_type(scalar: &ScalarDefinition) -> String {
    let input = scalar.input_type.as_ref().map(|t| t.type_name.as_str()).unwrap_or("unknown");
    let outputs: Vec<&str> = scalar.output_types.iter().map(|t| t.type_name.as_str()).collect();
    let output = if outputs.is_empty() { "unknown".to_string() } else { outputs.join(" | ") };
    format!("GraphQLScalarType<{input}, {output}>")
}

fn scalar_import_module(type_ref: &ScalarTypeRef, output_dir: &Path) -> Option<String> {
    match (&type_ref.import_path, &type_ref.source_file) {
        (Some(specifier), _) => Some(specifier.clone()),
        (None, Some(file)) => Some(relative_import(output_dir, file)),
        (None, None) => None,
    }
}

#[derive(Default)]
struct Namespaces {
    by_module: BTreeMap<String, String>,
}

impl Namespaces {
    fn get(&mut self, output_dir: &Path, file: &Path) -> String {
        let module = relative_import(output_dir, file);
        if let Some(ns) = self.by_module.get(&module) {
            return ns.clone();
        }
        let base = namespace_ident(&module);
        let mut ns = base.clone();
        let mut n = 2;
        while self.by_module.values().any(|existing| existing == &ns) {
            ns = format!("{base}{n}");
            n += 1;
        }
        self.by_module.insert(module, ns.clone());
        ns
    }
}

/// `../resolvers/user-queries` → `resolvers_user_queries`
fn namespace_ident(module: &str) -> String {
    let parts: Vec<String> = module
        .split('/')
        .filter(|p| !p.is_empty() && *p != "." && *p != "..")
        .map(|p| p.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect())
        .collect();
    let ident = parts.join("_");
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else {
        ident
    }
}

/// Relative module specifier from `from_dir` to `target`, extension stripped.
pub fn relative_import(from_dir: &Path, target: &Path) -> String {
    let target = target.with_extension("");
    let from: Vec<Component> = from_dir.components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component> = target.components().filter(|c| *c != Component::CurDir).collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut rel = PathBuf::new();
    for _ in common..from.len() {
        rel.push("..");
    }
    for component in &to[common..] {
        rel.push(component.as_os_str());
    }
    let rel = rel.to_string_lossy().replace('\\', "/");
    if rel.starts_with("..") {
        rel
    } else {
        format!("./{rel}")
    }
}

// ------------------------------- Tests ------------------------------------ //
