//! Deterministic SDL rendering on top of the `graphql_parser` schema AST.
//!
//! Top-level order: custom scalars, base types, input objects, then type
//! extensions, each group sorted by name. Fields are sorted everywhere; enum
//! values keep declaration order.
use graphql_parser::query::Value;
use graphql_parser::schema::{
    Definition, Directive, Document, EnumType, EnumValue, Field, InputObjectType, InputValue, InterfaceType,
    ObjectType, ObjectTypeExtension, ScalarType, Type, TypeDefinition, TypeExtension as AstTypeExtension, UnionType,
};

use crate::extract::scalars::ScalarDefinition;
use crate::ir::{
    BaseType, GraphQLEnumValue, GraphQLField, GraphQLFieldType, GraphQLInputValue, GraphQLTypeKind, InputType,
    IntegratedResult, TypeExtension,
};
use crate::tsdoc::Deprecation;

pub type SchemaDocument = Document<'static, String>;
pub type SchemaDefinition = Definition<'static, String>;
pub type TypeNode = Type<'static, String>;

// ---------------------------- Node builders ------------------------------- //

pub fn name(value: &str) -> String {
    value.to_string()
}

pub fn named_type(type_name: &str) -> TypeNode {
    Type::NamedType(name(type_name))
}

pub fn list_type(inner: TypeNode) -> TypeNode {
    Type::ListType(Box::new(inner))
}

pub fn non_null_type(inner: TypeNode) -> TypeNode {
    match inner {
        Type::NonNullType(_) => inner,
        other => Type::NonNullType(Box::new(other)),
    }
}

/// `{nullable, list, list_item_nullable}` → one of the six wrapper shapes.
pub fn field_type_node(field_type: &GraphQLFieldType) -> TypeNode {
    let named = named_type(&field_type.type_name);
    let inner = if field_type.list {
        let item = if field_type.list_item_nullable { named } else { non_null_type(named) };
        list_type(item)
    } else {
        named
    };
    if field_type.nullable { inner } else { non_null_type(inner) }
}

pub fn deprecated_directive(deprecated: &Option<Deprecation>) -> Vec<Directive<'static, String>> {
    let Some(deprecation) = deprecated else { return Vec::new() };
    let arguments = match &deprecation.reason {
        Some(reason) => vec![(name("reason"), Value::String(reason.clone()))],
        None => Vec::new(),
    };
    vec![Directive { position: Default::default(), name: name("deprecated"), arguments }]
}

pub fn input_value_definition(value: &GraphQLInputValue) -> InputValue<'static, String> {
    InputValue {
        position: Default::default(),
        description: value.description.clone(),
        name: name(&value.name),
        value_type: field_type_node(&value.field_type),
        default_value: None,
        directives: deprecated_directive(&value.deprecated),
    }
}

pub fn field_definition(field: &GraphQLField) -> Field<'static, String> {
    Field {
        position: Default::default(),
        description: field.description.clone(),
        name: name(&field.name),
        arguments: field.args.iter().map(input_value_definition).collect(),
        field_type: field_type_node(&field.field_type),
        directives: deprecated_directive(&field.deprecated),
    }
}

fn sorted_fields<'f>(fields: impl IntoIterator<Item = &'f GraphQLField>) -> Vec<Field<'static, String>> {
    let mut fields: Vec<&GraphQLField> = fields.into_iter().collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name));
    fields.into_iter().map(field_definition).collect()
}

fn sorted_names(names: &[String]) -> Vec<String> {
    let mut names = names.to_vec();
    names.sort();
    names.dedup();
    names
}

fn enum_value(value: &GraphQLEnumValue) -> EnumValue<'static, String> {
    EnumValue {
        position: Default::default(),
        description: value.description.clone(),
        name: name(&value.name),
        directives: deprecated_directive(&value.deprecated),
    }
}

pub fn object_type_definition(base: &BaseType) -> TypeDefinition<'static, String> {
    TypeDefinition::Object(ObjectType {
        position: Default::default(),
        description: base.description.clone(),
        name: name(&base.name),
        implements_interfaces: sorted_names(&base.implemented_interfaces),
        directives: deprecated_directive(&base.deprecated),
        fields: sorted_fields(&base.fields),
    })
}

pub fn interface_type_definition(base: &BaseType) -> TypeDefinition<'static, String> {
    TypeDefinition::Interface(InterfaceType {
        position: Default::default(),
        description: base.description.clone(),
        name: name(&base.name),
        implements_interfaces: sorted_names(&base.implemented_interfaces),
        directives: deprecated_directive(&base.deprecated),
        fields: sorted_fields(&base.fields),
    })
}

pub fn union_type_definition(base: &BaseType) -> TypeDefinition<'static, String> {
    TypeDefinition::Union(UnionType {
        position: Default::default(),
        description: base.description.clone(),
        name: name(&base.name),
        directives: deprecated_directive(&base.deprecated),
        types: sorted_names(&base.union_members),
    })
}

pub fn enum_type_definition(base: &BaseType) -> TypeDefinition<'static, String> {
    TypeDefinition::Enum(EnumType {
        position: Default::default(),
        description: base.description.clone(),
        name: name(&base.name),
        directives: deprecated_directive(&base.deprecated),
        values: base.enum_values.iter().map(enum_value).collect(),
    })
}

pub fn input_object_type_definition(input: &InputType) -> TypeDefinition<'static, String> {
    let mut fields: Vec<&GraphQLInputValue> = input.fields.iter().collect();
    fields.sort_by(|a, b| a.name.cmp(&b.name));
    let mut directives = deprecated_directive(&input.deprecated);
    if input.one_of {
        directives.push(Directive { position: Default::default(), name: name("oneOf"), arguments: Vec::new() });
    }
    TypeDefinition::InputObject(InputObjectType {
        position: Default::default(),
        description: input.description.clone(),
        name: name(&input.name),
        directives,
        fields: fields.into_iter().map(input_value_definition).collect(),
    })
}

pub fn scalar_type_definition(scalar: &ScalarDefinition) -> TypeDefinition<'static, String> {
    TypeDefinition::Scalar(ScalarType {
        position: Default::default(),
        description: scalar.description.clone(),
        name: name(&scalar.scalar_name),
        directives: Vec::new(),
    })
}

pub fn object_type_extension(extension: &TypeExtension) -> AstTypeExtension<'static, String> {
    AstTypeExtension::Object(ObjectTypeExtension {
        position: Default::default(),
        name: name(&extension.target_type_name),
        implements_interfaces: Vec::new(),
        directives: Vec::new(),
        fields: sorted_fields(extension.fields.iter().map(|f| &f.field)),
    })
}

fn base_type_definition(base: &BaseType) -> TypeDefinition<'static, String> {
    match base.kind {
        GraphQLTypeKind::Interface => interface_type_definition(base),
        GraphQLTypeKind::Union => union_type_definition(base),
        GraphQLTypeKind::Enum => enum_type_definition(base),
        GraphQLTypeKind::Scalar => TypeDefinition::Scalar(ScalarType {
            position: Default::default(),
            description: base.description.clone(),
            name: name(&base.name),
            directives: deprecated_directive(&base.deprecated),
        }),
        GraphQLTypeKind::Object | GraphQLTypeKind::InputObject => object_type_definition(base),
    }
}

// ------------------------------ Document ---------------------------------- //

pub fn build_document(integrated: &IntegratedResult) -> SchemaDocument {
    let mut scalars: Vec<&ScalarDefinition> = integrated.custom_scalars.iter().collect();
    scalars.sort_by(|a, b| a.scalar_name.cmp(&b.scalar_name));
    let mut bases: Vec<&BaseType> = integrated.base_types.iter().collect();
    bases.sort_by(|a, b| a.name.cmp(&b.name));
    let mut inputs: Vec<&InputType> = integrated.input_types.iter().collect();
    inputs.sort_by(|a, b| a.name.cmp(&b.name));
    let mut extensions: Vec<&TypeExtension> = integrated.type_extensions.iter().collect();
    extensions.sort_by(|a, b| a.target_type_name.cmp(&b.target_type_name));

    let definitions = scalars
        .into_iter()
        .map(scalar_type_definition)
        .chain(bases.into_iter().map(base_type_definition))
        .chain(inputs.into_iter().map(input_object_type_definition))
        .map(Definition::TypeDefinition)
        .chain(extensions.into_iter().map(|e| Definition::TypeExtension(object_type_extension(e))))
        .collect();
    Document { definitions }
}

pub fn print_sdl(document: &SchemaDocument) -> String {
    document.to_string()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ConvertedType, ExtensionField};
    use proptest::prelude::*;

    fn field(name: &str, field_type: GraphQLFieldType) -> GraphQLField {
        GraphQLField { name: name.into(), field_type, args: Vec::new(), description: None, deprecated: None, location: None }
    }

    fn printed_type(field_type: &GraphQLFieldType) -> String {
        field_type_node(field_type).to_string()
    }

    #[test]
    fn six_wrapper_shapes() {
        let cases = [
            (GraphQLFieldType::named("User", false), "User!"),
            (GraphQLFieldType::named("User", true), "User"),
            (GraphQLFieldType::list_of("User", false, false), "[User!]!"),
            (GraphQLFieldType::list_of("User", true, false), "[User!]"),
            (GraphQLFieldType::list_of("User", false, true), "[User]!"),
            (GraphQLFieldType::list_of("User", true, true), "[User]"),
        ];
        for (field_type, expected) in cases {
            assert_eq!(printed_type(&field_type), expected);
        }
    }

    proptest! {
        #[test]
        fn nullability_composition(nullable in any::<bool>(), list in any::<bool>(), item_nullable in any::<bool>()) {
            let field_type = GraphQLFieldType { type_name: "T".into(), nullable, list, list_item_nullable: item_nullable };
            let item = if list && !item_nullable { "T!" } else { "T" };
            let inner = if list { format!("[{item}]") } else { item.to_string() };
            let expected = if nullable { inner } else { format!("{inner}!") };
            prop_assert_eq!(printed_type(&field_type), expected);
        }
    }

    fn sample() -> IntegratedResult {
        let mut user = ConvertedType::new("User", GraphQLTypeKind::Object);
        user.description = Some("A user".into());
        user.fields = vec![
            field("name", GraphQLFieldType::named("String", false)),
            field("id", GraphQLFieldType::named("ID", false)),
        ];
        let mut status = ConvertedType::new("Status", GraphQLTypeKind::Enum);
        status.enum_values = ["ZULU", "ALPHA"]
            .iter()
            .map(|v| GraphQLEnumValue { name: v.to_string(), original_value: v.to_lowercase(), description: None, deprecated: None })
            .collect();
        let mut users = field("users", GraphQLFieldType::list_of("User", false, false));
        users.deprecated = Some(Deprecation { reason: Some("use search".into()) });
        IntegratedResult {
            base_types: vec![user, status, ConvertedType::new("Query", GraphQLTypeKind::Object)],
            input_types: vec![InputType {
                name: "ContactInput".into(),
                fields: vec![GraphQLInputValue {
                    name: "email".into(),
                    field_type: GraphQLFieldType::named("String", true),
                    description: None,
                    deprecated: None,
                    location: None,
                }],
                one_of: true,
                description: None,
                deprecated: None,
                source_file: None,
                location: None,
            }],
            type_extensions: vec![TypeExtension {
                target_type_name: "Query".into(),
                fields: vec![ExtensionField { field: users, resolver_source_file: None, resolver_export_name: None }],
            }],
            has_query: true,
            custom_scalar_names: vec!["DateTime".into()],
            custom_scalars: vec![ScalarDefinition {
                scalar_name: "DateTime".into(),
                input_type: None,
                output_types: Vec::new(),
                description: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn document_order_and_round_trip() {
        let sdl = print_sdl(&build_document(&sample()));
        let positions: Vec<usize> = ["scalar DateTime", "type Query", "enum Status", "type User", "input ContactInput", "extend type Query"]
            .iter()
            .map(|needle| sdl.find(needle).unwrap_or_else(|| panic!("missing {needle} in\n{sdl}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{sdl}");
        assert!(sdl.find("ZULU").unwrap() < sdl.find("ALPHA").unwrap());
        assert!(sdl.find("  id: ID!").unwrap() < sdl.find("  name: String!").unwrap());
        assert!(sdl.contains("@deprecated(reason: \"use search\")"));
        assert!(sdl.contains("@oneOf"));
        graphql_parser::parse_schema::<String>(&sdl).expect("printed SDL parses");
    }

    #[test]
    fn deprecated_without_reason_has_no_arguments() {
        let directives = deprecated_directive(&Some(Deprecation { reason: None }));
        assert_eq!(directives[0].name, "deprecated");
        assert!(directives[0].arguments.is_empty());
    }
}
