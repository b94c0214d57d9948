// GraphQL-level IR. Everything downstream of lowering reads only these types.

use std::path::PathBuf;

use serde::Serialize;

use crate::diagnostics::{Diagnostic, SourceLocation};
use crate::extract::scalars::ScalarDefinition;
use crate::tsdoc::Deprecation;

pub const BUILTIN_SCALARS: [&str; 5] = ["ID", "Int", "Float", "String", "Boolean"];

pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum GraphQLTypeKind {
    Object,
    InputObject,
    Enum,
    Union,
    Scalar,
    Interface,
}

impl GraphQLTypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphQLTypeKind::Object => "Object",
            GraphQLTypeKind::InputObject => "InputObject",
            GraphQLTypeKind::Enum => "Enum",
            GraphQLTypeKind::Union => "Union",
            GraphQLTypeKind::Scalar => "Scalar",
            GraphQLTypeKind::Interface => "Interface",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GraphQLFieldType {
    pub type_name: String,
    pub nullable: bool,
    pub list: bool,
    pub list_item_nullable: bool, // only meaningful when `list`
}

impl GraphQLFieldType {
    pub fn named(type_name: impl Into<String>, nullable: bool) -> Self {
        Self { type_name: type_name.into(), nullable, list: false, list_item_nullable: false }
    }

    pub fn list_of(type_name: impl Into<String>, nullable: bool, list_item_nullable: bool) -> Self {
        Self { type_name: type_name.into(), nullable, list: true, list_item_nullable }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphQLInputValue {
    pub name: String,
    pub field_type: GraphQLFieldType,
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
    pub location: Option<SourceLocation>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphQLField {
    pub name: String,
    pub field_type: GraphQLFieldType,
    pub args: Vec<GraphQLInputValue>, // declaration order
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
    pub location: Option<SourceLocation>,
}

impl GraphQLField {
    pub fn as_input_value(&self) -> GraphQLInputValue {
        GraphQLInputValue {
            name: self.name.clone(),
            field_type: self.field_type.clone(),
            description: self.description.clone(),
            deprecated: self.deprecated.clone(),
            location: self.location.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphQLEnumValue {
    pub name: String,
    pub original_value: String,
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
}

/// One declaration after lowering. Which collections are filled depends on `kind`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConvertedType {
    pub name: String,
    pub kind: GraphQLTypeKind,
    pub fields: Vec<GraphQLField>,
    pub union_members: Vec<String>,
    pub enum_values: Vec<GraphQLEnumValue>,
    pub implemented_interfaces: Vec<String>,
    pub one_of: bool,
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
    pub source_file: Option<PathBuf>,
    pub location: Option<SourceLocation>,
}

impl ConvertedType {
    pub fn new(name: impl Into<String>, kind: GraphQLTypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            union_members: Vec::new(),
            enum_values: Vec::new(),
            implemented_interfaces: Vec::new(),
            one_of: false,
            description: None,
            deprecated: None,
            source_file: None,
            location: None,
        }
    }
}

/// Object, Interface, Union or Enum in the integrated schema.
pub type BaseType = ConvertedType;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputType {
    pub name: String,
    pub fields: Vec<GraphQLInputValue>,
    pub one_of: bool,
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
    pub source_file: Option<PathBuf>,
    pub location: Option<SourceLocation>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtensionField {
    pub field: GraphQLField,
    pub resolver_source_file: Option<PathBuf>,
    pub resolver_export_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeExtension {
    pub target_type_name: String,
    pub fields: Vec<ExtensionField>, // resolver-encounter order
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct IntegratedResult {
    pub base_types: Vec<BaseType>,
    pub input_types: Vec<InputType>,
    pub type_extensions: Vec<TypeExtension>,
    pub has_query: bool,
    pub has_mutation: bool,
    pub has_errors: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub custom_scalar_names: Vec<String>,
    pub custom_scalars: Vec<ScalarDefinition>,
}

impl IntegratedResult {
    pub fn base_type(&self, name: &str) -> Option<&BaseType> {
        self.base_types.iter().find(|t| t.name == name)
    }

    pub fn input_type(&self, name: &str) -> Option<&InputType> {
        self.input_types.iter().find(|t| t.name == name)
    }
}
