//! TypeScript-level model produced by walking the [`Program`](crate::program::Program).
//!
//! Nothing here knows about GraphQL kinds yet; [`crate::lower`] does that mapping.
pub mod resolvers;
pub mod scalars;
pub mod shape;
pub mod types;

use std::path::PathBuf;

use serde::Serialize;

use crate::diagnostics::SourceLocation;
use crate::tsdoc::Deprecation;
pub use shape::{Primitive, ScalarInfo, ScalarOnly, TsTypeReference, TypeShape};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    Interface,
    Object,
    Enum,
    Union,
    GraphqlInterface,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Interface => "interface",
            TypeKind::Object => "object",
            TypeKind::Enum => "enum",
            TypeKind::Union => "union",
            TypeKind::GraphqlInterface => "graphqlInterface",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportKind {
    Named,
    Default,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TypeMetadata {
    pub name: String,
    pub kind: TypeKind,
    pub source_file: PathBuf,
    pub location: SourceLocation,
    pub export_kind: ExportKind,
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
}

/// A property of an object-like type, or one argument of a resolver.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub ts_type: TsTypeReference,
    pub optional: bool,
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
    pub location: Option<SourceLocation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnumMemberInfo {
    pub name: String,
    pub value: String, // runtime value, kept verbatim
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtractedTypeInfo {
    pub metadata: TypeMetadata,
    pub fields: Vec<FieldDefinition>,
    pub union_members: Vec<String>,          // sorted
    pub enum_members: Vec<EnumMemberInfo>,   // declaration order
    pub inline_object_members: Vec<Vec<FieldDefinition>>, // oneOf candidates
    pub implemented_interfaces: Vec<String>,
}

impl ExtractedTypeInfo {
    pub fn new(metadata: TypeMetadata) -> Self {
        Self {
            metadata,
            fields: Vec::new(),
            union_members: Vec::new(),
            enum_members: Vec::new(),
            inline_object_members: Vec::new(),
            implemented_interfaces: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}
