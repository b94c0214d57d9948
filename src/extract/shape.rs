//! The `TypeShape` classifier: one total function from a TypeScript type
//! expression to a [`TsTypeReference`].
//!
//! Priority, top to bottom:
//!   parens / readonly        → look through
//!   union                    → strip null/undefined, `true | false` → boolean
//!   array                    → one level, element classified on its own
//!   keyword / literal        → primitive / literal
//!   type literal, `&`        → inline object (properties merged)
//!   named reference          → scalar binding, utility type, declaration, or plain reference
use serde::{Deserialize, Serialize};
use swc_common::Spanned;
use swc_ecma_ast::{
    Expr, Lit, TsEntityName, TsKeywordTypeKind, TsLit, TsType, TsTypeElement, TsTypeOperatorOp,
    TsTypeRef, TsUnionOrIntersectionType,
};

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::program::{Program, Resolved, SourceModule, TypeDecl, TypeDeclNode, RUNTIME_MODULE};
use super::scalars::{ScalarBinding, ScalarRegistry};
use super::FieldDefinition;

/// Alias chains and nested literals deeper than this are reported instead of followed.
const MAX_DEPTH: usize = 32;

/// Names exported by the runtime package that the classifier understands.
const RUNTIME_TYPES: &[&str] = &[
    "Int",
    "Float",
    "IDString",
    "IDNumber",
    "DefineScalar",
    "DefineInterface",
    "NoArgs",
    "QueryResolver",
    "MutationResolver",
    "FieldResolver",
];

/// Runtime branded primitives and the built-in GraphQL scalar each one stands for.
const RUNTIME_SCALARS: &[(&str, &str)] = &[
    ("Int", "Int"),
    ("Float", "Float"),
    ("IDString", "ID"),
    ("IDNumber", "ID"),
];

const UTILITY_TYPES: &[&str] = &["Partial", "Required", "Readonly", "Pick", "Omit"];

// ----------------------------- Shape model -------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    String,
    Number,
    Boolean,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarOnly {
    Input,
    Output,
}

impl ScalarOnly {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "input" => Some(ScalarOnly::Input),
            "output" => Some(ScalarOnly::Output),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarOnly::Input => "input",
            ScalarOnly::Output => "output",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScalarInfo {
    pub scalar_name: String,
    pub type_name: String,     // TS name the scalar was reached through
    pub base: Option<String>,  // backing TS type as written, when declared in source
    pub custom: bool,
    pub only: Option<ScalarOnly>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TypeShape {
    Primitive(Primitive),
    Reference(String),
    Scalar(ScalarInfo),
    Array(Box<TsTypeReference>),
    Union(Vec<TsTypeReference>),
    Literal(Literal),
    InlineObject(Vec<FieldDefinition>),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TsTypeReference {
    pub shape: TypeShape,
    pub nullable: bool,
}

impl TsTypeReference {
    pub fn new(shape: TypeShape) -> Self {
        Self { shape, nullable: false }
    }

    pub fn primitive(p: Primitive) -> Self {
        Self::new(TypeShape::Primitive(p))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(TypeShape::Reference(name.into()))
    }

    pub fn array_of(element: TsTypeReference) -> Self {
        Self::new(TypeShape::Array(Box::new(element)))
    }

    /// `nullable` only ever widens; `T | null` inside an alias of `T | undefined` stays nullable.
    pub fn or_nullable(mut self, nullable: bool) -> Self {
        self.nullable |= nullable;
        self
    }

    /// Named target of a reference or scalar, ignoring nullability.
    pub fn named(&self) -> Option<&str> {
        match &self.shape {
            TypeShape::Reference(name) => Some(name),
            TypeShape::Scalar(info) => Some(&info.scalar_name),
            _ => None,
        }
    }
}

// ----------------------------- Classifier --------------------------------- //

/// How a type alias declaration participates in the schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AliasKind {
    Scalar,
    GraphqlInterface,
    Object,
    Enum,
    Union,
    /// Not a GraphQL type of its own; uses see through to the aliased type.
    Transparent,
}

/// A type name after resolution.
pub enum Named<'p> {
    Decl(TypeDecl<'p>),
    Runtime(String),
    External { specifier: String, name: String },
    Unknown(String),
}

/// Property set of an object-like type plus the GraphQL interfaces it picked up.
#[derive(Clone, Debug, Default)]
pub struct PropertySet {
    pub fields: Vec<FieldDefinition>,
    pub interfaces: Vec<String>,
}

impl PropertySet {
    /// First occurrence of a property name wins.
    pub fn merge(&mut self, other: PropertySet) {
        for field in other.fields {
            if !self.fields.iter().any(|f| f.name == field.name) {
                self.fields.push(field);
            }
        }
        for iface in other.interfaces {
            if !self.interfaces.contains(&iface) {
                self.interfaces.push(iface);
            }
        }
    }
}

pub struct Classifier<'p> {
    pub program: &'p Program,
    pub scalars: &'p ScalarRegistry,
}

impl<'p> Classifier<'p> {
    pub fn new(program: &'p Program, scalars: &'p ScalarRegistry) -> Self {
        Self { program, scalars }
    }

    pub fn classify(&self, module: &'p SourceModule, ty: &TsType, diags: &mut Vec<Diagnostic>) -> TsTypeReference {
        self.classify_at(module, ty, diags, 0)
    }

    fn classify_at(
        &self,
        module: &'p SourceModule,
        ty: &TsType,
        diags: &mut Vec<Diagnostic>,
        depth: usize,
    ) -> TsTypeReference {
        if depth > MAX_DEPTH {
            return unsupported(module, ty, "type is nested too deeply or refers to itself", diags);
        }
        match ty {
            TsType::TsParenthesizedType(paren) => self.classify_at(module, &paren.type_ann, diags, depth),
            TsType::TsTypeOperator(op) if op.op == TsTypeOperatorOp::ReadOnly => {
                self.classify_at(module, &op.type_ann, diags, depth)
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                let (members, nullable) = split_nullable(union.types.iter().map(|t| &**t));
                if members.is_empty() {
                    return unsupported(module, ty, "a type made only of null/undefined", diags);
                }
                if members.len() == 2 && members.iter().all(|m| is_bool_literal(m)) {
                    return TsTypeReference::primitive(Primitive::Boolean).or_nullable(nullable);
                }
                if let [single] = members.as_slice() {
                    return self.classify_at(module, single, diags, depth + 1).or_nullable(nullable);
                }
                let members = members
                    .into_iter()
                    .map(|m| self.classify_at(module, m, diags, depth + 1))
                    .collect();
                TsTypeReference::new(TypeShape::Union(members)).or_nullable(nullable)
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(_))
            | TsType::TsTypeLit(_) => {
                let props = self.type_properties(module, ty, diags, depth + 1);
                TsTypeReference::new(TypeShape::InlineObject(props.fields))
            }
            TsType::TsArrayType(array) => {
                TsTypeReference::array_of(self.classify_at(module, &array.elem_type, diags, depth + 1))
            }
            TsType::TsKeywordType(keyword) => match keyword.kind {
                TsKeywordTypeKind::TsStringKeyword => TsTypeReference::primitive(Primitive::String),
                TsKeywordTypeKind::TsNumberKeyword => TsTypeReference::primitive(Primitive::Number),
                TsKeywordTypeKind::TsBooleanKeyword => TsTypeReference::primitive(Primitive::Boolean),
                _ => unsupported(module, ty, "this keyword type has no GraphQL equivalent", diags),
            },
            TsType::TsLitType(lit) => match &lit.lit {
                TsLit::Str(s) => TsTypeReference::new(TypeShape::Literal(Literal::String(s.value.to_string()))),
                TsLit::Number(n) => TsTypeReference::new(TypeShape::Literal(Literal::Number(n.value))),
                TsLit::Bool(b) => TsTypeReference::new(TypeShape::Literal(Literal::Boolean(b.value))),
                _ => unsupported(module, ty, "template and bigint literals are not supported", diags),
            },
            TsType::TsTypeRef(type_ref) => self.classify_reference(module, type_ref, diags, depth),
            _ => unsupported(module, ty, "mapped, conditional, function and tuple types are not supported", diags),
        }
    }

    fn classify_reference(
        &self,
        module: &'p SourceModule,
        type_ref: &TsTypeRef,
        diags: &mut Vec<Diagnostic>,
        depth: usize,
    ) -> TsTypeReference {
        let params: Vec<&TsType> = type_ref
            .type_params
            .as_ref()
            .map(|p| p.params.iter().map(|t| &**t).collect())
            .unwrap_or_default();
        let named = self.resolve_entity(module, &type_ref.type_name);

        if let Named::Runtime(name) = &named {
            if let Some((_, graphql)) = RUNTIME_SCALARS.iter().find(|(ts, _)| ts == name) {
                return TsTypeReference::new(TypeShape::Scalar(ScalarInfo {
                    scalar_name: graphql.to_string(),
                    type_name: name.clone(),
                    base: None,
                    custom: false,
                    only: None,
                }));
            }
            if name == "DefineScalar" {
                return match define_scalar_args(module, type_ref) {
                    Ok(decl) => TsTypeReference::new(TypeShape::Scalar(ScalarInfo {
                        scalar_name: decl.scalar_name.clone(),
                        type_name: decl.scalar_name,
                        base: Some(decl.base),
                        custom: true,
                        only: decl.only,
                    })),
                    Err(message) => unsupported_span(module, type_ref.span, &message, diags),
                };
            }
            if name == "DefineInterface" {
                return unsupported_span(module, type_ref.span, "DefineInterface must be given a name with a type alias", diags);
            }
        }

        if let Named::Decl(decl) = &named {
            if let Some(binding) = self.scalars.declared(&decl.symbol()) {
                return scalar_reference(binding);
            }
        }
        if let Some(binding) = self.mapped_scalar(module, &type_ref.type_name, &named) {
            return scalar_reference(binding);
        }

        match named {
            Named::Unknown(name) if (name == "Array" || name == "ReadonlyArray") && params.len() == 1 => {
                TsTypeReference::array_of(self.classify_at(module, params[0], diags, depth + 1))
            }
            Named::Unknown(name) if UTILITY_TYPES.contains(&name.as_str()) => {
                let props = self.utility_properties(module, type_ref, &name, diags, depth + 1);
                TsTypeReference::new(TypeShape::InlineObject(props.fields))
            }
            Named::Decl(decl) => match decl.node {
                TypeDeclNode::Interface(_) | TypeDeclNode::Enum(_) => TsTypeReference::reference(decl.name),
                TypeDeclNode::Alias(alias) => match self.alias_kind(&decl, depth + 1) {
                    AliasKind::Transparent => self.classify_at(decl.module, &alias.type_ann, diags, depth + 1),
                    _ => TsTypeReference::reference(decl.name),
                },
            },
            Named::Runtime(name) => {
                unsupported_span(module, type_ref.span, &format!("`{name}` cannot be used as a field type"), diags)
            }
            Named::External { name, .. } | Named::Unknown(name) => TsTypeReference::reference(name),
        }
    }

    /// Global scalar-name mapping supplied through configuration.
    fn mapped_scalar(&self, module: &SourceModule, entity: &TsEntityName, named: &Named<'p>) -> Option<&'p ScalarBinding> {
        let local = match entity {
            TsEntityName::Ident(ident) => ident.sym.to_string(),
            TsEntityName::TsQualifiedName(q) => q.right.sym.to_string(),
        };
        let specifier = module.symbols.imports.get(&local).map(|import| import.specifier.as_str());
        match named {
            Named::Decl(decl) => self.scalars.mapped(decl.name, specifier),
            Named::External { specifier, name } => self.scalars.mapped(name, Some(specifier)),
            Named::Unknown(name) => self.scalars.mapped(name, specifier),
            Named::Runtime(_) => None,
        }
    }

    // ------------------------------ Names --------------------------------- //

    pub fn resolve_entity(&self, module: &SourceModule, name: &TsEntityName) -> Named<'p> {
        match name {
            TsEntityName::Ident(ident) => self.resolve_local(module, &ident.sym),
            TsEntityName::TsQualifiedName(qualified) => {
                let right = qualified.right.sym.to_string();
                if let TsEntityName::Ident(left) = &qualified.left {
                    if let Some(Resolved::Namespace(path)) = self.program.resolve_name(module.path(), &left.sym) {
                        let decl = self
                            .program
                            .module(&path)
                            .and_then(|target| self.program.resolve_export(target, &right, 0))
                            .and_then(|resolved| match resolved {
                                Resolved::Local(symbol) => self.program.type_decl(&symbol),
                                _ => None,
                            });
                        if let Some(decl) = decl {
                            return Named::Decl(decl);
                        }
                    }
                }
                Named::Unknown(right)
            }
        }
    }

    pub fn resolve_local(&self, module: &SourceModule, local: &str) -> Named<'p> {
        match self.program.resolve_name(module.path(), local) {
            Some(Resolved::Local(symbol)) => match self.program.type_decl(&symbol) {
                Some(decl) => Named::Decl(decl),
                None => Named::Unknown(local.to_string()),
            },
            Some(Resolved::External { specifier, name }) if specifier == RUNTIME_MODULE => Named::Runtime(name),
            Some(Resolved::External { specifier, name }) => Named::External { specifier, name },
            Some(Resolved::Namespace(_)) => Named::Unknown(local.to_string()),
            None if RUNTIME_TYPES.contains(&local) => Named::Runtime(local.to_string()),
            None => Named::Unknown(local.to_string()),
        }
    }

    /// True when `ty` names the runtime export `export`.
    pub fn is_runtime_ref(&self, module: &SourceModule, ty: &TsType, export: &str) -> bool {
        match strip_parens(ty) {
            TsType::TsTypeRef(type_ref) => {
                matches!(self.resolve_entity(module, &type_ref.type_name), Named::Runtime(name) if name == export)
            }
            _ => false,
        }
    }

    // ------------------------------ Aliases ------------------------------- //

    pub fn alias_kind(&self, decl: &TypeDecl<'p>, depth: usize) -> AliasKind {
        let TypeDeclNode::Alias(alias) = decl.node else {
            return AliasKind::Transparent;
        };
        if self.scalars.declared(&decl.symbol()).is_some() {
            return AliasKind::Scalar;
        }
        if depth > MAX_DEPTH {
            return AliasKind::Transparent;
        }
        match strip_parens(&alias.type_ann) {
            TsType::TsTypeLit(_)
            | TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(_)) => AliasKind::Object,
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
                let (members, _) = split_nullable(union.types.iter().map(|t| &**t));
                if union.types.len() >= 2 && !members.is_empty() && members.iter().all(|m| is_string_literal(m)) {
                    AliasKind::Enum
                } else if members.len() >= 2 && members.iter().all(|m| self.is_object_like(decl.module, m, depth + 1)) {
                    AliasKind::Union
                } else {
                    AliasKind::Transparent
                }
            }
            TsType::TsTypeRef(type_ref) => match self.resolve_entity(decl.module, &type_ref.type_name) {
                Named::Runtime(name) if name == "DefineScalar" => AliasKind::Scalar,
                Named::Runtime(name) if name == "DefineInterface" => AliasKind::GraphqlInterface,
                Named::Unknown(name) if UTILITY_TYPES.contains(&name.as_str()) => AliasKind::Object,
                Named::Decl(target) => {
                    let scalar = self.scalars.declared(&target.symbol()).is_some();
                    match target.node {
                        _ if scalar => AliasKind::Transparent,
                        TypeDeclNode::Interface(_) => AliasKind::Object,
                        TypeDeclNode::Enum(_) => AliasKind::Transparent,
                        TypeDeclNode::Alias(_) => match self.alias_kind(&target, depth + 1) {
                            AliasKind::Object | AliasKind::GraphqlInterface => AliasKind::Object,
                            _ => AliasKind::Transparent,
                        },
                    }
                }
                _ => AliasKind::Transparent,
            },
            _ => AliasKind::Transparent,
        }
    }

    /// Object-like union members: object types, inline literals, or anything that
    /// names a symbol we cannot see into.
    pub fn is_object_like(&self, module: &'p SourceModule, ty: &TsType, depth: usize) -> bool {
        match strip_parens(ty) {
            TsType::TsTypeLit(_)
            | TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(_)) => true,
            TsType::TsTypeRef(type_ref) => {
                let named = self.resolve_entity(module, &type_ref.type_name);
                if self.mapped_scalar(module, &type_ref.type_name, &named).is_some() {
                    return false;
                }
                match named {
                    Named::Decl(decl) => match decl.node {
                        TypeDeclNode::Interface(_) => self.scalars.declared(&decl.symbol()).is_none(),
                        TypeDeclNode::Enum(_) => false,
                        TypeDeclNode::Alias(_) => {
                            matches!(self.alias_kind(&decl, depth + 1), AliasKind::Object | AliasKind::GraphqlInterface)
                        }
                    },
                    Named::Runtime(_) => false,
                    Named::External { .. } => true,
                    Named::Unknown(name) => name != "Array" && name != "ReadonlyArray",
                }
            }
            _ => false,
        }
    }

    // ----------------------------- Properties ----------------------------- //

    /// Own and inherited properties of an interface or object-like alias.
    pub fn decl_properties(&self, decl: &TypeDecl<'p>, diags: &mut Vec<Diagnostic>, depth: usize) -> PropertySet {
        if depth > MAX_DEPTH {
            return PropertySet::default();
        }
        match decl.node {
            TypeDeclNode::Interface(iface) => {
                let mut set = PropertySet {
                    fields: self.member_fields(decl.module, &iface.body.body, diags, depth + 1),
                    interfaces: Vec::new(),
                };
                for parent in &iface.extends {
                    let target = match &*parent.expr {
                        Expr::Ident(ident) => self.resolve_local(decl.module, &ident.sym),
                        _ => Named::Unknown(decl.module.parsed.snippet(parent.span).to_string()),
                    };
                    match target {
                        Named::Decl(target) => {
                            if self.alias_kind(&target, depth + 1) == AliasKind::GraphqlInterface {
                                set.merge(PropertySet { fields: Vec::new(), interfaces: vec![target.name.to_string()] });
                            }
                            set.merge(self.decl_properties(&target, diags, depth + 1));
                        }
                        _ => diags.push(
                            Diagnostic::warning(
                                DiagnosticCode::UnsupportedSyntax,
                                format!(
                                    "`{}` extends `{}`, which cannot be resolved; its fields are skipped",
                                    decl.name,
                                    decl.module.parsed.snippet(parent.span)
                                ),
                            )
                            .at(Some(decl.module.parsed.location(parent.span))),
                        ),
                    }
                }
                set
            }
            TypeDeclNode::Alias(alias) => self.type_properties(decl.module, &alias.type_ann, diags, depth + 1),
            TypeDeclNode::Enum(_) => PropertySet::default(),
        }
    }

    /// Properties of an object-like type expression. Intersections are flattened
    /// breadth-first.
    pub fn type_properties(
        &self,
        module: &'p SourceModule,
        ty: &TsType,
        diags: &mut Vec<Diagnostic>,
        depth: usize,
    ) -> PropertySet {
        let mut set = PropertySet::default();
        let mut queue = std::collections::VecDeque::from([ty]);
        while let Some(ty) = queue.pop_front() {
            match ty {
                TsType::TsParenthesizedType(paren) => queue.push_back(&paren.type_ann),
                TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(inter)) => {
                    queue.extend(inter.types.iter().map(|t| &**t));
                }
                TsType::TsTypeLit(lit) => {
                    let fields = self.member_fields(module, &lit.members, diags, depth + 1);
                    set.merge(PropertySet { fields, interfaces: Vec::new() });
                }
                TsType::TsTypeRef(type_ref) => {
                    set.merge(self.reference_properties(module, type_ref, diags, depth + 1));
                }
                other => {
                    unsupported(module, other, "only object types can be merged into an object", diags);
                }
            }
        }
        set
    }

    fn reference_properties(
        &self,
        module: &'p SourceModule,
        type_ref: &TsTypeRef,
        diags: &mut Vec<Diagnostic>,
        depth: usize,
    ) -> PropertySet {
        match self.resolve_entity(module, &type_ref.type_name) {
            Named::Decl(decl) => {
                let mut set = PropertySet::default();
                if self.alias_kind(&decl, depth) == AliasKind::GraphqlInterface {
                    set.interfaces.push(decl.name.to_string());
                }
                set.merge(self.decl_properties(&decl, diags, depth));
                set
            }
            Named::Runtime(name) if name == "DefineInterface" => match first_param(type_ref) {
                Some(inner) => self.type_properties(module, inner, diags, depth),
                None => PropertySet::default(),
            },
            Named::Unknown(name) if UTILITY_TYPES.contains(&name.as_str()) => {
                self.utility_properties(module, type_ref, &name, diags, depth)
            }
            _ => {
                unsupported_span(
                    module,
                    type_ref.span,
                    &format!("cannot read the properties of `{}`", module.parsed.snippet(type_ref.span)),
                    diags,
                );
                PropertySet::default()
            }
        }
    }

    /// `Partial`, `Required`, `Readonly`, `Pick` and `Omit` over an object type.
    fn utility_properties(
        &self,
        module: &'p SourceModule,
        type_ref: &TsTypeRef,
        utility: &str,
        diags: &mut Vec<Diagnostic>,
        depth: usize,
    ) -> PropertySet {
        let params: Vec<&TsType> = type_ref
            .type_params
            .as_ref()
            .map(|p| p.params.iter().map(|t| &**t).collect())
            .unwrap_or_default();
        let expected = if matches!(utility, "Pick" | "Omit") { 2 } else { 1 };
        if params.len() != expected {
            unsupported_span(module, type_ref.span, &format!("`{utility}` expects {expected} type argument(s)"), diags);
            return PropertySet::default();
        }
        let mut set = self.type_properties(module, params[0], diags, depth + 1);
        match utility {
            "Partial" => set.fields.iter_mut().for_each(|f| f.optional = true),
            "Required" => set.fields.iter_mut().for_each(|f| f.optional = false),
            "Pick" | "Omit" => {
                let Some(keys) = literal_keys(params[1]) else {
                    unsupported(module, params[1], "keys must be string literals", diags);
                    return set;
                };
                let keep = utility == "Pick";
                set.fields.retain(|f| keys.contains(&f.name) == keep);
            }
            _ => {}
        }
        set
    }

    pub fn member_fields(
        &self,
        module: &'p SourceModule,
        members: &[TsTypeElement],
        diags: &mut Vec<Diagnostic>,
        depth: usize,
    ) -> Vec<FieldDefinition> {
        let mut fields = Vec::new();
        for member in members {
            match member {
                TsTypeElement::TsPropertySignature(prop) => {
                    let name = match &*prop.key {
                        Expr::Ident(ident) if !prop.computed => ident.sym.to_string(),
                        Expr::Lit(Lit::Str(s)) => s.value.to_string(),
                        _ => {
                            unsupported_span(module, prop.span, "computed property keys are not supported", diags);
                            continue;
                        }
                    };
                    let ts_type = match &prop.type_ann {
                        Some(ann) => self.classify_at(module, &ann.type_ann, diags, depth + 1),
                        None => unsupported_span(
                            module,
                            prop.span,
                            &format!("property `{name}` needs a type annotation"),
                            diags,
                        ),
                    };
                    let doc = module.parsed.doc_at(prop.span.lo);
                    fields.push(FieldDefinition {
                        name,
                        ts_type,
                        optional: prop.optional,
                        description: doc.description,
                        deprecated: doc.deprecated,
                        location: Some(module.parsed.location(prop.span)),
                    });
                }
                TsTypeElement::TsIndexSignature(index) => diags.push(
                    Diagnostic::warning(DiagnosticCode::UnsupportedSyntax, "index signatures are ignored")
                        .at(Some(module.parsed.location(index.span))),
                ),
                TsTypeElement::TsMethodSignature(method) => diags.push(
                    Diagnostic::warning(
                        DiagnosticCode::UnsupportedSyntax,
                        "method signatures are ignored; use defineField for computed fields",
                    )
                    .at(Some(module.parsed.location(method.span))),
                ),
                _ => {}
            }
        }
        fields
    }
}

// ------------------------------ DefineScalar ------------------------------ //

pub struct ScalarDeclaration {
    pub scalar_name: String,
    pub base: String,
    pub only: Option<ScalarOnly>,
}

/// Read `DefineScalar<"Name", Base, "input" | "output">`.
pub fn define_scalar_args(module: &SourceModule, type_ref: &TsTypeRef) -> Result<ScalarDeclaration, String> {
    let params: Vec<&TsType> = type_ref
        .type_params
        .as_ref()
        .map(|p| p.params.iter().map(|t| &**t).collect())
        .unwrap_or_default();
    let (name, base, only) = match params.as_slice() {
        [name, base] => (*name, *base, None),
        [name, base, only] => (*name, *base, Some(*only)),
        _ => return Err("DefineScalar expects a scalar name, a base type and an optional \"input\" | \"output\"".into()),
    };
    let scalar_name = string_literal(name).ok_or("the scalar name must be a string literal")?;
    let only = match only {
        None => None,
        Some(only) => Some(
            string_literal(only)
                .and_then(|s| ScalarOnly::parse(&s))
                .ok_or("the third DefineScalar argument must be \"input\" or \"output\"")?,
        ),
    };
    Ok(ScalarDeclaration { scalar_name, base: module.parsed.snippet(base.span()).to_string(), only })
}

// ------------------------------- Helpers ---------------------------------- //

fn scalar_reference(binding: &ScalarBinding) -> TsTypeReference {
    TsTypeReference::new(TypeShape::Scalar(ScalarInfo {
        scalar_name: binding.scalar_name.clone(),
        type_name: binding.type_name.clone(),
        base: binding.base.clone(),
        custom: true,
        only: binding.only,
    }))
}

pub fn strip_parens(mut ty: &TsType) -> &TsType {
    while let TsType::TsParenthesizedType(paren) = ty {
        ty = &paren.type_ann;
    }
    ty
}

pub fn first_param(type_ref: &TsTypeRef) -> Option<&TsType> {
    type_ref.type_params.as_ref()?.params.first().map(|t| &**t)
}

/// Drop `null`/`undefined` members (nested unions included) and report whether any were present.
pub fn split_nullable<'t>(types: impl Iterator<Item = &'t TsType>) -> (Vec<&'t TsType>, bool) {
    let types: Vec<&'t TsType> = types.collect();
    let mut members = Vec::new();
    let mut nullable = false;
    split_nullable_into(&types, &mut members, &mut nullable);
    (members, nullable)
}

fn split_nullable_into<'t>(types: &[&'t TsType], members: &mut Vec<&'t TsType>, nullable: &mut bool) {
    for &ty in types {
        match strip_parens(ty) {
            TsType::TsKeywordType(k)
                if matches!(k.kind, TsKeywordTypeKind::TsNullKeyword | TsKeywordTypeKind::TsUndefinedKeyword) =>
            {
                *nullable = true;
            }
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(inner)) => {
                let inner: Vec<&'t TsType> = inner.types.iter().map(|t| &**t).collect();
                split_nullable_into(&inner, members, nullable);
            }
            other => members.push(other),
        }
    }
}

pub fn string_literal(ty: &TsType) -> Option<String> {
    match strip_parens(ty) {
        TsType::TsLitType(lit) => match &lit.lit {
            TsLit::Str(s) => Some(s.value.to_string()),
            _ => None,
        },
        _ => None,
    }
}

fn is_string_literal(ty: &TsType) -> bool {
    string_literal(ty).is_some()
}

fn is_bool_literal(ty: &TsType) -> bool {
    matches!(strip_parens(ty), TsType::TsLitType(lit) if matches!(lit.lit, TsLit::Bool(_)))
}

/// `"a"` or `"a" | "b"`.
fn literal_keys(ty: &TsType) -> Option<Vec<String>> {
    match strip_parens(ty) {
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
            union.types.iter().map(|t| string_literal(t)).collect()
        }
        other => string_literal(other).map(|key| vec![key]),
    }
}

/// Report an unsupported construct. The returned `String` keeps downstream SDL parseable.
fn unsupported(module: &SourceModule, ty: &TsType, reason: &str, diags: &mut Vec<Diagnostic>) -> TsTypeReference {
    let message = format!("unsupported type `{}`: {reason}", module.parsed.snippet(ty.span()));
    diags.push(Diagnostic::error(DiagnosticCode::UnsupportedSyntax, message).at(Some(module.parsed.location(ty.span()))));
    TsTypeReference::primitive(Primitive::String)
}

fn unsupported_span(
    module: &SourceModule,
    span: swc_common::Span,
    message: &str,
    diags: &mut Vec<Diagnostic>,
) -> TsTypeReference {
    diags.push(Diagnostic::error(DiagnosticCode::UnsupportedSyntax, message).at(Some(module.parsed.location(span))));
    TsTypeReference::primitive(Primitive::String)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::program::Program;
    use crate::program::ProgramLoad;

    /// Classify the declared type of `Subject` in `src/subject.ts`.
    fn subject(load: &ProgramLoad) -> (TsTypeReference, Vec<Diagnostic>) {
        let program = &load.program;
        let registry = ScalarRegistry::build(program, &[]);
        let classifier = Classifier::new(program, &registry.registry);
        let module = program.module(Path::new("src/subject.ts")).unwrap();
        let decl = program.resolve_type(module.path(), "Subject").unwrap();
        let TypeDeclNode::Alias(alias) = decl.node else { panic!("Subject must be an alias") };
        let mut diags = Vec::new();
        let ts = classifier.classify(module, &alias.type_ann, &mut diags);
        (ts, diags)
    }

    fn subject_src(src: &str) -> (TsTypeReference, Vec<Diagnostic>) {
        subject(&Program::builder().scanned("src/subject.ts", src).build())
    }

    #[test]
    fn nullable_union_collapses() {
        let (ts, diags) = subject_src("type Subject = string | null | undefined;");
        assert!(diags.is_empty());
        assert_eq!(ts, TsTypeReference::primitive(Primitive::String).or_nullable(true));
    }

    #[test]
    fn nested_parenthesized_unions_flatten() {
        let (ts, diags) = subject_src("type Subject = (string | (null | (undefined | null)));");
        assert!(diags.is_empty());
        assert_eq!(ts, TsTypeReference::primitive(Primitive::String).or_nullable(true));
    }

    #[test]
    fn boolean_literal_pair_is_boolean() {
        let (ts, _) = subject_src("type Subject = true | false | null;");
        assert_eq!(ts.shape, TypeShape::Primitive(Primitive::Boolean));
        assert!(ts.nullable);
    }

    #[test]
    fn array_element_keeps_its_own_nullability() {
        let (ts, _) = subject_src("interface User { id: string }\ntype Subject = (User | null)[] | null;");
        assert!(ts.nullable);
        let TypeShape::Array(element) = &ts.shape else { panic!("expected array") };
        assert_eq!(element.named(), Some("User"));
        assert!(element.nullable);
    }

    #[test]
    fn generic_array_syntax() {
        let (ts, _) = subject_src("type Subject = ReadonlyArray<number>;");
        assert_eq!(ts, TsTypeReference::array_of(TsTypeReference::primitive(Primitive::Number)));
    }

    #[test]
    fn transparent_aliases_are_followed() {
        let (ts, _) = subject_src("type UserId = string;\ntype MaybeId = UserId | null;\ntype Subject = MaybeId;");
        assert_eq!(ts, TsTypeReference::primitive(Primitive::String).or_nullable(true));
    }

    #[test]
    fn runtime_scalars_classify_as_builtins() {
        let (ts, _) = subject_src("import type { Int } from \"@gqlkit-ts/runtime\";\ntype Subject = Int;");
        let TypeShape::Scalar(info) = ts.shape else { panic!("expected scalar") };
        assert_eq!(info.scalar_name, "Int");
        assert!(!info.custom);
    }

    #[test]
    fn declared_scalars_classify_through_aliases() {
        let load = Program::builder()
            .scanned(
                "src/subject.ts",
                "import type { DateTime } from \"./scalars\";\ntype Subject = DateTime | null;",
            )
            .support(
                "src/scalars.ts",
                "import type { DefineScalar } from \"@gqlkit-ts/runtime\";\n\
                 export type DateTime = DefineScalar<\"DateTime\", Date>;",
            )
            .build();
        let (ts, _) = subject(&load);
        assert!(ts.nullable);
        let TypeShape::Scalar(info) = ts.shape else { panic!("expected scalar") };
        assert_eq!(info.scalar_name, "DateTime");
        assert_eq!(info.base.as_deref(), Some("Date"));
    }

    #[test]
    fn intersections_inline_with_first_property_winning() {
        let (ts, _) = subject_src(
            "interface A { id: string; name: string }\n\
             type Subject = A & { name: number | null; extra: boolean };",
        );
        let TypeShape::InlineObject(fields) = ts.shape else { panic!("expected inline object") };
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "extra"]);
        assert_eq!(fields[1].ts_type.shape, TypeShape::Primitive(Primitive::String));
    }

    #[test]
    fn utility_types_inline_their_properties() {
        let (ts, _) = subject_src(
            "interface User { id: string; name: string; email: string }\n\
             type Subject = Partial<Pick<User, \"id\" | \"email\">>;",
        );
        let TypeShape::InlineObject(fields) = ts.shape else { panic!("expected inline object") };
        assert_eq!(fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), ["id", "email"]);
        assert!(fields.iter().all(|f| f.optional));
    }

    #[test]
    fn object_aliases_stay_named() {
        let (ts, _) = subject_src("type User = { id: string };\ntype Subject = User[];");
        let TypeShape::Array(element) = ts.shape else { panic!("expected array") };
        assert_eq!(element.named(), Some("User"));
    }

    #[test]
    fn unsupported_types_are_reported() {
        let (ts, diags) = subject_src("type Subject = [string, number];");
        assert_eq!(ts.shape, TypeShape::Primitive(Primitive::String));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::UnsupportedSyntax);
        assert!(diags[0].message.contains("[string, number]"));
    }

    #[test]
    fn alias_cycles_terminate() {
        let (_, diags) = subject_src("type A = B;\ntype B = A;\ntype Subject = A;");
        assert!(diags.iter().any(|d| d.code == DiagnosticCode::UnsupportedSyntax));
    }
}
