//! Type extractor: every exported interface, type alias and enum of the scanned
//! modules becomes one [`ExtractedTypeInfo`].
use std::collections::HashSet;

use swc_common::Spanned;
use swc_ecma_ast::{Expr, Lit, TsEnumDecl, TsEnumMemberId, TsType, TsUnionOrIntersectionType};
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticCode};
use crate::program::{is_relative, ExportBinding, Program, Resolved, SourceModule, SymbolRef, TypeDecl, TypeDeclNode};
use super::scalars::ScalarRegistry;
use super::shape::{split_nullable, string_literal, strip_parens, AliasKind, Classifier, Named};
use super::{EnumMemberInfo, ExportKind, ExtractedTypeInfo, TypeKind, TypeMetadata};

#[derive(Debug, Default)]
pub struct ExtractTypesResult {
    pub types: Vec<ExtractedTypeInfo>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn extract_types(program: &Program, scalars: &ScalarRegistry) -> ExtractTypesResult {
    let mut extractor = TypeExtractor {
        program,
        classifier: Classifier::new(program, scalars),
        seen: HashSet::new(),
        result: ExtractTypesResult::default(),
    };
    for module in program.scanned_modules() {
        extractor.module(module);
    }
    debug!(
        types = extractor.result.types.len(),
        diagnostics = extractor.result.diagnostics.len(),
        "types extracted"
    );
    extractor.result
}

struct TypeExtractor<'p> {
    program: &'p Program,
    classifier: Classifier<'p>,
    seen: HashSet<SymbolRef>,
    result: ExtractTypesResult,
}

impl<'p> TypeExtractor<'p> {
    fn module(&mut self, module: &'p SourceModule) {
        for entry in module.symbols.exports.values() {
            let export_kind = if entry.is_default { ExportKind::Default } else { ExportKind::Named };
            match &entry.binding {
                ExportBinding::Local { local } => {
                    let symbol = SymbolRef { module: module.path().to_path_buf(), local: local.clone() };
                    if let Some(decl) = self.program.type_decl(&symbol) {
                        self.declaration(decl, export_kind);
                    } else if module.symbols.imports.contains_key(local) {
                        // `import { X } from "./x"; export { X };`
                        if let Some(Resolved::Local(target)) = self.program.resolve_name(module.path(), local) {
                            self.reexported(&target, export_kind);
                        }
                    }
                }
                ExportBinding::ReExport { specifier, name } => {
                    if !is_relative(specifier) {
                        continue;
                    }
                    let Some(target) = self.program.resolve_module(module.path(), specifier) else {
                        self.result.diagnostics.push(
                            Diagnostic::error(
                                DiagnosticCode::ModuleResolutionError,
                                format!("cannot resolve module \"{specifier}\" re-exported from {}", module.path().display()),
                            )
                            .at(Some(entry.location.clone())),
                        );
                        continue;
                    };
                    match self.program.resolve_export(target, name, 0) {
                        Some(Resolved::Local(symbol)) => self.reexported(&symbol, export_kind),
                        _ => debug!(%specifier, %name, "re-export does not resolve to a local declaration"),
                    }
                }
            }
        }

        for star in &module.symbols.star_exports {
            if !is_relative(&star.specifier) {
                continue;
            }
            let Some(target) = self.program.resolve_module(module.path(), &star.specifier) else {
                self.result.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::ModuleResolutionError,
                        format!("cannot resolve module \"{}\" re-exported from {}", star.specifier, module.path().display()),
                    )
                    .at(Some(star.location.clone())),
                );
                continue;
            };
            if target.scanned {
                continue;
            }
            for (name, entry) in &target.symbols.exports {
                if name == "default" {
                    continue;
                }
                if let ExportBinding::Local { local } = &entry.binding {
                    let symbol = SymbolRef { module: target.path().to_path_buf(), local: local.clone() };
                    self.reexported(&symbol, ExportKind::Named);
                }
            }
        }
    }

    /// Declarations living in scanned modules are picked up there.
    fn reexported(&mut self, symbol: &SymbolRef, export_kind: ExportKind) {
        if self.program.is_scanned(&symbol.module) {
            return;
        }
        if let Some(decl) = self.program.type_decl(symbol) {
            self.declaration(decl, export_kind);
        }
    }

    fn declaration(&mut self, decl: TypeDecl<'p>, export_kind: ExportKind) {
        if !self.seen.insert(decl.symbol()) {
            return;
        }
        let module = decl.module;
        let (node_span, generic) = match decl.node {
            TypeDeclNode::Interface(iface) => (iface.span, iface.type_params.is_some()),
            TypeDeclNode::Alias(alias) => (alias.span, alias.type_params.is_some()),
            TypeDeclNode::Enum(e) => (e.span, false),
        };
        let kind = match decl.node {
            TypeDeclNode::Interface(_) => Some(TypeKind::Interface),
            TypeDeclNode::Enum(_) => Some(TypeKind::Enum),
            TypeDeclNode::Alias(_) => match self.classifier.alias_kind(&decl, 0) {
                AliasKind::Object => Some(TypeKind::Object),
                AliasKind::GraphqlInterface => Some(TypeKind::GraphqlInterface),
                AliasKind::Enum => Some(TypeKind::Enum),
                AliasKind::Union => Some(TypeKind::Union),
                AliasKind::Scalar | AliasKind::Transparent => None,
            },
        };
        let Some(kind) = kind else {
            debug!(name = decl.name, "alias is not a GraphQL type of its own");
            return;
        };

        let location = module.parsed.location(node_span);
        if generic {
            self.result.diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::UnsupportedSyntax,
                    format!("generic type parameters on `{}` are not supported; they are ignored", decl.name),
                )
                .at(Some(location.clone())),
            );
        }

        let doc = module.parsed.doc_at_any(&[decl.item_lo, node_span.lo]);
        let mut info = ExtractedTypeInfo::new(TypeMetadata {
            name: decl.name.to_string(),
            kind,
            source_file: module.path().to_path_buf(),
            location,
            export_kind,
            description: doc.description,
            deprecated: doc.deprecated,
        });

        let diags = &mut self.result.diagnostics;
        match (decl.node, kind) {
            (TypeDeclNode::Enum(e), _) => match enum_members(module, e, diags) {
                Some(members) => info.enum_members = members,
                None => return,
            },
            (TypeDeclNode::Alias(alias), TypeKind::Enum) => {
                let (members, _) = split_nullable(union_types(&alias.type_ann));
                for literal in members.into_iter().filter_map(string_literal) {
                    if !info.enum_members.iter().any(|m| m.value == literal) {
                        info.enum_members.push(EnumMemberInfo {
                            name: literal.clone(),
                            value: literal,
                            description: None,
                            deprecated: None,
                        });
                    }
                }
            }
            (TypeDeclNode::Alias(alias), TypeKind::Union) => {
                let (members, _) = split_nullable(union_types(&alias.type_ann));
                for member in members {
                    match member {
                        TsType::TsTypeLit(lit) => {
                            let fields = self.classifier.member_fields(module, &lit.members, diags, 0);
                            info.inline_object_members.push(fields);
                        }
                        TsType::TsTypeRef(type_ref) => {
                            let name = match self.classifier.resolve_entity(module, &type_ref.type_name) {
                                Named::Decl(target) => target.name.to_string(),
                                Named::Runtime(name) | Named::Unknown(name) | Named::External { name, .. } => name,
                            };
                            info.union_members.push(name);
                        }
                        other => diags.push(
                            Diagnostic::error(
                                DiagnosticCode::UnsupportedSyntax,
                                format!(
                                    "union `{}` member `{}` must be a named type or an object literal",
                                    decl.name,
                                    module.parsed.snippet(other.span())
                                ),
                            )
                            .at(Some(module.parsed.location(other.span()))),
                        ),
                    }
                }
                if !info.union_members.is_empty() && !info.inline_object_members.is_empty() {
                    diags.push(
                        Diagnostic::error(
                            DiagnosticCode::UnsupportedSyntax,
                            format!("union `{}` mixes named types and object literals", decl.name),
                        )
                        .at(Some(info.metadata.location.clone())),
                    );
                }
                info.union_members.sort();
                info.union_members.dedup();
            }
            _ => {
                let props = self.classifier.decl_properties(&decl, diags, 0);
                info.fields = props.fields;
                info.implemented_interfaces = props.interfaces;
            }
        }
        self.result.types.push(info);
    }
}

fn union_types(ty: &TsType) -> impl Iterator<Item = &TsType> {
    let types: Vec<&TsType> = match strip_parens(ty) {
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
            union.types.iter().map(|t| &**t).collect()
        }
        other => vec![other],
    };
    types.into_iter()
}

enum MemberValue {
    Str(String),
    Numeric,
    Computed,
}

/// String-valued enums only; const, numeric, mixed and computed enums are dropped.
fn enum_members(module: &SourceModule, e: &TsEnumDecl, diags: &mut Vec<Diagnostic>) -> Option<Vec<EnumMemberInfo>> {
    let name = e.id.sym.to_string();
    let reject = |diags: &mut Vec<Diagnostic>, why: &str| {
        diags.push(
            Diagnostic::error(
                DiagnosticCode::UnsupportedEnumType,
                format!("enum `{name}` is a {why}; only string-valued enums are supported"),
            )
            .at(Some(module.parsed.location(e.span))),
        );
    };
    if e.is_const {
        reject(diags, "const enum");
        return None;
    }

    let mut members = Vec::new();
    let (mut strings, mut numbers, mut computed) = (0, 0, 0);
    for member in &e.members {
        let member_name = match &member.id {
            TsEnumMemberId::Ident(ident) => ident.sym.to_string(),
            TsEnumMemberId::Str(s) => s.value.to_string(),
        };
        let value = match member.init.as_deref() {
            None | Some(Expr::Lit(Lit::Num(_))) | Some(Expr::Unary(_)) => MemberValue::Numeric,
            Some(Expr::Lit(Lit::Str(s))) => MemberValue::Str(s.value.to_string()),
            Some(Expr::Tpl(tpl)) if tpl.exprs.is_empty() => {
                MemberValue::Str(tpl.quasis.iter().map(|q| q.raw.to_string()).collect())
            }
            Some(_) => MemberValue::Computed,
        };
        match value {
            MemberValue::Str(value) => {
                strings += 1;
                let doc = module.parsed.doc_at(member.span.lo);
                members.push(EnumMemberInfo {
                    name: member_name,
                    value,
                    description: doc.description,
                    deprecated: doc.deprecated,
                });
            }
            MemberValue::Numeric => numbers += 1,
            MemberValue::Computed => computed += 1,
        }
    }

    match (strings, numbers, computed) {
        (_, 0, 0) => Some(members),
        (0, _, 0) => {
            reject(diags, "numeric enum");
            None
        }
        (_, _, 0) => {
            reject(diags, "heterogeneous enum");
            None
        }
        _ => {
            reject(diags, "enum with computed members");
            None
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::shape::{Primitive, TypeShape};
    use crate::program::ProgramLoad;

    fn extract(load: &ProgramLoad) -> ExtractTypesResult {
        let registry = ScalarRegistry::build(&load.program, &[]);
        extract_types(&load.program, &registry.registry)
    }

    fn extract_src(src: &str) -> ExtractTypesResult {
        extract(&Program::builder().scanned("src/types.ts", src).build())
    }

    #[test]
    fn plain_interface() {
        let result = extract_src("export interface User { id: string; name: string }");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.types.len(), 1);
        let user = &result.types[0];
        assert_eq!(user.metadata.kind, TypeKind::Interface);
        assert_eq!(user.fields.len(), 2);
        for field in &user.fields {
            assert_eq!(field.ts_type.shape, TypeShape::Primitive(Primitive::String));
            assert!(!field.ts_type.nullable && !field.optional);
        }
    }

    #[test]
    fn unexported_and_primitive_aliases_are_skipped() {
        let result = extract_src("interface Hidden { x: string }\nexport type Id = string;\nexport type Ids = Id[];");
        assert!(result.types.is_empty());
    }

    #[test]
    fn docs_and_deprecation_are_read() {
        let result = extract_src(
            "/** A person. */\nexport interface User {\n  /** @deprecated Use `handle`. */\n  name: string;\n}",
        );
        let user = &result.types[0];
        assert_eq!(user.metadata.description.as_deref(), Some("A person."));
        let deprecated = user.fields[0].deprecated.as_ref().unwrap();
        assert_eq!(deprecated.reason.as_deref(), Some("Use `handle`."));
    }

    #[test]
    fn string_literal_unions_become_enums_in_declaration_order() {
        let result = extract_src("export type Status = \"pending\" | \"active\" | \"pending\" | \"archived\";");
        let status = &result.types[0];
        assert_eq!(status.metadata.kind, TypeKind::Enum);
        let values: Vec<_> = status.enum_members.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, ["pending", "active", "archived"]);
    }

    #[test]
    fn string_enums_are_extracted_with_member_docs() {
        let result = extract_src("export enum Role {\n  /** Full access. */\n  Admin = \"admin\",\n  Guest = \"guest\",\n}");
        let role = &result.types[0];
        assert_eq!(role.enum_members.len(), 2);
        assert_eq!(role.enum_members[0].name, "Admin");
        assert_eq!(role.enum_members[0].value, "admin");
        assert_eq!(role.enum_members[0].description.as_deref(), Some("Full access."));
    }

    #[test]
    fn const_numeric_and_mixed_enums_are_dropped() {
        let result = extract_src(
            "export const enum A { X = \"x\" }\n\
             export enum B { X, Y }\n\
             export enum C { X = \"x\", Y = 1 }\n",
        );
        assert!(result.types.is_empty());
        assert_eq!(result.diagnostics.len(), 3);
        assert!(result.diagnostics.iter().all(|d| d.code == DiagnosticCode::UnsupportedEnumType && d.is_error()));
        assert!(result.diagnostics[1].message.contains("numeric"));
        assert!(result.diagnostics[2].message.contains("heterogeneous"));
    }

    #[test]
    fn object_unions_sort_members() {
        let result = extract_src(
            "export interface Post { id: string }\nexport interface Comment { id: string }\n\
             export type SearchResult = Post | Comment | null;",
        );
        let union = result.types.iter().find(|t| t.name() == "SearchResult").unwrap();
        assert_eq!(union.metadata.kind, TypeKind::Union);
        assert_eq!(union.union_members, ["Comment", "Post"]);
    }

    #[test]
    fn inline_literal_unions_keep_their_members() {
        let result = extract_src("export type ContactInput = { email: string } | { phone: string };");
        let contact = &result.types[0];
        assert_eq!(contact.metadata.kind, TypeKind::Union);
        assert_eq!(contact.inline_object_members.len(), 2);
        assert_eq!(contact.inline_object_members[1][0].name, "phone");
    }

    #[test]
    fn interfaces_inherit_and_record_graphql_interfaces() {
        let result = extract_src(
            "import type { DefineInterface, IDString } from \"@gqlkit-ts/runtime\";\n\
             export type Node = DefineInterface<{ id: IDString }>;\n\
             export interface User extends Node { name: string }\n\
             export type Post = Node & { title: string };\n",
        );
        let node = &result.types[0];
        assert_eq!(node.metadata.kind, TypeKind::GraphqlInterface);
        assert_eq!(node.fields.len(), 1);
        let user = &result.types[1];
        assert_eq!(user.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), ["name", "id"]);
        assert_eq!(user.implemented_interfaces, ["Node"]);
        let post = &result.types[2];
        assert_eq!(post.metadata.kind, TypeKind::Object);
        assert_eq!(post.implemented_interfaces, ["Node"]);
        assert_eq!(post.fields[0].name, "id");
    }

    #[test]
    fn generics_warn_but_still_extract() {
        let result = extract_src("export interface Box<T> { id: string }");
        assert_eq!(result.types.len(), 1);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(!result.diagnostics[0].is_error());
    }

    #[test]
    fn scalar_aliases_are_not_types() {
        let result = extract_src(
            "import type { DefineScalar } from \"@gqlkit-ts/runtime\";\n\
             export type DateTime = DefineScalar<\"DateTime\", Date>;\n\
             export interface Event { at: DateTime }\n",
        );
        assert_eq!(result.types.len(), 1);
        let TypeShape::Scalar(info) = &result.types[0].fields[0].ts_type.shape else {
            panic!("expected scalar field");
        };
        assert_eq!(info.scalar_name, "DateTime");
    }

    #[test]
    fn reexports_from_unscanned_modules_are_extracted_once() {
        let load = Program::builder()
            .scanned(
                "src/gqlkit/types.ts",
                "export type { Shared } from \"../shared\";\nexport * from \"../more\";\nexport * from \"./user\";\n",
            )
            .scanned("src/gqlkit/user.ts", "export interface User { id: string }\n")
            .support("src/shared.ts", "export interface Shared { id: string }\n")
            .support("src/more.ts", "export interface More { id: string }\nexport type { Shared } from \"./shared\";\n")
            .build();
        let result = extract(&load);
        let names: Vec<_> = result.types.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["Shared", "More", "User"]);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn renamed_reexport_keeps_the_declared_name() {
        let load = Program::builder()
            .scanned("src/gqlkit/types.ts", "export type { Inner as Outer } from \"../other/inner\";\n")
            .support("src/other/inner.ts", "export interface Inner { id: string }\n")
            .build();
        let result = extract(&load);
        assert!(result.diagnostics.is_empty());
        let names: Vec<_> = result.types.iter().map(|t| t.name()).collect();
        assert_eq!(names, ["Inner"]);
        assert_eq!(result.types[0].metadata.source_file, std::path::PathBuf::from("src/other/inner.ts"));
    }

    #[test]
    fn unresolvable_reexport_module_is_reported() {
        let result = extract_src("export type { Gone } from \"./gone\";\nexport * from \"./missing\";");
        assert_eq!(result.diagnostics.len(), 2);
        assert!(result.diagnostics.iter().all(|d| d.code == DiagnosticCode::ModuleResolutionError));
    }

    #[test]
    fn default_exports_are_marked() {
        let result = extract_src("export default interface Config { debug: boolean }");
        assert_eq!(result.types[0].metadata.export_kind, ExportKind::Default);
        assert_eq!(result.types[0].name(), "Config");
    }
}
