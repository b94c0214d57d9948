//! Resolver extractor.
//!
//! A resolver is an exported `const` whose initializer calls `defineQuery`,
//! `defineMutation` or `defineField`, where that function comes from destructuring
//! (or member access on) a `createGqlkitApis<Ctx>()` call, possibly one re-export
//! away. A `const` annotated with `QueryResolver` / `MutationResolver` /
//! `FieldResolver` counts as well, whatever its initializer is.
use std::collections::VecDeque;
use std::path::PathBuf;

use serde::Serialize;
use swc_ecma_ast::{Callee, Expr, MemberProp, TsType, TsUnionOrIntersectionType};
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticCode, SourceLocation};
use crate::program::{ExportBinding, Program, Resolved, SourceModule, SymbolRef, ValueDecl, RUNTIME_MODULE};
use crate::tsdoc::Deprecation;
use super::scalars::ScalarRegistry;
use super::shape::{strip_parens, Classifier, Named, TsTypeReference, TypeShape};
use super::FieldDefinition;

const API_FACTORY: &str = "createGqlkitApis";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverType {
    Query,
    Mutation,
    Field,
}

impl ResolverType {
    fn from_api(name: &str) -> Option<Self> {
        match name {
            "defineQuery" => Some(ResolverType::Query),
            "defineMutation" => Some(ResolverType::Mutation),
            "defineField" => Some(ResolverType::Field),
            _ => None,
        }
    }

    fn from_annotation(name: &str) -> Option<Self> {
        match name {
            "QueryResolver" => Some(ResolverType::Query),
            "MutationResolver" => Some(ResolverType::Mutation),
            "FieldResolver" => Some(ResolverType::Field),
            _ => None,
        }
    }

    fn api_name(&self) -> &'static str {
        match self {
            ResolverType::Query => "defineQuery",
            ResolverType::Mutation => "defineMutation",
            ResolverType::Field => "defineField",
        }
    }

    /// Type parameters before the context: `<Args, Return>` or `<Parent, Args, Return>`.
    fn arity(&self) -> usize {
        match self {
            ResolverType::Field => 3,
            _ => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtractedResolver {
    pub field_name: String,
    pub resolver_type: ResolverType,
    pub parent_type_name: Option<String>,
    pub args: Option<Vec<FieldDefinition>>,   // None for `NoArgs`
    pub return_type: TsTypeReference,
    pub exported_input_types: Vec<String>,
    pub description: Option<String>,
    pub deprecated: Option<Deprecation>,
    pub source_file: PathBuf,
    pub export_name: String,
    pub location: SourceLocation,
}

#[derive(Debug, Default)]
pub struct ExtractResolversResult {
    pub resolvers: Vec<ExtractedResolver>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn extract_resolvers(program: &Program, scalars: &ScalarRegistry) -> ExtractResolversResult {
    let extractor = ResolverExtractor { program, classifier: Classifier::new(program, scalars) };
    let mut result = ExtractResolversResult::default();
    for module in program.scanned_modules() {
        for (export_name, entry) in &module.symbols.exports {
            let ExportBinding::Local { local } = &entry.binding else { continue };
            if entry.is_default || !module.symbols.values.contains_key(local) {
                continue;
            }
            let symbol = SymbolRef { module: module.path().to_path_buf(), local: local.clone() };
            let Some(decl) = program.value_decl(&symbol) else { continue };
            if decl.destructured_key.is_some() {
                continue;
            }
            if let Some(resolver) = extractor.value(module, decl, export_name, &mut result.diagnostics) {
                result.resolvers.push(resolver);
            }
        }
    }
    debug!(
        resolvers = result.resolvers.len(),
        diagnostics = result.diagnostics.len(),
        "resolvers extracted"
    );
    result
}

struct ResolverExtractor<'p> {
    program: &'p Program,
    classifier: Classifier<'p>,
}

/// Argument properties plus the declarations they were read from.
struct ArgsShape {
    fields: Vec<FieldDefinition>,
    referenced: Vec<SymbolRef>,
}

impl<'p> ResolverExtractor<'p> {
    fn value(
        &self,
        module: &'p SourceModule,
        decl: ValueDecl<'p>,
        export_name: &str,
        diags: &mut Vec<Diagnostic>,
    ) -> Option<ExtractedResolver> {
        let location = module.parsed.location(decl.declarator.span);

        if let Some(TsType::TsTypeRef(annotation)) = decl.type_annotation().map(strip_parens) {
            if let Named::Runtime(name) = self.classifier.resolve_entity(module, &annotation.type_name) {
                if let Some(kind) = ResolverType::from_annotation(&name) {
                    let params: Vec<&TsType> = annotation
                        .type_params
                        .as_ref()
                        .map(|p| p.params.iter().map(|t| &**t).collect())
                        .unwrap_or_default();
                    return self.build(module, decl, export_name, kind, &params, location, diags);
                }
            }
        }

        let init = unwrap_expr(decl.init()?);
        match init {
            Expr::Call(call) => {
                let Callee::Expr(callee) = &call.callee else { return None };
                let kind = self.api_kind(module, callee)?;
                let params: Vec<&TsType> = call
                    .type_args
                    .as_ref()
                    .map(|p| p.params.iter().map(|t| &**t).collect())
                    .unwrap_or_default();
                if params.len() < kind.arity() {
                    let expected = if kind == ResolverType::Field { "<Parent, Args, Return>" } else { "<Args, Return>" };
                    diags.push(
                        Diagnostic::error(
                            DiagnosticCode::InvalidDefineCall,
                            format!("`{export_name}`: {} needs explicit type arguments {expected}", kind.api_name()),
                        )
                        .at(Some(location)),
                    );
                    return None;
                }
                self.build(module, decl, export_name, kind, &params, location, diags)
            }
            other => {
                if self.contains_api_call(module, other) {
                    diags.push(
                        Diagnostic::error(
                            DiagnosticCode::InvalidDefineCall,
                            format!(
                                "`{export_name}` must be initialized by a direct define call; \
                                 conditional or computed definitions cannot be analyzed"
                            ),
                        )
                        .at(Some(location)),
                    );
                }
                None
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        module: &'p SourceModule,
        decl: ValueDecl<'p>,
        export_name: &str,
        kind: ResolverType,
        params: &[&TsType],
        location: SourceLocation,
        diags: &mut Vec<Diagnostic>,
    ) -> Option<ExtractedResolver> {
        if params.len() < kind.arity() {
            diags.push(
                Diagnostic::error(
                    DiagnosticCode::InvalidDefineCall,
                    format!("`{export_name}`: resolver type annotation is missing type arguments"),
                )
                .at(Some(location)),
            );
            return None;
        }
        let (parent_type_name, args_ty, return_ty) = match kind {
            ResolverType::Field => {
                let parent = self.classifier.classify(module, params[0], diags);
                match parent.shape {
                    TypeShape::Reference(name) => (Some(name), params[1], params[2]),
                    _ => {
                        diags.push(
                            Diagnostic::error(
                                DiagnosticCode::InvalidDefineCall,
                                format!("`{export_name}`: the parent of a field resolver must be a named object type"),
                            )
                            .at(Some(location)),
                        );
                        return None;
                    }
                }
            }
            _ => (None, params[0], params[1]),
        };

        let args = self.args(module, args_ty, export_name, diags);
        let return_type = self.classifier.classify(module, return_ty, diags);
        let exported_input_types = args
            .as_ref()
            .map(|shape| {
                shape
                    .referenced
                    .iter()
                    .filter(|symbol| symbol.module == module.path() && exports_local(module, &symbol.local))
                    .map(|symbol| symbol.local.clone())
                    .collect()
            })
            .unwrap_or_default();
        let doc = module.parsed.doc_at_any(&[decl.item_lo, decl.declarator.span.lo]);

        Some(ExtractedResolver {
            field_name: export_name.to_string(),
            resolver_type: kind,
            parent_type_name,
            args: args.map(|shape| shape.fields).filter(|fields| !fields.is_empty()),
            return_type,
            exported_input_types,
            description: doc.description,
            deprecated: doc.deprecated,
            source_file: module.path().to_path_buf(),
            export_name: export_name.to_string(),
            location,
        })
    }

    /// `None` means the resolver takes no arguments.
    fn args(
        &self,
        module: &'p SourceModule,
        ty: &TsType,
        export_name: &str,
        diags: &mut Vec<Diagnostic>,
    ) -> Option<ArgsShape> {
        let ty = strip_parens(ty);
        if self.classifier.is_runtime_ref(module, ty, "NoArgs") {
            return None;
        }
        let mut inline: Vec<FieldDefinition> = Vec::new();
        let mut referenced: Vec<FieldDefinition> = Vec::new();
        let mut shape = ArgsShape { fields: Vec::new(), referenced: Vec::new() };
        for member in flatten_intersection(ty) {
            match member {
                TsType::TsTypeLit(lit) => {
                    let fields = self.classifier.member_fields(module, &lit.members, diags, 0);
                    merge_first(&mut shape.fields, fields.iter().cloned());
                    inline.extend(fields);
                }
                TsType::TsTypeRef(type_ref) => {
                    if let Named::Decl(decl) = self.classifier.resolve_entity(module, &type_ref.type_name) {
                        shape.referenced.push(decl.symbol());
                    }
                    let props = self.classifier.type_properties(module, member, diags, 0);
                    referenced.extend(props.fields.iter().cloned());
                    merge_first(&mut shape.fields, props.fields);
                }
                other => {
                    diags.push(
                        Diagnostic::error(
                            DiagnosticCode::UnsupportedSyntax,
                            format!(
                                "`{export_name}`: arguments must be an object type, found `{}`",
                                module.parsed.snippet(swc_common::Spanned::span(other))
                            ),
                        )
                        .at(Some(module.parsed.location(swc_common::Spanned::span(other)))),
                    );
                    return None;
                }
            }
        }
        // Inline literal docs layer over the referenced declaration's.
        for field in &mut shape.fields {
            let Some(own) = inline.iter().find(|f| f.name == field.name) else { continue };
            let fallback = referenced.iter().find(|f| f.name == field.name);
            field.description = own.description.clone().or_else(|| fallback.and_then(|f| f.description.clone()));
            field.deprecated = own.deprecated.clone().or_else(|| fallback.and_then(|f| f.deprecated.clone()));
        }
        Some(shape)
    }

    // ------------------------- API detection ------------------------------ //

    fn api_kind(&self, module: &SourceModule, callee: &Expr) -> Option<ResolverType> {
        match unwrap_expr(callee) {
            Expr::Ident(ident) => match self.program.resolve_name(module.path(), &ident.sym)? {
                Resolved::Local(symbol) => self.api_binding(&symbol),
                _ => None,
            },
            Expr::Member(member) => {
                let MemberProp::Ident(prop) = &member.prop else { return None };
                let Expr::Ident(object) = unwrap_expr(&member.obj) else { return None };
                match self.program.resolve_name(module.path(), &object.sym)? {
                    // `api.defineQuery` where `const api = createGqlkitApis()`
                    Resolved::Local(symbol) => {
                        let kind = ResolverType::from_api(&prop.sym)?;
                        let decl = self.program.value_decl(&symbol)?;
                        (decl.destructured_key.is_none() && self.is_api_factory(decl.module, decl.init()?))
                            .then_some(kind)
                    }
                    Resolved::Namespace(path) => {
                        let target = self.program.module(&path)?;
                        match self.program.resolve_export(target, &prop.sym, 0)? {
                            Resolved::Local(symbol) => self.api_binding(&symbol),
                            _ => None,
                        }
                    }
                    Resolved::External { .. } => None,
                }
            }
            _ => None,
        }
    }

    /// `const { defineQuery: q } = createGqlkitApis<Ctx>()` binds `q` to `defineQuery`.
    fn api_binding(&self, symbol: &SymbolRef) -> Option<ResolverType> {
        let decl = self.program.value_decl(symbol)?;
        let kind = ResolverType::from_api(decl.destructured_key?)?;
        self.is_api_factory(decl.module, decl.init()?).then_some(kind)
    }

    fn is_api_factory(&self, module: &SourceModule, init: &Expr) -> bool {
        let Expr::Call(call) = unwrap_expr(init) else { return false };
        let Callee::Expr(callee) = &call.callee else { return false };
        let Expr::Ident(ident) = unwrap_expr(callee) else { return false };
        match self.program.resolve_name(module.path(), &ident.sym) {
            Some(Resolved::External { specifier, name }) => specifier == RUNTIME_MODULE && name == API_FACTORY,
            Some(_) => false,
            None => &*ident.sym == API_FACTORY,
        }
    }

    /// A define call hidden inside a conditional, logical or sequence expression.
    fn contains_api_call(&self, module: &SourceModule, expr: &Expr) -> bool {
        match unwrap_expr(expr) {
            Expr::Call(call) => match &call.callee {
                Callee::Expr(callee) => self.api_kind(module, callee).is_some(),
                _ => false,
            },
            Expr::Cond(cond) => {
                self.contains_api_call(module, &cond.cons) || self.contains_api_call(module, &cond.alt)
            }
            Expr::Bin(bin) => self.contains_api_call(module, &bin.left) || self.contains_api_call(module, &bin.right),
            Expr::Seq(seq) => seq.exprs.iter().any(|e| self.contains_api_call(module, e)),
            _ => false,
        }
    }
}

fn unwrap_expr(mut expr: &Expr) -> &Expr {
    loop {
        expr = match expr {
            Expr::Paren(paren) => &paren.expr,
            Expr::TsAs(cast) => &cast.expr,
            Expr::TsSatisfies(sat) => &sat.expr,
            Expr::TsNonNull(non_null) => &non_null.expr,
            _ => return expr,
        };
    }
}

fn flatten_intersection(ty: &TsType) -> Vec<&TsType> {
    let mut out = Vec::new();
    let mut queue = VecDeque::from([ty]);
    while let Some(ty) = queue.pop_front() {
        match strip_parens(ty) {
            TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsIntersectionType(inter)) => {
                queue.extend(inter.types.iter().map(|t| &**t));
            }
            other => out.push(other),
        }
    }
    out
}

fn merge_first(into: &mut Vec<FieldDefinition>, fields: impl IntoIterator<Item = FieldDefinition>) {
    for field in fields {
        if !into.iter().any(|f| f.name == field.name) {
            into.push(field);
        }
    }
}

fn exports_local(module: &SourceModule, local: &str) -> bool {
    module
        .symbols
        .exports
        .values()
        .any(|entry| matches!(&entry.binding, ExportBinding::Local { local: l } if l == local))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::shape::Primitive;
    use crate::program::ProgramBuilder;

    const GQLKIT: &str = "import { createGqlkitApis } from \"@gqlkit-ts/runtime\";\n\
                          type Context = { userId: string };\n\
                          export const { defineQuery, defineMutation, defineField } = createGqlkitApis<Context>();\n";

    fn with_api(builder: ProgramBuilder) -> ProgramBuilder {
        builder.support("src/gqlkit.ts", GQLKIT).support(
            "src/types.ts",
            "export interface User { id: string; name: string }\n",
        )
    }

    fn run(builder: ProgramBuilder) -> ExtractResolversResult {
        let load = builder.build();
        assert!(load.diagnostics.is_empty());
        let registry = ScalarRegistry::build(&load.program, &[]);
        extract_resolvers(&load.program, &registry.registry)
    }

    fn run_src(src: &str) -> ExtractResolversResult {
        run(with_api(Program::builder()).scanned("src/resolvers/query.ts", src))
    }

    #[test]
    fn query_with_no_args() {
        let result = run_src(
            "import { defineQuery } from \"../gqlkit\";\n\
             import type { NoArgs } from \"@gqlkit-ts/runtime\";\n\
             import type { User } from \"../types\";\n\
             /** Every user. */\n\
             export const users = defineQuery<NoArgs, User[]>(() => []);\n",
        );
        assert!(result.diagnostics.is_empty());
        let users = &result.resolvers[0];
        assert_eq!(users.field_name, "users");
        assert_eq!(users.resolver_type, ResolverType::Query);
        assert!(users.args.is_none());
        assert_eq!(users.description.as_deref(), Some("Every user."));
        let TypeShape::Array(element) = &users.return_type.shape else { panic!("expected list") };
        assert_eq!(element.named(), Some("User"));
        assert!(!element.nullable && !users.return_type.nullable);
    }

    #[test]
    fn renamed_destructuring_and_member_calls() {
        let load = Program::builder()
            .support(
                "src/gqlkit.ts",
                "import { createGqlkitApis } from \"@gqlkit-ts/runtime\";\n\
                 export const { defineQuery: query } = createGqlkitApis();\n\
                 export const api = createGqlkitApis();\n",
            )
            .scanned(
                "src/resolvers.ts",
                "import { query, api } from \"./gqlkit\";\n\
                 import * as gql from \"./gqlkit\";\n\
                 export const one = query<{}, string>(() => \"\");\n\
                 export const two = api.defineMutation<{ id: string }, boolean>(() => true);\n\
                 export const three = gql.query<{}, number>(() => 1);\n",
            );
        let result = run(load);
        assert!(result.diagnostics.is_empty());
        let kinds: Vec<_> = result.resolvers.iter().map(|r| (r.field_name.as_str(), r.resolver_type)).collect();
        assert_eq!(
            kinds,
            [("one", ResolverType::Query), ("two", ResolverType::Mutation), ("three", ResolverType::Query)]
        );
        assert!(result.resolvers[0].args.is_none());
        assert_eq!(result.resolvers[1].args.as_ref().unwrap()[0].name, "id");
    }

    #[test]
    fn define_functions_reexported_once_are_followed() {
        let result = run(
            with_api(Program::builder())
                .support("src/api.ts", "export { defineField as field } from \"./gqlkit\";\n")
                .scanned(
                    "src/resolvers/user.ts",
                    "import { field } from \"../api\";\n\
                     import type { User } from \"../types\";\n\
                     export const displayName = field<User, {}, string | null>((u) => u.name);\n",
                ),
        );
        let display = &result.resolvers[0];
        assert_eq!(display.resolver_type, ResolverType::Field);
        assert_eq!(display.parent_type_name.as_deref(), Some("User"));
        assert!(display.return_type.nullable);
    }

    #[test]
    fn annotation_identifies_resolvers() {
        let result = run_src(
            "import type { QueryResolver, NoArgs } from \"@gqlkit-ts/runtime\";\n\
             import type { User } from \"../types\";\n\
             export const me: QueryResolver<NoArgs, User | null> = makeResolver();\n",
        );
        assert_eq!(result.resolvers.len(), 1);
        assert_eq!(result.resolvers[0].return_type.named(), Some("User"));
    }

    #[test]
    fn conditional_definitions_are_rejected() {
        let result = run_src(
            "import { defineQuery } from \"../gqlkit\";\n\
             export const pick = flag ? defineQuery<{}, string>(() => \"a\") : defineQuery<{}, string>(() => \"b\");\n\
             export const constant = 42;\n\
             export function helper() {}\n",
        );
        assert!(result.resolvers.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::InvalidDefineCall);
        assert!(result.diagnostics[0].message.contains("pick"));
    }

    #[test]
    fn missing_type_arguments_are_rejected() {
        let result = run_src(
            "import { defineQuery } from \"../gqlkit\";\nexport const bad = defineQuery(() => 1);\n",
        );
        assert!(result.resolvers.is_empty());
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::InvalidDefineCall);
    }

    #[test]
    fn inline_argument_docs_override_referenced_docs() {
        let result = run_src(
            "import { defineQuery } from \"../gqlkit\";\n\
             import type { User } from \"../types\";\n\
             export interface UserFilterInput {\n  /** From the type. */\n  name: string;\n  /** Limit. */\n  limit?: number;\n}\n\
             export const search = defineQuery<UserFilterInput & {\n  /** From the call. */\n  name: string;\n}, User[]>(() => []);\n",
        );
        let search = &result.resolvers[0];
        let args = search.args.as_ref().unwrap();
        assert_eq!(args.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(), ["name", "limit"]);
        assert_eq!(args[0].description.as_deref(), Some("From the call."));
        assert_eq!(args[1].description.as_deref(), Some("Limit."));
        assert!(args[1].optional);
        assert_eq!(args[1].ts_type.shape, TypeShape::Primitive(Primitive::Number));
        assert_eq!(search.exported_input_types, ["UserFilterInput"]);
    }

    #[test]
    fn undocumented_inline_arguments_keep_referenced_docs() {
        let result = run_src(
            "import { defineQuery } from \"../gqlkit\";\n\
             export interface FilterArgs {\n  /** Referenced limit. */\n  limit: number;\n  /** Referenced offset. */\n  offset: number;\n  /** @deprecated use cursor */\n  page?: number;\n}\n\
             export const plain = defineQuery<{\n  limit: number;\n  page?: number;\n} & FilterArgs, string>(() => \"\");\n\
             export const sameLine = defineQuery<{ /** Inline limit. */ limit: number } & FilterArgs, string>(() => \"\");\n",
        );
        assert!(result.diagnostics.is_empty());
        let describe = |index: usize| -> Vec<(String, Option<String>)> {
            let args = result.resolvers[index].args.as_ref().unwrap();
            args.iter().map(|a| (a.name.clone(), a.description.clone())).collect()
        };

        let plain = describe(0);
        assert_eq!(plain[0], ("limit".to_string(), Some("Referenced limit.".to_string())));
        assert!(plain.contains(&("offset".to_string(), Some("Referenced offset.".to_string()))));
        let page = result.resolvers[0].args.as_ref().unwrap().iter().find(|a| a.name == "page").unwrap();
        assert_eq!(page.deprecated.as_ref().and_then(|d| d.reason.as_deref()), Some("use cursor"));

        let same_line = describe(1);
        assert_eq!(same_line[0], ("limit".to_string(), Some("Inline limit.".to_string())));
    }
}
