//! Per-module symbol tables: what a file declares, imports and exports.
use indexmap::IndexMap;
use swc_common::Spanned;
use swc_ecma_ast::{
    Decl, DefaultDecl, ExportSpecifier, ImportSpecifier, ModuleDecl, ModuleExportName, ModuleItem,
    ObjectPatProp, Pat, PropName, Stmt,
};

use crate::diagnostics::SourceLocation;
use super::parse::ParsedModule;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeDeclKind {
    Interface,
    TypeAlias,
    Enum,
}

/// Where a type declaration lives inside `module.body`.
#[derive(Clone, Debug)]
pub struct TypeDeclSite {
    pub item: usize,
    pub kind: TypeDeclKind,
}

#[derive(Clone, Debug)]
pub enum ValueSite {
    /// `const name = init`
    Plain { item: usize, declarator: usize },
    /// `const { key: name } = init`
    Destructured { item: usize, declarator: usize, key: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Imported {
    Named(String),
    Default,
    Namespace,
}

#[derive(Clone, Debug)]
pub struct ImportBinding {
    pub specifier: String,
    pub imported: Imported,
}

#[derive(Clone, Debug)]
pub enum ExportBinding {
    /// Exported under some name from a local binding (declaration, value or import).
    Local { local: String },
    /// `export { name as exported } from "specifier"`
    ReExport { specifier: String, name: String },
}

#[derive(Clone, Debug)]
pub struct ExportEntry {
    pub binding: ExportBinding,
    pub is_default: bool,
    pub location: SourceLocation,
}

#[derive(Clone, Debug)]
pub struct StarExport {
    pub specifier: String,
    pub location: SourceLocation,
}

#[derive(Clone, Debug, Default)]
pub struct ModuleSymbols {
    pub type_decls: IndexMap<String, TypeDeclSite>,
    pub values: IndexMap<String, ValueSite>,
    pub imports: IndexMap<String, ImportBinding>,
    pub exports: IndexMap<String, ExportEntry>,
    pub star_exports: Vec<StarExport>,
}

impl ModuleSymbols {
    pub fn build(parsed: &ParsedModule) -> Self {
        let mut symbols = Self::default();
        for (item_idx, item) in parsed.module.body.iter().enumerate() {
            match item {
                ModuleItem::Stmt(Stmt::Decl(decl)) => {
                    symbols.add_decl(item_idx, decl);
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    let location = parsed.location(export.span);
                    for name in symbols.add_decl(item_idx, &export.decl) {
                        symbols.exports.insert(name.clone(), ExportEntry {
                            binding: ExportBinding::Local { local: name },
                            is_default: false,
                            location: location.clone(),
                        });
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                    if let DefaultDecl::TsInterfaceDecl(iface) = &export.decl {
                        let name = iface.id.sym.to_string();
                        symbols.type_decls.insert(name.clone(), TypeDeclSite {
                            item: item_idx,
                            kind: TypeDeclKind::Interface,
                        });
                        symbols.exports.insert("default".to_string(), ExportEntry {
                            binding: ExportBinding::Local { local: name },
                            is_default: true,
                            location: parsed.location(export.span),
                        });
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => {
                    if let swc_ecma_ast::Expr::Ident(ident) = &*export.expr {
                        symbols.exports.insert("default".to_string(), ExportEntry {
                            binding: ExportBinding::Local { local: ident.sym.to_string() },
                            is_default: true,
                            location: parsed.location(export.span),
                        });
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                    let specifier = import.src.value.to_string();
                    for spec in &import.specifiers {
                        let (local, imported) = match spec {
                            ImportSpecifier::Named(named) => {
                                let local = named.local.sym.to_string();
                                let imported = named
                                    .imported
                                    .as_ref()
                                    .map(export_name)
                                    .unwrap_or_else(|| local.clone());
                                (local, Imported::Named(imported))
                            }
                            ImportSpecifier::Default(default) => {
                                (default.local.sym.to_string(), Imported::Default)
                            }
                            ImportSpecifier::Namespace(ns) => {
                                (ns.local.sym.to_string(), Imported::Namespace)
                            }
                        };
                        symbols.imports.insert(local, ImportBinding {
                            specifier: specifier.clone(),
                            imported,
                        });
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) => {
                    let location = parsed.location(named.span);
                    let source = named.src.as_ref().map(|src| src.value.to_string());
                    for spec in &named.specifiers {
                        let ExportSpecifier::Named(spec) = spec else {
                            continue;
                        };
                        let orig = export_name(&spec.orig);
                        let exported = spec.exported.as_ref().map(export_name).unwrap_or_else(|| orig.clone());
                        let binding = match &source {
                            Some(specifier) => ExportBinding::ReExport {
                                specifier: specifier.clone(),
                                name: orig,
                            },
                            None => ExportBinding::Local { local: orig },
                        };
                        symbols.exports.insert(exported.clone(), ExportEntry {
                            binding,
                            is_default: exported == "default",
                            location: location.clone(),
                        });
                    }
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportAll(all)) => {
                    symbols.star_exports.push(StarExport {
                        specifier: all.src.value.to_string(),
                        location: parsed.location(all.span()),
                    });
                }
                _ => {}
            }
        }
        symbols
    }

    /// Record a declaration; returns the names it binds.
    fn add_decl(&mut self, item: usize, decl: &Decl) -> Vec<String> {
        match decl {
            Decl::TsInterface(iface) => {
                let name = iface.id.sym.to_string();
                self.type_decls.insert(name.clone(), TypeDeclSite { item, kind: TypeDeclKind::Interface });
                vec![name]
            }
            Decl::TsTypeAlias(alias) => {
                let name = alias.id.sym.to_string();
                self.type_decls.insert(name.clone(), TypeDeclSite { item, kind: TypeDeclKind::TypeAlias });
                vec![name]
            }
            Decl::TsEnum(decl) => {
                let name = decl.id.sym.to_string();
                self.type_decls.insert(name.clone(), TypeDeclSite { item, kind: TypeDeclKind::Enum });
                vec![name]
            }
            Decl::Var(var) => {
                let mut names = Vec::new();
                for (declarator_idx, declarator) in var.decls.iter().enumerate() {
                    match &declarator.name {
                        Pat::Ident(binding) => {
                            let name = binding.id.sym.to_string();
                            self.values.insert(name.clone(), ValueSite::Plain { item, declarator: declarator_idx });
                            names.push(name);
                        }
                        Pat::Object(pattern) => {
                            for prop in &pattern.props {
                                let (key, local) = match prop {
                                    ObjectPatProp::KeyValue(kv) => {
                                        let Some(key) = prop_name(&kv.key) else { continue };
                                        let Pat::Ident(local) = &*kv.value else { continue };
                                        (key, local.id.sym.to_string())
                                    }
                                    ObjectPatProp::Assign(assign) => {
                                        let name = assign.key.sym.to_string();
                                        (name.clone(), name)
                                    }
                                    ObjectPatProp::Rest(_) => continue,
                                };
                                self.values.insert(local.clone(), ValueSite::Destructured {
                                    item,
                                    declarator: declarator_idx,
                                    key,
                                });
                                names.push(local);
                            }
                        }
                        _ => {}
                    }
                }
                names
            }
            Decl::Fn(func) => {
                // Functions are never resolvers; record the name so exports resolve.
                vec![func.ident.sym.to_string()]
            }
            _ => Vec::new(),
        }
    }
}

pub fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s.value.to_string(),
    }
}

pub fn prop_name(name: &PropName) -> Option<String> {
    match name {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(s) => Some(s.value.to_string()),
        _ => None,
    }
}

// ------------------------------- Tests ------------------------------------ //
