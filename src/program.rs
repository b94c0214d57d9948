//! The whole-program type-analysis context.
//!
//! A [`Program`] is a read-only set of parsed TypeScript modules plus the symbol
//! tables needed to follow names across files. Extraction never mutates it.
//!
//! Cross-file resolution is shallow: an import is followed to the
//! exporting module and from there at most [`MAX_REEXPORT_DEPTH`] further
//! re-export hops. Anything deeper resolves to `None`.
pub mod parse;
pub mod symbols;

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use swc_ecma_ast::{
    Decl, DefaultDecl, Expr, ModuleDecl, ModuleItem, Pat, Stmt, TsEnumDecl, TsInterfaceDecl,
    TsType, TsTypeAliasDecl, VarDeclarator,
};
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticCode, SourceLocation};
pub use parse::ParsedModule;
pub use symbols::{ExportBinding, Imported, ModuleSymbols, TypeDeclKind, ValueSite};

/// Package that ships `createGqlkitApis`, `NoArgs`, `Int`, `DefineScalar`, ...
pub const RUNTIME_MODULE: &str = "@gqlkit-ts/runtime";

/// Re-export hops followed after the initial import.
pub const MAX_REEXPORT_DEPTH: usize = 1;

pub struct SourceModule {
    pub parsed: ParsedModule,
    pub symbols: ModuleSymbols,
    /// Scanned modules emit types and resolvers; the others only support resolution.
    pub scanned: bool,
}

impl SourceModule {
    pub fn path(&self) -> &Path {
        &self.parsed.path
    }
}

/// A name bound inside a specific loaded module.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolRef {
    pub module: PathBuf,
    pub local: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolved {
    Local(SymbolRef),
    /// Namespace import of a loaded module (`import * as ns from "./x"`).
    Namespace(PathBuf),
    /// Name imported from a package that is never loaded.
    External { specifier: String, name: String },
}

impl Resolved {
    pub fn is_runtime(&self, name: &str) -> bool {
        matches!(self, Resolved::External { specifier, name: n } if specifier == RUNTIME_MODULE && n == name)
    }
}

#[derive(Clone, Copy)]
pub enum TypeDeclNode<'a> {
    Interface(&'a TsInterfaceDecl),
    Alias(&'a TsTypeAliasDecl),
    Enum(&'a TsEnumDecl),
}

#[derive(Clone, Copy)]
pub struct TypeDecl<'a> {
    pub module: &'a SourceModule,
    pub name: &'a str,
    pub node: TypeDeclNode<'a>,
    /// Span start of the whole module item (where `export` and its docs sit).
    pub item_lo: swc_common::BytePos,
}

impl<'a> TypeDecl<'a> {
    pub fn symbol(&self) -> SymbolRef {
        SymbolRef { module: self.module.path().to_path_buf(), local: self.name.to_string() }
    }
}

#[derive(Clone, Copy)]
pub struct ValueDecl<'a> {
    pub module: &'a SourceModule,
    pub declarator: &'a VarDeclarator,
    /// Property key when the binding comes from object destructuring.
    pub destructured_key: Option<&'a str>,
    pub item_lo: swc_common::BytePos,
}

impl<'a> ValueDecl<'a> {
    pub fn init(&self) -> Option<&'a Expr> {
        self.declarator.init.as_deref()
    }

    pub fn type_annotation(&self) -> Option<&'a TsType> {
        match &self.declarator.name {
            Pat::Ident(binding) => binding.type_ann.as_ref().map(|ann| &*ann.type_ann),
            _ => None,
        }
    }
}

pub struct ProgramLoad {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Default)]
pub struct Program {
    modules: IndexMap<PathBuf, SourceModule>,
}

// ------------------------------- Builder ---------------------------------- //

/// Collects in-memory sources; useful for tests and for callers that already
/// read the files.
#[derive(Default)]
pub struct ProgramBuilder {
    sources: Vec<(PathBuf, String, bool)>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scanned(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.sources.push((normalize_path(&path.into()), source.into(), true));
        self
    }

    pub fn support(mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        self.sources.push((normalize_path(&path.into()), source.into(), false));
        self
    }

    pub fn build(self) -> ProgramLoad {
        let mut program = Program::default();
        let mut diagnostics = Vec::new();
        for (path, source, scanned) in self.sources {
            program.insert(path, source, scanned, &mut diagnostics);
        }
        program.modules.sort_keys();
        ProgramLoad { program, diagnostics }
    }
}

// ------------------------------- Loading ---------------------------------- //

impl Program {
    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::new()
    }

    /// Read and parse `files` from disk, then follow relative imports and
    /// re-exports so helper modules outside the scan set are available.
    pub fn load(files: &[PathBuf]) -> ProgramLoad {
        let mut program = Program::default();
        let mut diagnostics = Vec::new();
        let scan_set: BTreeSet<PathBuf> = files.iter().map(|path| normalize_path(path)).collect();
        let mut queue: Vec<(PathBuf, bool)> = scan_set.iter().rev().map(|path| (path.clone(), true)).collect();
        let mut seen: BTreeSet<PathBuf> = BTreeSet::new();

        while let Some((path, scanned)) = queue.pop() {
            if !seen.insert(path.clone()) {
                continue;
            }
            let source = match std::fs::read_to_string(&path) {
                Ok(source) => source,
                Err(error) => {
                    if scanned {
                        diagnostics.push(
                            Diagnostic::error(
                                DiagnosticCode::ParseError,
                                format!("failed to read {}: {error}", path.display()),
                            )
                            .at(Some(SourceLocation::file_only(&path))),
                        );
                    }
                    continue;
                }
            };
            if !program.insert(path.clone(), source, scanned, &mut diagnostics) {
                continue;
            }
            let Some(module) = program.modules.get(&path) else { continue };
            for specifier in module.referenced_specifiers() {
                if let Some(target) = resolve_specifier(&path, &specifier, |p| p.is_file()) {
                    // Scanned files are already queued with their own flag.
                    if !scan_set.contains(&target) {
                        queue.push((target, false));
                    }
                }
            }
        }

        program.modules.sort_keys();
        debug!(modules = program.modules.len(), "program loaded");
        ProgramLoad { program, diagnostics }
    }

    fn insert(&mut self, path: PathBuf, source: String, scanned: bool, diagnostics: &mut Vec<Diagnostic>) -> bool {
        match ParsedModule::parse(&path, source) {
            Ok(parsed) => {
                let symbols = ModuleSymbols::build(&parsed);
                self.modules.insert(path, SourceModule { parsed, symbols, scanned });
                true
            }
            Err(failure) => {
                if scanned {
                    diagnostics.push(
                        Diagnostic::error(
                            DiagnosticCode::ParseError,
                            format!("failed to parse {}: {}", path.display(), failure.message),
                        )
                        .at(Some(failure.location)),
                    );
                }
                false
            }
        }
    }
}

impl SourceModule {
    fn referenced_specifiers(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .symbols
            .imports
            .values()
            .map(|import| import.specifier.clone())
            .chain(self.symbols.exports.values().filter_map(|entry| match &entry.binding {
                ExportBinding::ReExport { specifier, .. } => Some(specifier.clone()),
                ExportBinding::Local { .. } => None,
            }))
            .chain(self.symbols.star_exports.iter().map(|star| star.specifier.clone()))
            .filter(|specifier| is_relative(specifier))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

// ------------------------------ Resolution -------------------------------- //

impl Program {
    pub fn modules(&self) -> impl Iterator<Item = &SourceModule> {
        self.modules.values()
    }

    pub fn scanned_modules(&self) -> impl Iterator<Item = &SourceModule> {
        self.modules.values().filter(|module| module.scanned)
    }

    pub fn module(&self, path: &Path) -> Option<&SourceModule> {
        self.modules.get(path)
    }

    pub fn is_scanned(&self, path: &Path) -> bool {
        self.modules.get(path).is_some_and(|module| module.scanned)
    }

    /// Resolve a module specifier written in `from` to a loaded module.
    pub fn resolve_module(&self, from: &Path, specifier: &str) -> Option<&SourceModule> {
        if !is_relative(specifier) {
            return None;
        }
        let path = resolve_specifier(from, specifier, |p| self.modules.contains_key(p))?;
        self.modules.get(&path)
    }

    /// Resolve a name as seen from inside `module`.
    pub fn resolve_name(&self, module: &Path, name: &str) -> Option<Resolved> {
        self.resolve_name_at(module, name, 0)
    }

    fn resolve_name_at(&self, module: &Path, name: &str, depth: usize) -> Option<Resolved> {
        let source = self.modules.get(module)?;
        if source.symbols.type_decls.contains_key(name) || source.symbols.values.contains_key(name) {
            return Some(Resolved::Local(SymbolRef { module: module.to_path_buf(), local: name.to_string() }));
        }
        let import = source.symbols.imports.get(name)?;
        if !is_relative(&import.specifier) {
            let imported = match &import.imported {
                Imported::Named(imported) => imported.clone(),
                Imported::Default => "default".to_string(),
                Imported::Namespace => "*".to_string(),
            };
            return Some(Resolved::External { specifier: import.specifier.clone(), name: imported });
        }
        let target = self.resolve_module(module, &import.specifier)?;
        match &import.imported {
            Imported::Named(imported) => self.resolve_export(target, imported, depth),
            Imported::Default => self.resolve_export(target, "default", depth),
            Imported::Namespace => Some(Resolved::Namespace(target.path().to_path_buf())),
        }
    }

    /// Resolve `name` as exported by `module`; `depth` counts re-export hops taken so far.
    pub fn resolve_export(&self, module: &SourceModule, name: &str, depth: usize) -> Option<Resolved> {
        if let Some(entry) = module.symbols.exports.get(name) {
            return match &entry.binding {
                ExportBinding::Local { local } => {
                    let symbols = &module.symbols;
                    if symbols.type_decls.contains_key(local) || symbols.values.contains_key(local) {
                        Some(Resolved::Local(SymbolRef {
                            module: module.path().to_path_buf(),
                            local: local.clone(),
                        }))
                    } else if symbols.imports.contains_key(local) && depth < MAX_REEXPORT_DEPTH {
                        self.resolve_name_at(module.path(), local, depth + 1)
                    } else {
                        None
                    }
                }
                ExportBinding::ReExport { specifier, name } => {
                    if depth >= MAX_REEXPORT_DEPTH {
                        return None;
                    }
                    if !is_relative(specifier) {
                        return Some(Resolved::External { specifier: specifier.clone(), name: name.clone() });
                    }
                    let target = self.resolve_module(module.path(), specifier)?;
                    self.resolve_export(target, name, depth + 1)
                }
            };
        }
        if depth >= MAX_REEXPORT_DEPTH || name == "default" {
            return None;
        }
        module.symbols.star_exports.iter().find_map(|star| {
            let target = self.resolve_module(module.path(), &star.specifier)?;
            self.resolve_export(target, name, depth + 1)
        })
    }

    /// Follow a resolved name to a type declaration in a loaded module.
    pub fn type_decl(&self, symbol: &SymbolRef) -> Option<TypeDecl<'_>> {
        let module = self.modules.get(&symbol.module)?;
        let (name, site) = module.symbols.type_decls.get_key_value(&symbol.local)?;
        let item = module.parsed.module.body.get(site.item)?;
        let item_lo = swc_common::Spanned::span(item).lo;
        let decl = match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => Some(decl),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => Some(&export.decl),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                return match &export.decl {
                    DefaultDecl::TsInterfaceDecl(iface) => Some(TypeDecl {
                        module,
                        name,
                        node: TypeDeclNode::Interface(iface),
                        item_lo,
                    }),
                    _ => None,
                };
            }
            _ => None,
        }?;
        let node = match decl {
            Decl::TsInterface(iface) => TypeDeclNode::Interface(iface),
            Decl::TsTypeAlias(alias) => TypeDeclNode::Alias(alias),
            Decl::TsEnum(decl) => TypeDeclNode::Enum(decl),
            _ => return None,
        };
        Some(TypeDecl { module, name, node, item_lo })
    }

    /// Resolve a type name used inside `module` straight to its declaration.
    pub fn resolve_type(&self, module: &Path, name: &str) -> Option<TypeDecl<'_>> {
        match self.resolve_name(module, name)? {
            Resolved::Local(symbol) => self.type_decl(&symbol),
            _ => None,
        }
    }

    pub fn value_decl(&self, symbol: &SymbolRef) -> Option<ValueDecl<'_>> {
        let module = self.modules.get(&symbol.module)?;
        let site = module.symbols.values.get(&symbol.local)?;
        let (item, declarator, key) = match site {
            ValueSite::Plain { item, declarator } => (*item, *declarator, None),
            ValueSite::Destructured { item, declarator, key } => (*item, *declarator, Some(key.as_str())),
        };
        let module_item = module.parsed.module.body.get(item)?;
        let var = match module_item {
            ModuleItem::Stmt(Stmt::Decl(Decl::Var(var))) => var,
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => match &export.decl {
                Decl::Var(var) => var,
                _ => return None,
            },
            _ => return None,
        };
        Some(ValueDecl {
            module,
            declarator: var.decls.get(declarator)?,
            destructured_key: key,
            item_lo: swc_common::Spanned::span(module_item).lo,
        })
    }
}

// ------------------------------ Path helpers ------------------------------ //

pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier == "." || specifier == ".."
}

/// Lexically resolve `specifier` relative to the file `from`, probing TypeScript
/// extensions with `exists`.
pub fn resolve_specifier(from: &Path, specifier: &str, exists: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    let dir = from.parent().unwrap_or_else(|| Path::new(""));
    let base = normalize_path(&dir.join(specifier));
    let base_str = base.to_string_lossy().to_string();

    let mut candidates = Vec::<PathBuf>::new();
    if let Some(stem) = base_str.strip_suffix(".js") {
        candidates.push(PathBuf::from(format!("{stem}.ts")));
        candidates.push(PathBuf::from(format!("{stem}.tsx")));
    }
    candidates.push(base.clone());
    for ext in [".ts", ".tsx", ".d.ts"] {
        candidates.push(PathBuf::from(format!("{base_str}{ext}")));
    }
    candidates.push(base.join("index.ts"));
    candidates.push(base.join("index.tsx"));

    candidates.into_iter().find(|candidate| {
        let is_source = candidate
            .extension()
            .is_some_and(|ext| ext == "ts" || ext == "tsx");
        is_source && exists(candidate)
    })
}

/// Remove `.` and resolve `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ------------------------------- Tests ------------------------------------ //
