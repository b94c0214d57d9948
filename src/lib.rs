//! TypeScript declarations and resolver definitions in, GraphQL schema and
//! resolver map out.
//!
//! ```text
//! program ─▶ extract::{types, scalars, resolvers} ─▶ lower ─▶ integrate ─▶ validate ─▶ prune? ─▶ sdl / codegen
//! ```
//!
//! [`generate::generate_from_program`] runs every stage. Each stage returns its
//! result together with [`diagnostics::Diagnostic`]s; none of them fail.
pub mod cli;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod generate;
pub mod integrate;
pub mod ir;
pub mod logging;
pub mod lower;
pub mod path_de;
pub mod program;
pub mod prune;
pub mod sdl;
pub mod tsdoc;
pub mod validate;

pub use diagnostics::{Diagnostic, DiagnosticCode, Severity, SourceLocation};
pub use error::{GqlkitError, Result};
pub use generate::{generate_from_program, generate_schema, GenerateSchemaResult};
