//! Type-reference checks over the integrated schema.
//!
//! Arguments and input fields must stay inside the input domain (input objects,
//! enums, scalars); object fields and resolver return types inside the output
//! domain. Input objects must also not form a cycle that can never terminate.
use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostics::{has_errors, Diagnostic, DiagnosticCode, SourceLocation};
use crate::ir::{GraphQLFieldType, GraphQLTypeKind, InputType, IntegratedResult, TypeExtension, BUILTIN_SCALARS};

/// Four disjoint name sets; built-in scalars are always in `scalar_types`.
#[derive(Clone, Debug, Default)]
pub struct ValidationContext {
    pub input_types: BTreeSet<String>,
    pub output_types: BTreeSet<String>,
    pub enum_types: BTreeSet<String>,
    pub scalar_types: BTreeSet<String>,
}

impl ValidationContext {
    pub fn new() -> Self {
        let scalar_types = BUILTIN_SCALARS.iter().map(|s| s.to_string()).collect();
        Self { scalar_types, ..Default::default() }
    }

    pub fn from_integrated(integrated: &IntegratedResult) -> Self {
        let mut ctx = Self::new();
        for base in &integrated.base_types {
            let set = match base.kind {
                GraphQLTypeKind::Enum => &mut ctx.enum_types,
                GraphQLTypeKind::Scalar => &mut ctx.scalar_types,
                GraphQLTypeKind::InputObject => &mut ctx.input_types,
                GraphQLTypeKind::Object | GraphQLTypeKind::Union | GraphQLTypeKind::Interface => &mut ctx.output_types,
            };
            set.insert(base.name.clone());
        }
        ctx.input_types.extend(integrated.input_types.iter().map(|t| t.name.clone()));
        ctx.scalar_types.extend(integrated.custom_scalar_names.iter().cloned());
        ctx
    }

    fn is_input_domain(&self, name: &str) -> bool {
        self.input_types.contains(name) || self.enum_types.contains(name) || self.scalar_types.contains(name)
    }

    fn is_output_domain(&self, name: &str) -> bool {
        self.output_types.contains(name) || self.enum_types.contains(name) || self.scalar_types.contains(name)
    }
}

#[derive(Debug, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Checks resolver arguments and input-object fields. Every problem is collected.
pub fn validate_arguments(
    extensions: &[TypeExtension],
    input_types: &[InputType],
    ctx: &ValidationContext,
) -> ValidationResult {
    let mut diagnostics = Vec::new();

    for extension in extensions {
        for ext_field in extension.fields.iter() {
            let field = &ext_field.field;
            for arg in &field.args {
                let name = &arg.field_type.type_name;
                let site = format!("argument \"{}\" of {}.{}", arg.name, extension.target_type_name, field.name);
                if ctx.output_types.contains(name) {
                    diagnostics.push(output_in_input(name, &site, arg.location.as_ref().or(field.location.as_ref())));
                } else if !ctx.is_input_domain(name) {
                    diagnostics.push(
                        Diagnostic::error(
                            DiagnosticCode::UnknownArgumentType,
                            format!("{site} has unknown type \"{name}\""),
                        )
                        .at(arg.location.clone().or_else(|| field.location.clone())),
                    );
                }
            }
        }
    }

    for input in input_types {
        for field in &input.fields {
            let name = &field.field_type.type_name;
            let site = format!("input field {}.{}", input.name, field.name);
            if ctx.output_types.contains(name) {
                diagnostics.push(output_in_input(name, &site, field.location.as_ref()));
            } else if !ctx.is_input_domain(name) {
                diagnostics.push(
                    Diagnostic::error(DiagnosticCode::UnknownFieldType, format!("{site} has unknown type \"{name}\""))
                        .at(field.location.clone().or_else(|| input.location.clone())),
                );
            }
        }
    }

    diagnostics.extend(circular_references(input_types));
    dedup(&mut diagnostics);
    ValidationResult { is_valid: !has_errors(&diagnostics), diagnostics }
}

/// Object/interface fields and resolver return types must name output-domain types.
pub fn validate_output_fields(integrated: &IntegratedResult, ctx: &ValidationContext) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for base in &integrated.base_types {
        if matches!(base.kind, GraphQLTypeKind::Object | GraphQLTypeKind::Interface) {
            for field in &base.fields {
                let location = field.location.as_ref().or(base.location.as_ref());
                diagnostics.extend(check_output(ctx, &base.name, &field.name, &field.field_type, location));
            }
        }
        for member in &base.union_members {
            if !ctx.output_types.contains(member) {
                diagnostics.push(
                    Diagnostic::error(
                        DiagnosticCode::UnknownFieldType,
                        format!("union {} has member \"{member}\" that is not an object type", base.name),
                    )
                    .at(base.location.clone()),
                );
            }
        }
    }
    for extension in &integrated.type_extensions {
        for ext_field in &extension.fields {
            let field = &ext_field.field;
            let owner = &extension.target_type_name;
            diagnostics.extend(check_output(ctx, owner, &field.name, &field.field_type, field.location.as_ref()));
        }
    }
    dedup(&mut diagnostics);
    diagnostics
}

fn check_output(
    ctx: &ValidationContext,
    owner: &str,
    field_name: &str,
    field_type: &GraphQLFieldType,
    location: Option<&SourceLocation>,
) -> Option<Diagnostic> {
    let name = &field_type.type_name;
    if ctx.is_output_domain(name) {
        return None;
    }
    let detail = if ctx.input_types.contains(name) { "input object" } else { "unknown type" };
    Some(
        Diagnostic::error(
            DiagnosticCode::UnknownFieldType,
            format!("field {owner}.{field_name} returns {detail} \"{name}\""),
        )
        .at(location.cloned()),
    )
}

fn output_in_input(name: &str, site: &str, location: Option<&SourceLocation>) -> Diagnostic {
    Diagnostic::error(
        DiagnosticCode::OutputTypeInInput,
        format!("{site} references output type \"{name}\"; input positions accept input objects, enums and scalars"),
    )
    .at(location.cloned())
}

// ------------------------------- Cycles ----------------------------------- //

/// An edge that can never be satisfied with `null` or an empty list.
fn is_hard_edge(field_type: &GraphQLFieldType) -> bool {
    !field_type.nullable && (!field_type.list || !field_type.list_item_nullable)
}

struct Edge<'a> {
    target: &'a str,
    location: Option<&'a SourceLocation>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

fn circular_references(input_types: &[InputType]) -> Vec<Diagnostic> {
    let known: BTreeSet<&str> = input_types.iter().map(|t| t.name.as_str()).collect();
    let mut graph: BTreeMap<&str, Vec<Edge<'_>>> = BTreeMap::new();
    for input in input_types {
        let edges = graph.entry(input.name.as_str()).or_default();
        for field in &input.fields {
            let target = field.field_type.type_name.as_str();
            if known.contains(target) && is_hard_edge(&field.field_type) {
                edges.push(Edge { target, location: field.location.as_ref().or(input.location.as_ref()) });
            }
        }
    }

    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
    let mut cycles: BTreeMap<BTreeSet<&str>, (Vec<&str>, Option<&SourceLocation>)> = BTreeMap::new();
    for &start in graph.keys() {
        if !marks.contains_key(start) {
            let mut stack = Vec::new();
            visit(start, &graph, &mut marks, &mut stack, &mut cycles);
        }
    }

    cycles
        .into_values()
        .map(|(cycle, location)| {
            let mut path = cycle.clone();
            path.push(cycle[0]);
            Diagnostic::error(
                DiagnosticCode::CircularInputReference,
                format!(
                    "input types {} reference each other through non-nullable fields: {}",
                    cycle.iter().map(|n| format!("\"{n}\"")).collect::<Vec<_>>().join(", "),
                    path.join(" -> ")
                ),
            )
            .at(location.cloned())
        })
        .collect()
}

fn visit<'a>(
    node: &'a str,
    graph: &BTreeMap<&'a str, Vec<Edge<'a>>>,
    marks: &mut BTreeMap<&'a str, Mark>,
    stack: &mut Vec<(&'a str, Option<&'a SourceLocation>)>,
    cycles: &mut BTreeMap<BTreeSet<&'a str>, (Vec<&'a str>, Option<&'a SourceLocation>)>,
) {
    marks.insert(node, Mark::Visiting);
    for edge in graph.get(node).into_iter().flatten() {
        stack.push((node, edge.location));
        match marks.get(edge.target) {
            None => visit(edge.target, graph, marks, stack, cycles),
            Some(Mark::Visiting) => {
                let from = stack.iter().rposition(|(n, _)| *n == edge.target).unwrap_or(0);
                let cycle = rotate_to_smallest(stack[from..].to_vec());
                let key: BTreeSet<&str> = cycle.iter().map(|(n, _)| *n).collect();
                cycles.entry(key).or_insert_with(|| {
                    let location = cycle[0].1;
                    (cycle.into_iter().map(|(n, _)| n).collect(), location)
                });
            }
            Some(Mark::Done) => {}
        }
        stack.pop();
    }
    marks.insert(node, Mark::Done);
}

fn rotate_to_smallest<T: Copy>(mut cycle: Vec<(&str, T)>) -> Vec<(&str, T)> {
    if let Some(min) = cycle.iter().enumerate().min_by_key(|(_, (n, _))| *n).map(|(i, _)| i) {
        cycle.rotate_left(min);
    }
    cycle
}

fn dedup(diagnostics: &mut Vec<Diagnostic>) {
    let mut seen = BTreeSet::new();
    diagnostics.retain(|d| seen.insert((d.code, d.message.clone(), d.location.clone())));
}

// ------------------------------- Tests ------------------------------------ //
