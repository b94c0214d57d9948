//! Removes base and input types that no root can reach.
use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::integrate::{MUTATION, QUERY};
use crate::ir::{GraphQLField, GraphQLTypeKind, IntegratedResult};

#[derive(Debug)]
pub struct PruneResult {
    pub integrated: IntegratedResult,
    /// Removed type names, sorted.
    pub pruned_types: Vec<String>,
}

pub fn prune_unreferenced(integrated: &IntegratedResult) -> PruneResult {
    let reachable = reachable_types(integrated);
    let mut pruned = integrated.clone();
    let mut pruned_types = Vec::new();

    pruned.base_types.retain(|t| {
        let keep = reachable.contains(t.name.as_str());
        if !keep {
            pruned_types.push(t.name.clone());
        }
        keep
    });
    pruned.input_types.retain(|t| {
        let keep = reachable.contains(t.name.as_str());
        if !keep {
            pruned_types.push(t.name.clone());
        }
        keep
    });
    pruned_types.sort();
    debug!(pruned = pruned_types.len(), "pruned unreferenced types");
    PruneResult { integrated: pruned, pruned_types }
}

fn reachable_types(integrated: &IntegratedResult) -> BTreeSet<&str> {
    let mut queue: VecDeque<&str> = VecDeque::new();
    for root in [QUERY, MUTATION] {
        if integrated.base_type(root).is_some() {
            queue.push_back(root);
        }
    }
    for extension in &integrated.type_extensions {
        queue.push_back(&extension.target_type_name);
        for ext_field in &extension.fields {
            push_field(&mut queue, &ext_field.field);
        }
    }

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    while let Some(name) = queue.pop_front() {
        if !seen.insert(name) {
            continue;
        }
        if let Some(base) = integrated.base_type(name) {
            base.fields.iter().for_each(|f| push_field(&mut queue, f));
            queue.extend(base.union_members.iter().map(String::as_str));
            queue.extend(base.implemented_interfaces.iter().map(String::as_str));
            if base.kind == GraphQLTypeKind::Interface {
                let implementors = integrated
                    .base_types
                    .iter()
                    .filter(|t| t.implemented_interfaces.iter().any(|i| i == name))
                    .map(|t| t.name.as_str());
                queue.extend(implementors);
            }
        }
        if let Some(input) = integrated.input_type(name) {
            queue.extend(input.fields.iter().map(|f| f.field_type.type_name.as_str()));
        }
    }
    seen
}

fn push_field<'a>(queue: &mut VecDeque<&'a str>, field: &'a GraphQLField) {
    queue.push_back(&field.field_type.type_name);
    queue.extend(field.args.iter().map(|a| a.field_type.type_name.as_str()));
}

// ------------------------------- Tests ------------------------------------ //
