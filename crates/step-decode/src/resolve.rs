//! Reference resolution: turns a [`RawFile`] into a checked [`File`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StepError;
use crate::model::{Attribute, Entity, EntityId, File, Header};
use crate::parser::{self, RawFile};

/// What to do when references form a cycle.
///
/// The entity arena handles cyclic graphs without trouble, so cycles are
/// allowed unless the caller asks otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Keep cyclic graphs.
    #[default]
    Allow,
    /// Fail with [`StepError::ReferenceCycle`].
    Reject,
}

/// Options controlling how a parsed file is resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Reference cycle handling.
    pub cycles: CyclePolicy,
}

impl ResolveOptions {
    /// Load options from a TOML document, e.g. `cycles = "reject"`.
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Parse and resolve STEP text in one go.
pub fn parse_and_resolve(text: &str, options: &ResolveOptions) -> Result<File, StepError> {
    let raw = parser::parse(text)?;
    resolve(raw, options)
}

/// Check every reference in `raw` and build the entity arena.
///
/// Fails with [`StepError::DanglingReference`] for the first reference (in
/// ascending entity id order, header first) whose target does not exist.
pub fn resolve(raw: RawFile, options: &ResolveOptions) -> Result<File, StepError> {
    let RawFile { header, entities } = raw;
    let exists = |id: EntityId| entities.contains_key(&id);

    for record in &header {
        check_references(&record.attributes, &exists)?;
    }
    for entity in entities.values() {
        for record in entity.records() {
            check_references(&record.attributes, &exists)?;
        }
    }

    let header = Header {
        entities: header.into_iter().map(Entity::Simple).collect(),
    };
    let file = File::from_parts(header, entities);

    if options.cycles == CyclePolicy::Reject {
        if let Some(chain) = find_cycle(&file) {
            debug!(?chain, "rejecting reference cycle");
            return Err(StepError::ReferenceCycle(chain));
        }
    }

    debug!(entities = file.len(), policy = ?options.cycles, "resolved entity graph");
    Ok(file)
}

fn check_references(
    attributes: &[Attribute],
    exists: &impl Fn(EntityId) -> bool,
) -> Result<(), StepError> {
    for attribute in attributes {
        match attribute {
            Attribute::Reference(id) if !exists(*id) => {
                return Err(StepError::DanglingReference(*id));
            }
            Attribute::List(items) => check_references(items, exists)?,
            Attribute::Typed(_, inner) => check_references(std::slice::from_ref(inner), exists)?,
            _ => {}
        }
    }
    Ok(())
}

fn collect_references(attributes: &[Attribute], out: &mut Vec<EntityId>) {
    for attribute in attributes {
        match attribute {
            Attribute::Reference(id) => out.push(*id),
            Attribute::List(items) => collect_references(items, out),
            Attribute::Typed(_, inner) => collect_references(std::slice::from_ref(inner), out),
            _ => {}
        }
    }
}

fn references_of(entity: &Entity) -> Vec<EntityId> {
    let mut out = Vec::new();
    for record in entity.records() {
        collect_references(&record.attributes, &mut out);
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search for the first cycle, visiting roots in ascending id order.
///
/// Returns the chain of ids along the cycle, starting and ending with the
/// same id (`[1, 1]` for a self-reference).
fn find_cycle(file: &File) -> Option<Vec<EntityId>> {
    let mut marks: std::collections::HashMap<EntityId, Mark> =
        file.entities().map(|(id, _)| (id, Mark::Unvisited)).collect();

    for (root, _) in file.entities() {
        if marks[&root] != Mark::Unvisited {
            continue;
        }
        // (entity id, its outgoing references, index of the next one to visit)
        let mut stack: Vec<(EntityId, Vec<EntityId>, usize)> = Vec::new();
        marks.insert(root, Mark::OnStack);
        stack.push((root, file.get(root).map(references_of).unwrap_or_default(), 0));

        while let Some((id, targets, next)) = stack.last_mut() {
            let Some(&target) = targets.get(*next) else {
                marks.insert(*id, Mark::Done);
                stack.pop();
                continue;
            };
            *next += 1;
            match marks.get(&target).copied().unwrap_or(Mark::Done) {
                Mark::Unvisited => {
                    marks.insert(target, Mark::OnStack);
                    let refs = file.get(target).map(references_of).unwrap_or_default();
                    stack.push((target, refs, 0));
                }
                Mark::OnStack => {
                    let start = stack.iter().position(|(sid, _, _)| *sid == target)?;
                    let mut chain: Vec<EntityId> =
                        stack[start..].iter().map(|(sid, _, _)| *sid).collect();
                    chain.push(target);
                    return Some(chain);
                }
                Mark::Done => {}
            }
        }
    }
    None
}
