use crate::component::{Component, ComponentType};
use crate::entity::EntityHandle;
use crate::registry::ComponentRegistry;

/// Entities matching a `has` / `excludes` query, snapshotted at query time.
///
/// Entities are ordered by ascending slot index, so arrays fetched for
/// different `has` types are index-aligned: element `i` of each belongs to
/// `entities()[i]`.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    has: Vec<ComponentType>,
    entities: Vec<EntityHandle>,
}

impl QueryResult {
    pub fn entities(&self) -> &[EntityHandle] {
        &self.entities
    }

    /// The required component types this result can be fetched for.
    pub fn has(&self) -> &[ComponentType] {
        &self.has
    }

    /// Whether `T` was one of the required types.
    pub fn includes<T: Component>(&self) -> bool {
        self.has.contains(&ComponentType::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Intersect the active sets of `has`, subtract the union of `excludes`.
pub(crate) fn run(
    registry: &ComponentRegistry,
    has: &[ComponentType],
    excludes: &[ComponentType],
) -> QueryResult {
    let empty = || QueryResult {
        has: has.to_vec(),
        entities: Vec::new(),
    };

    let mut required = Vec::with_capacity(has.len());
    for ty in has {
        match registry.storage(ty.id()) {
            Some(storage) => required.push(storage),
            // A required type nobody registered matches nothing.
            None => return empty(),
        }
    }
    let excluded: Vec<_> = excludes
        .iter()
        .filter_map(|ty| registry.storage(ty.id()))
        .collect();

    // Iterate the smallest required set, check membership in the rest.
    let Some(base) = required.iter().min_by_key(|storage| storage.active().len()) else {
        return empty();
    };

    let mut entities: Vec<EntityHandle> = base
        .active()
        .iter()
        .copied()
        .filter(|&handle| required.iter().all(|storage| storage.contains(handle)))
        .filter(|&handle| !excluded.iter().any(|storage| storage.contains(handle)))
        .collect();
    entities.sort_unstable_by_key(|handle| handle.index);

    QueryResult {
        has: has.to_vec(),
        entities,
    }
}

/// Disjoint mutable references into `items` at the slots of `entities`, which
/// must be sorted by strictly ascending index.
pub(crate) fn pick_sorted_mut<'a, X>(
    items: &'a mut [X],
    entities: &[EntityHandle],
) -> Option<Vec<&'a mut X>> {
    let mut picked = Vec::with_capacity(entities.len());
    let mut rest = items;
    let mut offset = 0;
    for handle in entities {
        let skip = handle.slot()?.checked_sub(offset)?;
        if skip >= rest.len() {
            return None;
        }
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(skip);
        let (item, tail) = tail.split_first_mut()?;
        picked.push(item);
        offset += skip + 1;
        rest = tail;
    }
    Some(picked)
}
