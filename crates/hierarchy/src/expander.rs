//! Recursive expansion of group sets.

use std::collections::HashSet;

use opsdesk_core::{DomainResult, GroupId};
use opsdesk_store::GroupStore;

use crate::service::GroupHierarchyService;

/// Expands a base set of group ids into the full descendant-inclusive set
/// when the consumer (e.g. a department definition) is marked recursive.
pub struct RecursiveGroupExpander<'a, S> {
    hierarchy: &'a GroupHierarchyService<S>,
}

impl<'a, S> RecursiveGroupExpander<'a, S>
where
    S: GroupStore,
{
    pub fn new(hierarchy: &'a GroupHierarchyService<S>) -> Self {
        Self { hierarchy }
    }

    /// Non-recursive: the base set, deduplicated, order preserved.
    /// Recursive: each base id unioned with its descendants. Idempotent:
    /// expanding an already-expanded set yields the same set.
    pub fn expand(&self, base: &[GroupId], recursive: bool) -> DomainResult<Vec<GroupId>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for &id in base {
            if seen.insert(id) {
                out.push(id);
            }
        }

        if !recursive {
            return Ok(out);
        }

        for &id in base {
            for group in self.hierarchy.descendants_of(id)? {
                if seen.insert(group.id) {
                    out.push(group.id);
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use opsdesk_store::InMemoryDirectory;

    use crate::service::NewGroup;

    use super::*;

    fn tree() -> (GroupHierarchyService<Arc<InMemoryDirectory>>, Vec<GroupId>) {
        let svc = GroupHierarchyService::new(Arc::new(InMemoryDirectory::new()));
        let ti = svc
            .create(NewGroup {
                name: "TI".into(),
                description: None,
                parent_id: None,
            })
            .unwrap();
        let dev = svc
            .create(NewGroup {
                name: "Desenvolvimento".into(),
                description: None,
                parent_id: Some(ti.id),
            })
            .unwrap();
        let infra = svc
            .create(NewGroup {
                name: "Infraestrutura".into(),
                description: None,
                parent_id: Some(ti.id),
            })
            .unwrap();
        (svc, vec![ti.id, dev.id, infra.id])
    }

    #[test]
    fn non_recursive_dedups_and_preserves_order() {
        let (svc, ids) = tree();
        let expander = RecursiveGroupExpander::new(&svc);

        let out = expander
            .expand(&[ids[1], ids[0], ids[1]], false)
            .unwrap();
        assert_eq!(out, vec![ids[1], ids[0]]);
    }

    #[test]
    fn recursive_includes_all_descendants() {
        let (svc, ids) = tree();
        let expander = RecursiveGroupExpander::new(&svc);

        let out = expander.expand(&[ids[0]], true).unwrap();
        let out: std::collections::HashSet<_> = out.into_iter().collect();
        assert_eq!(out, ids.iter().copied().collect());
    }

    #[test]
    fn recursive_expansion_is_idempotent() {
        let (svc, ids) = tree();
        let expander = RecursiveGroupExpander::new(&svc);

        let once = expander.expand(&[ids[0]], true).unwrap();
        let twice = expander.expand(&once, true).unwrap();

        let once: std::collections::HashSet<_> = once.into_iter().collect();
        let twice: std::collections::HashSet<_> = twice.into_iter().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_base_expands_to_empty() {
        let (svc, _) = tree();
        let expander = RecursiveGroupExpander::new(&svc);
        assert!(expander.expand(&[], true).unwrap().is_empty());
    }
}
