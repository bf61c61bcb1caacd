//! Combo resolution: reconcile affix sub-tests (`t-001a`, `t-001b`) with
//! their combined parent (`t-001`).
//!
//! Runs exactly once, after all loading, over a frozen snapshot of every
//! test's direct results:
//! 1. link every affix id to its parent when the parent exists;
//! 2. install each pending import into the home-engine slot;
//! 3. for every parent and every engine seen on the parent or any child,
//!    copy the winning record across the link.
//!
//! Parents are never affixes themselves, so one pass reaches the fixpoint.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::domain::error::Result;
use crate::domain::record::ResultRecord;
use crate::domain::test_id::TestId;
use crate::domain::verdict::Verdict;
use crate::obs;
use crate::registry::{ResolvedRegistry, TestRegistry};

/// Counters from one resolver pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComboStats {
    /// Child → parent links established.
    pub links: usize,
    /// Tests with at least one linked child.
    pub parents: usize,
    /// Per-engine records written across a link.
    pub propagated: usize,
}

/// Link, merge imports and propagate across combo links.
pub fn resolve_combos(registry: TestRegistry) -> Result<(ResolvedRegistry, ComboStats)> {
    let mut stats = ComboStats::default();
    let ids = registry.ids();
    let (home_engine, mut tests) = registry.into_parts();

    // 1. Link
    let mut families: BTreeMap<TestId, BTreeSet<TestId>> = BTreeMap::new();
    for id in &ids {
        let Some(parent) = id.affix_parent() else {
            continue;
        };
        if !tests.contains_key(&parent) {
            continue;
        }
        if let Some(child) = tests.get_mut(id) {
            child.set_combo_parent(parent.clone());
        }
        if let Some(parent_test) = tests.get_mut(&parent) {
            parent_test.add_combo_child(id.clone());
        }
        families.entry(parent).or_default().insert(id.clone());
        stats.links += 1;
    }
    stats.parents = families.len();

    // 2. Import overlay merge
    for test in tests.values_mut() {
        test.merge_imported();
    }

    // 3. Resolve against a frozen snapshot of direct results
    let snapshot: BTreeMap<TestId, BTreeMap<String, ResultRecord>> = families
        .iter()
        .flat_map(|(parent, children)| std::iter::once(parent).chain(children.iter()))
        .filter_map(|id| tests.get(id).map(|t| (id.clone(), t.results().clone())))
        .collect();
    let empty = BTreeMap::new();
    let direct = |id: &TestId| snapshot.get(id).unwrap_or(&empty);

    let mut writes: Vec<(TestId, String, ResultRecord)> = Vec::new();
    for (parent, children) in &families {
        let parent_direct = direct(parent);
        let engines: BTreeSet<&String> = parent_direct
            .keys()
            .chain(children.iter().flat_map(|c| direct(c).keys()))
            .collect();

        for engine in engines {
            let from_parent = parent_direct.get(engine);
            let from_children: Vec<(&TestId, &ResultRecord)> = children
                .iter()
                .filter_map(|c| direct(c).get(engine).map(|r| (c, r)))
                .collect();

            let parent_final = match from_parent {
                Some(own) => {
                    let mut winner = own;
                    for &(_, record) in &from_children {
                        winner = pick(winner, record)?;
                    }
                    Some(winner.clone())
                }
                None => derive_from_children(&from_children)?,
            };

            let Some(parent_final) = parent_final else {
                continue;
            };

            for child in children {
                let resolved = match (direct(child).get(engine), from_parent) {
                    (Some(own), Some(theirs)) => pick(own, theirs)?.clone(),
                    (Some(own), None) => own.clone(),
                    (None, _) => parent_final.clone(),
                };
                if direct(child).get(engine) != Some(&resolved) {
                    debug!(test = %child, engine = %engine, verdict = %resolved.verdict(), "combo child resolved");
                    writes.push((child.clone(), engine.clone(), resolved));
                }
            }

            if from_parent != Some(&parent_final) {
                debug!(test = %parent, engine = %engine, verdict = %parent_final.verdict(), "combo parent resolved");
                writes.push((parent.clone(), engine.clone(), parent_final));
            }
        }
    }

    stats.propagated = writes.len();
    for (id, engine, record) in writes {
        if let Some(test) = tests.get_mut(&id) {
            test.set_resolved(&engine, record);
        }
    }

    obs::emit_combo_resolved(stats.links, stats.parents, stats.propagated);
    Ok((ResolvedRegistry::new(home_engine, tests), stats))
}

/// Winner of two records on the same engine. On an exact precedence tie a
/// failing record beats a non-passing one, which beats a pass; remaining
/// ties keep `stored`.
fn pick<'a>(stored: &'a ResultRecord, incoming: &'a ResultRecord) -> Result<&'a ResultRecord> {
    let ordering = incoming
        .precedence()
        .compare(&stored.precedence(), incoming.engine())?;
    Ok(match ordering {
        Ordering::Greater => incoming,
        Ordering::Less => stored,
        Ordering::Equal => {
            if incoming.verdict().tie_rank() > stored.verdict().tie_rank() {
                incoming
            } else {
                stored
            }
        }
    })
}

/// Parent verdict when only children carry evidence: pass only if every
/// child with a record passes, otherwise fail.
fn derive_from_children(
    from_children: &[(&TestId, &ResultRecord)],
) -> Result<Option<ResultRecord>> {
    let all_pass = from_children.iter().all(|(_, r)| r.verdict().is_pass());
    let mut winner: Option<&ResultRecord> = None;
    for &(_, record) in from_children {
        if !all_pass && record.verdict().is_pass() {
            continue;
        }
        winner = Some(match winner {
            Some(current) => pick(current, record)?,
            None => record,
        });
    }

    Ok(winner.map(|record| {
        if all_pass || record.verdict().is_failure() {
            record.clone()
        } else {
            record.with_verdict(Verdict::Fail)
        }
    }))
}
