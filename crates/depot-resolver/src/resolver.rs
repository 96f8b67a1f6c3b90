//! Compatible version resolution: pick one mutually consistent version per
//! required `group:artifact`, preferring the requested versions.
//!
//! Every coordinate that is a candidate, or that appears in a candidate's
//! transitive closure, becomes one boolean variable. Hard clauses require
//! exactly one candidate per required family, make a chosen candidate imply
//! every member of its closure, and allow at most one version per
//! `group:artifact` overall. Soft unit clauses weight each candidate by how
//! close it is to the requested version.

use std::collections::{BTreeMap, HashMap, HashSet};

use depot_core::coordinate::{GroupArtifact, ProjectVersion};
use depot_core::store::CoordinateStore;

use crate::cache::DependencyCache;
use crate::maxsat::{BranchAndBoundSolver, Formula, Lit, MaxSatSolver, Var};
use crate::version::{compare_versions, sort_descending};

/// A candidate version for one required family, ranked by backtrack distance
/// (0 for the requested version).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub coordinate: ProjectVersion,
    pub rank: usize,
}

pub struct CompatibleVersionResolver<'a, S = BranchAndBoundSolver> {
    cache: &'a DependencyCache,
    solver: S,
}

impl<'a> CompatibleVersionResolver<'a, BranchAndBoundSolver> {
    pub fn new(cache: &'a DependencyCache) -> Self {
        Self {
            cache,
            solver: BranchAndBoundSolver::new(),
        }
    }
}

impl<'a, S: MaxSatSolver> CompatibleVersionResolver<'a, S> {
    pub fn with_solver(cache: &'a DependencyCache, solver: S) -> Self {
        Self { cache, solver }
    }

    /// One version per required `group:artifact`, in the order the families
    /// first appear in `required`, or an empty list when no consistent set
    /// exists within `backtrack_depth` older versions of each.
    pub fn resolve_compatible_versions(
        &self,
        required: &[ProjectVersion],
        backtrack_depth: usize,
    ) -> Vec<ProjectVersion> {
        if required.is_empty() {
            return Vec::new();
        }

        let families = group_required(required);
        let mut encoding = Encoding::default();
        let mut family_vars: Vec<(GroupArtifact, Vec<(Var, usize)>)> = Vec::new();

        for (family, requested) in &families {
            let candidates = candidate_versions(
                self.cache.store(),
                family,
                requested,
                backtrack_depth,
            );
            let mut vars = Vec::new();
            for candidate in candidates {
                let closure = match self.cache.get_transitive_dependencies(&candidate.coordinate) {
                    Ok(closure) => closure,
                    Err(e) => {
                        tracing::debug!("Dropping candidate {}: {e}", candidate.coordinate);
                        continue;
                    }
                };
                let var = encoding.var_for(&candidate.coordinate);
                for member in &closure {
                    let member_var = encoding.var_for(member);
                    encoding.formula.implies(var, member_var);
                }
                vars.push((var, candidate.rank));
            }
            if vars.is_empty() {
                tracing::info!("No usable candidate versions for {family}");
                return Vec::new();
            }
            family_vars.push((family.clone(), vars));
        }

        for (_, vars) in &family_vars {
            let candidates: Vec<Var> = vars.iter().map(|(v, _)| *v).collect();
            encoding.formula.at_least_one(&candidates);
            let max_rank = vars.iter().map(|(_, r)| *r).max().unwrap_or(0);
            for (var, rank) in vars {
                let weight = (max_rank - rank + 1) as u64;
                encoding.formula.add_soft(vec![Lit::pos(*var)], weight);
            }
        }
        encoding.add_version_exclusivity();

        tracing::debug!(
            "Solving compatible versions: {} variables, {} hard, {} soft clauses",
            encoding.formula.num_vars(),
            encoding.formula.hard().len(),
            encoding.formula.soft().len()
        );

        let Some(assignment) = self.solver.solve(&encoding.formula) else {
            tracing::info!("No compatible version set found for {} coordinates", required.len());
            return Vec::new();
        };

        let selected: HashMap<GroupArtifact, ProjectVersion> = assignment
            .true_vars()
            .map(|var| encoding.coordinates[var.index()].clone())
            .filter(|c| families.contains_key(&c.group_artifact()))
            .map(|c| (c.group_artifact(), c))
            .collect();

        family_vars
            .iter()
            .filter_map(|(family, _)| selected.get(family).cloned())
            .collect()
    }
}

/// Variable bookkeeping for one solve.
#[derive(Default)]
struct Encoding {
    formula: Formula,
    vars: HashMap<ProjectVersion, Var>,
    coordinates: Vec<ProjectVersion>,
}

impl Encoding {
    fn var_for(&mut self, coordinate: &ProjectVersion) -> Var {
        if let Some(&var) = self.vars.get(coordinate) {
            return var;
        }
        let var = self.formula.new_var();
        self.vars.insert(coordinate.clone(), var);
        self.coordinates.push(coordinate.clone());
        var
    }

    /// At most one version of each `group:artifact` may be true.
    fn add_version_exclusivity(&mut self) {
        let mut by_family: BTreeMap<GroupArtifact, Vec<Var>> = BTreeMap::new();
        for (coordinate, var) in &self.vars {
            by_family
                .entry(coordinate.group_artifact())
                .or_default()
                .push(*var);
        }
        for vars in by_family.values_mut().filter(|v| v.len() > 1) {
            vars.sort();
            self.formula.at_most_one(vars);
        }
    }
}

/// Required families in first-seen order with their requested versions.
fn group_required(required: &[ProjectVersion]) -> indexed::Families {
    let mut families = indexed::Families::default();
    for coordinate in required {
        families.push(coordinate);
    }
    families
}

/// Candidate versions for one family.
///
/// With `backtrack_depth == 0` only the requested versions are candidates.
/// Otherwise the requested versions come first, followed by up to
/// `backtrack_depth` known versions older than the newest requested one,
/// newest first by numeric dotted-version order.
pub fn candidate_versions(
    store: &dyn CoordinateStore,
    family: &GroupArtifact,
    requested: &[String],
    backtrack_depth: usize,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for version in requested {
        if seen.insert(version.clone()) {
            candidates.push(Candidate {
                coordinate: family.at(version),
                rank: 0,
            });
        }
    }
    if backtrack_depth == 0 {
        return candidates;
    }

    let Some(newest) = requested
        .iter()
        .max_by(|a, b| compare_versions(a, b))
        .cloned()
    else {
        return candidates;
    };
    let mut older: Vec<String> = store
        .find_by_coordinate_prefix(&family.group_id, &family.artifact_id)
        .into_iter()
        .filter(|r| !r.excluded && !r.evicted)
        .map(|r| r.coordinate.version_id)
        .filter(|v| !seen.contains(v) && compare_versions(v, &newest).is_lt())
        .collect();
    sort_descending(&mut older);
    older.dedup();

    candidates.extend(
        older
            .into_iter()
            .take(backtrack_depth)
            .enumerate()
            .map(|(i, version)| Candidate {
                coordinate: family.at(version),
                rank: i + 1,
            }),
    );
    candidates
}

mod indexed {
    use super::*;

    /// Insertion-ordered map from family to requested versions.
    #[derive(Default)]
    pub struct Families {
        order: Vec<(GroupArtifact, Vec<String>)>,
        index: HashMap<GroupArtifact, usize>,
    }

    impl Families {
        pub fn push(&mut self, coordinate: &ProjectVersion) {
            let family = coordinate.group_artifact();
            match self.index.get(&family) {
                Some(&i) => self.order[i].1.push(coordinate.version_id.clone()),
                None => {
                    self.index.insert(family.clone(), self.order.len());
                    self.order
                        .push((family, vec![coordinate.version_id.clone()]));
                }
            }
        }

        pub fn contains_key(&self, family: &GroupArtifact) -> bool {
            self.index.contains_key(family)
        }
    }

    impl<'a> IntoIterator for &'a Families {
        type Item = &'a (GroupArtifact, Vec<String>);
        type IntoIter = std::slice::Iter<'a, (GroupArtifact, Vec<String>)>;

        fn into_iter(self) -> Self::IntoIter {
            self.order.iter()
        }
    }
}
