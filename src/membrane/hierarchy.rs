//! The membrane hierarchy: a complete binary tree of membranes driven in steps.
//!
//! All membranes live in one flat registry (creation order, root first).
//! Parent/child links are registry indices, so the registry alone owns every
//! node and the tree shape never changes after construction; only object
//! contents mutate.
//!
//! # Step semantics
//!
//! [`system_step`](MembraneHierarchy::system_step) first evolves every
//! membrane in registry order, then runs transport in registry order: each
//! membrane passes to its parent, then to each child in child order. Every
//! pass sees the lists as already mutated by earlier passes in the same step.
//!
//! # Concurrency
//!
//! No internal synchronization. Mutators take `&mut self`; wrap the hierarchy
//! in a lock to share it between threads.

use super::membrane::{Membrane, MembraneId};
use super::object::Object;
use super::rule::{default_rules, EvolutionRule, MatchMode};
use crate::error::{ReservoirError, Result};
use tracing::{debug, trace};

/// Id of the root membrane.
pub const ROOT_ID: &str = "root";

/// What happened during one or more system steps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Rules that fired across all membranes.
    pub rules_fired: usize,
    /// Objects that crossed a boundary.
    pub objects_moved: usize,
}

impl StepSummary {
    fn absorb(&mut self, other: StepSummary) {
        self.rules_fired += other.rules_fired;
        self.objects_moved += other.objects_moved;
    }
}

/// A P-system: hierarchical membranes with object evolution and transport.
///
/// # Example
///
/// ```rust
/// use reservoir::membrane::{MembraneHierarchy, Object};
///
/// let mut system = MembraneHierarchy::new(3);
/// system.inject_object("root_0", Object::neutral("token", 1.0, 0.1))?;
/// system.inject_object("root_0", Object::new("negative_signal", 1.5, -1, 0.1))?;
/// system.system_step();
///
/// // Produced in root_0, then mobile enough to cross up into root
/// let spam = &system.root().objects()[0];
/// assert_eq!(spam.kind, "spam_score");
/// # Ok::<(), reservoir::ReservoirError>(())
/// ```
#[derive(Clone, Debug)]
pub struct MembraneHierarchy {
    membranes: Vec<Membrane>,
    depth: usize,
    steps: u64,
}

impl MembraneHierarchy {
    /// Build a complete binary tree of the given depth.
    ///
    /// The root has permeability 1.0 and no rules. A membrane at level `l`
    /// has permeability `0.5 + 0.1·l` and its own copy of
    /// [`default_rules`]. Depth 0 and 1 both yield the root alone.
    pub fn new(depth: usize) -> Self {
        Self::build(depth, |level| 0.5 + 0.1 * level as f64, default_rules)
    }

    /// Same tree shape, every non-root membrane at `permeability`, no rules.
    pub fn uniform(depth: usize, permeability: f64) -> Self {
        Self::build(depth, |_| permeability, Vec::new)
    }

    fn build(
        depth: usize,
        permeability: impl Fn(usize) -> f64,
        rules: impl Fn() -> Vec<EvolutionRule>,
    ) -> Self {
        let mut system = Self {
            membranes: vec![Membrane::new(ROOT_ID, 0, 1.0)],
            depth,
            steps: 0,
        };
        system.build_children(MembraneId(0), depth, 1, &permeability, &rules);
        system
    }

    fn build_children(
        &mut self,
        parent: MembraneId,
        max_depth: usize,
        level: usize,
        permeability: &impl Fn(usize) -> f64,
        rules: &impl Fn() -> Vec<EvolutionRule>,
    ) {
        if level >= max_depth {
            return;
        }

        for i in 0..2 {
            let id = format!("{}_{}", self.membranes[parent.0].id(), i);
            let mut child = Membrane::new(id, level, permeability(level));
            for rule in rules() {
                child.add_rule(rule);
            }
            child.parent = Some(parent);

            let child_id = MembraneId(self.membranes.len());
            self.membranes.push(child);
            self.membranes[parent.0].children.push(child_id);

            self.build_children(child_id, max_depth, level + 1, permeability, rules);
        }
    }

    // --- Accessors ---

    /// Depth the tree was built with.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of completed system steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Number of membranes in the registry.
    pub fn len(&self) -> usize {
        self.membranes.len()
    }

    /// Always false: the root exists for every depth.
    pub fn is_empty(&self) -> bool {
        self.membranes.is_empty()
    }

    pub fn root(&self) -> &Membrane {
        &self.membranes[0]
    }

    pub fn root_id(&self) -> MembraneId {
        MembraneId(0)
    }

    pub fn get(&self, id: MembraneId) -> Option<&Membrane> {
        self.membranes.get(id.0)
    }

    pub fn get_mut(&mut self, id: MembraneId) -> Option<&mut Membrane> {
        self.membranes.get_mut(id.0)
    }

    /// Look up a membrane's registry id by name.
    pub fn find(&self, name: &str) -> Option<MembraneId> {
        self.membranes
            .iter()
            .position(|m| m.id() == name)
            .map(MembraneId)
    }

    /// Look up a membrane by name.
    pub fn membrane(&self, name: &str) -> Option<&Membrane> {
        self.find(name).map(|id| &self.membranes[id.0])
    }

    /// Registry-order iteration.
    pub fn iter(&self) -> impl Iterator<Item = &Membrane> {
        self.membranes.iter()
    }

    /// Switch every membrane's rule matcher.
    pub fn set_match_mode(&mut self, mode: MatchMode) {
        for m in &mut self.membranes {
            m.set_match_mode(mode);
        }
    }

    // --- Operations ---

    /// Append an object to the named membrane.
    pub fn inject_object(&mut self, name: &str, object: Object) -> Result<()> {
        let id = self
            .find(name)
            .ok_or_else(|| ReservoirError::NotFound(name.to_string()))?;
        self.membranes[id.0].add_object(object);
        Ok(())
    }

    /// Move passing objects from `source` into `target`.
    ///
    /// Fails with `NilTarget` if `target` is `None` and `NotFound` for an id
    /// outside the registry. Passing a membrane to itself moves nothing.
    pub fn pass_objects(&mut self, source: MembraneId, target: Option<MembraneId>) -> Result<usize> {
        let target = target.ok_or(ReservoirError::NilTarget)?;
        self.check(source)?;
        self.check(target)?;
        if source == target {
            return Ok(0);
        }

        let (src, dst) = pair_mut(&mut self.membranes, source.0, target.0);
        Ok(src.transfer_to(dst))
    }

    /// Evolve every membrane, then run transport; see the module docs.
    pub fn system_step(&mut self) -> StepSummary {
        let mut summary = StepSummary::default();

        for membrane in &mut self.membranes {
            summary.rules_fired += membrane.evolve();
        }

        for i in 0..self.membranes.len() {
            let parent = self.membranes[i].parent;
            let children = self.membranes[i].children.clone();

            let targets = parent.into_iter().chain(children);
            for target in targets {
                let (src, dst) = pair_mut(&mut self.membranes, i, target.0);
                summary.objects_moved += src.transfer_to(dst);
            }
        }

        self.steps += 1;
        trace!(
            step = self.steps,
            rules_fired = summary.rules_fired,
            objects_moved = summary.objects_moved,
            "membrane system step"
        );
        summary
    }

    /// Run `n` system steps.
    pub fn run(&mut self, n: usize) -> StepSummary {
        let mut total = StepSummary::default();
        for _ in 0..n {
            total.absorb(self.system_step());
        }
        total
    }

    /// Objects of every leaf membrane, concatenated in registry order.
    pub fn collect_results(&self) -> Vec<Object> {
        self.membranes
            .iter()
            .filter(|m| m.is_leaf())
            .flat_map(|m| m.objects().iter().cloned())
            .collect()
    }

    /// Membranes whose [`compute_dissolution`](Membrane::compute_dissolution) holds.
    pub fn dissolution_candidates(&self) -> Vec<MembraneId> {
        self.membranes
            .iter()
            .enumerate()
            .filter(|(_, m)| m.compute_dissolution())
            .map(|(i, _)| MembraneId(i))
            .collect()
    }

    /// Move every object of a membrane into its parent, unconditionally.
    ///
    /// The tree shape is unchanged; only contents move. The root has no
    /// parent and fails with `NilTarget`.
    pub fn release_to_parent(&mut self, id: MembraneId) -> Result<usize> {
        self.check(id)?;
        let parent = self.membranes[id.0].parent.ok_or(ReservoirError::NilTarget)?;

        let released = self.membranes[id.0].take_objects();
        let count = released.len();
        for object in released {
            self.membranes[parent.0].add_object(object);
        }

        debug!(
            membrane = self.membranes[id.0].id(),
            parent = self.membranes[parent.0].id(),
            released = count,
            "membrane released contents to parent"
        );
        Ok(count)
    }

    fn check(&self, id: MembraneId) -> Result<()> {
        if id.0 < self.membranes.len() {
            Ok(())
        } else {
            Err(ReservoirError::NotFound(format!("#{}", id.0)))
        }
    }
}

/// Borrow two distinct registry entries mutably.
fn pair_mut(membranes: &mut [Membrane], a: usize, b: usize) -> (&mut Membrane, &mut Membrane) {
    assert_ne!(a, b, "pair_mut needs two distinct indices");
    if a < b {
        let (left, right) = membranes.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = membranes.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membrane::object::{NEGATIVE, POSITIVE};

    fn ids(system: &MembraneHierarchy) -> Vec<&str> {
        system.iter().map(|m| m.id()).collect()
    }

    #[test]
    fn test_build_depth_three() {
        let system = MembraneHierarchy::new(3);
        assert_eq!(system.len(), 7);
        assert_eq!(
            ids(&system),
            vec!["root", "root_0", "root_0_0", "root_0_1", "root_1", "root_1_0", "root_1_1"]
        );

        let root = system.root();
        assert_eq!(root.level(), 0);
        assert_eq!(root.permeability(), 1.0);
        assert!(root.rules().is_empty());

        let child = system.membrane("root_1").unwrap();
        assert_eq!(child.level(), 1);
        assert!((child.permeability() - 0.6).abs() < 1e-12);
        assert_eq!(child.rules().len(), 3);

        let grandchild = system.membrane("root_1_0").unwrap();
        assert!((grandchild.permeability() - 0.7).abs() < 1e-12);
        assert!(grandchild.is_leaf());
    }

    #[test]
    fn test_levels_follow_parents() {
        let system = MembraneHierarchy::new(4);
        assert_eq!(system.len(), 15);
        for m in system.iter() {
            match m.parent() {
                Some(p) => assert_eq!(m.level(), system.get(p).unwrap().level() + 1),
                None => assert_eq!(m.level(), 0),
            }
            for &c in m.children() {
                assert_eq!(system.get(c).unwrap().parent(), system.find(m.id()));
            }
        }
    }

    #[test]
    fn test_shallow_depths_are_root_only() {
        for depth in [0, 1] {
            let system = MembraneHierarchy::new(depth);
            assert_eq!(system.len(), 1);
            assert!(system.root().is_leaf());
        }
    }

    #[test]
    fn test_uniform_permeability() {
        let system = MembraneHierarchy::uniform(3, 0.8);
        assert_eq!(system.root().permeability(), 1.0);
        for m in system.iter().skip(1) {
            assert_eq!(m.permeability(), 0.8);
            assert!(m.rules().is_empty());
        }
    }

    #[test]
    fn test_inject_object() {
        let mut system = MembraneHierarchy::new(3);
        system
            .inject_object("root", Object::neutral("test", 1.0, 0.5))
            .unwrap();
        assert_eq!(system.root().objects().len(), 1);

        assert!(matches!(
            system.inject_object("nowhere", Object::neutral("test", 1.0, 0.5)),
            Err(ReservoirError::NotFound(name)) if name == "nowhere"
        ));
    }

    #[test]
    fn test_fresh_hierarchy_collects_nothing() {
        assert!(MembraneHierarchy::new(3).collect_results().is_empty());
    }

    #[test]
    fn test_step_evolves_before_transport() {
        let mut system = MembraneHierarchy::new(2);
        // Low mobility: the objects stay put and the spam rule fires in root_0
        system
            .inject_object("root_0", Object::neutral("token", 1.0, 0.1))
            .unwrap();
        system
            .inject_object("root_0", Object::new("negative_signal", 2.0, NEGATIVE, 0.1))
            .unwrap();

        let summary = system.system_step();
        assert_eq!(summary.rules_fired, 1);
        assert_eq!(system.steps(), 1);

        // spam_score: 0.6 * 0.8 * 1.2 = 0.576 > 0.5, so it moves up to root
        assert!(system.membrane("root_0").unwrap().objects().is_empty());
        assert_eq!(
            system.root().objects(),
            &[Object::new("spam_score", 2.0, NEGATIVE, 0.8)]
        );
        assert_eq!(summary.objects_moved, 1);
    }

    #[test]
    fn test_transport_follows_registry_order() {
        let mut system = MembraneHierarchy::new(2);
        system
            .inject_object("root", Object::new("positive_signal", 1.0, POSITIVE, 1.0))
            .unwrap();

        let summary = system.system_step();

        // root moves the object into root_0 (its first child), leaving nothing
        // for root_1. root_0 comes later in the registry and sends it back up.
        assert_eq!(summary.objects_moved, 2);
        assert_eq!(summary.rules_fired, 0);
        assert_eq!(system.root().objects().len(), 1);
        assert!(system.membrane("root_0").unwrap().objects().is_empty());
        assert!(system.membrane("root_1").unwrap().objects().is_empty());
    }

    #[test]
    fn test_pass_objects_errors() {
        let mut system = MembraneHierarchy::new(2);
        let root = system.root_id();
        assert!(matches!(
            system.pass_objects(root, None),
            Err(ReservoirError::NilTarget)
        ));
        assert!(matches!(
            system.pass_objects(root, Some(MembraneId(99))),
            Err(ReservoirError::NotFound(_))
        ));
        assert_eq!(system.pass_objects(root, Some(root)).unwrap(), 0);
    }

    #[test]
    fn test_pass_objects_between_named_membranes() {
        let mut system = MembraneHierarchy::new(2);
        system
            .inject_object("root", Object::new("negative_signal", 1.0, NEGATIVE, 1.0))
            .unwrap();
        let root = system.root_id();
        let leaf = system.find("root_1");

        assert_eq!(system.pass_objects(root, leaf).unwrap(), 1);
        assert_eq!(system.membrane("root_1").unwrap().objects().len(), 1);
    }

    #[test]
    fn test_collect_results_reads_leaves_only() {
        let mut system = MembraneHierarchy::new(3);
        system.inject_object("root", Object::neutral("a", 0.0, 0.0)).unwrap();
        system.inject_object("root_0", Object::neutral("b", 0.0, 0.0)).unwrap();
        system.inject_object("root_0_1", Object::neutral("c", 0.0, 0.0)).unwrap();
        system.inject_object("root_1_0", Object::neutral("d", 0.0, 0.0)).unwrap();

        let kinds: Vec<String> = system.collect_results().into_iter().map(|o| o.kind).collect();
        assert_eq!(kinds, vec!["c", "d"]);
    }

    #[test]
    fn test_dissolution_candidates_and_release() {
        let mut system = MembraneHierarchy::new(2);
        for _ in 0..11 {
            system
                .inject_object("root_1", Object::new("negative_signal", 1.0, NEGATIVE, 0.0))
                .unwrap();
        }

        let candidates = system.dissolution_candidates();
        assert_eq!(candidates, vec![system.find("root_1").unwrap()]);

        let released = system.release_to_parent(candidates[0]).unwrap();
        assert_eq!(released, 11);
        assert!(system.membrane("root_1").unwrap().objects().is_empty());
        assert_eq!(system.root().objects().len(), 11);
        assert_eq!(system.len(), 3);
        assert!(system.dissolution_candidates().contains(&system.root_id()));

        assert!(matches!(
            system.release_to_parent(system.root_id()),
            Err(ReservoirError::NilTarget)
        ));
    }

    #[test]
    fn test_run_counts_steps() {
        let mut system = MembraneHierarchy::new(3);
        system.run(3);
        assert_eq!(system.steps(), 3);
    }
}
