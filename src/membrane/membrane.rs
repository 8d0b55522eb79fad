//! A single P-system membrane: objects, rules, and boundary transport.

use super::object::Object;
use super::rule::{EvolutionRule, MatchMode};
use crate::error::{ReservoirError, Result};
use std::cmp::Reverse;

/// Objects cross a boundary when `permeability · mobility · boost` exceeds this.
pub const PASS_THRESHOLD: f64 = 0.5;
/// Multiplier applied to charged objects in the transport test.
pub const CHARGE_BOOST: f64 = 1.2;
/// A membrane holding more charged objects than this reports dissolution.
pub const DISSOLUTION_THRESHOLD: usize = 10;

/// Index of a membrane in its hierarchy's registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MembraneId(pub(crate) usize);

impl MembraneId {
    /// Position in registry (creation) order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A membrane in the P-system hierarchy.
///
/// Parent and child links are registry indices; the owning
/// [`MembraneHierarchy`](super::MembraneHierarchy) controls every node's lifetime.
#[derive(Clone, Debug)]
pub struct Membrane {
    id: String,
    level: usize,
    permeability: f64,
    objects: Vec<Object>,
    rules: Vec<EvolutionRule>,
    match_mode: MatchMode,
    pub(crate) parent: Option<MembraneId>,
    pub(crate) children: Vec<MembraneId>,
}

impl Membrane {
    /// Create a detached membrane with no objects, rules, or links.
    pub fn new(id: impl Into<String>, level: usize, permeability: f64) -> Self {
        Self {
            id: id.into(),
            level,
            permeability,
            objects: Vec::new(),
            rules: Vec::new(),
            match_mode: MatchMode::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Depth in the hierarchy (0 = root).
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn permeability(&self) -> f64 {
        self.permeability
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn rules(&self) -> &[EvolutionRule] {
        &self.rules
    }

    pub fn parent(&self) -> Option<MembraneId> {
        self.parent
    }

    pub fn children(&self) -> &[MembraneId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn set_match_mode(&mut self, mode: MatchMode) {
        self.match_mode = mode;
    }

    pub fn add_object(&mut self, object: Object) {
        self.objects.push(object);
    }

    pub fn add_rule(&mut self, rule: EvolutionRule) {
        self.rules.push(rule);
    }

    /// Remove and return every object, leaving the membrane empty.
    pub fn take_objects(&mut self) -> Vec<Object> {
        std::mem::take(&mut self.objects)
    }

    /// Apply this membrane's rules once and return how many fired.
    ///
    /// Rules run in descending priority; equal priorities keep insertion
    /// order. Each rule fires at most once, on the first complete match among
    /// objects not consumed by an earlier rule. Afterwards the object list is
    /// the unconsumed originals (order kept) followed by everything produced,
    /// in production order.
    pub fn evolve(&mut self) -> usize {
        if self.rules.is_empty() || self.objects.is_empty() {
            return 0;
        }

        let mut ordered: Vec<&EvolutionRule> = self.rules.iter().collect();
        ordered.sort_by_key(|r| Reverse(r.priority));

        let mut consumed = vec![false; self.objects.len()];
        let mut produced = Vec::new();
        let mut fired = 0;

        for rule in ordered {
            let Some(indices) = rule.find_match(&self.objects, &consumed, self.match_mode) else {
                continue;
            };
            for &i in &indices {
                consumed[i] = true;
            }
            let inputs: Vec<Object> = indices.iter().map(|&i| self.objects[i].clone()).collect();
            produced.extend(rule.apply(&inputs));
            fired += 1;
        }

        if fired > 0 {
            let mut remaining: Vec<Object> = self
                .objects
                .drain(..)
                .zip(consumed)
                .filter(|(_, used)| !used)
                .map(|(obj, _)| obj)
                .collect();
            remaining.extend(produced);
            self.objects = remaining;
        }
        fired
    }

    /// Whether `object` would cross this membrane's boundary.
    ///
    /// A fixed threshold test, not a sampled probability: identical inputs
    /// always give the same answer.
    pub fn passes(&self, object: &Object) -> bool {
        let boost = if object.is_charged() { CHARGE_BOOST } else { 1.0 };
        self.permeability * object.mobility * boost > PASS_THRESHOLD
    }

    /// Move every object that passes the boundary test into `target`.
    ///
    /// Returns the number of objects moved.
    pub fn pass_objects(&mut self, target: Option<&mut Membrane>) -> Result<usize> {
        let target = target.ok_or(ReservoirError::NilTarget)?;
        Ok(self.transfer_to(target))
    }

    /// Move every passing object into `target` and return how many moved.
    pub(crate) fn transfer_to(&mut self, target: &mut Membrane) -> usize {
        let (moving, staying): (Vec<Object>, Vec<Object>) = std::mem::take(&mut self.objects)
            .into_iter()
            .partition(|obj| self.passes(obj));
        self.objects = staying;

        let moved = moving.len();
        target.objects.extend(moving);
        moved
    }

    /// Number of objects with non-zero charge.
    pub fn charged_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_charged()).count()
    }

    /// True if the charged-object count exceeds [`DISSOLUTION_THRESHOLD`].
    ///
    /// Advisory only: nothing in the membrane changes.
    pub fn compute_dissolution(&self) -> bool {
        self.charged_count() > DISSOLUTION_THRESHOLD
    }
}
