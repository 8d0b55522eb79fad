//! Evolution rules and the default spam/ham rule set.

use super::object::{Object, NEGATIVE, POSITIVE};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Transformation applied to the objects a rule matched.
pub type Transform = Arc<dyn Fn(&[Object]) -> Vec<Object> + Send + Sync>;

/// How a rule's required input types are matched against membrane objects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// One object per *distinct* required type. A type listed twice is
    /// satisfied by a single object.
    #[default]
    Distinct,
    /// Required types form a multiset: a type listed `k` times consumes `k`
    /// distinct objects of that type.
    Multiset,
}

/// A P-system rewriting rule.
///
/// Higher `priority` runs first. `output_types` is informational; what the
/// rule actually produces is decided by `transform`.
#[derive(Clone)]
pub struct EvolutionRule {
    pub name: String,
    pub priority: i32,
    pub input_types: Vec<String>,
    pub output_types: Vec<String>,
    transform: Transform,
}

impl EvolutionRule {
    pub fn new<F>(
        name: impl Into<String>,
        priority: i32,
        input_types: &[&str],
        output_types: &[&str],
        transform: F,
    ) -> Self
    where
        F: Fn(&[Object]) -> Vec<Object> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            input_types: input_types.iter().map(|s| s.to_string()).collect(),
            output_types: output_types.iter().map(|s| s.to_string()).collect(),
            transform: Arc::new(transform),
        }
    }

    /// Run the transform on matched objects.
    pub fn apply(&self, matched: &[Object]) -> Vec<Object> {
        (self.transform)(matched)
    }

    /// Find the first complete match among objects not yet consumed.
    ///
    /// Scans `objects` in index order and greedily claims the earliest
    /// eligible object for each outstanding requirement. Returns the claimed
    /// indices in claim order, or `None` if some requirement is left
    /// unsatisfied. A rule with no input types never matches.
    pub fn find_match(
        &self,
        objects: &[Object],
        consumed: &[bool],
        mode: MatchMode,
    ) -> Option<Vec<usize>> {
        if self.input_types.is_empty() {
            return None;
        }

        let mut needed: HashMap<&str, usize> = HashMap::new();
        for t in &self.input_types {
            let count = needed.entry(t.as_str()).or_insert(0);
            match mode {
                MatchMode::Distinct => *count = 1,
                MatchMode::Multiset => *count += 1,
            }
        }
        let mut outstanding: usize = needed.values().sum();

        let mut matched = Vec::with_capacity(outstanding);
        for (i, obj) in objects.iter().enumerate() {
            if consumed.get(i).copied().unwrap_or(false) {
                continue;
            }
            if let Some(count) = needed.get_mut(obj.kind.as_str()) {
                if *count > 0 {
                    *count -= 1;
                    outstanding -= 1;
                    matched.push(i);
                    if outstanding == 0 {
                        return Some(matched);
                    }
                }
            }
        }
        None
    }
}

impl fmt::Debug for EvolutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvolutionRule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("input_types", &self.input_types)
            .field("output_types", &self.output_types)
            .finish_non_exhaustive()
    }
}

/// The default rule set given to every non-root membrane.
///
/// - `spam_detection` (100): `token + negative_signal → spam_score`
/// - `ham_detection` (100): `token + positive_signal → ham_score`
/// - `affective_modulation` (50): `emotion_signal → modulated_signal`, value × 1.1
pub fn default_rules() -> Vec<EvolutionRule> {
    vec![
        EvolutionRule::new(
            "spam_detection",
            100,
            &["token", "negative_signal"],
            &["spam_score"],
            |objs| {
                let total: f64 = objs
                    .iter()
                    .filter(|o| o.is_spam_leaning())
                    .map(|o| o.value)
                    .sum();
                vec![Object::new("spam_score", total, NEGATIVE, 0.8)]
            },
        ),
        EvolutionRule::new(
            "ham_detection",
            100,
            &["token", "positive_signal"],
            &["ham_score"],
            |objs| {
                let total: f64 = objs
                    .iter()
                    .filter(|o| o.is_ham_leaning())
                    .map(|o| o.value)
                    .sum();
                vec![Object::new("ham_score", total, POSITIVE, 0.8)]
            },
        ),
        EvolutionRule::new(
            "affective_modulation",
            50,
            &["emotion_signal"],
            &["modulated_signal"],
            |objs| {
                objs.iter()
                    .map(|o| Object {
                        kind: "modulated_signal".to_string(),
                        value: o.value * 1.1,
                        ..o.clone()
                    })
                    .collect()
            },
        ),
    ]
}
