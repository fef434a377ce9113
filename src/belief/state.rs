//! Accumulated partial knowledge about intended referents.
//!
//! A [`BeliefState`] gathers constraints against a shared
//! [`ReferentialDomain`]: a `target` description every intended entity
//! must satisfy, a `distractor` description none may satisfy, and two
//! arity intervals bounding how many entities are meant and how many
//! consistent entities must be left over. Queries then answer which
//! entities remain individually consistent and which tuples of them are
//! candidate referent sets; [`BeliefState::size`] counts those tuples in
//! closed form, and the count always agrees with enumeration.
//!
//! Constraints arrive through [`BeliefState::merge`] with a keypath into
//! the structure, so a caller narrows the state one assertion at a time
//! and treats a contradiction as a dead end to backtrack from.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHasher};
use tracing::{debug, trace};

use crate::belief::combinatorics::{binomial_range, combinations};
use crate::belief::domain::{entity_num, ReferentialDomain};
use crate::cell::Cell;
use crate::cells::{CellValue, DictCell, IntervalCell};
use crate::error::{CellError, CellResult};
use crate::input::CellInput;

/// Environment variable consumed by the next target-rooted merge.
const NEGATED: &str = "negated";

// ============================================================================
// Merge operators and deferred effects
// ============================================================================

/// How a keypath merge combines the incoming value with the leaf cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeOp {
    /// Coerce the value to the leaf's kind and merge it in.
    #[default]
    Set,
    /// Cap an interval leaf's upper bound at the value's low end.
    AtMost,
    /// Raise an interval leaf's lower bound to the value's high end.
    AtLeast,
}

/// Order in which deferred effects with the same matching prefix run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EffectOrder {
    /// Oldest effect first.
    #[default]
    Fifo,
    /// Newest effect first.
    Lifo,
}

/// Value bound to an environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnvValue {
    /// A flag, such as a pending negation.
    Bool(bool),
    /// A counter or index.
    Int(i64),
    /// A free-form marker.
    Text(String),
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Bool(flag) => write!(f, "{flag}"),
            EnvValue::Int(n) => write!(f, "{n}"),
            EnvValue::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<bool> for EnvValue {
    fn from(value: bool) -> Self {
        EnvValue::Bool(value)
    }
}

impl From<i64> for EnvValue {
    fn from(value: i64) -> Self {
        EnvValue::Int(value)
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::Text(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        EnvValue::Text(value)
    }
}

/// Callback deferred until the part of speech reaches a matching prefix.
pub type DeferredEffect = Arc<dyn Fn(&mut BeliefState) -> CellResult<()> + Send + Sync>;

// ============================================================================
// BeliefState
// ============================================================================

/// Partial description of which subsets of a [`ReferentialDomain`] are
/// the intended referents.
#[derive(Clone)]
pub struct BeliefState {
    domain: Arc<ReferentialDomain>,
    pos: String,
    environment: FxHashMap<String, EnvValue>,
    effects: Vec<(String, DeferredEffect)>,
    effect_order: EffectOrder,
    target: DictCell,
    distractor: DictCell,
    targetset_arity: IntervalCell,
    contrast_arity: IntervalCell,
}

impl BeliefState {
    /// Fresh, maximally uncertain state over `domain`.
    pub fn new(domain: Arc<ReferentialDomain>) -> Self {
        BeliefState {
            domain,
            pos: "S".to_string(),
            environment: FxHashMap::default(),
            effects: Vec::new(),
            effect_order: EffectOrder::Fifo,
            target: DictCell::new(),
            distractor: DictCell::new(),
            targetset_arity: IntervalCell::non_negative(),
            contrast_arity: IntervalCell::non_negative(),
        }
    }

    /// Fresh state with an explicit deferred-effect ordering policy.
    pub fn with_effect_order(domain: Arc<ReferentialDomain>, order: EffectOrder) -> Self {
        let mut state = BeliefState::new(domain);
        state.effect_order = order;
        state
    }

    /// The shared entity domain.
    pub fn domain(&self) -> &Arc<ReferentialDomain> {
        &self.domain
    }

    /// Positive description; consistent entities must entail it.
    pub fn target(&self) -> &DictCell {
        &self.target
    }

    /// Negative description; consistent entities must not entail it.
    pub fn distractor(&self) -> &DictCell {
        &self.distractor
    }

    /// Bounds on how many entities are intended.
    pub fn targetset_arity(&self) -> &IntervalCell {
        &self.targetset_arity
    }

    /// Bounds on how many consistent entities must be left over.
    pub fn contrast_arity(&self) -> &IntervalCell {
        &self.contrast_arity
    }

    // ------------------------------------------------------------------
    // Part of speech and deferred effects
    // ------------------------------------------------------------------

    /// Current part-of-speech tag. States start at `"S"`.
    pub fn pos(&self) -> &str {
        &self.pos
    }

    /// Advance the part-of-speech tag, firing every deferred effect whose
    /// prefix matches the new tag. Fired effects are removed.
    pub fn set_pos(&mut self, pos: impl Into<String>) -> CellResult<()> {
        self.pos = pos.into();
        let mut due = Vec::new();
        let mut waiting = Vec::with_capacity(self.effects.len());
        for (prefix, effect) in self.effects.drain(..) {
            if self.pos.starts_with(&prefix) {
                due.push(effect);
            } else {
                waiting.push((prefix, effect));
            }
        }
        self.effects = waiting;
        if self.effect_order == EffectOrder::Lifo {
            due.reverse();
        }
        debug!(pos = %self.pos, fired = due.len(), "part of speech advanced");
        for effect in due {
            effect(self)?;
        }
        Ok(())
    }

    /// Register a callback to run once the part of speech starts with
    /// `prefix`.
    pub fn add_deferred_effect<F>(&mut self, prefix: impl Into<String>, effect: F)
    where
        F: Fn(&mut BeliefState) -> CellResult<()> + Send + Sync + 'static,
    {
        let prefix = prefix.into();
        debug!(prefix = %prefix, "deferring effect");
        self.effects.push((prefix, Arc::new(effect)));
    }

    /// Number of effects still waiting for a matching prefix.
    pub fn deferred_effect_count(&self) -> usize {
        self.effects.len()
    }

    // ------------------------------------------------------------------
    // Environment variables
    // ------------------------------------------------------------------

    /// Bind an environment variable. Bindings are single-assignment:
    /// rebinding to the same value is a no-op, rebinding to a different
    /// value a contradiction.
    pub fn set_environment_variable(
        &mut self,
        key: impl Into<String>,
        value: impl Into<EnvValue>,
    ) -> CellResult<()> {
        let key = key.into();
        let value = value.into();
        match self.environment.get(&key) {
            Some(existing) if *existing == value => Ok(()),
            Some(existing) => Err(CellError::contradiction(format!(
                "environment variable `{key}` is already bound to `{existing}`"
            ))),
            None => {
                debug!(key = %key, value = %value, "binding environment variable");
                self.environment.insert(key, value);
                Ok(())
            }
        }
    }

    /// Current binding of an environment variable.
    pub fn environment_variable(&self, key: &str) -> Option<&EnvValue> {
        self.environment.get(key)
    }

    /// Remove and return a binding.
    pub fn pop_environment_variable(&mut self, key: &str) -> Option<EnvValue> {
        self.environment.remove(key)
    }

    /// Mark the next target-rooted merge as negated; it will constrain
    /// the distractor instead of the target.
    pub fn negate(&mut self) -> CellResult<()> {
        self.set_environment_variable(NEGATED, true)
    }

    /// Whether a negation is pending.
    pub fn is_negated(&self) -> bool {
        matches!(self.environment.get(NEGATED), Some(EnvValue::Bool(true)))
    }

    // ------------------------------------------------------------------
    // Keypath merge
    // ------------------------------------------------------------------

    /// Merge a value into the structure at `path`.
    ///
    /// Paths are rooted at `target`, `distractor`, `targetset_arity`, or
    /// `contrast_arity`. A field missing under one of the description
    /// roots is created on demand by stemming the same field from the
    /// first consistent entity that carries it, so new assertions always
    /// land in a cell of the entity's kind. A pending negation redirects
    /// one target-rooted merge to the distractor and is consumed.
    pub fn merge(
        &mut self,
        path: &[&str],
        value: impl Into<CellInput>,
        op: MergeOp,
    ) -> CellResult<()> {
        let (root, rest) = match path.split_first() {
            Some(split) => split,
            None => return Err(CellError::UnknownPath { path: String::new() }),
        };
        let value = value.into();
        debug!(path = %path.join("."), op = ?op, "merging");
        match *root {
            "targetset_arity" => apply_interval_op(&mut self.targetset_arity, &value, op),
            "contrast_arity" => apply_interval_op(&mut self.contrast_arity, &value, op),
            "target" => {
                if self.is_negated() {
                    self.pop_environment_variable(NEGATED);
                    self.merge_description(true, rest, &value, op)
                } else {
                    self.merge_description(false, rest, &value, op)
                }
            }
            "distractor" => self.merge_description(true, rest, &value, op),
            _ => Err(CellError::UnknownPath {
                path: path.join("."),
            }),
        }
    }

    fn merge_description(
        &mut self,
        into_distractor: bool,
        rest: &[&str],
        value: &CellInput,
        op: MergeOp,
    ) -> CellResult<()> {
        if rest.is_empty() {
            if op != MergeOp::Set {
                return Err(CellError::construction(
                    "BeliefState",
                    "whole-description merges only support `set`",
                ));
            }
            let incoming = match value {
                CellInput::Cell(CellValue::Dict(dict)) => dict,
                other => {
                    return Err(CellError::construction(
                        "BeliefState",
                        format!("expected a structured description, found {}", other.shape()),
                    ))
                }
            };
            let description = self.description_mut(into_distractor);
            return description.merge(incoming);
        }

        let stem = if self
            .description(into_distractor)
            .value_at_path(rest)
            .is_none()
        {
            Some(self.stem_for_path(rest)?)
        } else {
            None
        };

        let description = self.description_mut(into_distractor);
        if let Some(stem) = stem {
            insert_at_path(description, rest, stem)?;
        }
        let leaf = description
            .value_at_path_mut(rest)
            .ok_or_else(|| CellError::UnknownPath {
                path: rest.join("."),
            })?;
        apply_op(leaf, value, op)
    }

    fn description(&self, into_distractor: bool) -> &DictCell {
        if into_distractor {
            &self.distractor
        } else {
            &self.target
        }
    }

    fn description_mut(&mut self, into_distractor: bool) -> &mut DictCell {
        if into_distractor {
            &mut self.distractor
        } else {
            &mut self.target
        }
    }

    /// Maximally uncertain cell for a path the description does not carry
    /// yet, shaped after the first consistent entity that has it.
    fn stem_for_path(&self, rest: &[&str]) -> CellResult<CellValue> {
        let mut any_consistent = false;
        for entity in self.iter_singleton_referents() {
            any_consistent = true;
            if let Some(template) = entity.value_at_path(rest) {
                trace!(path = %rest.join("."), kind = template.kind(), "stemming field");
                return Ok(template.stem());
            }
        }
        if any_consistent {
            Err(CellError::construction(
                "BeliefState",
                format!("no consistent entity has the path `{}`", rest.join(".")),
            ))
        } else {
            Err(CellError::construction(
                "BeliefState",
                "no consistent entities remain",
            ))
        }
    }

    // ------------------------------------------------------------------
    // Referent queries
    // ------------------------------------------------------------------

    /// Entities individually consistent with the current descriptions:
    /// each entails the target and, once the distractor asserts anything,
    /// does not entail the distractor.
    pub fn iter_singleton_referents(&self) -> impl Iterator<Item = &DictCell> {
        self.domain.iter().filter(move |entity| {
            self.target.is_entailed_by(entity)
                && (self.distractor.is_empty() || !self.distractor.is_entailed_by(entity))
        })
    }

    /// Count of individually consistent entities.
    pub fn number_of_singleton_referents(&self) -> usize {
        self.iter_singleton_referents().count()
    }

    /// Sorted positions of the individually consistent entities.
    pub fn singleton_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .iter_singleton_referents()
            .filter_map(entity_num)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Candidate referent tuples: every combination of consistent
    /// entities whose size fits `targetset_arity` and whose complement
    /// fits `contrast_arity`, larger tuples first.
    pub fn iter_referents_tuples(&self) -> impl Iterator<Item = Vec<usize>> {
        let singles = self.singleton_ids();
        let (low, high) = self.tuple_bounds(singles.len());
        (low..=high)
            .rev()
            .flat_map(move |r| combinations(singles.clone(), r))
    }

    /// All candidate referent tuples, collected.
    pub fn referents(&self) -> Vec<Vec<usize>> {
        self.iter_referents_tuples().collect()
    }

    /// Number of candidate referent tuples, in closed form.
    ///
    /// Always equals the length of [`Self::iter_referents_tuples`]: with
    /// `t` consistent entities and no arity constraints this is
    /// `2^t - 1`, and every constraint narrows the summed binomial range
    /// the same way it narrows the enumeration.
    pub fn size(&self) -> u64 {
        let t = self.number_of_singleton_referents();
        let (low, high) = self.tuple_bounds(t);
        if low > high {
            return 0;
        }
        binomial_range(t as u64, low as u64, high as u64)
    }

    /// Whether the count of consistent entities fits `targetset_arity`.
    pub fn is_arity_consistent(&self) -> bool {
        let n = self.number_of_singleton_referents() as f64;
        !self.targetset_arity.is_contradictory(&IntervalCell::point(n))
    }

    /// Valid tuple sizes `r` for `t` consistent entities.
    ///
    /// `r` must fit the target arity, and the complement `t - r` must fit
    /// the contrast arity. An empty range comes back as `(1, 0)`.
    fn tuple_bounds(&self, t: usize) -> (usize, usize) {
        let t = t as f64;
        let (target_low, target_high) = self.targetset_arity.bounds();
        let (contrast_low, contrast_high) = self.contrast_arity.bounds();
        let low = 1f64.max(target_low).max(t - contrast_high);
        let high = t.min(target_high).min(t - contrast_low.max(0.0));
        if low > high {
            (1, 0)
        } else {
            (low.ceil() as usize, high.floor() as usize)
        }
    }

    /// Count how often each rendered value occurs at `path` across the
    /// consistent entities, most frequent first, ties broken by value.
    ///
    /// A leading `target` segment is accepted and dropped, since entity
    /// fields live at the top level. Entities missing the path are
    /// skipped.
    pub fn ordered_value_counts(&self, path: &[&str]) -> Vec<(String, usize)> {
        let path = match path.split_first() {
            Some((&"target", rest)) => rest,
            _ => path,
        };
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for entity in self.iter_singleton_referents() {
            if let Some(value) = entity.value_at_path(path) {
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }
        }
        let mut ordered: Vec<(String, usize)> = counts.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ordered
    }

    // ------------------------------------------------------------------
    // Comparison and hashing
    // ------------------------------------------------------------------

    /// Structural equality over everything a search distinguishes: part
    /// of speech, environment, both descriptions, and both arities.
    pub fn is_equal(&self, other: &Self) -> bool {
        self.pos == other.pos
            && self.environment == other.environment
            && self.target.is_equal(&other.target)
            && self.distractor.is_equal(&other.distractor)
            && self.targetset_arity.is_equal(&other.targetset_arity)
            && self.contrast_arity.is_equal(&other.contrast_arity)
    }

    /// Whether `other` carries at least as much information in every
    /// constraint slot.
    pub fn is_entailed_by(&self, other: &Self) -> bool {
        self.target.is_entailed_by(&other.target)
            && self.distractor.is_entailed_by(&other.distractor)
            && self.targetset_arity.is_entailed_by(&other.targetset_arity)
            && self.contrast_arity.is_entailed_by(&other.contrast_arity)
    }

    /// Inverse of [`Self::is_entailed_by`].
    pub fn entails(&self, other: &Self) -> bool {
        other.is_entailed_by(self)
    }

    /// Whether any corresponding pair of constraint slots is
    /// incompatible.
    pub fn is_contradictory(&self, other: &Self) -> bool {
        self.target.is_contradictory(&other.target)
            || self.distractor.is_contradictory(&other.distractor)
            || self.targetset_arity.is_contradictory(&other.targetset_arity)
            || self.contrast_arity.is_contradictory(&other.contrast_arity)
    }

    /// Hash over the same parts as [`Self::is_equal`]; searches use it to
    /// dedupe explored states.
    pub fn content_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.pos.hash(&mut hasher);
        let mut bindings: Vec<(&String, &EnvValue)> = self.environment.iter().collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in bindings {
            key.hash(&mut hasher);
            value.hash(&mut hasher);
        }
        self.target.content_hash().hash(&mut hasher);
        self.distractor.content_hash().hash(&mut hasher);
        self.targetset_arity.content_hash().hash(&mut hasher);
        self.contrast_arity.content_hash().hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Debug for BeliefState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeliefState")
            .field("pos", &self.pos)
            .field("environment", &self.environment)
            .field("deferred_effects", &self.effects.len())
            .field("effect_order", &self.effect_order)
            .field("target", &self.target)
            .field("distractor", &self.distractor)
            .field("targetset_arity", &self.targetset_arity)
            .field("contrast_arity", &self.contrast_arity)
            .finish()
    }
}

impl fmt::Display for BeliefState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pos: {}", self.pos)?;
        writeln!(f, "targetset_arity: {}", self.targetset_arity)?;
        writeln!(f, "contrast_arity: {}", self.contrast_arity)?;
        writeln!(f, "target:")?;
        write!(f, "{}", self.target)?;
        writeln!(f, "distractor:")?;
        write!(f, "{}", self.distractor)
    }
}

// ============================================================================
// Leaf operators
// ============================================================================

fn apply_op(leaf: &mut CellValue, value: &CellInput, op: MergeOp) -> CellResult<()> {
    match op {
        MergeOp::Set => {
            let incoming = leaf.coerce_like(value)?;
            leaf.merge(&incoming)
        }
        MergeOp::AtMost | MergeOp::AtLeast => match leaf {
            CellValue::Interval(interval) => apply_interval_op(interval, value, op),
            other => Err(CellError::construction(
                "BeliefState",
                format!("bound constraints apply to intervals, found {}", other.kind()),
            )),
        },
    }
}

fn apply_interval_op(interval: &mut IntervalCell, value: &CellInput, op: MergeOp) -> CellResult<()> {
    let incoming = IntervalCell::coerce(value)?;
    match op {
        MergeOp::Set => interval.merge(&incoming),
        MergeOp::AtMost => interval.at_most(incoming.low()),
        MergeOp::AtLeast => interval.at_least(incoming.high()),
    }
}

/// Insert `cell` at `path`, creating empty intermediate structures.
fn insert_at_path(description: &mut DictCell, path: &[&str], cell: CellValue) -> CellResult<()> {
    let (leaf, parents) = match path.split_last() {
        Some(split) => split,
        None => {
            return Err(CellError::UnknownPath {
                path: String::new(),
            })
        }
    };
    let mut current = description;
    for key in parents {
        if !current.contains_key(key) {
            current.insert(*key, CellValue::from(DictCell::new()));
        }
        current = current
            .get_mut(key)
            .and_then(CellValue::as_dict_mut)
            .ok_or_else(|| CellError::UnknownPath {
                path: path.join("."),
            })?;
    }
    if !current.contains_key(leaf) {
        current.insert(*leaf, cell);
    }
    Ok(())
}
