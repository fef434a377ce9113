//! The finite entity domain a belief state reasons over.
//!
//! A [`ReferentialDomain`] is an immutable, `Arc`-shared list of entities;
//! each entity is a [`DictCell`] carrying whatever fields the scenario
//! defines plus a `num` slot holding its position, assigned contiguously
//! from zero at build time. The engine only ever reads the domain.
//!
//! Domains can be assembled in code from prepared cells, or loaded from a
//! JSON entity list where each field is coerced by shape and the reserved
//! `kind` field selects a category in a registered taxonomy.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::cells::{BoolCell, CellValue, DictCell, IntervalCell, PrefixCell, StringCell};
use crate::error::{CellError, CellResult};
use crate::input::CellInput;
use crate::taxonomy::{PartialOrderedCell, TaxonomyRegistry};

/// Slot every entity carries; holds the entity's position as a point
/// interval.
pub const NUM_FIELD: &str = "num";

/// Read an entity's position from its `num` slot.
pub fn entity_num(entity: &DictCell) -> Option<usize> {
    let point = entity.get(NUM_FIELD)?.as_interval()?.as_point()?;
    if point >= 0.0 {
        Some(point as usize)
    } else {
        None
    }
}

/// Immutable collection of candidate entities.
#[derive(Debug, Clone)]
pub struct ReferentialDomain {
    entities: Vec<DictCell>,
}

impl ReferentialDomain {
    /// Freeze a list of prepared entities, assigning each a contiguous
    /// `num` starting from zero. Any existing `num` slot is replaced.
    pub fn from_entities(entities: Vec<DictCell>) -> Arc<Self> {
        let entities: Vec<DictCell> = entities
            .into_iter()
            .enumerate()
            .map(|(i, mut entity)| {
                entity.insert(NUM_FIELD, CellValue::from(IntervalCell::point(i as f64)));
                entity
            })
            .collect();
        debug!(entities = entities.len(), "built referential domain");
        Arc::new(ReferentialDomain { entities })
    }

    /// Build a domain from its JSON description.
    pub fn from_json(json: &str, registry: &TaxonomyRegistry) -> CellResult<Arc<Self>> {
        let spec: DomainSpec = serde_json::from_str(json).map_err(|err| {
            CellError::construction("ReferentialDomain", err.to_string())
        })?;
        Self::from_spec(&spec, registry)
    }

    /// Build a domain from a parsed [`DomainSpec`].
    ///
    /// Fields are coerced by JSON shape (§[`cell_from_json`]); the reserved
    /// `kind` field becomes a [`PartialOrderedCell`] assertion in the
    /// spec's taxonomy, which must already be registered.
    pub fn from_spec(spec: &DomainSpec, registry: &TaxonomyRegistry) -> CellResult<Arc<Self>> {
        let graph = match &spec.taxonomy {
            Some(name) => Some(registry.get(name).ok_or_else(|| {
                CellError::InvalidTaxonomy {
                    name: name.clone(),
                    reason: "not registered".into(),
                }
            })?),
            None => None,
        };

        let mut entities = Vec::with_capacity(spec.entities.len());
        for entry in &spec.entities {
            let mut entity = DictCell::new();
            for (field, value) in entry {
                let cell = if field == "kind" {
                    let graph = graph.ok_or_else(|| {
                        CellError::construction(
                            "ReferentialDomain",
                            "entity has a `kind` field but the spec names no taxonomy",
                        )
                    })?;
                    let label = value.as_str().ok_or_else(|| {
                        CellError::construction(
                            "ReferentialDomain",
                            "`kind` must be a category label",
                        )
                    })?;
                    CellValue::from(PartialOrderedCell::positive(Arc::clone(graph), label)?)
                } else {
                    cell_from_json(value)?
                };
                entity.insert(field.as_str(), cell);
            }
            entities.push(entity);
        }
        Ok(Self::from_entities(entities))
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the domain has no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities, in `num` order.
    pub fn entities(&self) -> &[DictCell] {
        &self.entities
    }

    /// Iterate the entities in `num` order.
    pub fn iter(&self) -> impl Iterator<Item = &DictCell> {
        self.entities.iter()
    }

    /// Look up one entity by its `num`.
    pub fn entity(&self, num: usize) -> Option<&DictCell> {
        self.entities.get(num)
    }
}

/// Serde form of a domain: an optional taxonomy name and one JSON object
/// per entity.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainSpec {
    /// Registry name of the taxonomy entity `kind` fields refer to.
    #[serde(default)]
    pub taxonomy: Option<String>,
    /// One map of field name to JSON value per entity.
    pub entities: Vec<serde_json::Map<String, Value>>,
}

/// Coerce one JSON value into a cell by shape.
///
/// Numbers become point intervals, strings become string cells, booleans
/// become boolean cells, numeric arrays become intervals over their
/// extremes, string arrays become prefix cells, and objects recurse into
/// nested structures.
pub fn cell_from_json(value: &Value) -> CellResult<CellValue> {
    match value {
        Value::Bool(flag) => Ok(CellValue::from(BoolCell::coerce(&CellInput::from(*flag))?)),
        Value::Number(number) => {
            let x = number.as_f64().ok_or_else(|| {
                CellError::construction("IntervalCell", format!("unrepresentable number {number}"))
            })?;
            Ok(CellValue::from(IntervalCell::point(x)))
        }
        Value::String(text) => Ok(CellValue::from(StringCell::new(text))),
        Value::Array(items) => {
            if items.iter().all(Value::is_number) {
                let numbers: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
                Ok(CellValue::from(IntervalCell::coerce(&CellInput::Numbers(
                    numbers,
                ))?))
            } else if items.iter().all(|item| item.is_string()) {
                let tokens: Vec<String> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                Ok(CellValue::from(PrefixCell::new(tokens)))
            } else {
                Err(CellError::construction(
                    "ReferentialDomain",
                    "arrays must be all-numeric or all-string",
                ))
            }
        }
        Value::Object(map) => {
            let mut nested = DictCell::new();
            for (field, value) in map {
                nested.insert(field.as_str(), cell_from_json(value)?);
            }
            Ok(CellValue::from(nested))
        }
        Value::Null => Err(CellError::construction(
            "ReferentialDomain",
            "null is not a cell value",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::TaxonomyBuilder;

    fn shapes_registry() -> TaxonomyRegistry {
        let mut registry = TaxonomyRegistry::new();
        let graph = TaxonomyBuilder::new()
            .add_edge("thing", "shape")
            .add_edge("shape", "triangle")
            .add_edge("shape", "circle")
            .build("shapes")
            .unwrap();
        registry.register(graph).unwrap();
        registry
    }

    const SHAPES_JSON: &str = r#"{
        "taxonomy": "shapes",
        "entities": [
            {"kind": "triangle", "color": "yellow"},
            {"kind": "triangle", "color": "green"},
            {"kind": "triangle", "color": "green"},
            {"kind": "circle", "color": "yellow"}
        ]
    }"#;

    #[test]
    fn entities_get_contiguous_nums() {
        let domain = ReferentialDomain::from_entities(vec![
            DictCell::new(),
            DictCell::new(),
            DictCell::new(),
        ]);
        assert_eq!(domain.len(), 3);
        for (i, entity) in domain.iter().enumerate() {
            assert_eq!(entity_num(entity), Some(i));
        }
    }

    #[test]
    fn json_bootstrap_coerces_by_shape() {
        let registry = shapes_registry();
        let domain = ReferentialDomain::from_json(SHAPES_JSON, &registry).unwrap();
        assert_eq!(domain.len(), 4);

        let second = domain.entity(1).unwrap();
        assert_eq!(entity_num(second), Some(1));
        assert_eq!(
            second.get("color").unwrap().as_string().unwrap().value(),
            Some("green")
        );
        let kind = second.get("kind").unwrap().as_partial_order().unwrap();
        assert!(kind.values().contains("triangle"));
        assert!(!kind.values().contains("circle"));
    }

    #[test]
    fn kind_without_taxonomy_is_rejected() {
        let registry = TaxonomyRegistry::new();
        let json = r#"{"entities": [{"kind": "triangle"}]}"#;
        assert!(ReferentialDomain::from_json(json, &registry).is_err());

        let unregistered = r#"{"taxonomy": "missing", "entities": []}"#;
        assert!(ReferentialDomain::from_json(unregistered, &registry).is_err());
    }

    #[test]
    fn unknown_category_labels_are_rejected() {
        let registry = shapes_registry();
        let json = r#"{"taxonomy": "shapes", "entities": [{"kind": "square"}]}"#;
        assert!(ReferentialDomain::from_json(json, &registry).is_err());
    }

    #[test]
    fn json_shapes_cover_scalars_arrays_and_nesting() {
        let sized = cell_from_json(&serde_json::json!(3)).unwrap();
        assert_eq!(sized.as_interval().unwrap().as_point(), Some(3.0));

        let ranged = cell_from_json(&serde_json::json!([1, 5])).unwrap();
        assert_eq!(ranged.as_interval().unwrap().bounds(), (1.0, 5.0));

        let listed = cell_from_json(&serde_json::json!(["a", "b"])).unwrap();
        assert_eq!(listed.as_prefix().unwrap().values(), ["a", "b"]);

        let nested = cell_from_json(&serde_json::json!({"size": 2})).unwrap();
        assert!(nested.as_dict().unwrap().contains_key("size"));

        assert!(cell_from_json(&Value::Null).is_err());
        assert!(cell_from_json(&serde_json::json!([1, "mixed"])).is_err());
    }
}
