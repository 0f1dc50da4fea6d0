//! Typed parameter definitions, values, and variable bindings
//!
//! Every transform and variable kind publishes an ordered `ParamsDef`
//! describing its parameters. A `ParamSet` holds the parsed values for one
//! instance, slot-for-slot with the def, plus a sparse set of variable
//! bindings that override scalar parameters at read time.

use crate::color::Color;
use serde_json::{Map, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Parameter type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Boolean,
    Long,
    Float,
    Percent,
    Color,
    String,
}

impl ParamType {
    /// Whether a variable binding may drive this parameter
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ParamType::Boolean | ParamType::Long | ParamType::Float | ParamType::Percent
        )
    }
}

/// A typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Boolean(bool),
    Long(i64),
    Float(f64),
    Percent(f64),
    Color(Color),
    String(String),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Boolean(_) => ParamType::Boolean,
            ParamValue::Long(_) => ParamType::Long,
            ParamValue::Float(_) => ParamType::Float,
            ParamValue::Percent(_) => ParamType::Percent,
            ParamValue::Color(_) => ParamType::Color,
            ParamValue::String(_) => ParamType::String,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            ParamValue::Boolean(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            ParamValue::Long(v) => *v as f64,
            ParamValue::Float(v) | ParamValue::Percent(v) => *v,
            _ => 0.0,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            ParamValue::Long(v) => *v,
            ParamValue::Float(v) | ParamValue::Percent(v) => *v as i64,
            ParamValue::Boolean(v) => i64::from(*v),
            _ => 0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            ParamValue::Boolean(v) => *v,
            ParamValue::Long(v) => *v != 0,
            ParamValue::Float(v) | ParamValue::Percent(v) => *v != 0.0,
            _ => false,
        }
    }

    /// Serialize to the persisted payload form
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Boolean(v) => Value::Bool(*v),
            ParamValue::Long(v) => Value::from(*v),
            ParamValue::Float(v) | ParamValue::Percent(v) => Value::from(*v),
            ParamValue::Color(c) => serde_json::to_value(c).unwrap_or(Value::Null),
            ParamValue::String(s) => Value::String(s.clone()),
        }
    }

    /// Parse a payload value according to the given type; `None` when the
    /// payload doesn't fit the type
    pub fn from_json(param_type: ParamType, value: &Value) -> Option<ParamValue> {
        match param_type {
            ParamType::Boolean => match value {
                Value::Bool(v) => Some(ParamValue::Boolean(*v)),
                Value::Number(n) => Some(ParamValue::Boolean(n.as_f64()? != 0.0)),
                _ => None,
            },
            ParamType::Long => value.as_f64().map(|v| ParamValue::Long(v as i64)),
            ParamType::Float => value.as_f64().map(ParamValue::Float),
            ParamType::Percent => value.as_f64().map(ParamValue::Percent),
            ParamType::Color => serde_json::from_value(value.clone()).ok().map(ParamValue::Color),
            ParamType::String => value.as_str().map(|s| ParamValue::String(s.to_string())),
        }
    }
}

/// A single parameter descriptor
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: &'static str,
    pub description: &'static str,
    pub default: ParamValue,
}

impl ParamDef {
    pub fn new(name: &'static str, description: &'static str, default: ParamValue) -> Self {
        Self {
            name,
            description,
            default,
        }
    }

    pub fn boolean(name: &'static str, description: &'static str, default: bool) -> Self {
        Self::new(name, description, ParamValue::Boolean(default))
    }

    pub fn long(name: &'static str, description: &'static str, default: i64) -> Self {
        Self::new(name, description, ParamValue::Long(default))
    }

    pub fn float(name: &'static str, description: &'static str, default: f64) -> Self {
        Self::new(name, description, ParamValue::Float(default))
    }

    pub fn percent(name: &'static str, description: &'static str, default: f64) -> Self {
        Self::new(name, description, ParamValue::Percent(default))
    }

    pub fn color(name: &'static str, description: &'static str, default: Color) -> Self {
        Self::new(name, description, ParamValue::Color(default))
    }

    pub fn string(name: &'static str, description: &'static str, default: &str) -> Self {
        Self::new(name, description, ParamValue::String(default.to_string()))
    }

    pub fn param_type(&self) -> ParamType {
        self.default.param_type()
    }
}

/// Ordered parameter definitions for one transform or variable kind
#[derive(Debug, Clone, Default)]
pub struct ParamsDef {
    defs: Vec<ParamDef>,
}

impl ParamsDef {
    pub fn new(defs: Vec<ParamDef>) -> Self {
        Self { defs }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.defs.iter().position(|d| d.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ParamDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Append further defs (used to add the shared layer params)
    pub fn extend(mut self, extra: Vec<ParamDef>) -> Self {
        self.defs.extend(extra);
        self
    }
}

/// A live variable binding on one scalar parameter
///
/// The driver writes each variable's per-frame value into a shared cell; the
/// binding reads that cell and applies `value * multiply + add`, coerced to
/// the target parameter's numeric type at the accessor.
#[derive(Debug, Clone)]
pub struct Binding {
    cell: Rc<Cell<f64>>,
    multiply: f64,
    add: f64,
}

impl Binding {
    pub fn new(cell: Rc<Cell<f64>>, multiply: f64, add: f64) -> Self {
        Self {
            cell,
            multiply,
            add,
        }
    }

    pub fn current(&self) -> f64 {
        self.cell.get() * self.multiply + self.add
    }
}

/// Parameter values for one instance, slot-parallel with its def
#[derive(Debug, Clone)]
pub struct ParamSet {
    def: ParamsDef,
    values: Vec<ParamValue>,
    bindings: Vec<Option<Binding>>,
}

impl ParamSet {
    /// All defaults
    pub fn defaults(def: ParamsDef) -> Self {
        let values = def.iter().map(|d| d.default.clone()).collect();
        let bindings = vec![None; def.len()];
        Self {
            def,
            values,
            bindings,
        }
    }

    /// Parse a JSON payload against the def. Unknown names are dropped,
    /// missing or mistyped names fall back to the default.
    pub fn from_json(def: ParamsDef, payload: &Value) -> Self {
        let mut set = Self::defaults(def);
        if let Value::Object(map) = payload {
            for (name, raw) in map {
                let Some(slot) = set.def.index_of(name) else {
                    continue;
                };
                let param_type = set.def.defs[slot].param_type();
                if let Some(value) = ParamValue::from_json(param_type, raw) {
                    set.values[slot] = value;
                }
            }
        }
        set
    }

    /// Re-serialize in def order; every defined name is emitted, with the
    /// default standing in for anything absent from the original payload.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (def, value) in self.def.iter().zip(&self.values) {
            map.insert(def.name.to_string(), value.to_json());
        }
        Value::Object(map)
    }

    pub fn def(&self) -> &ParamsDef {
        &self.def
    }

    /// Attach a variable binding to a named scalar parameter. Non-numeric
    /// parameters never bind.
    pub fn bind(&mut self, name: &str, binding: Binding) -> bool {
        match self.def.index_of(name) {
            Some(slot) if self.def.defs[slot].param_type().is_numeric() => {
                self.bindings[slot] = Some(binding);
                true
            }
            _ => false,
        }
    }

    pub fn has_bindings(&self) -> bool {
        self.bindings.iter().any(Option::is_some)
    }

    fn slot(&self, name: &str) -> Option<usize> {
        let slot = self.def.index_of(name);
        debug_assert!(slot.is_some(), "unknown param {name}");
        slot
    }

    /// Bound value for a slot, already coerced to the slot's type
    fn bound(&self, slot: usize) -> Option<ParamValue> {
        let binding = self.bindings[slot].as_ref()?;
        let raw = binding.current();
        Some(match self.def.defs[slot].param_type() {
            ParamType::Boolean => ParamValue::Boolean(raw != 0.0),
            ParamType::Long => ParamValue::Long(raw.round() as i64),
            ParamType::Float => ParamValue::Float(raw),
            ParamType::Percent => ParamValue::Percent(raw),
            // Non-numeric types never carry bindings
            _ => return None,
        })
    }

    fn resolve(&self, name: &str) -> Option<ParamValue> {
        let slot = self.slot(name)?;
        Some(match self.bound(slot) {
            Some(value) => value,
            None => self.values[slot].clone(),
        })
    }

    pub fn float(&self, name: &str) -> f64 {
        self.resolve(name).map(|v| v.as_f64()).unwrap_or(0.0)
    }

    pub fn percent(&self, name: &str) -> f64 {
        self.float(name)
    }

    pub fn long(&self, name: &str) -> i64 {
        self.resolve(name).map(|v| v.as_i64()).unwrap_or(0)
    }

    pub fn boolean(&self, name: &str) -> bool {
        self.resolve(name).map(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn color(&self, name: &str) -> Color {
        match self.resolve(name) {
            Some(ParamValue::Color(c)) => c,
            _ => Color::default_color(),
        }
    }

    pub fn string(&self, name: &str) -> String {
        match self.resolve(name) {
            Some(ParamValue::String(s)) => s,
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_def() -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::float("brightness", "Output scale", 1.0),
            ParamDef::long("count", "Number of things", 4),
            ParamDef::boolean("enabled", "On/off", true),
            ParamDef::color("tint", "Layer tint", Color::new(1.0, 0.0, 0.0)),
            ParamDef::string("label", "Display label", "strip"),
        ])
    }

    #[test]
    fn test_defaults_fill_missing_values() {
        let set = ParamSet::from_json(sample_def(), &json!({ "brightness": 0.25 }));
        assert_eq!(set.float("brightness"), 0.25);
        assert_eq!(set.long("count"), 4);
        assert!(set.boolean("enabled"));
        assert_eq!(set.string("label"), "strip");
    }

    #[test]
    fn test_unknown_names_dropped() {
        let set = ParamSet::from_json(sample_def(), &json!({ "mystery": 12 }));
        let out = set.to_json();
        assert!(out.get("mystery").is_none());
    }

    #[test]
    fn test_round_trip_emits_defaults() {
        let def = sample_def();
        let set = ParamSet::from_json(def.clone(), &json!({ "count": 9 }));
        let out = set.to_json();
        // Every defined name is present, absent ones as defaults
        assert_eq!(out.get("count"), Some(&json!(9)));
        assert_eq!(out.get("brightness"), Some(&json!(1.0)));
        assert_eq!(out.get("label"), Some(&json!("strip")));

        let back = ParamSet::from_json(def, &out);
        assert_eq!(back.to_json(), set.to_json());
    }

    #[test]
    fn test_binding_overrides_static_value() {
        let mut set = ParamSet::from_json(sample_def(), &json!({ "brightness": 0.1 }));
        let cell = Rc::new(Cell::new(0.75));
        assert!(set.bind("brightness", Binding::new(cell.clone(), 2.0, -0.5)));
        assert_eq!(set.float("brightness"), 1.0);

        cell.set(0.5);
        assert_eq!(set.float("brightness"), 0.5);
    }

    #[test]
    fn test_binding_coercion() {
        let mut set = ParamSet::defaults(sample_def());
        let cell = Rc::new(Cell::new(2.6));
        assert!(set.bind("count", Binding::new(cell.clone(), 1.0, 0.0)));
        assert!(set.bind("enabled", Binding::new(cell.clone(), 1.0, 0.0)));
        assert_eq!(set.long("count"), 3);
        assert!(set.boolean("enabled"));

        cell.set(0.0);
        assert_eq!(set.long("count"), 0);
        assert!(!set.boolean("enabled"));
    }

    #[test]
    fn test_color_params_never_bind() {
        let mut set = ParamSet::defaults(sample_def());
        let cell = Rc::new(Cell::new(0.5));
        assert!(!set.bind("tint", Binding::new(cell.clone(), 1.0, 0.0)));
        assert!(!set.bind("label", Binding::new(cell, 1.0, 0.0)));
        assert!(!set.has_bindings());
    }

    #[test]
    fn test_color_payload_round_trip() {
        let def = ParamsDef::new(vec![ParamDef::color(
            "tint",
            "",
            Color::new(0.0, 0.0, 0.0),
        )]);
        let set = ParamSet::from_json(
            def,
            &json!({ "tint": { "r": 0.5, "g": 0.25, "b": 1.0, "w": 0.0, "a": 1.0 } }),
        );
        let c = set.color("tint");
        assert_eq!(c.r, 0.5);
        assert_eq!(c.g, 0.25);
    }
}
