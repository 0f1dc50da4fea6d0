//! Variable runtime
//!
//! Variables are per-frame sources of scalar (or color) values that can be
//! bound into transform parameters. The driver ticks every variable once per
//! frame in insertion order and publishes each scalar into a shared cell that
//! bindings read from.
//!
//! A variable that fails to initialize (missing audio device, missing ADC)
//! degrades into a constant 1.0 no-op; the render loop never observes an
//! error from a variable.

mod analog;
mod audio;
mod color_channel;
mod random;

pub use analog::AnalogDefinition;
pub use audio::AudioDefinition;
pub use color_channel::ColorChannelDefinition;
pub use random::RandomDefinition;

use crate::color::Color;
use crate::config::AudioSettings;
use crate::error::Error;
use crate::params::{ParamSet, ParamsDef};
use crate::store::VariableSpec;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Shared map of named color channels, written by the control-bus handler
/// and read by colorchannel variables. Both run on the render thread.
pub type ColorChannels = Rc<RefCell<HashMap<String, Color>>>;

/// Everything a variable kind may need at construction time
pub struct VariableContext {
    pub enable_audio: bool,
    pub enable_adc: bool,
    /// Render loop frame interval, used to throttle background work
    pub update_interval: f64,
    pub audio: AudioSettings,
    pub color_channels: ColorChannels,
}

/// A live variable instance
pub trait Variable {
    fn kind(&self) -> &'static str;

    /// Called once per frame, before any transform runs
    fn tick_frame(&mut self, _time: f64) {}

    /// Current scalar value
    fn get_value(&self) -> f64;

    /// Current color value, for color-typed variables
    fn color_value(&self) -> Option<Color> {
        None
    }

    /// Release any held resources; must be idempotent
    fn close(&mut self) {}
}

/// Factory for one variable kind
pub trait VariableDefinition {
    fn kind(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Whether at most one instance of this kind may be active
    fn singleton(&self) -> bool {
        false
    }

    fn params_def(&self) -> ParamsDef;

    fn create(
        &self,
        params: &ParamSet,
        ctx: &VariableContext,
    ) -> Result<Box<dyn Variable>, Error>;
}

/// Registry of available variable kinds
pub struct VariableRegistry {
    definitions: HashMap<&'static str, Box<dyn VariableDefinition>>,
}

impl Default for VariableRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in kinds
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(RandomDefinition);
        registry.register(AnalogDefinition);
        registry.register(ColorChannelDefinition);
        registry.register(AudioDefinition);
        registry
    }

    pub fn register(&mut self, definition: impl VariableDefinition + 'static) {
        self.definitions.insert(definition.kind(), Box::new(definition));
    }

    pub fn get(&self, kind: &str) -> Option<&dyn VariableDefinition> {
        self.definitions.get(kind).map(|d| d.as_ref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.definitions.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions.keys().copied()
    }
}

/// The degenerate variable: a constant scalar with no-op lifecycle
pub struct ConstantVariable {
    value: f64,
}

impl ConstantVariable {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Variable for ConstantVariable {
    fn kind(&self) -> &'static str {
        "constant"
    }

    fn get_value(&self) -> f64 {
        self.value
    }
}

struct TableEntry {
    id: i64,
    name: String,
    variable: Box<dyn Variable>,
    value: Rc<Cell<f64>>,
}

/// The active variable set for a run
///
/// Keeps insertion order for ticking, and exposes each variable's per-frame
/// scalar through a shared cell that parameter bindings hold on to.
#[derive(Default)]
pub struct VariableTable {
    entries: Vec<TableEntry>,
    closed: bool,
}

impl VariableTable {
    /// Build the table from the persisted variable list. Unknown kinds and
    /// duplicate singletons are dropped; construction failures degrade to the
    /// constant variable.
    pub fn build(
        specs: &[VariableSpec],
        registry: &VariableRegistry,
        ctx: &VariableContext,
    ) -> Self {
        let mut table = VariableTable::default();
        let mut seen_kinds: Vec<&'static str> = Vec::new();

        for spec in specs {
            let Some(definition) = registry.get(&spec.kind) else {
                tracing::warn!(kind = %spec.kind, id = spec.id, "Dropping unknown variable kind");
                continue;
            };
            if definition.singleton() && seen_kinds.contains(&definition.kind()) {
                tracing::warn!(kind = %spec.kind, id = spec.id, "Dropping duplicate singleton variable");
                continue;
            }
            seen_kinds.push(definition.kind());

            let params = ParamSet::from_json(definition.params_def(), &spec.params);
            let variable = match definition.create(&params, ctx) {
                Ok(variable) => variable,
                Err(e) => {
                    tracing::warn!(kind = %spec.kind, id = spec.id, error = %e,
                        "Variable failed to initialize, using constant 1.0");
                    Box::new(ConstantVariable::new(1.0))
                }
            };

            table.entries.push(TableEntry {
                id: spec.id,
                name: spec.name.clone(),
                variable,
                value: Rc::new(Cell::new(1.0)),
            });
        }

        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tick every variable in insertion order and refresh the shared cells
    pub fn tick_all(&mut self, time: f64) {
        for entry in &mut self.entries {
            entry.variable.tick_frame(time);
            entry.value.set(entry.variable.get_value());
        }
    }

    /// Shared cell for a variable id, used to wire parameter bindings
    pub fn value_cell(&self, id: i64) -> Option<Rc<Cell<f64>>> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| Rc::clone(&e.value))
    }

    /// Last ticked value of a variable looked up by name
    pub fn value_by_name(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.value.get())
    }

    /// Current color of a variable looked up by name
    pub fn color_by_name(&self, name: &str) -> Option<Color> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.variable.color_value())
    }

    /// Close every variable; safe to call more than once
    pub fn close_all(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for entry in &mut self.entries {
            entry.variable.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_ctx() -> VariableContext {
        VariableContext {
            enable_audio: false,
            enable_adc: false,
            update_interval: 0.05,
            audio: AudioSettings::default(),
            color_channels: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    fn spec(id: i64, kind: &str, name: &str, params: serde_json::Value) -> VariableSpec {
        VariableSpec {
            id,
            kind: kind.to_string(),
            name: name.to_string(),
            params,
        }
    }

    #[test]
    fn test_unknown_kind_dropped() {
        let registry = VariableRegistry::with_builtin();
        let table = VariableTable::build(
            &[spec(1, "quantum", "Q", json!({})), spec(2, "random", "R", json!({}))],
            &registry,
            &test_ctx(),
        );
        assert_eq!(table.len(), 1);
        assert!(table.value_cell(2).is_some());
        assert!(table.value_cell(1).is_none());
    }

    #[test]
    fn test_duplicate_singleton_dropped() {
        let registry = VariableRegistry::with_builtin();
        let table = VariableTable::build(
            &[
                spec(1, "random", "R1", json!({})),
                spec(2, "random", "R2", json!({})),
            ],
            &registry,
            &test_ctx(),
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_disabled_audio_is_constant_one() {
        let registry = VariableRegistry::with_builtin();
        let mut table = VariableTable::build(
            &[spec(1, "audio", "Beat", json!({}))],
            &registry,
            &test_ctx(),
        );
        assert_eq!(table.len(), 1);
        table.tick_all(0.0);
        assert_eq!(table.value_by_name("Beat"), Some(1.0));
        table.close_all();
        table.close_all();
    }

    #[test]
    fn test_tick_refreshes_cells() {
        let registry = VariableRegistry::with_builtin();
        let mut table = VariableTable::build(
            &[spec(5, "random", "R", json!({}))],
            &registry,
            &test_ctx(),
        );
        let cell = table.value_cell(5).unwrap();
        table.tick_all(0.0);
        let v = cell.get();
        assert!((0.0..=1.0).contains(&v));
    }

    #[test]
    fn test_random_values_are_uniform_ish() {
        let registry = VariableRegistry::with_builtin();
        let mut table = VariableTable::build(
            &[spec(1, "random", "R", json!({}))],
            &registry,
            &test_ctx(),
        );
        let cell = table.value_cell(1).unwrap();
        let mut sum = 0.0;
        for i in 0..1000 {
            table.tick_all(i as f64 * 0.05);
            sum += cell.get();
        }
        let mean = sum / 1000.0;
        assert!(mean > 0.4 && mean < 0.6, "mean {mean}");
    }
}
