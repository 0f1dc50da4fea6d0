//! Analog (ADC) variable
//!
//! Reads one raw channel of an attached ADC through the Linux IIO sysfs
//! interface and normalizes it into [0, 1] once per frame.

use super::{Variable, VariableContext, VariableDefinition};
use crate::error::Error;
use crate::params::{ParamDef, ParamSet, ParamsDef};
use std::fs;
use std::path::PathBuf;

pub struct AnalogDefinition;

impl VariableDefinition for AnalogDefinition {
    fn kind(&self) -> &'static str {
        "analog"
    }

    fn display_name(&self) -> &'static str {
        "Analog input"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::long("device", "IIO device index", 0),
            ParamDef::long("channel", "ADC channel to sample", 0),
            ParamDef::float("min_raw", "Raw reading mapped to 0.0", 0.0),
            ParamDef::float("max_raw", "Raw reading mapped to 1.0", 4095.0),
        ])
    }

    fn create(
        &self,
        params: &ParamSet,
        ctx: &VariableContext,
    ) -> Result<Box<dyn Variable>, Error> {
        if !ctx.enable_adc {
            return Ok(Box::new(super::ConstantVariable::new(1.0)));
        }

        let path = PathBuf::from(format!(
            "/sys/bus/iio/devices/iio:device{}/in_voltage{}_raw",
            params.long("device"),
            params.long("channel"),
        ));
        let mut variable = AnalogVariable {
            path,
            min_raw: params.float("min_raw"),
            max_raw: params.float("max_raw"),
            value: 0.0,
        };
        // Probe once so a missing ADC degrades at build time
        variable
            .read_raw()
            .ok_or_else(|| Error::config(format!("ADC not readable at {}", variable.path.display())))?;
        variable.tick_frame(0.0);
        Ok(Box::new(variable))
    }
}

struct AnalogVariable {
    path: PathBuf,
    min_raw: f64,
    max_raw: f64,
    value: f64,
}

impl AnalogVariable {
    fn read_raw(&self) -> Option<f64> {
        let raw = fs::read_to_string(&self.path).ok()?;
        raw.trim().parse::<f64>().ok()
    }
}

impl Variable for AnalogVariable {
    fn kind(&self) -> &'static str {
        "analog"
    }

    fn tick_frame(&mut self, _time: f64) {
        // Read failures keep the previous value; the next tick tries again
        let Some(raw) = self.read_raw() else {
            return;
        };
        let span = self.max_raw - self.min_raw;
        if span != 0.0 {
            self.value = ((raw - self.min_raw) / span).clamp(0.0, 1.0);
        }
    }

    fn get_value(&self) -> f64 {
        self.value
    }
}
