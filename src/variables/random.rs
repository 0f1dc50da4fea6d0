//! Uniform random variable

use super::{Variable, VariableContext, VariableDefinition};
use crate::error::Error;
use crate::params::{ParamSet, ParamsDef};

pub struct RandomDefinition;

impl VariableDefinition for RandomDefinition {
    fn kind(&self) -> &'static str {
        "random"
    }

    fn display_name(&self) -> &'static str {
        "Random"
    }

    fn singleton(&self) -> bool {
        true
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::default()
    }

    fn create(
        &self,
        _params: &ParamSet,
        _ctx: &VariableContext,
    ) -> Result<Box<dyn Variable>, Error> {
        Ok(Box::new(RandomVariable))
    }
}

/// Returns a fresh U(0, 1) sample on every read
struct RandomVariable;

impl Variable for RandomVariable {
    fn kind(&self) -> &'static str {
        "random"
    }

    fn get_value(&self) -> f64 {
        rand::random::<f64>()
    }
}
