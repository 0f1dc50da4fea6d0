//! Audio beat variable
//!
//! Front-end for the audio analysis worker. The worker publishes one
//! normalized beat value per analysis pass; this variable samples it once
//! per frame so every binding sees a stable value for the whole frame.

use super::{ConstantVariable, Variable, VariableContext, VariableDefinition};
use crate::audio::AudioWorker;
use crate::error::Error;
use crate::params::{ParamSet, ParamsDef};

pub struct AudioDefinition;

impl VariableDefinition for AudioDefinition {
    fn kind(&self) -> &'static str {
        "audio"
    }

    fn display_name(&self) -> &'static str {
        "Audio beat"
    }

    fn singleton(&self) -> bool {
        true
    }

    fn params_def(&self) -> ParamsDef {
        // Tuning lives in the driver configuration, shared with the worker
        ParamsDef::default()
    }

    fn create(
        &self,
        _params: &ParamSet,
        ctx: &VariableContext,
    ) -> Result<Box<dyn Variable>, Error> {
        if !ctx.enable_audio {
            return Ok(Box::new(ConstantVariable::new(1.0)));
        }

        let worker = AudioWorker::spawn(ctx.audio, ctx.update_interval)?;
        Ok(Box::new(AudioVariable {
            worker: Some(worker),
            value: 0.0,
        }))
    }
}

struct AudioVariable {
    worker: Option<AudioWorker>,
    value: f64,
}

impl Variable for AudioVariable {
    fn kind(&self) -> &'static str {
        "audio"
    }

    fn tick_frame(&mut self, _time: f64) {
        if let Some(worker) = &self.worker {
            self.value = worker.shared().value();
        }
    }

    fn get_value(&self) -> f64 {
        self.value
    }

    fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioSettings;

    #[test]
    fn test_disabled_audio_is_constant() {
        let ctx = VariableContext {
            enable_audio: false,
            enable_adc: false,
            update_interval: 0.05,
            audio: AudioSettings::default(),
            color_channels: Default::default(),
        };
        let definition = AudioDefinition;
        let params = ParamSet::defaults(definition.params_def());
        let mut v = definition.create(&params, &ctx).unwrap();

        v.tick_frame(0.0);
        assert_eq!(v.get_value(), 1.0);
        v.close();
        v.close();
    }
}
