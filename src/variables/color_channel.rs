//! Color channel variable
//!
//! Exposes the color currently registered for a named channel. Channels are
//! populated by `color` commands on the control bus; when nothing has been
//! published to the channel, the configured default applies.
//!
//! Color variables never drive scalar parameter bindings; `get_value` is
//! always 1.0.

use super::{ColorChannels, Variable, VariableContext, VariableDefinition};
use crate::color::Color;
use crate::error::Error;
use crate::params::{ParamDef, ParamSet, ParamsDef};

pub struct ColorChannelDefinition;

impl VariableDefinition for ColorChannelDefinition {
    fn kind(&self) -> &'static str {
        "colorchannel"
    }

    fn display_name(&self) -> &'static str {
        "Color channel"
    }

    fn params_def(&self) -> ParamsDef {
        ParamsDef::new(vec![
            ParamDef::string("channel", "Channel name to subscribe to", "default"),
            ParamDef::color("default_color", "Color before anything is published", Color::WHITE),
        ])
    }

    fn create(
        &self,
        params: &ParamSet,
        ctx: &VariableContext,
    ) -> Result<Box<dyn Variable>, Error> {
        Ok(Box::new(ColorChannelVariable {
            channel: params.string("channel"),
            default: params.color("default_color"),
            channels: ctx.color_channels.clone(),
            current: params.color("default_color"),
        }))
    }
}

struct ColorChannelVariable {
    channel: String,
    default: Color,
    channels: ColorChannels,
    current: Color,
}

impl Variable for ColorChannelVariable {
    fn kind(&self) -> &'static str {
        "colorchannel"
    }

    fn tick_frame(&mut self, _time: f64) {
        self.current = self
            .channels
            .borrow()
            .get(&self.channel)
            .copied()
            .unwrap_or(self.default);
    }

    fn get_value(&self) -> f64 {
        1.0
    }

    fn color_value(&self) -> Option<Color> {
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    fn build(channels: &ColorChannels) -> Box<dyn Variable> {
        let definition = ColorChannelDefinition;
        let ctx = VariableContext {
            enable_audio: false,
            enable_adc: false,
            update_interval: 0.05,
            audio: crate::config::AudioSettings::default(),
            color_channels: channels.clone(),
        };
        let params = ParamSet::from_json(
            definition.params_def(),
            &serde_json::json!({
                "channel": "mood",
                "default_color": { "r": 0.0, "g": 0.0, "b": 1.0 }
            }),
        );
        definition.create(&params, &ctx).unwrap()
    }

    #[test]
    fn test_default_color_until_published() {
        let channels: ColorChannels = Rc::new(RefCell::new(HashMap::new()));
        let mut v = build(&channels);
        v.tick_frame(0.0);
        assert_eq!(v.color_value(), Some(Color::new(0.0, 0.0, 1.0)));

        channels
            .borrow_mut()
            .insert("mood".to_string(), Color::new(1.0, 0.0, 0.0));
        v.tick_frame(0.05);
        assert_eq!(v.color_value(), Some(Color::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_scalar_value_is_identity() {
        let channels: ColorChannels = Rc::new(RefCell::new(HashMap::new()));
        let v = build(&channels);
        assert_eq!(v.get_value(), 1.0);
    }
}
