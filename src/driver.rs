//! The render loop
//!
//! The driver owns the control-plane state machine. Idle, it blocks on the
//! command bus; on `start` it runs the frame loop until `stop`, rebuilding
//! per-run state on `restart` and advancing playlist entries as their
//! deadlines pass. Each frame starts from a clone of the base colors, ticks
//! every variable, walks the transform pipeline in order, and hands the
//! packed result to the output worker.

use crate::bus::{Command, CommandSource};
use crate::color::Color;
use crate::config::Settings;
use crate::device::{Frame, OutputWorker};
use crate::params::{Binding, ParamSet};
use crate::store::{ConfigStore, TransformSpec};
use crate::transforms::{Transform, TransformRegistry};
use crate::variables::{ColorChannels, VariableContext, VariableRegistry, VariableTable};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Variable name the render loop treats as a global output multiplier
const GLOBAL_BRIGHTNESS_VARIABLE: &str = "Brightness";

/// Seconds between FPS reports in debug mode
const FPS_REPORT_INTERVAL: f64 = 10.0;

/// How one run segment ended
enum RunOutcome {
    /// Back to idle
    Stop,
    /// Rebuild transforms and colors, keep variables and the clock
    Restart,
    /// Playlist deadline passed
    Advance,
    /// The run config could not be loaded
    Failed,
}

pub struct LightDriver {
    settings: Settings,
    store: Box<dyn ConfigStore>,
    bus: Box<dyn CommandSource>,
    output: OutputWorker,
    transforms: TransformRegistry,
    variables: VariableRegistry,
    color_channels: ColorChannels,
    start_time: Option<Instant>,
    interrupted: Arc<AtomicBool>,
}

impl LightDriver {
    pub fn new(
        settings: Settings,
        store: Box<dyn ConfigStore>,
        bus: Box<dyn CommandSource>,
        output: OutputWorker,
    ) -> Self {
        Self {
            settings,
            store,
            bus,
            output,
            transforms: TransformRegistry::with_builtin(),
            variables: VariableRegistry::with_builtin(),
            color_channels: ColorChannels::default(),
            start_time: None,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that ends the driver loop cooperatively; set it from a signal
    /// handler for clean shutdown
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    /// Extend the transform catalog
    pub fn transform_registry_mut(&mut self) -> &mut TransformRegistry {
        &mut self.transforms
    }

    /// Extend the variable catalog
    pub fn variable_registry_mut(&mut self) -> &mut VariableRegistry {
        &mut self.variables
    }

    fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Main entry point: wait for commands, run on `start`, return when
    /// interrupted
    pub fn run(&mut self) {
        if self.settings.auto_start {
            self.start(None);
        }

        // Anything queued before we were listening belongs to a past life
        self.bus.purge();

        tracing::info!("Light driver idle");
        while !self.interrupted() {
            match self.bus.recv_timeout(Duration::from_millis(500)) {
                Some(Command::Start { playlist_id }) => {
                    self.start(playlist_id);
                    tracing::info!("Light driver idle");
                }
                Some(Command::Color { channel, color }) => {
                    self.set_color_channel(channel, color);
                }
                Some(Command::Stop | Command::Restart) => {}
                None => {
                    // A dead bus returns instantly; don't spin
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }

    /// Close the output worker (sends the close sentinel and joins)
    pub fn shutdown(&mut self) {
        self.output.shutdown();
    }

    /// Run until stopped, looping over the playlist if one is given
    pub fn start(&mut self, playlist_id: Option<i64>) {
        tracing::info!("Starting");

        let playlist = playlist_id.and_then(|id| match self.store.load_playlist(id) {
            Ok(playlist) if !playlist.entries.is_empty() => Some(playlist),
            Ok(_) => {
                tracing::warn!(id, "Playlist is empty, running current config");
                None
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "Failed to load playlist, running current config");
                None
            }
        });

        // Variables are created once per run and survive restarts and
        // playlist advances
        let first_config = playlist.as_ref().map(|p| p.entries[0].config_id);
        let mut variables = match self.store.load_run(first_config) {
            Ok(doc) => {
                let ctx = self.variable_context();
                VariableTable::build(&doc.variables, &self.variables, &ctx)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load run config");
                return;
            }
        };

        let mut entry_index = 0usize;
        let mut consecutive_failures = 0usize;
        loop {
            if self.interrupted() {
                break;
            }
            let (config_id, deadline) = match &playlist {
                Some(playlist) => {
                    let entry = &playlist.entries[entry_index];
                    let secs = (playlist.base_duration_secs * entry.duration_multiplier).max(0.1);
                    (
                        Some(entry.config_id),
                        Some(Instant::now() + Duration::from_secs_f64(secs)),
                    )
                }
                None => (None, None),
            };

            match self.run_lights(config_id, deadline, &mut variables) {
                RunOutcome::Stop => break,
                RunOutcome::Restart => continue,
                RunOutcome::Advance => {
                    let Some(playlist) = &playlist else { break };
                    consecutive_failures = 0;
                    entry_index = (entry_index + 1) % playlist.entries.len();
                }
                RunOutcome::Failed => {
                    let Some(playlist) = &playlist else { break };
                    consecutive_failures += 1;
                    if consecutive_failures >= playlist.entries.len() {
                        tracing::warn!("No playlist entry is runnable, stopping");
                        break;
                    }
                    entry_index = (entry_index + 1) % playlist.entries.len();
                }
            }
        }

        self.clear_lights();
        variables.close_all();
        self.start_time = None;
    }

    fn variable_context(&self) -> VariableContext {
        VariableContext {
            enable_audio: self.settings.enable_audio_var,
            enable_adc: self.settings.enable_adc,
            update_interval: self.settings.update_interval,
            audio: self.settings.audio,
            color_channels: self.color_channels.clone(),
        }
    }

    /// Resolve the persisted pipeline against the registry, in order
    fn build_transforms(
        &self,
        specs: &[TransformSpec],
        variables: &VariableTable,
    ) -> Vec<Box<dyn Transform>> {
        let mut ordered: Vec<&TransformSpec> = specs.iter().collect();
        ordered.sort_by_key(|spec| spec.order);

        let mut active = Vec::with_capacity(ordered.len());
        for spec in ordered {
            let Some(definition) = self.transforms.get(&spec.kind) else {
                tracing::warn!(kind = %spec.kind, id = spec.id, "Dropping unknown transform kind");
                continue;
            };
            let mut params = ParamSet::from_json(definition.params_def(), &spec.params);
            for binding in &spec.variable_bindings {
                // An unresolved variable id binds to the constant 1.0
                let cell = variables
                    .value_cell(binding.variable_id)
                    .unwrap_or_else(|| Rc::new(Cell::new(1.0)));
                let bound = params.bind(
                    &binding.name,
                    Binding::new(cell, binding.multiply, binding.add),
                );
                if !bound {
                    tracing::warn!(
                        kind = %spec.kind,
                        param = %binding.name,
                        "Ignoring binding on a non-scalar parameter"
                    );
                }
            }
            active.push(definition.create(params));
        }
        active
    }

    /// The frame loop for one run segment
    fn run_lights(
        &mut self,
        config_id: Option<i64>,
        deadline: Option<Instant>,
        variables: &mut VariableTable,
    ) -> RunOutcome {
        let doc = match self.store.load_run(config_id) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load run config");
                return RunOutcome::Failed;
            }
        };
        let n = self.settings.num_leds;
        if doc.lights.len() != n {
            tracing::warn!(
                expected = n,
                actual = doc.lights.len(),
                "Base color buffer has the wrong length"
            );
            return RunOutcome::Failed;
        }
        let base_colors = doc.lights;
        let mut transforms = self.build_transforms(&doc.transforms, variables);
        let animating = transforms.iter().any(|t| t.is_animated());

        tracing::info!(
            transforms = transforms.len(),
            variables = variables.len(),
            animating,
            "Light driver running"
        );

        let start_time = *self.start_time.get_or_insert_with(Instant::now);
        let mut last_message_check = Instant::now();
        let mut frame_count = 0u64;
        let mut last_fps = Instant::now();

        loop {
            let now = Instant::now();
            let elapsed = now.duration_since(start_time).as_secs_f64();
            frame_count += 1;

            if self.settings.driver_debug {
                let span = now.duration_since(last_fps).as_secs_f64();
                if span > FPS_REPORT_INTERVAL {
                    let fps = frame_count as f64 / span;
                    tracing::debug!(fps, "Render loop rate");
                    last_fps = now;
                    frame_count = 0;
                }
            }

            if let Some(deadline) = deadline {
                if now >= deadline {
                    return RunOutcome::Advance;
                }
            }

            if self.interrupted() {
                return RunOutcome::Stop;
            }

            if now.duration_since(last_message_check).as_secs_f64()
                > self.settings.message_check_interval
            {
                last_message_check = now;
                match self.bus.try_recv() {
                    Some(Command::Stop) => {
                        tracing::info!("Stopping");
                        return RunOutcome::Stop;
                    }
                    Some(Command::Restart) => {
                        tracing::info!("Restarting");
                        return self.drain_restarts();
                    }
                    Some(Command::Color { channel, color }) => {
                        self.set_color_channel(channel, color);
                    }
                    Some(Command::Start { .. }) => {
                        tracing::debug!("Ignoring start while running");
                    }
                    None => {}
                }
            }

            variables.tick_all(elapsed);

            // The base buffer is the canvas; every frame starts from a clone
            let mut colors = base_colors.clone();
            for transform in &mut transforms {
                transform.tick_frame(elapsed, n);
                colors = transform.transform(elapsed, &colors);
                // Registered transforms can come from outside the builtin
                // catalog, so the length invariant is enforced at runtime
                if colors.len() != n {
                    tracing::error!(
                        kind = transform.kind(),
                        expected = n,
                        actual = colors.len(),
                        "Transform broke the frame length, abandoning run"
                    );
                    return RunOutcome::Failed;
                }
            }

            if let Some(brightness) = variables.value_by_name(GLOBAL_BRIGHTNESS_VARIABLE) {
                for color in &mut colors {
                    *color = *color * brightness;
                }
            }

            let frame: Frame = colors
                .iter()
                .map(|c| c.to_raw(&self.settings.correction))
                .collect();
            if !self.output.send(frame) {
                tracing::warn!("Output worker pipe closed");
                return RunOutcome::Stop;
            }

            if !animating {
                // Nothing moves on its own; crawl until the next command
                std::thread::sleep(Duration::from_secs(1));
            } else {
                let budget = Duration::from_secs_f64(self.settings.update_interval);
                if let Some(sleep) = budget.checked_sub(now.elapsed()) {
                    std::thread::sleep(sleep);
                }
            }
        }
    }

    /// Collapse a burst of queued restarts into a single rebuild
    fn drain_restarts(&mut self) -> RunOutcome {
        loop {
            match self.bus.try_recv() {
                Some(Command::Restart) => continue,
                Some(Command::Stop) => {
                    tracing::info!("Stopping");
                    return RunOutcome::Stop;
                }
                Some(Command::Color { channel, color }) => {
                    self.set_color_channel(channel, color);
                }
                Some(Command::Start { .. }) => {}
                None => return RunOutcome::Restart,
            }
        }
    }

    fn set_color_channel(&mut self, channel: String, color: Color) {
        self.color_channels.borrow_mut().insert(channel, color);
    }

    /// Push a black frame so the strip goes dark when we stop
    fn clear_lights(&mut self) {
        let frame = vec![[0u8; 4]; self.settings.num_leds];
        if !self.output.send(frame) {
            tracing::warn!("Output worker pipe closed during clear");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{CommandPublisher, MemoryBus};
    use crate::config::DeviceMode;
    use crate::device::testing::CaptureDevice;
    use crate::error::Error;
    use crate::params::ParamsDef;
    use crate::store::{MemoryStore, RunDocument, VariableSpec};
    use crate::transforms::TransformDefinition;
    use crate::variables::{Variable, VariableDefinition};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn test_settings(n: usize) -> Settings {
        Settings {
            num_leds: n,
            device: DeviceMode::Noop,
            update_interval: 0.002,
            message_check_interval: 0.0,
            ..Settings::default()
        }
    }

    fn white_lights(n: usize) -> Vec<Color> {
        vec![Color::WHITE; n]
    }

    fn run_doc(lights: Vec<Color>, transforms: serde_json::Value) -> RunDocument {
        serde_json::from_value(json!({
            "lights": serde_json::to_value(lights).unwrap(),
            "transforms": transforms,
            "variables": []
        }))
        .unwrap()
    }

    struct Harness {
        driver: LightDriver,
        publisher: CommandPublisher,
        device: CaptureDevice,
    }

    fn harness(n: usize, doc: RunDocument) -> Harness {
        let mut store = MemoryStore::default();
        store.current = Some(doc);
        harness_with_store(n, store)
    }

    fn harness_with_store(n: usize, store: MemoryStore) -> Harness {
        let (publisher, bus) = MemoryBus::new();
        let device = CaptureDevice::default();
        let output = OutputWorker::spawn(Box::new(device.clone()), 1, 1).unwrap();
        let driver = LightDriver::new(
            test_settings(n),
            Box::new(store),
            Box::new(bus),
            output,
        );
        Harness {
            driver,
            publisher,
            device,
        }
    }

    /// Publish commands from a controller thread after the given delays
    fn schedule(publisher: &CommandPublisher, steps: Vec<(u64, Command)>) {
        let publisher = publisher.clone();
        std::thread::spawn(move || {
            for (delay_ms, command) in steps {
                std::thread::sleep(Duration::from_millis(delay_ms));
                publisher.publish(command);
            }
        });
    }

    #[test]
    fn test_brightness_pipeline_end_to_end() {
        // N=8, base all white, brightness 0.5: every pixel (128,128,128)
        let doc = run_doc(
            white_lights(8),
            json!([{ "id": 1, "kind": "brightness", "order": 0,
                     "params": { "brightness": 0.5 } }]),
        );
        let mut h = harness(8, doc);
        schedule(&h.publisher, vec![(100, Command::Stop)]);
        h.driver.start(None);
        h.driver.shutdown();

        let frames = h.device.frames.lock().unwrap();
        assert!(frames.len() >= 2, "got {} frames", frames.len());
        for pixel in &frames[0] {
            assert_eq!(*pixel, [128, 128, 128, 0]);
        }
        // The final frame clears the strip
        let last = frames.last().unwrap();
        assert!(last.iter().all(|p| *p == [0, 0, 0, 0]));
        assert!(h.device.closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_layer_then_brightness_pipeline() {
        // Solid red layer over black, then brightness 0.5: (128,0,0)
        let doc = run_doc(
            vec![Color::BLACK; 8],
            json!([
                { "id": 1, "kind": "color", "order": 0,
                  "params": { "color": { "r": 1.0, "g": 0.0, "b": 0.0 } } },
                { "id": 2, "kind": "brightness", "order": 1,
                  "params": { "brightness": 0.5 } }
            ]),
        );
        let mut h = harness(8, doc);
        schedule(&h.publisher, vec![(100, Command::Stop)]);
        h.driver.start(None);

        let frames = h.device.frames.lock().unwrap();
        for pixel in &frames[0] {
            assert_eq!(*pixel, [128, 0, 0, 0]);
        }
    }

    #[test]
    fn test_wrong_length_base_buffer_stops() {
        let doc = run_doc(white_lights(4), json!([]));
        let mut h = harness(8, doc);
        h.driver.start(None);
        // Only the clear frame goes out
        let frames = h.device.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
    }

    struct ProbeTransformDefinition {
        creates: Arc<AtomicUsize>,
    }

    struct ProbeTransform;

    impl Transform for ProbeTransform {
        fn kind(&self) -> &'static str {
            "probe"
        }

        fn transform(&mut self, _time: f64, colors: &[Color]) -> Vec<Color> {
            colors.to_vec()
        }
    }

    impl TransformDefinition for ProbeTransformDefinition {
        fn kind(&self) -> &'static str {
            "probe"
        }

        fn display_name(&self) -> &'static str {
            "Probe"
        }

        fn params_def(&self) -> ParamsDef {
            ParamsDef::default()
        }

        fn create(&self, _params: ParamSet) -> Box<dyn Transform> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Box::new(ProbeTransform)
        }
    }

    struct ProbeVariableDefinition {
        closes: Arc<AtomicUsize>,
        creates: Arc<AtomicUsize>,
    }

    struct ProbeVariable {
        closes: Arc<AtomicUsize>,
    }

    impl Variable for ProbeVariable {
        fn kind(&self) -> &'static str {
            "probe"
        }

        fn get_value(&self) -> f64 {
            0.5
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl VariableDefinition for ProbeVariableDefinition {
        fn kind(&self) -> &'static str {
            "probe"
        }

        fn display_name(&self) -> &'static str {
            "Probe"
        }

        fn params_def(&self) -> ParamsDef {
            ParamsDef::default()
        }

        fn create(
            &self,
            _params: &ParamSet,
            _ctx: &VariableContext,
        ) -> Result<Box<dyn Variable>, Error> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ProbeVariable {
                closes: Arc::clone(&self.closes),
            }))
        }
    }

    #[test]
    fn test_restart_rebuilds_once_and_preserves_variables() {
        let mut doc = run_doc(
            white_lights(4),
            json!([{ "id": 1, "kind": "probe", "order": 0, "params": {} },
                   { "id": 2, "kind": "flash", "order": 1, "params": {} }]),
        );
        doc.variables.push(VariableSpec {
            id: 9,
            kind: "probe".to_string(),
            name: "P".to_string(),
            params: json!({}),
        });

        let transform_creates = Arc::new(AtomicUsize::new(0));
        let variable_creates = Arc::new(AtomicUsize::new(0));
        let variable_closes = Arc::new(AtomicUsize::new(0));

        let mut h = harness(4, doc);
        h.driver
            .transform_registry_mut()
            .register(ProbeTransformDefinition {
                creates: Arc::clone(&transform_creates),
            });
        h.driver
            .variable_registry_mut()
            .register(ProbeVariableDefinition {
                creates: Arc::clone(&variable_creates),
                closes: Arc::clone(&variable_closes),
            });

        // Two back-to-back restarts already queued when the run begins must
        // cause exactly one rebuild
        h.publisher.publish(Command::Restart);
        h.publisher.publish(Command::Restart);
        schedule(&h.publisher, vec![(100, Command::Stop)]);
        h.driver.start(None);
        h.driver.shutdown();

        assert_eq!(transform_creates.load(Ordering::SeqCst), 2);
        assert_eq!(variable_creates.load(Ordering::SeqCst), 1);
        assert_eq!(variable_closes.load(Ordering::SeqCst), 1);
        assert!(h.device.closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_playlist_advances_between_configs() {
        let red = run_doc(
            vec![Color::new(1.0, 0.0, 0.0); 2],
            json!([{ "id": 1, "kind": "flash", "order": 0,
                     "params": { "start_value": 1.0, "end_value": 1.0 } }]),
        );
        let green = run_doc(
            vec![Color::new(0.0, 1.0, 0.0); 2],
            json!([{ "id": 1, "kind": "flash", "order": 0,
                     "params": { "start_value": 1.0, "end_value": 1.0 } }]),
        );

        let mut store = MemoryStore::default();
        store.runs.insert(1, red);
        store.runs.insert(2, green);
        store.playlists.insert(
            7,
            serde_json::from_value(json!({
                "base_duration_secs": 0.1,
                "entries": [
                    { "config_id": 1 },
                    { "config_id": 2 }
                ]
            }))
            .unwrap(),
        );

        let mut h = harness_with_store(2, store);
        schedule(&h.publisher, vec![(350, Command::Stop)]);
        h.driver.start(Some(7));

        let frames = h.device.frames.lock().unwrap();
        let saw_red = frames.iter().any(|f| f[0] == [255, 0, 0, 0]);
        let saw_green = frames.iter().any(|f| f[0] == [0, 255, 0, 0]);
        assert!(saw_red, "never saw the first playlist entry");
        assert!(saw_green, "never saw the second playlist entry");
    }

    #[test]
    fn test_color_command_feeds_channel_map() {
        let mut doc = run_doc(
            white_lights(2),
            json!([{ "id": 1, "kind": "flash", "order": 0, "params": {} }]),
        );
        doc.variables.push(VariableSpec {
            id: 3,
            kind: "colorchannel".to_string(),
            name: "Mood".to_string(),
            params: json!({ "channel": "mood" }),
        });

        let mut h = harness(2, doc);
        schedule(
            &h.publisher,
            vec![
                (
                    40,
                    Command::Color {
                        channel: "mood".to_string(),
                        color: Color::new(0.0, 0.0, 1.0),
                    },
                ),
                (80, Command::Stop),
            ],
        );
        h.driver.start(None);

        let channels = h.driver.color_channels.borrow();
        assert_eq!(channels.get("mood"), Some(&Color::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_global_brightness_variable_scales_output() {
        let mut doc = run_doc(
            white_lights(2),
            json!([{ "id": 1, "kind": "flash", "order": 0,
                     "params": { "start_value": 1.0, "end_value": 1.0 } }]),
        );
        doc.variables.push(VariableSpec {
            id: 1,
            kind: "probe".to_string(),
            name: "Brightness".to_string(),
            params: json!({}),
        });

        let mut h = harness(2, doc);
        h.driver
            .variable_registry_mut()
            .register(ProbeVariableDefinition {
                creates: Arc::new(AtomicUsize::new(0)),
                closes: Arc::new(AtomicUsize::new(0)),
            });
        schedule(&h.publisher, vec![(80, Command::Stop)]);
        h.driver.start(None);

        let frames = h.device.frames.lock().unwrap();
        // Probe variable reports 0.5: white scales to 128
        assert_eq!(frames[0][0], [128, 128, 128, 0]);
    }

    #[test]
    fn test_unknown_transform_kind_dropped_but_run_continues() {
        let doc = run_doc(
            white_lights(2),
            json!([
                { "id": 1, "kind": "wormhole", "order": 0, "params": {} },
                { "id": 2, "kind": "brightness", "order": 1,
                  "params": { "brightness": 0.5 } }
            ]),
        );
        let mut h = harness(2, doc);
        schedule(&h.publisher, vec![(100, Command::Stop)]);
        h.driver.start(None);

        let frames = h.device.frames.lock().unwrap();
        assert!(frames.len() >= 2);
        assert_eq!(frames[0][0], [128, 128, 128, 0]);
    }

    #[test]
    fn test_variable_binding_drives_transform_param() {
        // Probe variable (0.5) bound with multiply=2, add=-0.5 onto
        // brightness: effective factor 0.5
        let mut doc = run_doc(
            white_lights(2),
            json!([
                { "id": 1, "kind": "brightness", "order": 0,
                  "params": { "brightness": 1.0 },
                  "variable_bindings": [
                      { "name": "brightness", "variable_id": 4,
                        "multiply": 2.0, "add": -0.5 }
                  ] },
                { "id": 2, "kind": "flash", "order": 1,
                  "params": { "start_value": 1.0, "end_value": 1.0 } }
            ]),
        );
        doc.variables.push(VariableSpec {
            id: 4,
            kind: "probe".to_string(),
            name: "P".to_string(),
            params: json!({}),
        });

        let mut h = harness(2, doc);
        h.driver
            .variable_registry_mut()
            .register(ProbeVariableDefinition {
                creates: Arc::new(AtomicUsize::new(0)),
                closes: Arc::new(AtomicUsize::new(0)),
            });
        schedule(&h.publisher, vec![(80, Command::Stop)]);
        h.driver.start(None);

        let frames = h.device.frames.lock().unwrap();
        // 2 * 0.5 - 0.5 = 0.5: white comes out at 128
        assert_eq!(frames[0][0], [128, 128, 128, 0]);
    }

    #[test]
    fn test_run_consumes_start_from_bus() {
        let doc = run_doc(
            white_lights(2),
            json!([{ "id": 1, "kind": "flash", "order": 0, "params": {} }]),
        );
        let mut h = harness(2, doc);
        let flag = h.driver.interrupt_flag();

        schedule(
            &h.publisher,
            vec![(30, Command::Start { playlist_id: None }), (120, Command::Stop)],
        );
        let stopper = flag.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            stopper.store(true, Ordering::SeqCst);
        });
        h.driver.run();
        h.driver.shutdown();

        let frames = h.device.frames.lock().unwrap();
        assert!(frames.len() >= 2);
        assert!(h.device.closed.load(Ordering::SeqCst));
    }
}
