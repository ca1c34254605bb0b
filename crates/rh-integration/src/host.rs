//! The host facade
//!
//! `RetroHost` owns the loaded core, the audio output, the input state and
//! the frame pacer, and exposes the handful of operations a UI needs.

use crate::callbacks::{self, SessionContext};
use crate::environment::EnvironmentNegotiator;
use crate::pacer::{Clock, FastForward, FramePacer, FrameTiming, MonotonicClock, PacerState};
use crate::state_io::StateIo;
use crate::video::{FrameView, TextureTarget, VideoSink};
use rh_audio::AudioOutput;
use rh_core::error::{HostError, LoaderError, StateError};
use rh_core::{Config, ConsoleProfile, Result};
use rh_ffi::SystemAvInfo;
use rh_input::InputState;
use rh_loader::{CoreApi, CoreLibrary, DynamicCoreLoader};
use rh_vfs::{HostPaths, SaveStateStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Where the core comes from
enum CoreSource {
    /// Discovered on disk and opened with the dynamic loader
    Dynamic { roots: Vec<PathBuf> },
    /// Entry points already linked into the process
    Linked(CoreApi),
}

/// Content currently loaded into the core
struct LoadedContent {
    path: PathBuf,
    state_io: StateIo,
    states: SaveStateStore,
    av_info: SystemAvInfo,
}

/// Real-time host for one libretro core
pub struct RetroHost {
    config: Config,
    profile: &'static ConsoleProfile,
    paths: HostPaths,
    source: CoreSource,
    core: Option<CoreLibrary>,
    session: Arc<SessionContext>,
    audio: AudioOutput,
    input: Arc<InputState>,
    pacer: FramePacer,
    clock: MonotonicClock,
    content: Option<LoadedContent>,
}

impl RetroHost {
    /// Host that discovers its core under the configured search roots
    pub fn new(
        config: Config,
        profile: &'static ConsoleProfile,
        target: Box<dyn TextureTarget>,
    ) -> Self {
        let roots = config.paths.core_search.clone();
        Self::with_source(config, profile, target, CoreSource::Dynamic { roots })
    }

    /// Host driving a core whose entry points are already linked in
    pub fn with_core_api(
        config: Config,
        profile: &'static ConsoleProfile,
        target: Box<dyn TextureTarget>,
        api: CoreApi,
    ) -> Self {
        Self::with_source(config, profile, target, CoreSource::Linked(api))
    }

    fn with_source(
        config: Config,
        profile: &'static ConsoleProfile,
        target: Box<dyn TextureTarget>,
        source: CoreSource,
    ) -> Self {
        let paths = HostPaths::new(&config.paths.documents);
        let audio = AudioOutput::new(&config.audio);
        let input = Arc::new(InputState::new());
        let session = Arc::new(SessionContext::new(
            EnvironmentNegotiator::new(profile, paths.clone()),
            VideoSink::new(target),
            Arc::clone(audio.ring()),
            Arc::clone(&input),
        ));

        Self {
            config,
            profile,
            paths,
            source,
            core: None,
            session,
            audio,
            input,
            pacer: FramePacer::new(),
            clock: MonotonicClock::new(),
            content: None,
        }
    }

    pub fn profile(&self) -> &'static ConsoleProfile {
        self.profile
    }

    pub fn paths(&self) -> &HostPaths {
        &self.paths
    }

    /// Input state the UI pushes button masks into
    pub fn input(&self) -> &Arc<InputState> {
        &self.input
    }

    pub fn state(&self) -> PacerState {
        self.pacer.state()
    }

    /// Accumulator state of the frame loop
    pub fn timing(&self) -> &FrameTiming {
        self.pacer.timing()
    }

    pub fn is_running(&self) -> bool {
        self.pacer.state() == PacerState::Running
    }

    /// AV info reported for the loaded game
    pub fn av_info(&self) -> Option<&SystemAvInfo> {
        self.content.as_ref().map(|c| &c.av_info)
    }

    pub fn content_path(&self) -> Option<&Path> {
        self.content.as_ref().map(|c| c.path.as_path())
    }

    pub fn core(&self) -> Option<&CoreLibrary> {
        self.core.as_ref()
    }

    pub fn audio(&self) -> &AudioOutput {
        &self.audio
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Register a view to be redrawn on every presented frame
    pub fn add_view(&self, view: &Arc<dyn FrameView>) {
        self.session.video.lock().add_view(view);
    }

    /// Shared fast-forward switch, for UIs that toggle it from elsewhere
    pub fn fast_forward_switch(&self) -> FastForward {
        self.pacer.fast_forward().clone()
    }

    /// Load a game by path. Failures are logged and reported as `false`.
    pub fn load_game(&mut self, path: &Path) -> bool {
        match self.try_load_game(path) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Load a game by path.
    ///
    /// Loads the core on first use, stops any running game (saving its
    /// SRAM), passes the path to the core, restores SRAM, then starts audio
    /// and the frame loop at the core's reported rates.
    pub fn try_load_game(&mut self, path: &Path) -> Result<()> {
        self.ensure_core()?;
        self.stop_loop();

        let Some(core) = self.core.as_ref() else {
            return Err(LoaderError::NotLoaded.into());
        };
        if self.content.take().is_some() {
            core.unload_game();
        }

        info!("Loading content {}", path.display());
        if !core.load_game(path)? {
            return Err(HostError::GameLoadFailed(path.display().to_string()));
        }

        let state_io = StateIo::new(self.profile, &self.paths, path);
        if let Err(e) = state_io.load_persistent(core) {
            warn!("Save RAM not restored: {}", e);
        }

        let av_info = core.system_av_info();
        info!(
            "Game loaded: {}x{} @ {:.3} fps, {} Hz",
            av_info.geometry.base_width,
            av_info.geometry.base_height,
            av_info.timing.fps,
            av_info.timing.sample_rate
        );

        self.content = Some(LoadedContent {
            path: path.to_path_buf(),
            states: SaveStateStore::new(&self.paths, path),
            state_io,
            av_info,
        });
        self.pacer.mark_loaded();

        self.audio.start(sample_rate(&av_info));
        self.pacer.start(av_info.timing.fps, self.clock.now());

        if self.config.general.start_paused {
            self.pause();
        }
        Ok(())
    }

    fn ensure_core(&mut self) -> Result<()> {
        if self.core.is_some() {
            return Ok(());
        }

        callbacks::install(&self.session)?;
        let host_callbacks = callbacks::host_callbacks();
        let loaded = match &self.source {
            CoreSource::Dynamic { roots } => {
                DynamicCoreLoader::new(self.profile, roots.clone()).load(&host_callbacks)
            }
            CoreSource::Linked(api) => {
                let mut core = CoreLibrary::from_api(*api);
                core.register_callbacks(&host_callbacks);
                core.init();
                Ok(core)
            }
        };

        match loaded {
            Ok(core) => {
                self.core = Some(core);
                Ok(())
            }
            Err(e) => {
                callbacks::uninstall(&self.session);
                Err(e.into())
            }
        }
    }

    /// Pause the frame loop and audio output
    pub fn pause(&mut self) {
        if self.pacer.pause() {
            self.audio.stop();
            info!("Paused");
        }
    }

    /// Resume the frame loop and reopen audio at the negotiated rate
    pub fn resume(&mut self) {
        if self.pacer.resume(self.clock.now()) {
            self.audio.resume();
            info!("Resumed");
        }
    }

    /// Stop the loop from any state. SRAM is always saved first.
    pub fn stop_loop(&mut self) {
        self.save_persistent();
        self.pacer.stop();
        self.audio.stop();
    }

    fn save_persistent(&self) {
        if let (Some(core), Some(content)) = (self.core.as_ref(), self.content.as_ref()) {
            if let Err(e) = content.state_io.save_persistent(core) {
                error!("Failed to save SRAM: {}", e);
            }
        }
    }

    /// Display-refresh tick using the host's monotonic clock
    pub fn tick(&mut self) -> u32 {
        let now = self.clock.now();
        self.tick_at(now)
    }

    /// Display-refresh tick at `now` seconds. Returns core steps run.
    pub fn tick_at(&mut self, now: f64) -> u32 {
        let Some(core) = self.core.as_ref() else {
            return 0;
        };
        // Stale fast-forward audio goes before this tick's frames are produced
        if self.pacer.poll_fast_forward() == Some(false) {
            self.audio.flush();
        }
        self.pacer.tick(now, || core.run()).steps
    }

    /// Turn fast-forward on or off. Turning it off drops stale buffered audio.
    pub fn set_fast_forward(&mut self, enabled: bool) {
        self.pacer.fast_forward().set(enabled);
        if self.pacer.poll_fast_forward() == Some(false) {
            self.audio.flush();
        }
    }

    pub fn is_fast_forward(&self) -> bool {
        self.pacer.fast_forward().is_enabled()
    }

    /// Snapshot the machine. `None` when unsupported or the core fails.
    pub fn save_state(&self) -> Option<Vec<u8>> {
        self.try_save_state()
            .map_err(|e| warn!("Save state failed: {}", e))
            .ok()
    }

    pub fn try_save_state(&self) -> Result<Vec<u8>> {
        let core = self.loaded_core()?;
        Ok(StateIo::save_state(core)?)
    }

    /// Restore a snapshot taken by [`save_state`](Self::save_state)
    pub fn load_state(&self, blob: &[u8]) -> bool {
        match self.try_load_state(blob) {
            Ok(()) => true,
            Err(e) => {
                warn!("Load state failed: {}", e);
                false
            }
        }
    }

    pub fn try_load_state(&self, blob: &[u8]) -> Result<()> {
        let core = self.loaded_core()?;
        Ok(StateIo::load_state(core, blob)?)
    }

    /// Save a snapshot to a numbered slot on disk
    pub fn save_state_to_slot(&self, slot: u32) -> bool {
        let result = self.try_save_state().and_then(|blob| {
            let content = self.content.as_ref().ok_or(StateError::NoContent)?;
            content.states.save(slot, &blob)?;
            Ok(())
        });
        result.map_err(|e| warn!("Save to slot {} failed: {}", slot, e)).is_ok()
    }

    /// Restore the snapshot in a numbered slot
    pub fn load_state_from_slot(&self, slot: u32) -> bool {
        let result = (|| -> Result<()> {
            let content = self.content.as_ref().ok_or(StateError::NoContent)?;
            let blob = content
                .states
                .load(slot)?
                .ok_or(HostError::InvalidState("empty save slot"))?;
            self.try_load_state(&blob)
        })();
        result.map_err(|e| warn!("Load from slot {} failed: {}", slot, e)).is_ok()
    }

    /// Occupied save slots for the loaded content
    pub fn state_slots(&self) -> Vec<u32> {
        self.content
            .as_ref()
            .map(|c| c.states.slots())
            .unwrap_or_default()
    }

    /// Soft-reset the loaded game
    pub fn reset(&mut self) -> bool {
        match (self.core.as_ref(), self.content.as_ref()) {
            (Some(core), Some(_)) => {
                let done = core.reset();
                if done {
                    self.audio.flush();
                    info!("Game reset");
                }
                done
            }
            _ => false,
        }
    }

    /// Stop, unload the game and release the core
    pub fn unload(&mut self) {
        self.stop_loop();
        if let Some(mut core) = self.core.take() {
            if self.content.take().is_some() {
                core.unload_game();
            }
            core.shutdown();
        }
        self.content = None;
        callbacks::uninstall(&self.session);
        self.session.reset();
        self.input.clear();
        self.pacer.mark_unloaded();
    }

    fn loaded_core(&self) -> Result<&CoreLibrary> {
        match (self.core.as_ref(), self.content.as_ref()) {
            (Some(core), Some(_)) => Ok(core),
            _ => Err(StateError::NoContent.into()),
        }
    }
}

impl Drop for RetroHost {
    fn drop(&mut self) {
        self.unload();
    }
}

fn sample_rate(av: &SystemAvInfo) -> u32 {
    let rate = av.timing.sample_rate;
    if rate > 0.0 && rate.is_finite() {
        rate.round() as u32
    } else {
        44100
    }
}
