//! ABI callback trampolines
//!
//! libretro callbacks carry no user pointer, so the session they serve is
//! found through a single process-wide slot. Only one core is hosted at a
//! time; the slot is filled before the core sees any callback and emptied
//! at unload.

use crate::environment::EnvironmentNegotiator;
use crate::video::VideoSink;
use libc::{c_uint, c_void, size_t};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use rh_audio::RingBuffer;
use rh_core::error::LoaderError;
use rh_ffi::HostCallbacks;
use rh_input::InputState;
use std::sync::Arc;

/// Everything a core reaches through its callbacks
pub struct SessionContext {
    pub negotiator: Mutex<EnvironmentNegotiator>,
    pub video: Mutex<VideoSink>,
    pub audio: Arc<RingBuffer>,
    pub input: Arc<InputState>,
}

impl SessionContext {
    pub fn new(
        negotiator: EnvironmentNegotiator,
        video: VideoSink,
        audio: Arc<RingBuffer>,
        input: Arc<InputState>,
    ) -> Self {
        Self {
            negotiator: Mutex::new(negotiator),
            video: Mutex::new(video),
            audio,
            input,
        }
    }

    /// Drop per-core negotiation so the next core starts from defaults
    pub fn reset(&self) {
        self.negotiator.lock().reset();
        self.video.lock().reset();
        self.audio.flush();
    }

    fn environment(&self, cmd: c_uint, data: *mut c_void) -> bool {
        let (handled, format) = {
            let mut negotiator = self.negotiator.lock();
            // SAFETY: payload contract is the core's side of the ABI.
            let handled = unsafe { negotiator.dispatch(cmd, data) };
            (handled, negotiator.pixel_format())
        };
        let mut video = self.video.lock();
        if video.pixel_format() != format {
            video.set_pixel_format(format);
        }
        handled
    }
}

static ACTIVE_SESSION: Lazy<RwLock<Option<Arc<SessionContext>>>> = Lazy::new(|| RwLock::new(None));

/// Make `session` the target of all callbacks
pub fn install(session: &Arc<SessionContext>) -> Result<(), LoaderError> {
    let mut slot = ACTIVE_SESSION.write();
    match slot.as_ref() {
        Some(current) if !Arc::ptr_eq(current, session) => Err(LoaderError::AlreadyLoaded),
        _ => {
            *slot = Some(Arc::clone(session));
            Ok(())
        }
    }
}

/// Empty the slot if it still holds `session`
pub fn uninstall(session: &Arc<SessionContext>) {
    let mut slot = ACTIVE_SESSION.write();
    if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, session)) {
        *slot = None;
    }
}

/// Whether any session is installed
pub fn is_installed() -> bool {
    ACTIVE_SESSION.read().is_some()
}

fn active() -> Option<Arc<SessionContext>> {
    ACTIVE_SESSION.read().clone()
}

/// Entry points to register with a core
pub fn host_callbacks() -> HostCallbacks {
    HostCallbacks {
        environment,
        video_refresh,
        audio_sample,
        audio_sample_batch,
        input_poll,
        input_state,
    }
}

unsafe extern "C" fn environment(cmd: c_uint, data: *mut c_void) -> bool {
    match active() {
        Some(session) => session.environment(cmd, data),
        None => false,
    }
}

unsafe extern "C" fn video_refresh(data: *const c_void, width: c_uint, height: c_uint, pitch: size_t) {
    let Some(session) = active() else { return };
    let result = session.video.lock().present_raw(data, width, height, pitch);
    if let Err(e) = result {
        tracing::warn!("Dropped video frame: {}", e);
    }
}

unsafe extern "C" fn audio_sample(left: i16, right: i16) {
    if let Some(session) = active() {
        session.audio.write_frame(left, right);
    }
}

unsafe extern "C" fn audio_sample_batch(data: *const i16, frames: size_t) -> size_t {
    let Some(session) = active() else { return 0 };
    if data.is_null() || frames == 0 {
        return 0;
    }
    let samples = std::slice::from_raw_parts(data, frames * 2);
    session.audio.write(samples, frames);
    frames
}

unsafe extern "C" fn input_poll() {
    if let Some(session) = active() {
        session.input.poll();
    }
}

unsafe extern "C" fn input_state(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16 {
    match active() {
        Some(session) => session.input.state(port, device, index, id),
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::CpuTexture;
    use rh_core::profile::PSX;
    use rh_ffi::{env, PixelFormat};
    use rh_input::{InputSource, RetroPadButtons};
    use rh_vfs::HostPaths;

    static LOCK: Mutex<()> = parking_lot::const_mutex(());

    fn session(dir: &std::path::Path) -> Arc<SessionContext> {
        Arc::new(SessionContext::new(
            EnvironmentNegotiator::new(&PSX, HostPaths::new(dir)),
            VideoSink::new(Box::new(CpuTexture::new())),
            Arc::new(RingBuffer::new(64)),
            Arc::new(InputState::new()),
        ))
    }

    #[test]
    fn test_trampolines_reach_installed_session() {
        let _guard = LOCK.lock();
        let dir = tempfile::TempDir::new().unwrap();
        let session = session(dir.path());
        install(&session).unwrap();
        let cb = host_callbacks();

        unsafe {
            let mut format = PixelFormat::Rgb565 as u32;
            assert!((cb.environment)(env::SET_PIXEL_FORMAT, (&mut format as *mut u32).cast()));
            assert_eq!(session.video.lock().pixel_format(), PixelFormat::Rgb565);

            let samples = [1i16, 2, 3, 4];
            assert_eq!((cb.audio_sample_batch)(samples.as_ptr(), 2), 2);
            (cb.audio_sample)(5, 6);
            assert_eq!(session.audio.pull(3), vec![1, 2, 3, 4, 5, 6]);

            session.input.set_mask(InputSource::Touch, RetroPadButtons::START);
            (cb.input_poll)();
            assert_eq!((cb.input_state)(0, rh_ffi::DEVICE_JOYPAD, 0, 3), 1);
            assert_eq!(session.input.poll_count(), 1);
        }

        uninstall(&session);
        assert!(!is_installed());
    }

    #[test]
    fn test_callbacks_without_session_are_inert() {
        let _guard = LOCK.lock();
        let cb = host_callbacks();
        unsafe {
            let mut dupe = false;
            assert!(!(cb.environment)(env::GET_CAN_DUPE, (&mut dupe as *mut bool).cast()));
            assert_eq!((cb.audio_sample_batch)([0i16; 2].as_ptr(), 1), 0);
            assert_eq!((cb.input_state)(0, 1, 0, 0), 0);
        }
    }

    #[test]
    fn test_second_session_refused() {
        let _guard = LOCK.lock();
        let dir = tempfile::TempDir::new().unwrap();
        let first = session(dir.path());
        let second = session(dir.path());

        install(&first).unwrap();
        install(&first).unwrap();
        assert!(matches!(install(&second), Err(LoaderError::AlreadyLoaded)));

        uninstall(&second);
        assert!(is_installed());
        uninstall(&first);
        assert!(!is_installed());
    }
}
