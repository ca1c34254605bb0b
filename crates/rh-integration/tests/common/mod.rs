//! In-process mock libretro core
//!
//! The entry points below are plain `extern "C"` functions wired into a
//! `CoreApi`, so the host drives them exactly like a loaded library.

#![allow(dead_code)]

use libc::{c_char, c_uint, c_void, size_t};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rh_core::Config;
use rh_ffi::{
    env, AudioSampleBatchFn, AudioSampleFn, EnvironmentFn, GameInfo, InputPollFn, InputStateFn,
    PixelFormat, SystemAvInfo, Variable, VideoRefreshFn, DEVICE_JOYPAD, MEMORY_SAVE_RAM,
};
use rh_loader::CoreApi;
use std::ffi::CStr;
use std::path::Path;

pub const SRAM_SIZE: usize = 8192;
pub const STATE_SIZE: usize = 64;
pub const FRAME_WIDTH: u32 = 4;
pub const FRAME_HEIGHT: u32 = 2;
/// Row pitch wider than `FRAME_WIDTH * 2`
pub const FRAME_PITCH: usize = 16;
pub const AUDIO_FRAMES_PER_RUN: usize = 4;

/// Everything the mock observed or holds
#[derive(Default)]
pub struct MockState {
    pub environment: Option<EnvironmentFn>,
    pub video_refresh: Option<VideoRefreshFn>,
    pub audio_sample: Option<AudioSampleFn>,
    pub audio_sample_batch: Option<AudioSampleBatchFn>,
    pub input_poll: Option<InputPollFn>,
    pub input_state: Option<InputStateFn>,

    pub inits: u32,
    pub deinits: u32,
    pub loads: u32,
    pub unloads: u32,
    pub resets: u32,
    pub runs: u64,

    pub loaded_path: Option<String>,
    pub loaded_data_null: bool,
    pub loaded_size: usize,

    pub xrgb8888_accepted: Option<bool>,
    pub rgb565_accepted: Option<bool>,
    pub can_dupe: bool,
    pub system_dir: Option<String>,
    pub frameskip: Option<String>,
    pub last_button_a: i16,

    pub machine: Vec<u8>,
    pub sram: Vec<u8>,
}

pub static MOCK: Lazy<Mutex<MockState>> = Lazy::new(|| Mutex::new(MockState::default()));

/// Serializes tests sharing the mock and the host's callback slot
pub static TEST_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Fresh mock state and logging for one test
pub fn reset_mock() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();

    *MOCK.lock() = MockState {
        machine: vec![0; STATE_SIZE],
        sram: vec![0; SRAM_SIZE],
        ..MockState::default()
    };
}

/// Config rooted at `documents` with silent audio and no core search paths
pub fn test_config(documents: &Path) -> Config {
    let mut config = Config::default();
    config.paths.documents = documents.to_path_buf();
    config.paths.core_search = vec![documents.join("cores")];
    config.audio.backend = rh_core::config::AudioBackend::Null;
    config
}

/// Full entry point table
pub fn api() -> CoreApi {
    CoreApi {
        init: retro_init,
        deinit: retro_deinit,
        load_game: retro_load_game,
        run: retro_run,

        api_version: Some(retro_api_version),
        set_environment: Some(retro_set_environment),
        set_video_refresh: Some(retro_set_video_refresh),
        set_audio_sample: Some(retro_set_audio_sample),
        set_audio_sample_batch: Some(retro_set_audio_sample_batch),
        set_input_poll: Some(retro_set_input_poll),
        set_input_state: Some(retro_set_input_state),
        get_system_av_info: Some(retro_get_system_av_info),
        unload_game: Some(retro_unload_game),
        reset: Some(retro_reset),

        serialize_size: Some(retro_serialize_size),
        serialize: Some(retro_serialize),
        unserialize: Some(retro_unserialize),

        get_memory_data: Some(retro_get_memory_data),
        get_memory_size: Some(retro_get_memory_size),
    }
}

/// Only the required lifecycle symbols plus callback setters
pub fn minimal_api() -> CoreApi {
    CoreApi {
        serialize_size: None,
        serialize: None,
        unserialize: None,
        get_memory_data: None,
        get_memory_size: None,
        reset: None,
        ..api()
    }
}

unsafe extern "C" fn retro_api_version() -> c_uint {
    rh_ffi::RETRO_API_VERSION
}

unsafe extern "C" fn retro_set_environment(cb: EnvironmentFn) {
    MOCK.lock().environment = Some(cb);
}

unsafe extern "C" fn retro_set_video_refresh(cb: VideoRefreshFn) {
    MOCK.lock().video_refresh = Some(cb);
}

unsafe extern "C" fn retro_set_audio_sample(cb: AudioSampleFn) {
    MOCK.lock().audio_sample = Some(cb);
}

unsafe extern "C" fn retro_set_audio_sample_batch(cb: AudioSampleBatchFn) {
    MOCK.lock().audio_sample_batch = Some(cb);
}

unsafe extern "C" fn retro_set_input_poll(cb: InputPollFn) {
    MOCK.lock().input_poll = Some(cb);
}

unsafe extern "C" fn retro_set_input_state(cb: InputStateFn) {
    MOCK.lock().input_state = Some(cb);
}

fn environment() -> EnvironmentFn {
    MOCK.lock().environment.expect("environment callback registered")
}

unsafe extern "C" fn retro_init() {
    let env_cb = environment();

    let mut dupe = false;
    env_cb(env::GET_CAN_DUPE, (&mut dupe as *mut bool).cast());

    let mut dir: *const c_char = std::ptr::null();
    let system_dir = if env_cb(env::GET_SYSTEM_DIRECTORY, (&mut dir as *mut *const c_char).cast()) {
        Some(CStr::from_ptr(dir).to_string_lossy().into_owned())
    } else {
        None
    };

    let mut mock = MOCK.lock();
    mock.inits += 1;
    mock.can_dupe = dupe;
    mock.system_dir = system_dir;
}

unsafe extern "C" fn retro_deinit() {
    MOCK.lock().deinits += 1;
}

unsafe extern "C" fn retro_load_game(info: *const GameInfo) -> bool {
    let info = &*info;
    let path = CStr::from_ptr(info.path).to_string_lossy().into_owned();
    let env_cb = environment();

    let mut xrgb = PixelFormat::Xrgb8888 as u32;
    let xrgb_ok = env_cb(env::SET_PIXEL_FORMAT, (&mut xrgb as *mut u32).cast());
    let mut rgb565 = PixelFormat::Rgb565 as u32;
    let rgb565_ok = env_cb(env::SET_PIXEL_FORMAT, (&mut rgb565 as *mut u32).cast());

    let mut var = Variable {
        key: c"pcsx_rearmed_frameskip".as_ptr(),
        value: std::ptr::null(),
    };
    let frameskip = if env_cb(env::GET_VARIABLE, (&mut var as *mut Variable).cast()) {
        Some(CStr::from_ptr(var.value).to_string_lossy().into_owned())
    } else {
        None
    };

    let mut mock = MOCK.lock();
    mock.loads += 1;
    mock.loaded_data_null = info.data.is_null();
    mock.loaded_size = info.size;
    mock.xrgb8888_accepted = Some(xrgb_ok);
    mock.rgb565_accepted = Some(rgb565_ok);
    mock.frameskip = frameskip;
    let accept = !path.contains("unreadable");
    mock.loaded_path = Some(path);
    accept
}

unsafe extern "C" fn retro_unload_game() {
    MOCK.lock().unloads += 1;
}

unsafe extern "C" fn retro_reset() {
    let mut mock = MOCK.lock();
    mock.resets += 1;
    mock.machine.fill(0);
}

unsafe extern "C" fn retro_get_system_av_info(out: *mut SystemAvInfo) {
    let av = &mut *out;
    av.geometry.base_width = 320;
    av.geometry.base_height = 240;
    av.geometry.max_width = 640;
    av.geometry.max_height = 480;
    av.geometry.aspect_ratio = 4.0 / 3.0;
    av.timing.fps = 60.0;
    av.timing.sample_rate = 44100.0;
}

unsafe extern "C" fn retro_run() {
    let (poll, state, video, batch) = {
        let mut mock = MOCK.lock();
        mock.runs += 1;
        let runs = mock.runs;
        mock.machine[..8].copy_from_slice(&runs.to_le_bytes());
        (
            mock.input_poll,
            mock.input_state,
            mock.video_refresh,
            mock.audio_sample_batch,
        )
    };

    if let Some(poll) = poll {
        poll();
    }
    let pressed = match state {
        Some(state) => state(0, DEVICE_JOYPAD, 0, 8),
        None => 0,
    };
    MOCK.lock().last_button_a = pressed;

    if let Some(video) = video {
        // Solid red RGB565, padding bytes after each row
        let mut frame = [0u8; FRAME_PITCH * FRAME_HEIGHT as usize];
        for row in frame.chunks_exact_mut(FRAME_PITCH) {
            for px in row[..FRAME_WIDTH as usize * 2].chunks_exact_mut(2) {
                px.copy_from_slice(&0xf800u16.to_ne_bytes());
            }
            row[FRAME_WIDTH as usize * 2..].fill(0x55);
        }
        video(frame.as_ptr().cast(), FRAME_WIDTH, FRAME_HEIGHT, FRAME_PITCH);
    }

    if let Some(batch) = batch {
        let samples = [100i16; AUDIO_FRAMES_PER_RUN * 2];
        batch(samples.as_ptr(), AUDIO_FRAMES_PER_RUN);
    }
}

unsafe extern "C" fn retro_serialize_size() -> size_t {
    MOCK.lock().machine.len()
}

unsafe extern "C" fn retro_serialize(data: *mut c_void, size: size_t) -> bool {
    let mock = MOCK.lock();
    if size != mock.machine.len() {
        return false;
    }
    std::ptr::copy_nonoverlapping(mock.machine.as_ptr(), data.cast::<u8>(), size);
    true
}

unsafe extern "C" fn retro_unserialize(data: *const c_void, size: size_t) -> bool {
    let mut mock = MOCK.lock();
    if size != mock.machine.len() {
        return false;
    }
    let src = std::slice::from_raw_parts(data.cast::<u8>(), size);
    mock.machine.copy_from_slice(src);
    true
}

unsafe extern "C" fn retro_get_memory_data(id: c_uint) -> *mut c_void {
    if id != MEMORY_SAVE_RAM {
        return std::ptr::null_mut();
    }
    MOCK.lock().sram.as_mut_ptr().cast()
}

unsafe extern "C" fn retro_get_memory_size(id: c_uint) -> size_t {
    if id != MEMORY_SAVE_RAM {
        return 0;
    }
    MOCK.lock().sram.len()
}
