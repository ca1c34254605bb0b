//! Loaded core library and its entry point table

use crate::discovery;
use libc::{c_uint, c_void, size_t};
use libloading::Library;
use rh_core::error::{LoaderError, StateError};
use rh_core::ConsoleProfile;
use rh_ffi::{
    AudioSampleBatchFn, AudioSampleFn, EnvironmentFn, GameInfo, HostCallbacks, InputPollFn,
    InputStateFn, SystemAvInfo, VideoRefreshFn,
};
use std::ffi::CString;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use tracing::{debug, error, info, warn};

/// Resolved libretro entry points.
///
/// Filled once at load time and never mutated afterwards. Optional entries
/// are `None` when the core does not export them; the matching host
/// features then degrade to no-ops.
#[derive(Debug, Clone, Copy)]
pub struct CoreApi {
    pub init: unsafe extern "C" fn(),
    pub deinit: unsafe extern "C" fn(),
    pub load_game: unsafe extern "C" fn(*const GameInfo) -> bool,
    pub run: unsafe extern "C" fn(),

    pub api_version: Option<unsafe extern "C" fn() -> c_uint>,
    pub set_environment: Option<unsafe extern "C" fn(EnvironmentFn)>,
    pub set_video_refresh: Option<unsafe extern "C" fn(VideoRefreshFn)>,
    pub set_audio_sample: Option<unsafe extern "C" fn(AudioSampleFn)>,
    pub set_audio_sample_batch: Option<unsafe extern "C" fn(AudioSampleBatchFn)>,
    pub set_input_poll: Option<unsafe extern "C" fn(InputPollFn)>,
    pub set_input_state: Option<unsafe extern "C" fn(InputStateFn)>,
    pub get_system_av_info: Option<unsafe extern "C" fn(*mut SystemAvInfo)>,
    pub unload_game: Option<unsafe extern "C" fn()>,
    pub reset: Option<unsafe extern "C" fn()>,

    pub serialize_size: Option<unsafe extern "C" fn() -> size_t>,
    pub serialize: Option<unsafe extern "C" fn(*mut c_void, size_t) -> bool>,
    pub unserialize: Option<unsafe extern "C" fn(*const c_void, size_t) -> bool>,

    pub get_memory_data: Option<unsafe extern "C" fn(c_uint) -> *mut c_void>,
    pub get_memory_size: Option<unsafe extern "C" fn(c_uint) -> size_t>,
}

unsafe fn required<T: Copy>(lib: &Library, name: &'static str) -> Result<T, LoaderError> {
    match lib.get::<T>(name.as_bytes()) {
        Ok(sym) => Ok(*sym),
        Err(e) => {
            error!("Required symbol {} missing: {}", name, e);
            Err(LoaderError::MissingSymbol(name))
        }
    }
}

unsafe fn optional<T: Copy>(lib: &Library, name: &'static str) -> Option<T> {
    match lib.get::<T>(name.as_bytes()) {
        Ok(sym) => Some(*sym),
        Err(_) => {
            debug!("Optional symbol {} not exported", name);
            None
        }
    }
}

impl CoreApi {
    /// Bind every entry point from an opened library.
    ///
    /// # Safety
    /// The library must be a libretro core: each exported name has to match
    /// the signature declared in this struct.
    pub unsafe fn bind(lib: &Library) -> Result<Self, LoaderError> {
        Ok(Self {
            init: required(lib, "retro_init")?,
            deinit: required(lib, "retro_deinit")?,
            load_game: required(lib, "retro_load_game")?,
            run: required(lib, "retro_run")?,

            api_version: optional(lib, "retro_api_version"),
            set_environment: optional(lib, "retro_set_environment"),
            set_video_refresh: optional(lib, "retro_set_video_refresh"),
            set_audio_sample: optional(lib, "retro_set_audio_sample"),
            set_audio_sample_batch: optional(lib, "retro_set_audio_sample_batch"),
            set_input_poll: optional(lib, "retro_set_input_poll"),
            set_input_state: optional(lib, "retro_set_input_state"),
            get_system_av_info: optional(lib, "retro_get_system_av_info"),
            unload_game: optional(lib, "retro_unload_game"),
            reset: optional(lib, "retro_reset"),

            serialize_size: optional(lib, "retro_serialize_size"),
            serialize: optional(lib, "retro_serialize"),
            unserialize: optional(lib, "retro_unserialize"),

            get_memory_data: optional(lib, "retro_get_memory_data"),
            get_memory_size: optional(lib, "retro_get_memory_size"),
        })
    }

    /// Whether both save-state directions are available
    pub fn supports_save_states(&self) -> bool {
        self.serialize_size.is_some() && self.serialize.is_some() && self.unserialize.is_some()
    }

    /// Whether persistent memory can be queried
    pub fn supports_memory(&self) -> bool {
        self.get_memory_data.is_some() && self.get_memory_size.is_some()
    }
}

/// A core-owned memory block (e.g. battery-backed save RAM).
///
/// The host only copies bytes in and out; the core owns the storage.
#[derive(Debug)]
pub struct MemoryRegion<'a> {
    ptr: NonNull<u8>,
    len: usize,
    _core: PhantomData<&'a CoreLibrary>,
}

impl MemoryRegion<'_> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy the region out
    pub fn to_vec(&self) -> Vec<u8> {
        // SAFETY: the core guarantees `len` readable bytes at `ptr` while loaded.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len).to_vec() }
    }

    /// Copy `data` into the start of the region. Refused if it does not fit.
    pub fn fill_from(&mut self, data: &[u8]) -> Result<(), StateError> {
        if data.len() > self.len {
            return Err(StateError::RegionTooSmall {
                file: data.len(),
                region: self.len,
            });
        }
        // SAFETY: bounds checked above; the core's buffer does not alias `data`.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.as_ptr(), data.len());
        }
        Ok(())
    }
}

/// Handle to a loaded core: the open library plus its entry point table.
///
/// Released exactly once, either through [`CoreLibrary::shutdown`] or on drop.
pub struct CoreLibrary {
    api: CoreApi,
    path: Option<PathBuf>,
    // Declared after `api` so the table is never used past the library's lifetime
    library: Option<Library>,
    initialized: bool,
    released: bool,
}

impl std::fmt::Debug for CoreLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreLibrary")
            .field("path", &self.path)
            .field("initialized", &self.initialized)
            .field("released", &self.released)
            .finish()
    }
}

impl CoreLibrary {
    /// Open a core binary and bind its entry points
    pub fn open(path: &Path) -> Result<Self, LoaderError> {
        info!("Loading core from {}", path.display());

        // SAFETY: loading a core runs its static initialisers; that is the contract
        // of hosting native code.
        let library = unsafe { Library::new(path) }.map_err(|e| LoaderError::CoreLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // SAFETY: names are bound to the libretro signatures declared in CoreApi.
        let api = unsafe { CoreApi::bind(&library) }?;

        Ok(Self {
            api,
            path: Some(path.to_path_buf()),
            library: Some(library),
            initialized: false,
            released: false,
        })
    }

    /// Wrap an entry point table that is already linked into the process
    pub fn from_api(api: CoreApi) -> Self {
        Self {
            api,
            path: None,
            library: None,
            initialized: false,
            released: false,
        }
    }

    pub fn api(&self) -> &CoreApi {
        &self.api
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized && !self.released
    }

    /// Hand the host callbacks to the core. Must happen before [`init`](Self::init).
    pub fn register_callbacks(&self, callbacks: &HostCallbacks) {
        let api = &self.api;
        // SAFETY: setters only store the pointers; all callbacks are 'static fns.
        unsafe {
            match api.set_environment {
                Some(set) => set(callbacks.environment),
                None => warn!("Core has no retro_set_environment"),
            }
            if let Some(set) = api.set_video_refresh {
                set(callbacks.video_refresh);
            }
            if let Some(set) = api.set_audio_sample {
                set(callbacks.audio_sample);
            }
            if let Some(set) = api.set_audio_sample_batch {
                set(callbacks.audio_sample_batch);
            }
            if let Some(set) = api.set_input_poll {
                set(callbacks.input_poll);
            }
            if let Some(set) = api.set_input_state {
                set(callbacks.input_state);
            }
        }
    }

    /// Call `retro_init`. Repeated calls are ignored.
    pub fn init(&mut self) {
        if self.initialized || self.released {
            return;
        }
        if let Some(version) = self.api.api_version {
            // SAFETY: pure query.
            let v = unsafe { version() };
            if v != rh_ffi::RETRO_API_VERSION {
                warn!("Core reports libretro API version {}", v);
            }
        }
        // SAFETY: callbacks were registered; init is called once.
        unsafe { (self.api.init)() };
        self.initialized = true;
        info!("Core initialized");
    }

    /// Load content by path only. The core reads the file itself.
    pub fn load_game(&self, content: &Path) -> Result<bool, LoaderError> {
        if !self.is_initialized() {
            return Err(LoaderError::NotLoaded);
        }
        let c_path = CString::new(content.to_string_lossy().into_owned()).map_err(|_| {
            LoaderError::CoreLoadFailed {
                path: content.to_path_buf(),
                reason: "content path contains a NUL byte".to_string(),
            }
        })?;
        let info = GameInfo::from_path(c_path.as_ptr());
        // SAFETY: `info` and the path it points to outlive the call.
        Ok(unsafe { (self.api.load_game)(&info) })
    }

    pub fn unload_game(&self) {
        if !self.is_initialized() {
            return;
        }
        if let Some(unload) = self.api.unload_game {
            // SAFETY: core is initialized.
            unsafe { unload() };
        }
    }

    /// Query AV info; falls back to 60 fps / 44.1 kHz when the core has no query
    pub fn system_av_info(&self) -> SystemAvInfo {
        let mut av = SystemAvInfo::default();
        if !self.is_initialized() {
            return av;
        }
        if let Some(get) = self.api.get_system_av_info {
            // SAFETY: `av` is a valid, writable retro_system_av_info.
            unsafe { get(&mut av) };
        }
        av
    }

    /// Run exactly one emulated frame
    pub fn run(&self) {
        if !self.is_initialized() {
            return;
        }
        // SAFETY: core is initialized and not released.
        unsafe { (self.api.run)() };
    }

    pub fn reset(&self) -> bool {
        match (self.is_initialized(), self.api.reset) {
            (true, Some(reset)) => {
                // SAFETY: core is initialized.
                unsafe { reset() };
                true
            }
            _ => false,
        }
    }

    pub fn serialize_size(&self) -> Option<usize> {
        if !self.is_initialized() {
            return None;
        }
        // SAFETY: pure query on an initialized core.
        self.api.serialize_size.map(|f| unsafe { f() })
    }

    /// Serialize into `buf`; `None` when unsupported
    pub fn serialize(&self, buf: &mut [u8]) -> Option<bool> {
        if !self.is_initialized() {
            return None;
        }
        let f = self.api.serialize?;
        // SAFETY: `buf` is writable for its full length.
        Some(unsafe { f(buf.as_mut_ptr().cast(), buf.len()) })
    }

    /// Restore from `buf`; `None` when unsupported
    pub fn unserialize(&self, buf: &[u8]) -> Option<bool> {
        if !self.is_initialized() {
            return None;
        }
        let f = self.api.unserialize?;
        // SAFETY: `buf` is readable for its full length.
        Some(unsafe { f(buf.as_ptr().cast(), buf.len()) })
    }

    /// Core-owned memory of the given kind, if the core exposes a non-empty one
    pub fn memory_region(&self, kind: c_uint) -> Option<MemoryRegion<'_>> {
        if !self.is_initialized() {
            return None;
        }
        let get_size = self.api.get_memory_size?;
        let get_data = self.api.get_memory_data?;
        // SAFETY: pure queries on an initialized core.
        let len = unsafe { get_size(kind) };
        if len == 0 {
            return None;
        }
        let ptr = NonNull::new(unsafe { get_data(kind) }.cast::<u8>())?;
        Some(MemoryRegion {
            ptr,
            len,
            _core: PhantomData,
        })
    }

    /// Call `retro_deinit` and close the library. Runs at most once.
    pub fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.initialized {
            // SAFETY: paired with the single successful init.
            unsafe { (self.api.deinit)() };
            self.initialized = false;
        }
        if let Some(library) = self.library.take() {
            if let Err(e) = library.close() {
                warn!("Failed to close core library: {}", e);
            }
        }
        info!("Core released");
    }
}

impl Drop for CoreLibrary {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Resolves, opens, wires and initializes a core in one step
pub struct DynamicCoreLoader<'a> {
    profile: &'a ConsoleProfile,
    roots: Vec<PathBuf>,
}

impl<'a> DynamicCoreLoader<'a> {
    pub fn new(profile: &'a ConsoleProfile, roots: Vec<PathBuf>) -> Self {
        Self { profile, roots }
    }

    pub fn candidates(&self) -> Vec<PathBuf> {
        discovery::candidate_paths(self.profile, &self.roots)
    }

    /// Find and open the core, register `callbacks`, then call `retro_init`
    pub fn load(&self, callbacks: &HostCallbacks) -> Result<CoreLibrary, LoaderError> {
        let path = discovery::resolve(&self.candidates())?;
        let mut core = CoreLibrary::open(&path)?;
        core.register_callbacks(callbacks);
        core.init();
        info!("{} core ready", self.profile.name);
        Ok(core)
    }
}
