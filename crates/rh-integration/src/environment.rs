//! Environment negotiation
//!
//! The core calls in with a numeric command and an untyped payload. The
//! payload is decoded into an [`EnvCommand`] first; only the handful of
//! commands the host answers get a typed variant.

use libc::{c_char, c_uint, c_void};
use rh_core::ConsoleProfile;
use rh_ffi::{env, PixelFormat, Variable};
use rh_vfs::HostPaths;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::path::Path;
use tracing::{debug, warn};

/// A decoded environment call
#[derive(Debug)]
pub enum EnvCommand<'a> {
    GetCanDupe(&'a mut bool),
    GetSystemDirectory(&'a mut *const c_char),
    GetSaveDirectory(&'a mut *const c_char),
    /// Raw `enum retro_pixel_format` requested by the core
    SetPixelFormat(u32),
    GetVariable(&'a mut Variable),
    Unhandled(c_uint),
}

impl EnvCommand<'_> {
    /// Decode a raw environment call.
    ///
    /// # Safety
    /// `data` must be null or point to the payload type libretro defines for `cmd`,
    /// valid for the returned lifetime.
    pub unsafe fn from_raw(cmd: c_uint, data: *mut c_void) -> Self {
        if data.is_null() {
            return Self::Unhandled(cmd);
        }
        match cmd {
            env::GET_CAN_DUPE => Self::GetCanDupe(&mut *data.cast::<bool>()),
            env::GET_SYSTEM_DIRECTORY => {
                Self::GetSystemDirectory(&mut *data.cast::<*const c_char>())
            }
            env::GET_SAVE_DIRECTORY => Self::GetSaveDirectory(&mut *data.cast::<*const c_char>()),
            env::SET_PIXEL_FORMAT => Self::SetPixelFormat(*data.cast::<u32>()),
            env::GET_VARIABLE => Self::GetVariable(&mut *data.cast::<Variable>()),
            other => Self::Unhandled(other),
        }
    }
}

/// Answers environment queries for one loaded core.
///
/// Strings handed to the core stay owned here and remain valid until the
/// negotiator is dropped at unload.
pub struct EnvironmentNegotiator {
    profile: &'static ConsoleProfile,
    paths: HostPaths,
    pixel_format: PixelFormat,
    system_dir: Option<CString>,
    save_dir: Option<CString>,
    values: HashMap<&'static str, CString>,
}

impl EnvironmentNegotiator {
    pub fn new(profile: &'static ConsoleProfile, paths: HostPaths) -> Self {
        Self {
            profile,
            paths,
            // libretro default until the core asks for something else
            pixel_format: PixelFormat::Rgb1555,
            system_dir: None,
            save_dir: None,
            values: HashMap::new(),
        }
    }

    /// Format the core's frames are in
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Forget everything negotiated with the previous core.
    ///
    /// Only call once that core is shut down: the strings it was handed are freed.
    pub fn reset(&mut self) {
        self.pixel_format = PixelFormat::Rgb1555;
        self.system_dir = None;
        self.save_dir = None;
        self.values.clear();
    }

    /// Answer a raw call from the core.
    ///
    /// # Safety
    /// Same contract as [`EnvCommand::from_raw`].
    pub unsafe fn dispatch(&mut self, cmd: c_uint, data: *mut c_void) -> bool {
        self.handle(EnvCommand::from_raw(cmd, data))
    }

    /// Answer a decoded call. Returns whether the command was handled.
    pub fn handle(&mut self, command: EnvCommand<'_>) -> bool {
        match command {
            EnvCommand::GetCanDupe(out) => {
                *out = true;
                true
            }
            EnvCommand::GetSystemDirectory(out) => {
                if !self.profile.provides_system_dir {
                    return false;
                }
                let paths = &self.paths;
                match cached_dir(&mut self.system_dir, || paths.system_dir()) {
                    Some(ptr) => {
                        *out = ptr;
                        true
                    }
                    None => false,
                }
            }
            EnvCommand::GetSaveDirectory(out) => {
                let (paths, profile) = (&self.paths, self.profile);
                match cached_dir(&mut self.save_dir, || paths.save_dir(profile)) {
                    Some(ptr) => {
                        *out = ptr;
                        true
                    }
                    None => false,
                }
            }
            EnvCommand::SetPixelFormat(raw) => self.set_pixel_format(raw),
            EnvCommand::GetVariable(var) => self.get_variable(var),
            EnvCommand::Unhandled(cmd) => {
                debug!("Unhandled environment command {}", cmd);
                false
            }
        }
    }

    fn set_pixel_format(&mut self, raw: u32) -> bool {
        match PixelFormat::from_raw(raw) {
            Some(format) if self.profile.accepts_pixel_format(format) => {
                debug!("Pixel format set to {:?}", format);
                self.pixel_format = format;
                true
            }
            Some(format) => {
                debug!("Rejected pixel format {:?}", format);
                false
            }
            None => {
                warn!("Unknown pixel format {}", raw);
                false
            }
        }
    }

    fn get_variable(&mut self, var: &mut Variable) -> bool {
        if var.key.is_null() {
            return false;
        }
        // SAFETY: the core passes a NUL-terminated key valid for this call.
        let key = unsafe { CStr::from_ptr(var.key) };
        let profile = self.profile;
        let Some(&(name, value)) = key
            .to_str()
            .ok()
            .and_then(|k| profile.variables.iter().find(|(name, _)| *name == k))
        else {
            return false;
        };

        let Some(answer) = intern(&mut self.values, name, value) else {
            return false;
        };
        debug!("Variable {} = {}", name, value);
        var.value = answer;
        true
    }
}

fn intern(
    values: &mut HashMap<&'static str, CString>,
    name: &'static str,
    value: &str,
) -> Option<*const c_char> {
    if let Some(existing) = values.get(name) {
        return Some(existing.as_ptr());
    }
    let owned = CString::new(value).ok()?;
    Some(values.entry(name).or_insert(owned).as_ptr())
}

fn cached_dir<F>(slot: &mut Option<CString>, create: F) -> Option<*const c_char>
where
    F: FnOnce() -> std::io::Result<std::path::PathBuf>,
{
    if slot.is_none() {
        let dir = match create() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Failed to create directory for core: {}", e);
                return None;
            }
        };
        *slot = Some(path_to_cstring(&dir)?);
        debug!("Directory for core: {}", dir.display());
    }
    slot.as_ref().map(|s| s.as_ptr())
}

fn path_to_cstring(path: &Path) -> Option<CString> {
    CString::new(path.to_string_lossy().into_owned()).ok()
}
