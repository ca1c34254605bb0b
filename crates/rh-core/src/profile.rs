//! Console profiles
//!
//! A profile names the core binary for one console family and the host-side
//! answers that differ between them: directory names, SRAM extensions, the
//! pixel formats the renderer accepts and the tuned core options.

use rh_ffi::PixelFormat;

/// Per-console host settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsoleProfile {
    /// Short id used on the command line and in config
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Framework bundle name, looked up as `<fw>.framework/<fw>`
    pub framework: &'static str,
    /// Loose library base names, tried in order
    pub library_names: &'static [&'static str],
    /// Subdirectory under `saves/`
    pub save_dir: &'static str,
    /// Whether the core is told where the BIOS/system directory is
    pub provides_system_dir: bool,
    /// Extension used when writing SRAM
    pub sram_write_ext: &'static str,
    /// Extensions tried, in order, when reading SRAM
    pub sram_read_exts: &'static [&'static str],
    /// Pixel formats the core may select
    pub pixel_formats: &'static [PixelFormat],
    /// Fixed answers to `GET_VARIABLE`
    pub variables: &'static [(&'static str, &'static str)],
}

impl ConsoleProfile {
    /// Look up a profile by id (case-insensitive)
    pub fn by_id(id: &str) -> Option<&'static ConsoleProfile> {
        ALL.iter().copied().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    /// Every known profile
    pub fn all() -> &'static [&'static ConsoleProfile] {
        ALL
    }

    /// Fixed value for a core option, if this profile answers it
    pub fn variable(&self, key: &str) -> Option<&'static str> {
        self.variables
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn accepts_pixel_format(&self, format: PixelFormat) -> bool {
        self.pixel_formats.contains(&format)
    }
}

static ALL: &[&ConsoleProfile] = &[&PSX, &SNES, &GBA, &GENESIS, &NDS];

pub static PSX: ConsoleProfile = ConsoleProfile {
    id: "psx",
    name: "PlayStation",
    framework: "pcsx_rearmed",
    library_names: &["pcsx_rearmed_libretro_ios", "pcsx_rearmed_libretro", "pcsx_rearmed"],
    save_dir: "psx",
    provides_system_dir: true,
    sram_write_ext: "srm",
    sram_read_exts: &["srm"],
    pixel_formats: &[PixelFormat::Rgb565],
    variables: &[
        ("pcsx_rearmed_spu_interpolation", "simple"),
        ("pcsx_rearmed_dithering", "disabled"),
        ("pcsx_rearmed_show_bios_bootlogo", "enabled"),
        ("pcsx_rearmed_frameskip", "auto"),
        ("pcsx_rearmed_neon_interlace_enable", "disabled"),
        ("pcsx_rearmed_vibration", "disabled"),
    ],
};

pub static SNES: ConsoleProfile = ConsoleProfile {
    id: "snes",
    name: "Super Nintendo",
    framework: "Snes9x",
    library_names: &["snes9x_libretro_ios", "snes9x_libretro", "snes9x"],
    save_dir: "snes",
    provides_system_dir: false,
    sram_write_ext: "sav",
    sram_read_exts: &["sav", "srm"],
    pixel_formats: &[PixelFormat::Rgb565],
    variables: &[],
};

pub static GBA: ConsoleProfile = ConsoleProfile {
    id: "gba",
    name: "Game Boy Advance",
    framework: "mgba",
    library_names: &["mgba_libretro_ios", "mgba_libretro", "mgba"],
    save_dir: "gba",
    provides_system_dir: false,
    sram_write_ext: "sav",
    sram_read_exts: &["sav", "srm"],
    pixel_formats: &[PixelFormat::Rgb565],
    variables: &[],
};

pub static GENESIS: ConsoleProfile = ConsoleProfile {
    id: "genesis",
    name: "Mega Drive / Genesis",
    framework: "PicoDrive",
    library_names: &["picodrive_libretro_ios", "picodrive_libretro", "picodrive"],
    save_dir: "picodrive",
    provides_system_dir: false,
    sram_write_ext: "srm",
    sram_read_exts: &["srm"],
    pixel_formats: &[PixelFormat::Rgb565],
    variables: &[],
};

pub static NDS: ConsoleProfile = ConsoleProfile {
    id: "nds",
    name: "Nintendo DS",
    framework: "melonds",
    library_names: &["melonds_libretro_ios", "melonds_libretro", "melonds"],
    save_dir: "ds",
    provides_system_dir: true,
    sram_write_ext: "srm",
    sram_read_exts: &["srm"],
    pixel_formats: &[PixelFormat::Rgb565, PixelFormat::Xrgb8888],
    variables: &[
        ("melonds_console_mode", "DS"),
        ("melonds_boot_directly", "enabled"),
    ],
};
