//! Main application

use eframe::egui;
use rh_core::{Config, ConsoleProfile};
use rh_input::{InputSource, RetroPadButtons};
use rh_integration::{FrameView, PacerState, RetroHost};
use std::path::PathBuf;
use std::sync::Arc;

use crate::keymap::{self, SLOT_COUNT};
use crate::texture::{EguiTexture, RepaintView, SharedTexture};
use crate::themes::Theme;

/// Space reserved for the menu and status bars when sizing the window
const CHROME_HEIGHT: f32 = 56.0;

/// Main application state
pub struct RetroHostApp {
    config: Config,
    host: RetroHost,
    /// Texture the video sink uploads into
    texture: SharedTexture,
    /// Kept alive for as long as the host should repaint us
    _view: Arc<dyn FrameView>,
    content: PathBuf,
    theme: Theme,
    /// Quick-save slot used by the shortcuts
    slot: u32,
    show_touch_pad: bool,
    show_about: bool,
    /// Transient message in the status bar
    status: Option<String>,
    error_message: Option<String>,
    fps: f32,
    last_steps: u32,
    fast_forward_held: bool,
}

impl RetroHostApp {
    /// Create the application and load `content` into a fresh host
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: Config,
        profile: &'static ConsoleProfile,
        content: PathBuf,
    ) -> Self {
        let theme = Theme::default();
        theme.apply(&cc.egui_ctx);

        let texture = SharedTexture::default();
        let target = EguiTexture::new(cc.egui_ctx.clone(), texture.clone());
        let mut host = RetroHost::new(config.clone(), profile, Box::new(target));

        let view: Arc<dyn FrameView> = Arc::new(RepaintView::new(cc.egui_ctx.clone()));
        host.add_view(&view);

        let error_message = match host.try_load_game(&content) {
            Ok(()) => None,
            Err(e) => {
                tracing::error!("Failed to load {}: {}", content.display(), e);
                Some(format!("Failed to load {}:\n{}", content.display(), e))
            }
        };

        if let Some(av) = host.av_info() {
            let scale = config.video.window_scale.max(1) as f32;
            let size = egui::vec2(
                av.geometry.base_width as f32 * scale,
                av.geometry.base_height as f32 * scale + CHROME_HEIGHT,
            );
            cc.egui_ctx
                .send_viewport_cmd(egui::ViewportCommand::InnerSize(size));
        }

        Self {
            config,
            host,
            texture,
            _view: view,
            content,
            theme,
            slot: 1,
            show_touch_pad: false,
            show_about: false,
            status: None,
            error_message,
            fps: 0.0,
            last_steps: 0,
            fast_forward_held: false,
        }
    }

    fn toggle_pause(&mut self) {
        match self.host.state() {
            PacerState::Running => self.host.pause(),
            PacerState::Paused => self.host.resume(),
            _ => {}
        }
    }

    fn save_slot(&mut self) {
        self.status = Some(if self.host.save_state_to_slot(self.slot) {
            format!("Saved slot {}", self.slot)
        } else {
            format!("Save to slot {} failed", self.slot)
        });
    }

    fn load_slot(&mut self) {
        self.status = Some(if self.host.load_state_from_slot(self.slot) {
            format!("Loaded slot {}", self.slot)
        } else {
            format!("Slot {} could not be loaded", self.slot)
        });
    }

    fn reset(&mut self) {
        self.status = Some(if self.host.reset() {
            "Reset".to_string()
        } else {
            "Reset not supported by this core".to_string()
        });
    }

    /// Physical input plus host shortcuts
    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // Keys typed into a widget are not game input
        if ctx.wants_keyboard_input() {
            self.host
                .input()
                .set_mask(InputSource::Physical, RetroPadButtons::empty());
            return;
        }

        let (mask, pause, reset, save, next, load, fast) = ctx.input(|i| {
            (
                keymap::pad_from_keys(|k| i.key_down(k)),
                i.key_pressed(keymap::KEY_PAUSE),
                i.key_pressed(keymap::KEY_RESET),
                i.key_pressed(keymap::KEY_SAVE_SLOT),
                i.key_pressed(keymap::KEY_NEXT_SLOT),
                i.key_pressed(keymap::KEY_LOAD_SLOT),
                i.key_down(keymap::KEY_FAST_FORWARD),
            )
        });
        self.host.input().set_mask(InputSource::Physical, mask);

        if fast != self.fast_forward_held {
            self.fast_forward_held = fast;
            self.host.set_fast_forward(fast);
        }
        if pause {
            self.toggle_pause();
        }
        if reset {
            self.reset();
        }
        if next {
            self.slot = self.slot % SLOT_COUNT + 1;
            self.status = Some(format!("Slot {}", self.slot));
        }
        if save {
            self.save_slot();
        }
        if load {
            self.load_slot();
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        let state = self.host.state();
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Emulation", |ui| {
                    let loaded = self.host.content_path().is_some();
                    let label = if state == PacerState::Paused { "Resume" } else { "Pause" };
                    let can_toggle = matches!(state, PacerState::Running | PacerState::Paused);
                    if ui.add_enabled(can_toggle, egui::Button::new(label)).clicked() {
                        self.toggle_pause();
                        ui.close_menu();
                    }
                    if ui.add_enabled(loaded, egui::Button::new("Reset")).clicked() {
                        self.reset();
                        ui.close_menu();
                    }
                    let mut fast = self.host.is_fast_forward();
                    if ui.checkbox(&mut fast, "Fast Forward").changed() {
                        self.host.set_fast_forward(fast);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.add_enabled(loaded, egui::Button::new("Save State")).clicked() {
                        self.save_slot();
                        ui.close_menu();
                    }
                    if ui.add_enabled(loaded, egui::Button::new("Load State")).clicked() {
                        self.load_slot();
                        ui.close_menu();
                    }
                    ui.menu_button("Slot", |ui| {
                        let used = self.host.state_slots();
                        for slot in 1..=SLOT_COUNT {
                            let label = if used.contains(&slot) {
                                format!("{} *", slot)
                            } else {
                                slot.to_string()
                            };
                            if ui.selectable_label(self.slot == slot, label).clicked() {
                                self.slot = slot;
                                ui.close_menu();
                            }
                        }
                    });
                });

                ui.menu_button("View", |ui| {
                    if ui.checkbox(&mut self.show_touch_pad, "On-screen Pad").clicked() {
                        if !self.show_touch_pad {
                            self.host
                                .input()
                                .set_mask(InputSource::Touch, RetroPadButtons::empty());
                        }
                        ui.close_menu();
                    }
                    ui.checkbox(&mut self.config.video.glow, "Glow");
                    ui.separator();
                    ui.label("Theme:");
                    for theme in Theme::all() {
                        if ui.selectable_label(self.theme == *theme, theme.name()).clicked() {
                            self.theme = *theme;
                            self.theme.apply(ctx);
                            ui.close_menu();
                        }
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.show_about = true;
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        let state = self.host.state();
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let state_text = match state {
                    PacerState::Unloaded => "No game",
                    PacerState::Loaded => "Loaded",
                    PacerState::Running if self.host.is_fast_forward() => "Fast forward",
                    PacerState::Running => "Running",
                    PacerState::Paused => "Paused",
                    PacerState::Stopped => "Stopped",
                };
                ui.label(state_text);
                ui.separator();
                ui.label(self.host.profile().name);

                if let Some(path) = self.host.content_path() {
                    ui.separator();
                    ui.label(path.file_name().unwrap_or_default().to_string_lossy().into_owned());
                }

                ui.separator();
                ui.label(format!("UI {:.0} fps | {} steps", self.fps, self.last_steps));
                ui.separator();
                ui.label(format!("Slot {}", self.slot));

                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });
    }

    /// On-screen pad. Buttons count as held while the pointer is down on them.
    fn show_touch_pad(&self, ctx: &egui::Context) {
        let mut mask = RetroPadButtons::empty();
        egui::TopBottomPanel::bottom("touch_pad").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let mut pad_button = |ui: &mut egui::Ui, label: &str, button: RetroPadButtons| {
                    let response = ui.add(
                        egui::Button::new(label)
                            .min_size(egui::vec2(36.0, 36.0))
                            .sense(egui::Sense::click_and_drag()),
                    );
                    if response.is_pointer_button_down_on() {
                        mask |= button;
                    }
                };

                pad_button(ui, "◀", RetroPadButtons::LEFT);
                ui.vertical(|ui| {
                    pad_button(ui, "▲", RetroPadButtons::UP);
                    pad_button(ui, "▼", RetroPadButtons::DOWN);
                });
                pad_button(ui, "▶", RetroPadButtons::RIGHT);
                ui.separator();
                pad_button(ui, "Select", RetroPadButtons::SELECT);
                pad_button(ui, "Start", RetroPadButtons::START);
                ui.separator();
                pad_button(ui, "L", RetroPadButtons::L);
                pad_button(ui, "R", RetroPadButtons::R);
                ui.separator();
                pad_button(ui, "Y", RetroPadButtons::Y);
                pad_button(ui, "X", RetroPadButtons::X);
                pad_button(ui, "B", RetroPadButtons::B);
                pad_button(ui, "A", RetroPadButtons::A);
            });
        });
        self.host.input().set_mask(InputSource::Touch, mask);
    }

    fn show_screen(&self, ui: &mut egui::Ui) {
        let available = ui.available_rect_before_wrap();
        ui.painter()
            .rect_filled(available, 0.0, self.theme.screen_fill());

        let Some((texture, size)) = self.texture.get() else {
            let text = if self.error_message.is_some() {
                "No game loaded"
            } else {
                "Waiting for the first frame"
            };
            ui.painter().text(
                available.center(),
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(18.0),
                ui.visuals().weak_text_color(),
            );
            return;
        };

        let aspect = self
            .host
            .av_info()
            .map(|av| av.geometry.aspect_ratio)
            .filter(|a| *a > 0.0)
            .unwrap_or(size.x / size.y.max(1.0));
        let (width, height) = if available.width() / available.height() > aspect {
            (available.height() * aspect, available.height())
        } else {
            (available.width(), available.width() / aspect)
        };
        let rect = egui::Rect::from_center_size(available.center(), egui::vec2(width, height));
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        if self.config.video.glow {
            let glow = rect.expand2(rect.size() * 0.04);
            ui.painter()
                .image(texture, glow, uv, egui::Color32::from_white_alpha(48));
        }
        ui.painter().image(texture, rect, uv, egui::Color32::WHITE);
    }
}

impl eframe::App for RetroHostApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.fps = ctx.input(|i| 1.0 / i.stable_dt.max(0.001));

        self.handle_keyboard(ctx);
        self.last_steps = self.host.tick();

        self.show_menu_bar(ctx);
        self.show_status_bar(ctx);
        if self.show_touch_pad {
            self.show_touch_pad(ctx);
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.show_screen(ui));

        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.heading("retro-host");
                        ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                        ui.add_space(10.0);
                        ui.label("Arrows: D-pad | X/Z/S/A: A/B/X/Y | Q/W/E/R: L/R/L2/R2");
                        ui.label("Enter: Start | Backspace: Select");
                        ui.label("Space: pause | Tab: fast forward | F1: reset");
                        ui.label("F2: save | F3: next slot | F4: load");
                        ui.add_space(10.0);
                        ui.label("Licensed under GPL-3.0");
                    });
                });
        }

        let mut clear_error = false;
        if let Some(error) = &self.error_message {
            let mut show_error = true;
            egui::Window::new("Error")
                .open(&mut show_error)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.colored_label(egui::Color32::RED, "Error");
                    ui.separator();
                    ui.label(error.as_str());
                    ui.separator();
                    if ui.button("OK").clicked() {
                        clear_error = true;
                    }
                });
            if !show_error {
                clear_error = true;
            }
        }
        if clear_error {
            self.error_message = None;
        }

        // The pacer needs a tick every display refresh
        if self.host.is_running() {
            ctx.request_repaint();
        }
    }

    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        if let Err(e) = self.config.save() {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}

impl Drop for RetroHostApp {
    fn drop(&mut self) {
        tracing::info!("Closing {}", self.content.display());
        self.host.unload();
    }
}

/// Run the viewer on `content` until the window is closed
pub fn run(
    config: Config,
    profile: &'static ConsoleProfile,
    content: PathBuf,
) -> eframe::Result<()> {
    let scale = config.video.window_scale.max(1) as f32;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("retro-host - {}", profile.name))
            .with_inner_size([320.0 * scale, 240.0 * scale + CHROME_HEIGHT])
            .with_min_inner_size([320.0, 240.0]),
        ..Default::default()
    };
    eframe::run_native(
        "retro-host",
        options,
        Box::new(move |cc| Ok(Box::new(RetroHostApp::new(cc, config, profile, content)))),
    )
}
