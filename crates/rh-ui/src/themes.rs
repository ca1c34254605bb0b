//! UI themes

use eframe::egui;

/// Available themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    #[default]
    Dark,
    /// Dark panels around a black screen, for play
    Arcade,
}

impl Theme {
    /// Apply the theme to the egui context
    pub fn apply(&self, ctx: &egui::Context) {
        let visuals = match self {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
            Theme::Arcade => {
                let mut visuals = egui::Visuals::dark();
                visuals.panel_fill = egui::Color32::from_gray(12);
                visuals.window_fill = egui::Color32::from_gray(18);
                visuals.extreme_bg_color = egui::Color32::BLACK;
                visuals.selection.bg_fill = egui::Color32::from_rgb(180, 40, 60);
                visuals
            }
        };
        ctx.set_visuals(visuals);
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::Arcade => "Arcade",
        }
    }

    pub fn all() -> &'static [Theme] {
        &[Theme::Light, Theme::Dark, Theme::Arcade]
    }

    /// Backdrop painted behind the game picture
    pub fn screen_fill(&self) -> egui::Color32 {
        match self {
            Theme::Light => egui::Color32::from_gray(30),
            Theme::Dark => egui::Color32::from_gray(20),
            Theme::Arcade => egui::Color32::BLACK,
        }
    }
}
