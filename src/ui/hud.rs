use eframe::egui;

use crate::model::session::Session;
use crate::model::stats::MAX_STAT;

pub const SANITY_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 212, 255);
pub const HOPE_COLOR: egui::Color32 = egui::Color32::from_rgb(234, 179, 8);
pub const FEAR_COLOR: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);
pub const NOTICE_COLOR: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);

/// The three stat bars.
pub fn draw_hud(ui: &mut egui::Ui, session: &Session) {
    stat_bar(ui, "Sanity", session.stats.sanity, SANITY_COLOR);
    stat_bar(ui, "Hope", session.stats.hope, HOPE_COLOR);
    stat_bar(ui, "Fear", session.stats.fear, FEAR_COLOR);
}

fn stat_bar(ui: &mut egui::Ui, label: &str, value: i32, color: egui::Color32) {
    ui.vertical(|ui| {
        ui.small(label);
        ui.add(
            egui::ProgressBar::new(value as f32 / MAX_STAT as f32)
                .desired_width(110.0)
                .fill(color)
                .text(format!("{value}")),
        );
    });
}
