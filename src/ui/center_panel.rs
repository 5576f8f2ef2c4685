use eframe::egui;

use crate::engine::protocol::EngineCommand;
use crate::model::ending::Ending;
use crate::model::scenario::Scenario;
use crate::model::session::{Session, MAX_TURNS};

use super::app::MindMazeApp;
use super::hud;

/// HUD header plus the scenario or ending content.
pub fn draw(ctx: &egui::Context, app: &mut MindMazeApp) {
    let busy = app.busy();
    let mut open_menu = false;

    egui::TopBottomPanel::top("hud").show(ctx, |ui| {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.heading("MINDMAZE");
            ui.separator();

            if let Some(session) = &app.session {
                hud::draw_hud(ui, session);

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Menu").clicked() {
                        open_menu = true;
                    }
                    if !session.is_game_over {
                        ui.monospace(format!("Turn {:02}/{}", session.turn, MAX_TURNS));
                    }
                });
            }
        });
        ui.add_space(4.0);
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            let mut restart = false;
            let mut picked = None;

            if let (Some(session), Some(ending)) = (&app.session, &app.ending) {
                restart = draw_ending(ui, session, ending);
            } else if let Some(scenario) = &app.scenario {
                picked = draw_scenario(ui, scenario, busy);
            }

            if let Some(notice) = app.notice.clone() {
                ui.add_space(8.0);
                ui.colored_label(hud::NOTICE_COLOR, notice);
            }

            if restart {
                app.submit(EngineCommand::NewGame);
            }
            if let Some(text) = picked {
                app.submit(EngineCommand::Choose(text));
            }
        });
    });

    if open_menu {
        app.show_menu = true;
    }
}

/// Environment tag, narrative, and the choice list. Returns the text
/// of the choice the player picked, if any.
fn draw_scenario(ui: &mut egui::Ui, scenario: &Scenario, busy: bool) -> Option<String> {
    let mut picked = None;

    ui.add_space(8.0);
    ui.vertical_centered(|ui| {
        let tag = if busy {
            "PROCESSING...".to_string()
        } else {
            scenario.environment.to_uppercase()
        };
        ui.monospace(tag);
    });
    ui.add_space(12.0);

    if busy {
        ui.label(egui::RichText::new("Generated reality loading...").italics());
    } else {
        ui.label(egui::RichText::new(&scenario.narrative).size(16.0));
    }
    ui.add_space(16.0);

    ui.add_enabled_ui(!busy, |ui| {
        for (idx, choice) in scenario.choices.iter().enumerate() {
            let label = format!("OPTION {:02}   {}", idx + 1, choice.text);
            if ui
                .add_sized([ui.available_width(), 36.0], egui::Button::new(label))
                .clicked()
            {
                picked = Some(choice.text.clone());
            }
            ui.add_space(6.0);
        }
    });

    picked
}

/// Ending screen with final stats. Returns true when the player asks
/// for a new run.
fn draw_ending(ui: &mut egui::Ui, session: &Session, ending: &Ending) -> bool {
    let mut restart = false;

    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        ui.label(egui::RichText::new(&ending.title).size(32.0).strong());
        ui.add_space(12.0);
        ui.label(egui::RichText::new(&ending.description).size(16.0));
        ui.add_space(24.0);

        ui.horizontal(|ui| {
            final_stat(ui, "SANITY", session.stats.sanity, hud::SANITY_COLOR);
            final_stat(ui, "HOPE", session.stats.hope, hud::HOPE_COLOR);
            final_stat(ui, "FEAR", session.stats.fear, hud::FEAR_COLOR);
        });
        ui.add_space(24.0);

        if ui.button("Initialize New Subject").clicked() {
            restart = true;
        }
    });

    restart
}

fn final_stat(ui: &mut egui::Ui, label: &str, value: i32, color: egui::Color32) {
    ui.vertical(|ui| {
        ui.small(label);
        ui.label(egui::RichText::new(format!("{value}")).size(22.0).color(color));
    });
}
