use std::sync::mpsc::Receiver;
use std::time::Duration;

use eframe::egui;

use crate::engine::engine::{Engine, EngineError, EngineHandle};
use crate::engine::llm_client::{self, LmStudioClient};
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::ending::Ending;
use crate::model::scenario::Scenario;
use crate::model::session::Session;
use crate::store::{FileStore, SessionStore};
use crate::ui::settings::UiSettings;
use crate::ui::{center_panel, hud, settings_io};

pub struct MindMazeApp {
    pub(crate) settings: UiSettings,
    pub(crate) started: bool,
    pub(crate) show_menu: bool,
    pub(crate) has_save: bool,
    pub(crate) notice: Option<String>,
    pub(crate) connection_status: Option<String>,
    pub(crate) session: Option<Session>,
    pub(crate) scenario: Option<Scenario>,
    pub(crate) ending: Option<Ending>,

    handle: EngineHandle,
    resp_rx: Receiver<EngineResponse>,
}

impl MindMazeApp {
    pub fn new() -> Self {
        let settings = settings_io::load_settings();
        let store = FileStore::at_default_location();
        let has_save = store.exists();

        let gateway = LmStudioClient::new(settings.generator.clone());
        let (handle, resp_rx) = Engine::spawn(Box::new(gateway), Box::new(store));

        Self {
            settings,
            started: false,
            show_menu: false,
            has_save,
            notice: None,
            connection_status: None,
            session: None,
            scenario: None,
            ending: None,
            handle,
            resp_rx,
        }
    }

    pub(crate) fn busy(&self) -> bool {
        self.handle.is_busy()
    }

    /// Hand a command to the engine thread. A rejection because a
    /// request is already in flight is dropped silently; the widgets
    /// are disabled while busy anyway.
    pub(crate) fn submit(&mut self, cmd: EngineCommand) {
        match self.handle.submit(cmd) {
            Ok(()) => self.notice = None,
            Err(EngineError::Busy) => {}
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    fn drain_responses(&mut self) {
        while let Ok(resp) = self.resp_rx.try_recv() {
            match resp {
                EngineResponse::SessionStarted { session, scenario }
                | EngineResponse::SessionRestored { session, scenario } => {
                    self.session = Some(session);
                    self.scenario = Some(scenario);
                    self.ending = None;
                    self.started = true;
                    self.show_menu = false;
                }
                EngineResponse::TurnResolved { session, scenario } => {
                    self.session = Some(session);
                    self.scenario = Some(scenario);
                    self.has_save = true;
                }
                EngineResponse::SessionEnded { session, ending } => {
                    self.session = Some(session);
                    self.ending = Some(ending);
                    self.started = true;
                    self.show_menu = false;
                    self.has_save = true;
                }
                EngineResponse::NoSavedSession => {
                    self.has_save = false;
                    self.notice = Some("No saved session to resume.".to_string());
                }
                EngineResponse::SaveCleared => {
                    self.has_save = false;
                    self.started = false;
                    self.show_menu = false;
                    self.session = None;
                    self.scenario = None;
                    self.ending = None;
                }
                EngineResponse::Failed { message } => {
                    self.notice = Some(message);
                }
            }
        }
    }

    fn draw_title_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.label(egui::RichText::new("MINDMAZE").size(48.0).strong());
                ui.label(
                    egui::RichText::new("ARTIFICIAL INTELLIGENCE NARRATIVE")
                        .monospace()
                        .weak(),
                );
                ui.add_space(32.0);

                let busy = self.busy();
                let mut begin = false;
                let mut resume = false;

                let begin_label = if busy { "Initializing..." } else { "Initiate Sequence" };
                if ui
                    .add_enabled(
                        !busy,
                        egui::Button::new(begin_label).min_size(egui::vec2(220.0, 36.0)),
                    )
                    .clicked()
                {
                    begin = true;
                }

                if self.has_save {
                    ui.add_space(8.0);
                    if ui
                        .add_enabled(
                            !busy,
                            egui::Button::new("Resume Session").min_size(egui::vec2(220.0, 36.0)),
                        )
                        .clicked()
                    {
                        resume = true;
                    }
                }

                if let Some(notice) = self.notice.clone() {
                    ui.add_space(12.0);
                    ui.colored_label(hud::NOTICE_COLOR, notice);
                }

                ui.add_space(24.0);
                self.draw_settings(ui);

                if begin {
                    self.submit(EngineCommand::NewGame);
                }
                if resume {
                    self.submit(EngineCommand::ResumeGame);
                }
            });
        });
    }

    fn draw_settings(&mut self, ui: &mut egui::Ui) {
        ui.collapsing("Settings", |ui| {
            let mut changed = false;

            ui.horizontal(|ui| {
                ui.label("Endpoint");
                changed |= ui
                    .text_edit_singleline(&mut self.settings.generator.base_url)
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Model");
                changed |= ui
                    .text_edit_singleline(&mut self.settings.generator.model)
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Temperature");
                changed |= ui
                    .add(egui::Slider::new(
                        &mut self.settings.generator.temperature,
                        0.0..=2.0,
                    ))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("UI Scale");
                changed |= ui
                    .add(egui::Slider::new(&mut self.settings.ui_scale, 0.75..=2.0))
                    .changed();
            });
            ui.small("Generator changes take effect on the next launch");

            if ui.button("Test Connection").clicked() {
                self.connection_status =
                    Some(match llm_client::test_connection(&self.settings.generator) {
                        Ok(msg) => msg,
                        Err(err) => format!("Connection failed: {err:#}"),
                    });
            }
            if let Some(status) = &self.connection_status {
                ui.small(status.clone());
            }

            if changed {
                settings_io::save_settings(&self.settings);
            }
        });
    }

    fn draw_menu(&mut self, ctx: &egui::Context) {
        let mut close = false;
        let mut restart = false;
        let mut clear = false;

        egui::Window::new("System Menu")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.vertical_centered_justified(|ui| {
                    if ui.button("Resume").clicked() {
                        close = true;
                    }
                    if ui.button("Restart Simulation").clicked() {
                        restart = true;
                    }
                    if ui.button("Clear Data").clicked() {
                        clear = true;
                    }
                });
            });

        if close {
            self.show_menu = false;
        }
        if restart {
            self.submit(EngineCommand::NewGame);
        }
        if clear {
            self.submit(EngineCommand::ClearSave);
        }
    }
}

impl eframe::App for MindMazeApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.settings.ui_scale);
        self.drain_responses();

        // Keep repainting while a generator call is in flight so the
        // response is picked up promptly.
        if self.busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        if !self.started {
            self.draw_title_screen(ctx);
            return;
        }

        if self.show_menu {
            self.draw_menu(ctx);
        }

        center_panel::draw(ctx, self);
    }
}
