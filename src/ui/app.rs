use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::common::{SyncCommand, SyncEvent};
use crate::routing::{Navigator, Route};
use crate::session::SessionStore;

use super::components::chat_area::{self, ChatAction};
use super::components::login_form::{self, FormAction};
use super::components::{banner, input_bar};
use super::state::AppState;

pub struct ChatApp {
    state: AppState,
    navigator: Navigator,
    session: SessionStore,
    command_sender: mpsc::Sender<SyncCommand>,
    event_receiver: mpsc::Receiver<SyncEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        session: SessionStore,
        command_sender: mpsc::Sender<SyncCommand>,
        event_receiver: mpsc::Receiver<SyncEvent>,
    ) -> Self {
        let navigator = Navigator::start(&session);
        let app = Self {
            state: AppState::new(),
            navigator,
            session,
            command_sender,
            event_receiver,
        };
        if app.navigator.current() == Route::Conversation {
            app.enter_conversation();
        }
        app
    }

    fn handle_sync_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                SyncEvent::Registered { username } => {
                    self.state.registered(username);
                    self.navigator.navigate(Route::Login, &self.session);
                }
                SyncEvent::RegisterFailed(err) | SyncEvent::LoginFailed(err) => {
                    self.state.form.failed(&err)
                }
                SyncEvent::LoggedIn { username } => {
                    self.state.form.clear();
                    self.state.username = Some(username);
                    if self.navigator.navigate(Route::Conversation, &self.session)
                        == Route::Conversation
                    {
                        self.enter_conversation();
                    }
                }
                SyncEvent::LoggedOut => {
                    self.state.end_session(None);
                    self.navigator.navigate(Route::Login, &self.session);
                }
                SyncEvent::Profile(profile) => self.state.username = Some(profile.username),
                SyncEvent::HistoryUpdated(history) => self.state.history = history,
                SyncEvent::MessageEdited { id } => self.state.edit.complete(id),
                SyncEvent::MutationFailed { action, error } => {
                    self.state.mutation_failed(action, &error)
                }
                SyncEvent::Unauthorized => {
                    self.state
                        .end_session(Some("Session expired, please log in again."));
                    self.navigator.force_login();
                }
            }
        }
    }

    fn enter_conversation(&self) {
        self.send_command(SyncCommand::FetchHistory);
        self.send_command(SyncCommand::LoadProfile);
    }

    fn send_command(&self, command: SyncCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to sync worker: {err}");
        }
    }

    fn apply_chat_action(&mut self, action: ChatAction) {
        match action {
            ChatAction::BeginEdit(message) => self.state.edit.begin(&message),
            ChatAction::SaveEdit => {
                if let Some((id, content)) = self.state.edit.commit() {
                    self.send_command(SyncCommand::EditMessage { id, content });
                }
            }
            ChatAction::CancelEdit => self.state.edit.cancel(),
            ChatAction::Delete(id) => self.send_command(SyncCommand::DeleteMessage(id)),
            ChatAction::PressButton(label) => self.send_command(SyncCommand::SendMessage(label)),
            ChatAction::Retry => self.send_command(SyncCommand::FetchHistory),
        }
    }

    fn render_auth(&mut self, ctx: &egui::Context, route: Route) {
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| login_form::render(ui, &mut self.state.form, route))
            .inner;

        match action {
            Some(FormAction::Submit(credentials)) => {
                let command = if route == Route::Register {
                    SyncCommand::Register(credentials)
                } else {
                    SyncCommand::Login(credentials)
                };
                self.send_command(command);
            }
            Some(FormAction::SwitchTo(target)) => {
                self.state.form.error = None;
                self.navigator.navigate(target, &self.session);
            }
            None => {}
        }
    }

    fn render_conversation(&mut self, ctx: &egui::Context) {
        let header = egui::TopBottomPanel::top("conversation_header")
            .show(ctx, |ui| {
                let mut command = None;
                ui.horizontal(|ui| {
                    ui.heading(AppState::title(Route::Conversation));
                    if let Some(username) = &self.state.username {
                        ui.label(egui::RichText::new(format!("as {username}")).weak());
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Log out").clicked() {
                            command = Some(SyncCommand::Logout);
                        }
                        if ui.button("Refresh").clicked() {
                            command = Some(SyncCommand::FetchHistory);
                        }
                    });
                });
                command
            })
            .inner;
        if let Some(command) = header {
            self.send_command(command);
        }

        let typed = egui::TopBottomPanel::bottom("input_panel")
            .show(ctx, |ui| input_bar::render(ui, &mut self.state.input_text))
            .inner;
        if let Some(content) = typed {
            self.send_command(SyncCommand::SendMessage(content));
        }

        let state = &mut self.state;
        let action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(text) = &state.banner {
                    if banner::render(ui, text) {
                        state.banner = None;
                    }
                    ui.separator();
                }
                chat_area::render(ui, &state.history, &mut state.edit)
            })
            .inner;
        if let Some(action) = action {
            self.apply_chat_action(action);
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_sync_events();
        if self.navigator.recheck(&self.session) {
            self.state
                .end_session(Some("Session expired, please log in again."));
        }

        match self.navigator.current() {
            Route::Conversation => self.render_conversation(ctx),
            route => self.render_auth(ctx, route),
        }

        // Sync events arrive off the UI thread; poll for them.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
