use chrono::Local;
use eframe::egui;

use crate::common::{Message, MessageId};
use crate::conversation::{EditSession, HistoryState};

pub enum ChatAction {
    BeginEdit(Message),
    SaveEdit,
    CancelEdit,
    Delete(MessageId),
    /// A bot reply button was pressed; its label is sent as a message.
    PressButton(String),
    Retry,
}

pub fn render(ui: &mut egui::Ui, history: &HistoryState, edit: &mut EditSession) -> Option<ChatAction> {
    let mut action = None;

    match history {
        HistoryState::Idle => {}
        HistoryState::Loading => {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading chat history...");
            });
        }
        HistoryState::Failed { error } => {
            ui.colored_label(egui::Color32::LIGHT_RED, "Error while fetching chat history!");
            ui.label(egui::RichText::new(error.to_string()).weak());
            if ui.button("Retry").clicked() {
                action = Some(ChatAction::Retry);
            }
        }
        HistoryState::Ready {
            messages,
            fetched_at,
        } => {
            ui.small(format!(
                "Last synced {}",
                fetched_at.with_timezone(&Local).format("%H:%M:%S")
            ));
            if messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet. Say hello!").weak());
            }
            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .max_height(ui.available_height() - 40.0)
                .show(ui, |ui| {
                    for message in messages {
                        if let Some(chosen) = render_message(ui, message, edit) {
                            action = Some(chosen);
                        }
                    }
                });
        }
    }

    action
}

fn render_message(ui: &mut egui::Ui, message: &Message, edit: &mut EditSession) -> Option<ChatAction> {
    let mut action = None;

    ui.group(|ui| {
        ui.horizontal(|ui| {
            let author = if message.is_from_user { "You" } else { "Bot" };
            ui.label(egui::RichText::new(author).strong());
            if let Some(reply_to) = message.reply_to {
                ui.label(egui::RichText::new(format!("in reply to #{reply_to}")).weak());
            }
        });

        if edit.editing() == Some(message.id) {
            if let Some(draft) = edit.draft_mut() {
                ui.text_edit_multiline(draft);
            }
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    action = Some(ChatAction::SaveEdit);
                }
                if ui.button("Cancel").clicked() {
                    action = Some(ChatAction::CancelEdit);
                }
            });
        } else {
            ui.label(message.content.as_str());
            if message.is_from_user {
                ui.horizontal(|ui| {
                    if ui.small_button("Edit").clicked() {
                        action = Some(ChatAction::BeginEdit(message.clone()));
                    }
                    if ui.small_button("Delete").clicked() {
                        action = Some(ChatAction::Delete(message.id));
                    }
                });
            }
        }

        let buttons = message.buttons();
        if !buttons.is_empty() {
            ui.horizontal_wrapped(|ui| {
                for label in buttons {
                    if ui.button(label.as_str()).clicked() {
                        action = Some(ChatAction::PressButton(label.clone()));
                    }
                }
            });
        }
    });

    action
}
