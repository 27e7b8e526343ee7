use eframe::egui;

/// Returns the message to send. The input is cleared right away, before the
/// send resolves; whitespace-only input is left untouched and sends nothing.
pub fn render(ui: &mut egui::Ui, input_text: &mut String) -> Option<String> {
    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(input_text)
                .hint_text("Type a message...")
                .desired_width(ui.available_width() - 60.0),
        );
        if ui.button("Send").clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    if send { take_submission(input_text) } else { None }
}

/// Takes the typed text for sending and clears the input. Blank input stays
/// as it is.
pub fn take_submission(input_text: &mut String) -> Option<String> {
    if input_text.trim().is_empty() {
        return None;
    }
    Some(std::mem::take(input_text))
}
