use eframe::egui;

/// Dismissible error strip. Returns true when the user closed it.
pub fn render(ui: &mut egui::Ui, text: &str) -> bool {
    let mut dismissed = false;
    egui::Frame::group(ui.style())
        .fill(egui::Color32::from_rgb(90, 30, 30))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::WHITE, text);
                if ui.small_button("x").clicked() {
                    dismissed = true;
                }
            });
        });
    dismissed
}
