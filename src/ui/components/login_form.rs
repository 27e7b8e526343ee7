use eframe::egui;

use crate::common::Credentials;
use crate::routing::Route;
use crate::ui::state::LoginForm;

pub enum FormAction {
    Submit(Credentials),
    SwitchTo(Route),
}

pub fn render(ui: &mut egui::Ui, form: &mut LoginForm, route: Route) -> Option<FormAction> {
    let mut action = None;
    let registering = route == Route::Register;

    ui.vertical_centered(|ui| {
        ui.heading(if registering { "Create account" } else { "Log in" });
        ui.add_space(12.0);

        ui.add(egui::TextEdit::singleline(&mut form.username).hint_text("Username"));
        let password = ui.add(
            egui::TextEdit::singleline(&mut form.password)
                .password(true)
                .hint_text("Password"),
        );
        let entered = password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        ui.add_space(8.0);
        let label = if registering { "Register" } else { "Log in" };
        let clicked = ui
            .add_enabled(!form.pending, egui::Button::new(label))
            .clicked();
        if (clicked || entered) && !form.pending {
            action = form.submit().map(FormAction::Submit);
        }
        if form.pending {
            ui.spinner();
        }

        if let Some(error) = &form.error {
            ui.colored_label(egui::Color32::LIGHT_RED, error.as_str());
        }
        if let Some(notice) = &form.notice {
            ui.colored_label(egui::Color32::LIGHT_GREEN, notice.as_str());
        }

        ui.add_space(8.0);
        let (prompt, target) = if registering {
            ("Already have an account? Log in", Route::Login)
        } else {
            ("No account yet? Register", Route::Register)
        };
        if ui.link(prompt).clicked() {
            action = Some(FormAction::SwitchTo(target));
        }
    });

    action
}
