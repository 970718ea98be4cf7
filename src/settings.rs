//! Side-panel settings for the orrery view.

use eframe::egui;

pub struct ViewSettings {
    pub show_orbits: bool,
    pub show_labels: bool,
    /// Exponent for the radial log compression of heliocentric distance.
    pub log_power: f64,
    /// Visual exaggeration of the Moon's geocentric offset. At 1.0 the
    /// Moon sits at its true position and disappears into the Earth sprite.
    pub moon_offset_scale: f64,
    pub dark_mode: bool,
    /// Keep the event feed scrolled to the timeline position.
    pub follow_feed: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            show_orbits: true,
            show_labels: true,
            log_power: 0.45,
            moon_offset_scale: 60.0,
            dark_mode: true,
            follow_feed: true,
        }
    }
}

impl ViewSettings {
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Display").strong());
        ui.checkbox(&mut self.show_orbits, "Orbit guides");
        ui.checkbox(&mut self.show_labels, "Labels");
        ui.checkbox(&mut self.dark_mode, "Dark mode");
        ui.horizontal(|ui| {
            ui.label("Scale:");
            ui.add(
                egui::Slider::new(&mut self.log_power, 0.15..=1.0)
                    .show_value(false),
            );
            let hint = if self.log_power > 0.95 { "linear" } else { "log" };
            ui.label(egui::RichText::new(hint).weak());
        });
        ui.horizontal(|ui| {
            ui.label("Moon offset:");
            ui.add(
                egui::DragValue::new(&mut self.moon_offset_scale)
                    .range(1.0..=200.0)
                    .speed(1.0)
                    .suffix("x"),
            );
        });

        ui.separator();
        ui.label(egui::RichText::new("Events").strong());
        ui.checkbox(&mut self.follow_feed, "Follow timeline");
    }
}
