//! Top-down orrery view drawn with egui_plot.
//!
//! Heliocentric positions come straight from the loaded ephemeris, projected
//! onto the ecliptic plane and compressed radially so the inner planets stay
//! visible next to Neptune and Pluto.

use crate::celestial::Body;
use crate::ephemeris::{geocentric_offset, Ephemeris};
use crate::settings::ViewSettings;
use egui_plot::{Line, PlotImage, PlotPoint, Text};
use std::collections::HashMap;
use std::f64::consts::PI;

pub const SCALE_OFFSET: f64 = 1.0;
const KM_PER_AU: f64 = 149_597_870.7;

/// Radial log compression. A point at heliocentric distance `r` AU moves to
/// `(r + 1)^power - 1` while keeping its direction.
fn scale_position(x: f64, y: f64, power: f64) -> [f64; 2] {
    let r = (x * x + y * y).sqrt();
    if r < 1e-10 {
        return [0.0, 0.0];
    }
    let r_scaled = (r + SCALE_OFFSET).powf(power) - SCALE_OFFSET.powf(power);
    let s = r_scaled / r;
    [x * s, y * s]
}

fn scale_radius(r: f64, power: f64) -> f64 {
    (r + SCALE_OFFSET).powf(power) - SCALE_OFFSET.powf(power)
}

/// Inverse of `scale_radius`, for reporting real distances under the cursor.
fn unscale_radius(r_scaled: f64, power: f64) -> f64 {
    if r_scaled < 1e-10 {
        return 0.0;
    }
    let offset_p = SCALE_OFFSET.powf(power);
    (r_scaled + offset_p).powf(1.0 / power) - SCALE_OFFSET
}

fn circle_points(cx: f64, cy: f64, r: f64, n: usize) -> Vec<[f64; 2]> {
    (0..=n)
        .map(|i| {
            let a = 2.0 * PI * i as f64 / n as f64;
            [cx + r * a.cos(), cy + r * a.sin()]
        })
        .collect()
}

struct PlacedBody {
    body: Body,
    x: f64,
    y: f64,
    visual_radius: f64,
    heliocentric_au: f64,
    /// True distance to the parent, for satellites.
    parent_distance_au: Option<f64>,
}

/// The display position of `body` at `date`, in (unscaled) AU. Satellites
/// ride on their parent with the offset exaggerated so they clear the
/// parent's sprite.
fn display_position_au(
    ephemeris: &Ephemeris,
    body: Body,
    date: chrono::DateTime<chrono::Utc>,
    offset_scale: f64,
) -> Option<([f64; 3], Option<f64>)> {
    let pos = ephemeris.position_at(body, date)?;
    match body.parent() {
        Some(parent) => {
            let parent_pos = ephemeris.position_at(parent, date)?;
            let off = geocentric_offset(pos, parent_pos);
            let dist = (off[0] * off[0] + off[1] * off[1] + off[2] * off[2]).sqrt();
            let shown = [
                parent_pos[0] + off[0] * offset_scale,
                parent_pos[1] + off[1] * offset_scale,
                parent_pos[2] + off[2] * offset_scale,
            ];
            Some((shown, Some(dist)))
        }
        None => Some((pos, None)),
    }
}

pub fn draw_system_view(
    plot_ui: &mut egui_plot::PlotUi,
    ephemeris: &Ephemeris,
    date: chrono::DateTime<chrono::Utc>,
    sphere_handles: &HashMap<Body, eframe::egui::TextureHandle>,
    settings: &ViewSettings,
    selected: Option<Body>,
) -> Option<Body> {
    let log_power = settings.log_power;

    let label_color = if settings.dark_mode {
        eframe::egui::Color32::WHITE
    } else {
        eframe::egui::Color32::BLACK
    };

    let bounds = plot_ui.plot_bounds();
    let view_size = (bounds.max()[0] - bounds.min()[0])
        .max(bounds.max()[1] - bounds.min()[1]);
    let inflation = (1.0 - log_power).max(0.0);
    let min_radius = view_size * 0.004 * inflation;

    let mercury_scaled = scale_radius(0.387, log_power);
    let sun_visual_radius = 0.25 * mercury_scaled;
    let sun_size = Body::Sun.display_size();

    let mut bodies: Vec<PlacedBody> = Vec::new();
    for &body in &Body::ALL {
        let (pos, parent_distance_au) =
            match display_position_au(ephemeris, body, date, settings.moon_offset_scale) {
                Some(p) => p,
                None => continue,
            };

        let heliocentric_au = (pos[0] * pos[0] + pos[1] * pos[1]).sqrt();
        let scaled = scale_position(pos[0], pos[1], log_power);
        let size_ratio = (body.display_size() / sun_size) as f64;
        let visual_radius =
            (sun_visual_radius * size_ratio.powf(log_power)).max(min_radius);

        bodies.push(PlacedBody {
            body,
            x: scaled[0],
            y: scaled[1],
            visual_radius,
            heliocentric_au,
            parent_distance_au,
        });
    }

    if settings.show_orbits {
        // Circular guides at each planet's mean orbital radius. The samples
        // never stray far from these, so the guide reads as the orbit.
        for &body in &Body::ALL {
            let radius_au = match body.orbit_radius_au() {
                Some(r) => r,
                None => continue,
            };
            let pts = circle_points(0.0, 0.0, scale_radius(radius_au, log_power), 200);
            let orbit_color = if Some(body) == selected {
                body.display_color()
            } else {
                body.display_color().gamma_multiply(0.4)
            };
            let orbit_width = if Some(body) == selected { 2.0 } else { 1.0 };
            plot_ui.line(Line::new("", pts).color(orbit_color).width(orbit_width));
        }

        // Satellite guide around the parent, at the exaggerated offset
        // radius in scaled coordinates.
        for placed in &bodies {
            let parent = match placed.body.parent() {
                Some(p) => p,
                None => continue,
            };
            let parent_placed = match bodies.iter().find(|b| b.body == parent) {
                Some(p) => p,
                None => continue,
            };
            let orbit_r = ((placed.x - parent_placed.x).powi(2)
                + (placed.y - parent_placed.y).powi(2))
            .sqrt();
            if orbit_r > view_size * 0.005 {
                let pts = circle_points(parent_placed.x, parent_placed.y, orbit_r, 200);
                let color = if Some(placed.body) == selected {
                    placed.body.display_color()
                } else {
                    placed.body.display_color().gamma_multiply(0.4)
                };
                plot_ui.line(Line::new("", pts).color(color).width(1.0));
            }
        }
    }

    let base_label_size = (90.0 / view_size.max(0.01)).clamp(8.0, 16.0) as f32;

    for placed in &bodies {
        let (body, x, y, visual_radius) =
            (placed.body, placed.x, placed.y, placed.visual_radius);

        if let Some(handle) = sphere_handles.get(&body) {
            let img_size = (visual_radius * 2.0) as f32;
            plot_ui.image(PlotImage::new(
                "",
                handle.id(),
                PlotPoint::new(x, y),
                [img_size, img_size],
            ));
        } else {
            // Sprite still rendering; a plain marker keeps the body visible.
            plot_ui.points(
                egui_plot::Points::new("", vec![[x, y]])
                    .color(body.display_color())
                    .radius((visual_radius / view_size.max(1e-9) * 400.0) as f32),
            );
        }

        if settings.show_labels && (body.parent().is_none() || Some(body) == selected) {
            let name_color = if Some(body) == selected {
                body.display_color()
            } else {
                label_color
            };

            let dist_from_center = (x * x + y * y).sqrt();
            let edge_frac = (dist_from_center / (view_size * 0.45)).clamp(0.0, 1.0) as f32;
            let label_font_size = base_label_size + edge_frac * 4.0;

            let label_text = if body == Body::Sun {
                body.label().to_string()
            } else {
                format!("{} ({:.2} AU)", body.label(), placed.heliocentric_au)
            };

            plot_ui.text(
                Text::new(
                    "",
                    PlotPoint::new(x, y + visual_radius + view_size * 0.015),
                    eframe::egui::RichText::new(label_text).size(label_font_size),
                )
                .color(name_color),
            );
        }
    }

    if plot_ui.response().hovered() {
        if let Some(pointer) = plot_ui.pointer_coordinate() {
            let line_color = if settings.dark_mode {
                eframe::egui::Color32::from_rgba_unmultiplied(255, 255, 255, 40)
            } else {
                eframe::egui::Color32::from_rgba_unmultiplied(0, 0, 0, 40)
            };
            plot_ui.line(
                Line::new("", vec![[0.0, 0.0], [pointer.x, pointer.y]])
                    .color(line_color)
                    .width(1.0),
            );

            let sr = (pointer.x.powi(2) + pointer.y.powi(2)).sqrt();
            let real_au = unscale_radius(sr, log_power);
            let screen_pos = plot_ui.screen_from_plot(PlotPoint::new(pointer.x, pointer.y));
            let offset_screen =
                eframe::egui::Pos2::new(screen_pos.x + 12.0, screen_pos.y - 12.0);
            let offset_plot = plot_ui.plot_from_screen(offset_screen);
            plot_ui.text(
                Text::new(
                    "",
                    offset_plot,
                    eframe::egui::RichText::new(format!("{:.2} AU", real_au)).size(12.0),
                )
                .color(label_color)
                .anchor(eframe::egui::Align2::LEFT_BOTTOM),
            );

            if let Some(placed) = hit_test(&bodies, pointer.x, pointer.y, view_size) {
                let ring_pts =
                    circle_points(placed.x, placed.y, placed.visual_radius * 1.15, 64);
                plot_ui.line(
                    Line::new("", ring_pts)
                        .color(placed.body.display_color())
                        .width(2.0),
                );

                eframe::egui::Tooltip::always_open(
                    plot_ui.ctx().clone(),
                    eframe::egui::LayerId::background(),
                    eframe::egui::Id::new("orrery_tooltip"),
                    eframe::egui::PopupAnchor::Pointer,
                )
                .gap(12.0)
                .show(|ui| {
                    ui.set_min_width(180.0);
                    ui.label(
                        eframe::egui::RichText::new(placed.body.label())
                            .strong()
                            .size(16.0),
                    );
                    ui.separator();
                    eframe::egui::Grid::new("orrery_tooltip_grid")
                        .num_columns(2)
                        .spacing([12.0, 4.0])
                        .show(ui, |ui| {
                            if placed.body != Body::Sun {
                                ui.label("From Sun:");
                                ui.label(format!("{:.3} AU", placed.heliocentric_au));
                                ui.end_row();
                            }
                            if let (Some(parent), Some(dist)) =
                                (placed.body.parent(), placed.parent_distance_au)
                            {
                                ui.label(format!("From {}:", parent.label()));
                                ui.label(format!("{:.0} km", dist * KM_PER_AU));
                                ui.end_row();
                            }
                            if let Some(r) = placed.body.orbit_radius_au() {
                                ui.label("Mean orbit:");
                                ui.label(format!("{:.3} AU", r));
                                ui.end_row();
                            }
                        });
                });
            }
        }
    }

    if plot_ui.response().clicked() {
        if let Some(pointer) = plot_ui.pointer_coordinate() {
            if let Some(placed) = hit_test(&bodies, pointer.x, pointer.y, view_size) {
                return Some(placed.body);
            }
        }
    }

    None
}

fn hit_test<'a>(
    bodies: &'a [PlacedBody],
    px: f64,
    py: f64,
    view_size: f64,
) -> Option<&'a PlacedBody> {
    let mut best: Option<(&PlacedBody, f64)> = None;
    for placed in bodies {
        let dx = px - placed.x;
        let dy = py - placed.y;
        let dist = (dx * dx + dy * dy).sqrt();
        let hit = placed.visual_radius.max(view_size * 0.015) * 2.0;
        if dist <= hit {
            let dominated = best.map_or(false, |(_, bd)| bd < dist);
            if !dominated {
                best = Some((placed, dist));
            }
        }
    }
    best.map(|(placed, _)| placed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_preserves_direction_and_compresses_radius() {
        let p = scale_position(3.0, 4.0, 0.45);
        let r_in = 5.0;
        let r_out = (p[0] * p[0] + p[1] * p[1]).sqrt();
        assert!(r_out < r_in);
        assert!((p[0] / p[1] - 3.0 / 4.0).abs() < 1e-12);
    }

    #[test]
    fn unscale_inverts_scale() {
        for r in [0.1, 0.387, 1.0, 5.2, 39.48] {
            let scaled = scale_radius(r, 0.45);
            assert!((unscale_radius(scaled, 0.45) - r).abs() < 1e-9);
        }
    }

    #[test]
    fn unit_power_is_identity() {
        let p = scale_position(1.5, -2.0, 1.0);
        assert!((p[0] - 1.5).abs() < 1e-12);
        assert!((p[1] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn closer_orbits_gain_relative_room() {
        // Log compression should shrink the Neptune/Mercury ratio.
        let mercury = scale_radius(0.387, 0.45);
        let neptune = scale_radius(30.07, 0.45);
        assert!(neptune / mercury < 30.07 / 0.387);
    }
}
