//! Application shell and eframe integration.
//!
//! Owns the load states for the three JSON documents and the body sprites,
//! polls the background loads each frame, and lays out the timeline bar,
//! the event feed, and the orrery plot.

use crate::celestial::Body;
use crate::data::{DocKind, EphemerisState, FeedState};
use crate::ephemeris::Ephemeris;
use crate::events::{index_after, merge_feeds, Event};
use crate::settings::ViewSettings;
use crate::solar_system::draw_system_view;
use crate::texture::{fallback_sphere, BodyTexture};
use crate::timeline::Timeline;
use eframe::egui;
use nalgebra::Matrix3;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use std::sync::mpsc;

const SPRITE_SIZE: usize = 64;
/// Sim days per full sprite revolution while playing.
const SPIN_PERIOD_DAYS: f64 = 30.0;

pub(crate) struct App {
    ephemeris: EphemerisState,
    general_feed: FeedState,
    moon_feed: FeedState,
    /// Both feeds merged chronologically, once neither is still loading.
    events: Option<Vec<Event>>,
    timeline: Option<Timeline>,
    settings: ViewSettings,
    selected: Option<Body>,

    textures: HashMap<Body, Arc<BodyTexture>>,
    sprite_handles: HashMap<Body, egui::TextureHandle>,
    /// Bodies whose texture failed and use the flat-color sprite.
    texture_fallbacks: Vec<Body>,
    last_sprite_render: Option<f64>,

    source_desc: String,

    #[cfg(not(target_arch = "wasm32"))]
    doc_rx: mpsc::Receiver<(DocKind, Result<String, String>)>,
    #[cfg(not(target_arch = "wasm32"))]
    tex_rx: mpsc::Receiver<(Body, Result<BodyTexture, String>)>,
}

impl App {
    #[cfg(not(target_arch = "wasm32"))]
    pub(crate) fn new(
        _cc: &eframe::CreationContext<'_>,
        source: crate::data::DataSource,
    ) -> Self {
        let (doc_tx, doc_rx) = mpsc::channel();
        let (tex_tx, tex_rx) = mpsc::channel();
        let source_desc = source.describe();
        crate::data::spawn_document_loader(source, doc_tx);
        crate::data::spawn_texture_loader(tex_tx);

        Self {
            ephemeris: EphemerisState::Loading,
            general_feed: FeedState::Loading,
            moon_feed: FeedState::Loading,
            events: None,
            timeline: None,
            settings: ViewSettings::default(),
            selected: None,
            textures: HashMap::new(),
            sprite_handles: HashMap::new(),
            texture_fallbacks: Vec::new(),
            last_sprite_render: None,
            source_desc,
            doc_rx,
            tex_rx,
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub(crate) fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        crate::data::start_fetches();

        Self {
            ephemeris: EphemerisState::Loading,
            general_feed: FeedState::Loading,
            moon_feed: FeedState::Loading,
            events: None,
            timeline: None,
            settings: ViewSettings::default(),
            selected: None,
            textures: HashMap::new(),
            sprite_handles: HashMap::new(),
            texture_fallbacks: Vec::new(),
            last_sprite_render: None,
            source_desc: "page origin".to_string(),
        }
    }

    fn apply_document(&mut self, kind: DocKind, result: Result<String, String>) {
        match kind {
            DocKind::Positions => {
                self.ephemeris = match result.and_then(|text| Ephemeris::from_json(&text)) {
                    Ok(eph) => {
                        log::info!(
                            "Loaded {} position samples, {} to {}",
                            eph.sample_count(),
                            eph.start,
                            eph.end
                        );
                        self.timeline = Some(Timeline::new(eph.start, eph.end));
                        EphemerisState::Loaded(eph)
                    }
                    Err(e) => {
                        log::error!("Position document failed: {}", e);
                        EphemerisState::Failed(e)
                    }
                };
            }
            DocKind::Events | DocKind::MoonEvents => {
                let state = match result.and_then(|text| crate::events::parse_feed(&text)) {
                    Ok(events) => FeedState::Loaded(events),
                    Err(e) => {
                        log::warn!("{} failed: {}", kind.filename(), e);
                        FeedState::Failed(e)
                    }
                };
                match kind {
                    DocKind::Events => self.general_feed = state,
                    _ => self.moon_feed = state,
                }
                self.merge_when_ready();
            }
        }
    }

    /// Once neither feed is still loading, merge what arrived. A failed feed
    /// contributes nothing; its error stays visible in the side panel.
    fn merge_when_ready(&mut self) {
        if matches!(self.general_feed, FeedState::Loading)
            || matches!(self.moon_feed, FeedState::Loading)
        {
            return;
        }
        let general = match &self.general_feed {
            FeedState::Loaded(events) => events.clone(),
            _ => Vec::new(),
        };
        let moon = match &self.moon_feed {
            FeedState::Loaded(events) => events.clone(),
            _ => Vec::new(),
        };
        self.events = Some(merge_feeds(general, moon));
    }

    fn poll_loads(&mut self, ctx: &egui::Context) {
        #[cfg(not(target_arch = "wasm32"))]
        {
            while let Ok((kind, result)) = self.doc_rx.try_recv() {
                self.apply_document(kind, result);
            }
            while let Ok((body, result)) = self.tex_rx.try_recv() {
                self.apply_texture(body, result, ctx);
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let docs: Vec<_> = crate::data::DOC_FETCH_RESULT
                .with(|cell| cell.borrow_mut().drain(..).collect());
            for (kind, result) in docs {
                self.apply_document(kind, result);
            }
            let texs: Vec<_> = crate::data::TEXTURE_FETCH_RESULT
                .with(|cell| cell.borrow_mut().drain(..).collect());
            for (body, result) in texs {
                self.apply_texture(body, result, ctx);
            }
        }
    }

    fn apply_texture(
        &mut self,
        body: Body,
        result: Result<BodyTexture, String>,
        ctx: &egui::Context,
    ) {
        match result {
            Ok(texture) => {
                self.textures.insert(body, Arc::new(texture));
                self.sprite_handles.remove(&body);
            }
            Err(e) => {
                log::warn!("Texture for {} unavailable, using flat sphere: {}", body.label(), e);
                if !self.texture_fallbacks.contains(&body) {
                    self.texture_fallbacks.push(body);
                }
                let image = fallback_sphere(body.display_color(), SPRITE_SIZE);
                let handle = ctx.load_texture(
                    format!("sprite_{}", body.data_key()),
                    image,
                    egui::TextureOptions::LINEAR,
                );
                self.sprite_handles.insert(body, handle);
            }
        }
    }

    /// Render textured sprites, spinning them slowly with sim time. Missing
    /// handles render immediately; the rest refresh at most twice a second
    /// while playing.
    fn render_sprites(&mut self, ctx: &egui::Context) {
        let playing = self.timeline.as_ref().is_some_and(|t| t.playing);
        let now = ctx.input(|i| i.time);
        let missing = self
            .textures
            .keys()
            .any(|body| !self.sprite_handles.contains_key(body));
        let stale = playing
            && self.last_sprite_render.map_or(true, |t| now - t > 0.5);
        if !missing && !stale {
            return;
        }
        self.last_sprite_render = Some(now);

        let spin = self
            .timeline
            .as_ref()
            .map(|t| {
                let days = (t.current_date() - t.date_at(0.0)).num_seconds() as f64 / 86400.0;
                days / SPIN_PERIOD_DAYS * std::f64::consts::TAU
            })
            .unwrap_or(0.0);
        let (cos_a, sin_a) = (spin.cos(), spin.sin());
        let rot = Matrix3::new(
            cos_a, 0.0, sin_a,
            0.0, 1.0, 0.0,
            -sin_a, 0.0, cos_a,
        );

        for (&body, texture) in &self.textures {
            if !stale && self.sprite_handles.contains_key(&body) {
                continue;
            }
            let image = texture.render_sphere(SPRITE_SIZE, &rot);
            let handle = ctx.load_texture(
                format!("sprite_{}", body.data_key()),
                image,
                egui::TextureOptions::LINEAR,
            );
            self.sprite_handles.insert(body, handle);
        }
    }

    fn show_timeline_bar(&mut self, ui: &mut egui::Ui) {
        let timeline = match self.timeline.as_mut() {
            Some(t) => t,
            None => {
                ui.horizontal(|ui| {
                    ui.heading("Orrery");
                    ui.spinner();
                    ui.label(format!("Loading {}", self.source_desc));
                });
                return;
            }
        };

        ui.horizontal(|ui| {
            ui.heading("Orrery");
            ui.separator();

            let pause_label = if timeline.playing { "\u{23f8}" } else { "\u{25b6}" };
            if ui.button(pause_label).clicked() {
                if !timeline.playing && timeline.fraction >= 1.0 {
                    timeline.fraction = 0.0;
                }
                timeline.playing = !timeline.playing;
            }
            ui.label("Speed:");
            ui.add(
                egui::DragValue::new(&mut timeline.speed_days_per_sec)
                    .range(0.1..=100.0)
                    .speed(0.1)
                    .suffix(" d/s"),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    egui::RichText::new(
                        timeline.current_date().format("%Y-%m-%d %H:%M UTC").to_string(),
                    )
                    .strong()
                    .monospace(),
                );
            });
        });

        ui.spacing_mut().slider_width = ui.available_width() - 16.0;
        ui.add(
            egui::Slider::new(&mut timeline.fraction, 0.0..=1.0)
                .show_value(false),
        );
    }

    fn show_event_feed(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Event feed").strong());

        for (state, name) in [
            (&self.general_feed, "events"),
            (&self.moon_feed, "moon events"),
        ] {
            if let FeedState::Failed(e) = state {
                ui.colored_label(egui::Color32::RED, format!("{}: {}", name, e));
            }
        }

        let events = match &self.events {
            Some(events) if !events.is_empty() => events,
            Some(_) => {
                ui.label(egui::RichText::new("No events").weak());
                return;
            }
            None => {
                ui.spinner();
                return;
            }
        };

        let current = self.timeline.as_ref().map(|t| t.current_date());
        let pinned = current.map(|t| index_after(events, t).saturating_sub(1));

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for (idx, event) in events.iter().enumerate() {
                    let active = current.is_some_and(|t| event.is_active_at(t));
                    let stamp = match event.span {
                        Some((start, end)) => format!(
                            "{} - {}",
                            start.format("%m-%d %H:%M"),
                            end.format("%m-%d %H:%M")
                        ),
                        None => event.at.format("%m-%d %H:%M").to_string(),
                    };
                    let text = format!("{}  {}", stamp, event.description);
                    let rich = if active {
                        egui::RichText::new(text)
                            .strong()
                            .color(egui::Color32::from_rgb(255, 200, 80))
                    } else {
                        egui::RichText::new(text).weak()
                    };
                    let response = ui.label(rich).interact(egui::Sense::click());
                    if response.clicked() {
                        if let Some(timeline) = self.timeline.as_mut() {
                            timeline.fraction = timeline.fraction_of(event.at);
                            timeline.playing = false;
                        }
                    }
                    if self.settings.follow_feed && pinned == Some(idx) {
                        response.scroll_to_me(Some(egui::Align::Center));
                    }
                }
            });
    }

    fn show_side_panel(&mut self, ui: &mut egui::Ui) {
        self.settings.show(ui);

        if let Some(body) = self.selected {
            ui.separator();
            ui.horizontal(|ui| {
                ui.label("Selected:");
                ui.label(
                    egui::RichText::new(body.label())
                        .strong()
                        .color(body.display_color()),
                );
                if ui.small_button("x").clicked() {
                    self.selected = None;
                }
            });
        }

        ui.separator();
        self.show_event_feed(ui);

        ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "v{} {}",
                    env!("CARGO_PKG_VERSION"),
                    env!("GIT_HASH")
                ))
                .weak()
                .small(),
            );
            if !self.texture_fallbacks.is_empty() {
                let names: Vec<&str> =
                    self.texture_fallbacks.iter().map(|b| b.label()).collect();
                ui.label(
                    egui::RichText::new(format!("Flat sprites: {}", names.join(", ")))
                        .weak()
                        .small(),
                );
            }
        });
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.settings.dark_mode {
            let mut vis = egui::Visuals::dark();
            let black = egui::Color32::BLACK;
            vis.window_fill = black;
            vis.panel_fill = black;
            vis.extreme_bg_color = black;
            vis
        } else {
            egui::Visuals::light()
        });

        self.poll_loads(ctx);
        self.render_sprites(ctx);

        let dt = ctx.input(|i| i.stable_dt) as f64;
        if let Some(timeline) = self.timeline.as_mut() {
            if timeline.playing {
                timeline.advance(dt);
                ctx.request_repaint();
            }
        }

        egui::TopBottomPanel::top("timeline_bar").show(ctx, |ui| {
            self.show_timeline_bar(ui);
            ui.add_space(4.0);
        });

        egui::SidePanel::left("side_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                self.show_side_panel(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            match &self.ephemeris {
                EphemerisState::Loading => {
                    ui.centered_and_justified(|ui| {
                        ui.spinner();
                    });
                }
                EphemerisState::Failed(e) => {
                    ui.centered_and_justified(|ui| {
                        ui.colored_label(
                            egui::Color32::RED,
                            format!("Failed to load positions: {}", e),
                        );
                    });
                }
                EphemerisState::Loaded(ephemeris) => {
                    let date = match self.timeline.as_ref() {
                        Some(t) => t.current_date(),
                        None => ephemeris.start,
                    };
                    let mut clicked = None;
                    egui_plot::Plot::new("orrery_plot")
                        .data_aspect(1.0)
                        .show_axes(false)
                        .show_grid(false)
                        .show_x(false)
                        .show_y(false)
                        .cursor_color(egui::Color32::TRANSPARENT)
                        .show(ui, |plot_ui| {
                            clicked = draw_system_view(
                                plot_ui,
                                ephemeris,
                                date,
                                &self.sprite_handles,
                                &self.settings,
                                self.selected,
                            );
                        });
                    if let Some(body) = clicked {
                        self.selected =
                            if self.selected == Some(body) { None } else { Some(body) };
                    }
                }
            }
        });
    }
}
