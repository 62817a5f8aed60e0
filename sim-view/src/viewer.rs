//! Interactive glyph field viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation, the field
//! synchronizer and the camera, and implements [`eframe::App`] to drive
//! them from keyboard and pointer input.

use crate::preview;
use eframe::App;
use glam::{Vec2, Vec3};
use glyphfield_core::{
    CameraPose, ConfigError, EvictionPolicy, FieldConfig, FieldSynchronizer, InputEvent,
    SimConfig, Simulation,
};
use tracing::{debug, warn};

/// Width of the CPU preview in pixels; height follows the aspect ratio.
const PREVIEW_WIDTH: usize = 160;

/// Main application state for the viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: [`Simulation`] and [`FieldSynchronizer`].
/// - A camera that eases toward the centroid of the nodes.
/// - The CPU preview texture standing in for the field shader.
/// - eframe/egui callbacks for input, panels and overlays.
///
/// The typical per-frame update is:
/// 1. Turn keyboard and pointer input into [`InputEvent`]s.
/// 2. If `running`, step the simulation by the frame time.
/// 3. Sync the field block and render the preview and overlays.
pub struct Viewer {
    sim: Simulation,
    sync: FieldSynchronizer,
    camera: CameraPose,
    /// Camera position relative to its target.
    camera_offset: Vec3,
    /// Rate (1/s) at which the camera target catches up with the centroid.
    follow_rate: f32,

    /// Config being edited in the side panel.
    draft: SimConfig,

    running: bool,
    time_scale: f32,
    show_springs: bool,
    show_glyphs: bool,
    show_phantoms: bool,

    texture: Option<egui::TextureHandle>,
    pixels: Vec<u8>,
}

impl Viewer {
    /// Creates a running viewer around `sim`, looking at the origin.
    pub fn new(sim: Simulation) -> Result<Self, ConfigError> {
        let sync = FieldSynchronizer::new(FieldConfig::default())?;
        let camera = CameraPose::default();
        Ok(Self {
            draft: *sim.config(),
            sim,
            sync,
            camera_offset: camera.position - camera.target,
            camera,
            follow_rate: 1.5,
            running: true,
            time_scale: 1.0,
            show_springs: false,
            show_glyphs: true,
            show_phantoms: false,
            texture: None,
            pixels: Vec::new(),
        })
    }

    /// Translates raw egui events into simulation input.
    ///
    /// Text spawns one node per character, Enter commits the cluster,
    /// Escape resets and Tab toggles the lock.
    fn apply_events(&mut self, events: &[egui::Event]) {
        for event in events {
            match event {
                egui::Event::Text(text) => {
                    for c in text.chars() {
                        self.sim.handle(InputEvent::CharacterTyped(c));
                    }
                }
                egui::Event::Key {
                    key, pressed: true, ..
                } => match key {
                    egui::Key::Enter => self.sim.handle(InputEvent::Commit),
                    egui::Key::Escape => self.sim.handle(InputEvent::Reset),
                    egui::Key::Tab => {
                        if self.sim.is_locked() {
                            self.sim.unlock();
                        } else {
                            self.sim.lock();
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }
    }

    /// Advances the simulation and eases the camera toward the centroid.
    fn advance(&mut self, dt: f32) {
        if self.running {
            self.sim.step(dt * self.time_scale);
        }
        let goal = self.sim.centroid().extend(0.0);
        let k = 1.0 - (-self.follow_rate * dt).exp();
        self.camera.target = self.camera.target.lerp(goal, k);
        self.camera.position = self.camera.target + self.camera_offset;
    }

    /// Pushes the side-panel draft into the simulation if it changed.
    fn apply_draft(&mut self) {
        if self.draft == *self.sim.config() {
            return;
        }
        match self.sim.set_config(self.draft) {
            Ok(()) => debug!("config updated"),
            Err(e) => {
                warn!("rejected config change: {e}");
                self.draft = *self.sim.config();
            }
        }
    }

    fn ndc_to_screen(ndc: Vec2, rect: egui::Rect) -> egui::Pos2 {
        egui::pos2(
            rect.left() + (ndc.x + 1.0) * 0.5 * rect.width(),
            rect.top() + (1.0 - ndc.y) * 0.5 * rect.height(),
        )
    }

    fn screen_to_ndc(p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        Vec2::new(
            (p.x - rect.left()) / rect.width() * 2.0 - 1.0,
            1.0 - (p.y - rect.top()) / rect.height() * 2.0,
        )
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel (run controls and overlay toggles).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }
                if ui.button("Commit").clicked() {
                    self.sim.handle(InputEvent::Commit);
                }
                if ui.button("Reset").clicked() {
                    self.sim.handle(InputEvent::Reset);
                }
                let lock_label = if self.sim.is_locked() { "🔒 Locked" } else { "🔓 Open" };
                if ui.button(lock_label).clicked() {
                    if self.sim.is_locked() {
                        self.sim.unlock();
                    } else {
                        self.sim.lock();
                    }
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.time_scale, 0.0..=3.0).text("Speed"));
                ui.checkbox(&mut self.show_springs, "Springs");
                ui.checkbox(&mut self.show_glyphs, "Glyphs");
                ui.checkbox(&mut self.show_phantoms, "Phantoms");
            });
        });
    }

    /// Builds the bottom status bar.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("t = {:.1} s", self.sim.time()));
                ui.separator();
                ui.label(format!("cluster = {}", self.sim.cluster_id()));
                ui.label(format!(
                    "nodes = {} ({} live)",
                    self.sim.nodes().len(),
                    self.sim.live_count()
                ));
                ui.label(format!("springs = {}", self.sim.springs().len()));
                if self.sync.truncated() > 0 {
                    ui.label(format!("hidden = {}", self.sync.truncated()));
                }
                ui.separator();
                ui.label(match self.sim.policy() {
                    EvictionPolicy::Fifo => "policy: fifo",
                    EvictionPolicy::Fade => "policy: fade",
                });
            });
        });
    }

    /// Builds the right-hand panel editing the simulation config.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(230.0)
            .show(ctx, |ui| {
                ui.heading("Config");
                let d = &mut self.draft;

                ui.separator();
                ui.label("Capacity");
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut d.capacity.policy, EvictionPolicy::Fade, "Fade");
                    ui.selectable_value(&mut d.capacity.policy, EvictionPolicy::Fifo, "FIFO");
                });
                Self::labeled_drag_f32(ui, "fade_rate:", &mut d.capacity.fade_rate, 0.01..=5.0, 0.01);

                ui.separator();
                ui.label("Ambient");
                ui.checkbox(&mut d.ambient.enabled, "enabled");
                Self::labeled_drag_f32(ui, "strength:", &mut d.ambient.strength, 0.0..=10.0, 0.05);
                Self::labeled_drag_f32(ui, "scale:", &mut d.ambient.scale, 0.0..=5.0, 0.01);
                Self::labeled_drag_f32(ui, "time_scale:", &mut d.ambient.time_scale, 0.0..=5.0, 0.01);

                ui.separator();
                ui.label("Phantoms");
                ui.checkbox(&mut d.phantoms.enabled, "enabled");
                Self::labeled_drag_f32(ui, "speed:", &mut d.phantoms.speed, 0.0..=2.0, 0.005);

                ui.separator();
                ui.label("Repulsion");
                Self::labeled_drag_f32(ui, "radius:", &mut d.repulsion.radius, 0.01..=3.0, 0.01);
                Self::labeled_drag_f32(ui, "strength:", &mut d.repulsion.strength, 0.0..=10.0, 0.05);
                ui.checkbox(&mut d.repulsion.breathing.enabled, "breathing");
                Self::labeled_drag_f32(
                    ui,
                    "amplitude:",
                    &mut d.repulsion.breathing.amplitude,
                    0.0..=2.0,
                    0.01,
                );

                ui.separator();
                ui.label("Pointer");
                Self::labeled_drag_f32(ui, "radius:", &mut d.interaction.radius, 0.05..=5.0, 0.01);
                Self::labeled_drag_f32(ui, "strength:", &mut d.interaction.strength, 0.0..=20.0, 0.1);

                ui.separator();
                ui.label("Integrator");
                Self::labeled_drag_f32(ui, "drag:", &mut d.integrator.drag, 0.0..=10.0, 0.05);

                ui.separator();
                if ui.button("Reset cfg to default").clicked() {
                    *d = SimConfig::default();
                }
            });
        self.apply_draft();
    }

    /// Builds the central panel: pointer interaction, preview and overlays.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::hover());
            let rect = response.rect;
            let painter = ui.painter_at(rect);
            self.sync.resize(rect.width(), rect.height());

            let basis = self.camera.basis(rect.width() / rect.height());
            let pointer = response
                .hover_pos()
                .and_then(|p| basis.hit_plane(Self::screen_to_ndc(p, rect), self.sync.config().plane_z))
                .map(|p| p.truncate());
            self.sim.handle(InputEvent::PointerMoved(pointer));

            let block = *self.sync.sync(&self.sim.snapshot(), &self.camera);

            let aspect = (rect.width() / rect.height()).max(0.1);
            let size = [
                PREVIEW_WIDTH,
                ((PREVIEW_WIDTH as f32 / aspect) as usize).max(1),
            ];
            preview::render(&block, size, self.sync.config().plane_z, &mut self.pixels);
            let image = egui::ColorImage::from_rgba_unmultiplied(size, &self.pixels);
            let texture_id = match &mut self.texture {
                Some(t) => {
                    t.set(image, egui::TextureOptions::LINEAR);
                    t.id()
                }
                None => {
                    let t = ctx.load_texture("field", image, egui::TextureOptions::LINEAR);
                    let id = t.id();
                    self.texture = Some(t);
                    id
                }
            };
            painter.image(
                texture_id,
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            let to_screen = |p: Vec2| {
                basis
                    .project(p.extend(self.sync.config().plane_z))
                    .map(|ndc| Self::ndc_to_screen(ndc, rect))
            };

            if self.show_springs {
                let stroke = egui::Stroke::new(1.0, egui::Color32::from_white_alpha(60));
                for s in self.sim.springs() {
                    if let (Some(a), Some(b)) = (self.sim.node(s.a), self.sim.node(s.b))
                        && let (Some(a), Some(b)) = (to_screen(a.pos), to_screen(b.pos))
                    {
                        painter.line_segment([a, b], stroke);
                    }
                }
            }

            if self.show_glyphs {
                for n in self.sim.nodes() {
                    if let Some(p) = to_screen(n.pos) {
                        let alpha = if n.dying { 70 } else { 200 };
                        painter.text(
                            p,
                            egui::Align2::CENTER_CENTER,
                            n.symbol,
                            egui::FontId::monospace(14.0),
                            egui::Color32::from_rgba_unmultiplied(20, 10, 40, alpha),
                        );
                    }
                }
            }

            if self.show_phantoms {
                let stroke = egui::Stroke::new(1.0, egui::Color32::LIGHT_BLUE);
                let r = self.sim.config().interaction.radius;
                for p in self.sim.phantom_positions() {
                    if let (Some(c), Some(edge)) = (to_screen(p), to_screen(p + Vec2::new(r, 0.0))) {
                        painter.circle_stroke(c, (edge.x - c.x).abs(), stroke);
                    }
                }
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback: input, simulation step, then all panels.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (events, dt) = ctx.input(|i| (i.events.clone(), i.stable_dt));
        self.apply_events(&events);
        self.advance(dt);

        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);

        ctx.request_repaint();
    }
}
