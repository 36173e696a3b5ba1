use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Instant;

use image::DynamicImage;

use crate::app::Screen;
use crate::config::AppConfig;
use crate::library::{self, PhotoLibrary, SaveError};
use crate::loader;
use crate::processing::{pipeline, temperature};
use crate::router::{Destination, Router};
use crate::session::EditSession;
use crate::state::{Adjustment, SourceImage};
use crate::strings;

/// Which adjustments an editor screen exposes, and its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorKind {
    pub title: &'static str,
    pub adjustments: &'static [Adjustment],
}

impl EditorKind {
    pub const PHOTO_EDITOR: EditorKind = EditorKind {
        title: "Photo Editor",
        adjustments: &Adjustment::ALL,
    };
    pub const CONTRAST: EditorKind = EditorKind {
        title: "Contrast",
        adjustments: &[Adjustment::Contrast],
    };
    pub const SATURATION: EditorKind = EditorKind {
        title: "Saturation",
        adjustments: &[Adjustment::Saturation],
    };
    pub const ENHANCER: EditorKind = EditorKind {
        title: "Enhancer",
        adjustments: &[Adjustment::Brightness, Adjustment::Blur],
    };
    pub const WARMTH: EditorKind = EditorKind {
        title: "Color Temperature",
        adjustments: &[Adjustment::Temperature],
    };

    /// The editor layout behind a destination, `None` for non-editor screens.
    pub fn for_destination(destination: Destination) -> Option<Self> {
        match destination {
            Destination::PhotoEditor => Some(Self::PHOTO_EDITOR),
            Destination::Contrast => Some(Self::CONTRAST),
            Destination::Saturation => Some(Self::SATURATION),
            Destination::Enhancer => Some(Self::ENHANCER),
            Destination::Warmth => Some(Self::WARMTH),
            Destination::SplashScreen => None,
        }
    }
}

/// Texture sizes are rounded up to this many pixels so small window resizes
/// reuse the cached display copy.
const TEXTURE_BUCKET: f32 = 128.0;

/// Pixel bounds the display texture is composed at for a window of `screen`
/// points.
fn texture_bounds(screen: egui::Vec2, pixels_per_point: f32) -> [u32; 2] {
    let bucket = |points: f32| {
        let px = (points * pixels_per_point).max(1.0);
        ((px / TEXTURE_BUCKET).ceil() * TEXTURE_BUCKET) as u32
    };
    [bucket(screen.x), bucket(screen.y)]
}

/// What the cached texture was composed from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TextureKey {
    base_version: u64,
    bounds: [u32; 2],
    display: [f32; 4],
}

/// The display base downscaled to the window, reused while only display
/// parameters change.
struct DisplayCopy {
    base_version: u64,
    bounds: [u32; 2],
    image: DynamicImage,
}

enum LoadResult {
    Loaded(PathBuf, SourceImage),
    Failed(String),
}

pub struct EditorScreen {
    kind: EditorKind,
    session: EditSession,
    selected: Adjustment,
    waker_installed: bool,
    texture: Option<egui::TextureHandle>,
    /// Bumped whenever the session's display base changes.
    base_version: u64,
    texture_key: Option<TextureKey>,
    display_copy: Option<DisplayCopy>,
    loading: bool,
    load_rx: Option<mpsc::Receiver<LoadResult>>,
    saving: bool,
    save_rx: Option<mpsc::Receiver<Result<PathBuf, SaveError>>>,
    alert: Option<String>,
    open_picker_on_show: bool,
}

impl EditorScreen {
    pub fn new(kind: EditorKind, config: &AppConfig) -> Self {
        Self {
            kind,
            session: EditSession::new(config.debounce()),
            selected: kind.adjustments[0],
            waker_installed: false,
            texture: None,
            base_version: 0,
            texture_key: None,
            display_copy: None,
            loading: false,
            load_rx: None,
            saving: false,
            save_rx: None,
            alert: None,
            open_picker_on_show: true,
        }
    }

    fn pick_image(&mut self, ctx: &egui::Context, config: &mut AppConfig) {
        let mut dialog = rfd::FileDialog::new().add_filter("Images", loader::SUPPORTED_IMAGE_EXTS);
        if let Some(dir) = config.last_open_dir.as_ref() {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            return;
        };
        config.last_open_dir = path.parent().map(|p| p.to_path_buf());

        let (tx, rx) = mpsc::channel();
        let ctx2 = ctx.clone();
        std::thread::spawn(move || {
            let result = match loader::open(&path) {
                Ok(source) => LoadResult::Loaded(path, source),
                Err(err) => {
                    tracing::warn!(path = %path.display(), "image load failed: {err:#}");
                    LoadResult::Failed(format!("{} {:#}", strings::ERROR_LOADING_IMAGE, err))
                }
            };
            let _ = tx.send(result);
            ctx2.request_repaint();
        });
        self.loading = true;
        self.load_rx = Some(rx);
    }

    fn start_save(&mut self, ctx: &egui::Context, config: &AppConfig) {
        let Some(job) = self.session.render_job() else {
            self.alert = Some(library::save_message(&Err(SaveError::NothingToSave)));
            return;
        };
        let library = PhotoLibrary::new(config.library_dir(), config.jpeg_quality());

        let (tx, rx) = mpsc::channel();
        let ctx2 = ctx.clone();
        std::thread::spawn(move || {
            let result = library.add(&job.run());
            if let Err(ref err) = result {
                tracing::warn!(library = %library.root().display(), "save failed: {err}");
            }
            let _ = tx.send(result);
            ctx2.request_repaint();
        });
        self.saving = true;
        self.save_rx = Some(rx);
    }

    fn poll_background(&mut self) {
        if let Some(rx) = self.load_rx.take() {
            match rx.try_recv() {
                Ok(LoadResult::Loaded(path, source)) => {
                    tracing::info!(path = %path.display(), "image selected");
                    self.session.set_source(source);
                    self.base_version += 1;
                    self.loading = false;
                }
                Ok(LoadResult::Failed(message)) => {
                    self.alert = Some(message);
                    self.loading = false;
                }
                Err(mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
                Err(mpsc::TryRecvError::Disconnected) => self.loading = false,
            }
        }

        if let Some(rx) = self.save_rx.take() {
            match rx.try_recv() {
                Ok(result) => {
                    self.alert = Some(library::save_message(&result));
                    self.saving = false;
                }
                Err(mpsc::TryRecvError::Empty) => self.save_rx = Some(rx),
                Err(mpsc::TryRecvError::Disconnected) => self.saving = false,
            }
        }
    }

    /// Recomposes the display texture when the base image, the window size or
    /// a display parameter changed since the last frame.
    ///
    /// The display chain runs on a copy no larger than the window, so a slider
    /// drag costs a screen-sized pass rather than a preview-sized one.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let Some(base) = self.session.display_base() else {
            self.texture = None;
            self.texture_key = None;
            self.display_copy = None;
            return;
        };
        let key = TextureKey {
            base_version: self.base_version,
            bounds: texture_bounds(ctx.screen_rect().size(), ctx.pixels_per_point()),
            display: self.session.params().display_key(),
        };
        if self.texture_key == Some(key) {
            return;
        }

        let reusable = self
            .display_copy
            .as_ref()
            .is_some_and(|c| c.base_version == key.base_version && c.bounds == key.bounds);
        if !reusable {
            self.display_copy = Some(DisplayCopy {
                base_version: key.base_version,
                bounds: key.bounds,
                image: pipeline::fit_within(base, key.bounds[0], key.bounds[1]),
            });
        }
        let Some(copy) = self.display_copy.as_ref() else {
            return;
        };

        let composed = pipeline::compose(&copy.image, self.session.params());
        let rgba = composed.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let img = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
        match self.texture.as_mut() {
            Some(tex) => tex.set(img, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("editor_tex", img, egui::TextureOptions::LINEAR))
            }
        }
        self.texture_key = Some(key);
    }

    fn show_image(&mut self, ui: &mut egui::Ui) -> bool {
        let mut clicked = false;
        let avail = ui.available_size();
        if let Some(tex) = self.texture.as_ref() {
            let tex_size = tex.size_vec2() / ui.ctx().pixels_per_point();
            let scale = (avail.x / tex_size.x).min(avail.y / tex_size.y).min(1.0);
            ui.centered_and_justified(|ui| {
                let resp = ui.add(
                    egui::Image::new((tex.id(), tex_size * scale)).sense(egui::Sense::click()),
                );
                clicked = resp.clicked();
                if self.session.is_processing() {
                    ui.painter()
                        .rect_filled(resp.rect, 0.0, egui::Color32::from_black_alpha(80));
                }
            });
        } else {
            ui.centered_and_justified(|ui| {
                if self.loading {
                    ui.spinner();
                    return;
                }
                let text = format!("{}\n\n{}", strings::NO_IMAGE_SELECTED, strings::TAP_TO_SELECT);
                let resp = ui.add(
                    egui::Label::new(egui::RichText::new(text).size(20.0).weak())
                        .sense(egui::Sense::click()),
                );
                clicked = resp.clicked();
            });
        }
        clicked
    }

    fn show_controls(&mut self, ui: &mut egui::Ui, now: Instant) {
        if self.kind.adjustments.len() > 1 {
            ui.horizontal(|ui| {
                for &adjustment in self.kind.adjustments {
                    if ui
                        .selectable_label(self.selected == adjustment, adjustment.label())
                        .clicked()
                    {
                        self.selected = adjustment;
                    }
                }
            });
            ui.add_space(6.0);
        }

        let adjustment = self.selected;
        let value = self.session.params().get(adjustment);
        if adjustment == Adjustment::Temperature {
            let mut slider = (value * 100.0).round();
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::LIGHT_BLUE, strings::TEXT_COOLER);
                let resp = ui.add(
                    egui::Slider::new(&mut slider, -100.0_f32..=100.0_f32)
                        .step_by(1.0)
                        .show_value(false)
                        .clamping(egui::SliderClamping::Always),
                );
                ui.colored_label(egui::Color32::LIGHT_RED, strings::TEXT_WARMER);
                if resp.changed() {
                    self.session.set_parameter(
                        adjustment,
                        temperature::slider_to_intensity(slider),
                        now,
                    );
                }
            });
            ui.label(format!("{} {}", adjustment.label(), slider as i32));
        } else {
            let range = adjustment.range();
            let mut current = value;
            ui.horizontal(|ui| {
                ui.strong(adjustment.label());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(format!("{:.2}", current));
                });
            });
            ui.horizontal(|ui| {
                ui.small(format!("{:.1}", range.start()));
                let resp = ui.add(
                    egui::Slider::new(&mut current, range.clone())
                        .show_value(false)
                        .clamping(egui::SliderClamping::Always),
                );
                ui.small(format!("{:.1}", range.end()));
                if resp.changed() {
                    self.session.set_parameter(adjustment, current, now);
                }
            });
        }
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };
        egui::Window::new(strings::ALERT_TITLE)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button(strings::ALERT_BUTTON).clicked() {
                    self.alert = None;
                }
            });
    }
}

impl Screen for EditorScreen {
    fn show(&mut self, ctx: &egui::Context, router: &mut Router, config: &mut AppConfig) {
        if !self.waker_installed {
            let ctx2 = ctx.clone();
            self.session.set_waker(Arc::new(move || ctx2.request_repaint()));
            self.waker_installed = true;
        }

        let now = Instant::now();
        self.poll_background();
        if self.session.tick(now) {
            self.base_version += 1;
        }
        if let Some(deadline) = self.session.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }

        let mut wants_picker = std::mem::take(&mut self.open_picker_on_show);

        egui::TopBottomPanel::top("editor_top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("◀").on_hover_text("Back").clicked() {
                    router.pop_to_root();
                }
                ui.heading(self.kind.title);
                if self.session.is_processing() || self.saving {
                    ui.spinner();
                }
            });
        });

        egui::TopBottomPanel::bottom("editor_controls")
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                let has_source = self.session.source().is_some();
                ui.add_enabled_ui(has_source, |ui| self.show_controls(ui, now));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button(strings::LABEL_SELECT_IMAGE).clicked() {
                        wants_picker = true;
                    }
                    let save = ui.add_enabled(
                        has_source && !self.saving,
                        egui::Button::new(strings::LABEL_SAVE_IMAGE),
                    );
                    if save.clicked() {
                        self.start_save(ctx, config);
                    }
                    if ui
                        .add_enabled(has_source, egui::Button::new(strings::LABEL_RESET))
                        .clicked()
                    {
                        self.session.reset_parameters(now);
                    }
                });
                ui.add_space(8.0);
            });

        self.refresh_texture(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.show_image(ui) {
                wants_picker = true;
            }
        });

        self.show_alert(ctx);

        if wants_picker && !self.loading {
            self.pick_image(ctx, config);
        }
    }

    fn teardown(&mut self) {
        self.texture = None;
    }
}
