use std::collections::HashMap;

use crate::config::AppConfig;
use crate::editor::{EditorKind, EditorScreen};
use crate::router::{Destination, Router};
use crate::splash::SplashScreen;

/// A full-window view the router can navigate to.
pub trait Screen {
    fn show(&mut self, ctx: &egui::Context, router: &mut Router, config: &mut AppConfig);

    /// Called once before the screen is dropped. Releases held resources.
    fn teardown(&mut self) {}
}

/// Builds the screen for `destination`. Every destination maps to exactly one
/// screen; the editor layouts come from [`EditorKind::for_destination`].
fn build_screen(destination: Destination, config: &AppConfig) -> Box<dyn Screen> {
    match EditorKind::for_destination(destination) {
        Some(kind) => Box::new(EditorScreen::new(kind, config)),
        None => Box::new(SplashScreen::new(config.sounds_dir())),
    }
}

pub struct PhotosApp {
    router: Router,
    screens: HashMap<Destination, Box<dyn Screen>>,
    config: AppConfig,
}

impl PhotosApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        Self {
            router: Router::new(),
            screens: HashMap::new(),
            config,
        }
    }

    /// Tears down screens whose destination left the navigation stack.
    fn drop_unreachable_screens(&mut self) {
        let router = &self.router;
        let gone: Vec<Destination> = self
            .screens
            .keys()
            .copied()
            .filter(|d| !router.contains(*d))
            .collect();
        for destination in gone {
            if let Some(mut screen) = self.screens.remove(&destination) {
                tracing::debug!(?destination, "tearing down screen");
                screen.teardown();
            }
        }
    }
}

impl eframe::App for PhotosApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Track window size for saving on exit
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.config.window_width = Some(rect.width());
            self.config.window_height = Some(rect.height());
        }

        let current = self.router.current();
        let screen = self
            .screens
            .entry(current)
            .or_insert_with(|| build_screen(current, &self.config));
        screen.show(ctx, &mut self.router, &mut self.config);

        if self.router.current() != current {
            self.drop_unreachable_screens();
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        for (_, mut screen) in self.screens.drain() {
            screen.teardown();
        }
        self.config.save();
    }
}
