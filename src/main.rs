mod app;
mod audio;
mod config;
mod controller;
mod editor;
mod library;
mod loader;
mod metadata;
mod processing;
mod router;
mod session;
mod splash;
mod state;
mod strings;

use app::PhotosApp;
use config::AppConfig;

const DEFAULT_WIDTH: f32 = 480.0;
const DEFAULT_HEIGHT: f32 = 860.0;

fn window_size(config: &AppConfig) -> [f32; 2] {
    let width = config.window_width.filter(|w| *w >= 200.0).unwrap_or(DEFAULT_WIDTH);
    let height = config.window_height.filter(|h| *h >= 200.0).unwrap_or(DEFAULT_HEIGHT);
    [width, height]
}

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    tracing::info!(library = %config.library_dir().display(), "starting");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(strings::APP_TITLE)
            .with_app_id("yoi-photos")
            .with_inner_size(window_size(&config)),
        ..Default::default()
    };

    eframe::run_native(
        "yoi-photos",
        native_options,
        Box::new(|cc| Ok(Box::new(PhotosApp::new(cc, config)))),
    )
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_HEIGHT, DEFAULT_WIDTH, window_size};
    use crate::config::AppConfig;

    #[test]
    fn window_size_defaults_to_portrait_phone_shape() {
        assert_eq!(window_size(&AppConfig::default()), [DEFAULT_WIDTH, DEFAULT_HEIGHT]);
    }

    #[test]
    fn window_size_ignores_collapsed_saved_sizes() {
        let config = AppConfig {
            window_width: Some(20.0),
            window_height: Some(900.0),
            ..Default::default()
        };
        assert_eq!(window_size(&config), [DEFAULT_WIDTH, 900.0]);
    }
}
