use std::path::PathBuf;
use std::time::Instant;

use crate::app::Screen;
use crate::audio::AudioSession;
use crate::config::AppConfig;
use crate::router::{Destination, Router};
use crate::strings;

/// Seconds of blank screen before the logo view appears.
pub const APPEAR_DELAY: f32 = 1.0;
/// Seconds after the logo appears before the reveal animation starts.
pub const REVEAL_DELAY: f32 = 1.5;
pub const REVEAL_DURATION: f32 = 1.5;

const INITIAL_TITLE: &str = "  I";
const FINAL_TITLE: &str = "Y O I";
/// Each title replaces the previous one after the given interval.
const TITLE_FRAMES: [(&str, f32); 5] = [
    ("Y    ", 0.125),
    ("  O  ", 0.125),
    ("Y    ", 0.25),
    ("Y O  ", 0.25),
    (FINAL_TITLE, 0.25),
];

#[derive(Debug, Clone, Copy, PartialEq)]
/// Everything the splash view needs to draw one frame.
pub struct SplashFrame {
    pub visible: bool,
    pub title: &'static str,
    pub title_scale: f32,
    pub title_opacity: f32,
    pub word_opacity: f32,
    pub show_buttons: bool,
    /// Still changing; the caller should keep repainting.
    pub animating: bool,
}

/// Computes the splash state `elapsed` seconds after the screen was shown.
pub fn frame_at(elapsed: f32) -> SplashFrame {
    if elapsed < APPEAR_DELAY {
        return SplashFrame {
            visible: false,
            title: INITIAL_TITLE,
            title_scale: 0.8,
            title_opacity: 1.0,
            word_opacity: 0.0,
            show_buttons: false,
            animating: true,
        };
    }

    let local = elapsed - APPEAR_DELAY;
    let mut title = INITIAL_TITLE;
    let mut at = 0.0;
    for (text, interval) in TITLE_FRAMES {
        at += interval;
        if local >= at {
            title = text;
        }
    }
    let base_scale = if title == FINAL_TITLE { 1.0 } else { 0.8 };

    let raw = ((local - REVEAL_DELAY) / REVEAL_DURATION).clamp(0.0, 1.0);
    let reveal = raw * raw * (3.0 - 2.0 * raw);
    let revealed = local >= REVEAL_DELAY;

    SplashFrame {
        visible: true,
        title,
        title_scale: lerp(base_scale, 0.7, reveal),
        title_opacity: lerp(1.0, 0.5, reveal),
        word_opacity: reveal,
        show_buttons: revealed,
        animating: raw < 1.0,
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Intro screen: plays the jingle, animates the logo, then offers the editors.
pub struct SplashScreen {
    audio: AudioSession,
    started: Option<Instant>,
    jingle_played: bool,
}

impl SplashScreen {
    pub fn new(sounds_dir: PathBuf) -> Self {
        Self {
            audio: AudioSession::new(sounds_dir),
            started: None,
            jingle_played: false,
        }
    }
}

impl Screen for SplashScreen {
    fn show(&mut self, ctx: &egui::Context, router: &mut Router, _config: &mut AppConfig) {
        let started = *self.started.get_or_insert_with(Instant::now);
        let frame = frame_at(started.elapsed().as_secs_f32());

        if frame.visible && !self.jingle_played {
            self.jingle_played = true;
            self.audio.play(strings::SPLASH_SOUND);
        }

        let panel = egui::Frame::default().fill(egui::Color32::from_gray(24));
        egui::CentralPanel::default().frame(panel).show(ctx, |ui| {
            if !frame.visible {
                return;
            }
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                let title_color = egui::Color32::WHITE.gamma_multiply(frame.title_opacity);
                ui.label(
                    egui::RichText::new(frame.title)
                        .monospace()
                        .size(30.0 * frame.title_scale)
                        .color(title_color),
                );
                ui.add_space(8.0);
                let word_color = egui::Color32::WHITE.gamma_multiply(frame.word_opacity);
                ui.label(
                    egui::RichText::new("photos")
                        .monospace()
                        .strong()
                        .size(60.0)
                        .color(word_color),
                );

                if frame.show_buttons {
                    ui.add_space((ui.available_height() - 80.0).max(16.0));
                    ui.horizontal(|ui| {
                        let width = (ui.available_width() - 8.0) / 2.0;
                        let take =
                            egui::Button::new(egui::RichText::new("TAKE").monospace().size(17.0))
                                .fill(egui::Color32::from_rgb(214, 40, 40))
                                .min_size(egui::vec2(width, 56.0));
                        if ui.add(take).clicked() {
                            router.push(Destination::Warmth);
                        }
                        let choose =
                            egui::Button::new(egui::RichText::new("CHOOSE").monospace().size(17.0))
                                .fill(egui::Color32::from_white_alpha(50))
                                .min_size(egui::vec2(width, 56.0));
                        if ui.add(choose).clicked() {
                            router.push(Destination::PhotoEditor);
                        }
                    });
                }
            });
        });

        if frame.animating {
            ctx.request_repaint();
        }
    }

    fn teardown(&mut self) {
        self.audio.release();
    }
}

#[cfg(test)]
mod tests {
    use super::{APPEAR_DELAY, FINAL_TITLE, REVEAL_DELAY, REVEAL_DURATION, frame_at};

    #[test]
    fn nothing_is_shown_before_the_appear_delay() {
        let frame = frame_at(0.5);
        assert!(!frame.visible);
        assert!(!frame.show_buttons);
    }

    #[test]
    fn title_steps_through_letters() {
        assert_eq!(frame_at(APPEAR_DELAY).title, "  I");
        assert_eq!(frame_at(APPEAR_DELAY + 0.13).title, "Y    ");
        assert_eq!(frame_at(APPEAR_DELAY + 0.26).title, "  O  ");
        assert_eq!(frame_at(APPEAR_DELAY + 0.51).title, "Y    ");
        assert_eq!(frame_at(APPEAR_DELAY + 0.76).title, "Y O  ");
        assert_eq!(frame_at(APPEAR_DELAY + 1.01).title, FINAL_TITLE);
    }

    #[test]
    fn final_title_grows_to_full_scale() {
        assert_eq!(frame_at(APPEAR_DELAY + 0.9).title_scale, 0.8);
        assert_eq!(frame_at(APPEAR_DELAY + 1.1).title_scale, 1.0);
    }

    #[test]
    fn reveal_shrinks_title_and_shows_buttons() {
        let before = frame_at(APPEAR_DELAY + REVEAL_DELAY - 0.01);
        assert!(!before.show_buttons);
        assert_eq!(before.word_opacity, 0.0);

        let done = frame_at(APPEAR_DELAY + REVEAL_DELAY + REVEAL_DURATION + 0.1);
        assert!(done.show_buttons);
        assert!(!done.animating);
        assert_eq!(done.word_opacity, 1.0);
        assert!((done.title_scale - 0.7).abs() < 1e-6);
        assert!((done.title_opacity - 0.5).abs() < 1e-6);
    }
}
