//! User-facing text.

pub const APP_TITLE: &str = "YOI Photos";
pub const ALERT_TITLE: &str = "Image Saved";
pub const ALERT_BUTTON: &str = "OK";

pub const TEXT_COOLER: &str = "Cooler";
pub const TEXT_WARMER: &str = "Warmer";
pub const LABEL_SELECT_IMAGE: &str = "Select Image";
pub const LABEL_SAVE_IMAGE: &str = "Save Image";
pub const LABEL_RESET: &str = "Reset";
pub const NO_IMAGE_SELECTED: &str = "No Image Selected";
pub const TAP_TO_SELECT: &str = "Tap to select a photo";

pub const ERROR_LOADING_IMAGE: &str = "Error loading image:";
pub const NO_IMAGE_TO_SAVE: &str = "No processed image to save";
pub const NO_LIBRARY_ACCESS: &str = "Please enable photo library access in settings";
pub const IMAGE_SAVED: &str = "Image saved successfully";
pub const ERROR_SAVING_IMAGE: &str = "Error saving image:";

pub const SPLASH_SOUND: &str = "SPLASH";
