pub mod color;
pub mod exposure;
pub mod filters;
pub mod orientation;
pub mod pipeline;
pub mod temperature;
