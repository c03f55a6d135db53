pub mod analyzer;
pub mod color;
pub mod color_state;
pub mod command;
pub mod frame;
pub mod zones;
