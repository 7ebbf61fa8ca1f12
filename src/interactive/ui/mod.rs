pub mod app_state;
pub mod commands;
pub mod components;
pub mod content;
pub mod events;
pub mod keymap;
pub mod navigation;
pub mod renderer;
pub mod selection;
