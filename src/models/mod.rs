//! Data models for projects, pages, widgets and hardware profiles.
//!
//! This module contains the core data structures shared by the compiler,
//! the CLI and the web API. Models are independent of any export logic.

pub mod hardware;
pub mod project;
pub mod widget;

// Re-export all model types
pub use hardware::{
    Backlight, DisplayPins, Features, HardwareProfile, I2cPins, Pins, Resolution, SpiPins,
    TemplateRef, TouchController,
};
pub use project::{
    CustomHardware, CustomPins, EntityState, Orientation, Page, Project, RenderingMode,
};
pub use widget::{Condition, ConditionOperator, Widget};
