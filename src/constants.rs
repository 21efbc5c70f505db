//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and the identifier limits of the
//! generated configuration format.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "LazyESP";

/// The binary name of the application (used in command examples, lowercase with hyphens).
pub const APP_BINARY_NAME: &str = "lazyesp";

/// Maximum length of a generated component id.
pub const MAX_ID_LENGTH: usize = 63;

/// Marker line replaced by the imperative display body in hardware templates.
pub const LAMBDA_PLACEHOLDER: &str = "# __LAMBDA_PLACEHOLDER__";

/// Marker line replaced by touch-sensor fragments in hardware templates.
pub const TOUCH_SENSORS_PLACEHOLDER: &str = "# __TOUCH_SENSORS_PLACEHOLDER__";

/// Profile id that requests synthesis from the project's custom hardware fields.
pub const CUSTOM_DEVICE_ID: &str = "custom";

/// Profile used when a project names no device.
pub const DEFAULT_DEVICE_ID: &str = "reterminal_e1001";
