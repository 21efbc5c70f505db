//! Structural project validation.
//!
//! Validation is advisory: it reports problems a user should fix but never
//! changes what the compiler emits. Errors make `validate` fail, warnings do
//! not (unless the caller asks for strict mode).

use crate::constants::{CUSTOM_DEVICE_ID, LAMBDA_PLACEHOLDER};
use crate::models::{ConditionOperator, Project, RenderingMode};
use crate::plugins::PluginRegistry;
use serde::Serialize;
use std::collections::HashMap;

/// Validation result with errors and warnings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Problems that make the project invalid
    pub errors: Vec<ValidationError>,
    /// Non-blocking findings
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Creates an empty report.
    pub const fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns true if there are no errors (warnings are allowed).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an error.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Adds a warning.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Formats the report for terminal output.
    pub fn format_message(&self) -> String {
        let mut lines = Vec::new();
        if !self.errors.is_empty() {
            lines.push(format!("❌ {} validation errors:", self.errors.len()));
            for (idx, error) in self.errors.iter().enumerate() {
                lines.push(format!("  {}. {}", idx + 1, error));
            }
        }
        if !self.warnings.is_empty() {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push(format!("⚠️  {} warnings:", self.warnings.len()));
            for (idx, warning) in self.warnings.iter().enumerate() {
                lines.push(format!("  {}. {}", idx + 1, warning));
            }
        }
        lines.join("\n")
    }
}

/// A validation error with the widget it concerns, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    /// Type of error
    pub kind: ValidationErrorKind,
    /// Page index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    /// Widget id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl ValidationError {
    /// Creates an error without location.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            page: None,
            widget: None,
            message: message.into(),
        }
    }

    /// Sets the page and widget the error refers to.
    #[must_use]
    pub fn at(mut self, page: usize, widget: impl Into<String>) -> Self {
        self.page = Some(page);
        self.widget = Some(widget.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.page, &self.widget) {
            (Some(page), Some(widget)) => write!(
                f,
                "[Page {page}, widget '{widget}'] {}: {}",
                self.kind, self.message
            ),
            _ => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Types of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    /// Widget without an id
    MissingId,
    /// Two widgets share an id
    DuplicateId,
    /// `range` condition whose minimum exceeds its maximum
    InvalidCondition,
    /// Project has no pages
    NoPages,
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingId => write!(f, "Missing Id"),
            Self::DuplicateId => write!(f, "Duplicate Id"),
            Self::InvalidCondition => write!(f, "Invalid Condition"),
            Self::NoPages => write!(f, "No Pages"),
        }
    }
}

/// Non-blocking finding.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationWarning {
    /// Warning message
    pub message: String,
}

impl ValidationWarning {
    /// Creates a warning.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Project validator.
pub struct ProjectValidator<'a> {
    project: &'a Project,
    registry: &'a PluginRegistry,
    profile_known: bool,
    template: Option<&'a str>,
}

impl<'a> ProjectValidator<'a> {
    /// Creates a validator. The device profile is assumed to exist.
    pub const fn new(project: &'a Project, registry: &'a PluginRegistry) -> Self {
        Self {
            project,
            registry,
            profile_known: true,
            template: None,
        }
    }

    /// Records whether the project's device id resolved to a profile.
    #[must_use]
    pub const fn with_profile_known(mut self, known: bool) -> Self {
        self.profile_known = known;
        self
    }

    /// Also checks a hardware template for its placeholders.
    #[must_use]
    pub const fn with_template(mut self, template: Option<&'a str>) -> Self {
        self.template = template;
        self
    }

    /// Validates the project.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        if self.project.pages.is_empty() {
            report.add_error(ValidationError::new(
                ValidationErrorKind::NoPages,
                "Project has no pages",
            ));
        }

        if !self.profile_known {
            report.add_warning(ValidationWarning::new(format!(
                "Unknown device '{}'; a generic e-paper profile will be used",
                self.project.device_model
            )));
        }
        if self.project.device_model == CUSTOM_DEVICE_ID && self.project.custom_hardware.is_none() {
            report.add_warning(ValidationWarning::new(
                "Device is 'custom' but no custom hardware is defined; defaults will be used",
            ));
        }

        self.validate_widgets(&mut report);

        if let Some(template) = self.template {
            if self.project.rendering_mode != RenderingMode::Lvgl
                && !template.contains(LAMBDA_PLACEHOLDER)
            {
                report.add_warning(ValidationWarning::new(format!(
                    "Hardware template has no '{LAMBDA_PLACEHOLDER}' marker; the display lambda will not be inserted"
                )));
            }
        }

        report
    }

    fn validate_widgets(&self, report: &mut ValidationReport) {
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for (page_idx, page) in self.project.pages.iter().enumerate() {
            for widget in &page.widgets {
                if widget.id.trim().is_empty() {
                    report.add_error(ValidationError {
                        page: Some(page_idx),
                        ..ValidationError::new(
                            ValidationErrorKind::MissingId,
                            format!("A '{}' widget has no id", widget.kind),
                        )
                    });
                    continue;
                }

                if let Some(first_page) = seen.insert(widget.id.as_str(), page_idx) {
                    report.add_error(
                        ValidationError::new(
                            ValidationErrorKind::DuplicateId,
                            format!(
                                "Id '{}' is already used on page {}",
                                widget.id, first_page
                            ),
                        )
                        .at(page_idx, &widget.id),
                    );
                }

                if widget.is_group() {
                    continue;
                }

                if self.registry.get(&widget.kind).is_none() && !widget.kind.starts_with("lvgl_") {
                    report.add_warning(ValidationWarning::new(format!(
                        "Widget '{}' has unknown type '{}' and will be exported as a placeholder",
                        widget.id, widget.kind
                    )));
                }

                if widget.width < 0 || widget.height < 0 {
                    report.add_warning(ValidationWarning::new(format!(
                        "Widget '{}' has a negative size ({}x{})",
                        widget.id, widget.width, widget.height
                    )));
                }

                if let Some(cond) = widget.condition() {
                    if cond.operator == ConditionOperator::Range {
                        if let (Some(min), Some(max)) = (cond.min, cond.max) {
                            if min > max {
                                report.add_error(
                                    ValidationError::new(
                                        ValidationErrorKind::InvalidCondition,
                                        format!("Range minimum {min} exceeds maximum {max}"),
                                    )
                                    .at(page_idx, &widget.id),
                                );
                            }
                        }
                    }
                }
            }
        }
    }
}
