//! Project compilation.
//!
//! [`Compiler::compile`] turns a [`Project`] into a device configuration
//! document. All registries (fonts, entities, triggers) live in a
//! per-compilation state object, so two compilations never share mutable
//! state. Compilation never fails: problems are contained to the widget or
//! section that caused them and reported as [`Diagnostic`]s.

pub mod annotation;
pub mod condition;
pub mod entities;
pub mod fonts;
pub mod icons;
pub mod ir;
pub mod lambda;
pub mod package;
pub mod toolkit;
pub mod triggers;
pub mod validator;

pub use validator::{
    ProjectValidator, ValidationError, ValidationErrorKind, ValidationReport, ValidationWarning,
};

use crate::hardware::sections;
use crate::hardware::{HardwareCatalog, ResolvedProfile, TemplateSource};
use crate::models::{HardwareProfile, Page, Project, RenderingMode, TemplateRef, Widget};
use crate::plugins::{PluginRegistry, PluginWidget, SectionContext, WidgetPlugin};
use annotation::project_annotation;
use entities::{EntityKind, EntityTable};
use fonts::FontRegistry;
use ir::{Document, Node, Section};
use lambda::LambdaGenerator;
use package::{OverrideDirectives, PackageProcessor};
use serde::Serialize;
use std::fmt;
use toolkit::ToolkitGenerator;
use tracing::{debug, info, warn};
use triggers::{inject, keyword_for, TriggerMap};

// ============================================================================
// Diagnostics
// ============================================================================

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Output is complete but may not be what the user intended
    Warning,
    /// Part of the output was replaced by a placeholder
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A problem found while compiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Widget the problem belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Creates a warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            widget: None,
            message: message.into(),
        }
    }

    /// Creates an error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            widget: None,
            message: message.into(),
        }
    }

    /// Attaches the widget id.
    #[must_use]
    pub fn for_widget(mut self, id: &str) -> Self {
        self.widget = Some(id.to_string());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.widget {
            Some(widget) => write!(f, "{} [{}]: {}", self.severity, widget, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Result of a compilation.
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutput {
    /// The generated document
    pub document: String,
    /// Problems found along the way
    pub diagnostics: Vec<Diagnostic>,
    /// Id of the profile the document was compiled against
    pub profile_id: String,
    /// True when the toolkit snippet owns rendering
    pub toolkit_mode: bool,
}

impl CompileOutput {
    /// Returns true if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Decides whether the toolkit snippet owns rendering.
///
/// An explicit mode wins. Otherwise the profile's toolkit support or any
/// visible `lvgl_` widget selects toolkit mode.
pub fn toolkit_mode(project: &Project, profile: &HardwareProfile) -> bool {
    match project.rendering_mode {
        RenderingMode::Direct => false,
        RenderingMode::Lvgl => true,
        RenderingMode::Auto => {
            profile.features.lvgl
                || project
                    .visible_widgets()
                    .any(|w| w.kind.starts_with("lvgl_"))
        }
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// The compiler driver.
pub struct Compiler {
    catalog: HardwareCatalog,
    registry: PluginRegistry,
    templates: Box<dyn TemplateSource>,
    template_override: Option<String>,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("profiles", &self.catalog.len())
            .field("plugins", &self.registry.len())
            .field("template_override", &self.template_override.is_some())
            .finish_non_exhaustive()
    }
}

impl Compiler {
    /// Creates a compiler with the built-in widget plugins.
    pub fn new(catalog: HardwareCatalog, templates: Box<dyn TemplateSource>) -> Self {
        Self {
            catalog,
            registry: PluginRegistry::with_builtins(),
            templates,
            template_override: None,
        }
    }

    /// Replaces the plugin registry.
    #[must_use]
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Compiles every project against this template text instead of the
    /// profile's own template (or generated hardware blocks).
    #[must_use]
    pub fn with_template_override(mut self, template: impl Into<String>) -> Self {
        self.template_override = Some(template.into());
        self
    }

    /// The hardware catalog.
    pub const fn catalog(&self) -> &HardwareCatalog {
        &self.catalog
    }

    /// The plugin registry.
    pub const fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Resolves the effective hardware profile of a project.
    pub fn resolve_profile(&self, project: &Project) -> ResolvedProfile {
        let mut resolved = self.catalog.resolve(project);
        if let Some(template) = &self.template_override {
            resolved.profile.template = Some(TemplateRef::Inline(template.clone()));
        }
        resolved
    }

    /// Loads the template of a package-based profile.
    ///
    /// Returns `None` for profiles without a template. A failed load yields the
    /// `# ERROR LOADING PROFILE` comment in place of the template.
    fn load_template(
        &self,
        profile: &HardwareProfile,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<String> {
        let loaded = match profile.template.as_ref()? {
            TemplateRef::Inline(text) => Ok(text.clone()),
            TemplateRef::Location(location) => self.templates.load(location),
        };
        Some(loaded.unwrap_or_else(|err| {
            warn!("Failed to load template for '{}': {:#}", profile.id, err);
            diagnostics.push(Diagnostic::error(format!(
                "Failed to load hardware template: {err:#}"
            )));
            format!("# ERROR LOADING PROFILE: {err:#}")
        }))
    }

    /// Validates a project against this compiler's catalog and plugins.
    pub fn validate(&self, project: &Project) -> ValidationReport {
        let resolved = self.resolve_profile(project);
        let mut ignored = Vec::new();
        let template = self.load_template(&resolved.profile, &mut ignored);
        ProjectValidator::new(project, &self.registry)
            .with_profile_known(resolved.known)
            .with_template(template.as_deref())
            .validate()
    }

    /// Compiles a project into a device configuration document.
    pub fn compile(&self, project: &Project) -> CompileOutput {
        let mut diagnostics = Vec::new();

        let resolved = self.resolve_profile(project);
        if !resolved.known {
            warn!(
                "Unknown device '{}', falling back to {}",
                project.device_model, resolved.profile.id
            );
            diagnostics.push(Diagnostic::warning(format!(
                "Unknown device '{}'; compiled for the generic e-paper profile",
                project.device_model
            )));
        }
        let profile = resolved.profile;
        let toolkit = toolkit_mode(project, &profile);
        info!(
            "Compiling '{}' for {} ({} page(s), {} rendering)",
            project.name,
            profile.id,
            project.pages.len(),
            if toolkit { "lvgl" } else { "direct" }
        );

        let mut fonts = FontRegistry::new();
        for widget in project.pages.iter().flat_map(Page::exported_widgets) {
            if let Some(plugin) = self.registry.get(&widget.kind) {
                plugin.collect_requirements(widget, &mut fonts);
            }
        }

        let template = self.load_template(&profile, &mut diagnostics);

        let mut pass = Pass {
            compiler: self,
            project,
            profile: &profile,
            toolkit,
            template: template.as_deref(),
            entities: EntityTable::new(),
            fonts,
            triggers: TriggerMap::new(),
            diagnostics,
        };
        let document = pass.run();

        CompileOutput {
            document,
            diagnostics: pass.diagnostics,
            profile_id: profile.id.clone(),
            toolkit_mode: toolkit,
        }
    }
}

// ============================================================================
// Compilation pass
// ============================================================================

/// Per-compilation state.
struct Pass<'a> {
    compiler: &'a Compiler,
    project: &'a Project,
    profile: &'a HardwareProfile,
    toolkit: bool,
    template: Option<&'a str>,
    entities: EntityTable,
    fonts: FontRegistry,
    triggers: TriggerMap,
    diagnostics: Vec<Diagnostic>,
}

impl Pass<'_> {
    fn is_package(&self) -> bool {
        self.template.is_some()
    }

    fn page_count(&self) -> usize {
        self.project.pages.len()
    }

    /// Runs one plugin hook over every plugin with a fresh section context.
    fn run_hooks(
        &mut self,
        plugins: &[&dyn WidgetPlugin],
        widgets: &[PluginWidget<'_>],
        hook: impl Fn(&dyn WidgetPlugin, &mut SectionContext<'_>),
    ) -> (Vec<Node>, Vec<Section>) {
        let mut ctx = SectionContext::new(
            widgets,
            &mut self.entities,
            self.profile,
            self.toolkit,
            self.project.pages.len(),
        );
        for plugin in plugins {
            hook(*plugin, &mut ctx);
        }
        ctx.into_parts()
    }

    fn run(&mut self) -> String {
        let project = self.project;
        let profile = self.profile;
        let registry = &self.compiler.registry;
        let package = self.is_package();
        let template = self.template.unwrap_or_default();

        let widgets: Vec<PluginWidget<'_>> = project
            .pages
            .iter()
            .enumerate()
            .flat_map(|(page, p)| {
                p.exported_widgets().filter_map(move |widget| {
                    registry.canonical(&widget.kind).map(|kind| PluginWidget {
                        kind,
                        page,
                        widget,
                    })
                })
            })
            .collect();
        let visible: Vec<&Widget> = project.visible_widgets().collect();
        let plugins: Vec<&dyn WidgetPlugin> = registry.plugins().collect();

        // Globals
        let mut globals = sections::core_globals(sections::default_refresh(project, profile));
        for item in &globals {
            if let Some(id) = item.get("id").and_then(Node::as_scalar) {
                self.entities.reserve_id(id);
            }
        }
        let (items, _) = self.run_hooks(&plugins, &widgets, |p, ctx| p.on_export_globals(ctx));
        globals.extend(items);

        // Numeric sensors: hardware first so plugins and scans never redeclare them
        let mut numeric = if package {
            Vec::new()
        } else {
            sections::hardware_sensors(profile)
        };
        self.entities.seed_from(&numeric, EntityKind::Numeric);
        if !package && profile.features.onboard_sensors {
            for id in sections::ONBOARD_SENSOR_IDS {
                self.entities.reserve_id(id);
            }
        }
        let (items, _) =
            self.run_hooks(&plugins, &widgets, |p, ctx| p.on_export_numeric_sensors(ctx));
        numeric.extend(items);
        numeric.extend(entities::scan_numeric(
            &visible,
            &mut self.entities,
            &project.entity_states,
        ));

        // Text sensors
        let (mut text, _) =
            self.run_hooks(&plugins, &widgets, |p, ctx| p.on_export_text_sensors(ctx));
        text.extend(entities::scan_text(
            &visible,
            &mut self.entities,
            &project.entity_states,
        ));

        // Binary sensors
        let touch_areas = if self.toolkit {
            Vec::new()
        } else {
            sections::touch_page_areas(profile, project.orientation, self.page_count())
        };
        let (mut binary, touch_fragments) = if package {
            (Vec::new(), sections::touch_fragments(touch_areas))
        } else {
            let mut hardware = sections::buttons(profile);
            hardware.extend(touch_areas);
            (hardware, Vec::new())
        };
        self.entities.seed_from(&binary, EntityKind::Binary);
        let (items, _) =
            self.run_hooks(&plugins, &widgets, |p, ctx| p.on_export_binary_sensors(ctx));
        binary.extend(items);
        binary.extend(entities::scan_binary(&visible, &mut self.entities));

        // Components
        let ordered = registry.component_order();
        let (stray, components) =
            self.run_hooks(&ordered, &widgets, |p, ctx| p.on_export_components(ctx));
        if !stray.is_empty() {
            debug!("Ignoring {} item(s) pushed by component hooks", stray.len());
        }

        // Rendering paths register fonts and triggers, so they run before fonts are emitted
        let lambda = if self.toolkit {
            None
        } else {
            Some(
                LambdaGenerator::new(
                    registry,
                    &self.entities,
                    profile,
                    project.inverted_colors,
                )
                .generate(&project.pages, &mut self.fonts, &mut self.diagnostics),
            )
        };
        let lvgl = if self.toolkit {
            Some(
                ToolkitGenerator::new(registry, &self.entities, profile).generate(
                    &project.pages,
                    &mut self.fonts,
                    &mut self.triggers,
                    &mut self.diagnostics,
                ),
            )
        } else {
            None
        };

        let injected = inject(
            &mut numeric,
            &mut self.triggers,
            self.toolkit,
            keyword_for(EntityKind::Numeric),
        ) + inject(
            &mut text,
            &mut self.triggers,
            self.toolkit,
            keyword_for(EntityKind::Text),
        ) + inject(
            &mut binary,
            &mut self.triggers,
            self.toolkit,
            keyword_for(EntityKind::Binary),
        );
        if injected > 0 {
            debug!("Injected {} trigger(s)", injected);
        }
        for record in self.triggers.take_unmatched() {
            warn!("No declaration for trigger on {}", record.key.raw_key());
            self.diagnostics.push(Diagnostic::warning(format!(
                "No sensor declaration found for update trigger on '{}'",
                record.key.raw_key()
            )));
        }

        // Assembly
        let mut doc = Document::new();
        if !package {
            doc.push_raw(sections::header(project, profile));
        }

        doc.push_section(list_section("globals", globals));

        if profile.features.psram && !template.contains("psram:") {
            doc.push_bare_section(sections::psram(profile));
        }

        let fetches = widgets
            .iter()
            .any(|pw| matches!(pw.kind, "online_image" | "quote_rss"));
        if !package || (fetches && !template.contains("http_request:")) {
            doc.push_section(sections::http_request());
        }
        if !package {
            if let Some(i2c) = sections::i2c(profile) {
                doc.push_section(i2c);
            }
            if let Some(spi) = sections::spi(profile) {
                doc.push_section(spi);
            }
            if let Some((output, light)) = sections::backlight(profile) {
                doc.push_section(output);
                doc.push_section(light);
            }
        }

        let has_time = template.lines().any(|l| l.trim() == "time:")
            || components.iter().any(|s| s.name == "time");
        if !has_time {
            doc.push_section(sections::time());
        }

        doc.push_section(list_section("sensor", numeric));
        doc.push_section(list_section("text_sensor", text));
        doc.push_section(list_section("binary_sensor", binary));
        for section in components {
            doc.push_section(section);
        }

        doc.push_section(self.fonts.emit());
        if sections::needs_page_script(profile, self.page_count()) {
            doc.push_section(sections::page_script(
                profile,
                self.page_count(),
                self.toolkit,
            ));
        }
        if let Some(lvgl) = lvgl {
            doc.push_section(lvgl);
        }

        let body = if package {
            lambda.unwrap_or_default()
        } else {
            let refresh = sections::default_refresh(project, profile);
            doc.push_section(sections::display(
                profile,
                project.orientation,
                refresh,
                lambda,
            ));
            if let Some(touch) = sections::touchscreen(profile, project.orientation) {
                doc.push_section(touch);
            }
            Vec::new()
        };

        if !package {
            return finish(doc.render());
        }

        doc.remove_section("display");
        let directives = OverrideDirectives::new(profile, project.orientation, self.toolkit)
            .with_wake_on_touch(project.wake_on_touch);
        let assembled = PackageProcessor::new(directives).apply(
            template,
            &body,
            &touch_fragments,
            &doc.render(),
        );
        finish(format!("{}\n{}", project_annotation(project), assembled))
    }
}

fn list_section(name: &str, items: Vec<Node>) -> Section {
    Section::new(name, Node::List(items))
}

fn finish(mut text: String) -> String {
    while text.ends_with('\n') {
        text.pop();
    }
    text.push('\n');
    text
}
