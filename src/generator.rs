//! Generator facade: one configuration and one template registry per run.

use tracing::{debug, info};

use crate::codegen::ValidationSynthesizer;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::templates::TemplateRegistry;
use crate::design::check::validate_design;
use crate::design::{Design, Service};
use crate::rest::files::{Artifact, ServerFile, server_file};
use crate::rest::server::{ServerBuilder, ServerData};

/// Generates the HTTP server transport files of a design.
///
/// The registry is owned by the generator and handed by reference to the
/// builders it creates, so overriding a template affects every artifact of
/// the run and nothing outside it.
#[derive(Debug, Clone)]
pub struct Generator {
    config: Config,
    templates: TemplateRegistry,
}

impl Generator {
    /// Create a generator using the built-in templates.
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self::with_templates(config, TemplateRegistry::new()?))
    }

    pub fn with_templates(config: Config, templates: TemplateRegistry) -> Self {
        Self { config, templates }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Registry access for template overrides.
    pub fn templates_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.templates
    }

    /// Validation synthesizer bound to `design` and this generator's
    /// templates and configuration.
    pub fn synthesizer<'a>(&'a self, design: &'a Design) -> ValidationSynthesizer<'a> {
        ValidationSynthesizer::new(design, &self.templates, &self.config)
    }

    /// Binding data of one service. The design is assumed to be checked.
    pub fn server_data(&self, design: &Design, service: &Service) -> Result<ServerData> {
        ServerBuilder::new(design, &self.templates, &self.config).build_server_data(service)
    }

    /// Section plans of the server files of every service, after checking
    /// the design.
    pub fn server_files(&self, design: &Design) -> Result<Vec<ServerFile>> {
        validate_design(design)?;
        debug!(
            types = design.types.len(),
            services = design.services.len(),
            "Design checked"
        );

        let builder = ServerBuilder::new(design, &self.templates, &self.config);
        design
            .services
            .iter()
            .map(|service| server_file(&builder.build_server_data(service)?, &self.config))
            .collect()
    }

    /// Render the server files of every service.
    ///
    /// Fails on the first design defect or rendering error; nothing is
    /// returned for a design that does not check.
    pub fn generate(&self, design: &Design) -> Result<Vec<Artifact>> {
        let artifacts = self
            .server_files(design)?
            .iter()
            .map(|file| file.render(&self.templates))
            .collect::<Result<Vec<_>>>()?;

        info!(artifacts = artifacts.len(), "Generated HTTP server transport");
        Ok(artifacts)
    }
}
