//! Server file plan: the ordered sections of one service's HTTP server file.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::templates::TemplateRegistry;
use crate::core::utils::to_snake_case;
use crate::rest::server::{ActionData, ServerData};

/// A section of a generated file: a template and the data it renders.
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub template: String,
    pub data: Value,
}

/// A generated file, before rendering.
#[derive(Debug, Clone)]
pub struct ServerFile {
    /// Path relative to the output root
    pub path: String,
    pub sections: Vec<Section>,
}

/// A rendered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub content: String,
}

/// Section plan of the server file of the service described by `data`.
pub fn server_file(data: &ServerData, config: &Config) -> Result<ServerFile> {
    let path = format!(
        "{}/{}_server.rs",
        config.output_dir.trim_end_matches('/'),
        to_snake_case(&data.service_name)
    );
    let server = serde_json::to_value(data)?;
    let section = |template: &str, action: Option<&ActionData>| -> Result<Section> {
        let mut data = json!({
            "rt": config.runtime_module,
            "svc": config.service_module,
            "errors": config.errors_var,
            "server": server,
        });
        if let Some(action) = action {
            data["action"] = serde_json::to_value(action)?;
        }
        Ok(Section {
            template: format!("server/{template}"),
            data,
        })
    };

    let mut sections = vec![
        section("header", None)?,
        section("struct", None)?,
        section("constructor", None)?,
        section("mount", None)?,
    ];
    for action in &data.action_data {
        sections.push(section("handler", Some(action))?);
        sections.push(section("handler_constructor", Some(action))?);
        if action.has_responses() {
            sections.push(section("encoder", Some(action))?);
        }
        if action.has_payload() {
            sections.push(section("decoder", Some(action))?);
        }
        if action.has_errors() {
            sections.push(section("error_encoder", Some(action))?);
        }
    }

    Ok(ServerFile { path, sections })
}

impl ServerFile {
    pub fn template_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.template.as_str()).collect()
    }

    /// Render every section and join them, one blank line apart.
    pub fn render(&self, templates: &TemplateRegistry) -> Result<Artifact> {
        let mut parts = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            let rendered = templates.render(&section.template, &section.data)?;
            if !rendered.is_empty() {
                parts.push(rendered);
            }
        }

        debug!(path = %self.path, sections = self.sections.len(), "Rendered server file");
        let mut content = parts.join("\n\n");
        content.push('\n');
        Ok(Artifact {
            path: self.path.clone(),
            content,
        })
    }
}
