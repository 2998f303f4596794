use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use minijinja::Environment;

use crate::table::Record;

/// Renders metadata records through a Jinja-style XML template.
///
/// The template is loaded from disk once. Placeholders reference record
/// fields by name (`{{ fileIdentifier }}`); fields absent from a record
/// render as empty. The output is not validated as XML; supplying a template
/// whose placeholders match the CSV schema is the operator's job.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

const TEMPLATE_NAME: &str = "metadata";

impl TemplateRenderer {
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        Self::from_source(source)
    }

    pub fn from_source(source: String) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template_owned(TEMPLATE_NAME.to_string(), source)
            .context("Failed to parse template")?;
        Ok(Self { env })
    }

    pub fn render(&self, record: &Record) -> Result<String> {
        let template = self
            .env
            .get_template(TEMPLATE_NAME)
            .context("Template missing from environment")?;
        template.render(record).context("Failed to render template")
    }
}
