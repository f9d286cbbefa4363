//! Template loading and compilation.
//!
//! Templates are tera files in the configured template directory. Three are
//! required: `index.html` for listings, `post.html` for posts, `page.html`
//! for pages. Anything else in the directory (base layouts, partials) is
//! compiled too and available for `{% extends %}`/`{% include %}`.

use super::{RenderError, describe};
use std::path::Path;
use tera::Tera;

/// Templates every site must provide.
pub const REQUIRED_TEMPLATES: &[&str] = &["index.html", "post.html", "page.html"];

/// A compiled, named set of templates.
///
/// Reloaded wholesale whenever any file in the template directory changes.
#[derive(Debug)]
pub struct TemplateSet {
    tera: Tera,
}

impl TemplateSet {
    /// Compile every `.html` file under `dir`.
    ///
    /// Fails when a template does not compile or a required template is
    /// absent.
    pub fn load(dir: &Path) -> Result<Self, RenderError> {
        let pattern = format!("{}/**/*.html", dir.display());
        let tera = Tera::new(&pattern).map_err(|err| RenderError::Template {
            name: dir.display().to_string(),
            reason: describe(&err),
        })?;

        for required in REQUIRED_TEMPLATES {
            if !tera.get_template_names().any(|name| name == *required) {
                return Err(RenderError::Template {
                    name: (*required).to_string(),
                    reason: "template file not found".into(),
                });
            }
        }

        Ok(Self { tera })
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String, tera::Error> {
        self.tera.render(name, context)
    }
}
