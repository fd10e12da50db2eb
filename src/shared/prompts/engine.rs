//! Jinja prompt templates for the AI content endpoints.
//!
//! Built-in templates are compiled into the binary. Files under
//! `templates/prompts/` with the same name replace them at startup, so prompts
//! can be tuned per deployment without a rebuild.

use minijinja::{Environment, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

/// Template directory relative to the working directory
const TEMPLATE_DIR: &str = "templates/prompts";

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "ai/system.jinja",
        include_str!("../../../templates/prompts/ai/system.jinja"),
    ),
    (
        "ai/review_reply.jinja",
        include_str!("../../../templates/prompts/ai/review_reply.jinja"),
    ),
    (
        "ai/post.jinja",
        include_str!("../../../templates/prompts/ai/post.jinja"),
    ),
    (
        "ai/competitor_analysis.jinja",
        include_str!("../../../templates/prompts/ai/competitor_analysis.jinja"),
    ),
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();

    for (name, source) in BUILTIN_TEMPLATES {
        if let Err(e) = env.add_template(*name, *source) {
            tracing::error!("Built-in template {} is invalid: {}", name, e);
        }
    }

    let template_path = Path::new(TEMPLATE_DIR);
    if template_path.exists() {
        load_templates_recursive(&mut env, template_path, template_path);
    }

    env
}

fn load_templates_recursive(env: &mut Environment<'static>, base_path: &Path, current_path: &Path) {
    let Ok(entries) = std::fs::read_dir(current_path) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            load_templates_recursive(env, base_path, &path);
            continue;
        }
        if !path.extension().is_some_and(|ext| ext == "jinja") {
            continue;
        }

        let (Ok(relative), Ok(content)) =
            (path.strip_prefix(base_path), std::fs::read_to_string(&path))
        else {
            continue;
        };
        // Templates live for the whole process
        let name: &'static str =
            Box::leak(relative.to_string_lossy().replace('\\', "/").into_boxed_str());
        let source: &'static str = Box::leak(content.into_boxed_str());

        match env.add_template(name, source) {
            Ok(()) => tracing::debug!("Loaded template override: {}", name),
            Err(e) => tracing::warn!("Failed to load template {}: {}", name, e),
        }
    }
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render `template_name` (relative to `templates/prompts/`) with `ctx`.
pub fn render_template(
    template_name: &str,
    ctx: &HashMap<&str, Value>,
) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    let render_ctx = Value::from_iter(ctx.iter().map(|(k, v)| (*k, v.clone())));

    template
        .render(render_ctx)
        .map(|rendered| rendered.trim().to_string())
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_exists(template_name: &str) -> bool {
        get_environment().get_template(template_name).is_ok()
    }

    #[test]
    fn test_builtin_templates_are_registered() {
        for (name, _) in BUILTIN_TEMPLATES {
            assert!(template_exists(name), "{} missing", name);
        }
        assert!(!template_exists("definitely_not_a_real_template.jinja"));
    }

    #[test]
    fn test_render_missing_template() {
        let result = render_template("nonexistent.jinja", &HashMap::new());
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_render_review_reply_branches_on_rating() {
        let mut ctx: HashMap<&str, Value> = HashMap::new();
        ctx.insert("business_name", Value::from("Kopi Senja"));
        ctx.insert("reviewer_name", Value::from("Rina"));
        ctx.insert("review_text", Value::from("Cold coffee and a long wait."));
        ctx.insert("rating", Value::from(1));
        ctx.insert("max_words", Value::from(120));

        let rendered = render_template("ai/review_reply.jinja", &ctx).unwrap();
        assert!(rendered.contains("Kopi Senja"));
        assert!(rendered.contains("Apologise"));

        ctx.insert("rating", Value::from(5));
        let rendered = render_template("ai/review_reply.jinja", &ctx).unwrap();
        assert!(rendered.contains("Thank them warmly"));
    }
}
