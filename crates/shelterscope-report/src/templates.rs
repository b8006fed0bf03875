//! Compiled-in minijinja templates.

use minijinja::Environment;
use serde::Serialize;
use shelterscope_common::{Result, ShelterError};

pub const MAP_TEMPLATE: &str = "map.html";
pub const SITE_REPORT_TEMPLATE: &str = "site_report.html";

const MAP_HTML: &str = include_str!("../templates/map.html");
const SITE_REPORT_HTML: &str = include_str!("../templates/site_report.html");

/// Environment with every report template registered. `.html` names turn
/// on HTML auto-escaping.
pub fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.add_template(MAP_TEMPLATE, MAP_HTML).map_err(template_error)?;
    env.add_template(SITE_REPORT_TEMPLATE, SITE_REPORT_HTML).map_err(template_error)?;
    Ok(env)
}

pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<String> {
    let env = environment()?;
    let template = env.get_template(name).map_err(template_error)?;
    template.render(ctx).map_err(template_error)
}

/// JSON for embedding inside a `<script>` block.
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn template_error(e: minijinja::Error) -> ShelterError {
    ShelterError::Template(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_compile() {
        let env = environment().unwrap();
        assert!(env.get_template(MAP_TEMPLATE).is_ok());
        assert!(env.get_template(SITE_REPORT_TEMPLATE).is_ok());
    }

    #[test]
    fn test_script_json_cannot_close_the_script() {
        let out = script_json(&serde_json::json!({"name": "</script><b>"})).unwrap();
        assert!(!out.contains("</script>"));
    }
}
