use sqlx::SqlitePool;
use tera::Tera;

pub mod config;
pub mod db;
pub mod errors;
pub mod flash;
pub mod models;
pub mod routes;
pub mod utils;

use errors::AppError;

/// Shared context handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub templates: Tera,
}

pub fn load_templates(dir: &str) -> Result<Tera, AppError> {
    let mut tera = Tera::new(&format!("{}/**/*", dir.trim_end_matches('/'))).map_err(|e| {
        log::error!("Parsing error(s): {}", e);
        AppError::TemplateError(e)
    })?;
    tera.autoescape_on(vec![".html"]);
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn templates_load_with_html_autoescape() {
        let tera = load_templates(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/")).unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        for name in ["base.html", "index.html", "login.html"] {
            assert!(names.contains(&name), "missing {name}");
        }

        let mut context = tera::Context::new();
        context.insert("title", "<Home>");
        context.insert("messages", &Vec::<String>::new());
        context.insert("user", &HashMap::from([("username", "Adminator")]));
        context.insert("directories", &Vec::<String>::new());
        let page = tera.render("index.html", &context).unwrap();
        assert!(page.contains("&lt;Home&gt;"));
    }
}
