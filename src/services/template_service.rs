//! Renderizado de plantillas de correo
//!
//! Las plantillas HTML viven en disco y son estáticas en deploy; el
//! contenido se lee una vez y queda en una caché en memoria compartida.
//! El servicio se construye en el arranque y viaja dentro del estado de
//! la aplicación.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::utils::errors::AppError;

#[derive(Clone)]
pub struct TemplateService {
    dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl TemplateService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, name: &str) -> Result<String, AppError> {
        {
            let cache = self.cache.read().await;
            if let Some(content) = cache.get(name) {
                return Ok(content.clone());
            }
        }

        let path = self.dir.join(format!("{}.html", name));
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Error leyendo plantilla {}: {}", name, e)))?;

        let mut cache = self.cache.write().await;
        cache.insert(name.to_string(), content.clone());
        Ok(content)
    }

    /// Renderizar una plantilla sustituyendo cada `{{VAR}}`
    pub async fn render(&self, name: &str, variables: &[(&str, String)]) -> Result<String, AppError> {
        let template = self.load_template(name).await?;
        Ok(compile(&template, variables))
    }
}

fn compile(template: &str, variables: &[(&str, String)]) -> String {
    let mut compiled = template.to_string();
    for (key, value) in variables {
        compiled = compiled.replace(&format!("{{{{{}}}}}", key), value);
    }
    compiled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_replaces_all_occurrences() {
        let out = compile(
            "Hola {{NAME}}, tu visita es el {{DATE}}. Gracias {{NAME}}.",
            &[("NAME", "Ana".to_string()), ("DATE", "2026-02-10".to_string())],
        );
        assert_eq!(out, "Hola Ana, tu visita es el 2026-02-10. Gracias Ana.");
    }

    #[test]
    fn test_compile_leaves_unknown_placeholders() {
        let out = compile("{{KNOWN}} y {{UNKNOWN}}", &[("KNOWN", "ok".to_string())]);
        assert_eq!(out, "ok y {{UNKNOWN}}");
    }

    #[tokio::test]
    async fn test_cache_serves_after_first_read() {
        let dir = std::env::temp_dir().join(format!("tpl-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("saludo.html"), "Hola {{NAME}}").unwrap();

        let service = TemplateService::new(&dir);
        let first = service.render("saludo", &[("NAME", "Ana".to_string())]).await.unwrap();
        assert_eq!(first, "Hola Ana");

        // Tras el primer render el archivo ya no se lee del disco
        std::fs::remove_file(dir.join("saludo.html")).unwrap();
        let second = service.render("saludo", &[("NAME", "Luis".to_string())]).await.unwrap();
        assert_eq!(second, "Hola Luis");
    }
}
