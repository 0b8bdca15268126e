// File-backed template repository: <root>/<scope>/<name>.toml
use crate::application::errors::RepositoryError;
use crate::application::template_repository::TemplateRepository;
use crate::domain::template::Template;
use anyhow::Context;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const TEMPLATE_EXTENSION: &str = "toml";

#[derive(Debug, Clone)]
pub struct FileTemplateRepository {
    root: PathBuf,
}

impl FileTemplateRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn template_path(&self, scope: &str, name: &str) -> PathBuf {
        self.root
            .join(scope)
            .join(format!("{}.{}", name, TEMPLATE_EXTENSION))
    }

    async fn read_template(path: &Path, name: &str) -> anyhow::Result<Template> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        let mut template: Template = toml::from_str(&content)
            .with_context(|| format!("Failed to parse template {}", path.display()))?;
        if template.name.is_empty() {
            template.name = name.to_string();
        }
        Ok(template)
    }
}

// Names are path components; anything that could escape the scope directory is unknown
fn is_safe_component(value: &str) -> bool {
    !value.is_empty() && !value.contains(['/', '\\']) && value != "." && value != ".."
}

#[async_trait]
impl TemplateRepository for FileTemplateRepository {
    async fn get_template(&self, scope: &str, name: &str) -> Result<Template, RepositoryError> {
        let not_found = || RepositoryError::NotFound {
            scope: scope.to_string(),
            name: name.to_string(),
        };
        if !is_safe_component(scope) || !is_safe_component(name) {
            return Err(not_found());
        }

        let path = self.template_path(scope, name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(not_found()),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(e) => {
                return Err(RepositoryError::Backend(
                    anyhow::Error::new(e).context(format!("Cannot access {}", path.display())),
                ))
            }
        }

        tracing::debug!("Loading template {} from {}", name, path.display());
        Ok(Self::read_template(&path, name).await?)
    }

    async fn get_all_templates(
        &self,
        scope: &str,
    ) -> Result<BTreeMap<String, Template>, RepositoryError> {
        let mut templates = BTreeMap::new();
        if !is_safe_component(scope) {
            return Ok(templates);
        }

        let dir = self.root.join(scope);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(templates),
            Err(e) => {
                return Err(RepositoryError::Backend(
                    anyhow::Error::new(e).context(format!("Cannot list {}", dir.display())),
                ))
            }
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Cannot list {}", dir.display()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let template = Self::read_template(&path, stem).await?;
            templates.insert(template.name.clone(), template);
        }

        tracing::debug!("Loaded {} templates from scope {}", templates.len(), scope);
        Ok(templates)
    }
}
