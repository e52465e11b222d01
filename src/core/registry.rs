use crate::domain::ports::TicketTemplate;
use crate::utils::error::{Result, TicketError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 依範本名稱索引的渲染能力，啟動時即固定
#[derive(Default, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Arc<dyn TicketTemplate>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 註冊時即檢查名稱與副檔名，重複名稱直接拒絕
    pub fn register(&mut self, template: Arc<dyn TicketTemplate>) -> Result<()> {
        let name = template.name().trim().to_string();
        if name.is_empty() {
            return Err(TicketError::InvalidConfigValueError {
                field: "template.name".to_string(),
                value: name,
                reason: "Template name cannot be empty".to_string(),
            });
        }
        if template.extension().is_empty() || template.extension().contains('.') {
            return Err(TicketError::InvalidConfigValueError {
                field: "template.extension".to_string(),
                value: template.extension().to_string(),
                reason: "Extension must be a bare, non-empty suffix".to_string(),
            });
        }
        if self.templates.contains_key(&name) {
            return Err(TicketError::InvalidConfigValueError {
                field: "template.name".to_string(),
                value: name,
                reason: "Template already registered".to_string(),
            });
        }

        tracing::debug!("Registered ticket template '{}'", name);
        self.templates.insert(name, template);
        Ok(())
    }

    pub fn with(mut self, template: Arc<dyn TicketTemplate>) -> Result<Self> {
        self.register(template)?;
        Ok(self)
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn TicketTemplate>> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TicketError::ConfigurationError {
                template: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// 已註冊範本的副檔名 (不重複)
    pub fn extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .templates
            .values()
            .map(|template| template.extension().to_string())
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .finish()
    }
}
