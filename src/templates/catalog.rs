//! Template sources with fallback.

use super::{parse_templates, Template};
use crate::error::{Result, StoreError};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Somewhere template CSV text can be read from.
pub trait TemplateSource: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<String>;
}

/// Template text held in memory (e.g. compiled in with `include_str!`).
pub struct StaticSource {
    text: String,
}

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TemplateSource for StaticSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    fn fetch(&self) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// Template CSV on disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TemplateSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn fetch(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Template CSV over HTTP (e.g. a published spreadsheet export).
pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TemplateSource for HttpSource {
    fn describe(&self) -> String {
        format!("url {}", self.url)
    }

    fn fetch(&self) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Http(format!("HTTP {}", status)));
        }
        Ok(response.text()?)
    }
}

/// Preferred source, then fallback, then nothing.
pub struct TemplateCatalog {
    primary: Box<dyn TemplateSource>,
    fallback: Option<Box<dyn TemplateSource>>,
}

impl TemplateCatalog {
    pub fn new(primary: impl TemplateSource + 'static) -> Self {
        Self {
            primary: Box::new(primary),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: impl TemplateSource + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Load templates. Never fails: if every source errors the list is
    /// empty.
    pub fn load(&self) -> Vec<Template> {
        let sources = std::iter::once(&self.primary).chain(self.fallback.as_ref());

        for source in sources {
            match source.fetch() {
                Ok(text) => {
                    let templates = parse_templates(&text);
                    info!(source = %source.describe(), count = templates.len(), "loaded templates");
                    return templates;
                }
                Err(e) => {
                    warn!(source = %source.describe(), error = %e, "template source unavailable");
                }
            }
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "name,price,cycle,category,icon\nNetflix,1490,monthly,Video,n.svg";

    struct Failing;

    impl TemplateSource for Failing {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        fn fetch(&self) -> Result<String> {
            Err(StoreError::Http("unreachable".into()))
        }
    }

    #[test]
    fn test_primary_used_when_available() {
        let catalog = TemplateCatalog::new(StaticSource::new(SAMPLE))
            .with_fallback(StaticSource::new("name,price,cycle\nOther,1,monthly"));
        let templates = catalog.load();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "Netflix");
    }

    #[test]
    fn test_falls_back() {
        let catalog = TemplateCatalog::new(Failing).with_fallback(StaticSource::new(SAMPLE));
        assert_eq!(catalog.load()[0].name, "Netflix");
    }

    #[test]
    fn test_both_fail_is_empty() {
        let catalog = TemplateCatalog::new(Failing).with_fallback(Failing);
        assert!(catalog.load().is_empty());

        let catalog = TemplateCatalog::new(Failing);
        assert!(catalog.load().is_empty());
    }

    #[test]
    fn test_file_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("templates.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog = TemplateCatalog::new(FileSource::new(dir.path().join("missing.csv")))
            .with_fallback(FileSource::new(&path));
        assert_eq!(catalog.load().len(), 1);
    }

    #[test]
    fn test_unreachable_http_falls_back() {
        let primary = HttpSource::new("http://127.0.0.1:9/templates.csv")
            .with_timeout(Duration::from_millis(500));
        let catalog = TemplateCatalog::new(primary).with_fallback(StaticSource::new(SAMPLE));
        assert_eq!(catalog.load().len(), 1);
    }
}
