//! Form providers: where the forms to work on come from.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{Form, LanguageCode};

#[derive(Debug, Error)]
pub enum FormProviderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid form data at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies the forms lacking usage examples for a language
#[async_trait]
pub trait FormProvider: Send + Sync {
    async fn fetch_forms(&self, language: &LanguageCode) -> Result<Vec<Form>, FormProviderError>;
}

/// Reads forms from a JSON array or a JSONL file, e.g. a saved query result
pub struct JsonFormProvider {
    path: PathBuf,
}

impl JsonFormProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(content: &str) -> Result<Vec<Form>, FormProviderError> {
        if content.trim_start().starts_with('[') {
            return serde_json::from_str(content)
                .map_err(|source| FormProviderError::Parse { line: 1, source });
        }

        let mut forms = Vec::new();
        for (index, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let form: Form = serde_json::from_str(line).map_err(|source| {
                FormProviderError::Parse {
                    line: index + 1,
                    source,
                }
            })?;
            forms.push(form);
        }
        Ok(forms)
    }
}

#[async_trait]
impl FormProvider for JsonFormProvider {
    async fn fetch_forms(&self, language: &LanguageCode) -> Result<Vec<Form>, FormProviderError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let parsed = Self::parse(&content)?;
        let total = parsed.len();

        let mut seen = HashSet::new();
        let mut forms = Vec::new();
        for form in parsed {
            if &form.language != language {
                continue;
            }
            if let Err(e) = form.validate() {
                warn!(error = %e, "Skipping invalid form");
                continue;
            }
            if seen.insert(form.id.clone()) {
                forms.push(form);
            }
        }

        info!(
            path = %self.path.display(),
            total,
            language = %language,
            forms = forms.len(),
            "Loaded forms"
        );
        Ok(forms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_json_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("forms.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "L1-F1", "representation": "rapport", "language": "sv"},
                {"id": "L2-F1", "representation": "report", "language": "en"},
                {"id": "L1-F1", "representation": "rapport", "language": "sv"},
                {"id": "L3-F1", "representation": " ", "language": "sv"}
            ]"#,
        )
        .unwrap();

        let provider = JsonFormProvider::new(&path);
        let forms = provider.fetch_forms(&LanguageCode::new("sv")).await.unwrap();
        let ids: Vec<&str> = forms.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["L1-F1"]);
    }

    #[tokio::test]
    async fn test_jsonl() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("forms.jsonl");
        std::fs::write(
            &path,
            "{\"id\": \"L1-F1\", \"representation\": \"rapport\", \"language\": \"sv\"}\n\n\
             {\"id\": \"L1-F2\", \"representation\": \"rapporten\", \"language\": \"sv\"}\n",
        )
        .unwrap();

        let provider = JsonFormProvider::new(&path);
        let forms = provider.fetch_forms(&LanguageCode::new("sv")).await.unwrap();
        assert_eq!(forms.len(), 2);
        assert_eq!(forms[1].representation, "rapporten");
    }

    #[tokio::test]
    async fn test_bad_line_reports_position() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("forms.jsonl");
        std::fs::write(
            &path,
            "{\"id\": \"L1-F1\", \"representation\": \"rapport\", \"language\": \"sv\"}\nnot json\n",
        )
        .unwrap();

        let provider = JsonFormProvider::new(&path);
        let result = provider.fetch_forms(&LanguageCode::new("sv")).await;
        assert!(matches!(result, Err(FormProviderError::Parse { line: 2, .. })));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let provider = JsonFormProvider::new("/nonexistent/forms.json");
        let result = provider.fetch_forms(&LanguageCode::new("sv")).await;
        assert!(matches!(result, Err(FormProviderError::Io(_))));
    }
}
