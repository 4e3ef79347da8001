//! DTOs for the Diamiq API.
//!
//! # Design
//! Only the shapes the client reasons about are typed: placeholders (needed
//! for payload validation) and generation results. Template records and the
//! ping body are returned as `serde_json::Value` because the client never
//! looks inside them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named slot in a template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placeholder {
    pub key: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Placeholder {
    pub fn required(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            required: true,
            description: None,
        }
    }

    pub fn optional(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            required: false,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of `GET /templates/{id}/placeholders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceholderList {
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
}

/// Rendered document format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Docx,
}

/// Body of a successful `POST /documents/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResult {
    pub id: String,
    /// Time-limited download URL.
    pub url: String,
    pub format: OutputFormat,
    #[serde(rename = "expiresAt")]
    pub expires_at: String,
}

/// Filters for `Client::get_templates`. Unset filters are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateFilters {
    pub search: Option<String>,
    pub tags: Vec<String>,
}

impl TemplateFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Encoded query string without the leading `?`; empty when no filter applies.
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.append_pair("search", search);
        }
        if !self.tags.is_empty() {
            query.append_pair("tags", &self.tags.join(","));
        }
        query.finish()
    }
}

/// Options merged into the top level of the generate request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputFormat>,
    /// Additional top-level fields passed through verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(mut self, format: OutputFormat) -> Self {
        self.output = Some(format);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_defaults_to_optional() {
        let p: Placeholder = serde_json::from_str(r#"{"key":"name"}"#).unwrap();
        assert_eq!(p, Placeholder::optional("name"));
    }

    #[test]
    fn placeholder_list_tolerates_missing_field() {
        let list: PlaceholderList = serde_json::from_str("{}").unwrap();
        assert!(list.placeholders.is_empty());
    }

    #[test]
    fn generation_result_uses_camel_case_expiry() {
        let result: GenerationResult = serde_json::from_value(json!({
            "id": "d1",
            "url": "https://x/d1",
            "format": "docx",
            "expiresAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(result.format, OutputFormat::Docx);
        assert_eq!(result.expires_at, "2025-01-01T00:00:00Z");
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result: Result<GenerationResult, _> = serde_json::from_value(json!({
            "id": "d1", "url": "u", "format": "odt", "expiresAt": "t"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn empty_filters_produce_empty_query() {
        assert_eq!(TemplateFilters::new().to_query(), "");
        assert_eq!(TemplateFilters::new().tags(Vec::<String>::new()).to_query(), "");
    }

    #[test]
    fn filters_encode_search_and_joined_tags() {
        let query = TemplateFilters::new().search("invoice q1").tags(["a", "b"]).to_query();
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("search".to_string(), "invoice q1".to_string()),
                ("tags".to_string(), "a,b".to_string()),
            ]
        );
    }

    #[test]
    fn tags_only_query_has_no_search() {
        let query = TemplateFilters::new().tag("hr").to_query();
        assert_eq!(query, "tags=hr");
    }

    #[test]
    fn generate_options_flatten_into_top_level() {
        let options = GenerateOptions::new()
            .output(OutputFormat::Pdf)
            .field("filename", "report");
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({"output": "pdf", "filename": "report"})
        );
        assert_eq!(serde_json::to_value(GenerateOptions::new()).unwrap(), json!({}));
    }
}
