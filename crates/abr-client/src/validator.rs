//! JSON-Schema validation of incoming state documents.
//!
//! The schema is fetched and compiled at most once per validator. A fetch
//! or compile failure is not remembered, so the next call tries again.

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::ValidationError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::domain::error::{ClientError, ClientResult};
use crate::ports::outbound::{HttpMethod, StateTransport, TransportRequest};

/// Longest value or message excerpt kept in a violation line.
const PREVIEW_CHARS: usize = 80;

enum SchemaSource {
    Remote {
        url: String,
        transport: Arc<dyn StateTransport>,
    },
    Inline(Value),
}

/// Validates state documents against one schema.
pub struct SchemaValidator {
    source: SchemaSource,
    compiled: OnceCell<Arc<jsonschema::Validator>>,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("schema", &self.schema_url().unwrap_or("<inline>"))
            .field("compiled", &self.compiled.initialized())
            .finish()
    }
}

impl SchemaValidator {
    /// Validator whose schema is fetched from `url` on first use.
    pub fn new(url: impl Into<String>, transport: Arc<dyn StateTransport>) -> Self {
        Self {
            source: SchemaSource::Remote {
                url: url.into(),
                transport,
            },
            compiled: OnceCell::new(),
        }
    }

    /// Validator around an in-memory schema.
    pub fn from_schema(schema: Value) -> Self {
        Self {
            source: SchemaSource::Inline(schema),
            compiled: OnceCell::new(),
        }
    }

    pub fn schema_url(&self) -> Option<&str> {
        match &self.source {
            SchemaSource::Remote { url, .. } => Some(url),
            SchemaSource::Inline(_) => None,
        }
    }

    /// Whether the schema has been compiled.
    pub fn is_loaded(&self) -> bool {
        self.compiled.initialized()
    }

    /// Return `data` unchanged if it conforms, otherwise every violation
    /// as one line of the error text: location, the failed keyword's
    /// parameters and, for scalars, the offending value.
    pub async fn validate(&self, data: Value) -> ClientResult<Value> {
        let validator = self.compiled().await?;

        let violations: Vec<String> = validator
            .iter_errors(&data)
            .map(|error| describe_violation(&error))
            .collect();

        if violations.is_empty() {
            Ok(data)
        } else {
            debug!(count = violations.len(), "State failed schema validation");
            Err(ClientError::Validation(violations.join("\n")))
        }
    }

    async fn compiled(&self) -> ClientResult<Arc<jsonschema::Validator>> {
        self.compiled
            .get_or_try_init(|| async {
                let schema = self.load_schema().await?;
                let validator = jsonschema::validator_for(&schema)
                    .map_err(|e| ClientError::Schema(format!("schema does not compile: {e}")))?;
                info!(schema = self.schema_url().unwrap_or("<inline>"), "Compiled state schema");
                Ok::<_, ClientError>(Arc::new(validator))
            })
            .await
            .cloned()
    }

    async fn load_schema(&self) -> ClientResult<Value> {
        match &self.source {
            SchemaSource::Inline(schema) => Ok(schema.clone()),
            SchemaSource::Remote { url, transport } => {
                debug!(%url, "Fetching state schema");
                let response = transport
                    .send(TransportRequest::absolute(HttpMethod::Get, url.as_str()))
                    .await
                    .map_err(|e| ClientError::Schema(format!("{url}: {e}")))?;
                if !response.is_success() {
                    return Err(ClientError::Schema(format!(
                        "{url} returned {}: {}",
                        response.status,
                        response.text()
                    )));
                }
                serde_json::from_slice(&response.body)
                    .map_err(|e| ClientError::Schema(format!("{url} is not JSON: {e}")))
            }
        }
    }
}

fn describe_violation(error: &ValidationError<'_>) -> String {
    let location = error.instance_path.to_string();
    let location = if location.is_empty() {
        "(root)".to_string()
    } else {
        location
    };

    let detail = match &error.kind {
        ValidationErrorKind::Required { property } => {
            format!("missing required property {property}")
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            format!("unexpected properties {}", preview(&unexpected.join(", ")))
        }
        ValidationErrorKind::Type { kind } => format!("expected type {}", type_names(kind)),
        ValidationErrorKind::Enum { options } => {
            format!("expected one of {}", preview(&options.to_string()))
        }
        _ => preview(&error.to_string()),
    };

    match error.instance.as_ref() {
        Value::Object(_) | Value::Array(_) => format!("{location}: {detail}"),
        scalar => format!("{location}: {detail} (value: {})", preview(&scalar.to_string())),
    }
}

fn type_names(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Single(primitive) => primitive.to_string(),
        TypeKind::Multiple(primitives) => (*primitives)
            .into_iter()
            .map(|primitive| primitive.to_string())
            .collect::<Vec<_>>()
            .join(" or "),
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
