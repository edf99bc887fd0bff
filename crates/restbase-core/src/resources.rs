//! Resource manifest loading.
//!
//! The manifest is a JSON object mapping each resource name to an array of
//! sample documents. Every declared resource is served as its own
//! collection; the samples are what `reset` seeds it with.

use crate::config::ServerConfig;
use crate::error::{RestbaseError, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// A JSON object stored as a document body.
pub type DocumentBody = Map<String, Value>;

/// One declared resource and its seed data.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDefinition {
    pub name: String,
    pub samples: Vec<DocumentBody>,
}

/// The set of resources served by the application, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceRegistry {
    resources: Vec<ResourceDefinition>,
}

impl ResourceRegistry {
    /// Load and validate a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RestbaseError::Io {
            message: format!("Failed to read resource manifest: {}", e),
            path: Some(path.to_path_buf()),
            source: Some(e),
        })?;

        let registry = Self::from_json_str(&content).map_err(|e| match e {
            RestbaseError::Json { message, source } => RestbaseError::Json {
                message: format!("Failed to parse {}: {}", path.display(), message),
                source,
            },
            other => other,
        })?;

        info!(
            "Loaded {} resources from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parse and validate a manifest from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Validate an already parsed manifest.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(entries) = value else {
            return Err(RestbaseError::Config {
                message: "resource manifest must be a JSON object".into(),
            });
        };

        let mut resources = Vec::with_capacity(entries.len());
        for (name, samples) in entries {
            validate_name(&name)?;

            let Value::Array(items) = samples else {
                return Err(RestbaseError::Config {
                    message: format!("resource '{}' must map to an array of documents", name),
                });
            };

            let mut documents = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(body) => documents.push(body),
                    _ => {
                        return Err(RestbaseError::Config {
                            message: format!(
                                "sample {} of resource '{}' is not a JSON object",
                                index, name
                            ),
                        })
                    }
                }
            }

            debug!("Registered resource '{}' with {} samples", name, documents.len());
            resources.push(ResourceDefinition {
                name,
                samples: documents,
            });
        }

        Ok(Self { resources })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.iter().map(|r| r.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.resources.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.iter().any(|r| r.name == name)
    }

    /// Seed documents for a resource, if it is declared.
    pub fn samples(&self, name: &str) -> Option<&[DocumentBody]> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.samples.as_slice())
    }

    /// Look up a resource, failing with `UnknownResource` if it is not declared.
    pub fn require(&self, name: &str) -> Result<&ResourceDefinition> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| RestbaseError::UnknownResource {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RestbaseError::Config {
            message: "resource name must not be empty".into(),
        });
    }
    if name.contains('/') {
        return Err(RestbaseError::Config {
            message: format!("resource name '{}' must not contain '/'", name),
        });
    }
    if ServerConfig::RESERVED_ROUTES.contains(&name) {
        return Err(RestbaseError::Config {
            message: format!("resource name '{}' collides with a built-in route", name),
        });
    }
    Ok(())
}
