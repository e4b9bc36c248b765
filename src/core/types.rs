//! Shared domain types.

use crate::core::error::{Result, SeriesError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the service that emitted a metric batch
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Longest accepted name in bytes. Leaves room for the longest series
    /// file suffix within the usual 255-byte file name limit.
    pub const MAX_LEN: usize = 200;

    /// Creates a new ServiceName after validation
    pub fn new(name: String) -> Result<Self> {
        if name.is_empty() {
            return Err(SeriesError::InvalidServiceName("name is empty".to_string()));
        }
        if name.len() > Self::MAX_LEN {
            return Err(SeriesError::InvalidServiceName(format!(
                "name is {} bytes, limit is {}",
                name.len(),
                Self::MAX_LEN
            )));
        }
        Ok(ServiceName(name))
    }

    /// Returns the string representation of the service name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name with path separators replaced, safe to embed in a file name
    pub fn file_component(&self) -> String {
        self.0.replace(['/', '\\'], "_")
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata describing the producer of a metric batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMetadata {
    /// Value of the `service.name` resource attribute
    pub service_name: ServiceName,
}

impl ServiceMetadata {
    /// Build metadata for a named service
    pub fn new(service_name: &str) -> Result<Self> {
        Ok(Self {
            service_name: ServiceName::new(service_name.to_string())?,
        })
    }
}
