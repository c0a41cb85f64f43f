// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Resource locators for the dump1090 documents.

use std::fmt;
use std::path::PathBuf;

use reqwest::Url;
use thiserror::Error;

/// Errors raised while deriving resource locators.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource base is empty")]
    Empty,

    #[error("invalid resource URL '{base}': {reason}")]
    InvalidUrl { base: String, reason: String },
}

/// A location a JSON document can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Fetched over HTTP(S).
    Url(Url),
    /// Read from the local filesystem.
    File(PathBuf),
}

impl Resource {
    /// Classify `location` as a URL (`http://` or `https://` prefix) or a
    /// filesystem path.
    pub fn parse(location: &str) -> Result<Self, ResourceError> {
        if location.is_empty() {
            return Err(ResourceError::Empty);
        }
        if is_network_location(location) {
            let url = Url::parse(location).map_err(|e| ResourceError::InvalidUrl {
                base: location.to_string(),
                reason: e.to_string(),
            })?;
            Ok(Self::Url(url))
        } else {
            Ok(Self::File(PathBuf::from(location)))
        }
    }

    /// Whether fetching this resource performs a network request.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn is_network_location(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Which dump1090 document a resource refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Receiver,
    Stats,
    Aircraft,
}

impl Document {
    /// Every document, in polling order.
    pub const ALL: [Self; 3] = [Self::Receiver, Self::Stats, Self::Aircraft];

    /// Short name, used as a log context and metric label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receiver => "receiver",
            Self::Stats => "stats",
            Self::Aircraft => "aircraft",
        }
    }

    /// File name relative to the resource base.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Receiver => "receiver.json",
            Self::Stats => "stats.json",
            Self::Aircraft => "aircraft.json",
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locators for the three documents, derived once from a base location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSet {
    base: String,
    receiver: Resource,
    stats: Resource,
    aircraft: Resource,
}

impl ResourceSet {
    /// Derive the document locators from `base`, which is either a URL such
    /// as `http://host:8080/data` or a directory path.
    pub fn new(base: &str) -> Result<Self, ResourceError> {
        let trimmed = base.trim();
        let trimmed = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        if trimmed.is_empty() {
            return Err(ResourceError::Empty);
        }

        // Validate the base itself so a malformed URL is reported as such.
        Resource::parse(trimmed)?;

        let join = |doc: Document| {
            let location = if trimmed == "/" {
                format!("/{}", doc.file_name())
            } else {
                format!("{trimmed}/{}", doc.file_name())
            };
            Resource::parse(&location)
        };

        Ok(Self {
            base: trimmed.to_string(),
            receiver: join(Document::Receiver)?,
            stats: join(Document::Stats)?,
            aircraft: join(Document::Aircraft)?,
        })
    }

    /// The base location the set was derived from.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Locator for the given document.
    #[must_use]
    pub fn get(&self, doc: Document) -> &Resource {
        match doc {
            Document::Receiver => &self.receiver,
            Document::Stats => &self.stats,
            Document::Aircraft => &self.aircraft,
        }
    }

    #[must_use]
    pub fn receiver(&self) -> &Resource {
        &self.receiver
    }

    #[must_use]
    pub fn stats(&self) -> &Resource {
        &self.stats
    }

    #[must_use]
    pub fn aircraft(&self) -> &Resource {
        &self.aircraft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_base() {
        let set = ResourceSet::new("http://localhost:8080/data/").unwrap();
        assert_eq!(set.base(), "http://localhost:8080/data");
        assert_eq!(set.receiver().to_string(), "http://localhost:8080/data/receiver.json");
        assert_eq!(set.stats().to_string(), "http://localhost:8080/data/stats.json");
        assert_eq!(set.aircraft().to_string(), "http://localhost:8080/data/aircraft.json");
        assert!(set.aircraft().is_network());
    }

    #[test]
    fn test_directory_base() {
        let set = ResourceSet::new("/run/dump1090-fa").unwrap();
        assert_eq!(
            set.get(Document::Aircraft),
            &Resource::File(PathBuf::from("/run/dump1090-fa/aircraft.json"))
        );
        assert!(!set.receiver().is_network());
    }

    #[test]
    fn test_invalid_bases() {
        assert!(matches!(ResourceSet::new(""), Err(ResourceError::Empty)));
        assert!(matches!(ResourceSet::new("   "), Err(ResourceError::Empty)));
        assert!(matches!(
            ResourceSet::new("http://localhost:99999/data"),
            Err(ResourceError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_document_names() {
        assert_eq!(Document::Receiver.as_str(), "receiver");
        assert_eq!(Document::Stats.file_name(), "stats.json");
        assert_eq!(Document::Aircraft.to_string(), "aircraft");
    }
}
