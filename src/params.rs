//! Request parameter bundles and the policy used to cast them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Record;

/// One named part of a parameter bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Path,
    Query,
    Headers,
    Body,
}

impl Section {
    /// Sections in casting order.
    pub const ALL: [Section; 4] = [Section::Path, Section::Query, Section::Headers, Section::Body];

    pub fn name(self) -> &'static str {
        match self {
            Section::Path => "path",
            Section::Query => "query",
            Section::Headers => "headers",
            Section::Body => "body",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters gathered from a request by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Record>,
}

impl ApiParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, section: Section) -> Option<&Record> {
        match section {
            Section::Path => self.path.as_ref(),
            Section::Query => self.query.as_ref(),
            Section::Headers => self.headers.as_ref(),
            Section::Body => self.body.as_ref(),
        }
    }

    pub fn section_mut(&mut self, section: Section) -> Option<&mut Record> {
        match section {
            Section::Path => self.path.as_mut(),
            Section::Query => self.query.as_mut(),
            Section::Headers => self.headers.as_mut(),
            Section::Body => self.body.as_mut(),
        }
    }

    /// Replaces one section.
    pub fn set_section(&mut self, section: Section, record: Record) -> &mut Self {
        let slot = match section {
            Section::Path => &mut self.path,
            Section::Query => &mut self.query,
            Section::Headers => &mut self.headers,
            Section::Body => &mut self.body,
        };
        *slot = Some(record);
        self
    }
}

/// What to do with a key that names no field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    /// Fail with a lookup error.
    Reject,
    /// Skip the key.
    Ignore,
}

/// Per-section handling of unknown keys during a bulk cast.
///
/// By default `headers` ignores unknown keys, since requests carry headers
/// outside any schema, and every other section rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastOptions {
    pub path: UnknownKeys,
    pub query: UnknownKeys,
    pub headers: UnknownKeys,
    pub body: UnknownKeys,
}

impl Default for CastOptions {
    fn default() -> Self {
        Self {
            path: UnknownKeys::Reject,
            query: UnknownKeys::Reject,
            headers: UnknownKeys::Ignore,
            body: UnknownKeys::Reject,
        }
    }
}

impl CastOptions {
    /// Rejects unknown keys everywhere, headers included.
    pub fn strict() -> Self {
        Self {
            headers: UnknownKeys::Reject,
            ..Default::default()
        }
    }

    pub fn policy(&self, section: Section) -> UnknownKeys {
        match section {
            Section::Path => self.path,
            Section::Query => self.query,
            Section::Headers => self.headers,
            Section::Body => self.body,
        }
    }

    pub fn set_policy(&mut self, section: Section, policy: UnknownKeys) -> &mut Self {
        match section {
            Section::Path => self.path = policy,
            Section::Query => self.query = policy,
            Section::Headers => self.headers = policy,
            Section::Body => self.body = policy,
        }
        self
    }
}
