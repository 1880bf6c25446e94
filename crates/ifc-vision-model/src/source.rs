// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Source descriptors - where an IFC payload comes from

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Origin of an IFC payload
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SourceOrigin {
    /// A file dropped onto the viewport
    LocalFile,
    /// A file chosen in a cloud picker, fetched by link
    CloudLink,
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOrigin::LocalFile => f.write_str("local file"),
            SourceOrigin::CloudLink => f.write_str("cloud link"),
        }
    }
}

/// Describes a payload before and after resolution
///
/// Cloud origins only learn their real name and size once the picker
/// returns, so the descriptor is refreshed from [`ResolvedSource`].
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub origin: SourceOrigin,
    pub display_name: String,
    pub size_bytes: Option<u64>,
}

impl SourceDescriptor {
    pub fn new(origin: SourceOrigin, display_name: impl Into<String>, size_bytes: Option<u64>) -> Self {
        Self {
            origin,
            display_name: display_name.into(),
            size_bytes,
        }
    }
}

/// Resolved payload contents
#[derive(Clone, Debug)]
pub enum Payload {
    /// Bytes already in memory
    Bytes(Arc<[u8]>),
    /// A direct-download reference still to be fetched
    Url(String),
}

impl Payload {
    pub fn is_url(&self) -> bool {
        matches!(self, Payload::Url(_))
    }
}

/// Outcome of a successful source resolution
#[derive(Clone, Debug)]
pub struct ResolvedSource {
    pub descriptor: SourceDescriptor,
    pub payload: Payload,
}

impl ResolvedSource {
    pub fn bytes(descriptor: SourceDescriptor, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            descriptor,
            payload: Payload::Bytes(bytes.into()),
        }
    }

    pub fn url(descriptor: SourceDescriptor, url: impl Into<String>) -> Self {
        Self {
            descriptor,
            payload: Payload::Url(url.into()),
        }
    }
}
