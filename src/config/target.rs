//! Push target configuration string
//!
//! `<endpoint-url>[,<tag1>=<v1>,<tag2>=<v2>,...]`

/// Destination and tags for one pusher instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub endpoint: String,
    /// Raw tag string, written verbatim into line-protocol records
    pub tags: String,
}

impl ExporterConfig {
    /// Split the configuration string at its first comma
    ///
    /// Nothing is validated here. A malformed URL or tag list shows up as a
    /// send failure later, so this never fails.
    pub fn parse(arg: &str) -> Self {
        let (endpoint, tags) = arg.split_once(',').unwrap_or((arg, ""));
        Self {
            endpoint: endpoint.to_string(),
            tags: tags.to_string(),
        }
    }
}
