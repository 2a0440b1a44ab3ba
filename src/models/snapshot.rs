//! Per-request parameter snapshot.

/// Immutable view of everything a request carried that participates in
/// signing and deduplication: query parameters, decoded JSON body fields,
/// and digests of uploaded files.
///
/// Built exactly once when the request enters the pipeline (the body
/// stream must already be buffered so framework deserialization can read
/// it again later) and read-only afterward. Insertion order of each
/// source is preserved; it matters for the fingerprinting join mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSnapshot {
    url_params: Vec<(String, String)>,
    body_fields: Vec<(String, String)>,
    body_scalar: Option<String>,
    multipart_digests: Vec<(String, String)>,
}

impl ParamSnapshot {
    pub fn builder() -> ParamSnapshotBuilder {
        ParamSnapshotBuilder::default()
    }

    pub fn url_params(&self) -> &[(String, String)] {
        &self.url_params
    }

    pub fn body_fields(&self) -> &[(String, String)] {
        &self.body_fields
    }

    pub fn body_scalar(&self) -> Option<&str> {
        self.body_scalar.as_deref()
    }

    pub fn multipart_digests(&self) -> &[(String, String)] {
        &self.multipart_digests
    }

    pub fn is_empty(&self) -> bool {
        self.url_params.is_empty()
            && self.body_fields.is_empty()
            && self.body_scalar.is_none()
            && self.multipart_digests.is_empty()
    }
}

/// Builder for [`ParamSnapshot`]. Duplicate keys are not checked here;
/// the canonicalizer reports collisions when the sources are merged.
#[derive(Debug, Default)]
pub struct ParamSnapshotBuilder {
    snapshot: ParamSnapshot,
}

impl ParamSnapshotBuilder {
    pub fn url_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot.url_params.push((key.into(), value.into()));
        self
    }

    pub fn body_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.snapshot.body_fields.push((key.into(), value.into()));
        self
    }

    /// Raw textual form of a non-object JSON body. Mutually exclusive with
    /// body fields; setting it clears any fields added so far.
    pub fn body_scalar(mut self, value: impl Into<String>) -> Self {
        self.snapshot.body_fields.clear();
        self.snapshot.body_scalar = Some(value.into());
        self
    }

    pub fn multipart_digest(mut self, field: impl Into<String>, digest: impl Into<String>) -> Self {
        self.snapshot
            .multipart_digests
            .push((field.into(), digest.into()));
        self
    }

    pub fn build(self) -> ParamSnapshot {
        self.snapshot
    }
}
