use crate::constants::JOB_ID_PREFIX;
use crate::error::ParseError;

/// Identifier of a job, `jobid_<uuid v7>`. Used as the unique id of the
/// job's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

#[allow(clippy::new_without_default)]
impl JobId {
    /// Generate a new time-sortable job identifier.
    pub fn new() -> Self {
        Self(format!("{JOB_ID_PREFIX}{}", uuid::Uuid::now_v7()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = ParseError;

    /// Accepts only ids of the shape produced by [`JobId::new`]: the
    /// `jobid_` prefix followed by a v7 uuid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(JOB_ID_PREFIX)
            .ok_or_else(|| ParseError::InvalidJobId(s.to_string()))?;
        let uuid =
            uuid::Uuid::parse_str(raw).map_err(|_| ParseError::InvalidJobId(s.to_string()))?;
        if uuid.get_version() != Some(uuid::Version::SortRand) {
            return Err(ParseError::InvalidJobId(s.to_string()));
        }
        Ok(Self(format!("{JOB_ID_PREFIX}{uuid}")))
    }
}
