use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

/// Canonical pose identifier.
///
/// Labels from the classifier and identifiers from configuration come in
/// several spellings ("Hasta Utthanasana", "hasta_utthanasana", " hasta  utthanasana").
/// They all collapse to one lowercase, single-space form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PoseId(String);

impl PoseId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(canonicalize(raw.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn canonicalize(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

impl From<String> for PoseId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for PoseId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<PoseId> for String {
    fn from(id: PoseId) -> Self {
        id.0
    }
}

impl fmt::Display for PoseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered practice flow. Repeats are significant (the flow mirrors itself),
/// and the sequence is shared read-only for the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseSequence {
    poses: Arc<[PoseId]>,
}

impl PoseSequence {
    pub fn new<I, P>(poses: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PoseId>,
    {
        Self {
            poses: poses.into_iter().map(Into::into).collect(),
        }
    }

    /// The twelve-step Suryanamaskara flow.
    pub fn suryanamaskara() -> Self {
        Self::new([
            "pranamasana",
            "hasta utthanasana",
            "padahastasana",
            "ashwa sanchalanasana",
            "kumbhakasana",
            "ashtanga namaskara",
            "bhujangasana",
            "adho mukh svanasana",
            "ashwa sanchalanasana",
            "padahastasana",
            "hasta utthanasana",
            "pranamasana",
        ])
    }

    pub fn single(pose: impl Into<PoseId>) -> Self {
        Self::new([pose.into()])
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PoseId> {
        self.poses.get(index)
    }

    pub fn last_index(&self) -> usize {
        self.poses.len().saturating_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoseId> {
        self.poses.iter()
    }
}

impl Index<usize> for PoseSequence {
    type Output = PoseId;

    fn index(&self, index: usize) -> &Self::Output {
        &self.poses[index]
    }
}
