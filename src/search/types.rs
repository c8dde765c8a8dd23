use serde::{Deserialize, Serialize};

/// Which matcher produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Text,
    Vector,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Vector => "vector",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ranked match.
///
/// Scores are only comparable between hits of the same provenance: keyword hits
/// carry a BM25 relevance, vector hits a cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub item_id: String,
    pub score: f32,
    pub source: Provenance,
}

impl SearchHit {
    pub fn text(item_id: impl Into<String>, score: f32) -> Self {
        Self {
            item_id: item_id.into(),
            score,
            source: Provenance::Text,
        }
    }

    pub fn vector(item_id: impl Into<String>, score: f32) -> Self {
        Self {
            item_id: item_id.into(),
            score,
            source: Provenance::Vector,
        }
    }

    pub fn relabel(self, source: Provenance) -> Self {
        Self { source, ..self }
    }
}
