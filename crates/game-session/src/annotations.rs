//! Per-ply move annotations. At most one annotation per ply index.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationSymbol {
    Good,
    Brilliant,
    Mistake,
    Blunder,
    Interesting,
    Dubious,
}

impl AnnotationSymbol {
    pub const ALL: [AnnotationSymbol; 6] = [
        AnnotationSymbol::Good,
        AnnotationSymbol::Brilliant,
        AnnotationSymbol::Mistake,
        AnnotationSymbol::Blunder,
        AnnotationSymbol::Interesting,
        AnnotationSymbol::Dubious,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnnotationSymbol::Good => "!",
            AnnotationSymbol::Brilliant => "!!",
            AnnotationSymbol::Mistake => "?",
            AnnotationSymbol::Blunder => "??",
            AnnotationSymbol::Interesting => "!?",
            AnnotationSymbol::Dubious => "?!",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AnnotationSymbol::Good => "Good move",
            AnnotationSymbol::Brilliant => "Brilliant move",
            AnnotationSymbol::Mistake => "Mistake",
            AnnotationSymbol::Blunder => "Blunder",
            AnnotationSymbol::Interesting => "Interesting move",
            AnnotationSymbol::Dubious => "Dubious move",
        }
    }

    /// Display colour class for the symbol.
    pub fn color(self) -> &'static str {
        match self {
            AnnotationSymbol::Good => "text-emerald-500",
            AnnotationSymbol::Brilliant => "text-emerald-600",
            AnnotationSymbol::Mistake => "text-yellow-500",
            AnnotationSymbol::Blunder => "text-red-500",
            AnnotationSymbol::Interesting => "text-blue-500",
            AnnotationSymbol::Dubious => "text-orange-500",
        }
    }
}

impl fmt::Display for AnnotationSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationSymbol {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnnotationSymbol::ALL
            .into_iter()
            .find(|symbol| symbol.as_str() == s.trim())
            .ok_or_else(|| SessionError::InvalidAnnotation(format!("unknown symbol '{s}'")))
    }
}

impl Serialize for AnnotationSymbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AnnotationSymbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: Uuid,
    pub move_index: usize,
    pub symbol: AnnotationSymbol,
    pub comment: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    pub fn new(move_index: usize, symbol: AnnotationSymbol, comment: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            move_index,
            symbol,
            comment,
            color: symbol.color().to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    by_index: BTreeMap<usize, Annotation>,
}

impl Annotations {
    /// Store `annotation`, replacing whatever was on the same ply.
    pub fn upsert(&mut self, annotation: Annotation) -> Option<Annotation> {
        self.by_index.insert(annotation.move_index, annotation)
    }

    /// Change symbol and comment of an existing annotation, keeping its id.
    pub fn update(
        &mut self,
        id: Uuid,
        symbol: AnnotationSymbol,
        comment: String,
    ) -> Result<&Annotation, SessionError> {
        let entry = self
            .by_index
            .values_mut()
            .find(|a| a.id == id)
            .ok_or(SessionError::AnnotationNotFound(id))?;
        entry.symbol = symbol;
        entry.color = symbol.color().to_string();
        entry.comment = comment;
        Ok(entry)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Annotation, SessionError> {
        let index = self
            .by_index
            .values()
            .find(|a| a.id == id)
            .map(|a| a.move_index)
            .ok_or(SessionError::AnnotationNotFound(id))?;
        self.by_index
            .remove(&index)
            .ok_or(SessionError::AnnotationNotFound(id))
    }

    /// Drop every annotation on ply `len` or later.
    pub fn truncate(&mut self, len: usize) {
        self.by_index.split_off(&len);
    }

    pub fn clear(&mut self) {
        self.by_index.clear();
    }

    pub fn get(&self, move_index: usize) -> Option<&Annotation> {
        self.by_index.get(&move_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.by_index.values()
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Annotation> {
        self.iter().cloned().collect()
    }
}
