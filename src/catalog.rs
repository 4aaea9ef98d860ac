use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One entry of the local question catalog (a LeetCode 75 subset shipped
/// as JSON alongside the binary).
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub hints: Vec<String>,
    pub url: String,
}

pub struct Catalog {
    questions: Vec<Question>,
}

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("No such file or directory: {}", path.display()))?;
        let questions: Vec<Question> =
            serde_json::from_str(&raw).context("Malformed question catalog JSON.")?;

        log::info!("Loaded {} catalog questions from {}.", questions.len(), path.display());
        Ok(Self { questions })
    }

    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn by_id(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// First question (in catalog order) whose id hasn't been posted yet.
    /// Once the catalog is exhausted this cycles back to the first entry
    /// rather than signalling exhaustion, matching the established cadence.
    pub fn next_unposted(&self, posted: &HashSet<u32>) -> Option<&Question> {
        self.questions
            .iter()
            .find(|q| !posted.contains(&q.id))
            .or_else(|| self.questions.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u32) -> Question {
        Question {
            id,
            title: format!("Problem {id}"),
            description: String::from("..."),
            difficulty: String::from("Easy"),
            category: String::new(),
            hints: vec![],
            url: format!("https://leetcode.com/problems/problem-{id}/"),
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_questions(vec![question(1), question(2), question(3)])
    }

    #[test]
    fn next_unposted_skips_posted_ids() {
        let posted = HashSet::from([1]);
        assert_eq!(catalog().next_unposted(&posted).unwrap().id, 2);
    }

    #[test]
    fn next_unposted_cycles_when_exhausted() {
        let posted = HashSet::from([1, 2, 3]);
        assert_eq!(catalog().next_unposted(&posted).unwrap().id, 1);
    }

    #[test]
    fn next_unposted_empty_catalog_is_none() {
        let empty = Catalog::from_questions(vec![]);
        assert!(empty.next_unposted(&HashSet::new()).is_none());
    }

    #[test]
    fn by_id_finds_catalog_entries() {
        assert_eq!(catalog().by_id(2).unwrap().title, "Problem 2");
        assert!(catalog().by_id(99).is_none());
    }
}
