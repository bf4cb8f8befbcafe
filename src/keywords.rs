//! Keyword frequency counting and ranking.

use std::collections::HashMap;

use serde::Serialize;

/// Count how often each distinct token occurs.
pub fn count_tokens<S: AsRef<str>>(tokens: &[S]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token.as_ref()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedKeyword {
    pub name: String,
    pub frequency: usize,
}

/// Keywords ordered by descending frequency, ties by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordRanking {
    entries: Vec<RankedKeyword>,
}

impl KeywordRanking {
    /// Rank the tokens that occur at least `min_freq` times.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S], min_freq: usize) -> Self {
        let entries = count_tokens(tokens)
            .into_iter()
            .filter(|&(_, freq)| freq >= min_freq)
            .map(|(name, frequency)| RankedKeyword {
                name: name.to_string(),
                frequency,
            })
            .collect();
        Self::sorted(entries)
    }

    fn sorted(mut entries: Vec<RankedKeyword>) -> Self {
        entries.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.name.cmp(&b.name)));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` most frequent keywords.
    pub fn top(&self, n: usize) -> &[RankedKeyword] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedKeyword> + '_ {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_exact_strings() {
        let counts = count_tokens(&["교육", "교육", "Education", "education"]);
        assert_eq!(counts["교육"], 2);
        assert_eq!(counts["Education"], 1);
        assert_eq!(counts["education"], 1);
    }

    #[test]
    fn ranking_orders_by_frequency_then_name() {
        let tokens = ["b", "a", "c", "b", "a", "d", "d", "d"];
        let ranking = KeywordRanking::from_tokens(&tokens, 1);
        let names: Vec<&str> = ranking.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["d", "a", "b", "c"]);
        assert_eq!(ranking.top(2)[0].frequency, 3);
        assert_eq!(ranking.top(10).len(), 4);
    }

    #[test]
    fn ranking_applies_minimum_frequency() {
        let tokens = ["x", "y", "y"];
        let ranking = KeywordRanking::from_tokens(&tokens, 2);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.top(1)[0].name, "y");
    }
}
