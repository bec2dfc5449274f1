use crate::models::CodeSearchHit;
use crate::util::basename;
use std::collections::{HashMap, HashSet};

/// BM25 index over repository files. Each document is the file path plus its
/// contents, so a query can hit either.
pub struct SearchIndex {
    // Map word -> document frequency (count of files containing this word)
    df: HashMap<String, usize>,
    // Map path -> word counts
    tf: HashMap<String, HashMap<String, usize>>,
    doc_lengths: HashMap<String, usize>,
    total_docs: usize,
    avg_dl: f64,
}

impl SearchIndex {
    pub fn new<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut index = SearchIndex {
            df: HashMap::new(),
            tf: HashMap::new(),
            doc_lengths: HashMap::new(),
            total_docs: 0,
            avg_dl: 0.0,
        };

        let mut total_length = 0;

        for (path, content) in files {
            index.total_docs += 1;
            let text = format!("{} {}", path, content);
            let words = tokenize(&text);
            let doc_len = words.len();

            total_length += doc_len;
            index.doc_lengths.insert(path.to_string(), doc_len);

            let mut word_counts = HashMap::new();
            let mut unique_words = HashSet::new();

            for word in words {
                *word_counts.entry(word.clone()).or_insert(0) += 1;
                unique_words.insert(word);
            }

            index.tf.insert(path.to_string(), word_counts);

            for word in unique_words {
                *index.df.entry(word).or_insert(0) += 1;
            }
        }

        if index.total_docs > 0 {
            index.avg_dl = total_length as f64 / index.total_docs as f64;
        }

        index
    }

    /// Ranked hits, best first. Equal scores fall back to path order so the
    /// result is deterministic.
    pub fn search(&self, query: &str) -> Vec<CodeSearchHit> {
        let query_words = tokenize(query);
        let mut scores: HashMap<&str, f64> = HashMap::new();

        let k1 = 1.2;
        let b = 0.75;

        for word in query_words {
            if let Some(doc_freq) = self.df.get(&word) {
                let idf = ((self.total_docs as f64 - *doc_freq as f64 + 0.5)
                    / (*doc_freq as f64 + 0.5)
                    + 1.0)
                    .ln();

                for (path, term_freqs) in &self.tf {
                    if let Some(tf_val) = term_freqs.get(&word) {
                        let tf = *tf_val as f64;
                        let doc_len = *self.doc_lengths.get(path).unwrap_or(&0) as f64;

                        let score = idf * (tf * (k1 + 1.0))
                            / (tf + k1 * (1.0 - b + b * (doc_len / self.avg_dl)));

                        *scores.entry(path.as_str()).or_insert(0.0) += score;
                    }
                }
            }
        }

        let mut results: Vec<CodeSearchHit> = scores
            .into_iter()
            .map(|(path, score)| CodeSearchHit {
                path: path.to_string(),
                name: basename(path).to_string(),
                score,
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });
        results
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
