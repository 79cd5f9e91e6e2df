//! Answer evaluation: response latency and ROUGE scores against a reference

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use crate::models::RougeScore;
use crate::models::ScoreReport;

/// Scores generated answers against user-supplied references
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    use_stemmer: bool,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self { use_stemmer: true }
    }
}

impl Evaluator {
    #[must_use]
    pub const fn new(use_stemmer: bool) -> Self {
        Self { use_stemmer }
    }

    /// Elapsed time between two instants, zero if `end` precedes `start`
    #[must_use]
    pub fn measure_latency(start: Instant, end: Instant) -> Duration {
        end.saturating_duration_since(start)
    }

    /// ROUGE-1 and ROUGE-L of `candidate` against `reference`
    #[must_use]
    pub fn score(&self, candidate: &str, reference: &str) -> ScoreReport {
        let candidate_tokens = self.tokenize(candidate);
        let reference_tokens = self.tokenize(reference);

        ScoreReport {
            rouge1: rouge_n1(&candidate_tokens, &reference_tokens),
            rouge_l: rouge_l(&candidate_tokens, &reference_tokens),
        }
    }

    /// Score only when a non-blank reference is supplied
    #[must_use]
    pub fn score_optional(&self, candidate: &str, reference: Option<&str>) -> Option<ScoreReport> {
        reference
            .filter(|r| !r.trim().is_empty())
            .map(|r| self.score(candidate, r))
    }

    /// Lower-case, split on non-alphanumerics, and optionally stem
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(|token| {
                if self.use_stemmer && token.chars().count() > 3 {
                    stem(token)
                } else {
                    token.to_string()
                }
            })
            .collect()
    }
}

fn rouge_n1(candidate: &[String], reference: &[String]) -> RougeScore {
    let mut reference_counts: HashMap<&str, usize> = HashMap::new();
    for token in reference {
        *reference_counts.entry(token.as_str()).or_default() += 1;
    }

    let mut overlap = 0;
    for token in candidate {
        if let Some(count) = reference_counts.get_mut(token.as_str()) {
            if *count > 0 {
                *count -= 1;
                overlap += 1;
            }
        }
    }

    score_from_overlap(overlap, candidate.len(), reference.len())
}

fn rouge_l(candidate: &[String], reference: &[String]) -> RougeScore {
    let lcs = lcs_length(candidate, reference);
    score_from_overlap(lcs, candidate.len(), reference.len())
}

fn score_from_overlap(overlap: usize, candidate_len: usize, reference_len: usize) -> RougeScore {
    if candidate_len == 0 || reference_len == 0 {
        return RougeScore::default();
    }

    let precision = overlap as f64 / candidate_len as f64;
    let recall = overlap as f64 / reference_len as f64;
    let fmeasure = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    RougeScore {
        precision,
        recall,
        fmeasure,
    }
}

/// Longest common subsequence length, O(n*m) time and O(m) space
fn lcs_length(a: &[String], b: &[String]) -> usize {
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for x in a {
        for (j, y) in b.iter().enumerate() {
            current[j + 1] = if x == y {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Light English suffix stripper
///
/// Handles plurals and the common `-ing` / `-ed` / `-ly` endings so that
/// inflected forms of the same word count as overlap.
fn stem(word: &str) -> String {
    let mut w = word.to_string();

    if w.ends_with("sses") {
        w.truncate(w.len() - 2);
    } else if w.ends_with("ies") {
        w.truncate(w.len() - 2);
    } else if w.ends_with('s') && !w.ends_with("ss") && !w.ends_with("us") {
        w.truncate(w.len() - 1);
    }

    for suffix in ["ing", "ed", "ly"] {
        if let Some(stripped) = w.strip_suffix(suffix) {
            if stripped.len() >= 3 && stripped.chars().any(is_vowel) {
                w = stripped.to_string();
                break;
            }
        }
    }

    w
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}
