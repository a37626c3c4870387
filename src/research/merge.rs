use super::ResearchResult;
use std::collections::HashSet;

/// Union branch results, dropping repeated learnings and URLs. Order is branch
/// order, then first occurrence.
pub fn merge_results<I>(results: I) -> ResearchResult
where
    I: IntoIterator<Item = ResearchResult>,
{
    let mut learnings = Vec::new();
    let mut visited_urls = Vec::new();
    let mut seen_learnings = HashSet::new();
    let mut seen_urls = HashSet::new();

    for result in results {
        for learning in result.learnings {
            if seen_learnings.insert(learning.clone()) {
                learnings.push(learning);
            }
        }
        for url in result.visited_urls {
            if seen_urls.insert(url.clone()) {
                visited_urls.push(url);
            }
        }
    }

    ResearchResult {
        learnings,
        visited_urls,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(learnings: &[&str], urls: &[&str]) -> ResearchResult {
        ResearchResult {
            learnings: learnings.iter().map(|s| s.to_string()).collect(),
            visited_urls: urls.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_merge_with_itself_is_dedup() {
        let a = result(&["x", "y", "x"], &["u1", "u1", "u2"]);
        let merged = merge_results([a.clone(), a]);
        assert_eq!(merged, result(&["x", "y"], &["u1", "u2"]));
    }

    #[test]
    fn test_merge_keeps_first_occurrence_order() {
        let merged = merge_results([
            result(&["b", "a"], &["u2"]),
            result(&["a", "c"], &["u1", "u2"]),
        ]);
        assert_eq!(merged.learnings, vec!["b", "a", "c"]);
        assert_eq!(merged.visited_urls, vec!["u2", "u1"]);
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_results(Vec::new()).is_empty());
        assert!(merge_results([ResearchResult::default()]).is_empty());
    }
}
