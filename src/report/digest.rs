use std::collections::HashMap;

use crate::pr::{Author, PullRequest};

/// Pull requests of one author, in collection order.
#[derive(Debug)]
pub struct AuthorGroup<'a> {
    pub author: &'a Author,
    pub pull_requests: Vec<&'a PullRequest>,
}

/// Pull requests grouped by author. Groups keep the order in which each
/// author was first seen, so the rendered digest is deterministic.
#[derive(Debug, Default)]
pub struct Digest<'a> {
    pub groups: Vec<AuthorGroup<'a>>,
}

impl<'a> Digest<'a> {
    pub fn group(pull_requests: &'a [PullRequest]) -> Self {
        let mut groups: Vec<AuthorGroup<'a>> = Vec::new();
        let mut index: HashMap<&'a Author, usize> = HashMap::new();

        for pr in pull_requests {
            let slot = *index.entry(&pr.author).or_insert_with(|| {
                groups.push(AuthorGroup {
                    author: &pr.author,
                    pull_requests: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].pull_requests.push(pr);
        }

        Digest { groups }
    }

    pub fn pull_request_count(&self) -> usize {
        self.groups.iter().map(|g| g.pull_requests.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr(number: u64, login: &str) -> PullRequest {
        PullRequest {
            number,
            title: format!("PR {number}"),
            body: String::new(),
            author: Author {
                login: login.to_string(),
            },
            comments: vec![],
        }
    }

    #[test]
    fn test_groups_in_first_occurrence_order() {
        let prs = vec![pr(1, "bob"), pr(2, "alice"), pr(3, "bob"), pr(4, "carol"), pr(5, "alice")];
        let digest = Digest::group(&prs);

        let authors: Vec<&str> = digest.groups.iter().map(|g| g.author.login.as_str()).collect();
        assert_eq!(authors, vec!["bob", "alice", "carol"]);

        let bob: Vec<u64> = digest.groups[0].pull_requests.iter().map(|p| p.number).collect();
        assert_eq!(bob, vec![1, 3]);
        let alice: Vec<u64> = digest.groups[1].pull_requests.iter().map(|p| p.number).collect();
        assert_eq!(alice, vec![2, 5]);
    }

    #[test]
    fn test_every_pr_under_its_own_author_exactly_once() {
        let prs: Vec<PullRequest> = (0..30)
            .map(|n| pr(n, ["a", "b", "c", "d"][(n * 7 % 4) as usize]))
            .collect();
        let digest = Digest::group(&prs);

        assert_eq!(digest.pull_request_count(), prs.len());
        for group in &digest.groups {
            assert!(group.pull_requests.iter().all(|p| &p.author == group.author));
        }
        let distinct: std::collections::HashSet<&Author> =
            digest.groups.iter().map(|g| g.author).collect();
        assert_eq!(distinct.len(), digest.groups.len());
    }

    #[test]
    fn test_empty_input() {
        let digest = Digest::group(&[]);
        assert!(digest.groups.is_empty());
        assert_eq!(digest.pull_request_count(), 0);
    }
}
