pub mod digest;

pub use digest::Digest;

use colored::Colorize;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::pr::{Comment, PullRequest};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to open report file: {0}")]
    Open(#[source] std::io::Error),

    #[error("Failed to flush report file: {0}")]
    Flush(#[source] std::io::Error),
}

/// Everything rendering needs besides the digest itself.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub web_url: String,
    pub owner: String,
    pub repo: String,
    /// PRs with fewer comments than this are not rendered
    pub min_comments: usize,
    /// Comment authors whose comments are left out
    pub skip_comment_authors: HashSet<String>,
}

impl RenderContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            web_url: config.settings.web_url.trim_end_matches('/').to_string(),
            owner: config.repository.owner.clone(),
            repo: config.repository.name.clone(),
            min_comments: config.settings.min_comments,
            skip_comment_authors: config.settings.skip_comment_authors.iter().cloned().collect(),
        }
    }

    fn pull_url(&self, number: u64) -> String {
        format!("{}/{}/{}/pull/{}", self.web_url, self.owner, self.repo, number)
    }

    fn renders(&self, pr: &PullRequest) -> bool {
        pr.comments.len() >= self.min_comments
    }

    fn renders_comment(&self, comment: &Comment) -> bool {
        !self.skip_comment_authors.contains(&comment.author.login)
    }
}

/// How many PRs of one author made it into the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorSummary {
    pub login: String,
    pub rendered: usize,
    pub collected: usize,
}

/// Keep PR markdown headings nested below the digest's own headings.
pub fn escape_body(body: &str) -> String {
    body.replace('#', "#####")
}

fn author_section(login: &str) -> String {
    format!("## User\n{}\n", login)
}

fn pull_request_section(pr: &PullRequest, ctx: &RenderContext) -> String {
    format!(
        "### Title\n{}\n### URL\n{}\n### Body\n{}\n#### Comments\n",
        pr.title,
        ctx.pull_url(pr.number),
        escape_body(&pr.body),
    )
}

fn comment_section(comment: &Comment) -> String {
    format!("##### User\n{}\n{}\n", comment.author.login, comment.body)
}

/// Write one section; a failed write is logged and dropped.
fn write_section<W: Write>(out: &mut W, section: &str) {
    if let Err(err) = out.write_all(section.as_bytes()) {
        warn!(error = %err, "dropping digest section");
    }
}

/// Render the digest into `out`.
///
/// Every author gets a header. A PR is rendered only with enough comments,
/// and comments by skip-listed authors are left out.
pub fn write_digest<W: Write>(
    out: &mut W,
    digest: &Digest<'_>,
    ctx: &RenderContext,
) -> Vec<AuthorSummary> {
    let mut summaries = Vec::with_capacity(digest.groups.len());

    for group in &digest.groups {
        write_section(out, &author_section(&group.author.login));

        let mut rendered = 0;
        for pr in &group.pull_requests {
            if !ctx.renders(pr) {
                debug!(pr = pr.number, comments = pr.comments.len(), "below comment threshold");
                continue;
            }
            write_section(out, &pull_request_section(pr, ctx));
            for comment in pr.comments.iter().filter(|c| ctx.renders_comment(c)) {
                write_section(out, &comment_section(comment));
            }
            rendered += 1;
        }

        summaries.push(AuthorSummary {
            login: group.author.login.clone(),
            rendered,
            collected: group.pull_requests.len(),
        });
    }

    summaries
}

/// Append the rendered digest to the file at `path`, creating it if needed.
/// Opening and the final flush are fatal; individual section writes are not.
#[instrument(skip(digest, ctx), fields(path = %path.display(), authors = digest.groups.len()))]
pub fn append_digest(
    path: &Path,
    digest: &Digest<'_>,
    ctx: &RenderContext,
) -> Result<Vec<AuthorSummary>, ReportError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(ReportError::Open)?;

    let mut out = BufWriter::new(file);
    let summaries = write_digest(&mut out, digest, ctx);

    let file = out.into_inner().map_err(|err| ReportError::Flush(err.into_error()))?;
    if let Err(err) = file.sync_all() {
        warn!(error = %err, "failed to sync report file");
    }
    debug!("digest appended");
    Ok(summaries)
}

/// Print a short colored run summary to the terminal.
pub fn print_summary(path: &Path, fetched: usize, summaries: &[AuthorSummary]) {
    println!();
    println!("Digest appended to {}", path.display().to_string().as_str().bold());
    println!("Pull requests fetched: {}", fetched);
    println!();
    for summary in summaries {
        let count = format!("{}/{}", summary.rendered, summary.collected);
        let count = if summary.rendered == 0 {
            count.as_str().dimmed()
        } else {
            count.as_str().green().bold()
        };
        println!("  • {} {}", summary.login, count);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr::Author;

    fn ctx() -> RenderContext {
        RenderContext {
            web_url: "https://github.com".to_string(),
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            min_comments: 3,
            skip_comment_authors: ["github-actions[bot]".to_string()].into_iter().collect(),
        }
    }

    fn comment(login: &str, body: &str) -> Comment {
        Comment {
            author: Author {
                login: login.to_string(),
            },
            body: body.to_string(),
        }
    }

    fn pr(number: u64, login: &str, body: &str, comments: Vec<Comment>) -> PullRequest {
        PullRequest {
            number,
            title: format!("Title {number}"),
            body: body.to_string(),
            author: Author {
                login: login.to_string(),
            },
            comments,
        }
    }

    fn summary(login: &str, rendered: usize, collected: usize) -> AuthorSummary {
        AuthorSummary {
            login: login.to_string(),
            rendered,
            collected,
        }
    }

    fn render(prs: &[PullRequest]) -> String {
        let digest = Digest::group(prs);
        let mut out = Vec::<u8>::new();
        write_digest(&mut out, &digest, &ctx());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_escape_body_only_touches_hashes() {
        assert_eq!(escape_body("## Summary\nissue #12"), "########## Summary\nissue #####12");
        assert_eq!(escape_body("no headings here"), "no headings here");
        assert_eq!(escape_body(""), "");
    }

    #[test]
    fn test_literal_format() {
        let prs = vec![pr(
            7,
            "alice",
            "# Why",
            vec![comment("bob", "lgtm"), comment("carol", "nit"), comment("dave", "ok")],
        )];
        let expected = "## User\nalice\n\
### Title\nTitle 7\n### URL\nhttps://github.com/acme/widgets/pull/7\n### Body\n##### Why\n#### Comments\n\
##### User\nbob\nlgtm\n\
##### User\ncarol\nnit\n\
##### User\ndave\nok\n";
        assert_eq!(render(&prs), expected);
    }

    #[test]
    fn test_alice_bob_scenario() {
        let alice_comments = (0..5)
            .map(|i| comment("reviewer", &format!("alice comment {i}")))
            .collect();
        let prs = vec![
            pr(1, "alice", "alice body", alice_comments),
            pr(2, "bob", "bob body", vec![comment("reviewer", "bob comment")]),
        ];
        let out = render(&prs);

        assert!(out.contains("## User\nalice\n"));
        assert!(out.contains("https://github.com/acme/widgets/pull/1"));
        assert!(out.contains("alice body"));
        assert_eq!(out.matches("##### User\nreviewer\nalice comment").count(), 5);

        // bob's header precedes the threshold check, his PR does not
        assert!(out.contains("## User\nbob\n"));
        assert!(!out.contains("bob body"));
        assert!(!out.contains("/pull/2"));
        assert!(!out.contains("bob comment"));
    }

    #[test]
    fn test_threshold_boundary() {
        let three = (0..3).map(|_| comment("x", "c")).collect();
        let two = (0..2).map(|_| comment("x", "c")).collect();
        let out = render(&[pr(1, "alice", "", three), pr(2, "alice", "", two)]);
        assert!(out.contains("/pull/1"));
        assert!(!out.contains("/pull/2"));
    }

    #[test]
    fn test_skip_listed_comment_authors_are_excluded() {
        let comments = vec![
            comment("github-actions[bot]", "coverage report"),
            comment("bob", "looks good"),
            comment("carol", "agreed"),
        ];
        let out = render(&[pr(3, "alice", "", comments)]);
        // skipped comments still count toward the threshold
        assert!(out.contains("/pull/3"));
        assert!(!out.contains("github-actions[bot]"));
        assert!(!out.contains("coverage report"));
        assert!(out.contains("##### User\nbob\nlooks good\n"));
    }

    #[test]
    fn test_summaries() {
        let many = (0..4).map(|_| comment("x", "c")).collect();
        let prs = vec![
            pr(1, "alice", "", many),
            pr(2, "alice", "", vec![]),
            pr(3, "bob", "", vec![]),
        ];
        let digest = Digest::group(&prs);
        let summaries = write_digest(&mut Vec::<u8>::new(), &digest, &ctx());
        assert_eq!(summaries, vec![summary("alice", 1, 2), summary("bob", 0, 1)]);
    }

    #[test]
    fn test_append_twice_concatenates() {
        let comments = (0..3).map(|i| comment("x", &format!("c{i}"))).collect();
        let prs = vec![pr(1, "alice", "body", comments)];
        let digest = Digest::group(&prs);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("year_end_review.md");
        append_digest(&path, &digest, &ctx()).unwrap();
        let once = std::fs::read_to_string(&path).unwrap();
        append_digest(&path, &digest, &ctx()).unwrap();
        let twice = std::fs::read_to_string(&path).unwrap();

        assert!(!once.is_empty());
        assert_eq!(twice, format!("{once}{once}"));
    }

    #[test]
    fn test_append_to_unopenable_path_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.md");
        let err = append_digest(&path, &Digest::default(), &ctx()).unwrap_err();
        assert!(matches!(err, ReportError::Open(_)));
    }

    #[test]
    fn test_print_summary_does_not_panic() {
        print_summary(Path::new("year_end_review.md"), 2, &[summary("alice", 1, 2)]);
    }
}
