use serde::Deserialize;

/// A GitHub account, identified by its login. Used as the digest grouping key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Author {
    pub login: String,
}

/// One issue comment on a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    /// `null` (deleted account) decodes as an author with an empty login
    #[serde(rename = "user", default, deserialize_with = "null_as_ghost")]
    pub author: Author,
    /// `null` bodies decode as an empty string
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
}

/// A closed pull request from the listing endpoint.
/// `comments` is not part of the listing payload; it is filled in by the comment collector.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(rename = "user", default, deserialize_with = "null_as_ghost")]
    pub author: Author,
    #[serde(skip)]
    pub comments: Vec<Comment>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_ghost<'de, D>(deserializer: D) -> Result<Author, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Author>::deserialize(deserializer)?.unwrap_or_default())
}
