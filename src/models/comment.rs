use crate::models::null_as_default;
use serde::{Deserialize, Serialize};

/// One node of a post's comment tree
///
/// `deleted` is decoded and kept in `original_json`, but has no column of its
/// own; deleted comments are stored like any other, usually with no body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub post_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    pub body: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub deleted: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub ancestor_path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub children_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub children: Vec<Comment>,
}

/// Envelope returned by the comments endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,
}

/// A flattened comment ready for insertion
#[derive(Debug, Clone)]
pub struct CommentRecord<'a> {
    pub comment: &'a Comment,
    pub original_json: String,
}

impl<'a> CommentRecord<'a> {
    /// Serializes the typed comment, subtree included, as its stored JSON
    pub fn new(comment: &'a Comment) -> Result<Self, serde_json::Error> {
        let original_json = serde_json::to_string(comment)?;
        Ok(Self {
            comment,
            original_json,
        })
    }
}

/// Decodes the full comment tree of one post
///
/// Reply chains may nest arbitrarily deep: the parser's recursion limit is
/// lifted and the stack grows on demand while decoding.
pub fn decode_comment_tree(body: &str) -> Result<Vec<Comment>, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_str(body);
    deserializer.disable_recursion_limit();

    let response =
        CommentsResponse::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;

    Ok(response.comments)
}

/// Flattens comment trees in pre-order
///
/// Every node is emitted before any of its descendants, and siblings keep
/// their order. The result holds one entry per node at any depth.
pub fn flatten_comments(comments: &[Comment]) -> Vec<&Comment> {
    let mut output = Vec::new();
    let mut stack: Vec<&Comment> = comments.iter().rev().collect();

    while let Some(comment) = stack.pop() {
        output.push(comment);
        stack.extend(comment.children.iter().rev());
    }

    output
}
