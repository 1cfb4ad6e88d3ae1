//! Wire models for the publication API
//!
//! Each remote record is decoded into a typed projection used for the
//! queryable columns, and paired with a JSON string kept verbatim for later
//! reprocessing:
//! - articles keep the generic `serde_json::Value` of each listing element,
//!   so keys the typed view does not know about survive;
//! - comments keep the serialization of the typed struct, children included.

mod article;
mod comment;

pub use article::{decode_listing_page, Article, ArticleBody, ArticleRecord};
pub use comment::{decode_comment_tree, flatten_comments, Comment, CommentRecord, CommentsResponse};

use serde::{Deserialize, Deserializer};

/// Decodes `null` the same way as a missing key: as the type's default
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
