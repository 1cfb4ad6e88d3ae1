use crate::models::null_as_default;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed view of an archive listing entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub publication_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub social_title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    /// Kept as sent; never parsed
    #[serde(deserialize_with = "null_as_default")]
    pub post_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub audience: String,
    #[serde(deserialize_with = "null_as_default")]
    pub write_comment_permissions: String,
    #[serde(deserialize_with = "null_as_default")]
    pub canonical_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cover_image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "wordcount", deserialize_with = "null_as_default")]
    pub word_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub comment_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub child_comment_count: i64,
}

/// An article ready for insertion: typed columns plus the original element
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub article: Article,
    pub original_json: String,
}

/// Only the field the detail endpoint is queried for
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleBody {
    #[serde(default, deserialize_with = "null_as_default")]
    pub body_html: String,
}

/// Decodes one archive page
///
/// The page is parsed once into generic JSON values. Each element is
/// re-serialized as its `original_json` and projected into an [`Article`].
/// Any element that does not fit the typed shape fails the whole page.
/// An empty vector means the archive is exhausted.
pub fn decode_listing_page(body: &str) -> Result<Vec<ArticleRecord>, serde_json::Error> {
    let values: Vec<Value> = serde_json::from_str(body)?;

    values
        .iter()
        .map(|value| {
            let article = Article::deserialize(value)?;
            let original_json = serde_json::to_string(value)?;
            Ok(ArticleRecord {
                article,
                original_json,
            })
        })
        .collect()
}
