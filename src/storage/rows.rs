//! Column bindings for harvested records

use crate::models::{ArticleRecord, CommentRecord};
use crate::storage::traits::BatchRow;
use rusqlite::{params, Statement};

impl BatchRow for ArticleRecord {
    const INSERT_SQL: &'static str = "INSERT INTO articles (ID, PublicationID, Title, SocialTitle, Slug, PostDate, Audience, WriteCommentPermissions, CanonicalURL, CoverImage, Description, WordCount, CommentCount, ChildCommentCount, OriginalJSON) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)";

    fn key(&self) -> String {
        format!("article {} ({})", self.article.id, self.article.slug)
    }

    fn execute(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        let a = &self.article;
        stmt.execute(params![
            a.id,
            a.publication_id,
            a.title,
            a.social_title,
            a.slug,
            a.post_date,
            a.audience,
            a.write_comment_permissions,
            a.canonical_url,
            a.cover_image,
            a.description,
            a.word_count,
            a.comment_count,
            a.child_comment_count,
            self.original_json,
        ])
    }
}

impl BatchRow for CommentRecord<'_> {
    const INSERT_SQL: &'static str = "INSERT INTO comments (ID, PostID, UserID, Date, Body, Name, AncestorPath, ChildrenCount, OriginalJSON) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

    fn key(&self) -> String {
        format!("comment {}", self.comment.id)
    }

    fn execute(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
        let c = self.comment;
        stmt.execute(params![
            c.id,
            c.post_id,
            c.user_id,
            c.date,
            c.body,
            c.name,
            c.ancestor_path,
            c.children_count,
            self.original_json,
        ])
    }
}
