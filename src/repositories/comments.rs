use chrono::{DateTime, Utc};
use deadpool_postgres::Object;
use tokio_postgres::types::Json;
use tokio_postgres::Row;

use crate::errors::AppError;
use crate::models::{age_label, Comment, CommentStats, LikePayload, Reply};

const COMMENT_COLUMNS: &str =
    "id, case_id, author, avatar, text, likes, is_approved, replies, created_at, updated_at";

const NOT_FOUND: &str = "ไม่พบความคิดเห็นนี้";

pub struct NewComment {
    pub case_id: String,
    pub author: String,
    pub avatar: Option<String>,
    pub text: String,
}

pub struct CommentRepository;

impl CommentRepository {
    /// Approved comments for a case, newest first.
    pub async fn list_approved(
        client: &Object,
        case_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Comment>, i64), AppError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE case_id = $1 AND is_approved \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let limit = i64::from(limit);
        let offset = (i64::from(page.max(1)) - 1) * limit;
        let rows = client.query(&sql, &[&case_id, &limit, &offset]).await?;

        let total: i64 = client
            .query_one(
                "SELECT COUNT(*) FROM comments WHERE case_id = $1 AND is_approved",
                &[&case_id],
            )
            .await?
            .get(0);

        let now = Utc::now();
        Ok((rows.iter().map(|r| Self::build_comment(r, now)).collect(), total))
    }

    pub async fn stats(client: &Object, case_id: &str) -> Result<CommentStats, AppError> {
        let row = client
            .query_one(
                r#"SELECT COUNT(*),
                          COALESCE(SUM(likes), 0)::bigint,
                          COALESCE(AVG(likes), 0)::float8
                   FROM comments WHERE case_id = $1 AND is_approved"#,
                &[&case_id],
            )
            .await?;
        Ok(CommentStats {
            total_comments: row.get(0),
            total_likes: row.get(1),
            avg_likes: row.get(2),
        })
    }

    pub async fn create(client: &Object, comment: NewComment) -> Result<Comment, AppError> {
        let sql = format!(
            "INSERT INTO comments (case_id, author, avatar, text) VALUES ($1, $2, $3, $4) \
             RETURNING {COMMENT_COLUMNS}"
        );
        let row = client
            .query_one(
                &sql,
                &[&comment.case_id, &comment.author, &comment.avatar, &comment.text],
            )
            .await?;
        Ok(Self::build_comment(&row, Utc::now()))
    }

    /// Likes the comment for `client_key`, or removes that like if present.
    pub async fn toggle_like(
        client: &mut Object,
        comment_id: i64,
        client_key: &str,
    ) -> Result<LikePayload, AppError> {
        let tx = client.transaction().await?;

        tx.query_opt("SELECT id FROM comments WHERE id = $1 FOR UPDATE", &[&comment_id])
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

        let removed = tx
            .execute(
                "DELETE FROM comment_likes WHERE comment_id = $1 AND client_key = $2",
                &[&comment_id, &client_key],
            )
            .await?;

        let has_liked = removed == 0;
        let likes: i32 = if has_liked {
            tx.execute(
                "INSERT INTO comment_likes (comment_id, client_key) VALUES ($1, $2)",
                &[&comment_id, &client_key],
            )
            .await?;
            tx.query_one(
                "UPDATE comments SET likes = likes + 1, updated_at = now() WHERE id = $1 RETURNING likes",
                &[&comment_id],
            )
            .await?
            .get(0)
        } else {
            tx.query_one(
                "UPDATE comments SET likes = GREATEST(likes - 1, 0), updated_at = now() \
                 WHERE id = $1 RETURNING likes",
                &[&comment_id],
            )
            .await?
            .get(0)
        };

        tx.commit().await?;
        Ok(LikePayload { likes, has_liked })
    }

    pub async fn delete(client: &Object, comment_id: i64) -> Result<(), AppError> {
        let deleted = client
            .execute("DELETE FROM comments WHERE id = $1", &[&comment_id])
            .await?;
        if deleted == 0 {
            return Err(AppError::NotFound(NOT_FOUND.to_string()));
        }
        Ok(())
    }

    fn build_comment(row: &Row, now: DateTime<Utc>) -> Comment {
        let Json(replies): Json<Vec<Reply>> = row.get("replies");
        let created_at = row.get("created_at");
        Comment {
            id: row.get("id"),
            case_id: row.get("case_id"),
            author: row.get("author"),
            avatar: row.get("avatar"),
            text: row.get("text"),
            likes: row.get("likes"),
            is_approved: row.get("is_approved"),
            replies,
            age: age_label(created_at, now),
            created_at,
            updated_at: row.get("updated_at"),
        }
    }
}
