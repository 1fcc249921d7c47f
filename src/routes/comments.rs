use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};
use deadpool_postgres::Pool;
use std::net::SocketAddr;
use validator::Validate;

use crate::errors::AppError;
use crate::models::{
    page_count, CommentListPayload, CommentPageQuery, CommentPagination, CommentStats,
    CreateCommentRequest, LikePayload, DEFAULT_AUTHOR,
};
use crate::repositories::{CommentRepository, NewComment};
use crate::response::ApiResponse;
use crate::validation::{case_id, escape_html, validation_failed};

#[utoipa::path(
    get,
    path = "/comments/{case_id}",
    tag = "Comments",
    params(("case_id" = String, Path, description = "Case identifier"), CommentPageQuery),
    responses((status = 200, description = "Approved comments, newest first", body = CommentListPayload))
)]
pub(crate) async fn list_comments(
    pool: web::Data<Pool>,
    path: web::Path<String>,
    query: web::Query<CommentPageQuery>,
) -> ActixResult<HttpResponse> {
    query.validate().map_err(validation_failed)?;
    let case_id = case_id(path.into_inner())?;

    let client = pool.get().await.map_err(AppError::from)?;
    let (comments, total) =
        CommentRepository::list_approved(&client, &case_id, query.page, query.limit).await?;

    Ok(ApiResponse::ok(CommentListPayload {
        pagination: CommentPagination {
            current: query.page,
            total: page_count(total, query.limit),
            count: comments.len(),
            total_comments: total,
        },
        comments,
    }))
}

#[utoipa::path(
    get,
    path = "/comments/{case_id}/stats",
    tag = "Comments",
    params(("case_id" = String, Path, description = "Case identifier")),
    responses((status = 200, description = "Comment totals for the case", body = CommentStats))
)]
pub(crate) async fn comment_stats(
    pool: web::Data<Pool>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let case_id = case_id(path.into_inner())?;
    let client = pool.get().await.map_err(AppError::from)?;
    let stats = CommentRepository::stats(&client, &case_id).await?;
    Ok(ApiResponse::ok(stats))
}

#[utoipa::path(
    post,
    path = "/comments/{case_id}",
    tag = "Comments",
    params(("case_id" = String, Path, description = "Case identifier")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment stored"),
        (status = 400, description = "Invalid comment")
    )
)]
pub(crate) async fn create_comment(
    pool: web::Data<Pool>,
    path: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> ActixResult<HttpResponse> {
    body.validate().map_err(validation_failed)?;
    let case_id = case_id(path.into_inner())?;
    let req = body.into_inner();

    let author = req
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map_or_else(|| DEFAULT_AUTHOR.to_string(), escape_html);

    let comment = NewComment {
        case_id,
        author,
        avatar: req.avatar,
        text: escape_html(req.text.trim()),
    };

    let client = pool.get().await.map_err(AppError::from)?;
    let created = CommentRepository::create(&client, comment).await?;

    Ok(ApiResponse::created("เพิ่มความคิดเห็นเรียบร้อยแล้ว", created))
}

#[utoipa::path(
    put,
    path = "/comments/{comment_id}/like",
    tag = "Comments",
    params(("comment_id" = i64, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Like toggled for the caller", body = LikePayload),
        (status = 404, description = "Comment not found")
    )
)]
pub(crate) async fn toggle_like(
    req: HttpRequest,
    pool: web::Data<Pool>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let key = client_key(&req);
    let mut client = pool.get().await.map_err(AppError::from)?;
    let result = CommentRepository::toggle_like(&mut client, path.into_inner(), &key).await?;

    let message = if result.has_liked {
        "ถูกใจแล้ว"
    } else {
        "ยกเลิกการถูกใจแล้ว"
    };
    Ok(ApiResponse::ok_with_message(message, result))
}

#[utoipa::path(
    delete,
    path = "/comments/{comment_id}",
    tag = "Comments",
    params(("comment_id" = i64, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 404, description = "Comment not found")
    )
)]
pub(crate) async fn delete_comment(
    pool: web::Data<Pool>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let client = pool.get().await.map_err(AppError::from)?;
    CommentRepository::delete(&client, path.into_inner()).await?;
    Ok(ApiResponse::message("ลบความคิดเห็นเรียบร้อยแล้ว"))
}

/// Identity used to de-duplicate likes: the client IP without its port.
fn client_key(req: &HttpRequest) -> String {
    let info = req.connection_info();
    match info.realip_remote_addr() {
        Some(addr) => addr
            .parse::<SocketAddr>()
            .map(|s| s.ip().to_string())
            .unwrap_or_else(|_| addr.to_string()),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn client_key_strips_port() {
        let req = TestRequest::default()
            .peer_addr("203.0.113.7:52311".parse().unwrap())
            .to_http_request();
        assert_eq!(client_key(&req), "203.0.113.7");
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "198.51.100.4"))
            .peer_addr("10.0.0.1:8080".parse().unwrap())
            .to_http_request();
        assert_eq!(client_key(&req), "198.51.100.4");
    }
}
