use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    fn new(message: Option<&'static str>, data: T, count: Option<usize>) -> Self {
        Self {
            success: true,
            message,
            data: Some(data),
            count,
        }
    }

    pub fn ok(data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self::new(None, data, None))
    }

    pub fn ok_with_message(message: &'static str, data: T) -> HttpResponse {
        HttpResponse::Ok().json(Self::new(Some(message), data, None))
    }

    pub fn created(message: &'static str, data: T) -> HttpResponse {
        HttpResponse::Created().json(Self::new(Some(message), data, None))
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    pub fn list(items: Vec<T>) -> HttpResponse {
        let count = items.len();
        HttpResponse::Ok().json(Self::new(None, items, Some(count)))
    }
}

impl ApiResponse<()> {
    pub fn message(message: &'static str) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            success: true,
            message: Some(message),
            data: None,
            count: None,
        })
    }
}
