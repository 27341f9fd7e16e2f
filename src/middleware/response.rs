use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::types::Page;

/// Success envelope: `{data, message, page, size, total_items, total_pages}`.
/// Fields that do not apply to a response are left out of the JSON.
#[derive(Debug, Serialize)]
pub struct WebResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<i64>,
    #[serde(skip)]
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> WebResponse<T> {
    /// Create a successful response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            page: None,
            size: None,
            total_items: None,
            total_pages: None,
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self::success(data).with_status(StatusCode::CREATED)
    }
}

impl WebResponse<()> {
    /// Message-only body, e.g. after a delete.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            page: None,
            size: None,
            total_items: None,
            total_pages: None,
            status_code: None,
        }
    }
}

impl<T: Serialize> From<Page<T>> for WebResponse<Vec<T>> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: Some(page.items),
            message: None,
            page: Some(page.page),
            size: Some(page.size),
            total_items: Some(page.total_items),
            total_pages: Some(page.total_pages),
            status_code: None,
        }
    }
}

impl<T: Serialize> IntoResponse for WebResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

// Convenience type alias
pub type ApiResult<T> = Result<WebResponse<T>, crate::error::ApiError>;
