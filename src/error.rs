use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::borrow::Cow;

/// Error taxonomy for every operation in the crate.
///
/// `Validation`, `Auth`, `NotFound` and `Conflict` carry messages that are
/// surfaced to the caller verbatim. `Store` wraps a failed remote call; its
/// cause is logged and the caller sees a generic 500.
pub enum AppError {
    Validation(Cow<'static, str>),
    Auth(Cow<'static, str>),
    NotFound(Cow<'static, str>),
    Conflict(Cow<'static, str>),
    Store(anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(s: impl Into<Cow<'static, str>>) -> AppError {
        AppError::Validation(s.into())
    }

    pub fn auth(s: impl Into<Cow<'static, str>>) -> AppError {
        AppError::Auth(s.into())
    }

    pub fn not_found(s: impl Into<Cow<'static, str>>) -> AppError {
        AppError::NotFound(s.into())
    }

    pub fn conflict(s: impl Into<Cow<'static, str>>) -> AppError {
        AppError::Conflict(s.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct AppErrorResponse {
            status: u16,
            message: Cow<'static, str>,
        }

        let (code, message) = match self {
            AppError::Validation(s) => (StatusCode::UNPROCESSABLE_ENTITY, s),
            AppError::Auth(s) => (StatusCode::UNAUTHORIZED, s),
            AppError::NotFound(s) => (StatusCode::NOT_FOUND, s),
            AppError::Conflict(s) => (StatusCode::CONFLICT, s),
            AppError::Store(err) => {
                tracing::error!("store operation failed: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Cow::from("Internal Server Error"),
                )
            }
        };

        (
            code,
            Json(AppErrorResponse {
                status: code.as_u16(),
                message,
            }),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> AppError {
        AppError::Store(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_expected_status_codes() {
        let cases = [
            (
                AppError::validation("missing field"),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::auth("bad password"), StatusCode::UNAUTHORIZED),
            (AppError::not_found("no such row"), StatusCode::NOT_FOUND),
            (AppError::conflict("already decided"), StatusCode::CONFLICT),
            (
                AppError::Store(anyhow::anyhow!("connection refused")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn foreign_errors_become_store_errors() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, AppError::Store(_)));
    }
}
