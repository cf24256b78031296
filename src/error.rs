use actix_web::{http::header, http::StatusCode, HttpResponse, ResponseError};
use log::error;
use sea_orm::{DbErr, TransactionError};
use thiserror::Error;

use crate::mail::MailError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Fail(String),
    #[error("not found")]
    NotFound,
    #[error("please login first")]
    NeedLogin,
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
    #[error("mail error: {0}")]
    Mail(#[from] MailError),
    #[error("system_exception: {0}")]
    System(String),
}

impl AppError {
    pub fn fail(msg: impl Into<String>) -> Self {
        Self::Fail(msg.into())
    }

    pub fn need_login() -> Self {
        Self::NeedLogin
    }

    pub fn system_exception(cause: impl std::fmt::Display) -> Self {
        Self::System(cause.to_string())
    }
}

pub fn map_tx_error(err: TransactionError<AppError>) -> AppError {
    match err {
        TransactionError::Connection(e) => AppError::Db(e),
        TransactionError::Transaction(app) => app,
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Fail(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NeedLogin => StatusCode::FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::NeedLogin => HttpResponse::Found()
                .insert_header((header::LOCATION, "/login/"))
                .finish(),
            Self::Fail(msg) => HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(msg.clone()),
            Self::NotFound => HttpResponse::NotFound()
                .content_type("text/plain; charset=utf-8")
                .body("Not Found"),
            other => {
                error!("request failed: {}", other);
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body("Server Error (500)")
            }
        }
    }
}
