//! Request extractors.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` whose rejections (bad syntax, wrong field types, missing content
/// type, oversized body) are reported through [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
