// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # HTTP Error Mapping
//!
//! Translates [`DispatchError`] to the status codes spec.md §7 assigns:
//! validation failures are 400, an unknown job id is 404, a transient store
//! failure is 503, everything else is an internal 500. The route handlers
//! never construct a status code themselves - they return `Result<_,
//! ApiError>` and let `?` do the conversion.

use super::dto::ErrorBody;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dispatch_domain::DispatchError;

pub struct ApiError(pub DispatchError);

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            DispatchError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            DispatchError::NotFound => (StatusCode::NOT_FOUND, "Job ID not found".to_string()),
            DispatchError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string()),
            DispatchError::ModelUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()),
        };
        (status, Json(ErrorBody { success: false, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_maps_to_bad_request() {
        let response = ApiError(DispatchError::Validation("bad mime".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404_with_fixed_message() {
        let response = ApiError(DispatchError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_unavailable_maps_to_503() {
        let response = ApiError(DispatchError::StoreUnavailable("down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
