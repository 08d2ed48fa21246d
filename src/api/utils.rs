//! Stateless request-processing helpers shared by the run endpoints.

use crate::api::error::ApiError;

/// Validates that the Content-Type header denotes a JSON body.
///
/// `application/json` with or without parameters passes; look-alikes such
/// as `application/jsonp` or `text/json` do not.
pub fn require_json_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    let raw = content_type
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;

    let media_type: mime::Mime = raw
        .parse()
        .map_err(|_| ApiError::InvalidPayload(format!("invalid Content-Type: {}", raw)))?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(())
}

/// Rejects bodies above the configured payload limit.
pub fn validate_body_size(data: &[u8], max_size: usize) -> Result<(), ApiError> {
    if data.len() > max_size {
        return Err(ApiError::PayloadTooLarge(data.len()));
    }
    Ok(())
}
