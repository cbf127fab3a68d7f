use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use platform_core::{OrganizationId, UserId};

use crate::context::OwnerContext;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ORGANIZATION_ID_HEADER: &str = "x-organization-id";

/// Resolve the requesting principal from headers set by the upstream
/// authenticating proxy.
pub async fn owner_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let owner = extract_owner(req.headers())?;
    req.extensions_mut().insert(owner);
    Ok(next.run(req).await)
}

fn extract_owner(headers: &HeaderMap) -> Result<OwnerContext, StatusCode> {
    let user_id = header(headers, USER_ID_HEADER)?
        .ok_or(StatusCode::UNAUTHORIZED)
        .and_then(|v| UserId::new(v).map_err(|_| StatusCode::UNAUTHORIZED))?;

    let organization_id = match header(headers, ORGANIZATION_ID_HEADER)? {
        Some(v) => Some(OrganizationId::new(v).map_err(|_| StatusCode::BAD_REQUEST)?),
        None => None,
    };

    Ok(OwnerContext::new(user_id, organization_id))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, StatusCode> {
    match headers.get(name) {
        Some(value) => {
            let value = value.to_str().map_err(|_| StatusCode::BAD_REQUEST)?.trim();
            Ok((!value.is_empty()).then_some(value))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn user_header_is_required() {
        let headers = HeaderMap::new();
        assert_eq!(extract_owner(&headers).unwrap_err(), StatusCode::UNAUTHORIZED);

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("   "));
        assert_eq!(extract_owner(&headers).unwrap_err(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn organization_is_optional() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("u1"));
        let owner = extract_owner(&headers).unwrap();
        assert_eq!(owner.user_id().as_str(), "u1");
        assert_eq!(owner.organization_id(), None);

        headers.insert(ORGANIZATION_ID_HEADER, HeaderValue::from_static("org-1"));
        let owner = extract_owner(&headers).unwrap();
        assert_eq!(owner.organization_id().map(|o| o.as_str()), Some("org-1"));
    }
}
