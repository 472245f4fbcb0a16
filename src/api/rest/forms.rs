use crate::api::rest::ApiError;
use crate::error::Error;
use axum::body::HttpBody;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::Request;
use axum::{BoxError, Json};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;

/// JSON body whose rejections use the API error shape
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S, B> FromRequest<S, B> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_error(rejection).into()),
        }
    }
}

fn rejection_error(rejection: JsonRejection) -> Error {
    Error::Validation(format!("Invalid request body: {}", rejection.body_text()))
}

/// Trimmed value of a required text field
pub fn required_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Id sent either as a JSON number or a numeric string
pub fn flexible_id<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Number(n)) => i32::try_from(n)
            .map(Some)
            .map_err(|_| de::Error::custom("id out of range")),
        Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawId::Text(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| de::Error::custom("id must be a number")),
    }
}

/// Parse an id taken from the URL path
pub fn path_id(raw: &str, what: &str) -> Result<i32, Error> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| Error::Validation(format!("Invalid {} id", what)))
}
