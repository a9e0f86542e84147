/// Comprehensive error type for Yahoo Finance requests
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 401 Unauthorized (usually a missing crumb)
    Unauthorized(String),
    /// 403 Forbidden
    Forbidden(String),
    /// 404 Not Found (unknown or delisted symbol)
    NotFound(String),
    /// 429 Too Many Requests
    RateLimited(String),
    /// 5xx Server Error
    ServerError(u16, String),
    /// Other HTTP errors
    HttpError(u16, String),
    /// Network/request error
    RequestError(String),
    /// Deserialization error
    DeserializationError(String),
}

impl ApiError {
    /// Classify a non-success response by status code
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited(message),
            500..=599 => ApiError::ServerError(status, message),
            _ => ApiError::HttpError(status, message),
        }
    }

    /// Message safe to show on the page
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotFound(_) => {
                "The data provider has no data for that ticker symbol.".to_string()
            }
            ApiError::RateLimited(_) => {
                "The data provider is rate limiting us. Please try again in a moment.".to_string()
            }
            ApiError::RequestError(_) => {
                "Could not reach the data provider. Please try again.".to_string()
            }
            other => format!("The data provider returned an error ({}).", other),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::RateLimited(msg) => write!(f, "Rate Limited: {}", msg),
            ApiError::ServerError(code, msg) => write!(f, "Server Error ({}): {}", code, msg),
            ApiError::HttpError(code, msg) => write!(f, "HTTP Error ({}): {}", code, msg),
            ApiError::RequestError(msg) => write!(f, "Request Error: {}", msg),
            ApiError::DeserializationError(msg) => write!(f, "Deserialization Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}
