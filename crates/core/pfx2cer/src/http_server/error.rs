use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use pfx_certificate::ConversionError;

#[derive(Debug, thiserror::Error)]
pub enum HttpRequestError {
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Invalid multipart request: {0}")]
    Multipart(#[from] MultipartError),
}

impl IntoResponse for HttpRequestError {
    fn into_response(self) -> Response {
        use HttpRequestError as E;
        let error_message = self.to_string();
        match self {
            E::NoFileUploaded => {
                tracing::warn!("{error_message}");
                (StatusCode::BAD_REQUEST, error_message).into_response()
            }
            E::Conversion(err) => {
                tracing::warn!(kind = ?err.kind(), "{error_message}");
                (StatusCode::BAD_REQUEST, error_message).into_response()
            }
            E::Multipart(err) => {
                tracing::warn!("{error_message}");
                err.into_response()
            }
        }
    }
}
