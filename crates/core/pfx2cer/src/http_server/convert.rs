use super::error::HttpRequestError as Error;
use super::CONVERT_ENDPOINT;
use axum::extract::Multipart;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use pfx_certificate::CertificateConverter;
use pfx_certificate::DerCertificate;
use std::sync::Arc;
use tracing::info;
use zeroize::Zeroizing;

const PFX_FILE_FIELD: &str = "pfxFile";
const PASSWORD_FIELD: &str = "password";
const CER_CONTENT_TYPE: &str = "application/x-x509-ca-cert";
const CER_CONTENT_DISPOSITION: &str = "attachment; filename=\"certificate.cer\"";

pub(crate) fn convert_router(converter: Arc<dyn CertificateConverter>) -> Router {
    Router::new()
        .route(CONVERT_ENDPOINT, post(convert_pfx))
        .with_state(converter)
}

/// The form fields of a conversion request
#[derive(Default)]
struct PfxUpload {
    pfx_file: Option<Vec<u8>>,
    password: Zeroizing<String>,
}

impl PfxUpload {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, Error> {
        let mut upload = PfxUpload::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some(PFX_FILE_FIELD) => upload.pfx_file = Some(field.bytes().await?.to_vec()),
                Some(PASSWORD_FIELD) => upload.password = Zeroizing::new(field.text().await?),
                _ => {}
            }
        }
        Ok(upload)
    }
}

async fn convert_pfx(
    State(converter): State<Arc<dyn CertificateConverter>>,
    multipart: Multipart,
) -> Result<Response, Error> {
    let upload = PfxUpload::from_multipart(multipart).await?;
    let pfx = upload
        .pfx_file
        .filter(|pfx| !pfx.is_empty())
        .ok_or(Error::NoFileUploaded)?;

    let cer = converter
        .convert_pfx_to_cer(pfx, upload.password)
        .await?;

    match DerCertificate::from_der(cer.as_slice()) {
        Ok(cert) => info!(
            subject = %cert.subject().unwrap_or_default(),
            thumbprint = %cert.thumbprint(),
            "PFX bundle converted"
        ),
        Err(_) => info!(size = cer.len(), "PFX bundle converted"),
    }

    Ok((
        [
            (header::CONTENT_TYPE, CER_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, CER_CONTENT_DISPOSITION),
        ],
        cer,
    )
        .into_response())
}
