use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::middleware::request_id;
use crate::models::{parse_form_bool, BatchResponse, ExtractParams, ExtractionResult, UploadedFile};
use crate::services::ExtractionService;

/// Files plus the optional OCR override sent in one multipart form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub use_tesseract: Option<bool>,
}

impl UploadForm {
    /// The form field wins over the query parameter.
    pub fn force_conventional_ocr(&self, params: &ExtractParams) -> bool {
        self.use_tesseract.or(params.use_tesseract).unwrap_or(false)
    }
}

pub async fn extract_handler(
    State(state): State<AppState>,
    Query(params): Query<ExtractParams>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Json<ExtractionResult>> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let form = read_upload_form(&mut multipart, state.config.body_limit()).await?;
    let force_conventional_ocr = form.force_conventional_ocr(&params);
    let file = form.files.into_iter().next().ok_or(AppError::MissingFile)?;

    info!(
        request_id = %request_id,
        file_name = %file.name,
        file_size = file.size,
        use_tesseract = force_conventional_ocr,
        "Starting extraction request"
    );

    let result = process_upload(
        state.extraction.clone(),
        file,
        force_conventional_ocr,
        state.config.max_file_size,
    )
    .await
    .map_err(|e| {
        error!(request_id = %request_id, error = %e, "Extraction request failed");
        e
    })?;

    info!(
        request_id = %request_id,
        total_time_ms = start.elapsed().as_millis() as u64,
        "Request completed successfully"
    );

    Ok(Json(result))
}

pub async fn extract_batch_handler(
    State(state): State<AppState>,
    Query(params): Query<ExtractParams>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Json<BatchResponse>> {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let form = read_upload_form(&mut multipart, state.config.body_limit()).await?;
    let force_conventional_ocr = form.force_conventional_ocr(&params);

    if form.files.is_empty() {
        return Err(AppError::MissingFile);
    }
    if form.files.len() > state.config.max_batch_size {
        return Err(AppError::BatchTooLarge {
            count: form.files.len(),
            limit: state.config.max_batch_size,
        });
    }

    info!(
        request_id = %request_id,
        file_count = form.files.len(),
        use_tesseract = force_conventional_ocr,
        "Starting batch extraction request"
    );

    let mut results = Vec::with_capacity(form.files.len());
    for file in form.files {
        let filename = file.name.clone();
        let record = match process_upload(
            state.extraction.clone(),
            file,
            force_conventional_ocr,
            state.config.max_file_size,
        )
        .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(request_id = %request_id, file_name = %filename, error = %e, "Batch member failed");
                ExtractionResult::failure(filename, e.to_string())
            }
        };
        results.push(record);
    }

    let failed = results.iter().filter(|r| !r.success).count();
    info!(
        request_id = %request_id,
        total = results.len(),
        failed = failed,
        total_time_ms = start.elapsed().as_millis() as u64,
        "Batch request completed"
    );

    Ok(Json(BatchResponse::new(results)))
}

/// Size check, type detection and extraction for one upload.
pub async fn process_upload(
    extraction: Arc<ExtractionService>,
    file: UploadedFile,
    force_conventional_ocr: bool,
    max_file_size: usize,
) -> AppResult<ExtractionResult> {
    if file.size > max_file_size {
        warn!(
            file_name = %file.name,
            file_size = file.size,
            max_size = max_file_size,
            "File size exceeds limit"
        );
        return Err(AppError::FileTooLarge {
            size: file.size,
            limit: max_file_size,
        });
    }

    let result = tokio::task::spawn_blocking(move || {
        extraction.extract_file(&file, force_conventional_ocr)
    })
    .await??;

    Ok(result)
}

pub async fn read_upload_form(multipart: &mut Multipart, body_limit: usize) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "Failed to read multipart field", body_limit))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" | "files" => {
                let file_name = field.file_name().unwrap_or("unknown").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, "Failed to read file data", body_limit))?;

                debug!(file_name = %file_name, file_size = data.len(), "Read uploaded file");
                form.files.push(UploadedFile::new(file_name, data));
            }
            "use_tesseract" => {
                let raw = field.text().await.map_err(|e| {
                    AppError::invalid_parameter(format!("Failed to read use_tesseract: {}", e))
                })?;
                let value = parse_form_bool(&raw).ok_or_else(|| {
                    AppError::invalid_parameter(format!("use_tesseract must be a boolean, got '{}'", raw))
                })?;
                form.use_tesseract = Some(value);
            }
            other => {
                debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}

/// A body cut off by the request size limit is an oversized upload, not a malformed one.
fn multipart_error(err: MultipartError, context: &str, body_limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::RequestTooLarge { limit: body_limit }
    } else {
        AppError::invalid_file(format!("{}: {}", context, err))
    }
}
