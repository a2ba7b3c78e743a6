//! Axum route handlers for card generation.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::ingest::{records_from_rows, rows_from_workbook, Row};
use crate::layout::{GridPlan, MetricsOracle};
use crate::render::logo::LogoAsset;
use crate::render::{plan_pages, render_pdf, PagePlan};
use crate::state::AppState;

const PAGES_HEADER: HeaderName = HeaderName::from_static("x-card-pages");
const OVERFLOWS_HEADER: HeaderName = HeaderName::from_static("x-card-overflows");
const JOB_HEADER: HeaderName = HeaderName::from_static("x-render-job");

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub rows: Vec<Row>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub grid: GridPlan,
    pub overflows: usize,
    pub pages: Vec<PagePlan>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cards
///
/// Multipart form: `sheet` (workbook, first worksheet is read) or `rows` (JSON array
/// of sheet rows), one of them required, and `logo` (PNG/JPEG, optional). Responds
/// with the finished PDF.
pub async fn handle_render_cards(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut rows: Option<Vec<Row>> = None;
    let mut logo_upload: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read multipart field: {e}")))?;
        match name.as_deref() {
            Some("rows") => {
                rows = Some(serde_json::from_slice(&data).map_err(|e| {
                    AppError::Validation(format!("rows must be a JSON array of objects: {e}"))
                })?);
            }
            Some("sheet") => rows = Some(rows_from_workbook(&data)?),
            Some("logo") if !data.is_empty() => logo_upload = Some(data),
            _ => {}
        }
    }

    let rows = rows
        .ok_or_else(|| AppError::Validation("missing 'sheet' or 'rows' field".to_string()))?;
    let records = records_from_rows(&rows)?;
    let logo = resolve_logo(&state, logo_upload.as_deref());
    let layout = state.config.layout;

    let job_id = Uuid::new_v4();
    info!(%job_id, cards = records.len(), "card render started");

    let (pdf, summary) =
        tokio::task::spawn_blocking(move || render_pdf(&records, &layout, logo.as_deref()))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed in card render: {e}"))
            })??;

    info!(
        %job_id,
        pages = summary.pages,
        overflows = summary.overflows,
        logo = summary.logo_used,
        bytes = pdf.len(),
        "card render finished"
    );

    let disposition = format!(
        "attachment; filename=\"precedencias-{}.pdf\"",
        Local::now().format("%Y%m%d")
    );
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(|e| AppError::Internal(e.into()))?,
    );
    headers.insert(PAGES_HEADER, HeaderValue::from(summary.pages));
    headers.insert(OVERFLOWS_HEADER, HeaderValue::from(summary.overflows));
    headers.insert(
        JOB_HEADER,
        HeaderValue::from_str(&job_id.to_string()).map_err(|e| AppError::Internal(e.into()))?,
    );

    Ok((headers, Bytes::from(pdf)).into_response())
}

/// POST /api/v1/cards/preview
///
/// Returns the composed page plans without drawing them. Uses the default logo's
/// proportions when one is configured.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let records = records_from_rows(&req.rows)?;
    let layout = state.config.layout;
    let logo = state.default_logo.as_ref().map(|asset| asset.size());

    let (grid, pages) =
        tokio::task::spawn_blocking(move || plan_pages(&MetricsOracle, &records, &layout, logo))
            .await
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed in card preview: {e}"))
            })??;

    let overflows = pages
        .iter()
        .flat_map(|page| &page.cards)
        .map(|card| card.overflow_count())
        .sum();

    Ok(Json(PreviewResponse {
        grid,
        overflows,
        pages,
    }))
}

/// An uploaded logo wins over the configured one. An upload that fails to decode
/// means no logo for this run, not the default.
fn resolve_logo(state: &AppState, upload: Option<&[u8]>) -> Option<Arc<LogoAsset>> {
    match upload {
        Some(bytes) => match LogoAsset::from_bytes("upload", bytes) {
            Ok(asset) => Some(Arc::new(asset)),
            Err(e) => {
                warn!(error = %e, "uploaded logo unusable, rendering without a logo");
                None
            }
        },
        None => state.default_logo.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ingest::tests::xlsx_bytes;
    use crate::render::logo::tests::png_bytes;
    use crate::routes::build_router;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "precedence-test-boundary";

    fn app(default_logo: Option<LogoAsset>) -> Router {
        let config = Config::from_lookup(|_| None).unwrap();
        let state = AppState {
            config,
            default_logo: default_logo.map(Arc::new),
        };
        build_router(state)
    }

    fn rows_json(n: usize) -> Value {
        let rows: Vec<Value> = (0..n)
            .map(|i| json!({"Nombre": format!("invitado {i}"), "Cargo": "vocal"}))
            .collect();
        Value::Array(rows)
    }

    fn multipart_body(rows: Option<&Value>, logo: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(rows) = rows {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"rows\"\r\n\
                     Content-Type: application/json\r\n\r\n{rows}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(logo) = logo {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"logo\"; \
                     filename=\"logo.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(logo);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn sheet_body(sheet: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"sheet\"; \
             filename=\"invitados.xlsx\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(sheet);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn cards_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/cards")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn preview_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/cards/preview")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["service"], "precedence-api");
    }

    #[tokio::test]
    async fn test_render_returns_pdf_with_summary_headers() {
        let rows = rows_json(20);
        let response = app(None)
            .oneshot(cards_request(multipart_body(Some(&rows), None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(response.headers()["x-card-pages"], "2");
        assert_eq!(response.headers()["x-card-overflows"], "0");
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("precedencias-"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_render_from_uploaded_workbook() {
        let sheet = xlsx_bytes(&[
            &["Nombre", "Cargo"],
            &["ana lópez", "directora"],
            &["luis", "vocal"],
        ]);
        let response = app(None)
            .oneshot(cards_request(sheet_body(&sheet)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-card-pages"], "1");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_unreadable_workbook_is_unprocessable() {
        let response = app(None)
            .oneshot(cards_request(sheet_body(b"plain text, not a workbook")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_render_with_uploaded_logo() {
        let rows = rows_json(3);
        let logo = png_bytes(60, 30);
        let response = app(None)
            .oneshot(cards_request(multipart_body(Some(&rows), Some(&logo))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-card-pages"], "1");
    }

    #[tokio::test]
    async fn test_broken_logo_still_renders() {
        let rows = rows_json(2);
        let response = app(None)
            .oneshot(cards_request(multipart_body(Some(&rows), Some(b"not an image"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_rows_field_is_bad_request() {
        let logo = png_bytes(4, 4);
        let response = app(None)
            .oneshot(cards_request(multipart_body(None, Some(&logo))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_empty_sheet_is_unprocessable() {
        let response = app(None)
            .oneshot(cards_request(multipart_body(Some(&json!([])), None)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "INGEST_ERROR");
    }

    #[tokio::test]
    async fn test_preview_returns_page_plans() {
        let response = app(None)
            .oneshot(preview_request(json!({ "rows": rows_json(15) })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["grid"]["slots_per_page"], 14);
        let pages = body["pages"].as_array().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0]["cards"].as_array().unwrap().len(), 14);
        assert_eq!(pages[1]["cards"].as_array().unwrap().len(), 1);
        assert_eq!(pages[1]["cards"][0]["name"]["text"], "INVITADO 14");
        assert!(pages[0]["cards"][0]["logo"].is_null());
    }

    #[tokio::test]
    async fn test_preview_uses_default_logo() {
        let logo = LogoAsset::from_bytes("logo.png", &png_bytes(40, 20)).unwrap();
        let response = app(Some(logo))
            .oneshot(preview_request(json!({ "rows": rows_json(1) })))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert!(body["pages"][0]["cards"][0]["logo"].is_object());
    }
}
