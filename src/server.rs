//! HTTP boundary for the presentation layer.
//!
//! Every failure leaves as `{"error": "..."}`: validation problems are 400,
//! everything else is 500.

use crate::{
    config::{Config, EncoderConfig},
    error::{DoodleError, Result},
    models::{ErrorResponse, ExportRequest, Frame, FrameSet, GenerateRequest, GenerateResponse},
    pipeline::Pipeline,
};
use actix_web::{
    get,
    http::{header, StatusCode},
    post, web, App, HttpResponse, HttpServer, ResponseError,
};

impl ResponseError for DoodleError {
    fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[post("/generate")]
async fn generate(
    pipeline: web::Data<Pipeline>,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse> {
    let prompt = body.into_inner().prompt.unwrap_or_default();
    let generated = pipeline.run_generation(&prompt).await?;
    Ok(HttpResponse::Ok().json(GenerateResponse::from(&generated)))
}

#[post("/export")]
async fn export(
    pipeline: web::Data<Pipeline>,
    body: web::Json<ExportRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();
    let frames = request
        .frames
        .iter()
        .map(|f| Frame::from_data_url(f.frame_number, &f.data_url))
        .collect::<Result<Vec<_>>>()?;

    let defaults = *pipeline.encoder_config();
    let config = EncoderConfig {
        width: request.width.unwrap_or(defaults.width),
        height: request.height.unwrap_or(defaults.height),
        fps: request.fps.unwrap_or(defaults.fps),
        ..defaults
    };

    // encoding is CPU-bound; keep it off the worker thread
    let pipeline = pipeline.clone();
    let animation = web::block(move || pipeline.run_export_with(&FrameSet::from_frames(frames), &config))
        .await
        .map_err(|e| DoodleError::unknown(format!("export task failed: {}", e)))??;

    Ok(HttpResponse::Ok()
        .content_type(animation.media_type())
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", animation.download_file_name()),
        ))
        .body(animation.bytes))
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// JSON extractor settings: body size limit and 400 responses for unreadable bodies.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            DoodleError::validation(format!("Invalid request body: {}", err)).into()
        })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(generate).service(export).service(health);
}

pub async fn run(config: Config, pipeline: Pipeline) -> std::io::Result<()> {
    let data = web::Data::new(pipeline);
    let limit = config.json_limit_bytes;

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(json_config(limit))
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
