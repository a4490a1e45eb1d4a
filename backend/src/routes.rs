use std::time::Instant;

use actix_multipart::{Multipart, MultipartError};
use actix_web::{get, post, web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use log::{error, info, warn};
use scene_inference::Pipeline;

use crate::models::{ErrorDetail, WelcomeResponse};

/// Multipart field carrying the uploaded image.
pub const FILE_FIELD: &str = "file";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(predict);
}

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(WelcomeResponse::default())
}

#[post("/predict")]
pub async fn predict(pipeline: web::Data<Pipeline>, payload: Multipart) -> impl Responder {
    let start_time = Instant::now();

    let contents = match read_upload(payload).await {
        Ok(Some(contents)) => contents,
        Ok(None) => {
            warn!("Prediction request without a '{}' field", FILE_FIELD);
            return HttpResponse::BadRequest().json(ErrorDetail::new("No file provided"));
        }
        Err(e) => {
            warn!("Malformed multipart upload: {}", e);
            return HttpResponse::BadRequest().json(ErrorDetail::new(e.to_string()));
        }
    };

    info!("Received {} byte upload", contents.len());

    let pipeline = pipeline.into_inner();
    match web::block(move || pipeline.predict(&contents)).await {
        Ok(Ok(prediction)) => {
            info!(
                "Prediction: {} ({:.3}) in {} ms",
                prediction.label,
                prediction.confidence,
                start_time.elapsed().as_millis()
            );
            HttpResponse::Ok().json(prediction.to_http())
        }
        Ok(Err(e)) => {
            error!(
                "Prediction failed after {} ms: {}",
                start_time.elapsed().as_millis(),
                e
            );
            HttpResponse::InternalServerError().json(ErrorDetail::new(e.to_string()))
        }
        Err(e) => {
            error!("Blocking task failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorDetail::new(e.to_string()))
        }
    }
}

pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(ErrorDetail::new("Not Found"))
}

/// Collects the bytes of the `file` field, draining any other fields.
async fn read_upload(mut payload: Multipart) -> Result<Option<Vec<u8>>, MultipartError> {
    while let Some(mut field) = payload.try_next().await? {
        let is_file = field.content_disposition().get_name() == Some(FILE_FIELD);

        let mut contents = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if is_file {
                contents.extend_from_slice(&chunk);
            }
        }

        if is_file {
            return Ok(Some(contents));
        }
    }
    Ok(None)
}
