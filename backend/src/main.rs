pub mod models;
pub mod routes;

use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, App, HttpServer};
use log::{error, info};
use scene_inference::Pipeline;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    scene_inference::init_logging();

    info!("🚀 Starting Intel Image Classification API");

    // Load the model once; every worker shares it read-only
    let pipeline = match Pipeline::from_env() {
        Ok(pipeline) => {
            info!("✅ Model loaded");
            pipeline
        }
        Err(e) => {
            error!("❌ {}", e);
            panic!("Unable to load model: {}", e);
        }
    };

    let pipeline_data = web::Data::new(pipeline);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = parse_port(std::env::var("PORT").ok().as_deref())?;
    let workers = parse_workers(std::env::var("WORKERS").ok().as_deref())?;

    let bind_address = format!("{}:{}", host, port);

    info!("🌐 Listening on http://{}", bind_address);
    info!("👷 Workers: {}", workers);
    info!("   GET  /         - Welcome message");
    info!("   POST /predict  - Classify an uploaded image (multipart field 'file')");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .app_data(pipeline_data.clone())
            .configure(routes::configure)
            .default_service(web::route().to(routes::not_found))
    })
    .workers(workers)
    .bind(&bind_address)?
    .run()
    .await
}

fn invalid_input(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, message)
}

fn parse_port(value: Option<&str>) -> std::io::Result<u16> {
    match value {
        Some(port) => port
            .trim()
            .parse()
            .map_err(|e| invalid_input(format!("invalid PORT '{}': {}", port, e))),
        None => Ok(8080),
    }
}

// actix panics on zero workers
fn parse_workers(value: Option<&str>) -> std::io::Result<usize> {
    match value {
        Some(workers) => match workers.trim().parse::<usize>() {
            Ok(0) => Err(invalid_input("WORKERS must be at least 1".to_string())),
            Ok(n) => Ok(n),
            Err(e) => Err(invalid_input(format!("invalid WORKERS '{}': {}", workers, e))),
        },
        None => Ok(num_cpus::get()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_and_validates() {
        assert_eq!(parse_port(None).unwrap(), 8080);
        assert_eq!(parse_port(Some("9696")).unwrap(), 9696);
        assert_eq!(
            parse_port(Some("http")).unwrap_err().kind(),
            std::io::ErrorKind::InvalidInput
        );
    }

    #[test]
    fn workers_reject_zero_and_garbage() {
        assert_eq!(parse_workers(None).unwrap(), num_cpus::get());
        assert_eq!(parse_workers(Some("4")).unwrap(), 4);
        for bad in ["0", "many", "-2", ""] {
            let err = parse_workers(Some(bad)).unwrap_err();
            assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput, "WORKERS={bad}");
        }
    }
}
