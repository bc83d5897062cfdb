use actix_cors::*;
use actix_web::*;
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};

use log::*;
use std::process::exit;
use std::thread;
use std::time::Duration;

use tkb_scheduler_server::background::*;
use tkb_scheduler_server::config::*;
use tkb_scheduler_server::error::*;
use tkb_scheduler_server::generator::*;
use tkb_scheduler_server::routes::*;

fn to_io_error(e: TkbError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
}

fn ssl_builder(tls: &TlsFiles) -> TkbResult<SslAcceptorBuilder> {
    let config_error = |e: openssl::error::ErrorStack| TkbError::Config(e.to_string());

    let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls()).map_err(config_error)?;
    builder
        .set_private_key_file(&tls.private_key, SslFiletype::PEM)
        .map_err(config_error)?;
    builder
        .set_certificate_chain_file(&tls.certificate_chain)
        .map_err(config_error)?;

    Ok(builder)
}

/// Runs the actix_web server in the main thread until it is stopped.
async fn async_main() -> std::io::Result<()> {
    let config = ServerConfig::from_env();

    info!("Loading fonts...");
    let renderer = GridRenderer::from_font_stack(&config.fonts);

    let background = BackgroundSource::parse(&config.background).map_err(to_io_error)?;
    info!("Background template: {}", background.describe());

    let state = web::Data::new(AppState::new(renderer, background));
    let max_body_bytes = config.max_body_bytes;

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_header()
            .allow_any_method()
            .send_wildcard()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(|cfg| configure(cfg, max_body_bytes))
    });

    let server = match &config.tls {
        Some(tls) => {
            info!("Binding {} with TLS", config.address);
            server.bind_openssl(&config.address, ssl_builder(tls).map_err(to_io_error)?)?
        }
        None => {
            info!("Binding {}", config.address);
            server.bind(&config.address)?
        }
    };

    server.run().await
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Exiting...");
        thread::sleep(Duration::from_secs(1));
        exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    info!("Timetable image server starting up...");

    let result = actix_web::rt::System::with_tokio_rt(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("main-tokio")
            .build()
            .expect("Could not build tokio runtime")
    })
    .block_on(async_main());

    if let Err(e) = result {
        error!("Server stopped with error: {}", e);
        exit(1);
    }
}
