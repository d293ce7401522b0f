use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use human_panic::setup_panic;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;

use smart_attendance::config::AppConfig;
use smart_attendance::routes;
use smart_attendance::runtime::lifetime;
use smart_attendance::runtime::lifetime::startup::StartupContext;
use smart_attendance::utils::{json_error_handler, path_error_handler, query_error_handler};

/// 初始化日志：开发环境输出文件与行号，其他环境输出 JSON
fn init_tracing(config: &AppConfig) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.app.log_level))
        .with_writer(writer)
        .event_format(
            tracing_subscriber::fmt::format()
                .with_level(true)
                .with_ansi(true),
        );

    if config.is_development() {
        builder.with_file(true).with_line_number(true).init();
    } else {
        builder.json().init();
    }
    guard
}

/// 创建 HTTP 服务，每个 worker 共享同一份启动上下文
fn build_server(config: &'static AppConfig, startup: StartupContext) -> std::io::Result<Server> {
    let StartupContext {
        storage,
        photos,
        encoder,
        cache,
        attendance,
    } = startup;
    let timeouts = &config.server.timeouts;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(config.cors.max_age),
            )
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add((
                        "Keep-Alive",
                        format!("timeout={}, max=1000", config.server.timeouts.keep_alive),
                    ))
                    // 照片下载会设置自己的 Cache-Control
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::PayloadConfig::new(
                config.server.limits.max_payload_size,
            ))
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(photos.clone()))
            .app_data(web::Data::new(encoder.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(attendance.clone()))
            .configure(routes::configure_routes)
    })
    .keep_alive(Duration::from_secs(timeouts.keep_alive))
    .client_request_timeout(Duration::from_millis(timeouts.client_request))
    .client_disconnect_timeout(Duration::from_millis(timeouts.client_disconnect))
    .workers(config.server.workers);

    #[cfg(unix)]
    if let Some(socket_path) = config.unix_socket_path() {
        warn!("Listening on Unix socket: {}", socket_path);
        if std::path::Path::new(socket_path).exists() {
            std::fs::remove_file(socket_path)?;
        }
        return Ok(server.bind_uds(socket_path)?.run());
    }

    let bind_address = config.server_bind_address();
    warn!("Listening on http://{}", bind_address);
    Ok(server.bind(bind_address)?.run())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    let started = chrono::Utc::now();

    setup_panic!();
    AppConfig::init().expect("Failed to initialize configuration");
    let config = AppConfig::get();
    let _guard = init_tracing(config);

    warn!(
        "{} {} ({}) starting in {} mode",
        config.app.system_name,
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_NAME"),
        config.app.environment
    );

    let startup = lifetime::startup::prepare_server_startup().await;
    debug!(
        "Pre-startup processing completed in {} ms",
        (chrono::Utc::now() - started).num_milliseconds()
    );
    warn!(
        "{} workers, match tolerance {}, uploads in {}",
        config.server.workers, startup.attendance.tolerance, config.upload.dir
    );

    let server = build_server(config, startup)?;
    let handle = server.handle();

    tokio::select! {
        res = server => res?,
        _ = lifetime::shutdown::listen_for_shutdown() => {
            handle.stop(true).await;
            warn!("Graceful shutdown: all workers stopped");
        }
    }

    Ok(())
}
