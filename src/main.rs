use acquaint::api;
use acquaint::logger::*;
use acquaint::server::*;
use acquaint::settings::*;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use warp::Filter;

fn ensure_file(path: &str, what: &str) -> anyhow::Result<()> {
    if !fs::metadata(path)?.is_file() {
        return Err(anyhow::anyhow!("TLS {} is not a regular file: {:?}", what, path));
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("could not register SIGINT: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    let address: SocketAddr = project_settings.http.address.parse()?;
    let tls = match (&project_settings.http.cert_path, &project_settings.http.key_path) {
        (Some(cert), Some(key)) => {
            ensure_file(cert, "cert")?;
            ensure_file(key, "key")?;
            Some((cert.clone(), key.clone()))
        }
        _ => None,
    };

    let server = Arc::new(Server::try_new(&project_settings).await?);

    let api_v1 = warp::path("api")
        .and(warp::path("v1"))
        .and(api::v1::routes(server.clone()))
        .recover(api::v1::recover_error);

    match tls {
        Some((cert, key)) => {
            info!(%address, "serving https");
            warp::serve(api_v1)
                .tls()
                .cert_path(cert)
                .key_path(key)
                .bind_with_graceful_shutdown(address, shutdown_signal())
                .1
                .await;
        }
        None => {
            warn!(%address, "no TLS cert configured, serving plain http");
            let (_, serving) = warp::serve(api_v1)
                .try_bind_with_graceful_shutdown(address, shutdown_signal())?;
            serving.await;
        }
    }

    let shutdown_timeout = std::time::Duration::from_secs(100);
    match tokio::time::timeout(shutdown_timeout, server.shutdown()).await {
        Ok(_) => info!("server shutdown successfully"),
        Err(_) => error!("server shutdown timed out"),
    }

    Ok(())
}
