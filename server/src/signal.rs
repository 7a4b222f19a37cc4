use log::debug;
use tokio::sync::watch;

#[cfg(windows)]
async fn wait_shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        debug!("error, ctrl_c, {:?}", e);
    }
    debug!("recv ctrl_c, shutdown");
}

#[cfg(unix)]
async fn wait_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(v) => v,
        Err(e) => {
            debug!("error, signal, {:?}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = terminate.recv() => {
            debug!("recv unix terminate signal");
        },
        s = tokio::signal::ctrl_c() => {
            debug!("recv unix ctrl_c signal, {:?}", s);
        }
    }
}

/// Spawns the signal listener; the receiver flips to `true` on shutdown.
pub fn shutdown_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        wait_shutdown().await;
        if tx.send(true).is_err() {
            debug!("no service left to notify");
        }
    });

    rx
}
