//! SIGINT/SIGTERM forwarding into the message loop
//!
//! A received signal becomes a `Message::Quit`, so shutdown goes through the
//! same path as a quit key: the loop stops and the engine cancels every
//! registered task.

use std::future::Future;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use vtui_core::prelude::*;

use crate::message::Message;

/// Spawn the signal listener. It exits without sending anything once
/// `shutdown_rx` reads `true`.
pub fn spawn_signal_handler(
    tx: mpsc::Sender<Message>,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(quit_on(wait_for_signal(), tx, shutdown_rx))
}

async fn quit_on<F>(signal: F, tx: mpsc::Sender<Message>, shutdown_rx: watch::Receiver<bool>)
where
    F: Future<Output = Result<&'static str>>,
{
    tokio::select! {
        received = signal => match received {
            Ok(name) => {
                info!("{} received, quitting", name);
                if tx.send(Message::Quit).await.is_err() {
                    debug!("Engine gone before quit could be delivered");
                }
            }
            Err(e) => error!("Signal listener failed: {}", e),
        },
        _ = shutdown_started(shutdown_rx) => {
            debug!("Signal listener stopping");
        }
    }
}

async fn shutdown_started(mut shutdown_rx: watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stopping| *stopping).await;
}

/// Resolve with the name of the first termination signal
async fn wait_for_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let listen = |kind: SignalKind, name: &str| {
            signal(kind).map_err(|e| Error::terminal(format!("cannot listen for {}: {}", name, e)))
        };
        let mut sigint = listen(SignalKind::interrupt(), "SIGINT")?;
        let mut sigterm = listen(SignalKind::terminate(), "SIGTERM")?;

        Ok(tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        })
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| Error::terminal(format!("cannot listen for Ctrl+C: {}", e)))?;
        Ok("Ctrl+C")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_signal_becomes_quit() {
        let (tx, mut rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (fire, fired) = oneshot::channel::<()>();

        let listener = tokio::spawn(quit_on(
            async move {
                let _ = fired.await;
                Ok("SIGINT")
            },
            tx,
            shutdown_rx,
        ));
        assert!(rx.try_recv().is_err());

        fire.send(()).unwrap();
        listener.await.unwrap();
        assert!(matches!(rx.recv().await, Some(Message::Quit)));
    }

    #[tokio::test]
    async fn test_listener_error_sends_nothing() {
        let (tx, mut rx) = mpsc::channel(1);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        quit_on(async { Err(Error::terminal("no signals here")) }, tx, shutdown_rx).await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_handler_exits_on_shutdown() {
        let (tx, mut rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = spawn_signal_handler(tx, shutdown_rx);
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(rx.recv().await.is_none());
    }
}
