//! Effect execution
//!
//! The [`Dispatcher`] runs effects on the tokio runtime and feeds resulting
//! messages into the engine channel. Execution may be concurrent; delivery is
//! not, because the engine drains the channel one message at a time.

use futures_util::future::{join_all, BoxFuture};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::effect::Effect;
use crate::message::Message;

/// Runs effects and delivers their messages to the update loop
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Message>,
}

impl Dispatcher {
    pub fn new(tx: mpsc::Sender<Message>) -> Self {
        Self { tx }
    }

    /// Execute an effect.
    ///
    /// Messages that need no execution are enqueued synchronously, so the
    /// messages emitted by one update keep their order. Whatever is left runs
    /// on a spawned task whose handle is returned.
    ///
    /// Once the channel is full, every later bare message is held back and
    /// delivered in order by that task, ahead of the remaining effect.
    pub fn dispatch(&self, effect: Effect) -> Option<JoinHandle<()>> {
        let mut overflow = Vec::new();
        let rest = self.enqueue_immediate(effect, &mut overflow);
        let rest = if overflow.is_empty() {
            rest
        } else {
            warn!(
                "Message channel full, delivering {} message(s) asynchronously",
                overflow.len()
            );
            Effect::sequence(overflow.into_iter().map(Effect::message).chain([rest]))
        };
        if rest.is_none() {
            return None;
        }
        Some(tokio::spawn(execute(rest, self.tx.clone())))
    }

    /// Enqueue bare messages, returning the part of `effect` still to run.
    ///
    /// In a sequence only the leading messages qualify; everything after the
    /// first real effect must wait for it.
    fn enqueue_immediate(&self, effect: Effect, overflow: &mut Vec<Message>) -> Effect {
        match effect {
            Effect::Message(msg) => {
                self.enqueue(msg, overflow);
                Effect::None
            }
            Effect::Batch(effects) => Effect::batch(
                effects
                    .into_iter()
                    .map(|e| self.enqueue_immediate(e, overflow))
                    .collect::<Vec<_>>(),
            ),
            Effect::Sequence(effects) => {
                let mut effects = effects.into_iter();
                let mut rest = Vec::new();
                for effect in effects.by_ref() {
                    match effect {
                        Effect::Message(msg) => self.enqueue(msg, overflow),
                        other => {
                            rest.push(other);
                            break;
                        }
                    }
                }
                rest.extend(effects);
                Effect::sequence(rest)
            }
            other => other,
        }
    }

    fn enqueue(&self, msg: Message, overflow: &mut Vec<Message>) {
        if !overflow.is_empty() {
            overflow.push(msg);
            return;
        }
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(msg)) => overflow.push(msg),
            Err(mpsc::error::TrySendError::Closed(msg)) => {
                debug!("Message channel closed, dropping {}", msg.name());
            }
        }
    }
}

/// Run an effect to completion, delivering each produced message.
///
/// `Batch` children run as separate tasks; `Sequence` children are awaited
/// one after another.
pub fn execute(effect: Effect, tx: mpsc::Sender<Message>) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        match effect {
            Effect::None => {}
            Effect::Message(msg) => deliver(&tx, msg).await,
            Effect::Future(future) => {
                if let Some(msg) = future.await {
                    deliver(&tx, msg).await;
                }
            }
            Effect::Batch(effects) => {
                let handles: Vec<_> = effects
                    .into_iter()
                    .map(|effect| tokio::spawn(execute(effect, tx.clone())))
                    .collect();
                for result in join_all(handles).await {
                    if let Err(e) = result {
                        if e.is_panic() {
                            warn!("Batched effect panicked: {}", e);
                        }
                    }
                }
            }
            Effect::Sequence(effects) => {
                for effect in effects {
                    execute(effect, tx.clone()).await;
                }
            }
        }
    })
}

async fn deliver(tx: &mpsc::Sender<Message>, msg: Message) {
    let name = msg.name();
    if tx.send(msg).await.is_err() {
        debug!("Message channel closed, dropping {}", name);
    }
}
