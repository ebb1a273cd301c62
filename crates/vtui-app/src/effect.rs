//! Deferred units of work returned by update handlers
//!
//! An [`Effect`] is a pure descriptor until the [`Dispatcher`](crate::dispatch::Dispatcher)
//! executes it. Running one may perform I/O concurrently, but the resulting
//! [`Message`] only ever re-enters the application through the serialized
//! update loop.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::message::Message;

/// Boxed future yielding at most one message
pub type EffectFuture = Pin<Box<dyn Future<Output = Option<Message>> + Send + 'static>>;

/// A deferred computation producing zero or one message, or a composite of
/// effects run concurrently (`Batch`) or one after another (`Sequence`).
#[derive(Default)]
pub enum Effect {
    /// Do nothing
    #[default]
    None,

    /// Deliver a message on the next loop iteration
    Message(Message),

    /// Run a future and deliver its message, if any
    Future(EffectFuture),

    /// Run every child concurrently; no ordering among siblings
    Batch(Vec<Effect>),

    /// Run children one at a time, each to completion before the next
    Sequence(Vec<Effect>),
}

impl Effect {
    pub fn none() -> Self {
        Effect::None
    }

    pub fn message(msg: Message) -> Self {
        Effect::Message(msg)
    }

    /// Wrap a future yielding an optional message
    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Option<Message>> + Send + 'static,
    {
        Effect::Future(Box::pin(future))
    }

    /// Run a future and map its output to a message
    pub fn perform<F, T>(future: F, to_msg: impl FnOnce(T) -> Message + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Effect::future(async move {
            let result = future.await;
            Some(to_msg(result))
        })
    }

    /// Deliver `msg` once `delay` has elapsed, measured from now rather than
    /// from when the effect is first polled
    pub fn after(delay: Duration, msg: Message) -> Self {
        let deadline = tokio::time::Instant::now() + delay;
        Effect::future(async move {
            tokio::time::sleep_until(deadline).await;
            Some(msg)
        })
    }

    /// Concurrent composition. `None` children are dropped, nested batches
    /// are flattened and trivial batches collapse.
    pub fn batch(effects: impl IntoIterator<Item = Effect>) -> Self {
        let mut flat = Vec::new();
        for effect in effects {
            match effect {
                Effect::None => {}
                Effect::Batch(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        let mut effects = flat;
        match effects.len() {
            0 => Effect::None,
            1 => effects.pop().unwrap_or_default(),
            _ => Effect::Batch(effects),
        }
    }

    /// Ordered composition. `None` children are dropped, nested sequences
    /// are flattened and trivial sequences collapse.
    pub fn sequence(effects: impl IntoIterator<Item = Effect>) -> Self {
        let mut flat = Vec::new();
        for effect in effects {
            match effect {
                Effect::None => {}
                Effect::Sequence(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        let mut effects = flat;
        match effects.len() {
            0 => Effect::None,
            1 => effects.pop().unwrap_or_default(),
            _ => Effect::Sequence(effects),
        }
    }

    /// Run `self` and `other` concurrently
    pub fn and(self, other: Effect) -> Self {
        Effect::batch([self, other])
    }

    /// Run `other` once `self` has completed
    pub fn then(self, other: Effect) -> Self {
        Effect::sequence([self, other])
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Effect::None)
    }

    /// Messages carried directly by this effect tree, in declaration order.
    ///
    /// Futures are opaque and contribute nothing.
    pub fn immediate_messages(&self) -> Vec<&Message> {
        let mut out = Vec::new();
        self.collect_messages(&mut out);
        out
    }

    fn collect_messages<'a>(&'a self, out: &mut Vec<&'a Message>) {
        match self {
            Effect::None | Effect::Future(_) => {}
            Effect::Message(msg) => out.push(msg),
            Effect::Batch(effects) | Effect::Sequence(effects) => {
                for effect in effects {
                    effect.collect_messages(out);
                }
            }
        }
    }

    /// Number of futures in this effect tree
    pub fn future_count(&self) -> usize {
        match self {
            Effect::None | Effect::Message(_) => 0,
            Effect::Future(_) => 1,
            Effect::Batch(effects) | Effect::Sequence(effects) => {
                effects.iter().map(Effect::future_count).sum()
            }
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::None => f.write_str("None"),
            Effect::Message(msg) => f.debug_tuple("Message").field(&msg.name()).finish(),
            Effect::Future(_) => f.write_str("Future(..)"),
            Effect::Batch(effects) => f.debug_tuple("Batch").field(effects).finish(),
            Effect::Sequence(effects) => f.debug_tuple("Sequence").field(effects).finish(),
        }
    }
}

impl From<Message> for Effect {
    fn from(msg: Message) -> Self {
        Effect::Message(msg)
    }
}

impl From<Option<Message>> for Effect {
    fn from(msg: Option<Message>) -> Self {
        msg.map(Effect::Message).unwrap_or_default()
    }
}
