//! Conversation log and the send flow over a [`ChatGateway`].
//!
//! Every send appends the user's message and takes its turn on a single
//! in-flight lane in one step, then hands the gateway call to a spawned task.
//! Replies therefore land in the log in the same order as the messages they
//! answer, and each one records the id of its user message in `in_reply_to`.
//! Dropping the `send_message` future does not cancel the exchange; its reply
//! is still appended.
//!
//! Gateway failures never reach the caller. They become one assistant message
//! carrying [`FALLBACK_REPLY`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use glt_core::{Badge, Message, MessageId};
use tokio::sync::oneshot;
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, ChatGateway, ChatReply};
use crate::error::ClientError;
use crate::services::catalog::ProductCatalog;
use crate::services::tokens::TokenStore;

/// Assistant text appended when a send fails for any reason.
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't process your message. Please try again.";

/// Conversation state plus the gateway it talks to.
///
/// Cheap to clone; clones share the log, the lane and the badge queue.
pub struct ChatService<G: ChatGateway> {
    inner: Arc<ChatInner<G>>,
}

impl<G: ChatGateway> Clone for ChatService<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ChatInner<G> {
    gateway: G,
    tokens: TokenStore,
    catalog: ProductCatalog,
    log: RwLock<Vec<Message>>,
    in_flight: Arc<AtomicUsize>,
    /// Completion signal of the most recently queued send.
    lane: Mutex<Option<oneshot::Receiver<()>>>,
    badges: Mutex<VecDeque<Badge>>,
}

impl<G: ChatGateway> ChatService<G> {
    #[must_use]
    pub fn new(gateway: G, tokens: TokenStore, catalog: ProductCatalog) -> Self {
        Self {
            inner: Arc::new(ChatInner {
                gateway,
                tokens,
                catalog,
                log: RwLock::new(Vec::new()),
                in_flight: Arc::new(AtomicUsize::new(0)),
                lane: Mutex::new(None),
                badges: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Send a message and wait for the assistant's answer.
    ///
    /// The text is trimmed first. The returned message is the one appended to
    /// the log, which is the fallback apology if the gateway failed.
    ///
    /// # Errors
    ///
    /// Returns `EmptyMessage` if the text is blank; nothing is appended then.
    #[instrument(skip(self, text), fields(chars = text.len()))]
    pub async fn send_message(&self, text: &str) -> Result<Message, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let user_message = Message::user(text);
        let user_id = user_message.id;
        let typing = TypingGuard::start(Arc::clone(&self.inner.in_flight));
        let (turn, previous) = self.inner.enqueue(user_message);

        let inner = Arc::clone(&self.inner);
        let text = text.to_string();
        let exchange = tokio::spawn(async move {
            let _typing = typing;
            let _turn = turn;
            if let Some(previous) = previous {
                // A dropped sender also means the previous turn is over
                let _ = previous.await;
            }
            let reply = inner.exchange(&text, user_id).await;
            inner.append(reply.clone());
            reply
        });

        match exchange.await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!(error = %e, message_id = %user_id, "Chat send task failed");
                let reply = Message::assistant(FALLBACK_REPLY, user_id);
                self.inner.append(reply.clone());
                Ok(reply)
            }
        }
    }

    /// Snapshot of the conversation, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner
            .log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .log
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any reply is still outstanding.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Drain badges earned since the last call, in the order they arrived.
    #[must_use]
    pub fn take_badge_notifications(&self) -> Vec<Badge> {
        self.inner
            .badges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// The catalog replies feed into.
    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }
}

impl<G: ChatGateway> ChatInner<G> {
    /// Call the gateway for one user message and build the assistant reply.
    async fn exchange(&self, text: &str, user_id: MessageId) -> Message {
        let result = match self.tokens.access_token() {
            Some(token) => self.gateway.send_message(&token, text).await,
            None => Err(ApiError::NotAuthenticated),
        };

        match result {
            Ok(reply) => self.resolve(reply, user_id),
            Err(e) => {
                warn!(error = %e, message_id = %user_id, "Chat send failed");
                Message::assistant(FALLBACK_REPLY, user_id)
            }
        }
    }
}

impl<G> ChatInner<G> {
    /// Append a user message and queue its turn behind every earlier send.
    fn enqueue(
        &self,
        message: Message,
    ) -> (oneshot::Sender<()>, Option<oneshot::Receiver<()>>) {
        let (turn, next) = oneshot::channel();
        let mut log = self.log.write().unwrap_or_else(PoisonError::into_inner);
        let previous = self
            .lane
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(next);
        log.push(message);
        (turn, previous)
    }

    fn append(&self, message: Message) {
        self.log
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    fn resolve(&self, reply: ChatReply, in_reply_to: MessageId) -> Message {
        let ChatReply {
            response,
            products,
            suggestions,
            badges_earned,
        } = reply;

        self.catalog.upsert_all(products.iter().cloned());

        if !badges_earned.is_empty() {
            debug!(count = badges_earned.len(), "Queued badge notifications");
            self.badges
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend(badges_earned.iter().cloned());
        }

        Message::assistant(response, in_reply_to)
            .with_suggestions(suggestions)
            .with_products(products)
            .with_badges(badges_earned)
    }
}

/// Counts one outstanding send for as long as it lives.
struct TypingGuard(Arc<AtomicUsize>);

impl TypingGuard {
    fn start(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for TypingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
