//! The bridge between a conversation and a model provider.

use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use itinera_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent,
};
use thiserror::Error;
use tracing::Instrument;

use crate::conversation::{Conversation, Record, Role};

/// Fragment yielded by a reply when no provider is configured.
pub const UNCONFIGURED_NOTICE: &str =
    "Error: the model is not initialized. Please check your API key.";

const BLOCKED_MESSAGE: &str =
    "the response was blocked by the model provider";
const EMPTY_MESSAGE: &str = "the model returned an empty response";

type BoxedError = Box<dyn ModelProviderError>;
type EventStream = BoxStream<'static, Result<ModelResponseEvent, BoxedError>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> EventStream + Send + Sync>;

/// A wrapper around a model provider that erases its type and exposes
/// every reply as a plain stream of text fragments.
///
/// The gateway never remembers anything between two calls. The caller
/// passes the history explicitly, and decides afterwards whether the
/// finished reply is committed to the conversation.
#[derive(Clone)]
pub struct Gateway {
    handler_fn: Option<HandlerFn>,
    system_instruction: Option<String>,
}

impl Gateway {
    /// Creates a gateway backed by `provider`.
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `Gateway` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            trace!("got a request: {req:?}");
            let fut = provider
                .send_request(&req)
                .instrument(trace_span!("gateway request"));
            event_stream::<P, _>(fut).boxed()
        });
        Self {
            handler_fn: Some(handler_fn),
            system_instruction: None,
        }
    }

    /// Creates a gateway without a provider.
    ///
    /// Every reply of such a gateway yields [`UNCONFIGURED_NOTICE`] once
    /// and can never be committed.
    #[inline]
    pub fn unconfigured() -> Self {
        Self {
            handler_fn: None,
            system_instruction: None,
        }
    }

    /// Sets the system instruction sent with every request.
    #[inline]
    pub fn with_system_instruction<S: Into<String>>(
        mut self,
        system_instruction: S,
    ) -> Self {
        self.system_instruction = Some(system_instruction.into());
        self
    }

    /// Returns `true` if a provider is attached.
    #[inline]
    pub fn is_configured(&self) -> bool {
        self.handler_fn.is_some()
    }

    /// Sends `message` with `history` as the prior context.
    ///
    /// The request is not issued until the returned reply is polled.
    pub fn send(&self, message: &str, history: &[Record]) -> Reply {
        let state = match &self.handler_fn {
            Some(handler_fn) => {
                let mut messages: Vec<_> =
                    history.iter().map(Record::to_model_message).collect();
                messages.push(
                    Record::new(Role::User, message).to_model_message(),
                );
                let req = ModelRequest {
                    system_instruction: self.system_instruction.clone(),
                    messages,
                };
                ReplyState::Streaming(handler_fn(req))
            }
            None => {
                warn!("sending a message without a configured model");
                ReplyState::Unconfigured
            }
        };
        Reply {
            message: message.to_owned(),
            state,
            text: String::new(),
            finish_reason: None,
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

enum RequestState<F, R> {
    Sending(F),
    Receiving(Pin<Box<R>>),
    Done,
}

fn event_stream<P, F>(
    fut: F,
) -> impl Stream<Item = Result<ModelResponseEvent, BoxedError>> + Send + 'static
where
    P: ModelProvider + 'static,
    F: Future<Output = Result<P::Response, P::Error>> + Send + 'static,
{
    let init = RequestState::<F, P::Response>::Sending(fut);
    stream::unfold(init, |state| async move {
        let mut resp = match state {
            RequestState::Sending(fut) => match fut.await {
                Ok(resp) => Box::pin(resp),
                Err(err) => {
                    return Some((
                        Err(Box::new(err) as BoxedError),
                        RequestState::Done,
                    ));
                }
            },
            RequestState::Receiving(resp) => resp,
            RequestState::Done => return None,
        };

        match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
            Ok(Some(event)) => {
                trace!("got an event: {event:?}");
                Some((Ok(event), RequestState::Receiving(resp)))
            }
            Ok(None) => None,
            Err(err) => {
                Some((Err(Box::new(err) as BoxedError), RequestState::Done))
            }
        }
    })
}

/// How a reply ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The stream ran to completion.
    Completed,
    /// There was no provider to ask.
    Unconfigured,
    /// The request or the stream failed with the given message.
    Failed(String),
}

enum ReplyState {
    Unconfigured,
    Streaming(EventStream),
    Finished(ReplyOutcome),
}

/// A streaming reply to one message.
///
/// A reply is a finite stream of non-empty text fragments. Once drained,
/// it can be committed to a conversation with [`Reply::commit`].
pub struct Reply {
    message: String,
    state: ReplyState,
    text: String,
    finish_reason: Option<ModelFinishReason>,
}

impl Reply {
    /// Returns the message this reply answers.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the model text received so far.
    ///
    /// Diagnostic fragments are not part of it.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns how the reply ended, or `None` while it is still streaming.
    #[inline]
    pub fn outcome(&self) -> Option<&ReplyOutcome> {
        match &self.state {
            ReplyState::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Returns the reason the model reported for finishing, if any.
    #[inline]
    pub fn finish_reason(&self) -> Option<ModelFinishReason> {
        self.finish_reason
    }

    /// Appends this turn to `conversation`.
    ///
    /// Both the user record and the model record are appended, or
    /// neither is. Only a reply that completed with some text can be
    /// committed.
    pub fn commit(
        self,
        conversation: &mut Conversation,
    ) -> Result<(), CommitError> {
        match self.state {
            ReplyState::Finished(ReplyOutcome::Completed) => {
                conversation.append(Role::User, self.message);
                conversation.append(Role::Model, self.text);
                Ok(())
            }
            ReplyState::Finished(ReplyOutcome::Unconfigured) => {
                Err(CommitError::Unconfigured)
            }
            ReplyState::Finished(ReplyOutcome::Failed(message)) => {
                Err(CommitError::Failed(message))
            }
            ReplyState::Unconfigured | ReplyState::Streaming(_) => {
                Err(CommitError::Unfinished)
            }
        }
    }
}

impl Reply {
    /// Finishes the reply as failed and returns the diagnostic fragment.
    fn fail(&mut self, message: String) -> String {
        let fragment = format!("Sorry, I encountered an error: {message}");
        self.state = ReplyState::Finished(ReplyOutcome::Failed(message));
        fragment
    }
}

impl Stream for Reply {
    type Item = String;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match &mut this.state {
                ReplyState::Unconfigured => {
                    this.state =
                        ReplyState::Finished(ReplyOutcome::Unconfigured);
                    return Poll::Ready(Some(UNCONFIGURED_NOTICE.to_owned()));
                }
                ReplyState::Streaming(events) => {
                    match ready!(events.poll_next_unpin(cx)) {
                        Some(Ok(ModelResponseEvent::TextFragment(text))) => {
                            if text.is_empty() {
                                continue;
                            }
                            this.text.push_str(&text);
                            return Poll::Ready(Some(text));
                        }
                        Some(Ok(ModelResponseEvent::EmptyFragment)) => {}
                        Some(Ok(ModelResponseEvent::Completed(reason))) => {
                            this.finish_reason = Some(reason);
                            if reason == ModelFinishReason::Blocked {
                                warn!("the response was blocked");
                                return Poll::Ready(Some(
                                    this.fail(BLOCKED_MESSAGE.to_owned()),
                                ));
                            }
                        }
                        Some(Err(err)) => {
                            error!("got an error: {err:?}");
                            return Poll::Ready(Some(
                                this.fail(err.to_string()),
                            ));
                        }
                        None if this.text.is_empty() => {
                            warn!("the response carried no text");
                            return Poll::Ready(Some(
                                this.fail(EMPTY_MESSAGE.to_owned()),
                            ));
                        }
                        None => {
                            trace!("finished a request");
                            this.state =
                                ReplyState::Finished(ReplyOutcome::Completed);
                            return Poll::Ready(None);
                        }
                    }
                }
                ReplyState::Finished(_) => return Poll::Ready(None),
            }
        }
    }
}

impl std::fmt::Debug for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply")
            .field("message", &self.message)
            .field("text", &self.text)
            .field("outcome", &self.outcome())
            .finish_non_exhaustive()
    }
}

/// A reply could not be committed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The reply was not drained to the end.
    #[error("the reply has not finished streaming")]
    Unfinished,
    /// The reply came from an unconfigured gateway.
    #[error("the model is not initialized")]
    Unconfigured,
    /// The reply failed.
    #[error("the reply failed: {0}")]
    Failed(String),
}
