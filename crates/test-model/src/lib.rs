//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use itinera_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
    ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    preset: PresetResponse,
    delay: Duration,
    event_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl TestModelResponse {
    fn next_event(&mut self) -> Result<Option<ModelResponseEvent>, Error> {
        let preset_events = &self.preset.events;
        if self.preset.fail_after == Some(self.event_idx) {
            // Stay failed if polled again.
            return Err(Error {
                message: "connection reset by peer",
                kind: ErrorKind::Other,
            });
        }

        if self.event_idx < preset_events.len() {
            let event = match &preset_events[self.event_idx] {
                PresetEvent::Text(text) => {
                    ModelResponseEvent::TextFragment(text.clone())
                }
                PresetEvent::Empty => ModelResponseEvent::EmptyFragment,
            };
            self.event_idx += 1;
            Ok(Some(event))
        } else if self.event_idx == preset_events.len() {
            self.event_idx += 1;
            let reason = self.preset.finish_reason;
            Ok(Some(ModelResponseEvent::Completed(reason)))
        } else {
            // In case this method is called after completion.
            Ok(None)
        }
    }
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;
            return Poll::Ready(this.next_event());
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the turn script, which is
/// how the model should respond to each turn. The turn is selected by the
/// number of user messages in the request, so a fresh conversation always
/// starts from the first preset. If there are no enough presets in the
/// script, the request is rejected.
///
/// Every received request is recorded and can be inspected later with
/// [`TestModelProvider::requests`], clones of the provider share the
/// same record.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    turn_script: Vec<PresetResponse>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    /// Appends the response for the next turn.
    #[inline]
    pub fn add_turn(&mut self, preset: PresetResponse) {
        self.turn_script.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModelProvider")
            .field("turns", &self.turn_script.len())
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }

        let preset = req
            .user_turns()
            .checked_sub(1)
            .and_then(|idx| self.turn_script.get(idx));
        let result = match preset {
            Some(preset) => Ok(TestModelResponse {
                preset: preset.clone(),
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                event_idx: 0,
                sleep: None,
            }),
            None => Err(Error {
                message: "no enough turns",
                kind: ErrorKind::RateLimitExceeded,
            }),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use itinera_model::{ModelFinishReason, ModelMessage};

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> (String, Result<(), Error>) {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        loop {
            let event = match poll_fn(|cx| resp.as_mut().poll_next_event(cx))
                .await
            {
                Ok(Some(event)) => event,
                Ok(None) => return (msg, Ok(())),
                Err(err) => return (msg, Err(err)),
            };
            match event {
                ModelResponseEvent::Completed(_) => return (msg, Ok(())),
                ModelResponseEvent::TextFragment(text) => msg.push_str(&text),
                ModelResponseEvent::EmptyFragment => {}
            }
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_turn(PresetResponse::with_events([
            PresetEvent::Text("Day 1: ".to_owned()),
            PresetEvent::Empty,
            PresetEvent::Text("Louvre".to_owned()),
        ]));
        provider.add_turn(PresetResponse::with_text([
            "Sure, ",
            "picnic instead.",
        ]));

        let mut req = ModelRequest {
            system_instruction: None,
            messages: vec![ModelMessage::User("Plan Paris".to_owned())],
        };
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, result) = collect_response(resp).await;
        assert!(result.is_ok());
        assert_eq!(msg, "Day 1: Louvre");

        req.messages.push(ModelMessage::Model(msg));
        req.messages
            .push(ModelMessage::User("Make it cheaper".to_owned()));
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, result) = collect_response(resp).await;
        assert!(result.is_ok());
        assert_eq!(msg, "Sure, picnic instead.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_fail_after() {
        let mut provider = TestModelProvider::default();
        provider.add_turn(
            PresetResponse::with_text(["Day 1", "Day 2", "Day 3"])
                .failing_after(2),
        );

        let req = ModelRequest {
            system_instruction: None,
            messages: vec![ModelMessage::User("Plan Paris".to_owned())],
        };
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, result) = collect_response(resp).await;
        assert_eq!(msg, "Day 1Day 2");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_finish_reason() {
        let mut provider = TestModelProvider::default();
        provider.add_turn(
            PresetResponse::with_events([PresetEvent::Empty])
                .with_finish_reason(ModelFinishReason::Blocked),
        );

        let req = ModelRequest {
            system_instruction: None,
            messages: vec![ModelMessage::User("Plan Paris".to_owned())],
        };
        let mut resp = pin!(provider.send_request(&req).await.unwrap());
        let mut events = Vec::new();
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await.unwrap()
        {
            events.push(event);
        }
        assert_eq!(
            events,
            [
                ModelResponseEvent::EmptyFragment,
                ModelResponseEvent::Completed(ModelFinishReason::Blocked),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_turn() {
        let provider = TestModelProvider::default();
        let req = ModelRequest {
            system_instruction: None,
            messages: vec![ModelMessage::User("Hi".to_owned())],
        };
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }
}
