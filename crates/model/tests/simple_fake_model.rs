use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use itinera_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message word by word, with an empty chunk in
/// front of every word.
#[derive(Debug)]
struct FakeModelResponse {
    fake_items: VecDeque<ModelResponseEvent>,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl FakeModelResponse {
    fn new(input: &str) -> Self {
        let words: Vec<_> = format!("You said {}", input)
            .split(' ')
            .map(ToString::to_string)
            .collect();
        let last_idx = words.len() - 1;
        let mut fake_items = VecDeque::new();
        for (idx, mut word) in words.into_iter().enumerate() {
            if idx != last_idx {
                word.push(' ');
            }
            fake_items.push_back(ModelResponseEvent::EmptyFragment);
            fake_items.push_back(ModelResponseEvent::TextFragment(word));
        }
        fake_items
            .push_back(ModelResponseEvent::Completed(ModelFinishReason::Stop));
        Self {
            fake_items,
            sleep: None,
        }
    }
}

impl ModelResponse for FakeModelResponse {
    type Error = FakeModelProviderError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;
            return Poll::Ready(Ok(this.fake_items.pop_front()));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;
    type Response = FakeModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = match req.last_user_message() {
            Some(content) => Ok(FakeModelResponse::new(content)),
            None => Err(FakeModelProviderError(ErrorKind::Other)),
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use super::*;

    #[tokio::test]
    async fn test_completion() {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            system_instruction: Some("You plan trips.".to_string()),
            messages: vec![
                ModelMessage::User("Plan Paris".to_string()),
                ModelMessage::Model("Day 1: Louvre".to_string()),
                ModelMessage::User("Make it cheaper".to_string()),
            ],
        };
        let mut resp = provider.send_request(&req).await.unwrap();

        let mut resp_message = String::new();
        let mut empty_fragments = 0;
        loop {
            let resp_fut =
                poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx));
            match resp_fut.await {
                Ok(Some(event)) => match event {
                    ModelResponseEvent::TextFragment(text) => {
                        resp_message.push_str(&text);
                    }
                    ModelResponseEvent::EmptyFragment => {
                        empty_fragments += 1;
                    }
                    ModelResponseEvent::Completed(reason) => {
                        assert_eq!(reason, ModelFinishReason::Stop);
                        break;
                    }
                },
                Ok(None) => break,
                Err(err) => unreachable!("unexpected error: {err:?}"),
            }
        }

        assert_eq!(resp_message, "You said Make it cheaper");
        assert_eq!(empty_fragments, 5);
    }

    #[tokio::test]
    async fn test_error() {
        let provider = FakeModelProvider;
        let req = ModelRequest::default();
        let result = provider.send_request(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
