use std::pin::Pin;
use std::task::{Context, Poll, ready};

use itinera_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::io::Sse;
use crate::proto::{self, GenerateContentResponse};
use crate::{Error, error_kind_for_code};

struct PartialState {
    sse: Sse,
    // Gemini reports the finish reason together with the last text, so
    // it is held back until that text has been delivered.
    pending_finish_reason: Option<ModelFinishReason>,
    completed: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            pending_finish_reason: None,
            completed: false,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        partial_state.completed = true;
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    let sse_event = match partial_state.sse.next_event().await {
        Ok(Some(event)) => event,
        Ok(None) if partial_state.completed => return Ok((None, partial_state)),
        Ok(None) => {
            return Err(Error::new(
                "stream ended before the model finished",
                ErrorKind::Other,
            ));
        }
        Err(err) => {
            return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
        }
    };
    trace!("got sse event: {sse_event}");

    let chunk = serde_json::from_str::<GenerateContentResponse>(&sse_event)
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;

    if let Some(error) = chunk.error {
        let kind = error_kind_for_code(error.code);
        let message = error.message.unwrap_or_else(|| "Unknown error".into());
        return Err(Error::new(message, kind));
    }
    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(Error::new(
            format!("prompt was blocked: {reason}"),
            ErrorKind::Blocked,
        ));
    }

    // Usage-only chunks carry no candidate at all.
    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok((Some(ModelResponseEvent::EmptyFragment), partial_state));
    };
    partial_state.pending_finish_reason =
        candidate.finish_reason.as_deref().map(proto::finish_reason);

    let event = ModelResponseEvent::fragment(candidate.text());
    Ok((Some(event), partial_state))
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use bytes::Bytes;

    use super::*;
    use crate::io::Chunks;

    async fn collect_events(
        chunks: Vec<Bytes>,
    ) -> (Vec<ModelResponseEvent>, Option<Error>) {
        let sse = Sse::new(Chunks::from_vec_deque(chunks.into()));
        let mut resp = pin!(GeminiResponse::from_sse(sse));
        let mut events = vec![];
        loop {
            match poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => return (events, None),
                Err(err) => return (events, Some(err)),
            }
        }
    }

    #[tokio::test]
    async fn test_simple_events() {
        let (events, err) = collect_events(vec![Bytes::from_static(
            include_bytes!("../fixtures/stream_response.txt"),
        )])
        .await;
        assert!(err.is_none());
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::TextFragment("**Day 1:** ".to_owned()),
                ModelResponseEvent::TextFragment("Louvre at 9am".to_owned()),
                ModelResponseEvent::EmptyFragment,
                ModelResponseEvent::EmptyFragment,
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn test_truncated_stream() {
        let (events, err) = collect_events(vec![Bytes::from_static(
            b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Day 1\"}]}}]}\n\n",
        )])
        .await;
        assert_eq!(
            events,
            vec![ModelResponseEvent::TextFragment("Day 1".to_owned())]
        );
        assert_eq!(err.unwrap().kind, ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_error_event() {
        let (events, err) = collect_events(vec![Bytes::from_static(
            b"data: {\"error\":{\"code\":429,\"message\":\"Quota exceeded\"}}\n\n",
        )])
        .await;
        assert!(events.is_empty());
        let err = err.unwrap();
        assert_eq!(err.message(), "Quota exceeded");
        assert_eq!(err.kind, ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let (events, err) = collect_events(vec![Bytes::from_static(
            b"data: {\"promptFeedback\":{\"blockReason\":\"SAFETY\"}}\n\n",
        )])
        .await;
        assert!(events.is_empty());
        assert_eq!(err.unwrap().kind, ErrorKind::Blocked);
    }
}
