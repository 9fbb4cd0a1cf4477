//! Client-side stop-word truncation for streamed chat responses (spec.md
//! §6): detects both a full stop sequence and a stop sequence split across
//! a chunk boundary, so a partial stop token is never leaked to the caller.

use futures::stream::{self, Stream, StreamExt};

use crate::error::LlmResult;
use crate::llm::ChatStream;

/// Wrap `inner` so that, as soon as any of `stops` first appears in the
/// accumulated text, the stream ends with everything up to (not including)
/// the stop sequence, and nothing after it is ever yielded.
pub fn truncate_at_stop_words(inner: ChatStream, stops: Vec<String>) -> ChatStream {
    if stops.is_empty() {
        return inner;
    }
    let max_stop_len = stops.iter().map(|s| s.len()).max().unwrap_or(0);
    let state = (inner, String::new(), stops, max_stop_len, false);

    Box::pin(stream::unfold(state, |(mut inner, mut carry, stops, max_stop_len, done)| async move {
        if done {
            return None;
        }
        loop {
            match inner.next().await {
                None => {
                    if carry.is_empty() {
                        return None;
                    }
                    let out = std::mem::take(&mut carry);
                    return Some((Ok(out), (inner, carry, stops, max_stop_len, true)));
                }
                Some(Err(e)) => {
                    return Some((Err(e), (inner, carry, stops, max_stop_len, true)));
                }
                Some(Ok(chunk)) => carry.push_str(&chunk),
            }

            // A full stop sequence anywhere in what we're holding, including
            // text that only completed it just now, ends the stream here.
            if let Some(cut) = stops.iter().filter_map(|s| carry.find(s.as_str())).min() {
                let out = carry[..cut].to_string();
                return Some((Ok(out), (inner, String::new(), stops, max_stop_len, true)));
            }

            // Hold back a trailing slice no longer than the longest stop
            // sequence minus one byte: it might be the prefix of a stop
            // word completed by a future chunk, so don't leak it yet.
            let holdback = max_stop_len.saturating_sub(1).min(carry.len());
            let safe_len = carry.len() - holdback;
            if safe_len == 0 {
                continue; // not enough unambiguous text yet; pull another chunk
            }
            let out: String = carry.drain(..safe_len).collect();
            return Some((Ok(out), (inner, carry, stops, max_stop_len, false)));
        }
    }))
}
