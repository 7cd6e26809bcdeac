//! Response normalization
//!
//! Turns raw `generateContent` responses into local values. Everything here is
//! pure so it can be exercised against fixed payloads without a network.
//!
//! Input shape contract: any `GenerateContentResponse` is accepted, including
//! ones with no candidates, candidates without content, parts that carry
//! neither text nor data, and empty grounding metadata. Each function
//! documents what it returns for those shapes.

use super::messages::{GenerateContentResponse, Part};
use crate::error::AdapterError;
use crate::response::{AnalysisResult, Citation, MAX_QUALITY_SCORE};

/// Opening/closing marker of a markdown code block
const FENCE: &str = "```";

/// Media type assumed for inline images that do not declare one
const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Strip a markdown code fence wrapping structured output
///
/// Handles an optional language tag after the opening fence (` ```json `).
/// Text without a leading fence is returned trimmed and otherwise untouched.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    // Language tag: an alphanumeric run directly after the fence, but only
    // when what follows it still looks like the start of the payload
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let after_tag = rest[tag_len..].trim_start();
    let body = if tag_len > 0 && (after_tag.starts_with('{') || after_tag.starts_with('[')) {
        after_tag
    } else {
        rest.trim_start()
    };

    body.strip_suffix(FENCE).unwrap_or(body).trim()
}

/// Parts of the first candidate, or an empty slice
fn first_candidate_parts(response: &GenerateContentResponse) -> &[Part] {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or(&[])
}

/// Concatenated answer text of the first candidate
///
/// Reasoning parts are skipped. Returns `None` when there is no text or it is
/// only whitespace.
pub(crate) fn response_text(response: &GenerateContentResponse) -> Option<String> {
    let text: String = first_candidate_parts(response)
        .iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Displayable `data:` URI for the inline image in the first candidate
///
/// When several parts carry data the last one wins. Parts with an empty
/// payload are ignored.
pub(crate) fn inline_image(response: &GenerateContentResponse) -> Option<String> {
    first_candidate_parts(response)
        .iter()
        .filter_map(|part| part.inline_data.as_ref())
        .filter(|data| !data.data.is_empty())
        .last()
        .map(|data| {
            let mime = data
                .mime_type
                .as_deref()
                .filter(|mime| !mime.is_empty())
                .unwrap_or(DEFAULT_IMAGE_MIME);
            format!("data:{};base64,{}", mime, data.data)
        })
}

/// Web sources attached to the first candidate
///
/// Chunks without a URI are dropped; a missing title falls back to the URI.
pub(crate) fn grounding_citations(response: &GenerateContentResponse) -> Vec<Citation> {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.grounding_metadata.as_ref())
        .map(|metadata| {
            metadata
                .grounding_chunks
                .iter()
                .filter_map(|chunk| chunk.web.as_ref())
                .filter_map(|web| {
                    let uri = web.uri.clone().filter(|uri| !uri.is_empty())?;
                    let title = web
                        .title
                        .clone()
                        .filter(|title| !title.is_empty())
                        .unwrap_or_else(|| uri.clone());
                    Some(Citation { title, uri })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Block reason when the service refused the prompt outright
pub(crate) fn block_reason(response: &GenerateContentResponse) -> Option<String> {
    if !response.candidates.is_empty() {
        return None;
    }
    response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.clone())
}

/// Parse the structured critique returned by the analysis model
pub(crate) fn parse_analysis(text: &str) -> Result<AnalysisResult, AdapterError> {
    let json = strip_code_fence(text);
    let analysis: AnalysisResult = serde_json::from_str(json).map_err(|e| {
        AdapterError::InvalidResponse(format!("Failed to parse analysis: {}", e))
    })?;

    if analysis.quality_score > MAX_QUALITY_SCORE {
        return Err(AdapterError::InvalidResponse(format!(
            "Quality score {} outside 0-{}",
            analysis.quality_score, MAX_QUALITY_SCORE
        )));
    }

    Ok(analysis)
}
