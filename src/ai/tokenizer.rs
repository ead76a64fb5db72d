//! Token estimation for calls whose provider reported no usage.
//!
//! Character-based (4 chars ≈ 1 token). Good enough for a running total;
//! records built from it are flagged as estimated.

use crate::ai::provider::ChatRequest;

/// Estimate the token count of a string
pub fn estimate_tokens(text: &str) -> u32 {
    text.chars().count().div_ceil(4) as u32
}

/// Estimated prompt tokens of a chat request, including per-message overhead
pub fn estimate_request_tokens(request: &ChatRequest) -> u32 {
    const PER_MESSAGE_OVERHEAD: u32 = 4;
    estimate_tokens(&request.system) + estimate_tokens(&request.user) + 2 * PER_MESSAGE_OVERHEAD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationParams;

    #[test]
    fn test_char_based_estimate() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens("ééééé"), 2);
    }

    #[test]
    fn test_request_estimate_includes_both_messages() {
        let request = ChatRequest {
            system: "a".repeat(40),
            user: "b".repeat(80),
            params: GenerationParams {
                temperature: 0.1,
                max_tokens: 500,
            },
            json_mode: true,
        };
        assert_eq!(estimate_request_tokens(&request), 10 + 20 + 8);
    }
}
