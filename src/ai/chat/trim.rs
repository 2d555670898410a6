//! Fitting a conversation into a token budget before it's sent to
//! the model. Trimming only ever affects what is sent, the stored
//! transcript is left alone.

use super::models::{Message, Role};

/// Default token budget for the history sent with each turn.
pub const DEFAULT_TOKEN_BUDGET: usize = 100;

pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> usize;
}

/// Fallback used when the completion provider can't count tokens for
/// us. Counts whitespace separated words which is deterministic but
/// will undercount compared to a real BPE tokenizer.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Returns the longest suffix of `history` that fits in `budget`
/// along with the system message, starting on a user message.
///
/// Messages are kept whole or dropped entirely and the oldest ones go
/// first. If the system message alone exceeds the budget the result
/// is empty and the call should go ahead with only the system message.
pub fn apply_trim_policy<'a>(
    history: &'a [Message],
    budget: usize,
    system_cost: usize,
    counter: &dyn TokenCounter,
) -> &'a [Message] {
    let Some(mut remaining) = budget.checked_sub(system_cost) else {
        return &[];
    };

    let mut start = history.len();
    for (idx, msg) in history.iter().enumerate().rev() {
        let cost = counter.count_tokens(&msg.content);
        if cost > remaining {
            break;
        }
        remaining -= cost;
        start = idx;
    }

    // Advance to the first user message so the model never sees a
    // reply without the question that prompted it
    let kept = &history[start..];
    match kept.iter().position(|m| m.role == Role::User) {
        Some(offset) => &kept[offset..],
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a message whose whitespace token cost is `cost`
    fn msg(role: Role, cost: usize, sequence: u64) -> Message {
        let content = vec!["tok"; cost].join(" ");
        Message::new(role, &content, sequence)
    }

    fn alternating(costs: &[usize]) -> Vec<Message> {
        costs
            .iter()
            .enumerate()
            .map(|(idx, cost)| {
                let role = if idx % 2 == 0 { Role::User } else { Role::Assistant };
                msg(role, *cost, idx as u64)
            })
            .collect()
    }

    fn total(messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| WhitespaceTokenCounter.count_tokens(&m.content))
            .sum()
    }

    #[test]
    fn test_whitespace_counter() {
        assert_eq!(WhitespaceTokenCounter.count_tokens(""), 0);
        assert_eq!(WhitespaceTokenCounter.count_tokens("  hello   world \n"), 2);
    }

    #[test]
    fn test_keeps_everything_under_budget() {
        let history = alternating(&[5, 5, 5]);
        let kept = apply_trim_policy(&history, 100, 10, &WhitespaceTokenCounter);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_trims_to_budget() {
        // Costs oldest to newest with a user message at the newest end
        let mut history = alternating(&[30, 10, 20, 15, 5, 40]);
        history.push(msg(Role::User, 5, 6));

        let kept = apply_trim_policy(&history, 50, 10, &WhitespaceTokenCounter);

        // 5 + 40 fits in the 40 left after the system message, adding
        // the next message (5) would not.
        assert!(total(kept) + 10 <= 50);
        assert_eq!(kept.first().unwrap().role, Role::User);
        let sequences: Vec<u64> = kept.iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![6]);
    }

    #[test]
    fn test_budget_with_assistant_at_newest_end() {
        // Only the newest assistant message fits, which can't start a
        // slice so nothing is sent
        let history = alternating(&[30, 10, 20, 15, 5, 40]);
        let kept = apply_trim_policy(&history, 50, 10, &WhitespaceTokenCounter);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_advances_to_first_user_message() {
        // user 10, assistant 10, user 10, assistant 5, user 5
        let history = alternating(&[10, 10, 10, 5, 5]);

        // 30 tokens left after the system message. The naive suffix is
        // [assistant 10, user 10, assistant 5, user 5] which starts on
        // an assistant message.
        let kept = apply_trim_policy(&history, 40, 10, &WhitespaceTokenCounter);

        let sequences: Vec<u64> = kept.iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 4]);
        assert_eq!(kept[0].role, Role::User);
        assert!(total(kept) + 10 <= 40);
    }

    #[test]
    fn test_maximal_suffix() {
        let history = alternating(&[10, 10, 10, 10, 10]);
        let kept = apply_trim_policy(&history, 40, 10, &WhitespaceTokenCounter);

        // Exactly fills the budget
        assert_eq!(total(kept) + 10, 40);
        let sequences: Vec<u64> = kept.iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 4]);
    }

    #[test]
    fn test_never_includes_partial_messages() {
        // A large message in the middle stops the scan even though
        // older messages would fit on their own
        let history = vec![
            msg(Role::User, 1, 0),
            msg(Role::Assistant, 1, 1),
            msg(Role::User, 50, 2),
            msg(Role::Assistant, 2, 3),
            msg(Role::User, 2, 4),
        ];
        let kept = apply_trim_policy(&history, 20, 0, &WhitespaceTokenCounter);
        let sequences: Vec<u64> = kept.iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![4]);
    }

    #[test]
    fn test_budget_smaller_than_system_message() {
        let history = alternating(&[1, 1, 1]);
        let kept = apply_trim_policy(&history, 5, 10, &WhitespaceTokenCounter);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_budget_equal_to_system_message() {
        let history = alternating(&[1]);
        let kept = apply_trim_policy(&history, 10, 10, &WhitespaceTokenCounter);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_empty_history() {
        let kept = apply_trim_policy(&[], 100, 10, &WhitespaceTokenCounter);
        assert!(kept.is_empty());
    }
}
