use chrono::NaiveDateTime;
use serde::Serialize;

/// A conversation between exactly two users. `user_a` sorts before `user_b`.
#[derive(Debug, Clone, Serialize)]
pub struct Chat {
    pub id: String,
    pub user_a: String,
    pub user_b: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub chat_id: String,
    pub other_user_id: String,
    pub other_user_name: String,
    pub last_message: Option<String>,
    pub last_activity: NaiveDateTime,
}

/// Orders a participant pair so both directions map to the same chat.
pub fn participant_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_pair_is_order_independent() {
        assert_eq!(participant_pair("u2", "u1"), ("u1", "u2"));
        assert_eq!(participant_pair("u1", "u2"), ("u1", "u2"));
    }
}
