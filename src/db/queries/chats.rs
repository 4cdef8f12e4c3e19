use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::db::{now_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
use crate::models::chat::participant_pair;
use crate::models::{Chat, ChatMessage, ChatSummary};

pub fn get_or_create_chat(conn: &Connection, user_id: &str, other_id: &str) -> rusqlite::Result<Chat> {
    let (user_a, user_b) = participant_pair(user_id, other_id);

    conn.execute(
        "INSERT INTO chats (id, user_a, user_b, created_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(user_a, user_b) DO NOTHING",
        params![Uuid::new_v4().to_string(), user_a, user_b, now_timestamp()],
    )?;

    conn.query_row(
        "SELECT id, user_a, user_b, created_at FROM chats WHERE user_a = ?1 AND user_b = ?2",
        params![user_a, user_b],
        |row| {
            let created_at: String = row.get(3)?;
            Ok(Chat {
                id: row.get(0)?,
                user_a: row.get(1)?,
                user_b: row.get(2)?,
                created_at: parse_timestamp(&created_at),
            })
        },
    )
}

pub fn insert_message(conn: &Connection, message: &ChatMessage) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO messages (id, chat_id, sender_id, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            message.id,
            message.chat_id,
            message.sender_id,
            message.content,
            message.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

fn message_from_row(row: &Row) -> rusqlite::Result<ChatMessage> {
    let created_at: String = row.get(5)?;
    Ok(ChatMessage {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        sender_id: row.get(2)?,
        recipient_id: row.get(3)?,
        content: row.get(4)?,
        created_at: parse_timestamp(&created_at),
    })
}

/// Oldest-first history between two users, capped at the latest `limit`.
pub fn get_messages_between(
    conn: &Connection,
    user_id: &str,
    other_id: &str,
    limit: i64,
) -> rusqlite::Result<Vec<ChatMessage>> {
    let (user_a, user_b) = participant_pair(user_id, other_id);
    let mut stmt = conn.prepare(
        "SELECT * FROM (
             SELECT m.id, m.chat_id, m.sender_id,
                    CASE WHEN m.sender_id = c.user_a THEN c.user_b ELSE c.user_a END,
                    m.content, m.created_at, m.rowid AS seq
             FROM messages m
             JOIN chats c ON c.id = m.chat_id
             WHERE c.user_a = ?1 AND c.user_b = ?2
             ORDER BY m.created_at DESC, m.rowid DESC
             LIMIT ?3
         ) ORDER BY created_at ASC, seq ASC",
    )?;
    let messages = stmt
        .query_map(params![user_a, user_b, limit], message_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(messages)
}

pub fn list_chats_for_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Vec<ChatSummary>> {
    let mut stmt = conn.prepare(
        "SELECT c.id,
                CASE WHEN c.user_a = ?1 THEN c.user_b ELSE c.user_a END AS other_id,
                COALESCE(u.name, ''),
                (SELECT m.content FROM messages m WHERE m.chat_id = c.id
                 ORDER BY m.created_at DESC, m.rowid DESC LIMIT 1),
                COALESCE((SELECT MAX(m.created_at) FROM messages m WHERE m.chat_id = c.id), c.created_at) AS last_activity
         FROM chats c
         LEFT JOIN users u ON u.id = CASE WHEN c.user_a = ?1 THEN c.user_b ELSE c.user_a END
         WHERE c.user_a = ?1 OR c.user_b = ?1
         ORDER BY last_activity DESC",
    )?;
    let chats = stmt
        .query_map(params![user_id], |row| {
            let last_activity: String = row.get(4)?;
            Ok(ChatSummary {
                chat_id: row.get(0)?,
                other_user_id: row.get(1)?,
                other_user_name: row.get(2)?,
                last_message: row.get(3)?,
                last_activity: parse_timestamp(&last_activity),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(chats)
}
