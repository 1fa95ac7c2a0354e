//! Reaction Repository
//!
//! SQLite-backed emoji reactions. One `reactions` row per target and emoji;
//! the users who reacted live in `reaction_users`.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use super::db::{ensure_exists, inserted_id, not_initialized, now_millis, SharedConnection};
use super::traits::ReactionOperations;
use crate::domain::{DomainError, DomainResult, Reaction, ReactionTarget};

/// SQLite implementation of reaction storage
pub struct ReactionRepository {
    conn: SharedConnection,
}

impl ReactionRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

fn target_column(target: ReactionTarget) -> &'static str {
    match target {
        ReactionTarget::Task(_) => "task_id",
        ReactionTarget::Comment(_) => "comment_id",
    }
}

fn ensure_target(conn: &Connection, target: ReactionTarget) -> DomainResult<()> {
    match target {
        ReactionTarget::Task(id) => ensure_exists(conn, "tasks", "task", id),
        ReactionTarget::Comment(id) => ensure_exists(conn, "comments", "comment", id),
    }
}

/// Load a reaction with its users
fn load_reaction(conn: &Connection, target: ReactionTarget, emoji: &str) -> DomainResult<Option<Reaction>> {
    let sql = format!(
        "SELECT id, created_at FROM reactions WHERE {} = ?1 AND emoji = ?2",
        target_column(target)
    );
    let found: Option<(u32, Option<i64>)> = conn
        .query_row(&sql, params![target.id(), emoji], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()?;

    let Some((id, created_at)) = found else {
        return Ok(None);
    };
    let mut reaction = Reaction::new(id, emoji.to_string(), target);
    reaction.created_at = created_at;
    reaction.user_ids = users_of(conn, id)?;
    Ok(Some(reaction))
}

fn users_of(conn: &Connection, reaction_id: u32) -> DomainResult<Vec<u32>> {
    let mut stmt = conn.prepare("SELECT user_id FROM reaction_users WHERE reaction_id = ?1 ORDER BY user_id")?;
    let users = stmt
        .query_map(params![reaction_id], |row| row.get(0))?
        .collect::<Result<Vec<u32>, _>>()?;
    Ok(users)
}

#[async_trait]
impl ReactionOperations for ReactionRepository {
    async fn add_reaction(&self, target: ReactionTarget, emoji: &str, user_id: u32) -> DomainResult<Reaction> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        ensure_target(conn, target)?;
        let reaction_id = match load_reaction(conn, target, emoji)? {
            Some(existing) if existing.user_ids.contains(&user_id) => {
                return Err(DomainError::Conflict(format!(
                    "user {} already reacted {} on {}",
                    user_id, emoji, target
                )));
            }
            Some(existing) => existing.id,
            None => {
                conn.execute(
                    "INSERT INTO reactions (emoji, task_id, comment_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![emoji, target.task_id(), target.comment_id(), now_millis()],
                )?;
                inserted_id(conn)?
            }
        };

        conn.execute(
            "INSERT INTO reaction_users (reaction_id, user_id) VALUES (?1, ?2)",
            params![reaction_id, user_id],
        )?;
        load_reaction(conn, target, emoji)?
            .ok_or_else(|| DomainError::Internal(format!("reaction {} vanished", reaction_id)))
    }

    async fn remove_reaction(
        &self,
        target: ReactionTarget,
        emoji: &str,
        user_id: u32,
    ) -> DomainResult<Option<Reaction>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let reaction = load_reaction(conn, target, emoji)?
            .filter(|r| r.user_ids.contains(&user_id))
            .ok_or_else(|| {
                DomainError::NotFound(format!("user {} has no {} reaction on {}", user_id, emoji, target))
            })?;

        conn.execute(
            "DELETE FROM reaction_users WHERE reaction_id = ?1 AND user_id = ?2",
            params![reaction.id, user_id],
        )?;
        if reaction.count() == 1 {
            conn.execute("DELETE FROM reactions WHERE id = ?1", params![reaction.id])?;
            return Ok(None);
        }
        load_reaction(conn, target, emoji)
    }

    async fn reactions_on(&self, target: ReactionTarget) -> DomainResult<Vec<Reaction>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let sql = format!(
            "SELECT id, emoji, created_at FROM reactions WHERE {} = ?1 ORDER BY created_at, id",
            target_column(target)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![target.id()], |row| {
                Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?, row.get::<_, Option<i64>>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, emoji, created_at)| -> DomainResult<Reaction> {
                let mut reaction = Reaction::new(id, emoji, target);
                reaction.created_at = created_at;
                reaction.user_ids = users_of(conn, id)?;
                Ok(reaction)
            })
            .collect()
    }
}
