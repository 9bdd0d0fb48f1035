use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::{players, prelude::*};
use typemate_types::{Player, PlayerId, RoomId};

pub struct PlayerRepository {
    db: DatabaseConnection,
}

/// Counters written after each word boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub progress: u32,
    pub attempted: u32,
    pub wpm: u32,
    pub accuracy: u32,
}

impl PlayerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_player(model: players::Model) -> Player {
        Player {
            id: model.id,
            room_id: model.room_id,
            name: model.name,
            progress: model.progress.max(0) as u32,
            attempted: model.attempted.max(0) as u32,
            wpm: model.wpm.max(0) as u32,
            accuracy: model.accuracy.max(0) as u32,
            is_host: model.is_host,
            created_at: model.created_at.to_rfc3339(),
            last_active: model.last_active.to_rfc3339(),
        }
    }

    pub async fn create_player(&self, room_id: RoomId, name: &str, is_host: bool) -> Result<Player> {
        let now = Utc::now().fixed_offset();

        let player_model = players::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            room_id: ActiveValue::Set(room_id),
            name: ActiveValue::Set(name.to_string()),
            progress: ActiveValue::Set(0),
            attempted: ActiveValue::Set(0),
            wpm: ActiveValue::Set(0),
            accuracy: ActiveValue::Set(0),
            is_host: ActiveValue::Set(is_host),
            created_at: ActiveValue::Set(now),
            last_active: ActiveValue::Set(now),
        };

        let saved_model = Players::insert(player_model).exec(&self.db).await?;

        let created_player = Players::find_by_id(saved_model.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("Failed to retrieve created player"))?;

        Ok(Self::model_to_player(created_player))
    }

    pub async fn find_by_id(&self, id: PlayerId) -> Result<Option<Player>> {
        let player_model = Players::find_by_id(id).one(&self.db).await?;
        Ok(player_model.map(Self::model_to_player))
    }

    /// Everyone in a room, in join order
    pub async fn find_by_room(&self, room_id: RoomId) -> Result<Vec<Player>> {
        let players = Players::find()
            .filter(players::Column::RoomId.eq(room_id))
            .order_by_asc(players::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(players.into_iter().map(Self::model_to_player).collect())
    }

    /// Write progress counters. The write only applies when it does not move
    /// `progress` backwards; returns whether a row was updated.
    pub async fn update_progress(&self, id: PlayerId, update: ProgressUpdate) -> Result<bool> {
        let result = Players::update_many()
            .col_expr(players::Column::Progress, Expr::value(update.progress as i32))
            .col_expr(players::Column::Attempted, Expr::value(update.attempted as i32))
            .col_expr(players::Column::Wpm, Expr::value(update.wpm as i32))
            .col_expr(players::Column::Accuracy, Expr::value(update.accuracy as i32))
            .col_expr(
                players::Column::LastActive,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(players::Column::Id.eq(id))
            .filter(players::Column::Progress.lte(update.progress as i32))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn delete_player(&self, id: PlayerId) -> Result<bool> {
        let result = Players::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Delete players created before `cutoff`
    pub async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = Players::delete_many()
            .filter(players::Column::CreatedAt.lt(cutoff.fixed_offset()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn clear_all(&self) -> Result<u64> {
        let result = Players::delete_many().exec(&self.db).await?;
        Ok(result.rows_affected)
    }
}
