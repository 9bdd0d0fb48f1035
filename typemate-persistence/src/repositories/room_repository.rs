use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::info;
use uuid::Uuid;

use crate::entities::{prelude::*, rooms};
use typemate_types::{Room, RoomId, RoomStatus};

pub struct RoomRepository {
    db: DatabaseConnection,
}

impl RoomRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_room(model: rooms::Model) -> Result<Room> {
        let status = model
            .status
            .parse::<RoomStatus>()
            .map_err(|e| anyhow!("Room {} has a corrupt status: {}", model.id, e))?;

        Ok(Room {
            id: model.id,
            code: model.code,
            status,
            words: model.words.split_whitespace().map(str::to_string).collect(),
            duration: model.duration.max(0) as u32,
            created_at: model.created_at.to_rfc3339(),
            started_at: model.started_at.map(|t| t.to_rfc3339()),
            finished_at: model.finished_at.map(|t| t.to_rfc3339()),
        })
    }

    /// Words are stored space-separated, so each must be a single non-empty token
    pub async fn create_room(&self, code: &str, words: &[String], duration: u32) -> Result<Room> {
        if let Some(word) = words
            .iter()
            .find(|word| word.is_empty() || word.contains(char::is_whitespace))
        {
            bail!("Room {} has an unstorable word {:?}", code, word);
        }

        let room_model = rooms::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            code: ActiveValue::Set(code.to_string()),
            status: ActiveValue::Set(RoomStatus::Waiting.as_str().to_string()),
            words: ActiveValue::Set(words.join(" ")),
            duration: ActiveValue::Set(duration as i32),
            created_at: ActiveValue::Set(Utc::now().into()),
            started_at: ActiveValue::Set(None),
            finished_at: ActiveValue::Set(None),
        };

        let saved_model = Rooms::insert(room_model).exec(&self.db).await?;

        let created_room = Rooms::find_by_id(saved_model.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow!("Failed to retrieve created room"))?;

        Self::model_to_room(created_room)
    }

    pub async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>> {
        Rooms::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Self::model_to_room)
            .transpose()
    }

    /// Exact match; callers normalize the code first
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Room>> {
        Rooms::find()
            .filter(rooms::Column::Code.eq(code))
            .one(&self.db)
            .await?
            .map(Self::model_to_room)
            .transpose()
    }

    pub async fn code_exists(&self, code: &str) -> Result<bool> {
        Ok(self.find_by_code(code).await?.is_some())
    }

    /// Move `waiting` to `playing` and stamp the start time. Returns the
    /// updated room, or `None` when the room was not waiting. The status is
    /// part of the filter so only one concurrent caller can win.
    pub async fn mark_started(&self, id: RoomId) -> Result<Option<Room>> {
        let now: DateTime<Utc> = Utc::now();
        let result = Rooms::update_many()
            .col_expr(
                rooms::Column::Status,
                Expr::value(RoomStatus::Playing.as_str()),
            )
            .col_expr(rooms::Column::StartedAt, Expr::value(now.fixed_offset()))
            .filter(rooms::Column::Id.eq(id))
            .filter(rooms::Column::Status.eq(RoomStatus::Waiting.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        info!("Room {} started", id);
        self.find_by_id(id).await
    }

    /// Move `playing` to `finished`. Returns `None` when the room was not playing.
    pub async fn mark_finished(&self, id: RoomId) -> Result<Option<Room>> {
        let now: DateTime<Utc> = Utc::now();
        let result = Rooms::update_many()
            .col_expr(
                rooms::Column::Status,
                Expr::value(RoomStatus::Finished.as_str()),
            )
            .col_expr(rooms::Column::FinishedAt, Expr::value(now.fixed_offset()))
            .filter(rooms::Column::Id.eq(id))
            .filter(rooms::Column::Status.eq(RoomStatus::Playing.as_str()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        info!("Room {} finished", id);
        self.find_by_id(id).await
    }

    /// Delete rooms created before `cutoff`
    pub async fn purge_created_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = Rooms::delete_many()
            .filter(rooms::Column::CreatedAt.lt(cutoff.fixed_offset()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn clear_all(&self) -> Result<u64> {
        let result = Rooms::delete_many().exec(&self.db).await?;
        Ok(result.rows_affected)
    }
}
