//! Item availability windows table

use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::availability::{ItemAvailability, NewAvailability},
};

pub async fn insert(conn: &mut PgConnection, data: &NewAvailability) -> AppResult<ItemAvailability> {
    let row = sqlx::query_as::<_, ItemAvailability>(
        r#"
        INSERT INTO item_availabilities (item_id, start_date, end_date, status)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(data.item_id)
    .bind(data.range.start)
    .bind(data.range.end)
    .bind(data.status)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn get(conn: &mut PgConnection, id: i32) -> AppResult<Option<ItemAvailability>> {
    let row = sqlx::query_as::<_, ItemAvailability>("SELECT * FROM item_availabilities WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn list_by_item(conn: &mut PgConnection, item_id: i32) -> AppResult<Vec<ItemAvailability>> {
    let rows = sqlx::query_as::<_, ItemAvailability>(
        "SELECT * FROM item_availabilities WHERE item_id = $1 ORDER BY start_date, id",
    )
    .bind(item_id)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn update(conn: &mut PgConnection, availability: &ItemAvailability) -> AppResult<ItemAvailability> {
    sqlx::query_as::<_, ItemAvailability>(
        r#"
        UPDATE item_availabilities
        SET start_date = $2, end_date = $3, status = $4, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(availability.id)
    .bind(availability.start_date)
    .bind(availability.end_date)
    .bind(availability.status)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("Availability", availability.id))
}

pub async fn delete(conn: &mut PgConnection, id: i32) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM item_availabilities WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Availability", id));
    }
    Ok(())
}
