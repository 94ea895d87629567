//! Item availability slots table

use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult, ErrorCode},
    models::{
        enums::SlotStatus,
        slot::{ItemAvailabilitySlot, NewSlot, SlotFilter},
    },
};

/// SQLSTATE raised by the no-overlap exclusion constraint
const EXCLUSION_VIOLATION: &str = "23P01";

fn map_write_error(e: sqlx::Error) -> AppError {
    let is_overlap = matches!(
        &e,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION)
    );
    if is_overlap {
        AppError::Conflict(
            ErrorCode::SlotOverlap,
            "Slot overlaps another slot of the same availability".to_string(),
        )
    } else {
        AppError::Database(e)
    }
}

pub async fn insert(conn: &mut PgConnection, data: &NewSlot) -> AppResult<ItemAvailabilitySlot> {
    sqlx::query_as::<_, ItemAvailabilitySlot>(
        r#"
        INSERT INTO item_availability_slots (availability_id, start_date, end_date, status, loan_request_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(data.availability_id)
    .bind(data.range.start)
    .bind(data.range.end)
    .bind(data.status)
    .bind(data.loan_request_id)
    .fetch_one(conn)
    .await
    .map_err(map_write_error)
}

pub async fn get(conn: &mut PgConnection, id: i32) -> AppResult<Option<ItemAvailabilitySlot>> {
    let row = sqlx::query_as::<_, ItemAvailabilitySlot>("SELECT * FROM item_availability_slots WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn list(conn: &mut PgConnection, filter: &SlotFilter) -> AppResult<Vec<ItemAvailabilitySlot>> {
    let mut conditions = Vec::new();
    let mut idx = 1;

    if filter.availability_id.is_some() {
        conditions.push(format!("s.availability_id = ${}", idx));
        idx += 1;
    }
    if filter.item_id.is_some() {
        conditions.push(format!("a.item_id = ${}", idx));
        idx += 1;
    }
    if filter.loan_request_id.is_some() {
        conditions.push(format!("s.loan_request_id = ${}", idx));
        idx += 1;
    }
    if filter.status.is_some() {
        conditions.push(format!("s.status = ${}", idx));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        r#"
        SELECT s.* FROM item_availability_slots s
        JOIN item_availabilities a ON a.id = s.availability_id
        {}
        ORDER BY s.start_date, s.id
        "#,
        where_clause
    );

    let mut builder = sqlx::query_as::<_, ItemAvailabilitySlot>(&sql);
    if let Some(id) = filter.availability_id { builder = builder.bind(id); }
    if let Some(id) = filter.item_id { builder = builder.bind(id); }
    if let Some(id) = filter.loan_request_id { builder = builder.bind(id); }
    if let Some(status) = filter.status { builder = builder.bind(status); }

    Ok(builder.fetch_all(conn).await?)
}

pub async fn update(conn: &mut PgConnection, slot: &ItemAvailabilitySlot) -> AppResult<ItemAvailabilitySlot> {
    sqlx::query_as::<_, ItemAvailabilitySlot>(
        r#"
        UPDATE item_availability_slots
        SET start_date = $2, end_date = $3, status = $4, loan_request_id = $5, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(slot.id)
    .bind(slot.start_date)
    .bind(slot.end_date)
    .bind(slot.status)
    .bind(slot.loan_request_id)
    .fetch_optional(conn)
    .await
    .map_err(map_write_error)?
    .ok_or_else(|| AppError::not_found("Slot", slot.id))
}

pub async fn set_status(conn: &mut PgConnection, id: i32, status: SlotStatus) -> AppResult<ItemAvailabilitySlot> {
    sqlx::query_as::<_, ItemAvailabilitySlot>(
        "UPDATE item_availability_slots SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("Slot", id))
}

pub async fn delete(conn: &mut PgConnection, id: i32) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM item_availability_slots WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Slot", id));
    }
    Ok(())
}
