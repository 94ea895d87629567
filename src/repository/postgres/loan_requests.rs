//! Loan requests table

use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::LoanRequestStatus,
        loan_request::{LoanRequest, LoanRequestFilter, NewLoanRequest},
    },
};

pub async fn insert(conn: &mut PgConnection, data: &NewLoanRequest) -> AppResult<LoanRequest> {
    let row = sqlx::query_as::<_, LoanRequest>(
        r#"
        INSERT INTO loan_requests (item_id, borrower_id, start_date, end_date, message, status)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING *
        "#,
    )
    .bind(data.item_id)
    .bind(data.borrower_id)
    .bind(data.range.start)
    .bind(data.range.end)
    .bind(&data.message)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn get(conn: &mut PgConnection, id: i32, for_update: bool) -> AppResult<Option<LoanRequest>> {
    let query = if for_update {
        "SELECT * FROM loan_requests WHERE id = $1 FOR UPDATE"
    } else {
        "SELECT * FROM loan_requests WHERE id = $1"
    };
    let row = sqlx::query_as::<_, LoanRequest>(query)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn list(conn: &mut PgConnection, filter: &LoanRequestFilter) -> AppResult<Vec<LoanRequest>> {
    let mut conditions = Vec::new();
    let mut idx = 1;

    if filter.item_id.is_some() {
        conditions.push(format!("r.item_id = ${}", idx));
        idx += 1;
    }
    if filter.borrower_id.is_some() {
        conditions.push(format!("r.borrower_id = ${}", idx));
        idx += 1;
    }
    if filter.owner_id.is_some() {
        conditions.push(format!("i.owner_id = ${}", idx));
        idx += 1;
    }
    if filter.status.is_some() {
        conditions.push(format!("r.status = ${}", idx));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        r#"
        SELECT r.* FROM loan_requests r
        JOIN items i ON i.id = r.item_id
        {}
        ORDER BY r.created_at DESC, r.id DESC
        "#,
        where_clause
    );

    let mut builder = sqlx::query_as::<_, LoanRequest>(&sql);
    if let Some(id) = filter.item_id { builder = builder.bind(id); }
    if let Some(id) = filter.borrower_id { builder = builder.bind(id); }
    if let Some(id) = filter.owner_id { builder = builder.bind(id); }
    if let Some(status) = filter.status { builder = builder.bind(status); }

    Ok(builder.fetch_all(conn).await?)
}

pub async fn set_status(conn: &mut PgConnection, id: i32, status: LoanRequestStatus) -> AppResult<LoanRequest> {
    sqlx::query_as::<_, LoanRequest>(
        "UPDATE loan_requests SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("Loan request", id))
}

pub async fn delete(conn: &mut PgConnection, id: i32) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM loan_requests WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Loan request", id));
    }
    Ok(())
}
