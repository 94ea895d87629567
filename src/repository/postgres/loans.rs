//! Loans table

use chrono::NaiveDate;
use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanFilter, NewLoan},
};

pub async fn insert(conn: &mut PgConnection, data: &NewLoan) -> AppResult<Loan> {
    let row = sqlx::query_as::<_, Loan>(
        r#"
        INSERT INTO loans (loan_request_id, item_id, borrower_id, start_date, end_date, status)
        VALUES ($1, $2, $3, $4, $5, 'active')
        RETURNING *
        "#,
    )
    .bind(data.loan_request_id)
    .bind(data.item_id)
    .bind(data.borrower_id)
    .bind(data.range.start)
    .bind(data.range.end)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn get(conn: &mut PgConnection, id: i32, for_update: bool) -> AppResult<Option<Loan>> {
    let query = if for_update {
        "SELECT * FROM loans WHERE id = $1 FOR UPDATE"
    } else {
        "SELECT * FROM loans WHERE id = $1"
    };
    let row = sqlx::query_as::<_, Loan>(query)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn list(conn: &mut PgConnection, filter: &LoanFilter) -> AppResult<Vec<Loan>> {
    let mut conditions = Vec::new();
    let mut idx = 1;

    if filter.item_id.is_some() {
        conditions.push(format!("l.item_id = ${}", idx));
        idx += 1;
    }
    if filter.borrower_id.is_some() {
        conditions.push(format!("l.borrower_id = ${}", idx));
        idx += 1;
    }
    if filter.owner_id.is_some() {
        conditions.push(format!("i.owner_id = ${}", idx));
        idx += 1;
    }
    if filter.participant_id.is_some() {
        conditions.push(format!("(l.borrower_id = ${0} OR i.owner_id = ${0})", idx));
        idx += 1;
    }
    if filter.status.is_some() {
        conditions.push(format!("l.status = ${}", idx));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        r#"
        SELECT l.* FROM loans l
        JOIN items i ON i.id = l.item_id
        {}
        ORDER BY l.end_date, l.id
        "#,
        where_clause
    );

    let mut builder = sqlx::query_as::<_, Loan>(&sql);
    if let Some(id) = filter.item_id { builder = builder.bind(id); }
    if let Some(id) = filter.borrower_id { builder = builder.bind(id); }
    if let Some(id) = filter.owner_id { builder = builder.bind(id); }
    if let Some(id) = filter.participant_id { builder = builder.bind(id); }
    if let Some(status) = filter.status { builder = builder.bind(status); }

    Ok(builder.fetch_all(conn).await?)
}

pub async fn update(conn: &mut PgConnection, loan: &Loan) -> AppResult<Loan> {
    sqlx::query_as::<_, Loan>(
        r#"
        UPDATE loans
        SET status = $2, actual_return_date = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(loan.id)
    .bind(loan.status)
    .bind(loan.actual_return_date)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("Loan", loan.id))
}

/// Conditional ACTIVE -> OVERDUE; a loan returned meanwhile is left untouched
pub async fn mark_overdue(conn: &mut PgConnection, id: i32, today: NaiveDate) -> AppResult<Option<Loan>> {
    let row = sqlx::query_as::<_, Loan>(
        r#"
        UPDATE loans
        SET status = 'overdue', updated_at = NOW()
        WHERE id = $1 AND status = 'active' AND end_date < $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(today)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

pub async fn delete(conn: &mut PgConnection, id: i32) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM loans WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Loan", id));
    }
    Ok(())
}
