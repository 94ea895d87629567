//! Items table

use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::item::{CreateItem, Item, ItemQuery, UpdateItem},
};

pub async fn insert(conn: &mut PgConnection, owner_id: i32, data: &CreateItem) -> AppResult<Item> {
    let row = sqlx::query_as::<_, Item>(
        r#"
        INSERT INTO items (name, description, category, image_url, owner_id, neighborhood_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.category)
    .bind(&data.image_url)
    .bind(owner_id)
    .bind(data.neighborhood_id)
    .fetch_one(conn)
    .await?;
    Ok(row)
}

pub async fn get(conn: &mut PgConnection, id: i32, for_update: bool) -> AppResult<Option<Item>> {
    let query = if for_update {
        "SELECT * FROM items WHERE id = $1 FOR UPDATE"
    } else {
        "SELECT * FROM items WHERE id = $1"
    };
    let row = sqlx::query_as::<_, Item>(query)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

pub async fn list(conn: &mut PgConnection, query: &ItemQuery) -> AppResult<Vec<Item>> {
    let mut conditions = Vec::new();
    let mut idx = 1;

    if query.neighborhood_id.is_some() {
        conditions.push(format!("neighborhood_id = ${}", idx));
        idx += 1;
    }
    if query.owner_id.is_some() {
        conditions.push(format!("owner_id = ${}", idx));
        idx += 1;
    }
    if query.category.is_some() {
        conditions.push(format!("category = ${}", idx));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!("SELECT * FROM items {} ORDER BY created_at DESC, id DESC", where_clause);
    let mut builder = sqlx::query_as::<_, Item>(&sql);
    if let Some(id) = query.neighborhood_id { builder = builder.bind(id); }
    if let Some(id) = query.owner_id { builder = builder.bind(id); }
    if let Some(ref category) = query.category { builder = builder.bind(category); }

    Ok(builder.fetch_all(conn).await?)
}

pub async fn update(conn: &mut PgConnection, id: i32, data: &UpdateItem) -> AppResult<Item> {
    sqlx::query_as::<_, Item>(
        r#"
        UPDATE items SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            category = COALESCE($4, category),
            image_url = COALESCE($5, image_url)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&data.name)
    .bind(&data.description)
    .bind(&data.category)
    .bind(&data.image_url)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::not_found("Item", id))
}

pub async fn delete(conn: &mut PgConnection, id: i32) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Item", id));
    }
    Ok(())
}
