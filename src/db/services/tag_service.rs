use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::entities::{recipe, recipe_tag, tag};

/// Lists a user's tags, ordered by name descending.
///
/// With `assigned_only`, only tags attached to at least one of the user's
/// recipes are returned. Each tag appears at most once either way.
pub async fn list_tags(
    db: &DatabaseConnection,
    user_id: i32,
    assigned_only: bool,
) -> Result<Vec<tag::Model>, DbErr> {
    let mut query = tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .order_by_desc(tag::Column::Name);

    if assigned_only {
        let assigned_ids = assigned_tag_ids(db, user_id).await?;
        query = query.filter(tag::Column::Id.is_in(assigned_ids));
    }

    query.all(db).await
}

async fn assigned_tag_ids(db: &DatabaseConnection, user_id: i32) -> Result<Vec<i32>, DbErr> {
    let recipe_ids: Vec<i32> = recipe::Entity::find()
        .filter(recipe::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    let tag_ids: HashSet<i32> = recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|rt| rt.tag_id)
        .collect();

    Ok(tag_ids.into_iter().collect())
}

/// Creates a new tag owned by the user.
pub async fn create_tag(
    db: &DatabaseConnection,
    user_id: i32,
    name: &str,
) -> Result<tag::Model, DbErr> {
    let now = Utc::now();
    tag::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Fetches the subset of `tag_ids` that exist and belong to the user.
pub async fn find_owned_tags(
    db: &DatabaseConnection,
    user_id: i32,
    tag_ids: &[i32],
) -> Result<Vec<tag::Model>, DbErr> {
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }
    tag::Entity::find()
        .filter(tag::Column::UserId.eq(user_id))
        .filter(tag::Column::Id.is_in(tag_ids.to_vec()))
        .all(db)
        .await
}
