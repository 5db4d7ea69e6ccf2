use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::db::entities::{ingredient, recipe, recipe_ingredient};

/// Lists a user's ingredients, ordered by name descending.
///
/// Same contract as `tag_service::list_tags`: `assigned_only` keeps only
/// ingredients referenced by at least one of the user's recipes.
pub async fn list_ingredients(
    db: &DatabaseConnection,
    user_id: i32,
    assigned_only: bool,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let mut query = ingredient::Entity::find()
        .filter(ingredient::Column::UserId.eq(user_id))
        .order_by_desc(ingredient::Column::Name);

    if assigned_only {
        let assigned_ids = assigned_ingredient_ids(db, user_id).await?;
        query = query.filter(ingredient::Column::Id.is_in(assigned_ids));
    }

    query.all(db).await
}

async fn assigned_ingredient_ids(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<i32>, DbErr> {
    let recipe_ids: Vec<i32> = recipe::Entity::find()
        .filter(recipe::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();

    let ingredient_ids: HashSet<i32> = recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|ri| ri.ingredient_id)
        .collect();

    Ok(ingredient_ids.into_iter().collect())
}

/// Creates a new ingredient owned by the user.
pub async fn create_ingredient(
    db: &DatabaseConnection,
    user_id: i32,
    name: &str,
) -> Result<ingredient::Model, DbErr> {
    let now = Utc::now();
    ingredient::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Fetches the subset of `ingredient_ids` that exist and belong to the user.
pub async fn find_owned_ingredients(
    db: &DatabaseConnection,
    user_id: i32,
    ingredient_ids: &[i32],
) -> Result<Vec<ingredient::Model>, DbErr> {
    if ingredient_ids.is_empty() {
        return Ok(Vec::new());
    }
    ingredient::Entity::find()
        .filter(ingredient::Column::UserId.eq(user_id))
        .filter(ingredient::Column::Id.is_in(ingredient_ids.to_vec()))
        .all(db)
        .await
}
