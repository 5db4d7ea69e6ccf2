use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::db::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag};

/// A recipe together with the ids of its attached tags and ingredients,
/// as used by the list representation.
#[derive(Debug, Clone)]
pub struct RecipeWithRelationIds {
    pub recipe: recipe::Model,
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

/// Field-level changes for an update. `None` leaves a field untouched;
/// `link: Some(None)` clears the link. Relation sets, when present,
/// replace the stored set wholesale.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<f64>,
    pub link: Option<Option<String>>,
    pub tag_ids: Option<Vec<i32>>,
    pub ingredient_ids: Option<Vec<i32>>,
}

pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: Option<String>,
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

/// Lists a user's recipes, newest first.
pub async fn list_recipes(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<RecipeWithRelationIds>, DbErr> {
    let recipes = recipe::Entity::find()
        .filter(recipe::Column::UserId.eq(user_id))
        .order_by_desc(recipe::Column::Id)
        .all(db)
        .await?;

    let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

    let mut tags_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in recipe_tag::Entity::find()
        .filter(recipe_tag::Column::RecipeId.is_in(recipe_ids.clone()))
        .all(db)
        .await?
    {
        tags_by_recipe.entry(row.recipe_id).or_default().push(row.tag_id);
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<i32>> = HashMap::new();
    for row in recipe_ingredient::Entity::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
        .all(db)
        .await?
    {
        ingredients_by_recipe
            .entry(row.recipe_id)
            .or_default()
            .push(row.ingredient_id);
    }

    Ok(recipes
        .into_iter()
        .map(|r| {
            let tag_ids = tags_by_recipe.remove(&r.id).unwrap_or_default();
            let ingredient_ids = ingredients_by_recipe.remove(&r.id).unwrap_or_default();
            RecipeWithRelationIds {
                recipe: r,
                tag_ids,
                ingredient_ids,
            }
        })
        .collect())
}

/// Finds a single recipe by id, scoped to the user. Other users' recipes
/// are indistinguishable from nonexistent ones.
pub async fn find_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    recipe_id: i32,
) -> Result<Option<recipe::Model>, DbErr> {
    recipe::Entity::find_by_id(recipe_id)
        .filter(recipe::Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Loads the expanded tag and ingredient models for a recipe.
pub async fn load_recipe_relations(
    db: &DatabaseConnection,
    recipe_model: &recipe::Model,
) -> Result<(Vec<tag::Model>, Vec<ingredient::Model>), DbErr> {
    let tags = recipe_model
        .find_related(tag::Entity)
        .order_by_desc(tag::Column::Name)
        .all(db)
        .await?;
    let ingredients = recipe_model
        .find_related(ingredient::Entity)
        .order_by_desc(ingredient::Column::Name)
        .all(db)
        .await?;
    Ok((tags, ingredients))
}

/// Inserts a recipe and its relation rows in one transaction.
///
/// Callers must have validated that the relation ids belong to the user.
pub async fn create_recipe(
    db: &DatabaseConnection,
    user_id: i32,
    data: NewRecipe,
) -> Result<recipe::Model, DbErr> {
    let txn = db.begin().await?;
    let now = Utc::now();

    let recipe_model = recipe::ActiveModel {
        user_id: Set(user_id),
        title: Set(data.title),
        time_minutes: Set(data.time_minutes),
        price: Set(data.price),
        link: Set(data.link),
        image: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    replace_recipe_tags(&txn, recipe_model.id, &data.tag_ids).await?;
    replace_recipe_ingredients(&txn, recipe_model.id, &data.ingredient_ids).await?;

    txn.commit().await?;
    Ok(recipe_model)
}

/// Applies `changes` to a recipe the caller already resolved through
/// `find_recipe`. Scalar updates and relation replacement share one
/// transaction.
pub async fn update_recipe(
    db: &DatabaseConnection,
    recipe_model: recipe::Model,
    changes: RecipeChanges,
) -> Result<recipe::Model, DbErr> {
    let txn = db.begin().await?;
    let recipe_id = recipe_model.id;

    let mut active: recipe::ActiveModel = recipe_model.into();
    if let Some(title) = changes.title {
        active.title = Set(title);
    }
    if let Some(time_minutes) = changes.time_minutes {
        active.time_minutes = Set(time_minutes);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(link) = changes.link {
        active.link = Set(link);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    if let Some(tag_ids) = changes.tag_ids {
        replace_recipe_tags(&txn, recipe_id, &tag_ids).await?;
    }
    if let Some(ingredient_ids) = changes.ingredient_ids {
        replace_recipe_ingredients(&txn, recipe_id, &ingredient_ids).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

/// Records the stored image path for a recipe.
pub async fn set_recipe_image(
    db: &DatabaseConnection,
    recipe_model: recipe::Model,
    image_path: String,
) -> Result<recipe::Model, DbErr> {
    let mut active: recipe::ActiveModel = recipe_model.into();
    active.image = Set(Some(image_path));
    active.updated_at = Set(Utc::now());
    active.update(db).await
}

async fn replace_recipe_tags<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    tag_ids: &[i32],
) -> Result<(), DbErr> {
    recipe_tag::Entity::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;

    if !tag_ids.is_empty() {
        let rows = tag_ids.iter().map(|&tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        });
        recipe_tag::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}

async fn replace_recipe_ingredients<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    ingredient_ids: &[i32],
) -> Result<(), DbErr> {
    recipe_ingredient::Entity::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await?;

    if !ingredient_ids.is_empty() {
        let rows = ingredient_ids
            .iter()
            .map(|&ingredient_id| recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe_id),
                ingredient_id: Set(ingredient_id),
            });
        recipe_ingredient::Entity::insert_many(rows).exec(conn).await?;
    }
    Ok(())
}
