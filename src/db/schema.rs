//! Schema bootstrap derived from the entity definitions.
//!
//! Tables are created with `IF NOT EXISTS`, so running this against an
//! already-initialized database is a no-op. Tests run it against an
//! in-memory SQLite database before every case.

use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};

use crate::db::entities::{ingredient, recipe, recipe_ingredient, recipe_tag, tag, user};

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Order matters: referencing tables after their targets.
    let mut stmts = vec![
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(tag::Entity),
        schema.create_table_from_entity(ingredient::Entity),
        schema.create_table_from_entity(recipe::Entity),
        schema.create_table_from_entity(recipe_tag::Entity),
        schema.create_table_from_entity(recipe_ingredient::Entity),
    ];

    for stmt in stmts.iter_mut() {
        stmt.if_not_exists();
        db.execute(builder.build(&*stmt)).await?;
    }

    Ok(())
}
