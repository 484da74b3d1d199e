//! Store access used by the HTTP handlers.
//!
//! Relations are followed through explicit queries over the foreign-key
//! columns. Functions that hydrate many rows at once take a slice of ids and
//! return lookup maps so handlers never issue one query per row.

use std::collections::{HashMap, HashSet};

use diesel::dsl::count_star;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Integer, Nullable};
use foodgram_core::{CartEntry, RecipeItem};

use crate::models::{
    Ingredient, NewFavorite, NewRecipeIngredient, NewShoppingCart, NewSubscription, Recipe, User,
};
use crate::raw_sql::NEWEST_RECIPES_PER_AUTHOR_QUERY;
use crate::schema::{
    favorites, ingredients, recipe_ingredients, recipes, shopping_carts, subscriptions, users,
};

type QueryResult<T> = Result<T, diesel::result::Error>;

// ---------------------------------------------------------------------------
// Users

pub fn find_user(conn: &mut PgConnection, id: i32) -> QueryResult<User> {
    users::table
        .find(id)
        .select(User::as_select())
        .first(conn)
}

pub fn find_user_by_email(conn: &mut PgConnection, email: &str) -> QueryResult<Option<User>> {
    users::table
        .filter(users::email.eq(email))
        .select(User::as_select())
        .first(conn)
        .optional()
}

pub fn email_taken(conn: &mut PgConnection, email: &str) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        users::table.filter(users::email.eq(email)),
    ))
    .get_result(conn)
}

pub fn username_taken(conn: &mut PgConnection, username: &str) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        users::table.filter(users::username.eq(username)),
    ))
    .get_result(conn)
}

pub fn count_users(conn: &mut PgConnection) -> QueryResult<i64> {
    users::table.count().get_result(conn)
}

pub fn list_users(conn: &mut PgConnection, offset: i64, limit: i64) -> QueryResult<Vec<User>> {
    users::table
        .order_by(users::id.asc())
        .offset(offset)
        .limit(limit)
        .select(User::as_select())
        .load(conn)
}

pub fn users_by_ids(conn: &mut PgConnection, ids: &[i32]) -> QueryResult<HashMap<i32, User>> {
    let rows = users::table
        .filter(users::id.eq_any(ids))
        .select(User::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(|u| (u.id, u)).collect())
}

pub fn set_password_hash(conn: &mut PgConnection, user_id: i32, hash: &str) -> QueryResult<usize> {
    diesel::update(users::table.find(user_id))
        .set(users::password_hash.eq(hash))
        .execute(conn)
}

/// Set or clear the avatar and return the previous file name.
pub fn replace_avatar(
    conn: &mut PgConnection,
    user_id: i32,
    avatar: Option<&str>,
) -> QueryResult<Option<String>> {
    conn.transaction(|conn| {
        let previous: Option<String> = users::table
            .find(user_id)
            .select(users::avatar)
            .for_update()
            .first(conn)?;
        diesel::update(users::table.find(user_id))
            .set(users::avatar.eq(avatar))
            .execute(conn)?;
        Ok(previous)
    })
}

// ---------------------------------------------------------------------------
// Subscriptions

/// Which of `author_ids` the viewer follows.
pub fn subscribed_among(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    author_ids: &[i32],
) -> QueryResult<HashSet<i32>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    let ids: Vec<i32> = subscriptions::table
        .filter(subscriptions::user_id.eq(viewer))
        .filter(subscriptions::author_id.eq_any(author_ids))
        .select(subscriptions::author_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

/// Insert the subscription; `false` when it already existed.
pub fn add_subscription(conn: &mut PgConnection, user_id: i32, author_id: i32) -> QueryResult<bool> {
    let inserted = diesel::insert_into(subscriptions::table)
        .values(NewSubscription { user_id, author_id })
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(inserted > 0)
}

pub fn remove_subscription(
    conn: &mut PgConnection,
    user_id: i32,
    author_id: i32,
) -> QueryResult<bool> {
    let deleted = diesel::delete(
        subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::author_id.eq(author_id)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

pub fn count_subscriptions(conn: &mut PgConnection, user_id: i32) -> QueryResult<i64> {
    subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .count()
        .get_result(conn)
}

/// Followed authors in subscription order.
pub fn subscribed_authors(
    conn: &mut PgConnection,
    user_id: i32,
    offset: i64,
    limit: i64,
) -> QueryResult<Vec<User>> {
    subscriptions::table
        .inner_join(users::table.on(users::id.eq(subscriptions::author_id)))
        .filter(subscriptions::user_id.eq(user_id))
        .order_by(subscriptions::id.asc())
        .offset(offset)
        .limit(limit)
        .select(User::as_select())
        .load(conn)
}

// ---------------------------------------------------------------------------
// Ingredients

pub fn list_ingredients(
    conn: &mut PgConnection,
    name_prefix: Option<&str>,
) -> QueryResult<Vec<Ingredient>> {
    let mut query = ingredients::table
        .select(Ingredient::as_select())
        .order_by((ingredients::name.asc(), ingredients::id.asc()))
        .into_boxed();
    if let Some(prefix) = name_prefix.filter(|p| !p.is_empty()) {
        query = query.filter(ingredients::name.ilike(format!("{}%", escape_like(prefix))));
    }
    query.load(conn)
}

pub fn find_ingredient(conn: &mut PgConnection, id: i32) -> QueryResult<Ingredient> {
    ingredients::table
        .find(id)
        .select(Ingredient::as_select())
        .first(conn)
}

/// Ids from `ids` that exist in the catalogue.
pub fn existing_ingredient_ids(conn: &mut PgConnection, ids: &[i32]) -> QueryResult<HashSet<i32>> {
    let found: Vec<i32> = ingredients::table
        .filter(ingredients::id.eq_any(ids))
        .select(ingredients::id)
        .load(conn)?;
    Ok(found.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Recipes

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecipeOrdering {
    #[default]
    NewestFirst,
    OldestFirst,
    QuickestFirst,
    SlowestFirst,
}

impl RecipeOrdering {
    /// Read an `ordering` query value. Unknown values fall back to the default.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("pub_date") => RecipeOrdering::OldestFirst,
            Some("-pub_date") => RecipeOrdering::NewestFirst,
            Some("cooking_time") => RecipeOrdering::QuickestFirst,
            Some("-cooking_time") => RecipeOrdering::SlowestFirst,
            _ => RecipeOrdering::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub favorited_by: Option<i32>,
    pub in_cart_of: Option<i32>,
    pub author: Option<i32>,
    pub search: Option<String>,
    pub ordering: RecipeOrdering,
}

fn filtered_recipes(filter: &RecipeFilter) -> recipes::BoxedQuery<'static, Pg> {
    let mut query = recipes::table.into_boxed();

    if let Some(user_id) = filter.favorited_by {
        query = query.filter(
            recipes::id.eq_any(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .select(favorites::recipe_id),
            ),
        );
    }
    if let Some(user_id) = filter.in_cart_of {
        query = query.filter(
            recipes::id.eq_any(
                shopping_carts::table
                    .filter(shopping_carts::user_id.eq(user_id))
                    .select(shopping_carts::recipe_id),
            ),
        );
    }
    if let Some(author_id) = filter.author {
        query = query.filter(recipes::author_id.eq(author_id));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        query = query.filter(
            recipes::name.ilike(pattern.clone()).or(recipes::author_id.eq_any(
                users::table
                    .filter(users::username.ilike(pattern))
                    .select(users::id),
            )),
        );
    }

    query
}

pub fn count_recipes(conn: &mut PgConnection, filter: &RecipeFilter) -> QueryResult<i64> {
    filtered_recipes(filter).count().get_result(conn)
}

pub fn list_recipes(
    conn: &mut PgConnection,
    filter: &RecipeFilter,
    offset: i64,
    limit: i64,
) -> QueryResult<Vec<Recipe>> {
    let query = filtered_recipes(filter);
    let query = match filter.ordering {
        RecipeOrdering::NewestFirst => query
            .order_by(recipes::pub_date.desc())
            .then_order_by(recipes::id.desc()),
        RecipeOrdering::OldestFirst => query
            .order_by(recipes::pub_date.asc())
            .then_order_by(recipes::id.asc()),
        RecipeOrdering::QuickestFirst => query
            .order_by(recipes::cooking_time.asc())
            .then_order_by(recipes::id.desc()),
        RecipeOrdering::SlowestFirst => query
            .order_by(recipes::cooking_time.desc())
            .then_order_by(recipes::id.desc()),
    };
    query
        .offset(offset)
        .limit(limit)
        .select(Recipe::as_select())
        .load(conn)
}

pub fn find_recipe(conn: &mut PgConnection, id: i32) -> QueryResult<Recipe> {
    recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(conn)
}

/// Ingredient lines per recipe, in insertion order.
pub fn recipe_items(
    conn: &mut PgConnection,
    recipe_ids: &[i32],
) -> QueryResult<HashMap<i32, Vec<(Ingredient, i32)>>> {
    let rows: Vec<(i32, Ingredient, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .filter(recipe_ingredients::recipe_id.eq_any(recipe_ids))
        .order_by(recipe_ingredients::id.asc())
        .select((
            recipe_ingredients::recipe_id,
            Ingredient::as_select(),
            recipe_ingredients::amount,
        ))
        .load(conn)?;

    let mut by_recipe: HashMap<i32, Vec<(Ingredient, i32)>> = HashMap::new();
    for (recipe_id, ingredient, amount) in rows {
        by_recipe.entry(recipe_id).or_default().push((ingredient, amount));
    }
    Ok(by_recipe)
}

/// Replace a recipe's ingredient set. Run inside the caller's transaction.
pub fn set_recipe_items(
    conn: &mut PgConnection,
    recipe_id: i32,
    items: &[RecipeItem],
) -> QueryResult<()> {
    diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)))
        .execute(conn)?;

    let rows: Vec<NewRecipeIngredient> = items
        .iter()
        .map(|item| NewRecipeIngredient {
            recipe_id,
            ingredient_id: item.ingredient_id,
            amount: item.amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

/// Newest recipes of each author, at most `per_author` each when given.
pub fn recipes_by_authors(
    conn: &mut PgConnection,
    author_ids: &[i32],
    per_author: Option<i64>,
) -> QueryResult<HashMap<i32, Vec<Recipe>>> {
    let rows: Vec<Recipe> = diesel::sql_query(NEWEST_RECIPES_PER_AUTHOR_QUERY)
        .bind::<Array<Integer>, _>(author_ids)
        .bind::<Nullable<BigInt>, _>(per_author)
        .load(conn)?;

    let mut by_author: HashMap<i32, Vec<Recipe>> = HashMap::new();
    for recipe in rows {
        by_author.entry(recipe.author_id).or_default().push(recipe);
    }
    Ok(by_author)
}

pub fn recipe_counts(conn: &mut PgConnection, author_ids: &[i32]) -> QueryResult<HashMap<i32, i64>> {
    let rows: Vec<(i32, i64)> = recipes::table
        .filter(recipes::author_id.eq_any(author_ids))
        .group_by(recipes::author_id)
        .select((recipes::author_id, count_star()))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

// ---------------------------------------------------------------------------
// Favorites and shopping cart

pub fn favorited_among(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    recipe_ids: &[i32],
) -> QueryResult<HashSet<i32>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    let ids: Vec<i32> = favorites::table
        .filter(favorites::user_id.eq(viewer))
        .filter(favorites::recipe_id.eq_any(recipe_ids))
        .select(favorites::recipe_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

pub fn in_cart_among(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    recipe_ids: &[i32],
) -> QueryResult<HashSet<i32>> {
    let Some(viewer) = viewer else {
        return Ok(HashSet::new());
    };
    let ids: Vec<i32> = shopping_carts::table
        .filter(shopping_carts::user_id.eq(viewer))
        .filter(shopping_carts::recipe_id.eq_any(recipe_ids))
        .select(shopping_carts::recipe_id)
        .load(conn)?;
    Ok(ids.into_iter().collect())
}

/// Insert the favorite; `false` when it already existed.
pub fn add_favorite(conn: &mut PgConnection, user_id: i32, recipe_id: i32) -> QueryResult<bool> {
    let inserted = diesel::insert_into(favorites::table)
        .values(NewFavorite { user_id, recipe_id })
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(inserted > 0)
}

pub fn remove_favorite(conn: &mut PgConnection, user_id: i32, recipe_id: i32) -> QueryResult<bool> {
    let deleted = diesel::delete(
        favorites::table
            .filter(favorites::user_id.eq(user_id))
            .filter(favorites::recipe_id.eq(recipe_id)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

/// Insert the cart entry; `false` when it already existed.
pub fn add_to_cart(conn: &mut PgConnection, user_id: i32, recipe_id: i32) -> QueryResult<bool> {
    let inserted = diesel::insert_into(shopping_carts::table)
        .values(NewShoppingCart { user_id, recipe_id })
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(inserted > 0)
}

pub fn remove_from_cart(conn: &mut PgConnection, user_id: i32, recipe_id: i32) -> QueryResult<bool> {
    let deleted = diesel::delete(
        shopping_carts::table
            .filter(shopping_carts::user_id.eq(user_id))
            .filter(shopping_carts::recipe_id.eq(recipe_id)),
    )
    .execute(conn)?;
    Ok(deleted > 0)
}

/// Every ingredient line of every recipe in the user's cart.
pub fn cart_entries(conn: &mut PgConnection, user_id: i32) -> QueryResult<Vec<CartEntry>> {
    let rows: Vec<(String, String, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .inner_join(
            shopping_carts::table.on(shopping_carts::recipe_id.eq(recipe_ingredients::recipe_id)),
        )
        .filter(shopping_carts::user_id.eq(user_id))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(name, measurement_unit, amount)| CartEntry {
            name,
            measurement_unit,
            amount,
        })
        .collect())
}

/// Escape `%`, `_` and `\` for use inside a LIKE pattern.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_values() {
        assert_eq!(RecipeOrdering::parse(None), RecipeOrdering::NewestFirst);
        assert_eq!(
            RecipeOrdering::parse(Some("pub_date")),
            RecipeOrdering::OldestFirst
        );
        assert_eq!(
            RecipeOrdering::parse(Some("-cooking_time")),
            RecipeOrdering::SlowestFirst
        );
        assert_eq!(
            RecipeOrdering::parse(Some("name")),
            RecipeOrdering::NewestFirst
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("flour"), "flour");
    }
}
