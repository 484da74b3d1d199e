//! Create and update schemas for recipes.
//!
//! Both schemas check what can be checked without the store: presence,
//! bounds, duplicate ingredient ids and the image payload. Whether each
//! ingredient id exists is left to the caller.

use std::collections::HashSet;

use crate::error::{FieldErrors, ValidationError, REQUIRED};
use crate::image::{DecodedImage, ImagePayload};

pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 32_000;
pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 32_000;
pub const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i64,
}

/// A validated (ingredient id, amount) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeItem {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// Body of a recipe creation request. Every field is required.
#[derive(Debug, Clone, Default)]
pub struct CreateRecipe {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub image: Option<ImagePayload>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

/// Body of a recipe update request. Absent fields keep their stored value,
/// except `ingredients`, which must always be sent and replaces the whole set.
#[derive(Debug, Clone, Default)]
pub struct UpdateRecipe {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
    pub image: Option<ImagePayload>,
    pub ingredients: Option<Vec<IngredientAmount>>,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: DecodedImage,
    pub items: Vec<RecipeItem>,
}

#[derive(Debug, Clone)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<DecodedImage>,
    pub items: Vec<RecipeItem>,
}

impl CreateRecipe {
    pub fn validate(self) -> Result<NewRecipe, ValidationError> {
        let mut errors = FieldErrors::new();

        let name = required(&mut errors, "name", self.name).and_then(|n| check_name(&mut errors, n));
        let text = required(&mut errors, "text", self.text).and_then(|t| check_text(&mut errors, t));
        let cooking_time = required(&mut errors, "cooking_time", self.cooking_time)
            .and_then(|c| check_cooking_time(&mut errors, c));
        let image = required(&mut errors, "image", self.image)
            .and_then(|i| check_image(&mut errors, "image", i));
        let items = check_items(&mut errors, self.ingredients);

        match (name, text, cooking_time, image, items) {
            (Some(name), Some(text), Some(cooking_time), Some(image), Some(items))
                if errors.is_empty() =>
            {
                Ok(NewRecipe {
                    name,
                    text,
                    cooking_time,
                    image,
                    items,
                })
            }
            _ => Err(ValidationError(errors)),
        }
    }
}

impl UpdateRecipe {
    pub fn validate(self) -> Result<RecipeChanges, ValidationError> {
        let mut errors = FieldErrors::new();

        let name = self.name.and_then(|n| check_name(&mut errors, n));
        let text = self.text.and_then(|t| check_text(&mut errors, t));
        let cooking_time = self
            .cooking_time
            .and_then(|c| check_cooking_time(&mut errors, c));
        let image = self
            .image
            .and_then(|i| check_image(&mut errors, "image", i));
        let items = check_items(&mut errors, self.ingredients);

        match items {
            Some(items) if errors.is_empty() => Ok(RecipeChanges {
                name,
                text,
                cooking_time,
                image,
                items,
            }),
            _ => Err(ValidationError(errors)),
        }
    }
}

fn required<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, REQUIRED);
    }
    value
}

fn check_name(errors: &mut FieldErrors, name: String) -> Option<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        errors.add("name", "This field may not be blank.");
        return None;
    }
    if name.chars().count() > MAX_NAME_LEN {
        errors.add(
            "name",
            format!("Ensure this field has no more than {MAX_NAME_LEN} characters."),
        );
        return None;
    }
    Some(name)
}

fn check_text(errors: &mut FieldErrors, text: String) -> Option<String> {
    if text.trim().is_empty() {
        errors.add("text", "This field may not be blank.");
        return None;
    }
    Some(text)
}

fn check_cooking_time(errors: &mut FieldErrors, minutes: i64) -> Option<i32> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&minutes) {
        errors.add(
            "cooking_time",
            format!("Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes."),
        );
        return None;
    }
    i32::try_from(minutes).ok()
}

fn check_image(errors: &mut FieldErrors, field: &str, payload: ImagePayload) -> Option<DecodedImage> {
    match payload.decode() {
        Ok(image) => Some(image),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

/// Check the ingredient list as a whole. Returns the items in request order.
pub fn check_items(
    errors: &mut FieldErrors,
    ingredients: Option<Vec<IngredientAmount>>,
) -> Option<Vec<RecipeItem>> {
    let Some(ingredients) = ingredients else {
        errors.add("ingredients", REQUIRED);
        return None;
    };

    if ingredients.is_empty() {
        errors.add("ingredients", "At least one ingredient is required.");
        return None;
    }

    let mut valid = true;
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(ingredients.len());

    for entry in ingredients {
        if !seen.insert(entry.id) {
            errors.add(
                "ingredients",
                format!("Ingredient {} is listed more than once.", entry.id),
            );
            valid = false;
            continue;
        }
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&entry.amount) {
            errors.add(
                "ingredients",
                format!(
                    "Amount for ingredient {} must be between {MIN_AMOUNT} and {MAX_AMOUNT}.",
                    entry.id
                ),
            );
            valid = false;
            continue;
        }
        items.push(RecipeItem {
            ingredient_id: entry.id,
            amount: entry.amount as i32,
        });
    }

    valid.then_some(items)
}
