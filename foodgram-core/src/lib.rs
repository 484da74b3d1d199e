pub mod error;
pub mod image;
pub mod ingredient;
pub mod pagination;
pub mod pdf_font;
pub mod recipe;
pub mod shopping_list;
pub mod user;

pub use error::{FieldErrors, ImageError, PaginationError, ReportError, ValidationError};
pub use image::{decode_image_payload, validate_image, DecodedImage, ImagePayload, MAX_FILE_SIZE};
pub use ingredient::{parse_catalogue, CatalogueError, IngredientRecord};
pub use pagination::{PageMeta, PageRequest, PageSettings};
pub use recipe::{
    CreateRecipe, IngredientAmount, NewRecipe, RecipeChanges, RecipeItem, UpdateRecipe,
};
pub use shopping_list::{aggregate, render_pdf, CartEntry, ShoppingItem};
pub use user::{NewUser, PasswordChange, RegisterUser, SetPassword};
