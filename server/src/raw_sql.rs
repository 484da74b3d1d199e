//! Raw SQL that can't be expressed in Diesel's type-safe DSL.
//!
//! User input is always passed via `.bind()` parameters, never interpolated.

/// The newest recipes of each listed author, at most `$2` per author.
///
/// Binds: `$1` author ids (`Array<Int4>`), `$2` per-author cap
/// (`Nullable<BigInt>`, `NULL` for no cap).
///
/// # Why raw SQL?
/// The cap needs `ROW_NUMBER() OVER (PARTITION BY ...)`, and Diesel has no
/// window functions.
pub const NEWEST_RECIPES_PER_AUTHOR_QUERY: &str = "SELECT id, author_id, name, image, text, cooking_time, pub_date \
    FROM ( \
        SELECT r.*, ROW_NUMBER() OVER ( \
            PARTITION BY r.author_id ORDER BY r.pub_date DESC, r.id DESC \
        ) AS rn \
        FROM recipes r \
        WHERE r.author_id = ANY($1) \
    ) ranked \
    WHERE $2::bigint IS NULL OR rn <= $2 \
    ORDER BY author_id, rn";
