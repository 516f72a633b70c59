// Referential checks shared by the dependent entities
pub mod references;

// Accounts
pub mod hosts;
pub mod users;

// Listings
pub mod amenities;
pub mod properties;

// Guest activity
pub mod bookings;
pub mod reviews;

// Fixture loading
pub mod seed;

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};

const LIKE_ESCAPE: char = '!';

/// Case-insensitive substring match on a text column. `%` and `_` in the
/// needle match literally.
pub(crate) fn contains_ignore_case<C: IntoColumnRef>(column: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("a_b%c"), "a!_b!%c");
        assert_eq!(escape_like("wow!"), "wow!!");
        assert_eq!(escape_like("wifi"), "wifi");
    }
}
