/*
 * Responsibility
 * - read-only SQLx lookup of a login identity for principal resolution
 * - users/people/roles are owned elsewhere; this only reads them
 */
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

#[derive(Debug, Clone, FromRow)]
pub struct LoginIdentityRow {
    #[sqlx(rename = "userName")]
    pub user_name: String,
    pub email: String,
    #[sqlx(rename = "roleName")]
    pub role_name: String,
}

pub async fn find_by_user_name(
    db: &PgPool,
    user_name: &str,
) -> Result<Option<LoginIdentityRow>, RepoError> {
    let row = sqlx::query_as::<_, LoginIdentityRow>(
        r#"
        SELECT u."userName", p."email", r."roleName"
        FROM users u
        JOIN people p ON p."personId" = u."personId"
        JOIN roles r ON r."roleId" = u."roleId"
        WHERE u."userName" = $1
        "#,
    )
    .bind(user_name)
    .fetch_optional(db)
    .await?;

    Ok(row)
}
