use cinevault_core::{
    models::{parse_roles, Role, User},
    AppError,
};
use sqlx::{PgPool, Postgres};

/// Repository for user accounts and role membership
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user account.
    ///
    /// A concurrent insert of the same username surfaces as a database unique
    /// violation, which is mapped to `Conflict` so registration returns 409.
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "insert"))]
    pub async fn create_user(
        &self,
        username: &str,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            r#"
            INSERT INTO users (username, full_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, full_name, password_hash, disabled, created_at
            "#,
        )
        .bind(username)
        .bind(full_name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Username already registered".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            "SELECT id, username, full_name, password_hash, disabled, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(
            "SELECT id, username, full_name, password_hash, disabled, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Roles currently assigned to a user. Unknown role names in the table
    /// are skipped with a warning.
    #[tracing::instrument(skip(self), fields(db.table = "user_roles", db.operation = "select"))]
    pub async fn roles_of(&self, user_id: i64) -> Result<Vec<Role>, AppError> {
        let names = sqlx::query_scalar::<Postgres, String>(
            r#"
            SELECT r.name FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(parse_roles(&names))
    }

    /// Assign a role to a user, creating the role row on first use.
    /// Idempotent: assigning an already-held role is a no-op.
    #[tracing::instrument(skip(self), fields(db.table = "user_roles", db.operation = "insert"))]
    pub async fn assign_role(&self, user_id: i64, role: Role) -> Result<(), AppError> {
        let role_id = sqlx::query_scalar::<Postgres, i64>(
            r#"
            INSERT INTO roles (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<Postgres, User>(
            "SELECT id, username, full_name, password_hash, disabled, created_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
