//! Postgres storage

use std::collections::BTreeMap;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::aliases::AliasDomain;
use crate::blogs::Blog;
use crate::blogs::BlogId;
use crate::settings::Scope;

use super::CreateAliasValues;
use super::CreateBlogValues;
use super::Error;
use super::Result;
use super::Storage;
use super::connection_error;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Blog ID used for network-wide settings, real blogs start at 1
const NETWORK_BLOG_ID: BlogId = 0;

/// Blog ID column value of a scope
fn scope_blog_id(scope: Scope) -> BlogId {
    match scope {
        Scope::Network => NETWORK_BLOG_ID,
        Scope::Blog(blog_id) => blog_id,
    }
}

/// Unique violations of an insert are conflicts, anything else is a connection error
fn insert_error(err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            Error::Conflict(err.message().to_string())
        }
        err => connection_error(err),
    }
}

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Migrations will be run
    pub async fn connect(database_connection_string: &str) -> Result<Self> {
        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_connection_string)
            .await
            .map_err(connection_error)?;

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> Result<Self> {
        let postgres = Self { connection_pool };

        postgres.install().await?;

        Ok(postgres)
    }
}

impl Storage for Postgres {
    async fn install(&self) -> Result<()> {
        MIGRATOR
            .run(&self.connection_pool)
            .await
            .map_err(connection_error)
    }

    async fn find_all_blogs(&self) -> Result<Vec<Blog>> {
        sqlx::query_as::<_, Blog>(
            r"
            SELECT
                id,
                domain,
                path,
                created_at,
                updated_at
            FROM blogs
            ORDER BY id
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_single_blog_by_id(&self, id: BlogId) -> Result<Option<Blog>> {
        sqlx::query_as::<_, Blog>(
            r"
            SELECT
                id,
                domain,
                path,
                created_at,
                updated_at
            FROM blogs
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_single_blog_by_domain_and_path(
        &self,
        domain: &str,
        path: &str,
    ) -> Result<Option<Blog>> {
        sqlx::query_as::<_, Blog>(
            r"
            SELECT
                id,
                domain,
                path,
                created_at,
                updated_at
            FROM blogs
            WHERE domain = $1
                AND (starts_with($2, path) OR path = $2 || '/')
            ORDER BY length(path) DESC
            LIMIT 1
            ",
        )
        .bind(domain)
        .bind(path)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_any_blog_by_domain(&self, domain: &str) -> Result<Option<Blog>> {
        sqlx::query_as::<_, Blog>(
            r"
            SELECT
                id,
                domain,
                path,
                created_at,
                updated_at
            FROM blogs
            WHERE domain = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(domain)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn create_blog(&self, values: &CreateBlogValues<'_>) -> Result<Blog> {
        sqlx::query_as::<_, Blog>(
            r"
            INSERT INTO blogs (domain, path)
            VALUES ($1, $2)
            RETURNING
                id,
                domain,
                path,
                created_at,
                updated_at
            ",
        )
        .bind(values.domain)
        .bind(values.path)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(insert_error)
    }

    async fn find_all_aliases(&self) -> Result<Vec<AliasDomain>> {
        sqlx::query_as::<_, AliasDomain>(
            r"
            SELECT
                id,
                domain_alias,
                blog_id,
                created_at,
                updated_at
            FROM alias_domains
            ORDER BY created_at, domain_alias
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_all_aliases_by_blog(&self, blog: &Blog) -> Result<Vec<AliasDomain>> {
        sqlx::query_as::<_, AliasDomain>(
            r"
            SELECT
                id,
                domain_alias,
                blog_id,
                created_at,
                updated_at
            FROM alias_domains
            WHERE blog_id = $1
            ORDER BY created_at, domain_alias
            ",
        )
        .bind(blog.id)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_single_alias_by_id(&self, id: &Uuid) -> Result<Option<AliasDomain>> {
        sqlx::query_as::<_, AliasDomain>(
            r"
            SELECT
                id,
                domain_alias,
                blog_id,
                created_at,
                updated_at
            FROM alias_domains
            WHERE id = $1
            LIMIT 1
            ",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn find_single_alias_by_domain(&self, domain: &str) -> Result<Option<AliasDomain>> {
        sqlx::query_as::<_, AliasDomain>(
            r"
            SELECT
                id,
                domain_alias,
                blog_id,
                created_at,
                updated_at
            FROM alias_domains
            WHERE domain_alias = $1
            LIMIT 1
            ",
        )
        .bind(domain)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn create_alias(
        &self,
        blog: &Blog,
        values: &CreateAliasValues<'_>,
    ) -> Result<AliasDomain> {
        sqlx::query_as::<_, AliasDomain>(
            r"
            INSERT INTO alias_domains (id, domain_alias, blog_id)
            VALUES ($1, $2, $3)
            RETURNING
                id,
                domain_alias,
                blog_id,
                created_at,
                updated_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.domain_alias)
        .bind(blog.id)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(insert_error)
    }

    async fn delete_alias(&self, alias: &AliasDomain) -> Result<()> {
        sqlx::query(
            r"
            DELETE FROM alias_domains
            WHERE id = $1
            ",
        )
        .bind(alias.id)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn delete_all_aliases(&self) -> Result<()> {
        sqlx::query("DELETE FROM alias_domains")
            .execute(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(())
    }

    async fn find_all_settings(&self, scope: Scope) -> Result<BTreeMap<String, String>> {
        let settings = sqlx::query_as::<_, (String, String)>(
            r"
            SELECT
                key,
                value
            FROM settings
            WHERE blog_id = $1
            ",
        )
        .bind(scope_blog_id(scope))
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(settings.into_iter().collect())
    }

    async fn get_setting(&self, scope: Scope, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r"
            SELECT value
            FROM settings
            WHERE blog_id = $1
                AND key = $2
            ",
        )
        .bind(scope_blog_id(scope))
        .bind(key)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)
    }

    async fn set_setting(&self, scope: Scope, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO settings (blog_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (blog_id, key)
            DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = NOW()
            ",
        )
        .bind(scope_blog_id(scope))
        .bind(key)
        .bind(value)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }

    async fn delete_setting(&self, scope: Scope, key: &str) -> Result<()> {
        sqlx::query(
            r"
            DELETE FROM settings
            WHERE blog_id = $1
                AND key = $2
            ",
        )
        .bind(scope_blog_id(scope))
        .bind(key)
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }
}
