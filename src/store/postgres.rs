use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::collections::BTreeMap;

use crate::model::{ConfigItem, GrayBranch, Id, NamespaceInstance, NamespaceKey, Release};
use crate::store::traits::{BranchStore, NamespaceStore, ReleaseStore, Store};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the schema if it does not exist yet. Statements are idempotent
    /// so this can run on every startup.
    pub async fn migrate(&self) -> Result<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS namespaces (
                app_id TEXT NOT NULL,
                env TEXT NOT NULL,
                cluster_name TEXT NOT NULL,
                namespace_name TEXT NOT NULL,
                items_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (app_id, env, cluster_name, namespace_name)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS gray_branches (
                app_id TEXT NOT NULL,
                env TEXT NOT NULL,
                parent_cluster TEXT NOT NULL,
                branch_name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                PRIMARY KEY (app_id, env, parent_cluster, branch_name)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS releases (
                seq BIGSERIAL,
                id TEXT NOT NULL,
                app_id TEXT NOT NULL,
                env TEXT NOT NULL,
                cluster_name TEXT NOT NULL,
                namespace_name TEXT NOT NULL,
                title TEXT,
                comment TEXT,
                items_blob BYTEA NOT NULL,
                fingerprint TEXT NOT NULL,
                created_at TEXT NOT NULL,
                created_by TEXT NOT NULL,
                is_abandoned BOOLEAN NOT NULL DEFAULT FALSE,
                PRIMARY KEY (env, id)
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS idx_releases_instance
                ON releases (app_id, env, cluster_name, namespace_name, seq DESC)
            "#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run schema migration")?;
        }

        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Compress a release item map to a gzip JSON blob.
fn encode_items(items: &BTreeMap<String, String>) -> Result<Vec<u8>> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let json = serde_json::to_vec(items).context("Failed to serialize release items")?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .context("Failed to compress release items")?;
    encoder.finish().context("Failed to compress release items")
}

fn decode_items(blob: &[u8]) -> Result<BTreeMap<String, String>> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    // Gzip magic bytes 1f 8b; uncompressed blobs from older rows pass through.
    let json = if blob.len() >= 2 && blob[0] == 0x1f && blob[1] == 0x8b {
        let mut decoder = GzDecoder::new(blob);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .context("Failed to decompress release items")?;
        decompressed
    } else {
        blob.to_vec()
    };

    serde_json::from_slice(&json).context("Failed to deserialize release items")
}

fn release_from_row(row: &sqlx::postgres::PgRow) -> Result<Release> {
    let blob: Vec<u8> = row.get("items_blob");
    Ok(Release {
        id: row.get("id"),
        app_id: row.get("app_id"),
        env: row.get("env"),
        cluster_name: row.get("cluster_name"),
        namespace_name: row.get("namespace_name"),
        title: row.get("title"),
        comment: row.get("comment"),
        items: decode_items(&blob)?,
        fingerprint: row.get("fingerprint"),
        created_at: row.get("created_at"),
        created_by: row.get("created_by"),
        is_abandoned: row.get("is_abandoned"),
    })
}

const RELEASE_COLUMNS: &str = "id, app_id, env, cluster_name, namespace_name, title, comment, \
                               items_blob, fingerprint, created_at, created_by, is_abandoned";

#[async_trait::async_trait]
impl NamespaceStore for PostgresStore {
    async fn get_namespace(&self, key: &NamespaceKey) -> Result<Option<NamespaceInstance>> {
        let row = sqlx::query(
            "SELECT items_json, created_at, updated_at FROM namespaces \
             WHERE app_id = $1 AND env = $2 AND cluster_name = $3 AND namespace_name = $4",
        )
        .bind(&key.app_id)
        .bind(&key.env)
        .bind(&key.cluster_name)
        .bind(&key.namespace_name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch namespace")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items_json: String = row.get("items_json");
        let items: BTreeMap<String, ConfigItem> =
            serde_json::from_str(&items_json).context("Failed to deserialize namespace items")?;

        Ok(Some(NamespaceInstance {
            app_id: key.app_id.clone(),
            env: key.env.clone(),
            cluster_name: key.cluster_name.clone(),
            namespace_name: key.namespace_name.clone(),
            items,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn upsert_namespace(&self, instance: NamespaceInstance) -> Result<()> {
        let items_json = serde_json::to_string(&instance.items)
            .context("Failed to serialize namespace items")?;

        sqlx::query(
            r#"
            INSERT INTO namespaces (app_id, env, cluster_name, namespace_name, items_json, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (app_id, env, cluster_name, namespace_name) DO UPDATE SET
                items_json = EXCLUDED.items_json,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&instance.app_id)
        .bind(&instance.env)
        .bind(&instance.cluster_name)
        .bind(&instance.namespace_name)
        .bind(items_json)
        .bind(&instance.created_at)
        .bind(&instance.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert namespace")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl BranchStore for PostgresStore {
    async fn get_branch(
        &self,
        app_id: &str,
        env: &str,
        parent_cluster: &str,
        branch_name: &str,
    ) -> Result<Option<GrayBranch>> {
        let row = sqlx::query(
            "SELECT created_at, created_by FROM gray_branches \
             WHERE app_id = $1 AND env = $2 AND parent_cluster = $3 AND branch_name = $4",
        )
        .bind(app_id)
        .bind(env)
        .bind(parent_cluster)
        .bind(branch_name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch gray branch")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(GrayBranch {
            app_id: app_id.to_string(),
            env: env.to_string(),
            parent_cluster: parent_cluster.to_string(),
            branch_name: branch_name.to_string(),
            created_at: row.get("created_at"),
            created_by: row.get("created_by"),
        }))
    }

    async fn upsert_branch(&self, branch: GrayBranch) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO gray_branches (app_id, env, parent_cluster, branch_name, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (app_id, env, parent_cluster, branch_name) DO NOTHING
            "#,
        )
        .bind(&branch.app_id)
        .bind(&branch.env)
        .bind(&branch.parent_cluster)
        .bind(&branch.branch_name)
        .bind(&branch.created_at)
        .bind(&branch.created_by)
        .execute(&self.pool)
        .await
        .context("Failed to upsert gray branch")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ReleaseStore for PostgresStore {
    async fn get_release(&self, env: &str, id: &Id) -> Result<Option<Release>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM releases WHERE env = $1 AND id = $2",
            RELEASE_COLUMNS
        ))
        .bind(env)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch release")?;

        match row {
            Some(row) => Ok(Some(release_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert_release(&self, release: Release) -> Result<()> {
        let blob = encode_items(&release.items)?;

        sqlx::query(
            r#"
            INSERT INTO releases (id, app_id, env, cluster_name, namespace_name, title, comment,
                                  items_blob, fingerprint, created_at, created_by, is_abandoned)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(&release.id)
        .bind(&release.app_id)
        .bind(&release.env)
        .bind(&release.cluster_name)
        .bind(&release.namespace_name)
        .bind(&release.title)
        .bind(&release.comment)
        .bind(blob)
        .bind(&release.fingerprint)
        .bind(&release.created_at)
        .bind(&release.created_by)
        .bind(release.is_abandoned)
        .execute(&self.pool)
        .await
        .context("Failed to insert release")?;

        Ok(())
    }

    async fn set_abandoned(&self, env: &str, id: &Id) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE releases SET is_abandoned = TRUE \
             WHERE env = $1 AND id = $2 AND is_abandoned = FALSE",
        )
        .bind(env)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to abandon release")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_releases(
        &self,
        key: &NamespaceKey,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Release>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM releases \
             WHERE app_id = $1 AND env = $2 AND cluster_name = $3 AND namespace_name = $4 \
             ORDER BY seq DESC OFFSET $5 LIMIT $6",
            RELEASE_COLUMNS
        ))
        .bind(&key.app_id)
        .bind(&key.env)
        .bind(&key.cluster_name)
        .bind(&key.namespace_name)
        .bind(offset as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list releases")?;

        rows.iter().map(release_from_row).collect()
    }

    async fn latest_active_release(&self, key: &NamespaceKey) -> Result<Option<Release>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM releases \
             WHERE app_id = $1 AND env = $2 AND cluster_name = $3 AND namespace_name = $4 \
               AND is_abandoned = FALSE \
             ORDER BY seq DESC LIMIT 1",
            RELEASE_COLUMNS
        ))
        .bind(&key.app_id)
        .bind(&key.env)
        .bind(&key.cluster_name)
        .bind(&key.namespace_name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch active release")?;

        match row {
            Some(row) => Ok(Some(release_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn latest_active_before(&self, env: &str, id: &Id) -> Result<Option<Release>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM releases r
            WHERE r.is_abandoned = FALSE
              AND (r.app_id, r.env, r.cluster_name, r.namespace_name) =
                  (SELECT t.app_id, t.env, t.cluster_name, t.namespace_name
                     FROM releases t WHERE t.env = $1 AND t.id = $2)
              AND r.seq < (SELECT t.seq FROM releases t WHERE t.env = $1 AND t.id = $2)
            ORDER BY r.seq DESC LIMIT 1
            "#,
            RELEASE_COLUMNS
        ))
        .bind(env)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch preceding active release")?;

        match row {
            Some(row) => Ok(Some(release_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

impl Store for PostgresStore {}
