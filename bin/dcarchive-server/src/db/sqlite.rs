//! SQLite implementation of [`BuildStore`].
//!
//! Migrations are embedded at compile time with `sqlx::migrate!` and run by
//! [`SqliteStore::connect`]. Queries use the runtime-checked `sqlx::query`
//! form so no `DATABASE_URL` is needed to build.
//!
//! Versions are compared numerically through the zero-padded
//! `version_order` column, so `1.0.10000` sorts above `1.0.9999`.

use std::str::FromStr;

use chrono::Utc;
use dcarchive_types::{BuildRecord, ModuleRecord, Platform, VersionTriple, empty_module_map};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::warn;

use super::BuildStore;

const BUILD_COLUMNS: &str = "platform, version, installer_link, installer_size, installer_etag, \
     mirror_link, mirror_size, mirror_etag, \
     download_all_mod_link, download_all_mod_size, download_all_mod_etag, \
     custom_install_link, custom_install_size, custom_install_etag, \
     nekocord_time_machine_link";

const MODULE_COLUMNS: &str = "m.platform, m.version, m.module_name, m.download_size, m.mirror_size, \
     m.download_etag, m.mirror_etag, m.download_link, m.mirror_link";

/// SQLite-backed build archive.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` is a sqlx SQLite URL such as `"sqlite://dcarchive.db"`, or
    /// `"sqlite::memory:"` for tests. An in-memory database is pinned to a
    /// single connection that is never recycled.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Wait for in-flight queries and close every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(FromRow)]
struct BuildRow {
    platform: String,
    version: String,
    installer_link: String,
    installer_size: i64,
    installer_etag: String,
    mirror_link: String,
    mirror_size: i64,
    mirror_etag: String,
    download_all_mod_link: String,
    download_all_mod_size: i64,
    download_all_mod_etag: String,
    custom_install_link: String,
    custom_install_size: i64,
    custom_install_etag: String,
    nekocord_time_machine_link: String,
}

#[derive(FromRow)]
struct ModuleRow {
    platform: String,
    version: String,
    module_name: String,
    download_size: i64,
    mirror_size: i64,
    download_etag: String,
    mirror_etag: String,
    download_link: String,
    mirror_link: Option<String>,
}

impl TryFrom<BuildRow> for BuildRecord {
    type Error = sqlx::Error;

    fn try_from(row: BuildRow) -> Result<Self, Self::Error> {
        Ok(BuildRecord {
            platform: parse_platform(&row.platform)?,
            version: row.version,
            installer_link: row.installer_link,
            installer_size: from_db(row.installer_size),
            installer_etag: row.installer_etag,
            mirror_link: row.mirror_link,
            mirror_size: from_db(row.mirror_size),
            mirror_etag: row.mirror_etag,
            download_all_mod_link: row.download_all_mod_link,
            download_all_mod_size: from_db(row.download_all_mod_size),
            download_all_mod_etag: row.download_all_mod_etag,
            custom_install_link: row.custom_install_link,
            custom_install_size: from_db(row.custom_install_size),
            custom_install_etag: row.custom_install_etag,
            nekocord_time_machine_link: row.nekocord_time_machine_link,
            modules: empty_module_map(),
        })
    }
}

impl TryFrom<ModuleRow> for ModuleRecord {
    type Error = sqlx::Error;

    fn try_from(row: ModuleRow) -> Result<Self, Self::Error> {
        Ok(ModuleRecord {
            platform: parse_platform(&row.platform)?,
            version: row.version,
            module_name: row.module_name,
            download_size: from_db(row.download_size),
            mirror_size: from_db(row.mirror_size),
            download_etag: row.download_etag,
            mirror_etag: row.mirror_etag,
            download_link: row.download_link,
            mirror_link: row.mirror_link,
        })
    }
}

impl BuildStore for SqliteStore {
    async fn upsert_build(&self, build: &BuildRecord) -> Result<(), sqlx::Error> {
        let updated_at = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO builds (platform, version, version_order, \
                 installer_link, installer_size, installer_etag, \
                 mirror_link, mirror_size, mirror_etag, \
                 download_all_mod_link, download_all_mod_size, download_all_mod_etag, \
                 custom_install_link, custom_install_size, custom_install_etag, \
                 nekocord_time_machine_link, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17) \
             ON CONFLICT(platform, version) DO UPDATE SET \
                 version_order = excluded.version_order, \
                 installer_link = excluded.installer_link, \
                 installer_size = excluded.installer_size, \
                 installer_etag = excluded.installer_etag, \
                 mirror_link = excluded.mirror_link, \
                 mirror_size = excluded.mirror_size, \
                 mirror_etag = excluded.mirror_etag, \
                 download_all_mod_link = excluded.download_all_mod_link, \
                 download_all_mod_size = excluded.download_all_mod_size, \
                 download_all_mod_etag = excluded.download_all_mod_etag, \
                 custom_install_link = excluded.custom_install_link, \
                 custom_install_size = excluded.custom_install_size, \
                 custom_install_etag = excluded.custom_install_etag, \
                 nekocord_time_machine_link = excluded.nekocord_time_machine_link, \
                 updated_at = excluded.updated_at",
        )
        .bind(build.platform.as_str())
        .bind(&build.version)
        .bind(version_order(&build.version))
        .bind(&build.installer_link)
        .bind(to_db(build.installer_size))
        .bind(&build.installer_etag)
        .bind(&build.mirror_link)
        .bind(to_db(build.mirror_size))
        .bind(&build.mirror_etag)
        .bind(&build.download_all_mod_link)
        .bind(to_db(build.download_all_mod_size))
        .bind(&build.download_all_mod_etag)
        .bind(&build.custom_install_link)
        .bind(to_db(build.custom_install_size))
        .bind(&build.custom_install_etag)
        .bind(&build.nekocord_time_machine_link)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_module(&self, module: &ModuleRecord) -> Result<(), sqlx::Error> {
        let updated_at = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO modules (platform, version, module_name, download_size, mirror_size, \
                 download_etag, mirror_etag, download_link, mirror_link, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
             ON CONFLICT(platform, version, module_name) DO UPDATE SET \
                 download_size = excluded.download_size, \
                 mirror_size = excluded.mirror_size, \
                 download_etag = excluded.download_etag, \
                 mirror_etag = excluded.mirror_etag, \
                 download_link = excluded.download_link, \
                 mirror_link = excluded.mirror_link, \
                 updated_at = excluded.updated_at",
        )
        .bind(module.platform.as_str())
        .bind(&module.version)
        .bind(&module.module_name)
        .bind(to_db(module.download_size))
        .bind(to_db(module.mirror_size))
        .bind(&module.download_etag)
        .bind(&module.mirror_etag)
        .bind(&module.download_link)
        .bind(&module.mirror_link)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_builds(
        &self,
        platform: Option<Platform>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<BuildRecord>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let rows = page_rows(&mut *tx, platform, skip, limit).await?;
        let builds = with_modules(&mut *tx, rows).await?;
        tx.commit().await?;
        Ok(builds)
    }

    async fn count_builds(&self, platform: Option<Platform>) -> Result<u64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM builds WHERE (?1 IS NULL OR platform = ?1)")
                .bind(platform.map(|p| p.as_str()))
                .fetch_one(&self.pool)
                .await?;
        Ok(from_db(count))
    }

    async fn get_build(
        &self,
        platform: Platform,
        version: &str,
    ) -> Result<Option<BuildRecord>, sqlx::Error> {
        let row: Option<BuildRow> = sqlx::query_as(&format!(
            "SELECT {BUILD_COLUMNS} FROM builds WHERE platform = ?1 AND version = ?2"
        ))
        .bind(platform.as_str())
        .bind(version)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let mut build = BuildRecord::try_from(row)?;
        let modules = modules_for(&mut *conn, platform, version).await?;
        attach_modules(&mut build, modules);
        Ok(Some(build))
    }

    async fn clear(&self) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM modules").execute(&mut *tx).await?;
        let removed = sqlx::query("DELETE FROM builds").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(removed.rows_affected())
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

async fn page_rows(
    conn: &mut SqliteConnection,
    platform: Option<Platform>,
    skip: u64,
    limit: u64,
) -> Result<Vec<BuildRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {BUILD_COLUMNS} FROM builds \
         WHERE (?1 IS NULL OR platform = ?1) \
         ORDER BY version_order DESC, platform ASC LIMIT ?2 OFFSET ?3"
    ))
    .bind(platform.map(|p| p.as_str()))
    .bind(to_db(limit))
    .bind(to_db(skip))
    .fetch_all(&mut *conn)
    .await
}

/// Modules are looked up by each row's own key, never by re-running the page
/// query, so a concurrent insert cannot shift which builds they belong to.
async fn with_modules(
    conn: &mut SqliteConnection,
    rows: Vec<BuildRow>,
) -> Result<Vec<BuildRecord>, sqlx::Error> {
    let mut builds = Vec::with_capacity(rows.len());
    for row in rows {
        let mut build = BuildRecord::try_from(row)?;
        let modules = modules_for(conn, build.platform, &build.version).await?;
        attach_modules(&mut build, modules);
        builds.push(build);
    }
    Ok(builds)
}

async fn modules_for(
    conn: &mut SqliteConnection,
    platform: Platform,
    version: &str,
) -> Result<Vec<ModuleRecord>, sqlx::Error> {
    let rows: Vec<ModuleRow> = sqlx::query_as(&format!(
        "SELECT {MODULE_COLUMNS} FROM modules m WHERE m.platform = ?1 AND m.version = ?2"
    ))
    .bind(platform.as_str())
    .bind(version)
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(ModuleRecord::try_from).collect()
}

fn attach_modules(build: &mut BuildRecord, modules: Vec<ModuleRecord>) {
    for module in modules {
        let name = module.module_name.clone();
        if build.set_module(&name, Some(module)).is_err() {
            warn!(platform = %build.platform, version = %build.version, module = %name, "ignoring stored module outside the catalog");
        }
    }
    build.normalize_modules();
}

fn version_order(version: &str) -> String {
    version
        .parse::<VersionTriple>()
        .map(|v| v.sort_key())
        .unwrap_or_else(|_| version.to_owned())
}

fn parse_platform(raw: &str) -> Result<Platform, sqlx::Error> {
    raw.parse::<Platform>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
