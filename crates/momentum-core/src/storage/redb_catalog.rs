//! # redb-backed Catalog Storage
//!
//! A transactional catalog store using the redb embedded database, providing:
//! - ACID transactions (one per catalog operation)
//! - MVCC snapshots for readers, a single serialized writer
//! - Unique indexes that reject duplicates inside the write transaction
//! - Ordered indexes for bounded per-parent retrieval
//!
//! ## Bounded Retrieval
//!
//! Child collections are never loaded whole. Each ordered index is keyed by
//! `(parent, sort_key, child)`, so "the N newest children of P" is a reverse
//! range scan over P's key prefix that stops after N entries. Only those N
//! rows are decoded.
//!
//! The highest version of a tier is found the same way: `releases_by_version`
//! is keyed by [`Version::sort_key`], so its last entry under
//! `(project, status)` is the latest release. For that reason the store
//! refuses versions that do not parse.
//!
//! ## Transaction Scopes
//!
//! `CatalogDb::read` hands out a [`ReadScope`] over a consistent snapshot and
//! `CatalogDb::write` a [`WriteScope`] that is aborted on drop unless
//! [`WriteScope::commit`] is called. Both implement [`CatalogRead`].

use crate::version::Version;
use crate::{
    Build, BuildId, CatalogError, Missing, NewBuild, NewProject, NewRelease, Project, ProjectId,
    Release, ReleaseId, ReleaseStatus,
};
use chrono::Utc;
use redb::backends::InMemoryBackend;
use redb::{
    Database, Key, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, Value,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::path::Path;

/// Table for projects: project id -> serialized Project
const PROJECTS: TableDefinition<u64, &[u8]> = TableDefinition::new("projects");

/// Table for releases: release id -> serialized Release
const RELEASES: TableDefinition<u64, &[u8]> = TableDefinition::new("releases");

/// Table for builds: build id -> serialized Build
const BUILDS: TableDefinition<u64, &[u8]> = TableDefinition::new("builds");

/// Unique index: slug -> project id
const PROJECT_SLUGS: TableDefinition<&str, u64> = TableDefinition::new("project_slugs");

/// Unique index: version -> release id. Catalog-wide, not per project.
const RELEASE_VERSIONS: TableDefinition<&str, u64> = TableDefinition::new("release_versions");

/// Unique index: (release id, specific build id) -> build id.
/// Also orders a release's builds by specific build id.
const BUILD_NUMBERS: TableDefinition<(u64, u64), u64> = TableDefinition::new("build_numbers");

/// Ordered index: (project id, created_at micros, release id)
const RELEASES_BY_CREATION: TableDefinition<(u64, i64, u64), ()> =
    TableDefinition::new("releases_by_creation");

/// Ordered index: (project id, status code, created_at micros, release id)
const RELEASES_BY_TIER: TableDefinition<(u64, u8, i64, u64), ()> =
    TableDefinition::new("releases_by_tier");

/// Ordered index: (project id, status code, version sort key, created_at micros, release id)
const RELEASES_BY_VERSION: TableDefinition<(u64, u8, &[u8], i64, u64), ()> =
    TableDefinition::new("releases_by_version");

/// Ordered index: (release id, built_at micros, build id)
const BUILDS_BY_TIME: TableDefinition<(u64, i64, u64), ()> =
    TableDefinition::new("builds_by_time");

/// Ordered index of recommended builds only: (release id, built_at micros, build id)
const RECOMMENDED_BUILDS: TableDefinition<(u64, i64, u64), ()> =
    TableDefinition::new("recommended_builds");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_PROJECT_ID: &str = "next_project_id";
const NEXT_RELEASE_ID: &str = "next_release_id";
const NEXT_BUILD_ID: &str = "next_build_id";

fn store(e: impl Display) -> CatalogError {
    CatalogError::Store(e.to_string())
}

fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, CatalogError> {
    postcard::to_allocvec(record).map_err(|e| CatalogError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CatalogError> {
    postcard::from_bytes(bytes).map_err(|e| CatalogError::Serialization(e.to_string()))
}

/// Load one row from a primary table.
fn fetch<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<Option<T>, CatalogError> {
    match table.get(id).map_err(store)? {
        Some(guard) => decode(guard.value()).map(Some),
        None => Ok(None),
    }
}

/// Load a row an index entry points at. A missing row means a broken index.
fn fetch_indexed<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<T, CatalogError> {
    fetch(table, id)?.ok_or_else(|| store(format!("dangling index entry for row {}", id)))
}

// =============================================================================
// DATABASE
// =============================================================================

/// The catalog database handle.
///
/// `CatalogDb` is `Send + Sync`; share it behind an `Arc` and open one scope
/// per operation.
pub struct CatalogDb {
    db: Database,
}

impl std::fmt::Debug for CatalogDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogDb").finish_non_exhaustive()
    }
}

impl CatalogDb {
    /// Open or create a catalog database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let db = Database::create(path.as_ref()).map_err(store)?;
        Self::init(db)
    }

    /// Create a volatile catalog that lives only as long as the handle.
    pub fn in_memory() -> Result<Self, CatalogError> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .map_err(store)?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, CatalogError> {
        // Initialize tables if they don't exist
        let write_txn = db.begin_write().map_err(store)?;
        {
            let _ = write_txn.open_table(PROJECTS).map_err(store)?;
            let _ = write_txn.open_table(RELEASES).map_err(store)?;
            let _ = write_txn.open_table(BUILDS).map_err(store)?;
            let _ = write_txn.open_table(PROJECT_SLUGS).map_err(store)?;
            let _ = write_txn.open_table(RELEASE_VERSIONS).map_err(store)?;
            let _ = write_txn.open_table(BUILD_NUMBERS).map_err(store)?;
            let _ = write_txn.open_table(RELEASES_BY_CREATION).map_err(store)?;
            let _ = write_txn.open_table(RELEASES_BY_TIER).map_err(store)?;
            let _ = write_txn.open_table(RELEASES_BY_VERSION).map_err(store)?;
            let _ = write_txn.open_table(BUILDS_BY_TIME).map_err(store)?;
            let _ = write_txn.open_table(RECOMMENDED_BUILDS).map_err(store)?;
            let _ = write_txn.open_table(METADATA).map_err(store)?;
        }
        write_txn.commit().map_err(store)?;
        Ok(Self { db })
    }

    /// Begin a read scope over a consistent snapshot.
    pub fn read(&self) -> Result<ReadScope, CatalogError> {
        let txn = self.db.begin_read().map_err(store)?;
        Ok(ReadScope { txn })
    }

    /// Begin a write scope. Blocks while another writer is active.
    pub fn write(&self) -> Result<WriteScope, CatalogError> {
        let txn = self.db.begin_write().map_err(store)?;
        Ok(WriteScope { txn })
    }

    /// Compact the database file. Returns whether any space was reclaimed.
    ///
    /// Requires exclusive access; no scopes may be open.
    pub fn compact(&mut self) -> Result<bool, CatalogError> {
        self.db.compact().map_err(store)
    }
}

// =============================================================================
// READ CAPABILITY
// =============================================================================

/// Read access to the catalog inside a transaction.
///
/// Implemented by both scopes, so mutations can run their lookups against the
/// same transaction they write in.
pub trait CatalogRead {
    /// Open a table within this scope's transaction.
    fn table<K: Key + 'static, V: Value + 'static>(
        &self,
        definition: TableDefinition<'static, K, V>,
    ) -> Result<impl ReadableTable<K, V> + '_, CatalogError>;

    /// Every project, in creation order.
    fn projects(&self) -> Result<Vec<Project>, CatalogError> {
        let table = self.table(PROJECTS)?;
        let mut projects = Vec::new();
        for entry in table.iter().map_err(store)? {
            let (_, value) = entry.map_err(store)?;
            projects.push(decode(value.value())?);
        }
        Ok(projects)
    }

    /// Look up a project by its internal id.
    fn project(&self, id: ProjectId) -> Result<Option<Project>, CatalogError> {
        fetch(&self.table(PROJECTS)?, id.0)
    }

    /// Look up a project by slug.
    fn project_by_slug(&self, slug: &str) -> Result<Option<Project>, CatalogError> {
        let id = {
            let slugs = self.table(PROJECT_SLUGS)?;
            let found = slugs.get(slug).map_err(store)?.map(|guard| guard.value());
            found
        };
        match id {
            Some(id) => self.project(ProjectId(id)),
            None => Ok(None),
        }
    }

    /// Look up a release by version anywhere in the catalog.
    fn release_with_version(&self, version: &str) -> Result<Option<Release>, CatalogError> {
        let id = {
            let versions = self.table(RELEASE_VERSIONS)?;
            let found = versions
                .get(version)
                .map_err(store)?
                .map(|guard| guard.value());
            found
        };
        match id {
            Some(id) => fetch(&self.table(RELEASES)?, id),
            None => Ok(None),
        }
    }

    /// Look up a release of a given project by version.
    fn release_by_version(
        &self,
        project: ProjectId,
        version: &str,
    ) -> Result<Option<Release>, CatalogError> {
        Ok(self
            .release_with_version(version)?
            .filter(|release| release.project_id == project))
    }

    /// The `limit` most recently created releases of a project, newest first.
    fn recent_releases(
        &self,
        project: ProjectId,
        limit: usize,
    ) -> Result<Vec<Release>, CatalogError> {
        let index = self.table(RELEASES_BY_CREATION)?;
        let rows = self.table(RELEASES)?;

        let mut releases = Vec::new();
        for entry in index
            .range((project.0, i64::MIN, 0u64)..=(project.0, i64::MAX, u64::MAX))
            .map_err(store)?
            .rev()
            .take(limit)
        {
            let (key, _) = entry.map_err(store)?;
            let (_, _, release_id) = key.value();
            releases.push(fetch_indexed(&rows, release_id)?);
        }
        Ok(releases)
    }

    /// Releases of a project in one status, newest created first.
    ///
    /// `limit` of `None` returns the whole tier.
    fn releases_in_tier(
        &self,
        project: ProjectId,
        status: ReleaseStatus,
        limit: Option<usize>,
    ) -> Result<Vec<Release>, CatalogError> {
        let index = self.table(RELEASES_BY_TIER)?;
        let rows = self.table(RELEASES)?;
        let code = status.code();

        let mut releases = Vec::new();
        for entry in index
            .range((project.0, code, i64::MIN, 0u64)..=(project.0, code, i64::MAX, u64::MAX))
            .map_err(store)?
            .rev()
            .take(limit.unwrap_or(usize::MAX))
        {
            let (key, _) = entry.map_err(store)?;
            let (_, _, _, release_id) = key.value();
            releases.push(fetch_indexed(&rows, release_id)?);
        }
        Ok(releases)
    }

    /// The highest-versioned release of a project in one status.
    ///
    /// Among equal versions the most recently created wins.
    fn highest_in_tier(
        &self,
        project: ProjectId,
        status: ReleaseStatus,
    ) -> Result<Option<Release>, CatalogError> {
        let index = self.table(RELEASES_BY_VERSION)?;
        let code = status.code();
        let lowest: &[u8] = &[];

        let start = (project.0, code, lowest, i64::MIN, 0u64);
        let end = (project.0, code + 1, lowest, i64::MIN, 0u64);
        let last = index.range(start..end).map_err(store)?.next_back();
        match last {
            Some(entry) => {
                let (key, _) = entry.map_err(store)?;
                let (_, _, _, _, release_id) = key.value();
                fetch_indexed(&self.table(RELEASES)?, release_id).map(Some)
            }
            None => Ok(None),
        }
    }

    /// The `limit` builds of a release with the highest specific build ids, highest first.
    fn top_builds(&self, release: ReleaseId, limit: usize) -> Result<Vec<Build>, CatalogError> {
        let index = self.table(BUILD_NUMBERS)?;
        let rows = self.table(BUILDS)?;

        let mut builds = Vec::new();
        for entry in index
            .range((release.0, 0u64)..=(release.0, u64::MAX))
            .map_err(store)?
            .rev()
            .take(limit)
        {
            let (_, value) = entry.map_err(store)?;
            builds.push(fetch_indexed(&rows, value.value())?);
        }
        Ok(builds)
    }

    /// The `limit` most recently built builds of a release, newest first.
    fn latest_built(&self, release: ReleaseId, limit: usize) -> Result<Vec<Build>, CatalogError> {
        self.scan_build_times(BUILDS_BY_TIME, release, limit)
    }

    /// The most recently built build of a release flagged as recommended.
    fn latest_recommended(&self, release: ReleaseId) -> Result<Option<Build>, CatalogError> {
        Ok(self
            .scan_build_times(RECOMMENDED_BUILDS, release, 1)?
            .into_iter()
            .next())
    }

    /// Look up a build by its caller-facing id within a release.
    fn build(
        &self,
        release: ReleaseId,
        specific_build_id: u64,
    ) -> Result<Option<Build>, CatalogError> {
        let id = {
            let index = self.table(BUILD_NUMBERS)?;
            let found = index
                .get((release.0, specific_build_id))
                .map_err(store)?
                .map(|guard| guard.value());
            found
        };
        match id {
            Some(id) => fetch(&self.table(BUILDS)?, id),
            None => Ok(None),
        }
    }

    #[doc(hidden)]
    fn scan_build_times(
        &self,
        definition: TableDefinition<'static, (u64, i64, u64), ()>,
        release: ReleaseId,
        limit: usize,
    ) -> Result<Vec<Build>, CatalogError> {
        let index = self.table(definition)?;
        let rows = self.table(BUILDS)?;

        let mut builds = Vec::new();
        for entry in index
            .range((release.0, i64::MIN, 0u64)..=(release.0, i64::MAX, u64::MAX))
            .map_err(store)?
            .rev()
            .take(limit)
        {
            let (key, _) = entry.map_err(store)?;
            let (_, _, build_id) = key.value();
            builds.push(fetch_indexed(&rows, build_id)?);
        }
        Ok(builds)
    }
}

// =============================================================================
// READ SCOPE
// =============================================================================

/// A read-only transaction over a consistent snapshot of the catalog.
pub struct ReadScope {
    txn: ReadTransaction,
}

impl CatalogRead for ReadScope {
    fn table<K: Key + 'static, V: Value + 'static>(
        &self,
        definition: TableDefinition<'static, K, V>,
    ) -> Result<impl ReadableTable<K, V> + '_, CatalogError> {
        self.txn.open_table(definition).map_err(store)
    }
}

// =============================================================================
// WRITE SCOPE
// =============================================================================

/// A write transaction. Dropping it without `commit` discards every change.
pub struct WriteScope {
    txn: WriteTransaction,
}

impl CatalogRead for WriteScope {
    fn table<K: Key + 'static, V: Value + 'static>(
        &self,
        definition: TableDefinition<'static, K, V>,
    ) -> Result<impl ReadableTable<K, V> + '_, CatalogError> {
        self.txn.open_table(definition).map_err(store)
    }
}

impl WriteScope {
    /// Commit every change made in this scope.
    pub fn commit(self) -> Result<(), CatalogError> {
        self.txn.commit().map_err(store)
    }

    fn next_id(&self, key: &str) -> Result<u64, CatalogError> {
        let mut meta = self.txn.open_table(METADATA).map_err(store)?;
        let next = meta
            .get(key)
            .map_err(store)?
            .map(|guard| guard.value())
            .unwrap_or(1);
        meta.insert(key, next.saturating_add(1)).map_err(store)?;
        Ok(next)
    }

    fn put<T: Serialize>(
        &self,
        definition: TableDefinition<'static, u64, &'static [u8]>,
        id: u64,
        record: &T,
    ) -> Result<(), CatalogError> {
        let bytes = encode(record)?;
        let mut table = self.txn.open_table(definition).map_err(store)?;
        table.insert(id, bytes.as_slice()).map_err(store)?;
        Ok(())
    }

    /// Insert a project. Fails with `AlreadyExists` if the slug is taken.
    pub fn insert_project(&self, new: NewProject) -> Result<Project, CatalogError> {
        {
            let slugs = self.txn.open_table(PROJECT_SLUGS).map_err(store)?;
            if slugs.get(new.slug.as_str()).map_err(store)?.is_some() {
                tracing::warn!(slug = %new.slug, "rejected duplicate project slug");
                return Err(CatalogError::AlreadyExists(format!("project {}", new.slug)));
            }
        }

        let id = self.next_id(NEXT_PROJECT_ID)?;
        let project = Project {
            id: ProjectId(id),
            name: new.name,
            slug: new.slug,
        };

        self.txn
            .open_table(PROJECT_SLUGS)
            .map_err(store)?
            .insert(project.slug.as_str(), id)
            .map_err(store)?;
        self.put(PROJECTS, id, &project)?;
        Ok(project)
    }

    /// Insert a release. Fails with `InvalidVersion` if the version does not
    /// parse and with `AlreadyExists` if it is registered anywhere in the
    /// catalog.
    pub fn insert_release(&self, new: NewRelease) -> Result<Release, CatalogError> {
        let version_key = Version::parse(&new.version)?.sort_key();
        if self.project(new.project_id)?.is_none() {
            return Err(CatalogError::NotFound(Missing::Project(format!(
                "#{}",
                new.project_id.0
            ))));
        }
        {
            let versions = self.txn.open_table(RELEASE_VERSIONS).map_err(store)?;
            if versions.get(new.version.as_str()).map_err(store)?.is_some() {
                tracing::warn!(version = %new.version, "rejected duplicate release version");
                return Err(CatalogError::AlreadyExists(format!(
                    "release {}",
                    new.version
                )));
            }
        }

        let id = self.next_id(NEXT_RELEASE_ID)?;
        let release = Release {
            id: ReleaseId(id),
            project_id: new.project_id,
            version: new.version,
            status: new.status,
            created_at: new.created_at.unwrap_or_else(Utc::now),
            released_at: new.released_at,
        };
        let project_id = release.project_id.0;
        let created = release.created_at.timestamp_micros();

        self.txn
            .open_table(RELEASE_VERSIONS)
            .map_err(store)?
            .insert(release.version.as_str(), id)
            .map_err(store)?;
        self.put(RELEASES, id, &release)?;
        self.txn
            .open_table(RELEASES_BY_CREATION)
            .map_err(store)?
            .insert((project_id, created, id), ())
            .map_err(store)?;
        self.txn
            .open_table(RELEASES_BY_TIER)
            .map_err(store)?
            .insert((project_id, release.status.code(), created, id), ())
            .map_err(store)?;
        self.txn
            .open_table(RELEASES_BY_VERSION)
            .map_err(store)?
            .insert(
                (project_id, release.status.code(), version_key.as_slice(), created, id),
                (),
            )
            .map_err(store)?;
        Ok(release)
    }

    /// Move a release to another status, keeping the tier indexes in step.
    pub fn update_release_status(
        &self,
        release: &Release,
        status: ReleaseStatus,
    ) -> Result<Release, CatalogError> {
        let version_key = Version::parse(&release.version)?.sort_key();
        let mut updated = release.clone();
        updated.status = status;
        self.put(RELEASES, release.id.0, &updated)?;

        let project_id = release.project_id.0;
        let created = release.created_at.timestamp_micros();
        let mut tiers = self.txn.open_table(RELEASES_BY_TIER).map_err(store)?;
        tiers
            .remove((project_id, release.status.code(), created, release.id.0))
            .map_err(store)?;
        tiers
            .insert((project_id, status.code(), created, release.id.0), ())
            .map_err(store)?;

        let key = version_key.as_slice();
        let mut versions = self.txn.open_table(RELEASES_BY_VERSION).map_err(store)?;
        versions
            .remove((project_id, release.status.code(), key, created, release.id.0))
            .map_err(store)?;
        versions
            .insert((project_id, status.code(), key, created, release.id.0), ())
            .map_err(store)?;
        Ok(updated)
    }

    /// Insert a build. Fails with `AlreadyExists` if the release already has a
    /// build with the same specific build id.
    pub fn insert_build(&self, new: NewBuild) -> Result<Build, CatalogError> {
        if fetch::<Release>(&self.table(RELEASES)?, new.release_id.0)?.is_none() {
            return Err(CatalogError::NotFound(Missing::Release(format!(
                "#{}",
                new.release_id.0
            ))));
        }
        let pair = (new.release_id.0, new.specific_build_id);
        {
            let numbers = self.txn.open_table(BUILD_NUMBERS).map_err(store)?;
            if numbers.get(pair).map_err(store)?.is_some() {
                tracing::warn!(
                    release = new.release_id.0,
                    build = new.specific_build_id,
                    "rejected duplicate build"
                );
                return Err(CatalogError::AlreadyExists(format!(
                    "build {}",
                    new.specific_build_id
                )));
            }
        }

        let id = self.next_id(NEXT_BUILD_ID)?;
        let build = Build {
            id: BuildId(id),
            release_id: new.release_id,
            specific_build_id: new.specific_build_id,
            recommended: new.recommended,
            url: new.url,
            built_at: new.built_at.unwrap_or_else(Utc::now),
        };
        let time_key = (build.release_id.0, build.built_at.timestamp_micros(), id);

        self.txn
            .open_table(BUILD_NUMBERS)
            .map_err(store)?
            .insert(pair, id)
            .map_err(store)?;
        self.put(BUILDS, id, &build)?;
        self.txn
            .open_table(BUILDS_BY_TIME)
            .map_err(store)?
            .insert(time_key, ())
            .map_err(store)?;
        if build.recommended {
            self.txn
                .open_table(RECOMMENDED_BUILDS)
                .map_err(store)?
                .insert(time_key, ())
                .map_err(store)?;
        }
        Ok(build)
    }

    /// Flag or unflag a build as recommended.
    ///
    /// This is a maintainer capability that lives beside the mutation engine,
    /// not inside it.
    pub fn set_recommended(&self, build: &Build, recommended: bool) -> Result<Build, CatalogError> {
        let mut updated = build.clone();
        updated.recommended = recommended;
        self.put(BUILDS, build.id.0, &updated)?;

        let time_key = (
            build.release_id.0,
            build.built_at.timestamp_micros(),
            build.id.0,
        );
        let mut flagged = self.txn.open_table(RECOMMENDED_BUILDS).map_err(store)?;
        if recommended {
            flagged.insert(time_key, ()).map_err(store)?;
        } else {
            flagged.remove(time_key).map_err(store)?;
        }
        Ok(updated)
    }
}

// =============================================================================
// TESTS
// =============================================================================
