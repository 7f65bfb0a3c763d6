//! Incremental build sync for a single repository.
//!
//! The CI server lists builds newest first. Given the newest build number
//! already stored (the cursor), [`sync_repo`] decides which pages to walk,
//! fetches every listed build's detail, and flattens finished builds into
//! points.
//!
//! ```text
//! page 1 ──┬─ empty ─────────────────────────────► Empty
//!          ├─ newest == cursor ──────────────────► UpToDate
//!          ├─ shorter than page_size ────────────► ShortFirstPage
//!          └─ full ─► page 2, 3, … until empty ──► Exhausted
//! ```
//!
//! Only page one is filtered against the cursor; later pages are taken whole.

use super::progress::{ExportProgress, ProgressCallback, emit};
use super::types::{RepoSync, ShortPagePolicy, SyncOptions, SyncStop};
use crate::ci::{BuildSummary, CiClient, CiError, Repo};
use crate::transform::{TransformContext, build_points};

/// Sync one repository's builds newer than `cursor`.
///
/// A cursor of 0 means nothing is stored yet. Any CI error aborts the
/// repository and is returned unchanged.
#[tracing::instrument(skip_all, fields(slug = %repo.slug, cursor = cursor))]
pub async fn sync_repo<C: CiClient + ?Sized>(
    client: &C,
    repo: &Repo,
    cursor: i64,
    options: &SyncOptions,
    on_progress: Option<&ProgressCallback>,
) -> Result<RepoSync, CiError> {
    let ctx = TransformContext {
        address: client.base_url(),
        slug: &repo.slug,
    };
    let page_size = options.page_size.max(1);
    let mut result = RepoSync::new();

    let first = fetch_page(client, repo, 1, page_size, &mut result, on_progress).await?;

    let Some(newest) = first.first() else {
        result.stop = SyncStop::Empty;
        return Ok(finish(repo, result, on_progress));
    };
    if newest.number == cursor {
        result.stop = SyncStop::UpToDate;
        return Ok(finish(repo, result, on_progress));
    }

    for summary in first.iter().filter(|b| b.number > cursor) {
        collect_build(client, repo, &ctx, summary, &mut result, on_progress).await?;
    }

    if first.len() < page_size as usize {
        result.stop = SyncStop::ShortFirstPage;
        if options.short_page == ShortPagePolicy::Discard && !result.points.is_empty() {
            tracing::debug!(
                discarded = result.points.len(),
                "first page shorter than page size, discarding points"
            );
            result.points.clear();
        }
        return Ok(finish(repo, result, on_progress));
    }

    let mut page = 2;
    loop {
        let builds = fetch_page(client, repo, page, page_size, &mut result, on_progress).await?;
        if builds.is_empty() {
            result.stop = SyncStop::Exhausted;
            break;
        }
        for summary in &builds {
            collect_build(client, repo, &ctx, summary, &mut result, on_progress).await?;
        }
        page += 1;
    }

    Ok(finish(repo, result, on_progress))
}

async fn fetch_page<C: CiClient + ?Sized>(
    client: &C,
    repo: &Repo,
    page: u32,
    page_size: u32,
    result: &mut RepoSync,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<BuildSummary>, CiError> {
    let builds = client
        .list_builds(&repo.namespace, &repo.name, page, page_size)
        .await?;
    result.pages += 1;
    emit(
        on_progress,
        ExportProgress::FetchedPage {
            slug: repo.slug.clone(),
            page,
            count: builds.len(),
        },
    );
    Ok(builds)
}

/// Fetch one build's detail and append its points. Running builds are
/// fetched but yield nothing.
async fn collect_build<C: CiClient + ?Sized>(
    client: &C,
    repo: &Repo,
    ctx: &TransformContext<'_>,
    summary: &BuildSummary,
    result: &mut RepoSync,
    on_progress: Option<&ProgressCallback>,
) -> Result<(), CiError> {
    let build = client
        .get_build(&repo.namespace, &repo.name, summary.number)
        .await?;
    result.builds += 1;

    if build.status.is_running() {
        result.skipped_running += 1;
        emit(
            on_progress,
            ExportProgress::SkippedRunningBuild {
                slug: repo.slug.clone(),
                number: build.number,
            },
        );
        return Ok(());
    }

    result.points.extend(build_points(ctx, &build));
    Ok(())
}

fn finish(repo: &Repo, result: RepoSync, on_progress: Option<&ProgressCallback>) -> RepoSync {
    tracing::debug!(
        pages = result.pages,
        builds = result.builds,
        points = result.points.len(),
        stop = %result.stop,
        "repository synced"
    );
    emit(
        on_progress,
        ExportProgress::RepoSynced {
            slug: repo.slug.clone(),
            builds: result.builds,
            points: result.points.len(),
            stop: result.stop,
        },
    );
    result
}
