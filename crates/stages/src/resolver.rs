use std::sync::Arc;

use chrono::Utc;
use pipeline::{
    ArtifactCache, ArtifactStrategy, CsrfPlacement, ResolveError, ResolveRunId, ResolveStage,
    ResolvedArtifact, ShareToken,
};
use tracing::{info, instrument, warn};

use crate::inflight::InflightLocks;
use crate::StageRunner;

/// Deployment policy of a [`Resolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverOptions {
    /// Whether artifacts are URLs or downloaded bytes.
    pub strategy: ArtifactStrategy,
    /// Where the CSRF token travels on compile requests.
    pub csrf_placement: CsrfPlacement,
    /// Whether to run the optional metadata stage.
    pub load_metadata: bool,
}

/// The pipeline orchestrator and sole entry point of the core.
///
/// Runs the stages strictly in order for one token, fails fast on the first
/// error, and caches the artifact only after the final stage succeeds.
/// Concurrent resolves of the same token are coalesced: the second waits for
/// the first and is served from the cache.
pub struct Resolver {
    runner: StageRunner,
    cache: Arc<ArtifactCache>,
    inflight: InflightLocks,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(runner: StageRunner, cache: Arc<ArtifactCache>, options: ResolverOptions) -> Self {
        Self {
            runner,
            cache,
            inflight: InflightLocks::default(),
            options,
        }
    }

    pub fn cache(&self) -> &Arc<ArtifactCache> {
        &self.cache
    }

    /// Number of tokens with a pipeline currently running or queued.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Resolves the compiled PDF of the project shared under `token`.
    #[instrument(skip_all, fields(%token, run_id = %ResolveRunId::new_random()))]
    pub async fn resolve(&self, token: &ShareToken) -> Result<ResolvedArtifact, ResolveError> {
        if let Some(hit) = self.cache.get(token) {
            info!(stage = %ResolveStage::CacheHit, "serving cached artifact");
            return Ok(hit);
        }

        let _inflight = self.inflight.acquire(token).await;
        if let Some(hit) = self.cache.get(token) {
            info!(stage = %ResolveStage::CacheHit, "served by a concurrent resolve");
            return Ok(hit);
        }

        let resolved = self
            .run_pipeline(token)
            .await
            .inspect_err(|e| warn!(kind = e.kind(), error = %e, "resolve failed"))?;

        self.cache.insert(token.clone(), resolved.clone());
        info!(stage = %ResolveStage::Done, ttl_secs = self.cache.ttl().as_secs(), "artifact cached");
        Ok(resolved)
    }

    async fn run_pipeline(&self, token: &ShareToken) -> Result<ResolvedArtifact, ResolveError> {
        info!(stage = %ResolveStage::ExtractSession, "stage started");
        let session = self.runner.extract_session(token).await?;

        info!(stage = %ResolveStage::GrantAccess, "stage started");
        let (resource, mut session) = self.runner.grant_access(token, session).await?;

        let mut title = None;
        if self.options.load_metadata {
            info!(stage = %ResolveStage::LoadMetadata, "stage started");
            let (metadata, refreshed) = self.runner.load_metadata(&resource, session).await?;
            session = refreshed;
            title = Some(metadata.title);
        }

        info!(stage = %ResolveStage::Compile, "stage started");
        let (compiled, session) = self
            .runner
            .compile(&resource, session, self.options.csrf_placement)
            .await?;

        info!(stage = %ResolveStage::ResolveArtifact, "stage started");
        let artifact = self
            .runner
            .resolve_artifact(&compiled, &session, self.options.strategy)
            .await?;

        Ok(ResolvedArtifact {
            artifact,
            title,
            resolved_at: Utc::now(),
        })
    }
}
