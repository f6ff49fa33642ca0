use shared::track::TrackMetadata;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aggregator::{AggregationState, Aggregator};
use crate::links::build_links;
use crate::metadata::resolve_metadata;
use crate::player::ResolveError;
use crate::prompts::build_prompts;
use crate::services::Services;

/// Owns the shared state and runs aggregation cycles against it.
///
/// Starting a cycle cancels the one before it, and generation numbers in the
/// state discard anything the cancelled calls still manage to write.
pub struct Session {
    services: Services,
    state: Arc<AggregationState>,
    current: Mutex<CancellationToken>,
}

impl Session {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            state: Arc::new(AggregationState::new()),
            current: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn state(&self) -> &Arc<AggregationState> {
        &self.state
    }

    pub async fn resolve(&self) -> Result<TrackMetadata, ResolveError> {
        let source = self.services.source(None).ok_or_else(|| {
            ResolveError::PlayerUnavailable("no track source configured".to_string())
        })?;
        resolve_metadata(source.as_ref()).await
    }

    /// Cancels the running cycle and opens the next generation. The token guard
    /// is held across `begin_cycle`, so the newest token always belongs to the
    /// newest generation.
    fn begin(&self, total_calls: usize) -> (CancellationToken, u64) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.cancel();
        *current = CancellationToken::new();
        let generation = self.state.begin_cycle(total_calls);
        (current.clone(), generation)
    }

    /// One full cycle for already-resolved metadata: prompts, parallel calls,
    /// then links. Returns the cycle's generation.
    pub async fn run_cycle(&self, metadata: &TrackMetadata) -> u64 {
        let prompts = build_prompts(metadata);
        let (cancel, generation) = self.begin(prompts.len());
        info!("Cycle {} started for {}", generation, metadata);

        // `ServicesBuilder::build` refuses a registry without a completion backend.
        if let Some(backend) = self.services.completion(None) {
            Aggregator::new(Arc::clone(backend))
                .run(&self.state, generation, prompts, &cancel)
                .await;
        }

        if cancel.is_cancelled() {
            info!("Cycle {} superseded before links", generation);
            return generation;
        }

        let links = build_links(metadata);
        if self.state.append_links(generation, &links) {
            info!("Cycle {} finished", generation);
        }
        generation
    }

    /// Resolves the track again and starts a new cycle. When resolution
    /// fails, the current document stays and a warning is attached to it.
    pub async fn refresh_cycle(&self) -> Result<u64, ResolveError> {
        match self.resolve().await {
            Ok(metadata) => Ok(self.run_cycle(&metadata).await),
            Err(e) => {
                warn!("Refresh failed: {}", e);
                self.state.set_warning(format!("Refresh failed: {e}"));
                Err(e)
            }
        }
    }

    pub fn start(self: &Arc<Self>, metadata: TrackMetadata) -> JoinHandle<u64> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.run_cycle(&metadata).await })
    }

    pub fn refresh(self: &Arc<Self>) -> JoinHandle<Result<u64, ResolveError>> {
        let session = Arc::clone(self);
        tokio::spawn(async move { session.refresh_cycle().await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{ALBUM_INFO_TITLE, ALBUM_REVIEW_TITLE, SONG_INFO_TITLE};
    use crate::services::ServicesBuilder;
    use crate::testing::{raw_track, FakeBackend, FakeSource};
    use shared::links::LINKS_HEADING;
    use std::time::Duration;

    fn session(source: FakeSource, backend: FakeBackend) -> Arc<Session> {
        let services = ServicesBuilder::new()
            .add_source(source)
            .add_completion(backend)
            .build()
            .unwrap();
        Arc::new(Session::new(services))
    }

    fn headers(document: &str) -> Vec<&str> {
        document.lines().filter(|l| l.starts_with("## ")).collect()
    }

    #[tokio::test]
    async fn cycle_builds_three_sections_then_links() {
        let session = session(FakeSource::default(), FakeBackend::echo("answer"));
        let meta = TrackMetadata::new("AC/DC", "back in black", "Hells Bells");

        let generation = session.start(meta).await.unwrap();

        let snap = session.state().snapshot();
        assert_eq!(snap.generation, generation);
        assert_eq!(snap.completed_fraction, 1.0);
        assert!(snap.finished);
        let mut found = headers(&snap.document);
        assert_eq!(found.pop(), Some(LINKS_HEADING));
        found.sort();
        let mut expected = vec![ALBUM_INFO_TITLE, ALBUM_REVIEW_TITLE, SONG_INFO_TITLE];
        expected.sort();
        assert_eq!(found, expected);
        assert!(snap
            .document
            .contains("https://www.youtube.com/results?search_query=AC+DC+Hells+Bells"));
    }

    #[tokio::test]
    async fn refresh_replaces_document_for_new_track() {
        let source = FakeSource::new(vec![
            raw_track("Radiohead", "Airbag", "OK Computer"),
            raw_track("Portishead", "Roads", "Dummy"),
        ]);
        let session = session(source, FakeBackend::echo("answer"));

        let first = session.refresh().await.unwrap().unwrap();
        assert!(session.state().snapshot().document.contains("Radiohead"));

        let second = session.refresh().await.unwrap().unwrap();
        assert!(second > first);
        let snap = session.state().snapshot();
        assert!(snap.document.contains("Portishead"));
        assert!(!snap.document.contains("Radiohead"));
        assert_eq!(headers(&snap.document).len(), 4);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_document() {
        let source = FakeSource::new(vec![raw_track("Radiohead", "Airbag", "OK Computer")]);
        let session = session(source, FakeBackend::echo("answer"));
        session.refresh().await.unwrap().unwrap();
        let before = session.state().snapshot();

        let result = session.refresh().await.unwrap();
        assert!(matches!(result, Err(ResolveError::NothingPlaying)));

        let after = session.state().snapshot();
        assert_eq!(after.document, before.document);
        assert_eq!(after.generation, before.generation);
        assert!(after.finished);
        assert_eq!(
            after.warning.as_deref(),
            Some("Refresh failed: nothing is playing right now")
        );
    }

    #[tokio::test]
    async fn refresh_supersedes_cycle_in_flight() {
        let prompts = build_prompts(&TrackMetadata::new("Slow", "slow album", "Slow Song"));
        let mut backend = FakeBackend::echo("answer");
        for spec in &prompts {
            backend = backend.delay(&spec.prompt, Duration::from_secs(30));
        }
        let source = FakeSource::new(vec![
            raw_track("Slow", "Slow Song", "Slow Album"),
            raw_track("Fast", "Fast Song", "Fast Album"),
        ]);
        let session = session(source, backend);

        let slow = session.refresh();
        // Let the slow cycle get past resolution and dispatch its calls.
        while session.state().generation() == 0 {
            tokio::task::yield_now().await;
        }
        let fast = session.refresh().await.unwrap().unwrap();
        let slow = slow.await.unwrap().unwrap();
        assert!(fast > slow);

        let snap = session.state().snapshot();
        assert_eq!(snap.generation, fast);
        assert!(snap.finished);
        assert!(snap.document.contains("Fast"));
        assert!(!snap.document.contains("Slow"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_cycles_always_leave_one_finished() {
        let session = session(FakeSource::default(), FakeBackend::echo("answer"));

        for round in 0..2_000 {
            let a = session.start(TrackMetadata::new("A", "a", "A song"));
            let b = session.start(TrackMetadata::new("B", "b", "B song"));
            let (a, b) = (a.await.unwrap(), b.await.unwrap());

            let snap = session.state().snapshot();
            assert!(snap.finished, "round {round} never finished");
            assert_eq!(snap.generation, a.max(b));
            assert_eq!(snap.completed_fraction, 1.0);
            assert_eq!(headers(&snap.document).len(), 4);
        }
    }

    #[tokio::test]
    async fn refresh_resets_progress_before_first_answer() {
        let prompts = build_prompts(&TrackMetadata::new("B", "b", "B song"));
        let mut backend = FakeBackend::echo("answer");
        for spec in &prompts {
            backend = backend.delay(&spec.prompt, Duration::from_millis(200));
        }
        let source = FakeSource::new(vec![raw_track("A", "A song", "A"), raw_track("B", "B song", "B")]);
        let session = session(source, backend);

        let first = session.refresh().await.unwrap().unwrap();
        assert_eq!(session.state().completed_fraction(), 1.0);

        let pending = session.refresh();
        while session.state().generation() == first {
            tokio::task::yield_now().await;
        }
        let snap = session.state().snapshot();
        assert_eq!(snap.completed_fraction, 0.0);
        assert!(snap.document.is_empty());

        pending.await.unwrap().unwrap();
        assert_eq!(session.state().completed_fraction(), 1.0);
    }
}
