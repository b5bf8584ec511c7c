use crate::catalog::Catalog;
use crate::error::{ReadinessError, Result};
use crate::repository::SessionRepository;
use crate::score::{ReadinessBands, ScoreSummary};
use crate::session::{AssessmentSession, NextQuestion, SubmitOutcome};
use crate::types::{validate_score, BusinessProfile, ReadinessLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// One session: `submit` orders writers, `record` is what readers see.
struct Slot {
    submit: Mutex<()>,
    record: RwLock<AssessmentSession>,
}

impl Slot {
    fn new(session: AssessmentSession) -> Arc<Self> {
        Arc::new(Self {
            submit: Mutex::new(()),
            record: RwLock::new(session),
        })
    }

    fn snapshot(&self) -> AssessmentSession {
        read(&self.record).clone()
    }
}

type Entry = Arc<Slot>;

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub assessment_id: String,
    pub business_info: BusinessProfile,
    pub cursor: usize,
    pub total_questions: usize,
    pub completion_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_section_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_section_id: Option<String>,
    /// Answered question ids in catalog order.
    pub answered: Vec<String>,
    pub complete: bool,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionStatus {
    fn of(session: &AssessmentSession, catalog: &Catalog) -> Self {
        let current_section_index = session.current_section_index(catalog);
        Self {
            assessment_id: session.id().to_string(),
            business_info: session.profile().clone(),
            cursor: session.cursor(),
            total_questions: catalog.len(),
            completion_percentage: session.completion_percentage(catalog),
            current_section_index,
            current_section_id: current_section_index.map(|i| catalog.sections()[i].id.clone()),
            answered: catalog.questions()[..session.cursor()]
                .iter()
                .map(|q| q.id.clone())
                .collect(),
            complete: session.is_complete(),
            started_at: session.started_at(),
            updated_at: session.updated_at(),
            completed_at: session.completed_at(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Keyed session registry.
///
/// The map lock only guards lookup and insertion. Writers to one session
/// take its `submit` mutex, apply the change to a copy and persist the copy;
/// the record lock is taken for writing only to swap the committed copy in.
/// Submissions to one session are serialized, different sessions proceed
/// independently, and readers never wait on repository I/O. Readers see the
/// record either before or after a submission, never in between.
pub struct SessionStore {
    catalog: Arc<Catalog>,
    bands: ReadinessBands,
    sessions: RwLock<HashMap<String, Entry>>,
    repository: Option<Arc<dyn SessionRepository>>,
}

impl SessionStore {
    /// In-memory store with bands derived from the catalog.
    pub fn new(catalog: Arc<Catalog>) -> Result<Self> {
        let bands = ReadinessBands::for_catalog(&catalog)?;
        Ok(Self::with_bands(catalog, bands))
    }

    pub fn with_bands(catalog: Arc<Catalog>, bands: ReadinessBands) -> Self {
        Self {
            catalog,
            bands,
            sessions: RwLock::new(HashMap::new()),
            repository: None,
        }
    }

    /// Persist every mutation through `repository` and fall back to it for
    /// ids not yet in memory.
    pub fn with_repository(mut self, repository: Arc<dyn SessionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn bands(&self) -> &ReadinessBands {
        &self.bands
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub fn start(&self, profile: BusinessProfile) -> Result<AssessmentSession> {
        let session = AssessmentSession::start(profile)?;
        if let Some(repo) = &self.repository {
            repo.save(&session)?;
        }
        write(&self.sessions).insert(session.id().to_string(), Slot::new(session.clone()));
        tracing::info!(
            id = session.id(),
            business = %session.profile().name,
            "assessment started"
        );
        Ok(session)
    }

    pub fn next_question(&self, id: &str) -> Result<NextQuestion> {
        let entry = self.entry(id)?;
        let next = read(&entry.record).next_question(&self.catalog);
        if next.is_complete() && !read(&entry.record).is_complete() {
            // Records written before completion was tracked may lack the flag.
            let _turn = lock(&entry.submit);
            let mut session = entry.snapshot();
            if session.mark_complete_if_exhausted(&self.catalog) {
                self.persist(&session)?;
                *write(&entry.record) = session;
            }
        }
        Ok(next)
    }

    pub fn submit_answer(&self, id: &str, question_id: &str, score: i64) -> Result<SubmitOutcome> {
        validate_score(score)?;
        let entry = self.entry(id)?;
        let _turn = lock(&entry.submit);
        let mut session = entry.snapshot();

        let outcome = match session.submit_answer(&self.catalog, question_id, score) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(id, question_id, error = %e, "answer rejected");
                return Err(e);
            }
        };
        if let Err(e) = self.persist(&session) {
            tracing::warn!(id, question_id, error = %e, "answer not persisted");
            if matches!(e, ReadinessError::Conflict(_)) {
                self.refresh(&entry, id);
            }
            return Err(e);
        }
        let total = session.total_score();
        *write(&entry.record) = session;

        tracing::debug!(id, question_id, score, cursor = outcome.cursor, "answer accepted");
        if outcome.complete {
            tracing::info!(id, total, "assessment complete");
        }
        Ok(outcome)
    }

    pub fn readiness_level(&self, id: &str) -> Result<ReadinessLevel> {
        let entry = self.entry(id)?;
        let session = read(&entry.record);
        session.readiness_level(&self.bands)
    }

    pub fn summary(&self, id: &str) -> Result<ScoreSummary> {
        let entry = self.entry(id)?;
        let session = read(&entry.record);
        ScoreSummary::compute(&session, &self.catalog, &self.bands)
    }

    pub fn status(&self, id: &str) -> Result<SessionStatus> {
        let entry = self.entry(id)?;
        let session = read(&entry.record);
        Ok(SessionStatus::of(&session, &self.catalog))
    }

    /// Snapshot of one record.
    pub fn get(&self, id: &str) -> Result<AssessmentSession> {
        Ok(self.entry(id)?.snapshot())
    }

    /// Snapshots of every in-memory record, oldest first.
    pub fn list(&self) -> Vec<AssessmentSession> {
        let entries: Vec<Entry> = read(&self.sessions).values().cloned().collect();
        let mut sessions: Vec<AssessmentSession> =
            entries.iter().map(|e| e.snapshot()).collect();
        sessions.sort_by(|a, b| {
            a.started_at()
                .cmp(&b.started_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        sessions
    }

    pub fn len(&self) -> usize {
        read(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every stored record the catalog accepts. Records that do not
    /// match the catalog are skipped with a warning. Returns how many were
    /// added.
    pub fn hydrate(&self) -> Result<usize> {
        let Some(repo) = &self.repository else {
            return Ok(0);
        };
        let mut added = 0;
        let stored = repo.list()?;
        let mut map = write(&self.sessions);
        for session in stored {
            if let Err(e) = session.check_against(&self.catalog) {
                tracing::warn!(id = session.id(), error = %e, "skipping stored session");
                continue;
            }
            if map.contains_key(session.id()) {
                continue;
            }
            map.insert(session.id().to_string(), Slot::new(session));
            added += 1;
        }
        tracing::info!(added, total = map.len(), "sessions hydrated");
        Ok(added)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn entry(&self, id: &str) -> Result<Entry> {
        if let Some(entry) = read(&self.sessions).get(id) {
            return Ok(Arc::clone(entry));
        }
        let Some(repo) = &self.repository else {
            return Err(ReadinessError::SessionNotFound(id.to_string()));
        };
        let session = repo.load(id)?;
        session.check_against(&self.catalog)?;
        // Another caller may have loaded the same id meanwhile; keep theirs.
        let mut map = write(&self.sessions);
        let entry = map
            .entry(id.to_string())
            .or_insert_with(|| Slot::new(session));
        Ok(Arc::clone(entry))
    }

    /// Replace a stale in-memory record with the stored one after another
    /// writer won a save. Called with the slot's `submit` mutex held.
    fn refresh(&self, entry: &Slot, id: &str) {
        let Some(repo) = &self.repository else {
            return;
        };
        let latest = repo
            .load(id)
            .and_then(|s| s.check_against(&self.catalog).map(|()| s));
        match latest {
            Ok(session) => *write(&entry.record) = session,
            Err(e) => tracing::warn!(id, error = %e, "could not reload session"),
        }
    }

    fn persist(&self, session: &AssessmentSession) -> Result<()> {
        match &self.repository {
            Some(repo) => repo.save(session),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::two_by_one;
    use crate::repository::JsonFileRepository;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn profile() -> BusinessProfile {
        BusinessProfile::new("Acme", "Retail", "11-50", "Nairobi")
    }

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(two_by_one())).unwrap()
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let s = store();
        let id = "00000000-0000-4000-8000-000000000000";
        assert!(matches!(s.next_question(id), Err(ReadinessError::SessionNotFound(_))));
        assert!(matches!(s.submit_answer(id, "Q1", 3), Err(ReadinessError::SessionNotFound(_))));
        assert!(matches!(s.readiness_level(id), Err(ReadinessError::SessionNotFound(_))));
        assert!(matches!(s.status(id), Err(ReadinessError::SessionNotFound(_))));
    }

    #[test]
    fn bad_score_wins_over_unknown_id() {
        let s = store();
        assert!(matches!(
            s.submit_answer("nope", "Q1", 9),
            Err(ReadinessError::Validation(_))
        ));
    }

    #[test]
    fn full_walkthrough() {
        let s = store();
        let session = s.start(profile()).unwrap();
        let id = session.id();

        assert!(matches!(s.readiness_level(id), Err(ReadinessError::Conflict(_))));
        s.submit_answer(id, "Q1", 4).unwrap();
        let status = s.status(id).unwrap();
        assert_eq!(status.cursor, 1);
        assert_eq!(status.current_section_id.as_deref(), Some("B"));
        assert_eq!(status.answered, vec!["Q1".to_string()]);

        let done = s.submit_answer(id, "Q2", 5).unwrap();
        assert!(done.complete);
        assert!(s.next_question(id).unwrap().is_complete());
        assert_eq!(s.readiness_level(id).unwrap(), ReadinessLevel::AiAdvanced);

        let summary = s.summary(id).unwrap();
        assert_eq!(summary.total, 9);
        assert!(summary.readiness.is_some());
        assert!(s.status(id).unwrap().current_section_index.is_none());
    }

    #[test]
    fn rejected_submission_leaves_state_unchanged() {
        let s = store();
        let id = s.start(profile()).unwrap().id().to_string();
        let before = s.get(&id).unwrap();
        assert!(matches!(s.submit_answer(&id, "Q2", 3), Err(ReadinessError::Conflict(_))));
        assert!(matches!(s.submit_answer(&id, "Q1", 0), Err(ReadinessError::Validation(_))));
        assert_eq!(s.get(&id).unwrap(), before);
    }

    #[test]
    fn concurrent_same_question_accepts_exactly_one() {
        let s = Arc::new(SessionStore::new(Arc::new(Catalog::builtin().unwrap())).unwrap());
        let id = s.start(profile()).unwrap().id().to_string();
        let first = s.catalog().questions()[0].id.clone();

        let results: Vec<Result<SubmitOutcome>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let s = Arc::clone(&s);
                    let id = id.clone();
                    let first = first.clone();
                    scope.spawn(move || s.submit_answer(&id, &first, (i % 5) + 1))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(ReadinessError::Conflict(_))))
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(s.get(&id).unwrap().cursor(), 1);
    }

    #[test]
    fn different_sessions_are_independent() {
        let s = Arc::new(store());
        let ids: Vec<String> = (0..8)
            .map(|_| s.start(profile()).unwrap().id().to_string())
            .collect();

        std::thread::scope(|scope| {
            for id in &ids {
                let s = Arc::clone(&s);
                scope.spawn(move || {
                    s.submit_answer(id, "Q1", 1).unwrap();
                    s.submit_answer(id, "Q2", 1).unwrap();
                });
            }
        });

        for id in &ids {
            assert_eq!(s.readiness_level(id).unwrap(), ReadinessLevel::NotReady);
        }
        assert_eq!(s.len(), 8);
    }

    #[test]
    fn list_is_oldest_first() {
        let s = store();
        let a = s.start(profile()).unwrap();
        let b = s.start(profile()).unwrap();
        let listed = s.list();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].started_at() <= listed[1].started_at());
        let ids: Vec<&str> = listed.iter().map(|x| x.id()).collect();
        assert!(ids.contains(&a.id()) && ids.contains(&b.id()));
    }

    #[test]
    fn persisted_sessions_survive_a_new_store() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(two_by_one());
        let repo = Arc::new(JsonFileRepository::new(dir.path()));

        let first = SessionStore::new(Arc::clone(&catalog))
            .unwrap()
            .with_repository(repo.clone());
        let id = first.start(profile()).unwrap().id().to_string();
        first.submit_answer(&id, "Q1", 3).unwrap();

        // Lazy load on first access.
        let second = SessionStore::new(Arc::clone(&catalog))
            .unwrap()
            .with_repository(repo.clone());
        assert_eq!(second.len(), 0);
        assert_eq!(second.status(&id).unwrap().cursor, 1);
        second.submit_answer(&id, "Q2", 3).unwrap();

        let third = SessionStore::new(catalog).unwrap().with_repository(repo);
        assert_eq!(third.hydrate().unwrap(), 1);
        assert_eq!(third.readiness_level(&id).unwrap(), ReadinessLevel::ReadyForPilots);
    }

    #[test]
    fn hydrate_skips_records_for_another_catalog() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(JsonFileRepository::new(dir.path()));
        let builtin = SessionStore::new(Arc::new(Catalog::builtin().unwrap()))
            .unwrap()
            .with_repository(repo.clone());
        let id = builtin.start(profile()).unwrap().id().to_string();
        builtin
            .submit_answer(&id, "data_collection_processes", 4)
            .unwrap();

        let small = store().with_repository(repo);
        assert_eq!(small.hydrate().unwrap(), 0);
        assert!(matches!(small.get(&id), Err(ReadinessError::InvalidCatalog(_))));
    }

    struct FlakyRepository {
        fail: AtomicBool,
    }

    impl SessionRepository for FlakyRepository {
        fn save(&self, _session: &AssessmentSession) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(std::io::Error::other("disk full").into());
            }
            Ok(())
        }

        fn load(&self, id: &str) -> Result<AssessmentSession> {
            Err(ReadinessError::SessionNotFound(id.to_string()))
        }

        fn list(&self) -> Result<Vec<AssessmentSession>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn failed_persist_rolls_back() {
        let repo = Arc::new(FlakyRepository {
            fail: AtomicBool::new(false),
        });
        let s = store().with_repository(repo.clone());
        let id = s.start(profile()).unwrap().id().to_string();

        repo.fail.store(true, Ordering::SeqCst);
        assert!(matches!(s.submit_answer(&id, "Q1", 3), Err(ReadinessError::Io(_))));
        assert_eq!(s.get(&id).unwrap().cursor(), 0);

        repo.fail.store(false, Ordering::SeqCst);
        assert_eq!(s.submit_answer(&id, "Q1", 3).unwrap().cursor, 1);
    }

    /// Holds every answer save until the test releases it.
    struct GatedRepository {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl SessionRepository for GatedRepository {
        fn save(&self, session: &AssessmentSession) -> Result<()> {
            if session.version() == 0 {
                return Ok(());
            }
            let _ = lock(&self.entered).send(());
            let _ = lock(&self.release).recv_timeout(Duration::from_secs(5));
            Ok(())
        }

        fn load(&self, id: &str) -> Result<AssessmentSession> {
            Err(ReadinessError::SessionNotFound(id.to_string()))
        }

        fn list(&self) -> Result<Vec<AssessmentSession>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn reads_do_not_wait_for_a_save_in_flight() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let repo = Arc::new(GatedRepository {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let s = store().with_repository(repo);
        let id = s.start(profile()).unwrap().id().to_string();

        std::thread::scope(|scope| {
            let writer = scope.spawn(|| s.submit_answer(&id, "Q1", 3));
            entered_rx.recv().unwrap();

            let started = Instant::now();
            let next = s.next_question(&id).unwrap();
            let status = s.status(&id).unwrap();
            let waited = started.elapsed();
            release_tx.send(()).unwrap();

            assert!(writer.join().unwrap().is_ok());
            assert!(waited < Duration::from_secs(2), "reads waited {waited:?}");
            match next {
                NextQuestion::Question(view) => assert_eq!(view.question_id, "Q1"),
                NextQuestion::Complete { .. } => panic!("expected Q1 before the save commits"),
            }
            assert_eq!(status.cursor, 0);
        });

        assert_eq!(s.status(&id).unwrap().cursor, 1);
    }

    #[test]
    fn two_stores_on_one_directory_accept_one_answer() {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(two_by_one());
        let a = SessionStore::new(Arc::clone(&catalog))
            .unwrap()
            .with_repository(Arc::new(JsonFileRepository::new(dir.path())));
        let b = SessionStore::new(catalog)
            .unwrap()
            .with_repository(Arc::new(JsonFileRepository::new(dir.path())));

        let id = a.start(profile()).unwrap().id().to_string();
        assert_eq!(b.status(&id).unwrap().cursor, 0);

        a.submit_answer(&id, "Q1", 5).unwrap();
        assert!(matches!(b.submit_answer(&id, "Q1", 1), Err(ReadinessError::Conflict(_))));

        let stored = JsonFileRepository::new(dir.path()).load(&id).unwrap();
        assert_eq!(stored.answers()["Q1"], 5);

        // The losing store picks up the winner's record and can continue.
        assert_eq!(b.status(&id).unwrap().cursor, 1);
        assert!(b.submit_answer(&id, "Q2", 2).unwrap().complete);
        assert!(matches!(a.submit_answer(&id, "Q2", 4), Err(ReadinessError::Conflict(_))));
        // 5 + 2 = 7, the AI Ready cutoff for a 2..=10 range.
        assert_eq!(a.readiness_level(&id).unwrap(), ReadinessLevel::AiReady);
    }
}
