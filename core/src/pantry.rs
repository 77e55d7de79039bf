use crate::catalog::{load_catalog, suggest, IngredientCatalogEntry};
use crate::corpus::{load_corpus, Corpus, LoadReport};
use crate::error::LoadError;
use crate::index::IngredientIndex;
use crate::normalizer::Normalizer;
use crate::rank::{rank, Ranking};
use crate::resource::DataPaths;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Everything one load produces. Immutable once built; shared as `Arc<Pantry>`.
#[derive(Debug)]
pub struct Pantry {
    pub corpus: Corpus,
    pub index: IngredientIndex,
    pub catalog: Vec<IngredientCatalogEntry>,
    pub report: LoadReport,
    pub catalog_report: LoadReport,
    /// Set when the catalog could not be loaded; the catalog is then empty.
    pub catalog_error: Option<String>,
}

impl Pantry {
    /// Index `corpus` and bundle it with `catalog`.
    pub fn from_parts(corpus: Corpus, catalog: Vec<IngredientCatalogEntry>) -> Self {
        let index = IngredientIndex::build(&corpus);
        Self {
            corpus,
            index,
            catalog,
            report: LoadReport::default(),
            catalog_report: LoadReport::default(),
            catalog_error: None,
        }
    }

    pub fn rank<S: AsRef<str>>(&self, selection: &[S]) -> Ranking<'_> {
        rank(&self.corpus, &self.index, selection)
    }

    pub fn suggest(&self, query: &str, limit: usize) -> Vec<&IngredientCatalogEntry> {
        suggest(&self.catalog, query, limit)
    }
}

/// Run the whole pipeline synchronously: load, parse, normalize, index.
///
/// A missing recipe dataset fails the load. A missing or unreadable catalog only disables
/// suggestions.
pub fn load_pantry(paths: &DataPaths, normalizer: Arc<Normalizer>) -> Result<Pantry, LoadError> {
    let start = Instant::now();
    let load = load_corpus(&paths.recipes(), normalizer)?;

    let (catalog, catalog_report, catalog_error) = match load_catalog(&paths.catalog()) {
        Ok(c) => (c.entries, c.report, None),
        Err(e) => {
            tracing::warn!(error = %e, "ingredient catalog unavailable, suggestions disabled");
            (Vec::new(), LoadReport::default(), Some(e.to_string()))
        }
    };

    let mut pantry = Pantry::from_parts(load.corpus, catalog);
    pantry.report = load.report;
    pantry.catalog_report = catalog_report;
    pantry.catalog_error = catalog_error;
    tracing::info!(
        recipes = pantry.corpus.len(),
        keys = pantry.index.len(),
        catalog = pantry.catalog.len(),
        took_s = start.elapsed().as_secs_f64(),
        "pantry ready"
    );
    Ok(pantry)
}

/// [`load_pantry`] on a blocking worker thread.
pub async fn load_pantry_async(paths: DataPaths, normalizer: Arc<Normalizer>) -> Result<Pantry, LoadError> {
    tokio::task::spawn_blocking(move || load_pantry(&paths, normalizer))
        .await
        .unwrap_or_else(|e| Err(LoadError::Task(e.to_string())))
}

#[derive(Debug, Clone)]
pub enum LoadState {
    Loading,
    Ready(Arc<Pantry>),
    Failed(Arc<LoadError>),
}

impl LoadState {
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Loading => "loading",
            LoadState::Ready(_) => "ready",
            LoadState::Failed(_) => "failed",
        }
    }
}

/// Publish-once slot for the loaded pantry.
///
/// Starts as `Loading`; the first `publish` decides the final state and later ones are
/// ignored. Readers never see a partially built pantry.
pub struct PantryCell {
    state: RwLock<LoadState>,
    state_tx: watch::Sender<LoadState>,
    state_rx: watch::Receiver<LoadState>,
}

impl Default for PantryCell {
    fn default() -> Self { Self::new() }
}

impl PantryCell {
    pub fn new() -> Self {
        let (state_tx, state_rx) = watch::channel(LoadState::Loading);
        Self { state: RwLock::new(LoadState::Loading), state_tx, state_rx }
    }

    /// A cell that is already published, for tests and embedding callers.
    pub fn ready(pantry: Pantry) -> Self {
        let cell = Self::new();
        cell.publish(Ok(pantry));
        cell
    }

    pub fn state(&self) -> LoadState {
        self.state.read().clone()
    }

    pub fn pantry(&self) -> Option<Arc<Pantry>> {
        match &*self.state.read() {
            LoadState::Ready(p) => Some(Arc::clone(p)),
            _ => None,
        }
    }

    /// Returns false when the cell was already published.
    pub fn publish(&self, result: Result<Pantry, LoadError>) -> bool {
        let mut state = self.state.write();
        if !matches!(*state, LoadState::Loading) {
            tracing::warn!(current = state.label(), "pantry already published, ignoring");
            return false;
        }
        let next = match result {
            Ok(pantry) => LoadState::Ready(Arc::new(pantry)),
            Err(e) => {
                tracing::error!(error = %e, "pantry load failed");
                LoadState::Failed(Arc::new(e))
            }
        };
        *state = next.clone();
        self.state_tx.send_replace(next);
        true
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state_rx.clone()
    }

    /// Resolves once the load has been published.
    pub async fn wait_ready(&self) -> Result<Arc<Pantry>, Arc<LoadError>> {
        let mut rx = self.subscribe();
        let state = rx
            .wait_for(|s| !matches!(s, LoadState::Loading))
            .await
            .map(|s| s.clone())
            .map_err(|e| Arc::new(LoadError::Task(e.to_string())))?;
        match state {
            LoadState::Ready(p) => Ok(p),
            LoadState::Failed(e) => Err(e),
            LoadState::Loading => unreachable!("wait_for only returns published states"),
        }
    }
}

/// Load in the background and publish into `cell`.
pub fn spawn_load(cell: Arc<PantryCell>, paths: DataPaths, normalizer: Arc<Normalizer>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = load_pantry_async(paths, normalizer).await;
        cell.publish(result);
    })
}
