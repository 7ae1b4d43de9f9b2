//! Application state for one client session.
//!
//! A [`Session`] owns everything the client mutates: the run history, the
//! latest run, and the saved form values. It is created on start, reset on
//! clear, and only changes through its methods.

use crate::client::RecommendationService;
use crate::config::Config;
use crate::error::{ApiResult, ExportError, ExportResult, StoreResult};
use crate::history::{HistoryLog, DISPLAY_LIMIT, EXPORT_LIMIT};
use crate::models::{top_n, FormValues, LatestRun, MaterialResult, QuestionnaireInput};
use crate::store::FormStore;
use tracing::{debug, error, info, warn};

/// Tunables taken from the configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub baseline_co2: f64,
    pub baseline_cost: f64,
    pub display_limit: usize,
    pub export_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            baseline_co2: 10.0,
            baseline_cost: 10.0,
            display_limit: DISPLAY_LIMIT,
            export_limit: EXPORT_LIMIT,
        }
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            baseline_co2: config.metrics.baseline_co2,
            baseline_cost: config.metrics.baseline_cost,
            display_limit: config.history.display_limit,
            export_limit: config.history.export_limit,
        }
    }
}

/// Result of a questionnaire submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Materials were recommended and recorded.
    Recommended { shown: usize },
    /// The service matched nothing; history is unchanged.
    NoRecommendations { message: Option<String> },
}

pub struct Session<S> {
    service: S,
    history: HistoryLog,
    latest: Option<LatestRun>,
    form_store: FormStore,
    restored_form: Option<FormValues>,
    settings: SessionSettings,
}

impl<S: RecommendationService> Session<S> {
    /// Start a session and restore the saved form values.
    pub fn open(service: S, form_store: FormStore, settings: SessionSettings) -> Self {
        let restored_form = form_store.load();
        if restored_form.is_some() {
            debug!(path = %form_store.path().display(), "Restored saved form values");
        }

        Self {
            service,
            history: HistoryLog::new(settings.display_limit),
            latest: None,
            form_store,
            restored_form,
            settings,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn latest(&self) -> Option<&LatestRun> {
        self.latest.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Form values saved by an earlier submission.
    pub fn restored_form(&self) -> Option<FormValues> {
        self.restored_form
    }

    /// Replace the history and the latest run with the server's copy.
    ///
    /// Failures are logged and leave the session as it was. Returns whether
    /// the history was loaded.
    pub async fn load_history(&mut self) -> bool {
        match self.service.history().await {
            Ok(runs) => {
                self.latest = self.history.load(runs, self.settings.export_limit);
                info!(runs = self.history.run_count(), "Loaded history");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to load history");
                false
            }
        }
    }

    /// Submit a questionnaire and record the result.
    ///
    /// The questionnaire is saved first, so it is restored next time even
    /// when the request fails. An empty answer leaves the history untouched.
    pub async fn submit(&mut self, input: QuestionnaireInput) -> ApiResult<SubmitOutcome> {
        if let Err(e) = self.form_store.save(&input) {
            warn!(error = %e, "Failed to save form values");
        }
        self.restored_form = Some(FormValues::from(input));

        let recommendation = self.service.recommend(&input).await?;

        if recommendation.is_empty() {
            info!("Service returned no recommendations");
            return Ok(SubmitOutcome::NoRecommendations {
                message: recommendation.message,
            });
        }

        self.history.append(&recommendation.results);
        let latest = LatestRun {
            display: top_n(&recommendation.results, self.settings.display_limit),
            ranking: top_n(&recommendation.top10, self.settings.export_limit),
            inputs: recommendation.inputs.or(Some(input)),
        };
        let shown = latest.display.len();
        self.latest = Some(latest);

        debug!(runs = self.history.run_count(), "Recorded run");
        Ok(SubmitOutcome::Recommended { shown })
    }

    /// Clear history on the server (best effort) and always locally.
    ///
    /// Returns whether the server acknowledged the request.
    pub async fn clear_history(&mut self) -> bool {
        let acknowledged = match self.service.clear_history().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to clear server history");
                false
            }
        };

        self.history.clear();
        self.latest = None;
        acknowledged
    }

    /// Forget the saved form and the latest run; history metrics stay.
    pub fn clear_form(&mut self) -> StoreResult<()> {
        self.latest = None;
        self.restored_form = None;
        self.form_store.clear()
    }

    /// Rows available for export: the latest run's ranking.
    ///
    /// Fails when nothing has been recommended yet.
    pub fn export_rows(&self) -> ExportResult<&[MaterialResult]> {
        match &self.latest {
            Some(latest) if !latest.ranking.is_empty() => Ok(&latest.ranking),
            Some(latest) if !latest.display.is_empty() => Ok(&latest.display),
            _ => Err(ExportError::NothingToExport),
        }
    }

    /// Average CO2 reduction across the history, in percent.
    pub fn co2_reduction(&self) -> f64 {
        self.history.co2_reduction(self.settings.baseline_co2)
    }

    /// Average cost savings across the history.
    pub fn cost_savings(&self) -> f64 {
        self.history.cost_savings(self.settings.baseline_cost)
    }

    /// Results to chart: the whole history, else the latest run.
    pub fn chart_pool(&self) -> Vec<&MaterialResult> {
        let fallback = self
            .latest
            .as_ref()
            .map(|l| l.display.as_slice())
            .unwrap_or(&[]);
        self.history.chart_pool(fallback)
    }
}
