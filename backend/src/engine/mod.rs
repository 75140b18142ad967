//! Forecasting engine
//!
//! Owns the pipeline: ingest → normalize → aggregate → score → forecast →
//! alert. State is held per farm behind one async mutex each, so scoring
//! cycles for different farms run in parallel while a single farm's grid
//! and alert states are only ever mutated by one cycle at a time, and
//! reads observe either the state before or after a cycle, never a
//! partially-applied one.

pub mod aggregator;
pub mod alerts;
pub mod favorability;
pub mod normalizer;
pub mod risk;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use shared::{
    validate_geo_point, AlertEvent, AlertState, CellId, Farm, FavorabilityIndex, GridCell,
    GridDefinition, ImageCapture, RiskForecast, WeatherSample,
};

use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::external::AlertDispatcher;

/// Mutable engine state for one farm
struct FarmState {
    farm: Farm,
    cells: HashMap<CellId, GridCell>,
    weather: BTreeMap<DateTime<Utc>, WeatherSample>,
    favorability: Vec<FavorabilityIndex>,
    alert_states: HashMap<CellId, AlertState>,
    alert_log: Vec<AlertEvent>,
    /// Consecutive cycles scored on stale or absent weather
    degraded_cycles: u32,
}

/// Outcome of one detection-ingest call
#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub below_threshold: usize,
    pub suppressed: usize,
    pub invalid: usize,
    pub binned: usize,
    pub out_of_scope: usize,
    pub alerts_emitted: usize,
    pub degraded: bool,
}

/// Outcome of one weather-ingest call
#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct WeatherReport {
    pub ingested: usize,
    pub replaced: usize,
    pub invalid: usize,
    pub alerts_emitted: usize,
    pub degraded: bool,
}

/// One scoring cycle's result, produced under the farm lock
struct CycleOutcome {
    events: Vec<AlertEvent>,
    degraded: bool,
}

/// The forecasting engine
///
/// All public operations are keyed by farm; there is no cross-farm shared
/// mutable state, so one farm's failure or cancellation never affects
/// another.
pub struct ForecastEngine {
    config: EngineConfig,
    farms: RwLock<HashMap<Uuid, Arc<Mutex<FarmState>>>>,
    dispatcher: Option<Arc<dyn AlertDispatcher>>,
}

impl ForecastEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            farms: RwLock::new(HashMap::new()),
            dispatcher: None,
        }
    }

    /// Attach an alert dispatch collaborator
    ///
    /// The engine guarantees at most one emission per transition; delivery
    /// (and redelivery) is the dispatcher's concern.
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn AlertDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a farm and its grid
    pub async fn register_farm(&self, name: String, grid: GridDefinition) -> AppResult<Farm> {
        validate_geo_point(grid.origin).map_err(|reason| AppError::Validation {
            field: "origin".to_string(),
            message: reason.to_string(),
        })?;
        if !grid.cell_size_deg.is_finite() || grid.cell_size_deg <= 0.0 {
            return Err(AppError::Validation {
                field: "cell_size_deg".to_string(),
                message: "Cell size must be a positive number of degrees".to_string(),
            });
        }
        if grid.rows == 0 || grid.cols == 0 {
            return Err(AppError::Validation {
                field: "grid".to_string(),
                message: "Grid must have at least one row and one column".to_string(),
            });
        }

        let farm = Farm {
            id: Uuid::new_v4(),
            name,
            grid,
            created_at: Utc::now(),
        };
        let state = FarmState {
            farm: farm.clone(),
            cells: HashMap::new(),
            weather: BTreeMap::new(),
            favorability: Vec::new(),
            alert_states: HashMap::new(),
            alert_log: Vec::new(),
            degraded_cycles: 0,
        };
        self.farms
            .write()
            .await
            .insert(farm.id, Arc::new(Mutex::new(state)));
        tracing::info!(farm_id = %farm.id, name = %farm.name, "Registered farm");
        Ok(farm)
    }

    pub async fn list_farms(&self) -> Vec<Farm> {
        let farms = self.farms.read().await;
        let mut result = Vec::with_capacity(farms.len());
        for handle in farms.values() {
            result.push(handle.lock().await.farm.clone());
        }
        result.sort_by_key(|f| f.created_at);
        result
    }

    pub async fn get_farm(&self, farm_id: Uuid) -> AppResult<Farm> {
        let handle = self.farm_handle(farm_id).await?;
        let state = handle.lock().await;
        Ok(state.farm.clone())
    }

    /// Ingest detector output for a batch of drone images
    ///
    /// Runs the full cycle for the farm: normalize → aggregate → score →
    /// alert. Malformed records are skipped, detections outside the grid
    /// are dropped with a notice; neither fails the batch.
    pub async fn ingest_detections(
        &self,
        farm_id: Uuid,
        captures: Vec<ImageCapture>,
    ) -> AppResult<IngestReport> {
        let handle = self.farm_handle(farm_id).await?;
        let mut report = IngestReport::default();

        let events = {
            let mut guard = handle.lock().await;
            let state = &mut *guard;
            let now = Utc::now();

            let mut detections = Vec::new();
            for capture in &captures {
                let (mut batch, summary) = normalizer::normalize_capture(capture, &self.config);
                report.accepted += summary.accepted;
                report.below_threshold += summary.below_threshold;
                report.suppressed += summary.suppressed;
                report.invalid += summary.invalid;
                detections.append(&mut batch);
            }

            let summary = aggregator::bin_detections(
                &state.farm.grid,
                &mut state.cells,
                detections,
                now,
                &self.config,
            );
            report.binned = summary.binned;
            report.out_of_scope = summary.out_of_scope;

            let outcome = self.run_cycle(state, now);
            report.alerts_emitted = outcome.events.len();
            report.degraded = outcome.degraded;
            outcome.events
        };

        self.dispatch_events(events).await;
        Ok(report)
    }

    /// Ingest weather samples (historical and forecast)
    ///
    /// Samples are deduplicated by timestamp, later ingests replacing
    /// earlier ones, and the favorability cache is recomputed for the
    /// whole series.
    pub async fn ingest_weather(
        &self,
        farm_id: Uuid,
        samples: Vec<WeatherSample>,
    ) -> AppResult<WeatherReport> {
        let handle = self.farm_handle(farm_id).await?;
        let mut report = WeatherReport::default();

        let events = {
            let mut state = handle.lock().await;
            let now = Utc::now();

            for sample in samples {
                if !sample_is_valid(&sample) {
                    report.invalid += 1;
                    tracing::debug!(ts = %sample.timestamp, "Skipping malformed weather sample");
                    continue;
                }
                if state.weather.insert(sample.timestamp, sample).is_some() {
                    report.replaced += 1;
                } else {
                    report.ingested += 1;
                }
            }

            let samples: Vec<WeatherSample> = state.weather.values().cloned().collect();
            state.favorability =
                favorability::favorability_series(&samples, &self.config.favorability);

            let outcome = self.run_cycle(&mut state, now);
            report.alerts_emitted = outcome.events.len();
            report.degraded = outcome.degraded;
            outcome.events
        };

        self.dispatch_events(events).await;
        Ok(report)
    }

    /// Project outbreak risk forward for every cell of a farm
    ///
    /// Covers the whole grid: cells with no detection history ever get a
    /// favorability-driven baseline projection rather than being omitted.
    /// Fails with `InsufficientData` when the horizon reaches past the
    /// farthest available weather sample; the engine never extrapolates
    /// weather silently.
    pub async fn get_forecast(
        &self,
        farm_id: Uuid,
        horizon_hours: i64,
    ) -> AppResult<Vec<RiskForecast>> {
        if horizon_hours <= 0 {
            return Err(AppError::Validation {
                field: "horizon_hours".to_string(),
                message: "Forecast horizon must be positive".to_string(),
            });
        }

        let handle = self.farm_handle(farm_id).await?;
        let state = handle.lock().await;
        let now = Utc::now();

        let horizon_end = now + Duration::hours(horizon_hours);
        let coverage = state.weather.keys().next_back().copied();
        match coverage {
            Some(latest) if latest >= horizon_end => {}
            Some(latest) => {
                return Err(AppError::InsufficientData(format!(
                    "Requested horizon of {horizon_hours}h exceeds available weather data \
                     (forecast ends {latest})"
                )));
            }
            None => {
                return Err(AppError::InsufficientData(
                    "No weather data ingested for this farm".to_string(),
                ));
            }
        }

        let mut forecasts = Vec::new();
        for row in 0..state.farm.grid.rows {
            for col in 0..state.farm.grid.cols {
                let id = CellId::new(row, col);
                let history = state
                    .cells
                    .get(&id)
                    .map(|cell| cell.detection_history.as_slice())
                    .unwrap_or(&[]);
                let area = state.farm.grid.cell_area_km2(id);
                forecasts.extend(risk::project_forecast(
                    state.farm.id,
                    id,
                    history,
                    area,
                    &state.favorability,
                    now,
                    horizon_hours,
                    &self.config,
                ));
            }
        }
        Ok(forecasts)
    }

    /// All alert events emitted for a farm, oldest first
    pub async fn get_alerts(&self, farm_id: Uuid) -> AppResult<Vec<AlertEvent>> {
        let handle = self.farm_handle(farm_id).await?;
        let state = handle.lock().await;
        Ok(state.alert_log.clone())
    }

    /// Current cell states of a farm, ordered by cell id
    pub async fn get_cells(&self, farm_id: Uuid) -> AppResult<Vec<GridCell>> {
        let handle = self.farm_handle(farm_id).await?;
        let state = handle.lock().await;
        let mut cells: Vec<GridCell> = state.cells.values().cloned().collect();
        cells.sort_by_key(|c| c.id);
        Ok(cells)
    }

    /// Acknowledge an alerting cell
    pub async fn acknowledge(&self, farm_id: Uuid, cell_id: CellId) -> AppResult<AlertState> {
        let handle = self.farm_handle(farm_id).await?;
        let mut state = handle.lock().await;
        let now = Utc::now();

        let alert_state = state
            .alert_states
            .get_mut(&cell_id)
            .ok_or_else(|| AppError::NotFound(format!("Alert state for cell {cell_id}")))?;
        alerts::acknowledge(alert_state, now)
            .map_err(|reason| AppError::InvalidStateTransition(reason.to_string()))?;
        tracing::info!(farm_id = %farm_id, cell = %cell_id, "Cell acknowledged");
        Ok(alert_state.clone())
    }

    /// One scoring cycle over every cell of a farm
    ///
    /// Called with the farm lock held. Prunes histories, recomputes
    /// densities and risk scores, and advances the alert state machine.
    fn run_cycle(&self, state: &mut FarmState, now: DateTime<Utc>) -> CycleOutcome {
        let (favorability_now, degraded) = self.current_favorability(state, now);
        state.degraded_cycles = if degraded { state.degraded_cycles + 1 } else { 0 };

        let farm_id = state.farm.id;
        let grid = state.farm.grid.clone();
        let mut events = Vec::new();

        for (id, cell) in state.cells.iter_mut() {
            aggregator::refresh_cell(&grid, cell, now, &self.config);
            let area = grid.cell_area_km2(*id);
            let score = risk::risk_score(
                &cell.detection_history,
                area,
                favorability_now,
                now,
                &self.config,
            );
            cell.current_risk_score = score;

            let alert_state = state
                .alert_states
                .entry(*id)
                .or_insert_with(|| AlertState::new(now));
            if let Some(status) = alerts::evaluate(alert_state, score, now, &self.config) {
                events.push(AlertEvent {
                    id: Uuid::new_v4(),
                    farm_id,
                    cell_id: *id,
                    status,
                    risk_score: score,
                    timestamp: now,
                });
            }
        }

        state.alert_log.extend(events.iter().cloned());
        CycleOutcome { events, degraded }
    }

    /// Favorability value to score the current cycle with
    ///
    /// A fresh sample is one no older than `max_weather_age_hours`. A
    /// stale series is reused for a single cycle, flagged degraded; after
    /// that the neutral contribution takes over with an error log.
    fn current_favorability(&self, state: &FarmState, now: DateTime<Utc>) -> (f64, bool) {
        let max_age = Duration::hours(self.config.max_weather_age_hours);
        if let Some(value) = state
            .favorability
            .iter()
            .filter(|idx| idx.timestamp <= now && now - idx.timestamp <= max_age)
            .max_by_key(|idx| idx.timestamp)
            .map(|idx| idx.value)
        {
            return (value, false);
        }

        if state.degraded_cycles == 0 {
            if let Some(last) = state
                .favorability
                .iter()
                .filter(|idx| idx.timestamp <= now)
                .max_by_key(|idx| idx.timestamp)
            {
                tracing::warn!(
                    farm_id = %state.farm.id,
                    ts = %last.timestamp,
                    "No fresh weather sample; reusing last favorability for one degraded cycle"
                );
                return (last.value, true);
            }
        }

        tracing::error!(
            farm_id = %state.farm.id,
            "Weather data stale or absent; scoring with neutral favorability"
        );
        (self.config.favorability.neutral_contribution, true)
    }

    async fn farm_handle(&self, farm_id: Uuid) -> AppResult<Arc<Mutex<FarmState>>> {
        self.farms
            .read()
            .await
            .get(&farm_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Farm".to_string()))
    }

    /// Forward emitted events to the dispatch collaborator
    ///
    /// A dispatch failure never rolls back the state transition; the
    /// transition is the source of truth and redelivery is the
    /// dispatcher's concern.
    async fn dispatch_events(&self, events: Vec<AlertEvent>) {
        let Some(dispatcher) = &self.dispatcher else {
            return;
        };
        for event in events {
            if let Err(err) = dispatcher.dispatch(&event).await {
                tracing::warn!(
                    event_id = %event.id,
                    farm_id = %event.farm_id,
                    "Alert dispatch failed: {err}"
                );
            }
        }
    }
}

fn sample_is_valid(sample: &WeatherSample) -> bool {
    [
        sample.temperature_celsius,
        sample.humidity_percent,
        sample.precipitation_mm,
        sample.wind_speed_mps,
    ]
    .iter()
    .all(|field| field.map(f64::is_finite).unwrap_or(true))
}
