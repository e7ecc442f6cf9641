//! Analysis pipeline: index cohort → linkage → classification → rates.
//!
//! Stages are plain functions threaded through an [`AnalysisContext`]; the
//! only shared state between them is the values they return.

use std::collections::BTreeMap;

use bounce_model::{
    AgeGroup, AggregateRate, AnalysisOptions, ClassifiedVisit, CohortStats, LabelCounts,
    MergedRecord, ObservationWindow, OutcomeLabel, OverlapDefinition, StratumAttributes,
    StratumDimension, StratumKey, redact_value,
};
use chrono::NaiveDateTime;
use tracing::{debug, info, info_span, trace};

use crate::censoring::resolve_cutoff;
use crate::classifier::{FollowUpEvidence, classify};
use crate::diagnosis::DiagnosisLookup;
use crate::event_store::{EventStore, IndexEvent};
use crate::linker::{FollowUps, Linker};
use crate::rates::{RateSettings, aggregate, rate_for};

/// Options and reference data for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub options: AnalysisOptions,
    pub diagnosis: DiagnosisLookup,
}

/// Everything a run derives from the event store.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub options: AnalysisOptions,
    pub window: ObservationWindow,
    /// Latest timestamp in the dataset.
    pub dataset_max: Option<NaiveDateTime>,
    /// Censoring reference: the data cutoff, else `dataset_max`.
    pub cutoff: Option<NaiveDateTime>,
    pub stats: CohortStats,
    /// One row per index event, ordered by patient id then arrival.
    pub classified: Vec<ClassifiedVisit>,
    pub rates: Vec<AggregateRate>,
    /// Label counts over every index event, censored or not.
    pub label_counts: LabelCounts,
    /// Included label counts when an admission only counts toward `BOTH`
    /// if it comes at or after the first ED revisit.
    pub revisit_then_admit: LabelCounts,
    pub censored: usize,
}

impl AnalysisOutput {
    /// The overall stratum, when `overall` was requested.
    pub fn overall(&self) -> Option<&AggregateRate> {
        self.rates
            .iter()
            .find(|rate| rate.key.dimension == StratumDimension::Overall)
    }

    /// The overall stratum, computed from the cohort when `overall` was not
    /// requested.
    pub fn overall_rate(&self) -> AggregateRate {
        match self.overall() {
            Some(rate) => rate.clone(),
            None => rate_for(
                StratumKey::overall(),
                &self.classified,
                RateSettings {
                    policy: self.options.censoring_policy,
                    sparse_threshold: self.options.sparse_threshold,
                },
            ),
        }
    }

    pub fn rates_for(&self, dimension: StratumDimension) -> impl Iterator<Item = &AggregateRate> {
        self.rates
            .iter()
            .filter(move |rate| rate.key.dimension == dimension)
    }

    /// Requested dimensions in output order.
    pub fn dimensions(&self) -> Vec<StratumDimension> {
        self.options.dimensions()
    }
}

impl AnalysisContext {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            diagnosis: DiagnosisLookup::default(),
        }
    }

    /// Sets the diagnosis code → category table.
    pub fn with_diagnosis_lookup(mut self, categories: BTreeMap<String, String>) -> Self {
        self.diagnosis = DiagnosisLookup::new(categories);
        self
    }

    /// Validate `records` into an event store and run the analysis.
    pub fn analyze(&self, records: &[MergedRecord]) -> bounce_model::Result<AnalysisOutput> {
        self.options.observation_window()?;
        let store = EventStore::load(records)?;
        self.run(&store)
    }

    /// Run every stage against a loaded store.
    ///
    /// The window configuration is validated before any classification.
    pub fn run(&self, store: &EventStore) -> bounce_model::Result<AnalysisOutput> {
        // ===== Stage 1: Window =====
        let window = self.options.observation_window()?;
        let dataset_max = store.max_timestamp();
        let cutoff = resolve_cutoff(self.options.data_cutoff, dataset_max);
        debug!(
            window_days = window.days(),
            clock_tolerance_minutes = self.options.clock_tolerance_minutes,
            cutoff = ?cutoff,
            "observation window validated"
        );

        // ===== Stage 2: Index cohort =====
        let cohort = store.index_cohort(cutoff);

        // ===== Stage 3: Link and classify =====
        let mut classified = Vec::with_capacity(cohort.events.len());
        let mut revisit_then_admit = LabelCounts::default();
        if let Some(cutoff) = cutoff {
            let _span = info_span!("classify", index_events = cohort.events.len()).entered();
            let linker = Linker::new(window, cutoff);
            for index in &cohort.events {
                let follow_ups = linker.find_follow_ups(index);
                let visit = self.classify_index_event(index, &follow_ups);
                let sequenced = self.revisit_then_admit_label(index, &follow_ups, visit.label);
                if self.options.censoring_policy.includes(sequenced, visit.censored) {
                    revisit_then_admit.add(sequenced);
                }
                classified.push(visit);
            }
        }
        let label_counts: LabelCounts = classified.iter().collect();
        let censored = classified.iter().filter(|visit| visit.censored).count();
        info!(
            ed_only = label_counts.ed_only,
            admit_only = label_counts.admit_only,
            both = label_counts.both,
            neither = label_counts.neither,
            censored,
            "index events classified"
        );

        // ===== Stage 4: Rates =====
        let dimensions = self.options.dimensions();
        let rates = {
            let _span = info_span!("rates", dimensions = dimensions.len()).entered();
            aggregate(
                &classified,
                &dimensions,
                RateSettings {
                    policy: self.options.censoring_policy,
                    sparse_threshold: self.options.sparse_threshold,
                },
                &self.diagnosis.categories(),
            )
        };
        info!(strata = rates.len(), "rates computed");

        Ok(AnalysisOutput {
            options: self.options.clone(),
            window,
            dataset_max,
            cutoff,
            stats: cohort.stats,
            classified,
            rates,
            label_counts,
            revisit_then_admit,
            censored,
        })
    }

    fn classify_index_event(
        &self,
        index: &IndexEvent<'_>,
        follow_ups: &FollowUps<'_>,
    ) -> ClassifiedVisit {
        let evidence = FollowUpEvidence::from_follow_ups(
            index.departure,
            follow_ups,
            index.patient,
            self.options.overlap_definition,
        );
        let classification = classify(&evidence);
        let censored = follow_ups.window.is_censored();
        trace!(
            visit_id = redact_value(&index.visit.id),
            revisits = follow_ups.ed_revisits.len(),
            admissions = follow_ups.admissions.len(),
            label = %classification.label,
            censored,
            "index event classified"
        );

        let demographics = &index.patient.patient.demographics;
        ClassifiedVisit {
            visit_id: index.visit.id.clone(),
            patient_id: index.visit.patient_id.clone(),
            arrival: index.visit.arrival,
            departure: index.departure,
            label: classification.label,
            time_to_event: classification.time_to_event,
            censored,
            strata: StratumAttributes {
                race: demographics.race,
                sex: demographics.sex,
                age_group: AgeGroup::from_age(demographics.age),
                diagnosis_category: self.diagnosis.category_for(
                    index.visit.primary_diagnosis(),
                    self.options.diagnosis_prefix_fallback,
                ),
                month: index.departure.format("%Y-%m").to_string(),
            },
        }
    }

    /// Label of `index` under [`OverlapDefinition::RevisitThenAdmit`].
    fn revisit_then_admit_label(
        &self,
        index: &IndexEvent<'_>,
        follow_ups: &FollowUps<'_>,
        label: OutcomeLabel,
    ) -> OutcomeLabel {
        if self.options.overlap_definition == OverlapDefinition::RevisitThenAdmit {
            return label;
        }
        let evidence = FollowUpEvidence::from_follow_ups(
            index.departure,
            follow_ups,
            index.patient,
            OverlapDefinition::RevisitThenAdmit,
        );
        classify(&evidence).label
    }
}
