//! Effectiveness report.

use adaptive_core::{EffectivenessRecord, Time};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate over a group of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    /// Records in the group
    pub count: usize,
    /// Records with a positive score
    pub successful: usize,
    /// Mean effectiveness score
    pub mean_score: f64,
}

impl Breakdown {
    fn from_records<'a>(records: impl IntoIterator<Item = &'a EffectivenessRecord>) -> Self {
        let mut count = 0;
        let mut successful = 0;
        let mut total = 0.0;
        for record in records {
            count += 1;
            total += record.effectiveness_score;
            if record.is_successful() {
                successful += 1;
            }
        }
        Self {
            count,
            successful,
            mean_score: if count == 0 { 0.0 } else { total / count as f64 },
        }
    }

    /// Share of records that helped.
    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.successful as f64 / self.count as f64
        }
    }
}

/// Summary of how well past adaptations worked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectivenessReport {
    /// When the report was generated
    pub generated_at: Time,
    /// Adaptations with enough data to score
    pub evaluated: usize,
    /// Adaptations skipped for missing samples or a zero baseline
    pub excluded: usize,
    /// Mean effectiveness score over evaluated adaptations
    pub overall_effectiveness: f64,
    /// Evaluated adaptations with a positive score
    pub successful_adaptations: usize,
    /// Grouped by adaptation type
    pub by_type: BTreeMap<String, Breakdown>,
    /// Grouped by strategy id
    pub by_strategy: BTreeMap<String, Breakdown>,
    /// The scored records, oldest first
    pub records: Vec<EffectivenessRecord>,
}

impl EffectivenessReport {
    /// Build a report from scored records and the number skipped.
    pub fn new(records: Vec<EffectivenessRecord>, excluded: usize) -> Self {
        let overall = Breakdown::from_records(&records);

        let mut by_type: BTreeMap<String, Vec<&EffectivenessRecord>> = BTreeMap::new();
        let mut by_strategy: BTreeMap<String, Vec<&EffectivenessRecord>> = BTreeMap::new();
        for record in &records {
            by_type.entry(record.adaptation_type.clone()).or_default().push(record);
            by_strategy.entry(record.strategy_id.to_string()).or_default().push(record);
        }
        let summarize = |groups: BTreeMap<String, Vec<&EffectivenessRecord>>| {
            groups
                .into_iter()
                .map(|(key, group)| (key, Breakdown::from_records(group)))
                .collect::<BTreeMap<_, _>>()
        };
        let by_type = summarize(by_type);
        let by_strategy = summarize(by_strategy);

        Self {
            generated_at: chrono::Utc::now(),
            evaluated: overall.count,
            excluded,
            overall_effectiveness: overall.mean_score,
            successful_adaptations: overall.successful,
            by_type,
            by_strategy,
            records,
        }
    }
}
