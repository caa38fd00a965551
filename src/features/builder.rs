//! Breath feature builder
//!
//! Turns the rows of each breath cycle into fixed-width vectors holding the
//! current readings plus the valve controls of the two preceding steps.

use std::collections::HashMap;
use std::time::Instant;

use ndarray::{Array1, Array2};

use super::layout::{FEATURE_COUNT, LOOKBACK};
use crate::dataset::{BreathRow, Dataset};

/// Build one vector per row of a single, time-ordered breath cycle.
///
/// Lookback slots before the start of the cycle are zero.
pub fn build_breath_features(rows: &[&BreathRow]) -> Vec<[f64; FEATURE_COUNT]> {
    let mut out = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let mut v = [0.0; FEATURE_COUNT];
        v[0] = row.r;
        v[1] = row.c;
        v[2] = row.time_step;
        v[3] = row.u_in;
        v[4] = row.u_out;

        for back in 1..=LOOKBACK {
            if i >= back {
                let prev = rows[i - back];
                let slot = 5 + (back - 1) * 2;
                v[slot] = prev.u_in;
                v[slot + 1] = prev.u_out;
            }
        }

        out.push(v);
    }

    out
}

/// Group row indices by breath id in order of first appearance, each group
/// sorted by `time_step`.
pub fn group_breaths(rows: &[BreathRow]) -> Vec<(u64, Vec<usize>)> {
    let mut position: HashMap<u64, usize> = HashMap::new();
    let mut groups: Vec<(u64, Vec<usize>)> = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let slot = *position.entry(row.breath_id).or_insert_with(|| {
            groups.push((row.breath_id, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(idx);
    }

    for (_, members) in groups.iter_mut() {
        members.sort_by(|&a, &b| rows[a].time_step.total_cmp(&rows[b].time_step));
    }

    groups
}

/// Feature matrix for a whole dataset.
///
/// Row `k` of `values` was built from input row `source_rows[k]`.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub values: Array2<f64>,
    pub source_rows: Vec<usize>,
    pub targets: Option<Array1<f64>>,
    pub breaths: usize,
}

impl FeatureMatrix {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let rows = dataset.rows();
        let started = Instant::now();
        let groups = group_breaths(rows);
        let total = groups.len();

        tracing::info!("Preparing features for {} rows ({} breaths)", rows.len(), total);

        let mut flat = Vec::with_capacity(rows.len() * FEATURE_COUNT);
        let mut source_rows = Vec::with_capacity(rows.len());

        for (n, (breath_id, members)) in groups.iter().enumerate() {
            if n % 10 == 0 {
                tracing::debug!(
                    "Processing breath {}/{} (id {}, {:.1}%)",
                    n + 1,
                    total,
                    breath_id,
                    n as f64 / total as f64 * 100.0
                );
            }

            let ordered: Vec<&BreathRow> = members.iter().map(|&i| &rows[i]).collect();
            for v in build_breath_features(&ordered) {
                flat.extend_from_slice(&v);
            }
            source_rows.extend_from_slice(members);
        }

        let targets = if dataset.has_pressure() {
            Some(
                source_rows
                    .iter()
                    .map(|&i| rows[i].pressure.unwrap_or_default())
                    .collect::<Array1<f64>>(),
            )
        } else {
            None
        };

        let n_rows = source_rows.len();
        let values = Array2::from_shape_vec((n_rows, FEATURE_COUNT), flat)
            .unwrap_or_else(|_| Array2::zeros((0, FEATURE_COUNT)));

        tracing::info!("Features ready in {:.2}s", started.elapsed().as_secs_f64());

        Self {
            values,
            source_rows,
            targets,
            breaths: total,
        }
    }

    pub fn len(&self) -> usize {
        self.source_rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source_rows.is_empty()
    }

    /// Reorder per-feature-row outputs back into input row order
    pub fn scatter_to_input_order(&self, outputs: &[f64]) -> Vec<f64> {
        let mut ordered = vec![0.0; outputs.len()];
        for (k, &row) in self.source_rows.iter().enumerate() {
            if let (Some(slot), Some(&value)) = (ordered.get_mut(row), outputs.get(k)) {
                *slot = value;
            }
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64, breath_id: u64, t: f64, u_in: f64, u_out: f64) -> BreathRow {
        BreathRow {
            id,
            breath_id,
            r: 20.0,
            c: 50.0,
            time_step: t,
            u_in,
            u_out,
            pressure: Some(id as f64),
        }
    }

    #[test]
    fn test_one_vector_per_step() {
        let rows: Vec<BreathRow> = (0..5).map(|i| row(i, 1, i as f64 * 0.03, i as f64, 0.0)).collect();
        let refs: Vec<&BreathRow> = rows.iter().collect();
        let features = build_breath_features(&refs);

        assert_eq!(features.len(), 5);
        assert!(features.iter().all(|v| v.len() == FEATURE_COUNT));
    }

    #[test]
    fn test_lookback_zero_padded() {
        let rows = vec![
            row(1, 1, 0.0, 3.0, 0.0),
            row(2, 1, 0.1, 4.0, 1.0),
            row(3, 1, 0.2, 5.0, 0.0),
        ];
        let refs: Vec<&BreathRow> = rows.iter().collect();
        let f = build_breath_features(&refs);

        assert_eq!(&f[0][5..], &[0.0, 0.0, 0.0, 0.0]);
        assert_eq!(&f[1][5..], &[3.0, 0.0, 0.0, 0.0]);
        assert_eq!(&f[2][5..], &[4.0, 1.0, 3.0, 0.0]);
        assert_eq!(&f[2][..5], &[20.0, 50.0, 0.2, 5.0, 0.0]);
    }

    #[test]
    fn test_empty_breath() {
        assert!(build_breath_features(&[]).is_empty());
    }

    #[test]
    fn test_no_cross_breath_leakage() {
        // Interleaved breaths, shuffled time order
        let rows = vec![
            row(1, 1, 0.1, 10.0, 0.0),
            row(2, 2, 0.0, 20.0, 0.0),
            row(3, 1, 0.0, 11.0, 0.0),
            row(4, 2, 0.1, 21.0, 1.0),
        ];
        let ds = Dataset::new(rows);
        let fm = FeatureMatrix::from_dataset(&ds);

        assert_eq!(fm.len(), 4);
        assert_eq!(fm.breaths, 2);
        // Breath 1 first (first appearance), sorted by time
        assert_eq!(fm.source_rows, vec![2, 0, 1, 3]);

        let first_of_breath_2 = fm.values.row(2);
        assert_eq!(first_of_breath_2[3], 20.0);
        assert!(first_of_breath_2.iter().skip(5).all(|&v| v == 0.0));

        let second_of_breath_1 = fm.values.row(1);
        assert_eq!(second_of_breath_1[5], 11.0);
    }

    #[test]
    fn test_targets_follow_feature_order() {
        let rows = vec![row(1, 1, 0.1, 1.0, 0.0), row(2, 1, 0.0, 2.0, 0.0)];
        let fm = FeatureMatrix::from_dataset(&Dataset::new(rows));
        let targets = fm.targets.unwrap();
        assert_eq!(targets.to_vec(), vec![2.0, 1.0]);
    }

    #[test]
    fn test_no_targets_without_pressure() {
        let mut r = row(1, 1, 0.0, 1.0, 0.0);
        r.pressure = None;
        let fm = FeatureMatrix::from_dataset(&Dataset::new(vec![r]));
        assert!(fm.targets.is_none());
    }

    #[test]
    fn test_scatter_restores_input_order() {
        let rows = vec![
            row(1, 1, 0.1, 1.0, 0.0),
            row(2, 2, 0.0, 2.0, 0.0),
            row(3, 1, 0.0, 3.0, 0.0),
        ];
        let fm = FeatureMatrix::from_dataset(&Dataset::new(rows));
        // Output k corresponds to source row fm.source_rows[k]
        let outputs: Vec<f64> = fm.source_rows.iter().map(|&r| r as f64 * 10.0).collect();
        assert_eq!(fm.scatter_to_input_order(&outputs), vec![0.0, 10.0, 20.0]);
    }
}
