//! Weighted linear MCDA score and ranking.
//!
//! score(site) = Σ w_c × norm_c(site)
//! rank(site)  = dense rank of score, descending (1 = best)

use tracing::{info, warn};

use crate::error::{RankerError, Result};
use crate::sites::{norm_column, weighted_column, SiteTable, RANK_COLUMN, SCORE_COLUMN};
use crate::weights::WeightSet;

/// Scores closer than this share a rank.
pub const RANK_TIE_TOLERANCE: f64 = 1e-9;

/// Dense rank, descending: the best score gets 1, equal scores share a rank
/// and the next distinct score gets the next integer.
pub fn dense_rank_desc(scores: &[f64]) -> Vec<u64> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // Stable: equal scores keep row order.
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(std::cmp::Ordering::Equal));

    let mut ranks = vec![0u64; scores.len()];
    let mut rank = 0u64;
    let mut group_head = f64::NAN;
    for idx in order {
        let s = scores[idx];
        if rank == 0 || (group_head - s).abs() > RANK_TIE_TOLERANCE {
            rank += 1;
            group_head = s;
        }
        ranks[idx] = rank;
    }
    ranks
}

/// Compute `<c>_w`, `score` and `rank` for every site.
///
/// Requires the normaliser to have run: a missing `<c>_norm` value on any
/// site fails the whole stage before anything is written.
pub fn score(table: &mut SiteTable, weights: &WeightSet) -> Result<()> {
    let n = table.len();
    if n == 0 {
        warn!("Site table is empty, nothing to score");
        return Ok(());
    }
    let mut weighted_columns = Vec::with_capacity(weights.len());
    for criterion in weights {
        let norm_name = norm_column(&criterion.name);
        let normed = table.numeric_column(&norm_name).map_err(|e| match e {
            RankerError::MissingCriterionColumn(column) => RankerError::MissingNormalizedColumn(column),
            other => other,
        })?;
        let weighted: Vec<f64> = normed.iter().map(|v| v * criterion.weight).collect();
        weighted_columns.push((weighted_column(&criterion.name), weighted));
    }

    let mut scores = vec![0.0; n];
    for (_, values) in &weighted_columns {
        for (total, v) in scores.iter_mut().zip(values) {
            *total += v;
        }
    }
    let ranks = dense_rank_desc(&scores);

    for (name, values) in &weighted_columns {
        table.set_column(name, values);
    }
    table.set_column(SCORE_COLUMN, &scores);
    for (site, rank) in table.sites_mut().iter_mut().zip(ranks) {
        site.properties.insert(RANK_COLUMN.to_string(), rank.into());
    }

    if let Some((min, max, _)) = table.score_summary() {
        info!("Scored {} sites: max score {:.4}, min score {:.4}", n, max, min);
    }
    Ok(())
}
