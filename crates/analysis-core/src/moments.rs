//! Key-moment selection over the completed ply sequence.

use crate::envelope::{KeyMoment, PlyRecord};

/// How many moments to keep.
const TOP_MOMENTS: usize = 5;

/// Rank plies by evaluation swing: |eval(i) - eval(i-1)| over adjacent
/// plies where both principal evaluations are present. Plies with an
/// absent evaluation on either side are excluded, not treated as zero.
/// Returns the top 5 by descending swing; ties go to the earlier ply.
pub fn select_key_moments(per_ply: &[PlyRecord]) -> Vec<KeyMoment> {
    let mut moments: Vec<KeyMoment> = Vec::new();

    for pair in per_ply.windows(2) {
        let (prev, current) = (&pair[0], &pair[1]);
        let (Some(before), Some(after)) = (prev.eval_cp, current.eval_cp) else {
            continue;
        };
        moments.push(KeyMoment {
            ply: current.ply,
            played_san: current.played_san.clone(),
            eval_cp: current.eval_cp,
            swing: (after - before).abs(),
        });
    }

    // Stable sort keeps the ascending-ply order as tiebreak.
    moments.sort_by(|a, b| b.swing.cmp(&a.swing));
    moments.truncate(TOP_MOMENTS);
    moments
}
