//! Uniform-stride key-frame selection.
//!
//! Picks `T` evenly spaced entries out of `N` ordered timestamps using a
//! real-valued step of `(N - 1) / (T - 1)`, floored to integer indices. The
//! first and last key frames are always kept when `T >= 2`.

use crate::planner::SelectionPlan;

/// Down-sample `items` to `target` evenly spaced entries.
///
/// Returns every item unchanged when `target` is zero or not smaller than
/// `items.len()`. Order is preserved.
///
/// ```
/// use framebar::select_uniform;
///
/// let picked = select_uniform(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9], 4);
/// assert_eq!(picked, vec![0, 3, 6, 9]);
/// ```
pub fn select_uniform<T: Clone>(items: &[T], target: usize) -> Vec<T> {
    let available = items.len();
    if target == 0 || target >= available {
        return items.to_vec();
    }
    if target == 1 {
        return items[..1].to_vec();
    }

    // Exact floor(position * step); f64 can round the last index down.
    let (span, intervals) = ((available - 1) as u128, (target - 1) as u128);
    (0..target)
        .filter_map(|position| {
            let index = (position as u128 * span / intervals) as usize;
            items.get(index.min(available - 1)).cloned()
        })
        .collect()
}

/// Apply a [`SelectionPlan`]: down-sample, then drop the first selected
/// entry when the plan says so.
///
/// Skipping happens after down-sampling, so what gets dropped is the
/// earliest *selected* timestamp.
pub fn select_frames<T: Clone>(items: &[T], plan: &SelectionPlan) -> Vec<T> {
    let mut selected = select_uniform(items, plan.target_count);
    if plan.skip_first && !selected.is_empty() {
        selected.remove(0);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(target_count: usize, skip_first: bool) -> SelectionPlan {
        SelectionPlan {
            target_count,
            skip_first,
        }
    }

    #[test]
    fn returns_exact_count_with_endpoints() {
        let items: Vec<u32> = (0..37).collect();
        for target in 2..=items.len() {
            let picked = select_uniform(&items, target);
            assert_eq!(picked.len(), target, "target {target}");
            assert_eq!(picked.first(), Some(&0));
            assert_eq!(picked.last(), Some(&36));
            assert!(picked.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn single_target_picks_first() {
        assert_eq!(select_uniform(&[10, 20, 30], 1), vec![10]);
        assert_eq!(select_uniform(&[10], 1), vec![10]);
    }

    #[test]
    fn target_at_or_above_length_is_identity() {
        let items = [1, 2, 3];
        assert_eq!(select_uniform(&items, 3), items.to_vec());
        assert_eq!(select_uniform(&items, 50), items.to_vec());
        assert_eq!(select_uniform(&items, 0), items.to_vec());
    }

    #[test]
    fn empty_input_stays_empty() {
        let empty: [u8; 0] = [];
        assert!(select_uniform(&empty, 4).is_empty());
        assert!(select_frames(&empty, &plan(4, true)).is_empty());
    }

    #[test]
    fn stride_matches_floor_of_real_step() {
        // step = 6 / 4 = 1.5
        assert_eq!(select_uniform(&[0, 1, 2, 3, 4, 5, 6], 5), vec![0, 1, 3, 4, 6]);
    }

    #[test]
    fn skip_first_drops_first_selected_not_first_key_frame() {
        let items = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        assert_eq!(select_frames(&items, &plan(4, true)), vec![3, 6, 9]);
        assert_eq!(select_frames(&items, &plan(4, false)), vec![0, 3, 6, 9]);
    }

    #[test]
    fn skip_first_on_full_set() {
        assert_eq!(select_frames(&[5, 6], &plan(2, true)), vec![6]);
        assert!(select_frames(&[5], &plan(1, true)).is_empty());
    }
}
