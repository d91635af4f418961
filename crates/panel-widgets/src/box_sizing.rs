//! The box-sizing algorithm `SplitLayout` (and the plain `PanelLayout`)
//! drive to turn per-item `(min, max, sizeHint, stretch, expansive)`
//! tuples into pixel sizes along one axis (spec §4.5).
//!
//! Kept as a standalone, dependency-free module so it can be unit-tested
//! without a `DomDriver` or a widget tree in play at all.

use crate::layout::SizeLimits;

/// Total space consumed by the handles/sashes between `item_count`
/// items: `(item_count.saturating_sub(1)) * handle_size` — one handle
/// between each adjacent pair, none on the outer edges.
pub fn handle_space(item_count: usize, handle_size: i32) -> i32 {
    if item_count == 0 {
        0
    } else {
        (item_count as i32 - 1) * handle_size
    }
}

/// Compute pixel sizes for `items` given `available` total length along
/// the split's axis and `handle_size`.
///
/// The content length (`available` minus handle space) is distributed
/// among items proportionally to `stretch` (a largest-remainder split so
/// the sizes always sum exactly to the content length), each item's
/// share clamped to `[min, max]`. Any size removed by clamping is
/// redistributed among the remaining not-yet-clamped stretch items,
/// iterating until nothing more gets clamped (spec §4.5 steps 1-3: the
/// clamp-then-redistribute loop *is* "distribute proportionally...among
/// items not yet saturated at their bound"). Items with `stretch == 0`
/// are fixed at their `size_hint` (clamped) throughout. Leftover space
/// once every stretch item is saturated goes to `expansive` items
/// equally, capped at their `max` (step 4).
pub fn compute_sizes(available: i32, items: &[SizeLimits], handle_size: i32) -> Vec<i32> {
    if items.is_empty() {
        return Vec::new();
    }

    let content = (available - handle_space(items.len(), handle_size)).max(0);

    let mut sizes = vec![0i32; items.len()];
    let mut fixed = vec![false; items.len()];

    for (i, item) in items.iter().enumerate() {
        if item.stretch <= 0 {
            sizes[i] = item.size_hint.clamp(item.min, item.max.max(item.min));
            fixed[i] = true;
        }
    }

    let fixed_sum: i32 = (0..items.len()).filter(|&i| fixed[i]).map(|i| sizes[i]).sum();
    let mut remaining = content - fixed_sum;

    // Clamp-then-redistribute: each round, split `remaining` among the
    // still-unfixed items by stretch ratio; any item whose share falls
    // outside its bound is pinned there and removed from the next
    // round's pool. Bounded by `len` rounds — each round pins at least
    // one more item or the loop breaks outright.
    for _ in 0..items.len() {
        let active: Vec<usize> = (0..items.len()).filter(|&i| !fixed[i]).collect();
        if active.is_empty() {
            break;
        }
        let total_stretch: i32 = active.iter().map(|&i| items[i].stretch).sum();
        if total_stretch <= 0 {
            break;
        }

        let shares = largest_remainder_split(remaining, active.iter().map(|&i| items[i].stretch));

        let mut any_newly_fixed = false;
        for (k, &i) in active.iter().enumerate() {
            let candidate = shares[k];
            let clamped = candidate.clamp(items[i].min, items[i].max.max(items[i].min));
            if clamped != candidate {
                sizes[i] = clamped;
                fixed[i] = true;
                any_newly_fixed = true;
            } else {
                sizes[i] = candidate;
            }
        }

        if !any_newly_fixed {
            break;
        }
        let fixed_sum: i32 = (0..items.len()).filter(|&i| fixed[i]).map(|i| sizes[i]).sum();
        remaining = (content - fixed_sum).max(0);
    }

    // Step 4: anything still unabsorbed (every stretch item pinned at a
    // bound) goes to expansive items equally, capped at their max.
    let absorbed: i32 = sizes.iter().sum();
    let mut slack = content - absorbed;
    if slack > 0 {
        let expansive_idx: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, it)| it.expansive)
            .map(|(i, _)| i)
            .collect();
        if !expansive_idx.is_empty() {
            let shares = largest_remainder_split(slack, expansive_idx.iter().map(|_| 1));
            for (k, &i) in expansive_idx.iter().enumerate() {
                let room = items[i].max - sizes[i];
                let applied = shares[k].min(room).max(0);
                sizes[i] += applied;
                slack -= applied;
            }
        }
    }

    sizes
}

/// Split `total` among entries weighted by `weights`, rounding each
/// share down and handing the leftover units to the entries with the
/// largest fractional remainder (ties broken by earliest index) so the
/// result always sums to exactly `total`.
fn largest_remainder_split(total: i32, weights: impl Iterator<Item = i32>) -> Vec<i32> {
    let weights: Vec<i32> = weights.collect();
    let total_weight: i64 = weights.iter().map(|&w| w as i64).sum();
    if total_weight <= 0 {
        return vec![0; weights.len()];
    }

    let mut shares = Vec::with_capacity(weights.len());
    let mut fracs = Vec::with_capacity(weights.len());
    for &w in &weights {
        let num = total as i64 * w as i64;
        shares.push((num / total_weight) as i32);
        fracs.push(num.rem_euclid(total_weight));
    }

    let assigned: i32 = shares.iter().sum();
    let mut leftover = total - assigned;

    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| fracs[b].cmp(&fracs[a]));
    for &k in &order {
        if leftover <= 0 {
            break;
        }
        shares[k] += 1;
        leftover -= 1;
    }

    shares
}

/// Move the handle between item `index` and item `index + 1` by `delta`
/// pixels, clamping so neither side leaves its `[min, max]` bound, then
/// renormalize every item's `stretch` to be proportional to its
/// resulting pixel size — the "renormalizes stretch factors so the
/// layout is stable across subsequent resizes" clause of spec §4.5 step
/// 5: a later `compute_sizes` call reproduces the dragged ratio exactly
/// until the next drag.
pub fn drag_handle(sizes: &mut [i32], items: &mut [SizeLimits], index: usize, delta: i32) {
    assert!(index + 1 < sizes.len(), "handle index out of range");

    let left_room_grow = items[index].max - sizes[index];
    let left_room_shrink = sizes[index] - items[index].min;
    let right_room_grow = items[index + 1].max - sizes[index + 1];
    let right_room_shrink = sizes[index + 1] - items[index + 1].min;

    let clamped_delta = if delta >= 0 {
        delta.min(left_room_grow).min(right_room_shrink)
    } else {
        delta.max(-left_room_shrink).max(-right_room_grow)
    };

    sizes[index] += clamped_delta;
    sizes[index + 1] -= clamped_delta;

    renormalize_stretch(sizes, items);
}

/// Set every item's `stretch` proportional to its current pixel size,
/// scaled down by the sizes' GCD so stretch factors stay small integers.
/// An item collapsed to `0px` gets `stretch = 0`, dropping it out of
/// future proportional splits until it is resized open again.
fn renormalize_stretch(sizes: &[i32], items: &mut [SizeLimits]) {
    let gcd_all = sizes.iter().copied().filter(|&s| s > 0).fold(0, gcd);
    let divisor = gcd_all.max(1);
    for (item, &size) in items.iter_mut().zip(sizes) {
        item.stretch = size / divisor;
    }
}

fn gcd(a: i32, b: i32) -> i32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(min: i32, max: i32, size_hint: i32, stretch: i32) -> SizeLimits {
        SizeLimits {
            min,
            max,
            size_hint,
            stretch,
            expansive: false,
        }
    }

    /// Spec §8 scenario 4: stretch `[1,1,2]`, min `50` each, unbounded
    /// max, handle size `3`, content width `400` (two handles between
    /// three items, so total width `406`; see `DESIGN.md` for why this
    /// total differs from the scenario's literal `403`).
    #[test]
    fn matches_spec_scenario_4_initial_layout() {
        let items = vec![
            item(50, i32::MAX, 0, 1),
            item(50, i32::MAX, 0, 1),
            item(50, i32::MAX, 0, 2),
        ];
        let sizes = compute_sizes(406, &items, 3);
        assert_eq!(sizes, vec![100, 100, 200]);
    }

    #[test]
    fn drag_then_resize_matches_spec_scenario_4() {
        let mut items = vec![
            item(50, i32::MAX, 0, 1),
            item(50, i32::MAX, 0, 1),
            item(50, i32::MAX, 0, 2),
        ];
        let mut sizes = compute_sizes(406, &items, 3);
        assert_eq!(sizes, vec![100, 100, 200]);

        drag_handle(&mut sizes, &mut items, 0, 25);
        assert_eq!(sizes, vec![125, 75, 200]);

        let resized = compute_sizes(806, &items, 3);
        assert_eq!(resized, vec![250, 150, 400]);
    }

    #[test]
    fn shrink_respects_min_bounds() {
        let items = vec![item(50, i32::MAX, 300, 1), item(50, i32::MAX, 300, 1)];
        let sizes = compute_sizes(60, &items, 0);
        assert_eq!(sizes, vec![50, 50]);
    }

    #[test]
    fn zero_stretch_items_stay_at_their_size_hint() {
        let items = vec![item(0, i32::MAX, 40, 0), item(0, i32::MAX, 0, 1)];
        let sizes = compute_sizes(140, &items, 0);
        assert_eq!(sizes, vec![40, 100]);
    }

    #[test]
    fn drag_clamps_at_neighbor_min_size() {
        let mut items = vec![item(50, i32::MAX, 100, 1), item(50, i32::MAX, 100, 1)];
        let mut sizes = vec![100, 100];
        drag_handle(&mut sizes, &mut items, 0, 1000);
        assert_eq!(sizes, vec![150, 50], "right neighbor cannot shrink below its min");
    }

    #[test]
    fn sizes_always_sum_to_content_length_when_unconstrained() {
        let items = vec![
            item(0, i32::MAX, 0, 3),
            item(0, i32::MAX, 0, 7),
            item(0, i32::MAX, 0, 5),
        ];
        let handle_size = 4;
        let available = 1000;
        let sizes = compute_sizes(available, &items, handle_size);
        assert_eq!(sizes.iter().sum::<i32>(), available - handle_space(3, handle_size));
    }
}
