//! Flattened `(l, m, n)` spectral indexing.
//!
//! Coefficients of a bandwidth-`b` function on SO(3) are laid out degree by
//! degree. Degree `l` owns a `(2l+1) × (2l+1)` block, row `m`, column `n`,
//! both running over `-l..=l`:
//!
//! ```text
//! index(l, m, n) = offset(l) + (m + l)(2l + 1) + (n + l)
//! offset(l)      = Σ_{k<l} (2k+1)² = l(4l² - 1)/3
//! nspec(b)       = offset(b)
//! ```

/// Number of spectral coefficients for bandwidth `b` (degrees `0..b`).
pub const fn nspec(b: usize) -> usize {
    (4 * b * b * b - b) / 3
}

/// Position of the first coefficient of degree `l`.
pub const fn degree_offset(l: usize) -> usize {
    nspec(l)
}

/// Width of the degree-`l` block along one order axis.
pub const fn degree_width(l: usize) -> usize {
    2 * l + 1
}

/// Flat index of `(l, m, n)`.
///
/// # Panics
///
/// Panics if `|m| > l` or `|n| > l`.
pub fn spectral_index(l: usize, m: i64, n: i64) -> usize {
    let li = l as i64;
    assert!(
        m.abs() <= li && n.abs() <= li,
        "order ({}, {}) out of range for degree {}",
        m,
        n,
        l
    );
    degree_offset(l) + ((m + li) as usize) * degree_width(l) + (n + li) as usize
}

/// Recover the bandwidth from a spectral length, if it is one.
pub fn bandwidth_from_nspec(len: usize) -> Option<usize> {
    let mut b = 0;
    while nspec(b) < len {
        b += 1;
    }
    (nspec(b) == len).then_some(b)
}

/// Iterate all `(l, m, n)` of bandwidth `b` in storage order.
pub fn spectral_indices(b: usize) -> impl Iterator<Item = (usize, i64, i64)> {
    (0..b).flat_map(|l| {
        let li = l as i64;
        (-li..=li).flat_map(move |m| (-li..=li).map(move |n| (l, m, n)))
    })
}
