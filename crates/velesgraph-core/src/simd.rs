//! Explicit SIMD kernels built on the `wide` crate.
//!
//! Every refinement pass is dominated by distance evaluations, so the kernels
//! process eight lanes per step with fused multiply-add and finish the tail
//! scalar. `wide` selects AVX2/SSE/NEON/SIMD128 at compile time and falls
//! back to scalar code elsewhere.

use wide::f32x8;

const LANES: usize = 8;

/// Squared L2 distance.
///
/// # Panics
///
/// Panics if the slices have different lengths.
#[inline]
#[must_use]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let chunks = a.len() / LANES;
    let mut acc = f32x8::ZERO;

    for i in 0..chunks {
        let offset = i * LANES;
        let va = f32x8::from(&a[offset..offset + LANES]);
        let vb = f32x8::from(&b[offset..offset + LANES]);
        let diff = va - vb;
        acc = diff.mul_add(diff, acc);
    }

    let mut result = acc.reduce_add();
    for i in chunks * LANES..a.len() {
        let diff = a[i] - b[i];
        result += diff * diff;
    }
    result
}

/// L2 distance, `sqrt(squared_l2(a, b))`.
///
/// # Panics
///
/// Panics if the slices have different lengths.
#[inline]
#[must_use]
pub fn l2(a: &[f32], b: &[f32]) -> f32 {
    squared_l2(a, b).sqrt()
}

/// Inner product.
///
/// # Panics
///
/// Panics if the slices have different lengths.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let chunks = a.len() / LANES;
    let mut acc = f32x8::ZERO;

    for i in 0..chunks {
        let offset = i * LANES;
        let va = f32x8::from(&a[offset..offset + LANES]);
        let vb = f32x8::from(&b[offset..offset + LANES]);
        acc = va.mul_add(vb, acc);
    }

    let mut result = acc.reduce_add();
    for i in chunks * LANES..a.len() {
        result += a[i] * b[i];
    }
    result
}

/// Cosine similarity in a single fused pass over both vectors.
///
/// Returns 0 when either vector has zero norm.
///
/// # Panics
///
/// Panics if the slices have different lengths.
#[inline]
#[must_use]
#[allow(clippy::similar_names)]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let chunks = a.len() / LANES;
    let mut dot_acc = f32x8::ZERO;
    let mut norm_a_acc = f32x8::ZERO;
    let mut norm_b_acc = f32x8::ZERO;

    for i in 0..chunks {
        let offset = i * LANES;
        let va = f32x8::from(&a[offset..offset + LANES]);
        let vb = f32x8::from(&b[offset..offset + LANES]);
        dot_acc = va.mul_add(vb, dot_acc);
        norm_a_acc = va.mul_add(va, norm_a_acc);
        norm_b_acc = vb.mul_add(vb, norm_b_acc);
    }

    let mut dot = dot_acc.reduce_add();
    let mut norm_a_sq = norm_a_acc.reduce_add();
    let mut norm_b_sq = norm_b_acc.reduce_add();

    for i in chunks * LANES..a.len() {
        dot += a[i] * b[i];
        norm_a_sq += a[i] * a[i];
        norm_b_sq += b[i] * b[i];
    }

    let norm = norm_a_sq.sqrt() * norm_b_sq.sqrt();
    if norm == 0.0 {
        return 0.0;
    }
    dot / norm
}
