//! The bucket indexing core for base-2 exponential histograms. Boundaries
//! are located at powers of the base, where:
//!
//!   base = 2 ^ (2 ^ -scale)
//!
//! so bucket `i` covers the interval `(base^i, base^(i+1)]`. The histogram
//! aggregator owns the per-bucket counters and the rescale policy; this
//! module owns the deterministic value -> index and index -> boundary maps
//! it leans on. Naive `log2(value) * 2^scale` float math is nowhere near
//! exact enough at bucket boundaries (an exact power of two must land in
//! the bucket *below* its own boundary), so both directions are built on
//! the raw double representation from [`crate::bits`].

use crate::bits;

/// The finest supported resolution, about a 0.00007% bucket growth factor.
pub const MAX_SCALE: i32 = 20;
/// The coarsest supported resolution. At -11 a single bucket swallows 2048
/// binary exponents, so two buckets cover the entire f64 range.
pub const MIN_SCALE: i32 = -11;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum MappingError {
    /// The requested scale is outside the band this indexer supports.
    #[error("scale {scale} is outside the supported range {MIN_SCALE}..={MAX_SCALE}")]
    ScaleOutOfRange {
        /// The rejected scale.
        scale: i32,
    },

    /// Only positive finite magnitudes have a bucket. The aggregator is
    /// expected to strip signs and route zero/NaN/infinite measurements
    /// elsewhere before indexing.
    #[error("value {value} is not a positive finite magnitude")]
    ValueOutOfDomain {
        /// The rejected measurement.
        value: f64,
    },

    /// The requested bucket boundary falls outside the exponent range a
    /// finite double can represent.
    #[error("index {index} has no representable boundary at scale {scale}")]
    IndexOutOfRange {
        /// The rejected bucket index.
        index: i32,
        /// The scale the mapping was built with.
        scale: i32,
    },
}

/// The per-call strategy, fixed at construction by the sign of the scale so
/// the hot path never re-derives which regime it is in.
#[derive(Debug, Clone, Copy)]
enum Regime {
    /// scale <= 0: each bucket spans 2^(-scale) whole binary exponents and
    /// the mantissa carries no information the index can use.
    Exponent { shift: u32 },
    /// scale > 0: each binary exponent splits into 2^scale log2-evenly
    /// spaced sub-buckets resolved from the significand.
    SubBucket {
        scale: u32,
        /// 2^scale, the number of sub-buckets per binary exponent.
        count: i64,
        /// 2^scale as a double, the multiplier taking log2 space to index
        /// space.
        count_f64: f64,
        /// 2^-scale, the width of one sub-bucket in log2 space.
        inv_count: f64,
    },
}

/// A fixed-scale bucket indexer. Immutable once constructed: every method
/// is a pure function of its arguments plus the scale-derived constants
/// precomputed here, so a single instance can be shared across threads
/// freely.
#[derive(Debug, Clone, Copy)]
pub struct IndexMapping {
    scale: i32,
    regime: Regime,
    min_index: i32,
    max_index: i32,
}

impl IndexMapping {
    /// Build a mapping for the given scale, or fail with a configuration
    /// error when the scale is outside [`MIN_SCALE`]..=[`MAX_SCALE`].
    pub fn new(scale: i32) -> Result<Self, MappingError> {
        if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
            return Err(MappingError::ScaleOutOfRange { scale });
        }
        let regime = if scale <= 0 {
            Regime::Exponent {
                shift: (-scale) as u32,
            }
        } else {
            let count = 1i64 << scale;
            Regime::SubBucket {
                scale: scale as u32,
                count,
                count_f64: count as f64,
                inv_count: bits::scale_by_exp2(1.0, -scale),
            }
        };
        // The smallest positive subnormal is an exact power of two, so it
        // takes the power-of-two decrement in both regimes. f64::MAX sits
        // in the last sub-bucket of the top binary exponent.
        let (min_index, max_index) = match regime {
            Regime::Exponent { shift } => (
                ((bits::MIN_SUBNORMAL_EXPONENT - 1) >> shift) as i32,
                (bits::MAX_EXPONENT >> shift) as i32,
            ),
            Regime::SubBucket { scale, count, .. } => (
                ((bits::MIN_SUBNORMAL_EXPONENT << scale) - 1) as i32,
                ((bits::MAX_EXPONENT << scale) + count - 1) as i32,
            ),
        };
        tracing::debug!(
            message = "constructed index mapping",
            scale,
            min_index,
            max_index
        );
        Ok(Self {
            scale,
            regime,
            min_index,
            max_index,
        })
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// The index of the bucket holding the smallest positive subnormal.
    pub fn min_index(&self) -> i32 {
        self.min_index
    }

    /// The index of the bucket holding the largest finite double.
    pub fn max_index(&self) -> i32 {
        self.max_index
    }

    /// Map a positive finite magnitude to its bucket index. A value exactly
    /// on a bucket boundary belongs to the bucket below the boundary.
    pub fn map_to_index(&self, value: f64) -> Result<i32, MappingError> {
        if !bits::is_finite(value) || value <= 0.0 {
            tracing::error!(message = "unmappable measurement", value);
            return Err(MappingError::ValueOutOfDomain { value });
        }
        let (exponent, fraction) = bits::decompose(value);
        let index = match self.regime {
            Regime::Exponent { shift } => {
                // An exact power of two is its own boundary and drops into
                // the bucket below; the arithmetic shift then truncates
                // toward negative infinity for subnormal exponents.
                let adjusted = if fraction == 0 { exponent - 1 } else { exponent };
                adjusted >> shift
            }
            Regime::SubBucket {
                scale,
                count,
                count_f64,
                inv_count,
            } => {
                let significand =
                    f64::from_bits(((bits::EXPONENT_BIAS as u64) << bits::MANTISSA_BITS) | fraction);
                (exponent << scale) + sub_bucket(significand, count, count_f64, inv_count)
            }
        };
        Ok(index as i32)
    }

    /// The value `base^index`: the exclusive lower edge of bucket `index`
    /// and, equally, the inclusive upper edge of bucket `index - 1`.
    ///
    /// The lowest bucket's true edge sits below the subnormal floor and
    /// comes back as the smallest positive subnormal rather than rounding
    /// to zero. Indices outside `min_index..=max_index` have no finite
    /// boundary and are a domain error.
    pub fn lower_boundary(&self, index: i32) -> Result<f64, MappingError> {
        if index < self.min_index || index > self.max_index {
            tracing::error!(message = "bucket index out of range", index, scale = self.scale);
            return Err(MappingError::IndexOutOfRange {
                index,
                scale: self.scale,
            });
        }
        let index = index as i64;
        let boundary = match self.regime {
            Regime::Exponent { shift } => {
                let exponent = index << shift;
                if exponent < bits::MIN_SUBNORMAL_EXPONENT {
                    f64::from_bits(1)
                } else {
                    bits::scale_by_exp2(1.0, exponent as i32)
                }
            }
            Regime::SubBucket {
                scale,
                count,
                inv_count,
                ..
            } => {
                // Split index/2^scale into a whole binary exponent and a
                // fractional remainder. The fractional factor lands in
                // [1, 2) with a single rounding and the exponent is folded
                // in by exact bit construction, so no error accumulates
                // across the 2000-odd binary orders of magnitude involved.
                let quotient = index >> scale;
                let remainder = bits::positive_rem(index, count);
                let fractional = sub_boundary(remainder, inv_count);
                bits::scale_by_exp2(fractional, quotient as i32)
            }
        };
        Ok(boundary)
    }
}

/// Locate the sub-bucket of a significand in [1, 2). The log2 estimate is
/// only trusted away from boundaries; the call is settled by comparing the
/// significand against the same reconstructed boundaries [`sub_boundary`]
/// hands to `lower_boundary`, so the two directions can never disagree
/// about which side of a boundary a representable value sits on. A
/// significand exactly on a boundary (an exact power of the base) falls
/// through the `<=` comparison into the sub-bucket below, which also
/// yields the power-of-two decrement for sub-bucket -1.
fn sub_bucket(significand: f64, count: i64, count_f64: f64, inv_count: f64) -> i64 {
    let estimate = ((significand.log2() * count_f64) as i64).min(count - 1);
    if significand <= sub_boundary(estimate, inv_count) {
        estimate - 1
    } else if estimate + 1 < count && significand > sub_boundary(estimate + 1, inv_count) {
        estimate + 1
    } else {
        estimate
    }
}

/// The lower edge of sub-bucket `sub` as a significand in [1, 2):
/// 2^(sub / 2^scale) in one rounding. `sub * inv_count` is exact because
/// `sub` has at most `scale` significant bits and `inv_count` is a power
/// of two.
fn sub_boundary(sub: i64, inv_count: f64) -> f64 {
    (sub as f64 * inv_count).exp2()
}
