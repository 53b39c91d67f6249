//! The indexing engine underneath a base-2 exponential histogram. The
//! aggregator side of the pipeline records raw f64 measurements and owns
//! the per-bucket counters; this crate answers the two questions it keeps
//! asking on the hot path:
//!
//!   * which bucket does this value fall into (`IndexMapping::map_to_index`)
//!   * where does a given bucket start (`IndexMapping::lower_boundary`)
//!
//! under a `scale` parameter that fixes the bucket growth factor at
//! `2^(2^-scale)`. Getting those answers exactly right for every finite
//! positive double, subnormals and 2^1023 included, is the entire point of
//! the crate. The frexp/log approach most histogram write-ups start from is
//! off by one at exact powers of two, which is precisely where the bucket
//! boundaries live, so everything here is done against the raw bit
//! representation instead.
//!
//! ```
//! use expo64::IndexMapping;
//!
//! let mapping = IndexMapping::new(0)?;
//! assert_eq!(mapping.map_to_index(3.0)?, 1); // (2, 4] is bucket 1
//! assert_eq!(mapping.lower_boundary(1)?, 2.0);
//! # Ok::<(), expo64::MappingError>(())
//! ```

mod bits;
mod mapping;

pub use mapping::{IndexMapping, MappingError, MAX_SCALE, MIN_SCALE};
