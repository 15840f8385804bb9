//! Row iteration that is parallel when the `parallel` feature is on.
//!
//! Index kernels iterate over `0..rows` with `into_par_iter()`. With the
//! default features that is rayon's parallel iterator. Building with
//! `cargo build -p s2ndvi-algorithms --no-default-features` drops rayon and
//! the same call becomes a plain `Range` iterator, so the kernels compile
//! unchanged and produce identical output.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
pub use sequential::IntoParallelIterator;

#[cfg(not(feature = "parallel"))]
mod sequential {
    use std::ops::Range;

    /// `into_par_iter()` for row ranges, run on the calling thread.
    pub trait IntoParallelIterator {
        type Iter: Iterator;

        fn into_par_iter(self) -> Self::Iter;
    }

    impl IntoParallelIterator for Range<usize> {
        type Iter = Range<usize>;

        fn into_par_iter(self) -> Self::Iter {
            self
        }
    }
}
