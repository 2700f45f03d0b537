//! Data-generating processes.
//!
//! - [`did`]: two-period threshold-assignment worlds
//! - [`iv`]: randomized-instrument worlds with latent compliance types
//!
//! A generator is built from a scenario once (validation happens there) and
//! then maps a [`RandomStream`] to a dataset. Generation is pure apart from
//! consuming the stream: the same seed gives a bit-identical dataset.

pub mod did;
pub mod iv;

pub use did::{generate_did, DidGenerator};
pub use iv::{generate_iv, IvGenerator};

use crate::random::RandomStream;
use crate::types::Dataset;

/// A world that can be sampled repeatedly.
///
/// `Sync` so one generator can be shared by the parallel Monte Carlo workers.
pub trait DataGenerator: Sync {
    type Dataset: Dataset + Send;

    fn world(&self) -> &str;

    /// Ground truth the world was built with.
    fn true_effect(&self) -> f64;

    fn generate(&self, rng: &mut RandomStream) -> Self::Dataset;
}
