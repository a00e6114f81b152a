use crate::types::Verdict;
use std::convert::Infallible;

/// Judges whether a candidate still reproduces the failure.
///
/// Anything short of a confirmed reproduction must come back as
/// `Ok(Verdict::Pass)`. `Err` is reserved for failures of the evaluation
/// machinery itself (staging, locking, spawning) and stops the search.
pub trait Oracle<T> {
    type Error;

    fn evaluate(&mut self, candidate: &[T]) -> Result<Verdict, Self::Error>;
}

impl<T, F> Oracle<T> for F
where
    F: FnMut(&[T]) -> Verdict,
{
    type Error = Infallible;

    fn evaluate(&mut self, candidate: &[T]) -> Result<Verdict, Self::Error> {
        Ok(self(candidate))
    }
}
