use crate::oracle::Oracle;
use crate::types::MinimizeStats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction<T> {
    pub elements: Vec<T>,
    pub stats: MinimizeStats,
}

pub trait Minimizer {
    /// Shrinks `initial`, which the caller has already seen fail under
    /// `oracle`.
    fn minimize<T, O>(&self, initial: Vec<T>, oracle: &mut O) -> Result<Reduction<T>, O::Error>
    where
        T: Clone,
        O: Oracle<T>;
}
