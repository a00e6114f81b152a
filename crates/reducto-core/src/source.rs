use crate::error::ReduceError;
use std::path::Path;

/// Reads and replaces the element sequence of one named unit inside a
/// container file, leaving the rest of the container untouched.
pub trait SourceAccessor {
    type Element: Clone;

    fn read_elements(
        &self,
        container: &Path,
        unit: &str,
    ) -> Result<Vec<Self::Element>, ReduceError>;

    /// Takes `container` as the template and writes it to `output` with the
    /// unit's elements replaced. `output` may equal `container`.
    fn write_elements(
        &self,
        container: &Path,
        output: &Path,
        unit: &str,
        elements: &[Self::Element],
    ) -> Result<(), ReduceError>;

    /// Name a test runner selects the unit by. Defaults to the bare unit name.
    fn qualified_name(&self, _container: &Path, unit: &str) -> Result<String, ReduceError> {
        Ok(unit.to_string())
    }
}
