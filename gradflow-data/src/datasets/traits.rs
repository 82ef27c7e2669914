use gradflow_core::Result;

/// A collection of samples addressable by index.
///
/// Items are `Send + 'static` so datasets can feed batches to worker
/// threads.
pub trait Dataset {
    type Item: Send + 'static;

    /// Returns the sample at `index`, or `IndexOutOfBounds`.
    fn get(&self, index: usize) -> Result<Self::Item>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
