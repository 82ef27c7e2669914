//! Computation graph, backward edges and the reverse-mode driver.

pub mod back_function;
mod backward;
pub mod grad_check;
pub mod graph;
pub mod op;

pub use back_function::{accumulate, BackFunction, Contribution};
pub use graph::{Graph, Mode, TensorId};
pub use op::{Compare, Op, Reduce};
