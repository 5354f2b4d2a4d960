/*!
 * Types and functions for working with clusters.
 *
 * Trace points are first labeled by a density based clustering of their positions. All the points
 * that share a label are then aggregated into a [FieldCluster], which describes one visit to a
 * field: where it was, how big it was, and how long the equipment stayed.
 */

pub use field::FieldCluster;
pub(crate) use field::minutes_between;
pub use field_list::FieldList;
pub use labels::{cluster_labels, ClusterLabel, NOISE};

mod field;
mod field_list;
mod labels;
