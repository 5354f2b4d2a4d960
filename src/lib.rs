pub use cluster::{cluster_labels, ClusterLabel, FieldCluster, FieldList, NOISE};
pub use config::{AreaConversion, PipelineConfig};
pub use error::{FieldTraceError, FieldTraceResult, SchemaError};
pub use geometry::{
    centroid, convex_hull, convex_hull_area, densify_ring, geodesic_distance_km, mean_center,
    Coord,
};
pub use kml::{KmlFile, KmlWriter};
pub use pipeline::FieldAnalysis;
pub use report::{Report, ReportColumn, ReportRow, Totals};
pub use trace::{read_trace, read_trace_from, REQUIRED_COLUMNS};
pub use tracepoint::TracePoint;
pub use travel::{travel_segments, TravelSegment};

/**************************************************************************************************
 * Private Implementation
 *************************************************************************************************/
mod cluster;
mod config;
mod error;
mod geometry;
mod kml;
mod pipeline;
mod report;
mod trace;
mod tracepoint;
mod travel;
