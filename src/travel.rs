/*!
 * Travel between consecutive field visits.
 */

use crate::{cluster::minutes_between, geometry, ClusterLabel, FieldCluster};

/**
 * The inferred trip from the end of one field visit to the start of the next.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelSegment {
    /// The field the trip started from.
    pub from_id: ClusterLabel,
    /// The field the trip ended at.
    pub to_id: ClusterLabel,
    /// Distance on the WGS-84 ellipsoid from the last point recorded in the `from` field to the
    /// first point recorded in the `to` field.
    pub distance_km: f64,
    /// Time from the end of the `from` visit to the start of the `to` visit. This can be negative
    /// if the visits overlap in time.
    pub time_minutes: f64,
}

/**
 * Calculate the travel between each pair of consecutive fields.
 *
 * #Arguments
 * fields - the surviving fields in ascending id order.
 *
 * #Returns
 * Exactly `fields.len() - 1` segments, segment `i` starts at field `i`. Fewer than two fields gives
 * no segments.
 */
pub fn travel_segments(fields: &[FieldCluster]) -> Vec<TravelSegment> {
    fields
        .windows(2)
        .map(|pair| {
            let (from, to) = (&pair[0], &pair[1]);

            TravelSegment {
                from_id: from.id,
                to_id: to.id,
                distance_km: geometry::geodesic_distance_km(
                    from.last_point().coord(),
                    to.first_point().coord(),
                ),
                time_minutes: minutes_between(from.end, to.start),
            }
        })
        .collect()
}
