use crate::{
    geometry::{self, Coord},
    AreaConversion, ClusterLabel, TracePoint,
};
use chrono::{DateTime, Utc};

/**
 * The aggregate properties of all the trace points that share a cluster label.
 *
 * Each of these is a candidate visit to a field. The area is that of the convex hull of the
 * points, which approximates the worked part of the field.
 */
#[derive(Debug, Clone)]
pub struct FieldCluster {
    /// The cluster label shared by all the points.
    pub id: ClusterLabel,
    /// The points in the cluster in the order they were recorded. Never empty.
    pub points: Vec<TracePoint>,
    /// Vertices of the convex hull of the points, empty if there were fewer than 3 points.
    pub hull: Vec<Coord>,
    /// Area of the convex hull in square degrees.
    pub area_deg2: f64,
    /// Area of the convex hull in square meters.
    pub area_m2: f64,
    /// Area of the convex hull in gunthas.
    pub area_guntha: f64,
    /// Mean position of all the points in the cluster.
    pub centroid: Coord,
    /// Time of the earliest point.
    pub start: DateTime<Utc>,
    /// Time of the latest point.
    pub end: DateTime<Utc>,
    /// Time between the first and last points in minutes.
    pub duration_minutes: f64,
}

impl FieldCluster {
    /**
     * Aggregate the points with the same label into a cluster.
     *
     * #Arguments
     * id - the label shared by the points.
     * points - every point with that label, in recorded order.
     * conversion - used to turn the hull area into land units.
     *
     * #Returns
     * `None` if `points` is empty.
     */
    pub fn from_trace_points(
        id: ClusterLabel,
        points: Vec<TracePoint>,
        conversion: &AreaConversion,
    ) -> Option<Self> {
        let (start, end) = time_span(&points)?;

        let coords: Vec<Coord> = points.iter().map(|p| p.coord()).collect();
        let centroid = geometry::centroid(&coords)?;
        let hull = geometry::convex_hull(&coords);
        let area_deg2 = geometry::convex_hull_area(&coords);

        Some(FieldCluster {
            id,
            points,
            hull,
            area_deg2,
            area_m2: conversion.to_square_meters(area_deg2),
            area_guntha: conversion.to_guntha(area_deg2),
            centroid,
            start,
            end,
            duration_minutes: minutes_between(start, end),
        })
    }

    /**
     * The first point recorded in this cluster.
     *
     * # Panics
     * If `points` is empty. That never happens for a cluster made by
     * [from_trace_points](FieldCluster::from_trace_points), only for one put together by hand.
     */
    pub fn first_point(&self) -> &TracePoint {
        &self.points[0]
    }

    /**
     * The last point recorded in this cluster.
     *
     * # Panics
     * If `points` is empty, same as [first_point](FieldCluster::first_point).
     */
    pub fn last_point(&self) -> &TracePoint {
        &self.points[self.points.len() - 1]
    }
}

/// The earliest and latest timestamps, or `None` if there are no points.
fn time_span(points: &[TracePoint]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = points.iter().map(|p| p.timestamp).min()?;
    let end = points.iter().map(|p| p.timestamp).max()?;
    Some((start, end))
}

/// Signed elapsed time from `start` to `end` in minutes.
pub(crate) fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn pnt(lat: f64, lon: f64, minute: i64) -> TracePoint {
        TracePoint::new(
            lat,
            lon,
            Utc.timestamp_millis_opt(1_600_000_000_000 + minute * 60_000)
                .unwrap(),
        )
    }

    #[test]
    fn test_empty_is_none() {
        assert!(FieldCluster::from_trace_points(0, vec![], &AreaConversion::default()).is_none());
    }

    #[test]
    fn test_square_field() {
        let side = 0.0003;
        let pnts = vec![
            pnt(18.0, 73.0, 5),
            pnt(18.0, 73.0 + side, 3),
            pnt(18.0 + side, 73.0 + side, 9),
            pnt(18.0 + side, 73.0, 7),
        ];

        let field = FieldCluster::from_trace_points(4, pnts, &AreaConversion::default()).unwrap();

        assert_eq!(field.id, 4);
        assert_eq!(field.hull.len(), 4);
        assert!((field.area_deg2 - 9.0e-8).abs() < 1.0e-14);
        assert!((field.area_m2 - 853.85).abs() < 0.1);
        assert!((field.area_guntha - 8.44).abs() < 0.01);
        assert!((field.area_guntha - field.area_m2 / 101.17).abs() < 1.0e-9);

        // Times are not in order, start and end are the min and max.
        assert_eq!(field.start, pnt(0.0, 0.0, 3).timestamp);
        assert_eq!(field.end, pnt(0.0, 0.0, 9).timestamp);
        assert!((field.duration_minutes - 6.0).abs() < 1.0e-12);

        // First and last are in recorded order, not time order.
        assert_eq!(field.first_point().timestamp, pnt(0.0, 0.0, 5).timestamp);
        assert_eq!(field.last_point().timestamp, pnt(0.0, 0.0, 7).timestamp);

        let expected = Coord {
            lat: 18.0 + side / 2.0,
            lon: 73.0 + side / 2.0,
        };
        assert!(field.centroid.is_close(expected, 1.0e-12));
    }

    #[test]
    fn test_small_cluster_has_no_area() {
        let pnts = vec![pnt(18.0, 73.0, 0), pnt(18.1, 73.1, 1)];
        let field = FieldCluster::from_trace_points(0, pnts, &AreaConversion::default()).unwrap();

        assert!(field.hull.is_empty());
        assert_eq!(field.area_deg2, 0.0);
        assert_eq!(field.area_guntha, 0.0);
        assert!((field.duration_minutes - 1.0).abs() < 1.0e-12);
    }

    #[test]
    #[should_panic]
    fn test_hand_built_empty_cluster_has_no_first_point() {
        let mut field =
            FieldCluster::from_trace_points(0, vec![pnt(1.0, 2.0, 0)], &AreaConversion::default())
                .unwrap();
        field.points.clear();
        field.first_point();
    }

    #[test]
    fn test_single_point_has_zero_duration() {
        let field =
            FieldCluster::from_trace_points(2, vec![pnt(1.0, 2.0, 10)], &AreaConversion::default())
                .unwrap();
        assert_eq!(field.duration_minutes, 0.0);
        assert_eq!(field.start, field.end);
        assert!(field.centroid.is_close(Coord { lat: 1.0, lon: 2.0 }, 1.0e-12));
    }
}
