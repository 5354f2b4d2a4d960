use crate::{AreaConversion, ClusterLabel, FieldCluster, TracePoint, NOISE};
use std::collections::BTreeMap;

/**
 * A list of [FieldCluster] objects ordered by ascending cluster id.
 *
 * Cluster ids are opaque labels, so this ordering is the one stable order the rest of the
 * pipeline relies on when it pairs up consecutive fields.
 */
#[derive(Debug, Clone, Default)]
pub struct FieldList(Vec<FieldCluster>);

impl From<Vec<FieldCluster>> for FieldList {
    fn from(mut fields: Vec<FieldCluster>) -> Self {
        fields.sort_by_key(|f| f.id);
        FieldList(fields)
    }
}

impl FieldList {
    /**
     * Group labeled trace points into clusters.
     *
     * Points labeled [NOISE] are skipped. Within each cluster the points keep their recorded order.
     *
     * #Arguments
     * points - the trace in recorded order.
     * labels - one label per point, as produced by [cluster_labels](crate::cluster_labels).
     * conversion - used to turn hull areas into land units.
     */
    pub fn from_labeled_points(
        points: &[TracePoint],
        labels: &[ClusterLabel],
        conversion: &AreaConversion,
    ) -> Self {
        debug_assert_eq!(points.len(), labels.len());

        let mut groups: BTreeMap<ClusterLabel, Vec<TracePoint>> = BTreeMap::new();
        for (pnt, &label) in points.iter().zip(labels) {
            if label == NOISE {
                continue;
            }
            groups.entry(label).or_default().push(*pnt);
        }

        let fields = groups
            .into_iter()
            .filter_map(|(id, pnts)| FieldCluster::from_trace_points(id, pnts, conversion))
            .collect();

        FieldList(fields)
    }

    /**
     * Separate the clusters big enough to count as fields from the rest.
     *
     * A cluster is kept if its area is at least `min_area_guntha`. Both lists keep the ascending id
     * order. Since each cluster carries all of its own metrics, removing one removes all of them.
     *
     * #Returns
     * A tuple of (kept, rejected).
     */
    pub fn split_by_area(self, min_area_guntha: f64) -> (FieldList, FieldList) {
        let (kept, rejected): (Vec<_>, Vec<_>) = self
            .0
            .into_iter()
            .partition(|f| f.area_guntha >= min_area_guntha);

        (FieldList(kept), FieldList(rejected))
    }

    /// Get the number of fields in the list.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Is the list empty?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get an iterator over the fields.
    pub fn iter(&self) -> impl Iterator<Item = &FieldCluster> {
        self.0.iter()
    }

    /// View the fields as a slice.
    pub fn as_slice(&self) -> &[FieldCluster] {
        &self.0
    }

    /// Consume the list and get the underlying vector.
    pub fn into_vec(self) -> Vec<FieldCluster> {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn pnt(lat: f64, lon: f64, minute: i64) -> TracePoint {
        TracePoint::new(lat, lon, Utc.timestamp_millis_opt(minute * 60_000).unwrap())
    }

    fn square(lat: f64, lon: f64, side: f64, minute: i64) -> Vec<TracePoint> {
        vec![
            pnt(lat, lon, minute),
            pnt(lat, lon + side, minute + 1),
            pnt(lat + side, lon + side, minute + 2),
            pnt(lat + side, lon, minute + 3),
        ]
    }

    #[test]
    fn test_grouping_orders_by_id_and_skips_noise() {
        let mut pnts = square(0.0, 0.0, 0.001, 0);
        pnts.push(pnt(5.0, 5.0, 4));
        pnts.extend(square(1.0, 1.0, 0.001, 5));

        // Labels deliberately not ascending in trace order.
        let labels = vec![7, 7, 7, 7, NOISE, 2, 2, 2, 2];

        let fields = FieldList::from_labeled_points(&pnts, &labels, &AreaConversion::default());
        assert_eq!(fields.len(), 2);

        let ids: Vec<_> = fields.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 7]);

        assert_eq!(fields.as_slice()[0].points[0].lat, 1.0);
        assert_eq!(fields.as_slice()[1].points[0].lat, 0.0);
        assert!(fields.iter().all(|f| f.points.len() == 4));
    }

    #[test]
    fn test_split_keeps_metrics_together() {
        // Label 0 is small, label 1 is big, label 2 is small again.
        let mut pnts = square(0.0, 0.0, 0.0001, 0);
        pnts.extend(square(1.0, 1.0, 0.0003, 10));
        pnts.extend(square(2.0, 2.0, 0.0001, 20));
        let labels = vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2];

        let fields = FieldList::from_labeled_points(&pnts, &labels, &AreaConversion::default());
        let (kept, rejected) = fields.split_by_area(5.0);

        assert_eq!(kept.len(), 1);
        let big = &kept.as_slice()[0];
        assert_eq!(big.id, 1);
        assert!((big.area_guntha - 8.44).abs() < 0.01);
        assert_eq!(big.start, pnt(0.0, 0.0, 10).timestamp);
        assert_eq!(big.end, pnt(0.0, 0.0, 13).timestamp);
        assert!((big.duration_minutes - 3.0).abs() < 1.0e-12);

        let rejected_ids: Vec<_> = rejected.iter().map(|f| f.id).collect();
        assert_eq!(rejected_ids, vec![0, 2]);
        assert!(rejected.iter().all(|f| f.area_guntha < 5.0));
    }

    #[test]
    fn test_empty() {
        let fields = FieldList::from_labeled_points(&[], &[], &AreaConversion::default());
        assert!(fields.is_empty());

        let (kept, rejected) = fields.split_by_area(5.0);
        assert!(kept.is_empty());
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_from_vec_sorts() {
        let conv = AreaConversion::default();
        let a = FieldCluster::from_trace_points(3, square(0.0, 0.0, 0.001, 0), &conv).unwrap();
        let b = FieldCluster::from_trace_points(1, square(1.0, 1.0, 0.001, 0), &conv).unwrap();

        let list = FieldList::from(vec![a, b]);
        let ids: Vec<_> = list.into_vec().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
