use crate::TracePoint;
use rustc_hash::FxHashMap;

/// Opaque identifier of a cluster, only meaningful within a single pipeline run.
pub type ClusterLabel = i32;

/// The label given to points that aren't dense enough to be part of any cluster.
pub const NOISE: ClusterLabel = -1;

/**
 * Label each point with the cluster it belongs to using DBSCAN.
 *
 * A point is a core point if at least `min_points` points, itself included, are within `eps` of
 * it. Distance is the Euclidean distance in degree space, so `eps` is in degrees. Core points
 * that are within `eps` of each other end up in the same cluster, other points within `eps` of a
 * core point are border points of that cluster, and everything else is [NOISE].
 *
 * A point with a non-finite coordinate is never within `eps` of anything, so it is always noise.
 *
 * Clusters are numbered from 0 in the order their first core point appears in the input. A border
 * point that is reachable from more than one cluster goes to the one numbered first. The result
 * only depends on the order of the input and the parameters.
 *
 * #Arguments
 * points - the trace in recorded order.
 * eps - neighborhood radius in degrees. If it isn't positive, every point is noise.
 * min_points - neighborhood size needed for a core point.
 *
 * #Returns
 * One label per input point, in the same order.
 */
pub fn cluster_labels(points: &[TracePoint], eps: f64, min_points: usize) -> Vec<ClusterLabel> {
    let mut labels = vec![NOISE; points.len()];

    if points.is_empty() || !(eps > 0.0) || !eps.is_finite() {
        return labels;
    }

    let grid = NeighborGrid::new(points, eps);

    let is_core: Vec<bool> = (0..points.len())
        .map(|i| grid.count_neighbors(i) >= min_points)
        .collect();

    let mut next_label: ClusterLabel = 0;
    let mut to_expand: Vec<usize> = vec![];
    let mut neighbors: Vec<usize> = vec![];

    for i in 0..points.len() {
        if labels[i] != NOISE || !is_core[i] {
            continue;
        }

        labels[i] = next_label;
        to_expand.push(i);

        // Only core points are ever pushed, so every popped point can extend the cluster.
        while let Some(j) = to_expand.pop() {
            grid.neighbors(j, &mut neighbors);

            for &k in &neighbors {
                if labels[k] == NOISE {
                    labels[k] = next_label;
                    if is_core[k] {
                        to_expand.push(k);
                    }
                }
            }
        }

        next_label += 1;
    }

    log::debug!(
        "labeled {} points into {} clusters, {} noise points",
        points.len(),
        next_label,
        labels.iter().filter(|&&l| l == NOISE).count()
    );

    labels
}

/**
 * A uniform grid with cells `eps` on a side.
 *
 * Anything within `eps` of a point must be in the same cell or one of the 8 surrounding cells, so
 * a neighborhood query only has to look at those instead of the whole trace.
 */
struct NeighborGrid<'a> {
    points: &'a [TracePoint],
    eps: f64,
    cells: FxHashMap<(i64, i64), Vec<usize>>,
}

impl<'a> NeighborGrid<'a> {
    fn new(points: &'a [TracePoint], eps: f64) -> Self {
        let mut grid = NeighborGrid {
            points,
            eps,
            cells: FxHashMap::default(),
        };

        for (i, pnt) in points.iter().enumerate() {
            if let Some(key) = grid.cell_of(pnt) {
                grid.cells.entry(key).or_default().push(i);
            }
        }

        grid
    }

    /// `None` for a point with a non-finite coordinate, it can't be anyone's neighbor.
    ///
    /// Keys saturate at the ends of the `i64` range, so far out points share edge cells and
    /// still get the exact distance test.
    fn cell_of(&self, pnt: &TracePoint) -> Option<(i64, i64)> {
        if !pnt.lat.is_finite() || !pnt.lon.is_finite() {
            return None;
        }

        Some((
            (pnt.lat / self.eps).floor() as i64,
            (pnt.lon / self.eps).floor() as i64,
        ))
    }

    /**
     * Apply `f` to the index of every point within `eps` of point `i`, including `i` itself.
     *
     * A point with a non-finite coordinate has no neighbors at all, not even itself.
     */
    fn for_each_neighbor<F: FnMut(usize)>(&self, i: usize, mut f: F) {
        let center = &self.points[i];
        let (row, col) = match self.cell_of(center) {
            Some(key) => key,
            None => return,
        };
        let eps2 = self.eps * self.eps;

        for drow in -1..=1 {
            for dcol in -1..=1 {
                let key = match (row.checked_add(drow), col.checked_add(dcol)) {
                    (Some(r), Some(c)) => (r, c),
                    _ => continue,
                };

                let cell = match self.cells.get(&key) {
                    Some(cell) => cell,
                    None => continue,
                };

                for &j in cell {
                    let other = &self.points[j];
                    let dlat = other.lat - center.lat;
                    let dlon = other.lon - center.lon;

                    if dlat * dlat + dlon * dlon <= eps2 {
                        f(j);
                    }
                }
            }
        }
    }

    fn count_neighbors(&self, i: usize) -> usize {
        let mut count = 0;
        self.for_each_neighbor(i, |_| count += 1);
        count
    }

    fn neighbors(&self, i: usize, buf: &mut Vec<usize>) {
        buf.clear();
        self.for_each_neighbor(i, |j| buf.push(j));
    }
}
