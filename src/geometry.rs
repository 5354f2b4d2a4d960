/*!
 * Geographic calculations.
 *
 * Areas here are computed in "degree space", treating latitude and longitude as plain Cartesian
 * coordinates. Converting that to a land area is the job of
 * [AreaConversion](crate::AreaConversion). Distances between places on the Earth are measured
 * on the WGS-84 ellipsoid.
 */

use geo::{Area, ConvexHull, Distance, Geodesic, MultiPoint, Point};
use std::fmt::{self, Display};

/// A plain latitude / longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

impl Coord {
    /// Check if these coordinates are within `eps` of each other in both lat and lon.
    pub fn is_close(&self, other: Coord, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lon - other.lon).abs() <= eps
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/**
 * The vertices of the convex hull of a set of points.
 *
 * The ring is not closed, the first vertex is not repeated at the end. Vertices are in
 * counter-clockwise order when longitude is plotted on the horizontal axis.
 *
 * #Returns
 * An empty list if there are fewer than 3 points since no hull is defined.
 */
pub fn convex_hull(points: &[Coord]) -> Vec<Coord> {
    if points.len() < 3 {
        return vec![];
    }

    let mp: MultiPoint<f64> = points.iter().map(|c| c.to_point()).collect();
    let hull = mp.convex_hull();

    let mut vertices: Vec<Coord> = hull
        .exterior()
        .coords()
        .map(|c| Coord { lat: c.y, lon: c.x })
        .collect();

    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    vertices
}

/**
 * The area enclosed by the convex hull of a set of points in square degrees.
 *
 * Fewer than 3 points or a degenerate (collinear) set gives an area of zero, this never fails.
 */
pub fn convex_hull_area(points: &[Coord]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mp: MultiPoint<f64> = points.iter().map(|c| c.to_point()).collect();
    let area = mp.convex_hull().unsigned_area();

    if area.is_finite() {
        area
    } else {
        0.0
    }
}

/**
 * The coordinate-wise mean of all the points.
 *
 * Note this is the mean of every point, not the centroid of the hull polygon.
 *
 * #Returns
 * `None` if there are no points.
 */
pub fn centroid(points: &[Coord]) -> Option<Coord> {
    if points.is_empty() {
        return None;
    }

    let (lat_sum, lon_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), c| (lat + c.lat, lon + c.lon));

    let n = points.len() as f64;
    Some(Coord {
        lat: lat_sum / n,
        lon: lon_sum / n,
    })
}

/// The center to use for a map showing the whole trace. Same as [centroid].
pub fn mean_center(points: &[Coord]) -> Option<Coord> {
    centroid(points)
}

/**
 * Add evenly spaced points along each edge of a closed ring.
 *
 * Every edge, including the one from the last vertex back to the first, is split into `splits`
 * pieces. The output has `vertices.len() * splits` points and is not closed.
 */
pub fn densify_ring(vertices: &[Coord], splits: usize) -> Vec<Coord> {
    let splits = splits.max(1);
    let n = vertices.len();

    let mut dense = Vec::with_capacity(n * splits);
    for (i, &start) in vertices.iter().enumerate() {
        let end = vertices[(i + 1) % n];
        dense.push(start);

        for j in 1..splits {
            let frac = j as f64 / splits as f64;
            dense.push(Coord {
                lat: start.lat + frac * (end.lat - start.lat),
                lon: start.lon + frac * (end.lon - start.lon),
            });
        }
    }

    dense
}

/**
 * The distance between two points on the WGS-84 ellipsoid.
 *
 * #Returns
 * The distance between the points in kilometers.
 */
pub fn geodesic_distance_km(a: Coord, b: Coord) -> f64 {
    Geodesic::distance(a.to_point(), b.to_point()) / 1000.0
}
