/*!
 * Run a whole trace through clustering, filtering, travel calculations, and report assembly.
 */

use crate::{
    cluster_labels, densify_ring, geometry, travel_segments, Coord, FieldList,
    FieldTraceResult, KmlFile, KmlWriter, PipelineConfig, Report, TracePoint, NOISE,
};
use std::{fmt::Write, path::Path};

/// Number of pieces each hull edge is split into for the outline overlay.
const HULL_OUTLINE_SPLITS: usize = 3;

/**
 * Everything derived from a single trace.
 *
 * The report is what most users want, the rest is kept around for drawing maps.
 */
#[derive(Debug, Clone)]
pub struct FieldAnalysis {
    /// One row per field plus totals.
    pub report: Report,
    /// Clusters big enough to be fields, ascending by id. These are the rows of the report.
    pub fields: FieldList,
    /// Clusters that were too small to be fields, ascending by id.
    pub rejected: FieldList,
    /// Points that didn't belong to any cluster, in recorded order.
    pub noise: Vec<TracePoint>,
    /// Mean position of every point in the trace, `None` for an empty trace.
    pub center: Option<Coord>,
}

impl FieldAnalysis {
    /**
     * Analyze a trace.
     *
     * Every call works on its own copy of the state, nothing carries over between calls.
     *
     * #Arguments
     * points - the trace in recorded order.
     * config - the clustering, conversion, and filtering parameters.
     *
     * #Returns
     * An error only if the configuration is invalid. Empty traces, traces that are all noise, and
     * traces where no cluster is big enough all produce an empty report.
     */
    pub fn analyze(points: &[TracePoint], config: &PipelineConfig) -> FieldTraceResult<Self> {
        config.validate()?;

        let labels = cluster_labels(points, config.eps_degrees, config.min_points);

        let noise: Vec<TracePoint> = points
            .iter()
            .zip(&labels)
            .filter(|(_, &label)| label == NOISE)
            .map(|(pnt, _)| *pnt)
            .collect();

        let candidates = FieldList::from_labeled_points(points, &labels, &config.conversion);
        let num_candidates = candidates.len();
        let (fields, rejected) = candidates.split_by_area(config.min_area_guntha);

        log::debug!(
            "{} clusters, {} at least {} gunthas",
            num_candidates,
            fields.len(),
            config.min_area_guntha
        );

        if fields.is_empty() && !points.is_empty() {
            log::warn!(
                "no fields found in a trace of {} points ({} noise)",
                points.len(),
                noise.len()
            );
        }

        let segments = travel_segments(fields.as_slice());
        let report = Report::assemble(&fields, &segments);

        let coords: Vec<Coord> = points.iter().map(|p| p.coord()).collect();
        let center = geometry::mean_center(&coords);

        Ok(FieldAnalysis {
            report,
            fields,
            rejected,
            noise,
            center,
        })
    }

    /// Save the fields and trace points in a KML file.
    pub fn save_kml<P: AsRef<Path>>(
        &self,
        kml_path: P,
        hull_outline: bool,
    ) -> FieldTraceResult<()> {
        let mut kml = KmlFile::new(kml_path)?;
        self.write_kml(&mut kml, hull_outline)
    }

    /**
     * Write the analysis as KML.
     *
     * The document must already be started, this only writes styles and folders.
     *
     * #Arguments
     * kml - destination.
     * hull_outline - also draw each field outline with extra points along every edge.
     */
    pub fn write_kml<K: KmlWriter>(
        &self,
        kml: &mut K,
        hull_outline: bool,
    ) -> FieldTraceResult<()> {
        kml.start_style(Some("field"))?;
        kml.create_poly_style(Some("7f00ff00"), true, true)?;
        kml.create_line_style("ff00aa00", 2.0)?;
        kml.finish_style()?;

        kml.start_style(Some("outline"))?;
        kml.create_line_style("ff00ffff", 2.0)?;
        kml.finish_style()?;

        kml.start_style(Some("field_point"))?;
        kml.create_icon_style(Some(POINT_ICON), Some("ffff0000"), 0.3)?;
        kml.finish_style()?;

        kml.start_style(Some("not_field_point"))?;
        kml.create_icon_style(Some(POINT_ICON), Some("ff0000ff"), 0.3)?;
        kml.finish_style()?;

        let mut name = String::with_capacity(32);
        let mut description = String::with_capacity(256);

        kml.start_folder(Some("Fields"), None, true)?;
        for (field, row) in self.fields.iter().zip(&self.report.rows) {
            debug_assert_eq!(field.id, row.field_id);

            name.clear();
            let _ = write!(&mut name, "Field {}", field.id);

            description.clear();
            let _ = write!(
                &mut description,
                concat!(
                    "Field ID: {}<br/>",
                    "Area: {:.2} gunthas ({:.0} m²)<br/>",
                    "Start: {}<br/>",
                    "End: {}<br/>",
                    "Time: {:.2} minutes<br/>",
                ),
                field.id,
                field.area_guntha,
                field.area_m2,
                field.start,
                field.end,
                field.duration_minutes
            );
            match (row.travel_distance_km, row.travel_time_minutes) {
                (Some(dist), Some(time)) => {
                    let _ = write!(
                        &mut description,
                        "Travel to next field: {:.2} km, {:.2} minutes<br/>",
                        dist, time
                    );
                }
                _ => {
                    let _ = write!(&mut description, "Last field<br/>");
                }
            }

            kml.start_folder(Some(&name), None, false)?;

            kml.start_placemark(Some(&name), Some(&description), Some("#field"))?;
            kml.timespan(field.start, field.end)?;
            if field.hull.len() >= 3 {
                kml.create_polygon(&field.hull)?;
            } else {
                kml.create_point(field.centroid.lat, field.centroid.lon, 0.0)?;
            }
            kml.finish_placemark()?;

            if hull_outline && field.hull.len() >= 3 {
                let outline = densify_ring(&field.hull, HULL_OUTLINE_SPLITS);
                kml.start_placemark(None, None, Some("#outline"))?;
                kml.create_line_string(&outline, true)?;
                kml.finish_placemark()?;
            }

            write_points(kml, &field.points, "#field_point")?;

            kml.finish_folder()?;
        }
        kml.finish_folder()?;

        kml.start_folder(Some("Not Fields"), None, false)?;
        write_points(kml, &self.noise, "#not_field_point")?;
        for cluster in self.rejected.iter() {
            write_points(kml, &cluster.points, "#not_field_point")?;
        }
        kml.finish_folder()?;

        Ok(())
    }
}

const POINT_ICON: &str = "http://maps.google.com/mapfiles/kml/shapes/placemark_circle.png";

fn write_points<K: KmlWriter>(
    kml: &mut K,
    points: &[TracePoint],
    style: &str,
) -> FieldTraceResult<()> {
    for pnt in points {
        kml.start_placemark(None, None, Some(style))?;
        kml.timestamp(pnt.timestamp)?;
        kml.create_point(pnt.lat, pnt.lon, 0.0)?;
        kml.finish_placemark()?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};

    struct KmlBuffer(Vec<u8>);

    impl KmlWriter for KmlBuffer {
        fn output(&mut self) -> &mut dyn std::io::Write {
            &mut self.0
        }
    }

    /// A dense square block of points, `n` x `n`, spaced `step` degrees apart.
    fn block(lat: f64, lon: f64, n: usize, step: f64, start_minute: i64) -> Vec<TracePoint> {
        let mut pnts = vec![];
        for i in 0..n {
            for j in 0..n {
                let minute = start_minute + (i * n + j) as i64;
                pnts.push(TracePoint::new(
                    lat + i as f64 * step,
                    lon + j as f64 * step,
                    Utc.timestamp_millis_opt(minute * 60_000).unwrap(),
                ));
            }
        }
        pnts
    }

    #[test]
    fn test_analyze_empty() {
        let analysis = FieldAnalysis::analyze(&[], &PipelineConfig::default()).unwrap();
        assert!(analysis.report.is_empty());
        assert!(analysis.fields.is_empty());
        assert!(analysis.noise.is_empty());
        assert!(analysis.center.is_none());
    }

    #[test]
    fn test_analyze_rejects_bad_config() {
        let config = PipelineConfig {
            min_points: 0,
            ..PipelineConfig::default()
        };
        assert!(FieldAnalysis::analyze(&[], &config).is_err());
    }

    #[test]
    fn test_kml_output() {
        // 41 x 41 points 0.00001 degrees apart covers 0.0004 degrees on a side.
        let mut pnts = block(18.0, 73.0, 41, 0.00001, 0);
        pnts.push(TracePoint::new(
            18.1,
            73.1,
            Utc.timestamp_millis_opt(2_000 * 60_000).unwrap(),
        ));

        let analysis = FieldAnalysis::analyze(&pnts, &PipelineConfig::default()).unwrap();
        assert_eq!(analysis.fields.len(), 1);
        assert_eq!(analysis.noise.len(), 1);

        let mut kml = KmlBuffer(vec![]);
        kml.start_document().unwrap();
        analysis.write_kml(&mut kml, true).unwrap();
        kml.finish_document();

        let text = String::from_utf8(kml.0).unwrap();
        assert_eq!(text.matches("<Polygon>").count(), 1);
        assert_eq!(text.matches("<LineString>").count(), 1);
        assert_eq!(text.matches("#not_field_point</styleUrl>").count(), 1);
        assert_eq!(text.matches("#field_point</styleUrl>").count(), 1681);
        assert!(text.contains("<name>Field 0</name>"));
        assert!(text.contains("Last field"));
    }
}
