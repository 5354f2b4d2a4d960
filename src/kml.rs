//! KML output for drawing field visits on a map.
//!
//! Elements are written as soon as they are requested, nothing is buffered into a tree first. A
//! caller opens and closes every element itself, in the nesting order KML expects: a document
//! holds styles and folders, folders hold placemarks, placemarks hold a time and a geometry.

use crate::{Coord, FieldTraceResult};
use chrono::{DateTime, Utc};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

const KML_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// A KML document on disk. The document is closed and flushed when this is dropped.
pub struct KmlFile(BufWriter<File>);

impl KmlFile {
    /// Create (or truncate) `path` and write the document prologue.
    pub fn new<P: AsRef<Path>>(path: P) -> FieldTraceResult<Self> {
        let f = File::create(path.as_ref())?;

        let mut kml = KmlFile(BufWriter::new(f));
        kml.start_document()?;
        Ok(kml)
    }
}

impl KmlWriter for KmlFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.0
    }
}

impl Drop for KmlFile {
    fn drop(&mut self) {
        self.finish_document();
    }
}

/**
 * Streaming KML elements over any byte sink.
 *
 * Only `output` needs implementing. Colors are KML `aabbggrr` hex strings and every coordinate is
 * written clamped to the ground.
 */
pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// XML declaration, root element, and the opening `Document` tag.
    fn start_document(&mut self) -> FieldTraceResult<()> {
        let out = self.output();
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(out, r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#)?;
        writeln!(out, "<Document>")?;
        Ok(())
    }

    /// Close the `Document` and root element and flush. Errors are dropped, this runs in `Drop`.
    fn finish_document(&mut self) {
        let out = self.output();
        let _ = writeln!(out, "</Document>\n</kml>");
        let _ = out.flush();
    }

    fn write_name(&mut self, name: &str) -> FieldTraceResult<()> {
        writeln!(self.output(), "<name>{}</name>", name)?;
        Ok(())
    }

    /// The description is wrapped in CDATA so it may hold HTML such as `<br/>`.
    fn write_description(&mut self, description: &str) -> FieldTraceResult<()> {
        writeln!(
            self.output(),
            "<description><![CDATA[{}]]></description>",
            description
        )?;
        Ok(())
    }

    /// Open a `Folder`, expanded in the viewer's tree when `is_open` is set.
    fn start_folder(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        is_open: bool,
    ) -> FieldTraceResult<()> {
        writeln!(self.output(), "<Folder>")?;

        if let Some(name) = name {
            self.write_name(name)?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if is_open {
            writeln!(self.output(), "<open>1</open>")?;
        }

        Ok(())
    }

    fn finish_folder(&mut self) -> FieldTraceResult<()> {
        writeln!(self.output(), "</Folder>")?;
        Ok(())
    }

    /**
     * Open a `Placemark`.
     *
     * #Arguments
     * name - label shown on the map, if any.
     * description - balloon text, if any.
     * style_url - a reference such as `#field` to a style defined earlier in the document.
     */
    fn start_placemark(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        style_url: Option<&str>,
    ) -> FieldTraceResult<()> {
        writeln!(self.output(), "<Placemark>")?;

        if let Some(name) = name {
            self.write_name(name)?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if let Some(style_url) = style_url {
            writeln!(self.output(), "<styleUrl>{}</styleUrl>", style_url)?;
        }

        Ok(())
    }

    fn finish_placemark(&mut self) -> FieldTraceResult<()> {
        writeln!(self.output(), "</Placemark>")?;
        Ok(())
    }

    /// Open a shared `Style`; placemarks refer to it as `#<style_id>`.
    fn start_style(&mut self, style_id: Option<&str>) -> FieldTraceResult<()> {
        match style_id {
            Some(id) => writeln!(self.output(), r#"<Style id="{}">"#, id)?,
            None => writeln!(self.output(), "<Style>")?,
        }
        Ok(())
    }

    fn finish_style(&mut self) -> FieldTraceResult<()> {
        writeln!(self.output(), "</Style>")?;
        Ok(())
    }

    /// Fill and border of polygons, for use inside a style. No color means a random one.
    fn create_poly_style(
        &mut self,
        color: Option<&str>,
        filled: bool,
        outlined: bool,
    ) -> FieldTraceResult<()> {
        let out = self.output();
        writeln!(out, "<PolyStyle>")?;

        match color {
            Some(color) => writeln!(out, "<color>{}</color>\n<colorMode>normal</colorMode>", color)?,
            None => writeln!(out, "<colorMode>random</colorMode>")?,
        }

        writeln!(out, "<fill>{}</fill>", u8::from(filled))?;
        writeln!(out, "<outline>{}</outline>", u8::from(outlined))?;
        writeln!(out, "</PolyStyle>")?;
        Ok(())
    }

    /// Color and width in pixels of lines and polygon borders, for use inside a style.
    fn create_line_style(&mut self, color: &str, width: f64) -> FieldTraceResult<()> {
        writeln!(
            self.output(),
            "<LineStyle>\n<color>{}</color>\n<width>{}</width>\n</LineStyle>",
            color,
            width
        )?;
        Ok(())
    }

    /// Icon used for points, for use inside a style. A `scale` that isn't positive means 1.
    fn create_icon_style(
        &mut self,
        icon_url: Option<&str>,
        color: Option<&str>,
        scale: f64,
    ) -> FieldTraceResult<()> {
        let out = self.output();
        writeln!(out, "<IconStyle>")?;

        if let Some(color) = color {
            writeln!(out, "<color>{}</color>", color)?;
        }

        let scale = if scale > 0.0 { scale } else { 1.0 };
        writeln!(out, "<scale>{}</scale>", scale)?;

        if let Some(icon_url) = icon_url {
            writeln!(out, "<Icon><href>{}</href></Icon>", icon_url)?;
        }

        writeln!(out, "</IconStyle>")?;
        Ok(())
    }

    /// The interval a field was worked, so the map's time slider can show it.
    fn timespan(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> FieldTraceResult<()> {
        writeln!(
            self.output(),
            "<TimeSpan>\n<begin>{}</begin>\n<end>{}</end>\n</TimeSpan>",
            start.format(KML_TIME_FORMAT),
            end.format(KML_TIME_FORMAT)
        )?;
        Ok(())
    }

    /// The moment a single fix was recorded.
    fn timestamp(&mut self, when: DateTime<Utc>) -> FieldTraceResult<()> {
        writeln!(
            self.output(),
            "<TimeStamp><when>{}</when></TimeStamp>",
            when.format(KML_TIME_FORMAT)
        )?;
        Ok(())
    }

    /**
     * A whole `Polygon` with one outer ring and no holes.
     *
     * KML wants rings closed, so the first vertex is written again at the end. Pass the vertices
     * without that repeat, as [convex_hull](crate::convex_hull) returns them.
     */
    fn create_polygon(&mut self, vertices: &[Coord]) -> FieldTraceResult<()> {
        writeln!(
            self.output(),
            "<Polygon>\n<tessellate>1</tessellate>\n<outerBoundaryIs>\n<LinearRing>\n<coordinates>"
        )?;

        for v in vertices.iter().chain(vertices.first()) {
            self.add_vertex(v.lat, v.lon, 0.0)?;
        }

        writeln!(
            self.output(),
            "</coordinates>\n</LinearRing>\n</outerBoundaryIs>\n</Polygon>"
        )?;
        Ok(())
    }

    /// A path through `points`, returning to the first one when `close` is set.
    fn create_line_string(&mut self, points: &[Coord], close: bool) -> FieldTraceResult<()> {
        writeln!(
            self.output(),
            "<LineString>\n<tessellate>1</tessellate>\n<coordinates>"
        )?;

        let closing = if close { points.first() } else { None };
        for v in points.iter().chain(closing) {
            self.add_vertex(v.lat, v.lon, 0.0)?;
        }

        writeln!(self.output(), "</coordinates>\n</LineString>")?;
        Ok(())
    }

    /// One `lon,lat,alt` tuple inside an open `coordinates` element.
    fn add_vertex(&mut self, lat: f64, lon: f64, z: f64) -> FieldTraceResult<()> {
        writeln!(self.output(), "{},{},{}", lon, lat, z)?;
        Ok(())
    }

    fn create_point(&mut self, lat: f64, lon: f64, z: f64) -> FieldTraceResult<()> {
        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},{}</coordinates>\n</Point>",
            lon,
            lat,
            z
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct KmlBuffer(Vec<u8>);

    impl KmlWriter for KmlBuffer {
        fn output(&mut self) -> &mut dyn Write {
            &mut self.0
        }
    }

    #[test]
    fn test_polygon_is_closed() {
        let mut kml = KmlBuffer(vec![]);
        let square = [
            Coord { lat: 0.0, lon: 0.0 },
            Coord { lat: 0.0, lon: 1.0 },
            Coord { lat: 1.0, lon: 1.0 },
        ];
        kml.create_polygon(&square).unwrap();

        let text = String::from_utf8(kml.0).unwrap();
        let coords: Vec<_> = text.lines().filter(|l| l.ends_with(",0")).collect();
        assert_eq!(coords, vec!["0,0,0", "1,0,0", "1,1,0", "0,0,0"]);
    }

    #[test]
    fn test_document_wrapping() {
        let mut kml = KmlBuffer(vec![]);
        kml.start_document().unwrap();
        kml.start_folder(Some("Fields"), None, true).unwrap();
        kml.finish_folder().unwrap();
        kml.finish_document();

        let text = String::from_utf8(kml.0).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("<name>Fields</name>"));
        assert!(text.contains("<open>1</open>"));
        assert!(text.trim_end().ends_with("</kml>"));
    }

    #[test]
    fn test_styles() {
        let mut kml = KmlBuffer(vec![]);
        kml.start_style(Some("field")).unwrap();
        kml.create_poly_style(None, true, false).unwrap();
        kml.create_icon_style(None, Some("ff0000ff"), 0.0).unwrap();
        kml.finish_style().unwrap();

        let text = String::from_utf8(kml.0).unwrap();
        assert!(text.starts_with(r#"<Style id="field">"#));
        assert!(text.contains("<colorMode>random</colorMode>"));
        assert!(text.contains("<fill>1</fill>\n<outline>0</outline>"));
        assert!(text.contains("<scale>1</scale>"));
    }
}
