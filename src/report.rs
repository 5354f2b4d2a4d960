/*!
 * The field visit report.
 *
 * A Report only merges and sums values that were already calculated for each field, it never
 * recalculates anything.
 */

use crate::{ClusterLabel, FieldList, FieldTraceResult, TravelSegment};
use chrono::{DateTime, Utc};
use std::{
    fmt::{self, Display},
    io::Write,
};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The columns of the report table, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, IntoStaticStr)]
pub enum ReportColumn {
    #[strum(serialize = "Field ID")]
    FieldId,
    #[strum(serialize = "Area (Gunthas)")]
    Area,
    #[strum(serialize = "Time (Minutes)")]
    Time,
    #[strum(serialize = "Start Date")]
    StartDate,
    #[strum(serialize = "End Date")]
    EndDate,
    #[strum(serialize = "Travel Distance to Next Field (km)")]
    TravelDistance,
    #[strum(serialize = "Travel Time to Next Field (minutes)")]
    TravelTime,
}

impl ReportColumn {
    /// The column header.
    pub fn header(self) -> &'static str {
        self.into()
    }

    /// Width of the column when printed as a table.
    fn width(self) -> usize {
        use ReportColumn::*;

        match self {
            StartDate | EndDate => 19,
            _ => self.header().len().max(10),
        }
    }
}

/// One row of the report, everything known about a single field visit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportRow {
    pub field_id: ClusterLabel,
    pub area_guntha: f64,
    pub duration_minutes: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// `None` for the last field, there is no next field to travel to.
    pub travel_distance_km: Option<f64>,
    /// `None` for the last field, there is no next field to travel to.
    pub travel_time_minutes: Option<f64>,
}

impl ReportRow {
    fn cell(&self, column: ReportColumn) -> String {
        use ReportColumn::*;

        match column {
            FieldId => format!("{}", self.field_id),
            Area => format!("{:.2}", self.area_guntha),
            Time => format!("{:.2}", self.duration_minutes),
            StartDate => format!("{}", self.start.format(DATE_FORMAT)),
            EndDate => format!("{}", self.end.format(DATE_FORMAT)),
            TravelDistance => self
                .travel_distance_km
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_owned()),
            TravelTime => self
                .travel_time_minutes
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_owned()),
        }
    }

    fn csv_cell(&self, column: ReportColumn) -> String {
        use ReportColumn::*;

        match column {
            FieldId => format!("{}", self.field_id),
            Area => format!("{}", self.area_guntha),
            Time => format!("{}", self.duration_minutes),
            StartDate => self.start.to_rfc3339(),
            EndDate => self.end.to_rfc3339(),
            TravelDistance => self
                .travel_distance_km
                .map(|v| format!("{}", v))
                .unwrap_or_default(),
            TravelTime => self
                .travel_time_minutes
                .map(|v| format!("{}", v))
                .unwrap_or_default(),
        }
    }
}

/// Sums over all the rows of a report. Undefined travel values are left out of the sums.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub area_guntha: f64,
    pub duration_minutes: f64,
    pub travel_distance_km: f64,
    pub travel_time_minutes: f64,
}

/// The rows and totals for one trace.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub totals: Totals,
}

impl Report {
    /**
     * Join each field with its outgoing travel segment and add up the totals.
     *
     * #Arguments
     * fields - the surviving fields in ascending id order.
     * segments - the travel segments from [travel_segments](crate::travel_segments), segment `i`
     * leaving field `i`.
     */
    pub fn assemble(fields: &FieldList, segments: &[TravelSegment]) -> Self {
        debug_assert_eq!(segments.len(), fields.len().saturating_sub(1));

        let rows: Vec<ReportRow> = fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let travel = segments.get(i).filter(|seg| seg.from_id == field.id);
                debug_assert!(i + 1 == fields.len() || travel.is_some());

                ReportRow {
                    field_id: field.id,
                    area_guntha: field.area_guntha,
                    duration_minutes: field.duration_minutes,
                    start: field.start,
                    end: field.end,
                    travel_distance_km: travel.map(|seg| seg.distance_km),
                    travel_time_minutes: travel.map(|seg| seg.time_minutes),
                }
            })
            .collect();

        let totals = Totals {
            area_guntha: rows.iter().map(|r| r.area_guntha).sum(),
            duration_minutes: rows.iter().map(|r| r.duration_minutes).sum(),
            travel_distance_km: rows.iter().filter_map(|r| r.travel_distance_km).sum(),
            travel_time_minutes: rows.iter().filter_map(|r| r.travel_time_minutes).sum(),
        };

        Report { rows, totals }
    }

    /// Is the report empty?
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /**
     * Write the rows as CSV with a header row.
     *
     * Undefined travel values are written as empty cells, dates as RFC 3339.
     */
    pub fn write_csv<W: Write>(&self, writer: W) -> FieldTraceResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        wtr.write_record(ReportColumn::iter().map(ReportColumn::header))?;
        for row in &self.rows {
            wtr.write_record(ReportColumn::iter().map(|col| row.csv_cell(col)))?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "          Total Area: {:.2} gunthas", self.area_guntha)?;
        writeln!(f, "          Total Time: {:.2} minutes", self.duration_minutes)?;
        writeln!(f, "Total Travel Distance: {:.2} km", self.travel_distance_km)?;
        writeln!(f, "    Total Travel Time: {:.2} minutes", self.travel_time_minutes)
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        for col in ReportColumn::iter() {
            write!(f, "{:>width$}  ", col.header(), width = col.width())?;
        }
        writeln!(f)?;

        for row in &self.rows {
            for col in ReportColumn::iter() {
                write!(f, "{:>width$}  ", row.cell(col), width = col.width())?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        write!(f, "{}", self.totals)
    }
}
