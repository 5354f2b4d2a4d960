/*!
 * Tunable parameters for the trace to report pipeline.
 *
 * All of the magic numbers live here so a pipeline run depends only on its input trace and one
 * of these structures.
 */

use crate::{FieldTraceError, FieldTraceResult};

/**
 * Conversion from an area measured in square degrees to square meters and gunthas.
 *
 * The conversion is a flat scaling, it does not account for the latitude of each point. The
 * latitude distortion factor is an empirical correction for the convergence of the meridians at
 * the latitudes where the equipment operates.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaConversion {
    /// Scale applied to square degrees to account for shrinking longitude spacing.
    pub latitude_distortion: f64,
    /// Meters in one degree of latitude.
    pub meters_per_degree: f64,
    /// Square meters in one guntha.
    pub m2_per_guntha: f64,
}

impl Default for AreaConversion {
    fn default() -> Self {
        AreaConversion {
            latitude_distortion: 0.77,
            meters_per_degree: 111_000.0,
            m2_per_guntha: 101.17,
        }
    }
}

impl AreaConversion {
    /// Convert an area in square degrees to square meters.
    pub fn to_square_meters(&self, area_deg2: f64) -> f64 {
        area_deg2 * self.latitude_distortion * self.meters_per_degree * self.meters_per_degree
    }

    /// Convert an area in square degrees to gunthas.
    pub fn to_guntha(&self, area_deg2: f64) -> f64 {
        self.to_square_meters(area_deg2) / self.m2_per_guntha
    }
}

/**
 * Everything a pipeline run needs besides the trace itself.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Neighborhood radius for clustering, in degrees. No conversion to meters is done.
    pub eps_degrees: f64,
    /// Number of points (the point itself included) within `eps_degrees` to be a core point.
    pub min_points: usize,
    /// Clusters smaller than this are not considered fields.
    pub min_area_guntha: f64,
    /// Square degrees to land units.
    pub conversion: AreaConversion,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            eps_degrees: 0.000_025,
            min_points: 11,
            min_area_guntha: 5.0,
            conversion: AreaConversion::default(),
        }
    }
}

impl PipelineConfig {
    /// Check that the parameters can produce a meaningful result.
    pub fn validate(&self) -> FieldTraceResult<()> {
        if !self.eps_degrees.is_finite() || self.eps_degrees <= 0.0 {
            return Err(FieldTraceError {
                msg: "eps must be a positive, finite number of degrees",
            }
            .into());
        }

        if self.min_points == 0 {
            return Err(FieldTraceError {
                msg: "min points must be at least 1",
            }
            .into());
        }

        if !self.min_area_guntha.is_finite() || self.min_area_guntha < 0.0 {
            return Err(FieldTraceError {
                msg: "minimum field area must be a non-negative, finite number of gunthas",
            }
            .into());
        }

        let AreaConversion {
            latitude_distortion,
            meters_per_degree,
            m2_per_guntha,
        } = self.conversion;

        for factor in [latitude_distortion, meters_per_degree, m2_per_guntha] {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(FieldTraceError {
                    msg: "area conversion factors must be positive and finite",
                }
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.eps_degrees, 0.000025);
        assert_eq!(config.min_points, 11);
        assert_eq!(config.min_area_guntha, 5.0);
        assert_eq!(config.conversion.latitude_distortion, 0.77);
        assert_eq!(config.conversion.meters_per_degree, 111000.0);
        assert_eq!(config.conversion.m2_per_guntha, 101.17);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_area_conversion() {
        let conv = AreaConversion::default();

        // A square 0.0003 degrees on a side.
        let m2 = conv.to_square_meters(9.0e-8);
        assert!((m2 - 853.8453).abs() < 1.0e-3, "{}", m2);
        assert!((conv.to_guntha(9.0e-8) - 8.4397).abs() < 1.0e-3);

        // A square 0.0001 degrees on a side.
        assert!((conv.to_guntha(1.0e-8) - 0.9377).abs() < 1.0e-3);

        assert_eq!(conv.to_guntha(0.0), 0.0);
    }

    #[test]
    fn test_invalid_configs() {
        let bad_eps = PipelineConfig {
            eps_degrees: 0.0,
            ..PipelineConfig::default()
        };
        assert!(bad_eps.validate().is_err());

        let nan_eps = PipelineConfig {
            eps_degrees: f64::NAN,
            ..PipelineConfig::default()
        };
        assert!(nan_eps.validate().is_err());

        let no_points = PipelineConfig {
            min_points: 0,
            ..PipelineConfig::default()
        };
        assert!(no_points.validate().is_err());

        let negative_area = PipelineConfig {
            min_area_guntha: -1.0,
            ..PipelineConfig::default()
        };
        assert!(negative_area.validate().is_err());

        let bad_conversion = PipelineConfig {
            conversion: AreaConversion {
                m2_per_guntha: 0.0,
                ..AreaConversion::default()
            },
            ..PipelineConfig::default()
        };
        assert!(bad_conversion.validate().is_err());
    }
}
