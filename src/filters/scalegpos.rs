use crate::filters::TableFilter;

/// A filter that scales every positioning value in a GPOS table
pub struct ScaleGpos(f64);

impl ScaleGpos {
    /// Create a new ScaleGpos filter
    pub fn new(factor: f64) -> Self {
        ScaleGpos(factor)
    }
}

impl TableFilter for ScaleGpos {
    fn apply(&self, table: &mut crate::OtlTable) -> Result<(), crate::OtlError> {
        crate::scale_gpos(table, self.0)
    }

    fn from_str(s: &str) -> Result<Self, crate::OtlError>
    where
        Self: Sized,
    {
        let factor: f64 = s
            .trim()
            .parse()
            .map_err(|_| crate::OtlError::FilterError(format!("Invalid scale factor: {}", s)))?;
        if !factor.is_finite() {
            return Err(crate::OtlError::FilterError(format!(
                "Scale factor must be finite: {}",
                s
            )));
        }
        Ok(ScaleGpos::new(factor))
    }

    #[cfg(feature = "cli")]
    fn arg() -> clap::Arg
    where
        Self: Sized,
    {
        clap::Arg::new("scalegpos")
            .long("scale-gpos")
            .help("Scale all GPOS placements, advances and anchors by a factor")
            .value_name("FACTOR")
            .action(clap::ArgAction::Append)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(ScaleGpos::from_str("0.5").unwrap().0, 0.5);
        assert!(ScaleGpos::from_str("half").is_err());
        assert!(ScaleGpos::from_str("inf").is_err());
    }
}
