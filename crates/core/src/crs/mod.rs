//! Coordinate Reference System handling

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coordinate reference system identifier attached to a grid.
///
/// Only identity matters to the delineation engine: two grids can be
/// co-registered through their geotransforms when their systems agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CRS {
    /// EPSG code if known
    epsg: Option<u32>,
    /// WKT or other free-form definition
    wkt: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Whether two systems can be reconciled by geotransform alone.
    ///
    /// EPSG codes decide when both sides carry one; otherwise the
    /// definitions must match verbatim.
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => match (&self.wkt, &other.wkt) {
                (Some(a), Some(b)) => a.trim() == b.trim(),
                _ => false,
            },
        }
    }

    /// Resolve the system shared by two optional grid CRSs.
    ///
    /// A missing side adopts the other one. Two differing systems are an error.
    pub fn reconcile(a: Option<&CRS>, b: Option<&CRS>) -> Result<Option<CRS>> {
        match (a, b) {
            (Some(a), Some(b)) if !a.is_equivalent(b) => {
                Err(Error::CrsMismatch(a.identifier(), b.identifier()))
            }
            (Some(a), _) => Ok(Some(a.clone())),
            (None, b) => Ok(b.cloned()),
        }
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        match &self.wkt {
            Some(wkt) => wkt.clone(),
            None => "Unknown".to_string(),
        }
    }
}

impl FromStr for CRS {
    type Err = Error;

    /// Parses `EPSG:32638`, a bare `32638`, or any other text as WKT.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidParameter {
                name: "crs",
                value: String::new(),
                reason: "coordinate system identifier is empty".to_string(),
            });
        }
        let code = s
            .strip_prefix("EPSG:")
            .or_else(|| s.strip_prefix("epsg:"))
            .unwrap_or(s);
        match code.parse::<u32>() {
            Ok(code) => Ok(Self::from_epsg(code)),
            Err(_) if code.len() != s.len() => Err(Error::InvalidParameter {
                name: "crs",
                value: s.to_string(),
                reason: "EPSG code must be a positive integer".to_string(),
            }),
            Err(_) => Ok(Self::from_wkt(s)),
        }
    }
}

impl TryFrom<String> for CRS {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<CRS> for String {
    fn from(crs: CRS) -> Self {
        crs.identifier()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg() {
        let crs: CRS = "EPSG:32638".parse().unwrap();
        assert_eq!(crs.epsg(), Some(32638));
        assert_eq!(crs.identifier(), "EPSG:32638");

        let bare: CRS = "32638".parse().unwrap();
        assert!(crs.is_equivalent(&bare));
    }

    #[test]
    fn test_parse_rejects_bad_code() {
        assert!("EPSG:abc".parse::<CRS>().is_err());
        assert!("".parse::<CRS>().is_err());
    }

    #[test]
    fn test_reconcile() {
        let utm = CRS::from_epsg(32638);
        let other = CRS::from_epsg(4326);

        let shared = CRS::reconcile(Some(&utm), None).unwrap();
        assert_eq!(shared, Some(utm.clone()));
        assert_eq!(CRS::reconcile(None, None).unwrap(), None);
        assert!(matches!(
            CRS::reconcile(Some(&utm), Some(&other)),
            Err(Error::CrsMismatch(_, _))
        ));
    }

    #[test]
    fn test_serde_as_identifier() {
        let crs = CRS::from_epsg(32638);
        let json = serde_json::to_string(&crs).unwrap();
        assert_eq!(json, "\"EPSG:32638\"");
        let back: CRS = serde_json::from_str(&json).unwrap();
        assert_eq!(back, crs);
    }
}
