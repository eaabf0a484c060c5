//! Unit conversion registry.
//!
//! Internal computation runs in one canonical system: masses in solar masses,
//! lengths in km, energy densities and pressures in Msun/km^3, baryon number
//! densities in 1/fm^3. Every ingestion boundary converts explicitly through
//! this module; nothing downstream mixes systems.

use crate::{NsError, NsResult, Real};

/// Solar mass in grams (CODATA-era value used throughout the tables)
pub const MSUN_G: Real = 1.9892e33;

/// Schwarzschild radius of the sun in km (2 G Msun / c^2)
pub const SCHWARZ_KM: Real = 2.95325008;

/// Gravitational constant in km/Msun (geometrized, c = 1)
pub const G_KM_MSUN: Real = SCHWARZ_KM / 2.0;

/// hbar c in MeV fm
pub const HBARC_MEV_FM: Real = 197.326_963_1;

/// Speed of light in cm/s
pub const C_CM_S: Real = 2.997_924_58e10;

/// MeV expressed in grams
pub const MEV_G: Real = 1.782_661_907e-27;

/// 1 MeV/fm^3 in Msun/km^3
pub const MEV_FM3_TO_MSUN_KM3: Real = MEV_G * 1.0e54 / MSUN_G;

/// 1 g/cm^3 in Msun/km^3
pub const G_CM3_TO_MSUN_KM3: Real = 1.0e15 / MSUN_G;

/// 1 erg/cm^3 (or dyne/cm^2) in Msun/km^3, dividing out c^2
pub const ERG_CM3_TO_MSUN_KM3: Real = G_CM3_TO_MSUN_KM3 / (C_CM_S * C_CM_S);

/// Dimension family of a recognized unit string. Conversions never cross
/// families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitFamily {
    EnergyDensity,
    NumberDensity,
}

/// Resolve a unit string to its family and the factor taking a value in that
/// unit to the canonical unit of the family (Msun/km^3 or 1/fm^3).
pub fn factor_to_canonical(unit: &str) -> NsResult<(UnitFamily, Real)> {
    use UnitFamily::*;
    let out = match unit {
        "Msun/km^3" => (EnergyDensity, 1.0),
        "MeV/fm^3" => (EnergyDensity, MEV_FM3_TO_MSUN_KM3),
        // natural units: multiply by hbar c to get MeV/fm^3 first
        "1/fm^4" => (EnergyDensity, HBARC_MEV_FM * MEV_FM3_TO_MSUN_KM3),
        "g/cm^3" => (EnergyDensity, G_CM3_TO_MSUN_KM3),
        "erg/cm^3" => (EnergyDensity, ERG_CM3_TO_MSUN_KM3),
        "dyne/cm^2" => (EnergyDensity, ERG_CM3_TO_MSUN_KM3),
        "1/fm^3" => (NumberDensity, 1.0),
        "1/cm^3" => (NumberDensity, 1.0e-39),
        "1/m^3" => (NumberDensity, 1.0e-42),
        _ => {
            return Err(NsError::InvalidArg {
                what: "unrecognized unit string",
            })
        }
    };
    Ok(out)
}

/// Convert `value` from one unit to another within the same family.
pub fn convert(from: &str, to: &str, value: Real) -> NsResult<Real> {
    let (fam_f, fac_f) = factor_to_canonical(from)?;
    let (fam_t, fac_t) = factor_to_canonical(to)?;
    if fam_f != fam_t {
        return Err(NsError::InvalidArg {
            what: "unit conversion across dimension families",
        });
    }
    Ok(value * fac_f / fac_t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mev_fm3_factor() {
        // 1 MeV/fm^3 ~ 8.96e-7 Msun/km^3
        let f = convert("MeV/fm^3", "Msun/km^3", 1.0).unwrap();
        assert!((f - 8.9617e-7).abs() / 8.9617e-7 < 1e-4);
    }

    #[test]
    fn natural_units_chain() {
        let a = convert("1/fm^4", "Msun/km^3", 1.0).unwrap();
        let b = convert("MeV/fm^3", "Msun/km^3", HBARC_MEV_FM).unwrap();
        assert!((a - b).abs() < 1e-20);
    }

    #[test]
    fn round_trip() {
        let v = convert("g/cm^3", "MeV/fm^3", 2.8e14).unwrap();
        let back = convert("MeV/fm^3", "g/cm^3", v).unwrap();
        assert!((back - 2.8e14).abs() / 2.8e14 < 1e-12);
    }

    #[test]
    fn cross_family_rejected() {
        assert!(convert("1/fm^3", "MeV/fm^3", 1.0).is_err());
        assert!(convert("furlongs", "MeV/fm^3", 1.0).is_err());
    }
}
