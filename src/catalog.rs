// Location catalog
// Compiled-in region -> city sampling parameters for temperature and
// rainfall, plus the pure sampling functions drawn against them
//
// Numan Thabit 2025 Nov

use crate::errors::WeatherError;
use once_cell::sync::Lazy;
use rand::Rng;
use std::collections::BTreeMap;

/// Temperature parameters for one city: samples fall in `[min_temp, min_temp + temp_range)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempInfo {
    pub min_temp: i64,
    pub temp_range: i64,
}

impl TempInfo {
    const fn new(min_temp: i64, temp_range: i64) -> Self {
        Self { min_temp, temp_range }
    }
}

/// Immutable region -> city -> parameters table.
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    regions: BTreeMap<&'static str, BTreeMap<&'static str, T>>,
}

impl<T> Catalog<T> {
    fn from_regions(regions: &[(&'static str, &[(&'static str, T)])]) -> Self
    where
        T: Copy,
    {
        let regions: BTreeMap<_, BTreeMap<_, T>> = regions
            .iter()
            .map(|(region, cities)| (*region, cities.iter().copied().collect()))
            .collect();
        Self { regions }
    }

    pub fn lookup(&self, region: &str, city: &str) -> Result<&T, WeatherError> {
        self.regions
            .get(region)
            .and_then(|cities| cities.get(city))
            .ok_or_else(|| WeatherError::UnknownLocation {
                region: region.to_string(),
                city: city.to_string(),
            })
    }

    /// Every `(region, city, params)` entry, ordered by region then city.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str, &T)> + '_ {
        self.regions.iter().flat_map(|(region, cities)| {
            cities.iter().map(move |(city, params)| (*region, *city, params))
        })
    }

    pub fn regions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.regions.keys().copied()
    }

    pub fn city_count(&self) -> usize {
        self.regions.values().map(BTreeMap::len).sum()
    }
}

const MIDWEST_TEMPS: &[(&str, TempInfo)] = &[
    ("chicago", TempInfo::new(34, 11)),
    ("minneapolis", TempInfo::new(24, 20)),
    ("milwaukee", TempInfo::new(31, 11)),
    ("indianapolis", TempInfo::new(31, 19)),
];

const PNW_TEMPS: &[(&str, TempInfo)] = &[
    ("seattle", TempInfo::new(42, 10)),
    ("portland", TempInfo::new(41, 15)),
    ("tacoma", TempInfo::new(37, 16)),
    ("bend", TempInfo::new(27, 24)),
];

const SOUTH_TEMPS: &[(&str, TempInfo)] = &[
    ("atlanta", TempInfo::new(42, 24)),
    ("orlando", TempInfo::new(57, 22)),
    ("charleston", TempInfo::new(51, 15)),
];

const EAST_TEMPS: &[(&str, TempInfo)] = &[
    ("new york", TempInfo::new(36, 15)),
    ("boston", TempInfo::new(31, 15)),
    ("dc", TempInfo::new(35, 16)),
    ("baltimore", TempInfo::new(39, 16)),
];

static TEMPERATURE: Lazy<Catalog<TempInfo>> = Lazy::new(|| {
    Catalog::from_regions(&[
        ("midwest", MIDWEST_TEMPS),
        ("pnw", PNW_TEMPS),
        ("south", SOUTH_TEMPS),
        ("east", EAST_TEMPS),
    ])
});

static PERF_TEMPERATURE: Lazy<Catalog<TempInfo>> =
    Lazy::new(|| Catalog::from_regions(&[("midwest", MIDWEST_TEMPS), ("pnw", PNW_TEMPS)]));

static RAINFALL: Lazy<Catalog<f64>> = Lazy::new(|| {
    Catalog::from_regions(&[
        (
            "midwest",
            &[
                ("chicago", 0.07),
                ("minneapolis", 0.02),
                ("milwaukee", 0.01),
                ("indianapolis", 0.063),
            ],
        ),
        (
            "pnw",
            &[
                ("seattle", 0.13),
                ("portland", 0.15),
                ("tacoma", 0.15),
                ("bend", 0.05),
            ],
        ),
        (
            "south",
            &[("atlanta", 0.029), ("orlando", 0.09), ("charleston", 0.107)],
        ),
        (
            "east",
            &[
                ("new york", 0.1),
                ("boston", 0.113),
                ("dc", 0.097),
                ("baltimore", 0.074),
            ],
        ),
    ])
});

/// Full temperature catalog used by the normal-mode sampler.
pub fn temperature_catalog() -> &'static Catalog<TempInfo> {
    &TEMPERATURE
}

/// Midwest and PNW only; used by the perf-mode gauge pool.
pub fn perf_temperature_catalog() -> &'static Catalog<TempInfo> {
    &PERF_TEMPERATURE
}

/// Average rainfall per city, in inches.
pub fn rainfall_catalog() -> &'static Catalog<f64> {
    &RAINFALL
}

/// Integer temperature drawn uniformly from `[min_temp, min_temp + temp_range)`.
pub fn sample_temperature<R: Rng + ?Sized>(info: &TempInfo, rng: &mut R) -> f64 {
    (rng.gen_range(0..info.temp_range) + info.min_temp) as f64
}

/// Rainfall drawn from `[avg, avg + 0.1)` in 0.01 steps.
pub fn sample_rainfall<R: Rng + ?Sized>(avg: f64, rng: &mut R) -> f64 {
    (rng.gen_range(0..10) as f64 + avg * 100.0) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn catalogs_have_expected_shape() {
        assert_eq!(temperature_catalog().city_count(), 15);
        assert_eq!(rainfall_catalog().city_count(), 15);
        assert_eq!(perf_temperature_catalog().city_count(), 8);

        let perf_regions: Vec<_> = perf_temperature_catalog().regions().collect();
        assert_eq!(perf_regions, vec!["midwest", "pnw"]);
    }

    #[test]
    fn perf_catalog_is_subset_of_full_catalog() {
        for (region, city, info) in perf_temperature_catalog().iter() {
            let full = temperature_catalog().lookup(region, city).unwrap();
            assert_eq!(full, info);
        }
    }

    #[test]
    fn rainfall_covers_every_temperature_city() {
        for (region, city, _) in temperature_catalog().iter() {
            assert!(rainfall_catalog().lookup(region, city).is_ok(), "{region}/{city}");
        }
    }

    #[test]
    fn lookup_miss_is_reported() {
        let err = temperature_catalog().lookup("south", "seattle").unwrap_err();
        assert!(matches!(
            err,
            WeatherError::UnknownLocation { ref region, ref city } if region == "south" && city == "seattle"
        ));
        assert!(temperature_catalog().lookup("arctic", "alert").is_err());
    }

    #[test]
    fn lookup_returns_compiled_parameters() {
        assert_eq!(
            *temperature_catalog().lookup("midwest", "chicago").unwrap(),
            TempInfo::new(34, 11)
        );
        assert_eq!(*rainfall_catalog().lookup("pnw", "seattle").unwrap(), 0.13);
    }

    #[test]
    fn temperature_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for (_, _, info) in temperature_catalog().iter() {
            for _ in 0..500 {
                let v = sample_temperature(info, &mut rng);
                assert_eq!(v.fract(), 0.0);
                assert!(v >= info.min_temp as f64);
                assert!(v < (info.min_temp + info.temp_range) as f64);
            }
        }
    }

    #[test]
    fn rainfall_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for (_, _, avg) in rainfall_catalog().iter() {
            for _ in 0..500 {
                let v = sample_rainfall(*avg, &mut rng);
                assert!(v >= avg - 1e-9, "{v} < {avg}");
                assert!(v < avg + 0.1 - 1e-9, "{v} >= {avg} + 0.1");
            }
        }
    }
}
