//! Static route and aircraft tables used to synthesize empty-leg pricing.

use rand::Rng;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Taxi, climb and descent allowance added to every block time.
pub const GROUND_MINUTES: f64 = 30.0;
pub const MIN_REGULAR_PRICE: f64 = 2500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Airport {
    pub icao: &'static str,
    pub name: &'static str,
    pub city: &'static str,
    pub lat: f64,
    pub lon: f64,
}

const fn ap(icao: &'static str, name: &'static str, city: &'static str, lat: f64, lon: f64) -> Airport {
    Airport { icao, name, city, lat, lon }
}

pub const AIRPORTS: &[Airport] = &[
    ap("KTEB", "Teterboro", "New York", 40.8501, -74.0608),
    ap("KVNY", "Van Nuys", "Los Angeles", 34.2098, -118.4895),
    ap("KMIA", "Miami International", "Miami", 25.7959, -80.2870),
    ap("KPBI", "Palm Beach International", "West Palm Beach", 26.6832, -80.0956),
    ap("KLAS", "Harry Reid International", "Las Vegas", 36.0840, -115.1537),
    ap("KASE", "Aspen/Pitkin County", "Aspen", 39.2232, -106.8688),
    ap("KSFO", "San Francisco International", "San Francisco", 37.6213, -122.3790),
    ap("KORD", "O'Hare International", "Chicago", 41.9742, -87.9073),
    ap("KDAL", "Dallas Love Field", "Dallas", 32.8471, -96.8518),
    ap("KBOS", "Logan International", "Boston", 42.3656, -71.0096),
    ap("MYNN", "Lynden Pindling International", "Nassau", 25.0390, -77.4662),
    ap("TNCM", "Princess Juliana International", "St. Maarten", 18.0410, -63.1089),
    ap("EGLF", "Farnborough", "London", 51.2758, -0.7763),
    ap("EGGW", "Luton", "London", 51.8747, -0.3683),
    ap("LFPB", "Le Bourget", "Paris", 48.9694, 2.4414),
    ap("LFMN", "Côte d'Azur", "Nice", 43.6584, 7.2159),
    ap("LSGG", "Geneva", "Geneva", 46.2381, 6.1090),
    ap("LIML", "Linate", "Milan", 45.4451, 9.2767),
    ap("LEMD", "Adolfo Suárez Barajas", "Madrid", 40.4719, -3.5626),
    ap("LEIB", "Ibiza", "Ibiza", 38.8729, 1.3731),
    ap("EDDM", "Munich", "Munich", 48.3538, 11.7861),
    ap("OMDB", "Dubai International", "Dubai", 25.2532, 55.3657),
];

pub fn airport(icao: &str) -> Option<&'static Airport> {
    AIRPORTS.iter().find(|a| a.icao.eq_ignore_ascii_case(icao))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Route {
    pub from: &'static str,
    pub to: &'static str,
}

const fn r(from: &'static str, to: &'static str) -> Route {
    Route { from, to }
}

/// Routes kept priced by the scheduled refresh.
pub const ROUTES: &[Route] = &[
    r("KTEB", "KPBI"),
    r("KTEB", "KMIA"),
    r("KVNY", "KLAS"),
    r("KVNY", "KASE"),
    r("KSFO", "KVNY"),
    r("KORD", "KTEB"),
    r("KDAL", "KASE"),
    r("KBOS", "KTEB"),
    r("KTEB", "EGLF"),
    r("KMIA", "MYNN"),
    r("KMIA", "TNCM"),
    r("EGLF", "LFPB"),
    r("EGGW", "LFMN"),
    r("LFPB", "LSGG"),
    r("LSGG", "LIML"),
    r("LEMD", "LEIB"),
    r("EDDM", "LFMN"),
    r("EGLF", "OMDB"),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AircraftArchetype {
    pub category: &'static str,
    pub model: &'static str,
    pub seats: i32,
    pub cruise_kmh: f64,
    pub range_km: f64,
    /// Charter rate per great-circle km.
    pub rate_per_km: f64,
}

pub const ARCHETYPES: &[AircraftArchetype] = &[
    AircraftArchetype { category: "turboprop", model: "Pilatus PC-12", seats: 8, cruise_kmh: 500.0, range_km: 2800.0, rate_per_km: 4.5 },
    AircraftArchetype { category: "light", model: "Citation CJ3+", seats: 7, cruise_kmh: 720.0, range_km: 3700.0, rate_per_km: 6.0 },
    AircraftArchetype { category: "midsize", model: "Hawker 800XP", seats: 8, cruise_kmh: 780.0, range_km: 4600.0, rate_per_km: 8.0 },
    AircraftArchetype { category: "super-midsize", model: "Challenger 350", seats: 9, cruise_kmh: 830.0, range_km: 5900.0, rate_per_km: 10.5 },
    AircraftArchetype { category: "heavy", model: "Gulfstream G450", seats: 14, cruise_kmh: 870.0, range_km: 8000.0, rate_per_km: 14.0 },
    AircraftArchetype { category: "ultra-long-range", model: "Global 6000", seats: 14, cruise_kmh: 900.0, range_km: 11000.0, rate_per_km: 17.0 },
];

pub fn archetype(category: &str) -> Option<&'static AircraftArchetype> {
    ARCHETYPES.iter().find(|a| a.category.eq_ignore_ascii_case(category))
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PricingError {
    #[error("unknown airport {0}")]
    UnknownAirport(String),
    #[error("no aircraft can fly {0:.0} km nonstop")]
    OutOfRange(f64),
    #[error("unknown aircraft category {0}")]
    UnknownCategory(String),
}

pub fn haversine_km(a: &Airport, b: &Airport) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

pub fn flight_minutes(distance_km: f64, aircraft: &AircraftArchetype) -> i32 {
    (distance_km / aircraft.cruise_kmh * 60.0 + GROUND_MINUTES).round() as i32
}

fn regular_price(distance_km: f64, aircraft: &AircraftArchetype, jitter: f64) -> f64 {
    (distance_km * aircraft.rate_per_km * jitter)
        .round()
        .max(MIN_REGULAR_PRICE)
}

/// `round((regular - price) / regular * 100)`, 0 for a non-positive regular price.
pub fn savings_percentage(regular_price: f64, price: f64) -> i32 {
    if regular_price <= 0.0 {
        return 0;
    }
    ((regular_price - price) / regular_price * 100.0).round() as i32
}

/// A freshly synthesized price for one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuote {
    pub from: &'static Airport,
    pub to: &'static Airport,
    pub distance_km: f64,
    pub aircraft: &'static AircraftArchetype,
    pub duration_minutes: i32,
    pub regular_price: f64,
    pub price: f64,
    pub savings_percentage: i32,
    pub departure: OffsetDateTime,
}

fn endpoints(from: &str, to: &str) -> Result<(&'static Airport, &'static Airport), PricingError> {
    let a = airport(from).ok_or_else(|| PricingError::UnknownAirport(from.to_string()))?;
    let b = airport(to).ok_or_else(|| PricingError::UnknownAirport(to.to_string()))?;
    Ok((a, b))
}

pub fn quote_route<R: Rng>(
    route: &Route,
    rng: &mut R,
    now: OffsetDateTime,
) -> Result<RouteQuote, PricingError> {
    let (from, to) = endpoints(route.from, route.to)?;
    let distance_km = haversine_km(from, to);

    let eligible: Vec<&'static AircraftArchetype> =
        ARCHETYPES.iter().filter(|a| a.range_km >= distance_km).collect();
    if eligible.is_empty() {
        return Err(PricingError::OutOfRange(distance_km));
    }
    let aircraft = eligible[rng.gen_range(0..eligible.len())];

    let regular = regular_price(distance_km, aircraft, rng.gen_range(0.9..=1.1));
    let discount = rng.gen_range(0.30..=0.70);
    let price = (regular * (1.0 - discount)).round();

    let departure = now
        + Duration::days(rng.gen_range(1..=30))
        + Duration::hours(rng.gen_range(0..24));

    Ok(RouteQuote {
        from,
        to,
        distance_km,
        aircraft,
        duration_minutes: flight_minutes(distance_km, aircraft),
        regular_price: regular,
        price,
        savings_percentage: savings_percentage(regular, price),
        departure,
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceEstimate {
    pub from: &'static Airport,
    pub to: &'static Airport,
    pub distance_km: f64,
    pub aircraft: &'static AircraftArchetype,
    pub duration_minutes: i32,
    pub regular_price: f64,
    pub empty_leg_price: f64,
}

/// Deterministic midpoint estimate (no jitter, 50% discount).
pub fn estimate(from: &str, to: &str, category: Option<&str>) -> Result<PriceEstimate, PricingError> {
    let (a, b) = endpoints(from, to)?;
    let distance_km = haversine_km(a, b);
    let aircraft = match category {
        Some(c) => archetype(c).ok_or_else(|| PricingError::UnknownCategory(c.to_string()))?,
        None => ARCHETYPES
            .iter()
            .find(|a| a.range_km >= distance_km)
            .ok_or(PricingError::OutOfRange(distance_km))?,
    };
    if aircraft.range_km < distance_km {
        return Err(PricingError::OutOfRange(distance_km));
    }
    let regular = regular_price(distance_km, aircraft, 1.0);
    Ok(PriceEstimate {
        from: a,
        to: b,
        distance_km: distance_km.round(),
        aircraft,
        duration_minutes: flight_minutes(distance_km, aircraft),
        regular_price: regular,
        empty_leg_price: (regular * 0.5).round(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn within(actual: f64, expected: f64, pct: f64) -> bool {
        (actual - expected).abs() <= expected * pct / 100.0
    }

    #[test]
    fn every_route_uses_known_airports() {
        assert_eq!(ROUTES.len(), 18);
        for r in ROUTES {
            assert!(airport(r.from).is_some(), "{}", r.from);
            assert!(airport(r.to).is_some(), "{}", r.to);
        }
        assert_eq!(ARCHETYPES.len(), 6);
    }

    #[test]
    fn haversine_matches_reference_distances() {
        let paris = Airport { icao: "", name: "", city: "", lat: 48.8566, lon: 2.3522 };
        let london = Airport { icao: "", name: "", city: "", lat: 51.5074, lon: -0.1278 };
        assert!(within(haversine_km(&london, &paris), 343.5, 1.0));

        let jfk = Airport { icao: "", name: "", city: "", lat: 40.6413, lon: -73.7781 };
        let lhr = Airport { icao: "", name: "", city: "", lat: 51.4700, lon: -0.4543 };
        assert!(within(haversine_km(&jfk, &lhr), 5555.0, 1.0));
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_self() {
        let a = airport("KTEB").unwrap();
        let b = airport("KPBI").unwrap();
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
        assert_eq!(haversine_km(a, a), 0.0);
    }

    #[test]
    fn savings_rounds_and_guards_zero() {
        assert_eq!(savings_percentage(10_000.0, 4_000.0), 60);
        assert_eq!(savings_percentage(3.0, 2.0), 33);
        assert_eq!(savings_percentage(0.0, 100.0), 0);
    }

    #[test]
    fn quotes_stay_within_discount_and_range_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let now = OffsetDateTime::now_utc();
        for route in ROUTES {
            for _ in 0..20 {
                let q = quote_route(route, &mut rng, now).unwrap();
                assert!(q.aircraft.range_km >= q.distance_km);
                assert!(q.regular_price >= MIN_REGULAR_PRICE);
                assert!((29..=71).contains(&q.savings_percentage), "{}", q.savings_percentage);
                assert!(q.price < q.regular_price);
                assert!(q.departure > now + Duration::hours(23));
                assert!(q.departure < now + Duration::days(31));
                assert!(q.duration_minutes > GROUND_MINUTES as i32);
            }
        }
    }

    #[test]
    fn transatlantic_route_excludes_short_range_types() {
        let mut rng = StdRng::seed_from_u64(1);
        let route = Route { from: "KTEB", to: "EGLF" };
        for _ in 0..50 {
            let q = quote_route(&route, &mut rng, OffsetDateTime::now_utc()).unwrap();
            assert!(!["turboprop", "light", "midsize"].contains(&q.aircraft.category));
        }
    }

    #[test]
    fn unknown_airport_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = quote_route(&Route { from: "XXXX", to: "KTEB" }, &mut rng, OffsetDateTime::now_utc())
            .unwrap_err();
        assert_eq!(err, PricingError::UnknownAirport("XXXX".into()));
    }

    #[test]
    fn estimate_is_deterministic() {
        let a = estimate("EGLF", "LFPB", None).unwrap();
        let b = estimate("eglf", "lfpb", None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.aircraft.category, "turboprop");
        assert_eq!(a.empty_leg_price, (a.regular_price * 0.5).round());
        assert!(matches!(
            estimate("KTEB", "OMDB", Some("light")),
            Err(PricingError::OutOfRange(_))
        ));
        assert!(matches!(
            estimate("KTEB", "KPBI", Some("blimp")),
            Err(PricingError::UnknownCategory(_))
        ));
    }
}
