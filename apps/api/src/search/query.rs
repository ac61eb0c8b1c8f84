use serde::Deserialize;

use crate::geo::Coordinate;

/// Raw query-string parameters. Everything is text so malformed numbers can be
/// downgraded instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub location: Option<String>,
    pub radius: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub salary_min: Option<String>,
    pub salary_max: Option<String>,
}

/// A validated search. `radius == None` means "any distance".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub location: String,
    pub radius: Option<f64>,
    pub center: Option<Coordinate>,
    pub salary: SalaryBand,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SalaryBand {
    pub min: Option<i32>,
    pub max: Option<i32>,
}

impl From<SearchParams> for SearchRequest {
    fn from(params: SearchParams) -> Self {
        let query = trimmed(params.q);
        let location = trimmed(params.location);

        let mut radius = parse_radius(params.radius.as_deref());

        let lat = trimmed(params.lat);
        let lon = trimmed(params.lon);
        let center = if lat.is_empty() && lon.is_empty() {
            None
        } else {
            let parsed = Coordinate::parse(&lat, &lon);
            if parsed.is_none() {
                // Bad coordinates behave like a request without a radius.
                radius = None;
            }
            parsed
        };

        SearchRequest {
            query,
            location,
            radius,
            center,
            salary: SalaryBand {
                min: parse_salary(params.salary_min.as_deref()),
                max: parse_salary(params.salary_max.as_deref()),
            },
        }
    }
}

/// A radius must be a finite, non-negative number of miles.
pub fn parse_radius(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|r| r.is_finite() && *r >= 0.0)
}

fn parse_salary(raw: Option<&str>) -> Option<i32> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i32>().ok())
        .filter(|v| *v >= 0)
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}
