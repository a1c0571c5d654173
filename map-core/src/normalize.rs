use geo_types::Point;

use crate::fields::{FieldChain, Row, coords};

/// Parse a decimal that may use either `.` or `,` as separator.
/// Returns `None` unless the result is a finite number.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    let v: f64 = t.replace(',', ".").parse().ok()?;
    v.is_finite().then_some(v)
}

/// Validated (latitude, longitude) pair.
pub fn lat_lon(lat: &str, lon: &str) -> Option<(f64, f64)> {
    let lat = parse_decimal(lat)?;
    let lon = parse_decimal(lon)?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
}

/// Parse a combined "lat, lon" cell such as `"(16.2, -61.48)"`.
///
/// A `;` takes precedence as the pair separator so each half may use a decimal
/// comma. Without one, the value is split on commas: two parts are read as-is,
/// four parts as two decimal-comma numbers.
pub fn parse_combined(raw: &str) -> Option<(f64, f64)> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '(' | ')'))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.contains(';') {
        let mut halves = cleaned.split(';');
        let (lat, lon) = (halves.next()?, halves.next()?);
        if halves.next().is_some() {
            return None;
        }
        return lat_lon(lat, lon);
    }

    let parts: Vec<&str> = cleaned.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [lat, lon] => lat_lon(lat, lon),
        [lat_int, lat_frac, lon_int, lon_frac] => lat_lon(
            &format!("{lat_int}.{lat_frac}"),
            &format!("{lon_int}.{lon_frac}"),
        ),
        _ => None,
    }
}

/// Position of a row: the combined cell first, the split columns otherwise.
/// `None` means the row has no usable coordinates and must be dropped.
pub fn coordinates<R: Row + ?Sized>(row: &R) -> Option<Point<f64>> {
    let from_combined = coords::COMBINED.first(row).and_then(parse_combined);
    let (lat, lon) = from_combined.or_else(|| {
        let lat = coords::LATITUDE.first(row)?;
        let lon = coords::LONGITUDE.first(row)?;
        lat_lon(lat, lon)
    })?;
    Some(Point::new(lon, lat))
}

/// Join the non-blank values found along `chains` with `sep`.
pub fn join_present<R: Row + ?Sized>(row: &R, chains: &[FieldChain], sep: &str) -> Option<String> {
    let parts: Vec<&str> = chains.iter().filter_map(|c| c.first(row)).collect();
    (!parts.is_empty()).then(|| parts.join(sep))
}
