use geo_types::Coord;

/// Coordinates follow the geo-types convention: `x` is longitude, `y` is
/// latitude, both in degrees.
pub struct GeoUtils;

impl GeoUtils {
    pub const EARTH_RADIUS_M: f64 = 6_371_009.0;
    pub const POLYLINE_PRECISION: u32 = 5;

    /// Great-circle (haversine) distance in meters.
    pub fn distance(p1: Coord, p2: Coord) -> f64 {
        let lat1 = GeoUtils::deg2rad(p1.y);
        let lat2 = GeoUtils::deg2rad(p2.y);
        let d_lat = lat2 - lat1;
        let d_long = GeoUtils::deg2rad(p2.x - p1.x);

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_long / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        GeoUtils::EARTH_RADIUS_M * c
    }

    pub fn deg2rad(deg: f64) -> f64 {
        deg * std::f64::consts::PI / 180.0
    }

    pub fn rad2deg(rad: f64) -> f64 {
        rad * 180.0 / std::f64::consts::PI
    }

    pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
        (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
    }

    pub fn encode_path(coords: &[Coord]) -> Option<String> {
        polyline::encode_coordinates(coords.iter().copied(), GeoUtils::POLYLINE_PRECISION).ok()
    }

    pub fn get_coords_from_poly(polyline: &str) -> Vec<Coord> {
        match polyline::decode_polyline(polyline, GeoUtils::POLYLINE_PRECISION) {
            Ok(line_string) => line_string.coords().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Returns (south-west, north-east) corners, or `None` for an empty or
    /// undecodable polyline.
    pub fn get_bounding_box(polyline: &str) -> Option<(Coord, Coord)> {
        GeoUtils::bounding_box(&GeoUtils::get_coords_from_poly(polyline))
    }

    pub fn bounding_box(coords: &[Coord]) -> Option<(Coord, Coord)> {
        let first = coords.first()?;

        let mut min_lat = first.y;
        let mut min_long = first.x;
        let mut max_lat = first.y;
        let mut max_long = first.x;

        coords.iter().for_each(|coord| {
            min_lat = coord.y.min(min_lat);
            min_long = coord.x.min(min_long);

            max_lat = coord.y.max(max_lat);
            max_long = coord.x.max(max_long);
        });

        Some((
            Coord { x: min_long, y: min_lat },
            Coord { x: max_long, y: max_lat },
        ))
    }

    pub fn get_center_of_bbox(left_bottom: Coord, right_top: Coord) -> Coord {
        Coord {
            x: (left_bottom.x + right_top.x) / 2.,
            y: (left_bottom.y + right_top.y) / 2.,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let d = GeoUtils::distance(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 1.0 });
        assert_relative_eq!(d, 111_195.08, max_relative = 1e-4);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_same_point() {
        let a = Coord { x: 8.5417, y: 47.3769 };
        let b = Coord { x: 8.5500, y: 47.3800 };

        assert_relative_eq!(GeoUtils::distance(a, b), GeoUtils::distance(b, a));
        assert_eq!(GeoUtils::distance(a, a), 0.0);
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(GeoUtils::is_valid_coordinate(90.0, -180.0));
        assert!(!GeoUtils::is_valid_coordinate(90.01, 0.0));
        assert!(!GeoUtils::is_valid_coordinate(0.0, 180.5));
        assert!(!GeoUtils::is_valid_coordinate(f64::NAN, 0.0));
    }

    #[test]
    fn test_encoded_path_bounding_box() {
        let path = vec![
            Coord { x: -120.2, y: 38.5 },
            Coord { x: -120.95, y: 40.7 },
            Coord { x: -126.453, y: 43.252 },
        ];

        let encoded = GeoUtils::encode_path(&path).unwrap();
        assert_eq!(encoded, "_p~iF~ps|U_ulLnnqC_mqNvxq`@");

        let (sw, ne) = GeoUtils::get_bounding_box(&encoded).unwrap();
        assert_relative_eq!(sw.x, -126.453, epsilon = 1e-5);
        assert_relative_eq!(sw.y, 38.5, epsilon = 1e-5);
        assert_relative_eq!(ne.x, -120.2, epsilon = 1e-5);
        assert_relative_eq!(ne.y, 43.252, epsilon = 1e-5);

        let center = GeoUtils::get_center_of_bbox(sw, ne);
        assert_relative_eq!(center.y, 40.876, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_path_has_no_bounding_box() {
        assert!(GeoUtils::bounding_box(&[]).is_none());
        assert!(GeoUtils::get_bounding_box("").is_none());
    }
}
