use crate::errors::AppError;
use crate::proximity::Coordinate;
use validator::{ValidationError, ValidationErrors};

pub const MAX_MINE_RADIUS_KM: f64 = 500.0;
pub const MIN_REPORT_RADIUS_KM: f64 = 1.0;
pub const MAX_REPORT_RADIUS_KM: f64 = 100.0;
pub const MAX_CASE_ID_CHARS: usize = 100;

pub fn validate_lat(lat: f64) -> Result<(), ValidationError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::new("latitude"));
    }
    Ok(())
}

pub fn validate_lng(lng: f64) -> Result<(), ValidationError> {
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(ValidationError::new("longitude"));
    }
    Ok(())
}

pub fn validate_mine_radius(radius: f64) -> Result<(), ValidationError> {
    if !radius.is_finite() || radius <= 0.0 || radius > MAX_MINE_RADIUS_KM {
        return Err(ValidationError::new("radius"));
    }
    Ok(())
}

pub fn validate_report_radius(radius: f64) -> Result<(), ValidationError> {
    if !radius.is_finite() || !(MIN_REPORT_RADIUS_KM..=MAX_REPORT_RADIUS_KM).contains(&radius) {
        return Err(ValidationError::new("radius"));
    }
    Ok(())
}

/// Length check on the trimmed value, counted in characters.
pub fn validate_comment_text(text: &str) -> Result<(), ValidationError> {
    let len = text.trim().chars().count();
    if !(1..=1000).contains(&len) {
        return Err(ValidationError::new("text")
            .with_message("ความคิดเห็นต้องมีความยาว 1-1000 ตัวอักษร".into()));
    }
    Ok(())
}

pub fn validation_failed(errors: ValidationErrors) -> AppError {
    AppError::Validation(format!("Validation failed: {errors}"))
}

pub fn coordinate(lat: f64, lng: f64) -> Result<Coordinate, AppError> {
    Coordinate::new(lat, lng).ok_or_else(|| {
        AppError::Validation(
            "Latitude must be between -90 and 90 and longitude between -180 and 180".to_string(),
        )
    })
}

/// Parses a path segment as a coordinate component, rejecting anything that is
/// not a plain finite number.
pub fn parse_degrees(raw: &str, name: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::Validation(format!("{name} must be a number")))
}

/// Trims a case identifier taken from the path and bounds its length.
pub fn case_id(raw: String) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_CASE_ID_CHARS {
        return Err(AppError::Validation(format!(
            "Case id must be between 1 and {MAX_CASE_ID_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lat_lng_bounds() {
        assert!(validate_lat(90.0).is_ok());
        assert!(validate_lat(-90.1).is_err());
        assert!(validate_lat(f64::NAN).is_err());
        assert!(validate_lng(180.0).is_ok());
        assert!(validate_lng(-180.0).is_ok());
        assert!(validate_lng(180.5).is_err());
    }

    #[test]
    fn mine_radius_excludes_zero_and_caps_at_500() {
        assert!(validate_mine_radius(0.0).is_err());
        assert!(validate_mine_radius(0.1).is_ok());
        assert!(validate_mine_radius(500.0).is_ok());
        assert!(validate_mine_radius(500.01).is_err());
        assert!(validate_mine_radius(f64::INFINITY).is_err());
    }

    #[test]
    fn report_radius_is_between_1_and_100() {
        assert!(validate_report_radius(0.5).is_err());
        assert!(validate_report_radius(1.0).is_ok());
        assert!(validate_report_radius(100.0).is_ok());
        assert!(validate_report_radius(101.0).is_err());
    }

    #[test]
    fn comment_text_counts_trimmed_characters() {
        assert!(validate_comment_text("   ").is_err());
        assert!(validate_comment_text(" ดี ").is_ok());
        assert!(validate_comment_text(&"ก".repeat(1000)).is_ok());
        assert!(validate_comment_text(&"ก".repeat(1001)).is_err());
    }

    #[test]
    fn parse_degrees_is_strict() {
        assert_eq!(parse_degrees(" 13.75 ", "lat").unwrap(), 13.75);
        assert!(parse_degrees("13.75abc", "lat").is_err());
        assert!(parse_degrees("NaN", "lat").is_err());
        assert!(parse_degrees("", "lat").is_err());
    }

    #[test]
    fn case_id_is_trimmed_and_bounded() {
        assert_eq!(case_id(" CASE-7 ".into()).unwrap(), "CASE-7");
        assert!(case_id("   ".into()).is_err());
        assert!(case_id("ก".repeat(MAX_CASE_ID_CHARS)).is_ok());
        assert!(case_id("ก".repeat(MAX_CASE_ID_CHARS + 1)).is_err());
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'q'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;&#x2F;script&gt; &amp; &#x27;q&#x27;"
        );
        assert_eq!(escape_html("เหมืองแร่"), "เหมืองแร่");
    }
}
