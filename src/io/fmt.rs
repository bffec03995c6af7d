//! Float formatting compatible with the printf-style conventions the KIM
//! driver parses (`%e` with a signed two-digit exponent, `%g`).

/// Formats `value` like printf `%{width}.{precision}e`.
pub fn sci(value: f64, width: usize, precision: usize) -> String {
    let body = if value.is_finite() {
        let raw = format!("{:.*e}", precision, value);
        match raw.split_once('e') {
            Some((mantissa, exp)) => {
                let exp: i32 = exp.parse().unwrap_or(0);
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{mantissa}e{sign}{:02}", exp.abs())
            }
            None => raw,
        }
    } else {
        non_finite(value)
    };
    format!("{:>width$}", body, width = width)
}

/// Formats `value` like printf `%.{precision}g`.
pub fn general(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    let raw = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = match raw.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return raw,
    };

    if exp < -4 || exp >= precision as i32 {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

fn non_finite(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value > 0.0 {
        "inf".to_string()
    } else {
        "-inf".to_string()
    }
}
