//! # Result Tables
//!
//! Whitespace-separated text tables written by the driver commands. Each
//! starts with `#` header lines and uses C `%g` number formatting so that
//! existing plotting scripts read them unchanged.

use gtsa_core::{Barrier, FreeEnergyProfile, GtsaError, SweepPoint};
use ndarray::Array2;
use std::io::Write;

// =============================================================================
// NUMBER FORMATTING
// =============================================================================

/// Significant digits of `%g`.
const G_PRECISION: i32 = 6;

/// Format `x` like C's `printf("%g", x)`.
#[must_use]
pub fn format_g(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Exponent after rounding to the target precision
    let sci = format!("{:.*e}", (G_PRECISION - 1) as usize, x);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= G_PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (G_PRECISION - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, x)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

// =============================================================================
// TABLES
// =============================================================================

/// `# epsilon rho yield`, one line per sweep point.
pub fn write_yield_table<W: Write>(
    writer: &mut W,
    rho: f64,
    points: &[SweepPoint<f64>],
) -> Result<(), GtsaError> {
    writeln!(writer, "# epsilon rho yield")?;
    for p in points {
        writeln!(
            writer,
            "{} {} {}",
            format_g(p.epsilon),
            format_g(rho),
            format_g(p.value)
        )?;
    }
    Ok(())
}

/// `# epsilon rho nucleation_barrier_V nucleation_barrier_fe`. A downhill
/// profile is written as a zero barrier at size 0.
pub fn write_barrier_table<W: Write>(
    writer: &mut W,
    rho: f64,
    points: &[SweepPoint<Barrier>],
) -> Result<(), GtsaError> {
    writeln!(
        writer,
        "# epsilon rho nucleation_barrier_V nucleation_barrier_fe"
    )?;
    for p in points {
        let (size, height) = p.value.or_zero();
        writeln!(
            writer,
            "{} {} {} {}",
            format_g(p.epsilon),
            format_g(rho),
            size,
            format_g(height)
        )?;
    }
    Ok(())
}

/// `# V F(V)` for `V = 1..len`, preceded by the bond energy.
pub fn write_profile_table<W: Write>(
    writer: &mut W,
    epsilon: f64,
    profile: &FreeEnergyProfile,
) -> Result<(), GtsaError> {
    writeln!(writer, "# epsilon = {}", format_g(epsilon))?;
    writeln!(writer, "# V F(V)")?;
    for (v, f) in profile.points() {
        writeln!(writer, "{} {}", v, format_g(f))?;
    }
    Ok(())
}

/// `# V1 V2 Zin(V1,V2)` for `V1, V2 >= 1`, one block per `V1`.
pub fn write_incidental_table<W: Write>(
    writer: &mut W,
    epsilon: f64,
    ratio: f64,
    zin: &Array2<f64>,
) -> Result<(), GtsaError> {
    writeln!(writer, "# epsilon = {}", format_g(epsilon))?;
    writeln!(writer, "# on/off pathway ratio = {}", format_g(ratio))?;
    writeln!(writer, "# V1 V2 Zin(V1,V2)")?;
    for (v1, row) in zin.rows().into_iter().enumerate().skip(1) {
        for (v2, z) in row.iter().enumerate().skip(1) {
            writeln!(writer, "{} {} {}", v1, v2, format_g(*z))?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn g_format_matches_printf() {
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(1.0), "1");
        assert_eq!(format_g(-2.5), "-2.5");
        assert_eq!(format_g(0.1), "0.1");
        assert_eq!(format_g(100000.0), "100000");
        assert_eq!(format_g(1000000.0), "1e+06");
        assert_eq!(format_g(123456789.0), "1.23457e+08");
        assert_eq!(format_g(0.0001), "0.0001");
        assert_eq!(format_g(0.00001), "1e-05");
        assert_eq!(format_g(std::f64::consts::PI), "3.14159");
        assert_eq!(format_g(-1.0986122886681098), "-1.09861");
        assert_eq!(format_g(999999.5), "1e+06");
        assert_eq!(format_g(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn yield_table_layout() {
        let points = vec![
            SweepPoint {
                epsilon: 1.0,
                value: 0.25,
            },
            SweepPoint {
                epsilon: 1.5,
                value: 0.5,
            },
        ];
        let mut out = Vec::new();
        write_yield_table(&mut out, 0.01, &points).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "# epsilon rho yield\n1 0.01 0.25\n1.5 0.01 0.5\n");
    }

    #[test]
    fn barrier_table_zeroes_downhill() {
        let points = vec![
            SweepPoint {
                epsilon: 2.0,
                value: Barrier::Peak {
                    size: 4,
                    height: 3.25,
                },
            },
            SweepPoint {
                epsilon: 3.0,
                value: Barrier::Downhill,
            },
        ];
        let mut out = Vec::new();
        write_barrier_table(&mut out, 0.1, &points).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "2 0.1 4 3.25");
        assert_eq!(lines[2], "3 0.1 0 0");
    }

    #[test]
    fn profile_table_skips_index_zero() {
        let profile = FreeEnergyProfile::from_values(vec![0.0, -1.5, 2.0]);
        let mut out = Vec::new();
        write_profile_table(&mut out, -3.0, &profile).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "# epsilon = -3\n# V F(V)\n1 -1.5\n2 2\n");
    }

    #[test]
    fn incidental_table_blocks() {
        let zin = array![[9.0, 9.0, 9.0], [9.0, 0.5, 1.0], [9.0, 1.0, 2.0]];
        let mut out = Vec::new();
        write_incidental_table(&mut out, 1.0, 4.0, &zin).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text,
            "# epsilon = 1\n# on/off pathway ratio = 4\n# V1 V2 Zin(V1,V2)\n\
             1 1 0.5\n1 2 1\n\n2 1 1\n2 2 2\n\n"
        );
    }
}
