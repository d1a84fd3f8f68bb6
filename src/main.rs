mod analysis;
mod conditions;
mod report;

use analysis::run_heated_step;
use clap::Parser;
use conditions::{build_restrained_bar, BarProperties};
use report::render_summary;
use std::error::Error;

/// Temperature applied when none is given on the command line.
const DEFAULT_TEMPERATURE: f64 = 500.0;

/// Heat a steel bar fixed at both ends and report the thermal response.
#[derive(Parser, Debug)]
#[command(name = "thermx", version)]
struct Cli {
    /// Target steel temperature in °C (reference 20 °C, at most 1200 °C).
    #[arg(default_value_t = DEFAULT_TEMPERATURE, allow_negative_numbers = true)]
    temperature: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // A single steel bar held at both ends: any thermal expansion is fully
    // restrained, so heating shows up as axial compression.
    let properties = BarProperties::default();
    let (mut truss, bar) = build_restrained_bar(&properties)?;

    // Bind the fire-design degradation model to the bar, heat it and solve one
    // step of the linear analysis.
    let summary = run_heated_step(&mut truss, &bar, &properties, cli.temperature)?;

    println!("{}", render_summary(&summary));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_defaults_when_omitted() {
        let cli = Cli::try_parse_from(["thermx"]).expect("no arguments are required");
        assert_eq!(cli.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn temperature_is_read_from_the_first_argument() {
        let cli = Cli::try_parse_from(["thermx", "650"]).expect("numeric temperature");
        assert_eq!(cli.temperature, 650.0);
    }

    #[test]
    fn non_numeric_temperature_is_rejected() {
        assert!(Cli::try_parse_from(["thermx", "abc"]).is_err());
    }
}
