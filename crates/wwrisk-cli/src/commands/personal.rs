//! Personal command - personalized mortality risk for a region score.

use std::path::PathBuf;

use chrono::Datelike;
use colored::Colorize;
use wwrisk::mortality::age_group_for;
use wwrisk::{Demographics, MortalityCalculator};

#[allow(clippy::too_many_arguments)]
pub fn run(
    multipliers: PathBuf,
    risk_score: String,
    age_group: Option<String>,
    birth_year: Option<i32>,
    sex: Option<String>,
    race: Option<String>,
    ethnicity: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let calculator = MortalityCalculator::from_path(&multipliers)?;

    let age_group = age_group.or_else(|| {
        let current_year = chrono::Local::now().year();
        birth_year
            .and_then(|year| age_group_for(year, current_year))
            .map(str::to_string)
    });
    let demographics = Demographics {
        age_group,
        sex,
        race,
        ethnicity,
    };

    let risk = calculator.compute_from_str(&demographics, &risk_score)?;

    if json {
        let body = serde_json::json!({
            "category": risk.category(),
            "final_risk": risk.final_risk,
            "confidence": risk.confidence,
            "combined_multiplier": risk.combined_multiplier,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Will COVID get me?".cyan().bold(),
        risk.category().label().white().bold()
    );
    println!(
        "Personalized risk {:.1} (range {:.1} - {:.1}, multiplier {:.2}, {} cases)",
        risk.final_risk,
        risk.confidence.low,
        risk.confidence.high,
        risk.combined_multiplier,
        risk.confidence.sample_size
    );
    Ok(())
}
