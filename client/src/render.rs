use std::io::{self, Write};

use churn_common::{CustomerRecord, PredictionResponse};

pub fn render_result<W: Write>(out: &mut W, result: &PredictionResponse) -> io::Result<()> {
    let (risk, marker) = if result.is_high_risk {
        ("High", "[!]")
    } else {
        ("Low", "[ok]")
    };

    writeln!(out, "\nAnalysis complete: {}", result.model_output)?;
    writeln!(out, "Predicted churn probability: {}", result.churn_probability)?;
    writeln!(out, "Risk: {risk}")?;
    writeln!(out, "\nAction recommendation")?;
    writeln!(out, "{marker} {}", result.recommended_action)
}

pub fn render_input<W: Write>(out: &mut W, record: &CustomerRecord) -> io::Result<()> {
    let json = serde_json::to_string_pretty(record).map_err(io::Error::other)?;
    writeln!(out, "\nRaw input data sent:\n{json}")
}
