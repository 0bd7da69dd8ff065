//! Line-oriented form with constrained inputs.
//!
//! Categorical fields are picked from a numbered list; numeric fields are
//! re-prompted until they parse and fall inside their bounds. An empty answer
//! keeps the default.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use churn_common::{
    Contract, CustomerRecord, Gender, InternetAddon, InternetService, MultipleLines,
    PaymentMethod, YesNo,
};

pub const MAX_TENURE_MONTHS: u32 = 72;
pub const MAX_MONTHLY_CHARGES: f64 = 120.0;

pub struct Form<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before the form was complete",
            ));
        }
        Ok(line.trim().to_string())
    }

    pub fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.output, "\n== {title} ==")
    }

    /// Accepts a list index (1-based) or the label itself, case-insensitively.
    pub fn select<T>(&mut self, label: &str, options: &[T], default: T) -> io::Result<T>
    where
        T: Copy + PartialEq + Display,
    {
        loop {
            writeln!(self.output, "{label}:")?;
            for (i, option) in options.iter().enumerate() {
                let marker = if *option == default { "*" } else { " " };
                writeln!(self.output, " {marker}{}. {option}", i + 1)?;
            }
            write!(self.output, "Choice [{default}]: ")?;
            self.output.flush()?;

            let answer = self.read_answer()?;
            if answer.is_empty() {
                return Ok(default);
            }
            if let Ok(index) = answer.parse::<usize>() {
                if (1..=options.len()).contains(&index) {
                    return Ok(options[index - 1]);
                }
            }
            if let Some(option) = options
                .iter()
                .find(|option| option.to_string().eq_ignore_ascii_case(&answer))
            {
                return Ok(*option);
            }
            writeln!(
                self.output,
                "Please pick a number between 1 and {}.",
                options.len()
            )?;
        }
    }

    /// `max` of `None` leaves the value unbounded above.
    pub fn number<T>(&mut self, label: &str, min: T, max: Option<T>, default: T) -> io::Result<T>
    where
        T: Copy + PartialOrd + Display + FromStr,
    {
        loop {
            match max {
                Some(max) => write!(self.output, "{label} ({min}-{max}) [{default}]: ")?,
                None => write!(self.output, "{label} (>= {min}) [{default}]: ")?,
            }
            self.output.flush()?;

            let answer = self.read_answer()?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<T>() {
                Ok(value) if value >= min && max.map_or(true, |max| value <= max) => {
                    return Ok(value)
                }
                _ => writeln!(self.output, "Please enter a number in range.")?,
            }
        }
    }

    pub fn confirm(&mut self, label: &str) -> io::Result<bool> {
        let answer = self.select(label, YesNo::ALL, YesNo::Yes)?;
        Ok(answer == YesNo::Yes)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Walks the user through every field, starting from `defaults`.
pub fn collect_record<R: BufRead, W: Write>(
    form: &mut Form<R, W>,
    defaults: &CustomerRecord,
) -> io::Result<CustomerRecord> {
    form.section("Customer demographics")?;
    let gender = form.select("Gender", Gender::ALL, defaults.gender)?;
    let senior_default = if defaults.senior_citizen == 1 { YesNo::Yes } else { YesNo::No };
    let senior = form.select("Senior citizen", YesNo::ALL, senior_default)?;
    let partner = form.select("Partner", YesNo::ALL, defaults.partner)?;
    let dependents = form.select("Dependents", YesNo::ALL, defaults.dependents)?;
    let tenure = form.number("Tenure (months)", 0, Some(MAX_TENURE_MONTHS), defaults.tenure)?;

    form.section("Service details")?;
    let phone_service = form.select("Phone service", YesNo::ALL, defaults.phone_service)?;
    let multiple_lines =
        form.select("Multiple lines", MultipleLines::ALL, defaults.multiple_lines)?;
    let internet_service =
        form.select("Internet service", InternetService::ALL, defaults.internet_service)?;

    form.section("Contract & billing")?;
    let contract = form.select("Contract type", Contract::ALL, defaults.contract)?;
    let paperless_billing =
        form.select("Paperless billing", YesNo::ALL, defaults.paperless_billing)?;
    let payment_method =
        form.select("Payment method", PaymentMethod::ALL, defaults.payment_method)?;
    let monthly_charges = form.number(
        "Monthly charges",
        0.0,
        Some(MAX_MONTHLY_CHARGES),
        defaults.monthly_charges,
    )?;
    let total_charges = form.number("Total charges", 0.0, None, defaults.total_charges)?;

    form.section("Security & streaming services")?;
    let addons = InternetAddon::ALL;
    let online_security = form.select("Online security", addons, defaults.online_security)?;
    let online_backup = form.select("Online backup", addons, defaults.online_backup)?;
    let device_protection =
        form.select("Device protection", addons, defaults.device_protection)?;
    let tech_support = form.select("Tech support", addons, defaults.tech_support)?;
    let streaming_tv = form.select("Streaming TV", addons, defaults.streaming_tv)?;
    let streaming_movies = form.select("Streaming movies", addons, defaults.streaming_movies)?;

    Ok(CustomerRecord {
        gender,
        senior_citizen: u8::from(senior == YesNo::Yes),
        partner,
        dependents,
        tenure,
        phone_service,
        multiple_lines,
        internet_service,
        online_security,
        online_backup,
        device_protection,
        tech_support,
        streaming_tv,
        streaming_movies,
        contract,
        paperless_billing,
        payment_method,
        monthly_charges,
        total_charges,
    })
}
