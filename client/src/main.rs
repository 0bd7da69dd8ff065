use std::io::{self, Write};
use std::time::Duration;

use clap::Parser;

use churn_common::CustomerRecord;
use churn_client::api::{ApiClient, ClientError, DEFAULT_API_URL};
use churn_client::form::{collect_record, Form};
use churn_client::render::{render_input, render_result};

/// Assess a customer's churn risk and get a retention recommendation.
#[derive(Debug, Parser)]
#[command(name = "churn-client", version)]
struct Cli {
    /// Prediction endpoint
    #[arg(long, env = "API_URL", default_value = DEFAULT_API_URL)]
    url: String,

    /// Submit the demo customer without prompting
    #[arg(long)]
    defaults: bool,

    /// Echo the JSON record sent to the service
    #[arg(long)]
    show_input: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        eprintln!("{}", error.present());
        std::process::exit(error.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), ClientError> {
    let client = ApiClient::new(&cli.url, Duration::from_secs(cli.timeout))?;
    let stdin = io::stdin();
    let mut form = Form::new(stdin.lock(), io::stdout());

    println!("Customer churn action system");
    println!("Endpoint: {}", client.url());

    let mut defaults = CustomerRecord::demo();
    loop {
        let record = if cli.defaults {
            defaults.clone()
        } else {
            collect_record(&mut form, &defaults)?
        };

        println!("\nAnalyzing risk and generating action plan...");
        let result = client.predict(&record)?;

        let mut out = io::stdout().lock();
        render_result(&mut out, &result)?;
        if cli.show_input {
            render_input(&mut out, &record)?;
        }
        out.flush()?;
        drop(out);

        if cli.defaults || !form.confirm("\nAnalyze another customer")? {
            return Ok(());
        }
        defaults = record;
    }
}
