use anyhow::{Context, Result};
use serde::Serialize;
use std::process::ExitCode;

use feishu_sheets::config::{parse_json_input, CliArgs, Command, Config};
use feishu_sheets::models::{CellMatrix, ReadOptions, ValueRangeInput, ValueRenderOption};
use feishu_sheets::SheetsClient;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::load();

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // Logs go to stderr so stdout carries only the JSON response
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&config, args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config, command: Command) -> Result<()> {
    let client = SheetsClient::from_config(config)?;

    match command {
        Command::Test => {
            let report = client
                .test_connection()
                .await
                .context("Connection test failed")?;
            print_json(&report)?;
            if !report.success {
                anyhow::bail!("{}", report.message);
            }
            Ok(())
        }

        Command::CreateSpreadsheet {
            title,
            folder_token,
        } => print_json(
            &client
                .create_spreadsheet(title.as_deref(), folder_token.as_deref())
                .await?,
        ),

        Command::GetSpreadsheet { spreadsheet_token } => {
            print_json(&client.get_spreadsheet(&spreadsheet_token).await?)
        }

        Command::ListSheets { spreadsheet_token } => {
            print_json(&client.list_sheets(&spreadsheet_token).await?)
        }

        Command::GetSheet {
            spreadsheet_token,
            sheet_id,
        } => print_json(&client.get_sheet(&spreadsheet_token, &sheet_id).await?),

        Command::AddSheet {
            spreadsheet_token,
            title,
            index,
        } => print_json(&client.add_sheet(&spreadsheet_token, &title, index).await?),

        Command::DeleteSheet {
            spreadsheet_token,
            sheet_id,
        } => print_json(&client.delete_sheet(&spreadsheet_token, &sheet_id).await?),

        Command::Read {
            spreadsheet_token,
            range,
            value_render,
            date_time_render,
        } => {
            let options = read_options(value_render, date_time_render)?;
            print_json(&client.read_range(&spreadsheet_token, &range, &options).await?)
        }

        Command::Write {
            spreadsheet_token,
            range,
            values,
        } => {
            let values = parse_matrix(&values)?;
            print_json(&client.write_range(&spreadsheet_token, &range, &values).await?)
        }

        Command::Append {
            spreadsheet_token,
            range,
            values,
        } => {
            let values = parse_matrix(&values)?;
            print_json(&client.append_data(&spreadsheet_token, &range, &values).await?)
        }

        Command::Prepend {
            spreadsheet_token,
            range,
            values,
        } => {
            let values = parse_matrix(&values)?;
            print_json(&client.prepend_data(&spreadsheet_token, &range, &values).await?)
        }

        Command::BatchRead {
            spreadsheet_token,
            ranges,
            value_render,
            date_time_render,
        } => {
            let ranges: Vec<String> = ranges
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
            let options = read_options(value_render, date_time_render)?;
            print_json(
                &client
                    .batch_get_values(&spreadsheet_token, &ranges, &options)
                    .await?,
            )
        }

        Command::BatchWrite {
            spreadsheet_token,
            data,
        } => {
            let value_ranges: Vec<ValueRangeInput> = serde_json::from_value(parse_json_input(&data)?)
                .context("--data must be an array of {range, values} objects")?;
            print_json(
                &client
                    .batch_update_values(&spreadsheet_token, &value_ranges)
                    .await?,
            )
        }
    }
}

fn read_options(
    value_render: Option<String>,
    date_time_render: Option<String>,
) -> Result<ReadOptions> {
    let value_render_option = value_render
        .map(|s| s.parse::<ValueRenderOption>())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    Ok(ReadOptions {
        value_render_option,
        date_time_render_option: date_time_render,
    })
}

fn parse_matrix(input: &str) -> Result<CellMatrix> {
    serde_json::from_value(parse_json_input(input)?)
        .context("--values must be a two-dimensional JSON array")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to encode response")?;
    println!("{}", output);
    Ok(())
}
