use crate::domain::errors::{error_code, error_details};
use crate::domain::models::{ErrorBody, JsonErr, JsonOut};
use serde::Serialize;
use std::io::Write;

pub fn print_out<T: Serialize>(
    json: bool,
    data: &[T],
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        for d in data {
            println!("{}", row(d));
        }
    }
    Ok(())
}

pub fn print_one<T: Serialize>(
    json: bool,
    data: T,
    row: impl Fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut { ok: true, data })?
        );
    } else {
        println!("{}", row(&data));
    }
    Ok(())
}

/// Where progress lines go: stdout for humans, stderr when stdout carries JSON.
pub fn progress(json: bool) -> Box<dyn Write> {
    if json {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    }
}

pub fn print_error(json: bool, err: &anyhow::Error) {
    if json {
        let out = JsonErr {
            ok: false,
            error: ErrorBody {
                code: error_code(err).to_string(),
                message: err.to_string(),
                details: error_details(err),
            },
        };
        match serde_json::to_string_pretty(&out) {
            Ok(s) => println!("{}", s),
            Err(_) => eprintln!("ERROR: {}", err),
        }
    } else {
        eprintln!("ERROR: {}", err);
    }
}
