// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::{Parser, ValueHint};
use log::info;
use mysqldump_redact::{Config, Instruction, ReplacementTable, Rewriter};

use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "mysqldump-redact",
    version,
    about = "Replace INSERT values of a mysqldump stream",
    after_help = r#"EXAMPLES
  $ mysqldump-redact --replace=users:1:"'REDACTED'" < dump.sql > redacted.sql
  $ mysqldump-redact -i dump.sql -o redacted.sql --replace users:4:NULL --verbose"#
)]
struct Cli {
    #[arg(
        long,
        value_name = "TABLE:COLUMN:LITERAL",
        help = "Write LITERAL instead of column COLUMN (0 based) of table TABLE, repeatable"
    )]
    replace: Vec<Instruction>,
    #[arg(short, long, help = "Log every literal and its replacement to stderr")]
    verbose: bool,
    #[arg(short, long, help = "Read the dump from FILE instead of stdin", value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
    #[arg(short, long, help = "Write the result to FILE instead of stdout", value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n\nError: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let replacements: ReplacementTable = cli.replace.into_iter().collect();
    info!("{} replacement(s) configured", replacements.len());

    let stdin = io::stdin();
    let stdout = io::stdout();
    let input: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(stdin.lock()),
    };
    let output: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(stdout.lock())),
    };

    let config = Config {
        verbose: cli.verbose,
        ..Config::default()
    };
    let mut rewriter = Rewriter::new(input, output, &replacements, config);
    let result = rewriter.run();
    if result.is_err() {
        // Keep what was rewritten before the failure.
        let _ = rewriter.into_inner().flush();
    }
    let summary = result?;

    info!(
        "{} statement(s), {} row(s), {} literal(s), {} replaced",
        summary.statements, summary.rows, summary.literals, summary.replaced
    );
    Ok(())
}
