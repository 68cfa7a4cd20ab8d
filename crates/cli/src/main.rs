mod files;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use zmanim_core::{assist, parse_formula, resolve, ZmanDefinition};
use zmanim_eval::{evaluate_set, explain, FormulaError, HumanReadableError};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Zmanim formula DSL toolchain.
#[derive(Parser)]
#[command(name = "zmanim", version, about = "Zmanim formula DSL toolchain")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a formula and print its AST
    Parse {
        /// Formula text, e.g. "solar(16.1, before_sunrise)"
        formula: String,
    },

    /// Validate a zman set file and print its evaluation order
    Check {
        /// Path to the zman set JSON file
        set: PathBuf,
    },

    /// Evaluate a zman set against a context and an almanac
    Eval {
        /// Path to the zman set JSON file
        set: PathBuf,
        /// Path to the evaluation context JSON file
        #[arg(long)]
        context: PathBuf,
        /// Path to the almanac JSON file
        #[arg(long)]
        almanac: PathBuf,
    },

    /// Show completion candidates for a cursor position in a formula
    Complete {
        /// Formula text, possibly mid-edit
        formula: String,
        /// Char offset of the cursor; defaults to the end of the text
        #[arg(long)]
        cursor: Option<usize>,
        /// Zman keys available for @-reference completion
        #[arg(long = "key")]
        keys: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Parse { formula } => cmd_parse(&formula, cli.output),
        Commands::Check { set } => cmd_check(&set, cli.output),
        Commands::Eval {
            set,
            context,
            almanac,
        } => cmd_eval(&set, &context, &almanac, cli.output),
        Commands::Complete {
            formula,
            cursor,
            keys,
        } => cmd_complete(&formula, cursor, &keys, cli.output),
    }
}

fn report_formula_error(error: FormulaError, output: OutputFormat) -> ! {
    let human = explain(&error);
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&human)
                .unwrap_or_else(|_| format!("{{\"headline\": \"{}\"}}", human.headline));
            eprintln!("{}", json);
        }
        OutputFormat::Text => print_human(&human),
    }
    process::exit(1);
}

fn print_human(human: &HumanReadableError) {
    eprintln!("error: {}", human.headline);
    if let Some(explanation) = &human.explanation {
        eprintln!("  {}", explanation);
    }
    eprintln!("  {}", human.suggestion);
    if let Some(example) = &human.example_code {
        eprintln!("  example: {}", example);
    }
    if let Some(link) = &human.reference_link {
        eprintln!("  see: {}", link);
    }
}

fn report_io_error(message: &str) -> ! {
    eprintln!("error: {}", message);
    process::exit(1);
}

fn cmd_parse(formula: &str, output: OutputFormat) {
    match parse_formula(formula) {
        Ok(ast) => {
            let pretty = serde_json::to_string_pretty(&ast)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        Err(e) => report_formula_error(FormulaError::from(e), output),
    }
}

fn load_definitions(set_path: &Path, output: OutputFormat) -> Vec<ZmanDefinition> {
    let entries = match files::load_set(set_path) {
        Ok(entries) => entries,
        Err(msg) => report_io_error(&msg),
    };

    let mut definitions = Vec::new();
    for (key, formula) in entries {
        match parse_formula(&formula) {
            Ok(ast) => definitions.push(ZmanDefinition::new(key, ast)),
            Err(e) => {
                eprintln!("in formula '{}':", key);
                report_formula_error(FormulaError::from(e), output);
            }
        }
    }
    definitions
}

fn cmd_check(set_path: &Path, output: OutputFormat) {
    let definitions = load_definitions(set_path, output);
    match resolve(&definitions) {
        Ok(order) => match output {
            OutputFormat::Json => {
                let json = serde_json::json!({ "order": order.keys() });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json)
                        .unwrap_or_else(|e| format!("serialization error: {}", e))
                );
            }
            OutputFormat::Text => {
                println!("{} zmanim, evaluation order:", order.keys().len());
                for key in order.keys() {
                    println!("  {}", key);
                }
            }
        },
        Err(e) => report_formula_error(FormulaError::from(e), output),
    }
}

fn cmd_eval(set_path: &Path, context_path: &Path, almanac_path: &Path, output: OutputFormat) {
    let definitions = load_definitions(set_path, output);
    let context = match files::load_context(context_path) {
        Ok(ctx) => ctx,
        Err(msg) => report_io_error(&msg),
    };
    let (almanac, calendar) = match files::load_almanac(almanac_path) {
        Ok(pair) => pair,
        Err(msg) => report_io_error(&msg),
    };

    match evaluate_set(&definitions, &context, &almanac, &calendar) {
        Ok(result) => match output {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result.to_json())
                        .unwrap_or_else(|e| format!("serialization error: {}", e))
                );
            }
            OutputFormat::Text => {
                for (key, outcome) in &result.outcomes {
                    match outcome {
                        Ok(at) => println!("{:<24} {}", key, at),
                        Err(e) => {
                            let human = explain(&FormulaError::from(e.clone()));
                            println!("{:<24} error: {}", key, human.headline);
                        }
                    }
                }
            }
        },
        Err(e) => report_formula_error(FormulaError::from(e), output),
    }
}

fn cmd_complete(formula: &str, cursor: Option<usize>, keys: &[String], output: OutputFormat) {
    let offset = cursor.unwrap_or_else(|| formula.chars().count());
    let context = assist::cursor_context(formula, offset);
    let candidates = assist::completions(&context, keys);

    match output {
        OutputFormat::Json => {
            let json = serde_json::json!({ "completions": candidates });
            println!(
                "{}",
                serde_json::to_string_pretty(&json)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            for candidate in candidates {
                println!("{}", candidate);
            }
        }
    }
}
