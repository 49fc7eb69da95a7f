use std::fs::File;
use std::io::BufReader;
use std::process;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser as ClapParser, Subcommand};

use mini_pascal::{
    BufferedLineReader, Message, MessageHandler, Operation, ParseOutcome, Parser, Scanner, Source,
};

#[derive(ClapParser)]
#[command(name = "mini-pascal")]
#[command(about = "Front end for a Pascal-like toy language", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunFlags {
    /// Source file
    input: String,

    /// Dump the intermediate-code tree after parsing
    #[arg(short, long)]
    intermediate: bool,

    /// Print the identifier cross-reference after parsing
    #[arg(short = 'x', long = "cross-reference")]
    cross_reference: bool,

    /// Echo every scanned token
    #[arg(long)]
    tokens: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the source and run the code generator
    Compile {
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Parse the source and run the executor
    Execute {
        #[command(flatten)]
        flags: RunFlags,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { flags } => run(Operation::Compile, flags),
        Commands::Execute { flags } => run(Operation::Execute, flags),
    }
}

fn run(operation: Operation, flags: RunFlags) -> anyhow::Result<()> {
    let messages = MessageHandler::shared();
    let echo_tokens = flags.tokens;
    messages
        .borrow_mut()
        .add_listener(Box::new(move |message| print_message(message, echo_tokens)));

    let file = File::open(&flags.input).with_context(|| format!("cannot open {}", flags.input))?;
    let reader = BufferedLineReader::new(Box::new(BufReader::new(file)));
    let source = Source::new(reader, Rc::clone(&messages));
    let parser = Parser::new(Scanner::new(source, Rc::clone(&messages)), Rc::clone(&messages));

    match parser.parse() {
        Ok(mut outcome) => {
            if flags.intermediate {
                println!("\n===== INTERMEDIATE CODE =====\n");
                print!("{}", outcome.intermediate_code.dump());
            }
            if flags.cross_reference {
                print_cross_reference(&mut outcome);
            }

            let mut backend = operation.create_backend(Rc::clone(&messages));
            backend.process(&outcome.intermediate_code, &outcome.symbols);
            Ok(())
        }
        Err(error) => {
            messages.borrow_mut().send(&Message::SyntaxError {
                line_number: 0,
                position: 0,
                text: String::new(),
                message: format!("FATAL ERROR: {error}"),
            });
            process::exit(error.status());
        }
    }
}

fn print_message(message: &Message, echo_tokens: bool) {
    match message {
        Message::SourceLine { line_number, text } => {
            println!("{line_number:>4} {text}");
        }
        Message::Token {
            line_number,
            position,
            token_type,
            text,
            value,
        } => {
            if echo_tokens {
                println!(
                    ">>> {token_type:<15?} line={line_number}, pos={position}, text={text}"
                );
                if let Some(value) = value {
                    println!(">>> {:<15} value={value}", "");
                }
            }
        }
        Message::SyntaxError {
            position,
            text,
            message,
            ..
        } => {
            println!("     {}^", "-".repeat(*position));
            let location = if text.is_empty() {
                String::new()
            } else {
                format!(" [at \"{text}\"]")
            };
            println!("***  {message}{location}");
        }
        Message::ParserSummary {
            line_number,
            error_count,
            elapsed,
        } => {
            println!("\nPARSER SUMMARY");
            println!("{line_number:>10} source lines.");
            println!("{error_count:>10} syntax errors.");
            println!("{:>10.2} seconds total parsing time.", seconds(elapsed));
        }
        Message::CompilerSummary {
            instruction_count,
            elapsed,
        } => {
            println!("\nCOMPILER SUMMARY");
            println!("{instruction_count:>10} instructions generated.");
            println!(
                "{:>10.2} seconds total code generation time.",
                seconds(elapsed)
            );
        }
        Message::InterpreterSummary {
            execution_count,
            runtime_errors,
            elapsed,
        } => {
            println!("\nINTERPRETER SUMMARY");
            println!("{execution_count:>10} statements executed.");
            println!("{runtime_errors:>10} runtime errors.");
            println!("{:>10.2} seconds total execution time.", seconds(elapsed));
        }
    }
}

fn seconds(elapsed: &Duration) -> f64 {
    elapsed.as_secs_f64()
}

fn print_cross_reference(outcome: &mut ParseOutcome) {
    println!("\n===== CROSS-REFERENCE TABLE =====\n");
    println!("{:<20}{}", "Identifier", "Line numbers");
    println!("{:<20}{}", "----------", "------------");

    let ids = outcome.symbols.local_mut().sorted_entries().to_vec();
    for id in ids {
        let entry = outcome.symbols.entry(id);
        let lines: Vec<String> = entry
            .line_numbers()
            .iter()
            .map(|line| line.to_string())
            .collect();
        println!("{:<20}{}", entry.name(), lines.join(" "));
    }
}
