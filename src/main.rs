use clap::Parser;
use owo_colors::OwoColorize;
use std::io::{self, Read, Write};

use bilang::cli::{generate_completions, Args, Commands};
use bilang::config::AppConfig;
use bilang::interpreter::{self, Env, Environment, ParseErrors, Script};
use bilang::lexer::Lexer;
use bilang::Value;

const PROMPT: &str = "bilang >> ";

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);

    if let Some(source) = &args.eval {
        run_source(source, &config);
    } else if let Some(path) = &args.script {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                error_message(&config, &format!("Failed to read {}: {}", path.display(), err));
                std::process::exit(1);
            }
        };
        run_source(&source, &config);
    } else if !atty::is(atty::Stream::Stdin) {
        // Non-interactive stdin: read everything, evaluate once.
        let mut buffer = String::new();
        if let Err(err) = io::stdin().read_to_string(&mut buffer) {
            error_message(&config, &format!("Failed to read stdin: {}", err));
            std::process::exit(1);
        }
        run_source(&buffer, &config);
    } else {
        run_repl(&config);
    }
}

fn evaluate(source: &str, env: &Env, script: &mut Script) -> Result<Value, ParseErrors> {
    let mut parser = interpreter::Parser::new(Lexer::new(source));
    let program = parser.parse_program()?;
    Ok(script.eval_program(&program, env))
}

fn run_source(source: &str, config: &AppConfig) {
    let env = Environment::new();
    let mut script = Script::new();
    match evaluate(source, &env, &mut script) {
        Ok(value) => {
            let failed = value.is_error();
            print_value(config, &value);
            if failed {
                std::process::exit(1);
            }
        }
        Err(errors) => {
            print_parse_errors(config, &errors);
            std::process::exit(1);
        }
    }
}

/// Line-at-a-time loop sharing one environment and one konst registry,
/// so bindings and constants persist across inputs.
fn run_repl(config: &AppConfig) {
    let env = Environment::new();
    let mut script = Script::new();
    let stdin = io::stdin();

    loop {
        print!("{}", PROMPT);
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => match evaluate(&line, &env, &mut script) {
                Ok(value) => print_value(config, &value),
                Err(errors) => print_parse_errors(config, &errors),
            },
            Err(err) => {
                error_message(config, &format!("Error reading input: {}", err));
                break;
            }
        }
    }

    script.free();
}

fn print_value(config: &AppConfig, value: &Value) {
    if value.is_error() && config.color_enabled {
        println!("{}", value.inspect().red());
    } else {
        println!("{}", value.inspect());
    }
}

fn print_parse_errors(config: &AppConfig, errors: &ParseErrors) {
    for message in &errors.messages {
        if config.color_enabled {
            println!("\t{}", message.red());
        } else {
            println!("\t{}", message);
        }
    }
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
