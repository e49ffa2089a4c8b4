use std::error::Error;
use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use romtester::app::{self, EXIT_RESOURCE_ERROR};
use romtester::console::{self, Console, DisplayGuard};
use romtester::logger;
use romtester::suite;
use romtester::utils::{self, Args};
use romtester::{log_error_fmt, log_info_fmt};

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().collect();
    if raw_args.iter().any(|arg| arg == "-h" || arg == "--help") {
        let mut cmd = Args::command();
        let _ = cmd.print_help();
        println!();
        suite::print_test_mask_help();
        return ExitCode::SUCCESS;
    }

    let args = Args::parse();

    if let Err(e) = logger::init_logger(args.log_level()) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    if let Some(path) = &args.generate {
        return match app::generate(&args, path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report_resource_error(e.as_ref()),
        };
    }

    let _display = DisplayGuard::enter();
    let mut stdout = io::stdout();
    Console::new(&mut stdout).line(&format!("ROM TEST {}", utils::BUILD_VERSION));

    let code = match app::run(&args, &mut stdout) {
        Ok(summary) => {
            log_info_fmt!(
                "{} of {} tests passed",
                summary.passed(),
                summary.records.len()
            );
            ExitCode::from(summary.overall().code())
        }
        Err(e) => report_resource_error(e.as_ref()),
    };

    if args.wait_key {
        console::wait_for_enter(&mut Console::new(&mut stdout), io::stdin().lock());
    }
    code
}

fn report_resource_error(e: &dyn Error) -> ExitCode {
    log_error_fmt!("x Error: {}", e);
    ExitCode::from(EXIT_RESOURCE_ERROR)
}
