#![forbid(unsafe_code)]

fn main() {
    drift_harness::init_logging();
    if let Err(error) = drift_harness::run_from_env() {
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}
