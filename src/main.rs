fn main() {
    if let Err(err) = csv_staging::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
