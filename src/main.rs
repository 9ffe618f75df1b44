fn main() {
    if let Err(err) = relicard::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
