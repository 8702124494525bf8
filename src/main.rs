fn main() {
    if let Err(err) = chatshelf::cli::main() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
