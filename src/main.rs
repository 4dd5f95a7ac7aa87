fn main() {
    if let Err(err) = platelabel::run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
