fn main() {
    if let Err(err) = csv_fusion::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
