fn main() {
    if let Err(e) = polyheal_lib::run() {
        tracing::error!("Fatal: {e}");
        eprintln!("polyheal: {e}");
        std::process::exit(1);
    }
}
