fn main() {
    if let Err(err) = sunburst_renderer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
